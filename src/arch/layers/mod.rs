mod activation;
mod batch_norm;
mod dense;

pub use activation::Activation;
pub use batch_norm::BatchNorm;
pub use dense::Dense;
