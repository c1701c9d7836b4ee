mod act_fn;
mod rectifier;
mod sigmoid;
mod swish;

pub use act_fn::ActFn;
pub use rectifier::{Elu, LeakyRelu, Relu};
pub use sigmoid::Sigmoid;
pub use swish::Swish;
