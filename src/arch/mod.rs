pub mod activations;
pub mod blocks;
pub mod layers;
pub mod loss;
pub mod ops;
pub mod sparsifier;
pub mod stack;

mod params;

pub use params::ParamSlot;
pub use stack::ExtractorStack;
