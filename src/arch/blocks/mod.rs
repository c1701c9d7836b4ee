mod block;
mod config;
mod forward;
mod growing;
mod residual;

pub use block::Block;
pub use config::{BlockConfig, BlockStyle, SparsityConfig};
pub use forward::ForwardBlock;
pub use growing::{GrowingBlock, REPROJECTION_EXTRA_UNITS};
pub use residual::ResidualBlock;
