mod environment;
mod policy;
mod replay_buffer;
mod runner;

pub use environment::{Environment, Step};
pub use policy::Policy;
pub use replay_buffer::{ReplayBuffer, TransitionBatch};
pub use runner::{Evaluation, TrainingLoop, TrainingReport};
