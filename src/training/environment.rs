use ndarray::{Array1, ArrayView1};

use crate::Result;

/// The outcome of one environment step.
#[derive(Clone, Debug, PartialEq)]
pub struct Step {
    pub state: Array1<f32>,
    pub reward: f32,
    /// Whether the episode reached a terminal state.
    pub done: bool,
}

/// An episodic environment with continuous states and actions.
pub trait Environment {
    fn dim_state(&self) -> usize;

    fn dim_action(&self) -> usize;

    /// Episodes are cut after this many steps, such a cut is not a terminal state.
    fn max_episode_steps(&self) -> usize;

    /// Starts a new episode and returns its first state.
    fn reset(&mut self) -> Result<Array1<f32>>;

    fn step(&mut self, action: ArrayView1<f32>) -> Result<Step>;

    /// Draws a uniformly random valid action.
    fn sample_action(&mut self) -> Array1<f32>;
}
