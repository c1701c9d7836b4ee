use ndarray::{Array2, ArrayView2};

use crate::{Result, training::TransitionBatch};

/// Maps raw observations to the features a policy learns on.
pub trait FeatureExtractor {
    fn dim_state(&self) -> usize;

    fn dim_action(&self) -> usize;

    /// The width of the representation of a state.
    fn dim_state_features(&self) -> usize;

    /// The width of the representation of a state-action pair.
    fn dim_state_action_features(&self) -> usize;

    /// Computes the representation of a batch of states.
    ///
    /// # Arguments
    /// * `states` - A `batch x dim_state` matrix.
    /// * `training` - Whether normalization uses (and updates) batch statistics.
    fn features_from_states(
        &mut self,
        states: ArrayView2<f32>,
        training: bool,
    ) -> Result<Array2<f32>>;

    /// Computes the representation of a batch of state-action pairs.
    fn features_from_states_actions(
        &mut self,
        states: ArrayView2<f32>,
        actions: ArrayView2<f32>,
        training: bool,
    ) -> Result<Array2<f32>>;

    /// Computes the representation of a batch of states outside of training.
    fn evaluate(&mut self, states: ArrayView2<f32>) -> Result<Array2<f32>> {
        self.features_from_states(states, false)
    }

    /// Takes one optimization step on the extractor's auxiliary task.
    ///
    /// # Returns
    /// The loss of the batch before the step.
    fn train(&mut self, batch: &TransitionBatch) -> Result<f32>;
}
