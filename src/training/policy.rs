use ndarray::{Array1, ArrayView1};

use super::TransitionBatch;
use crate::{Result, extractor::FeatureExtractor};

/// The reinforcement learning agent trained on top of a feature extractor.
pub trait Policy {
    /// Chooses an action for the representation of a single state.
    ///
    /// # Arguments
    /// * `features` - The extractor's representation of the current state.
    /// * `explore` - Whether exploration noise should be added.
    fn select_action(&mut self, features: ArrayView1<f32>, explore: bool) -> Result<Array1<f32>>;

    /// Takes one optimization step on a batch of transitions.
    fn train(
        &mut self,
        extractor: &mut dyn FeatureExtractor,
        batch: &TransitionBatch,
    ) -> Result<()>;
}
