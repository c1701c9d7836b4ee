use ndarray::{Array2, ArrayView2};

use super::FeatureExtractor;
use crate::{OfeErr, Result, arch::ops::concat_features, training::TransitionBatch};

/// The identity extractor: states are their own features and there is nothing to learn.
#[derive(Clone, Copy, Debug)]
pub struct RawExtractor {
    dim_state: usize,
    dim_action: usize,
}

impl RawExtractor {
    pub fn new(dim_state: usize, dim_action: usize) -> Self {
        Self {
            dim_state,
            dim_action,
        }
    }

    fn check(what: &'static str, x: ArrayView2<f32>, expected: usize) -> Result<()> {
        if x.ncols() != expected {
            return Err(OfeErr::SizeMismatch {
                what,
                got: x.ncols(),
                expected,
            });
        }

        Ok(())
    }
}

impl FeatureExtractor for RawExtractor {
    fn dim_state(&self) -> usize {
        self.dim_state
    }

    fn dim_action(&self) -> usize {
        self.dim_action
    }

    fn dim_state_features(&self) -> usize {
        self.dim_state
    }

    fn dim_state_action_features(&self) -> usize {
        self.dim_state + self.dim_action
    }

    fn features_from_states(
        &mut self,
        states: ArrayView2<f32>,
        _training: bool,
    ) -> Result<Array2<f32>> {
        Self::check("state width", states, self.dim_state)?;
        Ok(states.to_owned())
    }

    fn features_from_states_actions(
        &mut self,
        states: ArrayView2<f32>,
        actions: ArrayView2<f32>,
        _training: bool,
    ) -> Result<Array2<f32>> {
        Self::check("state width", states, self.dim_state)?;
        Self::check("action width", actions, self.dim_action)?;
        concat_features(states, actions)
    }

    fn train(&mut self, _batch: &TransitionBatch) -> Result<f32> {
        Ok(0.)
    }
}
