use log::debug;
use ndarray::{Array2, ArrayView2, s};
use rand::Rng;
use rayon::prelude::*;

use super::FeatureExtractor;
use crate::{
    OfeErr, Result,
    arch::{
        ExtractorStack, ParamSlot,
        layers::Dense,
        loss::{LossFn, Mse},
        ops::concat_features,
    },
    config::{OfeConfig, OptimizerConfig},
    optimization::Optimizer,
    training::TransitionBatch,
};

/// An online feature extractor trained on predicting the next state.
///
/// The state stack maps `s` to `φ(s)`. The state-action stack maps `[φ(s), a]` to `φ(s, a)`,
/// unless the action branch is skipped, in which case `φ(s, a) = [φ(s), a]`. A linear head on top
/// of `φ(s, a)` predicts the leading `dim_output` features of the next state.
pub struct OfeNet {
    dim_state: usize,
    dim_action: usize,
    dim_output: usize,
    state_stack: ExtractorStack,
    action_stack: Option<ExtractorStack>,
    prediction: Dense,
    optimizers: Vec<Box<dyn Optimizer + Send>>,
    loss_fn: Mse,
}

impl OfeNet {
    /// Creates a new `OfeNet`.
    ///
    /// # Arguments
    /// * `config` - The extractor's settings.
    /// * `optimizer` - The optimizer built for every parameter group.
    /// * `rng` - The random number generator used to initialize the parameters.
    ///
    /// # Returns
    /// A new `OfeNet` or the configuration error that prevented building it.
    pub fn new<R: Rng>(config: &OfeConfig, optimizer: OptimizerConfig, rng: &mut R) -> Result<Self> {
        config.validate()?;

        let style = config.style()?;
        let block = config.block_config()?;

        let state_stack =
            ExtractorStack::uniform(config.dim_state, style, block, config.num_layers, rng)?;
        let action_input = state_stack.output_width() + config.dim_action;

        let action_stack = if config.skip_action_branch {
            None
        } else {
            Some(ExtractorStack::uniform(
                action_input,
                style,
                block,
                config.num_layers,
                rng,
            )?)
        };

        let features = action_stack
            .as_ref()
            .map_or(action_input, ExtractorStack::output_width);
        let prediction = Dense::new((features, config.dim_output()), rng)?;

        let mut net = Self {
            dim_state: config.dim_state,
            dim_action: config.dim_action,
            dim_output: config.dim_output(),
            state_stack,
            action_stack,
            prediction,
            optimizers: Vec::new(),
            loss_fn: Mse::new(),
        };

        let groups: Vec<usize> = net.params_mut().iter().map(ParamSlot::len).collect();
        net.optimizers = groups.into_iter().map(|len| optimizer.build(len)).collect();

        debug!(
            "ofenet: state widths {:?}, state-action widths {:?}, {} params in {} groups",
            net.state_stack.widths(),
            net.action_stack.as_ref().map(ExtractorStack::widths),
            net.size(),
            net.optimizers.len()
        );

        Ok(net)
    }

    pub fn dim_output(&self) -> usize {
        self.dim_output
    }

    pub fn state_stack(&self) -> &ExtractorStack {
        &self.state_stack
    }

    pub fn action_stack(&self) -> Option<&ExtractorStack> {
        self.action_stack.as_ref()
    }

    /// Returns the amount of learnable parameters.
    pub fn size(&self) -> usize {
        self.state_stack.size()
            + self.action_stack.as_ref().map_or(0, ExtractorStack::size)
            + self.prediction.size()
    }

    /// Predicts the leading `dim_output` features of the next states.
    pub fn predict(
        &mut self,
        states: ArrayView2<f32>,
        actions: ArrayView2<f32>,
        training: bool,
    ) -> Result<Array2<f32>> {
        let features = self.features_from_states_actions(states, actions, training)?;
        self.prediction.forward(features.view())
    }

    fn params_mut(&mut self) -> Vec<ParamSlot<'_>> {
        param_slots(
            &mut self.state_stack,
            &mut self.action_stack,
            &mut self.prediction,
        )
    }

    /// Runs every optimizer on its parameter group, concurrently.
    fn optimize(&mut self) -> Result<()> {
        let slots = param_slots(
            &mut self.state_stack,
            &mut self.action_stack,
            &mut self.prediction,
        );

        if slots.len() != self.optimizers.len() {
            return Err(OfeErr::SizeMismatch {
                what: "optimizers",
                got: self.optimizers.len(),
                expected: slots.len(),
            });
        }

        self.optimizers
            .par_iter_mut()
            .zip(slots)
            .try_for_each(|(optimizer, slot)| optimizer.update_params(slot.params, slot.grad))
    }
}

fn param_slots<'a>(
    state_stack: &'a mut ExtractorStack,
    action_stack: &'a mut Option<ExtractorStack>,
    prediction: &'a mut Dense,
) -> Vec<ParamSlot<'a>> {
    let mut slots = state_stack.params_mut();
    if let Some(action_stack) = action_stack {
        slots.extend(action_stack.params_mut());
    }
    slots.push(prediction.params_mut());

    slots
}

impl FeatureExtractor for OfeNet {
    fn dim_state(&self) -> usize {
        self.dim_state
    }

    fn dim_action(&self) -> usize {
        self.dim_action
    }

    fn dim_state_features(&self) -> usize {
        self.state_stack.output_width()
    }

    fn dim_state_action_features(&self) -> usize {
        self.action_stack
            .as_ref()
            .map_or(self.state_stack.output_width() + self.dim_action, |stack| {
                stack.output_width()
            })
    }

    fn features_from_states(
        &mut self,
        states: ArrayView2<f32>,
        training: bool,
    ) -> Result<Array2<f32>> {
        self.state_stack.forward(states, training)
    }

    fn features_from_states_actions(
        &mut self,
        states: ArrayView2<f32>,
        actions: ArrayView2<f32>,
        training: bool,
    ) -> Result<Array2<f32>> {
        if actions.ncols() != self.dim_action {
            return Err(OfeErr::SizeMismatch {
                what: "action width",
                got: actions.ncols(),
                expected: self.dim_action,
            });
        }

        let state_features = self.state_stack.forward(states, training)?;
        let features = concat_features(state_features.view(), actions)?;

        match &mut self.action_stack {
            Some(action_stack) => action_stack.forward(features.view(), training),
            None => Ok(features),
        }
    }

    fn train(&mut self, batch: &TransitionBatch) -> Result<f32> {
        if batch.next_states.dim() != batch.states.dim() {
            return Err(OfeErr::SizeMismatch {
                what: "next states",
                got: batch.next_states.len(),
                expected: batch.states.len(),
            });
        }

        let predicted = self.predict(batch.states.view(), batch.actions.view(), true)?;
        let target = batch.next_states.slice(s![.., ..self.dim_output]);

        let loss = self.loss_fn.loss(predicted.view(), target);
        let d = self.loss_fn.loss_prime(predicted.view(), target);

        let d = self.prediction.backward(d.view())?;
        let d = match &mut self.action_stack {
            Some(action_stack) => action_stack.backward(d.view())?,
            None => d,
        };

        let state_width = self.state_stack.output_width();
        self.state_stack.backward(d.slice(s![.., ..state_width]))?;

        self.optimize()?;

        debug!("ofenet train step, batch {} loss {loss:.6}", batch.len());
        Ok(loss)
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    fn config() -> OfeConfig {
        let mut config = OfeConfig::new(4, 2);
        config.total_units = 8;
        config.num_layers = 2;
        config
    }

    #[test]
    fn widths_follow_the_stacks() {
        let mut rng = StdRng::seed_from_u64(0);
        let net = OfeNet::new(&config(), OptimizerConfig::default(), &mut rng).unwrap();

        // growing: 4 -> 12 -> 20, then 22 -> 30 -> 38
        assert_eq!(net.dim_state_features(), 20);
        assert_eq!(net.dim_state_action_features(), 38);
        // fc + norm per block, two stacks of two blocks, and the head
        assert_eq!(net.optimizers.len(), 9);
    }

    #[test]
    fn skipping_the_action_branch_concatenates_actions() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut config = config();
        config.skip_action_branch = true;
        let mut net = OfeNet::new(&config, OptimizerConfig::default(), &mut rng).unwrap();

        let states = Array2::from_elem((3, 4), 0.1);
        let actions = Array2::from_elem((3, 2), 0.7);
        let features = net
            .features_from_states_actions(states.view(), actions.view(), false)
            .unwrap();

        assert_eq!(features.ncols(), 22);
        assert_eq!(features.slice(s![.., 20..]), actions);
        assert!(net.action_stack().is_none());
    }

    #[test]
    fn rejects_wrong_action_width() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut net = OfeNet::new(&config(), OptimizerConfig::default(), &mut rng).unwrap();

        let states = Array2::zeros((3, 4));
        let actions = Array2::zeros((3, 3));
        assert!(
            net.features_from_states_actions(states.view(), actions.view(), true)
                .is_err()
        );
    }
}
