use crate::Result;

/// Defines the strategy for updating a group of parameters based on their gradient.
///
/// An optimizer instance belongs to exactly one parameter group, stateful optimizers keep one
/// entry of state per parameter.
pub trait Optimizer {
    /// Takes one optimization step.
    ///
    /// # Arguments
    /// * `params` - The parameters to update.
    /// * `grad` - The gradient of the loss with respect to `params`.
    ///
    /// # Returns
    /// An error if the sizes of `params`, `grad` and the optimizer's state don't match.
    fn update_params(&mut self, params: &mut [f32], grad: &[f32]) -> Result<()>;
}
