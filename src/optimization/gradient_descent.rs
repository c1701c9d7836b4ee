use super::Optimizer;
use crate::{OfeErr, Result};

/// Plain gradient descent.
#[derive(Clone, Copy, Debug)]
pub struct GradientDescent {
    learning_rate: f32,
}

impl GradientDescent {
    /// Returns a new `GradientDescent`.
    ///
    /// # Arguments
    /// * `learning_rate` - The *length* of the steps taken on `update_params`.
    pub fn new(learning_rate: f32) -> Self {
        Self { learning_rate }
    }
}

impl Optimizer for GradientDescent {
    fn update_params(&mut self, params: &mut [f32], grad: &[f32]) -> Result<()> {
        if params.len() != grad.len() {
            return Err(OfeErr::SizeMismatch {
                what: "gradient",
                got: grad.len(),
                expected: params.len(),
            });
        }

        let lr = self.learning_rate;
        params.iter_mut().zip(grad).for_each(|(w, g)| *w -= lr * g);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steps_against_the_gradient() {
        let mut params = [1., -1.];
        GradientDescent::new(0.5)
            .update_params(&mut params, &[2., -4.])
            .unwrap();

        assert_eq!(params, [0., 1.]);
    }

    #[test]
    fn rejects_mismatched_gradient() {
        let mut params = [1., -1.];
        assert!(
            GradientDescent::new(0.5)
                .update_params(&mut params, &[2.])
                .is_err()
        );
    }
}
