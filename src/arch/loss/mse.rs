use ndarray::{Array2, ArrayView2};

use super::LossFn;

/// Mean squared error over every element of the batch.
#[derive(Default, Clone, Copy, Debug)]
pub struct Mse;

impl Mse {
    pub fn new() -> Self {
        Self
    }
}

impl LossFn for Mse {
    fn loss(&self, y_pred: ArrayView2<f32>, y: ArrayView2<f32>) -> f32 {
        (&y_pred - &y).mapv(|e| e * e).mean().unwrap_or_default()
    }

    fn loss_prime(&self, y_pred: ArrayView2<f32>, y: ArrayView2<f32>) -> Array2<f32> {
        (&y_pred - &y) * (2. / y_pred.len().max(1) as f32)
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    #[test]
    fn averages_over_every_element() {
        let y_pred = array![[1., 2.], [3., 4.]];
        let y = array![[0., 2.], [3., 2.]];

        assert_eq!(Mse.loss(y_pred.view(), y.view()), 1.25);
        assert_eq!(
            Mse.loss_prime(y_pred.view(), y.view()),
            array![[0.5, 0.], [0., 1.]]
        );
    }
}
