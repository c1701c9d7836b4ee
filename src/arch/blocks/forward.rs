use ndarray::{Array2, ArrayView2};
use rand::Rng;

use super::BlockConfig;
use crate::{
    Result,
    arch::{
        ParamSlot,
        layers::{Activation, BatchNorm, Dense},
    },
};

/// `act(norm(fc(x)))`, the normalization being optional.
#[derive(Clone, Debug)]
pub struct ForwardBlock {
    fc: Dense,
    norm: Option<BatchNorm>,
    act: Activation,
}

impl ForwardBlock {
    /// Creates a new `ForwardBlock`.
    ///
    /// # Arguments
    /// * `input_width` - The width of the incoming features.
    /// * `config` - The block's settings, `config.sparsity` is ignored.
    /// * `rng` - The random number generator used to initialize the projection.
    pub fn new<R: Rng>(input_width: usize, config: &BlockConfig, rng: &mut R) -> Result<Self> {
        Ok(Self {
            fc: Dense::new((input_width, config.units), rng)?,
            norm: config.batchnorm.then(|| BatchNorm::new(config.units)),
            act: Activation::new(config.act_fn),
        })
    }

    pub fn input_width(&self) -> usize {
        self.fc.input_width()
    }

    pub fn output_width(&self) -> usize {
        self.fc.output_width()
    }

    pub fn size(&self) -> usize {
        self.fc.size() + self.norm.as_ref().map_or(0, BatchNorm::size)
    }

    pub fn forward(&mut self, x: ArrayView2<f32>, training: bool) -> Result<Array2<f32>> {
        let mut z = self.fc.forward(x)?;
        if let Some(norm) = &mut self.norm {
            z = norm.forward(z.view(), training)?;
        }

        Ok(self.act.forward(z))
    }

    pub fn backward(&mut self, d: ArrayView2<f32>) -> Result<Array2<f32>> {
        let mut d = self.act.backward(d)?;
        if let Some(norm) = &mut self.norm {
            d = norm.backward(d.view())?;
        }

        self.fc.backward(d.view())
    }

    pub fn params_mut(&mut self) -> Vec<ParamSlot<'_>> {
        let mut slots = vec![self.fc.params_mut()];
        if let Some(norm) = &mut self.norm {
            slots.push(norm.params_mut());
        }

        slots
    }
}

#[cfg(test)]
mod tests {
    use ndarray::Array2;
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;
    use crate::arch::activations::ActFn;

    #[test]
    fn output_width_is_units() {
        let mut rng = StdRng::seed_from_u64(42);
        let config = BlockConfig::new(64, ActFn::relu());
        let mut block = ForwardBlock::new(17, &config, &mut rng).unwrap();

        let y = block.forward(Array2::ones((3, 17)).view(), true).unwrap();
        assert_eq!(y.dim(), (3, 64));
        assert!(y.iter().all(|&v| v >= 0.));
        assert_eq!(block.size(), 18 * 64);
    }

    #[test]
    fn normalization_adds_a_slot() {
        let mut rng = StdRng::seed_from_u64(42);
        let config = BlockConfig::new(8, ActFn::Tanh).with_batchnorm(true);
        let mut block = ForwardBlock::new(4, &config, &mut rng).unwrap();

        assert_eq!(block.size(), 5 * 8 + 2 * 8);
        assert_eq!(block.params_mut().len(), 2);
    }

    #[test]
    fn backward_returns_input_delta() {
        let mut rng = StdRng::seed_from_u64(3);
        let config = BlockConfig::new(6, ActFn::swish()).with_batchnorm(true);
        let mut block = ForwardBlock::new(5, &config, &mut rng).unwrap();

        let x = Array2::from_shape_fn((4, 5), |(i, j)| (i * 5 + j) as f32 * 0.1 - 1.);
        block.forward(x.view(), true).unwrap();
        let dx = block.backward(Array2::ones((4, 6)).view()).unwrap();

        assert_eq!(dx.dim(), (4, 5));
    }
}
