use ndarray::{Array2, ArrayView2, s};
use rand::Rng;

use super::{BlockConfig, ForwardBlock};
use crate::{
    Result,
    arch::{
        ParamSlot,
        layers::{Activation, BatchNorm, Dense},
        ops::pad_right,
    },
};

/// `act(pad(x) + pad(norm(fc2(act(norm(fc1(x)))))))`.
///
/// Both the identity and the transformed branch are zero-padded on the right to the wider of the
/// two before the sum, so the output is `max(input_width, units)` wide.
#[derive(Clone, Debug)]
pub struct ResidualBlock {
    inner: ForwardBlock,
    fc: Dense,
    norm: Option<BatchNorm>,
    act: Activation,
    output_width: usize,
}

impl ResidualBlock {
    /// Creates a new `ResidualBlock`.
    ///
    /// # Arguments
    /// * `input_width` - The width of the incoming features.
    /// * `config` - The block's settings, `config.sparsity` is ignored.
    /// * `rng` - The random number generator used to initialize both projections.
    pub fn new<R: Rng>(input_width: usize, config: &BlockConfig, rng: &mut R) -> Result<Self> {
        let units = config.units;

        Ok(Self {
            inner: ForwardBlock::new(input_width, config, rng)?,
            fc: Dense::new((units, units), rng)?,
            norm: config.batchnorm.then(|| BatchNorm::new(units)),
            act: Activation::new(config.act_fn),
            output_width: input_width.max(units),
        })
    }

    pub fn input_width(&self) -> usize {
        self.inner.input_width()
    }

    pub fn output_width(&self) -> usize {
        self.output_width
    }

    pub fn size(&self) -> usize {
        self.inner.size() + self.fc.size() + self.norm.as_ref().map_or(0, BatchNorm::size)
    }

    pub fn forward(&mut self, x: ArrayView2<f32>, training: bool) -> Result<Array2<f32>> {
        let h = self.inner.forward(x, training)?;
        let mut h = self.fc.forward(h.view())?;
        if let Some(norm) = &mut self.norm {
            h = norm.forward(h.view(), training)?;
        }

        let sum = pad_right(x, self.output_width) + pad_right(h.view(), self.output_width);
        Ok(self.act.forward(sum))
    }

    pub fn backward(&mut self, d: ArrayView2<f32>) -> Result<Array2<f32>> {
        let d_sum = self.act.backward(d)?;

        let mut d_h = d_sum.slice(s![.., ..self.fc.output_width()]).to_owned();
        if let Some(norm) = &mut self.norm {
            d_h = norm.backward(d_h.view())?;
        }
        let d_h = self.fc.backward(d_h.view())?;
        let d_x = self.inner.backward(d_h.view())?;

        Ok(d_x + d_sum.slice(s![.., ..self.input_width()]))
    }

    pub fn params_mut(&mut self) -> Vec<ParamSlot<'_>> {
        let mut slots = self.inner.params_mut();
        slots.push(self.fc.params_mut());
        if let Some(norm) = &mut self.norm {
            slots.push(norm.params_mut());
        }

        slots
    }
}
