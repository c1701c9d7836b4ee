use ndarray::{Array2, ArrayView2};
use rand::Rng;

use super::{BlockConfig, BlockStyle, ForwardBlock, GrowingBlock, ResidualBlock};
use crate::{Result, arch::ParamSlot};

/// One stage of an extractor stack.
#[derive(Clone, Debug)]
pub enum Block {
    Forward(ForwardBlock),
    Residual(ResidualBlock),
    Growing(GrowingBlock),
}

impl Block {
    /// Builds a block of the given style reading `input_width` features.
    pub fn build<R: Rng>(
        style: BlockStyle,
        input_width: usize,
        config: &BlockConfig,
        rng: &mut R,
    ) -> Result<Self> {
        let block = match style {
            BlockStyle::Forward => Block::Forward(ForwardBlock::new(input_width, config, rng)?),
            BlockStyle::Residual => Block::Residual(ResidualBlock::new(input_width, config, rng)?),
            BlockStyle::Growing => {
                Block::Growing(GrowingBlock::new(input_width, config, false, rng)?)
            }
            BlockStyle::GrowingReprojected => {
                Block::Growing(GrowingBlock::new(input_width, config, true, rng)?)
            }
        };

        Ok(block)
    }

    pub fn input_width(&self) -> usize {
        match self {
            Block::Forward(b) => b.input_width(),
            Block::Residual(b) => b.input_width(),
            Block::Growing(b) => b.input_width(),
        }
    }

    pub fn output_width(&self) -> usize {
        match self {
            Block::Forward(b) => b.output_width(),
            Block::Residual(b) => b.output_width(),
            Block::Growing(b) => b.output_width(),
        }
    }

    /// Returns the amount of learnable parameters in this block.
    pub fn size(&self) -> usize {
        match self {
            Block::Forward(b) => b.size(),
            Block::Residual(b) => b.size(),
            Block::Growing(b) => b.size(),
        }
    }

    pub fn forward(&mut self, x: ArrayView2<f32>, training: bool) -> Result<Array2<f32>> {
        match self {
            Block::Forward(b) => b.forward(x, training),
            Block::Residual(b) => b.forward(x, training),
            Block::Growing(b) => b.forward(x, training),
        }
    }

    pub fn backward(&mut self, d: ArrayView2<f32>) -> Result<Array2<f32>> {
        match self {
            Block::Forward(b) => b.backward(d),
            Block::Residual(b) => b.backward(d),
            Block::Growing(b) => b.backward(d),
        }
    }

    pub fn params_mut(&mut self) -> Vec<ParamSlot<'_>> {
        match self {
            Block::Forward(b) => b.params_mut(),
            Block::Residual(b) => b.params_mut(),
            Block::Growing(b) => b.params_mut(),
        }
    }
}
