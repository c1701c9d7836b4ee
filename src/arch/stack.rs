use log::debug;
use ndarray::{Array2, ArrayView2};
use rand::Rng;

use super::{
    ParamSlot,
    blocks::{Block, BlockConfig, BlockStyle},
};
use crate::{OfeErr, Result};

/// An ordered list of blocks of the same style, the output of each one being the input of the
/// next.
///
/// Every boundary width is known once the stack is built, so shape errors surface on the very
/// first pass and sparsity settings that can never hold are rejected by `build`.
#[derive(Clone, Debug)]
pub struct ExtractorStack {
    input_width: usize,
    blocks: Vec<Block>,
}

impl ExtractorStack {
    /// Builds a new `ExtractorStack`.
    ///
    /// # Arguments
    /// * `input_width` - The width of the raw input.
    /// * `style` - How every block is connected.
    /// * `configs` - The settings of each block, in order.
    /// * `rng` - The random number generator used to initialize the parameters.
    ///
    /// # Returns
    /// The stack, or the configuration error of the first block that couldn't be built.
    pub fn build<R: Rng>(
        input_width: usize,
        style: BlockStyle,
        configs: &[BlockConfig],
        rng: &mut R,
    ) -> Result<Self> {
        if input_width == 0 {
            return Err(OfeErr::InvalidConfig(
                "stack input width must be non-zero".to_string(),
            ));
        }

        let mut blocks = Vec::with_capacity(configs.len());
        let mut width = input_width;

        for (i, config) in configs.iter().enumerate() {
            let block = Block::build(style, width, config, rng)?;
            debug!(
                "{style} block {i}: {width} -> {} ({} params)",
                block.output_width(),
                block.size()
            );

            width = block.output_width();
            blocks.push(block);
        }

        Ok(Self {
            input_width,
            blocks,
        })
    }

    /// Builds a stack of `num_layers` identically configured blocks.
    pub fn uniform<R: Rng>(
        input_width: usize,
        style: BlockStyle,
        config: BlockConfig,
        num_layers: usize,
        rng: &mut R,
    ) -> Result<Self> {
        Self::build(input_width, style, &vec![config; num_layers], rng)
    }

    pub fn input_width(&self) -> usize {
        self.input_width
    }

    pub fn output_width(&self) -> usize {
        self.blocks
            .last()
            .map_or(self.input_width, Block::output_width)
    }

    /// Returns every boundary width, from the input to the last block's output.
    pub fn widths(&self) -> Vec<usize> {
        std::iter::once(self.input_width)
            .chain(self.blocks.iter().map(Block::output_width))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Returns the amount of learnable parameters in the stack.
    pub fn size(&self) -> usize {
        self.blocks.iter().map(Block::size).sum()
    }

    /// Threads `x` through every block in order.
    ///
    /// # Arguments
    /// * `x` - A `batch x input_width` matrix.
    /// * `training` - Whether normalization uses (and updates) batch statistics.
    pub fn forward(&mut self, x: ArrayView2<f32>, training: bool) -> Result<Array2<f32>> {
        if x.ncols() != self.input_width {
            return Err(OfeErr::SizeMismatch {
                what: "stack input width",
                got: x.ncols(),
                expected: self.input_width,
            });
        }

        if x.nrows() == 0 {
            return Err(OfeErr::SizeMismatch {
                what: "batch size",
                got: 0,
                expected: 1,
            });
        }

        let mut x = x.to_owned();
        for block in &mut self.blocks {
            x = block.forward(x.view(), training)?;
        }

        Ok(x)
    }

    /// Runs the blocks in reverse, writing every parameter gradient, and returns the delta of the
    /// stack's input.
    pub fn backward(&mut self, d: ArrayView2<f32>) -> Result<Array2<f32>> {
        if d.ncols() != self.output_width() {
            return Err(OfeErr::SizeMismatch {
                what: "stack delta width",
                got: d.ncols(),
                expected: self.output_width(),
            });
        }

        let mut d = d.to_owned();
        for block in self.blocks.iter_mut().rev() {
            d = block.backward(d.view())?;
        }

        Ok(d)
    }

    pub fn params_mut(&mut self) -> Vec<ParamSlot<'_>> {
        self.blocks.iter_mut().flat_map(Block::params_mut).collect()
    }
}
