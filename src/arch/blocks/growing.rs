use log::warn;
use ndarray::{Array2, ArrayView2, s};
use rand::Rng;

use super::{BlockConfig, ForwardBlock};
use crate::{
    Result,
    arch::{ParamSlot, layers::Dense, ops::concat_features, sparsifier::Sparsifier},
};

/// The amount of extra units the reprojection adds on top of the block's width.
pub const REPROJECTION_EXTRA_UNITS: usize = 30;

/// Concatenates a forward transform of its input with the input itself, transform first.
///
/// When sparsity is configured and the concatenation is wider than `finalnode`, the concatenated
/// features go through the winner-take-all sparsifier, and the reprojecting variant then maps them
/// to `units + 30` features with an affine projection. Both decisions only depend on widths, so
/// they are taken once when the block is built.
#[derive(Clone, Debug)]
pub struct GrowingBlock {
    transform: ForwardBlock,
    sparsifier: Option<Sparsifier>,
    reprojection: Option<Dense>,
}

impl GrowingBlock {
    /// Creates a new `GrowingBlock`.
    ///
    /// # Arguments
    /// * `input_width` - The width of the incoming features.
    /// * `config` - The block's settings.
    /// * `reproject` - Whether sparsified outputs are projected to `units + 30` features.
    /// * `rng` - The random number generator used to initialize the projections.
    ///
    /// # Returns
    /// A new `GrowingBlock` or an error if `index_k` is out of range or the sparsifier would keep
    /// more winners than the concatenation has features.
    pub fn new<R: Rng>(
        input_width: usize,
        config: &BlockConfig,
        reproject: bool,
        rng: &mut R,
    ) -> Result<Self> {
        let transform = ForwardBlock::new(input_width, config, rng)?;
        let combined_width = transform.output_width() + input_width;

        let mut sparsifier = None;
        if let Some(sparsity) = config.sparsity {
            let candidate = Sparsifier::new(sparsity.index_k)?;
            if sparsity.fires(combined_width) {
                candidate.winners(combined_width)?;
                sparsifier = Some(candidate);
            } else if reproject {
                warn!(
                    "growing block {input_width} -> {combined_width}: width does not exceed \
                     finalnode {}, sparsification and reprojection are skipped",
                    sparsity.finalnode
                );
            }
        }

        let reprojection = if reproject && sparsifier.is_some() {
            let units = config.units + REPROJECTION_EXTRA_UNITS;
            Some(Dense::new((combined_width, units), rng)?)
        } else {
            None
        };

        Ok(Self {
            transform,
            sparsifier,
            reprojection,
        })
    }

    pub fn input_width(&self) -> usize {
        self.transform.input_width()
    }

    pub fn output_width(&self) -> usize {
        match &self.reprojection {
            Some(reprojection) => reprojection.output_width(),
            None => self.transform.output_width() + self.input_width(),
        }
    }

    /// Whether the sparsifier runs on this block's concatenation.
    pub fn is_sparse(&self) -> bool {
        self.sparsifier.is_some()
    }

    pub fn is_reprojected(&self) -> bool {
        self.reprojection.is_some()
    }

    pub fn size(&self) -> usize {
        self.transform.size() + self.reprojection.as_ref().map_or(0, Dense::size)
    }

    pub fn forward(&mut self, x: ArrayView2<f32>, training: bool) -> Result<Array2<f32>> {
        let features = self.transform.forward(x, training)?;
        let mut combined = concat_features(features.view(), x)?;

        if let Some(sparsifier) = &mut self.sparsifier {
            combined = sparsifier.forward(combined.view())?;
        }
        if let Some(reprojection) = &mut self.reprojection {
            combined = reprojection.forward(combined.view())?;
        }

        Ok(combined)
    }

    pub fn backward(&mut self, d: ArrayView2<f32>) -> Result<Array2<f32>> {
        let mut d = d.to_owned();
        if let Some(reprojection) = &mut self.reprojection {
            d = reprojection.backward(d.view())?;
        }
        if let Some(sparsifier) = &mut self.sparsifier {
            d = sparsifier.backward(d.view())?;
        }

        let split = self.transform.output_width();
        let d_x = self.transform.backward(d.slice(s![.., ..split]))?;
        Ok(d_x + d.slice(s![.., split..]))
    }

    pub fn params_mut(&mut self) -> Vec<ParamSlot<'_>> {
        let mut slots = self.transform.params_mut();
        if let Some(reprojection) = &mut self.reprojection {
            slots.push(reprojection.params_mut());
        }

        slots
    }
}
