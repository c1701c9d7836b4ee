use std::{fmt, str::FromStr};

use crate::{OfeErr, arch::activations::ActFn};

/// How the blocks of a stack are connected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockStyle {
    /// `act(norm(fc(x)))`.
    Forward,
    /// Two projections with a zero-padded skip connection.
    Residual,
    /// The transform is concatenated with its input, widening the features.
    Growing,
    /// A growing block that projects its sparsified output once more.
    GrowingReprojected,
}

impl BlockStyle {
    pub fn name(&self) -> &'static str {
        match self {
            BlockStyle::Forward => "forward",
            BlockStyle::Residual => "residual",
            BlockStyle::Growing => "growing",
            BlockStyle::GrowingReprojected => "growing_reprojected",
        }
    }
}

impl FromStr for BlockStyle {
    type Err = OfeErr;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let style = match s.trim().to_ascii_lowercase().as_str() {
            "forward" | "normal" | "mlp" => BlockStyle::Forward,
            "residual" | "resnet" => BlockStyle::Residual,
            "growing" | "densenet" | "dense" => BlockStyle::Growing,
            "growing_reprojected" | "densenet_addfc" => BlockStyle::GrowingReprojected,
            _ => return Err(OfeErr::UnknownBlock(s.to_string())),
        };

        Ok(style)
    }
}

impl fmt::Display for BlockStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Winner-take-all settings of a growing block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SparsityConfig {
    /// Fraction of the concatenated width kept per row, in `(0, 1]`.
    pub index_k: f64,
    /// Sparsification only runs when the concatenated width is strictly larger than this.
    pub finalnode: f64,
}

impl SparsityConfig {
    /// Whether sparsification runs on a `width` wide concatenation.
    pub fn fires(&self, width: usize) -> bool {
        self.finalnode < width as f64
    }
}

/// The immutable settings of one block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockConfig {
    /// Width of the block's projection(s).
    pub units: usize,
    pub act_fn: ActFn,
    pub batchnorm: bool,
    /// Only honoured by growing blocks.
    pub sparsity: Option<SparsityConfig>,
}

impl BlockConfig {
    pub fn new(units: usize, act_fn: ActFn) -> Self {
        Self {
            units,
            act_fn,
            batchnorm: false,
            sparsity: None,
        }
    }

    pub fn with_batchnorm(mut self, batchnorm: bool) -> Self {
        self.batchnorm = batchnorm;
        self
    }

    pub fn with_sparsity(mut self, sparsity: Option<SparsityConfig>) -> Self {
        self.sparsity = sparsity;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_styles_and_their_aliases() {
        assert_eq!("forward".parse::<BlockStyle>().unwrap(), BlockStyle::Forward);
        assert_eq!("resnet".parse::<BlockStyle>().unwrap(), BlockStyle::Residual);
        assert_eq!("Densenet".parse::<BlockStyle>().unwrap(), BlockStyle::Growing);
        assert_eq!(
            "growing_reprojected".parse::<BlockStyle>().unwrap(),
            BlockStyle::GrowingReprojected
        );
    }

    #[test]
    fn unknown_style_is_an_error() {
        assert!(matches!(
            "transformer".parse::<BlockStyle>(),
            Err(OfeErr::UnknownBlock(_))
        ));
    }

    #[test]
    fn sparsity_fires_strictly_above_finalnode() {
        let sparsity = SparsityConfig {
            index_k: 0.2,
            finalnode: 81.,
        };
        assert!(!sparsity.fires(81));
        assert!(sparsity.fires(82));
    }
}
