//! Feature extractors turn raw states, and state-action pairs, into the representations a policy
//! consumes.

mod feature_extractor;
mod ofenet;
mod raw;

pub use feature_extractor::FeatureExtractor;
pub use ofenet::OfeNet;
pub use raw::RawExtractor;

use log::info;
use rand::Rng;

use crate::{
    Result,
    config::{ExtractorConfig, OptimizerConfig},
};

/// Builds the extractor described by `config`.
///
/// # Arguments
/// * `config` - Which extractor to build and its settings.
/// * `optimizer` - The optimizer used on every parameter group of a trainable extractor.
/// * `rng` - The random number generator used to initialize the parameters.
pub fn build<R: Rng>(
    config: &ExtractorConfig,
    optimizer: OptimizerConfig,
    rng: &mut R,
) -> Result<Box<dyn FeatureExtractor + Send>> {
    let extractor: Box<dyn FeatureExtractor + Send> = match config {
        ExtractorConfig::Ofe(ofe) => Box::new(OfeNet::new(ofe, optimizer, rng)?),
        ExtractorConfig::Raw {
            dim_state,
            dim_action,
        } => Box::new(RawExtractor::new(*dim_state, *dim_action)),
    };

    info!(
        "feature extractor: states {} -> {}, state-actions {} -> {}",
        extractor.dim_state(),
        extractor.dim_state_features(),
        extractor.dim_state() + extractor.dim_action(),
        extractor.dim_state_action_features()
    );

    Ok(extractor)
}
