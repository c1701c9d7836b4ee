use std::env;

use anyhow::{Context, bail};
use log::info;
use ndarray::{Array1, Array2};
use ndarray_rand::{RandomExt, rand_distr::Uniform};

use ofenet::{
    config::Config,
    extractor::{self, FeatureExtractor},
    training::TransitionBatch,
};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let Some(path) = env::args().nth(1) else {
        bail!("usage: ofenet <config.json>");
    };

    let config = Config::from_file(&path).with_context(|| format!("loading {path}"))?;
    let mut rng = config.runtime.rng();

    let mut extractor = extractor::build(&config.extractor, config.optimizer, &mut rng)?;
    let (dim_state, dim_action) = (extractor.dim_state(), extractor.dim_action());
    let batch_size = config.training.batch_size;

    let dist = Uniform::new(-1f32, 1f32)?;
    let states = Array2::random_using((batch_size, dim_state), dist, &mut rng);
    let actions = Array2::random_using((batch_size, dim_action), dist, &mut rng);

    let state_features = extractor.evaluate(states.view())?;
    let state_action_features =
        extractor.features_from_states_actions(states.view(), actions.view(), false)?;

    let batch = TransitionBatch {
        next_states: Array2::random_using((batch_size, dim_state), dist, &mut rng),
        rewards: Array1::zeros(batch_size),
        dones: Array1::zeros(batch_size),
        states,
        actions,
    };
    let loss = extractor.train(&batch)?;
    info!(loss = loss; "sample train step");

    println!("state features: {dim_state} -> {}", state_features.ncols());
    println!(
        "state-action features: {} -> {}",
        dim_state + dim_action,
        state_action_features.ncols()
    );
    println!("sample loss: {loss:.6}");

    Ok(())
}
