use std::time::Instant;

use log::{debug, info};
use ndarray::{Array1, Axis};
use rand::Rng;

use super::{Environment, Policy, ReplayBuffer};
use crate::{OfeErr, Result, config::LoopConfig, extractor::FeatureExtractor};

/// The averaged outcome of the deterministic episodes run at an evaluation point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Evaluation {
    pub step: usize,
    pub average_return: f32,
    pub average_length: f32,
    /// Environment steps per second since the previous evaluation point.
    pub throughput: f32,
}

/// What a training run went through.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TrainingReport {
    pub evaluations: Vec<Evaluation>,
    /// Amount of exploration episodes finished.
    pub episodes: usize,
    /// The extractor's loss on its last train step.
    pub last_extractor_loss: Option<f32>,
}

#[derive(Default)]
struct Episode {
    steps: usize,
    ret: f32,
}

/// Drives an environment, a policy and a feature extractor through the collection, pretraining
/// and interleaved training phases.
#[derive(Clone, Copy, Debug)]
pub struct TrainingLoop {
    config: LoopConfig,
}

impl TrainingLoop {
    pub fn new(config: LoopConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &LoopConfig {
        &self.config
    }

    /// Runs the whole schedule.
    ///
    /// The first `random_collect` steps take random actions, then the extractor is trained alone
    /// for `pretrain_steps` batches. Every step after that trains the extractor and the policy
    /// once each, and every `eval_freq` steps the policy is evaluated on `eval_env`.
    ///
    /// # Arguments
    /// * `env` - The environment explored during training.
    /// * `eval_env` - The environment used for evaluation episodes.
    /// * `policy` - The agent being trained.
    /// * `extractor` - The feature extractor the agent acts on.
    /// * `rng` - Used to sample the replay buffer.
    pub fn run<E, P, R>(
        &self,
        env: &mut E,
        eval_env: &mut E,
        policy: &mut P,
        extractor: &mut dyn FeatureExtractor,
        rng: &mut R,
    ) -> Result<TrainingReport>
    where
        E: Environment,
        P: Policy + ?Sized,
        R: Rng,
    {
        for (what, got, expected) in [
            ("environment state width", env.dim_state(), extractor.dim_state()),
            ("environment action width", env.dim_action(), extractor.dim_action()),
        ] {
            if got != expected {
                return Err(OfeErr::SizeMismatch {
                    what,
                    got,
                    expected,
                });
            }
        }

        let LoopConfig {
            steps,
            batch_size,
            random_collect,
            pretrain_steps,
            eval_freq,
            eval_episodes,
            buffer_capacity,
        } = self.config;

        let mut report = TrainingReport::default();
        let mut buffer = ReplayBuffer::new(buffer_capacity, env.dim_state(), env.dim_action())?;
        let mut episode = Episode::default();
        let mut state = env.reset()?;

        let collect = random_collect.min(steps);
        for _ in 0..collect {
            let action = env.sample_action();
            state = transition(env, &mut buffer, state, action, &mut episode, &mut report)?;
        }
        info!(steps = collect; "random collection finished");

        if !buffer.is_empty() {
            for _ in 0..pretrain_steps {
                let batch = buffer.sample(batch_size, rng)?;
                report.last_extractor_loss = Some(extractor.train(&batch)?);
            }

            if let Some(loss) = report.last_extractor_loss {
                info!(steps = pretrain_steps, loss = loss; "extractor pretraining finished");
            }
        }

        let mut clock = Instant::now();
        let mut prev_step = collect;

        for step in collect + 1..=steps {
            let features = extractor.evaluate(state.view().insert_axis(Axis(0)))?;
            let action = policy.select_action(features.row(0), true)?;
            state = transition(env, &mut buffer, state, action, &mut episode, &mut report)?;

            let batch = buffer.sample(batch_size, rng)?;
            report.last_extractor_loss = Some(extractor.train(&batch)?);

            let batch = buffer.sample(batch_size, rng)?;
            policy.train(extractor, &batch)?;

            if step % eval_freq == 0 {
                let elapsed = clock.elapsed().as_secs_f32();
                let throughput = (step - prev_step) as f32 / elapsed.max(f32::EPSILON);

                let (average_return, average_length) =
                    evaluate(eval_env, policy, extractor, eval_episodes)?;

                info!(
                    step = step,
                    average_return = average_return,
                    average_length = average_length,
                    throughput = throughput;
                    "evaluation"
                );

                report.evaluations.push(Evaluation {
                    step,
                    average_return,
                    average_length,
                    throughput,
                });

                clock = Instant::now();
                prev_step = step;
            }
        }

        info!(steps = steps, episodes = report.episodes; "training finished");
        Ok(report)
    }
}

/// Steps `env` once and stores the transition, starting a new episode when the current one ends.
///
/// # Returns
/// The state the next action should be taken from.
fn transition<E: Environment>(
    env: &mut E,
    buffer: &mut ReplayBuffer,
    state: Array1<f32>,
    action: Array1<f32>,
    episode: &mut Episode,
    report: &mut TrainingReport,
) -> Result<Array1<f32>> {
    let step = env.step(action.view())?;
    episode.steps += 1;
    episode.ret += step.reward;

    let timeout = episode.steps >= env.max_episode_steps();
    buffer.push(
        state.view(),
        action.view(),
        step.state.view(),
        step.reward,
        step.done && !timeout,
    )?;

    if !(step.done || timeout) {
        return Ok(step.state);
    }

    debug!(steps = episode.steps, ret = episode.ret; "exploration episode finished");
    report.episodes += 1;
    *episode = Episode::default();
    env.reset()
}

/// Runs `episodes` episodes without exploration noise.
///
/// # Returns
/// The average return and the average episode length.
fn evaluate<E, P>(
    env: &mut E,
    policy: &mut P,
    extractor: &mut dyn FeatureExtractor,
    episodes: usize,
) -> Result<(f32, f32)>
where
    E: Environment,
    P: Policy + ?Sized,
{
    if episodes == 0 {
        return Ok((0., 0.));
    }

    let mut total_return = 0.;
    let mut total_length = 0;

    for _ in 0..episodes {
        let mut state = env.reset()?;

        for length in 1..=env.max_episode_steps() {
            let features = extractor.evaluate(state.view().insert_axis(Axis(0)))?;
            let action = policy.select_action(features.row(0), false)?;
            let step = env.step(action.view())?;

            total_return += step.reward;
            total_length += 1;
            state = step.state;

            if step.done {
                debug!(length = length; "evaluation episode finished");
                break;
            }
        }
    }

    Ok((
        total_return / episodes as f32,
        total_length as f32 / episodes as f32,
    ))
}
