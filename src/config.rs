//! The JSON configuration of the extractor, its optimizer, the training loop and the runtime.

use std::{fs, path::Path};

use rand::{SeedableRng, rngs::StdRng};
use serde::{Deserialize, Deserializer, Serialize};

use crate::{
    OfeErr, Result,
    arch::{
        activations::ActFn,
        blocks::{BlockConfig, BlockStyle, SparsityConfig},
    },
    optimization::{Adam, GradientDescent, Optimizer, adam},
};

/// The whole configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub extractor: ExtractorConfig,
    #[serde(default)]
    pub optimizer: OptimizerConfig,
    #[serde(default)]
    pub training: LoopConfig,
    #[serde(default)]
    pub runtime: RuntimeConfig,
}

impl Config {
    /// Reads and validates a configuration file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        raw.parse()
    }
}

impl std::str::FromStr for Config {
    type Err = OfeErr;

    fn from_str(s: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(s)?;
        if let ExtractorConfig::Ofe(ofe) = &config.extractor {
            ofe.validate()?;
        }
        config.training.validate()?;

        Ok(config)
    }
}

/// Which feature extractor to build.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum ExtractorConfig {
    Ofe(OfeConfig),
    Raw { dim_state: usize, dim_action: usize },
}

/// The settings of an OFENet extractor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfeConfig {
    pub dim_state: usize,
    pub dim_action: usize,
    /// The amount of leading state features predicted by the auxiliary task, all of them if
    /// missing.
    #[serde(default)]
    pub dim_output: Option<usize>,
    #[serde(default = "default_total_units")]
    pub total_units: usize,
    #[serde(default = "default_num_layers")]
    pub num_layers: usize,
    #[serde(default = "default_activation")]
    pub activation: String,
    #[serde(default = "default_block")]
    pub block: String,
    #[serde(default, deserialize_with = "flag")]
    pub wta: bool,
    #[serde(default = "default_index_k")]
    pub index_k: f64,
    #[serde(default)]
    pub finalnode: f64,
    #[serde(default = "default_batchnorm")]
    pub batchnorm: bool,
    #[serde(default)]
    pub skip_action_branch: bool,
}

fn default_total_units() -> usize {
    240
}

fn default_num_layers() -> usize {
    6
}

fn default_activation() -> String {
    "swish".to_string()
}

fn default_block() -> String {
    "growing".to_string()
}

fn default_index_k() -> f64 {
    0.2
}

fn default_batchnorm() -> bool {
    true
}

/// Accepts both `true`/`false` and `1`/`0`.
fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => b,
        Flag::Int(i) => i != 0,
    })
}

impl OfeConfig {
    /// Creates a configuration with every optional setting at its default.
    pub fn new(dim_state: usize, dim_action: usize) -> Self {
        Self {
            dim_state,
            dim_action,
            dim_output: None,
            total_units: default_total_units(),
            num_layers: default_num_layers(),
            activation: default_activation(),
            block: default_block(),
            wta: false,
            index_k: default_index_k(),
            finalnode: 0.,
            batchnorm: default_batchnorm(),
            skip_action_branch: false,
        }
    }

    /// Returns the width of the auxiliary prediction target.
    pub fn dim_output(&self) -> usize {
        self.dim_output.unwrap_or(self.dim_state)
    }

    pub fn style(&self) -> Result<BlockStyle> {
        self.block.parse()
    }

    pub fn act_fn(&self) -> Result<ActFn> {
        self.activation.parse()
    }

    /// Returns the settings shared by every block of both stacks.
    pub fn block_config(&self) -> Result<BlockConfig> {
        let sparsity = self.wta.then_some(SparsityConfig {
            index_k: self.index_k,
            finalnode: self.finalnode,
        });

        Ok(BlockConfig::new(self.total_units, self.act_fn()?)
            .with_batchnorm(self.batchnorm)
            .with_sparsity(sparsity))
    }

    /// Checks everything that doesn't need the stacks to be built.
    pub fn validate(&self) -> Result<()> {
        let zero = [
            ("dim_state", self.dim_state),
            ("dim_action", self.dim_action),
            ("total_units", self.total_units),
            ("dim_output", self.dim_output()),
        ]
        .into_iter()
        .find(|(_, value)| *value == 0);

        if let Some((name, _)) = zero {
            return Err(OfeErr::InvalidConfig(format!("{name} must be non-zero")));
        }

        if self.dim_output() > self.dim_state {
            return Err(OfeErr::InvalidConfig(format!(
                "dim_output {} is larger than dim_state {}",
                self.dim_output(),
                self.dim_state
            )));
        }

        self.style()?;
        self.act_fn()?;

        Ok(())
    }
}

/// The `Optimizer` built for every parameter group.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizerConfig {
    Adam {
        #[serde(default = "default_learning_rate")]
        learning_rate: f32,
        #[serde(default = "default_beta1")]
        beta1: f32,
        #[serde(default = "default_beta2")]
        beta2: f32,
        #[serde(default = "default_epsilon")]
        epsilon: f32,
    },
    GradientDescent {
        learning_rate: f32,
    },
}

fn default_learning_rate() -> f32 {
    adam::DEFAULT_LEARNING_RATE
}

fn default_beta1() -> f32 {
    adam::DEFAULT_BETA1
}

fn default_beta2() -> f32 {
    adam::DEFAULT_BETA2
}

fn default_epsilon() -> f32 {
    adam::DEFAULT_EPSILON
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        OptimizerConfig::Adam {
            learning_rate: default_learning_rate(),
            beta1: default_beta1(),
            beta2: default_beta2(),
            epsilon: default_epsilon(),
        }
    }
}

impl OptimizerConfig {
    /// Builds an optimizer for a group of `len` parameters.
    pub fn build(&self, len: usize) -> Box<dyn Optimizer + Send> {
        match *self {
            OptimizerConfig::Adam {
                learning_rate,
                beta1,
                beta2,
                epsilon,
            } => Box::new(Adam::new(len, learning_rate, beta1, beta2, epsilon)),
            OptimizerConfig::GradientDescent { learning_rate } => {
                Box::new(GradientDescent::new(learning_rate))
            }
        }
    }
}

/// The schedule of the training loop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopConfig {
    /// Total environment steps.
    pub steps: usize,
    pub batch_size: usize,
    /// Steps taken with random actions before the policy acts.
    pub random_collect: usize,
    /// Extractor train steps run once the random collection is over.
    pub pretrain_steps: usize,
    pub eval_freq: usize,
    pub eval_episodes: usize,
    pub buffer_capacity: usize,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            steps: 1_020_000,
            batch_size: 256,
            random_collect: 10_000,
            pretrain_steps: 10_000,
            eval_freq: 5_000,
            eval_episodes: 10,
            buffer_capacity: 1_000_000,
        }
    }
}

impl LoopConfig {
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("batch_size", self.batch_size),
            ("eval_freq", self.eval_freq),
            ("buffer_capacity", self.buffer_capacity),
        ] {
            if value == 0 {
                return Err(OfeErr::InvalidConfig(format!("{name} must be non-zero")));
            }
        }

        Ok(())
    }
}

/// Process wide settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Seeds every random number generator, the OS entropy source is used when missing.
    pub seed: Option<u64>,
}

impl RuntimeConfig {
    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_defaults() {
        let config: Config =
            r#"{ "extractor": { "name": "ofe", "dim_state": 17, "dim_action": 6 } }"#
                .parse()
                .unwrap();

        let ExtractorConfig::Ofe(ofe) = config.extractor else {
            panic!("expected an ofe extractor");
        };
        assert_eq!(ofe, OfeConfig::new(17, 6));
        assert_eq!(ofe.dim_output(), 17);
        assert_eq!(config.optimizer, OptimizerConfig::default());
        assert_eq!(config.training, LoopConfig::default());
        assert_eq!(config.runtime.seed, None);
    }

    #[test]
    fn wta_accepts_integers() {
        let ofe: OfeConfig =
            serde_json::from_str(r#"{ "dim_state": 3, "dim_action": 1, "wta": 1 }"#).unwrap();
        assert!(ofe.wta);

        let ofe: OfeConfig =
            serde_json::from_str(r#"{ "dim_state": 3, "dim_action": 1, "wta": false }"#).unwrap();
        assert!(!ofe.wta);
    }

    #[test]
    fn unknown_block_and_activation_are_rejected() {
        let mut ofe = OfeConfig::new(3, 1);
        ofe.block = "lstm".to_string();
        assert!(matches!(ofe.validate(), Err(OfeErr::UnknownBlock(_))));

        let mut ofe = OfeConfig::new(3, 1);
        ofe.activation = "gelu".to_string();
        assert!(matches!(ofe.validate(), Err(OfeErr::UnknownActivation(_))));
    }

    #[test]
    fn zero_widths_are_rejected() {
        let mut ofe = OfeConfig::new(3, 1);
        ofe.total_units = 0;
        assert!(matches!(ofe.validate(), Err(OfeErr::InvalidConfig(_))));

        let mut ofe = OfeConfig::new(3, 1);
        ofe.dim_output = Some(4);
        assert!(ofe.validate().is_err());
    }

    #[test]
    fn optimizer_is_externally_tagged() {
        let optimizer: OptimizerConfig =
            serde_json::from_str(r#"{ "gradient_descent": { "learning_rate": 0.1 } }"#).unwrap();
        assert_eq!(
            optimizer,
            OptimizerConfig::GradientDescent { learning_rate: 0.1 }
        );

        let optimizer: OptimizerConfig = serde_json::from_str(r#"{ "adam": {} }"#).unwrap();
        assert_eq!(optimizer, OptimizerConfig::default());
    }

    #[test]
    fn seeded_runtimes_are_reproducible() {
        use rand::Rng;

        let runtime = RuntimeConfig { seed: Some(3) };
        let a: u64 = runtime.rng().random();
        let b: u64 = runtime.rng().random();
        assert_eq!(a, b);
    }
}
