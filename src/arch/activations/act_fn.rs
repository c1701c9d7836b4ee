use std::{fmt, str::FromStr};

use super::{Elu, LeakyRelu, Relu, Sigmoid, Swish};
use crate::OfeErr;

/// The nonlinearities a block can be configured with.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ActFn {
    Relu(Relu),
    LeakyRelu(LeakyRelu),
    Elu(Elu),
    Sigmoid(Sigmoid),
    Swish(Swish),
    Tanh,
    Linear,
}

impl ActFn {
    pub fn relu() -> Self {
        Self::Relu(Relu)
    }

    pub fn sigmoid(amp: f32) -> Self {
        Self::Sigmoid(Sigmoid::new(amp))
    }

    pub fn swish() -> Self {
        Self::Swish(Swish)
    }

    pub fn f(&self, x: f32) -> f32 {
        match self {
            Self::Relu(a) => a.f(x),
            Self::LeakyRelu(a) => a.f(x),
            Self::Elu(a) => a.f(x),
            Self::Sigmoid(a) => a.f(x),
            Self::Swish(a) => a.f(x),
            Self::Tanh => x.tanh(),
            Self::Linear => x,
        }
    }

    pub fn df(&self, x: f32) -> f32 {
        match self {
            Self::Relu(a) => a.df(x),
            Self::LeakyRelu(a) => a.df(x),
            Self::Elu(a) => a.df(x),
            Self::Sigmoid(a) => a.df(x),
            Self::Swish(a) => a.df(x),
            Self::Tanh => 1. - x.tanh().powi(2),
            Self::Linear => 1.,
        }
    }

    /// The identifier this activation is parsed from.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Relu(_) => "relu",
            Self::LeakyRelu(_) => "leaky_relu",
            Self::Elu(_) => "elu",
            Self::Sigmoid(_) => "sigmoid",
            Self::Swish(_) => "swish",
            Self::Tanh => "tanh",
            Self::Linear => "linear",
        }
    }
}

impl FromStr for ActFn {
    type Err = OfeErr;

    /// Accepts plain identifiers (`"swish"`) as well as dotted paths whose last
    /// segment is one (`"tf.nn.swish"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.rsplit('.').next().unwrap_or(s).trim();

        let act_fn = match name.to_ascii_lowercase().as_str() {
            "relu" => Self::relu(),
            "leaky_relu" => Self::LeakyRelu(LeakyRelu::default()),
            "elu" => Self::Elu(Elu::default()),
            "sigmoid" => Self::sigmoid(1.),
            "swish" | "silu" => Self::swish(),
            "tanh" => Self::Tanh,
            "linear" | "identity" => Self::Linear,
            _ => return Err(OfeErr::UnknownActivation(s.to_string())),
        };

        Ok(act_fn)
    }
}

impl fmt::Display for ActFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
