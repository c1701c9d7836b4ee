use rand::Rng;
use rand_distr::{Distribution, Uniform};

use crate::Result;

/// How the learnable parameters of a layer get their initial values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamInit {
    /// Always yields the same value.
    Const(f32),
    /// Glorot/Xavier uniform, `U(-r, r)` with `r = sqrt(6 / (fan_in + fan_out))`.
    XavierUniform,
}

impl ParamInit {
    /// Samples `n` initial parameters.
    ///
    /// # Arguments
    /// * `rng` - A random number generator.
    /// * `fan_in` - The number of input units of the layer.
    /// * `fan_out` - The number of output units of the layer.
    /// * `n` - The amount of values to generate.
    ///
    /// # Returns
    /// The sampled values or an error if the computed range is invalid.
    pub fn sample<R: Rng>(
        &self,
        rng: &mut R,
        fan_in: usize,
        fan_out: usize,
        n: usize,
    ) -> Result<Vec<f32>> {
        let range = match *self {
            ParamInit::Const(value) => return Ok(vec![value; n]),
            ParamInit::XavierUniform => (6. / (fan_in + fan_out) as f32).sqrt(),
        };

        let distribution = Uniform::new_inclusive(-range, range)?;
        Ok((0..n).map(|_| distribution.sample(rng)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    #[test]
    fn constant() {
        let mut rng = StdRng::seed_from_u64(42);
        let sample = ParamInit::Const(0.5).sample(&mut rng, 3, 4, 7).unwrap();
        assert_eq!(sample, vec![0.5; 7]);
    }

    #[test]
    fn xavier_stays_in_range() {
        let mut rng = StdRng::seed_from_u64(42);
        let sample = ParamInit::XavierUniform
            .sample(&mut rng, 17, 64, 17 * 64)
            .unwrap();
        let range = (6. / 81_f32).sqrt();

        assert_eq!(sample.len(), 17 * 64);
        assert!(sample.iter().all(|w| w.abs() <= range));
        assert!(sample.iter().any(|&w| w != 0.));
    }

    #[test]
    fn zero_fans_are_rejected() {
        let mut rng = StdRng::seed_from_u64(42);
        assert!(ParamInit::XavierUniform.sample(&mut rng, 0, 0, 4).is_err());
    }
}
