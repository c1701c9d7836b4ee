use ndarray::{Array1, Array2, ArrayView1, ArrayView2, ArrayViewMut1, Axis};

use crate::{OfeErr, Result, arch::ParamSlot};

const MOMENTUM: f32 = 0.99;
const EPSILON: f32 = 1e-3;

/// Per-feature batch normalization with a learnable scale (`gamma`) and offset (`beta`).
///
/// In training mode the batch statistics are used and folded into the running averages, in
/// inference mode the running averages are used as is.
#[derive(Clone, Debug)]
pub struct BatchNorm {
    dim: usize,
    momentum: f32,
    epsilon: f32,
    params: Box<[f32]>,
    grad: Box<[f32]>,
    running_mean: Array1<f32>,
    running_var: Array1<f32>,

    // Forward metadata
    cache: Option<Cache>,
}

#[derive(Clone, Debug)]
struct Cache {
    x_hat: Array2<f32>,
    inv_std: Array1<f32>,
    training: bool,
}

impl BatchNorm {
    /// Creates a new `BatchNorm` over `dim` features, with `gamma = 1` and `beta = 0`.
    pub fn new(dim: usize) -> Self {
        let mut params = vec![1.; dim];
        params.extend(vec![0.; dim]);

        Self {
            dim,
            momentum: MOMENTUM,
            epsilon: EPSILON,
            params: params.into_boxed_slice(),
            grad: vec![0.; 2 * dim].into_boxed_slice(),
            running_mean: Array1::zeros(dim),
            running_var: Array1::ones(dim),
            cache: None,
        }
    }

    /// Returns the amount of learnable parameters this layer has.
    pub fn size(&self) -> usize {
        2 * self.dim
    }

    pub fn running_mean(&self) -> ArrayView1<'_, f32> {
        self.running_mean.view()
    }

    pub fn running_var(&self) -> ArrayView1<'_, f32> {
        self.running_var.view()
    }

    /// Normalizes `x` with the batch statistics when `training`, with the running ones otherwise.
    ///
    /// A training batch of a single row has zero variance, so every output feature equals `beta`.
    pub fn forward(&mut self, x: ArrayView2<f32>, training: bool) -> Result<Array2<f32>> {
        if x.ncols() != self.dim {
            return Err(OfeErr::SizeMismatch {
                what: "batch norm input width",
                got: x.ncols(),
                expected: self.dim,
            });
        }

        let (mean, var) = if training {
            let mean = x.mean_axis(Axis(0)).ok_or(OfeErr::SizeMismatch {
                what: "batch size",
                got: 0,
                expected: 1,
            })?;
            let var = x.var_axis(Axis(0), 0.);

            let momentum = self.momentum;
            self.running_mean
                .zip_mut_with(&mean, |r, &m| *r = momentum * *r + (1. - momentum) * m);
            self.running_var
                .zip_mut_with(&var, |r, &v| *r = momentum * *r + (1. - momentum) * v);

            (mean, var)
        } else {
            (self.running_mean.clone(), self.running_var.clone())
        };

        let epsilon = self.epsilon;
        let inv_std = var.mapv(|v| 1. / (v + epsilon).sqrt());
        let x_hat = (&x - &mean) * &inv_std;

        let (gamma, beta) = self.params.split_at(self.dim);
        let gamma = ArrayView1::from_shape(self.dim, gamma)?;
        let beta = ArrayView1::from_shape(self.dim, beta)?;
        let y = &x_hat * &gamma + &beta;

        self.cache = Some(Cache {
            x_hat,
            inv_std,
            training,
        });

        Ok(y)
    }

    /// Writes the gradient of `gamma` and `beta` and returns the delta of the input.
    pub fn backward(&mut self, d: ArrayView2<f32>) -> Result<Array2<f32>> {
        let Cache {
            x_hat,
            inv_std,
            training,
        } = self
            .cache
            .as_ref()
            .ok_or(OfeErr::BackwardBeforeForward { what: "batch norm" })?;

        if d.dim() != x_hat.dim() {
            return Err(OfeErr::SizeMismatch {
                what: "batch norm delta",
                got: d.len(),
                expected: x_hat.len(),
            });
        }

        let (dgamma_raw, dbeta_raw) = self.grad.split_at_mut(self.dim);
        ArrayViewMut1::from_shape(self.dim, dgamma_raw)?.assign(&(&d * x_hat).sum_axis(Axis(0)));
        ArrayViewMut1::from_shape(self.dim, dbeta_raw)?.assign(&d.sum_axis(Axis(0)));

        let gamma = ArrayView1::from_shape(self.dim, &self.params[..self.dim])?;
        let dx_hat = &d * &gamma;

        if !*training {
            return Ok(dx_hat * inv_std);
        }

        // dx = inv_std / n * (n * dx_hat - sum(dx_hat) - x_hat * sum(dx_hat * x_hat))
        let n = d.nrows() as f32;
        let sum_dx_hat = dx_hat.sum_axis(Axis(0));
        let sum_dx_hat_x_hat = (&dx_hat * x_hat).sum_axis(Axis(0));
        let dx = (dx_hat * n - &sum_dx_hat - x_hat * &sum_dx_hat_x_hat) * &(inv_std / n);

        Ok(dx)
    }

    pub fn params_mut(&mut self) -> ParamSlot<'_> {
        ParamSlot::new(&mut self.params, &mut self.grad)
    }
}
