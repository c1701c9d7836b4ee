use ndarray::{Array2, ArrayView2};

use crate::{OfeErr, Result, arch::activations::ActFn};

/// Applies an `ActFn` elementwise, keeping the pre-activations for the backward pass.
#[derive(Clone, Debug)]
pub struct Activation {
    act_fn: ActFn,
    z: Option<Array2<f32>>,
}

impl Activation {
    pub fn new(act_fn: ActFn) -> Self {
        Self { act_fn, z: None }
    }

    pub fn forward(&mut self, z: Array2<f32>) -> Array2<f32> {
        let act_fn = self.act_fn;
        let a = z.mapv(|z| act_fn.f(z));
        self.z = Some(z);
        a
    }

    pub fn backward(&mut self, d: ArrayView2<f32>) -> Result<Array2<f32>> {
        let z = self
            .z
            .as_ref()
            .ok_or(OfeErr::BackwardBeforeForward { what: "activation" })?;

        if z.dim() != d.dim() {
            return Err(OfeErr::SizeMismatch {
                what: "activation delta",
                got: d.len(),
                expected: z.len(),
            });
        }

        let act_fn = self.act_fn;
        let mut d = d.to_owned();
        d.zip_mut_with(z, |d, &z| *d *= act_fn.df(z));
        Ok(d)
    }
}
