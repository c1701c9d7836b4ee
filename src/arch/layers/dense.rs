use ndarray::{Array2, ArrayView1, ArrayView2, ArrayViewMut1, ArrayViewMut2, Axis, linalg};
use rand::Rng;

use crate::{OfeErr, Result, arch::ParamSlot, initialization::ParamInit};

/// An affine projection `x·W + b` from `dim.0` to `dim.1` features.
///
/// The parameters are kept in one flat buffer, weights first (row major, `dim.0 x dim.1`) and then
/// biases, so an optimizer can update the whole layer as a single slot.
#[derive(Clone, Debug)]
pub struct Dense {
    dim: (usize, usize),
    size: usize,
    params: Box<[f32]>,
    grad: Box<[f32]>,

    // Forward metadata
    x: Option<Array2<f32>>,
}

impl Dense {
    /// Creates a new `Dense` layer with Glorot uniform weights and zero biases.
    ///
    /// # Arguments
    /// * `dim` - The input and output widths.
    /// * `rng` - The random number generator used for the weights.
    ///
    /// # Returns
    /// A new `Dense` instance or an error if any of the widths is zero.
    pub fn new<R: Rng>(dim: (usize, usize), rng: &mut R) -> Result<Self> {
        Self::with_init(dim, ParamInit::XavierUniform, ParamInit::Const(0.), rng)
    }

    /// Creates a new `Dense` layer with custom initializers.
    ///
    /// # Arguments
    /// * `dim` - The input and output widths.
    /// * `weights` - The initializer for the weights.
    /// * `biases` - The initializer for the biases.
    /// * `rng` - A random number generator.
    pub fn with_init<R: Rng>(
        dim: (usize, usize),
        weights: ParamInit,
        biases: ParamInit,
        rng: &mut R,
    ) -> Result<Self> {
        let (n, m) = dim;

        if n == 0 || m == 0 {
            return Err(OfeErr::InvalidConfig(format!(
                "affine projection needs non-zero widths, got {n} -> {m}"
            )));
        }

        let mut params = weights.sample(rng, n, m, n * m)?;
        params.extend(biases.sample(rng, n, m, m)?);
        Self::from_params(dim, params)
    }

    /// Creates a new `Dense` layer from an already initialized flat parameter buffer.
    ///
    /// # Arguments
    /// * `dim` - The input and output widths.
    /// * `params` - Weights followed by biases, `(dim.0 + 1) * dim.1` values.
    pub fn from_params(dim: (usize, usize), params: Vec<f32>) -> Result<Self> {
        let size = (dim.0 + 1) * dim.1;

        if params.len() != size {
            return Err(OfeErr::SizeMismatch {
                what: "dense parameters",
                got: params.len(),
                expected: size,
            });
        }

        Ok(Self {
            dim,
            size,
            params: params.into_boxed_slice(),
            grad: vec![0.; size].into_boxed_slice(),
            x: None,
        })
    }

    /// Returns the amount of parameters this layer has.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn input_width(&self) -> usize {
        self.dim.0
    }

    pub fn output_width(&self) -> usize {
        self.dim.1
    }

    pub fn forward(&mut self, x: ArrayView2<f32>) -> Result<Array2<f32>> {
        if x.ncols() != self.dim.0 {
            return Err(OfeErr::SizeMismatch {
                what: "dense input width",
                got: x.ncols(),
                expected: self.dim.0,
            });
        }

        let (w, b) = view_params(self.dim, &self.params)?;
        let mut z = Array2::zeros((x.nrows(), self.dim.1));
        linalg::general_mat_mul(1.0, &x, &w, 0.0, &mut z);
        z += &b;

        self.x = Some(x.to_owned());
        Ok(z)
    }

    /// Writes the gradient of this layer's parameters and returns the delta of its input.
    pub fn backward(&mut self, d: ArrayView2<f32>) -> Result<Array2<f32>> {
        let x = self
            .x
            .as_ref()
            .ok_or(OfeErr::BackwardBeforeForward { what: "dense" })?;

        if d.dim() != (x.nrows(), self.dim.1) {
            return Err(OfeErr::SizeMismatch {
                what: "dense delta",
                got: d.len(),
                expected: x.nrows() * self.dim.1,
            });
        }

        let (mut dw, mut db) = view_grad(self.dim, &mut self.grad)?;
        linalg::general_mat_mul(1.0, &x.t(), &d, 0.0, &mut dw);
        db.assign(&d.sum_axis(Axis(0)));

        let (w, _) = view_params(self.dim, &self.params)?;
        Ok(d.dot(&w.t()))
    }

    pub fn params_mut(&mut self) -> ParamSlot<'_> {
        ParamSlot::new(&mut self.params, &mut self.grad)
    }
}

/// Gives a view of the raw parameter slice as the weights and biases of a layer.
fn view_params(
    dim: (usize, usize),
    params: &[f32],
) -> Result<(ArrayView2<'_, f32>, ArrayView1<'_, f32>)> {
    let (w_raw, b_raw) = params.split_at(dim.0 * dim.1);
    let weights = ArrayView2::from_shape(dim, w_raw)?;
    let biases = ArrayView1::from_shape(dim.1, b_raw)?;
    Ok((weights, biases))
}

/// Gives a view of the raw gradient slice as the delta weights and delta biases of a layer.
fn view_grad(
    dim: (usize, usize),
    grad: &mut [f32],
) -> Result<(ArrayViewMut2<'_, f32>, ArrayViewMut1<'_, f32>)> {
    let (dw_raw, db_raw) = grad.split_at_mut(dim.0 * dim.1);
    let dw = ArrayViewMut2::from_shape(dim, dw_raw)?;
    let db = ArrayViewMut1::from_shape(dim.1, db_raw)?;
    Ok((dw, db))
}
