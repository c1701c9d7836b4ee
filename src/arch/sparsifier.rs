//! Winner-take-all sparsification.
//!
//! Per row only the values ranked in the top `k` survive, everything below the value at rank `k`
//! is zeroed and the survivors are rectified. The threshold is a value, not a set of indices, so
//! every element tied with the `k`-th largest one is kept as well and a row can end up with more
//! than `k` winners.

use ndarray::{Array2, ArrayView1, ArrayView2, Zip};

use crate::{OfeErr, Result};

/// The hard floor on the amount of winners per row.
pub const MIN_WINNERS: usize = 10;

/// Returns the amount of winners kept per row of a `width` wide input, that is
/// `max(round(width * index_k), MIN_WINNERS)`.
///
/// Rounding is half-to-even, so `round(2.5) == 2`.
///
/// # Errors
/// `OfeErr::SparsityExceedsWidth` when the result is larger than `width`.
pub fn winners(width: usize, index_k: f64) -> Result<usize> {
    let k = ((width as f64 * index_k).round_ties_even() as usize).max(MIN_WINNERS);

    if k > width {
        return Err(OfeErr::SparsityExceedsWidth { k, width });
    }

    Ok(k)
}

/// Keeps the values that are greater or equal than the `k`-th largest value of their row and
/// rectifies them, every other value becomes zero. The width is never changed.
///
/// # Errors
/// `OfeErr::SparsityExceedsWidth` if `k` is zero or larger than the width of `x`.
pub fn sparsify(x: ArrayView2<f32>, k: usize) -> Result<Array2<f32>> {
    if k == 0 || k > x.ncols() {
        return Err(OfeErr::SparsityExceedsWidth {
            k,
            width: x.ncols(),
        });
    }

    let mut y = Array2::zeros(x.raw_dim());

    Zip::from(y.rows_mut())
        .and(x.rows())
        .par_for_each(|mut y_row, x_row| {
            let threshold = kth_largest(x_row, k);
            y_row.zip_mut_with(&x_row, |y, &x| {
                *y = if x < threshold { 0. } else { x.max(0.) };
            });
        });

    Ok(y)
}

fn kth_largest(row: ArrayView1<f32>, k: usize) -> f32 {
    let mut values = row.to_vec();
    let (_, kth, _) = values.select_nth_unstable_by(k - 1, |a, b| b.total_cmp(a));
    *kth
}

/// The differentiable sparsification step of a growing block.
///
/// The gradient flows only through the entries that came out strictly positive; the threshold
/// itself is treated as a constant.
#[derive(Clone, Debug)]
pub struct Sparsifier {
    index_k: f64,

    // Forward metadata
    mask: Option<Array2<f32>>,
}

impl Sparsifier {
    /// Creates a new `Sparsifier`.
    ///
    /// # Arguments
    /// * `index_k` - The fraction of the current width to keep, in `(0, 1]`.
    ///
    /// # Returns
    /// A new `Sparsifier` or an error if `index_k` is out of range.
    pub fn new(index_k: f64) -> Result<Self> {
        if !(index_k > 0. && index_k <= 1.) {
            return Err(OfeErr::InvalidConfig(format!(
                "index_k must be in (0, 1], got {index_k}"
            )));
        }

        Ok(Self {
            index_k,
            mask: None,
        })
    }

    /// Returns the amount of winners kept for a `width` wide input.
    pub fn winners(&self, width: usize) -> Result<usize> {
        winners(width, self.index_k)
    }

    pub fn forward(&mut self, x: ArrayView2<f32>) -> Result<Array2<f32>> {
        let k = self.winners(x.ncols())?;
        let y = sparsify(x, k)?;

        self.mask = Some(y.mapv(|y| if y > 0. { 1. } else { 0. }));
        Ok(y)
    }

    pub fn backward(&mut self, d: ArrayView2<f32>) -> Result<Array2<f32>> {
        let mask = self
            .mask
            .as_ref()
            .ok_or(OfeErr::BackwardBeforeForward { what: "sparsifier" })?;

        if mask.dim() != d.dim() {
            return Err(OfeErr::SizeMismatch {
                what: "sparsifier delta",
                got: d.len(),
                expected: mask.len(),
            });
        }

        Ok(&d * mask)
    }
}
