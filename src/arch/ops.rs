use ndarray::{Array2, ArrayView2, Axis, concatenate, s};

use crate::{OfeErr, Result};

/// Zero-pads `x` on the right (trailing columns) up to `width`. Never truncates: if `x` is already
/// at least `width` wide it is returned unchanged.
pub fn pad_right(x: ArrayView2<f32>, width: usize) -> Array2<f32> {
    if x.ncols() >= width {
        return x.to_owned();
    }

    let mut padded = Array2::zeros((x.nrows(), width));
    padded.slice_mut(s![.., ..x.ncols()]).assign(&x);
    padded
}

/// Concatenates `a` and `b` along the feature axis, `a`'s columns first.
pub fn concat_features(a: ArrayView2<f32>, b: ArrayView2<f32>) -> Result<Array2<f32>> {
    if a.nrows() != b.nrows() {
        return Err(OfeErr::SizeMismatch {
            what: "batch size",
            got: b.nrows(),
            expected: a.nrows(),
        });
    }

    Ok(concatenate(Axis(1), &[a, b])?)
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    #[test]
    fn pads_trailing_columns_only() {
        let x = array![[1., 2.], [3., 4.]];
        let padded = pad_right(x.view(), 4);
        assert_eq!(padded, array![[1., 2., 0., 0.], [3., 4., 0., 0.]]);
    }

    #[test]
    fn never_truncates() {
        let x = array![[1., 2., 3.]];
        assert_eq!(pad_right(x.view(), 2), x);
    }

    #[test]
    fn concatenation_keeps_order() {
        let a = array![[1.], [2.]];
        let b = array![[3., 4.], [5., 6.]];
        let c = concat_features(a.view(), b.view()).unwrap();
        assert_eq!(c, array![[1., 3., 4.], [2., 5., 6.]]);
    }

    #[test]
    fn concatenation_rejects_batch_mismatch() {
        let a = array![[1.], [2.]];
        let b = array![[3.]];
        assert!(matches!(
            concat_features(a.view(), b.view()),
            Err(OfeErr::SizeMismatch { what: "batch size", .. })
        ));
    }
}
