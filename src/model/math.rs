//! Dense vector/matrix kernel for the toy model, on `ndarray`.
//!
//! All functions are pure and deterministic. Shape mismatches are
//! programming errors: every function checks its preconditions with
//! `assert!` and panics instead of broadcasting or reshaping.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use rand::{Rng, SeedableRng, rngs::StdRng};

/// Row-major dense matrix.
pub type Matrix = Array2<f32>;

/// Dense vector.
pub type Vector = Array1<f32>;

/// Epsilon used by [`layer_norm`].
pub const LAYER_NORM_EPS: f32 = 1e-5;

/// Dot product of two equal-length vectors.
///
/// # Panics
///
/// Panics if the lengths differ.
pub fn dot(a: ArrayView1<'_, f32>, b: ArrayView1<'_, f32>) -> f32 {
    assert_eq!(a.len(), b.len(), "dot: length mismatch");
    a.dot(&b)
}

/// Element-wise sum of two equal-length vectors.
///
/// # Panics
///
/// Panics if the lengths differ.
pub fn add_vec(a: ArrayView1<'_, f32>, b: ArrayView1<'_, f32>) -> Vector {
    assert_eq!(a.len(), b.len(), "add_vec: length mismatch");
    &a + &b
}

/// Numerically stable softmax.
///
/// The maximum is subtracted before exponentiating, so `-inf` entries come
/// out as exactly zero. An all-`-inf` row degrades to a uniform distribution.
pub fn softmax(logits: ArrayView1<'_, f32>) -> Vector {
    if logits.is_empty() {
        return Vector::zeros(0);
    }
    let max = logits.fold(f32::NEG_INFINITY, |m, &x| m.max(x));
    if max == f32::NEG_INFINITY {
        return Vector::from_elem(logits.len(), 1.0 / logits.len() as f32);
    }
    let exps = logits.mapv(|x| (x - max).exp());
    let sum = exps.sum();
    exps / sum
}

/// Row-wise [`softmax`].
pub fn softmax_rows(scores: ArrayView2<'_, f32>) -> Matrix {
    let mut out = scores.to_owned();
    for mut row in out.rows_mut() {
        let probs = softmax(row.view());
        row.assign(&probs);
    }
    out
}

/// Multiplies a matrix given in `[out][in]` layout by a vector.
///
/// # Panics
///
/// Panics if the column count differs from `v.len()`.
pub fn matvec(matrix_t: ArrayView2<'_, f32>, v: ArrayView1<'_, f32>) -> Vector {
    assert_eq!(matrix_t.ncols(), v.len(), "matvec: dimension mismatch");
    matrix_t.dot(&v)
}

/// Multiplies a row vector by a matrix in `[in][out]` layout.
///
/// # Panics
///
/// Panics if `v.len()` differs from the number of matrix rows.
pub fn vec_matmul(v: ArrayView1<'_, f32>, matrix: ArrayView2<'_, f32>) -> Vector {
    assert_eq!(v.len(), matrix.nrows(), "vec_matmul: dimension mismatch");
    v.dot(&matrix)
}

/// Matrix product `a · b`.
///
/// # Panics
///
/// Panics if the inner dimensions differ.
pub fn matmul(a: ArrayView2<'_, f32>, b: ArrayView2<'_, f32>) -> Matrix {
    assert_eq!(a.ncols(), b.nrows(), "matmul: dimension mismatch");
    a.dot(&b)
}

/// Owned transpose.
pub fn transpose(m: ArrayView2<'_, f32>) -> Matrix {
    m.t().to_owned()
}

/// Sets every entry above the diagonal to `-inf`.
///
/// # Panics
///
/// Panics if `scores` is not square.
pub fn apply_causal_mask(scores: ArrayView2<'_, f32>) -> Matrix {
    assert!(scores.is_square(), "apply_causal_mask: matrix must be square");
    let mut masked = scores.to_owned();
    for ((i, j), value) in masked.indexed_iter_mut() {
        if j > i {
            *value = f32::NEG_INFINITY;
        }
    }
    masked
}

/// Layer normalization without learned scale or shift.
pub fn layer_norm(v: ArrayView1<'_, f32>) -> Vector {
    if v.is_empty() {
        return Vector::zeros(0);
    }
    let n = v.len() as f32;
    let mean = v.sum() / n;
    let var = v.fold(0.0, |acc, &x| acc + (x - mean).powi(2)) / n;
    let denom = (var + LAYER_NORM_EPS).sqrt();
    v.mapv(|x| (x - mean) / denom)
}

/// [`layer_norm`] applied to every row.
pub fn layer_norm_rows(m: ArrayView2<'_, f32>) -> Matrix {
    let mut out = m.to_owned();
    for mut row in out.axis_iter_mut(Axis(0)) {
        let normed = layer_norm(row.view());
        row.assign(&normed);
    }
    out
}

/// GELU activation (tanh approximation).
pub fn gelu(x: f32) -> f32 {
    const SQRT_2_OVER_PI: f32 = 0.797_884_6;
    0.5 * x * (1.0 + (SQRT_2_OVER_PI * (x + 0.044_715 * x * x * x)).tanh())
}

/// Element-wise GELU.
pub fn gelu_vec(v: ArrayView1<'_, f32>) -> Vector {
    v.mapv(gelu)
}

/// Seeded pseudo-random matrix with entries in `[-0.5, 0.5)`.
pub fn random_matrix(rows: usize, cols: usize, seed: u64) -> Matrix {
    random_matrix_scaled(rows, cols, seed, 1.0)
}

/// Seeded pseudo-random matrix with entries in `[-0.5, 0.5) * scale`.
///
/// Each call builds its own generator from `seed` and fills row by row, so
/// the result never depends on call order or on other generators.
pub fn random_matrix_scaled(rows: usize, cols: usize, seed: u64, scale: f32) -> Matrix {
    let mut rng = StdRng::seed_from_u64(seed);
    Matrix::from_shape_simple_fn((rows, cols), || (rng.gen_range(0.0f32..1.0) - 0.5) * scale)
}

/// Index of the largest value; ties resolve to the lowest index.
pub fn argmax(v: ArrayView1<'_, f32>) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &x) in v.iter().enumerate() {
        match best {
            Some((_, b)) if x <= b => {}
            _ => best = Some((i, x)),
        }
    }
    best.map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use ndarray::{arr1, arr2, aview1};

    use super::*;

    #[test]
    fn test_softmax_uniform_and_single() {
        assert_eq!(softmax(aview1(&[3.0])), arr1(&[1.0f32]));
        let probs = softmax(aview1(&[2.0, 2.0, 2.0, 2.0]));
        for p in probs.iter() {
            assert!((p - 0.25).abs() < 1e-7);
        }
    }

    #[test]
    fn test_softmax_masked_entries_are_zero() {
        let probs = softmax(aview1(&[0.3, f32::NEG_INFINITY, f32::NEG_INFINITY]));
        assert_eq!(probs, arr1(&[1.0f32, 0.0, 0.0]));
    }

    #[test]
    fn test_softmax_large_values_stable() {
        let probs = softmax(aview1(&[1000.0, 1000.0]));
        assert!(probs.iter().all(|p| p.is_finite()));
        assert!((probs[0] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_matmul_and_transpose() {
        let a: Matrix = arr2(&[[1.0, 2.0], [3.0, 4.0]]);
        let id = Matrix::eye(2);
        assert_eq!(matmul(a.view(), id.view()), a);
        assert_eq!(transpose(a.view()), arr2(&[[1.0f32, 3.0], [2.0, 4.0]]));
        assert_eq!(matvec(a.view(), aview1(&[1.0, 1.0])), arr1(&[3.0f32, 7.0]));
        assert_eq!(vec_matmul(aview1(&[1.0, 1.0]), a.view()), arr1(&[4.0f32, 6.0]));
    }

    #[test]
    #[should_panic(expected = "dot: length mismatch")]
    fn test_dimension_mismatch_panics() {
        dot(aview1(&[1.0, 2.0]), aview1(&[1.0]));
    }

    #[test]
    fn test_causal_mask() {
        let masked = apply_causal_mask(arr2(&[[1.0, 2.0], [3.0, 4.0]]).view());
        assert_eq!(masked[[0, 0]], 1.0);
        assert_eq!(masked[[0, 1]], f32::NEG_INFINITY);
        assert_eq!(masked.row(1), aview1(&[3.0f32, 4.0]));
    }

    #[test]
    fn test_softmax_rows_after_mask() {
        let masked = apply_causal_mask(arr2(&[[0.2, 0.9], [0.1, 0.1]]).view());
        let weights = softmax_rows(masked.view());
        assert_eq!(weights.row(0), aview1(&[1.0f32, 0.0]));
        assert!((weights[[1, 0]] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_layer_norm_zero_mean_unit_variance() {
        let out = layer_norm(aview1(&[1.0, 2.0, 3.0, 4.0, 10.0]));
        let mean = out.sum() / out.len() as f32;
        let var = out.iter().map(|x| (x - mean).powi(2)).sum::<f32>() / out.len() as f32;
        assert!(mean.abs() < 1e-5);
        assert!((var - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_gelu_reference_points() {
        assert_eq!(gelu(0.0), 0.0);
        assert!((gelu(1.0) - 0.8412).abs() < 1e-3);
        assert!(gelu(-5.0).abs() < 1e-3);
    }

    #[test]
    fn test_random_matrix_deterministic() {
        let a = random_matrix(4, 3, 99);
        let _noise = random_matrix(8, 8, 1);
        let b = random_matrix(4, 3, 99);
        assert_eq!(a, b);
        assert_eq!(a.dim(), (4, 3));
        assert_ne!(a, random_matrix(4, 3, 100));
        assert!(a.iter().all(|x| (-0.5..0.5).contains(x)));
    }

    #[test]
    fn test_argmax_ties_pick_lowest() {
        assert_eq!(argmax(aview1(&[0.1, 0.5, 0.5])), Some(1));
        assert_eq!(argmax(aview1(&[])), None);
    }
}
