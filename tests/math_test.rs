//! Integration tests for the math kernel.

use ndarray::{arr2, aview1};
use proptest::prelude::*;
use transformer_viz::model::math::{
    Matrix, apply_causal_mask, argmax, layer_norm, matmul, random_matrix, softmax, softmax_rows,
    transpose,
};

#[test]
fn test_softmax_known_values() {
    let probs = softmax(aview1(&[1.0, 2.0, 3.0]));
    assert!((probs[0] - 0.0900).abs() < 1e-3);
    assert!((probs[1] - 0.2447).abs() < 1e-3);
    assert!((probs[2] - 0.6652).abs() < 1e-3);
}

#[test]
fn test_softmax_masked_entries_are_zero() {
    let probs = softmax(aview1(&[0.5, f32::NEG_INFINITY, 0.5]));
    assert_eq!(probs[1], 0.0);
    assert!((probs[0] - 0.5).abs() < 1e-6);
}

#[test]
fn test_causal_mask_then_softmax_first_row() {
    let scores = arr2(&[[0.3f32, 0.9], [0.1, 0.2]]);
    let masked = apply_causal_mask(scores.view());
    let first = softmax(masked.row(0));
    assert_eq!(first, aview1(&[1.0f32, 0.0]));
    assert_eq!(softmax_rows(masked.view()).row(0), first);
}

#[test]
fn test_matmul_identity() {
    let a = random_matrix(3, 4, 9);
    let identity = Matrix::eye(4);
    assert_eq!(matmul(a.view(), identity.view()), a);
    assert_eq!(transpose(transpose(a.view()).view()), a);
    assert_eq!(transpose(a.view()).dim(), (4, 3));
}

#[test]
fn test_argmax_prefers_first_tie() {
    assert_eq!(argmax(aview1(&[1.0, 3.0, 3.0])), Some(1));
    assert_eq!(argmax(aview1(&[])), None);
}

proptest! {
    #[test]
    fn prop_random_matrix_is_deterministic(rows in 1usize..8, cols in 1usize..8, seed in any::<u64>()) {
        let a = random_matrix(rows, cols, seed);
        let b = random_matrix(rows, cols, seed);
        prop_assert_eq!(&a, &b);
        prop_assert!(a.iter().all(|&x| (-0.5..0.5).contains(&x)));
    }

    #[test]
    fn prop_softmax_is_a_distribution(logits in prop::collection::vec(-20.0f32..20.0, 1..16)) {
        let probs = softmax(aview1(&logits));
        let sum: f32 = probs.iter().sum();
        prop_assert!((sum - 1.0).abs() < 1e-4);
        prop_assert!(probs.iter().all(|&p| (0.0..=1.0).contains(&p)));
    }

    #[test]
    fn prop_layer_norm_is_centred(v in prop::collection::vec(-5.0f32..5.0, 2..32)) {
        let normed = layer_norm(aview1(&v));
        let mean: f32 = normed.iter().sum::<f32>() / normed.len() as f32;
        prop_assert!(mean.abs() < 1e-3);
    }
}
