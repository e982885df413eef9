//! Feed-forward sublayer.
//!
//! A two-layer MLP with GELU in between and a 4× hidden expansion:
//!
//! ```text
//! x [embed_dim] ──W1──► h [4·embed_dim] ──GELU──► a ──W2──► y [embed_dim]
//! ```

use ndarray::{ArrayView1, ArrayView2};

use super::math::{Matrix, Vector, gelu, gelu_vec, vec_matmul};
use super::params::LayerWeights;

/// Feed-forward network borrowing one layer's weights.
#[derive(Debug, Clone, Copy)]
pub struct FeedForward<'a> {
    w1: ArrayView2<'a, f32>,
    w2: ArrayView2<'a, f32>,
}

impl<'a> FeedForward<'a> {
    /// Creates a feed-forward view over a layer's weights.
    pub fn new(weights: &'a LayerWeights) -> Self {
        Self {
            w1: weights.w1.view(),
            w2: weights.w2.view(),
        }
    }

    /// Hidden dimension.
    pub fn hidden_dim(&self) -> usize {
        self.w1.ncols()
    }

    /// GELU activations of the hidden layer for one token.
    pub fn hidden_activations(&self, x: ArrayView1<'_, f32>) -> Vector {
        gelu_vec(vec_matmul(x, self.w1).view())
    }

    /// Forward pass for one token.
    pub fn forward(&self, x: ArrayView1<'_, f32>) -> Vector {
        vec_matmul(self.hidden_activations(x).view(), self.w2)
    }

    /// Forward pass for every row of `xs` (`[n][embed_dim]`).
    pub fn forward_rows(&self, xs: ArrayView2<'_, f32>) -> Matrix {
        xs.dot(&self.w1).mapv(gelu).dot(&self.w2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ModelConfig, MoeConfig};
    use crate::model::params::ModelParams;

    #[test]
    fn test_feed_forward_shapes() {
        let params = ModelParams::new(&ModelConfig::default(), &MoeConfig::default());
        let ffn = FeedForward::new(params.layer(0).unwrap());
        assert_eq!(ffn.hidden_dim(), 256);
        let x = Vector::from_elem(64, 0.1);
        let y = ffn.forward(x.view());
        assert_eq!(y.len(), 64);
        assert!(y.iter().all(|v| v.is_finite()));

        let rows = Matrix::from_shape_fn((2, 64), |(_, j)| j as f32 / 64.0);
        let batched = ffn.forward_rows(rows.view());
        let single = ffn.forward(rows.row(1));
        for (a, b) in batched.row(1).iter().zip(single.iter()) {
            assert!((a - b).abs() < 1e-5);
        }
    }

    #[test]
    fn test_zero_input_gives_zero_output() {
        let params = ModelParams::new(&ModelConfig::default(), &MoeConfig::default());
        let ffn = FeedForward::new(params.layer(2).unwrap());
        let zeros = Vector::zeros(64);
        assert!(ffn.forward(zeros.view()).iter().all(|v| *v == 0.0));
    }
}
