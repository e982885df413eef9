//! Multi-head causal self-attention simulator.
//!
//! Runs the toy transformer stack over token embeddings and keeps every
//! intermediate the demos want to show: Q, K, V, raw and masked scores,
//! attention weights and head outputs, per layer and per head.
//!
//! ## Layer structure
//!
//! ```text
//! x ──► heads (Q·Kᵀ/√d → causal mask → softmax → ·V) ──► concat ──► Wo
//!   └──────────────────────── + ─────────────────────────────────┘
//!                             LayerNorm
//!                                 │
//!   ┌──────────── + ◄── W2·GELU(W1·h) ◄──┘
//!   LayerNorm ──► next layer
//! ```

use std::sync::Arc;

use tracing::debug;

use ndarray::{ArrayView2, s};

use super::math::{Matrix, apply_causal_mask, argmax, layer_norm_rows, matmul, softmax_rows};
use super::mlp::FeedForward;
use super::params::{HeadWeights, LayerWeights, ModelParams};
use super::tokenizer::{Token, embeddings};

/// Everything computed by one attention head.
#[derive(Debug, Clone)]
pub struct AttentionHead {
    pub query: Matrix,
    pub key: Matrix,
    pub value: Matrix,
    /// `Q[i]·K[j] / sqrt(head_dim)` for every pair.
    pub raw_scores: Matrix,
    /// Raw scores with `-inf` above the diagonal.
    pub masked_scores: Matrix,
    /// Row-wise softmax of the masked scores.
    pub weights: Matrix,
    /// `weights · V`.
    pub output: Matrix,
}

impl AttentionHead {
    /// Computes one head over `inputs` (`[n][embed_dim]`).
    pub fn compute(inputs: ArrayView2<'_, f32>, weights: &HeadWeights) -> Self {
        let query = matmul(inputs, weights.wq.view());
        let key = matmul(inputs, weights.wk.view());
        let value = matmul(inputs, weights.wv.view());

        let scale = 1.0 / (query.ncols().max(1) as f32).sqrt();
        let raw_scores = query.dot(&key.t()) * scale;
        let masked_scores = apply_causal_mask(raw_scores.view());
        let attn = softmax_rows(masked_scores.view());
        let output = matmul(attn.view(), value.view());

        Self {
            query,
            key,
            value,
            raw_scores,
            masked_scores,
            weights: attn,
            output,
        }
    }

    /// Number of tokens.
    pub fn seq_len(&self) -> usize {
        self.weights.nrows()
    }

    /// The visible key that query `i` attends to most.
    pub fn top_attended(&self, i: usize) -> Option<usize> {
        if i >= self.seq_len() {
            return None;
        }
        argmax(self.weights.row(i).slice_move(s![..=i]))
    }
}

/// Result of one transformer layer.
#[derive(Debug, Clone)]
pub struct LayerResult {
    pub layer: usize,
    /// Layer input `[n][embed_dim]`.
    pub input: Matrix,
    pub heads: Vec<AttentionHead>,
    /// Concatenated heads projected through `Wo`.
    pub attention_output: Matrix,
    /// `LayerNorm(input + attention_output)`.
    pub post_attention: Matrix,
    /// Feed-forward output before the residual.
    pub ffn_output: Matrix,
    /// `LayerNorm(post_attention + ffn_output)`; input of the next layer.
    pub output: Matrix,
}

/// All layers for one run.
#[derive(Debug, Clone)]
pub struct ForwardPass {
    pub tokens: Vec<Token>,
    pub layers: Vec<LayerResult>,
}

impl ForwardPass {
    pub fn seq_len(&self) -> usize {
        self.tokens.len()
    }

    /// Attention weights of one head.
    pub fn weights(&self, layer: usize, head: usize) -> Option<&Matrix> {
        Some(&self.layers.get(layer)?.heads.get(head)?.weights)
    }

    /// Attention weights averaged over all heads of a layer.
    pub fn mean_weights(&self, layer: usize) -> Option<Matrix> {
        let heads = &self.layers.get(layer)?.heads;
        let n = self.seq_len();
        let mut sum = Matrix::zeros((n, n));
        for head in heads {
            sum += &head.weights;
        }
        Some(sum / heads.len().max(1) as f32)
    }

    /// Output of the last layer.
    pub fn final_hidden(&self) -> Option<&Matrix> {
        self.layers.last().map(|l| &l.output)
    }
}

/// Runs the toy transformer stack.
#[derive(Debug, Clone)]
pub struct AttentionSimulator {
    params: Arc<ModelParams>,
}

impl AttentionSimulator {
    pub fn new(params: Arc<ModelParams>) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &ModelParams {
        &self.params
    }

    /// Runs every layer over `tokens`.
    ///
    /// Returns `None` for an empty sequence. Callers truncate to
    /// `ModelConfig::max_tokens` first.
    pub fn run_forward_pass(&self, tokens: &[Token]) -> Option<ForwardPass> {
        if tokens.is_empty() {
            return None;
        }
        debug_assert!(
            tokens.len() <= self.params.config().max_tokens,
            "caller must truncate to max_tokens"
        );

        let mut hidden = embeddings(&self.params, tokens);
        let mut layers = Vec::with_capacity(self.params.layers().len());

        for (index, weights) in self.params.layers().iter().enumerate() {
            let result = run_layer(index, hidden, weights);
            hidden = result.output.clone();
            layers.push(result);
        }

        debug!(
            tokens = tokens.len(),
            layers = layers.len(),
            "forward pass complete"
        );

        Some(ForwardPass {
            tokens: tokens.to_vec(),
            layers,
        })
    }
}

fn run_layer(layer: usize, input: Matrix, weights: &LayerWeights) -> LayerResult {
    let heads: Vec<AttentionHead> = weights
        .heads
        .iter()
        .map(|w| AttentionHead::compute(input.view(), w))
        .collect();

    // [n][num_heads * head_dim]
    let head_dim = heads.first().map_or(0, |h| h.output.ncols());
    let mut concat = Matrix::zeros((input.nrows(), head_dim * heads.len()));
    for (h, head) in heads.iter().enumerate() {
        concat
            .slice_mut(s![.., h * head_dim..(h + 1) * head_dim])
            .assign(&head.output);
    }
    let attention_output = matmul(concat.view(), weights.wo.view());

    let post_attention = layer_norm_rows((&input + &attention_output).view());
    let ffn_output = FeedForward::new(weights).forward_rows(post_attention.view());
    let output = layer_norm_rows((&post_attention + &ffn_output).view());

    LayerResult {
        layer,
        input,
        heads,
        attention_output,
        post_attention,
        ffn_output,
        output,
    }
}
