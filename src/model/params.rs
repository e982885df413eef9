//! Model parameters: embedding tables, layer weights and router weights.
//!
//! Everything is generated from fixed seeds at construction time and never
//! mutated afterwards. The simulators borrow a shared [`ModelParams`] through
//! an `Arc`, so interleaved demo runs always see the same weights.
//!
//! ## Seed layout
//!
//! ```text
//! Wq / Wk / Wv   layer*1000 + head*100 + {1, 2, 3}
//! Wo / W1 / W2   layer*1000 + 900      + {1, 2, 3}
//! token table    ModelConfig::embedding_seed
//! position table ModelConfig::positional_seed
//! router         MoeConfig::router_seed
//! ```

use std::sync::{Arc, OnceLock};

use ndarray::{ArrayView1, ArrayView2};
use tracing::info;

use super::math::{Matrix, random_matrix, random_matrix_scaled};
use crate::config::{ModelConfig, MoeConfig};

/// Query/key/value projections for one head, each `[embed_dim][head_dim]`.
#[derive(Debug, Clone)]
pub struct HeadWeights {
    pub wq: Matrix,
    pub wk: Matrix,
    pub wv: Matrix,
}

/// Weights of one transformer layer.
#[derive(Debug, Clone)]
pub struct LayerWeights {
    /// Per-head projections.
    pub heads: Vec<HeadWeights>,
    /// Output projection `[embed_dim][embed_dim]`.
    pub wo: Matrix,
    /// Feed-forward expansion `[embed_dim][ffn_dim]`.
    pub w1: Matrix,
    /// Feed-forward contraction `[ffn_dim][embed_dim]`.
    pub w2: Matrix,
}

/// Seed for a head projection.
pub fn head_seed(layer: usize, head: usize, offset: u64) -> u64 {
    (layer as u64) * 1000 + (head as u64) * 100 + offset
}

/// Seed for a layer-wide matrix (output projection, feed-forward).
fn layer_seed(layer: usize, offset: u64) -> u64 {
    (layer as u64) * 1000 + 900 + offset
}

/// Immutable parameters of the toy model.
#[derive(Debug, Clone)]
pub struct ModelParams {
    config: ModelConfig,
    moe_config: MoeConfig,
    token_table: Matrix,
    positional_table: Matrix,
    layers: Vec<LayerWeights>,
    /// Router weights `[embed_dim][num_experts]`, shared by every layer.
    router: Matrix,
}

impl ModelParams {
    /// Generates every table from its fixed seed.
    pub fn new(config: &ModelConfig, moe_config: &MoeConfig) -> Self {
        let d = config.embed_dim;
        let head_dim = config.head_dim();
        let ffn_dim = config.ffn_dim();
        let scale = config.weight_scale;

        let token_table = random_matrix(config.vocab_size, d, config.embedding_seed);
        let positional_table = random_matrix(config.max_positions, d, config.positional_seed);

        let layers = (0..config.num_layers)
            .map(|layer| LayerWeights {
                heads: (0..config.num_heads)
                    .map(|head| HeadWeights {
                        wq: random_matrix_scaled(d, head_dim, head_seed(layer, head, 1), scale),
                        wk: random_matrix_scaled(d, head_dim, head_seed(layer, head, 2), scale),
                        wv: random_matrix_scaled(d, head_dim, head_seed(layer, head, 3), scale),
                    })
                    .collect(),
                wo: random_matrix_scaled(d, d, layer_seed(layer, 1), scale),
                w1: random_matrix_scaled(d, ffn_dim, layer_seed(layer, 2), scale),
                w2: random_matrix_scaled(ffn_dim, d, layer_seed(layer, 3), scale / 2.0),
            })
            .collect();

        let router = random_matrix_scaled(
            d,
            moe_config.num_experts,
            moe_config.router_seed,
            moe_config.router_scale,
        );

        info!(
            embed_dim = d,
            layers = config.num_layers,
            heads = config.num_heads,
            experts = moe_config.num_experts,
            "model parameters generated"
        );

        Self {
            config: config.clone(),
            moe_config: moe_config.clone(),
            token_table,
            positional_table,
            layers,
            router,
        }
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn moe_config(&self) -> &MoeConfig {
        &self.moe_config
    }

    /// Token embedding row for `id` (ids wrap around the table).
    pub fn token_row(&self, id: usize) -> ArrayView1<'_, f32> {
        self.token_table.row(id % self.token_table.nrows())
    }

    /// Positional row for `position` (positions wrap around the table).
    pub fn positional_row(&self, position: usize) -> ArrayView1<'_, f32> {
        self.positional_table
            .row(position % self.positional_table.nrows())
    }

    pub fn layers(&self) -> &[LayerWeights] {
        &self.layers
    }

    pub fn layer(&self, index: usize) -> Option<&LayerWeights> {
        self.layers.get(index)
    }

    pub fn router(&self) -> ArrayView2<'_, f32> {
        self.router.view()
    }
}

/// One-time, idempotent holder for the shared parameters.
///
/// A second `get_or_init` returns the instance built by the first call and
/// ignores its arguments, so tables are never regenerated.
#[derive(Debug, Default)]
pub struct ParamsCell {
    cell: OnceLock<Arc<ModelParams>>,
}

impl ParamsCell {
    pub const fn new() -> Self {
        Self {
            cell: OnceLock::new(),
        }
    }

    /// Returns the shared parameters, building them on first use.
    pub fn get_or_init(&self, config: &ModelConfig, moe_config: &MoeConfig) -> Arc<ModelParams> {
        Arc::clone(
            self.cell
                .get_or_init(|| Arc::new(ModelParams::new(config, moe_config))),
        )
    }

    /// Returns the parameters if they have been built.
    pub fn get(&self) -> Option<Arc<ModelParams>> {
        self.cell.get().cloned()
    }

    pub fn is_initialized(&self) -> bool {
        self.cell.get().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shapes() {
        let params = ModelParams::new(&ModelConfig::default(), &MoeConfig::default());
        assert_eq!(params.layers().len(), 3);
        let layer = params.layer(0).unwrap();
        assert_eq!(layer.heads.len(), 4);
        assert_eq!(layer.heads[0].wq.dim(), (64, 16));
        assert_eq!(layer.w1.dim(), (64, 256));
        assert_eq!(layer.w2.dim(), (256, 64));
        assert_eq!(layer.wo.dim(), (64, 64));
        assert_eq!(params.router().dim(), (64, 8));
        assert_eq!(params.token_row(512 + 3), params.token_row(3));
    }

    #[test]
    fn test_head_seed_layout() {
        assert_eq!(head_seed(0, 0, 1), 1);
        assert_eq!(head_seed(2, 3, 2), 2302);
    }

    #[test]
    fn test_params_cell_is_idempotent() {
        let cell = ParamsCell::new();
        assert!(!cell.is_initialized());
        let first = cell.get_or_init(&ModelConfig::default(), &MoeConfig::default());
        let other_config = ModelConfig {
            embedding_seed: 7,
            ..ModelConfig::default()
        };
        let second = cell.get_or_init(&other_config, &MoeConfig::default());
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.config().embedding_seed, 42);
    }

    #[test]
    fn test_regeneration_is_reproducible() {
        let a = ModelParams::new(&ModelConfig::default(), &MoeConfig::default());
        let b = ModelParams::new(&ModelConfig::default(), &MoeConfig::default());
        assert_eq!(a.layer(1).unwrap().heads[2].wk, b.layer(1).unwrap().heads[2].wk);
        assert_eq!(a.token_row(17), b.token_row(17));
    }
}
