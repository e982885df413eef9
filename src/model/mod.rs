//! Toy transformer simulation.
//!
//! - `math`: dense vector/matrix kernel
//! - `params`: seeded weight and embedding tables, built once
//! - `tokenizer`: text → tokens → embeddings
//! - `mlp`: GELU feed-forward sublayer
//! - `attention`: multi-head causal self-attention forward pass
//! - `moe`: top-k expert router with load statistics

pub mod attention;
pub mod math;
pub mod mlp;
pub mod moe;
pub mod params;
pub mod tokenizer;

pub use attention::{AttentionHead, AttentionSimulator, ForwardPass, LayerResult};
pub use math::Matrix;
pub use mlp::FeedForward;
pub use moe::{
    CategoryBias, ExpertCategory, LoadBalanceStats, MoeRouter, NoBias, RoutingBias, RoutingResult,
};
pub use params::{ModelParams, ParamsCell};
pub use tokenizer::{Token, embeddings, tokenize, truncate_tokens};
