//! Configuration types for transformer-viz.
//!
//! Every struct carries the toy model's documented defaults, so a missing
//! config file (or a partial one, thanks to `#[serde(default)]`) always
//! reproduces the same demo numerics.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Toy transformer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Embedding dimension.
    pub embed_dim: usize,
    /// Number of transformer layers.
    pub num_layers: usize,
    /// Number of attention heads per layer.
    pub num_heads: usize,
    /// Feed-forward expansion factor.
    pub ffn_mult: usize,
    /// Rows in the token embedding table.
    pub vocab_size: usize,
    /// Rows in the positional table.
    pub max_positions: usize,
    /// Maximum tokens a demo run processes (longer inputs are truncated).
    pub max_tokens: usize,
    /// Range of the projection weights (values lie in `[-scale/2, scale/2)`).
    pub weight_scale: f32,
    /// Seed for the token embedding table.
    pub embedding_seed: u64,
    /// Seed for the positional table.
    pub positional_seed: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            embed_dim: 64,
            num_layers: 3,
            num_heads: 4,
            ffn_mult: 4,
            vocab_size: 512,
            max_positions: 32,
            max_tokens: 10,
            weight_scale: 0.5,
            embedding_seed: 42,
            positional_seed: 1337,
        }
    }
}

impl ModelConfig {
    /// Head dimension (embed_dim / num_heads).
    pub fn head_dim(&self) -> usize {
        self.embed_dim / self.num_heads
    }

    /// Hidden dimension of the feed-forward sublayer.
    pub fn ffn_dim(&self) -> usize {
        self.embed_dim * self.ffn_mult
    }
}

/// Mixture-of-experts router configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MoeConfig {
    /// Number of experts.
    pub num_experts: usize,
    /// Experts selected per token.
    pub top_k: usize,
    /// Logit bias added to the expert matching a token's category.
    pub category_bias: f32,
    /// Boost for the closest related expert.
    pub secondary_boost: f32,
    /// Boost for the second related expert.
    pub tertiary_boost: f32,
    /// Range of the router weights.
    pub router_scale: f32,
    /// Seed for the router weights.
    pub router_seed: u64,
    /// Apply the hand-coded category bias (teaching shortcut).
    pub category_bias_enabled: bool,
}

impl Default for MoeConfig {
    fn default() -> Self {
        Self {
            num_experts: 8,
            top_k: 2,
            category_bias: 2.5,
            secondary_boost: 0.8,
            tertiary_boost: 0.4,
            router_scale: 0.1,
            router_seed: 7777,
            category_bias_enabled: true,
        }
    }
}

/// Sampling configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// Temperature for sampling (0.0 = greedy).
    pub temperature: f32,
    /// Top-k sampling (0 = disabled).
    pub top_k: usize,
    /// Top-p (nucleus) sampling (1.0 = disabled).
    pub top_p: f32,
    /// Seed for the sampling RNG.
    pub seed: u64,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            temperature: 1.0,
            top_k: 0,
            top_p: 1.0,
            seed: 42,
        }
    }
}

/// Geometry constants for the diagram layout engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Outer margin around the diagram.
    pub margin: f32,
    /// Padding between a container and its children.
    pub container_padding: f32,
    /// Box width as a fraction of container width (wide mode).
    pub box_width_ratio: f32,
    /// Minimum box width in wide mode.
    pub min_box_width: f32,
    /// Maximum box width in wide mode.
    pub max_box_width: f32,
    /// Minimum box width in narrow mode.
    pub narrow_min_box_width: f32,
    /// Space needed right of the boxes to place annotations outside them.
    pub label_fit_min: f32,
    /// Horizontal gap between a box and its annotation.
    pub label_gap: f32,
    /// Residual connector lane offset in wide mode.
    pub wide_lane_offset: f32,
    /// Residual connector lane offset in narrow mode.
    pub narrow_lane_offset: f32,
    /// Side length of the MOE/FFN toggle affordance.
    pub toggle_size: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            margin: 20.0,
            container_padding: 16.0,
            box_width_ratio: 0.42,
            min_box_width: 160.0,
            max_box_width: 280.0,
            narrow_min_box_width: 120.0,
            label_fit_min: 300.0,
            label_gap: 14.0,
            wide_lane_offset: 24.0,
            narrow_lane_offset: 12.0,
            toggle_size: 18.0,
        }
    }
}

/// Continuous playback configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Delay between playback steps in milliseconds.
    pub step_delay_ms: u64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self { step_delay_ms: 600 }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VizConfig {
    pub model: ModelConfig,
    pub moe: MoeConfig,
    pub sampling: SamplingConfig,
    pub layout: LayoutConfig,
    pub playback: PlaybackConfig,
}

impl VizConfig {
    /// Loads and validates a configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the invariants the simulators rely on.
    pub fn validate(&self) -> Result<()> {
        let m = &self.model;
        if m.num_heads == 0 || m.embed_dim % m.num_heads != 0 {
            return Err(Error::Config(format!(
                "embed_dim {} must be divisible by num_heads {}",
                m.embed_dim, m.num_heads
            )));
        }
        if m.num_layers == 0 || m.ffn_mult == 0 {
            return Err(Error::Config(
                "num_layers and ffn_mult must be positive".to_string(),
            ));
        }
        if m.vocab_size == 0 || m.max_positions == 0 || m.max_tokens == 0 {
            return Err(Error::Config(
                "vocab_size, max_positions and max_tokens must be positive".to_string(),
            ));
        }
        // Category experts are addressed by fixed index 0..=7.
        if self.moe.num_experts < 8 {
            return Err(Error::Config(format!(
                "num_experts must be at least 8, got {}",
                self.moe.num_experts
            )));
        }
        if self.moe.top_k == 0 || self.moe.top_k > self.moe.num_experts {
            return Err(Error::Config(format!(
                "top_k must be in 1..={}, got {}",
                self.moe.num_experts, self.moe.top_k
            )));
        }
        let s = &self.sampling;
        if s.temperature < 0.0 || !(s.top_p > 0.0 && s.top_p <= 1.0) {
            return Err(Error::Config(format!(
                "invalid sampling parameters: temperature={}, top_p={}",
                s.temperature, s.top_p
            )));
        }
        Ok(())
    }
}
