//! transformer-viz: the core of an educational transformer visualizer.
//!
//! Two coupled halves:
//! - a toy numeric model (tokenizer, multi-head causal attention, MOE
//!   routing, sampling) that drives interactive demos
//! - responsive diagrams of the architecture, training and inference
//!   pipelines, with highlight state and a guided tour

pub mod app;
pub mod config;
pub mod demos;
pub mod diagram;
pub mod educational;
pub mod error;
pub mod model;

pub use app::App;
pub use config::{
    LayoutConfig, ModelConfig, MoeConfig, PlaybackConfig, SamplingConfig, VizConfig,
};
pub use diagram::{ComponentKey, DiagramRenderer, Scene, Section, Surface, Viewport};
pub use educational::{Tour, TourHost, TourSignal};
pub use error::{Error, Result};
pub use model::{AttentionSimulator, ModelParams, MoeRouter, ParamsCell};
