//! Demo controllers.
//!
//! Each demo pairs a simulator with a drawing surface: it runs on user
//! input, keeps the last result, draws it, and renders an ASCII version for
//! the terminal. Long-running animations go through [`Playback`] so they
//! can be stopped at any step.

pub mod attention;
pub mod kv_cache;
pub mod moe;
pub mod playback;
pub mod sampling;

pub use attention::{AttentionDemo, HeadSelection, HeatmapCell};
pub use kv_cache::{KvCacheDemo, KvCacheStats, KvStep};
pub use moe::{BIAS_NOTE, MoeDemo, MoeRun};
pub use playback::{Playback, PlaybackHandle, PlaybackOutcome, ThreadTicker, Ticker};
pub use sampling::{CANDIDATES, SAMPLING_PROMPT, Sampler, SamplingDemo};
