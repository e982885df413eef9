//! KV-cache savings demo.
//!
//! Generates tokens one at a time and counts key/value projections. Without
//! a cache, step `t` recomputes K and V for all `t` tokens so far; with a
//! cache only the newest token's K and V are computed.
//!
//! ```text
//! step   without cache     with cache
//!  1     ■                 ■
//!  2     ■■                □■
//!  3     ■■■               □□■
//!  4     ■■■■              □□□■      □ = read from cache
//! ```

use serde::Serialize;
use tracing::debug;

use super::playback::{Playback, PlaybackHandle, PlaybackOutcome, Ticker};
use crate::config::{ModelConfig, PlaybackConfig};
use crate::diagram::{Point, Rect, Shape, Surface, TextAlign};
use crate::educational::visualizers::cache_comparison;

/// Words emitted by the simulated generation, in order.
const CONTINUATION: [&str; 12] = [
    "The", "cat", "sat", "on", "the", "mat", "and", "watched", "the", "birds", "outside", ".",
];

const CELL: f32 = 14.0;

/// Work done for one generated token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KvStep {
    /// 1-based.
    pub step: usize,
    pub token: String,
    pub k_without_cache: usize,
    pub k_with_cache: usize,
    pub v_without_cache: usize,
    pub v_with_cache: usize,
}

impl KvStep {
    fn new(step: usize, kv_dim: usize) -> Self {
        Self {
            step,
            token: CONTINUATION[(step - 1) % CONTINUATION.len()].to_string(),
            k_without_cache: step * kv_dim,
            k_with_cache: kv_dim,
            v_without_cache: step * kv_dim,
            v_with_cache: kv_dim,
        }
    }
}

/// Totals over all generated steps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct KvCacheStats {
    pub steps: usize,
    pub kv_dim: usize,
    pub k_without_cache: usize,
    pub k_with_cache: usize,
    pub v_without_cache: usize,
    pub v_with_cache: usize,
}

impl KvCacheStats {
    pub fn from_steps(steps: &[KvStep], kv_dim: usize) -> Self {
        steps.iter().fold(
            Self {
                kv_dim,
                ..Self::default()
            },
            |acc, s| Self {
                steps: acc.steps + 1,
                kv_dim,
                k_without_cache: acc.k_without_cache + s.k_without_cache,
                k_with_cache: acc.k_with_cache + s.k_with_cache,
                v_without_cache: acc.v_without_cache + s.v_without_cache,
                v_with_cache: acc.v_with_cache + s.v_with_cache,
            },
        )
    }

    /// `(without - with) / without * 100` for key computations.
    pub fn k_savings_percent(&self) -> f32 {
        savings(self.k_without_cache, self.k_with_cache)
    }

    pub fn v_savings_percent(&self) -> f32 {
        savings(self.v_without_cache, self.v_with_cache)
    }
}

fn savings(without: usize, with: usize) -> f32 {
    if without == 0 {
        return 0.0;
    }
    (without as f32 - with as f32) / without as f32 * 100.0
}

#[derive(Debug)]
pub struct KvCacheDemo {
    kv_dim: usize,
    steps: Vec<KvStep>,
    playback: Playback,
}

impl KvCacheDemo {
    /// Keys and values are `embed_dim` wide.
    pub fn new(model: &ModelConfig, playback: &PlaybackConfig) -> Self {
        Self {
            kv_dim: model.embed_dim,
            steps: Vec::new(),
            playback: Playback::from_config(playback),
        }
    }

    pub fn kv_dim(&self) -> usize {
        self.kv_dim
    }

    pub fn steps(&self) -> &[KvStep] {
        &self.steps
    }

    /// Generates one more token.
    pub fn step(&mut self) -> &KvStep {
        let step = KvStep::new(self.steps.len() + 1, self.kv_dim);
        debug!(step = step.step, token = %step.token, "kv step");
        self.steps.push(step);
        &self.steps[self.steps.len() - 1]
    }

    /// Generates `n` tokens from scratch.
    pub fn generate(&mut self, n: usize) -> KvCacheStats {
        self.reset();
        for _ in 0..n {
            self.step();
        }
        self.stats()
    }

    pub fn stats(&self) -> KvCacheStats {
        KvCacheStats::from_steps(&self.steps, self.kv_dim)
    }

    pub fn playback_handle(&self) -> PlaybackHandle {
        self.playback.handle()
    }

    /// Generates `n` tokens from scratch, one per tick.
    pub fn play(
        &mut self,
        n: usize,
        ticker: &mut impl Ticker,
        mut on_step: impl FnMut(&KvStep),
    ) -> PlaybackOutcome {
        self.steps.clear();
        let kv_dim = self.kv_dim;
        let steps = &mut self.steps;
        self.playback.run(n, ticker, |i| {
            let step = KvStep::new(i + 1, kv_dim);
            on_step(&step);
            steps.push(step);
        })
    }

    /// Stops playback and forgets generated tokens.
    pub fn reset(&mut self) {
        self.playback.stop();
        self.steps.clear();
    }

    pub fn ascii(&self) -> String {
        let stats = self.stats();
        let tokens: Vec<&str> = self.steps.iter().map(|s| s.token.as_str()).collect();
        format!(
            "Generated: {}\n{}\n{}\n  K savings {:.1}%  V savings {:.1}%",
            tokens.join(" "),
            cache_comparison("K computations", stats.k_without_cache, stats.k_with_cache, 30),
            cache_comparison("V computations", stats.v_without_cache, stats.v_with_cache, 30),
            stats.k_savings_percent(),
            stats.v_savings_percent(),
        )
    }

    /// Draws one row per step: recomputed cells on the left, cached and
    /// new cells on the right.
    pub fn render(&self, surface: &mut impl Surface) -> usize {
        surface.clear();
        let n = self.steps.len();
        let panel = CELL * n.max(1) as f32 + 20.0;
        surface.set_size(80.0 + 2.0 * panel, 40.0 + CELL * n as f32 + 30.0);
        surface.add(Shape::text(Point::new(80.0, 16.0), "without cache", TextAlign::Start));
        surface.add(Shape::text(Point::new(80.0 + panel, 16.0), "with cache", TextAlign::Start));

        let mut cells = 0;
        for (row, step) in self.steps.iter().enumerate() {
            let y = 30.0 + CELL * row as f32;
            surface.add(
                Shape::text(Point::new(70.0, y + CELL - 3.0), step.token.clone(), TextAlign::End)
                    .attr("class", "step-label"),
            );
            for col in 0..step.step {
                let x = 80.0 + CELL * col as f32;
                surface.add(
                    Shape::rect(Rect::new(x, y, CELL - 2.0, CELL - 2.0), 1.0)
                        .attr("class", "kv computed")
                        .attr("fill", "#ef4444"),
                );
                let cached = col + 1 < step.step;
                let (class, fill) = if cached {
                    ("kv cached", "#cbd5e1")
                } else {
                    ("kv computed", "#22c55e")
                };
                surface.add(
                    Shape::rect(Rect::new(x + panel, y, CELL - 2.0, CELL - 2.0), 1.0)
                        .attr("class", class)
                        .attr("fill", fill),
                );
                cells += 2;
            }
        }

        let stats = self.stats();
        surface.add(
            Shape::text(
                Point::new(80.0, 40.0 + CELL * n as f32 + 10.0),
                format!("{:.1}% fewer K/V computations", stats.k_savings_percent()),
                TextAlign::Start,
            )
            .attr("class", "savings"),
        );
        cells
    }
}
