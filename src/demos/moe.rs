//! Mixture-of-experts routing demo controller.
//!
//! Routes every token of the input, aggregates expert load, and draws a
//! token → expert flow diagram. Tokens can be stepped through one at a time
//! or played back continuously.

use std::sync::Arc;

use tracing::info;

use super::playback::{Playback, PlaybackHandle, PlaybackOutcome, Ticker};
use crate::config::PlaybackConfig;
use crate::diagram::{Point, Rect, Shape, Surface, TextAlign};
use crate::educational::visualizers::expert_load_table;
use crate::error::{Error, Result};
use crate::model::moe::{LoadBalanceStats, MoeRouter, RoutingResult, expert_name};
use crate::model::params::ModelParams;
use crate::model::tokenizer::{Token, embeddings, tokenize, truncate_tokens};

/// Shown next to biased results.
pub const BIAS_NOTE: &str =
    "Routing here is nudged by a word-category lookup. Real routers learn their preferences.";

const TOKEN_X: f32 = 20.0;
const EXPERT_X: f32 = 320.0;
const NODE_WIDTH: f32 = 110.0;
const NODE_HEIGHT: f32 = 28.0;
const ROW: f32 = 38.0;

/// Result of one routing run.
#[derive(Debug, Clone)]
pub struct MoeRun {
    pub tokens: Vec<Token>,
    pub results: Vec<RoutingResult>,
    pub stats: LoadBalanceStats,
}

impl MoeRun {
    /// Whether any token was routed with the category bias.
    pub fn uses_bias(&self) -> bool {
        self.results.iter().any(RoutingResult::is_biased)
    }
}

#[derive(Debug)]
pub struct MoeDemo {
    params: Arc<ModelParams>,
    router: MoeRouter,
    run: Option<MoeRun>,
    /// Tokens revealed so far in step-through mode.
    revealed: usize,
    playback: Playback,
}

impl MoeDemo {
    pub fn new(params: Arc<ModelParams>, playback: &PlaybackConfig) -> Self {
        Self {
            router: MoeRouter::new(Arc::clone(&params)),
            params,
            run: None,
            revealed: 0,
            playback: Playback::from_config(playback),
        }
    }

    /// Uses a custom router, e.g. one without the category bias.
    pub fn with_router(mut self, router: MoeRouter) -> Self {
        self.router = router;
        self
    }

    /// Routes every token of `text`.
    ///
    /// Empty input returns [`Error::EmptyInput`] and keeps the prior run.
    pub fn run(&mut self, text: &str) -> Result<&MoeRun> {
        let tokens = truncate_tokens(tokenize(text), self.params.config().max_tokens);
        if tokens.is_empty() {
            return Err(Error::EmptyInput);
        }
        self.playback.stop();
        let embedded = embeddings(&self.params, &tokens);
        let results = self.router.route_tokens(&tokens, embedded.view());
        let stats =
            LoadBalanceStats::from_results(&results, self.router.num_experts(), self.router.top_k());
        info!(
            tokens = tokens.len(),
            max_deviation = stats.max_deviation,
            idle = stats.idle_experts().len(),
            "moe demo run"
        );
        self.revealed = tokens.len();
        Ok(self.run.insert(MoeRun {
            tokens,
            results,
            stats,
        }))
    }

    pub fn current(&self) -> Option<&MoeRun> {
        self.run.as_ref()
    }

    /// Number of tokens currently shown.
    pub fn revealed(&self) -> usize {
        self.revealed
    }

    /// Hides all tokens, ready for stepping.
    pub fn rewind(&mut self) {
        self.playback.stop();
        self.revealed = 0;
    }

    /// Reveals the next token's routing.
    pub fn step(&mut self) -> Option<&RoutingResult> {
        let run = self.run.as_ref()?;
        let result = run.results.get(self.revealed)?;
        self.revealed += 1;
        Some(result)
    }

    pub fn playback_handle(&self) -> PlaybackHandle {
        self.playback.handle()
    }

    /// Reveals the remaining tokens one per tick until done or stopped.
    pub fn play(
        &mut self,
        ticker: &mut impl Ticker,
        mut on_step: impl FnMut(&RoutingResult),
    ) -> PlaybackOutcome {
        let Some(run) = self.run.as_ref() else {
            return PlaybackOutcome::Finished { steps: 0 };
        };
        if self.revealed >= run.results.len() {
            self.revealed = 0;
        }
        let start = self.revealed;
        let revealed = &mut self.revealed;
        self.playback
            .run(run.results.len() - start, ticker, |i| {
                *revealed = start + i + 1;
                on_step(&run.results[start + i]);
            })
    }

    /// Stops playback and clears the run.
    pub fn reset(&mut self) {
        self.playback.stop();
        self.run = None;
        self.revealed = 0;
    }

    pub fn ascii(&self) -> Option<String> {
        let run = self.run.as_ref()?;
        let mut lines = Vec::new();
        for (token, result) in run.tokens.iter().zip(&run.results) {
            let experts: Vec<String> = result
                .top_experts
                .iter()
                .zip(&result.top_weights)
                .map(|(e, w)| format!("{} ({:.0}%)", expert_name(*e), w * 100.0))
                .collect();
            let category = result.category.map_or("-", |c| c.label());
            lines.push(format!(
                "  {:<10} [{category:<8}] → {}",
                token.display(10),
                experts.join(", ")
            ));
        }
        lines.push(String::new());
        lines.push(expert_load_table(&run.stats));
        if run.uses_bias() {
            lines.push(String::new());
            lines.push(format!("  note: {BIAS_NOTE}"));
        }
        Some(lines.join("\n"))
    }

    /// Draws tokens on the left, experts on the right and one edge per
    /// selected expert, thicker for larger weights.
    pub fn render(&self, surface: &mut impl Surface) -> usize {
        surface.clear();
        let Some(run) = self.run.as_ref() else {
            return 0;
        };
        let num_experts = self.router.num_experts();
        let rows = run.tokens.len().max(num_experts) as f32;
        surface.set_size(EXPERT_X + NODE_WIDTH + 40.0, 60.0 + ROW * rows);

        for (i, token) in run.tokens.iter().enumerate() {
            let rect = Rect::new(TOKEN_X, 20.0 + ROW * i as f32, NODE_WIDTH, NODE_HEIGHT);
            let class = if i < self.revealed {
                "token"
            } else {
                "token pending"
            };
            surface.add(
                Shape::rect(rect, 4.0)
                    .with_id(format!("token-{i}"))
                    .attr("class", class)
                    .attr("fill", "#e0f2fe"),
            );
            surface.add(Shape::text(rect.center(), token.display(12), TextAlign::Middle));
        }

        for expert in 0..num_experts {
            let rect = Rect::new(EXPERT_X, 20.0 + ROW * expert as f32, NODE_WIDTH, NODE_HEIGHT);
            let count = run.stats.counts.get(expert).copied().unwrap_or(0);
            let class = if count == 0 { "expert idle" } else { "expert" };
            surface.add(
                Shape::rect(rect, 4.0)
                    .with_id(format!("expert-{expert}"))
                    .attr("class", class)
                    .attr("fill", "#fecaca"),
            );
            surface.add(Shape::text(
                rect.center(),
                format!("{} ×{count}", expert_name(expert)),
                TextAlign::Middle,
            ));
        }

        let mut edges = 0;
        for (i, result) in run.results.iter().enumerate().take(self.revealed) {
            let from = Point::new(TOKEN_X + NODE_WIDTH, 20.0 + ROW * i as f32 + NODE_HEIGHT / 2.0);
            for (&expert, &weight) in result.top_experts.iter().zip(&result.top_weights) {
                let to = Point::new(EXPERT_X, 20.0 + ROW * expert as f32 + NODE_HEIGHT / 2.0);
                surface.add(
                    Shape::path(vec![from, to], true)
                        .attr("class", "route")
                        .attr("stroke", "#ef4444")
                        .attr("stroke-width", format!("{:.2}", 1.0 + 4.0 * weight)),
                );
                edges += 1;
            }
        }

        if run.uses_bias() {
            surface.add(
                Shape::text(
                    Point::new(TOKEN_X, 40.0 + ROW * rows),
                    BIAS_NOTE,
                    TextAlign::Start,
                )
                .attr("class", "bias-note"),
            );
        }
        edges
    }
}
