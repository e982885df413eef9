//! Mixture-of-experts router simulator.
//!
//! Routing happens in three separable steps:
//!
//! 1. **Base logits** from one global router matrix (`Wgᵀ · embedding`).
//!    The same router serves every simulated layer; the toy model does not
//!    keep one router per layer.
//! 2. **Category bias** from a [`RoutingBias`]. The default [`CategoryBias`]
//!    classifies the token against hand-curated word lists and boosts the
//!    matching expert. This is a teaching shortcut, not learned routing, and
//!    every [`RoutingResult`] reports whether it was applied. Swapping in
//!    [`NoBias`] gives the unbiased router.
//! 3. **Softmax + top-k** with stable tie-breaking by expert index, then the
//!    selected probabilities are renormalised.

use std::sync::Arc;

use ndarray::{ArrayView1, ArrayView2};
use serde::Serialize;
use tracing::debug;

use super::math::{Vector, softmax, vec_matmul};
use super::params::ModelParams;
use super::tokenizer::Token;
use crate::config::MoeConfig;

/// Semantic category of a token; each maps to one expert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ExpertCategory {
    Grammar,
    Facts,
    Math,
    Code,
    Creative,
    Logic,
    Language,
    General,
}

const GRAMMAR_WORDS: &[&str] = &[
    "the", "an", "is", "are", "was", "were", "be", "been", "of", "to", "in", "on", "at", "by",
    "for", "with", "from", "and", "or", "but", "as", "it", "its", "this", "that", "these", "those",
    "he", "she", "they", "we", "you", ".", ",",
];

const FACTS_WORDS: &[&str] = &[
    "capital", "paris", "france", "london", "tokyo", "country", "city", "history", "year",
    "president", "population", "river", "mountain", "earth", "sun", "moon", "planet", "science",
];

const MATH_WORDS: &[&str] = &[
    "0", "1", "2", "3", "4", "5", "6", "7", "8", "9", "+", "-", "*", "/", "%", "one", "two",
    "three", "plus", "minus", "times", "sum", "equals", "number", "equation", "square", "root",
    "integral", "pi",
];

const CODE_WORDS: &[&str] = &[
    "print", "def", "function", "fn", "return", "let", "var", "const", "class", "import", "struct",
    "impl", "while", "loop", "null", "(", ")", "{", "}", "[", "]", ";", "\"", "=",
];

const CREATIVE_WORDS: &[&str] = &[
    "story", "poem", "once", "upon", "dream", "imagine", "magic", "dragon", "song", "art",
    "paint", "color", "beautiful", "quick", "brown", "fox", "lazy", "dog", "cat",
];

const LOGIC_WORDS: &[&str] = &[
    "if", "then", "else", "therefore", "because", "not", "true", "false", "all", "every", "some",
    "implies", "why", "so", "must", "?",
];

const LANGUAGE_WORDS: &[&str] = &[
    "translate", "hello", "bonjour", "hola", "word", "sentence", "meaning", "english", "french",
    "spanish", "language", "verb", "noun", "grammar", "'", "!",
];

impl ExpertCategory {
    /// All categories in expert order.
    pub const ALL: [Self; 8] = [
        Self::Grammar,
        Self::Facts,
        Self::Math,
        Self::Code,
        Self::Creative,
        Self::Logic,
        Self::Language,
        Self::General,
    ];

    /// Index of the expert this category is biased towards.
    pub fn expert_index(self) -> usize {
        match self {
            Self::Grammar => 0,
            Self::Facts => 1,
            Self::Math => 2,
            Self::Code => 3,
            Self::Creative => 4,
            Self::Logic => 5,
            Self::Language => 6,
            Self::General => 7,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Grammar => "Grammar",
            Self::Facts => "Facts",
            Self::Math => "Math",
            Self::Code => "Code",
            Self::Creative => "Creative",
            Self::Logic => "Logic",
            Self::Language => "Language",
            Self::General => "General",
        }
    }

    fn words(self) -> &'static [&'static str] {
        match self {
            Self::Grammar => GRAMMAR_WORDS,
            Self::Facts => FACTS_WORDS,
            Self::Math => MATH_WORDS,
            Self::Code => CODE_WORDS,
            Self::Creative => CREATIVE_WORDS,
            Self::Logic => LOGIC_WORDS,
            Self::Language => LANGUAGE_WORDS,
            Self::General => &[],
        }
    }

    /// Related experts as `(expert, is_secondary)`; secondary gets the larger boost.
    fn affinities(self) -> &'static [(usize, bool)] {
        match self {
            Self::Grammar => &[(6, true), (4, false)],
            Self::Facts => &[(5, true), (6, false)],
            Self::Math => &[(5, true), (3, false)],
            Self::Code => &[(5, true), (2, false)],
            Self::Creative => &[(6, true), (0, false)],
            Self::Logic => &[(2, true), (3, false)],
            Self::Language => &[(0, true), (4, false)],
            Self::General => &[],
        }
    }

    /// Classifies a token by exact lowercase membership.
    ///
    /// Single ASCII letters are always `General`, before any list lookup.
    pub fn classify(text: &str) -> Self {
        let lower = text.to_lowercase();
        let mut chars = lower.chars();
        if let (Some(c), None) = (chars.next(), chars.next())
            && c.is_ascii_alphabetic()
        {
            return Self::General;
        }
        Self::ALL
            .into_iter()
            .find(|category| category.words().contains(&lower.as_str()))
            .unwrap_or(Self::General)
    }
}

/// Display name of an expert.
pub fn expert_name(index: usize) -> String {
    match ExpertCategory::ALL.get(index) {
        Some(category) => format!("E{index} {}", category.label()),
        None => format!("E{index}"),
    }
}

/// The swappable bias step applied to base router logits.
pub trait RoutingBias: std::fmt::Debug + Send + Sync {
    /// Additive bias per expert for a token of `category`.
    fn bias(&self, category: ExpertCategory, num_experts: usize) -> Vector;
}

/// Hand-coded category bias (teaching shortcut).
#[derive(Debug, Clone)]
pub struct CategoryBias {
    pub primary: f32,
    pub secondary: f32,
    pub tertiary: f32,
}

impl CategoryBias {
    pub fn from_config(config: &MoeConfig) -> Self {
        Self {
            primary: config.category_bias,
            secondary: config.secondary_boost,
            tertiary: config.tertiary_boost,
        }
    }
}

impl RoutingBias for CategoryBias {
    fn bias(&self, category: ExpertCategory, num_experts: usize) -> Vector {
        let mut bias = Vector::zeros(num_experts);
        if let Some(b) = bias.get_mut(category.expert_index()) {
            *b += self.primary;
        }
        for &(expert, secondary) in category.affinities() {
            if let Some(b) = bias.get_mut(expert) {
                *b += if secondary { self.secondary } else { self.tertiary };
            }
        }
        bias
    }
}

/// Leaves the base logits untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBias;

impl RoutingBias for NoBias {
    fn bias(&self, _category: ExpertCategory, num_experts: usize) -> Vector {
        Vector::zeros(num_experts)
    }
}

/// Routing decision for one token.
#[derive(Debug, Clone, Serialize)]
pub struct RoutingResult {
    pub token: Option<String>,
    /// Category used for the bias step, if the token text was available.
    pub category: Option<ExpertCategory>,
    pub base_logits: Vector,
    pub bias: Vector,
    pub logits: Vector,
    pub probabilities: Vector,
    /// Selected experts, most probable first.
    pub top_experts: Vec<usize>,
    /// Renormalised weights of `top_experts`; sums to 1, descending.
    pub top_weights: Vec<f32>,
}

impl RoutingResult {
    /// Whether the hand-coded bias changed the logits.
    pub fn is_biased(&self) -> bool {
        self.bias.iter().any(|b| *b != 0.0)
    }

    pub fn primary_expert(&self) -> Option<usize> {
        self.top_experts.first().copied()
    }
}

/// Indices of the `k` largest probabilities; ties keep the lower index first.
pub fn top_k_indices(probs: ArrayView1<'_, f32>, k: usize) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..probs.len()).collect();
    indices.sort_by(|&a, &b| {
        probs[b]
            .partial_cmp(&probs[a])
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.cmp(&b))
    });
    indices.truncate(k);
    indices
}

/// Global top-k router.
#[derive(Debug, Clone)]
pub struct MoeRouter {
    params: Arc<ModelParams>,
    top_k: usize,
    bias: Arc<dyn RoutingBias>,
}

impl MoeRouter {
    /// Creates a router; the category bias is used unless disabled in config.
    pub fn new(params: Arc<ModelParams>) -> Self {
        let config = params.moe_config().clone();
        let bias: Arc<dyn RoutingBias> = if config.category_bias_enabled {
            Arc::new(CategoryBias::from_config(&config))
        } else {
            Arc::new(NoBias)
        };
        Self {
            params,
            top_k: config.top_k,
            bias,
        }
    }

    /// Replaces the bias step.
    pub fn with_bias(mut self, bias: Arc<dyn RoutingBias>) -> Self {
        self.bias = bias;
        self
    }

    pub fn num_experts(&self) -> usize {
        self.params.moe_config().num_experts
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Routes one token embedding.
    pub fn route_token(
        &self,
        embedding: ArrayView1<'_, f32>,
        token_text: Option<&str>,
    ) -> RoutingResult {
        let num_experts = self.num_experts();
        let base_logits = vec_matmul(embedding, self.params.router());

        let category = token_text.map(ExpertCategory::classify);
        let bias = match category {
            Some(c) => self.bias.bias(c, num_experts),
            None => Vector::zeros(num_experts),
        };

        let logits = &base_logits + &bias;
        let probabilities = softmax(logits.view());

        let top_experts = top_k_indices(probabilities.view(), self.top_k);
        let selected_sum: f32 = top_experts.iter().map(|&e| probabilities[e]).sum();
        let top_weights = top_experts
            .iter()
            .map(|&e| probabilities[e] / selected_sum)
            .collect();

        RoutingResult {
            token: token_text.map(str::to_string),
            category,
            base_logits,
            bias,
            logits,
            probabilities,
            top_experts,
            top_weights,
        }
    }

    /// Routes every token of a sequence.
    ///
    /// # Panics
    ///
    /// Panics if `tokens` and the rows of `embeddings` differ in number.
    pub fn route_tokens(
        &self,
        tokens: &[Token],
        embeddings: ArrayView2<'_, f32>,
    ) -> Vec<RoutingResult> {
        assert_eq!(
            tokens.len(),
            embeddings.nrows(),
            "route_tokens: one embedding per token"
        );
        let results: Vec<RoutingResult> = tokens
            .iter()
            .zip(embeddings.rows())
            .map(|(t, e)| self.route_token(e, Some(&t.text)))
            .collect();
        debug!(tokens = results.len(), top_k = self.top_k, "tokens routed");
        results
    }
}

/// Aggregate expert utilisation for one run. Descriptive only.
#[derive(Debug, Clone, Serialize)]
pub struct LoadBalanceStats {
    pub num_tokens: usize,
    pub top_k: usize,
    pub counts: Vec<usize>,
    pub total_weight: Vec<f32>,
    /// `tokens * top_k / num_experts`.
    pub ideal: f32,
    /// `|count - ideal|` per expert.
    pub deviations: Vec<f32>,
    pub max_deviation: f32,
}

impl LoadBalanceStats {
    pub fn from_results(results: &[RoutingResult], num_experts: usize, top_k: usize) -> Self {
        let mut counts = vec![0usize; num_experts];
        let mut total_weight = vec![0.0f32; num_experts];
        for result in results {
            for (&expert, &weight) in result.top_experts.iter().zip(&result.top_weights) {
                counts[expert] += 1;
                total_weight[expert] += weight;
            }
        }

        let ideal = (results.len() * top_k) as f32 / num_experts as f32;
        let deviations: Vec<f32> = counts.iter().map(|&c| (c as f32 - ideal).abs()).collect();
        let max_deviation = deviations.iter().copied().fold(0.0, f32::max);

        Self {
            num_tokens: results.len(),
            top_k,
            counts,
            total_weight,
            ideal,
            deviations,
            max_deviation,
        }
    }

    /// Experts that were never selected.
    pub fn idle_experts(&self) -> Vec<usize> {
        self.counts
            .iter()
            .enumerate()
            .filter(|(_, c)| **c == 0)
            .map(|(i, _)| i)
            .collect()
    }
}
