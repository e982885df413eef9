//! Next-token sampling demo.
//!
//! A fixed prompt with a handful of candidate continuations and hand-picked
//! logits. The sampler applies the usual pipeline:
//!
//! ```text
//! Logits
//!     │
//!     ▼ Temperature scaling (0 = greedy)
//!     ▼ Top-k filtering (optional)
//!     ▼ Softmax
//!     ▼ Top-p filtering (optional)
//!     ▼ Renormalize + weighted draw
//! Selected candidate
//! ```

use ndarray::aview1;
use rand::SeedableRng;
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use tracing::debug;

use crate::config::SamplingConfig;
use crate::diagram::{Point, Rect, Shape, Surface, TextAlign};
use crate::educational::visualizers::probability_bars;
use crate::error::{Error, Result};
use crate::model::math::{argmax, softmax};

pub const SAMPLING_PROMPT: &str = "The cat sat on the";

/// Candidate next words and their logits.
pub const CANDIDATES: [(&str, f32); 8] = [
    ("mat", 3.2),
    ("floor", 2.6),
    ("chair", 2.3),
    ("sofa", 1.9),
    ("bed", 1.6),
    ("roof", 1.1),
    ("moon", 0.2),
    ("keyboard", -0.4),
];

/// Token sampler over plain logit vectors.
#[derive(Debug, Clone)]
pub struct Sampler {
    /// 0 selects greedy decoding.
    temperature: f32,
    /// 0 disables top-k.
    top_k: usize,
    /// 1.0 disables top-p.
    top_p: f32,
    rng: StdRng,
}

impl Sampler {
    pub fn new(config: &SamplingConfig) -> Self {
        Self {
            temperature: config.temperature,
            top_k: config.top_k,
            top_p: config.top_p,
            rng: StdRng::seed_from_u64(config.seed),
        }
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    pub fn set_temperature(&mut self, temperature: f32) {
        self.temperature = temperature.max(0.0);
    }

    pub fn set_top_k(&mut self, top_k: usize) {
        self.top_k = top_k;
    }

    pub fn set_top_p(&mut self, top_p: f32) {
        self.top_p = top_p.clamp(0.0, 1.0);
    }

    /// Probability of every logit after filtering; filtered entries are 0.
    pub fn distribution(&self, logits: &[f32]) -> Result<Vec<f32>> {
        let mut probs = vec![0.0; logits.len()];
        for (index, p) in self.candidates(logits)? {
            probs[index] = p;
        }
        Ok(probs)
    }

    /// Draws one index.
    pub fn sample(&mut self, logits: &[f32]) -> Result<usize> {
        let candidates = self.candidates(logits)?;
        if let [(only, _)] = candidates.as_slice() {
            return Ok(*only);
        }
        let dist = WeightedIndex::new(candidates.iter().map(|(_, p)| *p))
            .map_err(|e| Error::Sampling(format!("failed to create distribution: {e}")))?;
        Ok(candidates[dist.sample(&mut self.rng)].0)
    }

    /// Surviving `(index, probability)` pairs, renormalised.
    fn candidates(&self, logits: &[f32]) -> Result<Vec<(usize, f32)>> {
        if logits.is_empty() {
            return Err(Error::Sampling("no logits to sample from".to_string()));
        }

        if self.temperature == 0.0 {
            let best = argmax(aview1(logits)).ok_or_else(|| Error::Sampling("no maximum".to_string()))?;
            return Ok(vec![(best, 1.0)]);
        }

        let mut indexed: Vec<(usize, f32)> = logits
            .iter()
            .map(|l| l / self.temperature)
            .enumerate()
            .collect();

        if self.top_k > 0 && self.top_k < indexed.len() {
            sort_descending(&mut indexed);
            indexed.truncate(self.top_k);
        }

        let values: Vec<f32> = indexed.iter().map(|(_, v)| *v).collect();
        let mut indexed: Vec<(usize, f32)> = indexed
            .iter()
            .map(|(i, _)| *i)
            .zip(softmax(aview1(&values)))
            .collect();

        if self.top_p > 0.0 && self.top_p < 1.0 {
            sort_descending(&mut indexed);
            let mut cumulative = 0.0f32;
            let mut cutoff = indexed.len();
            for (i, (_, prob)) in indexed.iter().enumerate() {
                cumulative += prob;
                if cumulative > self.top_p {
                    cutoff = i + 1;
                    break;
                }
            }
            indexed.truncate(cutoff);
        }

        let sum: f32 = indexed.iter().map(|(_, p)| p).sum();
        Ok(indexed.into_iter().map(|(i, p)| (i, p / sum)).collect())
    }
}

/// Stable: equal values keep index order.
fn sort_descending(items: &mut [(usize, f32)]) {
    items.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
}

/// Interactive sampling demo over [`CANDIDATES`].
#[derive(Debug, Clone)]
pub struct SamplingDemo {
    sampler: Sampler,
    labels: Vec<String>,
    logits: Vec<f32>,
    history: Vec<usize>,
}

impl SamplingDemo {
    pub fn new(config: &SamplingConfig) -> Self {
        Self {
            sampler: Sampler::new(config),
            labels: CANDIDATES.iter().map(|(w, _)| w.to_string()).collect(),
            logits: CANDIDATES.iter().map(|(_, l)| *l).collect(),
            history: Vec::new(),
        }
    }

    pub fn prompt(&self) -> &'static str {
        SAMPLING_PROMPT
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn sampler_mut(&mut self) -> &mut Sampler {
        &mut self.sampler
    }

    pub fn distribution(&self) -> Result<Vec<f32>> {
        self.sampler.distribution(&self.logits)
    }

    /// Samples the next word and records it.
    pub fn sample(&mut self) -> Result<&str> {
        let index = self.sampler.sample(&self.logits)?;
        self.history.push(index);
        debug!(word = %self.labels[index], temperature = self.sampler.temperature(), "sampled");
        Ok(&self.labels[index])
    }

    /// Indices drawn so far.
    pub fn history(&self) -> &[usize] {
        &self.history
    }

    /// How often each candidate was drawn.
    pub fn counts(&self) -> Vec<usize> {
        let mut counts = vec![0; self.labels.len()];
        for &i in &self.history {
            counts[i] += 1;
        }
        counts
    }

    pub fn reset(&mut self) {
        self.history.clear();
    }

    pub fn ascii(&self) -> Result<String> {
        Ok(probability_bars(
            &self.distribution()?,
            &self.labels,
            30,
            self.labels.len(),
        ))
    }

    /// Draws one bar per candidate.
    pub fn render(&self, surface: &mut impl Surface) -> Result<()> {
        let probs = self.distribution()?;
        let row_height = 26.0;
        let bar_x = 100.0;
        let bar_max = 260.0;
        surface.clear();
        surface.set_size(bar_x + bar_max + 70.0, 40.0 + row_height * probs.len() as f32);
        surface.add(
            Shape::text(Point::new(10.0, 20.0), format!("{SAMPLING_PROMPT} …"), TextAlign::Start)
                .attr("class", "prompt"),
        );
        for (i, (label, p)) in self.labels.iter().zip(&probs).enumerate() {
            let y = 36.0 + i as f32 * row_height;
            surface.add(
                Shape::text(Point::new(bar_x - 8.0, y + 14.0), label.clone(), TextAlign::End)
                    .attr("class", "candidate"),
            );
            let class = if *p > 0.0 { "bar" } else { "bar filtered" };
            surface.add(
                Shape::rect(Rect::new(bar_x, y, (bar_max * p).max(1.0), row_height - 6.0), 2.0)
                    .with_id(format!("candidate-{i}"))
                    .attr("class", class)
                    .attr("fill", "#6366f1"),
            );
            surface.add(
                Shape::text(
                    Point::new(bar_x + bar_max + 8.0, y + 14.0),
                    format!("{:.1}%", p * 100.0),
                    TextAlign::Start,
                )
                .attr("class", "probability"),
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(temperature: f32, top_k: usize, top_p: f32) -> SamplingConfig {
        SamplingConfig {
            temperature,
            top_k,
            top_p,
            seed: 42,
        }
    }

    #[test]
    fn test_greedy_picks_argmax() {
        let mut sampler = Sampler::new(&config(0.0, 0, 1.0));
        for _ in 0..5 {
            assert_eq!(sampler.sample(&[0.1, 2.0, 1.9]).unwrap(), 1);
        }
        assert_eq!(sampler.distribution(&[0.1, 2.0, 1.9]).unwrap(), vec![0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_top_k_limits_support() {
        let sampler = Sampler::new(&config(1.0, 2, 1.0));
        let probs = sampler.distribution(&[1.0, 3.0, 2.0, 0.0]).unwrap();
        assert_eq!(probs[0], 0.0);
        assert_eq!(probs[3], 0.0);
        assert!((probs[1] + probs[2] - 1.0).abs() < 1e-6);
        assert!(probs[1] > probs[2]);
    }

    #[test]
    fn test_top_p_keeps_token_that_crosses_threshold() {
        let sampler = Sampler::new(&config(1.0, 0, 0.5));
        let probs = sampler.distribution(&[5.0, 0.0, 0.0]).unwrap();
        assert_eq!(probs, vec![1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_seeded_sampling_is_reproducible() {
        let logits: Vec<f32> = CANDIDATES.iter().map(|(_, l)| *l).collect();
        let mut a = Sampler::new(&config(1.0, 0, 1.0));
        let mut b = Sampler::new(&config(1.0, 0, 1.0));
        let xs: Vec<usize> = (0..20).map(|_| a.sample(&logits).unwrap()).collect();
        let ys: Vec<usize> = (0..20).map(|_| b.sample(&logits).unwrap()).collect();
        assert_eq!(xs, ys);
    }

    #[test]
    fn test_empty_logits_is_error() {
        let mut sampler = Sampler::new(&SamplingConfig::default());
        assert!(matches!(sampler.sample(&[]), Err(Error::Sampling(_))));
    }

    #[test]
    fn test_demo_history() {
        let mut demo = SamplingDemo::new(&config(0.0, 0, 1.0));
        assert_eq!(demo.sample().unwrap(), "mat");
        demo.sample().unwrap();
        assert_eq!(demo.counts()[0], 2);
        demo.reset();
        assert!(demo.history().is_empty());
    }
}
