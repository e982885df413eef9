//! Self-attention demo controller.
//!
//! Runs the simulator on user text and shows one head (or the mean of all
//! heads) of one layer as a heatmap. Cells above the diagonal are drawn as
//! masked. An empty input leaves the previous result on screen.

use std::sync::Arc;

use ndarray::s;
use tracing::info;

use crate::diagram::{Point, Rect, Shape, Surface, TextAlign};
use crate::educational::visualizers::attention_heatmap_ascii;
use crate::error::{Error, Result};
use crate::model::attention::{AttentionSimulator, ForwardPass};
use crate::model::math::{Matrix, argmax};
use crate::model::params::ModelParams;
use crate::model::tokenizer::{tokenize, truncate_tokens};

const CELL: f32 = 36.0;
const LABEL_WIDTH: f32 = 80.0;

/// Which head the heatmap shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadSelection {
    Head(usize),
    /// Mean over all heads of the layer.
    Average,
}

/// One heatmap cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeatmapCell {
    pub row: usize,
    pub col: usize,
    pub weight: f32,
    /// Future position hidden by the causal mask.
    pub masked: bool,
}

#[derive(Debug, Clone)]
pub struct AttentionDemo {
    simulator: AttentionSimulator,
    max_tokens: usize,
    result: Option<ForwardPass>,
    layer: usize,
    head: HeadSelection,
}

impl AttentionDemo {
    pub fn new(params: Arc<ModelParams>) -> Self {
        let max_tokens = params.config().max_tokens;
        Self {
            simulator: AttentionSimulator::new(params),
            max_tokens,
            result: None,
            layer: 0,
            head: HeadSelection::Head(0),
        }
    }

    /// Tokenizes `text` (truncated to the token limit) and runs all layers.
    ///
    /// Empty input returns [`Error::EmptyInput`] and keeps the prior result.
    pub fn run(&mut self, text: &str) -> Result<&ForwardPass> {
        let tokens = truncate_tokens(tokenize(text), self.max_tokens);
        let pass = self
            .simulator
            .run_forward_pass(&tokens)
            .ok_or(Error::EmptyInput)?;
        info!(
            tokens = pass.seq_len(),
            layers = pass.layers.len(),
            "attention demo run"
        );
        Ok(self.result.insert(pass))
    }

    pub fn result(&self) -> Option<&ForwardPass> {
        self.result.as_ref()
    }

    pub fn layer(&self) -> usize {
        self.layer
    }

    pub fn head(&self) -> HeadSelection {
        self.head
    }

    /// Returns `false` for a layer that does not exist.
    pub fn select_layer(&mut self, layer: usize) -> bool {
        if layer >= self.simulator.params().layers().len() {
            return false;
        }
        self.layer = layer;
        true
    }

    /// Returns `false` for a head that does not exist.
    pub fn select_head(&mut self, head: HeadSelection) -> bool {
        if let HeadSelection::Head(h) = head
            && h >= self.simulator.params().config().num_heads
        {
            return false;
        }
        self.head = head;
        true
    }

    /// Weights for the current layer and head selection.
    pub fn weights(&self) -> Option<Matrix> {
        let pass = self.result.as_ref()?;
        match self.head {
            HeadSelection::Head(h) => pass.weights(self.layer, h).cloned(),
            HeadSelection::Average => pass.mean_weights(self.layer),
        }
    }

    pub fn heatmap_cells(&self) -> Vec<HeatmapCell> {
        let Some(weights) = self.weights() else {
            return Vec::new();
        };
        weights
            .indexed_iter()
            .map(|((row, col), &weight)| HeatmapCell {
                row,
                col,
                weight,
                masked: col > row,
            })
            .collect()
    }

    /// For every query token, the key it attends to most and the weight.
    pub fn strongest_links(&self) -> Vec<(usize, usize, f32)> {
        let Some(weights) = self.weights() else {
            return Vec::new();
        };
        weights
            .rows()
            .into_iter()
            .enumerate()
            .filter_map(|(i, row)| {
                let visible = row.slice_move(s![..=i]);
                let j = argmax(visible)?;
                Some((i, j, visible[j]))
            })
            .collect()
    }

    fn title(&self) -> String {
        match self.head {
            HeadSelection::Head(h) => format!("Layer {} · Head {}", self.layer, h),
            HeadSelection::Average => format!("Layer {} · all heads", self.layer),
        }
    }

    fn labels(&self) -> Vec<String> {
        self.result
            .as_ref()
            .map(|p| p.tokens.iter().map(|t| t.display(8)).collect())
            .unwrap_or_default()
    }

    pub fn ascii(&self) -> Option<String> {
        let weights = self.weights()?;
        Some(attention_heatmap_ascii(
            weights.view(),
            &self.labels(),
            8,
            Some(&self.title()),
        ))
    }

    /// Draws the heatmap. Returns the number of cells drawn.
    pub fn render(&self, surface: &mut impl Surface) -> usize {
        surface.clear();
        let cells = self.heatmap_cells();
        let labels = self.labels();
        let n = labels.len() as f32;
        surface.set_size(LABEL_WIDTH + CELL * n + 20.0, LABEL_WIDTH + CELL * n + 20.0);
        if cells.is_empty() {
            return 0;
        }

        surface.add(
            Shape::text(Point::new(10.0, 20.0), self.title(), TextAlign::Start).attr("class", "title"),
        );
        for (i, label) in labels.iter().enumerate() {
            let offset = LABEL_WIDTH + CELL * i as f32 + CELL / 2.0;
            surface.add(
                Shape::text(Point::new(LABEL_WIDTH - 6.0, offset + 4.0), label.clone(), TextAlign::End)
                    .attr("class", "row-label"),
            );
            surface.add(
                Shape::text(Point::new(offset, LABEL_WIDTH - 8.0), label.clone(), TextAlign::Middle)
                    .attr("class", "col-label"),
            );
        }

        let max = cells
            .iter()
            .filter(|c| !c.masked)
            .map(|c| c.weight)
            .fold(0.0f32, f32::max)
            .max(f32::EPSILON);
        for cell in &cells {
            let rect = Rect::new(
                LABEL_WIDTH + CELL * cell.col as f32,
                LABEL_WIDTH + CELL * cell.row as f32,
                CELL - 2.0,
                CELL - 2.0,
            );
            let shape = Shape::rect(rect, 2.0).with_id(format!("cell-{}-{}", cell.row, cell.col));
            let shape = if cell.masked {
                shape.attr("class", "cell masked").attr("fill", "#f1f5f9")
            } else {
                shape
                    .attr("class", "cell")
                    .attr("fill", "#f59e0b")
                    .attr("fill-opacity", format!("{:.3}", cell.weight / max))
                    .attr("data-weight", format!("{:.3}", cell.weight))
            };
            surface.add(shape);
        }
        cells.len()
    }

    /// Drops the current result.
    pub fn reset(&mut self) {
        self.result = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ModelConfig, MoeConfig};
    use crate::diagram::Scene;

    fn demo() -> AttentionDemo {
        AttentionDemo::new(Arc::new(ModelParams::new(
            &ModelConfig::default(),
            &MoeConfig::default(),
        )))
    }

    #[test]
    fn test_empty_input_keeps_prior_result() {
        let mut demo = demo();
        demo.run("hello world").unwrap();
        assert!(matches!(demo.run("   "), Err(Error::EmptyInput)));
        assert_eq!(demo.result().unwrap().seq_len(), 2);
    }

    #[test]
    fn test_truncates_to_ten_tokens() {
        let mut demo = demo();
        let pass = demo.run("a b c d e f g h i j k l m").unwrap();
        assert_eq!(pass.seq_len(), 10);
    }

    #[test]
    fn test_selection_bounds() {
        let mut demo = demo();
        assert!(demo.select_layer(2));
        assert!(!demo.select_layer(3));
        assert!(demo.select_head(HeadSelection::Head(3)));
        assert!(!demo.select_head(HeadSelection::Head(4)));
        assert!(demo.select_head(HeadSelection::Average));
        assert_eq!(demo.layer(), 2);
    }

    #[test]
    fn test_render_marks_masked_cells() {
        let mut demo = demo();
        demo.run("one two three").unwrap();
        let mut scene = Scene::new();
        assert_eq!(demo.render(&mut scene), 9);
        assert_eq!(scene.count_class("masked"), 3);
        assert_eq!(scene.count_class("cell"), 9);
    }

    #[test]
    fn test_strongest_links_are_causal() {
        let mut demo = demo();
        demo.run("The cat sat on the mat").unwrap();
        demo.select_head(HeadSelection::Average);
        let links = demo.strongest_links();
        assert_eq!(links.len(), 6);
        assert_eq!(links[0], (0, 0, 1.0));
        assert!(links.iter().all(|(i, j, _)| j <= i));
    }
}
