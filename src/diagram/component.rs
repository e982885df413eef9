//! Static component catalogue for the three diagram sections.
//!
//! Components are keyed by [`ComponentKey`], so lookups inside the crate are
//! exhaustive matches. Keys arriving as strings (cross-section links, tour
//! wiring, info panels) go through [`ComponentKey::parse`], which returns
//! `None` for anything unknown.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Top-level view; each section renders one diagram variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Section {
    Architecture,
    Training,
    Inference,
}

impl Section {
    pub const ALL: [Self; 3] = [Self::Architecture, Self::Training, Self::Inference];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Architecture => "architecture",
            Self::Training => "training",
            Self::Inference => "inference",
        }
    }

    pub fn parse(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == id)
    }

    /// Components drawn in this section, in drawing order.
    pub fn components(self) -> Vec<Component> {
        match self {
            Self::Architecture => architecture_components(),
            Self::Training => training_components(),
            Self::Inference => inference_components(),
        }
    }

    /// Arrows between components of this section.
    pub fn connectors(self) -> Vec<Connector> {
        use ComponentKey::*;
        match self {
            Self::Architecture => vec![
                Connector::flow(Input, Tokenizer),
                Connector::flow(Tokenizer, Embedding),
                Connector::flow(Embedding, Positional),
                Connector::flow(Positional, Attention),
                Connector::flow(Attention, AddNorm1),
                Connector::flow(AddNorm1, FeedForward),
                Connector::flow(AddNorm1, Moe),
                Connector::flow(FeedForward, AddNorm2),
                Connector::flow(Moe, AddNorm2),
                Connector::flow(AddNorm2, FinalNorm),
                Connector::flow(FinalNorm, LmHead),
                Connector::flow(LmHead, Softmax),
                Connector::flow(Softmax, Output),
                Connector::residual(Positional, AddNorm1),
                Connector::residual(AddNorm1, AddNorm2),
            ],
            Self::Training => vec![
                Connector::flow(Dataset, Batching),
                Connector::flow(Batching, ForwardPass),
                Connector::flow(ForwardPass, Loss),
                Connector::flow(Loss, Backprop),
                Connector::flow(Backprop, Optimizer),
                Connector::flow(Optimizer, WeightUpdate),
                Connector::residual(WeightUpdate, ForwardPass),
            ],
            Self::Inference => vec![
                Connector::flow(Prompt, Prefill),
                Connector::flow(Prefill, KvCache),
                Connector::flow(KvCache, Decode),
                Connector::flow(Decode, Sampling),
                Connector::flow(Sampling, Detokenize),
                Connector::flow(Detokenize, Generated),
                Connector::residual(Sampling, Decode),
            ],
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every component that appears in any section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ComponentKey {
    // Architecture
    Input,
    Tokenizer,
    Embedding,
    Positional,
    TransformerBlock,
    Attention,
    AddNorm1,
    FeedForward,
    Moe,
    AddNorm2,
    FinalNorm,
    LmHead,
    Softmax,
    Output,
    // Training
    Dataset,
    Batching,
    ForwardPass,
    Loss,
    Backprop,
    Optimizer,
    WeightUpdate,
    // Inference
    Prompt,
    Prefill,
    KvCache,
    Decode,
    Sampling,
    Detokenize,
    Generated,
}

impl ComponentKey {
    pub const ALL: [Self; 28] = [
        Self::Input,
        Self::Tokenizer,
        Self::Embedding,
        Self::Positional,
        Self::TransformerBlock,
        Self::Attention,
        Self::AddNorm1,
        Self::FeedForward,
        Self::Moe,
        Self::AddNorm2,
        Self::FinalNorm,
        Self::LmHead,
        Self::Softmax,
        Self::Output,
        Self::Dataset,
        Self::Batching,
        Self::ForwardPass,
        Self::Loss,
        Self::Backprop,
        Self::Optimizer,
        Self::WeightUpdate,
        Self::Prompt,
        Self::Prefill,
        Self::KvCache,
        Self::Decode,
        Self::Sampling,
        Self::Detokenize,
        Self::Generated,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Tokenizer => "tokenizer",
            Self::Embedding => "embedding",
            Self::Positional => "positional",
            Self::TransformerBlock => "transformer-block",
            Self::Attention => "attention",
            Self::AddNorm1 => "add-norm-1",
            Self::FeedForward => "ffn",
            Self::Moe => "moe",
            Self::AddNorm2 => "add-norm-2",
            Self::FinalNorm => "final-norm",
            Self::LmHead => "lm-head",
            Self::Softmax => "softmax",
            Self::Output => "output",
            Self::Dataset => "dataset",
            Self::Batching => "batching",
            Self::ForwardPass => "forward-pass",
            Self::Loss => "loss",
            Self::Backprop => "backprop",
            Self::Optimizer => "optimizer",
            Self::WeightUpdate => "weight-update",
            Self::Prompt => "prompt",
            Self::Prefill => "prefill",
            Self::KvCache => "kv-cache",
            Self::Decode => "decode",
            Self::Sampling => "sampling",
            Self::Detokenize => "detokenize",
            Self::Generated => "generated",
        }
    }

    /// Parses a textual key; unknown keys yield `None`.
    pub fn parse(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == key)
    }

    /// Element id of the component's box on the drawing surface.
    pub fn element_id(self) -> String {
        format!("component-{}", self.as_str())
    }

    /// Section whose diagram contains this component.
    pub fn section(self) -> Section {
        match self {
            Self::Input
            | Self::Tokenizer
            | Self::Embedding
            | Self::Positional
            | Self::TransformerBlock
            | Self::Attention
            | Self::AddNorm1
            | Self::FeedForward
            | Self::Moe
            | Self::AddNorm2
            | Self::FinalNorm
            | Self::LmHead
            | Self::Softmax
            | Self::Output => Section::Architecture,
            Self::Dataset
            | Self::Batching
            | Self::ForwardPass
            | Self::Loss
            | Self::Backprop
            | Self::Optimizer
            | Self::WeightUpdate => Section::Training,
            Self::Prompt
            | Self::Prefill
            | Self::KvCache
            | Self::Decode
            | Self::Sampling
            | Self::Detokenize
            | Self::Generated => Section::Inference,
        }
    }
}

impl fmt::Display for ComponentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static descriptor of one diagram box.
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    pub key: ComponentKey,
    pub label: &'static str,
    pub sublabel: Option<&'static str>,
    /// Top edge in diagram coordinates.
    pub y: f32,
    pub height: f32,
    pub color: &'static str,
    /// Info-panel key when it differs from the component key.
    pub info_key: Option<&'static str>,
    /// Enclosing container (nesting depth is at most 2).
    pub parent: Option<ComponentKey>,
    pub is_container: bool,
    pub hidden: bool,
    pub has_toggle: bool,
    pub has_demo: bool,
}

impl Component {
    fn new(key: ComponentKey, label: &'static str, y: f32, height: f32, color: &'static str) -> Self {
        Self {
            key,
            label,
            sublabel: None,
            y,
            height,
            color,
            info_key: None,
            parent: None,
            is_container: false,
            hidden: false,
            has_toggle: false,
            has_demo: false,
        }
    }

    fn sublabel(mut self, text: &'static str) -> Self {
        self.sublabel = Some(text);
        self
    }

    fn info(mut self, key: &'static str) -> Self {
        self.info_key = Some(key);
        self
    }

    fn child_of(mut self, parent: ComponentKey) -> Self {
        self.parent = Some(parent);
        self
    }

    fn container(mut self) -> Self {
        self.is_container = true;
        self
    }

    fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    fn toggle(mut self) -> Self {
        self.has_toggle = true;
        self
    }

    fn demo(mut self) -> Self {
        self.has_demo = true;
        self
    }

    /// Key passed to the info-panel callback when the box is clicked.
    pub fn click_key(&self) -> &'static str {
        self.info_key.unwrap_or(self.key.as_str())
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}

/// Arrow style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConnectorKind {
    /// Straight data flow from one box to the next.
    Flow,
    /// Side lane (residual or feedback loop).
    Residual,
}

/// Arrow between two components.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Connector {
    pub from: ComponentKey,
    pub to: ComponentKey,
    pub kind: ConnectorKind,
}

impl Connector {
    pub fn flow(from: ComponentKey, to: ComponentKey) -> Self {
        Self {
            from,
            to,
            kind: ConnectorKind::Flow,
        }
    }

    pub fn residual(from: ComponentKey, to: ComponentKey) -> Self {
        Self {
            from,
            to,
            kind: ConnectorKind::Residual,
        }
    }
}

fn architecture_components() -> Vec<Component> {
    use ComponentKey::*;
    vec![
        Component::new(Input, "Input Text", 20.0, 44.0, "#e0f2fe").sublabel("\"The cat sat on the\""),
        Component::new(Tokenizer, "Tokenizer", 90.0, 50.0, "#dbeafe").sublabel("text → token ids"),
        Component::new(Embedding, "Token Embedding", 166.0, 50.0, "#ede9fe").sublabel("id → 64-d vector"),
        Component::new(Positional, "Positional Encoding", 242.0, 44.0, "#ede9fe")
            .sublabel("token + position")
            .info("embedding"),
        Component::new(TransformerBlock, "Transformer Block ×3", 312.0, 300.0, "#f8fafc").container(),
        Component::new(Attention, "Multi-Head Attention", 348.0, 56.0, "#fde68a")
            .sublabel("4 heads, causal mask")
            .child_of(TransformerBlock)
            .demo(),
        Component::new(AddNorm1, "Add & Norm", 426.0, 40.0, "#e5e7eb")
            .info("add-norm")
            .child_of(TransformerBlock),
        Component::new(FeedForward, "Feed-Forward", 488.0, 56.0, "#bbf7d0")
            .sublabel("64 → 256 → 64, GELU")
            .child_of(TransformerBlock)
            .toggle(),
        Component::new(Moe, "Mixture of Experts", 488.0, 56.0, "#fecaca")
            .sublabel("8 experts, top-2")
            .child_of(TransformerBlock)
            .hidden()
            .toggle()
            .demo(),
        Component::new(AddNorm2, "Add & Norm", 566.0, 40.0, "#e5e7eb")
            .info("add-norm")
            .child_of(TransformerBlock),
        Component::new(FinalNorm, "Final LayerNorm", 640.0, 44.0, "#e5e7eb"),
        Component::new(LmHead, "LM Head", 710.0, 50.0, "#fbcfe8").sublabel("64 → vocab logits"),
        Component::new(Softmax, "Softmax", 786.0, 44.0, "#fce7f3")
            .sublabel("logits → probabilities")
            .info("sampling")
            .demo(),
        Component::new(Output, "Next Token", 856.0, 44.0, "#e0f2fe"),
    ]
}

fn training_components() -> Vec<Component> {
    use ComponentKey::*;
    vec![
        Component::new(Dataset, "Training Corpus", 20.0, 50.0, "#e0f2fe").sublabel("trillions of tokens"),
        Component::new(Batching, "Batching", 96.0, 50.0, "#dbeafe").sublabel("shift targets by one"),
        Component::new(ForwardPass, "Forward Pass", 172.0, 50.0, "#fde68a").sublabel("predict every next token"),
        Component::new(Loss, "Cross-Entropy Loss", 248.0, 50.0, "#fecaca").sublabel("−log p(target)"),
        Component::new(Backprop, "Backpropagation", 324.0, 50.0, "#ede9fe").sublabel("gradients per weight"),
        Component::new(Optimizer, "Optimizer (AdamW)", 400.0, 50.0, "#bbf7d0"),
        Component::new(WeightUpdate, "Weight Update", 476.0, 50.0, "#e5e7eb").sublabel("repeat for next batch"),
    ]
}

fn inference_components() -> Vec<Component> {
    use ComponentKey::*;
    vec![
        Component::new(Prompt, "Prompt", 20.0, 50.0, "#e0f2fe"),
        Component::new(Prefill, "Prefill", 96.0, 50.0, "#dbeafe").sublabel("all prompt tokens at once"),
        Component::new(KvCache, "KV Cache", 172.0, 50.0, "#fde68a")
            .sublabel("reuse past keys/values")
            .demo(),
        Component::new(Decode, "Decode Step", 248.0, 50.0, "#ede9fe").sublabel("one new token"),
        Component::new(Sampling, "Sampling", 324.0, 50.0, "#fecaca")
            .sublabel("temperature, top-k, top-p")
            .demo(),
        Component::new(Detokenize, "Detokenize", 400.0, 50.0, "#bbf7d0"),
        Component::new(Generated, "Generated Text", 476.0, 50.0, "#e0f2fe"),
    ]
}
