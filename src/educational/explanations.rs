//! Info-panel content for diagram components.
//!
//! Clicking a box yields an info key (see `Component::click_key`). Keys
//! resolve to an [`InfoTopic`]; every component maps to exactly one topic,
//! and several components may share one (both Add & Norm boxes, token and
//! positional embedding).

use crate::diagram::ComponentKey;

/// An explanation with several detail levels.
#[derive(Debug, Clone)]
pub struct Explanation {
    /// Panel title.
    pub title: &'static str,
    /// One-line summary.
    pub short: &'static str,
    /// A few sentences.
    pub detailed: &'static str,
    /// Intuition behind the component.
    pub why: &'static str,
}

/// Detail level for explanations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExplanationLevel {
    Short,
    Detailed,
    Why,
}

impl Explanation {
    pub fn get(&self, level: ExplanationLevel) -> &'static str {
        match level {
            ExplanationLevel::Short => self.short,
            ExplanationLevel::Detailed => self.detailed,
            ExplanationLevel::Why => self.why,
        }
    }
}

/// Every info panel the diagrams can open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InfoTopic {
    Input,
    Tokenizer,
    Embedding,
    TransformerBlock,
    Attention,
    AddNorm,
    FeedForward,
    Moe,
    FinalNorm,
    LmHead,
    Sampling,
    Output,
    Dataset,
    Batching,
    ForwardPass,
    Loss,
    Backprop,
    Optimizer,
    WeightUpdate,
    Prompt,
    Prefill,
    KvCache,
    Decode,
    Detokenize,
    Generated,
}

impl InfoTopic {
    pub const ALL: [Self; 25] = [
        Self::Input,
        Self::Tokenizer,
        Self::Embedding,
        Self::TransformerBlock,
        Self::Attention,
        Self::AddNorm,
        Self::FeedForward,
        Self::Moe,
        Self::FinalNorm,
        Self::LmHead,
        Self::Sampling,
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
        Self::Detokenize,
        Self::Generated,
    ];

    /// Info key as passed to the click callback.
    pub fn key(self) -> &'static str {
        match self {
            Self::AddNorm => "add-norm",
            other => other.component().as_str(),
        }
    }

    /// Representative component of the topic.
    fn component(self) -> ComponentKey {
        match self {
            Self::Input => ComponentKey::Input,
            Self::Tokenizer => ComponentKey::Tokenizer,
            Self::Embedding => ComponentKey::Embedding,
            Self::TransformerBlock => ComponentKey::TransformerBlock,
            Self::Attention => ComponentKey::Attention,
            Self::AddNorm => ComponentKey::AddNorm1,
            Self::FeedForward => ComponentKey::FeedForward,
            Self::Moe => ComponentKey::Moe,
            Self::FinalNorm => ComponentKey::FinalNorm,
            Self::LmHead => ComponentKey::LmHead,
            Self::Sampling => ComponentKey::Sampling,
            Self::Output => ComponentKey::Output,
            Self::Dataset => ComponentKey::Dataset,
            Self::Batching => ComponentKey::Batching,
            Self::ForwardPass => ComponentKey::ForwardPass,
            Self::Loss => ComponentKey::Loss,
            Self::Backprop => ComponentKey::Backprop,
            Self::Optimizer => ComponentKey::Optimizer,
            Self::WeightUpdate => ComponentKey::WeightUpdate,
            Self::Prompt => ComponentKey::Prompt,
            Self::Prefill => ComponentKey::Prefill,
            Self::KvCache => ComponentKey::KvCache,
            Self::Decode => ComponentKey::Decode,
            Self::Detokenize => ComponentKey::Detokenize,
            Self::Generated => ComponentKey::Generated,
        }
    }

    /// Resolves a dynamic info key; unknown keys yield `None`.
    pub fn parse(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.key() == key)
    }

    /// Topic shown when a component is clicked.
    pub fn for_component(key: ComponentKey) -> Self {
        match key {
            ComponentKey::Input => Self::Input,
            ComponentKey::Tokenizer => Self::Tokenizer,
            ComponentKey::Embedding | ComponentKey::Positional => Self::Embedding,
            ComponentKey::TransformerBlock => Self::TransformerBlock,
            ComponentKey::Attention => Self::Attention,
            ComponentKey::AddNorm1 | ComponentKey::AddNorm2 => Self::AddNorm,
            ComponentKey::FeedForward => Self::FeedForward,
            ComponentKey::Moe => Self::Moe,
            ComponentKey::FinalNorm => Self::FinalNorm,
            ComponentKey::LmHead => Self::LmHead,
            ComponentKey::Softmax | ComponentKey::Sampling => Self::Sampling,
            ComponentKey::Output => Self::Output,
            ComponentKey::Dataset => Self::Dataset,
            ComponentKey::Batching => Self::Batching,
            ComponentKey::ForwardPass => Self::ForwardPass,
            ComponentKey::Loss => Self::Loss,
            ComponentKey::Backprop => Self::Backprop,
            ComponentKey::Optimizer => Self::Optimizer,
            ComponentKey::WeightUpdate => Self::WeightUpdate,
            ComponentKey::Prompt => Self::Prompt,
            ComponentKey::Prefill => Self::Prefill,
            ComponentKey::KvCache => Self::KvCache,
            ComponentKey::Decode => Self::Decode,
            ComponentKey::Detokenize => Self::Detokenize,
            ComponentKey::Generated => Self::Generated,
        }
    }

    pub fn explanation(self) -> &'static Explanation {
        match self {
            Self::Input => &INPUT,
            Self::Tokenizer => &TOKENIZER,
            Self::Embedding => &EMBEDDING,
            Self::TransformerBlock => &TRANSFORMER_BLOCK,
            Self::Attention => &ATTENTION,
            Self::AddNorm => &ADD_NORM,
            Self::FeedForward => &FEED_FORWARD,
            Self::Moe => &MOE,
            Self::FinalNorm => &FINAL_NORM,
            Self::LmHead => &LM_HEAD,
            Self::Sampling => &SAMPLING,
            Self::Output => &OUTPUT,
            Self::Dataset => &DATASET,
            Self::Batching => &BATCHING,
            Self::ForwardPass => &FORWARD_PASS,
            Self::Loss => &LOSS,
            Self::Backprop => &BACKPROP,
            Self::Optimizer => &OPTIMIZER,
            Self::WeightUpdate => &WEIGHT_UPDATE,
            Self::Prompt => &PROMPT,
            Self::Prefill => &PREFILL,
            Self::KvCache => &KV_CACHE,
            Self::Decode => &DECODE,
            Self::Detokenize => &DETOKENIZE,
            Self::Generated => &GENERATED,
        }
    }
}

/// Looks up panel content for an info key.
pub fn lookup(key: &str) -> Option<&'static Explanation> {
    InfoTopic::parse(key).map(InfoTopic::explanation)
}

// =============================================================================
// ARCHITECTURE
// =============================================================================

const INPUT: Explanation = Explanation {
    title: "Input Text",
    short: "The raw prompt the model continues.",
    detailed: "The model never sees characters. Everything starts from the prompt \
string, which is cut into tokens before any numbers are involved.",
    why: "A language model only ever answers one question: what comes next?",
};

const TOKENIZER: Explanation = Explanation {
    title: "Tokenizer",
    short: "Splits text into tokens and maps each to an id.",
    detailed: "This toy tokenizer splits on whitespace and punctuation and looks \
every word up in a small vocabulary of 512 ids. Real models use byte-pair \
encoding with vocabularies of 30k-200k pieces.",
    why: "Neural networks need numbers; ids index rows of the embedding table.",
};

const EMBEDDING: Explanation = Explanation {
    title: "Embeddings",
    short: "Each token id becomes a 64-dimensional vector, plus its position.",
    detailed: "The id selects a row of the token embedding table. A positional \
vector for the token's index is added, so \"cat sat\" and \"sat cat\" produce \
different inputs to the first layer.",
    why: "Attention by itself is order-blind; positions are the only ordering signal.",
};

const TRANSFORMER_BLOCK: Explanation = Explanation {
    title: "Transformer Block",
    short: "Attention then feed-forward, each wrapped in a residual and a norm.",
    detailed: "The block is repeated three times here (dozens of times in real \
models). The output of one block is the input of the next.",
    why: "Stacking blocks lets later layers build on patterns found by earlier ones.",
};

const ATTENTION: Explanation = Explanation {
    title: "Multi-Head Self-Attention",
    short: "Every token gathers information from the tokens before it.",
    detailed: "Each head projects tokens to queries, keys and values. Scores are \
Q·K/√16, future positions are masked, and a softmax turns each row into \
weights that mix the values. Four heads look for different relationships in \
parallel.",
    why: "The causal mask keeps the model honest: it predicts the next token \
without peeking at it.",
};

const ADD_NORM: Explanation = Explanation {
    title: "Add & Norm",
    short: "Adds the sublayer input back and renormalises.",
    detailed: "The residual connection computes x + Sublayer(x); layer \
normalisation then rescales every vector to zero mean and unit variance.",
    why: "Residual paths let information and gradients skip a sublayer entirely.",
};

const FEED_FORWARD: Explanation = Explanation {
    title: "Feed-Forward Network",
    short: "A per-token MLP: 64 → 256 → 64 with GELU.",
    detailed: "Each token vector is expanded four times, passed through GELU and \
projected back. No information moves between tokens here.",
    why: "Most of a transformer's parameters, and much of its stored knowledge, \
live in these layers.",
};

const MOE: Explanation = Explanation {
    title: "Mixture of Experts",
    short: "A router sends each token to 2 of 8 expert networks.",
    detailed: "Router logits are softmaxed and the top two experts process the \
token; their outputs are mixed with the renormalised probabilities. In this \
demo a word-category lookup nudges the router, a teaching shortcut that real \
routers do not have.",
    why: "Only a fraction of the parameters run per token, so capacity grows \
without growing compute.",
};

const FINAL_NORM: Explanation = Explanation {
    title: "Final LayerNorm",
    short: "Normalises the last hidden state before the output projection.",
    detailed: "After the last block the hidden vector of the final position is \
normalised once more.",
    why: "Keeps logits on a stable scale regardless of depth.",
};

const LM_HEAD: Explanation = Explanation {
    title: "LM Head",
    short: "Projects the hidden state to one score per vocabulary entry.",
    detailed: "A single matrix multiply turns the 64-d vector into a logit for \
each of the vocabulary's tokens.",
    why: "Logits are unnormalised preferences over every possible next token.",
};

const SAMPLING: Explanation = Explanation {
    title: "Softmax & Sampling",
    short: "Turns logits into probabilities and picks the next token.",
    detailed: "Temperature divides the logits; top-k keeps the k best; top-p keeps \
the smallest set whose probability reaches p. A weighted random draw then \
selects a token. Temperature 0 always takes the most likely one.",
    why: "Sampling is where creativity and determinism are traded off.",
};

const OUTPUT: Explanation = Explanation {
    title: "Next Token",
    short: "The chosen token is appended and the loop repeats.",
    detailed: "Generation is autoregressive: each new token becomes part of the \
input for the following step.",
    why: "Whole paragraphs are just this one step repeated.",
};

// =============================================================================
// TRAINING
// =============================================================================

const DATASET: Explanation = Explanation {
    title: "Training Corpus",
    short: "Huge amounts of text used as the prediction target.",
    detailed: "Pre-training uses web pages, books and code. The only label is the \
text itself: every position predicts its successor.",
    why: "Self-supervision needs no human annotation, so it scales.",
};

const BATCHING: Explanation = Explanation {
    title: "Batching",
    short: "Sequences are grouped, and targets are the inputs shifted by one.",
    detailed: "Many fixed-length sequences are stacked into a batch. The target for \
position i is the token at position i + 1.",
    why: "One forward pass trains every position of every sequence at once.",
};

const FORWARD_PASS: Explanation = Explanation {
    title: "Forward Pass",
    short: "The model predicts a distribution at every position.",
    detailed: "The same stack used for inference runs over the batch; the causal \
mask makes all positions independent predictions.",
    why: "Training and inference share the architecture, only the loop differs.",
};

const LOSS: Explanation = Explanation {
    title: "Cross-Entropy Loss",
    short: "−log of the probability given to the correct next token.",
    detailed: "Confident correct predictions cost almost nothing; confident wrong \
ones are expensive. Losses are averaged over the batch.",
    why: "Minimising it is the same as maximising the likelihood of the data.",
};

const BACKPROP: Explanation = Explanation {
    title: "Backpropagation",
    short: "Computes the gradient of the loss for every weight.",
    detailed: "The chain rule is applied backwards through every layer, reusing \
activations saved during the forward pass.",
    why: "Gradients say which direction makes the loss smaller.",
};

const OPTIMIZER: Explanation = Explanation {
    title: "Optimizer",
    short: "AdamW turns gradients into weight updates.",
    detailed: "Adam keeps running averages of gradients and their squares to scale \
each step; weight decay gently shrinks weights.",
    why: "Good step sizes per parameter make training stable.",
};

const WEIGHT_UPDATE: Explanation = Explanation {
    title: "Weight Update",
    short: "Weights move a little, then the next batch arrives.",
    detailed: "The loop forward → loss → backward → update runs for hundreds of \
thousands of steps.",
    why: "Knowledge accumulates as many tiny nudges.",
};

// =============================================================================
// INFERENCE
// =============================================================================

const PROMPT: Explanation = Explanation {
    title: "Prompt",
    short: "The user's text, tokenized.",
    detailed: "Inference starts from the prompt tokens; nothing has been computed \
yet.",
    why: "Everything generated is conditioned on this context.",
};

const PREFILL: Explanation = Explanation {
    title: "Prefill",
    short: "All prompt tokens go through the model in one pass.",
    detailed: "Keys and values for every prompt position are computed in parallel \
and stored in the KV cache.",
    why: "Prefill is compute-bound and fast per token; it sets up decoding.",
};

const KV_CACHE: Explanation = Explanation {
    title: "KV Cache",
    short: "Stores keys and values of past tokens for reuse.",
    detailed: "Without a cache, step t recomputes K and V for all t tokens. With \
it, only the new token's K and V are computed and appended.",
    why: "It turns quadratic recomputation into linear work per sequence.",
};

const DECODE: Explanation = Explanation {
    title: "Decode Step",
    short: "One new token per forward pass.",
    detailed: "The newest token attends to the cached keys and values of every \
previous position.",
    why: "Decode is memory-bound: it reads the whole cache for a single token.",
};

const DETOKENIZE: Explanation = Explanation {
    title: "Detokenize",
    short: "Token ids become text again.",
    detailed: "Ids are mapped back to their pieces and joined.",
    why: "Users read text, the model only produces ids.",
};

const GENERATED: Explanation = Explanation {
    title: "Generated Text",
    short: "The continuation shown to the user.",
    detailed: "Generation stops at an end-of-sequence token or a length limit.",
    why: "Streaming shows tokens as soon as each decode step finishes.",
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_component_has_content() {
        for key in ComponentKey::ALL {
            let topic = InfoTopic::for_component(key);
            assert!(!topic.explanation().title.is_empty());
        }
    }

    #[test]
    fn test_click_keys_resolve() {
        for section in crate::diagram::Section::ALL {
            for component in section.components() {
                assert_eq!(
                    InfoTopic::parse(component.click_key()),
                    Some(InfoTopic::for_component(component.key)),
                    "{}",
                    component.key
                );
            }
        }
    }

    #[test]
    fn test_unknown_key() {
        assert!(lookup("warp-drive").is_none());
        assert_eq!(lookup("add-norm").unwrap().title, "Add & Norm");
    }
}
