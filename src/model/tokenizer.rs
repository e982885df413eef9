//! Word-level tokenizer and embedding lookup.
//!
//! Text is split on whitespace and every punctuation or symbol character
//! (ASCII or not) becomes its own token. Ids come from a small built-in vocabulary; words outside it
//! are hashed into the remaining id range, so any input maps to a stable id.

use serde::{Deserialize, Serialize};

use super::math::{Matrix, add_vec};
use super::params::ModelParams;

/// Size of the tokenizer's id space.
pub const VOCAB_SIZE: usize = 512;

/// Built-in vocabulary; a word's id is its index here.
const KNOWN_WORDS: &[&str] = &[
    "<unk>", "the", "a", "an", "cat", "sat", "on", "mat", "dog", "quick", "brown", "fox", "jumps",
    "over", "lazy", "is", "was", "of", "and", "to", "in", "it", "that", "this", "for", "with",
    "capital", "france", "paris", "print", "hello", "world", "def", "return", "if", "then", "else",
    "true", "false", "story", "poem", "one", "two", "three", "plus", "minus", "equals", ".", ",",
    "!", "?", "(", ")", "\"", "'", ":", ";", "=", "+", "-",
];

/// A single token produced by [`tokenize`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
    /// Original text as typed (case preserved).
    pub text: String,
    /// Vocabulary id.
    pub id: usize,
    /// Position in the sequence, starting at 0.
    pub position: usize,
}

impl Token {
    /// Label for diagrams; whitespace-free and at most `max_chars` long.
    pub fn display(&self, max_chars: usize) -> String {
        let count = self.text.chars().count();
        if count <= max_chars {
            self.text.clone()
        } else {
            let head: String = self.text.chars().take(max_chars.saturating_sub(1)).collect();
            format!("{head}…")
        }
    }
}

/// 64-bit FNV-1a hash.
fn fnv1a(text: &str) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in text.bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

/// Vocabulary id for a word (case-insensitive).
pub fn token_id(word: &str) -> usize {
    let lower = word.to_lowercase();
    if let Some(id) = KNOWN_WORDS.iter().position(|w| *w == lower) {
        return id;
    }
    let free = (VOCAB_SIZE - KNOWN_WORDS.len()) as u64;
    KNOWN_WORDS.len() + (fnv1a(&lower) % free) as usize
}

/// Punctuation and symbols split off as single-character tokens.
fn is_separate_symbol(ch: char) -> bool {
    ch.is_ascii_punctuation() || (!ch.is_alphanumeric() && !ch.is_whitespace())
}

/// Splits `text` into tokens with sequential positions.
///
/// Empty or whitespace-only input yields an empty vector; callers treat that
/// as "nothing to run".
pub fn tokenize(text: &str) -> Vec<Token> {
    let mut pieces: Vec<String> = Vec::new();
    let mut current = String::new();

    for ch in text.chars() {
        if ch.is_whitespace() {
            if !current.is_empty() {
                pieces.push(std::mem::take(&mut current));
            }
        } else if is_separate_symbol(ch) {
            if !current.is_empty() {
                pieces.push(std::mem::take(&mut current));
            }
            pieces.push(ch.to_string());
        } else {
            current.push(ch);
        }
    }
    if !current.is_empty() {
        pieces.push(current);
    }

    pieces
        .into_iter()
        .enumerate()
        .map(|(position, text)| Token {
            id: token_id(&text),
            text,
            position,
        })
        .collect()
}

/// Keeps at most `max` tokens.
pub fn truncate_tokens(mut tokens: Vec<Token>, max: usize) -> Vec<Token> {
    tokens.truncate(max);
    tokens
}

/// One embedding row per token: token row plus positional row.
pub fn embeddings(params: &ModelParams, tokens: &[Token]) -> Matrix {
    let mut out = Matrix::zeros((tokens.len(), params.config().embed_dim));
    for (mut row, token) in out.rows_mut().into_iter().zip(tokens) {
        row.assign(&add_vec(
            params.token_row(token.id),
            params.positional_row(token.position),
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ModelConfig, MoeConfig};

    #[test]
    fn test_tokenize_sentence() {
        let tokens = tokenize("The cat sat on the mat");
        let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, ["The", "cat", "sat", "on", "the", "mat"]);
        assert_eq!(tokens[0].id, tokens[4].id);
        assert_eq!(tokens[5].position, 5);
    }

    #[test]
    fn test_tokenize_punctuation() {
        let tokens = tokenize("print(\"The quick brown fox\")");
        let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(
            texts,
            ["print", "(", "\"", "The", "quick", "brown", "fox", "\"", ")"]
        );
    }

    #[test]
    fn test_tokenize_unicode_quotes() {
        let tokens = tokenize("“Hello” — naïve…");
        let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, ["“", "Hello", "”", "—", "naïve", "…"]);
        assert_eq!(tokens[1].id, token_id("hello"));
    }

    #[test]
    fn test_tokenize_empty() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("   \n\t").is_empty());
    }

    #[test]
    fn test_unknown_words_stay_in_range() {
        for word in ["transformer", "Zebra", "naïve", "x"] {
            let id = token_id(word);
            assert!(id < VOCAB_SIZE);
            assert_eq!(id, token_id(&word.to_uppercase()));
        }
    }

    #[test]
    fn test_embeddings_include_position() {
        let params = ModelParams::new(&ModelConfig::default(), &MoeConfig::default());
        let tokens = tokenize("the the");
        let emb = embeddings(&params, &tokens);
        assert_eq!(emb.dim(), (2, 64));
        assert_ne!(emb.row(0), emb.row(1));
    }

    #[test]
    fn test_display_truncates() {
        let token = Token {
            text: "extraordinary".to_string(),
            id: 0,
            position: 0,
        };
        assert_eq!(token.display(5), "extr…");
        assert_eq!(token.display(20), "extraordinary");
    }
}
