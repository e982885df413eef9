//! ASCII renderings of demo results for the terminal.
//!
//! These mirror what the demo controllers draw on a surface: attention
//! heatmaps with masked cells, probability bars, the expert load table and
//! the KV-cache work comparison.

use ndarray::ArrayView2;

use crate::model::moe::{LoadBalanceStats, expert_name};

/// Unicode block characters for different intensities.
const BLOCKS: [char; 5] = [' ', '░', '▒', '▓', '█'];

/// Drawn for cells hidden by the causal mask.
const MASKED_CELL: &str = " ···";

/// Convert a value in `[0, max_val]` to a block character.
fn intensity_to_block(value: f32, max_val: f32) -> char {
    if max_val <= 0.0 {
        return BLOCKS[0];
    }
    let normalized = (value / max_val).clamp(0.0, 1.0);
    let idx = (normalized * (BLOCKS.len() - 1) as f32).round() as usize;
    BLOCKS[idx.min(BLOCKS.len() - 1)]
}

/// ASCII heatmap of a causal attention matrix.
///
/// Rows are queries, columns keys. Cells above the diagonal are drawn as
/// masked rather than as zero weight. Intensities are relative to the
/// largest visible weight.
pub fn attention_heatmap_ascii(
    weights: ArrayView2<'_, f32>,
    labels: &[String],
    max_label_width: usize,
    title: Option<&str>,
) -> String {
    let mut lines = Vec::new();

    let row_labels: Vec<String> = labels
        .iter()
        .map(|l| {
            let truncated: String = l.chars().take(max_label_width).collect();
            format!("{truncated:max_label_width$}")
        })
        .collect();
    let col_labels: Vec<String> = labels
        .iter()
        .map(|l| format!("{:3}", l.chars().take(3).collect::<String>()))
        .collect();

    let max_weight = weights
        .indexed_iter()
        .filter(|((i, j), _)| j <= i)
        .fold(0.0f32, |m, (_, &w)| m.max(w));

    if let Some(t) = title {
        lines.push(t.to_string());
        lines.push("─".repeat(max_label_width + 2 + col_labels.len() * 4));
    }

    let mut header = " ".repeat(max_label_width + 2);
    for label in &col_labels {
        header.push(' ');
        header.push_str(label);
    }
    lines.push(header);

    for (i, row_label) in row_labels.iter().enumerate() {
        let mut row_str = format!("{row_label}  ");
        for j in 0..col_labels.len() {
            if j > i {
                row_str.push_str(MASKED_CELL);
            } else if let Some(&val) = weights.get((i, j)) {
                let block = intensity_to_block(val, max_weight);
                row_str.push(' ');
                for _ in 0..3 {
                    row_str.push(block);
                }
            } else {
                row_str.push_str("    ");
            }
        }
        lines.push(row_str.trim_end().to_string());
    }

    lines.join("\n")
}

/// Horizontal bar of `value / total`.
pub fn ratio_bar(value: usize, total: usize, width: usize, label: &str, show_percentage: bool) -> String {
    let pct = if total == 0 {
        0.0
    } else {
        (value as f32 / total as f32).min(1.0)
    };

    let filled = ((pct * width as f32) as usize).min(width);
    let empty = width - filled;

    let mut result = format!("{label}{}{}", "█".repeat(filled), "░".repeat(empty));
    if show_percentage {
        result.push_str(&format!(" {:.0}%", pct * 100.0));
    }
    result
}

/// Probability table of the `top_k` most likely labels.
///
/// Equal probabilities keep their input order.
pub fn probability_bars(probs: &[f32], labels: &[String], max_width: usize, top_k: usize) -> String {
    let mut items: Vec<(f32, &String)> = probs.iter().copied().zip(labels.iter()).collect();
    items.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
    items.truncate(top_k);

    let max_label_len = items.iter().map(|(_, l)| l.chars().count()).max().unwrap_or(0);

    let lines: Vec<String> = items
        .iter()
        .map(|(prob, label)| {
            let bar = "█".repeat((prob * max_width as f32) as usize);
            format!("│ {label:max_label_len$} │ {:5.1}%  {bar}", prob * 100.0)
        })
        .collect();

    let border_len = max_label_len + 2;
    let header = format!("┌{}┬{}┐", "─".repeat(border_len), "─".repeat(10));
    let footer = format!("└{}┴{}┘", "─".repeat(border_len), "─".repeat(10));

    format!("{}\n{}\n{}", header, lines.join("\n"), footer)
}

/// Per-expert activation counts against the uniform ideal.
pub fn expert_load_table(stats: &LoadBalanceStats) -> String {
    let max_count = stats.counts.iter().copied().max().unwrap_or(0).max(1);
    let mut lines = vec![format!(
        "Expert load ({} tokens × top-{}, ideal {:.2} per expert)",
        stats.num_tokens, stats.top_k, stats.ideal
    )];
    for (expert, &count) in stats.counts.iter().enumerate() {
        lines.push(format!(
            "  {expert} {:<10} {} {count:>2}  w={:.2}  Δ={:+.2}",
            expert_name(expert),
            ratio_bar(count, max_count, 16, "", false),
            stats.total_weight[expert],
            count as f32 - stats.ideal,
        ));
    }
    lines.push(format!("  max deviation: {:.2}", stats.max_deviation));
    lines.join("\n")
}

/// Side-by-side bars for work done with and without a cache.
pub fn cache_comparison(label: &str, without: usize, with: usize, width: usize) -> String {
    let total = without.max(with);
    format!(
        "{label}\n  without cache {} {without}\n  with cache    {} {with}",
        ratio_bar(without, total, width, "", false),
        ratio_bar(with, total, width, "", false),
    )
}

/// Draws a box around text, wrapping long lines.
pub fn box_text(text: &str, title: &str, width: usize) -> String {
    let width = width.max(title.chars().count() + 6).max(8);
    let content_width = width - 4;

    let mut result = Vec::new();

    if title.is_empty() {
        result.push(format!("┌{}┐", "─".repeat(width - 2)));
    } else {
        let title_part = format!(" {title} ");
        let remaining = width - 2 - title_part.chars().count();
        let left = remaining / 2;
        let right = remaining - left;
        result.push(format!("┌{}{}{}┐", "─".repeat(left), title_part, "─".repeat(right)));
    }

    for line in text.lines() {
        let chars: Vec<char> = line.chars().collect();
        if chars.is_empty() {
            result.push(format!("│ {:content_width$} │", ""));
        }
        for chunk in chars.chunks(content_width) {
            let chunk: String = chunk.iter().collect();
            result.push(format!("│ {chunk:content_width$} │"));
        }
    }

    result.push(format!("└{}┘", "─".repeat(width - 2)));
    result.join("\n")
}

#[cfg(test)]
mod tests {
    use ndarray::arr2;

    use super::*;

    #[test]
    fn test_heatmap_marks_masked_cells() {
        let weights = arr2(&[[1.0f32, 0.0], [0.4, 0.6]]);
        let labels = vec!["The".to_string(), "cat".to_string()];
        let map = attention_heatmap_ascii(weights.view(), &labels, 5, Some("L0 H0"));
        let rows: Vec<&str> = map.lines().collect();
        assert_eq!(rows[0], "L0 H0");
        assert!(rows[3].contains("███"));
        assert!(rows[3].contains("···"));
        assert!(!rows[4].contains("···"));
    }

    #[test]
    fn test_ratio_bar() {
        assert_eq!(ratio_bar(5, 10, 10, "", true), "█████░░░░░ 50%");
        assert_eq!(ratio_bar(1, 0, 4, "x ", false), "x ░░░░");
        assert_eq!(ratio_bar(20, 10, 4, "", false), "████");
    }

    #[test]
    fn test_probability_bars_top_k() {
        let probs = [0.1, 0.7, 0.2];
        let labels = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let table = probability_bars(&probs, &labels, 10, 2);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[1].contains("b"));
        assert!(lines[2].contains("c"));
    }

    #[test]
    fn test_box_text_wraps() {
        let boxed = box_text("abcdefghij", "t", 8);
        let lines: Vec<&str> = boxed.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines.iter().all(|l| l.chars().count() == lines[0].chars().count()));
    }
}
