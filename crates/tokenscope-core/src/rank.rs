//! Turns a raw [`Distribution`] into a ranked, truncated, display-ready list.

use crate::api::Distribution;
use std::cmp::Ordering;

pub const DEFAULT_TOP_K: usize = 30;
pub const DEFAULT_MAX_TOKEN_CHARS: usize = 25;
pub const ELLIPSIS: &str = "...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankOptions {
    pub top_k: usize,
    pub max_token_chars: usize,
}

impl Default for RankOptions {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            max_token_chars: DEFAULT_MAX_TOKEN_CHARS,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankedEntry {
    /// Possibly shortened form for labels.
    pub display_token: String,
    /// Untruncated surface string, for tooltips and exact display.
    pub full_token: String,
    pub probability: f64,
    /// `probability * 100` with exactly two decimals, e.g. `"40.00"`.
    pub percentage: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RankedDistribution {
    pub entries: Vec<RankedEntry>,
    /// Number of finite candidates in the source distribution, before truncation.
    pub total_candidates: usize,
}

impl RankedDistribution {
    pub fn top(&self) -> Option<&RankedEntry> {
        self.entries.first()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Rank with the default top-30 / 25-char limits.
pub fn rank(distribution: &Distribution) -> RankedDistribution {
    rank_with(distribution, RankOptions::default())
}

/// Sort descending by probability, break ties by token text ascending, keep
/// the first `top_k`. Non-finite probabilities are dropped.
pub fn rank_with(distribution: &Distribution, options: RankOptions) -> RankedDistribution {
    let mut entries: Vec<(&str, f64)> = distribution
        .iter()
        .filter(|(_, p)| p.is_finite())
        .collect();
    let total_candidates = entries.len();

    entries.sort_by(|a, b| compare(*a, *b));
    entries.truncate(options.top_k);

    RankedDistribution {
        entries: entries
            .into_iter()
            .map(|(token, probability)| RankedEntry {
                display_token: truncate_token(token, options.max_token_chars),
                full_token: token.to_string(),
                probability,
                percentage: format_percentage(probability),
            })
            .collect(),
        total_candidates,
    }
}

fn compare(a: (&str, f64), b: (&str, f64)) -> Ordering {
    b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0))
}

/// Shorten `token` to `max_chars` characters plus an ellipsis if it is longer.
pub fn truncate_token(token: &str, max_chars: usize) -> String {
    match token.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}{}", &token[..cut], ELLIPSIS),
        None => token.to_string(),
    }
}

pub fn format_percentage(probability: f64) -> String {
    format!("{:.2}", probability * 100.0)
}
