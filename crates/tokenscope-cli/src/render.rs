//! Plain-text rendering of session state for the terminal.

use tokenscope_core::session::{ModelState, Session};
use tokenscope_core::{RankedDistribution, TokenInfo};

/// Width of the longest bar, in cells.
pub const BAR_WIDTH: usize = 40;

/// Tokens on one line, each prefixed with its index; the selected one is bracketed.
pub fn render_tokens(tokens: &[TokenInfo], selected: Option<usize>) -> String {
    if tokens.is_empty() {
        return "(no tokens)".to_string();
    }
    tokens
        .iter()
        .enumerate()
        .map(|(i, t)| {
            let shown = t.token.replace('\n', "\\n");
            if selected == Some(i) {
                format!("{i}:[{shown}]")
            } else {
                format!("{i}:{shown}")
            }
        })
        .collect::<Vec<_>>()
        .join("  ")
}

/// Horizontal bars scaled to the most likely entry, then a summary line.
pub fn render_distribution(ranked: &RankedDistribution) -> String {
    let Some(top) = ranked.top() else {
        return "No predictions for this position.".to_string();
    };

    let label_width = ranked
        .entries
        .iter()
        .map(|e| e.display_token.chars().count())
        .max()
        .unwrap_or(0);
    let scale = if top.probability > 0.0 {
        BAR_WIDTH as f64 / top.probability
    } else {
        0.0
    };

    let mut out = String::new();
    for entry in &ranked.entries {
        let cells = (entry.probability * scale).round() as usize;
        let label = entry.display_token.replace('\n', "\\n");
        out.push_str(&format!(
            "{label:>label_width$} | {bar:<BAR_WIDTH$} {pct:>6}%\n",
            bar = "#".repeat(cells.min(BAR_WIDTH)),
            pct = entry.percentage,
        ));
    }
    out.push_str(&format!(
        "Most likely: {}  Probability: {}%  Total tokens: {}",
        top.full_token, top.percentage, ranked.total_candidates
    ));
    out
}

pub fn render_status(session: &Session) -> String {
    let model = match session.model_state() {
        ModelState::NotLoaded => "not loaded".to_string(),
        ModelState::Loading { model_path } => format!("loading {model_path}..."),
        ModelState::Loaded(info) => {
            let mut s = info.model_path.clone();
            if let Some(device) = &info.device {
                s.push_str(&format!(" on {device}"));
            }
            if let Some(vocab) = info.vocab_size {
                s.push_str(&format!(" (vocab {vocab})"));
            }
            s
        }
    };

    let mut lines = vec![
        format!("Model: {model}"),
        format!("Text: {:?}", session.text()),
        format!(
            "Tokens: {}{}",
            session.tokens().len(),
            if session.tokens_current() { "" } else { " (stale)" }
        ),
    ];
    match session.selection_label() {
        Some(label) => lines.push(format!("Selected: {label}")),
        None => lines.push(format!(
            "Click a token to see conditional probabilities ({} tokens)",
            session.tokens().len()
        )),
    }
    if session.is_tokenizing() {
        lines.push("Tokenizing...".to_string());
    }
    if session.is_predicting() {
        lines.push("Loading predictions...".to_string());
    }
    if let Some(notice) = session.notice() {
        lines.push(format!("Error: {}", notice.message));
    }
    lines.join("\n")
}
