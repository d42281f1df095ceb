use crate::api::TokenInfo;
use std::sync::Arc;

/// Immutable snapshot of the edited text. `seq` grows on every change and is
/// never reused, so it identifies the snapshot even when two texts are equal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    text: Arc<str>,
    seq: u64,
}

impl Document {
    pub fn new(text: impl Into<Arc<str>>, seq: u64) -> Self {
        Self {
            text: text.into(),
            seq,
        }
    }

    pub fn empty(seq: u64) -> Self {
        Self::new("", seq)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn shared_text(&self) -> Arc<str> {
        self.text.clone()
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Whitespace-only text never reaches the tokenizer.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Where a committed token sequence came from. The prediction endpoint
/// re-tokenizes the exact text it was given, so it wins ties.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenOrigin {
    Tokenize,
    Prediction,
}

/// Token list from the most recent accepted tokenization. Replaced wholesale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSequence {
    tokens: Vec<TokenInfo>,
    seq: u64,
    origin: TokenOrigin,
}

impl TokenSequence {
    pub fn empty(seq: u64) -> Self {
        Self {
            tokens: Vec::new(),
            seq,
            origin: TokenOrigin::Tokenize,
        }
    }

    pub fn new(tokens: Vec<TokenInfo>, seq: u64, origin: TokenOrigin) -> Self {
        Self { tokens, seq, origin }
    }

    pub fn tokens(&self) -> &[TokenInfo] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Edit sequence number of the document these tokens were produced for.
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn origin(&self) -> TokenOrigin {
        self.origin
    }

    pub fn is_current_for(&self, document: &Document) -> bool {
        self.seq == document.seq()
    }

    /// Precedence rule for a candidate sequence produced for `seq`:
    /// it must belong to the current document and not be older than what is
    /// committed; on equal `seq` a tokenize result never displaces a
    /// prediction-carried one.
    pub fn accepts(&self, seq: u64, origin: TokenOrigin, document: &Document) -> bool {
        if seq != document.seq() || seq < self.seq {
            return false;
        }
        !(seq == self.seq
            && self.origin == TokenOrigin::Prediction
            && origin == TokenOrigin::Tokenize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(n: usize) -> Vec<TokenInfo> {
        (0..n).map(|i| TokenInfo::new(format!("t{i}"), i as i64)).collect()
    }

    #[test]
    fn test_blank_document() {
        assert!(Document::new("  \n\t", 1).is_blank());
        assert!(!Document::new(" a ", 1).is_blank());
    }

    #[test]
    fn test_accepts_only_current_document() {
        let doc = Document::new("hello", 5);
        let committed = TokenSequence::new(toks(1), 3, TokenOrigin::Tokenize);

        assert!(committed.accepts(5, TokenOrigin::Tokenize, &doc));
        assert!(!committed.accepts(4, TokenOrigin::Tokenize, &doc));
        assert!(!committed.accepts(4, TokenOrigin::Prediction, &doc));
    }

    #[test]
    fn test_prediction_wins_ties() {
        let doc = Document::new("hello", 5);
        let from_tokenize = TokenSequence::new(toks(2), 5, TokenOrigin::Tokenize);
        let from_prediction = TokenSequence::new(toks(2), 5, TokenOrigin::Prediction);

        assert!(from_tokenize.accepts(5, TokenOrigin::Prediction, &doc));
        assert!(from_tokenize.accepts(5, TokenOrigin::Tokenize, &doc));
        assert!(!from_prediction.accepts(5, TokenOrigin::Tokenize, &doc));
        assert!(from_prediction.accepts(5, TokenOrigin::Prediction, &doc));
    }

    #[test]
    fn test_current_for() {
        let seq = TokenSequence::empty(2);
        assert!(seq.is_current_for(&Document::empty(2)));
        assert!(!seq.is_current_for(&Document::empty(3)));
    }
}
