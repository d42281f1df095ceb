//! The session coordinator: single owner of the document, token sequence,
//! selection, distribution and model state.
//!
//! Every public method is a synchronous transition that may spawn at most
//! one task. Tasks never touch state; they report back through
//! [`SessionEvent`]s, which [`Session::handle_event`] checks against the
//! current state before applying.

use crate::api::{Distribution, LoadModelRequest, ModelBackend, TokenInfo};
use crate::document::{Document, TokenOrigin, TokenSequence};
use crate::error::{Result, TokenscopeError};
use crate::event::{ModelInfo, Notice, NoticeKind, SessionEvent, SessionUpdate};
use crate::predict::PredictionFetcher;
use crate::rank::{rank_with, RankOptions, RankedDistribution};
use crate::selection::{Selection, Toggle};
use crate::tokenize::{FireOutcome, TokenizeScheduler, DEFAULT_DEBOUNCE};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub debounce: Duration,
    pub rank: RankOptions,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            rank: RankOptions::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelState {
    NotLoaded,
    Loading { model_path: String },
    Loaded(ModelInfo),
}

/// A distribution for exactly one (document, selected index) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct DistributionView {
    pub seq: u64,
    pub index: usize,
    pub raw: Distribution,
    pub ranked: RankedDistribution,
}

/// Why a token click did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickIgnored {
    ModelNotLoaded,
    TokensStale,
    OutOfRange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    Selected(usize),
    Deselected(usize),
    Ignored(ClickIgnored),
}

pub struct Session {
    backend: Arc<dyn ModelBackend>,
    config: SessionConfig,
    events_tx: UnboundedSender<SessionEvent>,
    events_rx: UnboundedReceiver<SessionEvent>,

    model: ModelState,
    load_epoch: u64,
    load_task: Option<JoinHandle<()>>,

    next_seq: u64,
    document: Document,
    tokens: TokenSequence,
    selection: Selection,
    distribution: Option<DistributionView>,
    notice: Option<Notice>,

    scheduler: TokenizeScheduler,
    fetcher: PredictionFetcher,
}

impl Session {
    pub fn new(backend: Arc<dyn ModelBackend>, config: SessionConfig) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            backend,
            config,
            scheduler: TokenizeScheduler::new(config.debounce, events_tx.clone()),
            fetcher: PredictionFetcher::new(events_tx.clone()),
            events_tx,
            events_rx,
            model: ModelState::NotLoaded,
            load_epoch: 0,
            load_task: None,
            next_seq: 1,
            document: Document::empty(0),
            tokens: TokenSequence::empty(0),
            selection: Selection::new(),
            distribution: None,
            notice: None,
        }
    }

    // ── Accessors ───────────────────────────────────────────────────────

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn text(&self) -> &str {
        self.document.text()
    }

    pub fn tokens(&self) -> &[TokenInfo] {
        self.tokens.tokens()
    }

    pub fn token_sequence(&self) -> &TokenSequence {
        &self.tokens
    }

    /// False while the shown tokens belong to an older edit.
    pub fn tokens_current(&self) -> bool {
        self.tokens.is_current_for(&self.document)
    }

    pub fn selection(&self) -> Option<usize> {
        self.selection.current()
    }

    pub fn selection_label(&self) -> Option<String> {
        self.selection.label(self.tokens.len())
    }

    pub fn distribution(&self) -> Option<&DistributionView> {
        self.distribution.as_ref()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    pub fn model_state(&self) -> &ModelState {
        &self.model
    }

    pub fn model(&self) -> Option<&ModelInfo> {
        match &self.model {
            ModelState::Loaded(info) => Some(info),
            _ => None,
        }
    }

    pub fn is_model_loaded(&self) -> bool {
        matches!(self.model, ModelState::Loaded(_))
    }

    pub fn is_loading_model(&self) -> bool {
        matches!(self.model, ModelState::Loading { .. })
    }

    pub fn is_tokenizing(&self) -> bool {
        self.scheduler.is_busy()
    }

    pub fn is_predicting(&self) -> bool {
        self.fetcher.is_busy()
    }

    // ── User-driven transitions ─────────────────────────────────────────

    /// Replace the document text. Selection and distribution are cleared
    /// before anything else can run, then the tokenize timer is re-armed.
    pub fn set_text(&mut self, text: impl Into<String>) {
        let text: String = text.into();
        if text == self.document.text() {
            return;
        }
        let seq = self.bump_seq();
        self.document = Document::new(text, seq);
        self.clear_selection();
        self.scheduler.on_text_changed();
    }

    /// Toggle the selection at `index` and fetch its distribution when it
    /// becomes selected.
    pub fn click_token(&mut self, index: usize) -> ClickOutcome {
        if !self.is_model_loaded() {
            return ClickOutcome::Ignored(ClickIgnored::ModelNotLoaded);
        }
        if !self.tokens_current() {
            return ClickOutcome::Ignored(ClickIgnored::TokensStale);
        }
        if index >= self.tokens.len() {
            return ClickOutcome::Ignored(ClickIgnored::OutOfRange);
        }

        self.distribution = None;
        match self.selection.toggle(index) {
            Toggle::Deselected(i) => {
                self.fetcher.cancel();
                ClickOutcome::Deselected(i)
            }
            Toggle::Selected(i) => {
                self.fetcher.fetch(&self.backend, &self.document, i);
                ClickOutcome::Selected(i)
            }
        }
    }

    /// Ask the server to load a model. Completion arrives as an event.
    pub fn load_model(
        &mut self,
        model_path: &str,
        custom_weights_path: Option<&str>,
    ) -> Result<()> {
        let model_path = model_path.trim();
        if model_path.is_empty() {
            let err = TokenscopeError::validation("Model path must not be empty");
            self.notice = Some(Notice::from_error(NoticeKind::LoadModel, &err));
            return Err(err);
        }

        if let Some(task) = self.load_task.take() {
            task.abort();
        }
        self.forget_model_output();
        self.load_epoch += 1;
        let epoch = self.load_epoch;
        let request = LoadModelRequest {
            model_path: model_path.to_string(),
            custom_weights_path: custom_weights_path
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string),
        };
        info!("Loading model '{}'", request.model_path);
        self.model = ModelState::Loading {
            model_path: request.model_path.clone(),
        };
        self.notice = None;

        let backend = self.backend.clone();
        let events = self.events_tx.clone();
        self.load_task = Some(tokio::spawn(async move {
            let result = backend.load_model(&request).await;
            let _ = events.send(SessionEvent::ModelLoaded { epoch, result });
        }));
        Ok(())
    }

    /// Adopt a model the server already has loaded (e.g. its startup default).
    pub fn mark_model_loaded(&mut self, info: ModelInfo) {
        if let Some(task) = self.load_task.take() {
            task.abort();
        }
        self.forget_model_output();
        self.load_epoch += 1;
        self.model = ModelState::Loaded(info);
        self.scheduler.on_text_changed();
    }

    /// Back to the initial, pre-load state. Anything in flight is dropped.
    pub fn reset(&mut self) {
        info!("Resetting session");
        if let Some(task) = self.load_task.take() {
            task.abort();
        }
        self.load_epoch += 1;
        self.model = ModelState::NotLoaded;
        self.scheduler.cancel();
        self.fetcher.cancel();
        let seq = self.bump_seq();
        self.document = Document::empty(seq);
        self.tokens = TokenSequence::empty(seq);
        self.selection.clear();
        self.distribution = None;
        self.notice = None;
    }

    // ── Event loop ──────────────────────────────────────────────────────

    /// Wait for the next event that changes visible state and apply it.
    pub async fn next_update(&mut self) -> Option<SessionUpdate> {
        loop {
            let event = self.events_rx.recv().await?;
            if let Some(update) = self.handle_event(event) {
                return Some(update);
            }
        }
    }

    /// Apply one event. Returns `None` when it was stale and dropped.
    pub fn handle_event(&mut self, event: SessionEvent) -> Option<SessionUpdate> {
        match event {
            SessionEvent::TokenizeTimerFired { generation } => self.on_tokenize_timer(generation),
            SessionEvent::Tokenized { tag, result } => {
                if !self.scheduler.complete(tag) {
                    debug!("Dropping superseded tokenization #{}", tag.seq);
                    return None;
                }
                match result {
                    Ok(tokens) => {
                        if self.commit_tokens(tokens, tag.seq, TokenOrigin::Tokenize) {
                            self.clear_notice(NoticeKind::Tokenize);
                            Some(SessionUpdate::TokensReplaced {
                                count: self.tokens.len(),
                            })
                        } else {
                            None
                        }
                    }
                    Err(e) => {
                        warn!("Tokenization failed: {}", e);
                        Some(self.fail(NoticeKind::Tokenize, &e))
                    }
                }
            }
            SessionEvent::Predicted { tag, result } => {
                if !self
                    .fetcher
                    .reconcile(tag, &self.document, self.selection.current())
                {
                    debug!("Dropping stale prediction #{} index {:?}", tag.seq, tag.index);
                    return None;
                }
                let index = tag.index?;
                match result {
                    Ok(response) => {
                        if let Some(tokens) = response.tokens {
                            self.commit_tokens(tokens, tag.seq, TokenOrigin::Prediction);
                            if self.selection.current() != Some(index) {
                                return Some(SessionUpdate::TokensReplaced {
                                    count: self.tokens.len(),
                                });
                            }
                        }
                        let raw = response.conditional_predictions.unwrap_or_default();
                        let ranked = rank_with(&raw, self.config.rank);
                        self.distribution = Some(DistributionView {
                            seq: tag.seq,
                            index,
                            raw,
                            ranked,
                        });
                        self.clear_notice(NoticeKind::Predict);
                        Some(SessionUpdate::DistributionReady { index })
                    }
                    Err(e) => {
                        warn!("Prediction failed: {}", e);
                        self.distribution = None;
                        Some(self.fail(NoticeKind::Predict, &e))
                    }
                }
            }
            SessionEvent::ModelLoaded { epoch, result } => {
                if epoch != self.load_epoch || !self.is_loading_model() {
                    debug!("Dropping stale model load (epoch {})", epoch);
                    return None;
                }
                self.load_task = None;
                let response = result.and_then(|r| {
                    if r.is_success() {
                        Ok(r)
                    } else {
                        Err(TokenscopeError::server(
                            200,
                            Some(format!("Failed to load model (status: {})", r.status)),
                        ))
                    }
                });
                match response {
                    Ok(r) => {
                        let requested = match &self.model {
                            ModelState::Loading { model_path } => model_path.clone(),
                            _ => String::new(),
                        };
                        let info = ModelInfo {
                            model_path: r.model_path.unwrap_or(requested),
                            device: r.device,
                            vocab_size: r.vocab_size,
                        };
                        info!("Model '{}' ready", info.model_path);
                        self.model = ModelState::Loaded(info.clone());
                        self.clear_notice(NoticeKind::LoadModel);
                        self.scheduler.on_text_changed();
                        Some(SessionUpdate::ModelLoaded(info))
                    }
                    Err(e) => {
                        warn!("Model load failed: {}", e);
                        self.model = ModelState::NotLoaded;
                        Some(self.fail(NoticeKind::LoadModel, &e))
                    }
                }
            }
        }
    }

    // ── Internals ───────────────────────────────────────────────────────

    fn on_tokenize_timer(&mut self, generation: u64) -> Option<SessionUpdate> {
        let model_loaded = self.is_model_loaded();
        match self
            .scheduler
            .fire(generation, &self.document, model_loaded, &self.backend)
        {
            FireOutcome::Stale => None,
            FireOutcome::Issued(_) => Some(SessionUpdate::TokenizeStarted),
            FireOutcome::Clear => {
                self.tokens = TokenSequence::empty(self.document.seq());
                self.clear_selection();
                Some(SessionUpdate::TokensCleared)
            }
        }
    }

    /// Replace the token sequence if the precedence rule allows it, keeping
    /// the selection valid. Returns whether it was replaced.
    fn commit_tokens(&mut self, tokens: Vec<TokenInfo>, seq: u64, origin: TokenOrigin) -> bool {
        if !self.tokens.accepts(seq, origin, &self.document) {
            debug!("Keeping token sequence #{}; candidate #{} {:?} rejected", self.tokens.seq(), seq, origin);
            return false;
        }
        self.tokens = TokenSequence::new(tokens, seq, origin);
        if self.selection.retain_within(self.tokens.len()) {
            self.distribution = None;
            self.fetcher.cancel();
        }
        true
    }

    /// Tokens, selection and distribution all came from the previous model.
    /// The text stays but moves to a fresh seq, so nothing issued against the
    /// old model can be committed after a switch.
    fn forget_model_output(&mut self) {
        if self.model == ModelState::NotLoaded {
            return;
        }
        self.scheduler.cancel();
        self.clear_selection();
        let seq = self.bump_seq();
        self.document = Document::new(self.document.shared_text(), seq);
        self.tokens = TokenSequence::empty(seq);
    }

    fn clear_selection(&mut self) {
        self.selection.clear();
        self.distribution = None;
        self.fetcher.cancel();
    }

    fn fail(&mut self, kind: NoticeKind, err: &TokenscopeError) -> SessionUpdate {
        let notice = Notice::from_error(kind, err);
        self.notice = Some(notice.clone());
        SessionUpdate::Failed(notice)
    }

    fn clear_notice(&mut self, kind: NoticeKind) {
        if self.notice.as_ref().is_some_and(|n| n.kind == kind) {
            self.notice = None;
        }
    }

    fn bump_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(task) = self.load_task.take() {
            task.abort();
        }
    }
}
