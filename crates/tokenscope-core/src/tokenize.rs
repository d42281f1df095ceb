use crate::api::ModelBackend;
use crate::debounce::Debouncer;
use crate::document::Document;
use crate::event::SessionEvent;
use crate::request::{RequestSlot, RequestTag};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// What happened when the debounce timer fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FireOutcome {
    /// A fire from a timer that was re-armed or cancelled since.
    Stale,
    /// Nothing to tokenize; the caller clears the token sequence.
    Clear,
    Issued(RequestTag),
}

/// Coalesces edits and issues at most one tokenize call per quiet period.
pub struct TokenizeScheduler {
    debouncer: Debouncer,
    requests: RequestSlot,
    events: UnboundedSender<SessionEvent>,
}

impl TokenizeScheduler {
    pub fn new(delay: Duration, events: UnboundedSender<SessionEvent>) -> Self {
        Self {
            debouncer: Debouncer::new(delay),
            requests: RequestSlot::new(),
            events,
        }
    }

    /// (Re)arm the quiet-period timer. Any in-flight tokenization is for
    /// older text and is dropped.
    pub fn on_text_changed(&mut self) {
        self.requests.cancel();
        let events = self.events.clone();
        self.debouncer.schedule(move |generation| {
            let _ = events.send(SessionEvent::TokenizeTimerFired { generation });
        });
    }

    /// Handle a timer fire against the document as it is *now*.
    pub fn fire(
        &mut self,
        generation: u64,
        document: &Document,
        model_loaded: bool,
        backend: &Arc<dyn ModelBackend>,
    ) -> FireOutcome {
        if !self.debouncer.take_fire(generation) {
            return FireOutcome::Stale;
        }
        if !model_loaded || document.is_blank() {
            self.requests.cancel();
            return FireOutcome::Clear;
        }

        let tag = self.requests.issue(document.seq(), None);
        debug!("Tokenizing document #{} ({} bytes)", tag.seq, document.text().len());

        let backend = backend.clone();
        let text = document.shared_text();
        let events = self.events.clone();
        let task = tokio::spawn(async move {
            let result = backend.tokenize(&text).await;
            let _ = events.send(SessionEvent::Tokenized { tag, result });
        });
        self.requests.attach(tag, task);
        FireOutcome::Issued(tag)
    }

    /// True if `tag` is the live tokenization. Consumes it.
    pub fn complete(&mut self, tag: RequestTag) -> bool {
        self.requests.complete(tag)
    }

    pub fn cancel(&mut self) {
        self.debouncer.cancel();
        self.requests.cancel();
    }

    pub fn is_busy(&self) -> bool {
        self.debouncer.is_pending() || self.requests.is_busy()
    }
}
