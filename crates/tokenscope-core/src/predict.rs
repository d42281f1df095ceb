use crate::api::ModelBackend;
use crate::document::Document;
use crate::event::SessionEvent;
use crate::request::{RequestSlot, RequestTag};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

/// Issues conditional-prediction calls, one live at a time, and decides
/// whether a completion still matches the session.
pub struct PredictionFetcher {
    requests: RequestSlot,
    events: UnboundedSender<SessionEvent>,
}

impl PredictionFetcher {
    pub fn new(events: UnboundedSender<SessionEvent>) -> Self {
        Self {
            requests: RequestSlot::new(),
            events,
        }
    }

    /// Supersede any live fetch and request the distribution at `index`.
    pub fn fetch(
        &mut self,
        backend: &Arc<dyn ModelBackend>,
        document: &Document,
        index: usize,
    ) -> RequestTag {
        let tag = self.requests.issue(document.seq(), Some(index));
        debug!("Fetching conditional distribution for #{} token {}", tag.seq, index);

        let backend = backend.clone();
        let text = document.shared_text();
        let events = self.events.clone();
        let task = tokio::spawn(async move {
            let result = backend.predict_conditional(&text, index).await;
            let _ = events.send(SessionEvent::Predicted { tag, result });
        });
        self.requests.attach(tag, task);
        tag
    }

    /// Accept a completion only if it is the live fetch and was issued for
    /// the current document and the current selection.
    pub fn reconcile(
        &mut self,
        tag: RequestTag,
        document: &Document,
        selection: Option<usize>,
    ) -> bool {
        if !self.requests.complete(tag) {
            return false;
        }
        tag.seq == document.seq() && tag.index.is_some() && tag.index == selection
    }

    pub fn cancel(&mut self) {
        self.requests.cancel();
    }

    pub fn is_busy(&self) -> bool {
        self.requests.is_busy()
    }
}
