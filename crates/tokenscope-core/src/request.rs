use tokio::task::JoinHandle;

/// Identifies an issued network call and the state it was issued against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTag {
    pub id: u64,
    /// Edit sequence number of the document the request was built from.
    pub seq: u64,
    /// Selected token index, for requests tied to a selection.
    pub index: Option<usize>,
}

struct Live {
    tag: RequestTag,
    task: Option<JoinHandle<()>>,
}

/// Holds at most one live request. Issuing a new one supersedes the old:
/// its task is aborted and its completion, should it still arrive, no longer
/// matches.
#[derive(Default)]
pub struct RequestSlot {
    next_id: u64,
    live: Option<Live>,
}

impl RequestSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&mut self, seq: u64, index: Option<usize>) -> RequestTag {
        self.cancel();
        self.next_id += 1;
        let tag = RequestTag {
            id: self.next_id,
            seq,
            index,
        };
        self.live = Some(Live { tag, task: None });
        tag
    }

    /// Attach the task running `tag` so superseding can abort it.
    pub fn attach(&mut self, tag: RequestTag, task: JoinHandle<()>) {
        match self.live.as_mut() {
            Some(live) if live.tag == tag => live.task = Some(task),
            _ => task.abort(),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.live.is_some()
    }

    /// Mark `tag` complete. False if it was superseded or cancelled.
    pub fn complete(&mut self, tag: RequestTag) -> bool {
        match &self.live {
            Some(live) if live.tag == tag => {
                self.live = None;
                true
            }
            _ => false,
        }
    }

    pub fn cancel(&mut self) -> bool {
        match self.live.take() {
            Some(live) => {
                if let Some(task) = live.task {
                    task.abort();
                }
                true
            }
            None => false,
        }
    }
}
