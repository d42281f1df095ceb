use std::time::Duration;
use tokio::task::JoinHandle;

/// Trailing-edge debounce timer: each `schedule` cancels the previous timer.
///
/// Firing runs a callback with the generation it was armed under. The owner
/// confirms it with [`Debouncer::take_fire`], which rejects any fire that was
/// already queued when the timer got re-armed or cancelled.
pub struct Debouncer {
    delay: Duration,
    generation: u64,
    pending: Option<JoinHandle<()>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            generation: 0,
            pending: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Arm (or re-arm) the timer. Returns the generation `fire` will receive.
    pub fn schedule<F>(&mut self, fire: F) -> u64
    where
        F: FnOnce(u64) + Send + 'static,
    {
        self.cancel();
        self.generation += 1;
        let generation = self.generation;
        let delay = self.delay;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            fire(generation);
        }));
        generation
    }

    /// Cancel the pending timer, if any. Returns true if one was pending.
    pub fn cancel(&mut self) -> bool {
        match self.pending.take() {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    /// Accept a fire notification. Only the latest armed, not-yet-cancelled
    /// generation is accepted, and only once.
    pub fn take_fire(&mut self, generation: u64) -> bool {
        if generation == self.generation && self.pending.is_some() {
            self.pending = None;
            true
        } else {
            false
        }
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn test_only_last_schedule_fires() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut debouncer = Debouncer::new(Duration::from_millis(300));

        for _ in 0..3 {
            let tx = tx.clone();
            debouncer.schedule(move |g| {
                let _ = tx.send(g);
            });
            tokio::time::advance(Duration::from_millis(100)).await;
        }

        let fired = rx.recv().await.unwrap();
        assert_eq!(fired, 3);
        assert!(debouncer.take_fire(fired));
        assert!(!debouncer.is_pending());

        tokio::time::advance(Duration::from_secs(5)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn test_cancel_prevents_fire() {
        let (tx, mut rx) = mpsc::unbounded_channel::<u64>();
        let mut debouncer = Debouncer::new(Duration::from_millis(300));

        debouncer.schedule(move |g| {
            let _ = tx.send(g);
        });
        assert!(debouncer.cancel());
        assert!(!debouncer.cancel());

        tokio::time::advance(Duration::from_secs(1)).await;
        tokio::task::yield_now().await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn test_queued_fire_rejected_after_rearm() {
        let mut debouncer = Debouncer::new(Duration::from_millis(300));
        let first = debouncer.schedule(|_| {});
        let second = debouncer.schedule(|_| {});

        assert!(!debouncer.take_fire(first));
        assert!(debouncer.take_fire(second));
        assert!(!debouncer.take_fire(second));
    }
}
