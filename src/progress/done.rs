//! One-shot "finished" signal shared between a listener task and its waiters.

use tokio::sync::watch;

/// Write half, owned by the task whose completion is being announced.
#[derive(Debug)]
pub struct DoneLatch {
    tx: watch::Sender<bool>,
}

/// Read half; cheap to clone and hand to any number of waiters.
#[derive(Debug, Clone)]
pub struct DoneSignal {
    rx: watch::Receiver<bool>,
}

impl DoneLatch {
    pub fn new() -> (Self, DoneSignal) {
        let (tx, rx) = watch::channel(false);
        (Self { tx }, DoneSignal { rx })
    }

    /// Fires the signal. Later calls are no-ops.
    pub fn fire(&self) {
        self.tx.send_if_modified(|done| {
            let changed = !*done;
            *done = true;
            changed
        });
    }
}

impl DoneSignal {
    /// A signal that has already fired, for renderers with no lifecycle.
    pub fn fired() -> Self {
        let (latch, signal) = DoneLatch::new();
        latch.fire();
        signal
    }

    pub fn is_done(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once the latch fires. A latch dropped without firing
    /// (its task panicked) also counts as done so waiters never hang.
    pub async fn wait(&mut self) {
        let _ = self.rx.wait_for(|done| *done).await;
    }
}

/// Waits for every signal in `signals`.
pub async fn wait_all(signals: Vec<DoneSignal>) {
    futures::future::join_all(signals.into_iter().map(|mut s| async move { s.wait().await }))
        .await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_fire_wakes_waiter() {
        let (latch, mut signal) = DoneLatch::new();
        assert!(!signal.is_done());
        let waiter = tokio::spawn(async move { signal.wait().await });
        latch.fire();
        latch.fire();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_dropped_latch_counts_as_done() {
        let (latch, mut signal) = DoneLatch::new();
        drop(latch);
        tokio::time::timeout(Duration::from_secs(1), signal.wait())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_fired_is_done() {
        let mut signal = DoneSignal::fired();
        assert!(signal.is_done());
        signal.wait().await;
    }

    #[tokio::test]
    async fn test_wait_all_waits_for_slowest() {
        let (a, sa) = DoneLatch::new();
        let (b, sb) = DoneLatch::new();
        let all = tokio::spawn(wait_all(vec![sa, sb]));
        a.fire();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!all.is_finished());
        b.fire();
        tokio::time::timeout(Duration::from_secs(1), all)
            .await
            .unwrap()
            .unwrap();
    }
}
