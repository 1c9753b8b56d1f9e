//! Subscription sources for stack events and rolling-update snapshots.

use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use super::rollout::ServiceSnapshot;
use super::tasks::TaskGroup;

/// Fans one producer out to any number of subscribers.
///
/// Channels are unbounded so a slow renderer never stalls the producer.
/// Subscribers should register before publishing starts; late subscribers
/// only see what is published after they join.
pub struct EventFanout<T> {
    subscribers: Mutex<Option<Vec<mpsc::UnboundedSender<T>>>>,
}

impl<T: Clone> EventFanout<T> {
    pub fn new() -> Self {
        Self {
            subscribers: Mutex::new(Some(Vec::new())),
        }
    }

    /// Returns a receiver that yields every event published from now on and
    /// closes when the fanout closes. Subscribing after close yields a closed receiver.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<T> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut guard = self.subscribers.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(subscribers) = guard.as_mut() {
            subscribers.push(tx);
        }
        rx
    }

    pub fn publish(&self, event: T) {
        let mut guard = self.subscribers.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(subscribers) = guard.as_mut() {
            subscribers.retain(|tx| tx.send(event.clone()).is_ok());
        }
    }

    /// Closes every subscriber channel. Only the first call has any effect.
    pub fn close(&self) -> bool {
        let mut guard = self.subscribers.lock().unwrap_or_else(PoisonError::into_inner);
        guard.take().is_some()
    }

    pub fn is_closed(&self) -> bool {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }
}

impl<T: Clone> Default for EventFanout<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Opens the narrower rolling-update stream for a service once its physical
/// identifier is known.
pub trait RolloutStreams: Send + Sync {
    /// Returns snapshots for `physical_id` taken at or after `since`.
    /// Any forwarding task must be spawned on `tasks` so its failure is
    /// supervised alongside the caller's.
    fn subscribe(
        &self,
        physical_id: &str,
        since: DateTime<Utc>,
        tasks: &TaskGroup,
    ) -> mpsc::UnboundedReceiver<ServiceSnapshot>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_reaches_every_subscriber() {
        let fanout = EventFanout::new();
        let mut a = fanout.subscribe();
        let mut b = fanout.subscribe();

        fanout.publish(1u32);
        fanout.publish(2u32);
        fanout.close();

        assert_eq!(a.recv().await, Some(1));
        assert_eq!(a.recv().await, Some(2));
        assert_eq!(a.recv().await, None);
        assert_eq!(b.recv().await, Some(1));
        assert_eq!(b.recv().await, Some(2));
        assert_eq!(b.recv().await, None);
    }

    #[tokio::test]
    async fn test_close_only_once() {
        let fanout: EventFanout<u32> = EventFanout::new();
        assert!(fanout.close());
        assert!(!fanout.close());
        assert!(fanout.is_closed());

        fanout.publish(7);
        let mut late = fanout.subscribe();
        assert_eq!(late.recv().await, None);
    }

    #[tokio::test]
    async fn test_dropped_subscriber_is_pruned() {
        let fanout = EventFanout::new();
        let dropped = fanout.subscribe();
        let mut kept = fanout.subscribe();
        drop(dropped);

        fanout.publish("x".to_string());
        assert_eq!(kept.recv().await.as_deref(), Some("x"));
        let remaining = fanout.subscribers.lock().unwrap().as_ref().map(Vec::len);
        assert_eq!(remaining, Some(1));
    }
}
