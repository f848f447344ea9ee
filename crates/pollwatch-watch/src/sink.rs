//! Event delivery to the consumer channel.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use pollwatch_core::{Event, OverflowPolicy};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Why an event could not be handed to the consumer.
#[derive(Debug, Error)]
pub(crate) enum DeliveryError {
    /// The receiver was dropped.
    #[error("Event channel closed")]
    Closed,

    /// Shutdown fired while waiting for the consumer.
    #[error("Delivery cancelled by shutdown")]
    Cancelled,
}

/// Sending half of the event channel plus its overflow policy.
#[derive(Debug, Clone)]
pub(crate) struct EventSink {
    tx: mpsc::Sender<Event>,
    policy: OverflowPolicy,
    dropped: Arc<AtomicU64>,
}

impl EventSink {
    pub fn new(tx: mpsc::Sender<Event>, policy: OverflowPolicy, dropped: Arc<AtomicU64>) -> Self {
        Self {
            tx,
            policy,
            dropped,
        }
    }

    /// Hand one event to the consumer.
    ///
    /// With [`OverflowPolicy::Block`] this waits for queue space and gives
    /// up only when `shutdown` fires. With [`OverflowPolicy::Drop`] a full
    /// queue discards the event.
    pub async fn deliver(
        &self,
        event: Event,
        shutdown: &CancellationToken,
    ) -> Result<(), DeliveryError> {
        match self.policy {
            OverflowPolicy::Block => tokio::select! {
                biased;
                _ = shutdown.cancelled() => Err(DeliveryError::Cancelled),
                sent = self.tx.send(event) => sent.map_err(|_| DeliveryError::Closed),
            },
            OverflowPolicy::Drop => match self.tx.try_send(event) {
                Ok(()) => Ok(()),
                Err(TrySendError::Full(event)) => {
                    let total = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                    warn!(
                        path = %event.path.display(),
                        operation = %event.operation,
                        dropped = total,
                        "event queue full, dropping event"
                    );
                    Ok(())
                }
                Err(TrySendError::Closed(_)) => Err(DeliveryError::Closed),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_drop_policy_counts_overflow() {
        let (tx, mut rx) = mpsc::channel(1);
        let dropped = Arc::new(AtomicU64::new(0));
        let sink = EventSink::new(tx, OverflowPolicy::Drop, dropped.clone());
        let shutdown = CancellationToken::new();

        sink.deliver(Event::created("/r/a"), &shutdown).await.unwrap();
        sink.deliver(Event::created("/r/b"), &shutdown).await.unwrap();

        assert_eq!(dropped.load(Ordering::Relaxed), 1);
        assert_eq!(rx.recv().await, Some(Event::created("/r/a")));
    }

    #[tokio::test]
    async fn test_block_policy_gives_up_on_shutdown() {
        let (tx, _rx) = mpsc::channel(1);
        let sink = EventSink::new(tx, OverflowPolicy::Block, Arc::default());
        let shutdown = CancellationToken::new();

        sink.deliver(Event::created("/r/a"), &shutdown).await.unwrap();

        shutdown.cancel();
        let err = sink
            .deliver(Event::created("/r/b"), &shutdown)
            .await
            .unwrap_err();
        assert!(matches!(err, DeliveryError::Cancelled));
    }

    #[tokio::test]
    async fn test_closed_channel() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let shutdown = CancellationToken::new();

        for policy in [OverflowPolicy::Block, OverflowPolicy::Drop] {
            let sink = EventSink::new(tx.clone(), policy, Arc::default());
            let err = sink
                .deliver(Event::deleted("/r/a"), &shutdown)
                .await
                .unwrap_err();
            assert!(matches!(err, DeliveryError::Closed));
        }
    }
}
