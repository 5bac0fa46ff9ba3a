//! Transaction lifecycle events.
//!
//! Multi-transaction operations announce themselves before sending anything
//! (kickoff, with the precomputed expected transaction count), report each
//! sub-transaction as it is mined, and signal completion. The feed is
//! progress telemetry only; no control flow may depend on it, and dropped
//! receivers are ignored.

use lib_types::Hash;
use tokio::sync::broadcast;
use tracing::info;
use uuid::Uuid;

const LIFECYCLE_BUFFER: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxLifecycleEvent {
    /// An operation has started and expects `tx_count` transactions
    Kickoff {
        invocation_id: Uuid,
        function: String,
        tx_count: usize,
    },
    /// One sub-transaction of the operation was mined
    TxMined {
        invocation_id: Uuid,
        function: String,
        tx_hash: Hash,
    },
    /// The operation finished
    Completed {
        invocation_id: Uuid,
        function: String,
    },
}

/// Publisher handle for transaction lifecycle events
#[derive(Debug, Clone)]
pub struct TxLifecycle {
    sender: broadcast::Sender<TxLifecycleEvent>,
}

impl TxLifecycle {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(LIFECYCLE_BUFFER);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TxLifecycleEvent> {
        self.sender.subscribe()
    }

    /// Announce an operation and its expected transaction count.
    ///
    /// Returns the context used to report the rest of the sequence.
    pub fn publish_kickoff(&self, function: &str, tx_count: usize) -> TxEventContext {
        let invocation_id = Uuid::new_v4();
        info!(%invocation_id, function, tx_count, "transaction sequence started");
        let _ = self.sender.send(TxLifecycleEvent::Kickoff {
            invocation_id,
            function: function.to_string(),
            tx_count,
        });
        TxEventContext {
            sender: self.sender.clone(),
            invocation_id,
            function: function.to_string(),
        }
    }
}

impl Default for TxLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-invocation reporting context returned by `publish_kickoff`
#[derive(Debug, Clone)]
pub struct TxEventContext {
    sender: broadcast::Sender<TxLifecycleEvent>,
    invocation_id: Uuid,
    function: String,
}

impl TxEventContext {
    pub fn invocation_id(&self) -> Uuid {
        self.invocation_id
    }

    pub fn publish_mined(&self, tx_hash: Hash) {
        info!(invocation_id = %self.invocation_id, function = %self.function, %tx_hash, "transaction mined");
        let _ = self.sender.send(TxLifecycleEvent::TxMined {
            invocation_id: self.invocation_id,
            function: self.function.clone(),
            tx_hash,
        });
    }

    pub fn publish_completed(&self) {
        info!(invocation_id = %self.invocation_id, function = %self.function, "transaction sequence completed");
        let _ = self.sender.send(TxLifecycleEvent::Completed {
            invocation_id: self.invocation_id,
            function: self.function.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_lifecycle_sequence() {
        let lifecycle = TxLifecycle::new();
        let mut feed = lifecycle.subscribe();

        let ctx = lifecycle.publish_kickoff("setSchemes", 3);
        ctx.publish_mined(Hash::new([1u8; 32]));
        ctx.publish_completed();

        match feed.recv().await.unwrap() {
            TxLifecycleEvent::Kickoff {
                invocation_id,
                function,
                tx_count,
            } => {
                assert_eq!(invocation_id, ctx.invocation_id());
                assert_eq!(function, "setSchemes");
                assert_eq!(tx_count, 3);
            }
            other => panic!("expected kickoff, got {other:?}"),
        }
        assert!(matches!(
            feed.recv().await.unwrap(),
            TxLifecycleEvent::TxMined { .. }
        ));
        assert!(matches!(
            feed.recv().await.unwrap(),
            TxLifecycleEvent::Completed { .. }
        ));
    }

    #[test]
    fn test_publish_without_receivers_is_fine() {
        let lifecycle = TxLifecycle::new();
        let ctx = lifecycle.publish_kickoff("forgeOrg", 1);
        ctx.publish_mined(Hash::new([2u8; 32]));
        ctx.publish_completed();
    }
}
