//! Typed chain events and per-subscriber delivery queues.
//!
//! The writer publishes with `try_send` only: a full queue drops the
//! event and flags the subscriber, whose next successful delivery is
//! preceded by an injected [`ChainEvent::ChainReset`] forcing it to
//! resynchronize from the tip. A subscriber therefore sees a strictly
//! height-ordered stream or an explicit reset, never a silent gap.

use nomen_consensus::ChainEntry;
use nomen_primitives::Transaction;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, trace};

/// Default per-subscriber queue capacity.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Events delivered to chain subscribers.
#[derive(Debug, Clone)]
pub enum ChainEvent {
    /// A block was appended to the best chain.
    BlockConnect {
        entry: ChainEntry,
        txs: Vec<Transaction>,
    },
    /// A block was rolled back during a reorganization.
    BlockDisconnect { entry: ChainEntry },
    /// A transaction was accepted outside a block.
    Tx { tx: Transaction },
    /// The active tip changed out from under the subscriber.
    ChainReset { tip: ChainEntry },
    /// A historical block delivered during a rescan.
    BlockRescan {
        entry: ChainEntry,
        txs: Vec<Transaction>,
    },
}

/// A subscriber's end of the event queue.
pub struct EventStream {
    /// Subscriber identifier (used to target rescans).
    pub id: u64,
    /// Receiving side of the bounded queue.
    pub receiver: mpsc::Receiver<ChainEvent>,
}

struct SubscriberHandle {
    id: u64,
    sender: mpsc::Sender<ChainEvent>,
    /// Set when an event was dropped; cleared by a delivered reset.
    lagged: bool,
}

/// Fan-out of chain events over bounded per-subscriber queues.
#[derive(Default)]
pub struct Publisher {
    subscribers: Mutex<Vec<SubscriberHandle>>,
    next_id: Mutex<u64>,
}

impl Publisher {
    /// Create an empty publisher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber with the given queue capacity.
    pub fn subscribe(&self, capacity: usize) -> EventStream {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let mut next = self.next_id.lock();
        *next += 1;
        let id = *next;
        self.subscribers.lock().push(SubscriberHandle {
            id,
            sender,
            lagged: false,
        });
        debug!(id, capacity, "Chain subscriber attached");
        EventStream { id, receiver }
    }

    /// Remove a subscriber.
    pub fn unsubscribe(&self, id: u64) {
        self.subscribers.lock().retain(|s| s.id != id);
    }

    /// Number of live subscribers.
    pub fn len(&self) -> usize {
        self.subscribers.lock().len()
    }

    /// Whether no subscriber is attached.
    pub fn is_empty(&self) -> bool {
        self.subscribers.lock().is_empty()
    }

    /// Broadcast an event. `tip` is the entry carried by a reset
    /// injected for subscribers that previously lagged.
    pub fn publish(&self, event: &ChainEvent, tip: &ChainEntry) {
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|s| !s.sender.is_closed());
        for sub in subscribers.iter_mut() {
            Self::deliver(sub, event, tip);
        }
    }

    /// Deliver an event to one subscriber only (rescan streams).
    pub fn publish_to(&self, id: u64, event: &ChainEvent, tip: &ChainEntry) {
        let mut subscribers = self.subscribers.lock();
        if let Some(sub) = subscribers.iter_mut().find(|s| s.id == id) {
            Self::deliver(sub, event, tip);
        }
    }

    fn deliver(sub: &mut SubscriberHandle, event: &ChainEvent, tip: &ChainEntry) {
        if sub.lagged {
            // Force resynchronization before anything else.
            let reset = ChainEvent::ChainReset { tip: tip.clone() };
            match sub.sender.try_send(reset) {
                Ok(()) => sub.lagged = false,
                Err(_) => return,
            }
        }
        match sub.sender.try_send(event.clone()) {
            Ok(()) => {}
            Err(_) => {
                trace!(id = sub.id, "Subscriber queue full, dropping event");
                sub.lagged = true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nomen_primitives::{Block, BlockHeader, Hash, Solution, NONCE_SIZE};

    fn entry(height: u32) -> ChainEntry {
        let block = Block {
            header: BlockHeader {
                version: 0,
                prev_block: Hash::ZERO,
                merkle_root: Hash::ZERO,
                witness_root: Hash::ZERO,
                tree_root: Hash::ZERO,
                reserved_root: Hash::ZERO,
                time: 1514765690 + height as u64,
                bits: 0x207fffff,
                nonce: [0u8; NONCE_SIZE],
            },
            solution: Solution::zero(4),
            txs: Vec::new(),
        };
        let mut e = ChainEntry::from_block(&block, None);
        e.height = height;
        e
    }

    #[test]
    fn test_events_delivered_in_order() {
        let publisher = Publisher::new();
        let mut stream = publisher.subscribe(8);

        let tip = entry(2);
        publisher.publish(
            &ChainEvent::BlockConnect {
                entry: entry(1),
                txs: vec![],
            },
            &tip,
        );
        publisher.publish(
            &ChainEvent::BlockConnect {
                entry: entry(2),
                txs: vec![],
            },
            &tip,
        );

        match stream.receiver.try_recv().unwrap() {
            ChainEvent::BlockConnect { entry, .. } => assert_eq!(entry.height, 1),
            other => panic!("unexpected event {other:?}"),
        }
        match stream.receiver.try_recv().unwrap() {
            ChainEvent::BlockConnect { entry, .. } => assert_eq!(entry.height, 2),
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_slow_subscriber_gets_reset() {
        let publisher = Publisher::new();
        let mut stream = publisher.subscribe(1);

        let tip = entry(9);
        // Fills the queue.
        publisher.publish(
            &ChainEvent::BlockConnect {
                entry: entry(1),
                txs: vec![],
            },
            &tip,
        );
        // Dropped: queue full, subscriber flagged.
        publisher.publish(
            &ChainEvent::BlockConnect {
                entry: entry(2),
                txs: vec![],
            },
            &tip,
        );

        // Drain; the next delivery is a reset, not block 3.
        assert!(matches!(
            stream.receiver.try_recv().unwrap(),
            ChainEvent::BlockConnect { .. }
        ));
        publisher.publish(
            &ChainEvent::BlockConnect {
                entry: entry(3),
                txs: vec![],
            },
            &tip,
        );
        match stream.receiver.try_recv().unwrap() {
            ChainEvent::ChainReset { tip } => assert_eq!(tip.height, 9),
            other => panic!("expected reset, got {other:?}"),
        }
    }

    #[test]
    fn test_publish_to_targets_one_subscriber() {
        let publisher = Publisher::new();
        let mut a = publisher.subscribe(8);
        let mut b = publisher.subscribe(8);

        let tip = entry(1);
        publisher.publish_to(
            a.id,
            &ChainEvent::BlockRescan {
                entry: entry(1),
                txs: vec![],
            },
            &tip,
        );

        assert!(matches!(
            a.receiver.try_recv().unwrap(),
            ChainEvent::BlockRescan { .. }
        ));
        assert!(b.receiver.try_recv().is_err());
    }

    #[test]
    fn test_unsubscribe() {
        let publisher = Publisher::new();
        let stream = publisher.subscribe(8);
        assert_eq!(publisher.len(), 1);
        publisher.unsubscribe(stream.id);
        assert!(publisher.is_empty());
    }
}
