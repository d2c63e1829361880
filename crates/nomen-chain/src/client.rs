//! The cooperative chain client handed to downstream consumers
//! (wallet, indexer).
//!
//! Everything here reads committed state or enqueues work for the
//! writer; a client can never block or mutate consensus. Subscribers
//! must tolerate a `BlockDisconnect` for a block they never saw
//! connect (late attach) by treating unknown hashes as no-ops.

use crate::bloom::BloomFilter;
use crate::chain::Chain;
use crate::error::ChainResult;
use crate::events::EventStream;
use nomen_consensus::ChainEntry;
use nomen_primitives::Hash;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cancellation handle for a running rescan.
#[derive(Debug, Clone, Default)]
pub struct RescanHandle {
    cancelled: Arc<AtomicBool>,
}

impl RescanHandle {
    /// Create a live handle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; honored between blocks.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub(crate) fn flag(&self) -> &AtomicBool {
        &self.cancelled
    }
}

/// A downstream consumer's view of the chain.
pub struct ChainClient {
    chain: Arc<Chain>,
    stream_id: u64,
}

impl ChainClient {
    /// Attach a client, returning it together with its event stream.
    pub fn attach(chain: Arc<Chain>) -> (Self, EventStream) {
        let stream = chain.subscribe();
        let client = Self {
            chain,
            stream_id: stream.id,
        };
        (client, stream)
    }

    /// Current best tip.
    pub fn get_tip(&self) -> ChainEntry {
        self.chain.tip()
    }

    /// Entry by hash; `None` unless the entry is on the main chain.
    pub fn get_entry(&self, hash: &Hash) -> ChainResult<Option<ChainEntry>> {
        self.chain.main_entry(hash)
    }

    /// Main-chain hashes over an inclusive height range.
    pub fn get_hashes(&self, start: u32, end: u32) -> ChainResult<Vec<Hash>> {
        self.chain.hashes(start, end)
    }

    /// Install the rescan filter.
    pub fn set_filter(&self, filter: BloomFilter) {
        self.chain.set_filter(filter);
    }

    /// Clear the rescan filter: rescans match everything.
    pub fn clear_filter(&self) {
        self.chain.clear_filter();
    }

    /// Scan history from `start` to the tip, delivering
    /// `BlockRescan` events over this client's stream. The handle
    /// cancels between blocks.
    pub fn rescan(&self, start: u32, handle: &RescanHandle) -> ChainResult<()> {
        self.chain.rescan(start, self.stream_id, handle.flag())
    }

    /// Detach this client's event stream.
    pub fn close(&self) {
        self.chain.unsubscribe(self.stream_id);
    }
}
