//! The chain writer: block validation, view application, atomic
//! commits, and reorganizations.
//!
//! One logical writer owns the tip. Validation per block runs header
//! checks (PoW, cuckoo), body checks (merkle commitments, budgets),
//! contextual checks (median time, finality), then applies covenants
//! through a fresh view and compares the resulting tree root against
//! the header before anything is committed. Each block lands in the
//! store as a single atomic batch together with its undo log.

use crate::bloom::BloomFilter;
use crate::error::{ChainError, ChainResult};
use crate::events::{ChainEvent, EventStream, Publisher, DEFAULT_EVENT_CAPACITY};
use nomen_consensus::genesis::{build_genesis, GenesisOptions};
use nomen_consensus::{
    check_block_body, is_final, median_time, params::MEDIAN_TIMESPAN, verify_pow, ChainEntry,
    ConsensusError, Cuckoo, NetworkParams,
};
use nomen_primitives::{
    Block, Covenant, CovenantType, Decodable, Encodable, Hash, Outpoint, Reader, Transaction,
    Writer,
};
use nomen_state::{
    apply_covenant, name_hash, CovenantContext, NameStore, SpentOutput, StateError, Undo, View,
};
use nomen_storage::{ColumnFamily, Storage, WriteBatch};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

const TIP_KEY: &[u8] = b"tip";

/// A live covenant output, indexed by outpoint for prevout
/// resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
struct OutpointRecord {
    value: u64,
    covenant: Covenant,
}

impl OutpointRecord {
    fn to_vec(&self) -> Vec<u8> {
        let mut w = Writer::new();
        w.write_u64(self.value);
        self.covenant.encode(&mut w);
        w.into_vec()
    }

    fn from_bytes(bytes: &[u8]) -> ChainResult<Self> {
        let mut r = Reader::new(bytes);
        let value = r.read_u64()?;
        let covenant = Covenant::decode(&mut r)?;
        r.finish()?;
        Ok(Self { value, covenant })
    }
}

fn outpoint_key(outpoint: &Outpoint) -> Vec<u8> {
    let mut key = Vec::with_capacity(36);
    key.extend_from_slice(outpoint.hash.as_bytes());
    key.extend_from_slice(&outpoint.index.to_be_bytes());
    key
}

/// Everything needed to roll one block back: the auction undo plus
/// the covenant outpoints it consumed and created.
#[derive(Debug, Default)]
struct BlockUndo {
    auctions: Undo,
    spent: Vec<(Outpoint, OutpointRecord)>,
    created: Vec<Outpoint>,
}

impl BlockUndo {
    /// Format: auction undo (u32 BE length prefix) | spent count |
    /// per spent: outpoint (36) + record (u32 BE length prefix) |
    /// created count | outpoints (36 each).
    fn serialize(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        let auctions = self.auctions.serialize();
        bytes.extend_from_slice(&(auctions.len() as u32).to_be_bytes());
        bytes.extend_from_slice(&auctions);

        bytes.extend_from_slice(&(self.spent.len() as u32).to_be_bytes());
        for (outpoint, record) in &self.spent {
            bytes.extend_from_slice(&outpoint_key(outpoint));
            let record_bytes = record.to_vec();
            bytes.extend_from_slice(&(record_bytes.len() as u32).to_be_bytes());
            bytes.extend_from_slice(&record_bytes);
        }

        bytes.extend_from_slice(&(self.created.len() as u32).to_be_bytes());
        for outpoint in &self.created {
            bytes.extend_from_slice(&outpoint_key(outpoint));
        }
        bytes
    }

    fn deserialize(bytes: &[u8]) -> ChainResult<Self> {
        let err = |reason: &str| {
            ChainError::State(StateError::UndoInconsistent(format!("undo: {reason}")))
        };
        let take_u32 = |bytes: &[u8], offset: &mut usize| -> ChainResult<usize> {
            if bytes.len() < *offset + 4 {
                return Err(err("truncated length"));
            }
            let v = u32::from_be_bytes(bytes[*offset..*offset + 4].try_into().unwrap()) as usize;
            *offset += 4;
            Ok(v)
        };
        let take_outpoint = |bytes: &[u8], offset: &mut usize| -> ChainResult<Outpoint> {
            if bytes.len() < *offset + 36 {
                return Err(err("truncated outpoint"));
            }
            let hash = Hash::from_slice(&bytes[*offset..*offset + 32])
                .ok_or_else(|| err("bad outpoint hash"))?;
            let index =
                u32::from_be_bytes(bytes[*offset + 32..*offset + 36].try_into().unwrap());
            *offset += 36;
            Ok(Outpoint::new(hash, index))
        };

        let mut offset = 0;
        let auction_len = take_u32(bytes, &mut offset)?;
        if bytes.len() < offset + auction_len {
            return Err(err("truncated auction undo"));
        }
        let auctions = Undo::deserialize(&bytes[offset..offset + auction_len])?;
        offset += auction_len;

        let spent_count = take_u32(bytes, &mut offset)?;
        let mut spent = Vec::with_capacity(spent_count);
        for _ in 0..spent_count {
            let outpoint = take_outpoint(bytes, &mut offset)?;
            let record_len = take_u32(bytes, &mut offset)?;
            if bytes.len() < offset + record_len {
                return Err(err("truncated record"));
            }
            let record = OutpointRecord::from_bytes(&bytes[offset..offset + record_len])?;
            offset += record_len;
            spent.push((outpoint, record));
        }

        let created_count = take_u32(bytes, &mut offset)?;
        let mut created = Vec::with_capacity(created_count);
        for _ in 0..created_count {
            created.push(take_outpoint(bytes, &mut offset)?);
        }

        if offset != bytes.len() {
            return Err(err("trailing bytes"));
        }
        Ok(Self {
            auctions,
            spent,
            created,
        })
    }
}

/// The chain.
pub struct Chain {
    storage: Arc<dyn Storage>,
    names: NameStore,
    params: NetworkParams,
    cuckoo: Cuckoo,
    tip: RwLock<ChainEntry>,
    publisher: Publisher,
    filter: RwLock<Option<BloomFilter>>,
}

impl Chain {
    /// Open a chain over the given storage, bootstrapping genesis on
    /// first use.
    pub fn open(storage: Arc<dyn Storage>, params: NetworkParams) -> ChainResult<Self> {
        let cuckoo = Cuckoo::new(params.cuckoo.bits, params.cuckoo.size, params.cuckoo.ease);
        let names = NameStore::new(Arc::clone(&storage));

        let existing_tip = match storage.get(ColumnFamily::Metadata, TIP_KEY)? {
            Some(tip_bytes) => {
                let hash = Hash::from_slice(&tip_bytes)
                    .ok_or_else(|| ChainError::Invariant("malformed tip hash".into()))?;
                let entry_bytes = storage
                    .get(ColumnFamily::Entries, hash.as_bytes())?
                    .ok_or_else(|| ChainError::Invariant("tip entry missing".into()))?;
                Some(ChainEntry::from_bytes(&entry_bytes)?)
            }
            None => None,
        };

        let genesis_block = build_genesis(&params, &GenesisOptions::for_params(&params));
        let genesis_entry = ChainEntry::from_block(&genesis_block, None);

        let chain = Self {
            storage,
            names,
            params,
            cuckoo,
            tip: RwLock::new(existing_tip.clone().unwrap_or_else(|| genesis_entry.clone())),
            publisher: Publisher::new(),
            filter: RwLock::new(None),
        };

        match existing_tip {
            Some(tip) => {
                info!(height = tip.height, hash = %tip.hash, "Chain resumed");
            }
            None => {
                chain.connect_genesis(&genesis_block, &genesis_entry)?;
                info!(
                    network = %chain.params.network,
                    hash = %genesis_entry.hash,
                    "Chain bootstrapped from genesis"
                );
            }
        }
        Ok(chain)
    }

    /// Network parameters in force.
    pub fn params(&self) -> &NetworkParams {
        &self.params
    }

    /// Current best tip.
    pub fn tip(&self) -> ChainEntry {
        self.tip.read().clone()
    }

    /// Current best height.
    pub fn height(&self) -> u32 {
        self.tip.read().height
    }

    /// Committed auction record for a name.
    pub fn auction(&self, name: &[u8]) -> ChainResult<Option<nomen_state::Auction>> {
        Ok(self.names.get(&name_hash(name))?)
    }

    /// Register a subscriber with the default queue capacity.
    pub fn subscribe(&self) -> EventStream {
        self.publisher.subscribe(DEFAULT_EVENT_CAPACITY)
    }

    /// Register a subscriber with an explicit queue capacity.
    pub fn subscribe_with_capacity(&self, capacity: usize) -> EventStream {
        self.publisher.subscribe(capacity)
    }

    /// Remove a subscriber.
    pub fn unsubscribe(&self, id: u64) {
        self.publisher.unsubscribe(id);
    }

    /// Publish a mempool transaction event. Unordered with respect to
    /// block events.
    pub fn notify_tx(&self, tx: Transaction) {
        let tip = self.tip();
        self.publisher.publish(&ChainEvent::Tx { tx }, &tip);
    }

    /// Install the rescan filter.
    pub fn set_filter(&self, filter: BloomFilter) {
        *self.filter.write() = Some(filter);
    }

    /// Clear the rescan filter; rescans then match everything.
    pub fn clear_filter(&self) {
        *self.filter.write() = None;
    }

    /// Entry by hash, regardless of chain.
    fn entry(&self, hash: &Hash) -> ChainResult<Option<ChainEntry>> {
        match self.storage.get(ColumnFamily::Entries, hash.as_bytes())? {
            Some(bytes) => Ok(Some(ChainEntry::from_bytes(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Entry by hash, only if on the main chain.
    pub fn main_entry(&self, hash: &Hash) -> ChainResult<Option<ChainEntry>> {
        match self.entry(hash)? {
            Some(entry) if self.is_main_chain(&entry)? => Ok(Some(entry)),
            _ => Ok(None),
        }
    }

    /// Main-chain entry at a height.
    pub fn entry_by_height(&self, height: u32) -> ChainResult<Option<ChainEntry>> {
        match self
            .storage
            .get(ColumnFamily::HeightIndex, &height.to_be_bytes())?
        {
            Some(hash_bytes) => {
                let hash = Hash::from_slice(&hash_bytes)
                    .ok_or_else(|| ChainError::Invariant("malformed height index".into()))?;
                self.entry(&hash)
            }
            None => Ok(None),
        }
    }

    /// Main-chain block hashes for an inclusive height range, clamped
    /// to the tip.
    pub fn hashes(&self, start: u32, end: u32) -> ChainResult<Vec<Hash>> {
        let tip_height = self.height();
        let mut hashes = Vec::new();
        for height in start..=end.min(tip_height) {
            match self.entry_by_height(height)? {
                Some(entry) => hashes.push(entry.hash),
                None => break,
            }
        }
        Ok(hashes)
    }

    /// Stored block by hash.
    pub fn block(&self, hash: &Hash) -> ChainResult<Option<Block>> {
        match self.storage.get(ColumnFamily::Blocks, hash.as_bytes())? {
            Some(bytes) => Ok(Some(Block::from_bytes(&bytes)?)),
            None => Ok(None),
        }
    }

    fn is_main_chain(&self, entry: &ChainEntry) -> ChainResult<bool> {
        Ok(self
            .storage
            .get(ColumnFamily::HeightIndex, &entry.height.to_be_bytes())?
            .as_deref()
            == Some(entry.hash.as_bytes().as_slice()))
    }

    /// Median time over the [`MEDIAN_TIMESPAN`] entries ending at
    /// `from`.
    fn median_time_past(&self, from: &ChainEntry) -> ChainResult<u64> {
        let mut times = Vec::with_capacity(MEDIAN_TIMESPAN);
        let mut cursor = from.clone();
        loop {
            times.push(cursor.time);
            if times.len() == MEDIAN_TIMESPAN || cursor.is_genesis() {
                break;
            }
            cursor = self.entry(&cursor.prev_block)?.ok_or_else(|| {
                ChainError::Invariant(format!("missing ancestor {}", cursor.prev_block))
            })?;
        }
        Ok(median_time(&times))
    }

    /// Contextual block validation: PoW, cuckoo, body, time,
    /// finality. No state is touched.
    fn check_block(&self, block: &Block, entry: &ChainEntry, prev: &ChainEntry) -> ChainResult<()> {
        if !verify_pow(&entry.hash, entry.bits) {
            return Err(ConsensusError::PowBelowTarget {
                height: entry.height,
            }
            .into());
        }
        self.cuckoo
            .verify(&block.header.to_vec(), &block.solution)
            .map_err(ConsensusError::Cuckoo)?;
        check_block_body(block, &self.params)?;

        let mtp = self.median_time_past(prev)?;
        if block.header.time <= mtp {
            return Err(ConsensusError::TimeTooOld {
                time: block.header.time,
                median: mtp,
            }
            .into());
        }
        for tx in &block.txs {
            if !is_final(tx, entry.height, mtp) {
                return Err(ConsensusError::NonFinal {
                    txid: tx.txid().to_string(),
                }
                .into());
            }
        }
        Ok(())
    }

    /// Process a block. Extends the best chain, stores a side-chain
    /// entry, or triggers a reorganization when the side chain
    /// accumulates more work.
    #[instrument(skip(self, block), fields(hash = %block.hash(), height = tracing::field::Empty))]
    pub fn connect(&self, block: Block) -> ChainResult<ChainEntry> {
        let hash = block.hash();
        if self
            .storage
            .contains(ColumnFamily::Entries, hash.as_bytes())?
        {
            return Err(ChainError::Duplicate(hash.to_string()));
        }

        let tip = self.tip();
        let prev_hash = block.header.prev_block;
        let prev = if prev_hash == tip.hash {
            tip.clone()
        } else {
            self.entry(&prev_hash)?.ok_or_else(|| ChainError::Orphan {
                hash: hash.to_string(),
                parent: prev_hash.to_string(),
            })?
        };

        let entry = ChainEntry::from_block(&block, Some(&prev));
        tracing::Span::current().record("height", entry.height);
        self.check_block(&block, &entry, &prev)?;

        if prev.hash == tip.hash {
            self.connect_tip(&block, &entry)?;
            return Ok(entry);
        }

        // Side chain: remember the entry and block; switch over only
        // on more accumulated work.
        let mut batch = WriteBatch::new();
        batch.put(
            ColumnFamily::Entries,
            hash.as_bytes().to_vec(),
            entry.to_vec(),
        );
        batch.put(ColumnFamily::Blocks, hash.as_bytes().to_vec(), block.to_vec());
        self.storage.write_batch(batch)?;

        if entry.chainwork > tip.chainwork {
            warn!(
                height = entry.height,
                tip_height = tip.height,
                "Side chain has more work, reorganizing"
            );
            self.reorganize(&entry)?;
        } else {
            debug!(height = entry.height, "Stored side-chain block");
        }
        Ok(entry)
    }

    /// Apply a block's covenants against a fresh view, resolving
    /// funding prevouts positionally (input `i` funds output `i`).
    fn apply_block(
        &self,
        block: &Block,
        height: u32,
        genesis: bool,
    ) -> ChainResult<(View, Vec<(Outpoint, OutpointRecord)>, Vec<(Outpoint, OutpointRecord)>)>
    {
        let mut view = View::new();
        let mut created: HashMap<Outpoint, OutpointRecord> = HashMap::new();
        let mut created_order: Vec<Outpoint> = Vec::new();
        let mut spent_db: Vec<(Outpoint, OutpointRecord)> = Vec::new();
        let mut consumed: HashSet<Outpoint> = HashSet::new();

        for (tx_index, tx) in block.txs.iter().enumerate() {
            let txid = tx.txid();

            // Resolve and consume each input's covenant prevout.
            let mut resolved: Vec<Option<SpentOutput>> = Vec::with_capacity(tx.inputs.len());
            for input in &tx.inputs {
                let prevout = input.prevout;
                if prevout.is_null() || consumed.contains(&prevout) {
                    resolved.push(None);
                    continue;
                }
                let record = if let Some(record) = created.remove(&prevout) {
                    // Created earlier in this block; never hits disk.
                    created_order.retain(|o| o != &prevout);
                    Some(record)
                } else {
                    match self
                        .storage
                        .get(ColumnFamily::Outpoints, &outpoint_key(&prevout))?
                    {
                        Some(bytes) => {
                            let record = OutpointRecord::from_bytes(&bytes)?;
                            spent_db.push((prevout, record.clone()));
                            Some(record)
                        }
                        None => None,
                    }
                };
                match record {
                    Some(record) => {
                        consumed.insert(prevout);
                        resolved.push(Some(SpentOutput {
                            outpoint: prevout,
                            covenant: record.covenant,
                            value: record.value,
                        }));
                    }
                    None => resolved.push(None),
                }
            }

            for (output_index, output) in tx.outputs.iter().enumerate() {
                if output.covenant.is_none() {
                    continue;
                }
                // Names are validated at decode; present for all
                // name-bearing covenants.
                let name = output.covenant.name().ok_or_else(|| {
                    ChainError::Invariant("name-bearing covenant without name".into())
                })?;
                let nh = name_hash(name);
                let outpoint = Outpoint::new(txid, output_index as u32);

                let spent = resolved.get(output_index).and_then(|s| s.as_ref());
                let from_claimant = genesis
                    || matches!(
                        spent.map(|s| s.covenant.covenant_type()),
                        Some(CovenantType::Claim)
                    );
                let anchor_height = match &output.covenant {
                    Covenant::Renew { block_hash, .. } => {
                        self.main_entry(block_hash)?.map(|e| e.height)
                    }
                    _ => None,
                };

                let ctx = CovenantContext {
                    params: &self.params,
                    height,
                    tx_index,
                    output_index,
                    outpoint,
                    value: output.value,
                    spent,
                    anchor_height,
                    from_claimant,
                };

                let slot = view.get_mut(&self.names, nh)?;
                apply_covenant(slot, &output.covenant, &ctx).map_err(StateError::Covenant)?;

                created.insert(
                    outpoint,
                    OutpointRecord {
                        value: output.value,
                        covenant: output.covenant.clone(),
                    },
                );
                created_order.push(outpoint);
            }
        }

        let created_records = created_order
            .into_iter()
            .filter_map(|outpoint| created.get(&outpoint).map(|r| (outpoint, r.clone())))
            .collect();
        Ok((view, spent_db, created_records))
    }

    /// Tree root the header must commit for a block extending the
    /// current tip (mining-template support). The block's covenants
    /// are applied against a throwaway view; nothing is committed.
    pub fn preview_tree_root(&self, block: &Block) -> ChainResult<Hash> {
        let tip = self.tip();
        if block.header.prev_block != tip.hash {
            return Err(ChainError::Orphan {
                hash: block.hash().to_string(),
                parent: block.header.prev_block.to_string(),
            });
        }
        let (view, _, _) = self.apply_block(block, tip.height + 1, false)?;
        Ok(self.names.tree_root_with(Some(&view))?)
    }

    /// Extend the best chain by one fully validated block.
    fn connect_tip(&self, block: &Block, entry: &ChainEntry) -> ChainResult<()> {
        let (view, spent, created) = self.apply_block(block, entry.height, false)?;

        let computed = self.names.tree_root_with(Some(&view))?;
        if computed != block.header.tree_root {
            return Err(ChainError::Invariant(format!(
                "tree root mismatch at height {}: header {}, computed {}",
                entry.height, block.header.tree_root, computed
            )));
        }

        self.commit_block(block, entry, view, spent, created)?;

        info!(height = entry.height, hash = %entry.hash, "Block connected");
        self.publisher.publish(
            &ChainEvent::BlockConnect {
                entry: entry.clone(),
                txs: block.txs.clone(),
            },
            entry,
        );
        Ok(())
    }

    /// Genesis bypasses PoW and the tree-root check: its header
    /// commits the empty tree by construction.
    fn connect_genesis(&self, block: &Block, entry: &ChainEntry) -> ChainResult<()> {
        let (view, spent, created) = self.apply_block(block, 0, true)?;
        self.commit_block(block, entry, view, spent, created)
    }

    fn commit_block(
        &self,
        block: &Block,
        entry: &ChainEntry,
        view: View,
        spent: Vec<(Outpoint, OutpointRecord)>,
        created: Vec<(Outpoint, OutpointRecord)>,
    ) -> ChainResult<()> {
        let hash = entry.hash;
        let mut batch = WriteBatch::new();

        let auctions = view.commit(&mut batch);
        for (outpoint, record) in &created {
            batch.put(
                ColumnFamily::Outpoints,
                outpoint_key(outpoint),
                record.to_vec(),
            );
        }
        for (outpoint, _) in &spent {
            batch.delete(ColumnFamily::Outpoints, outpoint_key(outpoint));
        }

        let undo = BlockUndo {
            auctions,
            spent,
            created: created.iter().map(|(o, _)| *o).collect(),
        };
        batch.put(
            ColumnFamily::Undo,
            hash.as_bytes().to_vec(),
            undo.serialize(),
        );
        batch.put(
            ColumnFamily::Entries,
            hash.as_bytes().to_vec(),
            entry.to_vec(),
        );
        batch.put(
            ColumnFamily::HeightIndex,
            entry.height.to_be_bytes().to_vec(),
            hash.as_bytes().to_vec(),
        );
        batch.put(ColumnFamily::Blocks, hash.as_bytes().to_vec(), block.to_vec());
        batch.put(ColumnFamily::Metadata, TIP_KEY.to_vec(), hash.as_bytes().to_vec());

        self.storage.write_batch(batch)?;
        *self.tip.write() = entry.clone();
        Ok(())
    }

    /// Roll the current tip back using its persisted undo log.
    #[instrument(skip(self))]
    pub fn disconnect(&self) -> ChainResult<ChainEntry> {
        let tip = self.tip();
        if tip.is_genesis() {
            return Err(ChainError::Invariant("cannot disconnect genesis".into()));
        }

        let undo_bytes = self
            .storage
            .get(ColumnFamily::Undo, tip.hash.as_bytes())?
            .ok_or_else(|| ChainError::State(StateError::UndoMissing(tip.hash.to_string())))?;
        let undo = BlockUndo::deserialize(&undo_bytes)?;
        let prev = self.entry(&tip.prev_block)?.ok_or_else(|| {
            ChainError::Invariant(format!("missing parent entry {}", tip.prev_block))
        })?;

        let mut batch = WriteBatch::new();
        undo.auctions.apply(&mut batch);
        for (outpoint, record) in &undo.spent {
            batch.put(
                ColumnFamily::Outpoints,
                outpoint_key(outpoint),
                record.to_vec(),
            );
        }
        for outpoint in &undo.created {
            batch.delete(ColumnFamily::Outpoints, outpoint_key(outpoint));
        }
        batch.delete(ColumnFamily::Undo, tip.hash.as_bytes().to_vec());
        batch.delete(ColumnFamily::HeightIndex, tip.height.to_be_bytes().to_vec());
        batch.put(
            ColumnFamily::Metadata,
            TIP_KEY.to_vec(),
            prev.hash.as_bytes().to_vec(),
        );

        self.storage.write_batch(batch)?;
        *self.tip.write() = prev.clone();

        info!(height = tip.height, hash = %tip.hash, "Block disconnected");
        self.publisher
            .publish(&ChainEvent::BlockDisconnect { entry: tip }, &prev);
        Ok(prev)
    }

    /// Switch the active chain to a heavier branch: disconnect back
    /// to the common ancestor, then connect the branch in order.
    fn reorganize(&self, target: &ChainEntry) -> ChainResult<()> {
        // Collect the branch from target down to the fork point.
        let mut branch: Vec<ChainEntry> = Vec::new();
        let mut cursor = target.clone();
        while !self.is_main_chain(&cursor)? {
            let parent = self.entry(&cursor.prev_block)?.ok_or_else(|| {
                ChainError::Orphan {
                    hash: cursor.hash.to_string(),
                    parent: cursor.prev_block.to_string(),
                }
            })?;
            branch.push(cursor);
            cursor = parent;
        }
        let fork = cursor;

        warn!(
            fork_height = fork.height,
            target_height = target.height,
            rollback = self.height() - fork.height,
            "Chain reorganization"
        );

        while self.tip().hash != fork.hash {
            self.disconnect()?;
        }

        for entry in branch.iter().rev() {
            let block = self
                .block(&entry.hash)?
                .ok_or_else(|| ChainError::UnknownBlock(entry.hash.to_string()))?;
            self.connect_tip(&block, entry)?;
        }
        Ok(())
    }

    /// Deliver historical blocks to one subscriber, filtered by the
    /// installed Bloom predicate (everything matches when none is
    /// installed). Cancellation is honored between blocks and answered
    /// with a final `ChainReset` carrying the then-current tip.
    #[instrument(skip(self, cancelled))]
    pub fn rescan(
        &self,
        start: u32,
        subscriber: u64,
        cancelled: &std::sync::atomic::AtomicBool,
    ) -> ChainResult<()> {
        let tip = self.tip();
        for height in start..=tip.height {
            if cancelled.load(std::sync::atomic::Ordering::SeqCst) {
                let now = self.tip();
                self.publisher
                    .publish_to(subscriber, &ChainEvent::ChainReset { tip: now.clone() }, &now);
                debug!(height, "Rescan cancelled");
                return Ok(());
            }

            let entry = self
                .entry_by_height(height)?
                .ok_or_else(|| ChainError::UnknownBlock(format!("height {height}")))?;
            let block = self
                .block(&entry.hash)?
                .ok_or_else(|| ChainError::UnknownBlock(entry.hash.to_string()))?;

            let filter = self.filter.read();
            let txs: Vec<Transaction> = block
                .txs
                .into_iter()
                .filter(|tx| match filter.as_ref() {
                    Some(filter) => tx_matches(filter, tx),
                    None => true,
                })
                .collect();
            drop(filter);

            self.publisher
                .publish_to(subscriber, &ChainEvent::BlockRescan { entry, txs }, &tip);
        }
        Ok(())
    }
}

/// Bloom predicate over a transaction: its ID, any output address
/// hash, or any covenant name.
fn tx_matches(filter: &BloomFilter, tx: &Transaction) -> bool {
    if filter.contains(tx.txid().as_bytes()) {
        return true;
    }
    tx.outputs.iter().any(|output| {
        filter.contains(&output.address.hash)
            || output
                .covenant
                .name()
                .map(|name| filter.contains(name))
                .unwrap_or(false)
    })
}
