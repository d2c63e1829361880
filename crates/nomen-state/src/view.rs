//! Per-block views and undo logs.
//!
//! A [`View`] is the working set for exactly one block: the first
//! touch of a name loads its committed record (or null) and snapshots
//! it as the prior state. Committing writes every touched record and
//! emits the [`Undo`] whose reverse application restores the store
//! bit-for-bit. The set of undo keys therefore equals the set of
//! names the block's covenants referenced.

use crate::auction::Auction;
use crate::error::{StateError, StateResult};
use crate::store::NameStore;
use nomen_primitives::Hash;
use nomen_storage::{ColumnFamily, WriteBatch};
use std::collections::HashMap;
use tracing::trace;

struct ViewEntry {
    prior: Option<Auction>,
    current: Option<Auction>,
}

/// One block's working set over the auction store.
#[derive(Default)]
pub struct View {
    entries: HashMap<Hash, ViewEntry>,
    /// Touch order, for the ordered undo log.
    order: Vec<Hash>,
}

impl View {
    /// Create an empty view.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the mutable record slot for a name, loading from the store
    /// on first touch. The returned slot is owned by the view; `None`
    /// is the null state.
    pub fn get_mut(
        &mut self,
        store: &NameStore,
        name_hash: Hash,
    ) -> StateResult<&mut Option<Auction>> {
        if !self.entries.contains_key(&name_hash) {
            let prior = store.get(&name_hash)?;
            trace!(name_hash = %name_hash, present = prior.is_some(), "View load");
            self.entries.insert(
                name_hash,
                ViewEntry {
                    current: prior.clone(),
                    prior,
                },
            );
            self.order.push(name_hash);
        }
        // Present by construction.
        Ok(&mut self
            .entries
            .get_mut(&name_hash)
            .ok_or_else(|| StateError::Serialization("view entry vanished".into()))?
            .current)
    }

    /// Hashes touched by this view, in touch order.
    pub fn touched(&self) -> &[Hash] {
        &self.order
    }

    /// Number of touched names.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the view touched nothing.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Current in-view state of a name, if touched.
    pub fn current(&self, name_hash: &Hash) -> Option<&Option<Auction>> {
        self.entries.get(name_hash).map(|e| &e.current)
    }

    /// Write every touched record into the batch and emit the undo
    /// log of prior states.
    pub fn commit(self, batch: &mut WriteBatch) -> Undo {
        let mut undo = Undo::default();
        for name_hash in &self.order {
            let entry = &self.entries[name_hash];
            match &entry.current {
                Some(auction) => {
                    batch.put(
                        ColumnFamily::Names,
                        name_hash.as_bytes().to_vec(),
                        auction.serialize(),
                    );
                }
                None => {
                    batch.delete(ColumnFamily::Names, name_hash.as_bytes().to_vec());
                }
            }
            undo.items.push((*name_hash, entry.prior.clone()));
        }
        undo
    }
}

/// The inverse of one block's auction mutations.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Undo {
    /// `(name hash, prior state)` pairs in the block's touch order;
    /// `None` means the name was previously absent.
    pub items: Vec<(Hash, Option<Auction>)>,
}

impl Undo {
    /// Whether the log restores nothing.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Restore every prior state, replayed in reverse order.
    pub fn apply(&self, batch: &mut WriteBatch) {
        for (name_hash, prior) in self.items.iter().rev() {
            match prior {
                Some(auction) => {
                    batch.put(
                        ColumnFamily::Names,
                        name_hash.as_bytes().to_vec(),
                        auction.serialize(),
                    );
                }
                None => {
                    batch.delete(ColumnFamily::Names, name_hash.as_bytes().to_vec());
                }
            }
        }
    }

    /// Storage form: count (4) | per item: name_hash (32) |
    /// present (1) [ | auction bytes length (4) | auction bytes ].
    pub fn serialize(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&(self.items.len() as u32).to_be_bytes());
        for (name_hash, prior) in &self.items {
            bytes.extend_from_slice(name_hash.as_bytes());
            match prior {
                None => bytes.push(0),
                Some(auction) => {
                    bytes.push(1);
                    let auction_bytes = auction.serialize();
                    bytes.extend_from_slice(&(auction_bytes.len() as u32).to_be_bytes());
                    bytes.extend_from_slice(&auction_bytes);
                }
            }
        }
        bytes
    }

    /// Inverse of [`serialize`](Self::serialize).
    pub fn deserialize(bytes: &[u8]) -> StateResult<Self> {
        let err = |reason: &str| StateError::Serialization(format!("undo: {reason}"));

        if bytes.len() < 4 {
            return Err(err("too short"));
        }
        let count = u32::from_be_bytes(bytes[0..4].try_into().unwrap()) as usize;
        let mut offset = 4;
        let mut items = Vec::with_capacity(count);

        for _ in 0..count {
            if bytes.len() < offset + 33 {
                return Err(err("truncated"));
            }
            let name_hash =
                Hash::from_slice(&bytes[offset..offset + 32]).ok_or_else(|| err("bad hash"))?;
            let present = bytes[offset + 32];
            offset += 33;

            let prior = match present {
                0 => None,
                1 => {
                    if bytes.len() < offset + 4 {
                        return Err(err("truncated length"));
                    }
                    let len =
                        u32::from_be_bytes(bytes[offset..offset + 4].try_into().unwrap()) as usize;
                    offset += 4;
                    if bytes.len() < offset + len {
                        return Err(err("truncated auction"));
                    }
                    let auction = Auction::deserialize(&bytes[offset..offset + len])?;
                    offset += len;
                    Some(auction)
                }
                _ => return Err(err("bad presence flag")),
            };
            items.push((name_hash, prior));
        }

        if offset != bytes.len() {
            return Err(err("trailing bytes"));
        }
        Ok(Self { items })
    }
}
