//! The auction store and the tree root committed in headers.

use crate::auction::Auction;
use crate::error::{StateError, StateResult};
use crate::view::View;
use nomen_primitives::{blake2b256_multi, merkle::merkle_root, Hash};
use nomen_storage::{ColumnFamily, Storage};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Read access to committed auction records. All writes go through a
/// [`View`](crate::View) commit.
pub struct NameStore {
    storage: Arc<dyn Storage>,
}

impl NameStore {
    /// Create a store over a storage backend.
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Load the committed record for a name hash.
    pub fn get(&self, name_hash: &Hash) -> StateResult<Option<Auction>> {
        match self
            .storage
            .get(ColumnFamily::Names, name_hash.as_bytes())?
        {
            Some(bytes) => Ok(Some(Auction::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Whether a committed record exists.
    pub fn contains(&self, name_hash: &Hash) -> StateResult<bool> {
        Ok(self
            .storage
            .contains(ColumnFamily::Names, name_hash.as_bytes())?)
    }

    /// Merkle root over `(name hash, serialized record)` leaves in
    /// key order. The empty store maps to the null hash.
    pub fn tree_root(&self) -> StateResult<Hash> {
        self.tree_root_with(None)
    }

    /// Tree root as it would be after committing `view`.
    pub fn tree_root_with(&self, view: Option<&View>) -> StateResult<Hash> {
        let mut records: BTreeMap<Vec<u8>, Vec<u8>> = BTreeMap::new();
        for (key, value) in self.storage.iter(ColumnFamily::Names)? {
            records.insert(key, value);
        }

        if let Some(view) = view {
            for name_hash in view.touched() {
                let current = view
                    .current(name_hash)
                    .ok_or_else(|| StateError::Serialization("untracked view entry".into()))?;
                match current {
                    Some(auction) => {
                        records.insert(name_hash.as_bytes().to_vec(), auction.serialize());
                    }
                    None => {
                        records.remove(name_hash.as_bytes().as_slice());
                    }
                }
            }
        }

        let leaves: Vec<Hash> = records
            .iter()
            .map(|(key, value)| blake2b256_multi(&[key, value]))
            .collect();
        Ok(merkle_root(&leaves))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auction::{name_hash, AuctionState};
    use nomen_storage::{MemoryStore, WriteBatch};

    fn store() -> (NameStore, Arc<MemoryStore>) {
        let backing = Arc::new(MemoryStore::new());
        (NameStore::new(backing.clone()), backing)
    }

    #[test]
    fn test_empty_tree_root_is_null() {
        let (names, _) = store();
        assert_eq!(names.tree_root().unwrap(), Hash::ZERO);
    }

    #[test]
    fn test_get_roundtrip() {
        let (names, backing) = store();
        let auction = Auction::open(b"hello".to_vec(), 10);

        let mut batch = WriteBatch::new();
        batch.put(
            ColumnFamily::Names,
            auction.name_hash.as_bytes().to_vec(),
            auction.serialize(),
        );
        backing.write_batch(batch).unwrap();

        assert_eq!(names.get(&auction.name_hash).unwrap(), Some(auction));
        assert_eq!(names.get(&name_hash(b"other")).unwrap(), None);
    }

    #[test]
    fn test_tree_root_tracks_mutations() {
        let (names, backing) = store();
        let empty = names.tree_root().unwrap();

        let auction = Auction::open(b"hello".to_vec(), 10);
        let mut batch = WriteBatch::new();
        batch.put(
            ColumnFamily::Names,
            auction.name_hash.as_bytes().to_vec(),
            auction.serialize(),
        );
        backing.write_batch(batch).unwrap();

        let one = names.tree_root().unwrap();
        assert_ne!(one, empty);

        // Mutating the record moves the root.
        let mut changed = auction.clone();
        changed.state = AuctionState::Reveal;
        let mut batch = WriteBatch::new();
        batch.put(
            ColumnFamily::Names,
            changed.name_hash.as_bytes().to_vec(),
            changed.serialize(),
        );
        backing.write_batch(batch).unwrap();
        assert_ne!(names.tree_root().unwrap(), one);
    }

    #[test]
    fn test_overlay_root_matches_committed_root() {
        let (names, backing) = store();

        let mut view = View::new();
        let nh = name_hash(b"hello");
        *view.get_mut(&names, nh).unwrap() = Some(Auction::open(b"hello".to_vec(), 10));

        let overlay_root = names.tree_root_with(Some(&view)).unwrap();

        let mut batch = WriteBatch::new();
        view.commit(&mut batch);
        backing.write_batch(batch).unwrap();

        assert_eq!(names.tree_root().unwrap(), overlay_root);
    }
}
