//! In-memory storage backend.
//!
//! Ordered maps per column family behind a single lock. Batch writes
//! hold the lock for their whole application, giving the same
//! atomicity a persistent engine provides via its write-ahead log.

use crate::{ColumnFamily, OperationKind, Storage, StorageResult, WriteBatch};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};

type Table = BTreeMap<Vec<u8>, Vec<u8>>;

/// An in-memory [`Storage`] implementation.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<ColumnFamily, Table>>,
}

impl MemoryStore {
    /// Create an empty store with every column family present.
    pub fn new() -> Self {
        let mut tables = HashMap::new();
        for &cf in ColumnFamily::all() {
            tables.insert(cf, Table::new());
        }
        Self {
            tables: RwLock::new(tables),
        }
    }

    /// Total key count across all column families.
    pub fn len(&self) -> usize {
        self.tables.read().values().map(|t| t.len()).sum()
    }

    /// Whether the store holds no keys.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot one column family (test comparisons).
    pub fn snapshot(&self, cf: ColumnFamily) -> Vec<(Vec<u8>, Vec<u8>)> {
        self.tables
            .read()
            .get(&cf)
            .map(|t| t.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default()
    }
}

impl Storage for MemoryStore {
    fn get(&self, cf: ColumnFamily, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        Ok(self
            .tables
            .read()
            .get(&cf)
            .and_then(|t| t.get(key).cloned()))
    }

    fn put(&self, cf: ColumnFamily, key: &[u8], value: &[u8]) -> StorageResult<()> {
        self.tables
            .write()
            .entry(cf)
            .or_default()
            .insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&self, cf: ColumnFamily, key: &[u8]) -> StorageResult<()> {
        if let Some(table) = self.tables.write().get_mut(&cf) {
            table.remove(key);
        }
        Ok(())
    }

    fn write_batch(&self, batch: WriteBatch) -> StorageResult<()> {
        let mut tables = self.tables.write();
        for op in batch.operations {
            let table = tables.entry(op.cf).or_default();
            match op.kind {
                OperationKind::Put { value } => {
                    table.insert(op.key, value);
                }
                OperationKind::Delete => {
                    table.remove(&op.key);
                }
            }
        }
        Ok(())
    }

    fn iter(
        &self,
        cf: ColumnFamily,
    ) -> StorageResult<Box<dyn Iterator<Item = (Vec<u8>, Vec<u8>)> + '_>> {
        Ok(Box::new(self.snapshot(cf).into_iter()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_operations() {
        let store = MemoryStore::new();

        store.put(ColumnFamily::Metadata, b"key1", b"value1").unwrap();
        assert_eq!(
            store.get(ColumnFamily::Metadata, b"key1").unwrap(),
            Some(b"value1".to_vec())
        );
        assert!(store.contains(ColumnFamily::Metadata, b"key1").unwrap());

        store.delete(ColumnFamily::Metadata, b"key1").unwrap();
        assert_eq!(store.get(ColumnFamily::Metadata, b"key1").unwrap(), None);
    }

    #[test]
    fn test_column_families_are_isolated() {
        let store = MemoryStore::new();
        store.put(ColumnFamily::Names, b"k", b"names").unwrap();
        assert_eq!(store.get(ColumnFamily::Entries, b"k").unwrap(), None);
    }

    #[test]
    fn test_batch_applies_in_order() {
        let store = MemoryStore::new();

        let mut batch = WriteBatch::new();
        batch.put(ColumnFamily::Names, b"a".to_vec(), b"1".to_vec());
        batch.put(ColumnFamily::Names, b"a".to_vec(), b"2".to_vec());
        batch.delete(ColumnFamily::Names, b"b".to_vec());
        store.write_batch(batch).unwrap();

        assert_eq!(
            store.get(ColumnFamily::Names, b"a").unwrap(),
            Some(b"2".to_vec())
        );
    }

    #[test]
    fn test_iter_is_key_ordered() {
        let store = MemoryStore::new();
        store.put(ColumnFamily::Names, b"b", b"2").unwrap();
        store.put(ColumnFamily::Names, b"a", b"1").unwrap();

        let keys: Vec<_> = store
            .iter(ColumnFamily::Names)
            .unwrap()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(keys, vec![b"a".to_vec(), b"b".to_vec()]);
    }
}
