//! # nomen-storage
//!
//! Storage abstraction for the nomen node.
//!
//! The consensus core treats the database engine as a collaborator
//! behind the [`Storage`] trait: column families, point reads, and
//! atomic batch writes. The crate ships an in-memory backend; a
//! persistent engine plugs in behind the same trait.
//!
//! ## Column Families
//!
//! - `Entries`: chain entries indexed by block hash
//! - `HeightIndex`: main-chain block hashes indexed by height
//! - `Blocks`: raw blocks indexed by block hash
//! - `Names`: auction records indexed by name hash
//! - `Outpoints`: live covenant outputs indexed by outpoint
//! - `Undo`: per-block undo logs indexed by block hash
//! - `Metadata`: tip hash and other node metadata

mod batch;
mod error;
mod memory;

pub use batch::{BatchOperation, OperationKind, WriteBatch};
pub use error::{StorageError, StorageResult};
pub use memory::MemoryStore;

/// Column families for organizing data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnFamily {
    /// Chain entries indexed by block hash.
    Entries,
    /// Main-chain hash indexed by height (big-endian u32 key).
    HeightIndex,
    /// Raw blocks indexed by block hash.
    Blocks,
    /// Auction records indexed by name hash.
    Names,
    /// Live covenant outputs indexed by outpoint.
    Outpoints,
    /// Undo logs indexed by block hash.
    Undo,
    /// Node metadata.
    Metadata,
}

impl ColumnFamily {
    /// String name of the column family.
    pub fn name(&self) -> &'static str {
        match self {
            ColumnFamily::Entries => "entries",
            ColumnFamily::HeightIndex => "height_index",
            ColumnFamily::Blocks => "blocks",
            ColumnFamily::Names => "names",
            ColumnFamily::Outpoints => "outpoints",
            ColumnFamily::Undo => "undo",
            ColumnFamily::Metadata => "metadata",
        }
    }

    /// All column families.
    pub fn all() -> &'static [ColumnFamily] {
        &[
            ColumnFamily::Entries,
            ColumnFamily::HeightIndex,
            ColumnFamily::Blocks,
            ColumnFamily::Names,
            ColumnFamily::Outpoints,
            ColumnFamily::Undo,
            ColumnFamily::Metadata,
        ]
    }
}

/// Storage trait for abstracting database operations.
///
/// This allows for easy testing with mock implementations.
pub trait Storage: Send + Sync {
    /// Get a value by key from a column family.
    fn get(&self, cf: ColumnFamily, key: &[u8]) -> StorageResult<Option<Vec<u8>>>;

    /// Put a key-value pair into a column family.
    fn put(&self, cf: ColumnFamily, key: &[u8], value: &[u8]) -> StorageResult<()>;

    /// Delete a key from a column family.
    fn delete(&self, cf: ColumnFamily, key: &[u8]) -> StorageResult<()>;

    /// Check if a key exists in a column family.
    fn contains(&self, cf: ColumnFamily, key: &[u8]) -> StorageResult<bool> {
        Ok(self.get(cf, key)?.is_some())
    }

    /// Execute a batch of writes atomically.
    fn write_batch(&self, batch: WriteBatch) -> StorageResult<()>;

    /// Iterate a column family in key order.
    fn iter(
        &self,
        cf: ColumnFamily,
    ) -> StorageResult<Box<dyn Iterator<Item = (Vec<u8>, Vec<u8>)> + '_>>;
}
