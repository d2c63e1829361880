//! # nomen-primitives
//!
//! Core chain types for the nomen naming blockchain and the bit-exact
//! wire codec they share.
//!
//! This crate provides:
//! - 32-byte hashes and BLAKE2b-256 helpers
//! - Addresses, covenants, transactions, block headers and blocks
//! - The consensus serialization format (little-endian integers,
//!   compact-size length prefixes)
//! - Merkle root computation over transaction IDs
//!
//! Every on-chain type satisfies the round-trip law
//! `decode(encode(x)) == x`; any deviation from the wire format is a
//! [`CodecError`].

mod address;
mod block;
mod covenant;
mod encoding;
mod hash;
mod header;
pub mod merkle;
mod transaction;

pub use address::{Address, MAX_ADDRESS_HASH};
pub use block::Block;
pub use covenant::{
    Covenant, CovenantType, MAX_COVENANT_ITEMS, MAX_COVENANT_ITEM_SIZE, MAX_NAME_SIZE,
};
pub use encoding::{CodecError, CodecResult, Decodable, Encodable, Reader, Writer};
pub use hash::{blake2b256, blake2b256_multi, Hash};
pub use header::{BlockHeader, Solution, HEADER_SIZE, MAX_SOLUTION_SIZE, NONCE_POS, NONCE_SIZE};
pub use transaction::{Input, Outpoint, Output, Transaction, Witness};

/// Weight factor applied to non-witness bytes.
pub const WITNESS_SCALE_FACTOR: usize = 4;
