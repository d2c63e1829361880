//! # nomen-chain
//!
//! The chain writer for the nomen blockchain.
//!
//! A single logical writer owns the active tip: it validates blocks,
//! applies their covenants through a per-block view, commits each
//! block as one atomic batch, and rolls reorgs back through persisted
//! undo logs. Readers and subscribers never block the writer; events
//! flow through bounded per-subscriber queues, and a lagging
//! subscriber is resynchronized with an injected `ChainReset` instead
//! of stalling consensus.

mod bloom;
mod chain;
mod client;
mod error;
mod events;

pub use bloom::BloomFilter;
pub use chain::Chain;
pub use client::{ChainClient, RescanHandle};
pub use error::{ChainError, ChainResult};
pub use events::{ChainEvent, EventStream, Publisher, DEFAULT_EVENT_CAPACITY};
