//! # nomen-tests
//!
//! Cross-crate scenario tests for the nomen workspace: full auction
//! lifecycles, reorganizations with undo, expiry boundaries, genesis
//! determinism, and the subscriber contract. Regtest parameters keep
//! the proof-of-work and auction windows small enough to drive whole
//! lifecycles through the real chain writer.

pub mod generators;

#[cfg(test)]
mod auction_tests;
#[cfg(test)]
mod property_tests;
#[cfg(test)]
mod rescan_tests;
