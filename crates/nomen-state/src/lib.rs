//! # nomen-state
//!
//! Name-auction state for the nomen blockchain.
//!
//! This crate provides:
//! - Per-name [`Auction`] records and their storage codec
//! - The covenant state machine: total transition functions over
//!   `(prior auction, covenant, context)`
//! - The [`View`] / [`Undo`] pair batching one block's mutations and
//!   recording their inverse
//! - The [`NameStore`] over the storage trait, including the tree
//!   root committed in every header
//!
//! Views are strictly per-block: the commit of block `h` happens
//! before the view for `h + 1` is created.

mod auction;
mod error;
mod store;
mod transitions;
mod view;

pub use auction::{name_hash, Auction, AuctionState, Transfer};
pub use error::{CovenantError, StateError, StateResult};
pub use store::NameStore;
pub use transitions::{apply_covenant, compute_blind, CovenantContext, SpentOutput};
pub use view::{Undo, View};
