//! Error types for auction state management.

use thiserror::Error;

/// Covenant rejection reasons. Any of these rejects the containing
/// block without touching committed state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CovenantError {
    /// CLAIM outside the genesis claimant path.
    #[error("CLAIM does not derive from the genesis claimant")]
    NotFromClaimant,

    /// CLAIM on a name that already has a live auction.
    #[error("name already exists")]
    NameExists,

    /// Covenant on a name with no auction record.
    #[error("{op} on unknown name")]
    NoAuction { op: &'static str },

    /// Covenant not legal in the record's current state.
    #[error("{op} illegal in state {state}")]
    IllegalTransition {
        op: &'static str,
        state: &'static str,
    },

    /// Covenant outside its height window.
    #[error("{op} at height {height} outside window [{start}, {end})")]
    OutsideWindow {
        op: &'static str,
        height: u32,
        start: u32,
        end: u32,
    },

    /// The covenant's funding input was not resolved.
    #[error("{op} requires a resolved spent output")]
    MissingSpent { op: &'static str },

    /// The funding input carries the wrong covenant type.
    #[error("{op} must spend a {expected} output")]
    WrongSpentCovenant {
        op: &'static str,
        expected: &'static str,
    },

    /// Reveal does not hash back to the bid's blind.
    #[error("reveal does not match bid blind")]
    BadBlind,

    /// Revealed value exceeds the bid lockup.
    #[error("revealed value {value} exceeds lockup {lockup}")]
    RevealExceedsLockup { value: u64, lockup: u64 },

    /// Operation reserved to the auction winner.
    #[error("{op} by non-winner")]
    NotWinner { op: &'static str },

    /// REDEEM of the winning reveal.
    #[error("winning reveal cannot be redeemed")]
    CannotRedeemWinner,

    /// REGISTER output must carry the auction price.
    #[error("bad register price: expected {expected}, got {got}")]
    BadPrice { expected: u64, got: u64 },

    /// RENEW anchor missing or too deep.
    #[error("renewal anchor at height {anchor:?} outside window {window} of tip {height}")]
    BadRenewalAnchor {
        anchor: Option<u32>,
        window: u32,
        height: u32,
    },

    /// TRANSFER while another transfer is pending.
    #[error("transfer already pending")]
    TransferPending,

    /// FINALIZE with no pending transfer.
    #[error("no pending transfer")]
    NoTransfer,

    /// FINALIZE before the transfer delay elapsed.
    #[error("transfer locked until height {unlock}, at {height}")]
    TransferDelay { unlock: u32, height: u32 },
}

/// Errors surfaced by the state layer.
#[derive(Error, Debug)]
pub enum StateError {
    /// A covenant was illegal against current state.
    #[error("Covenant rejected: {0}")]
    Covenant(#[from] CovenantError),

    /// Stored record failed to deserialize.
    #[error("Serialization: {0}")]
    Serialization(String),

    /// Undo log missing for a block being disconnected.
    #[error("No undo log for block {0}")]
    UndoMissing(String),

    /// Undo log cannot be applied; the database is inconsistent.
    #[error("Undo inconsistency: {0}")]
    UndoInconsistent(String),

    /// Storage backend failure.
    #[error("Storage error: {0}")]
    Storage(#[from] nomen_storage::StorageError),
}

/// Result type for state operations.
pub type StateResult<T> = Result<T, StateError>;
