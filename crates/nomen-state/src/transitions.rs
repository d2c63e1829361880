//! Covenant transitions.
//!
//! Every transition is a total function over `(prior record, covenant,
//! context)`: it either mutates the in-view record or returns the
//! specific [`CovenantError`] that rejects the containing block.
//! Expired records decay to the null state before dispatch, which is
//! what makes an expired name biddable again.

use crate::auction::{Auction, AuctionState, Transfer};
use crate::error::CovenantError;
use nomen_consensus::NetworkParams;
use nomen_primitives::{blake2b256_multi, Covenant, CovenantType, Hash, Outpoint};
use tracing::{debug, trace};

/// The resolved output spent by the input funding a covenant output.
#[derive(Debug, Clone)]
pub struct SpentOutput {
    /// The prevout reference.
    pub outpoint: Outpoint,
    /// Covenant carried by the spent output.
    pub covenant: Covenant,
    /// Value of the spent output.
    pub value: u64,
}

/// Context for one covenant dispatch.
#[derive(Debug, Clone)]
pub struct CovenantContext<'a> {
    /// Network windows.
    pub params: &'a NetworkParams,
    /// Height of the block being applied.
    pub height: u32,
    /// Transaction index within the block.
    pub tx_index: usize,
    /// Output index within the transaction.
    pub output_index: usize,
    /// Outpoint of the covenant output itself.
    pub outpoint: Outpoint,
    /// Value of the covenant output.
    pub value: u64,
    /// Funding prevout, resolved by the chain layer.
    pub spent: Option<&'a SpentOutput>,
    /// Main-chain height of a RENEW anchor, if it resolves.
    pub anchor_height: Option<u32>,
    /// Whether the spending chain traces to the genesis claimant.
    pub from_claimant: bool,
}

/// Blind commitment published at BID and checked at REVEAL:
/// `blake2b256(value_le8 || nonce || name_hash)`.
pub fn compute_blind(value: u64, nonce: &[u8], name_hash: &Hash) -> Hash {
    blake2b256_multi(&[&value.to_le_bytes(), nonce, name_hash.as_bytes()])
}

/// Apply one covenant to the in-view record slot. `None` is the null
/// state for an unknown (or decayed) name.
pub fn apply_covenant(
    slot: &mut Option<Auction>,
    covenant: &Covenant,
    ctx: &CovenantContext<'_>,
) -> Result<(), CovenantError> {
    // Expiry decays the record to null before any dispatch.
    if let Some(auction) = slot.as_ref() {
        if auction.is_expired(ctx.height, ctx.params.expiry_window) {
            debug!(
                name = %String::from_utf8_lossy(&auction.name),
                renewal = auction.renewal,
                height = ctx.height,
                "Auction expired, name returns to null state"
            );
            *slot = None;
        }
    }

    match covenant {
        Covenant::None => Ok(()),
        Covenant::Claim { name } => apply_claim(slot, name, ctx),
        Covenant::Bid { name, .. } => apply_bid(slot, name, ctx),
        Covenant::Reveal { name, nonce } => apply_reveal(slot, name, nonce, ctx),
        Covenant::Redeem { .. } => apply_redeem(slot, ctx),
        Covenant::Register { .. } => apply_register(slot, ctx),
        Covenant::Update { .. } => apply_update(slot, ctx),
        Covenant::Renew { .. } => apply_renew(slot, ctx),
        Covenant::Transfer { address, .. } => apply_transfer(slot, address.clone(), ctx),
        Covenant::Finalize { .. } => apply_finalize(slot, ctx),
        Covenant::Revoke { .. } => apply_revoke(slot, ctx),
    }
}

fn require_live<'s>(
    slot: &'s mut Option<Auction>,
    op: &'static str,
) -> Result<&'s mut Auction, CovenantError> {
    let auction = slot.as_mut().ok_or(CovenantError::NoAuction { op })?;
    if !auction.state.is_live() {
        return Err(CovenantError::IllegalTransition {
            op,
            state: auction.state.name(),
        });
    }
    Ok(auction)
}

fn require_owner(
    auction: &Auction,
    ctx: &CovenantContext<'_>,
    op: &'static str,
) -> Result<(), CovenantError> {
    let spent = ctx.spent.ok_or(CovenantError::MissingSpent { op })?;
    if spent.outpoint != auction.owner {
        return Err(CovenantError::NotWinner { op });
    }
    Ok(())
}

fn apply_claim(
    slot: &mut Option<Auction>,
    name: &[u8],
    ctx: &CovenantContext<'_>,
) -> Result<(), CovenantError> {
    if !ctx.from_claimant {
        return Err(CovenantError::NotFromClaimant);
    }
    if slot.is_some() {
        return Err(CovenantError::NameExists);
    }

    let mut auction = Auction::open(name.to_vec(), ctx.height);
    auction.state = AuctionState::Closed;
    auction.owner = ctx.outpoint;
    *slot = Some(auction);

    trace!(name = %String::from_utf8_lossy(name), height = ctx.height, "Claimed reserved name");
    Ok(())
}

fn apply_bid(
    slot: &mut Option<Auction>,
    name: &[u8],
    ctx: &CovenantContext<'_>,
) -> Result<(), CovenantError> {
    match slot.as_mut() {
        // First bid on an unknown name implicitly opens the auction.
        None => {
            *slot = Some(Auction::open(name.to_vec(), ctx.height));
            trace!(
                name = %String::from_utf8_lossy(name),
                height = ctx.height,
                "Auction opened"
            );
            Ok(())
        }
        Some(auction) => {
            if auction.state != AuctionState::Bidding {
                return Err(CovenantError::IllegalTransition {
                    op: "BID",
                    state: auction.state.name(),
                });
            }
            let end = ctx.params.reveal_open(auction.height);
            if ctx.height >= end {
                return Err(CovenantError::OutsideWindow {
                    op: "BID",
                    height: ctx.height,
                    start: auction.height,
                    end,
                });
            }
            // The blind stays opaque until REVEAL.
            Ok(())
        }
    }
}

fn apply_reveal(
    slot: &mut Option<Auction>,
    name: &[u8],
    nonce: &[u8],
    ctx: &CovenantContext<'_>,
) -> Result<(), CovenantError> {
    let auction = slot
        .as_mut()
        .ok_or(CovenantError::NoAuction { op: "REVEAL" })?;

    if !matches!(auction.state, AuctionState::Bidding | AuctionState::Reveal) {
        return Err(CovenantError::IllegalTransition {
            op: "REVEAL",
            state: auction.state.name(),
        });
    }

    let start = ctx.params.reveal_open(auction.height);
    let end = ctx.params.reveal_close(auction.height);
    if ctx.height < start || ctx.height >= end {
        return Err(CovenantError::OutsideWindow {
            op: "REVEAL",
            height: ctx.height,
            start,
            end,
        });
    }

    let spent = ctx
        .spent
        .ok_or(CovenantError::MissingSpent { op: "REVEAL" })?;
    let blind = match &spent.covenant {
        Covenant::Bid { name: bid_name, blind } if bid_name == name => *blind,
        _ => {
            return Err(CovenantError::WrongSpentCovenant {
                op: "REVEAL",
                expected: "BID",
            })
        }
    };

    // The reveal output's value is the true bid; the lockup covered it.
    if ctx.value > spent.value {
        return Err(CovenantError::RevealExceedsLockup {
            value: ctx.value,
            lockup: spent.value,
        });
    }
    if compute_blind(ctx.value, nonce, &auction.name_hash) != blind {
        return Err(CovenantError::BadBlind);
    }

    auction.state = AuctionState::Reveal;

    // Keep the top two reveals. Ties never displace the incumbent:
    // earliest (height, tx, output) wins.
    if ctx.value > auction.highest {
        auction.value = auction.highest;
        auction.highest = ctx.value;
        auction.owner = ctx.outpoint;
    } else if ctx.value > auction.value {
        auction.value = ctx.value;
    }

    debug!(
        name = %String::from_utf8_lossy(name),
        value = ctx.value,
        highest = auction.highest,
        price = auction.value,
        "Bid revealed"
    );
    Ok(())
}

fn apply_redeem(
    slot: &mut Option<Auction>,
    ctx: &CovenantContext<'_>,
) -> Result<(), CovenantError> {
    let auction = slot
        .as_ref()
        .ok_or(CovenantError::NoAuction { op: "REDEEM" })?;

    let end = ctx.params.reveal_close(auction.height);
    if auction.state == AuctionState::Bidding
        || (auction.state == AuctionState::Reveal && ctx.height < end)
    {
        return Err(CovenantError::OutsideWindow {
            op: "REDEEM",
            height: ctx.height,
            start: end,
            end: u32::MAX,
        });
    }

    let spent = ctx
        .spent
        .ok_or(CovenantError::MissingSpent { op: "REDEEM" })?;
    if spent.covenant.covenant_type() != CovenantType::Reveal {
        return Err(CovenantError::WrongSpentCovenant {
            op: "REDEEM",
            expected: "REVEAL",
        });
    }
    if spent.outpoint == auction.owner {
        return Err(CovenantError::CannotRedeemWinner);
    }

    // Losing lockup returns to its bidder; the record is unchanged.
    Ok(())
}

fn apply_register(
    slot: &mut Option<Auction>,
    ctx: &CovenantContext<'_>,
) -> Result<(), CovenantError> {
    let auction = slot
        .as_mut()
        .ok_or(CovenantError::NoAuction { op: "REGISTER" })?;

    // A claimed name registers without an auction: its record is
    // already Closed and the funding output carries the CLAIM.
    let claimed = auction.state == AuctionState::Closed
        && matches!(
            ctx.spent.map(|s| s.covenant.covenant_type()),
            Some(CovenantType::Claim)
        );

    if !claimed {
        if auction.state != AuctionState::Reveal {
            return Err(CovenantError::IllegalTransition {
                op: "REGISTER",
                state: auction.state.name(),
            });
        }
        let start = ctx.params.reveal_close(auction.height);
        if ctx.height < start {
            return Err(CovenantError::OutsideWindow {
                op: "REGISTER",
                height: ctx.height,
                start,
                end: u32::MAX,
            });
        }
    }
    require_owner(auction, ctx, "REGISTER")?;

    // First-price sealed bid: the winner pays the second-highest.
    if ctx.value != auction.value {
        return Err(CovenantError::BadPrice {
            expected: auction.value,
            got: ctx.value,
        });
    }

    auction.state = AuctionState::Closed;
    auction.renewal = ctx.height;
    auction.owner = ctx.outpoint;

    debug!(
        name = %String::from_utf8_lossy(&auction.name),
        price = auction.value,
        height = ctx.height,
        "Name registered"
    );
    Ok(())
}

fn apply_update(
    slot: &mut Option<Auction>,
    ctx: &CovenantContext<'_>,
) -> Result<(), CovenantError> {
    let auction = require_live(slot, "UPDATE")?;
    require_owner(auction, ctx, "UPDATE")?;
    auction.owner = ctx.outpoint;
    Ok(())
}

fn apply_renew(
    slot: &mut Option<Auction>,
    ctx: &CovenantContext<'_>,
) -> Result<(), CovenantError> {
    let auction = require_live(slot, "RENEW")?;
    require_owner(auction, ctx, "RENEW")?;

    // The anchor must name a main-chain entry near the tip; this is
    // what stops long-range renewal replays.
    let window = ctx.params.renewal_anchor_window;
    match ctx.anchor_height {
        Some(anchor) if ctx.height.saturating_sub(anchor) <= window => {}
        anchor => {
            return Err(CovenantError::BadRenewalAnchor {
                anchor,
                window,
                height: ctx.height,
            })
        }
    }

    auction.renewal = ctx.height;
    auction.state = AuctionState::Renewed;
    auction.owner = ctx.outpoint;

    debug!(
        name = %String::from_utf8_lossy(&auction.name),
        height = ctx.height,
        "Name renewed"
    );
    Ok(())
}

fn apply_transfer(
    slot: &mut Option<Auction>,
    address: nomen_primitives::Address,
    ctx: &CovenantContext<'_>,
) -> Result<(), CovenantError> {
    let auction = require_live(slot, "TRANSFER")?;
    require_owner(auction, ctx, "TRANSFER")?;
    if auction.transfer.is_some() {
        return Err(CovenantError::TransferPending);
    }
    auction.transfer = Some(Transfer {
        address,
        height: ctx.height,
    });
    auction.owner = ctx.outpoint;
    Ok(())
}

fn apply_finalize(
    slot: &mut Option<Auction>,
    ctx: &CovenantContext<'_>,
) -> Result<(), CovenantError> {
    let auction = require_live(slot, "FINALIZE")?;
    require_owner(auction, ctx, "FINALIZE")?;

    let transfer = auction.transfer.take().ok_or(CovenantError::NoTransfer)?;
    let unlock = transfer.height.saturating_add(ctx.params.transfer_lockup);
    if ctx.height < unlock {
        // Not yet final; the pending transfer stays in place.
        auction.transfer = Some(transfer);
        return Err(CovenantError::TransferDelay {
            unlock,
            height: ctx.height,
        });
    }

    auction.owner = ctx.outpoint;
    debug!(
        name = %String::from_utf8_lossy(&auction.name),
        height = ctx.height,
        "Transfer finalized"
    );
    Ok(())
}

fn apply_revoke(
    slot: &mut Option<Auction>,
    ctx: &CovenantContext<'_>,
) -> Result<(), CovenantError> {
    let auction = require_live(slot, "REVOKE")?;
    require_owner(auction, ctx, "REVOKE")?;

    auction.state = AuctionState::Revoked;
    auction.renewal = ctx.height;
    auction.transfer = None;
    auction.owner = Outpoint::NULL;

    debug!(
        name = %String::from_utf8_lossy(&auction.name),
        height = ctx.height,
        "Name revoked"
    );
    Ok(())
}
