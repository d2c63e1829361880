//! Full auction lifecycles driven through the real chain writer.

use crate::generators::*;
use nomen_chain::ChainEvent;
use nomen_primitives::{Covenant, Hash, Outpoint};
use nomen_state::AuctionState;

#[test]
fn test_auction_happy_path() {
    let (chain, _storage) = test_chain();
    let params = chain.params().clone();
    let mut stream = chain.subscribe();

    // Two sealed bids open the auction in one block.
    let (bid_a, nonce_a) = bid_tx(b"hello", 5_000_000, 10_000_000);
    let (bid_b, nonce_b) = bid_tx(b"hello", 3_000_000, 6_000_000);
    mine_and_connect(&chain, vec![bid_a.clone(), bid_b.clone()]);
    let open = chain.height();

    let auction = chain.auction(b"hello").unwrap().unwrap();
    assert_eq!(auction.state, AuctionState::Bidding);
    assert_eq!(auction.height, open);

    // Reveal both bids at the start of the reveal window.
    mine_until(&chain, params.reveal_open(open) - 1);
    let reveal_a = reveal_tx(&bid_a, b"hello", 5_000_000, nonce_a);
    let reveal_b = reveal_tx(&bid_b, b"hello", 3_000_000, nonce_b);
    let winner = Outpoint::new(reveal_a.txid(), 0);
    let loser = Outpoint::new(reveal_b.txid(), 0);
    mine_and_connect(&chain, vec![reveal_a, reveal_b]);

    let auction = chain.auction(b"hello").unwrap().unwrap();
    assert_eq!(auction.state, AuctionState::Reveal);
    assert_eq!(auction.highest, 5_000_000);
    assert_eq!(auction.value, 3_000_000);
    assert_eq!(auction.owner, winner);

    // Past the reveal window the loser redeems and the winner
    // registers at the second-highest price.
    mine_until(&chain, params.reveal_close(open) - 1);
    let redeem = spend_tx(
        loser,
        3_000_000,
        Covenant::Redeem {
            name: b"hello".to_vec(),
        },
    );
    let register = spend_tx(
        winner,
        3_000_000,
        Covenant::Register {
            name: b"hello".to_vec(),
            resource: vec![0xde, 0xad],
            tree_hash: Hash::ZERO,
        },
    );
    mine_and_connect(&chain, vec![redeem, register]);

    let auction = chain.auction(b"hello").unwrap().unwrap();
    assert_eq!(auction.state, AuctionState::Closed);
    assert_eq!(auction.value, 3_000_000);
    assert_eq!(auction.renewal, chain.height());

    // The subscriber saw every connect, in strict height order.
    let mut next_height = 1;
    while let Ok(event) = stream.receiver.try_recv() {
        if let ChainEvent::BlockConnect { entry, .. } = event {
            assert_eq!(entry.height, next_height);
            next_height += 1;
        }
    }
    assert_eq!(next_height, chain.height() + 1);
}

#[test]
fn test_losing_register_rejected() {
    let (chain, _storage) = test_chain();
    let params = chain.params().clone();

    let (bid_a, nonce_a) = bid_tx(b"metal", 5_000_000, 10_000_000);
    let (bid_b, nonce_b) = bid_tx(b"metal", 3_000_000, 6_000_000);
    mine_and_connect(&chain, vec![bid_a.clone(), bid_b.clone()]);
    let open = chain.height();

    mine_until(&chain, params.reveal_open(open) - 1);
    let reveal_a = reveal_tx(&bid_a, b"metal", 5_000_000, nonce_a);
    let reveal_b = reveal_tx(&bid_b, b"metal", 3_000_000, nonce_b);
    let loser = Outpoint::new(reveal_b.txid(), 0);
    mine_and_connect(&chain, vec![reveal_a, reveal_b]);
    mine_until(&chain, params.reveal_close(open) - 1);

    let register = spend_tx(
        loser,
        3_000_000,
        Covenant::Register {
            name: b"metal".to_vec(),
            resource: vec![],
            tree_hash: Hash::ZERO,
        },
    );
    let tip_before = chain.height();
    let bad = mine_with_root(&chain, vec![register], Some(Hash::ZERO));
    assert!(chain.connect(bad).is_err());
    assert_eq!(chain.height(), tip_before, "rejected block must not move the tip");
}

#[test]
fn test_update_renew_transfer_lifecycle() {
    let (chain, _storage) = test_chain();
    let params = chain.params().clone();

    // Single-bid auction: price is the zero reserve.
    let (bid, nonce) = bid_tx(b"drift", 2_000_000, 4_000_000);
    mine_and_connect(&chain, vec![bid.clone()]);
    let open = chain.height();
    mine_until(&chain, params.reveal_open(open) - 1);
    let reveal = reveal_tx(&bid, b"drift", 2_000_000, nonce);
    let winner = Outpoint::new(reveal.txid(), 0);
    mine_and_connect(&chain, vec![reveal]);
    mine_until(&chain, params.reveal_close(open) - 1);
    let register = spend_tx(
        winner,
        0,
        Covenant::Register {
            name: b"drift".to_vec(),
            resource: vec![1],
            tree_hash: Hash::ZERO,
        },
    );
    let register_outpoint = Outpoint::new(register.txid(), 0);
    mine_and_connect(&chain, vec![register]);

    // UPDATE continues the ownership chain.
    let update = spend_tx(
        register_outpoint,
        0,
        Covenant::Update {
            name: b"drift".to_vec(),
            resource: vec![2],
        },
    );
    let update_outpoint = Outpoint::new(update.txid(), 0);
    mine_and_connect(&chain, vec![update]);

    // RENEW anchored to a recent block.
    let anchor = chain.tip().hash;
    let renew = spend_tx(
        update_outpoint,
        0,
        Covenant::Renew {
            name: b"drift".to_vec(),
            block_hash: anchor,
        },
    );
    let renew_outpoint = Outpoint::new(renew.txid(), 0);
    mine_and_connect(&chain, vec![renew]);

    let auction = chain.auction(b"drift").unwrap().unwrap();
    assert_eq!(auction.state, AuctionState::Renewed);
    assert_eq!(auction.renewal, chain.height());

    // TRANSFER, wait out the lockup, FINALIZE.
    let transfer = spend_tx(
        renew_outpoint,
        0,
        Covenant::Transfer {
            name: b"drift".to_vec(),
            address: test_address(0x77),
        },
    );
    let transfer_outpoint = Outpoint::new(transfer.txid(), 0);
    mine_and_connect(&chain, vec![transfer]);
    let transfer_height = chain.height();
    assert!(chain.auction(b"drift").unwrap().unwrap().transfer.is_some());

    mine_until(&chain, transfer_height + params.transfer_lockup - 1);
    let finalize = spend_tx(
        transfer_outpoint,
        0,
        Covenant::Finalize {
            name: b"drift".to_vec(),
        },
    );
    mine_and_connect(&chain, vec![finalize]);

    let auction = chain.auction(b"drift").unwrap().unwrap();
    assert!(auction.transfer.is_none());
}

#[test]
fn test_renew_with_stale_anchor_rejected() {
    let (chain, _storage) = test_chain();
    let params = chain.params().clone();

    let (bid, nonce) = bid_tx(b"stale", 2_000_000, 4_000_000);
    mine_and_connect(&chain, vec![bid.clone()]);
    let open = chain.height();
    let stale_anchor = chain.tip().hash;

    mine_until(&chain, params.reveal_open(open) - 1);
    let reveal = reveal_tx(&bid, b"stale", 2_000_000, nonce);
    let winner = Outpoint::new(reveal.txid(), 0);
    mine_and_connect(&chain, vec![reveal]);
    mine_until(&chain, params.reveal_close(open) - 1);
    let register = spend_tx(
        winner,
        0,
        Covenant::Register {
            name: b"stale".to_vec(),
            resource: vec![],
            tree_hash: Hash::ZERO,
        },
    );
    let register_outpoint = Outpoint::new(register.txid(), 0);
    mine_and_connect(&chain, vec![register]);

    // Push the anchor beyond the renewal window.
    mine_until(&chain, open + params.renewal_anchor_window + 1);

    let renew = spend_tx(
        register_outpoint,
        0,
        Covenant::Renew {
            name: b"stale".to_vec(),
            block_hash: stale_anchor,
        },
    );
    let bad = mine_with_root(&chain, vec![renew], Some(Hash::ZERO));
    assert!(chain.connect(bad).is_err());
}

#[test]
fn test_expired_name_becomes_biddable() {
    let (chain, _storage) = test_chain();
    let params = chain.params().clone();

    let (bid, nonce) = bid_tx(b"candle", 2_000_000, 4_000_000);
    mine_and_connect(&chain, vec![bid.clone()]);
    let open = chain.height();
    mine_until(&chain, params.reveal_open(open) - 1);
    let reveal = reveal_tx(&bid, b"candle", 2_000_000, nonce);
    let winner = Outpoint::new(reveal.txid(), 0);
    mine_and_connect(&chain, vec![reveal]);
    mine_until(&chain, params.reveal_close(open) - 1);
    let register = spend_tx(
        winner,
        0,
        Covenant::Register {
            name: b"candle".to_vec(),
            resource: vec![],
            tree_hash: Hash::ZERO,
        },
    );
    mine_and_connect(&chain, vec![register]);
    let renewal = chain.height();

    // One block short of expiry: the name is still closed.
    mine_until(&chain, renewal + params.expiry_window - 2);
    let (late_bid, _) = bid_tx(b"candle", 1_000_000, 2_000_000);
    let bad = mine_with_root(&chain, vec![late_bid], Some(Hash::ZERO));
    assert!(chain.connect(bad).is_err());
    assert_eq!(chain.height(), renewal + params.expiry_window - 2);

    // At the boundary it decays and is biddable again.
    mine_and_connect(&chain, Vec::new());
    let (fresh_bid, _) = bid_tx(b"candle", 1_000_000, 2_000_000);
    mine_and_connect(&chain, vec![fresh_bid]);

    let auction = chain.auction(b"candle").unwrap().unwrap();
    assert_eq!(auction.state, AuctionState::Bidding);
    assert_eq!(auction.height, renewal + params.expiry_window);
}
