//! Rescans, Bloom filtering, and mempool transaction events.

use crate::generators::*;
use nomen_chain::{BloomFilter, ChainClient, ChainEvent, RescanHandle};
use std::sync::Arc;

#[test]
fn test_rescan_without_filter_matches_everything() {
    let (chain, _storage) = test_chain();
    let (bid, _) = bid_tx(b"hello", 2_000_000, 4_000_000);
    mine_and_connect(&chain, vec![bid]);
    mine_and_connect(&chain, Vec::new());

    let (client, mut stream) = ChainClient::attach(Arc::clone(&chain));
    client.rescan(0, &RescanHandle::new()).unwrap();

    let mut heights = Vec::new();
    while let Ok(event) = stream.receiver.try_recv() {
        if let ChainEvent::BlockRescan { entry, txs } = event {
            // No filter installed: every transaction comes through.
            let block = chain.block(&entry.hash).unwrap().unwrap();
            assert_eq!(txs.len(), block.txs.len());
            heights.push(entry.height);
        }
    }
    assert_eq!(heights, vec![0, 1, 2]);
}

#[test]
fn test_rescan_filters_by_name() {
    let (chain, _storage) = test_chain();
    let (bid, _) = bid_tx(b"hello", 2_000_000, 4_000_000);
    let bid_txid = bid.txid();
    mine_and_connect(&chain, vec![bid]);
    mine_and_connect(&chain, Vec::new());

    let (client, mut stream) = ChainClient::attach(Arc::clone(&chain));
    let mut filter = BloomFilter::default_size();
    filter.insert(b"hello");
    client.set_filter(filter);
    client.rescan(1, &RescanHandle::new()).unwrap();

    let mut matched = Vec::new();
    while let Ok(event) = stream.receiver.try_recv() {
        if let ChainEvent::BlockRescan { entry, txs } = event {
            matched.push((entry.height, txs));
        }
    }
    assert_eq!(matched.len(), 2);
    // The bid block delivers exactly the bid; the empty block nothing.
    assert_eq!(matched[0].0, 1);
    assert_eq!(matched[0].1.len(), 1);
    assert_eq!(matched[0].1[0].txid(), bid_txid);
    assert_eq!(matched[1].0, 2);
    assert!(matched[1].1.is_empty());

    // Clearing the filter goes back to match-everything.
    client.clear_filter();
    client.rescan(2, &RescanHandle::new()).unwrap();
    match stream.receiver.try_recv().unwrap() {
        ChainEvent::BlockRescan { txs, .. } => assert_eq!(txs.len(), 1),
        other => panic!("unexpected event {other:?}"),
    }
}

#[test]
fn test_cancelled_rescan_emits_reset() {
    let (chain, _storage) = test_chain();
    mine_and_connect(&chain, Vec::new());

    let (client, mut stream) = ChainClient::attach(Arc::clone(&chain));
    let handle = RescanHandle::new();
    handle.cancel();
    client.rescan(0, &handle).unwrap();

    match stream.receiver.try_recv().unwrap() {
        ChainEvent::ChainReset { tip } => assert_eq!(tip.height, chain.height()),
        other => panic!("expected reset, got {other:?}"),
    }
    assert!(stream.receiver.try_recv().is_err());
}

#[test]
fn test_tx_events_flow_to_subscribers() {
    let (chain, _storage) = test_chain();
    let mut stream = chain.subscribe();

    let (tx, _) = bid_tx(b"loose", 1_000_000, 2_000_000);
    chain.notify_tx(tx.clone());

    match stream.receiver.try_recv().unwrap() {
        ChainEvent::Tx { tx: seen } => assert_eq!(seen.txid(), tx.txid()),
        other => panic!("expected tx event, got {other:?}"),
    }
}

#[test]
fn test_detached_client_receives_nothing() {
    let (chain, _storage) = test_chain();
    let (client, mut stream) = ChainClient::attach(Arc::clone(&chain));
    client.close();

    mine_and_connect(&chain, Vec::new());
    assert!(stream.receiver.try_recv().is_err());
}
