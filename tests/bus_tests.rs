//! Cross-session notifications driven by ledger operations.

mod support;

use std::sync::Arc;
use std::time::Duration;

use pointbook::adapter::outbound::bus::{BroadcastBus, BroadcastHub};
use pointbook::adapter::outbound::storage::MemoryStorage;
use pointbook::application::{Ledger, LedgerConfig, StateStore};
use pointbook::domain::{MarketKind, Side, WalletAddress};
use pointbook::port::{BusEvent, RealtimeBus};
use rust_decimal_macros::dec;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::timeout;

use support::session::{collect, fallback_ledger};

async fn next(rx: &mut UnboundedReceiver<BusEvent>) -> BusEvent {
    timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("event within timeout")
        .expect("bus still open")
}

async fn assert_quiet(rx: &mut UnboundedReceiver<BusEvent>) {
    let extra = timeout(Duration::from_millis(100), rx.recv()).await;
    assert!(!matches!(extra, Ok(Some(_))), "unexpected event: {extra:?}");
}

#[tokio::test]
async fn broadcast_peers_see_trades_in_order() {
    let hub = BroadcastHub::default();
    let storage = MemoryStorage::new();
    let publisher_bus = Arc::new(BroadcastBus::connect(&hub, "markets"));
    let ledger = Ledger::new(
        StateStore::new(storage.session()),
        publisher_bus.clone(),
        LedgerConfig::default(),
    );

    let peer = BroadcastBus::connect(&hub, "markets");
    let (_peer_sub, mut peer_rx) = collect(&peer);
    let (_own_sub, mut own_rx) = collect(publisher_bus.as_ref());

    let alice = WalletAddress::new("alice");
    ledger.faucet(&alice).unwrap();
    let market = ledger.create_market("Q?", MarketKind::YesNo, None).unwrap();
    ledger.place_trade(&alice, market.id(), Side::Yes, dec!(100)).unwrap();

    assert_eq!(next(&mut peer_rx).await, BusEvent::Faucet { wallet_id: alice });
    assert_eq!(
        next(&mut peer_rx).await,
        BusEvent::MarketCreate {
            market_id: market.id().clone()
        }
    );
    assert_eq!(
        next(&mut peer_rx).await,
        BusEvent::Trade {
            market_id: market.id().clone()
        }
    );
    match next(&mut peer_rx).await {
        BusEvent::PriceUpdate { market_id, price } => {
            assert_eq!(&market_id, market.id());
            assert!(price > dec!(0.5));
        }
        other => panic!("expected a price update, got {other:?}"),
    }

    assert_quiet(&mut own_rx).await;
}

#[tokio::test]
async fn fallback_peers_see_resolution_and_reread_state() {
    let storage = MemoryStorage::new();
    let (writer, _writer_bus) = fallback_ledger(&storage);
    let (reader, reader_bus) = fallback_ledger(&storage);
    let (_sub, mut rx) = collect(reader_bus.as_ref());

    let alice = WalletAddress::new("alice");
    writer.faucet(&alice).unwrap();
    let market = writer.create_market("Q?", MarketKind::AVsB, None).unwrap();
    writer.place_trade(&alice, market.id(), Side::B, dec!(40)).unwrap();
    writer.resolve_market(market.id(), Side::B).unwrap();

    let mut kinds = Vec::new();
    loop {
        let event = next(&mut rx).await;
        kinds.push(event.kind());
        if let BusEvent::Resolve { market_id, winner } = event {
            assert_eq!(&market_id, market.id());
            assert_eq!(winner, Side::B);
            break;
        }
    }
    assert_eq!(
        kinds,
        vec!["FAUCET", "MARKET_CREATE", "TRADE", "PRICE_UPDATE", "RESOLVE"]
    );

    // The notification carries no state; the peer re-reads it.
    let seen = reader.market(market.id()).unwrap();
    assert_eq!(seen.winner(), Some(Side::B));
    assert_eq!(reader.claims_for(&alice).len(), 1);
}

#[tokio::test]
async fn publishing_session_does_not_hear_itself_on_the_fallback_bus() {
    let storage = MemoryStorage::new();
    let (ledger, bus) = fallback_ledger(&storage);
    let (_sub, mut rx) = collect(bus.as_ref());

    ledger.faucet(&WalletAddress::new("alice")).unwrap();

    assert_quiet(&mut rx).await;
}

#[tokio::test]
async fn closed_bus_stops_delivery() {
    let hub = BroadcastHub::default();
    let publisher = BroadcastBus::connect(&hub, "c");
    let peer = BroadcastBus::connect(&hub, "c");
    let (_sub, mut rx) = collect(&peer);

    peer.close();
    publisher.publish(&BusEvent::Faucet {
        wallet_id: WalletAddress::new("x"),
    });

    assert_quiet(&mut rx).await;
}
