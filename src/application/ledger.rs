//! Ledger service: the calling layer around the pricing and settlement engines.
//!
//! Every operation follows the same shape: load the versioned collections it
//! touches, check business rules, run the pure engine functions, commit all
//! changed collections in one conditional transaction, then publish a change
//! notification. A commit that loses a race is retried against a fresh read
//! up to `max_commit_retries` times.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use tracing::{debug, info};

use super::pricing::{calculate_trade, compute_price, get_chance, Chance, TradeQuote};
use super::settlement::{distribute_rewards, process_claim, Settlement};
use super::store::{Collection, StateStore, Transaction};
use crate::domain::{
    ClaimRecord, Market, MarketId, MarketKind, MarketStatus, Points, Settings, Side, Trade,
    WalletAddress, WalletState,
};
use crate::error::{Error, LedgerError, Result};
use crate::port::outbound::bus::{BusEvent, RealtimeBus};
use crate::port::outbound::price::{fetch_or_fallback, PriceFeed, PriceSnapshot};
use crate::port::outbound::store::Storage;

/// Ledger tuning.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Points credited per faucet claim.
    pub faucet_amount: Decimal,
    /// Minimum time between two faucet claims of one wallet.
    pub faucet_cooldown_secs: u64,
    /// Attempts per operation when commits keep losing races.
    pub max_commit_retries: u32,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            faucet_amount: dec!(1000),
            faucet_cooldown_secs: 24 * 60 * 60,
            max_commit_retries: 3,
        }
    }
}

/// Result of a committed trade.
#[derive(Debug, Clone)]
pub struct TradeReceipt {
    pub trade: Trade,
    pub quote: TradeQuote,
    pub wallet: WalletState,
    /// First-outcome price after the trade.
    pub new_price: Decimal,
}

/// Points-market use cases over a state store and a realtime bus.
pub struct Ledger<S> {
    store: StateStore<S>,
    bus: Arc<dyn RealtimeBus>,
    config: LedgerConfig,
}

impl<S: Storage> Ledger<S> {
    pub fn new(store: StateStore<S>, bus: Arc<dyn RealtimeBus>, config: LedgerConfig) -> Self {
        Self { store, bus, config }
    }

    pub fn store(&self) -> &StateStore<S> {
        &self.store
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Run `op` until it commits without a stale write.
    fn retrying<T>(&self, operation: &'static str, mut op: impl FnMut() -> Result<T>) -> Result<T> {
        let attempts = self.config.max_commit_retries.max(1);
        for attempt in 1..=attempts {
            match op() {
                Err(Error::StaleWrite(e)) => {
                    debug!(operation, attempt, error = %e, "Commit lost a race, retrying");
                }
                other => return other,
            }
        }
        Err(LedgerError::RetriesExhausted { attempts }.into())
    }

    /// All markets.
    pub fn markets(&self) -> Vec<Market> {
        self.store.get_markets()
    }

    /// Look up one market.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::MarketNotFound`] for unknown IDs.
    pub fn market(&self, market_id: &MarketId) -> Result<Market> {
        self.store
            .get_markets()
            .into_iter()
            .find(|m| m.id() == market_id)
            .ok_or_else(|| LedgerError::MarketNotFound(market_id.to_string()).into())
    }

    /// Look up one wallet.
    pub fn wallet(&self, address: &WalletAddress) -> Option<WalletState> {
        self.store
            .get_wallets()
            .into_iter()
            .find(|w| &w.address == address)
    }

    /// Check that `actor` may run administrative operations.
    ///
    /// Everyone may while admin mode is off. With admin mode on, only
    /// allowlisted addresses may.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NotAuthorized`] otherwise.
    pub fn authorize(&self, actor: Option<&WalletAddress>) -> Result<()> {
        let settings = self.store.get_settings();
        if !settings.admin_mode {
            return Ok(());
        }
        match actor {
            Some(address) if settings.can_administer(address) => Ok(()),
            Some(address) => Err(LedgerError::NotAuthorized {
                wallet: address.to_string(),
            }
            .into()),
            None => Err(LedgerError::NotAuthorized {
                wallet: "anonymous".to_string(),
            }
            .into()),
        }
    }

    /// Apply `edit` to the settings and commit them against the version read.
    ///
    /// A concurrent change makes the commit stale; `edit` then runs again on
    /// the fresh settings, so neither change is lost.
    ///
    /// # Errors
    ///
    /// Returns an error from `edit`, or
    /// [`LedgerError::RetriesExhausted`] when every commit lost a race.
    pub fn update_settings(
        &self,
        mut edit: impl FnMut(&mut Settings) -> Result<()>,
    ) -> Result<Settings> {
        let settings = self.retrying("update_settings", || {
            let mut settings = self.store.load_settings();
            edit(&mut settings.value)?;
            self.store.commit(Transaction::new().put(
                Collection::Settings,
                settings.version,
                &settings.value,
            )?)?;
            Ok(settings.value)
        })?;

        info!(admin_mode = settings.admin_mode, "Settings updated");
        Ok(settings)
    }

    /// Claim records issued to `address`, claimed or not.
    pub fn claims_for(&self, address: &WalletAddress) -> Vec<ClaimRecord> {
        self.store
            .get_claims()
            .into_iter()
            .filter(|c| &c.wallet == address)
            .collect()
    }

    /// Create an open market and announce it.
    ///
    /// # Errors
    ///
    /// Returns an error if the store write fails.
    pub fn create_market(
        &self,
        question: &str,
        kind: MarketKind,
        outcomes: Option<(String, String)>,
    ) -> Result<Market> {
        let mut market = Market::new(question, kind);
        if let Some((first, second)) = outcomes {
            market = market.with_outcomes(first, second);
        }

        self.retrying("create_market", || {
            let mut markets = self.store.load_markets();
            markets.value.push(market.clone());
            self.store.commit(Transaction::new().put(
                Collection::Markets,
                markets.version,
                &markets.value,
            )?)
        })?;

        info!(market_id = %market.id(), kind = %kind, question, "Market created");
        self.bus.publish(&BusEvent::MarketCreate {
            market_id: market.id().clone(),
        });
        Ok(market)
    }

    /// Quote an order without committing it.
    ///
    /// # Errors
    ///
    /// Fails for non-positive amounts, unknown markets and foreign sides.
    pub fn quote(&self, market_id: &MarketId, side: Side, amount: Points) -> Result<TradeQuote> {
        ensure_positive(amount)?;
        let market = self.market(market_id)?;
        market.validate_side(side)?;
        let price = compute_price(side, market.stakes(), market.kind());
        Ok(calculate_trade(amount, price))
    }

    /// Current favourite of a market.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::MarketNotFound`] for unknown IDs.
    pub fn chance(&self, market_id: &MarketId) -> Result<Chance> {
        let market = self.market(market_id)?;
        Ok(get_chance(market.stakes(), market.kind()))
    }

    /// Stake `amount` points from `wallet` on `side` of an open market.
    ///
    /// Commits the trade, the market's new stakes and the debited wallet
    /// together, then publishes `TRADE` and `PRICE_UPDATE`.
    ///
    /// # Errors
    ///
    /// Fails for non-positive amounts, unknown or non-open markets, foreign
    /// sides, unknown wallets and insufficient balances.
    pub fn place_trade(
        &self,
        wallet: &WalletAddress,
        market_id: &MarketId,
        side: Side,
        amount: Points,
    ) -> Result<TradeReceipt> {
        ensure_positive(amount)?;

        let receipt = self.retrying("place_trade", || {
            let mut markets = self.store.load_markets();
            let mut trades = self.store.load_trades();
            let mut wallets = self.store.load_wallets();

            let market = find_market(&mut markets.value, market_id)?;
            if !market.is_open() {
                return Err(LedgerError::MarketNotOpen {
                    market_id: market_id.to_string(),
                    status: market.status().to_string(),
                }
                .into());
            }
            market.validate_side(side)?;

            let owner = wallets
                .value
                .iter_mut()
                .find(|w| &w.address == wallet)
                .ok_or_else(|| LedgerError::WalletNotFound(wallet.to_string()))?;

            let price = compute_price(side, market.stakes(), market.kind());
            let quote = calculate_trade(amount, price);
            *owner = owner.debit(amount)?;
            market.record_stake(side, amount)?;

            let [first, _] = market.sides();
            let new_price = compute_price(first, market.stakes(), market.kind());
            let trade = Trade::new(market_id.clone(), wallet.clone(), side, amount, price);
            let debited = owner.clone();
            trades.value.push(trade.clone());

            self.store.commit(
                Transaction::new()
                    .put(Collection::Markets, markets.version, &markets.value)?
                    .put(Collection::Trades, trades.version, &trades.value)?
                    .put(Collection::Wallets, wallets.version, &wallets.value)?,
            )?;

            Ok(TradeReceipt {
                trade,
                quote,
                wallet: debited,
                new_price,
            })
        })?;

        info!(
            market_id = %market_id,
            wallet = %wallet,
            side = %side,
            amount = %amount,
            price = %receipt.trade.price(),
            shares = %receipt.trade.shares(),
            "Trade placed"
        );
        self.bus.publish(&BusEvent::Trade {
            market_id: market_id.clone(),
        });
        self.bus.publish(&BusEvent::PriceUpdate {
            market_id: market_id.clone(),
            price: receipt.new_price,
        });
        Ok(receipt)
    }

    /// Stop trading on a market.
    ///
    /// # Errors
    ///
    /// Fails for unknown markets and markets that are not open.
    pub fn close_market(&self, market_id: &MarketId) -> Result<Market> {
        let market = self.retrying("close_market", || {
            let mut markets = self.store.load_markets();
            let market = find_market(&mut markets.value, market_id)?;
            market.transition(MarketStatus::Closed)?;
            let closed = market.clone();
            self.store.commit(Transaction::new().put(
                Collection::Markets,
                markets.version,
                &markets.value,
            )?)?;
            Ok(closed)
        })?;

        info!(market_id = %market_id, "Market closed");
        Ok(market)
    }

    /// Resolve a market, settle it and persist its claim records.
    ///
    /// # Errors
    ///
    /// Fails for unknown markets, already resolved or cancelled markets and
    /// foreign winners.
    pub fn resolve_market(&self, market_id: &MarketId, winner: Side) -> Result<Settlement> {
        let settlement = self.retrying("resolve_market", || {
            let mut markets = self.store.load_markets();
            let trades = self.store.load_trades();
            let wallets = self.store.load_wallets();
            let mut claims = self.store.load_claims();

            let market = find_market(&mut markets.value, market_id)?;
            market.resolve(winner, Utc::now())?;
            let settlement = distribute_rewards(market, &trades.value, &wallets.value);
            claims.value.extend(settlement.claim_records.iter().cloned());

            let mut tx = Transaction::new()
                .put(Collection::Markets, markets.version, &markets.value)?
                .put(Collection::Claims, claims.version, &claims.value)?;
            if settlement.updated_wallets != wallets.value {
                tx = tx.put(Collection::Wallets, wallets.version, &settlement.updated_wallets)?;
            }
            self.store.commit(tx)?;
            Ok(settlement)
        })?;

        info!(
            market_id = %market_id,
            winner = %winner,
            winner_pool = %settlement.winner_pool,
            burn = %settlement.burn,
            treasury = %settlement.treasury,
            claims = settlement.claim_records.len(),
            "Market resolved"
        );
        self.bus.publish(&BusEvent::Resolve {
            market_id: market_id.clone(),
            winner,
        });
        Ok(settlement)
    }

    /// Cancel a market and issue refund claims for every trade at cost.
    ///
    /// # Errors
    ///
    /// Fails for unknown markets and markets already resolved or cancelled.
    pub fn cancel_market(&self, market_id: &MarketId) -> Result<Vec<ClaimRecord>> {
        let refunds = self.retrying("cancel_market", || {
            let mut markets = self.store.load_markets();
            let trades = self.store.load_trades();
            let mut claims = self.store.load_claims();

            let market = find_market(&mut markets.value, market_id)?;
            market.transition(MarketStatus::Cancelled)?;

            let refunds: Vec<ClaimRecord> = trades
                .value
                .iter()
                .filter(|t| t.market_id() == market_id)
                .map(|t| ClaimRecord {
                    market_id: market_id.clone(),
                    wallet: t.wallet().clone(),
                    trade_id: t.id().clone(),
                    shares: t.shares(),
                    payout: t.amount_pts(),
                    cost_basis: t.amount_pts(),
                    claimed: false,
                })
                .collect();
            claims.value.extend(refunds.iter().cloned());

            self.store.commit(
                Transaction::new()
                    .put(Collection::Markets, markets.version, &markets.value)?
                    .put(Collection::Claims, claims.version, &claims.value)?,
            )?;
            Ok(refunds)
        })?;

        info!(market_id = %market_id, refunds = refunds.len(), "Market cancelled");
        Ok(refunds)
    }

    /// Credit every unclaimed record of `wallet` in `market_id`.
    ///
    /// The wallet credit and the consumed claim flags are committed in one
    /// conditional transaction, so a record is paid at most once even when
    /// several sessions claim concurrently.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NothingToClaim`] when no unclaimed record exists.
    pub fn claim(&self, wallet: &WalletAddress, market_id: &MarketId) -> Result<WalletState> {
        let (credited, paid) = self.retrying("claim", || {
            let mut wallets = self.store.load_wallets();
            let mut claims = self.store.load_claims();

            let owner = wallets
                .value
                .iter_mut()
                .find(|w| &w.address == wallet)
                .ok_or_else(|| LedgerError::WalletNotFound(wallet.to_string()))?;

            let mut paid = Decimal::ZERO;
            let mut count = 0usize;
            for record in claims
                .value
                .iter_mut()
                .filter(|c| c.is_for(wallet, market_id) && !c.claimed)
            {
                let (credited, consumed) = process_claim(owner, record)?;
                *owner = credited;
                paid += consumed.payout;
                *record = consumed;
                count += 1;
            }
            if count == 0 {
                return Err(LedgerError::NothingToClaim {
                    wallet: wallet.to_string(),
                    market_id: market_id.to_string(),
                }
                .into());
            }
            let credited = owner.clone();

            self.store.commit(
                Transaction::new()
                    .put(Collection::Wallets, wallets.version, &wallets.value)?
                    .put(Collection::Claims, claims.version, &claims.value)?,
            )?;
            Ok((credited, paid))
        })?;

        info!(wallet = %wallet, market_id = %market_id, paid = %paid, "Claim processed");
        Ok(credited)
    }

    /// Faucet drip at the current time.
    ///
    /// # Errors
    ///
    /// See [`Ledger::faucet_at`].
    pub fn faucet(&self, wallet: &WalletAddress) -> Result<WalletState> {
        self.faucet_at(wallet, Utc::now())
    }

    /// Credit `faucet_amount` to `wallet`, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::FaucetCooldown`] if the previous claim is more
    /// recent than the cooldown.
    pub fn faucet_at(&self, wallet: &WalletAddress, now: DateTime<Utc>) -> Result<WalletState> {
        let credited = self.retrying("faucet", || {
            let mut wallets = self.store.load_wallets();

            let position = wallets.value.iter().position(|w| &w.address == wallet);
            let current = position.map_or_else(
                || WalletState::new(wallet.clone()),
                |i| wallets.value[i].clone(),
            );

            if let Some(last) = current.last_faucet_claim {
                let available_at = i64::try_from(self.config.faucet_cooldown_secs)
                    .ok()
                    .and_then(Duration::try_seconds)
                    .and_then(|cooldown| last.checked_add_signed(cooldown))
                    .unwrap_or(DateTime::<Utc>::MAX_UTC);
                if now < available_at {
                    return Err(LedgerError::FaucetCooldown {
                        wallet: wallet.to_string(),
                        available_at,
                    }
                    .into());
                }
            }

            let credited = current.credit_faucet(self.config.faucet_amount, now);
            match position {
                Some(i) => wallets.value[i] = credited.clone(),
                None => wallets.value.push(credited.clone()),
            }
            self.store.commit(Transaction::new().put(
                Collection::Wallets,
                wallets.version,
                &wallets.value,
            )?)?;
            Ok(credited)
        })?;

        info!(wallet = %wallet, amount = %self.config.faucet_amount, balance = %credited.points, "Faucet claimed");
        self.bus.publish(&BusEvent::Faucet {
            wallet_id: wallet.clone(),
        });
        Ok(credited)
    }

    /// Reference price of the external source mapped to `market_id` in the
    /// settings, if any. Feed failures yield a zeroed fallback snapshot.
    pub async fn reference_price<F: PriceFeed>(
        &self,
        market_id: &MarketId,
        feed: &F,
    ) -> Option<PriceSnapshot> {
        let settings = self.store.get_settings();
        let source = settings.price_source(market_id.as_str())?;
        Some(fetch_or_fallback(feed, source).await)
    }
}

fn ensure_positive(amount: Points) -> Result<()> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::NonPositiveAmount { amount }.into());
    }
    Ok(())
}

fn find_market<'a>(markets: &'a mut [Market], market_id: &MarketId) -> Result<&'a mut Market> {
    markets
        .iter_mut()
        .find(|m| m.id() == market_id)
        .ok_or_else(|| LedgerError::MarketNotFound(market_id.to_string()).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StaleWriteError;
    use crate::testkit::bus::StaticFeed;
    use crate::testkit::domain::address;
    use crate::testkit::memory_ledger;
    use chrono::TimeZone;
    use std::cell::Cell;

    fn funded(ledger: &Ledger<impl Storage>, who: &str) -> WalletAddress {
        let wallet = address(who);
        ledger.faucet(&wallet).unwrap();
        wallet
    }

    #[test]
    fn create_market_persists_and_announces() {
        let (ledger, bus) = memory_ledger();
        let market = ledger
            .create_market("Will it rain?", MarketKind::YesNo, None)
            .unwrap();

        assert_eq!(ledger.markets(), vec![market.clone()]);
        assert_eq!(
            bus.published(),
            vec![BusEvent::MarketCreate {
                market_id: market.id().clone()
            }]
        );
    }

    #[test]
    fn trade_moves_price_and_debits_wallet() {
        let (ledger, bus) = memory_ledger();
        let alice = funded(&ledger, "alice");
        let market = ledger.create_market("Q?", MarketKind::YesNo, None).unwrap();

        let receipt = ledger
            .place_trade(&alice, market.id(), Side::Yes, dec!(100))
            .unwrap();

        assert_eq!(receipt.trade.price(), dec!(0.5));
        assert_eq!(receipt.trade.shares(), dec!(200));
        assert_eq!(receipt.wallet.points, dec!(900));
        assert!(receipt.new_price > dec!(0.5));

        let stored = ledger.market(market.id()).unwrap();
        assert_eq!(stored.stakes().yes_stake, dec!(100));
        assert_eq!(stored.pool_usd(), dec!(100));
        assert_eq!(ledger.store().get_trades().len(), 1);
        assert_eq!(
            bus.kinds(),
            vec!["FAUCET", "MARKET_CREATE", "TRADE", "PRICE_UPDATE"]
        );
    }

    #[test]
    fn trade_is_rejected_without_side_effects() {
        let (ledger, _bus) = memory_ledger();
        let alice = funded(&ledger, "alice");
        let market = ledger.create_market("Q?", MarketKind::YesNo, None).unwrap();

        let err = ledger
            .place_trade(&alice, market.id(), Side::Yes, dec!(5000))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Domain(crate::domain::DomainError::InsufficientPoints { .. })
        ));

        let err = ledger
            .place_trade(&alice, market.id(), Side::A, dec!(10))
            .unwrap_err();
        assert!(matches!(err, Error::Domain(_)));

        let err = ledger
            .place_trade(&alice, market.id(), Side::Yes, dec!(0))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Ledger(LedgerError::NonPositiveAmount { .. })
        ));

        assert!(ledger.store().get_trades().is_empty());
        assert_eq!(ledger.wallet(&alice).unwrap().points, dec!(1000));
    }

    #[test]
    fn closed_market_rejects_trades() {
        let (ledger, _bus) = memory_ledger();
        let alice = funded(&ledger, "alice");
        let market = ledger.create_market("Q?", MarketKind::YesNo, None).unwrap();
        ledger.close_market(market.id()).unwrap();

        let err = ledger
            .place_trade(&alice, market.id(), Side::No, dec!(10))
            .unwrap_err();
        assert!(matches!(err, Error::Ledger(LedgerError::MarketNotOpen { .. })));
    }

    #[test]
    fn resolve_then_claim_pays_winner_once() {
        let (ledger, bus) = memory_ledger();
        let alice = funded(&ledger, "alice");
        let bob = funded(&ledger, "bob");
        let market = ledger.create_market("Q?", MarketKind::YesNo, None).unwrap();

        ledger
            .place_trade(&alice, market.id(), Side::Yes, dec!(300))
            .unwrap();
        ledger
            .place_trade(&bob, market.id(), Side::No, dec!(100))
            .unwrap();

        let settlement = ledger.resolve_market(market.id(), Side::Yes).unwrap();
        assert_eq!(settlement.winner_pool, dec!(320));
        assert_eq!(settlement.claim_records.len(), 1);
        assert_eq!(bus.kinds().last(), Some(&"RESOLVE"));

        let credited = ledger.claim(&alice, market.id()).unwrap();
        assert_eq!(credited.points, dec!(700) + dec!(320));
        assert_eq!(credited.pnl_realized, dec!(20));

        let err = ledger.claim(&alice, market.id()).unwrap_err();
        assert!(matches!(err, Error::Ledger(LedgerError::NothingToClaim { .. })));
        assert_eq!(ledger.wallet(&alice).unwrap().points, dec!(1020));

        let err = ledger.claim(&bob, market.id()).unwrap_err();
        assert!(matches!(err, Error::Ledger(LedgerError::NothingToClaim { .. })));
    }

    #[test]
    fn resolving_twice_fails() {
        let (ledger, _bus) = memory_ledger();
        let market = ledger.create_market("Q?", MarketKind::AVsB, None).unwrap();
        ledger.resolve_market(market.id(), Side::A).unwrap();

        let err = ledger.resolve_market(market.id(), Side::B).unwrap_err();
        assert!(matches!(err, Error::Domain(_)));
        assert_eq!(ledger.market(market.id()).unwrap().winner(), Some(Side::A));
    }

    #[test]
    fn cancel_refunds_cost_basis() {
        let (ledger, _bus) = memory_ledger();
        let alice = funded(&ledger, "alice");
        let market = ledger.create_market("Q?", MarketKind::AVsB, None).unwrap();
        ledger
            .place_trade(&alice, market.id(), Side::B, dec!(250))
            .unwrap();

        let refunds = ledger.cancel_market(market.id()).unwrap();
        assert_eq!(refunds.len(), 1);
        assert_eq!(refunds[0].payout, dec!(250));

        let credited = ledger.claim(&alice, market.id()).unwrap();
        assert_eq!(credited.points, dec!(1000));
        assert_eq!(credited.pnl_realized, Decimal::ZERO);
        assert!(ledger.claims_for(&alice).iter().all(|c| c.claimed));
    }

    #[test]
    fn faucet_respects_cooldown() {
        let (ledger, _bus) = memory_ledger();
        let alice = address("alice");
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        ledger.faucet_at(&alice, start).unwrap();
        let err = ledger
            .faucet_at(&alice, start + Duration::minutes(30))
            .unwrap_err();
        match err {
            Error::Ledger(LedgerError::FaucetCooldown { available_at, .. }) => {
                assert_eq!(available_at, start + Duration::hours(1));
            }
            other => panic!("unexpected error: {other}"),
        }

        let wallet = ledger
            .faucet_at(&alice, start + Duration::hours(1))
            .unwrap();
        assert_eq!(wallet.points, dec!(2000));
    }

    #[test]
    fn quote_and_chance_follow_the_curve() {
        let (ledger, _bus) = memory_ledger();
        let alice = funded(&ledger, "alice");
        let market = ledger.create_market("Q?", MarketKind::YesNo, None).unwrap();

        let quote = ledger.quote(market.id(), Side::Yes, dec!(50)).unwrap();
        assert_eq!(quote.avg_price, dec!(0.5));
        assert_eq!(quote.shares, dec!(100));

        ledger
            .place_trade(&alice, market.id(), Side::Yes, dec!(100))
            .unwrap();
        let chance = ledger.chance(market.id()).unwrap();
        assert_eq!(chance.side, Side::Yes);
    }

    #[test]
    fn retrying_gives_up_after_configured_attempts() {
        let (ledger, _bus) = memory_ledger();
        let calls = Cell::new(0u32);

        let result: Result<()> = ledger.retrying("test", || {
            calls.set(calls.get() + 1);
            Err(StaleWriteError {
                collection: "markets".into(),
                expected: 0,
                actual: 1,
            }
            .into())
        });

        assert!(matches!(
            result,
            Err(Error::Ledger(LedgerError::RetriesExhausted { attempts: 3 }))
        ));
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn admin_mode_restricts_to_allowlist() {
        let (ledger, _bus) = memory_ledger();
        let admin = address("0xadmin");
        let guest = address("0xguest");
        assert!(ledger.authorize(None).is_ok());

        let mut settings = ledger.store().get_settings();
        settings.admin_mode = true;
        settings.allowlist.insert(admin.clone());
        ledger.store().set_settings(&settings).unwrap();

        assert!(ledger.authorize(Some(&admin)).is_ok());
        assert!(matches!(
            ledger.authorize(Some(&guest)),
            Err(Error::Ledger(LedgerError::NotAuthorized { .. }))
        ));
        assert!(ledger.authorize(None).is_err());
    }

    #[test]
    fn settings_update_keeps_a_concurrent_edit() {
        let (ledger, _bus) = memory_ledger();
        let other = address("0xother");
        let mine = address("0xmine");
        let calls = Cell::new(0u32);

        let settings = ledger
            .update_settings(|settings| {
                calls.set(calls.get() + 1);
                if calls.get() == 1 {
                    let mut theirs = ledger.store().get_settings();
                    theirs.allowlist.insert(other.clone());
                    ledger.store().set_settings(&theirs)?;
                }
                settings.allowlist.insert(mine.clone());
                Ok(())
            })
            .unwrap();

        assert_eq!(calls.get(), 2);
        assert!(settings.allowlist.contains(&other));
        assert!(settings.allowlist.contains(&mine));
        assert_eq!(ledger.store().get_settings(), settings);
    }

    #[test]
    fn settings_edit_errors_are_not_retried() {
        let (ledger, _bus) = memory_ledger();
        let calls = Cell::new(0u32);

        let result = ledger.update_settings(|_| {
            calls.set(calls.get() + 1);
            Err(LedgerError::NotAuthorized {
                wallet: "0xnobody".into(),
            }
            .into())
        });

        assert!(result.is_err());
        assert_eq!(calls.get(), 1);
        assert_eq!(ledger.store().load_settings().version, 0);
    }

    #[test]
    fn unknown_market_is_reported() {
        let (ledger, _bus) = memory_ledger();
        let err = ledger.chance(&MarketId::new("missing")).unwrap_err();
        assert!(matches!(err, Error::Ledger(LedgerError::MarketNotFound(_))));
    }

    #[tokio::test]
    async fn reference_price_uses_mapped_source() {
        let (ledger, _bus) = memory_ledger();
        let market = ledger.create_market("Q?", MarketKind::YesNo, None).unwrap();
        let mut settings = ledger.store().get_settings();
        settings
            .mappings
            .insert(market.id().to_string(), "bitcoin".to_string());
        ledger.store().set_settings(&settings).unwrap();

        let snapshot = PriceSnapshot {
            price_usd: dec!(65000),
            ..PriceSnapshot::fallback()
        };
        let feed = StaticFeed::default().with("bitcoin", PriceSnapshot {
            source: "coingecko".into(),
            ..snapshot
        });

        let price = ledger.reference_price(market.id(), &feed).await.unwrap();
        assert_eq!(price.price_usd, dec!(65000));
        assert!(!price.is_fallback());

        let empty = StaticFeed::default();
        let fallback = ledger.reference_price(market.id(), &empty).await.unwrap();
        assert!(fallback.is_fallback());

        let other = ledger.create_market("Other?", MarketKind::YesNo, None).unwrap();
        assert!(ledger.reference_price(other.id(), &feed).await.is_none());
    }
}
