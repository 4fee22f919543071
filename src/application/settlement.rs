//! Post-resolution reward distribution and claim processing.
//!
//! The pool of a resolved market is split 80/10/10 into the winner pool, a
//! burn share and a treasury share. Winners split the winner pool pro rata
//! to their shares and receive one unclaimed [`ClaimRecord`] per winning
//! trade. Burn and treasury are reported but not credited anywhere.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::debug;

use crate::domain::{ClaimRecord, DomainError, Market, Points, Trade, WalletState};

/// Share of the pool paid to winners.
pub const WINNER_SHARE: Decimal = dec!(0.8);
/// Share of the pool earmarked for burning.
pub const BURN_SHARE: Decimal = dec!(0.1);
/// Share of the pool earmarked for the treasury.
pub const TREASURY_SHARE: Decimal = dec!(0.1);

/// Result of settling one market.
#[derive(Debug, Clone, PartialEq)]
pub struct Settlement {
    /// Wallets after settlement. Payouts are credited on claim, so these are
    /// returned as given.
    pub updated_wallets: Vec<WalletState>,
    /// One unclaimed record per winning trade.
    pub claim_records: Vec<ClaimRecord>,
    pub winner_pool: Points,
    pub burn: Points,
    pub treasury: Points,
}

impl Settlement {
    fn unchanged(wallets: &[WalletState]) -> Self {
        Self {
            updated_wallets: wallets.to_vec(),
            claim_records: Vec::new(),
            winner_pool: Decimal::ZERO,
            burn: Decimal::ZERO,
            treasury: Decimal::ZERO,
        }
    }

    /// Sum of all claim payouts.
    #[must_use]
    pub fn total_payout(&self) -> Points {
        self.claim_records.iter().map(|c| c.payout).sum()
    }
}

/// Compute payouts for a resolved market.
///
/// Returns the wallets unchanged and no claim records when the market has no
/// resolution. When nobody backed the winning side every record pays zero;
/// since there are no winning trades that means no records at all.
#[must_use]
pub fn distribute_rewards(
    market: &Market,
    trades: &[Trade],
    wallets: &[WalletState],
) -> Settlement {
    let Some(winner) = market.winner() else {
        return Settlement::unchanged(wallets);
    };

    let pool = market.pool_usd();
    let winner_pool = pool * WINNER_SHARE;

    let winning: Vec<&Trade> = trades
        .iter()
        .filter(|t| t.market_id() == market.id() && t.side() == winner)
        .collect();
    let total_winner_shares: Points = winning.iter().map(|t| t.shares()).sum();

    let claim_records = winning
        .into_iter()
        .map(|trade| {
            let payout = if total_winner_shares > Decimal::ZERO {
                trade.shares() / total_winner_shares * winner_pool
            } else {
                Decimal::ZERO
            };
            ClaimRecord {
                market_id: market.id().clone(),
                wallet: trade.wallet().clone(),
                trade_id: trade.id().clone(),
                shares: trade.shares(),
                payout,
                cost_basis: trade.amount_pts(),
                claimed: false,
            }
        })
        .collect::<Vec<_>>();

    debug!(
        market_id = %market.id(),
        winner = %winner,
        pool = %pool,
        winners = claim_records.len(),
        total_winner_shares = %total_winner_shares,
        "Rewards distributed"
    );

    Settlement {
        updated_wallets: wallets.to_vec(),
        claim_records,
        winner_pool,
        burn: pool * BURN_SHARE,
        treasury: pool * TREASURY_SHARE,
    }
}

/// Credit a claim to its wallet and consume the record.
///
/// Returns the credited wallet and the record marked claimed. Callers must
/// persist both together.
///
/// # Errors
///
/// - [`DomainError::ClaimAlreadyProcessed`] if the record was already consumed
/// - [`DomainError::ClaimWalletMismatch`] if the record belongs to another wallet
pub fn process_claim(
    wallet: &WalletState,
    claim: &ClaimRecord,
) -> Result<(WalletState, ClaimRecord), DomainError> {
    if claim.claimed {
        return Err(DomainError::ClaimAlreadyProcessed {
            trade_id: claim.trade_id.to_string(),
        });
    }
    if claim.wallet != wallet.address {
        return Err(DomainError::ClaimWalletMismatch {
            expected: claim.wallet.clone(),
            actual: wallet.address.clone(),
        });
    }

    let credited = wallet.credit_payout(claim.payout, claim.cost_basis);
    let consumed = ClaimRecord {
        claimed: true,
        ..claim.clone()
    };
    Ok((credited, consumed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MarketKind, Side, WalletAddress};
    use chrono::Utc;

    fn close(a: Decimal, b: Decimal) -> bool {
        (a - b).abs() < dec!(0.000000001)
    }

    fn trade(market: &Market, wallet: &str, side: Side, amount: Decimal, price: Decimal) -> Trade {
        Trade::new(
            market.id().clone(),
            WalletAddress::new(wallet),
            side,
            amount,
            price,
        )
    }

    #[test]
    fn unresolved_market_is_a_no_op() {
        let mut market = Market::new("Q?", MarketKind::YesNo);
        market.record_stake(Side::Yes, dec!(100)).unwrap();
        let trades = vec![trade(&market, "0xa", Side::Yes, dec!(100), dec!(0.5))];
        let wallets = vec![WalletState::with_points(WalletAddress::new("0xa"), dec!(5))];

        let settlement = distribute_rewards(&market, &trades, &wallets);
        assert_eq!(settlement.updated_wallets, wallets);
        assert!(settlement.claim_records.is_empty());
    }

    #[test]
    fn single_winner_takes_winner_pool() {
        let mut market = Market::new("Q?", MarketKind::YesNo);
        market.record_stake(Side::Yes, dec!(1000)).unwrap();
        market.resolve(Side::Yes, Utc::now()).unwrap();
        let trades = vec![trade(&market, "0xa", Side::Yes, dec!(75), dec!(0.5))];

        let settlement = distribute_rewards(&market, &trades, &[]);
        assert_eq!(settlement.claim_records.len(), 1);
        assert_eq!(settlement.claim_records[0].shares, dec!(150));
        assert_eq!(settlement.claim_records[0].payout, dec!(800));
        assert_eq!(settlement.burn, dec!(100));
        assert_eq!(settlement.treasury, dec!(100));
        assert!(!settlement.claim_records[0].claimed);
    }

    #[test]
    fn payouts_sum_to_winner_pool() {
        let mut market = Market::new("Q?", MarketKind::AVsB);
        market.record_stake(Side::A, dec!(700)).unwrap();
        market.record_stake(Side::B, dec!(333)).unwrap();
        market.resolve(Side::B, Utc::now()).unwrap();
        let trades = vec![
            trade(&market, "0xa", Side::A, dec!(700), dec!(0.5)),
            trade(&market, "0xb", Side::B, dec!(100), dec!(0.3)),
            trade(&market, "0xc", Side::B, dec!(200), dec!(0.41)),
            trade(&market, "0xd", Side::B, dec!(33), dec!(0.47)),
        ];

        let settlement = distribute_rewards(&market, &trades, &[]);
        assert_eq!(settlement.claim_records.len(), 3);
        assert!(settlement
            .claim_records
            .iter()
            .all(|c| c.wallet != WalletAddress::new("0xa")));
        assert!(close(settlement.total_payout(), dec!(0.8) * dec!(1033)));
    }

    #[test]
    fn no_winning_trades_pays_nothing() {
        let mut market = Market::new("Q?", MarketKind::YesNo);
        market.record_stake(Side::No, dec!(50)).unwrap();
        market.resolve(Side::Yes, Utc::now()).unwrap();
        let trades = vec![trade(&market, "0xa", Side::No, dec!(50), dec!(0.5))];

        let settlement = distribute_rewards(&market, &trades, &[]);
        assert!(settlement.claim_records.is_empty());
        assert_eq!(settlement.total_payout(), Decimal::ZERO);
    }

    #[test]
    fn trades_of_other_markets_are_ignored() {
        let mut market = Market::new("Q?", MarketKind::YesNo);
        market.record_stake(Side::Yes, dec!(10)).unwrap();
        market.resolve(Side::Yes, Utc::now()).unwrap();
        let other = Market::new("Other?", MarketKind::YesNo);
        let trades = vec![
            trade(&market, "0xa", Side::Yes, dec!(10), dec!(0.5)),
            trade(&other, "0xb", Side::Yes, dec!(10), dec!(0.5)),
        ];

        let settlement = distribute_rewards(&market, &trades, &[]);
        assert_eq!(settlement.claim_records.len(), 1);
        assert_eq!(settlement.claim_records[0].payout, dec!(8));
    }

    #[test]
    fn claim_credits_wallet_and_realizes_pnl() {
        let wallet = WalletState::with_points(WalletAddress::new("0xa"), dec!(0));
        let claim = ClaimRecord {
            market_id: "m1".into(),
            wallet: WalletAddress::new("0xa"),
            trade_id: "t1".into(),
            shares: dec!(150),
            payout: dec!(800),
            cost_basis: dec!(100),
            claimed: false,
        };

        let (wallet, claim) = process_claim(&wallet, &claim).unwrap();
        assert_eq!(wallet.points, dec!(800));
        assert_eq!(wallet.pnl_realized, dec!(700));
        assert!(claim.claimed);
    }

    #[test]
    fn claim_is_applied_only_once() {
        let fresh = WalletState::with_points(WalletAddress::new("0xa"), dec!(0));
        let claim = ClaimRecord {
            market_id: "m1".into(),
            wallet: WalletAddress::new("0xa"),
            trade_id: "t1".into(),
            shares: dec!(10),
            payout: dec!(10),
            cost_basis: dec!(5),
            claimed: false,
        };

        let (_, consumed) = process_claim(&fresh, &claim).unwrap();
        let second = process_claim(&fresh, &consumed);
        assert!(matches!(
            second,
            Err(DomainError::ClaimAlreadyProcessed { .. })
        ));
    }

    #[test]
    fn claim_rejects_foreign_wallet() {
        let wallet = WalletState::new(WalletAddress::new("0xb"));
        let claim = ClaimRecord {
            market_id: "m1".into(),
            wallet: WalletAddress::new("0xa"),
            trade_id: "t1".into(),
            shares: dec!(1),
            payout: dec!(1),
            cost_basis: dec!(1),
            claimed: false,
        };
        assert!(matches!(
            process_claim(&wallet, &claim),
            Err(DomainError::ClaimWalletMismatch { .. })
        ));
    }
}
