//! Trading and wallet handlers: `trade`, `claim`, `faucet`, `wallet`.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde_json::json;
use tabled::Tabled;

use super::command::{ClaimArgs, TradeArgs};
use super::output;
use crate::application::ledger::Ledger;
use crate::domain::{ClaimRecord, MarketId, WalletAddress};
use crate::error::Result;
use crate::port::outbound::store::Storage;

type CliLedger = Ledger<Arc<dyn Storage>>;

#[derive(Tabled)]
struct ClaimRow {
    #[tabled(rename = "Market")]
    market: String,
    #[tabled(rename = "Trade")]
    trade: String,
    #[tabled(rename = "Shares")]
    shares: String,
    #[tabled(rename = "Payout")]
    payout: String,
    #[tabled(rename = "Claimed")]
    claimed: bool,
}

impl From<&ClaimRecord> for ClaimRow {
    fn from(claim: &ClaimRecord) -> Self {
        Self {
            market: claim.market_id.to_string(),
            trade: claim.trade_id.to_string(),
            shares: claim.shares.round_dp(4).to_string(),
            payout: claim.payout.round_dp(4).to_string(),
            claimed: claim.claimed,
        }
    }
}

fn signed(value: Decimal) -> String {
    if value < Decimal::ZERO {
        output::negative(value.round_dp(4))
    } else {
        output::positive(value.round_dp(4))
    }
}

/// Place a trade.
pub fn trade(ledger: &CliLedger, args: TradeArgs) -> Result<()> {
    let wallet = WalletAddress::new(&args.wallet);
    let market_id = MarketId::new(args.market_id);
    let receipt = ledger.place_trade(&wallet, &market_id, args.side, args.amount)?;

    if output::is_json() {
        output::json_output(json!({
            "command": "trade",
            "trade": receipt.trade,
            "balance": receipt.wallet.points,
            "newPrice": receipt.new_price,
        }));
        return Ok(());
    }
    output::success(&format!(
        "Bought {} shares of {} at {}",
        receipt.trade.shares().round_dp(4),
        output::side(receipt.trade.side()),
        receipt.trade.price().round_dp(4)
    ));
    output::field("Max payout", output::positive(receipt.quote.max_payout.round_dp(4)));
    output::field("Balance", receipt.wallet.points.normalize());
    output::field("New price", receipt.new_price.round_dp(4));
    Ok(())
}

/// Claim payouts or refunds.
pub fn claim(ledger: &CliLedger, args: ClaimArgs) -> Result<()> {
    let wallet = WalletAddress::new(&args.wallet);
    let market_id = MarketId::new(args.market_id);
    let before = ledger.wallet(&wallet).map_or(Decimal::ZERO, |w| w.points);
    let credited = ledger.claim(&wallet, &market_id)?;
    let paid = credited.points - before;

    if output::is_json() {
        output::json_output(json!({
            "command": "claim",
            "marketId": market_id,
            "paid": paid,
            "wallet": credited,
        }));
        return Ok(());
    }
    output::success(&format!("Claimed {} points", output::positive(paid.round_dp(4))));
    output::field("Balance", credited.points.round_dp(4));
    output::field("Realized PnL", signed(credited.pnl_realized));
    Ok(())
}

/// Claim faucet points.
pub fn faucet(ledger: &CliLedger, address: &str) -> Result<()> {
    let wallet = ledger.faucet(&WalletAddress::new(address))?;

    if output::is_json() {
        output::json_output(json!({ "command": "faucet", "wallet": wallet }));
        return Ok(());
    }
    output::success(&format!(
        "Credited {} points to {}",
        ledger.config().faucet_amount.normalize(),
        output::highlight(&wallet.address)
    ));
    output::field("Balance", wallet.points.round_dp(4));
    Ok(())
}

/// Show a wallet with its claims.
pub fn show(ledger: &CliLedger, address: &str) -> Result<()> {
    let address = WalletAddress::new(address);
    let Some(wallet) = ledger.wallet(&address) else {
        if output::is_json() {
            output::json_output(json!({ "command": "wallet", "wallet": null, "claims": [] }));
        } else {
            output::warning(&format!("No wallet {address}"));
            output::hint(&format!(
                "create one with {}",
                output::highlight(format!("pointbook faucet {address}"))
            ));
        }
        return Ok(());
    };
    let claims = ledger.claims_for(&address);

    if output::is_json() {
        output::json_output(json!({ "command": "wallet", "wallet": wallet, "claims": claims }));
        return Ok(());
    }
    output::section(&format!("Wallet {}", wallet.address));
    output::field("Points", wallet.points.round_dp(4));
    output::field("Realized PnL", signed(wallet.pnl_realized));
    if let Some(at) = wallet.last_faucet_claim {
        output::field("Last faucet", output::muted(at.to_rfc3339()));
    }
    output::table("claims", claims.iter().map(ClaimRow::from).collect());
    Ok(())
}
