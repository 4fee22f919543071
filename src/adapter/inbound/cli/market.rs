//! `pointbook market` handlers.

use std::sync::Arc;

use serde_json::json;
use tabled::Tabled;

use super::command::{AdminMarketArgs, MarketCreateArgs, QuoteArgs, ResolveArgs};
use super::output;
use crate::application::ledger::Ledger;
use crate::application::pricing::compute_price;
use crate::domain::{Market, MarketId};
use crate::error::Result;
use crate::port::outbound::store::Storage;

type CliLedger = Ledger<Arc<dyn Storage>>;

#[derive(Tabled)]
struct MarketRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Question")]
    question: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Price")]
    price: String,
    #[tabled(rename = "Pool")]
    pool: String,
}

impl From<&Market> for MarketRow {
    fn from(market: &Market) -> Self {
        let [first, second] = market.sides();
        let price = compute_price(first, market.stakes(), market.kind());
        Self {
            id: market.id().to_string(),
            question: market.question().to_string(),
            kind: market.kind().to_string(),
            status: market.status().to_string(),
            price: format!(
                "{first} {} / {second} {}",
                price.round_dp(4),
                (rust_decimal::Decimal::ONE - price).round_dp(4)
            ),
            pool: market.pool_usd().normalize().to_string(),
        }
    }
}

fn print_market(market: &Market) {
    output::field("ID", output::highlight(market.id()));
    output::field("Question", market.question());
    output::field("Kind", market.kind());
    output::field("Outcomes", market.outcomes().join(" / "));
    output::field("Status", market.status());
    output::field("Pool", market.pool_usd().normalize());
    for side in market.sides() {
        let price = compute_price(side, market.stakes(), market.kind());
        output::field(
            &format!("{side}"),
            format!(
                "stake {}  price {}",
                market.stakes().for_side(side).normalize(),
                price.round_dp(4)
            ),
        );
    }
    if let Some(winner) = market.winner() {
        output::field("Winner", output::side(winner));
    }
}

/// Open a new market.
pub fn create(ledger: &CliLedger, args: MarketCreateArgs) -> Result<()> {
    ledger.authorize(args.actor.address().as_ref())?;

    let outcomes = match args.outcomes.as_deref() {
        Some([first, second]) => Some((first.clone(), second.clone())),
        _ => None,
    };
    let market = ledger.create_market(&args.question, args.kind.into(), outcomes)?;

    if output::is_json() {
        output::json_output(json!({ "command": "market.create", "market": market }));
        return Ok(());
    }
    output::success(&format!("Created market {}", output::highlight(market.id())));
    print_market(&market);
    Ok(())
}

/// List all markets.
pub fn list(ledger: &CliLedger) -> Result<()> {
    let markets = ledger.markets();

    if output::is_json() {
        output::json_output(json!({ "command": "market.list", "markets": markets }));
        return Ok(());
    }
    output::section("Markets");
    output::table("markets", markets.iter().map(MarketRow::from).collect());
    Ok(())
}

/// Show one market.
pub fn show(ledger: &CliLedger, market_id: &str) -> Result<()> {
    let market = ledger.market(&MarketId::new(market_id))?;
    let chance = ledger.chance(market.id())?;

    if output::is_json() {
        output::json_output(json!({
            "command": "market.show",
            "market": market,
            "chance": chance,
        }));
        return Ok(());
    }
    output::section(market.question());
    print_market(&market);
    output::field(
        "Favourite",
        format!("{} ({}%)", output::side(chance.side), chance.percentage.round_dp(1)),
    );
    Ok(())
}

/// Quote an order.
pub fn quote(ledger: &CliLedger, args: QuoteArgs) -> Result<()> {
    let market_id = MarketId::new(args.market_id);
    let quote = ledger.quote(&market_id, args.side, args.amount)?;

    if output::is_json() {
        output::json_output(json!({
            "command": "market.quote",
            "marketId": market_id,
            "side": args.side,
            "amount": args.amount,
            "quote": quote,
        }));
        return Ok(());
    }
    output::section(&format!("Quote: {} points on {}", args.amount, output::side(args.side)));
    output::field("Price", quote.avg_price.round_dp(4));
    output::field("Shares", quote.shares.round_dp(4));
    output::field("Max payout", output::positive(quote.max_payout.round_dp(4)));
    output::field("Max profit", output::positive(quote.max_profit.round_dp(4)));
    Ok(())
}

/// Stop trading on a market.
pub fn close(ledger: &CliLedger, args: AdminMarketArgs) -> Result<()> {
    ledger.authorize(args.actor.address().as_ref())?;
    let market = ledger.close_market(&MarketId::new(args.market_id))?;

    if output::is_json() {
        output::json_output(json!({ "command": "market.close", "market": market }));
        return Ok(());
    }
    output::success(&format!("Closed market {}", output::highlight(market.id())));
    Ok(())
}

/// Resolve a market and report the settlement.
pub fn resolve(ledger: &CliLedger, args: ResolveArgs) -> Result<()> {
    ledger.authorize(args.actor.address().as_ref())?;
    let market_id = MarketId::new(args.market_id);
    let settlement = ledger.resolve_market(&market_id, args.winner)?;

    if output::is_json() {
        output::json_output(json!({
            "command": "market.resolve",
            "marketId": market_id,
            "winner": args.winner,
            "winnerPool": settlement.winner_pool,
            "burn": settlement.burn,
            "treasury": settlement.treasury,
            "claims": settlement.claim_records,
        }));
        return Ok(());
    }
    output::success(&format!(
        "Resolved {} in favour of {}",
        output::highlight(&market_id),
        output::side(args.winner)
    ));
    output::field("Winner pool", settlement.winner_pool.normalize());
    output::field("Burn", output::muted(settlement.burn.normalize()));
    output::field("Treasury", output::muted(settlement.treasury.normalize()));
    output::field("Claims", settlement.claim_records.len());
    if settlement.claim_records.is_empty() {
        output::note("nobody backed the winning side");
    }
    Ok(())
}

/// Cancel a market and issue refunds.
pub fn cancel(ledger: &CliLedger, args: AdminMarketArgs) -> Result<()> {
    ledger.authorize(args.actor.address().as_ref())?;
    let market_id = MarketId::new(args.market_id);
    let refunds = ledger.cancel_market(&market_id)?;

    if output::is_json() {
        output::json_output(json!({
            "command": "market.cancel",
            "marketId": market_id,
            "refunds": refunds,
        }));
        return Ok(());
    }
    output::success(&format!("Cancelled market {}", output::highlight(&market_id)));
    output::field("Refunds", refunds.len());
    if !refunds.is_empty() {
        output::hint(&format!(
            "traders collect refunds with {}",
            output::highlight(format!("pointbook claim {market_id} --wallet <address>"))
        ));
    }
    Ok(())
}
