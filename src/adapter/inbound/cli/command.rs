//! Command-line interface definitions.
//!
//! Defines the CLI structure for the pointbook application using `clap`.

use clap::{Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use std::path::PathBuf;

use crate::domain::{MarketKind, Side, WalletAddress};

/// Points-based prediction markets from the command line
#[derive(Parser, Debug)]
#[command(name = "pointbook")]
#[command(version)]
pub struct Cli {
    /// JSON output for scripting
    #[arg(long, global = true)]
    pub json: bool,

    /// Decrease output verbosity
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to configuration file [default: ~/.pointbook/config.toml]
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the pointbook CLI.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create, inspect and settle markets
    #[command(subcommand)]
    Market(MarketCommand),

    /// Stake points on one side of a market
    Trade(TradeArgs),

    /// Collect payouts or refunds from a settled market
    Claim(ClaimArgs),

    /// Claim free points
    Faucet(WalletArg),

    /// Show a wallet's balance and claims
    Wallet(WalletArg),

    /// Manage operator settings
    #[command(subcommand)]
    Settings(SettingsCommand),

    /// Delete all persisted state
    Reset(ResetArgs),
}

/// Subcommands for `pointbook market`.
#[derive(Subcommand, Debug)]
pub enum MarketCommand {
    /// Open a new market.
    Create(MarketCreateArgs),
    /// List all markets with their current prices.
    List,
    /// Show one market.
    Show(MarketIdArg),
    /// Quote an order without placing it.
    Quote(QuoteArgs),
    /// Stop trading on a market.
    Close(AdminMarketArgs),
    /// Pick the winning side and issue claims.
    Resolve(ResolveArgs),
    /// Cancel a market and refund every trade.
    Cancel(AdminMarketArgs),
}

/// Subcommands for `pointbook settings`.
#[derive(Subcommand, Debug)]
pub enum SettingsCommand {
    /// Display the current settings.
    Show,
    /// Turn admin mode on or off.
    Admin(SettingsAdminArgs),
    /// Add or remove an allowlisted administrator.
    Allow(SettingsAllowArgs),
    /// Map a key to an external price source.
    Map(SettingsMapArgs),
}

/// Market kind accepted on the command line.
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum KindArg {
    /// Binary YES / NO question
    #[default]
    YesNo,
    /// Head-to-head A / B question
    AVsB,
}

impl From<KindArg> for MarketKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::YesNo => Self::YesNo,
            KindArg::AVsB => Self::AVsB,
        }
    }
}

/// On/off switch.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum Toggle {
    On,
    Off,
}

/// Parse a side key (`YES`, `NO`, `A`, `B`), case-insensitively.
pub fn parse_side(value: &str) -> std::result::Result<Side, String> {
    Side::parse(value).ok_or_else(|| format!("unknown side `{value}`, expected YES, NO, A or B"))
}

/// Shared argument for commands that act as an administrator.
#[derive(Parser, Debug)]
pub struct ActorArg {
    /// Administrator address, required while admin mode is on
    #[arg(long = "as", value_name = "ADDRESS")]
    pub actor: Option<String>,
}

impl ActorArg {
    /// The acting address, if given.
    #[must_use]
    pub fn address(&self) -> Option<WalletAddress> {
        self.actor.as_deref().map(WalletAddress::new)
    }
}

/// Shared argument for commands that take a market id.
#[derive(Parser, Debug)]
pub struct MarketIdArg {
    /// Market identifier
    pub market_id: String,
}

/// Shared argument for commands that take a wallet address.
#[derive(Parser, Debug)]
pub struct WalletArg {
    /// Wallet address
    pub wallet: String,
}

/// Arguments for `pointbook market create`.
#[derive(Parser, Debug)]
pub struct MarketCreateArgs {
    /// Market question
    pub question: String,

    /// Market kind
    #[arg(long, value_enum, default_value = "yes-no")]
    pub kind: KindArg,

    /// Outcome labels, first outcome first (e.g. --outcomes Lakers,Celtics)
    #[arg(long, value_delimiter = ',', num_args = 2)]
    pub outcomes: Option<Vec<String>>,

    #[command(flatten)]
    pub actor: ActorArg,
}

/// Arguments for `pointbook market quote`.
#[derive(Parser, Debug)]
pub struct QuoteArgs {
    /// Market identifier
    pub market_id: String,

    /// Side to buy
    #[arg(value_parser = parse_side)]
    pub side: Side,

    /// Points to stake
    pub amount: Decimal,
}

/// Arguments for market administration commands.
#[derive(Parser, Debug)]
pub struct AdminMarketArgs {
    /// Market identifier
    pub market_id: String,

    #[command(flatten)]
    pub actor: ActorArg,
}

/// Arguments for `pointbook market resolve`.
#[derive(Parser, Debug)]
pub struct ResolveArgs {
    /// Market identifier
    pub market_id: String,

    /// Winning side
    #[arg(value_parser = parse_side)]
    pub winner: Side,

    #[command(flatten)]
    pub actor: ActorArg,
}

/// Arguments for `pointbook trade`.
#[derive(Parser, Debug)]
pub struct TradeArgs {
    /// Market identifier
    pub market_id: String,

    /// Side to buy
    #[arg(value_parser = parse_side)]
    pub side: Side,

    /// Points to stake
    pub amount: Decimal,

    /// Trading wallet
    #[arg(long)]
    pub wallet: String,
}

/// Arguments for `pointbook claim`.
#[derive(Parser, Debug)]
pub struct ClaimArgs {
    /// Market identifier
    pub market_id: String,

    /// Claiming wallet
    #[arg(long)]
    pub wallet: String,
}

/// Arguments for `pointbook settings admin`.
#[derive(Parser, Debug)]
pub struct SettingsAdminArgs {
    /// New admin mode
    #[arg(value_enum)]
    pub mode: Toggle,

    #[command(flatten)]
    pub actor: ActorArg,
}

/// Arguments for `pointbook settings allow`.
#[derive(Parser, Debug)]
pub struct SettingsAllowArgs {
    /// Address to allowlist
    pub address: String,

    /// Remove instead of adding
    #[arg(long)]
    pub remove: bool,

    #[command(flatten)]
    pub actor: ActorArg,
}

/// Arguments for `pointbook settings map`.
#[derive(Parser, Debug)]
pub struct SettingsMapArgs {
    /// Market id or symbol
    pub key: String,

    /// Price source (token address or coin id); omit with --remove
    pub source: Option<String>,

    /// Remove the mapping
    #[arg(long)]
    pub remove: bool,

    #[command(flatten)]
    pub actor: ActorArg,
}

/// Arguments for `pointbook reset`.
#[derive(Parser, Debug)]
pub struct ResetArgs {
    /// Confirm deletion of all markets, trades, wallets, claims and settings
    #[arg(long)]
    pub yes: bool,

    #[command(flatten)]
    pub actor: ActorArg,
}
