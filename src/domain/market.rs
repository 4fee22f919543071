//! Market-related domain types.
//!
//! - [`Market`] - A two-outcome points market priced by the bonding curve
//! - [`MarketKind`] - `YES_NO` or `A_VS_B`
//! - [`Side`] - An outcome key a trade can be placed on
//! - [`MarketStatus`] - One-way lifecycle `OPEN -> CLOSED -> RESOLVED | CANCELLED`
//! - [`Stakes`] - Points staked on each side

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::id::MarketId;
use super::money::Points;

/// Market flavour. Determines which pair of sides is tradeable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarketKind {
    /// Binary question, sides `YES` and `NO`.
    #[serde(rename = "YES_NO")]
    YesNo,
    /// Head-to-head, sides `A` and `B`.
    #[serde(rename = "A_VS_B")]
    AVsB,
}

impl MarketKind {
    /// The two sides of this kind, first outcome first.
    #[must_use]
    pub const fn sides(self) -> [Side; 2] {
        match self {
            Self::YesNo => [Side::Yes, Side::No],
            Self::AVsB => [Side::A, Side::B],
        }
    }

    /// Default outcome labels for this kind.
    #[must_use]
    pub fn default_outcomes(self) -> Vec<String> {
        match self {
            Self::YesNo => vec!["Yes".to_string(), "No".to_string()],
            Self::AVsB => vec!["A".to_string(), "B".to_string()],
        }
    }
}

impl fmt::Display for MarketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::YesNo => write!(f, "YES_NO"),
            Self::AVsB => write!(f, "A_VS_B"),
        }
    }
}

/// An outcome key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Yes,
    No,
    A,
    B,
}

impl Side {
    /// Parse an outcome key, case-insensitively.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "YES" => Some(Self::Yes),
            "NO" => Some(Self::No),
            "A" => Some(Self::A),
            "B" => Some(Self::B),
            _ => None,
        }
    }

    /// True for the first outcome of either kind (`YES` or `A`).
    #[must_use]
    pub const fn is_first(self) -> bool {
        matches!(self, Self::Yes | Self::A)
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Yes => write!(f, "YES"),
            Self::No => write!(f, "NO"),
            Self::A => write!(f, "A"),
            Self::B => write!(f, "B"),
        }
    }
}

/// Market lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MarketStatus {
    Open,
    Closed,
    Resolved,
    Cancelled,
}

impl MarketStatus {
    /// Whether moving from `self` to `next` is allowed.
    ///
    /// Transitions are forward-only; `RESOLVED` and `CANCELLED` are terminal.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Open, Self::Closed)
                | (Self::Open | Self::Closed, Self::Resolved)
                | (Self::Open | Self::Closed, Self::Cancelled)
        )
    }

    /// Returns true for `RESOLVED` and `CANCELLED`.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Resolved | Self::Cancelled)
    }
}

impl fmt::Display for MarketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "OPEN"),
            Self::Closed => write!(f, "CLOSED"),
            Self::Resolved => write!(f, "RESOLVED"),
            Self::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

/// Points staked on each side. Only the pair matching the market kind moves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Stakes {
    pub yes_stake: Points,
    pub no_stake: Points,
    pub a_stake: Points,
    pub b_stake: Points,
}

impl Stakes {
    /// Stakes for a `YES_NO` market.
    #[must_use]
    pub fn yes_no(yes: Points, no: Points) -> Self {
        Self {
            yes_stake: yes,
            no_stake: no,
            ..Self::default()
        }
    }

    /// Stakes for an `A_VS_B` market.
    #[must_use]
    pub fn a_vs_b(a: Points, b: Points) -> Self {
        Self {
            a_stake: a,
            b_stake: b,
            ..Self::default()
        }
    }

    /// `(first, second)` stakes of the pair used by `kind`.
    #[must_use]
    pub const fn pair(&self, kind: MarketKind) -> (Points, Points) {
        match kind {
            MarketKind::YesNo => (self.yes_stake, self.no_stake),
            MarketKind::AVsB => (self.a_stake, self.b_stake),
        }
    }

    /// Stake on a single side.
    #[must_use]
    pub const fn for_side(&self, side: Side) -> Points {
        match side {
            Side::Yes => self.yes_stake,
            Side::No => self.no_stake,
            Side::A => self.a_stake,
            Side::B => self.b_stake,
        }
    }

    fn add(&mut self, side: Side, amount: Points) {
        match side {
            Side::Yes => self.yes_stake += amount,
            Side::No => self.no_stake += amount,
            Side::A => self.a_stake += amount,
            Side::B => self.b_stake += amount,
        }
    }
}

/// Outcome of a resolved market.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resolution {
    pub winner: Side,
    pub resolved_at: DateTime<Utc>,
}

/// A two-outcome points market.
///
/// `pool_usd` accumulates every traded amount and never decreases; settlement
/// splits it without writing it back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Market {
    id: MarketId,
    question: String,
    #[serde(rename = "type")]
    kind: MarketKind,
    outcomes: Vec<String>,
    #[serde(flatten)]
    stakes: Stakes,
    #[serde(rename = "poolUSD", default)]
    pool_usd: Points,
    status: MarketStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    resolution: Option<Resolution>,
    created_at: DateTime<Utc>,
}

impl Market {
    /// Create an open market with zero stakes and default outcome labels.
    pub fn new(question: impl Into<String>, kind: MarketKind) -> Self {
        Self {
            id: MarketId::generate(),
            question: question.into(),
            kind,
            outcomes: kind.default_outcomes(),
            stakes: Stakes::default(),
            pool_usd: Decimal::ZERO,
            status: MarketStatus::Open,
            resolution: None,
            created_at: Utc::now(),
        }
    }

    /// Replace the generated ID.
    #[must_use]
    pub fn with_id(mut self, id: MarketId) -> Self {
        self.id = id;
        self
    }

    /// Replace the default outcome labels.
    #[must_use]
    pub fn with_outcomes(mut self, first: impl Into<String>, second: impl Into<String>) -> Self {
        self.outcomes = vec![first.into(), second.into()];
        self
    }

    #[must_use]
    pub const fn id(&self) -> &MarketId {
        &self.id
    }

    #[must_use]
    pub fn question(&self) -> &str {
        &self.question
    }

    #[must_use]
    pub const fn kind(&self) -> MarketKind {
        self.kind
    }

    /// Human-readable outcome labels, first outcome first.
    #[must_use]
    pub fn outcomes(&self) -> &[String] {
        &self.outcomes
    }

    #[must_use]
    pub const fn stakes(&self) -> &Stakes {
        &self.stakes
    }

    /// Total points traded into this market.
    #[must_use]
    pub const fn pool_usd(&self) -> Points {
        self.pool_usd
    }

    #[must_use]
    pub const fn status(&self) -> MarketStatus {
        self.status
    }

    #[must_use]
    pub const fn resolution(&self) -> Option<&Resolution> {
        self.resolution.as_ref()
    }

    /// The winning side, once resolved.
    #[must_use]
    pub fn winner(&self) -> Option<Side> {
        self.resolution.as_ref().map(|r| r.winner)
    }

    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.status == MarketStatus::Open
    }

    /// The two tradeable sides of this market.
    #[must_use]
    pub const fn sides(&self) -> [Side; 2] {
        self.kind.sides()
    }

    /// Check that `side` is one of this market's outcome keys.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidSide`] otherwise.
    pub fn validate_side(&self, side: Side) -> Result<(), DomainError> {
        if self.sides().contains(&side) {
            Ok(())
        } else {
            Err(DomainError::InvalidSide {
                side,
                kind: self.kind,
            })
        }
    }

    /// Add a traded amount to a side's stake and to the pool.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidSide`] when `side` does not belong to the market.
    pub fn record_stake(&mut self, side: Side, amount: Points) -> Result<(), DomainError> {
        self.validate_side(side)?;
        self.stakes.add(side, amount);
        self.pool_usd += amount;
        Ok(())
    }

    /// Move the market to `next`.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidTransition`] for backward or terminal moves.
    pub fn transition(&mut self, next: MarketStatus) -> Result<(), DomainError> {
        if !self.status.can_transition_to(next) {
            return Err(DomainError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    /// Set the winner and mark the market resolved.
    ///
    /// # Errors
    ///
    /// Fails if the market already has a resolution, the side is invalid, or
    /// the market is in a terminal status.
    pub fn resolve(&mut self, winner: Side, at: DateTime<Utc>) -> Result<(), DomainError> {
        if self.resolution.is_some() {
            return Err(DomainError::AlreadyResolved {
                market_id: self.id.clone(),
            });
        }
        self.validate_side(winner)?;
        self.transition(MarketStatus::Resolved)?;
        self.resolution = Some(Resolution {
            winner,
            resolved_at: at,
        });
        Ok(())
    }
}
