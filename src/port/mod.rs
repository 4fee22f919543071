//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! Ports define the extension points in the hexagonal architecture.
//! They are traits that adapters implement to integrate with external
//! systems (local storage, session buses, price sources).
//!
//! # Architecture
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │      Application        │
//!                    │                         │
//!     ┌──────────────┤  Domain + Port          ├──────────────┐
//!     │              │                         │              │
//!     │              └─────────────────────────┘              │
//!     │                         │                             │
//!     ▼                         ▼                             ▼
//! ┌─────────┐            ┌─────────────┐              ┌───────────┐
//! │ Storage │            │ Realtime    │              │ Price     │
//! │ Adapter │            │ Bus Adapter │              │ Feed      │
//! └─────────┘            └─────────────┘              └───────────┘
//! ```
//!
//! # Available Ports
//!
//! - [`Storage`] - Versioned key-value persistence
//! - [`RealtimeBus`] - Cross-session change notifications
//! - [`PriceFeed`] - External reference prices

pub mod outbound;

pub use outbound::bus::{BusEvent, Listener, RealtimeBus, Subscription};
pub use outbound::price::{fetch_or_fallback, PriceFeed, PriceSnapshot};
pub use outbound::store::{SessionId, Storage, StorageChange, StorageWatch, Versioned, Write};
