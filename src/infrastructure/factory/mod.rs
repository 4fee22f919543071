//! Factory modules for building infrastructure components.
//!
//! Provides factory functions that construct fully-configured infrastructure
//! components from application configuration.
//!
//! # Submodules
//!
//! - [`storage`] - Storage backend construction
//! - [`bus`] - Realtime bus construction
//! - [`ledger`] - Ledger wiring over storage and bus

pub mod bus;
pub mod ledger;
pub mod storage;
