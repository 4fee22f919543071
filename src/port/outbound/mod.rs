//! Outbound ports (driven adapters).
//!
//! These traits define what the core needs from the outside world:
//! durable storage, cross-session notification and reference prices.

pub mod bus;
pub mod price;
pub mod store;
