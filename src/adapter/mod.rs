//! Implementations of ports (hexagonal adapters).
//!
//! - [`inbound`]: the `pointbook` command line.
//! - [`outbound`]: storage and realtime bus backends.

pub mod inbound;
pub mod outbound;
