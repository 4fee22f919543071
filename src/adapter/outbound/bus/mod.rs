//! Realtime bus backends implementing
//! [`RealtimeBus`](crate::port::outbound::bus::RealtimeBus).
//!
//! The embedding application picks one explicitly at construction time.

pub mod broadcast;
pub mod fallback;

pub use broadcast::{BroadcastBus, BroadcastHub};
pub use fallback::FallbackBus;
