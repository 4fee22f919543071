//! Outbound adapters (driven side).

pub mod bus;
pub mod storage;
