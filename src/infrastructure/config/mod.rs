//! Infrastructure configuration modules.

pub mod bus;
pub mod logging;
pub mod settings;
pub mod storage;
