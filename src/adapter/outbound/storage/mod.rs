//! Storage adapters implementing [`Storage`](crate::port::outbound::store::Storage).

pub mod file;
pub mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;
