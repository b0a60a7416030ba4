//! Run-scoped document storage.

pub mod memory;

pub use memory::MemoryStore;
