//! Record store abstraction
//!
//! The loader writes through [`RecordStore`]; [`create_record_store`] picks
//! the implementation from configuration.

pub mod factory;
pub mod memory;
pub mod traits;

pub use factory::create_record_store;
pub use memory::MemoryStore;
pub use traits::{RecordStore, TableStatus, WriteCounts};
