pub mod entity;
pub mod mapper;
pub mod memory;
pub mod sql;

pub use memory::MemoryStore;
pub use sql::SqlStore;
