mod memory;
mod redb_store;
mod traits;

pub use memory::MemoryStore;
pub use redb_store::RedbStore;
pub use traits::Store;
