//! Contact store — the collaborator that keeps deduplicated contacts and
//! their raw cross-platform interaction records. The attribution engine
//! reads from it and never writes.

pub mod memory;
pub mod store;

pub use memory::MemoryContactStore;
pub use store::ContactStore;
