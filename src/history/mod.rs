pub mod backing;
pub mod filter;
pub mod store;

pub use backing::{BackingStore, MemoryBackend, SqliteBackend};
pub use filter::{search_and_filter, stats, ALL_PLATFORMS};
pub use store::{HistoryStore, MAX_MESSAGES, STORAGE_KEY};
