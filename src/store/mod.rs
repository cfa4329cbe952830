//! Cursor store: durable key/value persistence for synchronizer progress.
//!
//! The synchronizer only ever stores two string values (the last synced block and the active
//! filter id), so the store interface is a plain string map. Implementations are file-backed
//! for the service and in-memory for tests.

/// File-backed store writing a single JSON document
mod file;
/// In-memory store with no persistence
mod memory;

pub use file::{CURSOR_STATE_FILENAME, FileCursorStore};
pub use memory::MemoryCursorStore;

/// Repository for synchronizer cursor values
#[async_trait::async_trait]
pub trait CursorStore: Send + Sync {
	/// Read the value stored under `key`, if any.
	async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

	/// Store `value` under `key`, replacing any previous value.
	async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// Error types for cursor store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
	#[error("IO error: {0}")]
	IoError(#[from] std::io::Error),

	#[error("JSON error: {0}")]
	JsonError(#[from] serde_json::Error),

	#[error("Corrupt cursor state: {0}")]
	Corrupt(String),
}
