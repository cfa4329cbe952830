//! In-memory implementation of the `CursorStore` trait.
//!
//! All values are lost when the store is dropped.

use super::{CursorStore, StoreError};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// In-memory cursor store.
#[derive(Debug, Default)]
pub struct MemoryCursorStore {
	values: RwLock<HashMap<String, String>>,
}

impl MemoryCursorStore {
	/// Create a new empty store.
	pub fn new() -> Self {
		Self::default()
	}

	/// Create a store pre-populated with the given key/value pairs.
	pub fn with_values<K, V>(values: impl IntoIterator<Item = (K, V)>) -> Self
	where
		K: Into<String>,
		V: Into<String>,
	{
		Self {
			values: RwLock::new(
				values
					.into_iter()
					.map(|(k, v)| (k.into(), v.into()))
					.collect(),
			),
		}
	}

	/// Copy of everything currently stored.
	pub async fn snapshot(&self) -> HashMap<String, String> {
		self.values.read().await.clone()
	}
}

#[async_trait::async_trait]
impl CursorStore for MemoryCursorStore {
	async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
		Ok(self.values.read().await.get(key).cloned())
	}

	async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
		self.values
			.write()
			.await
			.insert(key.to_string(), value.to_string());
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn missing_key_reads_as_none() {
		let store = MemoryCursorStore::new();
		assert_eq!(store.get("synchronizer_filter_id").await.unwrap(), None);
	}

	#[tokio::test]
	async fn set_replaces_previous_value() {
		let store = MemoryCursorStore::with_values([("latest_synced_block_number", "150")]);
		store
			.set("latest_synced_block_number", "152")
			.await
			.unwrap();
		assert_eq!(
			store.get("latest_synced_block_number").await.unwrap(),
			Some("152".to_string())
		);
		assert_eq!(store.snapshot().await.len(), 1);
	}
}
