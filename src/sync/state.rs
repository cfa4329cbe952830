//! Persisted synchronizer state.
//!
//! `SyncState` owns the two values that survive a restart: the last synced block and the id of
//! the active filter. The filter id is cached in memory after the first read or write, but the
//! cursor store stays the source of truth; dropping the cache with [`SyncState::invalidate`]
//! simply makes the next read go back to the store.

use crate::rpc::FilterId;
use crate::store::CursorStore;
use crate::sync::SyncError;
use std::sync::Arc;
use tracing::debug;

/// Store key holding the last synced block as a decimal string.
pub const LATEST_SYNCED_BLOCK_KEY: &str = "latest_synced_block_number";
/// Store key holding the active filter id as a decimal string.
pub const FILTER_ID_KEY: &str = "synchronizer_filter_id";

/// Durable sync position plus the cached filter id.
pub struct SyncState {
	store: Arc<dyn CursorStore>,
	cached_filter_id: Option<FilterId>,
}

impl SyncState {
	pub fn new(store: Arc<dyn CursorStore>) -> Self {
		Self {
			store,
			cached_filter_id: None,
		}
	}

	/// The last block whose logs were processed, if any block has been synced yet.
	pub async fn latest_synced_block(&self) -> Result<Option<u64>, SyncError> {
		let Some(raw) = self.read(LATEST_SYNCED_BLOCK_KEY).await? else {
			return Ok(None);
		};

		let block = raw.parse::<u64>().map_err(|e| {
			SyncError::InvalidState(format!(
				"{} holds {:?}, not a block number: {}",
				LATEST_SYNCED_BLOCK_KEY, raw, e
			))
		})?;
		Ok(Some(block))
	}

	/// Record `block` as the last synced block.
	pub async fn set_latest_synced_block(&self, block: u64) -> Result<(), SyncError> {
		self.store
			.set(LATEST_SYNCED_BLOCK_KEY, &block.to_string())
			.await?;
		Ok(())
	}

	/// The active filter id, from the cache or else from the store.
	pub async fn filter_id(&mut self) -> Result<Option<FilterId>, SyncError> {
		if let Some(id) = self.cached_filter_id {
			return Ok(Some(id));
		}

		let Some(raw) = self.read(FILTER_ID_KEY).await? else {
			return Ok(None);
		};

		let id = raw.parse::<FilterId>().map_err(|e| {
			SyncError::InvalidState(format!(
				"{} holds {:?}, not a filter id: {}",
				FILTER_ID_KEY, raw, e
			))
		})?;
		debug!("Loaded filter id {} from cursor store", id);
		self.cached_filter_id = Some(id);
		Ok(Some(id))
	}

	/// Persist `id` as the active filter, then cache it.
	pub async fn set_filter_id(&mut self, id: FilterId) -> Result<(), SyncError> {
		self.store.set(FILTER_ID_KEY, &id.to_string()).await?;
		self.cached_filter_id = Some(id);
		Ok(())
	}

	pub fn cached_filter_id(&self) -> Option<FilterId> {
		self.cached_filter_id
	}

	/// Forget the cached filter id so the next read goes to the store.
	pub fn invalidate(&mut self) {
		self.cached_filter_id = None;
	}

	/// Read a key, treating an empty or blank value the same as a missing one.
	async fn read(&self, key: &str) -> Result<Option<String>, SyncError> {
		let value = self.store.get(key).await?;
		Ok(value
			.map(|v| v.trim().to_string())
			.filter(|v| !v.is_empty()))
	}
}
