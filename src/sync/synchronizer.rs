//! Filter-based log synchronizer.
//!
//! This module defines the `Synchronizer`, which keeps a log filter installed on the ledger node
//! and drains it one poll cycle at a time, handing each log to the handler registered for the
//! contract that emitted it.
//!
//! The synchronizer is responsible for:
//! - Installing a filter over the watched addresses, starting at the last synced block
//! - Re-installing the filter when the node reports it as expired
//! - Dispatching logs to handlers in the order the node returned them
//! - Persisting the synced block after every log
//!
//! Delivery is at-least-once: the block is persisted after its log is handled, so a crash in
//! between replays that log. A re-installed filter starts at the last synced block itself, so
//! logs from that block can also be delivered again. When a handler fails, the rest of the
//! batch is dropped: the node's filter has already moved past it and it will not be returned
//! by the next poll.

use crate::contracts::ContractRegistry;
use crate::rpc::{Address, BlockNumberOrTag, FilterId, LedgerClient, LedgerError, Log, LogFilter};
use crate::store::CursorStore;
use crate::sync::{
	SyncError,
	progress_tracker::{SyncProgressTracker, SyncStats},
	state::SyncState,
};

use std::sync::Arc;
use tracing::{debug, info, warn};

/// Drives the filter lifecycle and the poll-and-dispatch cycle.
///
/// `sync` takes `&mut self`, so cycles on one instance never overlap. Hosts that share a
/// synchronizer between tasks should put it behind a `tokio::sync::Mutex`.
pub struct Synchronizer {
	client: Arc<dyn LedgerClient>,
	contracts: ContractRegistry,
	/// Addresses the filter is scoped to; fixed for the lifetime of the instance.
	addresses: Vec<Address>,
	/// Where to start when nothing has been synced yet. `None` means the chain head.
	start_block: Option<u64>,
	state: SyncState,
	progress: SyncProgressTracker,
}

impl Synchronizer {
	/// Create a synchronizer watching every address registered in `contracts`.
	///
	/// The address set must not be empty by the time a filter is registered; a node reads an
	/// empty set as "every contract".
	pub fn new(
		client: Arc<dyn LedgerClient>,
		store: Arc<dyn CursorStore>,
		contracts: ContractRegistry,
	) -> Self {
		let addresses = contracts.addresses();
		Self {
			client,
			contracts,
			addresses,
			start_block: None,
			state: SyncState::new(store),
			progress: SyncProgressTracker::default(),
		}
	}

	/// Scope the filter to an explicit address set instead of the registry's addresses.
	pub fn with_addresses(mut self, addresses: impl IntoIterator<Item = Address>) -> Self {
		let mut addresses: Vec<Address> = addresses.into_iter().collect();
		addresses.sort();
		addresses.dedup();
		self.addresses = addresses;
		self
	}

	/// Start from `block` when no synced block has been persisted yet.
	pub fn with_start_block(mut self, block: u64) -> Self {
		self.start_block = Some(block);
		self
	}

	/// Log a progress summary every `blocks` synced blocks.
	pub fn with_progress_log_interval(mut self, blocks: u64) -> Self {
		self.progress = SyncProgressTracker::new(blocks);
		self
	}

	pub fn addresses(&self) -> &[Address] {
		&self.addresses
	}

	/// Snapshot of what this instance has done so far.
	pub fn stats(&self) -> SyncStats {
		self.progress.get_stats()
	}

	/// Persisted state, including the cached filter id.
	pub fn state(&self) -> &SyncState {
		&self.state
	}

	/// The last synced block as persisted in the cursor store.
	pub async fn latest_synced_block(&self) -> Result<Option<u64>, SyncError> {
		self.state.latest_synced_block().await
	}

	/// Overwrite the persisted synced block.
	///
	/// The node-side filter is unaffected; the new value only matters the next time a filter
	/// is registered.
	pub async fn set_latest_synced_block(&mut self, block: u64) -> Result<(), SyncError> {
		self.state.set_latest_synced_block(block).await?;
		self.progress.record_synced(block);
		Ok(())
	}

	/// The active filter id, if one has been registered. Never registers a filter.
	pub async fn filter_id(&mut self) -> Result<Option<FilterId>, SyncError> {
		self.state.filter_id().await
	}

	/// Overwrite the persisted filter id and make it the active filter.
	pub async fn set_filter_id(&mut self, filter_id: FilterId) -> Result<(), SyncError> {
		self.state.set_filter_id(filter_id).await
	}

	/// Height of the node's chain head.
	pub async fn chain_head(&self) -> Result<u64, SyncError> {
		Ok(self.client.block_number().await?)
	}

	/// The block a new filter would start from.
	///
	/// This is the persisted synced block, or else the configured start block, or else
	/// `latest`, in which case logs older than the filter are never seen.
	pub async fn current_position(&self) -> Result<BlockNumberOrTag, SyncError> {
		let block = match self.state.latest_synced_block().await? {
			Some(block) => Some(block),
			None => self.start_block,
		};
		Ok(block.map_or(BlockNumberOrTag::Latest, BlockNumberOrTag::Number))
	}

	/// The active filter id, registering a new filter if none is known.
	pub async fn current_filter_id(&mut self) -> Result<FilterId, SyncError> {
		match self.state.filter_id().await? {
			Some(filter_id) => Ok(filter_id),
			None => self.register_filter().await,
		}
	}

	/// Install a new filter from the current position to `latest` and make it active.
	///
	/// Any previous filter is superseded, not uninstalled; the node drops it on its own once it
	/// stops being polled.
	///
	/// # Errors
	/// [`SyncError::NoAddresses`] when there is nothing to scope the filter to.
	pub async fn register_filter(&mut self) -> Result<FilterId, SyncError> {
		if self.addresses.is_empty() {
			return Err(SyncError::NoAddresses);
		}

		let from_block = self.current_position().await?;
		let filter = LogFilter::new(from_block, BlockNumberOrTag::Latest, self.addresses.clone());

		let filter_id = self.client.new_filter(&filter).await?;
		self.state.set_filter_id(filter_id).await?;
		self.progress.record_filter_registered();

		info!(
			"Registered filter {} from block {} over {} addresses",
			filter_id,
			from_block,
			self.addresses.len()
		);
		Ok(filter_id)
	}

	/// Run one poll cycle.
	///
	/// If the node has forgotten the filter, a new one is registered and the cycle ends without
	/// dispatching anything; the next cycle polls the new filter.
	///
	/// # Errors
	/// Ledger, store and handler failures end the cycle and are returned unchanged. Blocks
	/// persisted before a handler failure stay persisted.
	pub async fn sync(&mut self) -> Result<(), SyncError> {
		self.progress.record_cycle();
		let filter_id = self.current_filter_id().await?;

		let logs = match self.client.get_filter_changes(filter_id).await {
			Ok(logs) => logs,
			Err(LedgerError::FilterNotFound(_)) => {
				warn!("Filter {} expired on the node, registering a new one", filter_id);
				self.progress.record_filter_expired();
				self.register_filter().await?;
				return Ok(());
			}
			Err(e) => return Err(e.into()),
		};

		if logs.is_empty() {
			debug!("Filter {} has no new logs", filter_id);
			return Ok(());
		}

		debug!("Filter {} returned {} logs", filter_id, logs.len());
		let result = self.process_logs(&logs).await;
		self.progress.log_progress(false);
		result
	}

	async fn process_logs(&mut self, logs: &[Log]) -> Result<(), SyncError> {
		let mut persisted = self.state.latest_synced_block().await?;

		for (position, log) in logs.iter().enumerate() {
			let address = log.address();
			let block = log.block_number();

			match self.contracts.handler_for(&address).cloned() {
				Some(handler) => {
					debug!(
						"Dispatching log from {} at block {} to {}",
						address,
						block,
						handler.name()
					);

					if let Err(source) = handler.handle(log).await {
						let abandoned = logs.len() - position - 1;
						self.progress.record_abandoned(abandoned);
						warn!(
							"Handler {} failed at block {}; {} remaining logs in this batch will not be redelivered",
							handler.name(),
							block,
							abandoned
						);
						return Err(SyncError::HandlerError {
							handler: handler.name(),
							address,
							block,
							source,
						});
					}
					self.progress.record_dispatched();
				}
				None => {
					debug!(
						"No handler for {}, skipping log at block {}",
						address, block
					);
					self.progress.record_skipped();
				}
			}

			if let Some(synced) = persisted.filter(|p| block < *p) {
				warn!(
					"Log at block {} is behind synced block {}, not rewinding",
					block, synced
				);
				continue;
			}

			self.state.set_latest_synced_block(block).await?;
			self.progress.record_synced(block);
			persisted = Some(block);
		}

		Ok(())
	}
}
