//! Progress tracking for log synchronization.
//!
//! This module provides the `SyncProgressTracker`, which counts what each poll cycle did (logs
//! dispatched, skipped or abandoned, filters registered or found expired) and the highest
//! block persisted so far. It logs a summary at regular block intervals.

use tracing::info;

/// Default number of blocks between progress log lines.
pub const DEFAULT_PROGRESS_LOG_INTERVAL: u64 = 1000;

/// Service for tracking synchronization progress
#[derive(Debug, Clone)]
pub struct SyncProgressTracker {
	/// The highest block recorded as synced by this instance
	highest_synced_block: Option<u64>,
	/// Poll cycles started
	cycles: u64,
	/// Logs handed to a handler successfully
	logs_dispatched: usize,
	/// Logs with no registered handler
	logs_skipped: usize,
	/// Logs dropped from a batch after a handler failure
	logs_abandoned: usize,
	/// Filters installed on the node
	filters_registered: usize,
	/// Polls answered with "filter not found"
	filters_expired: usize,
	/// Block at which we last logged progress
	last_logged_block: Option<u64>,
	/// Blocks between progress log lines
	log_interval: u64,
}

impl Default for SyncProgressTracker {
	fn default() -> Self {
		Self::new(DEFAULT_PROGRESS_LOG_INTERVAL)
	}
}

impl SyncProgressTracker {
	/// Create a tracker that logs progress every `log_interval` blocks.
	pub fn new(log_interval: u64) -> Self {
		Self {
			highest_synced_block: None,
			cycles: 0,
			logs_dispatched: 0,
			logs_skipped: 0,
			logs_abandoned: 0,
			filters_registered: 0,
			filters_expired: 0,
			last_logged_block: None,
			log_interval: log_interval.max(1),
		}
	}

	pub fn record_cycle(&mut self) {
		self.cycles += 1;
	}

	pub fn record_dispatched(&mut self) {
		self.logs_dispatched += 1;
	}

	pub fn record_skipped(&mut self) {
		self.logs_skipped += 1;
	}

	pub fn record_abandoned(&mut self, count: usize) {
		self.logs_abandoned += count;
	}

	pub fn record_filter_registered(&mut self) {
		self.filters_registered += 1;
	}

	pub fn record_filter_expired(&mut self) {
		self.filters_expired += 1;
	}

	/// Record that `block` was persisted as the latest synced block.
	pub fn record_synced(&mut self, block: u64) {
		self.highest_synced_block = Some(self.highest_synced_block.map_or(block, |h| h.max(block)));
		if self.last_logged_block.is_none() {
			self.last_logged_block = Some(block);
		}
	}

	/// Log progress at regular intervals or when forced
	pub fn log_progress(&mut self, force: bool) {
		let Some(highest) = self.highest_synced_block else {
			return;
		};

		let blocks_since_last_log = highest.saturating_sub(self.last_logged_block.unwrap_or(highest));
		if force || blocks_since_last_log >= self.log_interval {
			info!("Sync progress: {}", self.get_stats().summary());
			self.last_logged_block = Some(highest);
		}
	}

	/// Get sync statistics as a SyncStats struct
	pub fn get_stats(&self) -> SyncStats {
		SyncStats {
			cycles: self.cycles,
			highest_synced_block: self.highest_synced_block,
			logs_dispatched: self.logs_dispatched,
			logs_skipped: self.logs_skipped,
			logs_abandoned: self.logs_abandoned,
			filters_registered: self.filters_registered,
			filters_expired: self.filters_expired,
		}
	}
}

/// Statistics about the sync progress
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncStats {
	pub cycles: u64,
	pub highest_synced_block: Option<u64>,
	pub logs_dispatched: usize,
	pub logs_skipped: usize,
	pub logs_abandoned: usize,
	pub filters_registered: usize,
	pub filters_expired: usize,
}

impl SyncStats {
	/// Get a human-readable summary of the sync statistics
	pub fn summary(&self) -> String {
		format!(
			"{} cycles up to block {}: {} logs dispatched, {} skipped, {} filters registered ({} expired){}",
			self.cycles,
			self.highest_synced_block
				.map(|b| b.to_string())
				.unwrap_or_else(|| "none".to_string()),
			self.logs_dispatched,
			self.logs_skipped,
			self.filters_registered,
			self.filters_expired,
			if self.logs_abandoned == 0 {
				String::new()
			} else {
				format!(", {} abandoned after handler failures", self.logs_abandoned)
			}
		)
	}
}
