//! Interval scheduler for the synchronizer.
//!
//! `SyncRunner` calls [`Synchronizer::sync`] on a fixed interval until a shutdown future
//! resolves. A failed cycle is logged and followed by an exponential backoff delay before the
//! next attempt; the synchronizer itself never retries.

use crate::sync::{Synchronizer, progress_tracker::SyncStats};

use backoff::ExponentialBackoff;
use backoff::backoff::Backoff;
use std::future::Future;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

/// Default delay between poll cycles.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Runs poll cycles on an interval until shut down.
pub struct SyncRunner {
	synchronizer: Synchronizer,
	poll_interval: Duration,
	backoff: ExponentialBackoff,
}

impl SyncRunner {
	pub fn new(synchronizer: Synchronizer, poll_interval: Duration) -> Self {
		Self {
			synchronizer,
			poll_interval,
			backoff: ExponentialBackoff {
				current_interval: poll_interval,
				initial_interval: poll_interval,
				max_interval: Duration::from_secs(60),
				max_elapsed_time: None,
				..ExponentialBackoff::default()
			},
		}
	}

	/// Replace the backoff policy applied after failed cycles.
	pub fn with_backoff(mut self, backoff: ExponentialBackoff) -> Self {
		self.backoff = backoff;
		self
	}

	/// Run cycles until `shutdown` resolves and return the final statistics.
	///
	/// A cycle in progress when shutdown is requested is allowed to finish.
	pub async fn run_until<F>(mut self, shutdown: F) -> SyncStats
	where
		F: Future<Output = ()>,
	{
		tokio::pin!(shutdown);
		self.log_start().await;

		let mut interval = tokio::time::interval(self.poll_interval);
		interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

		loop {
			tokio::select! {
				_ = &mut shutdown => {
					info!("Shutdown requested, stopping sync");
					break;
				}
				_ = interval.tick() => {
					match self.synchronizer.sync().await {
						Ok(()) => self.backoff.reset(),
						Err(e) => {
							let delay = self
								.backoff
								.next_backoff()
								.unwrap_or(self.backoff.max_interval);
							error!("Sync cycle failed: {}; next attempt in {:?}", e, delay);

							tokio::select! {
								_ = &mut shutdown => {
									info!("Shutdown requested, stopping sync");
									break;
								}
								_ = tokio::time::sleep(delay) => {}
							}
							interval.reset();
						}
					}
				}
			}
		}

		let stats = self.synchronizer.stats();
		info!("Sync stopped: {}", stats.summary());
		stats
	}

	async fn log_start(&self) {
		let position = match self.synchronizer.current_position().await {
			Ok(position) => position.to_string(),
			Err(e) => {
				warn!("Could not read sync position: {}", e);
				"unknown".to_string()
			}
		};

		match self.synchronizer.chain_head().await {
			Ok(head) => info!(
				"Starting sync of {} addresses from block {}, chain head at {}",
				self.synchronizer.addresses().len(),
				position,
				head
			),
			Err(e) => warn!(
				"Starting sync from block {}, chain head unavailable: {}",
				position, e
			),
		}
	}
}
