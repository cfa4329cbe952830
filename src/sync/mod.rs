//! Log Synchronization Module
//!
//! This module holds the core of the service: keeping a log filter alive on the ledger node and
//! draining it into contract handlers. It is composed of several submodules:
//!
//! - `synchronizer`: the filter lifecycle and the poll-and-dispatch cycle.
//! - `state`: the persisted sync position and filter id.
//! - `progress_tracker`: counters and periodic progress logging.
//! - `runner`: an interval scheduler that drives the synchronizer until shutdown.
//! - `types`: the synchronizer's error type.

/// Tracks synchronization progress and statistics
pub mod progress_tracker;
/// Interval scheduler with backoff on failure
pub mod runner;
/// Persisted sync position and filter id
pub mod state;
/// Filter lifecycle and poll cycle
pub mod synchronizer;
/// Error types
pub mod types;

pub use progress_tracker::{SyncProgressTracker, SyncStats};
pub use runner::{DEFAULT_POLL_INTERVAL, SyncRunner};
pub use state::{FILTER_ID_KEY, LATEST_SYNCED_BLOCK_KEY, SyncState};
pub use synchronizer::Synchronizer;
pub use types::SyncError;
