use crate::contracts::HandlerError;
use crate::rpc::{Address, LedgerError};
use crate::store::StoreError;

/// Error types for the synchronizer
///
/// An expired filter never shows up here: the synchronizer recovers from it by registering a
/// new filter. Everything below ends the current poll cycle.
#[allow(clippy::enum_variant_names)]
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
	#[error("Ledger error: {0}")]
	LedgerError(#[from] LedgerError),

	#[error("Handler {handler} failed on log from {address} at block {block}: {source}")]
	HandlerError {
		handler: &'static str,
		address: Address,
		block: u64,
		#[source]
		source: HandlerError,
	},

	#[error("Store error: {0}")]
	StoreError(#[from] StoreError),

	#[error("Invalid sync state: {0}")]
	InvalidState(String),

	/// Registering a filter with no addresses would match every contract on the chain.
	#[error("No contract addresses to watch")]
	NoAddresses,
}
