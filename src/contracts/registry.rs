//! Handler registry for matched logs.
//!
//! The synchronizer consults the registry once per log. A log whose address has no handler is
//! skipped, which is a normal outcome rather than an error: the filter's address set normally
//! keeps such logs away in the first place.

use crate::rpc::{Address, Log};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Error raised by a handler. Handlers are application code, so any error type is accepted.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Trait for handling logs emitted by one contract.
#[async_trait::async_trait]
pub trait LogHandler: Send + Sync {
	/// Handle a matched log.
	///
	/// Returning an error stops the current poll cycle; the log's block is not recorded as
	/// synced.
	async fn handle(&self, log: &Log) -> Result<(), HandlerError>;

	/// Get the name of this handler for logging and diagnostics.
	fn name(&self) -> &'static str;
}

/// Registry mapping contract addresses to their handlers.
#[derive(Clone, Default)]
pub struct ContractRegistry {
	handlers: HashMap<Address, Arc<dyn LogHandler>>,
}

impl ContractRegistry {
	/// Create a new, empty registry.
	pub fn new() -> Self {
		Self::default()
	}

	/// Register `handler` for `address`, returning the handler it replaced.
	pub fn register(
		&mut self,
		address: Address,
		handler: Arc<dyn LogHandler>,
	) -> Option<Arc<dyn LogHandler>> {
		self.handlers.insert(address, handler)
	}

	/// Builder form of [`register`](Self::register).
	pub fn with_handler(mut self, address: Address, handler: Arc<dyn LogHandler>) -> Self {
		self.register(address, handler);
		self
	}

	/// Look up the handler for a contract address.
	pub fn handler_for(&self, address: &Address) -> Option<&Arc<dyn LogHandler>> {
		self.handlers.get(address)
	}

	/// All registered addresses in ascending order.
	pub fn addresses(&self) -> Vec<Address> {
		let mut addresses: Vec<Address> = self.handlers.keys().copied().collect();
		addresses.sort();
		addresses
	}

	pub fn len(&self) -> usize {
		self.handlers.len()
	}

	pub fn is_empty(&self) -> bool {
		self.handlers.is_empty()
	}
}

impl fmt::Debug for ContractRegistry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_map()
			.entries(
				self.addresses()
					.into_iter()
					.filter_map(|a| self.handlers.get(&a).map(|h| (a, h.name()))),
			)
			.finish()
	}
}
