//! Incremental log synchronization from an Ethereum-style ledger node.
//!
//! A [`Synchronizer`](sync::Synchronizer) keeps a log filter installed on the node, polls it,
//! and hands each matched log to the handler registered for the emitting contract. Progress is
//! persisted through a [`CursorStore`](store::CursorStore) so a restarted process resumes where
//! it stopped.

pub mod config;
pub mod contracts;
pub mod rpc;
pub mod store;
pub mod sync;

pub use config::{ConfigError, SyncConfig};
pub use contracts::{ContractRegistry, HandlerError, LogHandler, LoggingHandler};
pub use rpc::{
	Address, BlockNumberOrTag, FilterId, JsonRpcLedgerClient, LedgerClient, LedgerError, Log,
	LogFilter,
};
pub use store::{CursorStore, FileCursorStore, MemoryCursorStore, StoreError};
pub use sync::{SyncError, SyncRunner, SyncStats, Synchronizer};
