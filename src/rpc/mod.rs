//! Ledger node integration module
//!
//! This module provides the client trait and types for talking to an Ethereum-style JSON-RPC
//! node. The synchronizer only depends on the `LedgerClient` trait; `JsonRpcLedgerClient` is
//! the HTTP implementation used by the binary.

/// JSON-RPC client for the ledger node
mod client;
/// Type definitions for wire and value types
mod types;

pub use alloy_eips::BlockNumberOrTag;
pub use alloy_primitives::Address;
pub use client::{DEFAULT_REQUEST_TIMEOUT, JsonRpcLedgerClient, LedgerClient};
pub use types::*;
