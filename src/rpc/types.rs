//! Wire and value types for talking to an Ethereum-style ledger node.
//!
//! Addresses, hashes and block tags are the `alloy` types; this module only adds the pieces the
//! synchronizer needs on top of them.

use alloy_eips::BlockNumberOrTag;
use alloy_primitives::{Address, B256};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Log entry as returned by `eth_getFilterChanges`.
pub type RpcLog = alloy_rpc_types_eth::Log;

/// Identifier of a server-side filter as handed out by `eth_newFilter`.
///
/// Nodes return it as a hex quantity; it is persisted as a decimal string. The id means nothing
/// once the node has dropped the filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FilterId(u128);

impl FilterId {
	pub const fn new(id: u128) -> Self {
		Self(id)
	}

	pub fn value(&self) -> u128 {
		self.0
	}
}

impl fmt::Display for FilterId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl FromStr for FilterId {
	type Err = std::num::ParseIntError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		s.trim().parse::<u128>().map(Self)
	}
}

impl Serialize for FilterId {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		alloy_serde::quantity::serialize(&self.0, serializer)
	}
}

impl<'de> Deserialize<'de> for FilterId {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let id: u128 = alloy_serde::quantity::deserialize(deserializer)?;
		Ok(Self(id))
	}
}

/// Parameters for `eth_newFilter`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogFilter {
	pub from_block: BlockNumberOrTag,
	pub to_block: BlockNumberOrTag,
	pub address: Vec<Address>,
}

impl LogFilter {
	pub fn new(from_block: BlockNumberOrTag, to_block: BlockNumberOrTag, address: Vec<Address>) -> Self {
		Self {
			from_block,
			to_block,
			address,
		}
	}
}

/// A log entry matched by a filter and already included in a block.
///
/// Only the address and block number are interpreted by the synchronizer. The node's full log
/// is carried through to handlers untouched via [`Log::inner`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Log {
	block_number: u64,
	inner: RpcLog,
}

impl Log {
	/// A log with only the fields the synchronizer needs populated.
	pub fn new(address: Address, block_number: u64) -> Self {
		Self {
			block_number,
			inner: RpcLog {
				inner: alloy_primitives::Log {
					address,
					data: Default::default(),
				},
				block_number: Some(block_number),
				..Default::default()
			},
		}
	}

	/// The contract that emitted the event.
	pub fn address(&self) -> Address {
		self.inner.inner.address
	}

	/// Height of the block containing the event.
	pub fn block_number(&self) -> u64 {
		self.block_number
	}

	pub fn topics(&self) -> &[B256] {
		self.inner.inner.data.topics()
	}

	/// Set by the node when the log was dropped by a chain reorganization.
	pub fn removed(&self) -> bool {
		self.inner.removed
	}

	/// The log exactly as the node returned it.
	pub fn inner(&self) -> &RpcLog {
		&self.inner
	}
}

impl TryFrom<RpcLog> for Log {
	type Error = LedgerError;

	fn try_from(log: RpcLog) -> Result<Self, Self::Error> {
		let block_number = log.block_number.ok_or_else(|| {
			LedgerError::InvalidResponse(format!(
				"log from {} has no block number",
				log.inner.address
			))
		})?;
		Ok(Self {
			block_number,
			inner: log,
		})
	}
}

/// Error types for ledger node operations
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
	/// The node no longer knows the filter, usually because it expired from disuse.
	#[error("Filter not found: {0}")]
	FilterNotFound(FilterId),

	#[error("JSON-RPC error {code}: {message}")]
	RpcError { code: i64, message: String },

	#[error("HTTP error: {0}")]
	HttpError(#[from] reqwest::Error),

	#[error("JSON parse error: {0}")]
	JsonError(#[from] serde_json::Error),

	#[error("Invalid response: {0}")]
	InvalidResponse(String),

	#[error("No data returned")]
	NoData,
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy_primitives::address;
	use serde_json::json;

	#[test]
	fn filter_id_is_hex_on_the_wire_and_decimal_in_storage() {
		let id: FilterId = serde_json::from_value(json!("0x1f")).unwrap();
		assert_eq!(id.to_string(), "31");
		assert_eq!("31".parse::<FilterId>().unwrap(), id);
		assert_eq!(serde_json::to_value(id).unwrap(), json!("0x1f"));
	}

	#[test]
	fn wide_filter_ids_fit() {
		let id: FilterId =
			serde_json::from_value(json!("0xcd0c3e8af590364c09d0fa6a1210faf5")).unwrap();
		assert_eq!(id.value(), 0xcd0c3e8af590364c09d0fa6a1210faf5);
	}

	#[test]
	fn log_filter_serializes_as_new_filter_params() {
		let filter = LogFilter::new(
			BlockNumberOrTag::Number(100),
			BlockNumberOrTag::Latest,
			vec![address!("00000000000000000000000000000000000000aa")],
		);
		let params = serde_json::to_value(&filter).unwrap();
		assert_eq!(params["fromBlock"], "0x64");
		assert_eq!(params["toBlock"], "latest");
		assert_eq!(params["address"].as_array().map(Vec::len), Some(1));
		assert_eq!(
			params["address"][0]
				.as_str()
				.map(str::to_ascii_lowercase)
				.as_deref(),
			Some("0x00000000000000000000000000000000000000aa")
		);
	}

	#[test]
	fn log_converts_from_node_payload() {
		let payload = json!({
			"address": "0x1A94FCE7EF36BC90959E206BA569A12AFBC91CA1",
			"blockHash": "0x7c5a35e9cb3e8ae0e221ab470abae9d446c3a5626ce6689fc777dcffcab52c70",
			"blockNumber": "0x5c29fb",
			"data": "0x0000000000000000000000003e3310720058c51f0de456e273c626cdeab05a75",
			"logIndex": "0x1d",
			"removed": false,
			"topics": [
				"0x241ea03ca20251805084d27d4440371c34a0b85ff108f6bb5611248f73818b80"
			],
			"transactionHash": "0x3dc91b98249fa9f2c5c37486a2427a3a7825be240c1c84961dfb3063d9c04d50",
			"transactionIndex": "0x1d"
		});

		let raw: RpcLog = serde_json::from_value(payload).unwrap();
		let log = Log::try_from(raw).unwrap();
		assert_eq!(
			log.address(),
			address!("1a94fce7ef36bc90959e206ba569a12afbc91ca1")
		);
		assert_eq!(log.block_number(), 6040059);
		assert_eq!(log.inner().log_index, Some(29));
		assert_eq!(log.topics().len(), 1);
		assert!(!log.removed());
	}

	#[test]
	fn pending_log_without_block_is_rejected() {
		let mut raw = Log::new(address!("00000000000000000000000000000000000000aa"), 7)
			.inner()
			.clone();
		raw.block_number = None;
		assert!(matches!(
			Log::try_from(raw),
			Err(LedgerError::InvalidResponse(_))
		));
	}
}
