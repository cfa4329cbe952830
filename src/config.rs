//! Service configuration
//!
//! Configuration comes either from a JSON file or from `LEDGER_SYNC_*` environment variables.
//! When [`CONFIG_PATH_ENV`] is set the file wins and the individual variables are ignored.
//!
//! ```bash
//! LEDGER_SYNC_RPC_URL=http://localhost:8545 \
//! LEDGER_SYNC_ADDRESSES=0x1a94fce7ef36bc90959e206ba569a12afbc91ca1 \
//! LEDGER_SYNC_START_BLOCK=6039000 \
//! ledger-filter-sync
//! ```

use crate::rpc::{Address, DEFAULT_REQUEST_TIMEOUT};
use crate::sync::{DEFAULT_POLL_INTERVAL, progress_tracker::DEFAULT_PROGRESS_LOG_INTERVAL};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Path of a JSON config file to load instead of the individual variables.
pub const CONFIG_PATH_ENV: &str = "LEDGER_SYNC_CONFIG";
/// JSON-RPC endpoint of the ledger node. Required.
pub const RPC_URL_ENV: &str = "LEDGER_SYNC_RPC_URL";
/// Comma-separated contract addresses to watch. Required.
pub const ADDRESSES_ENV: &str = "LEDGER_SYNC_ADDRESSES";
/// Directory holding the cursor state file.
pub const DATA_DIR_ENV: &str = "LEDGER_SYNC_DATA_DIR";
/// Block to start from when nothing has been synced yet. Defaults to the chain head.
pub const START_BLOCK_ENV: &str = "LEDGER_SYNC_START_BLOCK";
/// Milliseconds between poll cycles.
pub const POLL_INTERVAL_ENV: &str = "LEDGER_SYNC_POLL_INTERVAL_MS";
/// Milliseconds before an RPC request times out.
pub const REQUEST_TIMEOUT_ENV: &str = "LEDGER_SYNC_REQUEST_TIMEOUT_MS";
/// Blocks between progress log lines.
pub const PROGRESS_LOG_INTERVAL_ENV: &str = "LEDGER_SYNC_PROGRESS_LOG_INTERVAL";

/// Default data directory, relative to the working directory.
pub const DEFAULT_DATA_DIR: &str = "./data";

/// Error types for configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	#[error("Missing required setting {0}")]
	Missing(&'static str),

	#[error("Invalid value {value:?} for {name}: {reason}")]
	Invalid {
		name: &'static str,
		value: String,
		reason: String,
	},

	#[error("No contract addresses configured")]
	NoAddresses,

	#[error("Failed to read config file {path:?}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Failed to parse config file: {0}")]
	Json(#[from] serde_json::Error),
}

/// Settings for the sync service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
	/// JSON-RPC endpoint of the ledger node.
	pub rpc_url: String,
	/// Contracts whose logs are synchronized.
	pub addresses: Vec<Address>,
	/// Directory holding the cursor state file.
	#[serde(default = "default_data_dir")]
	pub data_dir: PathBuf,
	/// Block to start from when nothing has been synced yet.
	#[serde(default)]
	pub start_block: Option<u64>,
	#[serde(default = "default_poll_interval_ms")]
	pub poll_interval_ms: u64,
	#[serde(default = "default_request_timeout_ms")]
	pub request_timeout_ms: u64,
	#[serde(default = "default_progress_log_interval")]
	pub progress_log_interval: u64,
}

fn default_data_dir() -> PathBuf {
	PathBuf::from(DEFAULT_DATA_DIR)
}

fn default_poll_interval_ms() -> u64 {
	DEFAULT_POLL_INTERVAL.as_millis() as u64
}

fn default_request_timeout_ms() -> u64 {
	DEFAULT_REQUEST_TIMEOUT.as_millis() as u64
}

fn default_progress_log_interval() -> u64 {
	DEFAULT_PROGRESS_LOG_INTERVAL
}

impl SyncConfig {
	/// Load from the environment, preferring a config file if [`CONFIG_PATH_ENV`] is set.
	pub fn from_env() -> Result<Self, ConfigError> {
		match std::env::var(CONFIG_PATH_ENV) {
			Ok(path) if !path.trim().is_empty() => Self::from_file(path.trim()),
			_ => Self::from_vars(|name| std::env::var(name).ok()),
		}
	}

	/// Build from a variable lookup function such as `std::env::var`.
	pub fn from_vars<F>(lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let get = |name: &str| {
			lookup(name)
				.map(|v| v.trim().to_string())
				.filter(|v| !v.is_empty())
		};

		let rpc_url = get(RPC_URL_ENV).ok_or(ConfigError::Missing(RPC_URL_ENV))?;
		let addresses = parse_addresses(
			&get(ADDRESSES_ENV).ok_or(ConfigError::Missing(ADDRESSES_ENV))?,
		)?;

		let config = Self {
			rpc_url,
			addresses,
			data_dir: get(DATA_DIR_ENV)
				.map(PathBuf::from)
				.unwrap_or_else(default_data_dir),
			start_block: get(START_BLOCK_ENV)
				.map(|v| parse_number(START_BLOCK_ENV, &v))
				.transpose()?,
			poll_interval_ms: get(POLL_INTERVAL_ENV)
				.map(|v| parse_number(POLL_INTERVAL_ENV, &v))
				.transpose()?
				.unwrap_or_else(default_poll_interval_ms),
			request_timeout_ms: get(REQUEST_TIMEOUT_ENV)
				.map(|v| parse_number(REQUEST_TIMEOUT_ENV, &v))
				.transpose()?
				.unwrap_or_else(default_request_timeout_ms),
			progress_log_interval: get(PROGRESS_LOG_INTERVAL_ENV)
				.map(|v| parse_number(PROGRESS_LOG_INTERVAL_ENV, &v))
				.transpose()?
				.unwrap_or_else(default_progress_log_interval),
		};
		config.validate()?;
		Ok(config)
	}

	/// Load from a JSON file.
	pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
			path: path.to_path_buf(),
			source,
		})?;
		let config: Self = serde_json::from_str(&content)?;
		config.validate()?;
		Ok(config)
	}

	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.rpc_url.trim().is_empty() {
			return Err(ConfigError::Missing(RPC_URL_ENV));
		}
		if self.addresses.is_empty() {
			return Err(ConfigError::NoAddresses);
		}
		if self.poll_interval_ms == 0 {
			return Err(ConfigError::Invalid {
				name: POLL_INTERVAL_ENV,
				value: "0".to_string(),
				reason: "must be positive".to_string(),
			});
		}
		Ok(())
	}

	pub fn poll_interval(&self) -> Duration {
		Duration::from_millis(self.poll_interval_ms)
	}

	pub fn request_timeout(&self) -> Duration {
		Duration::from_millis(self.request_timeout_ms)
	}
}

fn parse_addresses(raw: &str) -> Result<Vec<Address>, ConfigError> {
	let mut addresses = raw
		.split(',')
		.map(str::trim)
		.filter(|s| !s.is_empty())
		.map(|s| {
			s.parse::<Address>().map_err(|e| ConfigError::Invalid {
				name: ADDRESSES_ENV,
				value: s.to_string(),
				reason: e.to_string(),
			})
		})
		.collect::<Result<Vec<_>, _>>()?;

	addresses.sort();
	addresses.dedup();
	if addresses.is_empty() {
		return Err(ConfigError::NoAddresses);
	}
	Ok(addresses)
}

fn parse_number(name: &'static str, value: &str) -> Result<u64, ConfigError> {
	value.parse::<u64>().map_err(|e| ConfigError::Invalid {
		name,
		value: value.to_string(),
		reason: e.to_string(),
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::HashMap;

	const AA: &str = "0x00000000000000000000000000000000000000aa";
	const BB: &str = "0x00000000000000000000000000000000000000bb";

	fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
		let vars: HashMap<String, String> = vars
			.iter()
			.map(|(k, v)| (k.to_string(), v.to_string()))
			.collect();
		move |name| vars.get(name).cloned()
	}

	#[test]
	fn minimal_vars_use_defaults() {
		let config =
			SyncConfig::from_vars(lookup(&[(RPC_URL_ENV, "http://localhost:8545"), (ADDRESSES_ENV, AA)]))
				.unwrap();

		assert_eq!(config.rpc_url, "http://localhost:8545");
		assert_eq!(config.addresses, vec![AA.parse::<Address>().unwrap()]);
		assert_eq!(config.data_dir, PathBuf::from(DEFAULT_DATA_DIR));
		assert_eq!(config.start_block, None);
		assert_eq!(config.poll_interval(), DEFAULT_POLL_INTERVAL);
		assert_eq!(config.request_timeout(), DEFAULT_REQUEST_TIMEOUT);
		assert_eq!(config.progress_log_interval, DEFAULT_PROGRESS_LOG_INTERVAL);
	}

	#[test]
	fn addresses_are_trimmed_sorted_and_deduplicated() {
		let config = SyncConfig::from_vars(lookup(&[
			(RPC_URL_ENV, "http://localhost:8545"),
			(
				ADDRESSES_ENV,
				" 0x00000000000000000000000000000000000000BB, 0x00000000000000000000000000000000000000aa,,0x00000000000000000000000000000000000000bb",
			),
		]))
		.unwrap();

		assert_eq!(
			config.addresses,
			vec![AA.parse::<Address>().unwrap(), BB.parse::<Address>().unwrap()]
		);
	}

	#[test]
	fn optional_numbers_are_parsed() {
		let config = SyncConfig::from_vars(lookup(&[
			(RPC_URL_ENV, "http://localhost:8545"),
			(ADDRESSES_ENV, AA),
			(START_BLOCK_ENV, "100"),
			(POLL_INTERVAL_ENV, "500"),
			(DATA_DIR_ENV, "/var/lib/ledger-sync"),
		]))
		.unwrap();

		assert_eq!(config.start_block, Some(100));
		assert_eq!(config.poll_interval(), Duration::from_millis(500));
		assert_eq!(config.data_dir, PathBuf::from("/var/lib/ledger-sync"));
	}

	#[test]
	fn missing_rpc_url_is_rejected() {
		assert!(matches!(
			SyncConfig::from_vars(lookup(&[(ADDRESSES_ENV, AA)])),
			Err(ConfigError::Missing(RPC_URL_ENV))
		));
	}

	#[test]
	fn bad_values_are_rejected() {
		assert!(matches!(
			SyncConfig::from_vars(lookup(&[
				(RPC_URL_ENV, "http://localhost:8545"),
				(ADDRESSES_ENV, "0xabc"),
			])),
			Err(ConfigError::Invalid { name: ADDRESSES_ENV, .. })
		));
		assert!(matches!(
			SyncConfig::from_vars(lookup(&[
				(RPC_URL_ENV, "http://localhost:8545"),
				(ADDRESSES_ENV, AA),
				(START_BLOCK_ENV, "latest"),
			])),
			Err(ConfigError::Invalid { name: START_BLOCK_ENV, .. })
		));
		assert!(matches!(
			SyncConfig::from_vars(lookup(&[
				(RPC_URL_ENV, "http://localhost:8545"),
				(ADDRESSES_ENV, " , "),
			])),
			Err(ConfigError::NoAddresses)
		));
	}

	#[test]
	fn config_file_is_loaded_with_defaults() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("sync.json");
		std::fs::write(
			&path,
			format!(
				r#"{{"rpc_url": "http://node:8545", "addresses": ["{}"], "start_block": 100}}"#,
				AA.to_uppercase().replacen("0X", "0x", 1)
			),
		)
		.unwrap();

		let config = SyncConfig::from_file(&path).unwrap();
		assert_eq!(config.addresses, vec![AA.parse::<Address>().unwrap()]);
		assert_eq!(config.start_block, Some(100));
		assert_eq!(config.poll_interval(), DEFAULT_POLL_INTERVAL);
	}

	#[test]
	fn config_file_without_addresses_is_rejected() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("sync.json");
		std::fs::write(&path, r#"{"rpc_url": "http://node:8545", "addresses": []}"#).unwrap();

		assert!(matches!(
			SyncConfig::from_file(&path),
			Err(ConfigError::NoAddresses)
		));
	}
}
