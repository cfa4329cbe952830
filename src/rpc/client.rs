//!
//! JSON-RPC client for Ethereum-style ledger nodes.
//!
//! This module defines the `LedgerClient` trait consumed by the synchronizer and an HTTP
//! implementation of it. Only the three filter-related calls the synchronizer needs are exposed.
//! All methods are async and designed for use with Tokio.

use super::types::*;
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, info};

/// Default timeout applied to every HTTP request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Remote operations the synchronizer needs from a ledger node.
#[async_trait::async_trait]
pub trait LedgerClient: Send + Sync {
	/// Install a log filter on the node and return its id.
	async fn new_filter(&self, filter: &LogFilter) -> Result<FilterId, LedgerError>;

	/// Fetch logs accumulated by a filter since the previous poll.
	///
	/// Fails with [`LedgerError::FilterNotFound`] when the node no longer knows the filter.
	async fn get_filter_changes(&self, filter_id: FilterId) -> Result<Vec<Log>, LedgerError>;

	/// Height of the node's current chain head.
	async fn block_number(&self) -> Result<u64, LedgerError>;
}

/// Ledger client speaking JSON-RPC 2.0 over HTTP
#[derive(Clone)]
pub struct JsonRpcLedgerClient {
	/// The underlying HTTP client.
	http_client: Client,
	/// The node's JSON-RPC endpoint.
	rpc_url: String,
	/// Source of request ids, shared between clones.
	next_id: Arc<AtomicU64>,
}

impl JsonRpcLedgerClient {
	/// Create a new client with the default request timeout.
	pub fn new(rpc_url: String) -> Result<Self, LedgerError> {
		Self::with_timeout(rpc_url, DEFAULT_REQUEST_TIMEOUT)
	}

	/// Create a new client whose requests fail after `timeout`.
	pub fn with_timeout(rpc_url: String, timeout: Duration) -> Result<Self, LedgerError> {
		let http_client = Client::builder().timeout(timeout).build()?;

		Ok(Self {
			http_client,
			rpc_url,
			next_id: Arc::new(AtomicU64::new(1)),
		})
	}

	/// Execute a JSON-RPC call and return its `result` member.
	///
	/// # Errors
	/// A JSON-RPC error object is returned as [`LedgerError::RpcError`]; callers that know which
	/// errors are recoverable reclassify it.
	pub async fn call(&self, method: &str, params: Value) -> Result<Value, LedgerError> {
		let id = self.next_id.fetch_add(1, Ordering::Relaxed);
		let request_body = build_request(id, method, params);
		debug!("JSON-RPC request {} -> {}: {}", id, method, request_body["params"]);

		let response = self
			.http_client
			.post(&self.rpc_url)
			.header("Content-Type", "application/json")
			.json(&request_body)
			.send()
			.await?;

		let status = response.status();
		let body = response.text().await?;
		if !status.is_success() {
			return Err(http_status_error(status, &body));
		}

		let response_json: Value = serde_json::from_str(&body)?;
		parse_response(response_json)
	}
}

#[async_trait::async_trait]
impl LedgerClient for JsonRpcLedgerClient {
	async fn new_filter(&self, filter: &LogFilter) -> Result<FilterId, LedgerError> {
		let result = self.call("eth_newFilter", json!([filter])).await?;
		let filter_id = parse_filter_id(result)?;

		info!(
			"Installed log filter {} from block {} over {} addresses",
			filter_id,
			filter.from_block,
			filter.address.len()
		);
		Ok(filter_id)
	}

	async fn get_filter_changes(&self, filter_id: FilterId) -> Result<Vec<Log>, LedgerError> {
		let result = self
			.call("eth_getFilterChanges", json!([filter_id]))
			.await
			.map_err(|e| classify_filter_error(e, filter_id))?;

		let logs = parse_logs(result)?;
		debug!("Filter {} returned {} logs", filter_id, logs.len());
		Ok(logs)
	}

	async fn block_number(&self) -> Result<u64, LedgerError> {
		let result = self.call("eth_blockNumber", json!([])).await?;
		let raw = result.to_string();
		alloy_serde::quantity::deserialize(result).map_err(|e: serde_json::Error| {
			LedgerError::InvalidResponse(format!("eth_blockNumber returned {}: {}", raw, e))
		})
	}
}

fn build_request(id: u64, method: &str, params: Value) -> Value {
	json!({
		"jsonrpc": "2.0",
		"id": id,
		"method": method,
		"params": params
	})
}

fn parse_response(mut response: Value) -> Result<Value, LedgerError> {
	if let Some(error) = response.get("error") {
		let code = error.get("code").and_then(|c| c.as_i64()).unwrap_or(0);
		let message = error
			.get("message")
			.and_then(|m| m.as_str())
			.unwrap_or("Unknown JSON-RPC error")
			.to_string();
		return Err(LedgerError::RpcError { code, message });
	}

	response
		.get_mut("result")
		.map(Value::take)
		.ok_or(LedgerError::NoData)
}

/// Error for a non-success HTTP status.
///
/// Some gateways relay JSON-RPC errors with a 4xx/5xx status. When the body carries a JSON-RPC
/// error object that error is returned so it can still be classified; otherwise the status is.
fn http_status_error(status: StatusCode, body: &str) -> LedgerError {
	if let Ok(value) = serde_json::from_str::<Value>(body) {
		if value.get("error").is_some() {
			if let Err(error) = parse_response(value) {
				return error;
			}
		}
	}

	LedgerError::RpcError {
		code: i64::from(status.as_u16()),
		message: format!("HTTP error: {}", status),
	}
}

/// Turn the node's "filter not found" reply into the typed variant.
///
/// Geth and most compatible nodes answer `-32000 "filter not found"`; Nethermind answers
/// `"Filter with id: N does not exist."`. Everything else passes through unchanged.
fn classify_filter_error(error: LedgerError, filter_id: FilterId) -> LedgerError {
	match error {
		LedgerError::RpcError { ref message, .. } if is_filter_not_found(message) => {
			LedgerError::FilterNotFound(filter_id)
		}
		other => other,
	}
}

fn is_filter_not_found(message: &str) -> bool {
	let message = message.to_ascii_lowercase();
	message.contains("filter not found")
		|| (message.contains("filter") && message.contains("does not exist"))
}

fn parse_filter_id(result: Value) -> Result<FilterId, LedgerError> {
	let raw = result.to_string();
	serde_json::from_value(result).map_err(|e| {
		LedgerError::InvalidResponse(format!("eth_newFilter returned {}: {}", raw, e))
	})
}

fn parse_logs(result: Value) -> Result<Vec<Log>, LedgerError> {
	let items = match result {
		Value::Null => return Ok(Vec::new()),
		Value::Array(items) => items,
		other => {
			return Err(LedgerError::InvalidResponse(format!(
				"eth_getFilterChanges returned {}",
				other
			)));
		}
	};

	items
		.into_iter()
		.map(|item| {
			if !item.is_object() {
				return Err(LedgerError::InvalidResponse(format!(
					"expected log object from eth_getFilterChanges, got {}",
					item
				)));
			}
			Log::try_from(serde_json::from_value::<RpcLog>(item)?)
		})
		.collect()
}
