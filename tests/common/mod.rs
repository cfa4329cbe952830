#![allow(dead_code)]

use ledger_filter_sync::{
	Address, FilterId, HandlerError, LedgerClient, LedgerError, Log, LogFilter, LogHandler,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Scripted answer to one `get_filter_changes` call.
pub enum PollResponse {
	Logs(Vec<Log>),
	Expired,
	Failure(String),
}

#[derive(Default)]
struct MockState {
	created: Vec<LogFilter>,
	polled: Vec<FilterId>,
	next_filter_id: u128,
	responses: VecDeque<PollResponse>,
	always_fail: Option<String>,
	new_filter_failure: Option<String>,
	head: u64,
}

/// Ledger client that records calls and answers polls from a script.
///
/// Filters get sequential ids starting at 1. A poll with nothing scripted returns no logs.
pub struct MockLedgerClient {
	state: Mutex<MockState>,
}

impl MockLedgerClient {
	pub fn new() -> Arc<Self> {
		Self::starting_at(1)
	}

	pub fn starting_at(first_filter_id: u128) -> Arc<Self> {
		Arc::new(Self {
			state: Mutex::new(MockState {
				next_filter_id: first_filter_id,
				head: 1_000,
				..Default::default()
			}),
		})
	}

	pub fn push_logs(&self, logs: Vec<Log>) {
		self.state
			.lock()
			.unwrap()
			.responses
			.push_back(PollResponse::Logs(logs));
	}

	pub fn push_expired(&self) {
		self.state
			.lock()
			.unwrap()
			.responses
			.push_back(PollResponse::Expired);
	}

	pub fn push_failure(&self, message: &str) {
		self.state
			.lock()
			.unwrap()
			.responses
			.push_back(PollResponse::Failure(message.to_string()));
	}

	pub fn fail_every_poll(&self, message: &str) {
		self.state.lock().unwrap().always_fail = Some(message.to_string());
	}

	pub fn fail_new_filter(&self, message: &str) {
		self.state.lock().unwrap().new_filter_failure = Some(message.to_string());
	}

	pub fn created_filters(&self) -> Vec<LogFilter> {
		self.state.lock().unwrap().created.clone()
	}

	pub fn polled_ids(&self) -> Vec<FilterId> {
		self.state.lock().unwrap().polled.clone()
	}
}

#[async_trait::async_trait]
impl LedgerClient for MockLedgerClient {
	async fn new_filter(&self, filter: &LogFilter) -> Result<FilterId, LedgerError> {
		let mut state = self.state.lock().unwrap();
		if let Some(message) = &state.new_filter_failure {
			return Err(LedgerError::RpcError {
				code: -32000,
				message: message.clone(),
			});
		}
		state.created.push(filter.clone());
		let id = FilterId::new(state.next_filter_id);
		state.next_filter_id += 1;
		Ok(id)
	}

	async fn get_filter_changes(&self, filter_id: FilterId) -> Result<Vec<Log>, LedgerError> {
		let mut state = self.state.lock().unwrap();
		state.polled.push(filter_id);
		if let Some(message) = &state.always_fail {
			return Err(LedgerError::RpcError {
				code: -32603,
				message: message.clone(),
			});
		}
		match state.responses.pop_front() {
			None => Ok(Vec::new()),
			Some(PollResponse::Logs(logs)) => Ok(logs),
			Some(PollResponse::Expired) => Err(LedgerError::FilterNotFound(filter_id)),
			Some(PollResponse::Failure(message)) => Err(LedgerError::RpcError {
				code: -32603,
				message,
			}),
		}
	}

	async fn block_number(&self) -> Result<u64, LedgerError> {
		Ok(self.state.lock().unwrap().head)
	}
}

/// Handler that records the blocks it was given and can fail on one of them.
#[derive(Default)]
pub struct RecordingHandler {
	handled: Mutex<Vec<(Address, u64)>>,
	fail_on_block: Option<u64>,
}

impl RecordingHandler {
	pub fn new() -> Arc<Self> {
		Arc::new(Self::default())
	}

	pub fn failing_on(block: u64) -> Arc<Self> {
		Arc::new(Self {
			handled: Mutex::new(Vec::new()),
			fail_on_block: Some(block),
		})
	}

	/// Blocks of every log handled successfully, in order.
	pub fn blocks(&self) -> Vec<u64> {
		self.handled.lock().unwrap().iter().map(|(_, b)| *b).collect()
	}

	pub fn handled(&self) -> Vec<(Address, u64)> {
		self.handled.lock().unwrap().clone()
	}
}

#[async_trait::async_trait]
impl LogHandler for RecordingHandler {
	async fn handle(&self, log: &Log) -> Result<(), HandlerError> {
		if self.fail_on_block == Some(log.block_number()) {
			return Err(format!("cannot handle block {}", log.block_number()).into());
		}
		self.handled
			.lock()
			.unwrap()
			.push((log.address(), log.block_number()));
		Ok(())
	}

	fn name(&self) -> &'static str {
		"RecordingHandler"
	}
}

pub fn address(last: u8) -> Address {
	Address::with_last_byte(last)
}

pub fn log_at(address: Address, block: u64) -> Log {
	Log::new(address, block)
}
