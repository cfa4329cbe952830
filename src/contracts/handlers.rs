use crate::contracts::registry::{HandlerError, LogHandler};
use crate::rpc::Log;
use tracing::info;

/// Handler that records every log it receives through `tracing`.
#[derive(Debug, Clone, Default)]
pub struct LoggingHandler;

#[async_trait::async_trait]
impl LogHandler for LoggingHandler {
	async fn handle(&self, log: &Log) -> Result<(), HandlerError> {
		info!(
			"Log from {} at block {} (tx {}, index {}, topic0 {}){}",
			log.address(),
			log.block_number(),
			log.inner()
				.transaction_hash
				.map(|h| h.to_string())
				.unwrap_or_else(|| "unknown".to_string()),
			log.inner()
				.log_index
				.map(|i| i.to_string())
				.unwrap_or_else(|| "-".to_string()),
			log.topics()
				.first()
				.map(|t| t.to_string())
				.unwrap_or_else(|| "none".to_string()),
			if log.removed() { " [removed]" } else { "" }
		);
		Ok(())
	}

	fn name(&self) -> &'static str {
		"LoggingHandler"
	}
}
