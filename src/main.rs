use ledger_filter_sync::{
	ContractRegistry, FileCursorStore, JsonRpcLedgerClient, LoggingHandler, SyncConfig,
	SyncRunner, Synchronizer,
};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
	// Initialize tracing subscriber, RUST_LOG overrides the info default
	tracing_subscriber::fmt()
		.with_env_filter(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
		)
		.with_target(false)
		.with_thread_ids(false)
		.with_thread_names(false)
		.with_file(false)
		.with_line_number(false)
		.with_timer(tracing_subscriber::fmt::time::time())
		.init();

	let config = match SyncConfig::from_env() {
		Ok(config) => config,
		Err(e) => {
			error!("Invalid configuration: {}", e);
			return ExitCode::FAILURE;
		}
	};

	info!("Starting ledger filter sync against {}", config.rpc_url);

	let client = match JsonRpcLedgerClient::with_timeout(config.rpc_url.clone(), config.request_timeout())
	{
		Ok(client) => client,
		Err(e) => {
			error!("Failed to create ledger client: {}", e);
			return ExitCode::FAILURE;
		}
	};

	let store = FileCursorStore::new(config.data_dir.clone());
	info!("Using cursor state at {:?}", store.path());

	let mut contracts = ContractRegistry::new();
	for address in &config.addresses {
		contracts.register(*address, Arc::new(LoggingHandler));
	}

	let mut synchronizer = Synchronizer::new(Arc::new(client), Arc::new(store), contracts)
		.with_progress_log_interval(config.progress_log_interval);
	if let Some(start_block) = config.start_block {
		synchronizer = synchronizer.with_start_block(start_block);
	}

	let shutdown = async {
		if let Err(e) = tokio::signal::ctrl_c().await {
			warn!("Failed to listen for Ctrl-C: {}", e);
			std::future::pending::<()>().await;
		}
	};

	let stats = SyncRunner::new(synchronizer, config.poll_interval())
		.run_until(shutdown)
		.await;

	info!("Finished: {}", stats.summary());
	ExitCode::SUCCESS
}
