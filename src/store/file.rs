//! File-based implementation of the `CursorStore` trait.
//!
//! All values live in one JSON document under the data directory. Every write replaces the
//! document through a temporary file and a rename, so readers never see a half-written file.

use super::{CursorStore, StoreError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Name of the cursor document inside the data directory.
pub const CURSOR_STATE_FILENAME: &str = "cursor_state.json";

#[derive(Debug, Default, Serialize, Deserialize)]
struct CursorDocument {
	values: BTreeMap<String, String>,
	#[serde(default)]
	updated_at: Option<String>,
}

/// File-backed cursor store
pub struct FileCursorStore {
	path: PathBuf,
	/// Serializes read-modify-write cycles on the document.
	write_lock: Mutex<()>,
}

impl FileCursorStore {
	pub fn new(data_dir: PathBuf) -> Self {
		Self {
			path: data_dir.join(CURSOR_STATE_FILENAME),
			write_lock: Mutex::new(()),
		}
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	async fn load(&self) -> Result<CursorDocument, StoreError> {
		let content = match tokio::fs::read_to_string(&self.path).await {
			Ok(content) => content,
			Err(e) if e.kind() == ErrorKind::NotFound => return Ok(CursorDocument::default()),
			Err(e) => return Err(e.into()),
		};

		serde_json::from_str(&content).map_err(|e| {
			StoreError::Corrupt(format!("Failed to parse {:?}: {}", self.path, e))
		})
	}

	async fn save(&self, document: &CursorDocument) -> Result<(), StoreError> {
		if let Some(parent) = self.path.parent() {
			tokio::fs::create_dir_all(parent).await?;
		}

		let content = serde_json::to_string_pretty(document)?;
		let tmp_path = self.path.with_extension("json.tmp");
		tokio::fs::write(&tmp_path, content).await?;
		tokio::fs::rename(&tmp_path, &self.path).await?;
		Ok(())
	}
}

#[async_trait::async_trait]
impl CursorStore for FileCursorStore {
	async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
		let document = self.load().await?;
		Ok(document.values.get(key).cloned())
	}

	async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
		let _guard = self.write_lock.lock().await;

		let mut document = self.load().await?;
		if document.values.is_empty() {
			info!("Creating cursor state at {:?}", self.path);
		}
		document.values.insert(key.to_string(), value.to_string());
		document.updated_at = Some(chrono::Utc::now().to_rfc3339());
		self.save(&document).await?;

		debug!("Saved {}={} to {:?}", key, value, self.path);
		Ok(())
	}
}
