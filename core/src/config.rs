use crate::{files::ArkFiles, util::error::FileIOError};

use std::{
	io,
	path::{Path, PathBuf},
	time::Duration,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::fs;
use tracing::debug;

/// Tunables of a [`PlainResourceIndex`](crate::index::PlainResourceIndex).
///
/// Fields missing from the file take their default value, so older config files stay readable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
	/// How many paths are sent to [`ResourceDao::delete_paths`](crate::persistence::ResourceDao::delete_paths) per call
	pub delete_batch_size: usize,
	/// Buffered kind detection failures per subscriber before the slowest one lags
	pub failure_channel_capacity: usize,
	/// Upper bound for a single preview rendering
	pub preview_timeout_secs: u64,
	/// Previews rendered at the same time during a reindex
	pub preview_concurrency: usize,
	/// Skip files and directories whose name starts with a dot
	pub skip_hidden: bool,
}

impl Default for IndexConfig {
	fn default() -> Self {
		Self {
			delete_batch_size: 512,
			failure_channel_capacity: 1024,
			preview_timeout_secs: 300,
			preview_concurrency: 8,
			skip_hidden: false,
		}
	}
}

impl IndexConfig {
	/// Conventional location of the config file for a root
	#[must_use]
	pub fn path_for(root: impl AsRef<Path>) -> PathBuf {
		ArkFiles::config_file(root)
	}

	/// Reads the config at `path`, falling back to defaults when there is no file yet
	pub async fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();

		match fs::read(path).await {
			Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
			Err(e) if e.kind() == io::ErrorKind::NotFound => {
				debug!(path = %path.display(), "No index config found, using defaults");
				Ok(Self::default())
			}
			Err(e) => Err(FileIOError::from((path, e, "Failed to read index config")).into()),
		}
	}

	pub async fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
		let path = path.as_ref();

		if let Some(parent) = path.parent() {
			fs::create_dir_all(parent)
				.await
				.map_err(|e| FileIOError::from((parent, e, "Failed to create config directory")))?;
		}

		fs::write(path, serde_json::to_vec_pretty(self)?)
			.await
			.map_err(|e| FileIOError::from((path, e)))?;

		Ok(())
	}

	pub(crate) fn delete_batch_size(&self) -> usize {
		self.delete_batch_size.max(1)
	}

	pub(crate) fn failure_channel_capacity(&self) -> usize {
		self.failure_channel_capacity.max(1)
	}

	pub(crate) fn preview_concurrency(&self) -> usize {
		self.preview_concurrency.max(1)
	}

	#[must_use]
	pub const fn preview_timeout(&self) -> Duration {
		Duration::from_secs(self.preview_timeout_secs)
	}
}

#[derive(Error, Debug)]
pub enum ConfigError {
	#[error(transparent)]
	SerdeJson(#[from] serde_json::Error),
	#[error(transparent)]
	FileIO(#[from] FileIOError),
}
