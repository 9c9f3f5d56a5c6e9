use crate::util::error::FileIOError;

use std::path::Path;

use thiserror::Error;
use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{
	filter::{LevelFilter, ParseError},
	fmt::{self, Layer},
	prelude::*,
	util::TryInitError,
	EnvFilter,
};

pub const LOGS_DIR: &str = "logs";
const LOG_FILE_PREFIX: &str = "ark.log";

#[cfg(debug_assertions)]
const CONSOLE_LOG_FILTER: LevelFilter = LevelFilter::DEBUG;

#[cfg(not(debug_assertions))]
const CONSOLE_LOG_FILTER: LevelFilter = LevelFilter::INFO;

#[derive(Error, Debug)]
pub enum LoggerError {
	#[error(transparent)]
	FileIO(#[from] FileIOError),
	#[error("invalid tracing directive: {0}")]
	Directive(#[from] ParseError),
	#[error("a global tracing subscriber is already installed: {0}")]
	Init(#[from] TryInitError),
}

/// Installs the global subscriber: stdout plus a daily rolling file under `<data_dir>/logs`.
///
/// The returned guard flushes the file writer on drop, keep it alive for as long as logs matter.
pub fn init_logger(data_dir: impl AsRef<Path>) -> Result<WorkerGuard, LoggerError> {
	let logs_dir = data_dir.as_ref().join(LOGS_DIR);
	std::fs::create_dir_all(&logs_dir)
		.map_err(|e| FileIOError::from((&logs_dir, e, "Failed to create logs directory")))?;

	let (non_blocking, guard) =
		tracing_appender::non_blocking(rolling::daily(&logs_dir, LOG_FILE_PREFIX));

	tracing_subscriber::registry()
		.with(
			EnvFilter::from_default_env()
				.add_directive("warn".parse()?)
				.add_directive("ark_core=debug".parse()?)
				.add_directive("ark_file_ext=debug".parse()?),
		)
		.with(fmt::layer().with_filter(CONSOLE_LOG_FILTER))
		.with(
			Layer::default()
				.with_writer(non_blocking)
				.with_ansi(false)
				.with_filter(LevelFilter::DEBUG),
		)
		.try_init()?;

	Ok(guard)
}
