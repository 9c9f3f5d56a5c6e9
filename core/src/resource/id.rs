use crate::util::error::FileIOError;

use std::{fmt, path::Path};

use blake3::Hasher;
use serde::{Deserialize, Serialize};
use tokio::{
	fs::File,
	io::{self, AsyncReadExt, AsyncSeekExt, SeekFrom},
};

const SAMPLE_COUNT: u64 = 4;
const SAMPLE_SIZE: u64 = 10_000;
const MINIMUM_FILE_SIZE: u64 = SAMPLE_COUNT * SAMPLE_SIZE;
const ID_LEN: usize = 16;

/// Content derived identity of a resource.
///
/// Two files with the same content share an id, and renaming a file keeps its id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(String);

impl ResourceId {
	/// Hashes the size of the file along with a sample of its content.
	///
	/// Small files are hashed whole, bigger ones through evenly spaced samples plus their tail.
	pub async fn from_file(path: impl AsRef<Path>, size: u64) -> Result<Self, FileIOError> {
		let path = path.as_ref();

		generate_cas_id(path, size)
			.await
			.map(Self)
			.map_err(|e| FileIOError::from((path, e, "Failed to generate resource id")))
	}

	#[must_use]
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for ResourceId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<String> for ResourceId {
	fn from(id: String) -> Self {
		Self(id)
	}
}

impl From<&str> for ResourceId {
	fn from(id: &str) -> Self {
		Self(id.to_string())
	}
}

async fn read_at(file: &mut File, offset: u64, size: u64) -> Result<Vec<u8>, io::Error> {
	#[allow(clippy::cast_possible_truncation)]
	let mut buf = vec![0u8; size as usize];

	file.seek(SeekFrom::Start(offset)).await?;
	file.read_exact(&mut buf).await?;

	Ok(buf)
}

async fn generate_cas_id(path: &Path, size: u64) -> Result<String, io::Error> {
	let mut file = File::open(path).await?;
	let mut hasher = Hasher::new();
	hasher.update(&size.to_le_bytes());

	if size <= MINIMUM_FILE_SIZE {
		hasher.update(&read_at(&mut file, 0, size).await?);
	} else {
		let sample_interval = size / SAMPLE_COUNT;

		for i in 0..SAMPLE_COUNT {
			hasher.update(&read_at(&mut file, sample_interval * i, SAMPLE_SIZE).await?);
		}

		hasher.update(&read_at(&mut file, size - SAMPLE_SIZE, SAMPLE_SIZE).await?);
	}

	let mut id = hasher.finalize().to_hex();
	id.truncate(ID_LEN);

	Ok(id.to_string())
}
