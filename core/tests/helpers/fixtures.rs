use ark_core::kind::LinkFile;

use std::{
	path::{Path, PathBuf},
	time::{Duration, SystemTime},
};

use filetime::{set_file_mtime, FileTime};
use futures::{stream::BoxStream, FutureExt, StreamExt};
use tokio::fs;

pub const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

async fn create_parent(path: &Path) {
	fs::create_dir_all(path.parent().unwrap()).await.unwrap();
}

/// A file the image detector accepts, `body` makes its content unique
pub async fn write_png(path: impl AsRef<Path>, body: &[u8]) -> PathBuf {
	let path = path.as_ref();
	create_parent(path).await;

	let mut content = PNG_SIGNATURE.to_vec();
	content.extend_from_slice(body);
	fs::write(path, content).await.unwrap();

	path.to_path_buf()
}

pub async fn write_file(path: impl AsRef<Path>, content: &[u8]) -> PathBuf {
	let path = path.as_ref();
	create_parent(path).await;
	fs::write(path, content).await.unwrap();

	path.to_path_buf()
}

pub async fn write_link(path: impl AsRef<Path>, url: &str, title: &str, desc: &str) -> PathBuf {
	let content = serde_json::to_vec(&LinkFile {
		url: url.to_string(),
		title: title.to_string(),
		desc: desc.to_string(),
	})
	.unwrap();

	write_file(path, &content).await
}

/// Moves the modification time of a file into the future, so it is seen as modified
pub fn bump_mtime(path: impl AsRef<Path>) {
	set_file_mtime(
		path,
		FileTime::from_system_time(SystemTime::now() + Duration::from_secs(60)),
	)
	.unwrap();
}

/// Every event already sent on a failure stream
pub fn drain(stream: &mut BoxStream<'static, PathBuf>) -> Vec<PathBuf> {
	let mut paths = vec![];
	while let Some(Some(path)) = stream.next().now_or_never() {
		paths.push(path);
	}

	paths.sort();
	paths
}
