use crate::{files::ArkFiles, util::error::FileIOError};

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::{trace, warn};

/// Direct children of a directory
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Children {
	pub directories: Vec<PathBuf>,
	pub files: Vec<PathBuf>,
}

/// Enumerates the filesystem for the index
#[async_trait]
pub trait DirectoryLister: Send + Sync + 'static {
	async fn list_children(&self, dir: &Path) -> Result<Children, FileIOError>;
}

/// [`DirectoryLister`] over the local filesystem.
///
/// Never enters the application folder. Symlinks to files are listed, symlinks to directories
/// are not followed.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalLister {
	skip_hidden: bool,
}

impl LocalLister {
	#[must_use]
	pub const fn new(skip_hidden: bool) -> Self {
		Self { skip_hidden }
	}
}

#[async_trait]
impl DirectoryLister for LocalLister {
	async fn list_children(&self, dir: &Path) -> Result<Children, FileIOError> {
		let mut read_dir = fs::read_dir(dir)
			.await
			.map_err(|e| FileIOError::from((dir, e, "Failed to read directory")))?;

		let mut children = Children::default();

		while let Some(entry) = read_dir
			.next_entry()
			.await
			.map_err(|e| FileIOError::from((dir, e, "Failed to read directory entry")))?
		{
			let name = entry.file_name();
			if ArkFiles::is_ark_folder(&name)
				|| (self.skip_hidden && name.as_encoded_bytes().starts_with(b"."))
			{
				continue;
			}

			let path = entry.path();
			let file_type = entry
				.file_type()
				.await
				.map_err(|e| FileIOError::from((&path, e, "Failed to read file type")))?;

			if file_type.is_dir() {
				children.directories.push(path);
			} else if file_type.is_file() {
				children.files.push(path);
			} else if file_type.is_symlink() {
				match fs::metadata(&path).await {
					Ok(metadata) if metadata.is_file() => children.files.push(path),
					Ok(_) => trace!(path = %path.display(), "Not following directory symlink"),
					Err(e) => warn!(?e, path = %path.display(), "Skipping broken symlink"),
				}
			}
		}

		Ok(children)
	}
}

/// Every file under `root`, depth first.
///
/// Failing to read `root` itself is an error, unreadable subdirectories are skipped.
pub(crate) async fn list_all_files(
	lister: &dyn DirectoryLister,
	root: &Path,
) -> Result<Vec<PathBuf>, FileIOError> {
	let Children {
		directories,
		mut files,
	} = lister.list_children(root).await?;

	let mut pending = directories;
	while let Some(dir) = pending.pop() {
		match lister.list_children(&dir).await {
			Ok(children) => {
				files.extend(children.files);
				pending.extend(children.directories);
			}
			Err(e) => warn!(%e, "Skipping unreadable directory"),
		}
	}

	Ok(files)
}

#[cfg(test)]
mod tests {
	use super::*;

	use std::collections::HashSet;

	use pretty_assertions::assert_eq;
	use tempfile::tempdir;
	use tracing_test::traced_test;

	async fn touch(path: &Path) {
		fs::create_dir_all(path.parent().unwrap()).await.unwrap();
		fs::write(path, b"x").await.unwrap();
	}

	#[tokio::test]
	#[traced_test]
	async fn walks_nested_directories() {
		let root = tempdir().unwrap();
		let root = root.path();
		touch(&root.join("a.png")).await;
		touch(&root.join("one/b.png")).await;
		touch(&root.join("one/two/c.pdf")).await;
		fs::create_dir_all(root.join("empty")).await.unwrap();

		let files = list_all_files(&LocalLister::default(), root)
			.await
			.unwrap()
			.into_iter()
			.collect::<HashSet<_>>();

		assert_eq!(
			files,
			HashSet::from([
				root.join("a.png"),
				root.join("one/b.png"),
				root.join("one/two/c.pdf"),
			])
		);
	}

	#[tokio::test]
	#[traced_test]
	async fn never_enters_ark_folder() {
		let root = tempdir().unwrap();
		let root = root.path();
		touch(&root.join("a.png")).await;
		touch(&ArkFiles::previews_dir(root).join("abc/abc.webp")).await;

		let files = list_all_files(&LocalLister::default(), root).await.unwrap();

		assert_eq!(files, vec![root.join("a.png")]);
	}

	#[tokio::test]
	#[traced_test]
	async fn hidden_entries_when_configured() {
		let root = tempdir().unwrap();
		let root = root.path();
		touch(&root.join(".hidden.png")).await;
		touch(&root.join(".cache/d.png")).await;
		touch(&root.join("e.png")).await;

		assert_eq!(
			list_all_files(&LocalLister::new(false), root)
				.await
				.unwrap()
				.len(),
			3
		);
		assert_eq!(
			list_all_files(&LocalLister::new(true), root).await.unwrap(),
			vec![root.join("e.png")]
		);
	}

	#[tokio::test]
	#[traced_test]
	async fn missing_root_is_an_error() {
		let root = tempdir().unwrap();

		assert!(list_all_files(&LocalLister::default(), &root.path().join("gone"))
			.await
			.unwrap_err()
			.is_not_found());
	}
}
