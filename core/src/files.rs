//! Layout of the application folder kept inside every indexed root.

use std::path::{Path, PathBuf};

/// Names of the folders and files the index owns under a root
pub struct ArkFiles;

impl ArkFiles {
	pub const ARK_FOLDER: &'static str = ".ark";
	pub const PREVIEWS_FOLDER: &'static str = "previews";
	pub const THUMBNAILS_FOLDER: &'static str = "thumbnails";
	pub const CONFIG_FILE: &'static str = "index.json";

	#[must_use]
	pub fn ark_folder(root: impl AsRef<Path>) -> PathBuf {
		root.as_ref().join(Self::ARK_FOLDER)
	}

	#[must_use]
	pub fn previews_dir(root: impl AsRef<Path>) -> PathBuf {
		Self::ark_folder(root).join(Self::PREVIEWS_FOLDER)
	}

	#[must_use]
	pub fn thumbnails_dir(root: impl AsRef<Path>) -> PathBuf {
		Self::ark_folder(root).join(Self::THUMBNAILS_FOLDER)
	}

	#[must_use]
	pub fn config_file(root: impl AsRef<Path>) -> PathBuf {
		Self::ark_folder(root).join(Self::CONFIG_FILE)
	}

	/// Whether a directory entry name is the application folder itself
	#[must_use]
	pub fn is_ark_folder(name: &std::ffi::OsStr) -> bool {
		name == Self::ARK_FOLDER
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn layout_under_root() {
		let root = Path::new("/home/user/pictures");

		assert_eq!(
			ArkFiles::previews_dir(root),
			Path::new("/home/user/pictures/.ark/previews")
		);
		assert_eq!(
			ArkFiles::thumbnails_dir(root),
			Path::new("/home/user/pictures/.ark/thumbnails")
		);
		assert_eq!(
			ArkFiles::config_file(root),
			Path::new("/home/user/pictures/.ark/index.json")
		);
		assert!(ArkFiles::is_ark_folder(std::ffi::OsStr::new(".ark")));
		assert!(!ArkFiles::is_ark_folder(std::ffi::OsStr::new("ark")));
	}
}
