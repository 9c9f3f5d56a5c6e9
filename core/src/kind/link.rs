use crate::{persistence::ExtraRow, resource::ResourceId, util::error::FileIOError};

use ark_file_ext::extensions::ALL_LINK_EXTENSIONS;

use std::{
	collections::{HashMap, HashSet},
	io::{Cursor, Read},
	path::Path,
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::fs;
use zip::{result::ZipError, ZipArchive};

use super::{DetectionError, KindCode, MetaExtraTag, ResourceKind, ResourceKindFactory};

/// Entry holding the [`LinkFile`] when a bookmark is stored as a zip archive
pub const ARCHIVED_LINK_ENTRY: &str = "link.json";

const ZIP_SIGNATURE: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];

/// On disk format of a `.link` bookmark, either plain or as the [`ARCHIVED_LINK_ENTRY`] of a
/// zip archive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkFile {
	pub url: String,
	pub title: String,
	pub desc: String,
}

#[derive(Debug)]
pub struct LinkKindFactory {
	extensions: HashSet<String>,
	mime_types: HashSet<String>,
}

impl LinkKindFactory {
	#[must_use]
	pub fn new() -> Self {
		Self {
			extensions: ALL_LINK_EXTENSIONS.iter().map(ToString::to_string).collect(),
			mime_types: HashSet::new(),
		}
	}
}

impl Default for LinkKindFactory {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl ResourceKindFactory for LinkKindFactory {
	fn code(&self) -> KindCode {
		KindCode::Link
	}

	fn accepted_extensions(&self) -> &HashSet<String> {
		&self.extensions
	}

	fn accepted_mime_types(&self) -> &HashSet<String> {
		&self.mime_types
	}

	async fn from_path(&self, path: &Path) -> Result<ResourceKind, DetectionError> {
		let bytes = fs::read(path)
			.await
			.map_err(|e| FileIOError::from((path, e, "Failed to read link file")))?;

		let json = if bytes.starts_with(&ZIP_SIGNATURE) {
			unpack_link_json(path, bytes)?
		} else {
			bytes
		};

		let LinkFile { url, title, desc } =
			serde_json::from_slice(&json).map_err(|source| DetectionError::MalformedLink {
				path: path.into(),
				source,
			})?;

		Ok(ResourceKind::Link {
			title: Some(title),
			description: Some(desc),
			url: Some(url),
		})
	}

	fn from_extras(&self, extras: &HashMap<MetaExtraTag, String>) -> ResourceKind {
		ResourceKind::Link {
			title: extras.get(&MetaExtraTag::Title).cloned(),
			description: extras.get(&MetaExtraTag::Description).cloned(),
			url: extras.get(&MetaExtraTag::Url).cloned(),
		}
	}

	fn to_extras(&self, id: &ResourceId, kind: &ResourceKind) -> Vec<ExtraRow> {
		let ResourceKind::Link {
			title,
			description,
			url,
		} = kind
		else {
			return vec![];
		};

		[
			(MetaExtraTag::Title, title),
			(MetaExtraTag::Description, description),
			(MetaExtraTag::Url, url),
		]
		.into_iter()
		.filter_map(|(tag, value)| {
			value
				.as_ref()
				.map(|value| ExtraRow::new(id.clone(), tag, value))
		})
		.collect()
	}
}

fn unpack_link_json(path: &Path, bytes: Vec<u8>) -> Result<Vec<u8>, DetectionError> {
	let unreadable = |source: ZipError| DetectionError::LinkArchive {
		path: path.into(),
		source,
	};

	let mut archive = ZipArchive::new(Cursor::new(bytes)).map_err(unreadable)?;
	let mut entry = archive.by_name(ARCHIVED_LINK_ENTRY).map_err(unreadable)?;

	let mut json = vec![];
	entry
		.read_to_end(&mut json)
		.map_err(|e| FileIOError::from((path, e, "Failed to unpack link file")))?;

	Ok(json)
}
