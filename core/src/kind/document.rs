use crate::{persistence::ExtraRow, resource::ResourceId};

use ark_file_ext::extensions::ALL_DOCUMENT_EXTENSIONS;

use std::{
	collections::{HashMap, HashSet},
	path::Path,
};

use async_trait::async_trait;

use super::{
	parse_extra, string_set, verify_signature, DetectionError, KindCode, MetaExtraTag,
	ResourceKind, ResourceKindFactory,
};

#[derive(Debug)]
pub struct DocumentKindFactory {
	extensions: HashSet<String>,
	mime_types: HashSet<String>,
}

impl DocumentKindFactory {
	#[must_use]
	pub fn new() -> Self {
		Self {
			extensions: ALL_DOCUMENT_EXTENSIONS
				.iter()
				.map(ToString::to_string)
				.collect(),
			mime_types: string_set([
				"application/pdf",
				"application/msword",
				"application/rtf",
				"application/epub+zip",
				"application/vnd.ms-excel",
				"application/vnd.ms-powerpoint",
				"application/vnd.oasis.opendocument.text",
				"application/vnd.oasis.opendocument.spreadsheet",
				"application/vnd.oasis.opendocument.presentation",
				"application/vnd.openxmlformats-officedocument.wordprocessingml.document",
				"application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
				"application/vnd.openxmlformats-officedocument.presentationml.presentation",
			]),
		}
	}
}

impl Default for DocumentKindFactory {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl ResourceKindFactory for DocumentKindFactory {
	fn code(&self) -> KindCode {
		KindCode::Document
	}

	fn accepted_extensions(&self) -> &HashSet<String> {
		&self.extensions
	}

	fn accepted_mime_types(&self) -> &HashSet<String> {
		&self.mime_types
	}

	async fn from_path(&self, path: &Path) -> Result<ResourceKind, DetectionError> {
		verify_signature(path).await?;

		Ok(ResourceKind::bare(KindCode::Document))
	}

	fn from_extras(&self, extras: &HashMap<MetaExtraTag, String>) -> ResourceKind {
		ResourceKind::Document {
			pages: parse_extra(extras, MetaExtraTag::Pages),
		}
	}

	fn to_extras(&self, id: &ResourceId, kind: &ResourceKind) -> Vec<ExtraRow> {
		match kind {
			ResourceKind::Document { pages: Some(pages) } => {
				vec![ExtraRow::new(id.clone(), MetaExtraTag::Pages, pages.to_string())]
			}
			_ => vec![],
		}
	}
}
