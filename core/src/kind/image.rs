use crate::{persistence::ExtraRow, resource::ResourceId};

use ark_file_ext::extensions::ALL_IMAGE_EXTENSIONS;

use std::{
	collections::{HashMap, HashSet},
	path::Path,
};

use async_trait::async_trait;

use super::{
	string_set, verify_signature, DetectionError, KindCode, MetaExtraTag, ResourceKind,
	ResourceKindFactory,
};

#[derive(Debug)]
pub struct ImageKindFactory {
	extensions: HashSet<String>,
	mime_types: HashSet<String>,
}

impl ImageKindFactory {
	#[must_use]
	pub fn new() -> Self {
		Self {
			extensions: ALL_IMAGE_EXTENSIONS.iter().map(ToString::to_string).collect(),
			mime_types: string_set(["image/*"]),
		}
	}
}

impl Default for ImageKindFactory {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl ResourceKindFactory for ImageKindFactory {
	fn code(&self) -> KindCode {
		KindCode::Image
	}

	fn accepted_extensions(&self) -> &HashSet<String> {
		&self.extensions
	}

	fn accepted_mime_types(&self) -> &HashSet<String> {
		&self.mime_types
	}

	async fn from_path(&self, path: &Path) -> Result<ResourceKind, DetectionError> {
		verify_signature(path).await?;

		Ok(ResourceKind::Image)
	}

	fn from_extras(&self, _: &HashMap<MetaExtraTag, String>) -> ResourceKind {
		ResourceKind::Image
	}

	fn to_extras(&self, _: &ResourceId, _: &ResourceKind) -> Vec<ExtraRow> {
		vec![]
	}
}
