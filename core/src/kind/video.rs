use crate::{persistence::ExtraRow, resource::ResourceId};

use ark_file_ext::extensions::ALL_VIDEO_EXTENSIONS;

use std::{
	collections::{HashMap, HashSet},
	path::Path,
};

use async_trait::async_trait;

use super::{
	parse_extra, string_set, verify_signature, DetectionError, KindCode, MetaExtraTag,
	ResourceKind, ResourceKindFactory,
};

/// Classifies videos. Dimensions and duration need a decoder, so detection leaves them empty
#[derive(Debug)]
pub struct VideoKindFactory {
	extensions: HashSet<String>,
	mime_types: HashSet<String>,
}

impl VideoKindFactory {
	#[must_use]
	pub fn new() -> Self {
		Self {
			extensions: ALL_VIDEO_EXTENSIONS.iter().map(ToString::to_string).collect(),
			mime_types: string_set(["video/*"]),
		}
	}
}

impl Default for VideoKindFactory {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl ResourceKindFactory for VideoKindFactory {
	fn code(&self) -> KindCode {
		KindCode::Video
	}

	fn accepted_extensions(&self) -> &HashSet<String> {
		&self.extensions
	}

	fn accepted_mime_types(&self) -> &HashSet<String> {
		&self.mime_types
	}

	async fn from_path(&self, path: &Path) -> Result<ResourceKind, DetectionError> {
		verify_signature(path).await?;

		Ok(ResourceKind::bare(KindCode::Video))
	}

	fn from_extras(&self, extras: &HashMap<MetaExtraTag, String>) -> ResourceKind {
		ResourceKind::Video {
			height: parse_extra(extras, MetaExtraTag::Height),
			width: parse_extra(extras, MetaExtraTag::Width),
			duration: parse_extra(extras, MetaExtraTag::Duration),
		}
	}

	fn to_extras(&self, id: &ResourceId, kind: &ResourceKind) -> Vec<ExtraRow> {
		let ResourceKind::Video {
			height,
			width,
			duration,
		} = kind
		else {
			return vec![];
		};

		[
			(MetaExtraTag::Height, height.map(|v| v.to_string())),
			(MetaExtraTag::Width, width.map(|v| v.to_string())),
			(MetaExtraTag::Duration, duration.map(|v| v.to_string())),
		]
		.into_iter()
		.filter_map(|(tag, value)| value.map(|value| ExtraRow::new(id.clone(), tag, value)))
		.collect()
	}
}
