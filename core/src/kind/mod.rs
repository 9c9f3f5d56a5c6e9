//! Classification of files into [`ResourceKind`]s.
//!
//! Every kind has a detector implementing [`ResourceKindFactory`], registered in a
//! [`KindRegistry`]. The first detector accepting a path gets to classify it.

use crate::{
	persistence::ExtraRow,
	resource::ResourceId,
	util::error::{FileIOError, NonUtf8PathError},
};

use ark_file_ext::extensions::Extension;

use std::{
	collections::{HashMap, HashSet},
	fmt,
	path::Path,
	sync::Arc,
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use thiserror::Error;
use tokio::{fs::File, io::AsyncReadExt};
use tracing::trace;

mod document;
mod image;
mod link;
mod video;

pub use document::DocumentKindFactory;
pub use image::ImageKindFactory;
pub use link::{LinkFile, LinkKindFactory};
pub use video::VideoKindFactory;

/// Content metadata of a resource, specific to what the file is
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResourceKind {
	Image,
	Video {
		height: Option<u32>,
		width: Option<u32>,
		/// Milliseconds
		duration: Option<u64>,
	},
	Document {
		pages: Option<u32>,
	},
	Link {
		title: Option<String>,
		description: Option<String>,
		url: Option<String>,
	},
}

impl ResourceKind {
	#[must_use]
	pub const fn code(&self) -> KindCode {
		match self {
			Self::Image => KindCode::Image,
			Self::Video { .. } => KindCode::Video,
			Self::Document { .. } => KindCode::Document,
			Self::Link { .. } => KindCode::Link,
		}
	}

	/// The kind with every optional field empty
	#[must_use]
	pub const fn bare(code: KindCode) -> Self {
		match code {
			KindCode::Image => Self::Image,
			KindCode::Video => Self::Video {
				height: None,
				width: None,
				duration: None,
			},
			KindCode::Document => Self::Document { pages: None },
			KindCode::Link => Self::Link {
				title: None,
				description: None,
				url: None,
			},
		}
	}
}

/// Persisted discriminant of a [`ResourceKind`]
#[derive(
	Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum KindCode {
	Image,
	Video,
	Document,
	Link,
}

/// Key of a persisted kind specific field
#[derive(
	Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MetaExtraTag {
	Duration,
	Width,
	Height,
	Pages,
	Title,
	Description,
	Url,
}

#[derive(Error, Debug)]
pub enum DetectionError {
	#[error("no registered kind accepts <path='{}'>", .0.display())]
	UnsupportedKind(Box<Path>),
	#[error("content doesn't match the {extension} signature <path='{}'>", .path.display())]
	SignatureMismatch { path: Box<Path>, extension: Extension },
	#[error("malformed link file <path='{}'>: {source}", .path.display())]
	MalformedLink {
		path: Box<Path>,
		#[source]
		source: serde_json::Error,
	},
	#[error("unreadable link archive <path='{}'>: {source}", .path.display())]
	LinkArchive {
		path: Box<Path>,
		#[source]
		source: zip::result::ZipError,
	},
	#[error(transparent)]
	FileIO(#[from] FileIOError),
	#[error(transparent)]
	NonUtf8Path(#[from] NonUtf8PathError),
}

/// Detector for one [`ResourceKind`] variant
#[async_trait]
#[allow(clippy::wrong_self_convention)]
pub trait ResourceKindFactory: Send + Sync + 'static {
	fn code(&self) -> KindCode;

	/// Lowercase extensions, without the leading dot
	fn accepted_extensions(&self) -> &HashSet<String>;

	/// MIME essences like `application/pdf`, or a whole top level type like `image/*`
	fn accepted_mime_types(&self) -> &HashSet<String>;

	fn accepts(&self, path: &Path) -> bool {
		let Some(extension) = path
			.extension()
			.and_then(|ext| ext.to_str())
			.map(str::to_ascii_lowercase)
		else {
			return false;
		};

		if self.accepted_extensions().contains(&extension) {
			return true;
		}

		let mime_types = self.accepted_mime_types();
		mime_guess::from_ext(&extension).iter().any(|mime| {
			mime_types.contains(mime.essence_str())
				|| mime_types.contains(&format!("{}/*", mime.type_()))
		})
	}

	/// Reads the file and builds its kind, failing if the content isn't what the kind expects
	async fn from_path(&self, path: &Path) -> Result<ResourceKind, DetectionError>;

	/// Replays previously persisted fields, never fails
	fn from_extras(&self, extras: &HashMap<MetaExtraTag, String>) -> ResourceKind;

	fn to_extras(&self, id: &ResourceId, kind: &ResourceKind) -> Vec<ExtraRow>;
}

/// Ordered set of detectors
#[derive(Clone)]
pub struct KindRegistry {
	factories: Vec<Arc<dyn ResourceKindFactory>>,
}

impl fmt::Debug for KindRegistry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_list()
			.entries(self.factories.iter().map(|factory| factory.code()))
			.finish()
	}
}

impl Default for KindRegistry {
	fn default() -> Self {
		let mut registry = Self::empty();
		registry
			.register(ImageKindFactory::new())
			.register(VideoKindFactory::new())
			.register(DocumentKindFactory::new())
			.register(LinkKindFactory::new());

		registry
	}
}

impl KindRegistry {
	/// A registry without any detector, every path is unsupported
	#[must_use]
	pub const fn empty() -> Self {
		Self {
			factories: Vec::new(),
		}
	}

	/// Appends a detector, detectors registered earlier take precedence
	pub fn register(&mut self, factory: impl ResourceKindFactory) -> &mut Self {
		self.factories.push(Arc::new(factory));
		self
	}

	#[must_use]
	pub fn factory_for(&self, path: &Path) -> Option<&dyn ResourceKindFactory> {
		self.factories
			.iter()
			.find(|factory| factory.accepts(path))
			.map(Arc::as_ref)
	}

	fn factory_by_code(&self, code: KindCode) -> Option<&dyn ResourceKindFactory> {
		self.factories
			.iter()
			.find(|factory| factory.code() == code)
			.map(Arc::as_ref)
	}

	pub async fn detect(&self, path: &Path) -> Result<ResourceKind, DetectionError> {
		let factory = self
			.factory_for(path)
			.ok_or_else(|| DetectionError::UnsupportedKind(path.into()))?;

		trace!(path = %path.display(), code = %factory.code(), "Detecting kind");

		factory.from_path(path).await
	}

	#[must_use]
	#[allow(clippy::wrong_self_convention)]
	pub fn from_extras(
		&self,
		code: KindCode,
		extras: &HashMap<MetaExtraTag, String>,
	) -> ResourceKind {
		self.factory_by_code(code).map_or_else(
			|| ResourceKind::bare(code),
			|factory| factory.from_extras(extras),
		)
	}

	#[must_use]
	pub fn to_extras(&self, id: &ResourceId, kind: &ResourceKind) -> Vec<ExtraRow> {
		self.factory_by_code(kind.code())
			.map(|factory| factory.to_extras(id, kind))
			.unwrap_or_default()
	}
}

/// Checks the leading bytes of a file against the signature of its extension, if there is one
pub(crate) async fn verify_signature(path: &Path) -> Result<(), DetectionError> {
	let Some(extension) = Extension::from_path(path) else {
		return Ok(());
	};

	let header_len = extension.header_len();
	if header_len == 0 {
		return Ok(());
	}

	let file = File::open(path)
		.await
		.map_err(|e| FileIOError::from((path, e, "Failed to open resource")))?;

	let mut header = Vec::with_capacity(header_len);
	file.take(header_len as u64)
		.read_to_end(&mut header)
		.await
		.map_err(|e| FileIOError::from((path, e, "Failed to read resource header")))?;

	if extension.matches_header(&header) == Some(false) {
		return Err(DetectionError::SignatureMismatch {
			path: path.into(),
			extension,
		});
	}

	Ok(())
}

pub(crate) fn string_set<'a>(values: impl IntoIterator<Item = &'a str>) -> HashSet<String> {
	values.into_iter().map(ToString::to_string).collect()
}

pub(crate) fn parse_extra<T: std::str::FromStr>(
	extras: &HashMap<MetaExtraTag, String>,
	tag: MetaExtraTag,
) -> Option<T> {
	extras.get(&tag).and_then(|value| value.parse().ok())
}
