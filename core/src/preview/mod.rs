//! Preview orchestration boundary.
//!
//! The index asks a [`PreviewStorage`] to make sure a preview exists for every resource and to
//! drop the previews of resources that are gone. Producing pixels is left to a
//! [`PreviewRenderer`].

use crate::{
	kind::ResourceKind,
	resource::{ResourceId, ResourceMeta},
	util::error::FileIOError,
};

use std::{
	path::{Path, PathBuf},
	time::Duration,
};

use async_trait::async_trait;
use thiserror::Error;

mod shard;
mod thumbnail;

pub use shard::get_shard_hex;
pub use thumbnail::ThumbnailStorage;

pub const WEBP_EXTENSION: &str = "webp";

/// Where the full size preview and the small thumbnail of a resource live
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PreviewLocation {
	pub preview: PathBuf,
	pub thumbnail: PathBuf,
}

#[derive(Error, Debug)]
pub enum PreviewError {
	#[error("preview rendering timed out after {timeout:?} <path='{}'>", .path.display())]
	Timeout { path: Box<Path>, timeout: Duration },
	#[error("failed to render preview <path='{}'>: {reason}", .path.display())]
	Render { path: Box<Path>, reason: String },
	#[error(transparent)]
	FileIO(#[from] FileIOError),
}

#[async_trait]
pub trait PreviewStorage: Send + Sync + 'static {
	/// Makes sure a preview of the resource exists, doing nothing if one was already generated
	async fn generate(&self, path: &Path, meta: &ResourceMeta) -> Result<(), PreviewError>;

	async fn locate(&self, path: &Path, meta: &ResourceMeta) -> Option<PreviewLocation>;

	/// Deletes whatever was generated for `id`
	async fn forget(&self, id: &ResourceId) -> Result<(), PreviewError>;
}

/// Turns a resource into its preview and thumbnail images
#[async_trait]
pub trait PreviewRenderer: Send + Sync + 'static {
	fn supports(&self, kind: &ResourceKind) -> bool;

	async fn render(
		&self,
		source: &Path,
		kind: &ResourceKind,
		target: &PreviewLocation,
	) -> Result<(), PreviewError>;
}
