//! The resource index: catalog of every detectable file under a root, kept in sync with the
//! filesystem by explicit reindexing.

use crate::{
	persistence::PersistenceError,
	resource::{ResourceId, ResourceMeta},
	util::error::{FileIOError, NonUtf8PathError},
};

use std::{
	collections::HashSet,
	path::{Path, PathBuf},
};

use async_trait::async_trait;
use futures::stream::BoxStream;
use thiserror::Error;

mod aggregated;
mod catalog;
mod difference;
mod plain;
mod reconcile;
mod walk;

pub use aggregated::AggregatedResourceIndex;
pub use difference::Difference;
pub use plain::{IndexBuilder, PlainResourceIndex};
pub use walk::{Children, DirectoryLister, LocalLister};

#[derive(Error, Debug)]
pub enum IndexError {
	#[error("resource not found <id='{0}'>")]
	NotFound(ResourceId),
	#[error("path isn't part of the index <path='{}'>", .0.display())]
	UnknownPath(Box<Path>),
	#[error(
		"path holds another id <path='{}', expected='{expected}', actual='{actual}'>",
		.path.display()
	)]
	IdMismatch {
		path: Box<Path>,
		expected: ResourceId,
		actual: ResourceId,
	},
	#[error("persisted snapshot holds more than one row for <path='{}'>", .0.display())]
	DuplicatePath(Box<Path>),
	#[error(transparent)]
	Persistence(#[from] PersistenceError),
	#[error(transparent)]
	FileIO(#[from] FileIOError),
	#[error(transparent)]
	NonUtf8Path(#[from] NonUtf8PathError),
}

#[async_trait]
pub trait ResourceIndex: Send + Sync {
	/// Every resource, or only those under `prefix`
	async fn list_resources(&self, prefix: Option<&Path>) -> HashSet<ResourceMeta>;

	async fn list_ids(&self, prefix: Option<&Path>) -> HashSet<ResourceId> {
		self.list_resources(prefix)
			.await
			.into_iter()
			.map(|meta| meta.id)
			.collect()
	}

	async fn list_all_ids(&self) -> HashSet<ResourceId> {
		self.list_ids(None).await
	}

	/// Representative path of the id, `None` if the index doesn't contain it
	async fn get_path(&self, id: &ResourceId) -> Option<PathBuf>;

	async fn get_meta(&self, id: &ResourceId) -> Option<ResourceMeta>;

	/// Drops the representative path of `id` from the index and from storage, returning it
	async fn remove(&self, id: &ResourceId) -> Result<PathBuf, IndexError>;

	/// Replaces the id of a path whose content was changed by the caller
	async fn update_resource(
		&self,
		old_id: &ResourceId,
		path: &Path,
		new_meta: ResourceMeta,
	) -> Result<(), IndexError>;

	/// Brings the index in line with the filesystem
	async fn reindex(&self) -> Result<(), IndexError>;

	/// Paths whose kind couldn't be detected, from now on
	fn kind_detect_failures(&self) -> BoxStream<'static, PathBuf>;
}
