use crate::resource::{ResourceId, ResourceMeta};

use std::{
	collections::HashSet,
	path::{Path, PathBuf},
	sync::Arc,
};

use async_trait::async_trait;
use futures::stream::{select_all, BoxStream, StreamExt};
use futures_concurrency::future::Join;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, instrument};

use super::{catalog::Catalog, plain::PlainResourceIndex, IndexError, ResourceIndex};

/// One index over several roots.
///
/// Multi root operations hold this index's own lock and take the catalog locks of the roots
/// always in the order they were given, so they never deadlock against each other.
pub struct AggregatedResourceIndex {
	shards: Vec<Arc<PlainResourceIndex>>,
	lock: Mutex<()>,
}

impl AggregatedResourceIndex {
	#[must_use]
	pub fn new(shards: Vec<Arc<PlainResourceIndex>>) -> Self {
		Self {
			shards,
			lock: Mutex::new(()),
		}
	}

	#[must_use]
	pub fn shards(&self) -> &[Arc<PlainResourceIndex>] {
		&self.shards
	}

	fn shard_for_path(&self, path: &Path) -> Option<&PlainResourceIndex> {
		self.shards
			.iter()
			.filter(|shard| path.starts_with(shard.root()))
			.max_by_key(|shard| shard.root().components().count())
			.map(Arc::as_ref)
	}

	async fn lock_all(&self) -> Vec<MutexGuard<'_, Catalog>> {
		let mut catalogs = Vec::with_capacity(self.shards.len());
		for shard in &self.shards {
			catalogs.push(shard.lock_catalog().await);
		}

		catalogs
	}

	async fn find<T>(&self, id: &ResourceId, get: impl Fn(&Catalog) -> Option<T> + Send) -> Option<T>
	where
		T: Send,
	{
		let _guard = self.lock.lock().await;

		for shard in &self.shards {
			if let Some(found) = get(&*shard.lock_catalog().await) {
				return Some(found);
			}
		}

		debug!(%id, "Resource not found in any root");

		None
	}
}

#[async_trait]
impl ResourceIndex for AggregatedResourceIndex {
	async fn list_resources(&self, prefix: Option<&Path>) -> HashSet<ResourceMeta> {
		let _guard = self.lock.lock().await;

		self.lock_all()
			.await
			.iter()
			.flat_map(|catalog| catalog.list(prefix))
			.collect()
	}

	async fn get_path(&self, id: &ResourceId) -> Option<PathBuf> {
		self.find(id, |catalog| catalog.try_get_path(id).cloned())
			.await
	}

	async fn get_meta(&self, id: &ResourceId) -> Option<ResourceMeta> {
		self.find(id, |catalog| catalog.try_get_meta(id).cloned())
			.await
	}

	async fn remove(&self, id: &ResourceId) -> Result<PathBuf, IndexError> {
		let _guard = self.lock.lock().await;

		for shard in &self.shards {
			let mut catalog = shard.lock_catalog().await;
			if catalog.try_get_path(id).is_some() {
				return shard.remove_locked(&mut catalog, id).await;
			}
		}

		Err(IndexError::NotFound(id.clone()))
	}

	async fn update_resource(
		&self,
		old_id: &ResourceId,
		path: &Path,
		new_meta: ResourceMeta,
	) -> Result<(), IndexError> {
		let _guard = self.lock.lock().await;

		let shard = self
			.shard_for_path(path)
			.ok_or_else(|| IndexError::UnknownPath(path.into()))?;

		let mut catalog = shard.lock_catalog().await;

		shard
			.update_locked(&mut catalog, old_id, path, new_meta)
			.await
	}

	/// Roots are independent, they are reindexed concurrently
	#[instrument(skip_all, fields(roots = self.shards.len()), err)]
	async fn reindex(&self) -> Result<(), IndexError> {
		let _guard = self.lock.lock().await;

		self.shards
			.iter()
			.map(|shard| shard.reindex())
			.collect::<Vec<_>>()
			.join()
			.await
			.into_iter()
			.collect()
	}

	fn kind_detect_failures(&self) -> BoxStream<'static, PathBuf> {
		select_all(self.shards.iter().map(|shard| shard.kind_detect_failures())).boxed()
	}
}
