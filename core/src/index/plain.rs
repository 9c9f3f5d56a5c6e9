use crate::{
	config::IndexConfig,
	kind::KindRegistry,
	persistence::{ResourceDao, ResourceRow, ResourceWithExtra},
	preview::{PreviewLocation, PreviewStorage},
	resource::{ResourceId, ResourceMeta},
	util::path_str,
};

use std::{
	collections::{hash_map::Entry, HashMap, HashSet},
	future::ready,
	path::{Path, PathBuf},
	sync::Arc,
};

use async_trait::async_trait;
use futures::{stream::BoxStream, StreamExt};
use tokio::sync::{broadcast, Mutex, MutexGuard};
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};
use tracing::{debug, instrument, trace, warn};

use super::{
	catalog::Catalog,
	difference::{calculate_difference, Difference},
	reconcile::{forget_preview, Reconciler},
	walk::{DirectoryLister, LocalLister},
	IndexError, ResourceIndex,
};

/// Configures and loads a [`PlainResourceIndex`]
#[must_use]
pub struct IndexBuilder {
	root: PathBuf,
	dao: Arc<dyn ResourceDao>,
	previews: Arc<dyn PreviewStorage>,
	registry: KindRegistry,
	lister: Option<Arc<dyn DirectoryLister>>,
	config: IndexConfig,
}

impl IndexBuilder {
	pub fn registry(mut self, registry: KindRegistry) -> Self {
		self.registry = registry;
		self
	}

	/// Defaults to a [`LocalLister`] honoring [`IndexConfig::skip_hidden`]
	pub fn lister(mut self, lister: impl DirectoryLister) -> Self {
		self.lister = Some(Arc::new(lister));
		self
	}

	pub fn config(mut self, config: IndexConfig) -> Self {
		self.config = config;
		self
	}

	/// Restores the catalog from the persisted snapshot of the root.
	///
	/// The snapshot is only trusted here, the first [`ResourceIndex::reindex`] reconciles it
	/// with the filesystem.
	#[instrument(skip_all, fields(root = %self.root.display()), err)]
	pub async fn load(self) -> Result<PlainResourceIndex, IndexError> {
		let Self {
			root,
			dao,
			previews,
			registry,
			lister,
			config,
		} = self;

		let rows = dao.load_resources(path_str(&root)?).await?;
		let resources = restore_resources(rows, &registry)?;

		debug!(resources = resources.len(), "Loaded persisted resources;");

		let (failures_tx, _) = broadcast::channel(config.failure_channel_capacity());

		Ok(PlainResourceIndex {
			lister: lister.unwrap_or_else(|| Arc::new(LocalLister::new(config.skip_hidden))),
			root,
			catalog: Mutex::new(Catalog::new(resources)),
			dao,
			previews,
			registry,
			failures_tx,
			config,
		})
	}
}

fn restore_resources(
	rows: Vec<ResourceWithExtra>,
	registry: &KindRegistry,
) -> Result<HashMap<PathBuf, ResourceMeta>, IndexError> {
	let mut resources = HashMap::with_capacity(rows.len());

	for row in rows {
		match resources.entry(PathBuf::from(&row.resource.path)) {
			Entry::Occupied(entry) => {
				return Err(IndexError::DuplicatePath(entry.key().as_path().into()));
			}
			Entry::Vacant(entry) => {
				entry.insert(ResourceMeta::from_row(&row, registry));
			}
		}
	}

	Ok(resources)
}

/// Index of a single root directory.
///
/// Every operation serializes through one async mutex guarding the [`Catalog`].
pub struct PlainResourceIndex {
	root: PathBuf,
	catalog: Mutex<Catalog>,
	dao: Arc<dyn ResourceDao>,
	previews: Arc<dyn PreviewStorage>,
	registry: KindRegistry,
	lister: Arc<dyn DirectoryLister>,
	failures_tx: broadcast::Sender<PathBuf>,
	config: IndexConfig,
}

impl PlainResourceIndex {
	pub fn builder(
		root: impl Into<PathBuf>,
		dao: Arc<dyn ResourceDao>,
		previews: Arc<dyn PreviewStorage>,
	) -> IndexBuilder {
		IndexBuilder {
			root: root.into(),
			dao,
			previews,
			registry: KindRegistry::default(),
			lister: None,
			config: IndexConfig::default(),
		}
	}

	#[must_use]
	pub fn root(&self) -> &Path {
		&self.root
	}

	#[must_use]
	pub const fn config(&self) -> &IndexConfig {
		&self.config
	}

	/// What the next [`ResourceIndex::reindex`] would apply, without applying it
	pub async fn calculate_difference(&self) -> Result<Difference, IndexError> {
		let catalog = self.catalog.lock().await;

		Ok(calculate_difference(&catalog, &self.root, self.lister.as_ref()).await?)
	}

	pub async fn locate_preview(&self, id: &ResourceId) -> Option<PreviewLocation> {
		let (path, meta) = {
			let catalog = self.catalog.lock().await;
			let path = catalog.try_get_path(id)?.clone();
			let meta = catalog.try_get_meta(id)?.clone();
			(path, meta)
		};

		self.previews.locate(&path, &meta).await
	}

	pub(crate) async fn lock_catalog(&self) -> MutexGuard<'_, Catalog> {
		self.catalog.lock().await
	}

	fn reconciler(&self) -> Reconciler<'_> {
		Reconciler {
			root: &self.root,
			dao: self.dao.as_ref(),
			previews: &self.previews,
			registry: &self.registry,
			failures_tx: &self.failures_tx,
			delete_batch_size: self.config.delete_batch_size(),
			preview_concurrency: self.config.preview_concurrency(),
		}
	}

	pub(crate) async fn reindex_locked(&self, catalog: &mut Catalog) -> Result<(), IndexError> {
		let difference = calculate_difference(catalog, &self.root, self.lister.as_ref()).await?;

		self.reconciler().reconcile(catalog, difference).await
	}

	pub(crate) async fn remove_locked(
		&self,
		catalog: &mut Catalog,
		id: &ResourceId,
	) -> Result<PathBuf, IndexError> {
		let path = catalog
			.try_get_path(id)
			.cloned()
			.ok_or_else(|| IndexError::NotFound(id.clone()))?;

		self.dao
			.delete_paths(vec![path_str(&path)?.to_string()])
			.await?;

		catalog.try_remove(id);

		if !catalog.contains_id(id) {
			forget_preview(self.previews.as_ref(), id).await;
		}

		debug!(%id, path = %path.display(), "Removed resource;");

		Ok(path)
	}

	pub(crate) async fn update_locked(
		&self,
		catalog: &mut Catalog,
		old_id: &ResourceId,
		path: &Path,
		new_meta: ResourceMeta,
	) -> Result<(), IndexError> {
		let current = catalog
			.get(path)
			.ok_or_else(|| IndexError::UnknownPath(path.into()))?;

		if &current.id != old_id {
			return Err(IndexError::IdMismatch {
				path: path.into(),
				expected: old_id.clone(),
				actual: current.id.clone(),
			});
		}

		self.dao
			.update_resource(
				old_id,
				&new_meta.id,
				new_meta.modified.timestamp_millis(),
				new_meta.size,
			)
			.await?;
		self.dao.update_extras(old_id, &new_meta.id).await?;

		if old_id != &new_meta.id {
			self.restore_duplicates(catalog, old_id, path).await?;
		}

		let new_id = new_meta.id.clone();
		catalog.replace_id(old_id, path, new_meta);

		if old_id != &new_id && !catalog.contains_id(old_id) {
			forget_preview(self.previews.as_ref(), old_id).await;
		}

		debug!(%old_id, %new_id, path = %path.display(), "Updated resource;");

		Ok(())
	}

	/// Storage updates are keyed by id, so they also rewrite every other path holding `old_id`.
	/// Those paths keep their content and get their rows and extras back.
	async fn restore_duplicates(
		&self,
		catalog: &Catalog,
		old_id: &ResourceId,
		updated: &Path,
	) -> Result<(), IndexError> {
		let duplicates = catalog
			.entries()
			.filter(|(path, meta)| &meta.id == old_id && path.as_path() != updated)
			.collect::<Vec<_>>();

		let Some((_, first)) = duplicates.first() else {
			return Ok(());
		};
		let extras = self.registry.to_extras(old_id, &first.kind);

		let rows = duplicates
			.iter()
			.map(|(path, meta)| ResourceRow::new(&self.root, path, meta))
			.collect::<Result<Vec<_>, _>>()?;

		trace!(count = rows.len(), %old_id, "Restoring duplicates of an updated resource");

		self.dao.insert_resources(rows).await?;
		if !extras.is_empty() {
			self.dao.insert_extras(extras).await?;
		}

		Ok(())
	}
}

#[async_trait]
impl ResourceIndex for PlainResourceIndex {
	async fn list_resources(&self, prefix: Option<&Path>) -> HashSet<ResourceMeta> {
		self.catalog.lock().await.list(prefix)
	}

	async fn get_path(&self, id: &ResourceId) -> Option<PathBuf> {
		self.catalog.lock().await.try_get_path(id).cloned()
	}

	async fn get_meta(&self, id: &ResourceId) -> Option<ResourceMeta> {
		self.catalog.lock().await.try_get_meta(id).cloned()
	}

	async fn remove(&self, id: &ResourceId) -> Result<PathBuf, IndexError> {
		let mut catalog = self.catalog.lock().await;

		self.remove_locked(&mut catalog, id).await
	}

	async fn update_resource(
		&self,
		old_id: &ResourceId,
		path: &Path,
		new_meta: ResourceMeta,
	) -> Result<(), IndexError> {
		let mut catalog = self.catalog.lock().await;

		self.update_locked(&mut catalog, old_id, path, new_meta)
			.await
	}

	async fn reindex(&self) -> Result<(), IndexError> {
		let mut catalog = self.catalog.lock().await;

		self.reindex_locked(&mut catalog).await
	}

	fn kind_detect_failures(&self) -> BoxStream<'static, PathBuf> {
		BroadcastStream::new(self.failures_tx.subscribe())
			.filter_map(|res| {
				ready(match res {
					Ok(path) => Some(path),
					Err(BroadcastStreamRecvError::Lagged(skipped)) => {
						warn!(skipped, "Kind detection failure subscriber lagged behind");
						None
					}
				})
			})
			.boxed()
	}
}
