use crate::{
	kind::KindRegistry,
	persistence::{ResourceDao, ResourceRow},
	preview::PreviewStorage,
	resource::{ResourceId, ResourceMeta},
	util::{error::report_error, path_str},
};

use std::{
	path::{Path, PathBuf},
	sync::Arc,
};

use futures_concurrency::future::Join;
use tokio::{
	spawn,
	sync::{broadcast, Semaphore},
	time::Instant,
};
use tracing::{debug, error, instrument, trace};

use super::{catalog::Catalog, difference::Difference, IndexError};

/// Applies a [`Difference`] to a catalog, its storage and its previews
pub(crate) struct Reconciler<'index> {
	pub(crate) root: &'index Path,
	pub(crate) dao: &'index dyn ResourceDao,
	pub(crate) previews: &'index Arc<dyn PreviewStorage>,
	pub(crate) registry: &'index KindRegistry,
	pub(crate) failures_tx: &'index broadcast::Sender<PathBuf>,
	pub(crate) delete_batch_size: usize,
	pub(crate) preview_concurrency: usize,
}

impl Reconciler<'_> {
	/// Nothing is installed in the catalog unless it was persisted first, a failed cycle leaves
	/// the difference to be found again by the next one
	#[instrument(
		skip_all,
		fields(
			root = %self.root.display(),
			deleted = difference.deleted.len(),
			updated = difference.updated.len(),
			added = difference.added.len(),
		),
		err
	)]
	pub(crate) async fn reconcile(
		&self,
		catalog: &mut Catalog,
		difference: Difference,
	) -> Result<(), IndexError> {
		let start = Instant::now();

		let Difference {
			deleted,
			updated,
			added,
		} = difference;

		// a failed delete must leave the deleted paths in the catalog
		self.delete_persisted(deleted.iter().chain(&updated))
			.await?;

		for path in &deleted {
			if let Some(meta) = catalog.remove_path(path) {
				self.forget_if_unresolvable(catalog, &meta.id).await;
			}
		}

		let mut staged = Vec::with_capacity(updated.len() + added.len());
		let mut undetectable_updates = vec![];

		for path in updated {
			match self.detect(&path).await {
				Some(meta) => staged.push((path, meta)),
				None => undetectable_updates.push(path),
			}
		}

		for path in added {
			if let Some(meta) = self.detect(&path).await {
				staged.push((path, meta));
			}
		}

		self.persist(&staged).await?;

		for (path, meta) in staged {
			let id = meta.id.clone();
			if let Some(previous) = catalog.insert(path, meta) {
				if previous.id != id {
					self.forget_if_unresolvable(catalog, &previous.id).await;
				}
			}
		}

		for path in &undetectable_updates {
			if let Some(previous) = catalog.remove_path(path) {
				self.forget_if_unresolvable(catalog, &previous.id).await;
			}
		}

		self.provide_previews(catalog).await;

		debug!(
			resources = catalog.len(),
			elapsed = ?start.elapsed(),
			"Reconciled index;"
		);

		Ok(())
	}

	async fn delete_persisted(
		&self,
		paths: impl Iterator<Item = &PathBuf>,
	) -> Result<(), IndexError> {
		let paths = paths
			.map(|path| path_str(path).map(ToString::to_string))
			.collect::<Result<Vec<_>, _>>()?;

		for chunk in paths.chunks(self.delete_batch_size) {
			trace!(count = chunk.len(), "Deleting stale resources from storage");
			self.dao.delete_paths(chunk.to_vec()).await?;
		}

		Ok(())
	}

	/// `None` if the kind couldn't be detected, a failure event is emitted then
	async fn detect(&self, path: &Path) -> Option<ResourceMeta> {
		match ResourceMeta::from_path(path, self.registry).await {
			Ok(meta) => Some(meta),
			Err(e) => {
				debug!(%e, "Failed to detect resource kind;");

				if self.failures_tx.send(path.to_path_buf()).is_err() {
					trace!("No one is listening to kind detection failures");
				}

				None
			}
		}
	}

	async fn persist(&self, staged: &[(PathBuf, ResourceMeta)]) -> Result<(), IndexError> {
		if staged.is_empty() {
			return Ok(());
		}

		let rows = staged
			.iter()
			.map(|(path, meta)| ResourceRow::new(self.root, path, meta))
			.collect::<Result<Vec<_>, _>>()?;

		let extras = staged
			.iter()
			.flat_map(|(_, meta)| self.registry.to_extras(&meta.id, &meta.kind))
			.collect::<Vec<_>>();

		trace!(
			resources = rows.len(),
			extras = extras.len(),
			"Persisting resources"
		);

		self.dao.insert_resources(rows).await?;
		if !extras.is_empty() {
			self.dao.insert_extras(extras).await?;
		}

		Ok(())
	}

	async fn forget_if_unresolvable(&self, catalog: &Catalog, id: &ResourceId) {
		if !catalog.contains_id(id) {
			forget_preview(self.previews.as_ref(), id).await;
		}
	}

	/// At most `preview_concurrency` previews render at once. Every task outcome is logged on
	/// its own, none of them fails the cycle
	async fn provide_previews(&self, catalog: &Catalog) {
		let start = Instant::now();
		let permits = Arc::new(Semaphore::new(self.preview_concurrency));

		let (tasks, paths): (Vec<_>, Vec<_>) = catalog
			.entries()
			.map(|(path, meta)| {
				let previews = Arc::clone(self.previews);
				let permits = Arc::clone(&permits);
				let task_path = path.clone();
				let task_meta = meta.clone();

				(
					spawn(async move {
						// the semaphore is never closed
						let _permit = permits.acquire_owned().await.ok();
						previews.generate(&task_path, &task_meta).await
					}),
					path.clone(),
				)
			})
			.unzip();

		let total = tasks.len();
		let mut failed = 0;

		for (res, path) in tasks.join().await.into_iter().zip(paths) {
			match res {
				Ok(Ok(())) => {}
				Ok(Err(e)) => {
					failed += 1;
					error!(?e, path = %path.display(), "Failed to generate preview;");
				}
				Err(e) => {
					failed += 1;
					error!(?e, path = %path.display(), "Preview generation task didn't finish;");
				}
			}
		}

		debug!(total, failed, elapsed = ?start.elapsed(), "Provided previews;");
	}
}

pub(crate) async fn forget_preview(previews: &dyn PreviewStorage, id: &ResourceId) {
	report_error(&previews.forget(id).await);
}
