use ark_core::{
	persistence::{
		ExtraRow, MemoryDao, PersistenceError, ResourceDao, ResourceRow, ResourceWithExtra,
	},
	ResourceId,
};

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

/// [`MemoryDao`] that counts writes and can be told to fail them
#[derive(Debug, Default)]
pub struct RecordingDao {
	pub inner: MemoryDao,
	writes: AtomicUsize,
	fail_writes: AtomicBool,
	delete_batches: Mutex<Vec<usize>>,
}

impl RecordingDao {
	pub fn new() -> Self {
		Self::default()
	}

	/// Write calls that reached the store since the last reset
	pub fn writes(&self) -> usize {
		self.writes.load(Ordering::SeqCst)
	}

	pub fn reset_writes(&self) {
		self.writes.store(0, Ordering::SeqCst);
		self.delete_batches.lock().clear();
	}

	pub fn fail_writes(&self, fail: bool) {
		self.fail_writes.store(fail, Ordering::SeqCst);
	}

	pub fn delete_batches(&self) -> Vec<usize> {
		self.delete_batches.lock().clone()
	}

	pub fn resources(&self) -> Vec<ResourceRow> {
		self.inner.resources()
	}

	pub fn row_of(&self, path: &std::path::Path) -> Option<ResourceRow> {
		let path = path.to_str()?;
		self.inner
			.resources()
			.into_iter()
			.find(|row| row.path == path)
	}

	fn write(&self) -> Result<(), PersistenceError> {
		if self.fail_writes.load(Ordering::SeqCst) {
			return Err(PersistenceError::Unavailable);
		}

		self.writes.fetch_add(1, Ordering::SeqCst);

		Ok(())
	}
}

#[async_trait]
impl ResourceDao for RecordingDao {
	async fn load_resources(&self, root: &str) -> Result<Vec<ResourceWithExtra>, PersistenceError> {
		self.inner.load_resources(root).await
	}

	async fn insert_resources(&self, rows: Vec<ResourceRow>) -> Result<(), PersistenceError> {
		self.write()?;
		self.inner.insert_resources(rows).await
	}

	async fn insert_extras(&self, rows: Vec<ExtraRow>) -> Result<(), PersistenceError> {
		self.write()?;
		self.inner.insert_extras(rows).await
	}

	async fn delete_paths(&self, paths: Vec<String>) -> Result<(), PersistenceError> {
		self.write()?;
		self.delete_batches.lock().push(paths.len());
		self.inner.delete_paths(paths).await
	}

	async fn update_resource(
		&self,
		old_id: &ResourceId,
		new_id: &ResourceId,
		modified: i64,
		size: u64,
	) -> Result<(), PersistenceError> {
		self.write()?;
		self.inner
			.update_resource(old_id, new_id, modified, size)
			.await
	}

	async fn update_extras(
		&self,
		old_id: &ResourceId,
		new_id: &ResourceId,
	) -> Result<(), PersistenceError> {
		self.write()?;
		self.inner.update_extras(old_id, new_id).await
	}
}
