use crate::{kind::MetaExtraTag, resource::ResourceId};

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::trace;

use super::{ExtraRow, PersistenceError, ResourceDao, ResourceRow, ResourceWithExtra};

#[derive(Debug, Default)]
struct Tables {
	resources: BTreeMap<String, ResourceRow>,
	extras: HashMap<(ResourceId, MetaExtraTag), String>,
}

impl Tables {
	/// Extras follow ids, so they go away with the last row referencing their id
	fn drop_orphan_extras(&mut self) {
		let Self { resources, extras } = self;
		extras.retain(|(id, _), _| resources.values().any(|row| &row.id == id));
	}
}

/// Process local [`ResourceDao`], for tests and for roots that don't need to outlive the process
#[derive(Debug, Default)]
pub struct MemoryDao {
	tables: Mutex<Tables>,
}

impl MemoryDao {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Every resource row, ordered by path
	#[must_use]
	pub fn resources(&self) -> Vec<ResourceRow> {
		self.tables.lock().resources.values().cloned().collect()
	}

	#[must_use]
	pub fn extras_of(&self, id: &ResourceId) -> Vec<ExtraRow> {
		self.tables
			.lock()
			.extras
			.iter()
			.filter(|((extra_id, _), _)| extra_id == id)
			.map(|((id, tag), value)| ExtraRow::new(id.clone(), *tag, value.clone()))
			.collect()
	}
}

#[async_trait]
impl ResourceDao for MemoryDao {
	async fn load_resources(&self, root: &str) -> Result<Vec<ResourceWithExtra>, PersistenceError> {
		let tables = self.tables.lock();

		Ok(tables
			.resources
			.values()
			.filter(|row| row.root == root)
			.map(|row| ResourceWithExtra {
				resource: row.clone(),
				extras: tables
					.extras
					.iter()
					.filter(|((id, _), _)| id == &row.id)
					.map(|((id, tag), value)| ExtraRow::new(id.clone(), *tag, value.clone()))
					.collect(),
			})
			.collect())
	}

	async fn insert_resources(&self, rows: Vec<ResourceRow>) -> Result<(), PersistenceError> {
		trace!(count = rows.len(), "Inserting resources");

		let mut tables = self.tables.lock();
		for row in rows {
			tables.resources.insert(row.path.clone(), row);
		}

		Ok(())
	}

	async fn insert_extras(&self, rows: Vec<ExtraRow>) -> Result<(), PersistenceError> {
		let mut tables = self.tables.lock();
		for ExtraRow { id, tag, value } in rows {
			tables.extras.insert((id, tag), value);
		}

		Ok(())
	}

	async fn delete_paths(&self, paths: Vec<String>) -> Result<(), PersistenceError> {
		trace!(count = paths.len(), "Deleting resources");

		let mut tables = self.tables.lock();
		for path in &paths {
			tables.resources.remove(path);
		}
		tables.drop_orphan_extras();

		Ok(())
	}

	async fn update_resource(
		&self,
		old_id: &ResourceId,
		new_id: &ResourceId,
		modified: i64,
		size: u64,
	) -> Result<(), PersistenceError> {
		let mut tables = self.tables.lock();
		for row in tables
			.resources
			.values_mut()
			.filter(|row| &row.id == old_id)
		{
			row.id = new_id.clone();
			row.modified = modified;
			row.size = size;
		}

		Ok(())
	}

	async fn update_extras(
		&self,
		old_id: &ResourceId,
		new_id: &ResourceId,
	) -> Result<(), PersistenceError> {
		let mut tables = self.tables.lock();

		let moved = tables
			.extras
			.keys()
			.filter(|(id, _)| id == old_id)
			.map(|(_, tag)| *tag)
			.collect::<Vec<_>>();

		for tag in moved {
			if let Some(value) = tables.extras.remove(&(old_id.clone(), tag)) {
				tables.extras.insert((new_id.clone(), tag), value);
			}
		}

		Ok(())
	}
}
