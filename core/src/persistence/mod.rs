//! Boundary with the durable store of resources.
//!
//! The index talks to storage only through [`ResourceDao`], rows are keyed by path and carry
//! everything needed to rebuild a [`ResourceMeta`] at startup.

use crate::{
	kind::{KindCode, MetaExtraTag},
	resource::{ResourceId, ResourceMeta},
	util::{error::NonUtf8PathError, path_str},
};

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

mod memory;

pub use memory::MemoryDao;

/// One indexed file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRow {
	pub id: ResourceId,
	pub root: String,
	pub path: String,
	/// Milliseconds since the unix epoch
	pub modified: i64,
	pub size: u64,
	pub kind: KindCode,
}

impl ResourceRow {
	pub fn new(root: &Path, path: &Path, meta: &ResourceMeta) -> Result<Self, NonUtf8PathError> {
		Ok(Self {
			id: meta.id.clone(),
			root: path_str(root)?.to_string(),
			path: path_str(path)?.to_string(),
			modified: meta.modified.timestamp_millis(),
			size: meta.size,
			kind: meta.kind.code(),
		})
	}
}

/// A kind specific field of every resource with `id`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExtraRow {
	pub id: ResourceId,
	pub tag: MetaExtraTag,
	pub value: String,
}

impl ExtraRow {
	pub fn new(id: ResourceId, tag: MetaExtraTag, value: impl Into<String>) -> Self {
		Self {
			id,
			tag,
			value: value.into(),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceWithExtra {
	pub resource: ResourceRow,
	pub extras: Vec<ExtraRow>,
}

#[derive(Error, Debug)]
pub enum PersistenceError {
	#[error("storage backend failed: {0}")]
	Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
	#[error("storage backend is unavailable")]
	Unavailable,
}

#[async_trait]
pub trait ResourceDao: Send + Sync + 'static {
	/// Every row persisted under `root`, joined with the extras of its id
	async fn load_resources(&self, root: &str) -> Result<Vec<ResourceWithExtra>, PersistenceError>;

	/// Inserts rows, replacing any previous row with the same path
	async fn insert_resources(&self, rows: Vec<ResourceRow>) -> Result<(), PersistenceError>;

	/// Inserts extras, replacing any previous value of the same id and tag
	async fn insert_extras(&self, rows: Vec<ExtraRow>) -> Result<(), PersistenceError>;

	/// Callers keep batches small, backends may bound the number of bound parameters
	async fn delete_paths(&self, paths: Vec<String>) -> Result<(), PersistenceError>;

	async fn update_resource(
		&self,
		old_id: &ResourceId,
		new_id: &ResourceId,
		modified: i64,
		size: u64,
	) -> Result<(), PersistenceError>;

	async fn update_extras(
		&self,
		old_id: &ResourceId,
		new_id: &ResourceId,
	) -> Result<(), PersistenceError>;
}
