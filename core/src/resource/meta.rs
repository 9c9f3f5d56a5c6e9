use crate::{
	kind::{DetectionError, KindRegistry, ResourceKind},
	persistence::ResourceWithExtra,
	util::{error::FileIOError, path_str},
};

use std::{collections::HashMap, path::Path, time::SystemTime};

use chrono::{DateTime, DurationRound, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;

use super::ResourceId;

/// Everything the index knows about one file
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceMeta {
	pub id: ResourceId,
	pub kind: ResourceKind,
	pub size: u64,
	/// Millisecond precision, matching what is persisted
	pub modified: DateTime<Utc>,
}

impl ResourceMeta {
	/// Detects the kind of the file at `path` and computes its id
	pub async fn from_path(path: &Path, registry: &KindRegistry) -> Result<Self, DetectionError> {
		path_str(path)?;

		let kind = registry.detect(path).await?;

		let metadata = fs::metadata(path)
			.await
			.map_err(|e| FileIOError::from((path, e, "Failed to read resource metadata")))?;
		let modified = metadata
			.modified()
			.map_err(|e| FileIOError::from((path, e, "Failed to read modification time")))?;
		let size = metadata.len();

		Ok(Self {
			id: ResourceId::from_file(path, size).await?,
			kind,
			size,
			modified: millis_precision(modified),
		})
	}

	/// Rebuilds a meta from a persisted snapshot, replaying the kind from its extras
	#[must_use]
	pub fn from_row(row: &ResourceWithExtra, registry: &KindRegistry) -> Self {
		let extras = row
			.extras
			.iter()
			.map(|extra| (extra.tag, extra.value.clone()))
			.collect::<HashMap<_, _>>();

		Self {
			id: row.resource.id.clone(),
			kind: registry.from_extras(row.resource.kind, &extras),
			size: row.resource.size,
			modified: DateTime::from_timestamp_millis(row.resource.modified).unwrap_or_default(),
		}
	}
}

/// Drops the sub-millisecond part of a filesystem timestamp
pub(crate) fn millis_precision(time: SystemTime) -> DateTime<Utc> {
	let time = DateTime::<Utc>::from(time);

	time.duration_trunc(TimeDelta::milliseconds(1))
		.unwrap_or(time)
}
