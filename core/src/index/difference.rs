use crate::{resource::millis_precision, util::error::FileIOError};

use std::{
	io,
	path::{Path, PathBuf},
};

use tokio::{fs, time::Instant};
use tracing::debug;

use super::{
	catalog::Catalog,
	walk::{list_all_files, DirectoryLister},
};

/// Changes on disk since the catalog was last reconciled, sorted and pairwise disjoint
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Difference {
	/// Known paths that are gone
	pub deleted: Vec<PathBuf>,
	/// Known paths modified after they were indexed
	pub updated: Vec<PathBuf>,
	/// Files not in the catalog yet
	pub added: Vec<PathBuf>,
}

impl Difference {
	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.deleted.is_empty() && self.updated.is_empty() && self.added.is_empty()
	}
}

pub(crate) async fn calculate_difference(
	catalog: &Catalog,
	root: &Path,
	lister: &dyn DirectoryLister,
) -> Result<Difference, FileIOError> {
	let start = Instant::now();

	let mut deleted = vec![];
	let mut updated = vec![];

	for (path, meta) in catalog.entries() {
		match fs::metadata(path).await {
			Ok(metadata) if metadata.is_file() => {
				let modified = metadata
					.modified()
					.map_err(|e| FileIOError::from((path, e, "Failed to read modification time")))?;

				if millis_precision(modified) > meta.modified {
					updated.push(path.clone());
				}
			}
			Ok(_) => deleted.push(path.clone()),
			Err(e) if e.kind() == io::ErrorKind::NotFound => deleted.push(path.clone()),
			Err(e) => return Err(FileIOError::from((path, e, "Failed to read resource metadata"))),
		}
	}

	let mut added = list_all_files(lister, root)
		.await?
		.into_iter()
		.filter(|path| !catalog.contains_path(path))
		.collect::<Vec<_>>();

	deleted.sort_unstable();
	updated.sort_unstable();
	added.sort_unstable();

	debug!(
		deleted = deleted.len(),
		updated = updated.len(),
		added = added.len(),
		elapsed = ?start.elapsed(),
		"Calculated difference;"
	);

	Ok(Difference {
		deleted,
		updated,
		added,
	})
}
