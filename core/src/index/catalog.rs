use crate::resource::{ResourceId, ResourceMeta};

use std::{
	collections::{HashMap, HashSet},
	path::{Path, PathBuf},
};

const DIVERGED: &str = "internal mappings are diverged";

/// The two lookup maps of an index.
///
/// `path_by_id` points every id to one representative path holding it. Other paths with the
/// same content stay in `meta_by_path` and take over when the representative goes away.
#[derive(Debug, Default)]
pub(crate) struct Catalog {
	meta_by_path: HashMap<PathBuf, ResourceMeta>,
	path_by_id: HashMap<ResourceId, PathBuf>,
}

impl Catalog {
	pub(crate) fn new(resources: HashMap<PathBuf, ResourceMeta>) -> Self {
		let mut path_by_id = HashMap::with_capacity(resources.len());
		for (path, meta) in &resources {
			path_by_id
				.entry(meta.id.clone())
				.or_insert_with(|| path.clone());
		}

		Self {
			meta_by_path: resources,
			path_by_id,
		}
	}

	pub(crate) fn len(&self) -> usize {
		self.meta_by_path.len()
	}

	pub(crate) fn get(&self, path: &Path) -> Option<&ResourceMeta> {
		self.meta_by_path.get(path)
	}

	pub(crate) fn contains_path(&self, path: &Path) -> bool {
		self.meta_by_path.contains_key(path)
	}

	pub(crate) fn contains_id(&self, id: &ResourceId) -> bool {
		self.path_by_id.contains_key(id)
	}

	pub(crate) fn entries(&self) -> impl Iterator<Item = (&PathBuf, &ResourceMeta)> {
		self.meta_by_path.iter()
	}

	pub(crate) fn list(&self, prefix: Option<&Path>) -> HashSet<ResourceMeta> {
		self.meta_by_path
			.iter()
			.filter(|(path, _)| prefix.map_or(true, |prefix| path.starts_with(prefix)))
			.map(|(_, meta)| meta.clone())
			.collect()
	}

	pub(crate) fn try_get_path(&self, id: &ResourceId) -> Option<&PathBuf> {
		self.path_by_id.get(id)
	}

	pub(crate) fn try_get_meta(&self, id: &ResourceId) -> Option<&ResourceMeta> {
		self.path_by_id.get(id).map(|path| {
			self.meta_by_path
				.get(path)
				.unwrap_or_else(|| panic!("{DIVERGED}"))
		})
	}

	/// Removes the representative path of `id`, promoting a duplicate if there is one
	pub(crate) fn try_remove(&mut self, id: &ResourceId) -> Option<PathBuf> {
		let path = self.path_by_id.remove(id)?;

		let removed = self
			.meta_by_path
			.remove(&path)
			.unwrap_or_else(|| panic!("{DIVERGED}"));
		assert!(&removed.id == id, "{DIVERGED}");

		self.promote_duplicate(id);

		Some(path)
	}

	/// Installs `meta` for `path`, returning what `path` held before.
	///
	/// An id that already has a representative keeps it.
	pub(crate) fn insert(&mut self, path: PathBuf, meta: ResourceMeta) -> Option<ResourceMeta> {
		let id = meta.id.clone();
		let previous = self.meta_by_path.insert(path.clone(), meta);

		if let Some(previous) = &previous {
			if previous.id != id {
				self.release(&previous.id, &path);
			}
		}

		self.path_by_id.entry(id).or_insert(path);

		previous
	}

	pub(crate) fn remove_path(&mut self, path: &Path) -> Option<ResourceMeta> {
		let meta = self.meta_by_path.remove(path)?;
		self.release(&meta.id, path);

		Some(meta)
	}

	/// Moves `path` from `old_id` to the id of `new_meta`, making `path` its representative.
	///
	/// `path` must currently hold `old_id`.
	pub(crate) fn replace_id(&mut self, old_id: &ResourceId, path: &Path, new_meta: ResourceMeta) {
		let new_id = new_meta.id.clone();
		let previous = self.meta_by_path.insert(path.to_path_buf(), new_meta);
		assert!(
			previous.is_some_and(|previous| &previous.id == old_id),
			"{DIVERGED}"
		);

		if old_id != &new_id {
			self.release(old_id, path);
		}

		self.path_by_id.insert(new_id, path.to_path_buf());
	}

	/// `path` doesn't hold `id` anymore
	fn release(&mut self, id: &ResourceId, path: &Path) {
		if self.path_by_id.get(id).is_some_and(|current| current == path) {
			self.path_by_id.remove(id);
			self.promote_duplicate(id);
		}
	}

	fn promote_duplicate(&mut self, id: &ResourceId) {
		if let Some(duplicate) = self
			.meta_by_path
			.iter()
			.find_map(|(path, meta)| (&meta.id == id).then(|| path.clone()))
		{
			self.path_by_id.insert(id.clone(), duplicate);
		}
	}

	/// Both maps agree and every id held by some path is resolvable
	#[cfg(test)]
	pub(crate) fn is_consistent(&self) -> bool {
		self.path_by_id.iter().all(|(id, path)| {
			self.meta_by_path
				.get(path)
				.is_some_and(|meta| &meta.id == id)
		}) && self
			.meta_by_path
			.values()
			.all(|meta| self.path_by_id.contains_key(&meta.id))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	use crate::kind::ResourceKind;

	use chrono::{TimeZone, Utc};
	use pretty_assertions::assert_eq;

	fn meta(id: &str) -> ResourceMeta {
		ResourceMeta {
			id: ResourceId::from(id),
			kind: ResourceKind::Image,
			size: 1,
			modified: Utc.timestamp_millis_opt(1_000).unwrap(),
		}
	}

	fn catalog(entries: &[(&str, &str)]) -> Catalog {
		Catalog::new(
			entries
				.iter()
				.map(|(path, id)| (PathBuf::from(path), meta(id)))
				.collect(),
		)
	}

	#[test]
	fn maps_are_inverse() {
		let catalog = catalog(&[("/r/a.png", "a"), ("/r/b.png", "b")]);

		assert!(catalog.is_consistent());
		assert_eq!(
			catalog.try_get_path(&ResourceId::from("a")),
			Some(&PathBuf::from("/r/a.png"))
		);
		assert_eq!(
			catalog.try_get_meta(&ResourceId::from("b")),
			Some(&meta("b"))
		);
		assert_eq!(catalog.try_get_path(&ResourceId::from("c")), None);
	}

	#[test]
	fn duplicates_collapse_to_one_representative() {
		let mut catalog = catalog(&[("/r/a.png", "x"), ("/r/copy/a.png", "x")]);
		let id = ResourceId::from("x");

		assert_eq!(catalog.len(), 2);
		assert!(catalog.is_consistent());

		let first = catalog.try_remove(&id).unwrap();
		assert!(catalog.is_consistent());

		let second = catalog.try_get_path(&id).cloned().unwrap();
		assert_ne!(first, second);

		assert_eq!(catalog.try_remove(&id), Some(second));
		assert_eq!(catalog.try_remove(&id), None);
		assert_eq!(catalog.len(), 0);
	}

	#[test]
	fn insert_keeps_existing_representative() {
		let mut catalog = catalog(&[("/r/a.png", "x")]);

		assert_eq!(catalog.insert(PathBuf::from("/r/b.png"), meta("x")), None);

		assert_eq!(
			catalog.try_get_path(&ResourceId::from("x")),
			Some(&PathBuf::from("/r/a.png"))
		);
		assert!(catalog.is_consistent());
	}

	#[test]
	fn insert_over_path_releases_old_id() {
		let mut catalog = catalog(&[("/r/a.png", "old")]);

		let previous = catalog.insert(PathBuf::from("/r/a.png"), meta("new"));

		assert_eq!(previous, Some(meta("old")));
		assert!(!catalog.contains_id(&ResourceId::from("old")));
		assert!(catalog.contains_id(&ResourceId::from("new")));
		assert!(catalog.is_consistent());
	}

	#[test]
	fn remove_path_promotes_duplicate() {
		let mut catalog = catalog(&[("/r/a.png", "x"), ("/r/b.png", "x")]);
		let id = ResourceId::from("x");
		let representative = catalog.try_get_path(&id).cloned().unwrap();

		catalog.remove_path(&representative).unwrap();

		assert!(catalog.contains_id(&id));
		assert_ne!(catalog.try_get_path(&id), Some(&representative));
		assert!(catalog.is_consistent());
	}

	#[test]
	fn replace_id_moves_path() {
		let mut catalog = catalog(&[("/r/a.png", "old"), ("/r/b.png", "other")]);

		catalog.replace_id(&ResourceId::from("old"), Path::new("/r/a.png"), meta("new"));

		assert_eq!(catalog.try_get_path(&ResourceId::from("old")), None);
		assert_eq!(
			catalog.try_get_path(&ResourceId::from("new")),
			Some(&PathBuf::from("/r/a.png"))
		);
		assert_eq!(catalog.get(Path::new("/r/a.png")), Some(&meta("new")));
		assert!(catalog.is_consistent());
	}

	#[test]
	#[should_panic(expected = "internal mappings are diverged")]
	fn replace_id_of_a_path_holding_another_id() {
		let mut catalog = catalog(&[("/r/a.png", "real")]);

		catalog.replace_id(&ResourceId::from("stale"), Path::new("/r/a.png"), meta("new"));
	}

	#[test]
	fn list_by_prefix() {
		let catalog = catalog(&[("/r/photos/a.png", "a"), ("/r/docs/b.png", "b")]);

		assert_eq!(catalog.list(None).len(), 2);
		assert_eq!(
			catalog.list(Some(Path::new("/r/photos"))),
			HashSet::from([meta("a")])
		);
		assert!(catalog.list(Some(Path::new("/elsewhere"))).is_empty());
	}
}
