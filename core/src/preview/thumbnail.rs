use crate::{
	config::IndexConfig,
	files::ArkFiles,
	resource::{ResourceId, ResourceMeta},
	util::error::FileIOError,
};

use std::{
	io,
	path::{Path, PathBuf},
	sync::Arc,
	time::Duration,
};

use async_trait::async_trait;
use tokio::{fs, time::timeout};
use tracing::{error, instrument, trace};

use super::{
	get_shard_hex, PreviewError, PreviewLocation, PreviewRenderer, PreviewStorage, WEBP_EXTENSION,
};

/// Previews stored inside the application folder of a root, sharded by id.
///
/// `<root>/.ark/previews/<shard>/<id>.webp` and `<root>/.ark/thumbnails/<shard>/<id>.webp`
pub struct ThumbnailStorage {
	previews_dir: PathBuf,
	thumbnails_dir: PathBuf,
	renderer: Arc<dyn PreviewRenderer>,
	timeout: Duration,
}

impl ThumbnailStorage {
	pub fn new(
		root: impl AsRef<Path>,
		renderer: Arc<dyn PreviewRenderer>,
		config: &IndexConfig,
	) -> Self {
		let root = root.as_ref();

		Self {
			previews_dir: ArkFiles::previews_dir(root),
			thumbnails_dir: ArkFiles::thumbnails_dir(root),
			renderer,
			timeout: config.preview_timeout(),
		}
	}

	#[must_use]
	pub fn location_of(&self, id: &ResourceId) -> PreviewLocation {
		let shard = get_shard_hex(id);

		let mut preview = self.previews_dir.join(shard);
		preview.push(id.as_str());
		preview.set_extension(WEBP_EXTENSION);

		let mut thumbnail = self.thumbnails_dir.join(shard);
		thumbnail.push(id.as_str());
		thumbnail.set_extension(WEBP_EXTENSION);

		PreviewLocation { preview, thumbnail }
	}
}

async fn exists(path: &Path) -> bool {
	match fs::metadata(path).await {
		Ok(_) => true,
		Err(e) => {
			if e.kind() != io::ErrorKind::NotFound {
				error!(
					?e,
					path = %path.display(),
					"Failed to check if preview exists, but we will try to generate it anyway;"
				);
			}
			false
		}
	}
}

async fn remove_if_exists(path: &Path) -> Result<(), FileIOError> {
	match fs::remove_file(path).await {
		Ok(()) => Ok(()),
		Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
		Err(e) => Err(FileIOError::from((path, e, "Failed to remove preview"))),
	}
}

async fn create_parent(path: &Path) -> Result<(), FileIOError> {
	if let Some(parent) = path.parent() {
		fs::create_dir_all(parent)
			.await
			.map_err(|e| FileIOError::from((parent, e, "Failed to create shard directory")))?;
	}

	Ok(())
}

#[async_trait]
impl PreviewStorage for ThumbnailStorage {
	#[instrument(skip_all, fields(path = %path.display(), id = %meta.id))]
	async fn generate(&self, path: &Path, meta: &ResourceMeta) -> Result<(), PreviewError> {
		if !self.renderer.supports(&meta.kind) {
			trace!("Skipping preview generation for unsupported kind");
			return Ok(());
		}

		let location = self.location_of(&meta.id);
		if exists(&location.preview).await && exists(&location.thumbnail).await {
			trace!("Skipping preview generation because it already exists");
			return Ok(());
		}

		create_parent(&location.preview).await?;
		create_parent(&location.thumbnail).await?;

		timeout(
			self.timeout,
			self.renderer.render(path, &meta.kind, &location),
		)
		.await
		.map_err(|_| PreviewError::Timeout {
			path: path.into(),
			timeout: self.timeout,
		})??;

		trace!("Generated preview");

		Ok(())
	}

	async fn locate(&self, _: &Path, meta: &ResourceMeta) -> Option<PreviewLocation> {
		let location = self.location_of(&meta.id);

		exists(&location.preview).await.then_some(location)
	}

	async fn forget(&self, id: &ResourceId) -> Result<(), PreviewError> {
		let PreviewLocation { preview, thumbnail } = self.location_of(id);

		remove_if_exists(&preview).await?;
		remove_if_exists(&thumbnail).await?;

		trace!(%id, "Forgot preview");

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	use crate::kind::{KindCode, ResourceKind};

	use std::sync::atomic::{AtomicUsize, Ordering};

	use chrono::Utc;
	use tempfile::tempdir;
	use tracing_test::traced_test;

	/// Writes the source bytes as both images
	#[derive(Default)]
	struct CopyRenderer {
		calls: AtomicUsize,
		delay: Option<Duration>,
	}

	#[async_trait]
	impl PreviewRenderer for CopyRenderer {
		fn supports(&self, kind: &ResourceKind) -> bool {
			matches!(kind, ResourceKind::Image)
		}

		async fn render(
			&self,
			source: &Path,
			_: &ResourceKind,
			target: &PreviewLocation,
		) -> Result<(), PreviewError> {
			self.calls.fetch_add(1, Ordering::SeqCst);
			if let Some(delay) = self.delay {
				tokio::time::sleep(delay).await;
			}

			fs::copy(source, &target.preview).await.unwrap();
			fs::copy(source, &target.thumbnail).await.unwrap();

			Ok(())
		}
	}

	fn meta(id: &str, kind: ResourceKind) -> ResourceMeta {
		ResourceMeta {
			id: ResourceId::from(id),
			kind,
			size: 4,
			modified: Utc::now(),
		}
	}

	#[tokio::test]
	#[traced_test]
	async fn generate_once_then_locate() {
		let root = tempdir().unwrap();
		let source = root.path().join("photo.png");
		fs::write(&source, b"fake").await.unwrap();

		let renderer = Arc::new(CopyRenderer::default());
		let storage = ThumbnailStorage::new(root.path(), renderer.clone(), &IndexConfig::default());
		let meta = meta("abc0123456789def", ResourceKind::Image);

		assert_eq!(storage.locate(&source, &meta).await, None);

		storage.generate(&source, &meta).await.unwrap();
		storage.generate(&source, &meta).await.unwrap();
		assert_eq!(renderer.calls.load(Ordering::SeqCst), 1);

		let location = storage.locate(&source, &meta).await.unwrap();
		assert_eq!(
			location.preview,
			root.path().join(".ark/previews/abc/abc0123456789def.webp")
		);
		assert_eq!(
			location.thumbnail,
			root.path().join(".ark/thumbnails/abc/abc0123456789def.webp")
		);
	}

	#[tokio::test]
	#[traced_test]
	async fn unsupported_kinds_are_skipped() {
		let root = tempdir().unwrap();
		let renderer = Arc::new(CopyRenderer::default());
		let storage = ThumbnailStorage::new(root.path(), renderer.clone(), &IndexConfig::default());

		storage
			.generate(
				&root.path().join("clip.mp4"),
				&meta("0000000000000000", ResourceKind::bare(KindCode::Video)),
			)
			.await
			.unwrap();

		assert_eq!(renderer.calls.load(Ordering::SeqCst), 0);
	}

	#[tokio::test]
	#[traced_test]
	async fn forget_removes_both_files() {
		let root = tempdir().unwrap();
		let source = root.path().join("photo.png");
		fs::write(&source, b"fake").await.unwrap();

		let storage = ThumbnailStorage::new(
			root.path(),
			Arc::new(CopyRenderer::default()),
			&IndexConfig::default(),
		);
		let meta = meta("fed0123456789abc", ResourceKind::Image);

		storage.generate(&source, &meta).await.unwrap();
		storage.forget(&meta.id).await.unwrap();

		let location = storage.location_of(&meta.id);
		assert!(!location.preview.exists());
		assert!(!location.thumbnail.exists());

		// forgetting twice is fine
		storage.forget(&meta.id).await.unwrap();
	}

	#[tokio::test(start_paused = true)]
	#[traced_test]
	async fn slow_renders_time_out() {
		let root = tempdir().unwrap();
		let source = root.path().join("photo.png");
		fs::write(&source, b"fake").await.unwrap();

		let storage = ThumbnailStorage::new(
			root.path(),
			Arc::new(CopyRenderer {
				delay: Some(Duration::from_secs(10)),
				..Default::default()
			}),
			&IndexConfig {
				preview_timeout_secs: 1,
				..Default::default()
			},
		);

		assert!(matches!(
			storage
				.generate(&source, &meta("0123456789abcdef", ResourceKind::Image))
				.await,
			Err(PreviewError::Timeout { .. })
		));
	}
}
