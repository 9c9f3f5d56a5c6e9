use ark_core::{
	preview::{PreviewError, PreviewLocation, PreviewStorage},
	ResourceId, ResourceMeta,
};

use std::{
	collections::HashSet,
	path::{Path, PathBuf},
	sync::atomic::{AtomicUsize, Ordering},
	time::Duration,
};

use async_trait::async_trait;
use parking_lot::Mutex;

/// Remembers every generated and forgotten id, optionally failing or panicking for some ids
#[derive(Debug, Default)]
pub struct RecordingPreviews {
	generated: Mutex<HashSet<ResourceId>>,
	forgotten: Mutex<Vec<ResourceId>>,
	failing: Mutex<HashSet<ResourceId>>,
	panicking: Mutex<HashSet<ResourceId>>,
	delay: Mutex<Option<Duration>>,
	running: AtomicUsize,
	peak: AtomicUsize,
}

impl RecordingPreviews {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn generated(&self) -> HashSet<ResourceId> {
		self.generated.lock().clone()
	}

	pub fn forgotten(&self) -> Vec<ResourceId> {
		self.forgotten.lock().clone()
	}

	pub fn fail_for(&self, id: ResourceId) {
		self.failing.lock().insert(id);
	}

	pub fn panic_for(&self, id: ResourceId) {
		self.panicking.lock().insert(id);
	}

	/// Every generation takes at least `delay`
	pub fn slow_down(&self, delay: Duration) {
		*self.delay.lock() = Some(delay);
	}

	/// Most generations seen running at the same time
	pub fn peak_concurrency(&self) -> usize {
		self.peak.load(Ordering::SeqCst)
	}
}

#[async_trait]
impl PreviewStorage for RecordingPreviews {
	async fn generate(&self, path: &Path, meta: &ResourceMeta) -> Result<(), PreviewError> {
		if self.panicking.lock().contains(&meta.id) {
			panic!("renderer blew up on {}", path.display());
		}

		if self.failing.lock().contains(&meta.id) {
			return Err(PreviewError::Render {
				path: path.into(),
				reason: "unsupported pixel format".to_string(),
			});
		}

		let delay = *self.delay.lock();
		if let Some(delay) = delay {
			let running = self.running.fetch_add(1, Ordering::SeqCst) + 1;
			self.peak.fetch_max(running, Ordering::SeqCst);
			tokio::time::sleep(delay).await;
			self.running.fetch_sub(1, Ordering::SeqCst);
		}

		self.generated.lock().insert(meta.id.clone());

		Ok(())
	}

	async fn locate(&self, path: &Path, meta: &ResourceMeta) -> Option<PreviewLocation> {
		self.generated
			.lock()
			.contains(&meta.id)
			.then(|| PreviewLocation {
				preview: PathBuf::from(format!("{}.preview", path.display())),
				thumbnail: PathBuf::from(format!("{}.thumbnail", path.display())),
			})
	}

	async fn forget(&self, id: &ResourceId) -> Result<(), PreviewError> {
		self.generated.lock().remove(id);
		self.forgotten.lock().push(id.clone());

		Ok(())
	}
}
