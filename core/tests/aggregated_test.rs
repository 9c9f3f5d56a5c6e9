//! One index spanning several roots

use ark_core::{
	index::{AggregatedResourceIndex, IndexError, PlainResourceIndex, ResourceIndex},
	kind::KindRegistry,
	ResourceMeta,
};

use std::{path::Path, sync::Arc};

use pretty_assertions::assert_eq;
use tempfile::tempdir;
use tracing_test::traced_test;

mod helpers;

use helpers::*;

async fn shard(root: &Path, dao: Arc<RecordingDao>) -> Arc<PlainResourceIndex> {
	Arc::new(
		PlainResourceIndex::builder(root, dao, Arc::new(RecordingPreviews::new()))
			.load()
			.await
			.unwrap(),
	)
}

#[tokio::test]
#[traced_test]
async fn spans_every_root() {
	let photos = tempdir().unwrap();
	let documents = tempdir().unwrap();
	let a = write_png(photos.path().join("a.png"), b"a").await;
	let b = write_png(documents.path().join("scans/b.png"), b"b").await;
	let broken = write_file(documents.path().join("broken.link"), b"[]").await;

	let dao = Arc::new(RecordingDao::new());
	let index = AggregatedResourceIndex::new(vec![
		shard(photos.path(), dao.clone()).await,
		shard(documents.path(), dao.clone()).await,
	]);
	let mut failures = index.kind_detect_failures();

	index.reindex().await.unwrap();

	assert_eq!(drain(&mut failures), vec![broken]);
	assert_eq!(index.list_resources(None).await.len(), 2);
	assert_eq!(
		index
			.list_resources(Some(documents.path()))
			.await
			.len(),
		1
	);

	let a_id = dao.row_of(&a).unwrap().id;
	let b_id = dao.row_of(&b).unwrap().id;
	assert_eq!(index.get_path(&b_id).await, Some(b.clone()));
	assert_eq!(index.get_meta(&a_id).await.unwrap().id, a_id);
	assert_eq!(index.shards()[1].get_path(&b_id).await, Some(b.clone()));

	assert_eq!(index.remove(&a_id).await.unwrap(), a);
	assert_eq!(index.get_path(&a_id).await, None);
	assert!(matches!(
		index.remove(&a_id).await,
		Err(IndexError::NotFound(_))
	));

	write_png(&b, b"b, edited").await;
	let new_meta = ResourceMeta::from_path(&b, &KindRegistry::default())
		.await
		.unwrap();
	index
		.update_resource(&b_id, &b, new_meta.clone())
		.await
		.unwrap();

	assert_eq!(index.get_path(&b_id).await, None);
	assert_eq!(index.get_path(&new_meta.id).await, Some(b));
	assert_eq!(index.list_all_ids().await.len(), 1);
}

#[tokio::test]
#[traced_test]
async fn update_outside_every_root_is_rejected() {
	let photos = tempdir().unwrap();
	let elsewhere = tempdir().unwrap();
	let stray = write_png(elsewhere.path().join("stray.png"), b"stray").await;

	let index = AggregatedResourceIndex::new(vec![
		shard(photos.path(), Arc::new(RecordingDao::new())).await,
	]);

	let meta = ResourceMeta::from_path(&stray, &KindRegistry::default())
		.await
		.unwrap();

	assert!(matches!(
		index.update_resource(&meta.id, &stray, meta.clone()).await,
		Err(IndexError::UnknownPath(_))
	));
}
