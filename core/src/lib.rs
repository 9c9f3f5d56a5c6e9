#![warn(
	clippy::all,
	clippy::pedantic,
	clippy::correctness,
	clippy::perf,
	clippy::style,
	clippy::suspicious,
	clippy::complexity,
	clippy::nursery,
	clippy::unwrap_used,
	unused_qualifications,
	rust_2018_idioms,
	trivial_casts,
	trivial_numeric_casts,
	unused_allocation,
	clippy::unnecessary_cast,
	clippy::cast_lossless,
	clippy::cast_possible_truncation,
	clippy::cast_possible_wrap,
	clippy::cast_precision_loss,
	clippy::cast_sign_loss,
	clippy::dbg_macro,
	clippy::deprecated_cfg_attr,
	clippy::separated_literal_suffix,
	deprecated
)]
#![forbid(deprecated_in_future)]
#![allow(clippy::missing_errors_doc, clippy::module_name_repetitions)]

//! Resource index of a directory tree: detects what every file is, keeps the catalog in sync
//! with the filesystem and with durable storage, and orchestrates preview generation.

pub mod config;
pub mod files;
pub mod index;
pub mod kind;
pub mod logging;
pub mod persistence;
pub mod preview;
pub mod resource;
pub mod util;

pub use config::IndexConfig;
pub use files::ArkFiles;
pub use index::{
	AggregatedResourceIndex, Difference, IndexBuilder, IndexError, PlainResourceIndex,
	ResourceIndex,
};
pub use kind::{KindRegistry, ResourceKind};
pub use resource::{ResourceId, ResourceMeta};
