pub mod error;

use std::path::Path;

use error::NonUtf8PathError;

/// Borrows a path as UTF-8, the only encoding rows are persisted with
pub fn path_str(path: &Path) -> Result<&str, NonUtf8PathError> {
	path.to_str().ok_or_else(|| NonUtf8PathError(path.into()))
}
