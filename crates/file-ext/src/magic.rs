//! Signature ("magic bytes") matching shared by every extension category.

/// One accepted signature of a format: the expected bytes starting at `offset`.
/// `None` entries match any byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MagicBytesMeta {
	pub bytes: Vec<Option<u8>>,
	pub offset: usize,
}

impl MagicBytesMeta {
	/// How many leading bytes of a file must be read to check this signature
	#[must_use]
	pub fn header_len(&self) -> usize {
		self.offset + self.bytes.len()
	}

	#[must_use]
	pub fn matches(&self, header: &[u8]) -> bool {
		header.len() >= self.header_len()
			&& self
				.bytes
				.iter()
				.zip(&header[self.offset..])
				.all(|(expected, actual)| expected.map_or(true, |byte| byte == *actual))
	}
}

pub trait MagicBytes: Copy + 'static {
	/// Every signature this extension may start with, empty if the format has none
	fn magic_bytes_meta(&self) -> Vec<MagicBytesMeta>;

	fn header_len(&self) -> usize {
		self.magic_bytes_meta()
			.iter()
			.map(MagicBytesMeta::header_len)
			.max()
			.unwrap_or(0)
	}

	/// Checks a file header against the known signatures.
	///
	/// Returns `None` when the format has no signature to check against.
	fn matches_header(&self, header: &[u8]) -> Option<bool> {
		let metas = self.magic_bytes_meta();
		if metas.is_empty() {
			return None;
		}

		Some(metas.iter().any(|meta| meta.matches(header)))
	}
}

macro_rules! magic_byte {
	(_) => {
		None
	};
	($byte:literal) => {
		Some($byte)
	};
}

macro_rules! magic_offset {
	() => {
		0
	};
	($offset:literal) => {
		$offset
	};
}

/// Declares an extension category: the enum, a constant slice with all of its variants and
/// the [`MagicBytes`] implementation.
///
/// ```ignore
/// extension_category_enum! {
/// 	ImageExtension ALL_IMAGE_EXTENSIONS {
/// 		Png = [0x89, 0x50, 0x4E, 0x47],
/// 		Webp = [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x45, 0x42, 0x50],
/// 		Mov = [0x66, 0x74, 0x79, 0x70] + 4,
/// 		Raw,
/// 	}
/// }
/// ```
macro_rules! extension_category_enum {
	(
		$(#[$enum_attr:meta])*
		$enum_name:ident $all_name:ident {
			$(
				$(#[$variant_attr:meta])*
				$variant:ident $(= $([$($byte:tt),*] $(+ $offset:literal)?)|+)?
			),* $(,)?
		}
	) => {
		$(#[$enum_attr])*
		#[derive(
			Debug,
			Clone,
			Copy,
			PartialEq,
			Eq,
			Hash,
			::serde::Serialize,
			::serde::Deserialize,
			::strum::Display,
			::strum::EnumString,
			::strum::AsRefStr,
		)]
		#[serde(rename_all = "lowercase")]
		#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
		pub enum $enum_name {
			$(
				$(#[$variant_attr])*
				$variant,
			)*
		}

		pub const $all_name: &[$enum_name] = &[$($enum_name::$variant),*];

		impl $crate::magic::MagicBytes for $enum_name {
			fn magic_bytes_meta(&self) -> Vec<$crate::magic::MagicBytesMeta> {
				match self {
					$(
						Self::$variant => vec![$($(
							$crate::magic::MagicBytesMeta {
								bytes: vec![$($crate::magic::magic_byte!($byte)),*],
								offset: $crate::magic::magic_offset!($($offset)?),
							}
						),+)?],
					)*
				}
			}
		}
	};
}

pub(crate) use extension_category_enum;
pub(crate) use magic_byte;
pub(crate) use magic_offset;

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn wildcards_and_offsets() {
		let meta = MagicBytesMeta {
			bytes: vec![Some(0x66), None, Some(0x79)],
			offset: 2,
		};

		assert_eq!(meta.header_len(), 5);
		assert!(meta.matches(&[0, 0, 0x66, 0xAB, 0x79]));
		assert!(meta.matches(&[0, 0, 0x66, 0x00, 0x79, 0xFF]));
		assert!(!meta.matches(&[0x66, 0x00, 0x79]));
		assert!(!meta.matches(&[0, 0, 0x66, 0x00]));
	}
}
