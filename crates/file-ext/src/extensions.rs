//
// References:
// https://www.garykessler.net/library/file_sigs.html
// https://github.com/bojand/infer/
//
use crate::magic::{extension_category_enum, MagicBytes};

use std::{fmt, path::Path, str::FromStr};

use serde::{Deserialize, Serialize};

/// An extension recognized by one of the indexable categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "category", content = "extension", rename_all = "lowercase")]
pub enum Extension {
	Image(ImageExtension),
	Video(VideoExtension),
	Document(DocumentExtension),
	Link(LinkExtension),
}

impl Extension {
	/// Looks up a bare extension (without the leading dot), ignoring ASCII case
	#[must_use]
	pub fn from_extension(ext: &str) -> Option<Self> {
		ImageExtension::from_str(ext)
			.map(Self::Image)
			.or_else(|_| VideoExtension::from_str(ext).map(Self::Video))
			.or_else(|_| DocumentExtension::from_str(ext).map(Self::Document))
			.or_else(|_| LinkExtension::from_str(ext).map(Self::Link))
			.ok()
	}

	#[must_use]
	pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
		path.as_ref()
			.extension()
			.and_then(|ext| ext.to_str())
			.and_then(Self::from_extension)
	}

	/// Number of leading bytes needed by [`Extension::matches_header`]
	#[must_use]
	pub fn header_len(&self) -> usize {
		match self {
			Self::Image(ext) => ext.header_len(),
			Self::Video(ext) => ext.header_len(),
			Self::Document(ext) => ext.header_len(),
			Self::Link(ext) => ext.header_len(),
		}
	}

	/// `None` when the format has no known signature
	#[must_use]
	pub fn matches_header(&self, header: &[u8]) -> Option<bool> {
		match self {
			Self::Image(ext) => ext.matches_header(header),
			Self::Video(ext) => ext.matches_header(header),
			Self::Document(ext) => ext.matches_header(header),
			Self::Link(ext) => ext.matches_header(header),
		}
	}
}

impl fmt::Display for Extension {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Image(ext) => fmt::Display::fmt(ext, f),
			Self::Video(ext) => fmt::Display::fmt(ext, f),
			Self::Document(ext) => fmt::Display::fmt(ext, f),
			Self::Link(ext) => fmt::Display::fmt(ext, f),
		}
	}
}

// image extensions
extension_category_enum! {
	ImageExtension ALL_IMAGE_EXTENSIONS {
		Jpg = [0xFF, 0xD8],
		Jpeg = [0xFF, 0xD8],
		Png = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A],
		Gif = [0x47, 0x49, 0x46, 0x38, _, 0x61],
		Bmp = [0x42, 0x4D],
		Tiff = [0x49, 0x49, 0x2A, 0x00] | [0x4D, 0x4D, 0x00, 0x2A],
		Webp = [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x45, 0x42, 0x50],
		Svg,
		Ico = [0x00, 0x00, 0x01, 0x00],
		Heic = [0x66, 0x74, 0x79, 0x70, 0x68, 0x65, 0x69, 0x63] + 4,
		Avif = [0x66, 0x74, 0x79, 0x70, 0x61, 0x76, 0x69, 0x66] + 4,
		Raw,
		Dng = [0x49, 0x49, 0x2A, 0x00],
		Cr2 = [0x49, 0x49, 0x2A, 0x00, 0x10, 0x00, 0x00, 0x00, 0x43, 0x52],
		Nef = [0x49, 0x49, 0x2A, 0x00] | [0x4D, 0x4D, 0x00, 0x2A],
	}
}

// video extensions
extension_category_enum! {
	VideoExtension ALL_VIDEO_EXTENSIONS {
		Avi = [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x41, 0x56, 0x49, 0x20],
		Mov = [0x66, 0x74, 0x79, 0x70] + 4,
		Mp4,
		M4v = [0x66, 0x74, 0x79, 0x70] + 4,
		#[strum(serialize = "3gp")]
		#[serde(rename = "3gp")]
		_3gp,
		Mkv = [0x1A, 0x45, 0xDF, 0xA3],
		Webm = [0x1A, 0x45, 0xDF, 0xA3],
		Flv = [0x46, 0x4C, 0x56],
		Wmv = [0x30, 0x26, 0xB2, 0x75, 0x8E, 0x66, 0xCF, 0x11],
		Mpeg = [0x00, 0x00, 0x01, 0xBA] | [0x00, 0x00, 0x01, 0xB3],
		Mpg,
		Ts,
		Ogv = [0x4F, 0x67, 0x67, 0x53],
	}
}

// document extensions
extension_category_enum! {
	DocumentExtension ALL_DOCUMENT_EXTENSIONS {
		Pdf = [0x25, 0x50, 0x44, 0x46, 0x2D],
		Doc = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1],
		Docx = [0x50, 0x4B, 0x03, 0x04],
		Xls = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1],
		Xlsx = [0x50, 0x4B, 0x03, 0x04],
		Ppt = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1],
		Pptx = [0x50, 0x4B, 0x03, 0x04],
		Odt = [0x50, 0x4B, 0x03, 0x04],
		Ods = [0x50, 0x4B, 0x03, 0x04],
		Odp = [0x50, 0x4B, 0x03, 0x04],
		Rtf = [0x7B, 0x5C, 0x72, 0x74, 0x66],
		Txt,
		Md,
		Epub = [0x50, 0x4B, 0x03, 0x04],
		Djvu = [0x41, 0x54, 0x26, 0x54, 0x46, 0x4F, 0x52, 0x4D],
	}
}

// web link bookmarks
extension_category_enum! {
	LinkExtension ALL_LINK_EXTENSIONS {
		Link,
	}
}
