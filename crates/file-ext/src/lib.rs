//! File extension catalog used to classify resources by kind.
//!
//! Every category enum carries the lowercase extensions it accepts and, where the format has
//! one, the signature ("magic bytes") found at the start of a well formed file.

pub mod extensions;
pub mod magic;
