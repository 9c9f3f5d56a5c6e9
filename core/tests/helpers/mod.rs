//! Shared fakes and fixtures for the integration tests
#![allow(dead_code)]

pub mod dao;
pub mod fixtures;
pub mod previews;

pub use dao::*;
pub use fixtures::*;
pub use previews::*;
