//! Shared test utilities for sitestack integration tests.
//!
//! This module provides:
//! - `PropsBuilder` for synthesis inputs
//! - `ConfigDir` for temporary config directories
//! - helpers for reading intrinsic functions back out of a template

pub mod builders;

pub use builders::*;
