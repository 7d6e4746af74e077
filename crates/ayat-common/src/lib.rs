//! Ayat Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared error handling, logging setup and durable JSON file helpers for
//! the Ayat workspace.
//!
//! # Example
//!
//! ```no_run
//! use ayat_common::json_file::{read_json, write_json_atomic};
//! use std::collections::BTreeMap;
//!
//! fn bump(path: &str) -> ayat_common::Result<()> {
//!     let mut counts: BTreeMap<String, u64> = read_json(path)?.unwrap_or_default();
//!     *counts.entry("runs".to_string()).or_default() += 1;
//!     write_json_atomic(path, &counts)
//! }
//! ```

pub mod error;
pub mod json_file;
pub mod logging;

// Re-export commonly used types
pub use error::{AyatError, Result};
