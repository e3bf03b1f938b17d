//! # Local File Provider
//!
//! Resolves `local-file` tracks straight from the filesystem. The locator
//! is an absolute path; no network I/O is involved.

mod provider;

pub use provider::LocalFileProvider;
