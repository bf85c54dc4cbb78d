//! SAMADhi Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared plumbing for the SAMADhi workspace members:
//!
//! - **Error categories**: the configuration / validation / usage / storage
//!   taxonomy every crate maps its errors onto
//! - **Logging**: tracing subscriber setup for the CLI and tests

pub mod error;
pub mod logging;

pub use error::{Categorized, ErrorCategory};
