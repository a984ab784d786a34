//! bi-client
//!
//! HTTP client for the BI platform REST API, plus the [`PlatformApi`] seam the
//! deletion engine is written against.

pub(crate) mod client;
pub(crate) mod error;
pub(crate) mod platform;
pub mod rison;


pub use client::{Client, EXPORT_CHUNK_SIZE, PAGE_SIZE};
pub use error::{ClientError, Result as ClientResult};
pub use platform::PlatformApi;
