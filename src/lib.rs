//! Personal media catalog: records kept in an ordered list, mirrored into a
//! bound table view, persisted as JSON and enriched from OMDb in the background.

pub mod app;
pub mod config;
pub mod error;

pub use error::{LibraryError, Result};
