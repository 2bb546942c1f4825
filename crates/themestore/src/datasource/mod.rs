//! # Datasources
//!
//! The [`Datasource`] trait is the storage seam of the engine. Every operation is keyed
//! by the three-part identity `(object_type, name, extension)`; the datasource owns all
//! actual I/O, locking and caching.
//!
//! ## Implementations
//!
//! - [`file::FileDatasource`]: files under a theme directory.
//! - [`memory::MemoryDatasource`]: in-memory maps for testing logic without disk I/O.
//! - [`cached::CachedDatasource`]: decorator caching selects of any datasource.
//!
//! ## Renames
//!
//! `update` receives the old name and extension when the record is being renamed, so
//! the backend can move and rewrite in one call. Whether that is a single filesystem
//! rename is up to the backend; [`file::FileDatasource`] moves the file with one
//! `rename` and then rewrites it atomically.
//!
//! ## Concurrency
//!
//! Datasources take `&self` and use interior mutability where they hold state. None of
//! them lock files: two writers on the same identity race, and the last write wins.

use crate::error::Result;
use crate::record::Values;
use chrono::{DateTime, Utc};

pub mod cached;
pub mod file;
pub mod memory;

/// Backend-specific result of a select, consumed by processors and hydration.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    /// `"{name}.{extension}"`, relative to the object type folder.
    pub file_name: String,
    pub mtime: Option<DateTime<Utc>>,
    /// Raw file text, when the backend has one.
    pub content: Option<String>,
    /// Parsed values.
    pub attributes: Values,
}

impl RawRecord {
    pub fn new(file_name: impl Into<String>, attributes: Values) -> Self {
        Self {
            file_name: file_name.into(),
            mtime: None,
            content: None,
            attributes,
        }
    }
}

/// Abstract interface for record storage.
pub trait Datasource {
    /// Fetch one object. Returns Ok(None) when it does not exist.
    fn select_one(
        &self,
        object_type: &str,
        name: &str,
        extension: &str,
    ) -> Result<Option<RawRecord>>;

    /// Fetch every object of a type whose extension is in `extensions`.
    fn select(&self, object_type: &str, extensions: &[&str]) -> Result<Vec<RawRecord>>;

    /// Create a new object. Fails if it already exists.
    fn insert(
        &self,
        object_type: &str,
        name: &str,
        extension: &str,
        values: &Values,
    ) -> Result<bool>;

    /// Write an object, moving it from `old_name.old_extension` first when both are given.
    /// Returns the number of objects written.
    fn update(
        &self,
        object_type: &str,
        name: &str,
        extension: &str,
        values: &Values,
        old_name: Option<&str>,
        old_extension: Option<&str>,
    ) -> Result<usize>;

    /// Remove an object. Returns the number of objects removed (0 if it was absent).
    fn delete(&self, object_type: &str, name: &str, extension: &str) -> Result<usize>;

    /// Modification time of an object, if it exists.
    fn last_modified(
        &self,
        object_type: &str,
        name: &str,
        extension: &str,
    ) -> Result<Option<DateTime<Utc>>>;
}

/// Join identity parts the way every datasource spells file names.
pub fn file_name_of(name: &str, extension: &str) -> String {
    format!("{}.{}", name, extension)
}

/// Resolve the old identity of an update, ignoring a partial or unchanged pair.
pub(crate) fn rename_source<'a>(
    name: &str,
    extension: &str,
    old_name: Option<&'a str>,
    old_extension: Option<&'a str>,
) -> Option<(&'a str, &'a str)> {
    match (old_name, old_extension) {
        (Some(old_name), Some(old_extension))
            if (old_name, old_extension) != (name, extension) =>
        {
            Some((old_name, old_extension))
        }
        _ => None,
    }
}
