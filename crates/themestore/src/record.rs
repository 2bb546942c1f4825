//! # Records
//!
//! A [`Record`] is one file-backed object: its kind, its file name, and a map of
//! attribute values checked against the kind's field schema.
//!
//! ## Identity and Renames
//!
//! Two file names are tracked:
//! - `file_name`: where the record should live.
//! - `original_file_name`: where it was loaded from (set once at hydration, and again
//!   after each successful save).
//!
//! When they differ the record is being renamed, and the builder passes the original
//! name and extension to the datasource alongside the new ones.
//!
//! ## Reserved Attributes
//!
//! `file_name`, `mtime` and `content` are maintained by the engine. They are exposed
//! through accessors and never stored in the attribute map, so they are never written
//! back into a file.

use crate::collection::Collection;
use crate::datasource::{Datasource, RawRecord};
use crate::error::{Result, ThemeStoreError};
use crate::kind::RecordKind;
use crate::store::ThemeStore;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Attribute map, keyed by field name.
pub type Values = serde_json::Map<String, Value>;

pub const RESERVED_ATTRIBUTES: &[&str] = &["file_name", "mtime", "content"];

/// Compile-time field identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Field(&'static str);

impl Field {
    pub const TITLE: Field = Field("title");
    pub const URL: Field = Field("url");
    pub const LAYOUT: Field = Field("layout");
    pub const DESCRIPTION: Field = Field("description");
    pub const IS_HIDDEN: Field = Field("is_hidden");
    pub const MARKUP: Field = Field("markup");
    pub const CODE: Field = Field("code");
    pub const NAME: Field = Field("name");
    pub const ITEMS: Field = Field("items");

    /// Identifier for a field declared by a custom kind.
    pub const fn custom(name: &'static str) -> Self {
        Field(name)
    }

    pub const fn name(self) -> &'static str {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    kind: &'static RecordKind,
    file_name: Option<String>,
    original_file_name: Option<String>,
    attributes: Values,
    mtime: Option<DateTime<Utc>>,
    content: Option<String>,
    theme: Option<String>,
    exists: bool,
}

impl Record {
    pub fn new(kind: &'static RecordKind) -> Self {
        Self {
            kind,
            file_name: None,
            original_file_name: None,
            attributes: Values::new(),
            mtime: None,
            content: None,
            theme: None,
            exists: false,
        }
    }

    /// Build a record from a datasource result. The result's file name becomes both
    /// the current and the original name, so a fresh record is never seen as renamed.
    pub fn hydrate(kind: &'static RecordKind, raw: RawRecord, theme: Option<&str>) -> Self {
        let RawRecord {
            file_name,
            mtime,
            content,
            mut attributes,
        } = raw;
        attributes.retain(|key, _| !RESERVED_ATTRIBUTES.contains(&key.as_str()));

        Self {
            kind,
            file_name: Some(file_name.clone()),
            original_file_name: Some(file_name),
            attributes,
            mtime,
            content,
            theme: theme.map(str::to_string),
            exists: true,
        }
    }

    pub fn hydrate_many(
        kind: &'static RecordKind,
        raws: Vec<RawRecord>,
        theme: Option<&str>,
    ) -> Collection {
        raws.into_iter()
            .map(|raw| Record::hydrate(kind, raw, theme))
            .collect()
    }

    // --- Metadata ---

    pub fn kind(&self) -> &'static RecordKind {
        self.kind
    }

    pub fn object_type(&self) -> &'static str {
        self.kind.object_type
    }

    pub fn allowed_extensions(&self) -> &'static [&'static str] {
        self.kind.allowed_extensions
    }

    pub fn is_compound(&self) -> bool {
        self.kind.is_compound()
    }

    pub fn theme(&self) -> Option<&str> {
        self.theme.as_deref()
    }

    pub fn mtime(&self) -> Option<DateTime<Utc>> {
        self.mtime
    }

    /// Raw file content as last read by the datasource, if it provided one.
    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    /// Whether the record was loaded from, or has been saved to, the datasource.
    pub fn exists(&self) -> bool {
        self.exists
    }

    // --- Identity ---

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    pub fn set_file_name(&mut self, file_name: impl Into<String>) {
        self.file_name = Some(file_name.into());
    }

    pub fn original_file_name(&self) -> Option<&str> {
        self.original_file_name.as_deref()
    }

    pub fn is_file_name_dirty(&self) -> bool {
        self.original_file_name.is_some() && self.original_file_name != self.file_name
    }

    /// Current identity as `(name, extension)`.
    pub fn file_name_parts(&self) -> Result<(String, String)> {
        match &self.file_name {
            Some(file_name) => self.kind.split_file_name(file_name),
            None => Err(ThemeStoreError::MissingFileName(Box::new(self.clone()))),
        }
    }

    /// Identity the record was loaded from, if any.
    pub fn original_file_name_parts(&self) -> Result<Option<(String, String)>> {
        self.original_file_name
            .as_deref()
            .map(|file_name| self.kind.split_file_name(file_name))
            .transpose()
    }

    /// Forget the loaded location; the current file name becomes the original one.
    pub fn sync_original(&mut self) {
        self.original_file_name = self.file_name.clone();
    }

    // --- Attributes ---

    pub fn attributes(&self) -> &Values {
        &self.attributes
    }

    pub fn get(&self, field: Field) -> Option<&Value> {
        self.get_attr(field.name())
    }

    pub fn get_attr(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// Read a field and deserialize it into `T`.
    pub fn get_as<T: DeserializeOwned>(&self, field: Field) -> Result<Option<T>> {
        match self.get(field) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
        }
    }

    pub fn set(&mut self, field: Field, value: impl Into<Value>) -> Result<()> {
        self.set_attr(field.name(), value.into())
    }

    pub fn set_attr(&mut self, name: &str, value: Value) -> Result<()> {
        if RESERVED_ATTRIBUTES.contains(&name) {
            return Err(ThemeStoreError::UnknownField {
                kind: self.kind.name.to_string(),
                field: name.to_string(),
            });
        }
        self.kind.check_value(name, &value)?;
        self.attributes.insert(name.to_string(), value);
        Ok(())
    }

    pub fn remove_attr(&mut self, name: &str) -> Option<Value> {
        self.attributes.remove(name)
    }

    /// Set several attributes at once. Stops at the first rejected value.
    pub fn fill(&mut self, values: Values) -> Result<()> {
        for (name, value) in values {
            self.set_attr(&name, value)?;
        }
        Ok(())
    }

    // --- Persistence ---

    /// Insert the record if it is new, update it (following a rename) otherwise.
    ///
    /// The file name is normalized first, so `"about"` is saved as `"about.htm"`.
    /// Saving a new record with no attributes writes nothing.
    pub fn save<D: Datasource>(&mut self, store: &ThemeStore<D>) -> Result<()> {
        let (name, extension) = self.file_name_parts()?;
        self.file_name = Some(format!("{}.{}", name, extension));

        let values = self.attributes.clone();
        if self.exists {
            store.query(self.kind).with_model(self).update(values)?;
        } else {
            if values.is_empty() {
                return Ok(());
            }
            store.query(self.kind).with_model(self).insert(values)?;
            self.exists = true;
        }

        self.sync_original();
        if self.theme.is_none() {
            self.theme = store.theme().map(str::to_string);
        }
        Ok(())
    }

    /// Delete the record's file. Returns the number of objects removed.
    pub fn delete<D: Datasource>(&mut self, store: &ThemeStore<D>) -> Result<usize> {
        let removed = store.query(self.kind).with_model(self).delete(None)?;
        self.exists = false;
        Ok(removed)
    }
}
