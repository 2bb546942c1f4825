//! # Record Kinds
//!
//! A [`RecordKind`] is the static description of one type of theme object: which folder
//! it lives in, which extensions it may use, how its files are laid out, and which
//! fields it declares. Kinds carry no I/O; the builder reads them to resolve identity.
//!
//! ## Built-in Kinds
//!
//! | Kind | Folder | Extensions | Format |
//! |------|--------|------------|--------|
//! | `page` | `pages` | `htm` | Compound |
//! | `partial` | `partials` | `htm` | Compound |
//! | `layout` | `layouts` | `htm` | Compound |
//! | `content` | `content` | `htm`, `txt`, `md` | Plain |
//! | `menu` | `menus` | `yaml` | Yaml |
//!
//! The first extension is the default: `"about"` resolves to `"about.htm"` for pages.
//!
//! ## File Name Rules
//!
//! - Characters: ASCII letters, digits, `_`, `-`, `.` and `/` (for subdirectories).
//! - No empty, `.` or `..` segments, so no leading or trailing `/`.
//! - At most [`RecordKind::max_nesting`] subdirectories.
//! - The extension is everything after the last dot of the last segment and must be
//!   in the kind's allow-list.

use crate::error::{Result, ThemeStoreError};
use crate::format::FileFormat;
use serde_json::Value;

/// Subdirectory limit of kinds that do not set their own.
pub const DEFAULT_MAX_NESTING: usize = 2;

/// The type of value a declared field holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Bool,
    Number,
    List,
    Map,
    Any,
}

impl FieldKind {
    /// Whether `value` fits this kind. `null` fits every kind (it clears the field).
    pub fn accepts(self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) | (FieldKind::Any, _) => true,
            (FieldKind::Text, Value::String(_)) => true,
            (FieldKind::Bool, Value::Bool(_)) => true,
            (FieldKind::Number, Value::Number(_)) => true,
            (FieldKind::List, Value::Array(_)) => true,
            (FieldKind::Map, Value::Object(_)) => true,
            _ => false,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Bool => "bool",
            FieldKind::Number => "number",
            FieldKind::List => "list",
            FieldKind::Map => "map",
            FieldKind::Any => "any",
        }
    }
}

/// Schema entry for one field of a kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self { name, kind }
    }
}

/// Static metadata describing one type of file-backed record.
#[derive(Debug, PartialEq, Eq)]
pub struct RecordKind {
    /// Singular name used in messages (e.g. "page").
    pub name: &'static str,

    /// Storage folder under the theme (e.g. "pages").
    pub object_type: &'static str,

    /// Allowed extensions; the first one is the default.
    pub allowed_extensions: &'static [&'static str],

    /// On-disk layout of the files.
    pub format: FileFormat,

    /// Declared fields.
    pub fields: &'static [FieldSpec],

    /// Maximum number of subdirectories a file name may contain. The filesystem
    /// datasource lists no deeper than this.
    pub max_nesting: usize,
}

impl RecordKind {
    /// Create a kind with the `htm` extension, no fields and a nesting limit of 2.
    pub const fn new(name: &'static str, object_type: &'static str, format: FileFormat) -> Self {
        Self {
            name,
            object_type,
            allowed_extensions: &["htm"],
            format,
            fields: &[],
            max_nesting: DEFAULT_MAX_NESTING,
        }
    }

    pub const fn extensions(mut self, extensions: &'static [&'static str]) -> Self {
        self.allowed_extensions = extensions;
        self
    }

    pub const fn fields(mut self, fields: &'static [FieldSpec]) -> Self {
        self.fields = fields;
        self
    }

    pub const fn max_nesting(mut self, depth: usize) -> Self {
        self.max_nesting = depth;
        self
    }

    pub fn is_compound(&self) -> bool {
        self.format == FileFormat::Compound
    }

    pub fn default_extension(&self) -> &'static str {
        self.allowed_extensions.first().copied().unwrap_or("htm")
    }

    pub fn allows_extension(&self, extension: &str) -> bool {
        self.allowed_extensions.contains(&extension)
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|spec| spec.name == name)
    }

    /// Compound objects keep open-ended settings, so they accept undeclared keys.
    pub fn accepts_field(&self, name: &str) -> bool {
        self.is_compound() || self.field(name).is_some()
    }

    /// Check a value against the schema before it is stored on a record.
    pub fn check_value(&self, name: &str, value: &Value) -> Result<()> {
        match self.field(name) {
            Some(spec) if !spec.kind.accepts(value) => Err(ThemeStoreError::FieldType {
                field: name.to_string(),
                expected: spec.kind.label().to_string(),
            }),
            Some(_) => Ok(()),
            None if self.accepts_field(name) => Ok(()),
            None => Err(ThemeStoreError::UnknownField {
                kind: self.name.to_string(),
                field: name.to_string(),
            }),
        }
    }

    pub fn validate_file_name(&self, file_name: &str) -> Result<()> {
        let invalid = |reason: &str| {
            Err(ThemeStoreError::InvalidFileName(format!(
                "'{}' {}",
                file_name, reason
            )))
        };

        if file_name.is_empty() {
            return invalid("is empty");
        }

        if !file_name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '/'))
        {
            return invalid("contains unsupported characters");
        }

        let segments: Vec<&str> = file_name.split('/').collect();
        if segments
            .iter()
            .any(|s| s.is_empty() || *s == "." || *s == "..")
        {
            return invalid("contains an empty or relative path segment");
        }

        if segments.len() - 1 > self.max_nesting {
            return invalid(&format!(
                "is nested deeper than {} directories",
                self.max_nesting
            ));
        }

        Ok(())
    }

    /// Split a file name into `(name, extension)`.
    ///
    /// A missing extension resolves to the default one; an extension outside the
    /// allow-list is rejected.
    pub fn split_file_name(&self, file_name: &str) -> Result<(String, String)> {
        self.validate_file_name(file_name)?;

        let base_start = file_name.rfind('/').map(|i| i + 1).unwrap_or(0);
        let base = &file_name[base_start..];

        match base.rfind('.') {
            None => Ok((
                file_name.to_string(),
                self.default_extension().to_string(),
            )),
            Some(dot) => {
                let extension = &base[dot + 1..];
                let name = &file_name[..base_start + dot];
                if extension.is_empty() || name.is_empty() || name.ends_with('/') {
                    return Err(ThemeStoreError::InvalidFileName(format!(
                        "'{}' has no name or extension",
                        file_name
                    )));
                }
                if !self.allows_extension(extension) {
                    return Err(ThemeStoreError::ExtensionNotAllowed {
                        file_name: file_name.to_string(),
                        allowed: self
                            .allowed_extensions
                            .iter()
                            .map(|e| e.to_string())
                            .collect(),
                    });
                }
                Ok((name.to_string(), extension.to_string()))
            }
        }
    }

    /// Split and recombine, producing the canonical `"{name}.{extension}"` form.
    pub fn normalize_file_name(&self, file_name: &str) -> Result<String> {
        let (name, extension) = self.split_file_name(file_name)?;
        Ok(format!("{}.{}", name, extension))
    }
}

const TEMPLATE_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("description", FieldKind::Text),
    FieldSpec::new("markup", FieldKind::Text),
    FieldSpec::new("code", FieldKind::Text),
];

pub static PAGE: RecordKind = RecordKind::new("page", "pages", FileFormat::Compound).fields(&[
    FieldSpec::new("title", FieldKind::Text),
    FieldSpec::new("url", FieldKind::Text),
    FieldSpec::new("layout", FieldKind::Text),
    FieldSpec::new("description", FieldKind::Text),
    FieldSpec::new("is_hidden", FieldKind::Bool),
    FieldSpec::new("markup", FieldKind::Text),
    FieldSpec::new("code", FieldKind::Text),
]);

pub static PARTIAL: RecordKind =
    RecordKind::new("partial", "partials", FileFormat::Compound).fields(TEMPLATE_FIELDS);

pub static LAYOUT: RecordKind =
    RecordKind::new("layout", "layouts", FileFormat::Compound).fields(TEMPLATE_FIELDS);

pub static CONTENT: RecordKind = RecordKind::new("content", "content", FileFormat::Plain)
    .extensions(&["htm", "txt", "md"])
    .fields(&[FieldSpec::new("markup", FieldKind::Text)]);

pub static MENU: RecordKind = RecordKind::new("menu", "menus", FileFormat::Yaml)
    .extensions(&["yaml"])
    .fields(&[
        FieldSpec::new("name", FieldKind::Text),
        FieldSpec::new("items", FieldKind::List),
    ])
    .max_nesting(0);

/// Registry of the built-in kinds.
pub static KINDS: &[&RecordKind] = &[&PAGE, &PARTIAL, &LAYOUT, &CONTENT, &MENU];

/// Look up a built-in kind by its singular name.
pub fn get_kind(name: &str) -> Option<&'static RecordKind> {
    KINDS.iter().copied().find(|kind| kind.name == name)
}

/// Look up a built-in kind by its storage folder.
pub fn kind_for_object_type(object_type: &str) -> Option<&'static RecordKind> {
    KINDS.iter().copied().find(|kind| kind.object_type == object_type)
}
