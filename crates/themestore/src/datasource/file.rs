use super::{file_name_of, rename_source, Datasource, RawRecord};
use crate::error::{Result, ThemeStoreError};
use crate::format::FileFormat;
use crate::kind::{RecordKind, DEFAULT_MAX_NESTING, KINDS};
use crate::record::Values;
use crate::theme::Theme;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};
use uuid::Uuid;
use walkdir::{DirEntry, WalkDir};

/// Datasource reading and writing files under a theme directory.
///
/// ```text
/// {root}/
/// ├── pages/
/// │   ├── about.htm
/// │   └── blog/post.htm
/// ├── partials/
/// └── menus/main.yaml
/// ```
///
/// Each object type is a folder; the format of its files and how deep it is listed
/// come from the registered [`RecordKind`]s (unknown folders are read as plain files).
pub struct FileDatasource {
    root: PathBuf,
    folders: HashMap<String, Folder>,
}

/// How the files of one object type folder are laid out.
#[derive(Debug, Clone, Copy)]
struct Folder {
    format: FileFormat,
    max_nesting: usize,
}

impl Default for Folder {
    fn default() -> Self {
        Self {
            format: FileFormat::Plain,
            max_nesting: DEFAULT_MAX_NESTING,
        }
    }
}

impl FileDatasource {
    /// Datasource rooted at `root`, with every built-in kind registered.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let mut datasource = Self {
            root: root.into(),
            folders: HashMap::new(),
        };
        for kind in KINDS {
            datasource = datasource.with_kind(kind);
        }
        datasource
    }

    pub fn for_theme(theme: &Theme) -> Self {
        Self::new(theme.path())
    }

    /// Register the file format and nesting limit of a kind's folder.
    ///
    /// `select` descends no deeper than the kind accepts in a file name, so every
    /// listed object can be found and saved again.
    pub fn with_kind(mut self, kind: &RecordKind) -> Self {
        let folder = Folder {
            format: kind.format,
            max_nesting: kind.max_nesting,
        };
        self.folders.insert(kind.object_type.to_string(), folder);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn folder(&self, object_type: &str) -> Folder {
        self.folders.get(object_type).copied().unwrap_or_default()
    }

    fn object_path(&self, object_type: &str, name: &str, extension: &str) -> PathBuf {
        self.root
            .join(object_type)
            .join(file_name_of(name, extension))
    }

    fn ensure_parent(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent).map_err(ThemeStoreError::Io)?;
            }
        }
        Ok(())
    }

    fn read_object(&self, object_type: &str, path: &Path, file_name: String) -> Result<RawRecord> {
        let content = fs::read_to_string(path).map_err(ThemeStoreError::Io)?;
        let attributes = self.folder(object_type).format.decode(&content)?;
        let mtime = file_mtime(path)?;

        Ok(RawRecord {
            file_name,
            mtime,
            content: Some(content),
            attributes,
        })
    }

    fn write_object(&self, object_type: &str, path: &Path, values: &Values) -> Result<()> {
        let content = self.folder(object_type).format.encode(values)?;
        self.ensure_parent(path)?;

        // Atomic Write
        let dir = path.parent().unwrap_or(&self.root);
        let tmp_path = dir.join(format!(".object-{}.tmp", Uuid::new_v4()));
        fs::write(&tmp_path, content).map_err(ThemeStoreError::Io)?;
        if let Err(e) = fs::rename(&tmp_path, path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(ThemeStoreError::Io(e));
        }

        Ok(())
    }
}

/// Dot-prefixed files and folders (`.git`, editor swap files, our own temp files).
fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

fn file_mtime(path: &Path) -> Result<Option<DateTime<Utc>>> {
    let meta = fs::metadata(path).map_err(ThemeStoreError::Io)?;
    Ok(meta.modified().ok().map(DateTime::<Utc>::from))
}

impl Datasource for FileDatasource {
    fn select_one(
        &self,
        object_type: &str,
        name: &str,
        extension: &str,
    ) -> Result<Option<RawRecord>> {
        let path = self.object_path(object_type, name, extension);
        if !path.is_file() {
            trace!(path = %path.display(), "object not found");
            return Ok(None);
        }
        self.read_object(object_type, &path, file_name_of(name, extension)).map(Some)
    }

    fn select(&self, object_type: &str, extensions: &[&str]) -> Result<Vec<RawRecord>> {
        let dir = self.root.join(object_type);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut records = Vec::new();
        let walker = WalkDir::new(&dir)
            .min_depth(1)
            .max_depth(self.folder(object_type).max_nesting + 1)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry));

        for entry in walker {
            let entry = entry.map_err(std::io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
            if !extensions.contains(&extension) {
                continue;
            }

            let Ok(relative) = path.strip_prefix(&dir) else {
                continue;
            };
            let file_name = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");

            records.push(self.read_object(object_type, path, file_name)?);
        }

        debug!(object_type, count = records.len(), "listed objects");
        Ok(records)
    }

    fn insert(
        &self,
        object_type: &str,
        name: &str,
        extension: &str,
        values: &Values,
    ) -> Result<bool> {
        let path = self.object_path(object_type, name, extension);
        if path.exists() {
            return Err(ThemeStoreError::AlreadyExists(path.display().to_string()));
        }

        self.write_object(object_type, &path, values)?;
        debug!(object_type, name, extension, "inserted object");
        Ok(true)
    }

    fn update(
        &self,
        object_type: &str,
        name: &str,
        extension: &str,
        values: &Values,
        old_name: Option<&str>,
        old_extension: Option<&str>,
    ) -> Result<usize> {
        let path = self.object_path(object_type, name, extension);

        if let Some((old_name, old_extension)) =
            rename_source(name, extension, old_name, old_extension)
        {
            let old_path = self.object_path(object_type, old_name, old_extension);
            if path.exists() {
                return Err(ThemeStoreError::AlreadyExists(path.display().to_string()));
            }
            if old_path.exists() {
                self.ensure_parent(&path)?;
                fs::rename(&old_path, &path).map_err(ThemeStoreError::Io)?;
                debug!(
                    object_type,
                    from = %file_name_of(old_name, old_extension),
                    to = %file_name_of(name, extension),
                    "renamed object"
                );
            }
        }

        self.write_object(object_type, &path, values)?;
        debug!(object_type, name, extension, "updated object");
        Ok(1)
    }

    fn delete(&self, object_type: &str, name: &str, extension: &str) -> Result<usize> {
        let path = self.object_path(object_type, name, extension);
        if !path.is_file() {
            return Ok(0);
        }
        fs::remove_file(&path).map_err(ThemeStoreError::Io)?;
        debug!(object_type, name, extension, "deleted object");
        Ok(1)
    }

    fn last_modified(
        &self,
        object_type: &str,
        name: &str,
        extension: &str,
    ) -> Result<Option<DateTime<Utc>>> {
        let path = self.object_path(object_type, name, extension);
        if !path.exists() {
            return Ok(None);
        }
        file_mtime(&path)
    }
}
