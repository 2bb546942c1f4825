//! A theme is a named directory holding one folder per object type.

use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    name: String,
    path: PathBuf,
}

impl Theme {
    /// The theme `name` inside the `themes_path` directory.
    pub fn new(themes_path: impl AsRef<Path>, name: impl Into<String>) -> Self {
        let name = name.into();
        let path = themes_path.as_ref().join(&name);
        Self { name, path }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_dir()
    }

    /// Folder of one object type.
    pub fn object_dir(&self, object_type: &str) -> PathBuf {
        self.path.join(object_type)
    }
}
