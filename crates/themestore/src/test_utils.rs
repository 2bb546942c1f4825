use crate::datasource::file::FileDatasource;
use crate::store::ThemeStore;
use crate::theme::Theme;
use std::path::PathBuf;
use tempfile::TempDir;

/// A throwaway theme directory with a filesystem-backed store on top.
pub struct TestEnv {
    // We keep _temp_dir to ensure the directory is not dropped until the test is done
    pub _temp_dir: TempDir,
    pub store: ThemeStore<FileDatasource>,
    pub root: PathBuf,
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl TestEnv {
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("failed to create temp dir");
        let theme = Theme::new(temp_dir.path(), "test");
        let root = theme.path().to_path_buf();
        let store = ThemeStore::with_datasource(FileDatasource::for_theme(&theme)).in_theme("test");
        Self {
            _temp_dir: temp_dir,
            store,
            root,
        }
    }

    /// Write a raw file into the theme, creating folders as needed.
    pub fn write_file(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.root.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("failed to create theme folder");
        }
        std::fs::write(&path, content).expect("failed to write theme file");
        path
    }

    pub fn read_file(&self, relative: &str) -> Option<String> {
        std::fs::read_to_string(self.root.join(relative)).ok()
    }
}
