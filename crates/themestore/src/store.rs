//! # Theme Store
//!
//! [`ThemeStore`] is the entry point: it owns one datasource and one processor for a
//! theme, and hands out [`Builder`]s scoped to a record kind.
//!
//! ```text
//! ThemeStore<D>
//! ├── datasource: D               (FileDatasource, CachedDatasource<_>, MemoryDatasource)
//! ├── processor: Box<dyn Processor>  (NoopProcessor unless replaced)
//! └── theme: Option<String>       (stamped on hydrated records)
//! ```
//!
//! Both collaborators are injected at construction; nothing is looked up from global
//! state, so tests can swap in fakes.

use crate::builder::Builder;
use crate::collection::Collection;
use crate::config::StoreConfig;
use crate::datasource::cached::CachedDatasource;
use crate::datasource::file::FileDatasource;
use crate::datasource::Datasource;
use crate::error::{Result, ThemeStoreError};
use crate::kind::RecordKind;
use crate::processor::{NoopProcessor, Processor};
use crate::record::Record;
use crate::theme::Theme;
use chrono::Duration;
use tracing::{info, warn};

pub struct ThemeStore<D: Datasource> {
    datasource: D,
    processor: Box<dyn Processor>,
    theme: Option<String>,
}

impl<D: Datasource> ThemeStore<D> {
    pub fn with_datasource(datasource: D) -> Self {
        Self {
            datasource,
            processor: Box::new(NoopProcessor),
            theme: None,
        }
    }

    pub fn with_processor(mut self, processor: impl Processor + 'static) -> Self {
        self.processor = Box::new(processor);
        self
    }

    pub fn in_theme(mut self, theme: impl Into<String>) -> Self {
        self.theme = Some(theme.into());
        self
    }

    pub fn datasource(&self) -> &D {
        &self.datasource
    }

    pub fn processor(&self) -> &dyn Processor {
        self.processor.as_ref()
    }

    pub fn theme(&self) -> Option<&str> {
        self.theme.as_deref()
    }

    /// A builder for `kind` over this store's datasource and processor.
    pub fn query(&self, kind: &'static RecordKind) -> Builder<'_> {
        let builder = Builder::new(&self.datasource, self.processor.as_ref(), kind);
        match self.theme.as_deref() {
            Some(theme) => builder.in_theme(theme),
            None => builder,
        }
    }

    pub fn find(&self, kind: &'static RecordKind, file_name: &str) -> Result<Option<Record>> {
        self.query(kind).find(file_name)
    }

    pub fn all(&self, kind: &'static RecordKind) -> Result<Collection> {
        self.query(kind).get()
    }
}

impl ThemeStore<CachedDatasource<FileDatasource>> {
    /// Open the configured active theme through a cached filesystem datasource.
    pub fn open(config: &StoreConfig) -> Result<Self> {
        let themes_path = config.themes_path().ok_or_else(|| {
            ThemeStoreError::Datasource("Could not determine a themes directory".to_string())
        })?;
        let theme = Theme::new(themes_path, config.active_theme.clone());
        if !theme.exists() {
            warn!(
                theme = theme.name(),
                path = %theme.path().display(),
                "theme directory does not exist yet"
            );
        }

        let mut datasource = CachedDatasource::new(FileDatasource::for_theme(&theme));
        if let Some(secs) = config.cache_ttl_secs {
            let secs = i64::try_from(secs).unwrap_or(i64::MAX);
            datasource = datasource.with_ttl(Duration::try_seconds(secs).unwrap_or(Duration::MAX));
        }

        info!(theme = theme.name(), path = %theme.path().display(), "opened theme");
        Ok(Self::with_datasource(datasource).in_theme(theme.name()))
    }
}
