//! # Themestore Architecture
//!
//! Themestore is a **file-backed record store** for CMS theme objects: pages, partials,
//! layouts, content snippets and menus. Each object lives as a file inside a theme
//! directory, and calling code reads and writes them through a fluent, query-builder
//! style API instead of touching the filesystem directly.
//!
//! ## The Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Store Facade (store.rs)                                    │
//! │  - Owns one Datasource and one Processor                    │
//! │  - Hands out Builders scoped to a RecordKind                │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Builder (builder.rs)                                       │
//! │  - Resolves identity: "about.htm" → ("about", "htm")        │
//! │  - Runs Processor hooks around every Datasource call        │
//! │  - Hydrates raw results into Records / Collections          │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Datasource (datasource/)                                   │
//! │  - FileDatasource (production), MemoryDatasource (testing)  │
//! │  - CachedDatasource decorator                               │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//!
//! A record is addressed by `(object_type, name, extension)`. The object type is the
//! folder of its [`kind::RecordKind`] (`pages`, `partials`, ...). The file name
//! `"blog/post.htm"` splits at the last dot into name `blog/post` and extension `htm`.
//! The builder always recombines the two parts itself rather than trusting caller input.
//!
//! ## Where State Lives
//!
//! The builder holds no state between calls. Caching belongs to whichever datasource is
//! configured ([`datasource::cached::CachedDatasource`]); the builder's
//! `remember` hints are accepted and ignored.
//!
//! ## Example
//!
//! ```no_run
//! use themestore::datasource::memory::MemoryDatasource;
//! use themestore::kind::PAGE;
//! use themestore::record::{Field, Record};
//! use themestore::store::ThemeStore;
//!
//! # fn main() -> themestore::Result<()> {
//! let store = ThemeStore::with_datasource(MemoryDatasource::new());
//!
//! let mut page = Record::new(&PAGE);
//! page.set_file_name("about.htm");
//! page.set(Field::TITLE, "About")?;
//! page.set(Field::MARKUP, "<p>Hi</p>")?;
//! page.save(&store)?;
//!
//! let found = store.find(&PAGE, "about.htm")?.expect("saved above");
//! assert_eq!(found.get(Field::TITLE).and_then(|v| v.as_str()), Some("About"));
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod collection;
pub mod config;
pub mod datasource;
pub mod error;
pub mod format;
pub mod kind;
pub mod processor;
pub mod record;
pub mod store;
pub mod theme;

#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;

pub use error::{Result, ThemeStoreError};
