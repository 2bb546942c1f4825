//! # Query Builder
//!
//! A [`Builder`] turns one logical operation on a record kind into a datasource call:
//!
//! ```text
//! caller → Builder::op → (Processor pre-hook) → Datasource::op → (Processor post-hook)
//!        → hydration → Record / Collection → caller
//! ```
//!
//! ## Identity Resolution
//!
//! File names are always split by the kind's rules and recombined, never passed
//! through verbatim. Names outside the extension allow-list fail before the datasource
//! is touched. Writes take their identity from the owning model (see
//! [`Builder::with_model`]); without one they fail with
//! [`ThemeStoreError::MissingFileName`].
//!
//! ## Outcomes
//!
//! - `find` returns `Ok(None)` for a missing object; absence is not an error.
//! - Datasource and processor errors propagate unchanged. No retries.
//!
//! ## State
//!
//! None. Each call makes at most one datasource round trip, and `remember` /
//! `remember_forever` are accepted for compatibility but do nothing: caching is the
//! datasource's job.

use crate::collection::Collection;
use crate::datasource::Datasource;
use crate::error::{Result, ThemeStoreError};
use crate::kind::RecordKind;
use crate::processor::Processor;
use crate::record::{Record, Values};
use tracing::{debug, trace};

pub struct Builder<'a> {
    datasource: &'a dyn Datasource,
    processor: &'a dyn Processor,
    kind: &'static RecordKind,
    model: Option<&'a Record>,
    theme: Option<&'a str>,
}

impl<'a> Builder<'a> {
    pub fn new(
        datasource: &'a dyn Datasource,
        processor: &'a dyn Processor,
        kind: &'static RecordKind,
    ) -> Self {
        Self {
            datasource,
            processor,
            kind,
            model: None,
            theme: None,
        }
    }

    /// Scope writes to `model`. The builder adopts the model's kind.
    pub fn with_model(mut self, model: &'a Record) -> Self {
        self.kind = model.kind();
        self.model = Some(model);
        self
    }

    /// Theme name stamped on hydrated records.
    pub fn in_theme(mut self, theme: &'a str) -> Self {
        self.theme = Some(theme);
        self
    }

    pub fn kind(&self) -> &'static RecordKind {
        self.kind
    }

    pub fn object_type(&self) -> &'static str {
        self.kind.object_type
    }

    pub fn model(&self) -> Option<&'a Record> {
        self.model
    }

    pub fn theme(&self) -> Option<&'a str> {
        self.theme
    }

    /// Caching hint, kept for query-builder compatibility. No effect here.
    pub fn remember(self, minutes: u64, key: Option<&str>) -> Self {
        trace!(minutes, key, "remember hint ignored by builder");
        self
    }

    /// Caching hint, kept for query-builder compatibility. No effect here.
    pub fn remember_forever(self, key: Option<&str>) -> Self {
        trace!(key, "remember_forever hint ignored by builder");
        self
    }

    /// Find one record by file name.
    pub fn find(&self, file_name: &str) -> Result<Option<Record>> {
        let (name, extension) = self.kind.split_file_name(file_name)?;
        let file_name = format!("{}.{}", name, extension);
        debug!(object_type = self.object_type(), %file_name, "find");

        let result = self
            .datasource
            .select_one(self.object_type(), &name, &extension)?;
        let result = self
            .processor
            .process_select_one(self, result, &file_name)?;

        Ok(result.map(|raw| Record::hydrate(self.kind, raw, self.theme)))
    }

    /// All records of the kind with an allowed extension, in datasource order.
    pub fn get(&self) -> Result<Collection> {
        debug!(object_type = self.object_type(), "get");
        let results = self
            .datasource
            .select(self.object_type(), self.kind.allowed_extensions)?;
        let results = self.processor.process_select(self, results)?;

        Ok(Record::hydrate_many(self.kind, results, self.theme))
    }

    /// Create the model's file. Empty `values` succeed without touching the datasource.
    pub fn insert(&self, values: Values) -> Result<bool> {
        if values.is_empty() {
            return Ok(true);
        }

        let (name, extension) = self.model_file_name_parts()?;
        let values = self.processor.process_insert(self, values)?;
        debug!(object_type = self.object_type(), %name, %extension, "insert");

        self.datasource
            .insert(self.object_type(), &name, &extension, &values)
    }

    /// Write the model's file. When the model's file name changed since it was loaded,
    /// the original name and extension are passed so the datasource can rename.
    pub fn update(&self, values: Values) -> Result<usize> {
        let (name, extension) = self.model_file_name_parts()?;
        let original = match self.model {
            Some(model) if model.is_file_name_dirty() => model.original_file_name_parts()?,
            _ => None,
        };
        let (old_name, old_extension) = match &original {
            Some((old_name, old_extension)) => {
                (Some(old_name.as_str()), Some(old_extension.as_str()))
            }
            None => (None, None),
        };

        let values = self.processor.process_update(self, values)?;
        debug!(
            object_type = self.object_type(),
            %name,
            %extension,
            old_name,
            old_extension,
            "update"
        );

        self.datasource.update(
            self.object_type(),
            &name,
            &extension,
            &values,
            old_name,
            old_extension,
        )
    }

    /// Delete by file name, or the model's own file when none is given.
    pub fn delete(&self, file_name: Option<&str>) -> Result<usize> {
        let (name, extension) = match file_name {
            Some(file_name) => self.kind.split_file_name(file_name)?,
            None => self.model_file_name_parts()?,
        };
        debug!(object_type = self.object_type(), %name, %extension, "delete");

        self.datasource
            .delete(self.object_type(), &name, &extension)
    }

    fn model_file_name_parts(&self) -> Result<(String, String)> {
        match self.model {
            Some(model) => model.file_name_parts(),
            None => Err(ThemeStoreError::MissingFileName(Box::new(Record::new(
                self.kind,
            )))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasource::memory::MemoryDatasource;
    use crate::datasource::RawRecord;
    use crate::kind::{CONTENT, PAGE};
    use crate::processor::NoopProcessor;
    use crate::record::Field;
    use chrono::{DateTime, Utc};
    use serde_json::{json, Value};
    use std::cell::RefCell;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        SelectOne(String, String, String),
        Select(String, Vec<String>),
        Insert(String, String, String, Values),
        Update {
            name: String,
            extension: String,
            old_name: Option<String>,
            old_extension: Option<String>,
        },
        Delete(String, String, String),
    }

    /// Memory datasource that records every call it receives.
    #[derive(Default)]
    struct Recording {
        inner: MemoryDatasource,
        calls: RefCell<Vec<Call>>,
    }

    impl Recording {
        fn calls(&self) -> Vec<Call> {
            self.calls.borrow().clone()
        }

        fn log(&self, call: Call) {
            self.calls.borrow_mut().push(call);
        }
    }

    impl Datasource for Recording {
        fn select_one(&self, ot: &str, name: &str, ext: &str) -> Result<Option<RawRecord>> {
            self.log(Call::SelectOne(ot.into(), name.into(), ext.into()));
            self.inner.select_one(ot, name, ext)
        }

        fn select(&self, ot: &str, exts: &[&str]) -> Result<Vec<RawRecord>> {
            self.log(Call::Select(
                ot.into(),
                exts.iter().map(|e| e.to_string()).collect(),
            ));
            self.inner.select(ot, exts)
        }

        fn insert(&self, ot: &str, name: &str, ext: &str, values: &Values) -> Result<bool> {
            self.log(Call::Insert(ot.into(), name.into(), ext.into(), values.clone()));
            self.inner.insert(ot, name, ext, values)
        }

        fn update(
            &self,
            ot: &str,
            name: &str,
            ext: &str,
            values: &Values,
            old_name: Option<&str>,
            old_ext: Option<&str>,
        ) -> Result<usize> {
            self.log(Call::Update {
                name: name.into(),
                extension: ext.into(),
                old_name: old_name.map(str::to_string),
                old_extension: old_ext.map(str::to_string),
            });
            self.inner.update(ot, name, ext, values, old_name, old_ext)
        }

        fn delete(&self, ot: &str, name: &str, ext: &str) -> Result<usize> {
            self.log(Call::Delete(ot.into(), name.into(), ext.into()));
            self.inner.delete(ot, name, ext)
        }

        fn last_modified(&self, ot: &str, name: &str, ext: &str) -> Result<Option<DateTime<Utc>>> {
            self.inner.last_modified(ot, name, ext)
        }
    }

    fn values(v: Value) -> Values {
        match v {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn page_named(file_name: &str) -> Record {
        let mut page = Record::new(&PAGE);
        page.set_file_name(file_name);
        page
    }

    fn seed(ds: &Recording, name: &str, title: &str) {
        ds.inner
            .insert("pages", name, "htm", &values(json!({"title": title})))
            .unwrap();
    }

    // --- find ---

    #[test]
    fn test_insert_then_find_round_trip() {
        let ds = Recording::default();
        let page = page_named("about.htm");
        let inserted = values(json!({"title": "About", "markup": "<p>Hi</p>"}));

        let ok = Builder::new(&ds, &NoopProcessor, &PAGE)
            .with_model(&page)
            .insert(inserted.clone())
            .unwrap();
        assert!(ok);
        assert_eq!(
            ds.calls()[0],
            Call::Insert("pages".into(), "about".into(), "htm".into(), inserted.clone())
        );

        let found = Builder::new(&ds, &NoopProcessor, &PAGE)
            .find("about.htm")
            .unwrap()
            .unwrap();
        assert_eq!(found.get(Field::TITLE), Some(&json!("About")));
        assert_eq!(found.attributes(), &inserted);
        assert!(!found.is_file_name_dirty());
    }

    #[test]
    fn test_find_missing_returns_none() {
        let ds = Recording::default();
        let result = Builder::new(&ds, &NoopProcessor, &PAGE)
            .find("nope.htm")
            .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_find_normalizes_file_name() {
        let ds = Recording::default();
        seed(&ds, "about", "About");

        let found = Builder::new(&ds, &NoopProcessor, &PAGE)
            .find("about")
            .unwrap()
            .unwrap();
        assert_eq!(found.file_name(), Some("about.htm"));
        assert_eq!(
            ds.calls(),
            vec![Call::SelectOne("pages".into(), "about".into(), "htm".into())]
        );
    }

    #[test]
    fn test_find_rejects_disallowed_extension_before_datasource() {
        let ds = Recording::default();
        let result = Builder::new(&ds, &NoopProcessor, &PAGE).find("about.php");
        assert!(matches!(
            result,
            Err(ThemeStoreError::ExtensionNotAllowed { .. })
        ));
        assert!(ds.calls().is_empty());
    }

    #[test]
    fn test_find_passes_normalized_name_to_processor() {
        struct Expect;
        impl Processor for Expect {
            fn process_select_one(
                &self,
                _query: &Builder<'_>,
                result: Option<RawRecord>,
                file_name: &str,
            ) -> Result<Option<RawRecord>> {
                assert_eq!(file_name, "about.htm");
                Ok(result)
            }
        }

        let ds = Recording::default();
        Builder::new(&ds, &Expect, &PAGE).find("about").unwrap();
    }

    #[test]
    fn test_processor_can_hide_select_one_result() {
        struct Hide;
        impl Processor for Hide {
            fn process_select_one(
                &self,
                _query: &Builder<'_>,
                _result: Option<RawRecord>,
                _file_name: &str,
            ) -> Result<Option<RawRecord>> {
                Ok(None)
            }
        }

        let ds = Recording::default();
        seed(&ds, "about", "About");
        let found = Builder::new(&ds, &Hide, &PAGE).find("about.htm").unwrap();
        assert!(found.is_none());
    }

    #[test]
    fn test_find_stamps_theme() {
        let ds = Recording::default();
        seed(&ds, "about", "About");
        let found = Builder::new(&ds, &NoopProcessor, &PAGE)
            .in_theme("demo")
            .find("about.htm")
            .unwrap()
            .unwrap();
        assert_eq!(found.theme(), Some("demo"));
    }

    // --- get ---

    #[test]
    fn test_get_preserves_count_and_order() {
        let ds = Recording::default();
        seed(&ds, "b", "B");
        seed(&ds, "a", "A");
        seed(&ds, "c", "C");

        let pages = Builder::new(&ds, &NoopProcessor, &PAGE).get().unwrap();
        let raw = ds.inner.select("pages", &["htm"]).unwrap();

        assert_eq!(pages.len(), raw.len());
        let names: Vec<_> = pages.iter().map(|p| p.file_name().unwrap()).collect();
        let raw_names: Vec<_> = raw.iter().map(|r| r.file_name.as_str()).collect();
        assert_eq!(names, raw_names);
    }

    #[test]
    fn test_get_uses_allowed_extensions() {
        let ds = Recording::default();
        Builder::new(&ds, &NoopProcessor, &CONTENT).get().unwrap();
        assert_eq!(
            ds.calls(),
            vec![Call::Select(
                "content".into(),
                vec!["htm".into(), "txt".into(), "md".into()]
            )]
        );
    }

    #[test]
    fn test_get_empty_is_not_an_error() {
        let ds = Recording::default();
        let pages = Builder::new(&ds, &NoopProcessor, &PAGE).get().unwrap();
        assert!(pages.is_empty());
    }

    // --- insert ---

    #[test]
    fn test_insert_empty_values_skips_datasource() {
        let ds = Recording::default();
        let page = page_named("about.htm");
        let ok = Builder::new(&ds, &NoopProcessor, &PAGE)
            .with_model(&page)
            .insert(Values::new())
            .unwrap();
        assert!(ok);
        assert!(ds.calls().is_empty());
    }

    #[test]
    fn test_insert_without_file_name_fails() {
        let ds = Recording::default();
        let page = Record::new(&PAGE);
        let result = Builder::new(&ds, &NoopProcessor, &PAGE)
            .with_model(&page)
            .insert(values(json!({"title": "x"})));
        assert!(matches!(result, Err(ThemeStoreError::MissingFileName(_))));
        assert!(ds.calls().is_empty());
    }

    #[test]
    fn test_insert_without_model_fails() {
        let ds = Recording::default();
        let result =
            Builder::new(&ds, &NoopProcessor, &PAGE).insert(values(json!({"title": "x"})));
        match result {
            Err(ThemeStoreError::MissingFileName(record)) => {
                assert_eq!(record.object_type(), "pages");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_insert_runs_processor_before_datasource() {
        struct Stamp;
        impl Processor for Stamp {
            fn process_insert(&self, _query: &Builder<'_>, mut values: Values) -> Result<Values> {
                values.insert("layout".into(), json!("default"));
                Ok(values)
            }
        }

        let ds = Recording::default();
        let page = page_named("about.htm");
        Builder::new(&ds, &Stamp, &PAGE)
            .with_model(&page)
            .insert(values(json!({"title": "About"})))
            .unwrap();

        match &ds.calls()[0] {
            Call::Insert(_, _, _, written) => assert_eq!(written["layout"], "default"),
            other => panic!("unexpected call: {:?}", other),
        }
    }

    #[test]
    fn test_datasource_error_propagates() {
        let ds = Recording::default();
        ds.inner.set_simulate_write_error(true);
        let page = page_named("about.htm");
        let result = Builder::new(&ds, &NoopProcessor, &PAGE)
            .with_model(&page)
            .insert(values(json!({"title": "x"})));
        assert!(matches!(result, Err(ThemeStoreError::Datasource(_))));
    }

    // --- update ---

    #[test]
    fn test_update_rename_passes_old_identity() {
        let ds = Recording::default();
        seed(&ds, "a", "A");

        let mut page = Builder::new(&ds, &NoopProcessor, &PAGE)
            .find("a.htm")
            .unwrap()
            .unwrap();
        page.set_file_name("b.htm");

        let count = Builder::new(&ds, &NoopProcessor, &PAGE)
            .with_model(&page)
            .update(page.attributes().clone())
            .unwrap();
        assert_eq!(count, 1);

        assert!(ds.calls().contains(&Call::Update {
            name: "b".into(),
            extension: "htm".into(),
            old_name: Some("a".into()),
            old_extension: Some("htm".into()),
        }));

        let query = Builder::new(&ds, &NoopProcessor, &PAGE);
        assert!(query.find("b.htm").unwrap().is_some());
        assert!(query.find("a.htm").unwrap().is_none());
    }

    #[test]
    fn test_update_without_rename_passes_no_old_identity() {
        let ds = Recording::default();
        seed(&ds, "a", "A");

        let mut page = Builder::new(&ds, &NoopProcessor, &PAGE)
            .find("a.htm")
            .unwrap()
            .unwrap();
        page.set(Field::MARKUP, "<p>changed</p>").unwrap();

        Builder::new(&ds, &NoopProcessor, &PAGE)
            .with_model(&page)
            .update(page.attributes().clone())
            .unwrap();

        assert!(ds.calls().contains(&Call::Update {
            name: "a".into(),
            extension: "htm".into(),
            old_name: None,
            old_extension: None,
        }));
    }

    #[test]
    fn test_update_without_file_name_fails() {
        let ds = Recording::default();
        let page = Record::new(&PAGE);
        let result = Builder::new(&ds, &NoopProcessor, &PAGE)
            .with_model(&page)
            .update(values(json!({"title": "x"})));
        assert!(matches!(result, Err(ThemeStoreError::MissingFileName(_))));
    }

    // --- delete ---

    #[test]
    fn test_delete_by_explicit_name() {
        let ds = Recording::default();
        seed(&ds, "a", "A");
        let removed = Builder::new(&ds, &NoopProcessor, &PAGE)
            .delete(Some("a"))
            .unwrap();
        assert_eq!(removed, 1);
        assert_eq!(
            ds.calls(),
            vec![Call::Delete("pages".into(), "a".into(), "htm".into())]
        );
    }

    #[test]
    fn test_delete_falls_back_to_model() {
        let ds = Recording::default();
        seed(&ds, "a", "A");
        let page = page_named("a.htm");
        let removed = Builder::new(&ds, &NoopProcessor, &PAGE)
            .with_model(&page)
            .delete(None)
            .unwrap();
        assert_eq!(removed, 1);
    }

    #[test]
    fn test_delete_without_any_name_fails() {
        let ds = Recording::default();
        let result = Builder::new(&ds, &NoopProcessor, &PAGE).delete(None);
        assert!(matches!(result, Err(ThemeStoreError::MissingFileName(_))));
        assert!(ds.calls().is_empty());
    }

    // --- remember ---

    #[test]
    fn test_remember_is_pass_through() {
        let ds = Recording::default();
        seed(&ds, "a", "A");
        let query = Builder::new(&ds, &NoopProcessor, &PAGE)
            .remember(10, Some("pages"))
            .remember_forever(None);

        query.find("a.htm").unwrap();
        query.find("a.htm").unwrap();
        let select_ones = ds
            .calls()
            .iter()
            .filter(|c| matches!(c, Call::SelectOne(..)))
            .count();
        assert_eq!(select_ones, 2);
    }
}
