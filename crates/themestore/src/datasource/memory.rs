use super::{file_name_of, rename_source, Datasource, RawRecord};
use crate::error::{Result, ThemeStoreError};
use crate::record::Values;
use chrono::{DateTime, Utc};
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

#[derive(Clone)]
struct StoredObject {
    values: Values,
    mtime: DateTime<Utc>,
}

/// In-memory datasource for testing.
///
/// Uses `RefCell` for interior mutability since the engine is single-threaded.
/// Objects are kept in a `BTreeMap`, so selects list them sorted by file name,
/// like a sorted directory walk.
#[derive(Default)]
pub struct MemoryDatasource {
    objects: RefCell<BTreeMap<(String, String), StoredObject>>,
    simulate_write_error: Cell<bool>,
}

impl MemoryDatasource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable write error simulation for testing error handling.
    pub fn set_simulate_write_error(&self, simulate: bool) {
        self.simulate_write_error.set(simulate);
    }

    pub fn contains(&self, object_type: &str, file_name: &str) -> bool {
        self.objects
            .borrow()
            .contains_key(&(object_type.to_string(), file_name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.objects.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.borrow().is_empty()
    }

    fn check_writable(&self) -> Result<()> {
        if self.simulate_write_error.get() {
            return Err(ThemeStoreError::Datasource(
                "Simulated write error".to_string(),
            ));
        }
        Ok(())
    }
}

impl Datasource for MemoryDatasource {
    fn select_one(
        &self,
        object_type: &str,
        name: &str,
        extension: &str,
    ) -> Result<Option<RawRecord>> {
        let file_name = file_name_of(name, extension);
        let objects = self.objects.borrow();
        Ok(objects
            .get(&(object_type.to_string(), file_name.clone()))
            .map(|stored| RawRecord {
                file_name,
                mtime: Some(stored.mtime),
                content: None,
                attributes: stored.values.clone(),
            }))
    }

    fn select(&self, object_type: &str, extensions: &[&str]) -> Result<Vec<RawRecord>> {
        let objects = self.objects.borrow();
        Ok(objects
            .iter()
            .filter(|((ot, file_name), _)| {
                ot == object_type
                    && file_name
                        .rsplit_once('.')
                        .is_some_and(|(_, ext)| extensions.contains(&ext))
            })
            .map(|((_, file_name), stored)| RawRecord {
                file_name: file_name.clone(),
                mtime: Some(stored.mtime),
                content: None,
                attributes: stored.values.clone(),
            })
            .collect())
    }

    fn insert(
        &self,
        object_type: &str,
        name: &str,
        extension: &str,
        values: &Values,
    ) -> Result<bool> {
        self.check_writable()?;
        let key = (object_type.to_string(), file_name_of(name, extension));
        let mut objects = self.objects.borrow_mut();
        if objects.contains_key(&key) {
            return Err(ThemeStoreError::AlreadyExists(format!(
                "{}/{}",
                key.0, key.1
            )));
        }
        objects.insert(
            key,
            StoredObject {
                values: values.clone(),
                mtime: Utc::now(),
            },
        );
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
        self.check_writable()?;
        let key = (object_type.to_string(), file_name_of(name, extension));
        let mut objects = self.objects.borrow_mut();

        if let Some((old_name, old_extension)) =
            rename_source(name, extension, old_name, old_extension)
        {
            if objects.contains_key(&key) {
                return Err(ThemeStoreError::AlreadyExists(format!(
                    "{}/{}",
                    key.0, key.1
                )));
            }
            objects.remove(&(
                object_type.to_string(),
                file_name_of(old_name, old_extension),
            ));
        }

        objects.insert(
            key,
            StoredObject {
                values: values.clone(),
                mtime: Utc::now(),
            },
        );
        Ok(1)
    }

    fn delete(&self, object_type: &str, name: &str, extension: &str) -> Result<usize> {
        self.check_writable()?;
        let mut objects = self.objects.borrow_mut();
        let removed = objects.remove(&(object_type.to_string(), file_name_of(name, extension)));
        Ok(usize::from(removed.is_some()))
    }

    fn last_modified(
        &self,
        object_type: &str,
        name: &str,
        extension: &str,
    ) -> Result<Option<DateTime<Utc>>> {
        let objects = self.objects.borrow();
        Ok(objects
            .get(&(object_type.to_string(), file_name_of(name, extension)))
            .map(|stored| stored.mtime))
    }
}
