//! # Cached Datasource
//!
//! Decorator that remembers select results of an inner datasource so repeated reads
//! of the same object or listing skip the disk.
//!
//! - **Keys**: `"{object_type}/{name}.{extension}"` for single objects, and
//!   `"{object_type}:{ext,ext}"` for listings. Misses (`None`) are cached too.
//! - **Expiry**: entries older than the TTL are refetched. Without a TTL they live
//!   until invalidated.
//! - **Invalidation**: every write through this datasource drops the touched objects
//!   (both sides of a rename) and every listing of the object type, even when the
//!   inner write fails part way.
//!
//! Writes made to the inner datasource directly, or by another process, are not seen
//! until the entry expires or [`CachedDatasource::flush`] is called.

use super::{file_name_of, Datasource, RawRecord};
use crate::error::Result;
use crate::record::Values;
use chrono::{DateTime, Duration, Utc};
use std::cell::RefCell;
use std::collections::HashMap;
use tracing::trace;

struct CacheEntry<T> {
    value: T,
    stored_at: DateTime<Utc>,
}

impl<T: Clone> CacheEntry<T> {
    fn new(value: T) -> Self {
        Self {
            value,
            stored_at: Utc::now(),
        }
    }

    fn fresh(&self, ttl: Option<Duration>) -> Option<T> {
        match ttl {
            Some(ttl) if Utc::now() - self.stored_at >= ttl => None,
            _ => Some(self.value.clone()),
        }
    }
}

pub struct CachedDatasource<D: Datasource> {
    inner: D,
    ttl: Option<Duration>,
    objects: RefCell<HashMap<String, CacheEntry<Option<RawRecord>>>>,
    listings: RefCell<HashMap<String, CacheEntry<Vec<RawRecord>>>>,
}

impl<D: Datasource> CachedDatasource<D> {
    pub fn new(inner: D) -> Self {
        Self {
            inner,
            ttl: None,
            objects: RefCell::new(HashMap::new()),
            listings: RefCell::new(HashMap::new()),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn inner(&self) -> &D {
        &self.inner
    }

    /// Drop every cached entry.
    pub fn flush(&self) {
        self.objects.borrow_mut().clear();
        self.listings.borrow_mut().clear();
    }

    /// Number of cached single-object and listing entries.
    pub fn cached_entries(&self) -> usize {
        self.objects.borrow().len() + self.listings.borrow().len()
    }

    fn object_key(object_type: &str, name: &str, extension: &str) -> String {
        format!("{}/{}", object_type, file_name_of(name, extension))
    }

    fn listing_key(object_type: &str, extensions: &[&str]) -> String {
        format!("{}:{}", object_type, extensions.join(","))
    }

    fn forget(&self, object_type: &str, name: &str, extension: &str) {
        self.objects
            .borrow_mut()
            .remove(&Self::object_key(object_type, name, extension));
        let prefix = format!("{}:", object_type);
        self.listings
            .borrow_mut()
            .retain(|key, _| !key.starts_with(&prefix));
    }
}

impl<D: Datasource> Datasource for CachedDatasource<D> {
    fn select_one(
        &self,
        object_type: &str,
        name: &str,
        extension: &str,
    ) -> Result<Option<RawRecord>> {
        let key = Self::object_key(object_type, name, extension);
        if let Some(hit) = self
            .objects
            .borrow()
            .get(&key)
            .and_then(|entry| entry.fresh(self.ttl))
        {
            trace!(%key, "cache hit");
            return Ok(hit);
        }

        trace!(%key, "cache miss");
        let result = self.inner.select_one(object_type, name, extension)?;
        self.objects
            .borrow_mut()
            .insert(key, CacheEntry::new(result.clone()));
        Ok(result)
    }

    fn select(&self, object_type: &str, extensions: &[&str]) -> Result<Vec<RawRecord>> {
        let key = Self::listing_key(object_type, extensions);
        if let Some(hit) = self
            .listings
            .borrow()
            .get(&key)
            .and_then(|entry| entry.fresh(self.ttl))
        {
            trace!(%key, "cache hit");
            return Ok(hit);
        }

        trace!(%key, "cache miss");
        let results = self.inner.select(object_type, extensions)?;
        self.listings
            .borrow_mut()
            .insert(key, CacheEntry::new(results.clone()));
        Ok(results)
    }

    fn insert(
        &self,
        object_type: &str,
        name: &str,
        extension: &str,
        values: &Values,
    ) -> Result<bool> {
        let result = self.inner.insert(object_type, name, extension, values);
        self.forget(object_type, name, extension);
        result
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
        let result = self.inner.update(
            object_type,
            name,
            extension,
            values,
            old_name,
            old_extension,
        );
        self.forget(object_type, name, extension);
        if let (Some(old_name), Some(old_extension)) = (old_name, old_extension) {
            self.forget(object_type, old_name, old_extension);
        }
        result
    }

    fn delete(&self, object_type: &str, name: &str, extension: &str) -> Result<usize> {
        let result = self.inner.delete(object_type, name, extension);
        self.forget(object_type, name, extension);
        result
    }

    fn last_modified(
        &self,
        object_type: &str,
        name: &str,
        extension: &str,
    ) -> Result<Option<DateTime<Utc>>> {
        self.inner.last_modified(object_type, name, extension)
    }
}
