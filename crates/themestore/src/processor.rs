//! # Processor Pipeline
//!
//! Processors intercept the raw inputs and outputs of each builder operation, so
//! cross-cutting behavior (default values, derived fields, auditing) can be added
//! without the builder knowing about it.
//!
//! | Hook | Runs | Receives |
//! |------|------|----------|
//! | `process_select_one` | after `Datasource::select_one` | the result (or `None`) and the normalized file name |
//! | `process_select` | after `Datasource::select` | all results, in datasource order |
//! | `process_insert` | before `Datasource::insert` | the values to write |
//! | `process_update` | before `Datasource::update` | the values to write |
//!
//! Every hook gets the [`Builder`] for context (kind, model, theme) and returns a value
//! of the same shape. The default implementation of each hook is the identity.
//!
//! Processors must not keep state between calls: running the same query twice has to
//! produce the same result.

use crate::builder::Builder;
use crate::datasource::RawRecord;
use crate::error::Result;
use crate::record::Values;
use serde_json::Value;
use std::collections::HashMap;

pub trait Processor {
    fn process_select_one(
        &self,
        _query: &Builder<'_>,
        result: Option<RawRecord>,
        _file_name: &str,
    ) -> Result<Option<RawRecord>> {
        Ok(result)
    }

    fn process_select(
        &self,
        _query: &Builder<'_>,
        results: Vec<RawRecord>,
    ) -> Result<Vec<RawRecord>> {
        Ok(results)
    }

    fn process_insert(&self, _query: &Builder<'_>, values: Values) -> Result<Values> {
        Ok(values)
    }

    fn process_update(&self, _query: &Builder<'_>, values: Values) -> Result<Values> {
        Ok(values)
    }
}

/// Identity processor.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProcessor;

impl Processor for NoopProcessor {}

/// Fills in missing values on insert, per record kind.
///
/// Updates are left alone: a value removed on purpose stays removed.
#[derive(Debug, Default, Clone)]
pub struct DefaultValues {
    defaults: HashMap<&'static str, Values>,
}

impl DefaultValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Default `value` for `field` on records stored in `object_type`.
    pub fn with(mut self, object_type: &'static str, field: &str, value: impl Into<Value>) -> Self {
        self.defaults
            .entry(object_type)
            .or_default()
            .insert(field.to_string(), value.into());
        self
    }
}

impl Processor for DefaultValues {
    fn process_insert(&self, query: &Builder<'_>, mut values: Values) -> Result<Values> {
        if let Some(defaults) = self.defaults.get(query.object_type()) {
            for (field, value) in defaults {
                if !values.contains_key(field) {
                    values.insert(field.clone(), value.clone());
                }
            }
        }
        Ok(values)
    }
}

/// Runs processors in registration order, feeding each output into the next.
#[derive(Default)]
pub struct ProcessorChain {
    processors: Vec<Box<dyn Processor>>,
}

impl ProcessorChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, processor: impl Processor + 'static) -> Self {
        self.processors.push(Box::new(processor));
        self
    }

    pub fn len(&self) -> usize {
        self.processors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }
}

impl Processor for ProcessorChain {
    fn process_select_one(
        &self,
        query: &Builder<'_>,
        result: Option<RawRecord>,
        file_name: &str,
    ) -> Result<Option<RawRecord>> {
        self.processors
            .iter()
            .try_fold(result, |result, p| p.process_select_one(query, result, file_name))
    }

    fn process_select(
        &self,
        query: &Builder<'_>,
        results: Vec<RawRecord>,
    ) -> Result<Vec<RawRecord>> {
        self.processors
            .iter()
            .try_fold(results, |results, p| p.process_select(query, results))
    }

    fn process_insert(&self, query: &Builder<'_>, values: Values) -> Result<Values> {
        self.processors
            .iter()
            .try_fold(values, |values, p| p.process_insert(query, values))
    }

    fn process_update(&self, query: &Builder<'_>, values: Values) -> Result<Values> {
        self.processors
            .iter()
            .try_fold(values, |values, p| p.process_update(query, values))
    }
}
