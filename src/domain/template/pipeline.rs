// Filter trait and the name -> filter registry

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::value::Value;
use crate::error::{FilterError, Result, TemplateError};

/// A named, pure transformation applied through `|name[:arg]`.
pub trait Filter: Send + Sync {
    fn apply(&self, input: &Value, arg: Option<&Value>) -> std::result::Result<Value, FilterError>;
}

impl<F> Filter for F
where
    F: Fn(&Value, Option<&Value>) -> std::result::Result<Value, FilterError> + Send + Sync,
{
    fn apply(&self, input: &Value, arg: Option<&Value>) -> std::result::Result<Value, FilterError> {
        self(input, arg)
    }
}

/// Registry for filters, append-only while it is being built
#[derive(Clone, Default)]
pub struct FilterRegistry {
    filters: HashMap<String, Arc<dyn Filter>>,
}

impl FilterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, filter: Arc<dyn Filter>) -> Result<()> {
        let name = name.into();
        if self.filters.contains_key(&name) {
            return Err(TemplateError::DuplicateName { kind: "filter", name });
        }
        self.filters.insert(name, filter);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Filter>> {
        self.filters.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.filters.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.filters.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

impl std::fmt::Debug for FilterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterRegistry")
            .field("filters", &self.names())
            .finish()
    }
}
