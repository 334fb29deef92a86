// Tag libraries and the registry consulted while parsing

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::filters::DefaultFilters;
use crate::domain::tags::DefaultTags;
use crate::domain::template::ast::Node;
use crate::domain::template::parser::Parser;
use crate::domain::template::pipeline::{Filter, FilterRegistry};
use crate::error::{Result, TemplateError};

/// Builds one node from a tag's raw argument text.
///
/// Block tags call back into the parser to collect their children.
pub trait NodeFactory: Send + Sync {
    fn get_node(&self, args: &str, parser: &mut Parser<'_>) -> Result<Box<dyn Node>>;
}

impl<F> NodeFactory for F
where
    F: Fn(&str, &mut Parser<'_>) -> Result<Box<dyn Node>> + Send + Sync,
{
    fn get_node(&self, args: &str, parser: &mut Parser<'_>) -> Result<Box<dyn Node>> {
        self(args, parser)
    }
}

/// A bundle of tags and filters registered together
pub trait TagLibrary {
    fn node_factories(&self) -> HashMap<String, Arc<dyn NodeFactory>> {
        HashMap::new()
    }

    fn filters(&self) -> HashMap<String, Arc<dyn Filter>> {
        HashMap::new()
    }
}

/// Name -> factory and name -> filter maps.
///
/// Built once before parsing and shared read-only afterwards. Registering
/// a name twice is an error rather than an overwrite.
#[derive(Clone, Default)]
pub struct Registry {
    tags: HashMap<String, Arc<dyn NodeFactory>>,
    filters: FilterRegistry,
}

impl Registry {
    /// Registry with no tags or filters
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the default tag and filter libraries
    pub fn with_defaults() -> Result<Self> {
        let mut registry = Self::new();
        registry.add_library(&DefaultTags)?;
        registry.add_library(&DefaultFilters)?;
        Ok(registry)
    }

    /// Merge a library; nothing is registered if any of its names collide.
    pub fn add_library(&mut self, library: &dyn TagLibrary) -> Result<()> {
        let tags = library.node_factories();
        let filters = library.filters();

        if let Some(name) = tags.keys().find(|name| self.tags.contains_key(*name)) {
            return Err(TemplateError::DuplicateName {
                kind: "tag",
                name: name.clone(),
            });
        }
        if let Some(name) = filters.keys().find(|name| self.filters.contains(name)) {
            return Err(TemplateError::DuplicateName {
                kind: "filter",
                name: name.clone(),
            });
        }

        tracing::debug!(
            tags = tags.len(),
            filters = filters.len(),
            "registering tag library"
        );
        self.tags.extend(tags);
        for (name, filter) in filters {
            self.filters.register(name, filter)?;
        }
        Ok(())
    }

    pub fn register_tag(
        &mut self,
        name: impl Into<String>,
        factory: Arc<dyn NodeFactory>,
    ) -> Result<()> {
        let name = name.into();
        if self.tags.contains_key(&name) {
            return Err(TemplateError::DuplicateName { kind: "tag", name });
        }
        self.tags.insert(name, factory);
        Ok(())
    }

    pub fn register_filter(
        &mut self,
        name: impl Into<String>,
        filter: Arc<dyn Filter>,
    ) -> Result<()> {
        self.filters.register(name, filter)
    }

    pub fn tag(&self, name: &str) -> Option<&dyn NodeFactory> {
        self.tags.get(name).map(|factory| factory.as_ref())
    }

    pub fn filters(&self) -> &FilterRegistry {
        &self.filters
    }

    pub fn tag_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tags.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("tags", &self.tag_names())
            .field("filters", &self.filters)
            .finish()
    }
}
