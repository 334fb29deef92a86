// Scoped variable context used while rendering

use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::domain::value::Value;
use crate::error::{LookupError, Result, TemplateError};

pub type Scope = BTreeMap<String, Value>;

pub const DEFAULT_DEPTH_LIMIT: usize = 256;

/// A stack of variable scopes.
///
/// Lookups search from the most recently pushed scope outward; the first
/// scope holding the name wins. Tags introducing variables should use
/// [`Context::scoped`] so the stack stays balanced when rendering fails.
#[derive(Debug, Clone)]
pub struct Context {
    scopes: Vec<Scope>,
    autoescape: bool,
    depth_limit: usize,
    outline: Option<Arc<str>>,
}

impl Context {
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::new()],
            autoescape: true,
            depth_limit: DEFAULT_DEPTH_LIMIT,
            outline: None,
        }
    }

    pub fn from_scope(scope: Scope) -> Self {
        let mut context = Self::new();
        context.scopes[0] = scope;
        context
    }

    /// Build a context from any serializable host value whose top level is a map.
    pub fn from_serialize<T: Serialize>(data: &T) -> anyhow::Result<Self> {
        let json = serde_json::to_value(data)?;
        match Value::from(json) {
            Value::Map(scope) => Ok(Self::from_scope(scope)),
            other => anyhow::bail!("Context data must be a map, got {}", other.type_name()),
        }
    }

    pub fn with_autoescape(mut self, autoescape: bool) -> Self {
        self.autoescape = autoescape;
        self
    }

    pub fn with_depth_limit(mut self, limit: usize) -> Self {
        self.depth_limit = limit;
        self
    }

    pub fn autoescape(&self) -> bool {
        self.autoescape
    }

    pub fn set_autoescape(&mut self, autoescape: bool) {
        self.autoescape = autoescape;
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    pub fn push(&mut self, scope: Scope) {
        self.scopes.push(scope);
    }

    pub fn pop(&mut self) -> Option<Scope> {
        self.scopes.pop()
    }

    /// Bind a name in the innermost scope
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        if self.scopes.is_empty() {
            self.scopes.push(Scope::new());
        }
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.into(), value.into());
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    /// Run `render` inside a freshly pushed scope, popping it afterwards
    /// whether or not `render` succeeded.
    pub fn scoped<T>(
        &mut self,
        scope: Scope,
        render: impl FnOnce(&mut Context) -> Result<T>,
    ) -> Result<T> {
        if self.scopes.len() >= self.depth_limit {
            return Err(TemplateError::RecursionLimit {
                limit: self.depth_limit,
            });
        }
        let depth = self.scopes.len();
        self.scopes.push(scope);
        let result = render(self);
        self.scopes.truncate(depth);
        result
    }

    /// Resolve a dotted lookup path such as `["user", "name"]`.
    pub fn resolve(&self, path: &[String]) -> std::result::Result<Value, LookupError> {
        let (first, rest) = path.split_first().ok_or_else(|| LookupError {
            path: String::new(),
            step: String::new(),
        })?;

        let mut current = self.get(first).cloned().ok_or_else(|| LookupError {
            path: path.join("."),
            step: first.clone(),
        })?;

        for step in rest {
            current = resolve_step(&current, step).ok_or_else(|| LookupError {
                path: path.join("."),
                step: step.clone(),
            })?;
        }

        Ok(current)
    }

    /// Names visible from the innermost scope, with the value that wins
    pub fn visible(&self) -> BTreeMap<&str, &Value> {
        let mut names = BTreeMap::new();
        for scope in self.scopes.iter().rev() {
            for (name, value) in scope {
                names.entry(name.as_str()).or_insert(value);
            }
        }
        names
    }

    pub fn scopes(&self) -> &[Scope] {
        &self.scopes
    }

    pub fn outline(&self) -> Option<&str> {
        self.outline.as_deref()
    }

    pub(crate) fn set_outline(&mut self, outline: Option<Arc<str>>) {
        self.outline = outline;
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve one lookup step against a value.
///
/// Tried in order: map key, list index, object member (invoking it when it
/// is callable), object element.
pub fn resolve_step(candidate: &Value, step: &str) -> Option<Value> {
    match candidate {
        Value::Map(map) => map.get(step).cloned(),
        Value::List(items) => {
            let index: i64 = step.parse().ok()?;
            let index = usize::try_from(index).ok()?;
            items.get(index).cloned()
        }
        Value::Object(handle) => {
            if let Some(member) = handle.member(step) {
                return match member {
                    Value::Object(inner) if inner.is_callable() => inner.call(),
                    other => Some(other),
                };
            }
            let index: usize = step.parse().ok()?;
            handle.element(index)
        }
        _ => None,
    }
}
