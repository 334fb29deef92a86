// Value type flowing through lookups, filters and nodes

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Opaque handle into host data.
///
/// Lookups fall back to this when a value is neither a map nor a list.
/// Members that are themselves callable handles are invoked with zero
/// arguments during resolution.
pub trait ObjectHandle: fmt::Debug + Send + Sync {
    fn type_name(&self) -> &str;

    fn member(&self, _name: &str) -> Option<Value> {
        None
    }

    fn element(&self, _index: usize) -> Option<Value> {
        None
    }

    fn is_callable(&self) -> bool {
        false
    }

    fn call(&self) -> Option<Value> {
        None
    }

    fn render(&self) -> String {
        format!("<{}>", self.type_name())
    }
}

#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    None,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    /// A string that must not be escaped on output
    SafeString(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
    Object(Arc<dyn ObjectHandle>),
}

impl Value {
    pub fn object(handle: impl ObjectHandle + 'static) -> Self {
        Value::Object(Arc::new(handle))
    }

    pub fn safe(text: impl Into<String>) -> Self {
        Value::SafeString(text.into())
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    pub fn is_safe(&self) -> bool {
        matches!(self, Value::SafeString(_))
    }

    pub fn type_name(&self) -> &str {
        match self {
            Value::None => "none",
            Value::Bool(_) => "bool",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) | Value::SafeString(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Object(handle) => handle.type_name(),
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::None => false,
            Value::Bool(b) => *b,
            Value::Integer(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::String(s) | Value::SafeString(s) => !s.is_empty(),
            Value::List(items) => !items.is_empty(),
            Value::Map(map) => !map.is_empty(),
            Value::Object(_) => true,
        }
    }

    /// Borrow the text of a string value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) | Value::SafeString(s) => Some(s),
            _ => None,
        }
    }

    /// Integer view of the value, parsing strings when needed
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            Value::Bool(b) => Some(i64::from(*b)),
            Value::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            Value::String(s) | Value::SafeString(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    fn as_float(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Text produced when the value is written into template output.
    pub fn to_output(&self) -> String {
        match self {
            Value::None => String::new(),
            Value::String(s) | Value::SafeString(s) => s.clone(),
            other => other.repr(),
        }
    }

    /// Debug-oriented representation; strings are quoted.
    pub fn repr(&self) -> String {
        match self {
            Value::None => "None".to_string(),
            Value::Bool(true) => "true".to_string(),
            Value::Bool(false) => "false".to_string(),
            Value::Integer(i) => i.to_string(),
            Value::Float(f) if f.is_finite() && f.fract() == 0.0 => format!("{:.1}", f),
            Value::Float(f) => f.to_string(),
            Value::String(s) | Value::SafeString(s) => format!("'{}'", s),
            Value::List(items) => {
                let inner: Vec<String> = items.iter().map(Value::repr).collect();
                format!("[{}]", inner.join(", "))
            }
            Value::Map(map) => {
                let inner: Vec<String> = map
                    .iter()
                    .map(|(key, value)| format!("'{}': {}", key, value.repr()))
                    .collect();
                format!("{{{}}}", inner.join(", "))
            }
            Value::Object(handle) => handle.render(),
        }
    }

    /// Ordering used by comparison operators in conditions
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (a, b) if a.as_float().is_some() && b.as_float().is_some() => {
                a.as_float()?.partial_cmp(&b.as_float()?)
            }
            (a, b) => match (a.as_str(), b.as_str()) {
                (Some(a), Some(b)) => Some(a.cmp(b)),
                _ => None,
            },
        }
    }

    /// Membership test behind the `in` operator
    pub fn contains(&self, needle: &Value) -> bool {
        match self {
            Value::List(items) => items.iter().any(|item| item == needle),
            Value::Map(map) => needle.as_str().is_some_and(|key| map.contains_key(key)),
            Value::String(s) | Value::SafeString(s) => {
                needle.as_str().is_some_and(|part| s.contains(part))
            }
            _ => false,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::None, Value::None) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            (a, b) => match (a.as_str(), b.as_str()) {
                (Some(a), Some(b)) => a == b,
                (None, None) => matches!(a.compare(b), Some(Ordering::Equal)),
                _ => false,
            },
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_output())
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(i64::from(value))
    }
}

impl From<usize> for Value {
    fn from(value: usize) -> Self {
        Value::Integer(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(values: Vec<T>) -> Self {
        Value::List(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<BTreeMap<String, T>> for Value {
    fn from(map: BTreeMap<String, T>) -> Self {
        Value::Map(map.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::None)
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::None,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Value::Map(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<serde_yaml::Value> for Value {
    fn from(value: serde_yaml::Value) -> Self {
        match value {
            serde_yaml::Value::Null => Value::None,
            serde_yaml::Value::Bool(b) => Value::Bool(b),
            serde_yaml::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_yaml::Value::String(s) => Value::String(s),
            serde_yaml::Value::Sequence(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_yaml::Value::Mapping(map) => Value::Map(
                map.into_iter()
                    .map(|(k, v)| (Value::from(k).to_output(), Value::from(v)))
                    .collect(),
            ),
            serde_yaml::Value::Tagged(tagged) => Value::from(tagged.value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Point;

    impl ObjectHandle for Point {
        fn type_name(&self) -> &str {
            "Point"
        }
    }

    #[test]
    fn test_truthiness() {
        assert!(!Value::None.is_truthy());
        assert!(!Value::from("").is_truthy());
        assert!(!Value::from(0).is_truthy());
        assert!(!Value::List(vec![]).is_truthy());
        assert!(Value::from("x").is_truthy());
        assert!(Value::from(vec![1]).is_truthy());
        assert!(Value::object(Point).is_truthy());
    }

    #[test]
    fn test_output_forms() {
        assert_eq!(Value::None.to_output(), "");
        assert_eq!(Value::from(42).to_output(), "42");
        assert_eq!(Value::from(2.0).to_output(), "2.0");
        assert_eq!(Value::from(true).to_output(), "true");
        assert_eq!(Value::from(vec!["a", "b"]).to_output(), "['a', 'b']");
        assert_eq!(Value::object(Point).to_output(), "<Point>");
    }

    #[test]
    fn test_loose_equality() {
        assert_eq!(Value::from(1), Value::from(1.0));
        assert_eq!(Value::from("a"), Value::safe("a"));
        assert_ne!(Value::from("1"), Value::from(1));
        assert_ne!(Value::None, Value::from(""));
    }

    #[test]
    fn test_compare_and_contains() {
        assert_eq!(Value::from(1).compare(&Value::from(2.5)), Some(Ordering::Less));
        assert_eq!(Value::from("b").compare(&Value::from("a")), Some(Ordering::Greater));
        assert_eq!(Value::from("b").compare(&Value::from(1)), None);
        assert!(Value::from(vec!["x", "y"]).contains(&Value::from("y")));
        assert!(Value::from("haystack").contains(&Value::from("st")));
    }

    #[test]
    fn test_from_json() {
        let json: serde_json::Value =
            serde_json::from_str(r#"{"a": [1, 2.5, null], "b": {"c": true}}"#).unwrap();
        let value = Value::from(json);
        assert_eq!(value.repr(), "{'a': [1, 2.5, None], 'b': {'c': true}}");
    }

    #[test]
    fn test_from_yaml() {
        let yaml: serde_yaml::Value = serde_yaml::from_str("name: Steve\nage: 30\n").unwrap();
        match Value::from(yaml) {
            Value::Map(map) => {
                assert_eq!(map["name"], Value::from("Steve"));
                assert_eq!(map["age"], Value::from(30));
            }
            other => panic!("Expected map, got {:?}", other),
        }
    }
}
