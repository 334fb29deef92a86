use anyhow::{bail, Context as _, Result};
use std::path::Path;

use crate::domain::context::Context;
use crate::domain::value::Value;

/// Load a context from a JSON (`.json`) or YAML file whose top level is a map.
pub fn load_context(path: &Path) -> Result<Context> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Could not read context file {}", path.display()))?;

    if text.trim().is_empty() {
        return Ok(Context::new());
    }

    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let value = if is_json {
        let json: serde_json::Value = serde_json::from_str(&text)
            .with_context(|| format!("Invalid JSON in {}", path.display()))?;
        Value::from(json)
    } else {
        let yml: serde_yaml::Value = serde_yaml::from_str(&text)
            .with_context(|| format!("Invalid YAML in {}", path.display()))?;
        Value::from(yml)
    };

    match value {
        Value::Map(scope) => Ok(Context::from_scope(scope)),
        Value::None => Ok(Context::new()),
        other => bail!(
            "Context file {} must contain a map, found {}",
            path.display(),
            other.type_name()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_yaml() {
        let file = write_file(".yml", "name: Steve\nitems:\n  - 1\n  - 2\n");
        let ctx = load_context(file.path()).unwrap();
        assert_eq!(ctx.get("name"), Some(&Value::from("Steve")));
        assert_eq!(ctx.get("items"), Some(&Value::from(vec![1, 2])));
    }

    #[test]
    fn test_load_json() {
        let file = write_file(".json", r#"{"user": {"name": "Ada"}}"#);
        let ctx = load_context(file.path()).unwrap();
        let path = vec!["user".to_string(), "name".to_string()];
        assert_eq!(ctx.resolve(&path).unwrap(), Value::from("Ada"));
    }

    #[test]
    fn test_empty_file_is_empty_context() {
        let file = write_file(".yaml", "");
        assert!(load_context(file.path()).unwrap().visible().is_empty());
    }

    #[test]
    fn test_rejects_non_map() {
        let file = write_file(".json", "[1, 2]");
        let err = load_context(file.path()).unwrap_err();
        assert!(err.to_string().contains("must contain a map"));
    }

    #[test]
    fn test_missing_file() {
        let err = load_context(Path::new("/nonexistent/context.yml")).unwrap_err();
        assert!(err.to_string().contains("Could not read context file"));
    }
}
