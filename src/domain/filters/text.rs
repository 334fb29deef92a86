// String filters

use regex::Regex;

use crate::domain::template::ast::escape_html;
use crate::domain::template::pipeline::Filter;
use crate::domain::value::Value;
use crate::error::FilterError;

type FilterResult = Result<Value, FilterError>;

/// Keep the safe mark of `input` on transformed text
fn same_safety(input: &Value, text: String) -> Value {
    if input.is_safe() {
        Value::SafeString(text)
    } else {
        Value::String(text)
    }
}

pub struct UpperFilter;

impl Filter for UpperFilter {
    fn apply(&self, input: &Value, _arg: Option<&Value>) -> FilterResult {
        Ok(Value::String(input.to_output().to_uppercase()))
    }
}

pub struct LowerFilter;

impl Filter for LowerFilter {
    fn apply(&self, input: &Value, _arg: Option<&Value>) -> FilterResult {
        Ok(Value::String(input.to_output().to_lowercase()))
    }
}

pub struct CapFirstFilter;

impl Filter for CapFirstFilter {
    fn apply(&self, input: &Value, _arg: Option<&Value>) -> FilterResult {
        let text = input.to_output();
        let mut chars = text.chars();
        let capitalized = match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        };
        Ok(same_safety(input, capitalized))
    }
}

/// Remove every occurrence of the argument
pub struct CutFilter;

impl Filter for CutFilter {
    fn apply(&self, input: &Value, arg: Option<&Value>) -> FilterResult {
        let arg = arg.ok_or_else(|| FilterError::new("cut requires an argument"))?;
        let needle = arg.to_output();
        if needle.is_empty() {
            return Ok(input.clone());
        }
        Ok(Value::String(input.to_output().replace(&needle, "")))
    }
}

/// Keep at most N whitespace-separated words, appending " ..." when cut
pub struct TruncateWordsFilter;

impl Filter for TruncateWordsFilter {
    fn apply(&self, input: &Value, arg: Option<&Value>) -> FilterResult {
        let limit = arg
            .and_then(Value::as_integer)
            .ok_or_else(|| FilterError::new("truncatewords requires an integer argument"))?;
        if limit <= 0 {
            return Ok(Value::String(String::new()));
        }

        let text = input.to_output();
        let words: Vec<&str> = text.split_whitespace().collect();
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        if words.len() > limit {
            Ok(Value::String(format!("{} ...", words[..limit].join(" "))))
        } else {
            Ok(Value::String(words.join(" ")))
        }
    }
}

/// Strip the space-separated list of markup tags named in the argument
pub struct RemoveTagsFilter;

impl Filter for RemoveTagsFilter {
    fn apply(&self, input: &Value, arg: Option<&Value>) -> FilterResult {
        let names = arg.map(Value::to_output).unwrap_or_default();
        let tags: Vec<String> = names.split_whitespace().map(regex::escape).collect();
        if tags.is_empty() {
            return Ok(input.clone());
        }

        let alternation = tags.join("|");
        let open = Regex::new(&format!(r"<({})(/?>|(\s+[^>]*>))", alternation))
            .map_err(|err| FilterError::new(err.to_string()))?;
        let close = Regex::new(&format!(r"</({})>", alternation))
            .map_err(|err| FilterError::new(err.to_string()))?;

        let text = input.to_output();
        let text = open.replace_all(&text, "");
        let text = close.replace_all(&text, "");
        Ok(same_safety(input, text.into_owned()))
    }
}

/// Mark the value as not needing escaping
pub struct SafeFilter;

impl Filter for SafeFilter {
    fn apply(&self, input: &Value, _arg: Option<&Value>) -> FilterResult {
        Ok(match input {
            Value::None => Value::None,
            other => Value::SafeString(other.to_output()),
        })
    }
}

pub struct EscapeFilter;

impl Filter for EscapeFilter {
    fn apply(&self, input: &Value, _arg: Option<&Value>) -> FilterResult {
        if input.is_safe() {
            return Ok(input.clone());
        }
        Ok(Value::SafeString(escape_html(&input.to_output())))
    }
}

pub struct UrlEncodeFilter;

impl Filter for UrlEncodeFilter {
    fn apply(&self, input: &Value, _arg: Option<&Value>) -> FilterResult {
        Ok(Value::String(urlencoding::encode(&input.to_output()).into_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(text: &str) -> Value {
        Value::from(text)
    }

    #[test]
    fn test_case_filters() {
        assert_eq!(UpperFilter.apply(&s("Steve"), None).unwrap(), s("STEVE"));
        assert_eq!(LowerFilter.apply(&s("StEvE"), None).unwrap(), s("steve"));
        assert_eq!(UpperFilter.apply(&Value::None, None).unwrap(), s(""));
        assert_eq!(UpperFilter.apply(&Value::from(3), None).unwrap(), s("3"));
        assert_eq!(CapFirstFilter.apply(&s("élan"), None).unwrap(), s("Élan"));
    }

    #[test]
    fn test_cut() {
        assert_eq!(
            CutFilter.apply(&s("a b c"), Some(&s(" "))).unwrap(),
            s("abc")
        );
        assert!(CutFilter.apply(&s("abc"), None).is_err());
    }

    #[test]
    fn test_truncatewords() {
        let text = s("Joel is a slug");
        assert_eq!(
            TruncateWordsFilter.apply(&text, Some(&Value::from(2))).unwrap(),
            s("Joel is ...")
        );
        assert_eq!(
            TruncateWordsFilter.apply(&text, Some(&s("4"))).unwrap(),
            s("Joel is a slug")
        );
        assert_eq!(
            TruncateWordsFilter.apply(&text, Some(&Value::from(0))).unwrap(),
            s("")
        );
        assert!(TruncateWordsFilter.apply(&text, Some(&s("many"))).is_err());
        assert!(TruncateWordsFilter.apply(&text, None).is_err());
    }

    #[test]
    fn test_removetags() {
        let html = s("<b>Joel</b> <button>is</button> a <span class=\"x\">slug</span><br/>");
        assert_eq!(
            RemoveTagsFilter.apply(&html, Some(&s("b span br"))).unwrap(),
            s("Joel <button>is</button> a slug")
        );
        assert_eq!(RemoveTagsFilter.apply(&html, None).unwrap(), html);
    }

    #[test]
    fn test_safe_and_escape() {
        let marked = SafeFilter.apply(&s("<b>"), None).unwrap();
        assert!(marked.is_safe());
        assert_eq!(marked.to_output(), "<b>");
        assert!(SafeFilter.apply(&Value::None, None).unwrap().is_none());

        let escaped = EscapeFilter.apply(&s("<a href='x'>"), None).unwrap();
        assert!(escaped.is_safe());
        assert_eq!(escaped.to_output(), "&lt;a href=&#39;x&#39;&gt;");
        assert_eq!(EscapeFilter.apply(&marked, None).unwrap().to_output(), "<b>");
    }

    #[test]
    fn test_urlencode() {
        assert_eq!(
            UrlEncodeFilter.apply(&s("hello world/x"), None).unwrap(),
            s("hello%20world%2Fx")
        );
    }
}
