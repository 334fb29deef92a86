// List and slicing filters

use std::ops::Range;

use crate::domain::template::pipeline::Filter;
use crate::domain::value::Value;
use crate::error::FilterError;

type FilterResult = Result<Value, FilterError>;

/// Join list items with the argument as separator
pub struct JoinFilter;

impl Filter for JoinFilter {
    fn apply(&self, input: &Value, arg: Option<&Value>) -> FilterResult {
        let separator = arg.map(Value::to_output).unwrap_or_default();
        match input {
            Value::List(items) => {
                let parts: Vec<String> = items.iter().map(Value::to_output).collect();
                Ok(Value::String(parts.join(&separator)))
            }
            Value::String(text) | Value::SafeString(text) => {
                let parts: Vec<String> = text.chars().map(String::from).collect();
                Ok(Value::String(parts.join(&separator)))
            }
            Value::None => Ok(Value::String(String::new())),
            other => Err(FilterError::new(format!(
                "join expects a list, got {}",
                other.type_name()
            ))),
        }
    }
}

/// `start:end` slicing with open and negative bounds
pub struct SliceFilter;

impl Filter for SliceFilter {
    fn apply(&self, input: &Value, arg: Option<&Value>) -> FilterResult {
        let arg = arg.ok_or_else(|| FilterError::new("slice requires an argument"))?;
        let (start, end) = match arg {
            Value::Integer(end) => (None, Some(*end)),
            other => parse_slice(&other.to_output())?,
        };

        match input {
            Value::List(items) => {
                let range = bounds(items.len(), start, end);
                Ok(Value::List(items[range].to_vec()))
            }
            Value::String(text) | Value::SafeString(text) => {
                let chars: Vec<char> = text.chars().collect();
                let range = bounds(chars.len(), start, end);
                let sliced: String = chars[range].iter().collect();
                Ok(if input.is_safe() {
                    Value::SafeString(sliced)
                } else {
                    Value::String(sliced)
                })
            }
            Value::None => Ok(Value::None),
            other => Err(FilterError::new(format!(
                "cannot slice a value of type {}",
                other.type_name()
            ))),
        }
    }
}

fn parse_slice(range: &str) -> Result<(Option<i64>, Option<i64>), FilterError> {
    match range.split_once(':') {
        Some((start, end)) => Ok((parse_bound(start)?, parse_bound(end)?)),
        None => Ok((None, parse_bound(range)?)),
    }
}

fn parse_bound(bound: &str) -> Result<Option<i64>, FilterError> {
    let bound = bound.trim();
    if bound.is_empty() {
        return Ok(None);
    }
    bound
        .parse()
        .map(Some)
        .map_err(|_| FilterError::new(format!("invalid slice bound '{}'", bound)))
}

fn bounds(len: usize, start: Option<i64>, end: Option<i64>) -> Range<usize> {
    let len_i = i64::try_from(len).unwrap_or(i64::MAX);
    let clamp = |index: i64| -> usize {
        let index = if index < 0 { index + len_i } else { index };
        usize::try_from(index.clamp(0, len_i)).unwrap_or(len)
    };
    let start = start.map_or(0, clamp);
    let end = end.map_or(len, clamp);
    if start >= end {
        0..0
    } else {
        start..end
    }
}

pub struct LengthFilter;

impl Filter for LengthFilter {
    fn apply(&self, input: &Value, _arg: Option<&Value>) -> FilterResult {
        let len = match input {
            Value::List(items) => items.len(),
            Value::Map(map) => map.len(),
            Value::String(text) | Value::SafeString(text) => text.chars().count(),
            Value::None => 0,
            other => {
                return Err(FilterError::new(format!(
                    "{} has no length",
                    other.type_name()
                )))
            }
        };
        Ok(Value::from(len))
    }
}

pub struct FirstFilter;

impl Filter for FirstFilter {
    fn apply(&self, input: &Value, _arg: Option<&Value>) -> FilterResult {
        edge_item(input, "first", |items| items.first().cloned(), |text| text.chars().next())
    }
}

pub struct LastFilter;

impl Filter for LastFilter {
    fn apply(&self, input: &Value, _arg: Option<&Value>) -> FilterResult {
        edge_item(input, "last", |items| items.last().cloned(), |text| text.chars().last())
    }
}

fn edge_item(
    input: &Value,
    name: &str,
    from_list: impl Fn(&[Value]) -> Option<Value>,
    from_text: impl Fn(&str) -> Option<char>,
) -> FilterResult {
    match input {
        Value::List(items) => Ok(from_list(items).unwrap_or_default()),
        Value::String(text) | Value::SafeString(text) => Ok(from_text(text)
            .map(|ch| Value::String(ch.to_string()))
            .unwrap_or_default()),
        Value::None => Ok(Value::None),
        other => Err(FilterError::new(format!(
            "{} expects a list, got {}",
            name,
            other.type_name()
        ))),
    }
}
