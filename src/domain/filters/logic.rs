// Fallback and boolean mapping filters

use crate::domain::template::pipeline::Filter;
use crate::domain::value::Value;
use crate::error::FilterError;

type FilterResult = Result<Value, FilterError>;

/// Substitute the argument for any falsy input
pub struct DefaultFilter;

impl Filter for DefaultFilter {
    fn apply(&self, input: &Value, arg: Option<&Value>) -> FilterResult {
        if input.is_truthy() {
            Ok(input.clone())
        } else {
            Ok(arg.cloned().unwrap_or_default())
        }
    }
}

/// Substitute the argument only when the input is none
pub struct DefaultIfNoneFilter;

impl Filter for DefaultIfNoneFilter {
    fn apply(&self, input: &Value, arg: Option<&Value>) -> FilterResult {
        if input.is_none() {
            Ok(arg.cloned().unwrap_or_default())
        } else {
            Ok(input.clone())
        }
    }
}

const DEFAULT_CHOICES: &str = "yes,no,maybe";

/// Map true / false / none onto "yes,no[,maybe]"
pub struct YesNoFilter;

impl Filter for YesNoFilter {
    fn apply(&self, input: &Value, arg: Option<&Value>) -> FilterResult {
        let choices = arg
            .map(Value::to_output)
            .unwrap_or_else(|| DEFAULT_CHOICES.to_string());
        let bits: Vec<&str> = choices.split(',').collect();

        let (yes, no, maybe) = match bits.as_slice() {
            [yes, no] => (*yes, *no, *no),
            [yes, no, maybe, ..] => (*yes, *no, *maybe),
            _ => return Ok(input.clone()),
        };

        let chosen = match input {
            Value::None => maybe,
            value if value.is_truthy() => yes,
            _ => no,
        };
        Ok(Value::from(chosen))
    }
}
