// Filter expressions: `lookup ("|" filter (":" argument)?)*`

use std::fmt;
use std::sync::Arc;

use crate::domain::context::Context;
use crate::domain::template::pipeline::{Filter, FilterRegistry};
use crate::domain::value::Value;
use crate::error::{Result, TemplateError};

/// The value a filter expression starts from, or a filter argument
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Literal(Value),
    Variable(Vec<String>),
}

impl Operand {
    /// Resolve against the context. A failed lookup yields [`Value::None`].
    pub fn resolve(&self, ctx: &Context) -> Value {
        match self {
            Operand::Literal(value) => value.clone(),
            Operand::Variable(path) => match ctx.resolve(path) {
                Ok(value) => value,
                Err(err) => {
                    tracing::trace!(%err, "variable lookup failed");
                    Value::None
                }
            },
        }
    }
}

#[derive(Clone)]
struct FilterCall {
    name: String,
    filter: Arc<dyn Filter>,
    argument: Option<Operand>,
}

impl fmt::Debug for FilterCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterCall")
            .field("name", &self.name)
            .field("argument", &self.argument)
            .finish()
    }
}

/// A variable lookup followed by an ordered filter pipeline.
#[derive(Debug, Clone)]
pub struct FilterExpression {
    source: String,
    operand: Operand,
    filters: Vec<FilterCall>,
}

impl FilterExpression {
    pub fn parse(source: &str, registry: &FilterRegistry) -> Result<Self> {
        let mut parser = ExpressionParser {
            input: source,
            pos: 0,
        };
        parser.skip_whitespace();
        if parser.peek_char().is_none() {
            return Err(syntax_error("empty expression"));
        }

        let operand = parser.parse_operand()?;
        let mut filters = Vec::new();

        parser.skip_whitespace();
        while parser.peek_char() == Some('|') {
            parser.consume_char()?;
            parser.skip_whitespace();

            let name = parser.parse_identifier()?;
            let filter = registry
                .get(&name)
                .ok_or_else(|| TemplateError::UnknownFilter { name: name.clone() })?;

            parser.skip_whitespace();
            let argument = if parser.peek_char() == Some(':') {
                parser.consume_char()?;
                parser.skip_whitespace();
                Some(parser.parse_operand()?)
            } else {
                None
            };

            filters.push(FilterCall {
                name,
                filter,
                argument,
            });
            parser.skip_whitespace();
        }

        if let Some(ch) = parser.peek_char() {
            return Err(syntax_error(format!(
                "unexpected '{}' at position {} in '{}'",
                ch, parser.pos, source
            )));
        }

        Ok(Self {
            source: source.trim().to_string(),
            operand,
            filters,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn operand(&self) -> &Operand {
        &self.operand
    }

    pub fn filter_names(&self) -> Vec<&str> {
        self.filters.iter().map(|call| call.name.as_str()).collect()
    }

    /// Evaluate left to right; only a failing filter is an error.
    pub fn resolve(&self, ctx: &Context) -> Result<Value> {
        let mut value = self.operand.resolve(ctx);
        for call in &self.filters {
            let argument = call.argument.as_ref().map(|arg| arg.resolve(ctx));
            value = call
                .filter
                .apply(&value, argument.as_ref())
                .map_err(|err| TemplateError::Filter {
                    filter: call.name.clone(),
                    message: err.to_string(),
                })?;
        }
        Ok(value)
    }
}

fn syntax_error(message: impl Into<String>) -> TemplateError {
    TemplateError::Syntax {
        message: message.into(),
        line: 0,
    }
}

struct ExpressionParser<'s> {
    input: &'s str,
    pos: usize,
}

impl ExpressionParser<'_> {
    fn parse_operand(&mut self) -> Result<Operand> {
        match self.peek_char() {
            Some(quote @ ('"' | '\'')) => Ok(Operand::Literal(Value::String(
                self.parse_quoted(quote)?,
            ))),
            Some(ch) if ch.is_ascii_digit() => self.parse_number(),
            Some('-') if self.peek_ahead(1).is_some_and(|c| c.is_ascii_digit()) => {
                self.parse_number()
            }
            _ => {
                let path = self.parse_path()?;
                if let [single] = path.as_slice() {
                    match single.as_str() {
                        "True" => return Ok(Operand::Literal(Value::Bool(true))),
                        "False" => return Ok(Operand::Literal(Value::Bool(false))),
                        "None" => return Ok(Operand::Literal(Value::None)),
                        _ => {}
                    }
                }
                Ok(Operand::Variable(path))
            }
        }
    }

    fn parse_quoted(&mut self, quote: char) -> Result<String> {
        self.expect_char(quote)?;
        let mut text = String::new();
        loop {
            match self.peek_char() {
                Some('\\') => {
                    self.consume_char()?;
                    text.push(self.consume_char()?);
                }
                Some(ch) if ch == quote => {
                    self.consume_char()?;
                    return Ok(text);
                }
                Some(_) => text.push(self.consume_char()?),
                None => {
                    return Err(syntax_error(format!(
                        "unterminated string in '{}'",
                        self.input
                    )))
                }
            }
        }
    }

    fn parse_number(&mut self) -> Result<Operand> {
        let start = self.pos;
        if self.peek_char() == Some('-') {
            self.consume_char()?;
        }
        while let Some(ch) = self.peek_char() {
            if ch.is_ascii_digit() || ch == '.' {
                self.consume_char()?;
            } else {
                break;
            }
        }
        let text = &self.input[start..self.pos];
        if let Ok(integer) = text.parse::<i64>() {
            return Ok(Operand::Literal(Value::Integer(integer)));
        }
        text.parse::<f64>()
            .map(|float| Operand::Literal(Value::Float(float)))
            .map_err(|_| syntax_error(format!("invalid number '{}'", text)))
    }

    fn parse_path(&mut self) -> Result<Vec<String>> {
        let mut path = vec![self.parse_identifier()?];
        while self.peek_char() == Some('.') {
            self.consume_char()?;
            let mut segment = String::new();
            if self.peek_char() == Some('-') {
                segment.push(self.consume_char()?);
            }
            segment.push_str(&self.parse_identifier()?);
            path.push(segment);
        }
        Ok(path)
    }

    fn parse_identifier(&mut self) -> Result<String> {
        let mut ident = String::new();

        while let Some(ch) = self.peek_char() {
            if ch.is_alphanumeric() || ch == '_' {
                ident.push(self.consume_char()?);
            } else {
                break;
            }
        }

        if ident.is_empty() {
            return Err(syntax_error(format!(
                "expected identifier at position {} in '{}'",
                self.pos, self.input
            )));
        }

        Ok(ident)
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek_char() {
            if ch.is_whitespace() {
                self.pos += ch.len_utf8();
            } else {
                break;
            }
        }
    }

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_ahead(&self, offset: usize) -> Option<char> {
        self.input[self.pos..].chars().nth(offset)
    }

    fn consume_char(&mut self) -> Result<char> {
        let ch = self
            .peek_char()
            .ok_or_else(|| syntax_error(format!("unexpected end of '{}'", self.input)))?;
        self.pos += ch.len_utf8();
        Ok(ch)
    }

    fn expect_char(&mut self, expected: char) -> Result<()> {
        match self.peek_char() {
            Some(ch) if ch == expected => {
                self.consume_char()?;
                Ok(())
            }
            Some(ch) => Err(syntax_error(format!(
                "expected '{}' but found '{}' at position {}",
                expected, ch, self.pos
            ))),
            None => Err(syntax_error(format!(
                "expected '{}' but found end of input",
                expected
            ))),
        }
    }
}

/// Split tag arguments on whitespace, keeping quoted sections together.
pub fn smart_split(input: &str) -> Vec<String> {
    let mut bits = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut chars = input.chars();

    while let Some(ch) = chars.next() {
        match quote {
            Some(q) => {
                current.push(ch);
                if ch == '\\' {
                    if let Some(escaped) = chars.next() {
                        current.push(escaped);
                    }
                } else if ch == q {
                    quote = None;
                }
            }
            None if ch == '"' || ch == '\'' => {
                quote = Some(ch);
                current.push(ch);
            }
            None if ch.is_whitespace() => {
                if !current.is_empty() {
                    bits.push(std::mem::take(&mut current));
                }
            }
            None => current.push(ch),
        }
    }

    if !current.is_empty() {
        bits.push(current);
    }
    bits
}

/// Strip matching surrounding quotes from a literal argument
pub fn unquote(bit: &str) -> Option<&str> {
    let first = bit.chars().next()?;
    if (first == '"' || first == '\'') && bit.len() >= 2 && bit.ends_with(first) {
        Some(&bit[1..bit.len() - 1])
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, FilterError};

    fn upper(input: &Value, _: Option<&Value>) -> std::result::Result<Value, FilterError> {
        Ok(Value::from(input.to_output().to_uppercase()))
    }

    fn append(input: &Value, arg: Option<&Value>) -> std::result::Result<Value, FilterError> {
        let arg = arg.ok_or_else(|| FilterError::new("append requires an argument"))?;
        Ok(Value::from(format!("{}{}", input.to_output(), arg.to_output())))
    }

    fn fail(_: &Value, _: Option<&Value>) -> std::result::Result<Value, FilterError> {
        Err(FilterError::new("always fails"))
    }

    fn registry() -> FilterRegistry {
        let mut registry = FilterRegistry::new();
        registry.register("upper", Arc::new(upper)).unwrap();
        registry.register("append", Arc::new(append)).unwrap();
        registry.register("fail", Arc::new(fail)).unwrap();
        registry
    }

    #[test]
    fn test_parse_path_and_filters() {
        let expr =
            FilterExpression::parse("user.name | upper | append:\"!\"", &registry()).unwrap();
        assert_eq!(
            expr.operand(),
            &Operand::Variable(vec!["user".to_string(), "name".to_string()])
        );
        assert_eq!(expr.filter_names(), vec!["upper", "append"]);
    }

    #[test]
    fn test_parse_literals() {
        let registry = registry();
        let expr = FilterExpression::parse("'a|b:c'", &registry).unwrap();
        assert_eq!(expr.operand(), &Operand::Literal(Value::from("a|b:c")));

        let expr = FilterExpression::parse("-12", &registry).unwrap();
        assert_eq!(expr.operand(), &Operand::Literal(Value::from(-12)));

        let expr = FilterExpression::parse("2.5", &registry).unwrap();
        assert_eq!(expr.operand(), &Operand::Literal(Value::from(2.5)));

        let expr = FilterExpression::parse("None", &registry).unwrap();
        assert_eq!(expr.operand(), &Operand::Literal(Value::None));
    }

    #[test]
    fn test_unknown_filter() {
        let err = FilterExpression::parse("name|frobnicate", &registry()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownFilter);
        assert!(err.to_string().contains("frobnicate"));
    }

    #[test]
    fn test_syntax_errors() {
        let registry = registry();
        for source in ["", "name|", "name..x", "'open", "name !"] {
            let err = FilterExpression::parse(source, &registry).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Syntax, "source: {:?}", source);
        }
    }

    #[test]
    fn test_resolve_pipeline_in_order() {
        let mut ctx = Context::new();
        ctx.insert("name", "Steve");
        ctx.insert("suffix", "?");
        let expr = FilterExpression::parse("name|append:suffix|upper", &registry()).unwrap();
        assert_eq!(expr.resolve(&ctx).unwrap(), Value::from("STEVE?"));
    }

    #[test]
    fn test_missing_variable_resolves_to_none() {
        let expr = FilterExpression::parse("missing.deep", &registry()).unwrap();
        assert_eq!(expr.resolve(&Context::new()).unwrap(), Value::None);
    }

    #[test]
    fn test_filter_failure_is_error() {
        let expr = FilterExpression::parse("name|fail", &registry()).unwrap();
        let err = expr.resolve(&Context::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Filter);
        assert_eq!(err.to_string(), "filter 'fail' failed: always fails");
    }

    #[test]
    fn test_smart_split() {
        assert_eq!(
            smart_split(r#"item in "a b" 'c d'  reversed"#),
            vec!["item", "in", "\"a b\"", "'c d'", "reversed"]
        );
        assert_eq!(unquote("\"x y\""), Some("x y"));
        assert_eq!(unquote("x"), None);
    }
}
