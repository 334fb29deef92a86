// {% if %}, {% ifequal %} and {% ifnotequal %}

use std::cmp::Ordering;

use crate::domain::context::Context;
use crate::domain::template::ast::{Node, NodeList};
use crate::domain::template::expression::{smart_split, FilterExpression};
use crate::domain::template::library::NodeFactory;
use crate::domain::template::parser::Parser;
use crate::error::{Result, TemplateError};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Comparison {
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    In,
    NotIn,
}

impl Comparison {
    fn from_bit(bit: &str) -> Option<Self> {
        match bit {
            "==" => Some(Comparison::Eq),
            "!=" => Some(Comparison::Ne),
            "<" => Some(Comparison::Lt),
            ">" => Some(Comparison::Gt),
            "<=" => Some(Comparison::Le),
            ">=" => Some(Comparison::Ge),
            "in" => Some(Comparison::In),
            _ => None,
        }
    }
}

/// Boolean expression evaluated by `{% if %}`
#[derive(Debug)]
pub enum Condition {
    Test(FilterExpression),
    Compare(FilterExpression, Comparison, FilterExpression),
    Not(Box<Condition>),
    And(Box<Condition>, Box<Condition>),
    Or(Box<Condition>, Box<Condition>),
}

impl Condition {
    /// Parse `a and not b or c == "x"` style conditions.
    ///
    /// Precedence from loosest: `or`, `and`, `not`, comparisons.
    pub fn parse(args: &str, parser: &Parser<'_>) -> Result<Self> {
        let mut reader = ConditionReader {
            bits: smart_split(args),
            pos: 0,
            parser,
        };
        if reader.bits.is_empty() {
            return Err(TemplateError::tag_syntax("if", "requires a condition"));
        }
        let condition = reader.parse_or()?;
        if let Some(extra) = reader.peek() {
            return Err(TemplateError::tag_syntax(
                "if",
                format!("unexpected '{}' in condition", extra),
            ));
        }
        Ok(condition)
    }

    pub fn evaluate(&self, ctx: &Context) -> Result<bool> {
        Ok(match self {
            Condition::Test(expression) => expression.resolve(ctx)?.is_truthy(),
            Condition::Not(inner) => !inner.evaluate(ctx)?,
            Condition::And(left, right) => left.evaluate(ctx)? && right.evaluate(ctx)?,
            Condition::Or(left, right) => left.evaluate(ctx)? || right.evaluate(ctx)?,
            Condition::Compare(left, op, right) => {
                let left = left.resolve(ctx)?;
                let right = right.resolve(ctx)?;
                match op {
                    Comparison::Eq => left == right,
                    Comparison::Ne => left != right,
                    Comparison::Lt => left.compare(&right) == Some(Ordering::Less),
                    Comparison::Gt => left.compare(&right) == Some(Ordering::Greater),
                    Comparison::Le => matches!(
                        left.compare(&right),
                        Some(Ordering::Less | Ordering::Equal)
                    ),
                    Comparison::Ge => matches!(
                        left.compare(&right),
                        Some(Ordering::Greater | Ordering::Equal)
                    ),
                    Comparison::In => right.contains(&left),
                    Comparison::NotIn => !right.contains(&left),
                }
            }
        })
    }
}

struct ConditionReader<'a, 'r> {
    bits: Vec<String>,
    pos: usize,
    parser: &'a Parser<'r>,
}

impl ConditionReader<'_, '_> {
    fn peek(&self) -> Option<&str> {
        self.bits.get(self.pos).map(String::as_str)
    }

    fn peek_at(&self, offset: usize) -> Option<&str> {
        self.bits.get(self.pos + offset).map(String::as_str)
    }

    fn parse_or(&mut self) -> Result<Condition> {
        let mut left = self.parse_and()?;
        while self.peek() == Some("or") {
            self.pos += 1;
            let right = self.parse_and()?;
            left = Condition::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Condition> {
        let mut left = self.parse_not()?;
        while self.peek() == Some("and") {
            self.pos += 1;
            let right = self.parse_not()?;
            left = Condition::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> Result<Condition> {
        if self.peek() == Some("not") {
            self.pos += 1;
            return Ok(Condition::Not(Box::new(self.parse_not()?)));
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Condition> {
        let left = self.parse_operand()?;

        let op = match (self.peek(), self.peek_at(1)) {
            (Some("not"), Some("in")) => {
                self.pos += 2;
                Comparison::NotIn
            }
            (Some(bit), _) => match Comparison::from_bit(bit) {
                Some(op) => {
                    self.pos += 1;
                    op
                }
                None => return Ok(Condition::Test(left)),
            },
            (None, _) => return Ok(Condition::Test(left)),
        };

        let right = self.parse_operand()?;
        Ok(Condition::Compare(left, op, right))
    }

    fn parse_operand(&mut self) -> Result<FilterExpression> {
        let bit = match self.peek() {
            Some(bit) if is_keyword(bit) => {
                return Err(TemplateError::tag_syntax(
                    "if",
                    format!("expected an operand, found '{}'", bit),
                ));
            }
            None => {
                let after = self
                    .pos
                    .checked_sub(1)
                    .and_then(|index| self.bits.get(index))
                    .map_or("start", String::as_str);
                return Err(TemplateError::tag_syntax(
                    "if",
                    format!("expected an operand after '{}'", after),
                ));
            }
            Some(bit) => bit.to_string(),
        };
        self.pos += 1;
        self.parser.compile_filter(&bit)
    }
}

fn is_keyword(bit: &str) -> bool {
    matches!(bit, "and" | "or" | "not") || Comparison::from_bit(bit).is_some()
}

pub struct IfNodeFactory;

impl NodeFactory for IfNodeFactory {
    fn get_node(&self, args: &str, parser: &mut Parser<'_>) -> Result<Box<dyn Node>> {
        let condition = Condition::parse(args, parser)?;
        let (when_true, when_false) = parse_branches("if", "endif", parser)?;
        Ok(Box::new(IfNode {
            condition,
            when_true,
            when_false,
        }))
    }
}

/// Parse `body [else body] end`, allowing a single `else`
fn parse_branches(tag: &str, end: &str, parser: &mut Parser<'_>) -> Result<(NodeList, NodeList)> {
    let (when_true, closed_by) = parser.parse_until(tag, &["else", end])?;
    if closed_by.tag != "else" {
        return Ok((when_true, NodeList::new()));
    }

    let (when_false, closed_by) = parser.parse_until(tag, &["else", end])?;
    if closed_by.tag == "else" {
        return Err(TemplateError::tag_syntax(
            tag,
            format!("'else' may appear only once before '{}'", end),
        ));
    }
    Ok((when_true, when_false))
}

#[derive(Debug)]
pub struct IfNode {
    condition: Condition,
    when_true: NodeList,
    when_false: NodeList,
}

impl IfNode {
    pub fn condition(&self) -> &Condition {
        &self.condition
    }
}

impl Node for IfNode {
    fn kind(&self) -> &str {
        "IfNode"
    }

    fn render(&self, ctx: &mut Context, out: &mut String) -> Result<()> {
        if self.condition.evaluate(ctx)? {
            self.when_true.render(ctx, out)
        } else {
            self.when_false.render(ctx, out)
        }
    }

    fn children(&self) -> Vec<&NodeList> {
        vec![&self.when_true, &self.when_false]
    }
}

/// `{% ifequal a b %}` or, with `negate`, `{% ifnotequal a b %}`
pub struct IfEqualNodeFactory {
    pub negate: bool,
}

impl NodeFactory for IfEqualNodeFactory {
    fn get_node(&self, args: &str, parser: &mut Parser<'_>) -> Result<Box<dyn Node>> {
        let (tag, end) = if self.negate {
            ("ifnotequal", "endifnotequal")
        } else {
            ("ifequal", "endifequal")
        };

        let bits = smart_split(args);
        let [left, right] = bits.as_slice() else {
            return Err(TemplateError::tag_syntax(tag, "takes exactly two arguments"));
        };
        let left = parser.compile_filter(left)?;
        let right = parser.compile_filter(right)?;
        let (when_true, when_false) = parse_branches(tag, end, parser)?;

        Ok(Box::new(IfEqualNode {
            left,
            right,
            negate: self.negate,
            when_true,
            when_false,
        }))
    }
}

#[derive(Debug)]
pub struct IfEqualNode {
    left: FilterExpression,
    right: FilterExpression,
    negate: bool,
    when_true: NodeList,
    when_false: NodeList,
}

impl Node for IfEqualNode {
    fn kind(&self) -> &str {
        "IfEqualNode"
    }

    fn render(&self, ctx: &mut Context, out: &mut String) -> Result<()> {
        let equal = self.left.resolve(ctx)? == self.right.resolve(ctx)?;
        if equal != self.negate {
            self.when_true.render(ctx, out)
        } else {
            self.when_false.render(ctx, out)
        }
    }

    fn children(&self) -> Vec<&NodeList> {
        vec![&self.when_true, &self.when_false]
    }

    fn describe(&self) -> String {
        let tag = if self.negate { "ifnotequal" } else { "ifequal" };
        format!("IfEqualNode({} {} {})", tag, self.left.source(), self.right.source())
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::context::Context;
    use crate::domain::tags::testing::{compile, render};
    use crate::domain::value::Value;
    use crate::error::ErrorKind;

    fn ctx() -> Context {
        let mut ctx = Context::new();
        ctx.insert("yes", true);
        ctx.insert("no", false);
        ctx.insert("count", 3);
        ctx.insert("name", "ann");
        ctx.insert("names", vec!["ann", "bo"]);
        ctx
    }

    fn check(condition: &str) -> String {
        let source = format!("{{% if {} %}}T{{% else %}}F{{% endif %}}", condition);
        render(&source, &mut ctx()).unwrap()
    }

    #[test]
    fn test_truthiness_and_else() {
        assert_eq!(check("yes"), "T");
        assert_eq!(check("no"), "F");
        assert_eq!(check("missing"), "F");
        assert_eq!(render("{% if no %}hidden{% endif %}", &mut ctx()).unwrap(), "");
    }

    #[test]
    fn test_boolean_operators() {
        assert_eq!(check("yes and no"), "F");
        assert_eq!(check("yes or no"), "T");
        assert_eq!(check("not no"), "T");
        assert_eq!(check("no or yes and not no"), "T");
        assert_eq!(check("not yes or no"), "F");
    }

    #[test]
    fn test_comparisons() {
        assert_eq!(check("count == 3"), "T");
        assert_eq!(check("count != 3"), "F");
        assert_eq!(check("count > 2"), "T");
        assert_eq!(check("count <= 2"), "F");
        assert_eq!(check("count >= 3"), "T");
        assert_eq!(check("name == \"ann\""), "T");
        assert_eq!(check("name in names"), "T");
        assert_eq!(check("\"cy\" not in names"), "T");
        assert_eq!(check("name|upper == \"ANN\""), "T");
        assert_eq!(check("name < count"), "F");
    }

    #[test]
    fn test_condition_syntax_errors() {
        for source in [
            "{% if %}x{% endif %}",
            "{% if yes and %}x{% endif %}",
            "{% if yes no %}x{% endif %}",
            "{% if == 3 %}x{% endif %}",
        ] {
            let err = compile(source).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::TagSyntax, "{}", source);
        }
    }

    #[test]
    fn test_else_only_once() {
        let err = compile("{% if yes %}a{% else %}b{% else %}c{% endif %}").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TagSyntax);
        assert!(err.to_string().contains("only once"));
    }

    #[test]
    fn test_unclosed_if() {
        let err = compile("{% if x %}hello").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnclosedTag);
        assert!(err.to_string().contains("'if'"));
    }

    #[test]
    fn test_nested_if_children_are_queryable() {
        let nodes =
            compile("{% if a %}{% if b %}{{ x }}{% else %}{{ y }}{% endif %}{% endif %}").unwrap();
        assert_eq!(nodes.nodes_by_kind("IfNode").len(), 2);
        assert_eq!(nodes.nodes_by_kind("VariableNode").len(), 2);
    }

    #[test]
    fn test_ifequal() {
        let mut ctx = ctx();
        ctx.insert("other", Value::from("ann"));
        assert_eq!(
            render("{% ifequal name other %}same{% else %}diff{% endifequal %}", &mut ctx).unwrap(),
            "same"
        );
        assert_eq!(
            render("{% ifnotequal name \"bo\" %}not bo{% endifnotequal %}", &mut ctx).unwrap(),
            "not bo"
        );
        assert_eq!(
            render("{% ifequal count 3 %}three{% endifequal %}", &mut ctx).unwrap(),
            "three"
        );
        let err = compile("{% ifequal a %}x{% endifequal %}").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TagSyntax);
    }
}
