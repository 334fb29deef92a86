// {% with %} ... {% endwith %}

use crate::domain::context::{Context, Scope};
use crate::domain::template::ast::{Node, NodeList};
use crate::domain::template::expression::{smart_split, FilterExpression};
use crate::domain::template::library::NodeFactory;
use crate::domain::template::parser::Parser;
use crate::error::{Result, TemplateError};

/// Accepts `with expr as name` or `with a=expr b=expr`
pub struct WithNodeFactory;

impl NodeFactory for WithNodeFactory {
    fn get_node(&self, args: &str, parser: &mut Parser<'_>) -> Result<Box<dyn Node>> {
        let bits = smart_split(args);
        let bindings = match bits.as_slice() {
            [] => return Err(TemplateError::tag_syntax("with", "requires at least one binding")),
            [expr, as_kw, name] if as_kw == "as" => {
                vec![(checked_name(name)?, parser.compile_filter(expr)?)]
            }
            pairs => {
                let mut bindings = Vec::with_capacity(pairs.len());
                for pair in pairs {
                    let (name, expr) = pair.split_once('=').ok_or_else(|| {
                        TemplateError::tag_syntax(
                            "with",
                            format!("expected 'name=value', found '{}'", pair),
                        )
                    })?;
                    bindings.push((checked_name(name)?, parser.compile_filter(expr)?));
                }
                bindings
            }
        };

        let (body, _) = parser.parse_until("with", &["endwith"])?;
        Ok(Box::new(WithNode { bindings, body }))
    }
}

fn checked_name(name: &str) -> Result<String> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|ch| ch.is_alphanumeric() || ch == '_')
        && !name.starts_with(|ch: char| ch.is_ascii_digit());
    if valid {
        Ok(name.to_string())
    } else {
        Err(TemplateError::tag_syntax(
            "with",
            format!("invalid variable name '{}'", name),
        ))
    }
}

#[derive(Debug)]
pub struct WithNode {
    bindings: Vec<(String, FilterExpression)>,
    body: NodeList,
}

impl Node for WithNode {
    fn kind(&self) -> &str {
        "WithNode"
    }

    fn render(&self, ctx: &mut Context, out: &mut String) -> Result<()> {
        let mut scope = Scope::new();
        for (name, expression) in &self.bindings {
            scope.insert(name.clone(), expression.resolve(ctx)?);
        }
        ctx.scoped(scope, |ctx| self.body.render(ctx, out))
    }

    fn children(&self) -> Vec<&NodeList> {
        vec![&self.body]
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use crate::domain::context::Context;
    use crate::domain::tags::testing::{compile, render};
    use crate::domain::value::Value;
    use crate::error::ErrorKind;

    #[test]
    fn test_as_form() {
        let mut ctx = Context::new();
        let user = BTreeMap::from([("name".to_string(), "Ann")]);
        ctx.insert("user", Value::from(user));
        let source = "{% with user.name|upper as shout %}{{ shout }}!{% endwith %}{{ shout }}";
        assert_eq!(render(source, &mut ctx).unwrap(), "ANN!");
    }

    #[test]
    fn test_keyword_form_shadows_and_restores() {
        let mut ctx = Context::new();
        ctx.insert("a", "outer");
        let source = "{% with a=\"inner\" b=a %}{{ a }}/{{ b }}{% endwith %} {{ a }}";
        assert_eq!(render(source, &mut ctx).unwrap(), "inner/outer outer");
        assert_eq!(ctx.depth(), 1);
    }

    #[test]
    fn test_with_syntax_errors() {
        for source in [
            "{% with %}{% endwith %}",
            "{% with x as %}{% endwith %}",
            "{% with 1x=2 %}{% endwith %}",
            "{% with x y %}{% endwith %}",
        ] {
            assert_eq!(compile(source).unwrap_err().kind(), ErrorKind::TagSyntax, "{}", source);
        }
    }
}
