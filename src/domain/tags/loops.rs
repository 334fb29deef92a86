// {% for %} ... {% empty %} ... {% endfor %}

use crate::domain::context::{resolve_step, Context, Scope};
use crate::domain::template::ast::{Node, NodeList};
use crate::domain::template::expression::{smart_split, FilterExpression};
use crate::domain::template::library::NodeFactory;
use crate::domain::template::parser::Parser;
use crate::domain::value::Value;
use crate::error::{Result, TemplateError};

pub struct ForNodeFactory;

impl NodeFactory for ForNodeFactory {
    fn get_node(&self, args: &str, parser: &mut Parser<'_>) -> Result<Box<dyn Node>> {
        let mut bits = smart_split(args);
        let reversed = bits.last().is_some_and(|bit| bit == "reversed");
        if reversed {
            bits.pop();
        }

        let in_at = bits
            .iter()
            .rposition(|bit| bit == "in")
            .filter(|&index| index > 0 && index + 2 == bits.len())
            .ok_or_else(|| {
                TemplateError::tag_syntax("for", "expected 'for x in sequence [reversed]'")
            })?;

        let targets: Vec<String> = bits[..in_at]
            .join(" ")
            .split(',')
            .map(|name| name.trim().to_string())
            .collect();
        if let Some(bad) = targets.iter().find(|name| !is_identifier(name)) {
            return Err(TemplateError::tag_syntax(
                "for",
                format!("invalid loop variable '{}'", bad),
            ));
        }

        let sequence = parser.compile_filter(&bits[in_at + 1])?;
        let (body, closed_by) = parser.parse_until("for", &["empty", "endfor"])?;
        let empty = if closed_by.tag == "empty" {
            parser.parse_until("for", &["endfor"])?.0
        } else {
            NodeList::new()
        };

        Ok(Box::new(ForNode {
            targets,
            sequence,
            reversed,
            body,
            empty,
        }))
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|first| first.is_alphabetic() || first == '_')
        && chars.all(|ch| ch.is_alphanumeric() || ch == '_')
}

#[derive(Debug)]
pub struct ForNode {
    targets: Vec<String>,
    sequence: FilterExpression,
    reversed: bool,
    body: NodeList,
    empty: NodeList,
}

impl ForNode {
    pub fn targets(&self) -> &[String] {
        &self.targets
    }

    fn bind(&self, ctx: &mut Context, item: Value) {
        if let [single] = self.targets.as_slice() {
            ctx.insert(single.clone(), item);
            return;
        }
        for (index, name) in self.targets.iter().enumerate() {
            let value = resolve_step(&item, &index.to_string()).unwrap_or_default();
            ctx.insert(name.clone(), value);
        }
    }
}

impl Node for ForNode {
    fn kind(&self) -> &str {
        "ForNode"
    }

    fn render(&self, ctx: &mut Context, out: &mut String) -> Result<()> {
        let mut items = iterate(self.sequence.resolve(ctx)?);
        if items.is_empty() {
            return self.empty.render(ctx, out);
        }
        if self.reversed {
            items.reverse();
        }

        let parentloop = ctx.get("forloop").cloned().unwrap_or_default();
        let len = items.len();
        ctx.scoped(Scope::new(), |ctx| {
            for (index, item) in items.into_iter().enumerate() {
                let mut forloop = Scope::new();
                forloop.insert("counter0".to_string(), Value::from(index));
                forloop.insert("counter".to_string(), Value::from(index + 1));
                forloop.insert("revcounter".to_string(), Value::from(len - index));
                forloop.insert("revcounter0".to_string(), Value::from(len - index - 1));
                forloop.insert("first".to_string(), Value::from(index == 0));
                forloop.insert("last".to_string(), Value::from(index + 1 == len));
                forloop.insert("parentloop".to_string(), parentloop.clone());

                ctx.insert("forloop", Value::Map(forloop));
                self.bind(ctx, item);
                self.body.render(ctx, out)?;
            }
            Ok(())
        })
    }

    fn children(&self) -> Vec<&NodeList> {
        vec![&self.body, &self.empty]
    }

    fn describe(&self) -> String {
        format!(
            "ForNode({} in {}{})",
            self.targets.join(", "),
            self.sequence.source(),
            if self.reversed { " reversed" } else { "" }
        )
    }
}

/// Items a loop walks over; values that cannot be iterated produce none
fn iterate(sequence: Value) -> Vec<Value> {
    match sequence {
        Value::List(items) => items,
        Value::Map(map) => map.into_keys().map(Value::String).collect(),
        Value::String(text) | Value::SafeString(text) => {
            text.chars().map(|ch| Value::String(ch.to_string())).collect()
        }
        Value::Object(handle) => (0..)
            .map_while(|index| handle.element(index))
            .collect(),
        Value::None => Vec::new(),
        other => {
            tracing::debug!(kind = other.type_name(), "cannot iterate value");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use crate::domain::context::Context;
    use crate::domain::tags::testing::{compile, render};
    use crate::domain::value::{ObjectHandle, Value};
    use crate::error::ErrorKind;

    #[derive(Debug)]
    struct Squares;

    impl ObjectHandle for Squares {
        fn type_name(&self) -> &str {
            "Squares"
        }

        fn element(&self, index: usize) -> Option<Value> {
            (index < 3).then(|| Value::from(index * index))
        }
    }

    #[test]
    fn test_loop_over_list() {
        let mut ctx = Context::new();
        ctx.insert("names", vec!["a", "b", "c"]);
        assert_eq!(
            render("{% for n in names %}{{ n }}{% endfor %}", &mut ctx).unwrap(),
            "abc"
        );
        assert_eq!(
            render("{% for n in names reversed %}{{ n }}{% endfor %}", &mut ctx).unwrap(),
            "cba"
        );
    }

    #[test]
    fn test_forloop_variables() {
        let mut ctx = Context::new();
        ctx.insert("names", vec!["a", "b", "c"]);
        let source = "{% for n in names %}{{ forloop.counter }}{{ forloop.counter0 }}\
                      {{ forloop.revcounter }}{{ forloop.revcounter0 }}\
                      {% if forloop.first %}F{% endif %}\
                      {% if forloop.last %}L{% endif %},{% endfor %}";
        assert_eq!(render(source, &mut ctx).unwrap(), "1032F,2121,3210L,");
    }

    #[test]
    fn test_parentloop() {
        let mut ctx = Context::new();
        ctx.insert("rows", vec![vec![1, 2], vec![3]]);
        let source = "{% for row in rows %}{% for cell in row %}\
                      {{ forloop.parentloop.counter }}:{{ cell }} {% endfor %}{% endfor %}";
        assert_eq!(render(source, &mut ctx).unwrap(), "1:1 1:2 2:3 ");
    }

    #[test]
    fn test_unpacking() {
        let mut ctx = Context::new();
        ctx.insert("pairs", vec![vec!["a", "1"], vec!["b", "2"]]);
        assert_eq!(
            render("{% for k, v in pairs %}{{ k }}={{ v }};{% endfor %}", &mut ctx).unwrap(),
            "a=1;b=2;"
        );
    }

    #[test]
    fn test_empty_branch() {
        let mut ctx = Context::new();
        ctx.insert("nothing", Value::List(vec![]));
        let source = "{% for x in nothing %}{{ x }}{% empty %}none{% endfor %}";
        assert_eq!(render(source, &mut ctx).unwrap(), "none");
        assert_eq!(
            render("{% for x in missing %}{{ x }}{% empty %}none{% endfor %}", &mut ctx).unwrap(),
            "none"
        );
    }

    #[test]
    fn test_iterates_maps_strings_and_objects() {
        let mut ctx = Context::new();
        let map: BTreeMap<String, Value> =
            BTreeMap::from([("b".to_string(), Value::from(2)), ("a".to_string(), Value::from(1))]);
        ctx.insert("map", Value::Map(map));
        ctx.insert("word", "hi");
        ctx.insert("squares", Value::object(Squares));

        assert_eq!(render("{% for k in map %}{{ k }}{% endfor %}", &mut ctx).unwrap(), "ab");
        assert_eq!(render("{% for c in word %}{{ c }}.{% endfor %}", &mut ctx).unwrap(), "h.i.");
        assert_eq!(
            render("{% for s in squares %}{{ s }} {% endfor %}", &mut ctx).unwrap(),
            "0 1 4 "
        );
    }

    #[test]
    fn test_loop_variable_does_not_leak() {
        let mut ctx = Context::new();
        ctx.insert("items", vec![1, 2]);
        ctx.insert("x", "outer");
        assert_eq!(
            render("{% for x in items %}{{ x }}{% endfor %}{{ x }}", &mut ctx).unwrap(),
            "12outer"
        );
        assert_eq!(ctx.depth(), 1);
    }

    #[test]
    fn test_scope_balanced_after_filter_error() {
        let mut ctx = Context::new();
        ctx.insert("items", vec!["a b", "c"]);
        let err = render(
            "{% for x in items %}{{ x|truncatewords:\"bad\" }}{% endfor %}",
            &mut ctx,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Filter);
        assert_eq!(ctx.depth(), 1);
        assert!(ctx.get("forloop").is_none());
    }

    #[test]
    fn test_for_syntax_errors() {
        for source in [
            "{% for %}{% endfor %}",
            "{% for x %}{% endfor %}",
            "{% for x in %}{% endfor %}",
            "{% for in items %}{% endfor %}",
            "{% for x y in items %}{% endfor %}",
            "{% for x, in items %}{% endfor %}",
        ] {
            assert_eq!(compile(source).unwrap_err().kind(), ErrorKind::TagSyntax, "{}", source);
        }
    }
}
