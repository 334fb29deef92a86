// {% debug %}

use crate::domain::context::Context;
use crate::domain::template::ast::Node;
use crate::domain::template::library::NodeFactory;
use crate::domain::template::parser::Parser;
use crate::error::{Result, TemplateError};

pub struct DebugNodeFactory;

impl NodeFactory for DebugNodeFactory {
    fn get_node(&self, args: &str, _parser: &mut Parser<'_>) -> Result<Box<dyn Node>> {
        if !args.trim().is_empty() {
            return Err(TemplateError::tag_syntax("debug", "takes no arguments"));
        }
        Ok(Box::new(DebugNode))
    }
}

/// Dumps the visible variables and the template's node tree. Output is not escaped.
#[derive(Debug)]
pub struct DebugNode;

impl Node for DebugNode {
    fn kind(&self) -> &str {
        "DebugNode"
    }

    fn render(&self, ctx: &mut Context, out: &mut String) -> Result<()> {
        out.push_str(&format!("Context ({} scopes):\n", ctx.depth()));
        for (name, value) in ctx.visible() {
            out.push_str(&format!("  {} = {}\n", name, value.repr()));
        }

        out.push_str("Nodes:\n");
        for line in ctx.outline().unwrap_or_default().lines() {
            out.push_str("  ");
            out.push_str(line);
            out.push('\n');
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::context::Context;
    use crate::domain::tags::testing::compile;
    use crate::domain::template::engine::Engine;
    use crate::error::ErrorKind;

    #[test]
    fn test_debug_lists_variables_and_nodes() {
        let engine = Engine::with_defaults().unwrap();
        let mut template = engine.template("{% with inner=1 %}{% debug %}{% endwith %}");
        let mut ctx = Context::new();
        ctx.insert("name", "<Ann>");

        let dump = template.render(&mut ctx);
        assert!(dump.starts_with("Context (2 scopes):\n"));
        assert!(dump.contains("  inner = 1\n"));
        assert!(dump.contains("  name = '<Ann>'\n"));
        assert!(dump.contains("Nodes:\n  WithNode\n    DebugNode\n"));
        assert!(ctx.outline().is_none());
    }

    #[test]
    fn test_debug_rejects_arguments() {
        assert_eq!(compile("{% debug all %}").unwrap_err().kind(), ErrorKind::TagSyntax);
    }
}
