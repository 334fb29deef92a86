// {% comment %} ... {% endcomment %}

use crate::domain::context::Context;
use crate::domain::template::ast::Node;
use crate::domain::template::library::NodeFactory;
use crate::domain::template::parser::Parser;
use crate::error::Result;

/// Discards every token up to `endcomment` without parsing it
pub struct CommentNodeFactory;

impl NodeFactory for CommentNodeFactory {
    fn get_node(&self, _args: &str, parser: &mut Parser<'_>) -> Result<Box<dyn Node>> {
        parser.skip_until("comment", "endcomment")?;
        Ok(Box::new(CommentNode))
    }
}

#[derive(Debug)]
pub struct CommentNode;

impl Node for CommentNode {
    fn kind(&self) -> &str {
        "CommentNode"
    }

    fn render(&self, _ctx: &mut Context, _out: &mut String) -> Result<()> {
        Ok(())
    }
}
