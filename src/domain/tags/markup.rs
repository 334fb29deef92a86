// {% spaceless %} and {% autoescape %}

use regex::Regex;

use crate::domain::context::Context;
use crate::domain::template::ast::{Node, NodeList};
use crate::domain::template::library::NodeFactory;
use crate::domain::template::parser::Parser;
use crate::error::{Result, TemplateError};

pub struct SpacelessNodeFactory;

impl NodeFactory for SpacelessNodeFactory {
    fn get_node(&self, _args: &str, parser: &mut Parser<'_>) -> Result<Box<dyn Node>> {
        let between_tags = Regex::new(r">\s+<")
            .map_err(|err| TemplateError::tag_syntax("spaceless", err.to_string()))?;
        let (body, _) = parser.parse_until("spaceless", &["endspaceless"])?;
        Ok(Box::new(SpacelessNode { body, between_tags }))
    }
}

/// Removes whitespace between markup tags in its rendered body
#[derive(Debug)]
pub struct SpacelessNode {
    body: NodeList,
    between_tags: Regex,
}

impl Node for SpacelessNode {
    fn kind(&self) -> &str {
        "SpacelessNode"
    }

    fn render(&self, ctx: &mut Context, out: &mut String) -> Result<()> {
        let mut rendered = String::new();
        if let Err(err) = self.body.render(ctx, &mut rendered) {
            out.push_str(&rendered);
            return Err(err);
        }
        out.push_str(&self.between_tags.replace_all(rendered.trim(), "><"));
        Ok(())
    }

    fn children(&self) -> Vec<&NodeList> {
        vec![&self.body]
    }
}

pub struct AutoescapeNodeFactory;

impl NodeFactory for AutoescapeNodeFactory {
    fn get_node(&self, args: &str, parser: &mut Parser<'_>) -> Result<Box<dyn Node>> {
        let enabled = match args.trim() {
            "on" => true,
            "off" => false,
            _ => {
                return Err(TemplateError::tag_syntax(
                    "autoescape",
                    "argument must be 'on' or 'off'",
                ))
            }
        };
        let (body, _) = parser.parse_until("autoescape", &["endautoescape"])?;
        Ok(Box::new(AutoescapeNode { enabled, body }))
    }
}

/// Switches output escaping for its body, restoring the previous policy afterwards
#[derive(Debug)]
pub struct AutoescapeNode {
    enabled: bool,
    body: NodeList,
}

impl Node for AutoescapeNode {
    fn kind(&self) -> &str {
        "AutoescapeNode"
    }

    fn render(&self, ctx: &mut Context, out: &mut String) -> Result<()> {
        let previous = ctx.autoescape();
        ctx.set_autoescape(self.enabled);
        let result = self.body.render(ctx, out);
        ctx.set_autoescape(previous);
        result
    }

    fn children(&self) -> Vec<&NodeList> {
        vec![&self.body]
    }

    fn describe(&self) -> String {
        format!("AutoescapeNode({})", if self.enabled { "on" } else { "off" })
    }
}
