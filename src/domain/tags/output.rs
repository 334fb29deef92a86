// {% firstof %} and {% templatetag %}

use crate::domain::context::Context;
use crate::domain::template::ast::{write_value, Node};
use crate::domain::template::expression::{smart_split, FilterExpression};
use crate::domain::template::library::NodeFactory;
use crate::domain::template::parser::Parser;
use crate::error::{Result, TemplateError};

pub struct FirstOfNodeFactory;

impl NodeFactory for FirstOfNodeFactory {
    fn get_node(&self, args: &str, parser: &mut Parser<'_>) -> Result<Box<dyn Node>> {
        let bits = smart_split(args);
        if bits.is_empty() {
            return Err(TemplateError::tag_syntax("firstof", "requires at least one argument"));
        }
        let candidates = bits
            .iter()
            .map(|bit| parser.compile_filter(bit))
            .collect::<Result<Vec<_>>>()?;
        Ok(Box::new(FirstOfNode { candidates }))
    }
}

/// Outputs the first truthy candidate, or nothing
#[derive(Debug)]
pub struct FirstOfNode {
    candidates: Vec<FilterExpression>,
}

impl Node for FirstOfNode {
    fn kind(&self) -> &str {
        "FirstOfNode"
    }

    fn render(&self, ctx: &mut Context, out: &mut String) -> Result<()> {
        for candidate in &self.candidates {
            let value = candidate.resolve(ctx)?;
            if value.is_truthy() {
                write_value(ctx, &value, out);
                break;
            }
        }
        Ok(())
    }
}

pub struct TemplateTagNodeFactory;

impl NodeFactory for TemplateTagNodeFactory {
    fn get_node(&self, args: &str, _parser: &mut Parser<'_>) -> Result<Box<dyn Node>> {
        let text = match args.trim() {
            "openblock" => "{%",
            "closeblock" => "%}",
            "openvariable" => "{{",
            "closevariable" => "}}",
            "openbrace" => "{",
            "closebrace" => "}",
            "opencomment" => "{#",
            "closecomment" => "#}",
            other => {
                return Err(TemplateError::tag_syntax(
                    "templatetag",
                    format!("unknown argument '{}'", other),
                ))
            }
        };
        Ok(Box::new(TemplateTagNode { text }))
    }
}

/// Emits a literal template delimiter
#[derive(Debug)]
pub struct TemplateTagNode {
    text: &'static str,
}

impl Node for TemplateTagNode {
    fn kind(&self) -> &str {
        "TemplateTagNode"
    }

    fn render(&self, _ctx: &mut Context, out: &mut String) -> Result<()> {
        out.push_str(self.text);
        Ok(())
    }
}
