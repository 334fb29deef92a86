// Compiled node tree

use std::fmt;

use crate::domain::context::Context;
use crate::domain::template::expression::FilterExpression;
use crate::domain::value::Value;
use crate::error::Result;

/// A renderable instruction in a compiled template.
///
/// `kind` is the classification used by [`NodeList::nodes_by_kind`]; block
/// nodes expose their child lists through `children` so tree queries and
/// outlines can descend into them.
pub trait Node: fmt::Debug + Send + Sync {
    fn kind(&self) -> &str;

    fn render(&self, ctx: &mut Context, out: &mut String) -> Result<()>;

    fn children(&self) -> Vec<&NodeList> {
        Vec::new()
    }

    /// One-line summary used in outlines
    fn describe(&self) -> String {
        self.kind().to_string()
    }
}

/// Ordered sequence of owned nodes
#[derive(Debug, Default)]
pub struct NodeList {
    nodes: Vec<Box<dyn Node>>,
}

impl NodeList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, node: Box<dyn Node>) {
        self.nodes.push(node);
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Node> {
        self.nodes.iter().map(|node| node.as_ref())
    }

    /// Render each node in order, appending to `out`.
    ///
    /// On error `out` keeps everything rendered before the failing node.
    pub fn render(&self, ctx: &mut Context, out: &mut String) -> Result<()> {
        for node in &self.nodes {
            node.render(ctx, out)?;
        }
        Ok(())
    }

    pub fn render_to_string(&self, ctx: &mut Context) -> Result<String> {
        let mut out = String::new();
        self.render(ctx, &mut out)?;
        Ok(out)
    }

    /// Depth-first, pre-order search for nodes of the given kind
    pub fn nodes_by_kind(&self, kind: &str) -> Vec<&dyn Node> {
        let mut found = Vec::new();
        self.collect_kind(kind, &mut found);
        found
    }

    fn collect_kind<'a>(&'a self, kind: &str, found: &mut Vec<&'a dyn Node>) {
        for node in &self.nodes {
            if node.kind() == kind {
                found.push(node.as_ref());
            }
            for child in node.children() {
                child.collect_kind(kind, found);
            }
        }
    }

    /// Indented tree of node descriptions
    pub fn outline(&self) -> String {
        let mut out = String::new();
        self.write_outline(0, &mut out);
        out
    }

    fn write_outline(&self, depth: usize, out: &mut String) {
        for node in &self.nodes {
            out.push_str(&"  ".repeat(depth));
            out.push_str(&node.describe());
            out.push('\n');
            for child in node.children() {
                child.write_outline(depth + 1, out);
            }
        }
    }
}

impl FromIterator<Box<dyn Node>> for NodeList {
    fn from_iter<I: IntoIterator<Item = Box<dyn Node>>>(iter: I) -> Self {
        Self {
            nodes: iter.into_iter().collect(),
        }
    }
}

/// Literal text copied to the output verbatim
#[derive(Debug)]
pub struct TextNode {
    text: String,
}

impl TextNode {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

impl Node for TextNode {
    fn kind(&self) -> &str {
        "TextNode"
    }

    fn render(&self, _ctx: &mut Context, out: &mut String) -> Result<()> {
        out.push_str(&self.text);
        Ok(())
    }
}

/// `{{ expression }}` output
#[derive(Debug)]
pub struct VariableNode {
    expression: FilterExpression,
}

impl VariableNode {
    pub fn new(expression: FilterExpression) -> Self {
        Self { expression }
    }

    pub fn expression(&self) -> &FilterExpression {
        &self.expression
    }
}

impl Node for VariableNode {
    fn kind(&self) -> &str {
        "VariableNode"
    }

    fn render(&self, ctx: &mut Context, out: &mut String) -> Result<()> {
        let value = self.expression.resolve(ctx)?;
        write_value(ctx, &value, out);
        Ok(())
    }

    fn describe(&self) -> String {
        format!("VariableNode({})", self.expression.source())
    }
}

/// Write a value to output, escaping it unless it is safe or autoescape is off
pub fn write_value(ctx: &Context, value: &Value, out: &mut String) {
    let text = value.to_output();
    if ctx.autoescape() && !value.is_safe() {
        out.push_str(&escape_html(&text));
    } else {
        out.push_str(&text);
    }
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}
