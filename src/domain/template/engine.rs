// Engine and the compiled Template facade

use std::sync::Arc;

use crate::config::EngineSettings;
use crate::domain::context::Context;
use crate::domain::template::ast::{Node, NodeList};
use crate::domain::template::lexer::Tokenizer;
use crate::domain::template::library::Registry;
use crate::domain::template::parser::Parser;
use crate::error::{ErrorKind, Result, TemplateError};

/// Shared registry plus settings; hands out templates.
#[derive(Debug, Clone)]
pub struct Engine {
    registry: Arc<Registry>,
    settings: EngineSettings,
}

impl Engine {
    pub fn new(registry: Registry, settings: EngineSettings) -> Self {
        Self {
            registry: Arc::new(registry),
            settings,
        }
    }

    /// Engine with the default tag and filter libraries
    pub fn with_defaults() -> Result<Self> {
        Ok(Self::new(Registry::with_defaults()?, EngineSettings::default()))
    }

    pub fn with_settings(mut self, settings: EngineSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Fresh context following the engine's escaping policy
    pub fn context(&self) -> Context {
        Context::new().with_autoescape(self.settings.autoescape)
    }

    pub fn compile(&self, source: &str) -> Result<NodeList> {
        compile(&self.registry, &self.settings, source)
    }

    /// Create a template and compile `source` into it
    pub fn template(&self, source: &str) -> Template {
        let mut template = Template::new(self);
        template.set_content(source);
        template
    }
}

fn compile(registry: &Registry, settings: &EngineSettings, source: &str) -> Result<NodeList> {
    let tokens = Tokenizer::new(source)
        .trim_blocks(settings.trim_blocks)
        .tokenize();
    Parser::new(tokens, registry)
        .with_recursion_limit(settings.recursion_limit)
        .parse()
}

/// A compiled template and the most recent error.
///
/// After a failed [`Template::set_content`] the template is not renderable:
/// `render` returns an empty string and the compile error stays available.
/// A failing render returns the text produced before the failure.
#[derive(Debug)]
pub struct Template {
    registry: Arc<Registry>,
    settings: EngineSettings,
    nodes: Option<NodeList>,
    outline: Option<Arc<str>>,
    error: Option<TemplateError>,
}

impl Template {
    pub fn new(engine: &Engine) -> Self {
        Self {
            registry: Arc::clone(&engine.registry),
            settings: engine.settings.clone(),
            nodes: Some(NodeList::new()),
            outline: None,
            error: None,
        }
    }

    /// Compile `source`, discarding any previously compiled tree
    pub fn set_content(&mut self, source: &str) {
        self.nodes = None;
        self.outline = None;
        match compile(&self.registry, &self.settings, source) {
            Ok(nodes) => {
                tracing::debug!(nodes = nodes.len(), "compiled template");
                self.set_node_list(nodes);
            }
            Err(err) => {
                tracing::debug!(error = %err, "template failed to compile");
                self.error = Some(err);
            }
        }
    }

    /// Install an already built tree
    pub fn set_node_list(&mut self, nodes: NodeList) {
        self.outline = Some(Arc::from(nodes.outline()));
        self.nodes = Some(nodes);
        self.error = None;
    }

    pub fn render(&mut self, ctx: &mut Context) -> String {
        let Some(nodes) = &self.nodes else {
            return String::new();
        };

        let mut out = String::new();
        let previous_outline = ctx.outline().map(Arc::<str>::from);
        ctx.set_outline(self.outline.clone());
        let result = nodes.render(ctx, &mut out);
        ctx.set_outline(previous_outline);

        match result {
            Ok(()) => self.error = None,
            Err(err) => {
                tracing::warn!(error = %err, "render aborted");
                self.error = Some(err);
            }
        }
        out
    }

    pub fn error(&self) -> Option<ErrorKind> {
        self.error.as_ref().map(TemplateError::kind)
    }

    /// Message of the most recent error, empty when there is none
    pub fn error_string(&self) -> String {
        self.error
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default()
    }

    pub fn last_error(&self) -> Option<&TemplateError> {
        self.error.as_ref()
    }

    pub fn node_list(&self) -> Option<&NodeList> {
        self.nodes.as_ref()
    }

    pub fn nodes_by_kind(&self, kind: &str) -> Vec<&dyn Node> {
        self.nodes
            .as_ref()
            .map(|nodes| nodes.nodes_by_kind(kind))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> Engine {
        Engine::with_defaults().unwrap()
    }

    #[test]
    fn test_empty_template_renders_nothing() {
        let engine = engine();
        let mut template = Template::new(&engine);
        assert_eq!(template.render(&mut Context::new()), "");
        assert!(template.error().is_none());
    }

    #[test]
    fn test_compile_failure_is_sticky() {
        let engine = engine();
        let mut template = engine.template("{% if x %}hello");
        assert_eq!(template.error(), Some(ErrorKind::UnclosedTag));
        assert!(template.node_list().is_none());

        let mut ctx = Context::new();
        ctx.insert("x", true);
        assert_eq!(template.render(&mut ctx), "");
        assert_eq!(template.error(), Some(ErrorKind::UnclosedTag));
        assert!(template.error_string().contains("'if'"));
    }

    #[test]
    fn test_recompile_replaces_tree() {
        let engine = engine();
        let mut template = engine.template("{% frobnicate %}");
        assert_eq!(template.error(), Some(ErrorKind::UnknownTag));

        template.set_content("Hi {{ name }}");
        assert!(template.error().is_none());
        let mut ctx = Context::new();
        ctx.insert("name", "Bo");
        assert_eq!(template.render(&mut ctx), "Hi Bo");
    }

    #[test]
    fn test_render_error_keeps_partial_output() {
        let engine = engine();
        let mut template = engine.template("before {{ n|truncatewords:\"x\" }} after");
        let mut ctx = Context::new();
        ctx.insert("n", "a b c");
        assert_eq!(template.render(&mut ctx), "before ");
        assert_eq!(template.error(), Some(ErrorKind::Filter));

        template.set_content("ok");
        assert_eq!(template.render(&mut ctx), "ok");
        assert!(template.error().is_none());
    }

    #[test]
    fn test_engine_context_follows_settings() {
        let settings = EngineSettings {
            autoescape: false,
            ..EngineSettings::default()
        };
        let engine = engine().with_settings(settings);
        let mut ctx = engine.context();
        ctx.insert("html", "<i>");
        assert_eq!(engine.template("{{ html }}").render(&mut ctx), "<i>");
    }
}
