// Common test utilities shared across test files

use templet::{Context, Engine, Value};

/// Engine with the default tag and filter libraries
#[allow(dead_code)]
pub fn engine() -> Engine {
    Engine::with_defaults().expect("Failed to build default engine")
}

/// Compile and render `source`, panicking if either step fails
#[allow(dead_code)]
pub fn render(source: &str, ctx: &mut Context) -> String {
    let mut template = engine().template(source);
    let output = template.render(ctx);
    assert!(
        template.error().is_none(),
        "Unexpected error rendering {:?}: {}",
        source,
        template.error_string()
    );
    output
}

/// Context holding a few values used across tests
#[allow(dead_code)]
pub fn sample_context() -> Context {
    let mut ctx = Context::new();
    ctx.insert("name", "Steve");
    ctx.insert("items", vec!["apple", "banana", "cherry"]);
    ctx.insert("count", 3);
    ctx.insert("empty", "");
    ctx.insert("nothing", Value::None);
    ctx
}
