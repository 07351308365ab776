/*
 * integration_tests.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Integration tests for folio-doctemplate using test fixtures.
 */

use folio_doctemplate::{Template, TemplateContext, TemplateRegistry, TemplateValue};
use pretty_assertions::assert_eq;
use std::path::Path;

/// Helper to get the path to test fixtures
fn fixture_path(name: &str) -> std::path::PathBuf {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    Path::new(manifest_dir).join("test-fixtures").join(name)
}

/// Helper to load a template from fixtures
fn load_template(name: &str) -> Template {
    let path = fixture_path(name);
    Template::compile_from_file(&path).unwrap_or_else(|_| panic!("Failed to load template: {}", name))
}

fn items(values: &[&str]) -> TemplateValue {
    TemplateValue::List(values.iter().map(|v| TemplateValue::from(*v)).collect())
}

#[test]
fn test_simple_interpolation() {
    let template = load_template("simple.template");

    let mut ctx = TemplateContext::new();
    ctx.insert("name", "World");

    let result = template.render(&ctx).unwrap();
    assert_eq!(result, "Hello, World!\n");
}

#[test]
fn test_conditional_true() {
    let template = load_template("conditional.template");

    let mut ctx = TemplateContext::new();
    ctx.insert("show_greeting", true);
    ctx.insert("name", "Alice");

    let result = template.render(&ctx).unwrap();
    assert_eq!(result, "Hello, Alice!\n");
}

#[test]
fn test_conditional_false() {
    let template = load_template("conditional.template");

    let mut ctx = TemplateContext::new();
    ctx.insert("show_greeting", false);
    ctx.insert("name", "Alice");

    let result = template.render(&ctx).unwrap();
    assert_eq!(result, "Goodbye.\n");
}

#[test]
fn test_forloop_with_separator() {
    let template = load_template("forloop.template");

    let mut ctx = TemplateContext::new();
    ctx.insert("items", items(&["apple", "banana", "cherry"]));

    let result = template.render(&ctx).unwrap();
    assert_eq!(result, "Items: apple, banana, cherry\n");
}

#[test]
fn test_forloop_empty() {
    let template = load_template("forloop.template");

    let mut ctx = TemplateContext::new();
    ctx.insert("items", TemplateValue::List(vec![]));

    let result = template.render(&ctx).unwrap();
    assert_eq!(result, "Items: \n");
}

#[test]
fn test_html_list_layout() {
    let template = load_template("list.html");

    let mut ctx = TemplateContext::new();
    ctx.insert("title", "Fish & Chips");
    ctx.insert("items", items(&["<cod>", "haddock"]));

    let result = template.render(&ctx).unwrap();
    assert_eq!(
        result,
        "<h1>Fish &amp; Chips</h1>\n<ul>\n  <li>&lt;cod&gt;</li>\n  <li>haddock</li>\n</ul>\n"
    );
}

#[test]
fn test_registry_from_fixture_dir() {
    let registry = TemplateRegistry::from_dir(&fixture_path("registry")).unwrap();
    assert_eq!(registry.names(), vec!["card", "document"]);

    let mut ctx = TemplateContext::new();
    ctx.insert(
        "authors",
        TemplateValue::List(vec![
            TemplateValue::map([("name", "Jane Doe".into()), ("email", "jane@example.com".into())]),
            TemplateValue::map([("name", "John Roe".into()), ("email", "john@example.com".into())]),
        ]),
    );

    let result = registry.render("document", &ctx).unwrap();
    assert_eq!(
        result,
        "<section>\n[Jane Doe] (jane@example.com)\n[John Roe] (john@example.com)\n</section>"
    );
}

#[test]
fn test_escaped_dollar() {
    let template = Template::compile("Price: $$100").unwrap();
    let result = template.render(&TemplateContext::new()).unwrap();
    assert_eq!(result, "Price: $100");
}
