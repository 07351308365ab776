/*
 * evaluator.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Template evaluation engine.
//!
//! This module implements the evaluation of parsed templates against a context.
//! Partials are resolved by name through a [`PartialResolver`] at evaluation
//! time and rendered with their own escaping mode.

use crate::ast::{Conditional, ForLoop, Literal, Partial, TemplateNode, VariableRef};
use crate::context::{TemplateContext, TemplateValue};
use crate::error::{TemplateError, TemplateResult};
use crate::escape::Escape;
use crate::parser::Template;
use crate::resolver::{NullResolver, PartialResolver, remove_final_newline};

/// Maximum nesting depth of partial inclusion.
pub const MAX_PARTIAL_DEPTH: usize = 32;

impl Template {
    /// Render this template with the given context.
    ///
    /// Templates rendered this way cannot include partials.
    pub fn render(&self, context: &TemplateContext) -> TemplateResult<String> {
        self.render_with_resolver(context, &NullResolver)
    }

    /// Render this template, resolving partials through `resolver`.
    ///
    /// # Arguments
    /// * `context` - The variable context for evaluation
    /// * `resolver` - Where `$name()$` partials are looked up
    ///
    /// # Returns
    /// The rendered output string, or an error if evaluation fails.
    pub fn render_with_resolver(
        &self,
        context: &TemplateContext,
        resolver: &dyn PartialResolver,
    ) -> TemplateResult<String> {
        let evaluator = Evaluator { resolver, depth: 0 };
        let mut out = String::new();
        evaluator.evaluate(&self.nodes, self.escape, context, &mut out)?;
        Ok(out)
    }
}

struct Evaluator<'r> {
    resolver: &'r dyn PartialResolver,
    depth: usize,
}

impl Evaluator<'_> {
    /// Evaluate a list of template nodes, appending to `out`.
    fn evaluate(
        &self,
        nodes: &[TemplateNode],
        escape: Escape,
        context: &TemplateContext,
        out: &mut String,
    ) -> TemplateResult<()> {
        for node in nodes {
            self.evaluate_node(node, escape, context, out)?;
        }
        Ok(())
    }

    fn evaluate_node(
        &self,
        node: &TemplateNode,
        escape: Escape,
        context: &TemplateContext,
        out: &mut String,
    ) -> TemplateResult<()> {
        match node {
            TemplateNode::Literal(Literal { text, .. }) => {
                out.push_str(text);
                Ok(())
            }

            TemplateNode::Variable(var) => {
                render_variable(var, escape, context, out);
                Ok(())
            }

            TemplateNode::Conditional(Conditional {
                branches,
                else_branch,
                ..
            }) => self.evaluate_conditional(branches, else_branch.as_deref(), escape, context, out),

            TemplateNode::ForLoop(ForLoop {
                var,
                body,
                separator,
                ..
            }) => self.evaluate_for_loop(var, body, separator.as_deref(), escape, context, out),

            TemplateNode::Partial(partial) => self.evaluate_partial(partial, context, out),

            // Comments produce no output
            TemplateNode::Comment(_) => Ok(()),
        }
    }

    /// Evaluate a conditional block.
    fn evaluate_conditional(
        &self,
        branches: &[(VariableRef, Vec<TemplateNode>)],
        else_branch: Option<&[TemplateNode]>,
        escape: Escape,
        context: &TemplateContext,
        out: &mut String,
    ) -> TemplateResult<()> {
        for (condition, body) in branches {
            if resolve_variable(condition, context).is_some_and(TemplateValue::is_truthy) {
                return self.evaluate(body, escape, context, out);
            }
        }

        match else_branch {
            Some(body) => self.evaluate(body, escape, context, out),
            None => Ok(()),
        }
    }

    /// Evaluate a for loop.
    fn evaluate_for_loop(
        &self,
        var: &VariableRef,
        body: &[TemplateNode],
        separator: Option<&[TemplateNode]>,
        escape: Escape,
        context: &TemplateContext,
        out: &mut String,
    ) -> TemplateResult<()> {
        let items = iteration_items(resolve_variable(var, context));
        let var_name = var.binding_name();

        for (index, item) in items.into_iter().enumerate() {
            if index > 0 {
                if let Some(sep) = separator {
                    self.evaluate(sep, escape, context, out)?;
                }
            }

            let mut child_ctx = context.child();
            // Bind to variable name AND "it" (Pandoc semantics)
            child_ctx.insert(var_name, item.clone());
            child_ctx.insert("it", item.clone());

            self.evaluate(body, escape, &child_ctx, out)?;
        }

        Ok(())
    }

    /// Evaluate a partial, either against the current context or once per
    /// item of the variable it is applied to.
    fn evaluate_partial(
        &self,
        partial: &Partial,
        context: &TemplateContext,
        out: &mut String,
    ) -> TemplateResult<()> {
        if self.depth >= MAX_PARTIAL_DEPTH {
            return Err(TemplateError::RecursivePartial {
                name: partial.name.clone(),
                max_depth: MAX_PARTIAL_DEPTH,
            });
        }

        let template = self.resolver.get_partial(&partial.name).ok_or_else(|| {
            TemplateError::PartialNotFound {
                name: partial.name.clone(),
            }
        })?;

        let nested = Evaluator {
            resolver: self.resolver,
            depth: self.depth + 1,
        };

        let Some(var) = &partial.var else {
            let mut buf = String::new();
            nested.evaluate(&template.nodes, template.escape, context, &mut buf)?;
            out.push_str(remove_final_newline(&buf));
            return Ok(());
        };

        let separator = partial.separator.as_deref().unwrap_or("");
        let items = iteration_items(resolve_variable(var, context));

        for (index, item) in items.into_iter().enumerate() {
            if index > 0 {
                out.push_str(separator);
            }

            let mut child_ctx = context.child();
            child_ctx.insert("it", item.clone());

            let mut buf = String::new();
            nested.evaluate(&template.nodes, template.escape, &child_ctx, &mut buf)?;
            out.push_str(remove_final_newline(&buf));
        }

        Ok(())
    }
}

/// Determine what a loop or applied partial iterates over.
fn iteration_items(value: Option<&TemplateValue>) -> Vec<&TemplateValue> {
    match value {
        Some(TemplateValue::List(items)) => items.iter().collect(),
        Some(v) if v.is_truthy() => vec![v], // Single iteration for maps and truthy scalars
        _ => Vec::new(),                     // No iterations for null/falsy
    }
}

/// Resolve a variable reference in the context.
fn resolve_variable<'a>(
    var: &VariableRef,
    context: &'a TemplateContext,
) -> Option<&'a TemplateValue> {
    let path: Vec<&str> = var.path.iter().map(String::as_str).collect();
    context.get_path(&path)
}

/// Render a variable reference.
fn render_variable(var: &VariableRef, escape: Escape, context: &TemplateContext, out: &mut String) {
    let Some(value) = resolve_variable(var, context) else {
        return;
    };

    // Handle literal separator for arrays: $var[, ]$
    if let (Some(sep), TemplateValue::List(items)) = (&var.separator, value) {
        let rendered: Vec<String> = items.iter().map(|v| v.render(escape)).collect();
        out.push_str(&rendered.join(sep));
        return;
    }

    out.push_str(&value.render(escape));
}
