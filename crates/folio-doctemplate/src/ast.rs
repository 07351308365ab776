/*
 * ast.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Template AST types.
//!
//! This module defines the abstract syntax tree for parsed templates.
//! Each node records the position of its directive for error reporting.

/// A 1-indexed position in template source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Position {
    /// Line number (1-indexed)
    pub line: usize,
    /// Column number (1-indexed, in characters)
    pub column: usize,
}

impl Position {
    /// Compute the position of a byte offset in `source`.
    ///
    /// Offsets past the end of `source` are clamped to the end.
    pub fn at_offset(source: &str, offset: usize) -> Self {
        let mut line = 1;
        let mut column = 1;
        for (index, ch) in source.char_indices() {
            if index >= offset {
                break;
            }
            if ch == '\n' {
                line += 1;
                column = 1;
            } else {
                column += 1;
            }
        }
        Position { line, column }
    }
}

/// A node in the template AST.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateNode {
    /// Literal text to be output as-is.
    Literal(Literal),

    /// Variable interpolation: `$var$` or `$obj.field$`
    Variable(VariableRef),

    /// Conditional block: `$if(var)$...$else$...$endif$`
    Conditional(Conditional),

    /// For loop: `$for(var)$...$sep$...$endfor$`
    ForLoop(ForLoop),

    /// Partial (sub-template): `$partial()$` or `$var:partial()$`
    Partial(Partial),

    /// Comment (not rendered): `$-- comment`
    Comment(Comment),
}

/// Literal text node.
#[derive(Debug, Clone, PartialEq)]
pub struct Literal {
    /// The literal text content.
    pub text: String,
    /// Where the literal starts.
    pub position: Position,
}

/// Conditional block: `$if(var)$...$else$...$endif$`
#[derive(Debug, Clone, PartialEq)]
pub struct Conditional {
    /// List of (condition, body) pairs for if/elseif branches.
    pub branches: Vec<(VariableRef, Vec<TemplateNode>)>,
    /// Optional else branch.
    pub else_branch: Option<Vec<TemplateNode>>,
    /// Position of the opening `$if$`.
    pub position: Position,
}

/// For loop: `$for(var)$...$sep$...$endfor$`
#[derive(Debug, Clone, PartialEq)]
pub struct ForLoop {
    /// Variable to iterate over.
    pub var: VariableRef,
    /// Loop body.
    pub body: Vec<TemplateNode>,
    /// Optional separator between iterations (from `$sep$`).
    pub separator: Option<Vec<TemplateNode>>,
    /// Position of the opening `$for$`.
    pub position: Position,
}

/// Partial (sub-template): `$partial()$` or `$var:partial()$`
///
/// Partials are looked up by name when the template is evaluated, so a
/// template can be compiled before the templates it includes.
#[derive(Debug, Clone, PartialEq)]
pub struct Partial {
    /// Partial template name.
    pub name: String,
    /// Optional variable to apply partial to.
    pub var: Option<VariableRef>,
    /// Optional literal separator for array iteration (from `[sep]` syntax).
    pub separator: Option<String>,
    /// Position of this partial reference.
    pub position: Position,
}

/// Comment (not rendered): `$-- comment`
#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    /// The comment text.
    pub text: String,
    /// Position of the comment marker.
    pub position: Position,
}

/// A reference to a variable, possibly with a separator.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableRef {
    /// Path components (e.g., `["employee", "salary"]` for `employee.salary`).
    pub path: Vec<String>,
    /// Optional literal separator for array iteration (from `$var[, ]$` syntax).
    /// When present, the variable is iterated as an array with this separator.
    pub separator: Option<String>,
    /// Position of this variable reference.
    pub position: Position,
}

impl VariableRef {
    /// Create a new variable reference with no separator.
    pub fn new(path: Vec<String>, position: Position) -> Self {
        Self {
            path,
            separator: None,
            position,
        }
    }

    /// Create a new variable reference with separator.
    pub fn with_separator(path: Vec<String>, separator: String, position: Position) -> Self {
        Self {
            path,
            separator: Some(separator),
            position,
        }
    }

    /// The name a loop over this variable binds each item to.
    pub fn binding_name(&self) -> &str {
        self.path.last().map(String::as_str).unwrap_or("")
    }
}

/// Collect the names of all partials referenced anywhere in `nodes`.
///
/// Names are returned in order of first appearance, without duplicates.
pub fn partial_names(nodes: &[TemplateNode]) -> Vec<&str> {
    let mut names = Vec::new();
    collect_partial_names(nodes, &mut names);
    names
}

fn collect_partial_names<'a>(nodes: &'a [TemplateNode], names: &mut Vec<&'a str>) {
    for node in nodes {
        match node {
            TemplateNode::Partial(Partial { name, .. }) => {
                if !names.contains(&name.as_str()) {
                    names.push(name);
                }
            }
            TemplateNode::Conditional(Conditional {
                branches,
                else_branch,
                ..
            }) => {
                for (_, body) in branches {
                    collect_partial_names(body, names);
                }
                if let Some(body) = else_branch {
                    collect_partial_names(body, names);
                }
            }
            TemplateNode::ForLoop(ForLoop {
                body, separator, ..
            }) => {
                collect_partial_names(body, names);
                if let Some(sep) = separator {
                    collect_partial_names(sep, names);
                }
            }
            TemplateNode::Literal(_) | TemplateNode::Variable(_) | TemplateNode::Comment(_) => {}
        }
    }
}
