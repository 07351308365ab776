/*
 * parser.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Template parser.
//!
//! Parsing happens in two passes. The lexer splits the source into literal
//! text, comments and directives (handling `$$` escapes and the newline
//! chomping of keyword directives that sit alone on a line). The tree builder
//! then nests conditionals and loops into the template AST.

use std::path::Path;

use crate::ast::{
    Comment, Conditional, ForLoop, Literal, Partial, Position, TemplateNode, VariableRef,
    partial_names,
};
use crate::error::{TemplateError, TemplateResult};
use crate::escape::Escape;

/// A compiled template ready for evaluation.
#[derive(Debug, Clone)]
pub struct Template {
    /// The parsed template AST.
    pub(crate) nodes: Vec<TemplateNode>,

    /// Original source (for error reporting).
    pub(crate) source: String,

    /// Name used in error messages.
    pub(crate) name: String,

    /// Escaping applied to interpolated strings.
    pub(crate) escape: Escape,
}

impl Template {
    /// Compile a template from source text.
    ///
    /// # Arguments
    /// * `source` - The template source text
    ///
    /// # Returns
    /// A compiled template, or an error if parsing fails.
    pub fn compile(source: &str) -> TemplateResult<Self> {
        Self::compile_with_filename(source, "<template>")
    }

    /// Compile a template from source text with a filename for error reporting.
    pub fn compile_with_filename(source: &str, filename: &str) -> TemplateResult<Self> {
        let tokens = Lexer::new(source, filename).run()?;
        let nodes = TreeBuilder::new(tokens, filename).build()?;

        Ok(Template {
            nodes,
            source: source.to_string(),
            name: filename.to_string(),
            escape: Escape::None,
        })
    }

    /// Compile a template from a file.
    ///
    /// The escaping mode is chosen from the file extension
    /// (see [`Escape::for_path`]).
    pub fn compile_from_file(path: &Path) -> TemplateResult<Self> {
        let source = std::fs::read_to_string(path)?;
        let template = Self::compile_with_filename(&source, &path.display().to_string())?;
        Ok(template.with_escape(Escape::for_path(path)))
    }

    /// Set how interpolated string values are escaped.
    pub fn with_escape(mut self, escape: Escape) -> Self {
        self.escape = escape;
        self
    }

    /// The escaping mode of this template.
    pub fn escape(&self) -> Escape {
        self.escape
    }

    /// The name this template was compiled with.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The template source text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Get the parsed AST nodes.
    pub fn nodes(&self) -> &[TemplateNode] {
        &self.nodes
    }

    /// Names of the partials this template includes.
    pub fn partial_names(&self) -> Vec<&str> {
        partial_names(&self.nodes)
    }
}

/// A directive between `$...$` or `${...}` delimiters.
#[derive(Debug)]
enum Directive {
    Variable(VariableRef),
    Partial(Partial),
    If(VariableRef),
    ElseIf(VariableRef),
    Else,
    EndIf,
    For(VariableRef),
    Sep,
    EndFor,
}

impl Directive {
    /// Keyword directives structure the template and are chomped when alone on a line.
    fn is_keyword(&self) -> bool {
        !matches!(self, Directive::Variable(_) | Directive::Partial(_))
    }

    fn describe(&self) -> &'static str {
        match self {
            Directive::Variable(_) => "variable",
            Directive::Partial(_) => "partial",
            Directive::If(_) => "$if$",
            Directive::ElseIf(_) => "$elseif$",
            Directive::Else => "$else$",
            Directive::EndIf => "$endif$",
            Directive::For(_) => "$for$",
            Directive::Sep => "$sep$",
            Directive::EndFor => "$endfor$",
        }
    }
}

#[derive(Debug)]
enum Token {
    Text(Literal),
    Comment(Comment),
    Directive(Directive, Position),
}

fn parse_error(template: &str, source: &str, offset: usize, message: impl Into<String>) -> TemplateError {
    let position = Position::at_offset(source, offset);
    TemplateError::ParseError {
        template: template.to_string(),
        message: message.into(),
        line: position.line,
        column: position.column,
    }
}

struct Lexer<'a> {
    source: &'a str,
    template: &'a str,
    pos: usize,
    tokens: Vec<Token>,
    text: String,
    text_start: Option<usize>,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str, template: &'a str) -> Self {
        Self {
            source,
            template,
            pos: 0,
            tokens: Vec::new(),
            text: String::new(),
            text_start: None,
        }
    }

    fn run(mut self) -> TemplateResult<Vec<Token>> {
        while let Some(rel) = self.source[self.pos..].find('$') {
            let dollar = self.pos + rel;
            self.push_text(self.pos, dollar);
            let rest = &self.source[dollar + 1..];

            if rest.starts_with('$') {
                self.text_start.get_or_insert(dollar);
                self.text.push('$');
                self.pos = dollar + 2;
            } else if rest.starts_with("--") {
                self.lex_comment(dollar);
            } else {
                self.lex_directive(dollar)?;
            }
        }

        self.push_text(self.pos, self.source.len());
        self.flush_text();
        Ok(self.tokens)
    }

    fn lex_comment(&mut self, dollar: usize) {
        let body_start = dollar + 3;
        let line_end = self.source[body_start..].find('\n').map(|i| body_start + i);
        let text = self.source[body_start..line_end.unwrap_or(self.source.len())].to_string();

        self.flush_text();
        self.tokens.push(Token::Comment(Comment {
            text,
            position: Position::at_offset(self.source, dollar),
        }));
        // The newline ends the comment and is consumed with it.
        self.pos = line_end.map_or(self.source.len(), |end| end + 1);
    }

    fn lex_directive(&mut self, dollar: usize) -> TemplateResult<()> {
        let (content_start, closing) = if self.source[dollar + 1..].starts_with('{') {
            (dollar + 2, '}')
        } else {
            (dollar + 1, '$')
        };
        let Some(len) = self.source[content_start..].find(closing) else {
            return Err(self.error(dollar, "unterminated directive"));
        };
        let content_end = content_start + len;
        let position = Position::at_offset(self.source, dollar);

        let directive = parse_directive(&self.source[content_start..content_end], position)
            .map_err(|message| self.error(dollar, message))?;

        let mut after = content_end + 1;
        if directive.is_keyword() {
            if let Some((indent, next)) = self.standalone_line(dollar, after) {
                let keep = self.text.len().saturating_sub(indent);
                self.text.truncate(keep);
                after = next;
            }
        }

        self.flush_text();
        self.tokens.push(Token::Directive(directive, position));
        self.pos = after;
        Ok(())
    }

    /// If the directive spanning `start..end` is the only thing on its line,
    /// return the width of its indentation and the offset just past the line.
    fn standalone_line(&self, start: usize, end: usize) -> Option<(usize, usize)> {
        let is_blank = |s: &str| s.chars().all(|c| matches!(c, ' ' | '\t' | '\r'));

        let line_start = self.source[..start].rfind('\n').map_or(0, |i| i + 1);
        let indent = &self.source[line_start..start];
        if !is_blank(indent) {
            return None;
        }

        let rest = &self.source[end..];
        let line_end = rest.find('\n');
        if !is_blank(&rest[..line_end.unwrap_or(rest.len())]) {
            return None;
        }

        let next = line_end.map_or(self.source.len(), |i| end + i + 1);
        Some((indent.len(), next))
    }

    fn push_text(&mut self, start: usize, end: usize) {
        if start < end {
            self.text_start.get_or_insert(start);
            self.text.push_str(&self.source[start..end]);
        }
    }

    fn flush_text(&mut self) {
        let Some(start) = self.text_start.take() else {
            return;
        };
        if !self.text.is_empty() {
            self.tokens.push(Token::Text(Literal {
                text: std::mem::take(&mut self.text),
                position: Position::at_offset(self.source, start),
            }));
        }
    }

    fn error(&self, offset: usize, message: impl Into<String>) -> TemplateError {
        parse_error(self.template, self.source, offset, message)
    }
}

/// Parse the content between directive delimiters.
fn parse_directive(content: &str, position: Position) -> Result<Directive, String> {
    match content {
        "else" => return Ok(Directive::Else),
        "endif" => return Ok(Directive::EndIf),
        "sep" => return Ok(Directive::Sep),
        "endfor" => return Ok(Directive::EndFor),
        _ => {}
    }

    if let Some(arg) = keyword_argument(content, "if") {
        return parse_variable(arg, position).map(Directive::If);
    }
    if let Some(arg) = keyword_argument(content, "elseif") {
        return parse_variable(arg, position).map(Directive::ElseIf);
    }
    if let Some(arg) = keyword_argument(content, "for") {
        return parse_variable(arg, position).map(Directive::For);
    }

    let (head, separator) = split_separator(content);

    if let Some(call) = head.strip_suffix("()") {
        let (var, name) = match call.split_once(':') {
            Some((var, name)) => (Some(parse_variable(var, position)?), name),
            None => (None, call),
        };
        if !is_partial_name(name) {
            return Err(format!("invalid partial name `{name}`"));
        }
        return Ok(Directive::Partial(Partial {
            name: name.to_string(),
            var,
            separator,
            position,
        }));
    }

    let mut var = parse_variable(head, position)?;
    var.separator = separator;
    Ok(Directive::Variable(var))
}

/// Match `keyword(argument)` and return the argument.
fn keyword_argument<'a>(content: &'a str, keyword: &str) -> Option<&'a str> {
    content
        .strip_prefix(keyword)?
        .strip_prefix('(')?
        .strip_suffix(')')
}

/// Split a trailing literal separator: `items[, ]` becomes `("items", Some(", "))`.
fn split_separator(content: &str) -> (&str, Option<String>) {
    if content.ends_with(']') {
        if let Some(open) = content.find('[') {
            let separator = &content[open + 1..content.len() - 1];
            return (&content[..open], Some(separator.to_string()));
        }
    }
    (content, None)
}

fn parse_variable(text: &str, position: Position) -> Result<VariableRef, String> {
    let path: Vec<String> = text.split('.').map(str::to_string).collect();
    let valid = path.iter().all(|segment| {
        !segment.is_empty()
            && segment
                .chars()
                .all(|c| c.is_alphanumeric() || c == '_' || c == '-')
    });

    if valid {
        Ok(VariableRef::new(path, position))
    } else {
        Err(format!("invalid variable name `{text}`"))
    }
}

fn is_partial_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | '/'))
}

struct TreeBuilder<'a> {
    tokens: std::vec::IntoIter<Token>,
    template: &'a str,
}

impl<'a> TreeBuilder<'a> {
    fn new(tokens: Vec<Token>, template: &'a str) -> Self {
        Self {
            tokens: tokens.into_iter(),
            template,
        }
    }

    fn build(mut self) -> TemplateResult<Vec<TemplateNode>> {
        let (nodes, end) = self.parse_block()?;
        match end {
            Some((directive, position)) => Err(self.unexpected(&directive, position)),
            None => Ok(nodes),
        }
    }

    /// Parse nodes until a closing directive (returned) or the end of input.
    fn parse_block(&mut self) -> TemplateResult<(Vec<TemplateNode>, Option<(Directive, Position)>)> {
        let mut nodes = Vec::new();

        while let Some(token) = self.tokens.next() {
            match token {
                Token::Text(literal) => nodes.push(TemplateNode::Literal(literal)),
                Token::Comment(comment) => nodes.push(TemplateNode::Comment(comment)),
                Token::Directive(directive, position) => match directive {
                    Directive::Variable(var) => nodes.push(TemplateNode::Variable(var)),
                    Directive::Partial(partial) => nodes.push(TemplateNode::Partial(partial)),
                    Directive::If(condition) => {
                        nodes.push(self.parse_conditional(condition, position)?);
                    }
                    Directive::For(var) => nodes.push(self.parse_for_loop(var, position)?),
                    closing => return Ok((nodes, Some((closing, position)))),
                },
            }
        }

        Ok((nodes, None))
    }

    fn parse_conditional(
        &mut self,
        condition: VariableRef,
        position: Position,
    ) -> TemplateResult<TemplateNode> {
        let mut branches = Vec::new();
        let mut condition = condition;

        loop {
            let (body, end) = self.parse_block()?;
            branches.push((condition, body));

            match end {
                Some((Directive::ElseIf(next), _)) => condition = next,
                Some((Directive::EndIf, _)) => {
                    return Ok(TemplateNode::Conditional(Conditional {
                        branches,
                        else_branch: None,
                        position,
                    }));
                }
                Some((Directive::Else, _)) => {
                    let (else_body, end) = self.parse_block()?;
                    return match end {
                        Some((Directive::EndIf, _)) => Ok(TemplateNode::Conditional(Conditional {
                            branches,
                            else_branch: Some(else_body),
                            position,
                        })),
                        Some((other, at)) => Err(self.unexpected(&other, at)),
                        None => Err(self.unterminated("$if$", position)),
                    };
                }
                Some((other, at)) => return Err(self.unexpected(&other, at)),
                None => return Err(self.unterminated("$if$", position)),
            }
        }
    }

    fn parse_for_loop(&mut self, var: VariableRef, position: Position) -> TemplateResult<TemplateNode> {
        let (body, end) = self.parse_block()?;

        let separator = match end {
            Some((Directive::EndFor, _)) => None,
            Some((Directive::Sep, _)) => {
                let (separator, end) = self.parse_block()?;
                match end {
                    Some((Directive::EndFor, _)) => Some(separator),
                    Some((other, at)) => return Err(self.unexpected(&other, at)),
                    None => return Err(self.unterminated("$for$", position)),
                }
            }
            Some((other, at)) => return Err(self.unexpected(&other, at)),
            None => return Err(self.unterminated("$for$", position)),
        };

        Ok(TemplateNode::ForLoop(ForLoop {
            var,
            body,
            separator,
            position,
        }))
    }

    fn unexpected(&self, directive: &Directive, position: Position) -> TemplateError {
        TemplateError::ParseError {
            template: self.template.to_string(),
            message: format!("unexpected {}", directive.describe()),
            line: position.line,
            column: position.column,
        }
    }

    fn unterminated(&self, what: &str, position: Position) -> TemplateError {
        TemplateError::ParseError {
            template: self.template.to_string(),
            message: format!("{what} is never closed"),
            line: position.line,
            column: position.column,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(source: &str) -> Template {
        Template::compile(source).expect("template should parse")
    }

    fn parse_error_at(source: &str) -> (String, usize, usize) {
        match Template::compile(source) {
            Err(TemplateError::ParseError {
                message,
                line,
                column,
                ..
            }) => (message, line, column),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_literal_only() {
        let template = compile("Hello, world!");
        assert_eq!(template.nodes().len(), 1);
        assert!(matches!(&template.nodes()[0], TemplateNode::Literal(l) if l.text == "Hello, world!"));
    }

    #[test]
    fn test_variable_forms() {
        let template = compile("$a$ ${b.c} $items[, ]$");
        let vars: Vec<&VariableRef> = template
            .nodes()
            .iter()
            .filter_map(|n| match n {
                TemplateNode::Variable(v) => Some(v),
                _ => None,
            })
            .collect();

        assert_eq!(vars.len(), 3);
        assert_eq!(vars[0].path, vec!["a"]);
        assert_eq!(vars[1].path, vec!["b", "c"]);
        assert_eq!(vars[2].path, vec!["items"]);
        assert_eq!(vars[2].separator.as_deref(), Some(", "));
    }

    #[test]
    fn test_partial_forms() {
        let template = compile("$annotated-line()$$locations:entry()[; ]$");
        let partials: Vec<&Partial> = template
            .nodes()
            .iter()
            .filter_map(|n| match n {
                TemplateNode::Partial(p) => Some(p),
                _ => None,
            })
            .collect();

        assert_eq!(partials[0].name, "annotated-line");
        assert!(partials[0].var.is_none());
        assert_eq!(partials[1].name, "entry");
        assert_eq!(partials[1].var.as_ref().map(|v| v.path.clone()), Some(vec!["locations".to_string()]));
        assert_eq!(partials[1].separator.as_deref(), Some("; "));
        assert_eq!(template.partial_names(), vec!["annotated-line", "entry"]);
    }

    #[test]
    fn test_standalone_keyword_lines_are_chomped() {
        let template = compile("<ul>\n  $for(items)$\n  <li>$it$</li>\n  $endfor$\n</ul>\n");
        let TemplateNode::ForLoop(ForLoop { body, .. }) = &template.nodes()[1] else {
            panic!("expected a loop");
        };

        assert!(matches!(&template.nodes()[0], TemplateNode::Literal(l) if l.text == "<ul>\n"));
        assert!(matches!(&body[0], TemplateNode::Literal(l) if l.text == "  <li>"));
        assert!(matches!(&template.nodes()[2], TemplateNode::Literal(l) if l.text == "</ul>\n"));
    }

    #[test]
    fn test_inline_keywords_keep_surrounding_text() {
        let template = compile("a $if(x)$b$endif$ c\n");
        assert!(matches!(&template.nodes()[0], TemplateNode::Literal(l) if l.text == "a "));
        assert!(matches!(&template.nodes()[2], TemplateNode::Literal(l) if l.text == " c\n"));
    }

    #[test]
    fn test_comment_consumes_newline() {
        let template = compile("before$-- note\nafter");
        assert_eq!(template.nodes().len(), 3);
        assert!(matches!(&template.nodes()[1], TemplateNode::Comment(c) if c.text == " note"));
        assert!(matches!(&template.nodes()[2], TemplateNode::Literal(l) if l.text == "after"));
    }

    #[test]
    fn test_escaped_dollar_joins_literal() {
        let template = compile("Price: $$100");
        assert_eq!(template.nodes().len(), 1);
        assert!(matches!(&template.nodes()[0], TemplateNode::Literal(l) if l.text == "Price: $100"));
    }

    #[test]
    fn test_elseif_chain() {
        let template = compile("$if(a)$A$elseif(b)$B$else$C$endif$");
        let TemplateNode::Conditional(conditional) = &template.nodes()[0] else {
            panic!("expected a conditional");
        };
        assert_eq!(conditional.branches.len(), 2);
        assert!(conditional.else_branch.is_some());
    }

    #[test]
    fn test_unterminated_directive() {
        let (message, line, column) = parse_error_at("ok\n  $name");
        assert_eq!(message, "unterminated directive");
        assert_eq!((line, column), (2, 3));
    }

    #[test]
    fn test_unclosed_if() {
        let (message, line, column) = parse_error_at("$if(a)$yes");
        assert_eq!(message, "$if$ is never closed");
        assert_eq!((line, column), (1, 1));
    }

    #[test]
    fn test_stray_endfor() {
        let (message, _, _) = parse_error_at("text $endfor$");
        assert_eq!(message, "unexpected $endfor$");
    }

    #[test]
    fn test_sep_inside_if_is_rejected() {
        let (message, _, _) = parse_error_at("$for(x)$$if(x)$a$sep$b$endif$$endfor$");
        assert_eq!(message, "unexpected $sep$");
    }

    #[test]
    fn test_invalid_variable_name() {
        let (message, _, _) = parse_error_at("$not a var$");
        assert_eq!(message, "invalid variable name `not a var`");
    }

    #[test]
    fn test_parse_error_names_template() {
        let err = Template::compile_with_filename("$if(x)$", "page.html").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Parse error in page.html at 1:1: $if$ is never closed"
        );
    }
}
