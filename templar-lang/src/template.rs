//! Micro-template compiler.
//!
//! A template is literal text with embedded directives, all sharing the
//! single `data` binding:
//!
//! ```text
//! {{= expr }}                      interpolation
//! {{? expr }} … {{?? expr }} … {{??}} … {{?}}    conditional chain
//! {{~ expr :item}} … {{~}}         iteration
//! {{~ expr :item:index}} … {{~}}   iteration with index
//! ```
//!
//! Compilation is synchronous and performed fresh per call — there is no
//! cross-call cache. Syntax problems surface as [`CompileError`] at compile
//! time; expression failures surface as [`EvalError`] at render time.

use crate::error::{CompileError, EvalError};
use crate::eval::{eval, Scope};
use crate::lexer::tokenize;
use crate::parser::{Expr, Parser};
use crate::lexer::TokenKind;
use crate::value::Value;

// ---------------------------------------------------------------------------
// Compiled form
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Text(String),
    Interp(Expr),
    /// Ordered arms; a `None` guard is the final `{{??}}` else arm.
    Cond(Vec<(Option<Expr>, Vec<Node>)>),
    Each {
        list: Expr,
        item: String,
        index: Option<String>,
        body: Vec<Node>,
    },
}

/// A compiled micro-template, callable against one `data` value.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledTemplate {
    nodes: Vec<Node>,
}

impl CompiledTemplate {
    /// Render against `data`, producing the output text.
    pub fn render(&self, data: &Value) -> Result<String, EvalError> {
        let mut scope = Scope::with_bindings([("data".to_string(), data.clone())]);
        let mut out = String::new();
        render_nodes(&self.nodes, &mut scope, &mut out)?;
        Ok(out)
    }
}

/// Compile `source`, then render it against `data` in one step.
pub fn render_str(source: &str, data: &Value) -> Result<String, RenderStrError> {
    let compiled = compile(source).map_err(RenderStrError::Compile)?;
    compiled.render(data).map_err(RenderStrError::Eval)
}

/// Either phase of [`render_str`] failing.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RenderStrError {
    #[error(transparent)]
    Compile(CompileError),
    #[error(transparent)]
    Eval(EvalError),
}

// ---------------------------------------------------------------------------
// Compiler
// ---------------------------------------------------------------------------

/// Compile `source` into a [`CompiledTemplate`].
pub fn compile(source: &str) -> Result<CompiledTemplate, CompileError> {
    let mut builder = Builder::new();
    let mut rest = source;
    let mut offset = 0;

    while let Some(open) = rest.find("{{") {
        if open > 0 {
            builder.text(&rest[..open]);
        }
        let tag_offset = offset + open;
        let after_open = &rest[open + 2..];
        let close = find_tag_close(after_open)
            .ok_or(CompileError::UnclosedTag { offset: tag_offset })?;
        let content = &after_open[..close];
        builder.directive(content, tag_offset)?;

        let consumed = open + 2 + close + 2;
        rest = &rest[consumed..];
        offset += consumed;
    }
    if !rest.is_empty() {
        builder.text(rest);
    }

    builder.finish()
}

/// Locate the `}}` that closes the current tag, skipping over string
/// literals so that `{{= 'a}}b' }}` keeps its braces.
fn find_tag_close(content: &str) -> Option<usize> {
    let bytes = content.as_bytes();
    let mut quote: Option<u8> = None;
    let mut i = 0;
    while i < bytes.len() {
        match quote {
            Some(q) => {
                if bytes[i] == b'\\' {
                    i += 1;
                } else if bytes[i] == q {
                    quote = None;
                }
            }
            None => {
                if bytes[i] == b'\'' || bytes[i] == b'"' {
                    quote = Some(bytes[i]);
                } else if bytes[i] == b'}' && bytes.get(i + 1) == Some(&b'}') {
                    return Some(i);
                }
            }
        }
        i += 1;
    }
    None
}

enum Frame {
    Cond {
        arms: Vec<(Option<Expr>, Vec<Node>)>,
        guard: Option<Expr>,
        current: Vec<Node>,
        offset: usize,
    },
    Each {
        list: Expr,
        item: String,
        index: Option<String>,
        body: Vec<Node>,
        offset: usize,
    },
}

struct Builder {
    root: Vec<Node>,
    stack: Vec<Frame>,
}

impl Builder {
    fn new() -> Self {
        Self { root: Vec::new(), stack: Vec::new() }
    }

    fn sink(&mut self) -> &mut Vec<Node> {
        match self.stack.last_mut() {
            Some(Frame::Cond { current, .. }) => current,
            Some(Frame::Each { body, .. }) => body,
            None => &mut self.root,
        }
    }

    fn text(&mut self, text: &str) {
        self.sink().push(Node::Text(text.to_string()));
    }

    fn push(&mut self, node: Node) {
        self.sink().push(node);
    }

    fn directive(&mut self, content: &str, offset: usize) -> Result<(), CompileError> {
        let trimmed = content.trim_start();
        if let Some(rest) = trimmed.strip_prefix('=') {
            let expr = parse_full_expr(rest, offset)?;
            self.push(Node::Interp(expr));
            return Ok(());
        }
        if let Some(rest) = trimmed.strip_prefix('?') {
            return self.cond_directive(rest, offset);
        }
        if let Some(rest) = trimmed.strip_prefix('~') {
            return self.each_directive(rest, offset);
        }
        Err(CompileError::UnknownDirective { offset, content: content.to_string() })
    }

    fn cond_directive(&mut self, rest: &str, offset: usize) -> Result<(), CompileError> {
        if let Some(else_rest) = rest.strip_prefix('?') {
            // `{{??}}` else, or `{{?? expr }}` else-if.
            let guard = if else_rest.trim().is_empty() {
                None
            } else {
                Some(parse_full_expr(else_rest, offset)?)
            };
            match self.stack.last_mut() {
                Some(Frame::Cond { arms, guard: current_guard, current, .. }) => {
                    arms.push((current_guard.take(), std::mem::take(current)));
                    *current_guard = guard;
                    Ok(())
                }
                _ => Err(CompileError::StrayClose { offset }),
            }
        } else if rest.trim().is_empty() {
            // `{{?}}` closes the conditional.
            match self.stack.pop() {
                Some(Frame::Cond { mut arms, guard, current, .. }) => {
                    arms.push((guard, current));
                    self.push(Node::Cond(arms));
                    Ok(())
                }
                Some(other) => {
                    self.stack.push(other);
                    Err(CompileError::StrayClose { offset })
                }
                None => Err(CompileError::StrayClose { offset }),
            }
        } else {
            let guard = parse_full_expr(rest, offset)?;
            self.stack.push(Frame::Cond {
                arms: Vec::new(),
                guard: Some(guard),
                current: Vec::new(),
                offset,
            });
            Ok(())
        }
    }

    fn each_directive(&mut self, rest: &str, offset: usize) -> Result<(), CompileError> {
        if rest.trim().is_empty() {
            // `{{~}}` closes the loop.
            return match self.stack.pop() {
                Some(Frame::Each { list, item, index, body, .. }) => {
                    self.push(Node::Each { list, item, index, body });
                    Ok(())
                }
                Some(other) => {
                    self.stack.push(other);
                    Err(CompileError::StrayClose { offset })
                }
                None => Err(CompileError::StrayClose { offset }),
            };
        }

        // `expr :item` or `expr :item:index`
        let tokens = tokenize(rest).map_err(|e| shift(e, offset))?;
        let mut parser = Parser::new(tokens);
        let list = parser.parse_expr().map_err(|e| shift(e, offset))?;
        parser.expect(TokenKind::Colon).map_err(|e| shift(e, offset))?;
        let item = parser.expect_ident().map_err(|e| shift(e, offset))?;
        let index = if parser.eat(&TokenKind::Colon) {
            Some(parser.expect_ident().map_err(|e| shift(e, offset))?)
        } else {
            None
        };
        parser.expect_eof().map_err(|e| shift(e, offset))?;

        self.stack.push(Frame::Each { list, item, index, body: Vec::new(), offset });
        Ok(())
    }

    fn finish(mut self) -> Result<CompiledTemplate, CompileError> {
        if let Some(frame) = self.stack.pop() {
            let (kind, offset) = match frame {
                Frame::Cond { offset, .. } => ("conditional", offset),
                Frame::Each { offset, .. } => ("iteration", offset),
            };
            return Err(CompileError::UnclosedBlock { kind, offset });
        }
        Ok(CompiledTemplate { nodes: self.root })
    }
}

fn parse_full_expr(source: &str, offset: usize) -> Result<Expr, CompileError> {
    let tokens = tokenize(source).map_err(|e| shift(e, offset))?;
    let mut parser = Parser::new(tokens);
    let expr = parser.parse_expr().map_err(|e| shift(e, offset))?;
    parser.expect_eof().map_err(|e| shift(e, offset))?;
    Ok(expr)
}

/// Re-anchor an inner-source error offset to the enclosing template.
fn shift(err: CompileError, base: usize) -> CompileError {
    match err {
        CompileError::Syntax { offset, message } => {
            CompileError::Syntax { offset: base + offset, message }
        }
        other => other,
    }
}

// ---------------------------------------------------------------------------
// Renderer
// ---------------------------------------------------------------------------

fn render_nodes(nodes: &[Node], scope: &mut Scope, out: &mut String) -> Result<(), EvalError> {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Interp(expr) => {
                let value = eval(expr, scope)?;
                out.push_str(&value.to_output()?);
            }
            Node::Cond(arms) => {
                for (guard, body) in arms {
                    let take = match guard {
                        Some(expr) => eval(expr, scope)?.is_truthy(),
                        None => true,
                    };
                    if take {
                        render_nodes(body, scope, out)?;
                        break;
                    }
                }
            }
            Node::Each { list, item, index, body } => {
                let value = eval(list, scope)?;
                let items = match value {
                    Value::List(items) => items,
                    other => return Err(EvalError::NotIterable { kind: other.kind() }),
                };
                for (i, element) in items.into_iter().enumerate() {
                    scope.push_frame();
                    scope.define(item.clone(), element);
                    if let Some(index_name) = index {
                        scope.define(index_name.clone(), Value::Number(i as f64));
                    }
                    let result = render_nodes(body, scope, out);
                    scope.pop_frame();
                    result?;
                }
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
