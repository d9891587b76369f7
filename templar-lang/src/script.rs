//! Variables-script loading and execution.
//!
//! A script file (`.vars`) is a sequence of top-level `let` bindings and
//! `fn name(a, b) { … }` definitions in the restricted statement language.
//! Execution happens in an isolated environment: a function can see its
//! parameters, the script's own top-level bindings, and its sibling
//! functions — nothing else. This is an authoring convenience boundary, not
//! a security sandbox; the caller decides which capability values (such as a
//! `context.utils` object) to pass in as arguments.

use std::collections::BTreeMap;
use std::path::Path;
use std::rc::Rc;

use crate::error::{CompileError, EvalError, ScriptError, ScriptParseError};
use crate::eval::{eval, Scope};
use crate::lexer::{tokenize, TokenKind};
use crate::parser::{Expr, Parser};
use crate::value::{NativeFn, Value};

/// File extension recognized for variables scripts.
pub const SCRIPT_EXTENSION: &str = "vars";

// ---------------------------------------------------------------------------
// AST
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Stmt {
    Let { name: String, value: Expr },
    Assign { name: String, value: Expr },
    If { cond: Expr, then: Vec<Stmt>, otherwise: Vec<Stmt> },
    For { item: String, list: Expr, body: Vec<Stmt> },
    Return(Option<Expr>),
    Expr(Expr),
}

#[derive(Debug, Clone, PartialEq)]
struct FnDef {
    name: String,
    params: Vec<String>,
    body: Vec<Stmt>,
}

/// The shared, immutable environment of a loaded script.
#[derive(Debug)]
struct ScriptEnv {
    functions: BTreeMap<String, FnDef>,
    globals: BTreeMap<String, Value>,
}

// ---------------------------------------------------------------------------
// Loaded script
// ---------------------------------------------------------------------------

/// A parsed, initialized script file.
#[derive(Debug, Clone)]
pub struct Script {
    env: Rc<ScriptEnv>,
}

impl Script {
    /// Parse script source and run its top-level `let` initializers.
    pub fn parse(source: &str) -> Result<Script, ScriptParseError> {
        let (functions, top_lets) = parse_items(source).map_err(ScriptParseError::Compile)?;

        // Top-level lets run once at load time, against a bootstrap
        // environment in which the functions are already visible.
        let boot = Rc::new(ScriptEnv { functions: functions.clone(), globals: BTreeMap::new() });
        let mut globals = BTreeMap::new();
        for (name, expr) in top_lets {
            let mut scope = root_scope(&boot, &globals);
            let value = eval(&expr, &mut scope).map_err(ScriptParseError::Init)?;
            globals.insert(name, value);
        }
        Ok(Script { env: Rc::new(ScriptEnv { functions, globals }) })
    }

    /// Look up a function by name; `None` when the script defines no
    /// function of that name.
    pub fn function(&self, name: &str) -> Option<ScriptFunction> {
        self.env.functions.get(name).map(|def| ScriptFunction {
            def: def.clone(),
            env: Rc::clone(&self.env),
        })
    }

    /// Names of all functions the script defines.
    pub fn function_names(&self) -> Vec<String> {
        self.env.functions.keys().cloned().collect()
    }
}

/// A callable function extracted from a [`Script`].
#[derive(Debug, Clone)]
pub struct ScriptFunction {
    def: FnDef,
    env: Rc<ScriptEnv>,
}

impl ScriptFunction {
    pub fn name(&self) -> &str {
        &self.def.name
    }

    /// Number of declared formal parameters.
    pub fn arity(&self) -> usize {
        self.def.params.len()
    }

    /// Invoke the function. Missing arguments bind as `undefined`; extra
    /// arguments are ignored. A body that never `return`s yields `undefined`.
    pub fn call(&self, args: &[Value]) -> Result<Value, EvalError> {
        call_def(&self.env, &self.def, args)
    }
}

fn call_def(env: &Rc<ScriptEnv>, def: &FnDef, args: &[Value]) -> Result<Value, EvalError> {
    let mut scope = root_scope(env, &env.globals);
    scope.push_frame();
    for (i, param) in def.params.iter().enumerate() {
        scope.define(param.clone(), args.get(i).cloned().unwrap_or(Value::Undefined));
    }
    match exec_block(&def.body, &mut scope)? {
        Flow::Return(value) => Ok(value),
        Flow::Normal => Ok(Value::Undefined),
    }
}

/// Root scope for script execution: sibling functions and globals only.
fn root_scope(env: &Rc<ScriptEnv>, globals: &BTreeMap<String, Value>) -> Scope {
    let mut scope = Scope::new();
    for def in env.functions.values() {
        let env = Rc::clone(env);
        let def = def.clone();
        scope.define(
            def.name.clone(),
            Value::Function(NativeFn::new(def.name.clone(), move |args| {
                call_def(&env, &def, args)
            })),
        );
    }
    for (name, value) in globals {
        scope.define(name.clone(), value.clone());
    }
    scope
}

// ---------------------------------------------------------------------------
// Loader
// ---------------------------------------------------------------------------

/// Load a script file and extract the named function.
///
/// `Ok(None)` means the script itself is fine but defines no function of the
/// requested name — the caller decides how to report that. Read, parse, and
/// initialization failures are hard errors.
pub fn load_function(
    path: &Path,
    function_name: &str,
) -> Result<Option<ScriptFunction>, ScriptError> {
    let source = std::fs::read_to_string(path)
        .map_err(|source| ScriptError::Io { path: path.to_path_buf(), source })?;
    let script = Script::parse(&source).map_err(|e| match e {
        ScriptParseError::Compile(source) => {
            ScriptError::Parse { path: path.to_path_buf(), source }
        }
        ScriptParseError::Init(source) => ScriptError::Init { path: path.to_path_buf(), source },
    })?;
    Ok(script.function(function_name))
}

/// Whether `path` carries the recognized variables-script extension.
pub fn has_script_extension(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(SCRIPT_EXTENSION)
}

// ---------------------------------------------------------------------------
// Parser (statements)
// ---------------------------------------------------------------------------

type TopLevel = (BTreeMap<String, FnDef>, Vec<(String, Expr)>);

fn parse_items(source: &str) -> Result<TopLevel, CompileError> {
    let tokens = tokenize(source)?;
    let mut parser = Parser::new(tokens);
    let mut functions = BTreeMap::new();
    let mut top_lets = Vec::new();

    while !parser.at_eof() {
        match parser.peek() {
            TokenKind::Fn => {
                let def = parse_fn(&mut parser)?;
                functions.insert(def.name.clone(), def);
            }
            TokenKind::Let => {
                parser.advance();
                let name = parser.expect_ident()?;
                parser.expect(TokenKind::Assign)?;
                let value = parser.parse_expr()?;
                parser.expect(TokenKind::Semicolon)?;
                top_lets.push((name, value));
            }
            other => {
                return Err(CompileError::Syntax {
                    offset: parser.offset(),
                    message: format!(
                        "expected 'fn' or 'let' at top level, found {}",
                        other.describe()
                    ),
                })
            }
        }
    }
    Ok((functions, top_lets))
}

fn parse_fn(parser: &mut Parser) -> Result<FnDef, CompileError> {
    parser.expect(TokenKind::Fn)?;
    let name = parser.expect_ident()?;
    parser.expect(TokenKind::LParen)?;
    let mut params = Vec::new();
    if !parser.eat(&TokenKind::RParen) {
        loop {
            params.push(parser.expect_ident()?);
            if parser.eat(&TokenKind::RParen) {
                break;
            }
            parser.expect(TokenKind::Comma)?;
        }
    }
    let body = parse_block(parser)?;
    Ok(FnDef { name, params, body })
}

fn parse_block(parser: &mut Parser) -> Result<Vec<Stmt>, CompileError> {
    parser.expect(TokenKind::LBrace)?;
    let mut stmts = Vec::new();
    while !parser.eat(&TokenKind::RBrace) {
        if parser.at_eof() {
            return Err(parser.error("unexpected end of input inside block"));
        }
        stmts.push(parse_stmt(parser)?);
    }
    Ok(stmts)
}

fn parse_stmt(parser: &mut Parser) -> Result<Stmt, CompileError> {
    match parser.peek() {
        TokenKind::Let => {
            parser.advance();
            let name = parser.expect_ident()?;
            parser.expect(TokenKind::Assign)?;
            let value = parser.parse_expr()?;
            parser.expect(TokenKind::Semicolon)?;
            Ok(Stmt::Let { name, value })
        }
        TokenKind::Return => {
            parser.advance();
            if parser.eat(&TokenKind::Semicolon) {
                return Ok(Stmt::Return(None));
            }
            let value = parser.parse_expr()?;
            parser.expect(TokenKind::Semicolon)?;
            Ok(Stmt::Return(Some(value)))
        }
        TokenKind::If => {
            parser.advance();
            parser.expect(TokenKind::LParen)?;
            let cond = parser.parse_expr()?;
            parser.expect(TokenKind::RParen)?;
            let then = parse_block(parser)?;
            let otherwise = if parser.eat(&TokenKind::Else) {
                if matches!(parser.peek(), TokenKind::If) {
                    vec![parse_stmt(parser)?]
                } else {
                    parse_block(parser)?
                }
            } else {
                Vec::new()
            };
            Ok(Stmt::If { cond, then, otherwise })
        }
        TokenKind::For => {
            parser.advance();
            parser.expect(TokenKind::LParen)?;
            let item = parser.expect_ident()?;
            parser.expect(TokenKind::In)?;
            let list = parser.parse_expr()?;
            parser.expect(TokenKind::RParen)?;
            let body = parse_block(parser)?;
            Ok(Stmt::For { item, list, body })
        }
        _ => {
            let expr = parser.parse_expr()?;
            // `name = expr;` is a statement, not an expression form.
            if parser.eat(&TokenKind::Assign) {
                let name = match expr {
                    Expr::Ident(name) => name,
                    _ => return Err(parser.error("invalid assignment target")),
                };
                let value = parser.parse_expr()?;
                parser.expect(TokenKind::Semicolon)?;
                return Ok(Stmt::Assign { name, value });
            }
            parser.expect(TokenKind::Semicolon)?;
            Ok(Stmt::Expr(expr))
        }
    }
}

// ---------------------------------------------------------------------------
// Execution
// ---------------------------------------------------------------------------

enum Flow {
    Normal,
    Return(Value),
}

fn exec_block(stmts: &[Stmt], scope: &mut Scope) -> Result<Flow, EvalError> {
    for stmt in stmts {
        match stmt {
            Stmt::Let { name, value } => {
                let v = eval(value, scope)?;
                scope.define(name.clone(), v);
            }
            Stmt::Assign { name, value } => {
                let v = eval(value, scope)?;
                scope.assign(name, v)?;
            }
            Stmt::If { cond, then, otherwise } => {
                let branch = if eval(cond, scope)?.is_truthy() { then } else { otherwise };
                scope.push_frame();
                let flow = exec_block(branch, scope);
                scope.pop_frame();
                if let Flow::Return(v) = flow? {
                    return Ok(Flow::Return(v));
                }
            }
            Stmt::For { item, list, body } => {
                let value = eval(list, scope)?;
                let items = match value {
                    Value::List(items) => items,
                    other => return Err(EvalError::NotIterable { kind: other.kind() }),
                };
                for element in items {
                    scope.push_frame();
                    scope.define(item.clone(), element);
                    let flow = exec_block(body, scope);
                    scope.pop_frame();
                    if let Flow::Return(v) = flow? {
                        return Ok(Flow::Return(v));
                    }
                }
            }
            Stmt::Return(value) => {
                let v = match value {
                    Some(expr) => eval(expr, scope)?,
                    None => Value::Undefined,
                };
                return Ok(Flow::Return(v));
            }
            Stmt::Expr(expr) => {
                eval(expr, scope)?;
            }
        }
    }
    Ok(Flow::Normal)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
