//! Tokenizer shared by the expression parser and the script parser.

use crate::error::CompileError;

/// One lexical token with its byte offset into the source.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Number(f64),
    Str(String),
    Ident(String),

    // Keywords
    True,
    False,
    Null,
    Undefined,
    Let,
    If,
    Else,
    For,
    In,
    Fn,
    Return,

    // Punctuation / operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Bang,
    Lt,
    Le,
    Gt,
    Ge,
    EqEq,
    NotEq,
    AndAnd,
    OrOr,
    Question,
    Colon,
    Dot,
    Comma,
    Semicolon,
    Assign,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,

    Eof,
}

impl TokenKind {
    /// Short description for parser error messages.
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Number(n) => format!("number {n}"),
            TokenKind::Str(_) => "string literal".to_string(),
            TokenKind::Ident(name) => format!("identifier '{name}'"),
            TokenKind::Eof => "end of input".to_string(),
            other => format!("{other:?}"),
        }
    }
}

/// Tokenize `source` completely, appending a trailing [`TokenKind::Eof`].
pub fn tokenize(source: &str) -> Result<Vec<Token>, CompileError> {
    let bytes = source.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let c = bytes[pos] as char;

        if c.is_ascii_whitespace() {
            pos += 1;
            continue;
        }

        // Line comments, script files only in practice.
        if c == '/' && bytes.get(pos + 1) == Some(&b'/') {
            while pos < bytes.len() && bytes[pos] != b'\n' {
                pos += 1;
            }
            continue;
        }

        let start = pos;
        let kind = match c {
            '0'..='9' => {
                let (number, len) = lex_number(&source[pos..], pos)?;
                pos += len;
                tokens.push(Token { kind: TokenKind::Number(number), offset: start });
                continue;
            }
            '"' | '\'' => {
                let (text, len) = lex_string(&source[pos..], c, pos)?;
                pos += len;
                tokens.push(Token { kind: TokenKind::Str(text), offset: start });
                continue;
            }
            c if c.is_ascii_alphabetic() || c == '_' || c == '$' => {
                let len = source[pos..]
                    .find(|ch: char| !(ch.is_ascii_alphanumeric() || ch == '_' || ch == '$'))
                    .unwrap_or(source.len() - pos);
                let word = &source[pos..pos + len];
                pos += len;
                tokens.push(Token { kind: keyword_or_ident(word), offset: start });
                continue;
            }
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '%' => TokenKind::Percent,
            '?' => TokenKind::Question,
            ':' => TokenKind::Colon,
            '.' => TokenKind::Dot,
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semicolon,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '!' => {
                if bytes.get(pos + 1) == Some(&b'=') {
                    pos += 1;
                    TokenKind::NotEq
                } else {
                    TokenKind::Bang
                }
            }
            '<' => {
                if bytes.get(pos + 1) == Some(&b'=') {
                    pos += 1;
                    TokenKind::Le
                } else {
                    TokenKind::Lt
                }
            }
            '>' => {
                if bytes.get(pos + 1) == Some(&b'=') {
                    pos += 1;
                    TokenKind::Ge
                } else {
                    TokenKind::Gt
                }
            }
            '=' => {
                if bytes.get(pos + 1) == Some(&b'=') {
                    pos += 1;
                    TokenKind::EqEq
                } else {
                    TokenKind::Assign
                }
            }
            '&' => {
                if bytes.get(pos + 1) == Some(&b'&') {
                    pos += 1;
                    TokenKind::AndAnd
                } else {
                    return Err(syntax(pos, "expected '&&'"));
                }
            }
            '|' => {
                if bytes.get(pos + 1) == Some(&b'|') {
                    pos += 1;
                    TokenKind::OrOr
                } else {
                    return Err(syntax(pos, "expected '||'"));
                }
            }
            other => return Err(syntax(pos, format!("unexpected character '{other}'"))),
        };

        pos += 1;
        tokens.push(Token { kind, offset: start });
    }

    tokens.push(Token { kind: TokenKind::Eof, offset: source.len() });
    Ok(tokens)
}

fn keyword_or_ident(word: &str) -> TokenKind {
    match word {
        "true" => TokenKind::True,
        "false" => TokenKind::False,
        "null" => TokenKind::Null,
        "undefined" => TokenKind::Undefined,
        "let" => TokenKind::Let,
        "if" => TokenKind::If,
        "else" => TokenKind::Else,
        "for" => TokenKind::For,
        "in" => TokenKind::In,
        "fn" => TokenKind::Fn,
        "return" => TokenKind::Return,
        _ => TokenKind::Ident(word.to_string()),
    }
}

fn lex_number(rest: &str, offset: usize) -> Result<(f64, usize), CompileError> {
    let mut len = 0;
    let mut seen_dot = false;
    for (i, c) in rest.char_indices() {
        match c {
            '0'..='9' => len = i + 1,
            // A trailing `.` followed by a digit is a fraction; `1.foo` is
            // member access on a number and stops the literal.
            '.' if !seen_dot
                && rest[i + 1..].chars().next().is_some_and(|d| d.is_ascii_digit()) =>
            {
                seen_dot = true;
                len = i + 1;
            }
            _ => break,
        }
    }
    rest[..len]
        .parse::<f64>()
        .map(|n| (n, len))
        .map_err(|_| syntax(offset, "malformed number literal"))
}

fn lex_string(rest: &str, quote: char, offset: usize) -> Result<(String, usize), CompileError> {
    let mut text = String::new();
    let mut chars = rest.char_indices().skip(1);
    while let Some((i, c)) = chars.next() {
        match c {
            c if c == quote => return Ok((text, i + c.len_utf8())),
            '\\' => match chars.next() {
                Some((_, 'n')) => text.push('\n'),
                Some((_, 't')) => text.push('\t'),
                Some((_, '\\')) => text.push('\\'),
                Some((_, c)) if c == quote => text.push(c),
                Some((j, c)) => {
                    return Err(syntax(offset + j, format!("unknown escape '\\{c}'")))
                }
                None => break,
            },
            c => text.push(c),
        }
    }
    Err(syntax(offset, "unterminated string literal"))
}

fn syntax(offset: usize, message: impl Into<String>) -> CompileError {
    CompileError::Syntax { offset, message: message.into() }
}
