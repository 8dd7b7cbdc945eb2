//! Symbol expressions: linear combinations of vocabulary entries.
//!
//! ```text
//! expr  := term (('+' | '-') term)*
//! term  := unary ('*' unary)*
//! unary := '-' unary | atom
//! atom  := number | identifier | '(' expr ')'
//! ```
//!
//! `0.8*LETTER+D` scales `LETTER` and adds `D`. Products of two vectors
//! would be binding, which this crate does not implement.

use crate::error::{CleanupError, Result};
use crate::kernel::vector::Vector;
use crate::kernel::vocabulary::SymbolLookup;

/// Deepest nesting of parentheses and unary minus accepted by the parser.
pub const MAX_NESTING: usize = 64;

/// Whether `s` can be used as a symbol name inside an expression.
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Evaluate `expr` against `lookup`, producing a `dimensions`-long vector.
pub fn evaluate<L: SymbolLookup + ?Sized>(
    expr: &str,
    lookup: &L,
    dimensions: usize,
) -> Result<Vector> {
    let tokens = tokenize(expr)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        lookup,
        dimensions,
        end: expr.len(),
        depth: 0,
    };

    let value = parser.expr()?;
    if let Some((tok, at)) = parser.tokens.get(parser.pos) {
        return Err(parse_error(*at, format!("unexpected {}", tok.describe())));
    }

    match value {
        Value::Vector(v) => Ok(v),
        Value::Scalar(_) => Err(parse_error(0, "expression has no symbol".to_string())),
    }
}

#[derive(Clone, Debug, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    LParen,
    RParen,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Number(n) => format!("number {}", n),
            Token::Ident(s) => format!("symbol {}", s),
            Token::Plus => "'+'".to_string(),
            Token::Minus => "'-'".to_string(),
            Token::Star => "'*'".to_string(),
            Token::LParen => "'('".to_string(),
            Token::RParen => "')'".to_string(),
        }
    }
}

enum Value {
    Scalar(f64),
    Vector(Vector),
}

fn parse_error(position: usize, message: String) -> CleanupError {
    CleanupError::Parse { position, message }
}

fn tokenize(expr: &str) -> Result<Vec<(Token, usize)>> {
    let bytes = expr.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i] as char;
        let start = i;

        match c {
            ' ' | '\t' | '\n' | '\r' => {
                i += 1;
                continue;
            }
            '+' => tokens.push((Token::Plus, start)),
            '-' => tokens.push((Token::Minus, start)),
            '*' => tokens.push((Token::Star, start)),
            '(' => tokens.push((Token::LParen, start)),
            ')' => tokens.push((Token::RParen, start)),
            c if c.is_ascii_digit() || c == '.' => {
                while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'.') {
                    i += 1;
                }
                // Exponent only when digits follow, so `2E` is not swallowed.
                if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
                    let mut j = i + 1;
                    if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
                        j += 1;
                    }
                    if j < bytes.len() && bytes[j].is_ascii_digit() {
                        i = j;
                        while i < bytes.len() && bytes[i].is_ascii_digit() {
                            i += 1;
                        }
                    }
                }
                let text = &expr[start..i];
                let n: f64 = text
                    .parse()
                    .map_err(|_| parse_error(start, format!("invalid number {:?}", text)))?;
                tokens.push((Token::Number(n), start));
                continue;
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                    i += 1;
                }
                tokens.push((Token::Ident(expr[start..i].to_string()), start));
                continue;
            }
            other => {
                return Err(parse_error(start, format!("unexpected character {:?}", other)));
            }
        }
        i += 1;
    }

    Ok(tokens)
}

struct Parser<'a, L: ?Sized> {
    tokens: Vec<(Token, usize)>,
    pos: usize,
    lookup: &'a L,
    dimensions: usize,
    end: usize,
    depth: usize,
}

impl<'a, L: SymbolLookup + ?Sized> Parser<'a, L> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn position(&self) -> usize {
        self.tokens.get(self.pos).map_or(self.end, |(_, at)| *at)
    }

    fn enter(&mut self, at: usize) -> Result<()> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            return Err(parse_error(
                at,
                format!("nesting deeper than {}", MAX_NESTING),
            ));
        }
        Ok(())
    }

    fn expr(&mut self) -> Result<Value> {
        let mut lhs = self.term()?;
        loop {
            let sign = match self.peek() {
                Some(Token::Plus) => 1.0,
                Some(Token::Minus) => -1.0,
                _ => return Ok(lhs),
            };
            let at = self.position();
            self.pos += 1;
            let rhs = self.term()?;
            lhs = combine_sum(lhs, rhs, sign, at)?;
        }
    }

    fn term(&mut self) -> Result<Value> {
        let mut lhs = self.unary()?;
        while let Some(Token::Star) = self.peek() {
            self.pos += 1;
            let rhs = self.unary()?;
            lhs = match (lhs, rhs) {
                (Value::Scalar(a), Value::Scalar(b)) => Value::Scalar(a * b),
                (Value::Scalar(a), Value::Vector(v)) | (Value::Vector(v), Value::Scalar(a)) => {
                    Value::Vector(v.scaled(a))
                }
                (Value::Vector(_), Value::Vector(_)) => {
                    return Err(CleanupError::UnsupportedOperation(
                        "product of two semantic pointers (binding)".to_string(),
                    ));
                }
            };
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Value> {
        if let Some(Token::Minus) = self.peek() {
            self.enter(self.position())?;
            self.pos += 1;
            let value = match self.unary()? {
                Value::Scalar(a) => Value::Scalar(-a),
                Value::Vector(v) => Value::Vector(-&v),
            };
            self.depth -= 1;
            return Ok(value);
        }
        self.atom()
    }

    fn atom(&mut self) -> Result<Value> {
        let at = self.position();
        let token = match self.tokens.get(self.pos) {
            Some((t, _)) => t.clone(),
            None => return Err(parse_error(at, "unexpected end of expression".to_string())),
        };
        self.pos += 1;

        match token {
            Token::Number(n) => Ok(Value::Scalar(n)),
            Token::Ident(name) => {
                let v = self
                    .lookup
                    .lookup(&name)
                    .ok_or(CleanupError::UnknownSymbol { name })?;
                if v.dimensions() != self.dimensions {
                    return Err(CleanupError::DimensionMismatch {
                        expected: self.dimensions,
                        got: v.dimensions(),
                    });
                }
                Ok(Value::Vector(v.clone()))
            }
            Token::LParen => {
                self.enter(at)?;
                let inner = self.expr()?;
                match self.peek() {
                    Some(Token::RParen) => {
                        self.pos += 1;
                        self.depth -= 1;
                        Ok(inner)
                    }
                    _ => Err(parse_error(self.position(), "expected ')'".to_string())),
                }
            }
            other => Err(parse_error(at, format!("unexpected {}", other.describe()))),
        }
    }
}

fn combine_sum(lhs: Value, rhs: Value, sign: f64, at: usize) -> Result<Value> {
    match (lhs, rhs) {
        (Value::Scalar(a), Value::Scalar(b)) => Ok(Value::Scalar(a + sign * b)),
        (Value::Vector(a), Value::Vector(b)) => Ok(Value::Vector(&a + &b.scaled(sign))),
        _ => Err(CleanupError::UnsupportedOperation(format!(
            "adding a scalar to a semantic pointer at {}",
            at
        ))),
    }
}
