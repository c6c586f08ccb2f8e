//! Compiled expressions over named columns.
//!
//! Selections, weights, derived columns, and histogram variables are all
//! opaque strings in the run configuration; this module turns them into
//! evaluable [`ColumnExpr`] values. Supported syntax: arithmetic
//! (`+ - * / %`), comparisons (`== != < <= > >=`), boolean operators
//! (`&& || !`), parentheses, numeric literals (including scientific
//! notation), and the functions `abs sqrt log exp pow min max floor ceil`.
//!
//! Boolean results are encoded as `f64`: truthy is any nonzero value, so a
//! selection like `pt - 30` passes every row where the difference is not
//! exactly zero. Comparison and boolean operators themselves yield 1 or 0.

use crate::error::{Result, TableError};

/// A parsed expression, ready for row-wise evaluation.
///
/// Column identifiers found while parsing are collected into
/// [`columns`](Self::columns), ordered by first occurrence; evaluation takes
/// the corresponding values in that order.
#[derive(Debug, Clone)]
pub struct ColumnExpr {
    root: Node,
    /// Column names this expression reads, ordered by first occurrence.
    pub columns: Vec<String>,
    /// The original source text, kept for error reporting.
    pub source: String,
}

#[derive(Debug, Clone)]
enum Node {
    Const(f64),
    Column(usize),
    Neg(Box<Node>),
    Not(Box<Node>),
    Binary(Op, Box<Node>, Box<Node>),
    Call(Builtin, Vec<Node>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Or,
    And,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl Op {
    /// Binding power for precedence climbing. Higher binds tighter.
    fn precedence(self) -> u8 {
        match self {
            Op::Or => 1,
            Op::And => 2,
            Op::Eq | Op::Ne | Op::Lt | Op::Le | Op::Gt | Op::Ge => 3,
            Op::Add | Op::Sub => 4,
            Op::Mul | Op::Div | Op::Rem => 5,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Builtin {
    Abs,
    Sqrt,
    Log,
    Exp,
    Pow,
    Min,
    Max,
    Floor,
    Ceil,
}

impl Builtin {
    fn lookup(name: &str) -> Option<(Builtin, usize)> {
        Some(match name {
            "abs" => (Builtin::Abs, 1),
            "sqrt" => (Builtin::Sqrt, 1),
            "log" => (Builtin::Log, 1),
            "exp" => (Builtin::Exp, 1),
            "pow" => (Builtin::Pow, 2),
            "min" => (Builtin::Min, 2),
            "max" => (Builtin::Max, 2),
            "floor" => (Builtin::Floor, 1),
            "ceil" => (Builtin::Ceil, 1),
            _ => return None,
        })
    }
}

impl ColumnExpr {
    /// Parse an expression string.
    ///
    /// Identifiers that are not built-in function names are treated as
    /// column references.
    pub fn parse(source: &str) -> Result<Self> {
        let tokens = Lexer::new(source).run()?;
        let mut p = Parser { tokens: &tokens, pos: 0, columns: Vec::new(), source };
        let root = p.expression(0)?;
        if let Some(t) = p.peek() {
            return Err(p.error(format!("trailing input at '{t}'")));
        }
        Ok(ColumnExpr { root, columns: p.columns, source: source.to_string() })
    }

    /// Evaluate for one row.
    ///
    /// `values` must match [`columns`](Self::columns) in length and order.
    #[inline]
    pub fn eval_row(&self, values: &[f64]) -> f64 {
        debug_assert_eq!(values.len(), self.columns.len());
        eval(&self.root, values)
    }

    /// Whether the expression reads no columns at all.
    pub fn is_constant(&self) -> bool {
        self.columns.is_empty()
    }
}

fn eval(node: &Node, values: &[f64]) -> f64 {
    match node {
        Node::Const(c) => *c,
        Node::Column(i) => values[*i],
        Node::Neg(a) => -eval(a, values),
        Node::Not(a) => bool_f64(!truthy(eval(a, values))),
        Node::Binary(op, a, b) => {
            let l = eval(a, values);
            let r = eval(b, values);
            match op {
                Op::Add => l + r,
                Op::Sub => l - r,
                Op::Mul => l * r,
                Op::Div => l / r,
                Op::Rem => l % r,
                Op::Eq => bool_f64(l == r),
                Op::Ne => bool_f64(l != r),
                Op::Lt => bool_f64(l < r),
                Op::Le => bool_f64(l <= r),
                Op::Gt => bool_f64(l > r),
                Op::Ge => bool_f64(l >= r),
                Op::And => bool_f64(truthy(l) && truthy(r)),
                Op::Or => bool_f64(truthy(l) || truthy(r)),
            }
        }
        Node::Call(f, args) => {
            let a = eval(&args[0], values);
            match f {
                Builtin::Abs => a.abs(),
                Builtin::Sqrt => a.sqrt(),
                Builtin::Log => a.ln(),
                Builtin::Exp => a.exp(),
                Builtin::Floor => a.floor(),
                Builtin::Ceil => a.ceil(),
                Builtin::Pow => a.powf(eval(&args[1], values)),
                Builtin::Min => a.min(eval(&args[1], values)),
                Builtin::Max => a.max(eval(&args[1], values)),
            }
        }
    }
}

/// Truthiness convention shared by selections and boolean operators:
/// any nonzero value counts as true.
#[inline]
pub(crate) fn truthy(v: f64) -> bool {
    v != 0.0
}

#[inline]
fn bool_f64(b: bool) -> f64 {
    if b { 1.0 } else { 0.0 }
}

// ── Lexer ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Op(Op),
    Not,
    LParen,
    RParen,
    Comma,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Number(n) => write!(f, "{n}"),
            Token::Ident(s) => write!(f, "{s}"),
            Token::Op(op) => {
                let s = match op {
                    Op::Or => "||",
                    Op::And => "&&",
                    Op::Eq => "==",
                    Op::Ne => "!=",
                    Op::Lt => "<",
                    Op::Le => "<=",
                    Op::Gt => ">",
                    Op::Ge => ">=",
                    Op::Add => "+",
                    Op::Sub => "-",
                    Op::Mul => "*",
                    Op::Div => "/",
                    Op::Rem => "%",
                };
                write!(f, "{s}")
            }
            Token::Not => write!(f, "!"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::Comma => write!(f, ","),
        }
    }
}

struct Lexer<'a> {
    src: &'a str,
    rest: &'a str,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, rest: src }
    }

    fn run(mut self) -> Result<Vec<Token>> {
        let mut out = Vec::new();
        loop {
            self.rest = self.rest.trim_start();
            let Some(c) = self.rest.chars().next() else { break };

            // Multi-character operators first.
            let two: Option<Op> = match self.rest.get(..2) {
                Some("||") => Some(Op::Or),
                Some("&&") => Some(Op::And),
                Some("==") => Some(Op::Eq),
                Some("!=") => Some(Op::Ne),
                Some("<=") => Some(Op::Le),
                Some(">=") => Some(Op::Ge),
                _ => None,
            };
            if let Some(op) = two {
                out.push(Token::Op(op));
                self.rest = &self.rest[2..];
                continue;
            }

            let single = match c {
                '+' => Some(Token::Op(Op::Add)),
                '-' => Some(Token::Op(Op::Sub)),
                '*' => Some(Token::Op(Op::Mul)),
                '/' => Some(Token::Op(Op::Div)),
                '%' => Some(Token::Op(Op::Rem)),
                '<' => Some(Token::Op(Op::Lt)),
                '>' => Some(Token::Op(Op::Gt)),
                '!' => Some(Token::Not),
                '(' => Some(Token::LParen),
                ')' => Some(Token::RParen),
                ',' => Some(Token::Comma),
                _ => None,
            };
            if let Some(t) = single {
                out.push(t);
                self.rest = &self.rest[c.len_utf8()..];
                continue;
            }

            if c.is_ascii_digit() || c == '.' {
                out.push(self.number()?);
            } else if c.is_ascii_alphabetic() || c == '_' {
                out.push(self.ident());
            } else {
                return Err(TableError::Expression(format!(
                    "unexpected character '{c}' in '{}'",
                    self.src
                )));
            }
        }
        Ok(out)
    }

    fn number(&mut self) -> Result<Token> {
        let bytes = self.rest.as_bytes();
        let mut end = 0;
        while end < bytes.len() {
            let b = bytes[end];
            let in_number = b.is_ascii_digit()
                || b == b'.'
                || b == b'e'
                || b == b'E'
                || ((b == b'+' || b == b'-')
                    && end > 0
                    && (bytes[end - 1] == b'e' || bytes[end - 1] == b'E'));
            if !in_number {
                break;
            }
            end += 1;
        }
        let text = &self.rest[..end];
        self.rest = &self.rest[end..];
        let value: f64 = text
            .parse()
            .map_err(|_| TableError::Expression(format!("invalid number literal '{text}'")))?;
        Ok(Token::Number(value))
    }

    fn ident(&mut self) -> Token {
        let end = self
            .rest
            .find(|c: char| !c.is_ascii_alphanumeric() && c != '_')
            .unwrap_or(self.rest.len());
        let text = &self.rest[..end];
        self.rest = &self.rest[end..];
        Token::Ident(text.to_string())
    }
}

// ── Parser (precedence climbing) ───────────────────────────────

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    columns: Vec<String>,
    source: &'a str,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let t = self.tokens.get(self.pos).cloned();
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    fn error(&self, msg: String) -> TableError {
        TableError::Expression(format!("{msg} in '{}'", self.source))
    }

    fn column_index(&mut self, name: &str) -> usize {
        match self.columns.iter().position(|c| c == name) {
            Some(i) => i,
            None => {
                self.columns.push(name.to_string());
                self.columns.len() - 1
            }
        }
    }

    fn expression(&mut self, min_prec: u8) -> Result<Node> {
        let mut lhs = self.unary()?;
        while let Some(Token::Op(op)) = self.peek() {
            let op = *op;
            if op.precedence() < min_prec {
                break;
            }
            self.pos += 1;
            // All operators are left-associative.
            let rhs = self.expression(op.precedence() + 1)?;
            lhs = Node::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Node> {
        match self.peek() {
            Some(Token::Op(Op::Sub)) => {
                self.pos += 1;
                Ok(Node::Neg(Box::new(self.unary()?)))
            }
            Some(Token::Not) => {
                self.pos += 1;
                Ok(Node::Not(Box::new(self.unary()?)))
            }
            _ => self.primary(),
        }
    }

    fn primary(&mut self) -> Result<Node> {
        match self.next() {
            Some(Token::Number(n)) => Ok(Node::Const(n)),
            Some(Token::LParen) => {
                let inner = self.expression(0)?;
                match self.next() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err(self.error("missing closing ')'".to_string())),
                }
            }
            Some(Token::Ident(name)) => {
                if matches!(self.peek(), Some(Token::LParen)) {
                    self.pos += 1;
                    self.call(&name)
                } else {
                    let idx = self.column_index(&name);
                    Ok(Node::Column(idx))
                }
            }
            other => {
                let got = other.map(|t| t.to_string()).unwrap_or_else(|| "end of input".into());
                Err(self.error(format!("expected value, got '{got}'")))
            }
        }
    }

    fn call(&mut self, name: &str) -> Result<Node> {
        let Some((builtin, arity)) = Builtin::lookup(name) else {
            return Err(self.error(format!("unknown function '{name}'")));
        };
        let mut args = vec![self.expression(0)?];
        while matches!(self.peek(), Some(Token::Comma)) {
            self.pos += 1;
            args.push(self.expression(0)?);
        }
        match self.next() {
            Some(Token::RParen) => {}
            _ => return Err(self.error(format!("missing ')' after '{name}(...'"))),
        }
        if args.len() != arity {
            return Err(self.error(format!(
                "'{name}' takes {arity} argument(s), got {}",
                args.len()
            )));
        }
        Ok(Node::Call(builtin, args))
    }
}
