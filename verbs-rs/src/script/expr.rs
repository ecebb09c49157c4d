//! Algebraic expression lexer, AST, parser, and evaluator.
//!
//! Formulas are compiled once into a [`CompiledExpression`] and evaluated
//! any number of times against a [`Binding`] of symbol names to values.
//! All arithmetic is `f64`; comparisons and logical operators yield `1`/`0`.
//!
//! Operator precedence (lowest → highest):
//!   ternary  →  or  →  and  →  equality  →  relational  →
//!   additive  →  multiplicative  →  unary  →  power  →  primary
//!
//! `^` is right-associative and binds tighter than unary minus, so
//! `-2^2` is `-4`.

use std::collections::HashMap;

use crate::error::VerbError;

use super::value::Value;

/// Symbol name → bound value.
pub type Binding = HashMap<String, Value>;

// ── Token ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),

    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Caret,
    Bang,

    Eq, // ==
    Ne, // !=
    Lt,
    Le,
    Gt,
    Ge,

    And, // &&
    Or,  // ||

    Question,
    Colon,
    Comma,
    LParen,
    RParen,
    /// Unrecognised input, reported as a diagnostic rather than treated as EOF.
    Unknown(char),
    Eof,
}

// ── Lexer ─────────────────────────────────────────────────────────────────────

struct Lexer<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        Lexer { src, pos: 0 }
    }

    fn peek(&self) -> Option<u8> {
        self.src.as_bytes().get(self.pos).copied()
    }

    fn peek2(&self) -> Option<u8> {
        self.src.as_bytes().get(self.pos + 1).copied()
    }

    fn eat(&mut self, ch: u8) -> bool {
        if self.peek() == Some(ch) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t' | b'\n' | b'\r')) {
            self.pos += 1;
        }
    }

    fn skip_digits(&mut self) {
        while matches!(self.peek(), Some(b'0'..=b'9')) {
            self.pos += 1;
        }
    }

    /// `start` is the offset of the first digit (or leading `.`).
    fn read_number(&mut self, start: usize) -> Result<Token, String> {
        self.skip_digits();
        if self.peek() == Some(b'.') {
            self.pos += 1;
            self.skip_digits();
        }
        if matches!(self.peek(), Some(b'e' | b'E'))
            && matches!(self.peek2(), Some(b'0'..=b'9' | b'+' | b'-'))
        {
            self.pos += 2;
            self.skip_digits();
        }
        let text = &self.src[start..self.pos];
        text.parse()
            .map(Token::Number)
            .map_err(|_| format!("malformed number '{text}'"))
    }

    fn read_ident(&mut self, start: usize) -> Token {
        while matches!(
            self.peek(),
            Some(b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'_')
        ) {
            self.pos += 1;
        }
        Token::Ident(self.src[start..self.pos].to_owned())
    }

    fn next_token(&mut self) -> Result<Token, String> {
        self.skip_ws();
        let start = self.pos;
        let Some(ch) = self.peek() else {
            return Ok(Token::Eof);
        };
        self.pos += 1;

        Ok(match ch {
            b'0'..=b'9' | b'.' => return self.read_number(start),
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.read_ident(start),
            b'+' => Token::Plus,
            b'-' => Token::Minus,
            b'*' => Token::Star,
            b'/' => Token::Slash,
            b'%' => Token::Percent,
            b'^' => Token::Caret,
            b'!' => {
                if self.eat(b'=') {
                    Token::Ne
                } else {
                    Token::Bang
                }
            }
            b'=' if self.eat(b'=') => Token::Eq,
            b'<' => {
                if self.eat(b'=') {
                    Token::Le
                } else {
                    Token::Lt
                }
            }
            b'>' => {
                if self.eat(b'=') {
                    Token::Ge
                } else {
                    Token::Gt
                }
            }
            b'&' if self.eat(b'&') => Token::And,
            b'|' if self.eat(b'|') => Token::Or,
            b'?' => Token::Question,
            b':' => Token::Colon,
            b',' => Token::Comma,
            b'(' => Token::LParen,
            b')' => Token::RParen,
            _ => {
                // Consume the whole character so `pos` stays on a boundary.
                let c = self.src[start..].chars().next().unwrap_or('\u{fffd}');
                self.pos = start + c.len_utf8();
                Token::Unknown(c)
            }
        })
    }

    fn tokenize(mut self) -> Result<Vec<Token>, String> {
        let mut tokens = Vec::new();
        loop {
            let t = self.next_token()?;
            let done = matches!(t, Token::Eof);
            tokens.push(t);
            if done {
                return Ok(tokens);
            }
        }
    }
}

// ── AST ───────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

#[derive(Debug, Clone, Copy)]
enum UnaryOp {
    Neg,
    Plus,
    Not,
}

/// Built-in math functions, resolved at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MathFn {
    Abs,
    Sqrt,
    Cbrt,
    Exp,
    Log,
    Log10,
    Log2,
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Floor,
    Ceil,
    Round,
    Sign,
    Pow,
    Min,
    Max,
}

impl MathFn {
    fn lookup(name: &str) -> Option<MathFn> {
        Some(match name {
            "abs" => MathFn::Abs,
            "sqrt" => MathFn::Sqrt,
            "cbrt" => MathFn::Cbrt,
            "exp" => MathFn::Exp,
            "log" => MathFn::Log,
            "log10" => MathFn::Log10,
            "log2" => MathFn::Log2,
            "sin" => MathFn::Sin,
            "cos" => MathFn::Cos,
            "tan" => MathFn::Tan,
            "asin" => MathFn::Asin,
            "acos" => MathFn::Acos,
            "atan" => MathFn::Atan,
            "floor" => MathFn::Floor,
            "ceil" => MathFn::Ceil,
            "round" => MathFn::Round,
            "sign" => MathFn::Sign,
            "pow" => MathFn::Pow,
            "min" => MathFn::Min,
            "max" => MathFn::Max,
            _ => return None,
        })
    }

    /// Accepted argument counts (inclusive).
    fn arg_range(self) -> (usize, usize) {
        match self {
            MathFn::Pow => (2, 2),
            MathFn::Min | MathFn::Max => (1, usize::MAX),
            _ => (1, 1),
        }
    }

    fn call(self, args: &[f64]) -> f64 {
        let x = args.first().copied().unwrap_or(f64::NAN);
        match self {
            MathFn::Abs => x.abs(),
            MathFn::Sqrt => x.sqrt(),
            MathFn::Cbrt => x.cbrt(),
            MathFn::Exp => x.exp(),
            MathFn::Log => x.ln(),
            MathFn::Log10 => x.log10(),
            MathFn::Log2 => x.log2(),
            MathFn::Sin => x.sin(),
            MathFn::Cos => x.cos(),
            MathFn::Tan => x.tan(),
            MathFn::Asin => x.asin(),
            MathFn::Acos => x.acos(),
            MathFn::Atan => x.atan(),
            MathFn::Floor => x.floor(),
            MathFn::Ceil => x.ceil(),
            // Halves round towards +∞, as in most script engines.
            MathFn::Round => (x + 0.5).floor(),
            MathFn::Sign => {
                if x == 0.0 || x.is_nan() {
                    x
                } else {
                    x.signum()
                }
            }
            MathFn::Pow => x.powf(args.get(1).copied().unwrap_or(f64::NAN)),
            MathFn::Min => args.iter().copied().fold(f64::INFINITY, f64::min),
            MathFn::Max => args.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        }
    }
}

#[derive(Debug, Clone)]
enum Expr {
    Number(f64),
    Symbol(String),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
    Ternary(Box<Expr>, Box<Expr>, Box<Expr>),
    Call(MathFn, Vec<Expr>),
}

// ── Parser ────────────────────────────────────────────────────────────────────

/// Deepest expression tree the parser will build.  Evaluation recurses over
/// the tree, so this also bounds the evaluator's stack use.
const MAX_DEPTH: usize = 256;

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Parser { tokens, pos: 0, depth: 0 }
    }

    fn descend(&mut self) -> Result<(), String> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err("expression nested too deeply".into());
        }
        Ok(())
    }

    fn ascend(&mut self, levels: usize) {
        self.depth -= levels;
    }

    fn peek(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&Token::Eof)
    }

    fn advance(&mut self) -> Token {
        let t = self.tokens.get(self.pos).cloned().unwrap_or(Token::Eof);
        self.pos += 1;
        t
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == expected {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    // ── Grammar ───────────────────────────────────────────────────────────────

    fn parse_complete(&mut self) -> Result<Expr, String> {
        let expr = self.parse_ternary()?;
        match self.peek() {
            Token::Eof => Ok(expr),
            other => Err(describe_unexpected(other)),
        }
    }

    fn parse_ternary(&mut self) -> Result<Expr, String> {
        self.descend()?;
        let cond = self.parse_or()?;
        let expr = if self.eat(&Token::Question) {
            let then = self.parse_ternary()?;
            if !self.eat(&Token::Colon) {
                return Err("expected ':' in conditional".into());
            }
            let else_ = self.parse_ternary()?;
            Expr::Ternary(Box::new(cond), Box::new(then), Box::new(else_))
        } else {
            cond
        };
        self.ascend(1);
        Ok(expr)
    }

    fn parse_or(&mut self) -> Result<Expr, String> {
        let mut lhs = self.parse_and()?;
        let mut levels = 0;
        while self.eat(&Token::Or) {
            self.descend()?;
            levels += 1;
            let rhs = self.parse_and()?;
            lhs = Expr::Binary(BinOp::Or, Box::new(lhs), Box::new(rhs));
        }
        self.ascend(levels);
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr, String> {
        let mut lhs = self.parse_equality()?;
        let mut levels = 0;
        while self.eat(&Token::And) {
            self.descend()?;
            levels += 1;
            let rhs = self.parse_equality()?;
            lhs = Expr::Binary(BinOp::And, Box::new(lhs), Box::new(rhs));
        }
        self.ascend(levels);
        Ok(lhs)
    }

    fn parse_equality(&mut self) -> Result<Expr, String> {
        let mut lhs = self.parse_relational()?;
        let mut levels = 0;
        loop {
            let op = match self.peek() {
                Token::Eq => BinOp::Eq,
                Token::Ne => BinOp::Ne,
                _ => break,
            };
            self.pos += 1;
            self.descend()?;
            levels += 1;
            let rhs = self.parse_relational()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        self.ascend(levels);
        Ok(lhs)
    }

    fn parse_relational(&mut self) -> Result<Expr, String> {
        let mut lhs = self.parse_additive()?;
        let mut levels = 0;
        loop {
            let op = match self.peek() {
                Token::Lt => BinOp::Lt,
                Token::Le => BinOp::Le,
                Token::Gt => BinOp::Gt,
                Token::Ge => BinOp::Ge,
                _ => break,
            };
            self.pos += 1;
            self.descend()?;
            levels += 1;
            let rhs = self.parse_additive()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        self.ascend(levels);
        Ok(lhs)
    }

    fn parse_additive(&mut self) -> Result<Expr, String> {
        let mut lhs = self.parse_multiplicative()?;
        let mut levels = 0;
        loop {
            let op = match self.peek() {
                Token::Plus => BinOp::Add,
                Token::Minus => BinOp::Sub,
                _ => break,
            };
            self.pos += 1;
            self.descend()?;
            levels += 1;
            let rhs = self.parse_multiplicative()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        self.ascend(levels);
        Ok(lhs)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, String> {
        let mut lhs = self.parse_unary()?;
        let mut levels = 0;
        loop {
            let op = match self.peek() {
                Token::Star => BinOp::Mul,
                Token::Slash => BinOp::Div,
                Token::Percent => BinOp::Rem,
                _ => break,
            };
            self.pos += 1;
            self.descend()?;
            levels += 1;
            let rhs = self.parse_unary()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        self.ascend(levels);
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, String> {
        let op = match self.peek() {
            Token::Minus => UnaryOp::Neg,
            Token::Plus => UnaryOp::Plus,
            Token::Bang => UnaryOp::Not,
            _ => return self.parse_power(),
        };
        self.pos += 1;
        self.descend()?;
        let operand = self.parse_unary()?;
        self.ascend(1);
        Ok(Expr::Unary(op, Box::new(operand)))
    }

    fn parse_power(&mut self) -> Result<Expr, String> {
        let base = self.parse_primary()?;
        if self.eat(&Token::Caret) {
            // Right-associative; the exponent may carry its own sign.
            self.descend()?;
            let exp = self.parse_unary()?;
            self.ascend(1);
            return Ok(Expr::Binary(BinOp::Pow, Box::new(base), Box::new(exp)));
        }
        Ok(base)
    }

    fn parse_primary(&mut self) -> Result<Expr, String> {
        match self.advance() {
            Token::Number(x) => Ok(Expr::Number(x)),
            Token::Ident(name) => {
                if !self.eat(&Token::LParen) {
                    return Ok(Expr::Symbol(name));
                }
                let func = MathFn::lookup(&name)
                    .ok_or_else(|| format!("unknown function '{name}'"))?;
                let mut args = Vec::new();
                if self.peek() != &Token::RParen {
                    args.push(self.parse_ternary()?);
                    while self.eat(&Token::Comma) {
                        args.push(self.parse_ternary()?);
                    }
                }
                if !self.eat(&Token::RParen) {
                    return Err(format!("expected ')' after arguments to {name}"));
                }
                let (lo, hi) = func.arg_range();
                if args.len() < lo || args.len() > hi {
                    return Err(format!(
                        "{name} takes {} argument(s), got {}",
                        if lo == hi { lo.to_string() } else { format!("at least {lo}") },
                        args.len()
                    ));
                }
                Ok(Expr::Call(func, args))
            }
            Token::LParen => {
                let inner = self.parse_ternary()?;
                if !self.eat(&Token::RParen) {
                    return Err("expected ')'".into());
                }
                Ok(inner)
            }
            other => Err(describe_unexpected(&other)),
        }
    }
}

fn describe_unexpected(tok: &Token) -> String {
    match tok {
        Token::Eof => "unexpected end of expression".into(),
        Token::Unknown(c) => format!("unexpected character '{c}'"),
        other => format!("unexpected token {other:?}"),
    }
}

// ── CompiledExpression ────────────────────────────────────────────────────────

/// A parsed formula, immutable and reusable across evaluations.
#[derive(Debug, Clone)]
pub struct CompiledExpression {
    source: String,
    ast: Expr,
}

impl CompiledExpression {
    /// Parse `text`.  Fails with [`VerbError::ExpressionSyntax`].
    pub fn compile(text: &str) -> Result<Self, VerbError> {
        let syntax = |message: String| VerbError::ExpressionSyntax {
            expression: text.to_owned(),
            message,
        };
        let tokens = Lexer::new(text).tokenize().map_err(syntax)?;
        let ast = Parser::new(tokens).parse_complete().map_err(syntax)?;
        Ok(CompiledExpression {
            source: text.to_owned(),
            ast,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Evaluate against `binding`.
    ///
    /// Bound symbols shadow the constants `pi` and `e`.  An unbound symbol
    /// fails with [`VerbError::UndefinedSymbol`].
    pub fn evaluate(&self, binding: &Binding) -> Result<f64, VerbError> {
        eval(&self.ast, binding)
    }
}

// ── Evaluator ─────────────────────────────────────────────────────────────────

fn truth(x: f64) -> bool {
    x != 0.0 && !x.is_nan()
}

fn flag(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}

fn lookup_symbol(name: &str, binding: &Binding) -> Result<f64, VerbError> {
    if let Some(v) = binding.get(name) {
        return v.as_number().ok_or_else(|| {
            VerbError::invalid_argument(
                "eval",
                format!("symbol '{name}' is bound to a non-numeric {}", v.type_name()),
            )
        });
    }
    match name {
        "pi" => Ok(std::f64::consts::PI),
        "e" => Ok(std::f64::consts::E),
        _ => Err(VerbError::UndefinedSymbol(name.to_owned())),
    }
}

fn eval(expr: &Expr, binding: &Binding) -> Result<f64, VerbError> {
    Ok(match expr {
        Expr::Number(x) => *x,
        Expr::Symbol(name) => lookup_symbol(name, binding)?,
        Expr::Unary(op, inner) => {
            let v = eval(inner, binding)?;
            match op {
                UnaryOp::Neg => -v,
                UnaryOp::Plus => v,
                UnaryOp::Not => flag(!truth(v)),
            }
        }
        Expr::Binary(BinOp::And, lhs, rhs) => {
            flag(truth(eval(lhs, binding)?) && truth(eval(rhs, binding)?))
        }
        Expr::Binary(BinOp::Or, lhs, rhs) => {
            flag(truth(eval(lhs, binding)?) || truth(eval(rhs, binding)?))
        }
        Expr::Binary(op, lhs, rhs) => {
            let l = eval(lhs, binding)?;
            let r = eval(rhs, binding)?;
            match op {
                BinOp::Add => l + r,
                BinOp::Sub => l - r,
                BinOp::Mul => l * r,
                BinOp::Div => l / r,
                BinOp::Rem => l % r,
                BinOp::Pow => l.powf(r),
                BinOp::Eq => flag(l == r),
                BinOp::Ne => flag(l != r),
                BinOp::Lt => flag(l < r),
                BinOp::Le => flag(l <= r),
                BinOp::Gt => flag(l > r),
                BinOp::Ge => flag(l >= r),
                BinOp::And | BinOp::Or => unreachable!("short-circuit operators handled above"),
            }
        }
        Expr::Ternary(cond, then, else_) => {
            if truth(eval(cond, binding)?) {
                eval(then, binding)?
            } else {
                eval(else_, binding)?
            }
        }
        Expr::Call(func, arg_exprs) => {
            let args = arg_exprs
                .iter()
                .map(|a| eval(a, binding))
                .collect::<Result<Vec<_>, _>>()?;
            func.call(&args)
        }
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
