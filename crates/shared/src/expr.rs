//! Arithmetic over record columns.
//!
//! The grammar is closed: numbers, column names (bare identifiers or
//! backticked), parentheses, unary minus and `+ - * / %`. Anything else is a
//! parse error, so user-supplied derive expressions never reach an evaluator
//! with wider powers.
//!
//! ```text
//! expr   := term (('+' | '-') term)*
//! term   := unary (('*' | '/' | '%') unary)*
//! unary  := '-' unary | atom
//! atom   := NUMBER | IDENT | '`' name '`' | '(' expr ')'
//! ```

use serde_json::{Number, Value};

use crate::records::Record;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    Int(i64),
    Float(f64),
}

impl Scalar {
    fn as_f64(self) -> f64 {
        match self {
            Scalar::Int(i) => i as f64,
            Scalar::Float(f) => f,
        }
    }

    fn into_value(self) -> Value {
        match self {
            Scalar::Int(i) => Value::from(i),
            Scalar::Float(f) => Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Scalar),
    Column(String),
    Neg(Box<Expr>),
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(Scalar),
    Name(String),
    Op(char),
    Open,
    Close,
}

fn tokenize(source: &str) -> Result<Vec<Token>, String> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '+' | '-' | '*' | '/' | '%' => {
                tokens.push(Token::Op(c));
                i += 1;
            }
            '(' => {
                tokens.push(Token::Open);
                i += 1;
            }
            ')' => {
                tokens.push(Token::Close);
                i += 1;
            }
            '`' => {
                let end = chars[i + 1..]
                    .iter()
                    .position(|&c| c == '`')
                    .ok_or_else(|| format!("unterminated backtick at position {}", i))?;
                let name: String = chars[i + 1..i + 1 + end].iter().collect();
                if name.is_empty() {
                    return Err(format!("empty column name at position {}", i));
                }
                tokens.push(Token::Name(name));
                i += end + 2;
            }
            c if c.is_ascii_digit() || c == '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                let number = if text.contains('.') {
                    text.parse::<f64>().map(Scalar::Float).ok()
                } else {
                    text.parse::<i64>()
                        .map(Scalar::Int)
                        .ok()
                        .or_else(|| text.parse::<f64>().map(Scalar::Float).ok())
                };
                tokens.push(Token::Number(
                    number.ok_or_else(|| format!("invalid number '{}'", text))?,
                ));
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                tokens.push(Token::Name(chars[start..i].iter().collect()));
            }
            other => return Err(format!("unexpected character '{}' at position {}", other, i)),
        }
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn expr(&mut self) -> Result<Expr, String> {
        let mut lhs = self.term()?;
        while let Some(Token::Op(c @ ('+' | '-'))) = self.peek() {
            let op = if *c == '+' { BinOp::Add } else { BinOp::Sub };
            self.pos += 1;
            let rhs = self.term()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn term(&mut self) -> Result<Expr, String> {
        let mut lhs = self.unary()?;
        while let Some(Token::Op(c @ ('*' | '/' | '%'))) = self.peek() {
            let op = match c {
                '*' => BinOp::Mul,
                '/' => BinOp::Div,
                _ => BinOp::Rem,
            };
            self.pos += 1;
            let rhs = self.unary()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expr, String> {
        if let Some(Token::Op('-')) = self.peek() {
            self.pos += 1;
            return Ok(Expr::Neg(Box::new(self.unary()?)));
        }
        self.atom()
    }

    fn atom(&mut self) -> Result<Expr, String> {
        match self.next() {
            Some(Token::Number(n)) => Ok(Expr::Literal(n)),
            Some(Token::Name(name)) => Ok(Expr::Column(name)),
            Some(Token::Open) => {
                let inner = self.expr()?;
                match self.next() {
                    Some(Token::Close) => Ok(inner),
                    _ => Err("missing closing parenthesis".to_string()),
                }
            }
            Some(Token::Op(c)) => Err(format!("unexpected operator '{}'", c)),
            Some(Token::Close) => Err("unexpected ')'".to_string()),
            None => Err("unexpected end of expression".to_string()),
        }
    }
}

impl Expr {
    pub fn parse(source: &str) -> Result<Expr, String> {
        let tokens = tokenize(source)?;
        if tokens.is_empty() {
            return Err("empty expression".to_string());
        }
        let mut parser = Parser { tokens, pos: 0 };
        let expr = parser.expr()?;
        if parser.pos < parser.tokens.len() {
            return Err(format!("unexpected input after position {}", parser.pos));
        }
        Ok(expr)
    }

    /// Evaluates against one row. Null propagates; division by zero is null.
    pub fn eval(&self, row: &Record) -> Result<Value, String> {
        Ok(self
            .eval_scalar(row)?
            .map(Scalar::into_value)
            .unwrap_or(Value::Null))
    }

    fn eval_scalar(&self, row: &Record) -> Result<Option<Scalar>, String> {
        match self {
            Expr::Literal(n) => Ok(Some(*n)),
            Expr::Column(name) => match row.get(name) {
                None => Err(format!("unknown column '{}'", name)),
                Some(Value::Null) => Ok(None),
                Some(Value::Number(n)) => Ok(Some(match n.as_i64() {
                    Some(i) => Scalar::Int(i),
                    None => Scalar::Float(n.as_f64().unwrap_or(f64::NAN)),
                })),
                Some(other) => Err(format!("column '{}' is not numeric ({})", name, other)),
            },
            Expr::Neg(inner) => Ok(inner.eval_scalar(row)?.map(|v| match v {
                Scalar::Int(i) => i
                    .checked_neg()
                    .map(Scalar::Int)
                    .unwrap_or(Scalar::Float(-(i as f64))),
                Scalar::Float(f) => Scalar::Float(-f),
            })),
            Expr::Binary { op, lhs, rhs } => {
                let (Some(a), Some(b)) = (lhs.eval_scalar(row)?, rhs.eval_scalar(row)?) else {
                    return Ok(None);
                };
                Ok(apply(*op, a, b))
            }
        }
    }
}

fn apply(op: BinOp, a: Scalar, b: Scalar) -> Option<Scalar> {
    if let (Scalar::Int(x), Scalar::Int(y)) = (a, b) {
        let exact = match op {
            BinOp::Add => x.checked_add(y),
            BinOp::Sub => x.checked_sub(y),
            BinOp::Mul => x.checked_mul(y),
            BinOp::Rem if y == 0 => return None,
            BinOp::Rem => x.checked_rem(y).map(|r| floor_rem(r, y)),
            BinOp::Div => None,
        };
        if let Some(v) = exact {
            return Some(Scalar::Int(v));
        }
    }

    let (x, y) = (a.as_f64(), b.as_f64());
    let result = match op {
        BinOp::Add => x + y,
        BinOp::Sub => x - y,
        BinOp::Mul => x * y,
        BinOp::Div | BinOp::Rem if y == 0.0 => return None,
        BinOp::Div => x / y,
        BinOp::Rem => {
            let r = x % y;
            if r != 0.0 && (r < 0.0) != (y < 0.0) { r + y } else { r }
        }
    };
    Some(Scalar::Float(result))
}

/// Remainder takes the sign of the divisor.
fn floor_rem(r: i64, divisor: i64) -> i64 {
    if r != 0 && (r < 0) != (divisor < 0) {
        r + divisor
    } else {
        r
    }
}
