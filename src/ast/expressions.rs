use std::{fmt::Display, str::FromStr};

use bigdecimal::BigDecimal;
use num_bigint::BigInt;

use crate::errors::errors::{Error, ErrorImpl};

// LITERALS

/// A raw literal value, tagged by its native class.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Nil,
    Boolean(bool),
    Integer(BigInt),
    Decimal(BigDecimal),
    Character(char),
    String(String),
}

impl From<bool> for Literal {
    fn from(value: bool) -> Self {
        Literal::Boolean(value)
    }
}

impl From<i32> for Literal {
    fn from(value: i32) -> Self {
        Literal::Integer(BigInt::from(value))
    }
}

impl From<i64> for Literal {
    fn from(value: i64) -> Self {
        Literal::Integer(BigInt::from(value))
    }
}

impl From<BigInt> for Literal {
    fn from(value: BigInt) -> Self {
        Literal::Integer(value)
    }
}

impl From<BigDecimal> for Literal {
    fn from(value: BigDecimal) -> Self {
        Literal::Decimal(value)
    }
}

impl From<char> for Literal {
    fn from(value: char) -> Self {
        Literal::Character(value)
    }
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Literal::String(value.to_string())
    }
}

// OPERATORS

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    And,
    Or,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Equal,
    NotEqual,
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl BinaryOp {
    /// The operator as written in source.
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::And => "AND",
            BinaryOp::Or => "OR",
            BinaryOp::Less => "<",
            BinaryOp::LessEqual => "<=",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterEqual => ">=",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
        }
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }

    pub fn is_relational(&self) -> bool {
        matches!(
            self,
            BinaryOp::Less
                | BinaryOp::LessEqual
                | BinaryOp::Greater
                | BinaryOp::GreaterEqual
                | BinaryOp::Equal
                | BinaryOp::NotEqual
        )
    }
}

impl Display for BinaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

impl FromStr for BinaryOp {
    type Err = Error;

    fn from_str(symbol: &str) -> Result<Self, Self::Err> {
        match symbol {
            "AND" => Ok(BinaryOp::And),
            "OR" => Ok(BinaryOp::Or),
            "<" => Ok(BinaryOp::Less),
            "<=" => Ok(BinaryOp::LessEqual),
            ">" => Ok(BinaryOp::Greater),
            ">=" => Ok(BinaryOp::GreaterEqual),
            "==" => Ok(BinaryOp::Equal),
            "!=" => Ok(BinaryOp::NotEqual),
            "+" => Ok(BinaryOp::Add),
            "-" => Ok(BinaryOp::Subtract),
            "*" => Ok(BinaryOp::Multiply),
            "/" => Ok(BinaryOp::Divide),
            _ => Err(Error::new(ErrorImpl::InvalidExpression {
                message: format!("unknown operator `{}`", symbol),
            })),
        }
    }
}

// EXPRESSIONS

/// Expressions as produced by the parser.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal),
    /// Parenthesised binary expression.
    Group(Box<Expr>),
    Binary {
        operator: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// `name` or `receiver.name`
    Access {
        receiver: Option<Box<Expr>>,
        name: String,
    },
    /// `name(arguments)` or `receiver.name(arguments)`
    Call {
        receiver: Option<Box<Expr>>,
        name: String,
        arguments: Vec<Expr>,
    },
}

impl Expr {
    pub fn literal(literal: impl Into<Literal>) -> Self {
        Expr::Literal(literal.into())
    }

    pub fn nil() -> Self {
        Expr::Literal(Literal::Nil)
    }

    pub fn group(expression: Expr) -> Self {
        Expr::Group(Box::new(expression))
    }

    pub fn binary(operator: BinaryOp, left: Expr, right: Expr) -> Self {
        Expr::Binary {
            operator,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn access(name: &str) -> Self {
        Expr::Access {
            receiver: None,
            name: name.to_string(),
        }
    }

    pub fn field(receiver: Expr, name: &str) -> Self {
        Expr::Access {
            receiver: Some(Box::new(receiver)),
            name: name.to_string(),
        }
    }

    pub fn call(name: &str, arguments: Vec<Expr>) -> Self {
        Expr::Call {
            receiver: None,
            name: name.to_string(),
            arguments,
        }
    }

    pub fn method(receiver: Expr, name: &str, arguments: Vec<Expr>) -> Self {
        Expr::Call {
            receiver: Some(Box::new(receiver)),
            name: name.to_string(),
            arguments,
        }
    }
}
