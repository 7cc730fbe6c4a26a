//! Runtime values.

use std::{cmp::Ordering, fmt::Display};

use bigdecimal::BigDecimal;
use num_bigint::BigInt;

use super::{
    scope::ScopeId,
    types::{TypeId, TypeRegistry},
};

/// The native datum carried by a value.
#[derive(Debug, Clone)]
pub enum Native {
    Nil,
    Boolean(bool),
    Integer(BigInt),
    Decimal(BigDecimal),
    Character(char),
    String(String),
    Sequence(Vec<Value>),
}

impl Native {
    /// Name of the native class, for runtime diagnostics.
    pub fn class_name(&self) -> &'static str {
        match self {
            Native::Nil => "nil",
            Native::Boolean(_) => "boolean",
            Native::Integer(_) => "integer",
            Native::Decimal(_) => "decimal",
            Native::Character(_) => "character",
            Native::String(_) => "string",
            Native::Sequence(_) => "sequence",
        }
    }

    /// Orders two data of the same ordered class; `None` otherwise.
    pub fn compare(&self, other: &Native) -> Option<Ordering> {
        match (self, other) {
            (Native::Boolean(left), Native::Boolean(right)) => Some(left.cmp(right)),
            (Native::Integer(left), Native::Integer(right)) => Some(left.cmp(right)),
            (Native::Decimal(left), Native::Decimal(right)) => Some(left.cmp(right)),
            (Native::Character(left), Native::Character(right)) => Some(left.cmp(right)),
            (Native::String(left), Native::String(right)) => Some(left.cmp(right)),
            _ => None,
        }
    }
}

/// Structural equality. Decimals are equal only with the same digits and
/// scale, so `1.0 != 1.00`.
impl PartialEq for Native {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Native::Nil, Native::Nil) => true,
            (Native::Boolean(left), Native::Boolean(right)) => left == right,
            (Native::Integer(left), Native::Integer(right)) => left == right,
            (Native::Decimal(left), Native::Decimal(right)) => {
                left.as_bigint_and_exponent() == right.as_bigint_and_exponent()
            }
            (Native::Character(left), Native::Character(right)) => left == right,
            (Native::String(left), Native::String(right)) => left == right,
            (Native::Sequence(left), Native::Sequence(right)) => left == right,
            _ => false,
        }
    }
}

impl Display for Native {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Native::Nil => write!(f, "nil"),
            Native::Boolean(value) => write!(f, "{}", value),
            Native::Integer(value) => write!(f, "{}", value),
            Native::Decimal(value) => write!(f, "{}", value),
            Native::Character(value) => write!(f, "{}", value),
            Native::String(value) => write!(f, "{}", value),
            Native::Sequence(values) => {
                write!(f, "[")?;
                for (index, value) in values.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", value.native)?;
                }
                write!(f, "]")
            }
        }
    }
}

/// A runtime value: its type, its native datum and, for values of supplied
/// object types, the scope holding its fields and methods.
///
/// Equality is structural over the native datum.
#[derive(Debug, Clone)]
pub struct Value {
    ty: TypeId,
    native: Native,
    members: Option<ScopeId>,
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.native == other.native
    }
}

impl Value {
    /// Wraps a native datum, tagging it with the built-in type of its class.
    pub fn new(registry: &TypeRegistry, native: Native) -> Self {
        let builtins = registry.builtins();
        let ty = match &native {
            Native::Nil => builtins.nil,
            Native::Boolean(_) => builtins.boolean,
            Native::Integer(_) => builtins.integer,
            Native::Decimal(_) => builtins.decimal,
            Native::Character(_) => builtins.character,
            Native::String(_) => builtins.string,
            Native::Sequence(_) => builtins.integer_iterable,
        };
        Value {
            ty,
            native,
            members: None,
        }
    }

    /// A value of a supplied object type. Its fields and methods live in
    /// `members`, a scope of the interpreter that created it.
    pub fn object(ty: TypeId, native: Native, members: ScopeId) -> Self {
        Value {
            ty,
            native,
            members: Some(members),
        }
    }

    pub fn nil(registry: &TypeRegistry) -> Self {
        Value::new(registry, Native::Nil)
    }

    pub fn boolean(registry: &TypeRegistry, value: bool) -> Self {
        Value::new(registry, Native::Boolean(value))
    }

    pub fn integer(registry: &TypeRegistry, value: impl Into<BigInt>) -> Self {
        Value::new(registry, Native::Integer(value.into()))
    }

    pub fn decimal(registry: &TypeRegistry, value: BigDecimal) -> Self {
        Value::new(registry, Native::Decimal(value))
    }

    pub fn character(registry: &TypeRegistry, value: char) -> Self {
        Value::new(registry, Native::Character(value))
    }

    pub fn string(registry: &TypeRegistry, value: impl Into<String>) -> Self {
        Value::new(registry, Native::String(value.into()))
    }

    pub fn sequence(registry: &TypeRegistry, values: Vec<Value>) -> Self {
        Value::new(registry, Native::Sequence(values))
    }

    pub fn get_type(&self) -> TypeId {
        self.ty
    }

    pub fn native(&self) -> &Native {
        &self.native
    }

    pub fn members(&self) -> Option<ScopeId> {
        self.members
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.native)
    }
}
