//! Typed Abstract Syntax Tree definitions.
//!
//! The typed AST mirrors the untyped AST, except that every expression
//! carries its resolved type and every declaration, access and call carries
//! the variable or function it resolved to. The annotations are required
//! fields, so a typed node cannot exist without them.
//!
//! The typed AST is consumed by both the interpreter and the generator.

use crate::{
    ast::expressions::{BinaryOp, Literal},
    environment::types::{Function, TypeId, Variable},
};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TypedSource {
    pub fields: Vec<TypedField>,
    pub methods: Vec<TypedMethod>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypedField {
    pub variable: Variable,
    pub value: Option<TypedExpr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypedMethod {
    /// Parameter names, parallel to `function.parameter_types`.
    pub parameters: Vec<String>,
    pub statements: Vec<TypedStmt>,
    pub function: Function,
}

impl TypedMethod {
    pub fn name(&self) -> &str {
        &self.function.name
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypedStmt {
    Expression(TypedExpr),
    Declaration {
        variable: Variable,
        value: Option<TypedExpr>,
    },
    Assignment {
        receiver: TypedExpr,
        value: TypedExpr,
    },
    If {
        condition: TypedExpr,
        then_statements: Vec<TypedStmt>,
        else_statements: Vec<TypedStmt>,
    },
    For {
        variable: Variable,
        value: TypedExpr,
        statements: Vec<TypedStmt>,
    },
    While {
        condition: TypedExpr,
        statements: Vec<TypedStmt>,
    },
    Return(TypedExpr),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypedExpr {
    pub kind: TypedExprKind,
    pub ty: TypeId,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypedExprKind {
    Literal(Literal),
    Group(Box<TypedExpr>),
    Binary {
        operator: BinaryOp,
        left: Box<TypedExpr>,
        right: Box<TypedExpr>,
    },
    Access {
        receiver: Option<Box<TypedExpr>>,
        variable: Variable,
    },
    Call {
        receiver: Option<Box<TypedExpr>>,
        arguments: Vec<TypedExpr>,
        function: Function,
    },
}

impl TypedExpr {
    pub fn new(kind: TypedExprKind, ty: TypeId) -> Self {
        TypedExpr { kind, ty }
    }

    pub fn literal(literal: impl Into<Literal>, ty: TypeId) -> Self {
        TypedExpr::new(TypedExprKind::Literal(literal.into()), ty)
    }

    pub fn group(expression: TypedExpr) -> Self {
        let ty = expression.ty;
        TypedExpr::new(TypedExprKind::Group(Box::new(expression)), ty)
    }

    pub fn binary(operator: BinaryOp, left: TypedExpr, right: TypedExpr, ty: TypeId) -> Self {
        TypedExpr::new(
            TypedExprKind::Binary {
                operator,
                left: Box::new(left),
                right: Box::new(right),
            },
            ty,
        )
    }

    /// Access typed by the variable it resolved to.
    pub fn access(receiver: Option<TypedExpr>, variable: Variable) -> Self {
        let ty = variable.ty;
        TypedExpr::new(
            TypedExprKind::Access {
                receiver: receiver.map(Box::new),
                variable,
            },
            ty,
        )
    }

    /// Call typed by the return type of the function it resolved to.
    pub fn call(receiver: Option<TypedExpr>, arguments: Vec<TypedExpr>, function: Function) -> Self {
        let ty = function.return_type;
        TypedExpr::new(
            TypedExprKind::Call {
                receiver: receiver.map(Box::new),
                arguments,
                function,
            },
            ty,
        )
    }
}
