use super::expressions::Expr;

/// Statements as produced by the parser.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// Only calls are valid expression statements.
    Expression(Expr),
    Declaration {
        name: String,
        type_name: Option<String>,
        value: Option<Expr>,
    },
    Assignment {
        receiver: Expr,
        value: Expr,
    },
    If {
        condition: Expr,
        then_statements: Vec<Stmt>,
        else_statements: Vec<Stmt>,
    },
    For {
        name: String,
        value: Expr,
        statements: Vec<Stmt>,
    },
    While {
        condition: Expr,
        statements: Vec<Stmt>,
    },
    Return(Expr),
}

impl Stmt {
    pub fn declaration(name: &str, type_name: Option<&str>, value: Option<Expr>) -> Self {
        Stmt::Declaration {
            name: name.to_string(),
            type_name: type_name.map(String::from),
            value,
        }
    }

    pub fn assignment(receiver: Expr, value: Expr) -> Self {
        Stmt::Assignment { receiver, value }
    }

    pub fn if_else(condition: Expr, then_statements: Vec<Stmt>, else_statements: Vec<Stmt>) -> Self {
        Stmt::If {
            condition,
            then_statements,
            else_statements,
        }
    }

    pub fn for_each(name: &str, value: Expr, statements: Vec<Stmt>) -> Self {
        Stmt::For {
            name: name.to_string(),
            value,
            statements,
        }
    }

    pub fn while_loop(condition: Expr, statements: Vec<Stmt>) -> Self {
        Stmt::While {
            condition,
            statements,
        }
    }
}
