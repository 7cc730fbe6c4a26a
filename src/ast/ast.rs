use super::{expressions::Expr, statements::Stmt};

/// Source
///
/// The root of a program: global fields followed by methods.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Source {
    pub fields: Vec<Field>,
    pub methods: Vec<Method>,
}

impl Source {
    pub fn new(fields: Vec<Field>, methods: Vec<Method>) -> Self {
        Source { fields, methods }
    }
}

/// Field
///
/// A global variable. At least one of `type_name` and `value` must be given.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub type_name: Option<String>,
    pub value: Option<Expr>,
}

impl Field {
    pub fn new(name: &str, type_name: Option<&str>, value: Option<Expr>) -> Self {
        Field {
            name: name.to_string(),
            type_name: type_name.map(String::from),
            value,
        }
    }
}

/// Method
///
/// A named function. `parameters` and `parameter_type_names` are parallel lists.
#[derive(Debug, Clone, PartialEq)]
pub struct Method {
    pub name: String,
    pub parameters: Vec<String>,
    pub parameter_type_names: Vec<String>,
    pub return_type_name: Option<String>,
    pub statements: Vec<Stmt>,
}

impl Method {
    pub fn new(
        name: &str,
        parameters: &[(&str, &str)],
        return_type_name: Option<&str>,
        statements: Vec<Stmt>,
    ) -> Self {
        Method {
            name: name.to_string(),
            parameters: parameters.iter().map(|(name, _)| name.to_string()).collect(),
            parameter_type_names: parameters.iter().map(|(_, ty)| ty.to_string()).collect(),
            return_type_name: return_type_name.map(String::from),
            statements,
        }
    }
}
