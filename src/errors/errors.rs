use std::fmt::Display;

use thiserror::Error;

/// An error raised by any pass over a program.
///
/// Every pass fails fast, so a pass yields at most one of these.
#[derive(Error, Debug, Clone)]
#[error("{internal_error}")]
pub struct Error {
    internal_error: ErrorImpl,
}

impl Error {
    pub fn new(error_impl: ErrorImpl) -> Self {
        Error {
            internal_error: error_impl,
        }
    }

    pub fn get_internal_error(&self) -> &ErrorImpl {
        &self.internal_error
    }

    /// Returns the taxonomy class of the error.
    pub fn get_error_name(&self) -> &str {
        match &self.internal_error {
            ErrorImpl::DuplicateType { .. } | ErrorImpl::InvalidTypeName { .. } => {
                "ConfigurationError"
            }
            ErrorImpl::VariableAlreadyDeclared { .. }
            | ErrorImpl::FunctionAlreadyDeclared { .. } => "DuplicateDefinitionError",
            ErrorImpl::VariableNotDeclared { .. }
            | ErrorImpl::FunctionNotDeclared { .. }
            | ErrorImpl::UnknownType { .. } => "UnknownSymbolError",
            ErrorImpl::TypeMatchError { .. }
            | ErrorImpl::OperandTypeError { .. }
            | ErrorImpl::ExpectedExplicitValue { .. }
            | ErrorImpl::InvalidStatement { .. }
            | ErrorImpl::InvalidExpression { .. } => "TypeMismatchError",
            ErrorImpl::IntegerOverflow { .. } | ErrorImpl::DecimalOverflow { .. } => {
                "OverflowError"
            }
            ErrorImpl::ArityMismatch { .. } => "ArityError",
            ErrorImpl::DivisionByZero => "DivisionByZeroError",
            ErrorImpl::MissingEntryPoint => "MissingEntryPointError",
            ErrorImpl::InternalConsistency { .. } => "InternalConsistencyError",
            ErrorImpl::IndexOutOfBounds { .. } => "IndexOutOfBoundsError",
            ErrorImpl::Output { .. } => "OutputError",
        }
    }

    pub fn get_tip(&self) -> ErrorTip {
        match &self.internal_error {
            ErrorImpl::DuplicateType { type_ } => {
                ErrorTip::Suggestion(format!("Type `{}` is registered twice", type_))
            }
            ErrorImpl::InvalidTypeName { .. } => ErrorTip::Suggestion(String::from(
                "Type names must start with a letter or underscore",
            )),
            ErrorImpl::VariableAlreadyDeclared { variable } => {
                ErrorTip::Suggestion(format!("Variable `{}` already declared", variable))
            }
            ErrorImpl::FunctionAlreadyDeclared { function, arity } => ErrorTip::Suggestion(
                format!("Function `{}/{}` already declared", function, arity),
            ),
            ErrorImpl::VariableNotDeclared { variable } => {
                ErrorTip::Suggestion(format!("Variable `{}` not declared", variable))
            }
            ErrorImpl::FunctionNotDeclared { function, arity } => {
                ErrorTip::Suggestion(format!("Function `{}/{}` not declared", function, arity))
            }
            ErrorImpl::UnknownType { type_ } => {
                ErrorTip::Suggestion(format!("Unknown type `{}` found", type_))
            }
            ErrorImpl::TypeMatchError { expected, received } => ErrorTip::Suggestion(format!(
                "Expected type `{}`, received `{}`",
                expected, received
            )),
            ErrorImpl::OperandTypeError { operator, .. } => ErrorTip::Suggestion(format!(
                "Check the operand types of `{}`",
                operator
            )),
            ErrorImpl::ExpectedExplicitValue { .. } => ErrorTip::Suggestion(String::from(
                "Expected explicit value when no type is given",
            )),
            ErrorImpl::InvalidStatement { .. } | ErrorImpl::InvalidExpression { .. } => {
                ErrorTip::None
            }
            ErrorImpl::IntegerOverflow { .. } => ErrorTip::Suggestion(String::from(
                "Integer literals must fit in 32 bits",
            )),
            ErrorImpl::DecimalOverflow { .. } => ErrorTip::Suggestion(String::from(
                "Decimal literals must fit in a finite double",
            )),
            ErrorImpl::ArityMismatch {
                function,
                expected,
                received,
            } => ErrorTip::Suggestion(format!(
                "`{}` takes {:?} arguments, received {}",
                function, expected, received
            )),
            ErrorImpl::DivisionByZero => ErrorTip::None,
            ErrorImpl::MissingEntryPoint => ErrorTip::Suggestion(String::from(
                "Declare `DEF main(): Integer`",
            )),
            ErrorImpl::InternalConsistency { .. } => ErrorTip::None,
            ErrorImpl::IndexOutOfBounds { .. } => ErrorTip::None,
            ErrorImpl::Output { .. } => ErrorTip::None,
        }
    }
}

impl From<ErrorImpl> for Error {
    fn from(error_impl: ErrorImpl) -> Self {
        Error::new(error_impl)
    }
}

pub enum ErrorTip {
    None,
    Suggestion(String),
}

impl Display for ErrorTip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorTip::None => write!(f, ""),
            ErrorTip::Suggestion(suggestion) => write!(f, "{}", suggestion),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ErrorImpl {
    #[error("duplicate registration of type {type_:?}")]
    DuplicateType { type_: String },
    #[error("invalid type name {type_:?}")]
    InvalidTypeName { type_: String },
    #[error("variable {variable:?} already declared")]
    VariableAlreadyDeclared { variable: String },
    #[error("function {function:?}/{arity} already declared")]
    FunctionAlreadyDeclared { function: String, arity: usize },
    #[error("variable {variable:?} not declared")]
    VariableNotDeclared { variable: String },
    #[error("function {function:?}/{arity} not declared")]
    FunctionNotDeclared { function: String, arity: usize },
    #[error("unknown type {type_}")]
    UnknownType { type_: String },
    #[error("types do not match: expected {expected:?}, received {received:?}")]
    TypeMatchError { expected: String, received: String },
    #[error("invalid operand for {operator:?}: {received:?}")]
    OperandTypeError { operator: String, received: String },
    #[error("expected explicit type or value for {variable:?}")]
    ExpectedExplicitValue { variable: String },
    #[error("invalid statement: {message}")]
    InvalidStatement { message: String },
    #[error("invalid expression: {message}")]
    InvalidExpression { message: String },
    #[error("integer literal {literal} does not fit in 32 bits")]
    IntegerOverflow { literal: String },
    #[error("decimal literal {literal} is out of the representable range")]
    DecimalOverflow { literal: String },
    #[error("no overload of {function:?} takes {received} arguments (available: {expected:?})")]
    ArityMismatch {
        function: String,
        expected: Vec<usize>,
        received: usize,
    },
    #[error("division by zero")]
    DivisionByZero,
    #[error("missing entry point: expected a zero-argument `main` returning Integer")]
    MissingEntryPoint,
    #[error("internal consistency violation: {message}")]
    InternalConsistency { message: String },
    #[error("index out of bounds: {start}..{end} of length {length}")]
    IndexOutOfBounds {
        start: String,
        end: String,
        length: usize,
    },
    #[error("failed to write output: {message}")]
    Output { message: String },
}
