use num_traits::ToPrimitive;
use tracing::{debug, instrument, trace};

use crate::{
    ast::{
        ast::{Field, Method, Source},
        expressions::{BinaryOp, Expr, Literal},
        statements::Stmt,
    },
    environment::{
        scope::{ScopeArena, ScopeId},
        types::{Function, TypeId, TypeRegistry, Variable},
    },
    errors::errors::{Error, ErrorImpl},
};

use super::typed_ast::{TypedExpr, TypedField, TypedMethod, TypedSource, TypedStmt};

/// State of one analysis pass.
///
/// Holds the static scope tree, the scope currently being visited and the
/// declared return type of the enclosing method, if any.
#[derive(Debug)]
pub struct TypeChecker<'a> {
    pub registry: &'a TypeRegistry,
    scopes: ScopeArena<Variable, Function>,
    global: ScopeId,
    current: ScopeId,
    return_type: Option<TypeId>,
}

impl<'a> TypeChecker<'a> {
    pub fn new(registry: &'a TypeRegistry) -> Self {
        let mut scopes = ScopeArena::new();
        let global = scopes.enter(None);
        let builtins = registry.builtins();
        scopes.bind_function(
            global,
            "print",
            1,
            Function::new("print", "System.out.println", vec![builtins.any], builtins.nil),
        );

        TypeChecker {
            registry,
            scopes,
            global,
            current: global,
            return_type: None,
        }
    }

    /// Binds a global variable visible to the checked program.
    pub fn define_variable(&mut self, variable: Variable) -> Result<(), Error> {
        let name = variable.name.clone();
        self.scopes.define_variable(self.global, &name, variable)
    }

    /// Binds a global function visible to the checked program.
    pub fn define_function(&mut self, function: Function) -> Result<(), Error> {
        let name = function.name.clone();
        self.scopes
            .define_function(self.global, &name, function.arity(), function)
    }

    pub fn lookup_variable(&self, name: &str) -> Result<&Variable, Error> {
        self.scopes.lookup_variable(self.current, name)
    }

    pub fn lookup_function(&self, name: &str, arity: usize) -> Result<&Function, Error> {
        self.scopes.lookup_function(self.current, name, arity)
    }

    /// Runs `body` in a fresh child of the current scope.
    fn with_scope<T>(&mut self, body: impl FnOnce(&mut Self) -> Result<T, Error>) -> Result<T, Error> {
        let previous = self.current;
        let scope = self.scopes.enter(Some(previous));
        self.current = scope;
        let result = body(self);
        self.scopes.exit(scope);
        self.current = previous;
        result
    }

    #[instrument(level = "debug", skip_all)]
    pub fn check_source(&mut self, source: &Source) -> Result<TypedSource, Error> {
        require_entry_point(self.registry, source)?;

        let mut fields = Vec::with_capacity(source.fields.len());
        for field in &source.fields {
            fields.push(type_check_field(self, field)?);
        }

        let mut methods = Vec::with_capacity(source.methods.len());
        for method in &source.methods {
            methods.push(type_check_method(self, method)?);
        }

        Ok(TypedSource { fields, methods })
    }
}

/// Analyzes a whole program against `registry`.
pub fn type_check(registry: &TypeRegistry, source: Source) -> Result<TypedSource, Error> {
    TypeChecker::new(registry).check_source(&source)
}

fn require_entry_point(registry: &TypeRegistry, source: &Source) -> Result<(), Error> {
    let integer = registry.builtins().integer;
    let found = source.methods.iter().any(|method| {
        method.name == "main"
            && method.parameters.is_empty()
            && method
                .return_type_name
                .as_deref()
                .and_then(|name| registry.get_type(name).ok())
                == Some(integer)
    });

    if found {
        Ok(())
    } else {
        Err(Error::new(ErrorImpl::MissingEntryPoint))
    }
}

pub fn type_check_field(type_checker: &mut TypeChecker, field: &Field) -> Result<TypedField, Error> {
    let (variable, value) = type_check_declaration(
        type_checker,
        &field.name,
        field.type_name.as_deref(),
        field.value.as_ref(),
    )?;
    Ok(TypedField { variable, value })
}

fn type_check_declaration(
    type_checker: &mut TypeChecker,
    name: &str,
    type_name: Option<&str>,
    value: Option<&Expr>,
) -> Result<(Variable, Option<TypedExpr>), Error> {
    let declared = type_name
        .map(|type_name| type_checker.registry.get_type(type_name))
        .transpose()?;
    let value = value
        .map(|value| type_check_expr(type_checker, value))
        .transpose()?;

    let ty = match (declared, &value) {
        (Some(declared), Some(value)) => {
            type_checker.registry.require_assignable(declared, value.ty)?;
            declared
        }
        (Some(declared), None) => declared,
        (None, Some(value)) => value.ty,
        (None, None) => {
            return Err(Error::new(ErrorImpl::ExpectedExplicitValue {
                variable: name.to_string(),
            }))
        }
    };

    let variable = Variable::new(name, name, ty);
    type_checker
        .scopes
        .define_variable(type_checker.current, name, variable.clone())?;
    trace!(name, ty = %type_checker.registry.name_of(ty), "declared variable");
    Ok((variable, value))
}

pub fn type_check_method(type_checker: &mut TypeChecker, method: &Method) -> Result<TypedMethod, Error> {
    if method.parameters.len() != method.parameter_type_names.len() {
        return Err(Error::new(ErrorImpl::ArityMismatch {
            function: method.name.clone(),
            expected: vec![method.parameter_type_names.len()],
            received: method.parameters.len(),
        }));
    }

    let registry = type_checker.registry;
    let parameter_types = method
        .parameter_type_names
        .iter()
        .map(|type_name| registry.get_type(type_name))
        .collect::<Result<Vec<_>, _>>()?;
    let return_type = match &method.return_type_name {
        Some(type_name) => registry.get_type(type_name)?,
        None => registry.builtins().nil,
    };

    // Defined before the body is visited so the method may call itself.
    let function = Function::new(&method.name, &method.name, parameter_types.clone(), return_type);
    type_checker.scopes.define_function(
        type_checker.current,
        &method.name,
        function.arity(),
        function.clone(),
    )?;
    debug!(name = %method.name, arity = function.arity(), "defined method");

    let enclosing = type_checker.return_type.replace(return_type);
    let statements = type_checker.with_scope(|type_checker| {
        for (name, ty) in method.parameters.iter().zip(&parameter_types) {
            type_checker
                .scopes
                .define_variable(type_checker.current, name, Variable::new(name, name, *ty))?;
        }
        type_check_block(type_checker, &method.statements)
    });
    type_checker.return_type = enclosing;

    Ok(TypedMethod {
        parameters: method.parameters.clone(),
        statements: statements?,
        function,
    })
}

fn type_check_block(type_checker: &mut TypeChecker, statements: &[Stmt]) -> Result<Vec<TypedStmt>, Error> {
    statements
        .iter()
        .map(|statement| type_check_stmt(type_checker, statement))
        .collect()
}

fn type_check_scoped_block(type_checker: &mut TypeChecker, statements: &[Stmt]) -> Result<Vec<TypedStmt>, Error> {
    type_checker.with_scope(|type_checker| type_check_block(type_checker, statements))
}

fn require_non_empty(statements: &[Stmt], construct: &str) -> Result<(), Error> {
    if statements.is_empty() {
        Err(Error::new(ErrorImpl::InvalidStatement {
            message: format!("{} body must not be empty", construct),
        }))
    } else {
        Ok(())
    }
}

pub fn type_check_stmt(type_checker: &mut TypeChecker, statement: &Stmt) -> Result<TypedStmt, Error> {
    let registry = type_checker.registry;
    let builtins = registry.builtins();

    match statement {
        Stmt::Expression(expression) => {
            if !matches!(expression, Expr::Call { .. }) {
                return Err(Error::new(ErrorImpl::InvalidStatement {
                    message: String::from("only calls may be used as statements"),
                }));
            }
            Ok(TypedStmt::Expression(type_check_expr(type_checker, expression)?))
        }
        Stmt::Declaration {
            name,
            type_name,
            value,
        } => {
            let (variable, value) =
                type_check_declaration(type_checker, name, type_name.as_deref(), value.as_ref())?;
            Ok(TypedStmt::Declaration { variable, value })
        }
        Stmt::Assignment { receiver, value } => {
            if !matches!(receiver, Expr::Access { .. }) {
                return Err(Error::new(ErrorImpl::InvalidStatement {
                    message: String::from("only variables and fields may be assigned"),
                }));
            }
            let receiver = type_check_expr(type_checker, receiver)?;
            let value = type_check_expr(type_checker, value)?;
            registry.require_assignable(receiver.ty, value.ty)?;
            Ok(TypedStmt::Assignment { receiver, value })
        }
        Stmt::If {
            condition,
            then_statements,
            else_statements,
        } => {
            let condition = type_check_expr(type_checker, condition)?;
            registry.require_assignable(builtins.boolean, condition.ty)?;
            require_non_empty(then_statements, "if")?;

            Ok(TypedStmt::If {
                condition,
                then_statements: type_check_scoped_block(type_checker, then_statements)?,
                else_statements: type_check_scoped_block(type_checker, else_statements)?,
            })
        }
        Stmt::For {
            name,
            value,
            statements,
        } => {
            let value = type_check_expr(type_checker, value)?;
            registry.require_assignable(builtins.integer_iterable, value.ty)?;
            require_non_empty(statements, "for")?;

            let variable = Variable::new(name, name, builtins.integer);
            let statements = type_checker.with_scope(|type_checker| {
                type_checker
                    .scopes
                    .define_variable(type_checker.current, name, variable.clone())?;
                type_check_block(type_checker, statements)
            })?;
            Ok(TypedStmt::For {
                variable,
                value,
                statements,
            })
        }
        Stmt::While {
            condition,
            statements,
        } => {
            let condition = type_check_expr(type_checker, condition)?;
            registry.require_assignable(builtins.boolean, condition.ty)?;
            Ok(TypedStmt::While {
                condition,
                statements: type_check_scoped_block(type_checker, statements)?,
            })
        }
        Stmt::Return(value) => {
            let expected = type_checker.return_type.ok_or_else(|| {
                Error::new(ErrorImpl::InvalidStatement {
                    message: String::from("return outside of a method"),
                })
            })?;
            let value = type_check_expr(type_checker, value)?;
            if value.ty != expected {
                return Err(Error::new(ErrorImpl::TypeMatchError {
                    expected: registry.name_of(expected),
                    received: registry.name_of(value.ty),
                }));
            }
            Ok(TypedStmt::Return(value))
        }
    }
}

fn type_check_literal(registry: &TypeRegistry, literal: &Literal) -> Result<TypeId, Error> {
    let builtins = registry.builtins();
    match literal {
        Literal::Nil => Ok(builtins.nil),
        Literal::Boolean(_) => Ok(builtins.boolean),
        Literal::Character(_) => Ok(builtins.character),
        Literal::String(_) => Ok(builtins.string),
        Literal::Integer(value) => match value.to_i32() {
            Some(_) => Ok(builtins.integer),
            None => Err(Error::new(ErrorImpl::IntegerOverflow {
                literal: value.to_string(),
            })),
        },
        Literal::Decimal(value) => match value.to_f64() {
            Some(double) if double.is_finite() => Ok(builtins.decimal),
            _ => Err(Error::new(ErrorImpl::DecimalOverflow {
                literal: value.to_string(),
            })),
        },
    }
}

pub fn type_check_expr(type_checker: &mut TypeChecker, expression: &Expr) -> Result<TypedExpr, Error> {
    let registry = type_checker.registry;

    match expression {
        Expr::Literal(literal) => Ok(TypedExpr::literal(
            literal.clone(),
            type_check_literal(registry, literal)?,
        )),
        Expr::Group(inner) => {
            if !matches!(inner.as_ref(), Expr::Binary { .. }) {
                return Err(Error::new(ErrorImpl::InvalidExpression {
                    message: String::from("only binary expressions may be grouped"),
                }));
            }
            Ok(TypedExpr::group(type_check_expr(type_checker, inner)?))
        }
        Expr::Binary {
            operator,
            left,
            right,
        } => {
            let left = type_check_expr(type_checker, left)?;
            let right = type_check_expr(type_checker, right)?;
            let ty = type_check_binary(registry, *operator, &left, &right)?;
            Ok(TypedExpr::binary(*operator, left, right, ty))
        }
        Expr::Access { receiver, name } => match receiver {
            Some(receiver) => {
                let receiver = type_check_expr(type_checker, receiver)?;
                let variable = registry.get_field(receiver.ty, name)?.clone();
                Ok(TypedExpr::access(Some(receiver), variable))
            }
            None => {
                let variable = type_checker.lookup_variable(name)?.clone();
                Ok(TypedExpr::access(None, variable))
            }
        },
        Expr::Call {
            receiver,
            name,
            arguments,
        } => {
            let receiver = receiver
                .as_ref()
                .map(|receiver| type_check_expr(type_checker, receiver))
                .transpose()?;
            let arguments = arguments
                .iter()
                .map(|argument| type_check_expr(type_checker, argument))
                .collect::<Result<Vec<_>, _>>()?;

            let (function, skipped) = match &receiver {
                Some(receiver) => (registry.get_method(receiver.ty, name, arguments.len())?, 1),
                None => (type_checker.lookup_function(name, arguments.len())?, 0),
            };
            for (argument, parameter) in arguments.iter().zip(&function.parameter_types[skipped..]) {
                registry.require_assignable(*parameter, argument.ty)?;
            }

            let function = function.clone();
            Ok(TypedExpr::call(receiver, arguments, function))
        }
    }
}

fn operand_error(registry: &TypeRegistry, operator: BinaryOp, ty: TypeId) -> Error {
    Error::new(ErrorImpl::OperandTypeError {
        operator: operator.to_string(),
        received: registry.name_of(ty),
    })
}

fn type_check_binary(
    registry: &TypeRegistry,
    operator: BinaryOp,
    left: &TypedExpr,
    right: &TypedExpr,
) -> Result<TypeId, Error> {
    let builtins = registry.builtins();

    if operator.is_logical() {
        registry.require_assignable(builtins.boolean, left.ty)?;
        registry.require_assignable(builtins.boolean, right.ty)?;
        return Ok(builtins.boolean);
    }

    if operator.is_relational() {
        registry.require_assignable(builtins.comparable, left.ty)?;
        registry.require_assignable(builtins.comparable, right.ty)?;
        if left.ty != right.ty {
            return Err(Error::new(ErrorImpl::TypeMatchError {
                expected: registry.name_of(left.ty),
                received: registry.name_of(right.ty),
            }));
        }
        return Ok(builtins.boolean);
    }

    if operator == BinaryOp::Add && (left.ty == builtins.string || right.ty == builtins.string) {
        return Ok(builtins.string);
    }

    if !builtins.is_numeric(left.ty) {
        return Err(operand_error(registry, operator, left.ty));
    }
    if right.ty != left.ty {
        return Err(Error::new(ErrorImpl::TypeMatchError {
            expected: registry.name_of(left.ty),
            received: registry.name_of(right.ty),
        }));
    }
    Ok(left.ty)
}
