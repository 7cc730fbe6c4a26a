use std::{cell::RefCell, fmt::Debug, io::Write, rc::Rc};

use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{pow, Signed, Zero};
use tracing::{debug, instrument, trace};

use crate::{
    ast::expressions::{BinaryOp, Literal},
    environment::{
        scope::{ScopeArena, ScopeId},
        types::{NativeFn, TypeId, TypeRegistry},
        value::{Native, Value},
    },
    errors::errors::{Error, ErrorImpl},
    type_checker::typed_ast::{TypedExpr, TypedExprKind, TypedMethod, TypedSource, TypedStmt},
};

/// Sink written to by `print`.
pub type Output = Rc<RefCell<dyn Write>>;

/// Runtime body of a function.
#[derive(Clone)]
pub enum Callable {
    Native(NativeFn),
    /// A method of the program, closed over the scope it was defined in.
    Method {
        method: Rc<TypedMethod>,
        closure: ScopeId,
    },
}

impl Debug for Callable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Callable::Native(_) => write!(f, "Native"),
            Callable::Method { method, closure } => f
                .debug_struct("Method")
                .field("name", &method.name())
                .field("closure", closure)
                .finish(),
        }
    }
}

/// How a statement completed.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    Normal,
    Return(Value),
}

/// Tree-walking evaluator over the typed AST.
pub struct Interpreter<'a> {
    registry: &'a TypeRegistry,
    scopes: ScopeArena<Value, Callable>,
    global: ScopeId,
    current: ScopeId,
}

fn print_function(output: Output) -> Callable {
    Callable::Native(Rc::new(move |registry: &TypeRegistry, arguments: &[Value]| -> Result<Value, Error> {
        let value = arguments.first().ok_or_else(|| {
            Error::new(ErrorImpl::ArityMismatch {
                function: String::from("print"),
                expected: vec![1],
                received: 0,
            })
        })?;
        writeln!(output.borrow_mut(), "{}", value).map_err(|error| {
            Error::new(ErrorImpl::Output {
                message: error.to_string(),
            })
        })?;
        Ok(Value::nil(registry))
    }))
}

impl<'a> Interpreter<'a> {
    /// Creates an interpreter whose `print` writes to stdout.
    pub fn new(registry: &'a TypeRegistry) -> Self {
        let mut scopes = ScopeArena::new();
        let global = scopes.enter(None);
        let stdout: Output = Rc::new(RefCell::new(std::io::stdout()));
        scopes.bind_function(global, "print", 1, print_function(stdout));

        Interpreter {
            registry,
            scopes,
            global,
            current: global,
        }
    }

    /// Redirects `print` to `output`.
    pub fn with_output(mut self, output: Output) -> Self {
        self.scopes
            .bind_function(self.global, "print", 1, print_function(output));
        self
    }

    pub fn define_variable(&mut self, name: &str, value: Value) -> Result<(), Error> {
        self.scopes.define_variable(self.global, name, value)
    }

    pub fn define_function(&mut self, name: &str, arity: usize, body: NativeFn) -> Result<(), Error> {
        self.scopes
            .define_function(self.global, name, arity, Callable::Native(body))
    }

    pub fn lookup_variable(&self, name: &str) -> Result<&Value, Error> {
        self.scopes.lookup_variable(self.current, name)
    }

    /// Creates a value of a supplied object type with an empty member scope.
    ///
    /// Objects must be created before `run`, and their members defined with
    /// `define_member_variable` and `define_member_function`.
    pub fn create_object(&mut self, ty: TypeId, native: Native) -> Value {
        let members = self.scopes.enter(None);
        Value::object(ty, native, members)
    }

    pub fn define_member_variable(&mut self, object: &Value, name: &str, value: Value) -> Result<(), Error> {
        let members = member_scope(object, name)?;
        self.scopes.define_variable(members, name, value)
    }

    /// Defines a method taking `arity` explicit arguments. `body` receives the
    /// receiver first.
    pub fn define_member_function(
        &mut self,
        object: &Value,
        name: &str,
        arity: usize,
        body: NativeFn,
    ) -> Result<(), Error> {
        let members = member_scope(object, name)?;
        self.scopes
            .define_function(members, name, arity + 1, Callable::Native(body))
    }

    /// Defines the fields and methods of `source` and evaluates `main()`.
    #[instrument(level = "debug", skip_all)]
    pub fn run(&mut self, source: &TypedSource) -> Result<Value, Error> {
        for field in &source.fields {
            let value = match &field.value {
                Some(value) => self.evaluate(value)?,
                None => Value::nil(self.registry),
            };
            self.scopes
                .define_variable(self.global, &field.variable.name, value)?;
        }

        for method in &source.methods {
            let callable = Callable::Method {
                method: Rc::new(method.clone()),
                closure: self.global,
            };
            self.scopes
                .define_function(self.global, method.name(), method.parameters.len(), callable)?;
            debug!(name = method.name(), "defined method");
        }

        let main = self.scopes.lookup_function(self.global, "main", 0)?.clone();
        self.invoke(&main, vec![])
    }

    /// Runs `body` in a fresh child of `parent`, restoring the current scope
    /// afterwards.
    fn with_scope<T>(
        &mut self,
        parent: ScopeId,
        body: impl FnOnce(&mut Self) -> Result<T, Error>,
    ) -> Result<T, Error> {
        let previous = self.current;
        let scope = self.scopes.enter(Some(parent));
        self.current = scope;
        let result = body(self);
        self.scopes.exit(scope);
        self.current = previous;
        result
    }

    fn invoke(&mut self, callable: &Callable, arguments: Vec<Value>) -> Result<Value, Error> {
        match callable {
            Callable::Native(body) => body(self.registry, &arguments),
            Callable::Method { method, closure } => {
                if method.parameters.len() != arguments.len() {
                    return Err(Error::new(ErrorImpl::ArityMismatch {
                        function: method.name().to_string(),
                        expected: vec![method.parameters.len()],
                        received: arguments.len(),
                    }));
                }
                trace!(name = method.name(), "call");

                let method = Rc::clone(method);
                self.with_scope(*closure, |interpreter| {
                    for (name, value) in method.parameters.iter().zip(arguments) {
                        interpreter
                            .scopes
                            .define_variable(interpreter.current, name, value)?;
                    }
                    match interpreter.execute_block(&method.statements)? {
                        Flow::Return(value) => Ok(value),
                        Flow::Normal => Ok(Value::nil(interpreter.registry)),
                    }
                })
            }
        }
    }

    fn execute_block(&mut self, statements: &[TypedStmt]) -> Result<Flow, Error> {
        for statement in statements {
            if let Flow::Return(value) = self.execute(statement)? {
                return Ok(Flow::Return(value));
            }
        }
        Ok(Flow::Normal)
    }

    fn execute_scoped_block(&mut self, statements: &[TypedStmt]) -> Result<Flow, Error> {
        self.with_scope(self.current, |interpreter| interpreter.execute_block(statements))
    }

    pub fn execute(&mut self, statement: &TypedStmt) -> Result<Flow, Error> {
        match statement {
            TypedStmt::Expression(expression) => {
                self.evaluate(expression)?;
                Ok(Flow::Normal)
            }
            TypedStmt::Declaration { variable, value } => {
                let value = match value {
                    Some(value) => self.evaluate(value)?,
                    None => Value::nil(self.registry),
                };
                self.scopes
                    .define_variable(self.current, &variable.name, value)?;
                Ok(Flow::Normal)
            }
            TypedStmt::Assignment { receiver, value } => {
                self.assign(receiver, value)?;
                Ok(Flow::Normal)
            }
            TypedStmt::If {
                condition,
                then_statements,
                else_statements,
            } => {
                if require_boolean(&self.evaluate(condition)?)? {
                    self.execute_scoped_block(then_statements)
                } else {
                    self.execute_scoped_block(else_statements)
                }
            }
            TypedStmt::For {
                variable,
                value,
                statements,
            } => {
                let items = match self.evaluate(value)?.native() {
                    Native::Sequence(items) => items.clone(),
                    other => {
                        return Err(Error::new(ErrorImpl::TypeMatchError {
                            expected: String::from("sequence"),
                            received: other.class_name().to_string(),
                        }))
                    }
                };

                for item in items {
                    let flow = self.with_scope(self.current, |interpreter| {
                        interpreter
                            .scopes
                            .define_variable(interpreter.current, &variable.name, item)?;
                        interpreter.execute_block(statements)
                    })?;
                    if let Flow::Return(value) = flow {
                        return Ok(Flow::Return(value));
                    }
                }
                Ok(Flow::Normal)
            }
            TypedStmt::While {
                condition,
                statements,
            } => {
                while require_boolean(&self.evaluate(condition)?)? {
                    if let Flow::Return(value) = self.execute_scoped_block(statements)? {
                        return Ok(Flow::Return(value));
                    }
                }
                Ok(Flow::Normal)
            }
            TypedStmt::Return(value) => Ok(Flow::Return(self.evaluate(value)?)),
        }
    }

    fn assign(&mut self, receiver: &TypedExpr, value: &TypedExpr) -> Result<(), Error> {
        let TypedExprKind::Access {
            receiver: object,
            variable,
        } = &receiver.kind
        else {
            return Err(Error::new(ErrorImpl::InvalidStatement {
                message: String::from("only variables and fields may be assigned"),
            }));
        };

        match object {
            Some(object) => {
                let object = self.evaluate(object)?;
                let value = self.evaluate(value)?;
                let members = member_scope(&object, &variable.name)?;
                *self.scopes.lookup_variable_mut(members, &variable.name)? = value;
            }
            None => {
                let value = self.evaluate(value)?;
                *self
                    .scopes
                    .lookup_variable_mut(self.current, &variable.name)? = value;
            }
        }
        Ok(())
    }

    pub fn evaluate(&mut self, expression: &TypedExpr) -> Result<Value, Error> {
        match &expression.kind {
            TypedExprKind::Literal(literal) => Ok(self.literal(literal)),
            TypedExprKind::Group(inner) => self.evaluate(inner),
            TypedExprKind::Binary {
                operator,
                left,
                right,
            } => self.evaluate_binary(*operator, left, right),
            TypedExprKind::Access { receiver, variable } => match receiver {
                Some(receiver) => {
                    let receiver = self.evaluate(receiver)?;
                    self.read_field(&receiver, &variable.name)
                }
                None => Ok(self.lookup_variable(&variable.name)?.clone()),
            },
            TypedExprKind::Call {
                receiver,
                arguments,
                function,
            } => {
                let receiver = receiver
                    .as_ref()
                    .map(|receiver| self.evaluate(receiver))
                    .transpose()?;

                let mut values = Vec::with_capacity(arguments.len() + 1);
                if let Some(receiver) = &receiver {
                    values.push(receiver.clone());
                }
                for argument in arguments {
                    values.push(self.evaluate(argument)?);
                }

                let callable = match &receiver {
                    Some(receiver) => self.resolve_method(receiver, &function.name, arguments.len())?,
                    None => self
                        .scopes
                        .lookup_function(self.current, &function.name, arguments.len())?
                        .clone(),
                };
                self.invoke(&callable, values)
            }
        }
    }

    fn literal(&self, literal: &Literal) -> Value {
        let native = match literal {
            Literal::Nil => Native::Nil,
            Literal::Boolean(value) => Native::Boolean(*value),
            Literal::Integer(value) => Native::Integer(value.clone()),
            Literal::Decimal(value) => Native::Decimal(value.clone()),
            Literal::Character(value) => Native::Character(*value),
            Literal::String(value) => Native::String(value.clone()),
        };
        Value::new(self.registry, native)
    }

    /// Reads a field from the receiver's own members, falling back to the
    /// built-in member surface of its type.
    fn read_field(&self, receiver: &Value, name: &str) -> Result<Value, Error> {
        if let Some(members) = receiver.members() {
            if let Ok(value) = self.scopes.lookup_variable(members, name) {
                return Ok(value.clone());
            }
        }

        let field = self.registry.get_field(receiver.get_type(), name)?;
        match &field.getter {
            Some(getter) => getter(self.registry, std::slice::from_ref(receiver)),
            None => Err(Error::new(ErrorImpl::VariableNotDeclared {
                variable: name.to_string(),
            })),
        }
    }

    fn resolve_method(&self, receiver: &Value, name: &str, arity: usize) -> Result<Callable, Error> {
        if let Some(members) = receiver.members() {
            if let Ok(callable) = self.scopes.lookup_function(members, name, arity + 1) {
                return Ok(callable.clone());
            }
        }

        let method = self.registry.get_method(receiver.get_type(), name, arity)?;
        match &method.body {
            Some(body) => Ok(Callable::Native(Rc::clone(body))),
            None => Err(Error::new(ErrorImpl::FunctionNotDeclared {
                function: name.to_string(),
                arity,
            })),
        }
    }

    fn evaluate_binary(&mut self, operator: BinaryOp, left: &TypedExpr, right: &TypedExpr) -> Result<Value, Error> {
        if operator.is_logical() {
            let left = require_boolean(&self.evaluate(left)?)?;
            let short_circuit = match operator {
                BinaryOp::And => !left,
                _ => left,
            };
            if short_circuit {
                return Ok(Value::boolean(self.registry, left));
            }
            let right = require_boolean(&self.evaluate(right)?)?;
            return Ok(Value::boolean(self.registry, right));
        }

        let left = self.evaluate(left)?;
        let right = self.evaluate(right)?;
        let registry = self.registry;

        match operator {
            BinaryOp::Equal => Ok(Value::boolean(registry, left == right)),
            BinaryOp::NotEqual => Ok(Value::boolean(registry, left != right)),
            BinaryOp::Less | BinaryOp::LessEqual | BinaryOp::Greater | BinaryOp::GreaterEqual => {
                let ordering = left.native().compare(right.native()).ok_or_else(|| {
                    Error::new(ErrorImpl::OperandTypeError {
                        operator: operator.to_string(),
                        received: format!(
                            "{} and {}",
                            left.native().class_name(),
                            right.native().class_name()
                        ),
                    })
                })?;
                let result = match operator {
                    BinaryOp::Less => ordering.is_lt(),
                    BinaryOp::LessEqual => ordering.is_le(),
                    BinaryOp::Greater => ordering.is_gt(),
                    _ => ordering.is_ge(),
                };
                Ok(Value::boolean(registry, result))
            }
            BinaryOp::Add
                if matches!(left.native(), Native::String(_))
                    || matches!(right.native(), Native::String(_)) =>
            {
                Ok(Value::string(registry, format!("{}{}", left, right)))
            }
            _ => arithmetic(registry, operator, &left, &right),
        }
    }
}

fn member_scope(object: &Value, name: &str) -> Result<ScopeId, Error> {
    object.members().ok_or_else(|| {
        Error::new(ErrorImpl::VariableNotDeclared {
            variable: name.to_string(),
        })
    })
}

fn require_boolean(value: &Value) -> Result<bool, Error> {
    match value.native() {
        Native::Boolean(value) => Ok(*value),
        other => Err(Error::new(ErrorImpl::TypeMatchError {
            expected: String::from("boolean"),
            received: other.class_name().to_string(),
        })),
    }
}

fn arithmetic(registry: &TypeRegistry, operator: BinaryOp, left: &Value, right: &Value) -> Result<Value, Error> {
    match (left.native(), right.native()) {
        (Native::Integer(left), Native::Integer(right)) => {
            let result = match operator {
                BinaryOp::Add => left + right,
                BinaryOp::Subtract => left - right,
                BinaryOp::Multiply => left * right,
                _ => {
                    if right.is_zero() {
                        return Err(Error::new(ErrorImpl::DivisionByZero));
                    }
                    left / right
                }
            };
            Ok(Value::integer(registry, result))
        }
        (Native::Decimal(left), Native::Decimal(right)) => {
            let result = match operator {
                BinaryOp::Add => left + right,
                BinaryOp::Subtract => left - right,
                BinaryOp::Multiply => left * right,
                _ => divide_decimal(left, right)?,
            };
            Ok(Value::decimal(registry, result))
        }
        (left, right) => Err(Error::new(ErrorImpl::OperandTypeError {
            operator: operator.to_string(),
            received: format!("{} and {}", left.class_name(), right.class_name()),
        })),
    }
}

/// Divides keeping the scale of `left`, rounding half to even.
pub fn divide_decimal(left: &BigDecimal, right: &BigDecimal) -> Result<BigDecimal, Error> {
    if right.is_zero() {
        return Err(Error::new(ErrorImpl::DivisionByZero));
    }

    let (left_digits, scale) = left.as_bigint_and_exponent();
    let (right_digits, right_scale) = right.as_bigint_and_exponent();
    let ten = BigInt::from(10);
    let (numerator, denominator) = if right_scale >= 0 {
        (left_digits * pow(ten, right_scale as usize), right_digits)
    } else {
        (left_digits, right_digits * pow(ten, right_scale.unsigned_abs() as usize))
    };

    let (mut quotient, remainder) = numerator.div_rem(&denominator);
    let doubled: BigInt = remainder.abs() * 2;
    let away = match doubled.cmp(&denominator.abs()) {
        std::cmp::Ordering::Greater => true,
        std::cmp::Ordering::Equal => quotient.is_odd(),
        std::cmp::Ordering::Less => false,
    };
    if away {
        if numerator.is_negative() != denominator.is_negative() {
            quotient -= 1;
        } else {
            quotient += 1;
        }
    }

    Ok(BigDecimal::new(quotient, scale))
}
