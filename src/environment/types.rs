//! The type lattice and the member surface of each type.
//!
//! Types are nominal and identified by the `TypeId` their registry handed
//! out. Each type owns a member scope holding its fields and methods; member
//! scopes chain `Integer`/`Decimal`/`Character`/`String` → `Comparable` →
//! `Any`, so every type inherits `stringify`.

use std::{cmp::Ordering, collections::HashMap, fmt::Debug, rc::Rc};

use bigdecimal::BigDecimal;
use lazy_static::lazy_static;
use num_bigint::BigInt;
use num_traits::ToPrimitive;
use regex::Regex;
use tracing::debug;

use crate::errors::errors::{Error, ErrorImpl};

use super::{
    scope::{ScopeArena, ScopeId},
    value::{Native, Value},
};

lazy_static! {
    static ref TYPE_NAME: Regex = Regex::new("^[A-Za-z_][A-Za-z0-9_]*$").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeId(usize);

/// Runtime behaviour of a built-in member. Receives the receiver first.
pub type NativeFn = Rc<dyn Fn(&TypeRegistry, &[Value]) -> Result<Value, Error>>;

#[derive(Debug, Clone)]
pub struct Type {
    pub name: String,
    /// Spelling of the type in generated source.
    pub target_name: String,
    pub members: ScopeId,
}

/// A statically known variable or field.
#[derive(Clone)]
pub struct Variable {
    pub name: String,
    /// Spelling of the variable in generated source.
    pub target_name: String,
    pub ty: TypeId,
    /// Computes the field from its receiver; only built-in fields have one.
    pub getter: Option<NativeFn>,
}

impl Variable {
    pub fn new(name: &str, target_name: &str, ty: TypeId) -> Self {
        Variable {
            name: name.to_string(),
            target_name: target_name.to_string(),
            ty,
            getter: None,
        }
    }

    pub fn with_getter(mut self, getter: NativeFn) -> Self {
        self.getter = Some(getter);
        self
    }
}

impl PartialEq for Variable {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.target_name == other.target_name && self.ty == other.ty
    }
}

impl Debug for Variable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Variable")
            .field("name", &self.name)
            .field("target_name", &self.target_name)
            .field("ty", &self.ty)
            .field("getter", &self.getter.is_some())
            .finish()
    }
}

/// A statically known function or method.
///
/// For methods the first parameter is the implicit receiver.
#[derive(Clone)]
pub struct Function {
    pub name: String,
    /// Spelling of the function in generated source.
    pub target_name: String,
    pub parameter_types: Vec<TypeId>,
    pub return_type: TypeId,
    pub body: Option<NativeFn>,
}

impl Function {
    pub fn new(name: &str, target_name: &str, parameter_types: Vec<TypeId>, return_type: TypeId) -> Self {
        Function {
            name: name.to_string(),
            target_name: target_name.to_string(),
            parameter_types,
            return_type,
            body: None,
        }
    }

    pub fn with_body(mut self, body: NativeFn) -> Self {
        self.body = Some(body);
        self
    }

    pub fn arity(&self) -> usize {
        self.parameter_types.len()
    }
}

impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.target_name == other.target_name
            && self.parameter_types == other.parameter_types
            && self.return_type == other.return_type
    }
}

impl Debug for Function {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name)
            .field("target_name", &self.target_name)
            .field("parameter_types", &self.parameter_types)
            .field("return_type", &self.return_type)
            .field("body", &self.body.is_some())
            .finish()
    }
}

/// Ids of the built-in lattice.
#[derive(Debug, Clone, Copy)]
pub struct Builtins {
    pub any: TypeId,
    pub nil: TypeId,
    pub integer_iterable: TypeId,
    pub comparable: TypeId,
    pub boolean: TypeId,
    pub integer: TypeId,
    pub decimal: TypeId,
    pub character: TypeId,
    pub string: TypeId,
}

impl Builtins {
    /// The concrete types a `Comparable` accepts.
    pub fn is_comparable(&self, ty: TypeId) -> bool {
        [self.integer, self.decimal, self.character, self.string].contains(&ty)
    }

    pub fn is_numeric(&self, ty: TypeId) -> bool {
        ty == self.integer || ty == self.decimal
    }
}

/// Every type known to a program, with their members.
///
/// Built once before any pass runs and only borrowed by the passes.
#[derive(Debug)]
pub struct TypeRegistry {
    types: Vec<Type>,
    names: HashMap<String, TypeId>,
    members: ScopeArena<Variable, Function>,
    builtins: Builtins,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeRegistry {
    /// Creates a registry holding the built-in lattice and member surface.
    pub fn new() -> Self {
        let mut types = vec![];
        let mut names = HashMap::new();
        let mut members = ScopeArena::new();

        let mut add = |name: &str, target_name: &str, parent: Option<ScopeId>| {
            let id = TypeId(types.len());
            let scope = members.enter(parent);
            types.push(Type {
                name: name.to_string(),
                target_name: target_name.to_string(),
                members: scope,
            });
            names.insert(name.to_string(), id);
            (id, scope)
        };

        let (any, any_scope) = add("Any", "Object", None);
        let (nil, _) = add("Nil", "Void", Some(any_scope));
        let (integer_iterable, _) = add("IntegerIterable", "Iterable<Integer>", Some(any_scope));
        let (comparable, comparable_scope) = add("Comparable", "Comparable", Some(any_scope));
        let (boolean, _) = add("Boolean", "boolean", Some(any_scope));
        let (integer, _) = add("Integer", "int", Some(comparable_scope));
        let (decimal, _) = add("Decimal", "double", Some(comparable_scope));
        let (character, _) = add("Character", "char", Some(comparable_scope));
        let (string, _) = add("String", "String", Some(comparable_scope));

        let mut registry = TypeRegistry {
            types,
            names,
            members,
            builtins: Builtins {
                any,
                nil,
                integer_iterable,
                comparable,
                boolean,
                integer,
                decimal,
                character,
                string,
            },
        };
        registry.bind_builtin_members();
        registry
    }

    fn bind_builtin_members(&mut self) {
        let Builtins {
            any,
            comparable,
            integer,
            decimal,
            character,
            string,
            ..
        } = self.builtins;

        let stringify: NativeFn = Rc::new(|registry: &TypeRegistry, arguments: &[Value]| -> Result<Value, Error> {
            let receiver = argument(arguments, 0)?;
            Ok(Value::string(registry, receiver.native().to_string()))
        });
        self.bind_method(any, Function::new("stringify", "toString", vec![any], string).with_body(stringify));

        for ty in [comparable, integer, decimal, character, string] {
            let compare: NativeFn = Rc::new(|registry: &TypeRegistry, arguments: &[Value]| -> Result<Value, Error> {
                let receiver = argument(arguments, 0)?;
                let other = argument(arguments, 1)?;
                let ordering = receiver.native().compare(other.native()).ok_or_else(|| {
                    Error::new(ErrorImpl::OperandTypeError {
                        operator: String::from("compare"),
                        received: other.native().class_name().to_string(),
                    })
                })?;
                Ok(ordering_sign(registry, receiver.native(), ordering))
            });
            self.bind_method(ty, Function::new("compare", "compareTo", vec![any, ty], ty).with_body(compare));
        }

        let length: NativeFn = Rc::new(|registry: &TypeRegistry, arguments: &[Value]| -> Result<Value, Error> {
            let text = string_argument(arguments, 0)?;
            Ok(Value::integer(registry, text.chars().count()))
        });
        self.bind_field(string, Variable::new("length", "length()", integer).with_getter(length));

        let slice: NativeFn = Rc::new(|registry: &TypeRegistry, arguments: &[Value]| -> Result<Value, Error> {
            let text = string_argument(arguments, 0)?;
            let start = integer_argument(arguments, 1)?;
            let end = integer_argument(arguments, 2)?;
            let length = text.chars().count();
            let bounds = match (start.to_usize(), end.to_usize()) {
                (Some(from), Some(to)) if from <= to && to <= length => Some((from, to)),
                _ => None,
            };
            let (from, to) = bounds.ok_or_else(|| {
                Error::new(ErrorImpl::IndexOutOfBounds {
                    start: start.to_string(),
                    end: end.to_string(),
                    length,
                })
            })?;
            Ok(Value::string(
                registry,
                text.chars().skip(from).take(to - from).collect::<String>(),
            ))
        });
        self.bind_method(
            string,
            Function::new("slice", "substring", vec![any, integer, integer], string).with_body(slice),
        );
    }

    // Fixed built-in members cannot collide, so binding skips the duplicate check.
    fn bind_method(&mut self, ty: TypeId, function: Function) {
        let scope = self.types[ty.0].members;
        let name = function.name.clone();
        self.members.bind_function(scope, &name, function.arity(), function);
    }

    fn bind_field(&mut self, ty: TypeId, variable: Variable) {
        let scope = self.types[ty.0].members;
        let name = variable.name.clone();
        self.members.bind_variable(scope, &name, variable);
    }

    pub fn builtins(&self) -> &Builtins {
        &self.builtins
    }

    /// Registers a supplied type. Its members inherit from `parent`, or from
    /// `Any` when no parent is given.
    pub fn register_type(
        &mut self,
        name: &str,
        target_name: &str,
        parent: Option<TypeId>,
    ) -> Result<TypeId, Error> {
        if !TYPE_NAME.is_match(name) {
            return Err(Error::new(ErrorImpl::InvalidTypeName {
                type_: name.to_string(),
            }));
        }
        if self.names.contains_key(name) {
            return Err(Error::new(ErrorImpl::DuplicateType {
                type_: name.to_string(),
            }));
        }

        let parent = self.get(parent.unwrap_or(self.builtins.any))?.members;
        let id = TypeId(self.types.len());
        self.types.push(Type {
            name: name.to_string(),
            target_name: target_name.to_string(),
            members: self.members.enter(Some(parent)),
        });
        self.names.insert(name.to_string(), id);
        debug!(name, target_name, "registered type");
        Ok(id)
    }

    pub fn get_type(&self, name: &str) -> Result<TypeId, Error> {
        self.names.get(name).copied().ok_or_else(|| {
            Error::new(ErrorImpl::UnknownType {
                type_: name.to_string(),
            })
        })
    }

    pub fn get(&self, ty: TypeId) -> Result<&Type, Error> {
        self.types.get(ty.0).ok_or_else(|| {
            Error::new(ErrorImpl::InternalConsistency {
                message: format!("type id {} was not issued by this registry", ty.0),
            })
        })
    }

    /// Name of `ty` for diagnostics.
    pub fn name_of(&self, ty: TypeId) -> String {
        match self.types.get(ty.0) {
            Some(ty) => ty.name.clone(),
            None => format!("<type {}>", ty.0),
        }
    }

    /// Adds a field to a supplied type.
    pub fn define_field(&mut self, ty: TypeId, variable: Variable) -> Result<(), Error> {
        let scope = self.get(ty)?.members;
        let name = variable.name.clone();
        self.members.define_variable(scope, &name, variable)
    }

    /// Adds a method to a supplied type. The first parameter type is the
    /// receiver.
    pub fn define_method(&mut self, ty: TypeId, function: Function) -> Result<(), Error> {
        let scope = self.get(ty)?.members;
        let name = function.name.clone();
        self.members.define_function(scope, &name, function.arity(), function)
    }

    pub fn get_field(&self, ty: TypeId, name: &str) -> Result<&Variable, Error> {
        self.members.lookup_variable(self.get(ty)?.members, name)
    }

    /// Resolves a method called with `arity` explicit arguments.
    pub fn get_method(&self, ty: TypeId, name: &str, arity: usize) -> Result<&Function, Error> {
        self.members
            .lookup_function(self.get(ty)?.members, name, arity + 1)
            .map_err(|error| {
                // Report arities as the caller wrote them, without the receiver.
                let adjusted = match error.get_internal_error() {
                    ErrorImpl::ArityMismatch {
                        function, expected, ..
                    } => Some(ErrorImpl::ArityMismatch {
                        function: function.clone(),
                        expected: expected.iter().map(|arity| arity.saturating_sub(1)).collect(),
                        received: arity,
                    }),
                    ErrorImpl::FunctionNotDeclared { function, .. } => {
                        Some(ErrorImpl::FunctionNotDeclared {
                            function: function.clone(),
                            arity,
                        })
                    }
                    _ => None,
                };
                adjusted.map(Error::new).unwrap_or(error)
            })
    }

    /// Checks that a value of type `source` may be stored where `target` is
    /// declared.
    pub fn require_assignable(&self, target: TypeId, source: TypeId) -> Result<(), Error> {
        if target == source
            || target == self.builtins.any
            || (target == self.builtins.comparable && self.builtins.is_comparable(source))
        {
            Ok(())
        } else {
            Err(Error::new(ErrorImpl::TypeMatchError {
                expected: self.name_of(target),
                received: self.name_of(source),
            }))
        }
    }
}

fn argument(arguments: &[Value], index: usize) -> Result<&Value, Error> {
    arguments.get(index).ok_or_else(|| {
        Error::new(ErrorImpl::InternalConsistency {
            message: format!("built-in member called without argument {}", index),
        })
    })
}

fn string_argument(arguments: &[Value], index: usize) -> Result<&String, Error> {
    match argument(arguments, index)?.native() {
        Native::String(text) => Ok(text),
        other => Err(Error::new(ErrorImpl::TypeMatchError {
            expected: String::from("string"),
            received: other.class_name().to_string(),
        })),
    }
}

fn integer_argument(arguments: &[Value], index: usize) -> Result<&BigInt, Error> {
    match argument(arguments, index)?.native() {
        Native::Integer(value) => Ok(value),
        other => Err(Error::new(ErrorImpl::TypeMatchError {
            expected: String::from("integer"),
            received: other.class_name().to_string(),
        })),
    }
}

/// Renders `ordering` as -1, 0 or 1 in the receiver's own class, so the
/// result matches the declared return type of `compare`. Characters use
/// '-', '0' and '+'.
fn ordering_sign(registry: &TypeRegistry, receiver: &Native, ordering: Ordering) -> Value {
    let sign: i32 = match ordering {
        Ordering::Less => -1,
        Ordering::Equal => 0,
        Ordering::Greater => 1,
    };
    match receiver {
        Native::Decimal(_) => Value::decimal(registry, BigDecimal::from(sign)),
        Native::Character(_) => Value::character(
            registry,
            match ordering {
                Ordering::Less => '-',
                Ordering::Equal => '0',
                Ordering::Greater => '+',
            },
        ),
        Native::String(_) => Value::string(registry, sign.to_string()),
        _ => Value::integer(registry, sign),
    }
}
