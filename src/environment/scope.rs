//! Lexical scopes.
//!
//! Scopes are stored in an arena and refer to their parent by id. Blocks are
//! strictly nested, so the arena is used as a stack: `enter` pushes a child
//! and `exit` discards it together with anything pushed after it.

use std::collections::HashMap;

use tracing::{trace, warn};

use crate::errors::errors::{Error, ErrorImpl};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(usize);

#[derive(Debug)]
pub struct Scope<V, F> {
    variables: HashMap<String, V>,
    functions: HashMap<(String, usize), F>,
    parent: Option<ScopeId>,
}

impl<V, F> Scope<V, F> {
    fn new(parent: Option<ScopeId>) -> Self {
        Scope {
            variables: HashMap::new(),
            functions: HashMap::new(),
            parent,
        }
    }
}

/// Owns every scope of one scope tree.
///
/// `V` is the variable binding and `F` the function binding stored in the
/// tree, so the analyzer and the interpreter each keep their own arena.
#[derive(Debug)]
pub struct ScopeArena<V, F> {
    scopes: Vec<Scope<V, F>>,
}

impl<V, F> Default for ScopeArena<V, F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V, F> ScopeArena<V, F> {
    pub fn new() -> Self {
        ScopeArena { scopes: vec![] }
    }

    /// Number of live scopes.
    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    pub fn enter(&mut self, parent: Option<ScopeId>) -> ScopeId {
        self.scopes.push(Scope::new(parent));
        let id = ScopeId(self.scopes.len() - 1);
        trace!(scope = id.0, parent = ?parent.map(|parent| parent.0), "enter scope");
        id
    }

    /// Discards `scope` and every scope entered after it.
    pub fn exit(&mut self, scope: ScopeId) {
        debug_assert!(
            scope.0 + 1 == self.scopes.len(),
            "scope {} exited out of order",
            scope.0
        );
        trace!(scope = scope.0, "exit scope");
        self.scopes.truncate(scope.0);
    }

    pub fn parent(&self, scope: ScopeId) -> Option<ScopeId> {
        self.get(scope).and_then(|scope| scope.parent)
    }

    fn get(&self, scope: ScopeId) -> Option<&Scope<V, F>> {
        self.scopes.get(scope.0)
    }

    fn get_mut(&mut self, scope: ScopeId) -> Result<&mut Scope<V, F>, Error> {
        self.scopes.get_mut(scope.0).ok_or_else(|| {
            Error::new(ErrorImpl::InternalConsistency {
                message: format!("scope {} is not live", scope.0),
            })
        })
    }

    /// Iterates `scope` and its ancestors, innermost first.
    fn chain(&self, scope: ScopeId) -> impl Iterator<Item = &Scope<V, F>> + '_ {
        let mut next = Some(scope);
        std::iter::from_fn(move || {
            let current = self.get(next?)?;
            next = current.parent;
            Some(current)
        })
    }

    pub fn define_variable(&mut self, scope: ScopeId, name: &str, variable: V) -> Result<(), Error> {
        let scope = self.get_mut(scope)?;
        if scope.variables.contains_key(name) {
            return Err(Error::new(ErrorImpl::VariableAlreadyDeclared {
                variable: name.to_string(),
            }));
        }
        scope.variables.insert(name.to_string(), variable);
        Ok(())
    }

    pub fn lookup_variable(&self, scope: ScopeId, name: &str) -> Result<&V, Error> {
        self.chain(scope)
            .find_map(|scope| scope.variables.get(name))
            .ok_or_else(|| {
                Error::new(ErrorImpl::VariableNotDeclared {
                    variable: name.to_string(),
                })
            })
    }

    /// Returns the nearest binding of `name` for in-place mutation.
    pub fn lookup_variable_mut(&mut self, scope: ScopeId, name: &str) -> Result<&mut V, Error> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let scope = self.get_mut(id)?;
            if scope.variables.contains_key(name) {
                break;
            }
            current = scope.parent;
        }

        match current {
            Some(id) => self.get_mut(id)?.variables.get_mut(name).ok_or_else(|| {
                Error::new(ErrorImpl::InternalConsistency {
                    message: format!("variable `{}` vanished during lookup", name),
                })
            }),
            None => Err(Error::new(ErrorImpl::VariableNotDeclared {
                variable: name.to_string(),
            })),
        }
    }

    pub fn define_function(
        &mut self,
        scope: ScopeId,
        name: &str,
        arity: usize,
        function: F,
    ) -> Result<(), Error> {
        let scope = self.get_mut(scope)?;
        let key = (name.to_string(), arity);
        if scope.functions.contains_key(&key) {
            return Err(Error::new(ErrorImpl::FunctionAlreadyDeclared {
                function: name.to_string(),
                arity,
            }));
        }
        scope.functions.insert(key, function);
        Ok(())
    }

    /// Binds a function, replacing any binding with the same name and arity.
    pub(crate) fn bind_function(&mut self, scope: ScopeId, name: &str, arity: usize, function: F) {
        debug_assert!(scope.0 < self.scopes.len(), "scope {} is not live", scope.0);
        match self.scopes.get_mut(scope.0) {
            Some(scope) => {
                scope.functions.insert((name.to_string(), arity), function);
            }
            None => warn!(scope = scope.0, name, arity, "dropped function binding, scope is not live"),
        }
    }

    /// Binds a variable, replacing any binding with the same name.
    pub(crate) fn bind_variable(&mut self, scope: ScopeId, name: &str, variable: V) {
        debug_assert!(scope.0 < self.scopes.len(), "scope {} is not live", scope.0);
        match self.scopes.get_mut(scope.0) {
            Some(scope) => {
                scope.variables.insert(name.to_string(), variable);
            }
            None => warn!(scope = scope.0, name, "dropped variable binding, scope is not live"),
        }
    }

    /// Resolves `name/arity`.
    ///
    /// Fails with an arity error when the name is bound somewhere along the
    /// chain, but never with `arity` parameters.
    pub fn lookup_function(&self, scope: ScopeId, name: &str, arity: usize) -> Result<&F, Error> {
        let key = (name.to_string(), arity);
        if let Some(function) = self.chain(scope).find_map(|scope| scope.functions.get(&key)) {
            return Ok(function);
        }

        let mut arities: Vec<usize> = self
            .chain(scope)
            .flat_map(|scope| scope.functions.keys())
            .filter(|(candidate, _)| candidate == name)
            .map(|(_, arity)| *arity)
            .collect();

        if arities.is_empty() {
            Err(Error::new(ErrorImpl::FunctionNotDeclared {
                function: name.to_string(),
                arity,
            }))
        } else {
            arities.sort_unstable();
            arities.dedup();
            Err(Error::new(ErrorImpl::ArityMismatch {
                function: name.to_string(),
                expected: arities,
                received: arity,
            }))
        }
    }
}
