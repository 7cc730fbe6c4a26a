//! Type checking and semantic analysis module.
//!
//! This module performs type checking and semantic analysis on the AST.
//! It transforms the untyped AST into a typed AST while:
//!
//! - Verifying type correctness of expressions and statements
//! - Resolving variable, field, function and method references
//! - Checking argument counts and argument types
//! - Managing nested scopes
//! - Requiring a `main` entry point
//!
//! The pass stops at the first violated rule.

pub mod type_checker;
pub mod typed_ast;
