#![allow(clippy::module_inception)]

//! Semantic core of a small imperative language.
//!
//! An embedder builds an untyped [`ast::ast::Source`], checks it against a
//! [`environment::types::TypeRegistry`] with
//! [`type_checker::type_checker::type_check`], and hands the typed program to
//! either the [`interpreter::interpreter::Interpreter`] or the generator in
//! [`compiler::compiler::generate`].

pub mod ast;
pub mod compiler;
pub mod environment;
pub mod errors;
pub mod interpreter;
pub mod type_checker;

extern crate lazy_static;
extern crate regex;
