/// AST (Abstract Syntax Tree) module
/// Contains the untyped AST handed over by a front end
///
/// Submodules:
/// - ast: Program structure (source, fields, methods)
/// - expressions: Expressions, literals and operators
/// - statements: Statements
pub mod ast;
pub mod expressions;
pub mod statements;
