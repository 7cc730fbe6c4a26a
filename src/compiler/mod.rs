//! Code generation module.
//!
//! This module renders the typed AST as target-language source. It handles:
//!
//! - The class layout around the program's fields and methods
//! - Statements with brace-delimited, indented bodies
//! - Expressions, using the target names recorded on each annotation
//! - Escaping of string and character literals

pub mod compiler;
pub mod expr;
pub mod stmt;
