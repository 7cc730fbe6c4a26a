//! Tree-walking interpreter.
//!
//! Evaluates a typed program against a runtime scope tree that mirrors the
//! analyzer's. Non-local returns travel as `Flow::Return` up to the call
//! boundary that catches them.

pub mod interpreter;

#[cfg(test)]
mod tests;
