//! Error types and error handling for every pass.
//!
//! This module defines the single error type shared by the type registry,
//! the analyzer, the interpreter and the generator. It includes:
//!
//! - An error structure wrapping a detailed error variant
//! - The taxonomy name of each variant
//! - Helpful suggestions for reporting

pub mod errors;
