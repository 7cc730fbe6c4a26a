//! Shared data and runtime model.
//!
//! - scope: lexical scopes stored in an arena
//! - types: the type lattice, static variables and functions, the registry
//! - value: runtime values

pub mod scope;
pub mod types;
pub mod value;
