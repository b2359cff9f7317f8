// src/vm/mod.rs

//! Tree-walking interpreter for dynamic circuits and the per-shot state it
//! drives.

mod context;
mod interpreter;

pub use context::ExecContext;
pub use interpreter::execute;
