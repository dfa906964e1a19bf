//! Evaluator for S-expression programs.
//!
//! Provides the configurable special forms, the operator table interface,
//! the tree-walking evaluator, and a reference operator set.

pub mod config;
pub mod core_ops;
pub mod eval;
pub mod operators;

pub use config::{DEFAULT_MAX_DEPTH, EvalConfig};
pub use core_ops::core_operator_table;
pub use eval::{ErrorKind, EvalError, Evaluate, Evaluator, run_program};
pub use operators::{OpTable, Operator, OperatorTable};
