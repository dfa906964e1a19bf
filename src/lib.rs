pub mod serialize;
pub mod sexp;
pub mod tree_hash;
pub mod vm;

pub use serialize::{DecodeError, NodeBuilder, NodeFactory, SExpRead, Value};
pub use sexp::{CastError, Castable, NativeTree, Node, NodeError, NodeRef};
pub use tree_hash::tree_hash;
pub use vm::{EvalConfig, EvalError, Evaluate, Evaluator, OpTable, OperatorTable, run_program};
