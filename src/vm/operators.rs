//! Operator table interface.
//!
//! The evaluator never interprets operators itself: any operator atom that is
//! not a special form is looked up here and applied to the evaluated argument
//! list.

use std::collections::HashMap;
use std::sync::Arc;

use crate::sexp::Node;
use crate::vm::eval::EvalError;

/// A native function over an evaluated argument list.
pub trait Operator: Send + Sync {
    fn apply(&self, args: &Node) -> Result<Node, EvalError>;
}

impl<F> Operator for F
where
    F: Fn(&Node) -> Result<Node, EvalError> + Send + Sync,
{
    fn apply(&self, args: &Node) -> Result<Node, EvalError> {
        self(args)
    }
}

/// Maps operator atoms to operators. A miss is `None`, never an error.
pub trait OperatorTable {
    fn lookup(&self, op: &[u8]) -> Option<&dyn Operator>;
}

/// Hash-map backed operator table.
#[derive(Default)]
pub struct OpTable {
    operators: HashMap<Vec<u8>, Box<dyn Operator>>,
}

impl OpTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `operator` under `keyword`, replacing any previous entry.
    pub fn insert(&mut self, keyword: impl Into<Vec<u8>>, operator: impl Operator + 'static) -> &mut Self {
        self.operators.insert(keyword.into(), Box::new(operator));
        self
    }

    pub fn with(mut self, keyword: impl Into<Vec<u8>>, operator: impl Operator + 'static) -> Self {
        self.insert(keyword, operator);
        self
    }

    pub fn contains(&self, keyword: &[u8]) -> bool {
        self.operators.contains_key(keyword)
    }

    pub fn len(&self) -> usize {
        self.operators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operators.is_empty()
    }
}

impl OperatorTable for OpTable {
    fn lookup(&self, op: &[u8]) -> Option<&dyn Operator> {
        self.operators.get(op).map(|operator| &**operator)
    }
}

/// Consults the first table, then falls back to the second.
impl<A: OperatorTable, B: OperatorTable> OperatorTable for (A, B) {
    fn lookup(&self, op: &[u8]) -> Option<&dyn Operator> {
        self.0.lookup(op).or_else(|| self.1.lookup(op))
    }
}

impl<T: OperatorTable + ?Sized> OperatorTable for &T {
    fn lookup(&self, op: &[u8]) -> Option<&dyn Operator> {
        (**self).lookup(op)
    }
}

impl<T: OperatorTable + ?Sized> OperatorTable for Arc<T> {
    fn lookup(&self, op: &[u8]) -> Option<&dyn Operator> {
        (**self).lookup(op)
    }
}
