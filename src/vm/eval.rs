//! Tree-walking evaluator.
//!
//! Evaluation of a form against an environment:
//! - a form whose operator is itself a pair is evaluated to `(code . env)`,
//!   which is then evaluated in turn;
//! - the quote keyword returns its single argument unevaluated;
//! - the environment keyword returns the environment;
//! - any other operator atom has its arguments evaluated left to right and
//!   is applied through the operator table.
//!
//! Recursion always goes through the `eval_f` handle passed to
//! [`Evaluate::evaluate`], so a different backend can take over any step.

use thiserror::Error;
use tracing::{debug, trace};

use crate::serialize::DecodeError;
use crate::sexp::{CastError, Node, NodeError};
use crate::vm::config::EvalConfig;
use crate::vm::operators::OperatorTable;

/// Discriminant of an [`EvalError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MalformedProgram,
    Arity,
    UnimplementedOperator,
    DepthExceeded,
    Shape,
    Cast,
    Decode,
    Operator,
}

#[derive(Debug, Error)]
pub enum EvalError {
    #[error("{reason}: {form}")]
    MalformedProgram { reason: &'static str, form: Node },

    #[error("{reason}: {form}")]
    Arity { reason: &'static str, form: Node },

    #[error("unimplemented operator: {0}")]
    UnimplementedOperator(Node),

    #[error("exceeded max evaluation depth {limit}: {form}")]
    DepthExceeded { limit: usize, form: Node },

    #[error(transparent)]
    Shape(#[from] NodeError),

    #[error(transparent)]
    Cast(#[from] CastError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("{message}: {node}")]
    Operator { message: String, node: Node },
}

impl EvalError {
    /// Error raised from inside an operator.
    pub fn operator(node: &Node, message: impl Into<String>) -> Self {
        EvalError::Operator {
            message: message.into(),
            node: node.clone(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            EvalError::MalformedProgram { .. } => ErrorKind::MalformedProgram,
            EvalError::Arity { .. } => ErrorKind::Arity,
            EvalError::UnimplementedOperator(_) => ErrorKind::UnimplementedOperator,
            EvalError::DepthExceeded { .. } => ErrorKind::DepthExceeded,
            EvalError::Shape(_) => ErrorKind::Shape,
            EvalError::Cast(_) => ErrorKind::Cast,
            EvalError::Decode(_) => ErrorKind::Decode,
            EvalError::Operator { .. } => ErrorKind::Operator,
        }
    }

    /// The subtree that triggered the error, when there is one.
    pub fn node(&self) -> Option<&Node> {
        match self {
            EvalError::MalformedProgram { form, .. }
            | EvalError::Arity { form, .. }
            | EvalError::DepthExceeded { form, .. } => Some(form),
            EvalError::UnimplementedOperator(op) => Some(op),
            EvalError::Operator { node, .. } => Some(node),
            EvalError::Shape(err) => Some(err.node()),
            EvalError::Cast(_) | EvalError::Decode(_) => None,
        }
    }
}

/// One evaluation step.
///
/// `eval_f` is the entry point used for every nested evaluation; `depth` is
/// the nesting level of this call.
pub trait Evaluate {
    fn evaluate(
        &self,
        eval_f: &dyn Evaluate,
        form: &Node,
        env: &Node,
        depth: usize,
    ) -> Result<Node, EvalError>;
}

/// Reference evaluator over an operator table.
pub struct Evaluator<T> {
    config: EvalConfig,
    operators: T,
}

impl<T: OperatorTable> Evaluator<T> {
    pub fn new(config: EvalConfig, operators: T) -> Self {
        debug!(
            quote_kw = ?config.quote_kw,
            env_kw = ?config.env_kw,
            max_depth = config.max_depth,
            "configured evaluator"
        );
        Self { config, operators }
    }

    pub fn config(&self) -> &EvalConfig {
        &self.config
    }

    pub fn operators(&self) -> &T {
        &self.operators
    }

    /// Evaluates `form` against `env` with this evaluator as its own backend.
    pub fn run(&self, form: &Node, env: &Node) -> Result<Node, EvalError> {
        self.run_with(self, form, env)
    }

    /// Evaluates `form` against `env`, routing every nested step through `eval_f`.
    pub fn run_with(&self, eval_f: &dyn Evaluate, form: &Node, env: &Node) -> Result<Node, EvalError> {
        eval_f
            .evaluate(eval_f, form, env, 0)
            .inspect_err(|err| debug!(kind = ?err.kind(), %err, "evaluation failed"))
    }

    fn eval_args(
        &self,
        eval_f: &dyn Evaluate,
        args: &Node,
        env: &Node,
        depth: usize,
    ) -> Result<Node, EvalError> {
        let mut values = Vec::new();
        for arg in args.iter_list() {
            values.push(eval_f.evaluate(eval_f, &arg, env, depth + 1)?);
        }
        Ok(Node::from_list(values))
    }
}

impl<T: OperatorTable> Evaluate for Evaluator<T> {
    fn evaluate(
        &self,
        eval_f: &dyn Evaluate,
        form: &Node,
        env: &Node,
        depth: usize,
    ) -> Result<Node, EvalError> {
        if depth > self.config.max_depth {
            return Err(EvalError::DepthExceeded {
                limit: self.config.max_depth,
                form: form.clone(),
            });
        }
        trace!(depth, %form, "eval");

        let Some((op, args)) = form.as_pair() else {
            let reason = if form.is_nil() {
                "eval cannot handle empty list"
            } else {
                "not a list"
            };
            return Err(EvalError::MalformedProgram {
                reason,
                form: form.clone(),
            });
        };

        if op.is_pair() {
            let closure = eval_f.evaluate(eval_f, op, env, depth + 1)?;
            let code = closure.first()?;
            let closure_env = closure.rest()?;
            return eval_f.evaluate(eval_f, &code, &closure_env, depth + 1);
        }

        let keyword = op.as_atom().map_err(|_| EvalError::MalformedProgram {
            reason: "non-byte atom in first element of list",
            form: form.clone(),
        })?;

        if keyword == self.config.quote_kw.as_slice() {
            return match args.as_pair() {
                Some((quoted, tail)) if tail.is_nil() => Ok(quoted.clone()),
                _ => Err(EvalError::Arity {
                    reason: "quote requires exactly 1 parameter",
                    form: form.clone(),
                }),
            };
        }

        if keyword == self.config.env_kw.as_slice() {
            if !args.is_nil() {
                return Err(EvalError::Arity {
                    reason: "env requires no parameters",
                    form: form.clone(),
                });
            }
            return Ok(env.clone());
        }

        let params = self.eval_args(eval_f, args, env, depth)?;
        let Some(operator) = self.operators.lookup(keyword) else {
            return Err(EvalError::UnimplementedOperator(op.clone()));
        };
        trace!(depth, %op, %params, "apply");
        operator.apply(&params)
    }
}

/// Builds an evaluator from `config` and `operators` and runs `form` against `env`.
pub fn run_program<T: OperatorTable>(
    form: &Node,
    env: &Node,
    config: EvalConfig,
    operators: T,
) -> Result<Node, EvalError> {
    Evaluator::new(config, operators).run(form, env)
}
