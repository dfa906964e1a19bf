//! Evaluator configuration.

use serde::{Deserialize, Serialize};

use crate::vm::core_ops::{ENV_KW, QUOTE_KW};

/// Default recursion guard; sized for evaluation on a 2 MiB thread stack.
pub const DEFAULT_MAX_DEPTH: usize = 512;

/// Keywords and limits fixed at evaluator construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalConfig {
    /// Atom naming the quote special form.
    pub quote_kw: Vec<u8>,
    /// Atom naming the environment-reference special form.
    pub env_kw: Vec<u8>,
    /// Deepest nesting of evaluation steps before aborting.
    pub max_depth: usize,
}

impl EvalConfig {
    pub fn new(quote_kw: impl Into<Vec<u8>>, env_kw: impl Into<Vec<u8>>) -> Self {
        Self {
            quote_kw: quote_kw.into(),
            env_kw: env_kw.into(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self::new([QUOTE_KW], [ENV_KW])
    }
}
