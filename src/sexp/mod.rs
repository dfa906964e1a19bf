//! S-expression data model.
//!
//! Provides the immutable atom/pair `Node`, the casting protocol from native
//! values, numeric atom encodings, and conversion to plain nested data.

pub mod cast;
pub mod native;
pub mod node;
pub mod number;

pub use cast::{CastError, Castable};
pub use native::NativeTree;
pub use node::{ListIter, Node, NodeError, NodeRef};
