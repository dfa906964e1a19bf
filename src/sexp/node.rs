//! Core S-expression node.
//!
//! A node is either an atom (immutable byte string) or a pair of two nodes.
//! Nodes are reference counted and never mutated, so subtrees are shared
//! freely between trees and across threads.

use std::fmt;
use std::mem;
use std::sync::{Arc, LazyLock};

use thiserror::Error;

static NIL: LazyLock<Node> = LazyLock::new(|| Node(Arc::new(SExp::Atom(Box::default()))));
static ONE: LazyLock<Node> = LazyLock::new(|| Node(Arc::new(SExp::Atom(Box::new([1])))));

/// Wrong-shape access on a node.
#[derive(Debug, Error)]
pub enum NodeError {
    #[error("first/rest of non-cons: {0}")]
    NotAPair(Node),

    #[error("expected atom, got pair: {0}")]
    NotAnAtom(Node),

    #[error("atom is not a BLS12-381 G1 point: {0}")]
    InvalidPoint(Node),
}

impl NodeError {
    /// The node that triggered the error.
    pub fn node(&self) -> &Node {
        match self {
            NodeError::NotAPair(node) | NodeError::NotAnAtom(node) | NodeError::InvalidPoint(node) => {
                node
            }
        }
    }
}

enum SExp {
    Atom(Box<[u8]>),
    Pair(Node, Node),
}

/// Borrowed view of a node's payload.
#[derive(Debug, Clone, Copy)]
pub enum NodeRef<'a> {
    Atom(&'a [u8]),
    Pair(&'a Node, &'a Node),
}

/// An atom or a pair.
///
/// Cloning is O(1) and shares the underlying tree.
#[derive(Clone)]
pub struct Node(Arc<SExp>);

impl Node {
    /// The empty atom: false and the list terminator.
    pub fn nil() -> Self {
        NIL.clone()
    }

    /// The one-byte atom `0x01`, true by convention.
    pub fn one() -> Self {
        ONE.clone()
    }

    pub fn atom(bytes: impl AsRef<[u8]>) -> Self {
        let bytes = bytes.as_ref();
        if bytes.is_empty() {
            return Self::nil();
        }
        Self(Arc::new(SExp::Atom(bytes.into())))
    }

    pub fn pair(first: Node, rest: Node) -> Self {
        Self(Arc::new(SExp::Pair(first, rest)))
    }

    /// Builds a proper list from `items`, consing from the last element backward.
    pub fn from_list<I>(items: I) -> Self
    where
        I: IntoIterator<Item = Node>,
        I::IntoIter: DoubleEndedIterator,
    {
        items
            .into_iter()
            .rev()
            .fold(Self::nil(), |rest, item| item.cons(rest))
    }

    pub fn view(&self) -> NodeRef<'_> {
        match &*self.0 {
            SExp::Atom(bytes) => NodeRef::Atom(&bytes[..]),
            SExp::Pair(first, rest) => NodeRef::Pair(first, rest),
        }
    }

    #[inline]
    pub fn is_pair(&self) -> bool {
        matches!(&*self.0, SExp::Pair(..))
    }

    #[inline]
    pub fn is_nil(&self) -> bool {
        matches!(&*self.0, SExp::Atom(bytes) if bytes.is_empty())
    }

    pub fn as_pair(&self) -> Option<(&Node, &Node)> {
        match &*self.0 {
            SExp::Pair(first, rest) => Some((first, rest)),
            SExp::Atom(_) => None,
        }
    }

    pub fn first(&self) -> Result<Node, NodeError> {
        match &*self.0 {
            SExp::Pair(first, _) => Ok(first.clone()),
            SExp::Atom(_) => Err(NodeError::NotAPair(self.clone())),
        }
    }

    pub fn rest(&self) -> Result<Node, NodeError> {
        match &*self.0 {
            SExp::Pair(_, rest) => Ok(rest.clone()),
            SExp::Atom(_) => Err(NodeError::NotAPair(self.clone())),
        }
    }

    pub fn as_atom(&self) -> Result<&[u8], NodeError> {
        match &*self.0 {
            SExp::Atom(bytes) => Ok(&bytes[..]),
            SExp::Pair(..) => Err(NodeError::NotAnAtom(self.clone())),
        }
    }

    /// Builds the pair `(self . rest)`.
    pub fn cons(&self, rest: Node) -> Node {
        Node::pair(self.clone(), rest)
    }

    /// Walks the `rest` chain yielding each `first`.
    ///
    /// Stops at the first atom reached, so an improper tail is never yielded.
    pub fn iter_list(&self) -> ListIter {
        ListIter {
            cursor: self.clone(),
        }
    }

    /// True for `nil` and for pair chains terminated by `nil`.
    pub fn is_legit_list(&self) -> bool {
        let mut cursor = self;
        while let Some((_, rest)) = cursor.as_pair() {
            cursor = rest;
        }
        cursor.is_nil()
    }

    pub fn ptr_eq(&self, other: &Node) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

pub struct ListIter {
    cursor: Node,
}

impl Iterator for ListIter {
    type Item = Node;

    fn next(&mut self) -> Option<Node> {
        let (first, rest) = match self.cursor.as_pair() {
            Some((first, rest)) => (first.clone(), rest.clone()),
            None => return None,
        };
        self.cursor = rest;
        Some(first)
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Node) -> bool {
        let mut pending = vec![(self, other)];
        while let Some((left, right)) = pending.pop() {
            if left.ptr_eq(right) {
                continue;
            }
            match (left.view(), right.view()) {
                (NodeRef::Atom(a), NodeRef::Atom(b)) => {
                    if a != b {
                        return false;
                    }
                }
                (NodeRef::Pair(a_first, a_rest), NodeRef::Pair(b_first, b_rest)) => {
                    pending.push((a_rest, b_rest));
                    pending.push((a_first, b_first));
                }
                _ => return false,
            }
        }
        true
    }
}

impl Eq for Node {}

// Deep trees are torn down with an explicit stack instead of nested drops.
impl Drop for SExp {
    fn drop(&mut self) {
        let SExp::Pair(first, rest) = self else {
            return;
        };
        if !first.is_pair() && !rest.is_pair() {
            return;
        }
        let mut pending = vec![mem::replace(first, Node::nil()), mem::replace(rest, Node::nil())];
        while let Some(node) = pending.pop() {
            if let Some(mut sexp) = Arc::into_inner(node.0) {
                if let SExp::Pair(first, rest) = &mut sexp {
                    pending.push(mem::replace(first, Node::nil()));
                    pending.push(mem::replace(rest, Node::nil()));
                }
            }
        }
    }
}

fn write_atom(f: &mut fmt::Formatter<'_>, bytes: &[u8]) -> fmt::Result {
    if bytes.is_empty() {
        return f.write_str("()");
    }
    f.write_str("0x")?;
    for byte in bytes {
        write!(f, "{byte:02x}")?;
    }
    Ok(())
}

enum Print<'a> {
    Node(&'a Node),
    Tail(&'a Node),
    Close,
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut pending = vec![Print::Node(self)];
        while let Some(item) = pending.pop() {
            match item {
                Print::Node(node) => match node.view() {
                    NodeRef::Atom(bytes) => write_atom(f, bytes)?,
                    NodeRef::Pair(first, rest) => {
                        f.write_str("(")?;
                        pending.push(Print::Close);
                        pending.push(Print::Tail(rest));
                        pending.push(Print::Node(first));
                    }
                },
                Print::Tail(node) => match node.view() {
                    NodeRef::Atom(bytes) if bytes.is_empty() => {}
                    NodeRef::Atom(bytes) => {
                        f.write_str(" . ")?;
                        write_atom(f, bytes)?;
                    }
                    NodeRef::Pair(first, rest) => {
                        f.write_str(" ")?;
                        pending.push(Print::Tail(rest));
                        pending.push(Print::Node(first));
                    }
                },
                Print::Close => f.write_str(")")?,
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node({self})")
    }
}
