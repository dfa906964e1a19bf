//! Casting native values into nodes.

use std::iter::Rev;
use std::mem;
use std::slice;

use ark_bls12_381::G1Affine;
use num_bigint::BigInt;
use thiserror::Error;

use crate::serialize::{NodeBuilder, SExpRead, translate};
use crate::sexp::node::Node;
use crate::sexp::number::{int_to_atom, point_to_atom};

#[derive(Debug, Error)]
#[error("can't cast to {target}: {value}")]
pub struct CastError {
    pub value: String,
    pub target: &'static str,
}

impl CastError {
    fn new(value: String) -> Self {
        Self {
            value,
            target: "Node",
        }
    }
}

/// The closed set of native shapes that can become a node.
///
/// Casting and teardown walk the value with an explicit stack, so nesting
/// depth is bounded only by memory.
#[derive(Debug)]
pub enum Castable {
    Node(Node),
    /// Absence; casts to `nil`.
    None,
    /// A 2-tuple; casts to a pair.
    Pair(Box<Castable>, Box<Castable>),
    /// A fixed-arity tuple. Only arity 2 is castable.
    Tuple(Vec<Castable>),
    Int(BigInt),
    Point(G1Affine),
    Bytes(Vec<u8>),
    /// A finite sequence; casts to a proper list.
    List(Vec<Castable>),
}

impl Castable {
    pub fn pair(first: impl Into<Castable>, rest: impl Into<Castable>) -> Self {
        Castable::Pair(Box::new(first.into()), Box::new(rest.into()))
    }

    pub fn list<I>(items: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Castable>,
    {
        Castable::List(items.into_iter().map(Into::into).collect())
    }

    /// Translates a tree held in any other node representation.
    pub fn from_sexp<N: SExpRead>(value: &N) -> Self {
        Castable::Node(translate(value, &mut NodeBuilder))
    }

    fn take_children(&mut self, pending: &mut Vec<Castable>) {
        match self {
            Castable::Pair(first, rest) => {
                pending.push(mem::replace(&mut **first, Castable::None));
                pending.push(mem::replace(&mut **rest, Castable::None));
            }
            Castable::Tuple(items) | Castable::List(items) => pending.append(items),
            _ => {}
        }
    }
}

impl Drop for Castable {
    fn drop(&mut self) {
        let mut pending = Vec::new();
        self.take_children(&mut pending);
        while let Some(mut value) = pending.pop() {
            value.take_children(&mut pending);
        }
    }
}

enum Frame<'a> {
    /// Remaining list items, last first, and the list built so far.
    List {
        remaining: Rev<slice::Iter<'a, Castable>>,
        rest: Node,
    },
    /// The rest of a pair is built; `first` is next.
    First(&'a Castable),
    /// Both halves are built once the current value completes.
    Cons(Node),
}

fn cast(value: &Castable) -> Result<Node, CastError> {
    let mut frames: Vec<Frame<'_>> = Vec::new();
    let mut current = value;
    loop {
        let mut done = match current {
            Castable::Node(node) => node.clone(),
            Castable::None => Node::nil(),
            Castable::Pair(first, rest) => {
                frames.push(Frame::First(&**first));
                current = &**rest;
                continue;
            }
            Castable::Tuple(items) => match items.as_slice() {
                [first, rest] => {
                    frames.push(Frame::First(first));
                    current = rest;
                    continue;
                }
                _ => return Err(CastError::new(format!("tuple of {} items", items.len()))),
            },
            Castable::Int(value) => Node::atom(int_to_atom(value)),
            Castable::Point(point) => point_to_atom(point)
                .map(Node::atom)
                .map_err(|_| CastError::new(format!("{point:?}")))?,
            Castable::Bytes(bytes) => Node::atom(bytes),
            Castable::List(items) => {
                let mut remaining = items.iter().rev();
                match remaining.next() {
                    Some(last) => {
                        frames.push(Frame::List {
                            remaining,
                            rest: Node::nil(),
                        });
                        current = last;
                        continue;
                    }
                    None => Node::nil(),
                }
            }
        };
        loop {
            match frames.pop() {
                None => return Ok(done),
                Some(Frame::First(first)) => {
                    frames.push(Frame::Cons(done));
                    current = first;
                    break;
                }
                Some(Frame::Cons(rest)) => done = done.cons(rest),
                Some(Frame::List { mut remaining, rest }) => {
                    let rest = done.cons(rest);
                    match remaining.next() {
                        Some(item) => {
                            frames.push(Frame::List { remaining, rest });
                            current = item;
                            break;
                        }
                        None => done = rest,
                    }
                }
            }
        }
    }
}

impl Node {
    /// Casts a native value into a node.
    pub fn to(value: impl Into<Castable>) -> Result<Node, CastError> {
        cast(&value.into())
    }

    /// Structural equality after casting `other`; a failed cast compares unequal.
    pub fn equals(&self, other: impl Into<Castable>) -> bool {
        match Node::to(other) {
            Ok(other) => *self == other,
            Err(_) => false,
        }
    }
}

impl PartialEq<Castable> for Node {
    fn eq(&self, other: &Castable) -> bool {
        match cast(other) {
            Ok(other) => *self == other,
            Err(_) => false,
        }
    }
}

impl From<Node> for Castable {
    fn from(node: Node) -> Self {
        Castable::Node(node)
    }
}

impl From<&Node> for Castable {
    fn from(node: &Node) -> Self {
        Castable::Node(node.clone())
    }
}

impl<T: Into<Castable>> From<Option<T>> for Castable {
    fn from(value: Option<T>) -> Self {
        value.map_or(Castable::None, Into::into)
    }
}

impl<A: Into<Castable>, B: Into<Castable>> From<(A, B)> for Castable {
    fn from((first, rest): (A, B)) -> Self {
        Castable::pair(first, rest)
    }
}

impl From<Vec<u8>> for Castable {
    fn from(bytes: Vec<u8>) -> Self {
        Castable::Bytes(bytes)
    }
}

impl From<&[u8]> for Castable {
    fn from(bytes: &[u8]) -> Self {
        Castable::Bytes(bytes.to_vec())
    }
}

impl<const N: usize> From<&[u8; N]> for Castable {
    fn from(bytes: &[u8; N]) -> Self {
        Castable::Bytes(bytes.to_vec())
    }
}

impl From<BigInt> for Castable {
    fn from(value: BigInt) -> Self {
        Castable::Int(value)
    }
}

macro_rules! castable_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Castable {
                fn from(value: $t) -> Self {
                    Castable::Int(BigInt::from(value))
                }
            }
        )*
    };
}

castable_int!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

impl From<G1Affine> for Castable {
    fn from(point: G1Affine) -> Self {
        Castable::Point(point)
    }
}

impl From<Vec<Castable>> for Castable {
    fn from(items: Vec<Castable>) -> Self {
        Castable::List(items)
    }
}

impl From<Vec<Node>> for Castable {
    fn from(items: Vec<Node>) -> Self {
        Castable::list(items)
    }
}
