//! Conversion of nodes into generic nested native structures.

use std::iter::Rev;
use std::mem;
use std::slice;

use serde::ser::{Error as _, SerializeSeq, SerializeTuple};
use serde::{Serialize, Serializer};

use crate::sexp::cast::Castable;
use crate::sexp::node::{Node, NodeRef};

/// Deepest nesting [`NativeTree`] serializes before failing.
pub const MAX_SERIALIZE_DEPTH: usize = 256;

/// A node rendered as plain nested data.
///
/// A pair chain becomes a `List`; an improper tail is folded into a final
/// `Tuple(last_element, tail)`. Equality and teardown are iterative, so trees
/// of any depth can be compared and dropped.
#[derive(Debug, Eq)]
pub enum NativeTree {
    Atom(Vec<u8>),
    List(Vec<NativeTree>),
    Tuple(Box<NativeTree>, Box<NativeTree>),
}

struct Frame {
    items: Vec<NativeTree>,
    cursor: Node,
}

impl Node {
    pub fn to_native_tree(&self) -> NativeTree {
        if let NodeRef::Atom(bytes) = self.view() {
            return NativeTree::Atom(bytes.to_vec());
        }
        let mut frame = Frame {
            items: Vec::new(),
            cursor: self.clone(),
        };
        let mut parents: Vec<Frame> = Vec::new();
        loop {
            let next = match frame.cursor.view() {
                NodeRef::Pair(first, rest) => Some((first.clone(), rest.clone())),
                NodeRef::Atom(_) => None,
            };
            if let Some((first, rest)) = next {
                frame.cursor = rest;
                let leaf = match first.view() {
                    NodeRef::Atom(bytes) => Some(NativeTree::Atom(bytes.to_vec())),
                    NodeRef::Pair(..) => None,
                };
                match leaf {
                    Some(leaf) => frame.items.push(leaf),
                    None => {
                        let child = Frame {
                            items: Vec::new(),
                            cursor: first,
                        };
                        parents.push(mem::replace(&mut frame, child));
                    }
                }
                continue;
            }

            let Frame { mut items, cursor } = frame;
            if !cursor.is_nil() {
                if let (Some(last), NodeRef::Atom(tail)) = (items.pop(), cursor.view()) {
                    let tail = NativeTree::Atom(tail.to_vec());
                    items.push(NativeTree::Tuple(Box::new(last), Box::new(tail)));
                }
            }
            let done = NativeTree::List(items);
            match parents.pop() {
                Some(mut parent) => {
                    parent.items.push(done);
                    frame = parent;
                }
                None => return done,
            }
        }
    }
}

impl NativeTree {
    /// Rebuilds a node: lists become proper lists and tuples become pairs.
    pub fn to_node(&self) -> Node {
        let mut frames: Vec<Build<'_>> = Vec::new();
        let mut current = self;
        loop {
            let mut done = match current {
                NativeTree::Atom(bytes) => Node::atom(bytes),
                NativeTree::Tuple(first, rest) => {
                    frames.push(Build::First(&**first));
                    current = &**rest;
                    continue;
                }
                NativeTree::List(items) => {
                    let mut remaining = items.iter().rev();
                    match remaining.next() {
                        Some(last) => {
                            frames.push(Build::List {
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
                    None => return done,
                    Some(Build::First(first)) => {
                        frames.push(Build::Cons(done));
                        current = first;
                        break;
                    }
                    Some(Build::Cons(rest)) => done = done.cons(rest),
                    Some(Build::List { mut remaining, rest }) => {
                        let rest = done.cons(rest);
                        match remaining.next() {
                            Some(item) => {
                                frames.push(Build::List { remaining, rest });
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

    fn take_children(&mut self, pending: &mut Vec<NativeTree>) {
        match self {
            NativeTree::Atom(_) => {}
            NativeTree::List(items) => pending.append(items),
            NativeTree::Tuple(first, rest) => {
                pending.push(mem::replace(&mut **first, NativeTree::Atom(Vec::new())));
                pending.push(mem::replace(&mut **rest, NativeTree::Atom(Vec::new())));
            }
        }
    }
}

enum Build<'a> {
    List {
        remaining: Rev<slice::Iter<'a, NativeTree>>,
        rest: Node,
    },
    First(&'a NativeTree),
    Cons(Node),
}

impl Drop for NativeTree {
    fn drop(&mut self) {
        let mut pending = Vec::new();
        self.take_children(&mut pending);
        while let Some(mut tree) = pending.pop() {
            tree.take_children(&mut pending);
        }
    }
}

impl PartialEq for NativeTree {
    fn eq(&self, other: &NativeTree) -> bool {
        let mut pending = vec![(self, other)];
        while let Some(pair) = pending.pop() {
            match pair {
                (NativeTree::Atom(a), NativeTree::Atom(b)) => {
                    if a != b {
                        return false;
                    }
                }
                (NativeTree::List(a), NativeTree::List(b)) => {
                    if a.len() != b.len() {
                        return false;
                    }
                    pending.extend(a.iter().zip(b).rev());
                }
                (NativeTree::Tuple(a_first, a_rest), NativeTree::Tuple(b_first, b_rest)) => {
                    pending.push((&**a_rest, &**b_rest));
                    pending.push((&**a_first, &**b_first));
                }
                _ => return false,
            }
        }
        true
    }
}

// Atoms are byte arrays, lists are arrays and tuples are two-element arrays.
impl Serialize for NativeTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        Bounded { tree: self, depth: 0 }.serialize(serializer)
    }
}

struct Bounded<'a> {
    tree: &'a NativeTree,
    depth: usize,
}

impl Bounded<'_> {
    fn child<'b>(&self, tree: &'b NativeTree) -> Bounded<'b> {
        Bounded {
            tree,
            depth: self.depth + 1,
        }
    }
}

impl Serialize for Bounded<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.depth > MAX_SERIALIZE_DEPTH {
            return Err(S::Error::custom(format!(
                "native tree nested deeper than {MAX_SERIALIZE_DEPTH}"
            )));
        }
        match self.tree {
            NativeTree::Atom(bytes) => bytes.serialize(serializer),
            NativeTree::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(&self.child(item))?;
                }
                seq.end()
            }
            NativeTree::Tuple(first, rest) => {
                let mut tuple = serializer.serialize_tuple(2)?;
                tuple.serialize_element(&self.child(first))?;
                tuple.serialize_element(&self.child(rest))?;
                tuple.end()
            }
        }
    }
}

impl From<NativeTree> for Castable {
    fn from(tree: NativeTree) -> Self {
        Castable::Node(tree.to_node())
    }
}

impl From<&NativeTree> for Castable {
    fn from(tree: &NativeTree) -> Self {
        Castable::Node(tree.to_node())
    }
}
