//! Canonical binary encoding of S-expressions.
//!
//! Pairs are written pre-order behind a `0xff` marker. The empty atom is
//! `0x80`, a single byte `0x00..=0x7f` is written verbatim, and every other
//! atom gets a length header whose leading one-bits give the header size:
//!
//! | first byte  | header bytes | max length      |
//! |-------------|--------------|-----------------|
//! | `0x80-0xbf` | 1            | `0x3f`          |
//! | `0xc0-0xdf` | 2            | `0x1fff`        |
//! | `0xe0-0xef` | 3            | `0xfffff`       |
//! | `0xf0-0xf7` | 4            | `0x7ffffff`     |
//! | `0xf8-0xfb` | 5            | `0x3ffffffff`   |
//!
//! Both directions walk the tree with an explicit stack, so input depth is
//! bounded only by memory.

use std::io::{self, Read, Write};

use thiserror::Error;

use crate::sexp::node::{Node, NodeRef};

pub const MAX_SINGLE_BYTE: u8 = 0x7f;
pub const CONS_BOX_MARKER: u8 = 0xff;
pub const NIL_MARKER: u8 = 0x80;
/// Atoms must be strictly shorter than this.
pub const MAX_ATOM_LEN: u64 = 0x4_0000_0000;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("unexpected end of input")]
    UnexpectedEnd,

    #[error("invalid atom length prefix {0:#04x}")]
    InvalidLengthPrefix(u8),

    #[error("atom length {0} exceeds maximum")]
    AtomTooLarge(u64),

    #[error("read failed: {0}")]
    Io(#[from] io::Error),
}

/// A node's payload as seen by the encoder.
pub enum Value<'a, N> {
    Atom(&'a [u8]),
    Pair(N, N),
}

/// Read access to any node representation.
pub trait SExpRead: Clone {
    fn value(&self) -> Value<'_, Self>;
}

/// Node construction used by the decoder.
pub trait NodeFactory {
    type Node;

    fn make_atom(&mut self, bytes: &[u8]) -> Self::Node;
    fn make_pair(&mut self, first: Self::Node, rest: Self::Node) -> Self::Node;
}

impl SExpRead for Node {
    fn value(&self) -> Value<'_, Node> {
        match self.view() {
            NodeRef::Atom(bytes) => Value::Atom(bytes),
            NodeRef::Pair(first, rest) => Value::Pair(first.clone(), rest.clone()),
        }
    }
}

/// Builds reference-counted [`Node`]s.
#[derive(Debug, Default, Clone, Copy)]
pub struct NodeBuilder;

impl NodeFactory for NodeBuilder {
    type Node = Node;

    fn make_atom(&mut self, bytes: &[u8]) -> Node {
        Node::atom(bytes)
    }

    fn make_pair(&mut self, first: Node, rest: Node) -> Node {
        Node::pair(first, rest)
    }
}

enum Translate<N, M> {
    Rest(N),
    Cons(M),
}

/// Rebuilds `node` through `factory`, converting between representations.
pub fn translate<N: SExpRead, F: NodeFactory>(node: &N, factory: &mut F) -> F::Node {
    let mut stack: Vec<Translate<N, F::Node>> = Vec::new();
    let mut current = node.clone();
    loop {
        let children = match current.value() {
            Value::Atom(atom) => Err(factory.make_atom(atom)),
            Value::Pair(first, rest) => Ok((first, rest)),
        };
        let mut done = match children {
            Ok((first, rest)) => {
                stack.push(Translate::Rest(rest));
                current = first;
                continue;
            }
            Err(atom) => atom,
        };
        loop {
            match stack.pop() {
                None => return done,
                Some(Translate::Rest(rest)) => {
                    stack.push(Translate::Cons(done));
                    current = rest;
                    break;
                }
                Some(Translate::Cons(first)) => done = factory.make_pair(first, done),
            }
        }
    }
}

fn encode_size(size: u64) -> Option<Vec<u8>> {
    let header = if size < 0x40 {
        vec![0x80 | size as u8]
    } else if size < 0x2000 {
        vec![0xc0 | (size >> 8) as u8, size as u8]
    } else if size < 0x10_0000 {
        vec![0xe0 | (size >> 16) as u8, (size >> 8) as u8, size as u8]
    } else if size < 0x800_0000 {
        vec![
            0xf0 | (size >> 24) as u8,
            (size >> 16) as u8,
            (size >> 8) as u8,
            size as u8,
        ]
    } else if size < MAX_ATOM_LEN {
        vec![
            0xf8 | (size >> 32) as u8,
            (size >> 24) as u8,
            (size >> 16) as u8,
            (size >> 8) as u8,
            size as u8,
        ]
    } else {
        return None;
    };
    Some(header)
}

fn write_atom<W: Write>(f: &mut W, atom: &[u8]) -> io::Result<()> {
    match atom {
        [] => return f.write_all(&[NIL_MARKER]),
        [byte] if *byte <= MAX_SINGLE_BYTE => return f.write_all(atom),
        _ => {}
    }
    let header = encode_size(atom.len() as u64).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("atom of {} bytes is too long to encode", atom.len()),
        )
    })?;
    f.write_all(&header)?;
    f.write_all(atom)
}

pub fn node_to_stream<N: SExpRead, W: Write>(node: &N, f: &mut W) -> io::Result<()> {
    let mut pending = vec![node.clone()];
    while let Some(node) = pending.pop() {
        match node.value() {
            Value::Pair(first, rest) => {
                f.write_all(&[CONS_BOX_MARKER])?;
                pending.push(rest);
                pending.push(first);
            }
            Value::Atom(atom) => write_atom(f, atom)?,
        }
    }
    Ok(())
}

pub fn node_to_bytes<N: SExpRead>(node: &N) -> io::Result<Vec<u8>> {
    let mut buffer = Vec::new();
    node_to_stream(node, &mut buffer)?;
    Ok(buffer)
}

fn read_exact<R: Read>(f: &mut R, buf: &mut [u8]) -> Result<(), DecodeError> {
    f.read_exact(buf).map_err(|err| match err.kind() {
        io::ErrorKind::UnexpectedEof => DecodeError::UnexpectedEnd,
        _ => DecodeError::Io(err),
    })
}

fn decode_size<R: Read>(f: &mut R, initial: u8) -> Result<u64, DecodeError> {
    let mut bit_count = 0;
    let mut bit_mask = 0x80u8;
    let mut b = initial;
    while b & bit_mask != 0 {
        bit_count += 1;
        b &= !bit_mask;
        bit_mask >>= 1;
    }
    if bit_count > 6 {
        return Err(DecodeError::InvalidLengthPrefix(initial));
    }
    let mut size_blob = [0u8; 6];
    size_blob[0] = b;
    read_exact(f, &mut size_blob[1..bit_count])?;
    let size = size_blob[..bit_count]
        .iter()
        .fold(0u64, |acc, &byte| (acc << 8) | u64::from(byte));
    if size >= MAX_ATOM_LEN {
        return Err(DecodeError::AtomTooLarge(size));
    }
    Ok(size)
}

fn read_atom<F: NodeFactory, R: Read>(
    f: &mut R,
    initial: u8,
    factory: &mut F,
) -> Result<F::Node, DecodeError> {
    if initial == NIL_MARKER {
        return Ok(factory.make_atom(&[]));
    }
    if initial <= MAX_SINGLE_BYTE {
        return Ok(factory.make_atom(&[initial]));
    }
    let size = decode_size(f, initial)?;
    let mut blob = Vec::new();
    f.by_ref().take(size).read_to_end(&mut blob)?;
    if blob.len() as u64 != size {
        return Err(DecodeError::UnexpectedEnd);
    }
    Ok(factory.make_atom(&blob))
}

enum Frame<N> {
    First,
    Rest(N),
}

/// Decodes one node from `f`, leaving any following bytes unread.
pub fn node_from_stream<F: NodeFactory, R: Read>(
    f: &mut R,
    factory: &mut F,
) -> Result<F::Node, DecodeError> {
    let mut stack: Vec<Frame<F::Node>> = Vec::new();
    loop {
        let mut marker = [0u8; 1];
        read_exact(f, &mut marker)?;
        if marker[0] == CONS_BOX_MARKER {
            stack.push(Frame::First);
            continue;
        }
        let mut node = read_atom(f, marker[0], factory)?;
        loop {
            match stack.pop() {
                None => return Ok(node),
                Some(Frame::First) => {
                    stack.push(Frame::Rest(node));
                    break;
                }
                Some(Frame::Rest(first)) => node = factory.make_pair(first, node),
            }
        }
    }
}

pub fn node_from_bytes<F: NodeFactory>(bytes: &[u8], factory: &mut F) -> Result<F::Node, DecodeError> {
    let mut cursor = bytes;
    node_from_stream(&mut cursor, factory)
}

impl Node {
    /// Canonical serialization of this node.
    pub fn as_bin(&self) -> io::Result<Vec<u8>> {
        node_to_bytes(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Node, DecodeError> {
        node_from_bytes(bytes, &mut NodeBuilder)
    }

    /// Copies a tree held in another node representation.
    pub fn from_sexp<N: SExpRead>(node: &N) -> Node {
        translate(node, &mut NodeBuilder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sexp::Castable;

    fn encode(node: &Node) -> Vec<u8> {
        node.as_bin().unwrap()
    }

    #[test]
    fn test_known_encodings() {
        assert_eq!(encode(&Node::nil()), vec![0x80]);
        assert_eq!(encode(&Node::atom([0x05])), vec![0x05]);
        assert_eq!(encode(&Node::atom([0x7f])), vec![0x7f]);
        assert_eq!(encode(&Node::atom([0x80])), vec![0x81, 0x80]);
        assert_eq!(encode(&Node::atom([0x00])), vec![0x00]);
        assert_eq!(encode(&Node::atom(b"hello")), b"\x85hello".to_vec());

        let pair = Node::to((1, 2)).unwrap();
        assert_eq!(encode(&pair), vec![0xff, 0x01, 0x02]);

        let list = Node::to(Castable::list([1, 2])).unwrap();
        assert_eq!(encode(&list), vec![0xff, 0x01, 0xff, 0x02, 0x80]);
    }

    #[test]
    fn test_size_class_boundaries() {
        let cases: [(usize, &[u8]); 6] = [
            (0x3f, &[0xbf]),
            (0x40, &[0xc0, 0x40]),
            (0x1fff, &[0xdf, 0xff]),
            (0x2000, &[0xe0, 0x20, 0x00]),
            (0xfffff, &[0xef, 0xff, 0xff]),
            (0x10_0000, &[0xf0, 0x10, 0x00, 0x00]),
        ];
        for (len, header) in cases {
            let atom = vec![0xaa; len];
            let bytes = encode(&Node::atom(&atom));
            assert_eq!(&bytes[..header.len()], header, "length {len:#x}");
            assert_eq!(bytes.len(), header.len() + len);
            assert_eq!(Node::from_bytes(&bytes).unwrap().as_atom().unwrap(), &atom[..]);
        }
        assert_eq!(encode_size(0x800_0000).unwrap(), vec![0xf8, 0x08, 0x00, 0x00, 0x00]);
        assert!(encode_size(MAX_ATOM_LEN).is_none());
    }

    #[test]
    fn test_decode_ignores_trailing_bytes() {
        let node = Node::from_bytes(&[0xff, 0x01, 0x80, 0x42]).unwrap();
        assert!(node.equals((1, None::<Node>)));
    }

    #[test]
    fn test_non_canonical_length_header_is_accepted() {
        // 0x81 0x05 spells the same atom as the canonical single byte 0x05.
        let node = Node::from_bytes(&[0x81, 0x05]).unwrap();
        assert_eq!(node.as_atom().unwrap(), &[0x05]);
        assert_eq!(encode(&node), vec![0x05]);
    }

    #[test]
    fn test_decode_errors() {
        assert!(matches!(Node::from_bytes(&[]), Err(DecodeError::UnexpectedEnd)));
        assert!(matches!(Node::from_bytes(&[0xff, 0x01]), Err(DecodeError::UnexpectedEnd)));
        assert!(matches!(Node::from_bytes(&[0x83, 0x01]), Err(DecodeError::UnexpectedEnd)));
        assert!(matches!(Node::from_bytes(&[0xc1]), Err(DecodeError::UnexpectedEnd)));
        assert!(matches!(
            Node::from_bytes(&[0xfe, 0, 0, 0, 0, 0, 0]),
            Err(DecodeError::InvalidLengthPrefix(0xfe))
        ));
        assert!(matches!(
            Node::from_bytes(&[0xfc, 0x04, 0x00, 0x00, 0x00, 0x00]),
            Err(DecodeError::AtomTooLarge(0x4_0000_0000))
        ));
    }

    #[test]
    fn test_deep_tree_round_trip() {
        let mut node = Node::nil();
        for _ in 0..200_000 {
            node = node.cons(Node::one());
        }
        let bytes = encode(&node);
        assert_eq!(Node::from_bytes(&bytes).unwrap(), node);
    }

    #[test]
    fn test_translate_rebuilds_deep_tree() {
        let mut node = Node::nil();
        for i in 0..200_000u32 {
            node = Node::atom(i.to_be_bytes()).cons(node).cons(Node::one());
        }
        let copy = Node::from_sexp(&node);
        assert!(!copy.ptr_eq(&node));
        assert_eq!(copy, node);
    }
}
