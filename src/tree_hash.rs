use sha2::{Digest, Sha256};

use crate::serialize::{SExpRead, Value};

const ATOM_PREFIX: u8 = 1;
const PAIR_PREFIX: u8 = 2;

enum Frame<N> {
    Rest(N),
    Combine([u8; 32]),
}

/// SHA-256 tree commitment.
///
/// An atom hashes as `sha256(0x01 || atom)`, a pair as
/// `sha256(0x02 || hash(first) || hash(rest))`.
pub fn tree_hash<N: SExpRead>(node: &N) -> [u8; 32] {
    let mut stack: Vec<Frame<N>> = Vec::new();
    let mut current = node.clone();
    loop {
        let (mut digest, children) = match current.value() {
            Value::Atom(atom) => (hash_atom(atom), None),
            Value::Pair(first, rest) => ([0; 32], Some((first, rest))),
        };
        if let Some((first, rest)) = children {
            stack.push(Frame::Rest(rest));
            current = first;
            continue;
        }
        loop {
            match stack.pop() {
                None => return digest,
                Some(Frame::Rest(rest)) => {
                    stack.push(Frame::Combine(digest));
                    current = rest;
                    break;
                }
                Some(Frame::Combine(first)) => digest = hash_pair(&first, &digest),
            }
        }
    }
}

fn hash_atom(atom: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update([ATOM_PREFIX]);
    hasher.update(atom);
    hasher.finalize().into()
}

fn hash_pair(first: &[u8; 32], rest: &[u8; 32]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update([PAIR_PREFIX]);
    hasher.update(first);
    hasher.update(rest);
    hasher.finalize().into()
}
