//! Numeric interpretations of atoms.
//!
//! Integers use signed big-endian two's complement with no redundant
//! sign-extension bytes; zero is the empty atom. BLS12-381 G1 points use
//! their 48-byte compressed form.

use ark_bls12_381::G1Affine;
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize, SerializationError};
use num_bigint::BigInt;
use num_traits::Zero;

use crate::sexp::node::{Node, NodeError};

/// Size of a compressed G1 point atom.
pub const G1_COMPRESSED_SIZE: usize = 48;

/// Encodes `value` as its minimal signed big-endian atom.
pub fn int_to_atom(value: &BigInt) -> Vec<u8> {
    if value.is_zero() {
        return Vec::new();
    }
    let mut bytes = value.to_signed_bytes_be();
    let mut start = 0;
    while bytes.len() - start > 1 {
        let sign_byte = if bytes[start + 1] & 0x80 != 0 { 0xff } else { 0x00 };
        if bytes[start] != sign_byte {
            break;
        }
        start += 1;
    }
    bytes.drain(..start);
    bytes
}

/// Reads an atom as a signed big-endian integer. The empty atom is zero.
pub fn atom_to_int(atom: &[u8]) -> BigInt {
    BigInt::from_signed_bytes_be(atom)
}

pub fn point_to_atom(point: &G1Affine) -> Result<Vec<u8>, SerializationError> {
    let mut bytes = Vec::with_capacity(G1_COMPRESSED_SIZE);
    point.serialize_compressed(&mut bytes)?;
    Ok(bytes)
}

/// Decodes a compressed G1 point, checking it lies in the prime-order subgroup.
pub fn atom_to_point(atom: &[u8]) -> Option<G1Affine> {
    if atom.len() != G1_COMPRESSED_SIZE {
        return None;
    }
    G1Affine::deserialize_compressed(atom).ok()
}

impl Node {
    pub fn from_int(value: impl Into<BigInt>) -> Node {
        Node::atom(int_to_atom(&value.into()))
    }

    pub fn as_int(&self) -> Result<BigInt, NodeError> {
        Ok(atom_to_int(self.as_atom()?))
    }

    pub fn as_bls12_381(&self) -> Result<G1Affine, NodeError> {
        atom_to_point(self.as_atom()?).ok_or_else(|| NodeError::InvalidPoint(self.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_bls12_381::{Fr, G1Projective};
    use ark_ec::{CurveGroup, PrimeGroup};
    use ark_std::UniformRand;
    use rand::Rng;

    #[test]
    fn test_int_encoding_vectors() {
        let cases: [(i64, &[u8]); 11] = [
            (0, &[]),
            (1, &[0x01]),
            (-1, &[0xff]),
            (127, &[0x7f]),
            (128, &[0x00, 0x80]),
            (-128, &[0x80]),
            (-129, &[0xff, 0x7f]),
            (255, &[0x00, 0xff]),
            (256, &[0x01, 0x00]),
            (-256, &[0xff, 0x00]),
            (0x7fff_ffff, &[0x7f, 0xff, 0xff, 0xff]),
        ];
        for (value, atom) in cases {
            assert_eq!(int_to_atom(&BigInt::from(value)), atom, "encoding {value}");
            assert_eq!(atom_to_int(atom), BigInt::from(value), "decoding {value}");
        }
    }

    #[test]
    fn test_int_round_trip_random() {
        let mut rng = rand::thread_rng();
        for _ in 0..1000 {
            let value = BigInt::from(rng.r#gen::<i64>()) * BigInt::from(rng.r#gen::<i64>());
            assert_eq!(atom_to_int(&int_to_atom(&value)), value);
        }
    }

    #[test]
    fn test_minimal_atom_round_trip() {
        // Every minimal two-byte atom survives atom -> int -> atom.
        for hi in 0..=255u8 {
            for lo in [0x00, 0x7f, 0x80, 0xff] {
                let atom = [hi, lo];
                let redundant = (hi == 0x00 && lo & 0x80 == 0) || (hi == 0xff && lo & 0x80 != 0);
                if redundant {
                    continue;
                }
                assert_eq!(int_to_atom(&atom_to_int(&atom)), atom);
            }
        }
    }

    #[test]
    fn test_node_int_accessors() {
        let node = Node::from_int(-300);
        assert_eq!(node.as_atom().unwrap(), &[0xfe, 0xd4]);
        assert_eq!(node.as_int().unwrap(), BigInt::from(-300));
        assert!(Node::from_int(0).is_nil());

        let pair = Node::one().cons(Node::nil());
        assert!(matches!(pair.as_int(), Err(NodeError::NotAnAtom(_))));
    }

    #[test]
    fn test_g1_point_round_trip() {
        let mut rng = ark_std::test_rng();
        let point = (G1Projective::generator() * Fr::rand(&mut rng)).into_affine();
        let atom = point_to_atom(&point).unwrap();
        assert_eq!(atom.len(), G1_COMPRESSED_SIZE);

        let node = Node::atom(&atom);
        assert_eq!(node.as_bls12_381().unwrap(), point);
    }

    #[test]
    fn test_invalid_point() {
        let node = Node::atom([0u8; 47]);
        assert!(matches!(node.as_bls12_381(), Err(NodeError::InvalidPoint(_))));
    }
}
