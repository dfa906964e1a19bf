#[cfg(test)]
mod tests {
    use ark_bls12_381::{Fr, G1Affine, G1Projective};
    use ark_ec::{CurveGroup, PrimeGroup};
    use ark_std::UniformRand;
    use clvm_core::sexp::number::{atom_to_int, int_to_atom};
    use clvm_core::{Castable, NativeTree, Node, NodeError};
    use num_bigint::BigInt;
    use rand_chacha::ChaCha8Rng;
    use rand_core::{RngCore, SeedableRng};

    #[test]
    fn test_cons_then_project() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        for _ in 0..50 {
            let a = Node::from_int(rng.next_u64() as i64);
            let b = Node::from_list(vec![Node::from_int(rng.next_u32()), Node::nil()]);
            let pair = a.cons(b.clone());
            assert_eq!(pair.first().unwrap(), a);
            assert_eq!(pair.rest().unwrap(), b);
        }
    }

    #[test]
    fn test_int_atoms_round_trip() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        for _ in 0..500 {
            let mut bytes = vec![0u8; (rng.next_u32() % 40) as usize];
            rng.fill_bytes(&mut bytes);
            let value = BigInt::from_signed_bytes_be(&bytes);
            let atom = int_to_atom(&value);
            assert_eq!(atom_to_int(&atom), value);
            assert!(atom.len() <= bytes.len().max(1));
        }
    }

    #[test]
    fn test_casting_shapes() {
        let node = Node::to(Castable::list([
            Castable::from(1),
            Castable::None,
            Castable::from(b"hi"),
            Castable::pair(2, 3),
        ]))
        .unwrap();
        assert_eq!(node.to_string(), "(0x01 () 0x6869 (0x02 . 0x03))");
        assert!(node.equals(vec![
            Node::one(),
            Node::nil(),
            Node::atom(b"hi"),
            Node::to((2, 3)).unwrap(),
        ]));

        let err = Node::to(Castable::Tuple(vec![Castable::from(1)])).unwrap_err();
        assert_eq!(err.target, "Node");
        assert!(!node.equals(Castable::Tuple(vec![])));
    }

    #[test]
    fn test_point_atoms() {
        let mut rng = ark_std::test_rng();
        let point: G1Affine = (G1Projective::generator() * Fr::rand(&mut rng)).into_affine();
        let node = Node::to(point).unwrap();
        assert_eq!(node.as_atom().unwrap().len(), 48);
        assert_eq!(node.as_bls12_381().unwrap(), point);

        let err = Node::from_int(7).as_bls12_381().unwrap_err();
        assert!(matches!(err, NodeError::InvalidPoint(_)));
    }

    #[test]
    fn test_native_tree_json() {
        // (1 (2 . 3) 4 . 5)
        let node = Node::to((1, ((2, 3), (4, 5)))).unwrap();
        let tree = node.to_native_tree();
        assert_eq!(
            tree,
            NativeTree::List(vec![
                NativeTree::Atom(vec![1]),
                NativeTree::List(vec![NativeTree::Tuple(
                    Box::new(NativeTree::Atom(vec![2])),
                    Box::new(NativeTree::Atom(vec![3])),
                )]),
                NativeTree::Tuple(Box::new(NativeTree::Atom(vec![4])), Box::new(NativeTree::Atom(vec![5]))),
            ])
        );
        assert_eq!(serde_json::to_string(&tree).unwrap(), "[[1],[[[2],[3]]],[[4],[5]]]");
    }
}
