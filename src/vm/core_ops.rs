//! Reference operator set.
//!
//! Opcodes are single-byte atoms. Quote (`1`) and environment reference
//! (`3`) are special forms handled by the evaluator itself and never appear
//! in the table.

use num_bigint::BigInt;
use num_traits::{One, Zero};
use sha2::{Digest, Sha256};

use crate::serialize::{node_to_bytes, node_to_stream};
use crate::sexp::Node;
use crate::vm::eval::EvalError;
use crate::vm::operators::OpTable;

pub const QUOTE_KW: u8 = 1;
pub const ENV_KW: u8 = 3;

pub const OP_IF: u8 = 4;
pub const OP_CONS: u8 = 5;
pub const OP_FIRST: u8 = 6;
pub const OP_REST: u8 = 7;
pub const OP_LISTP: u8 = 8;
pub const OP_RAISE: u8 = 9;
pub const OP_EQ: u8 = 10;
pub const OP_SHA256: u8 = 11;
pub const OP_ADD: u8 = 12;
pub const OP_SUBTRACT: u8 = 13;
pub const OP_MULTIPLY: u8 = 14;
pub const OP_GR: u8 = 15;
pub const OP_WRAP: u8 = 16;
pub const OP_UNWRAP: u8 = 17;
pub const OP_SHA256_TREE: u8 = 21;

type OpFn = fn(&Node) -> Result<Node, EvalError>;

static OPCODE_LOOKUP: [(u8, OpFn); 15] = [
    (OP_IF, op_if),
    (OP_CONS, op_cons),
    (OP_FIRST, op_first),
    (OP_REST, op_rest),
    (OP_LISTP, op_listp),
    (OP_RAISE, op_raise),
    (OP_EQ, op_eq),
    (OP_SHA256, op_sha256),
    (OP_ADD, op_add),
    (OP_SUBTRACT, op_subtract),
    (OP_MULTIPLY, op_multiply),
    (OP_GR, op_gr),
    (OP_WRAP, op_wrap),
    (OP_UNWRAP, op_unwrap),
    (OP_SHA256_TREE, op_sha256_tree),
];

/// Operator table holding every operator in this module.
pub fn core_operator_table() -> OpTable {
    let mut table = OpTable::new();
    for (opcode, f) in OPCODE_LOOKUP {
        table.insert([opcode], f);
    }
    table
}

fn bool_node(value: bool) -> Node {
    if value { Node::one() } else { Node::nil() }
}

fn arguments<const N: usize>(args: &Node, name: &str) -> Result<[Node; N], EvalError> {
    let items: Vec<Node> = args.iter_list().collect();
    let count = items.len();
    <[Node; N]>::try_from(items).map_err(|_| {
        EvalError::operator(
            args,
            format!("{name} takes exactly {N} argument{}, got {count}", if N == 1 { "" } else { "s" }),
        )
    })
}

fn int_argument(arg: &Node, name: &str) -> Result<BigInt, EvalError> {
    arg.as_int()
        .map_err(|_| EvalError::operator(arg, format!("{name} requires int args")))
}

pub fn op_if(args: &Node) -> Result<Node, EvalError> {
    let [cond, then, otherwise] = arguments::<3>(args, "i")?;
    Ok(if cond.is_nil() { otherwise } else { then })
}

pub fn op_cons(args: &Node) -> Result<Node, EvalError> {
    let [first, rest] = arguments::<2>(args, "c")?;
    Ok(first.cons(rest))
}

pub fn op_first(args: &Node) -> Result<Node, EvalError> {
    let [pair] = arguments::<1>(args, "f")?;
    Ok(pair.first()?)
}

pub fn op_rest(args: &Node) -> Result<Node, EvalError> {
    let [pair] = arguments::<1>(args, "r")?;
    Ok(pair.rest()?)
}

pub fn op_listp(args: &Node) -> Result<Node, EvalError> {
    let [value] = arguments::<1>(args, "l")?;
    Ok(bool_node(value.is_pair()))
}

pub fn op_raise(args: &Node) -> Result<Node, EvalError> {
    Err(EvalError::operator(args, "clvm raise"))
}

pub fn op_eq(args: &Node) -> Result<Node, EvalError> {
    let [left, right] = arguments::<2>(args, "=")?;
    match (left.as_atom(), right.as_atom()) {
        (Ok(a), Ok(b)) => Ok(bool_node(a == b)),
        _ => Err(EvalError::operator(args, "= on list")),
    }
}

pub fn op_sha256(args: &Node) -> Result<Node, EvalError> {
    let mut hasher = Sha256::new();
    for arg in args.iter_list() {
        let atom = arg
            .as_atom()
            .map_err(|_| EvalError::operator(&arg, "sha256 on list"))?;
        hasher.update(atom);
    }
    Ok(Node::atom(hasher.finalize()))
}

pub fn op_add(args: &Node) -> Result<Node, EvalError> {
    let mut total = BigInt::zero();
    for arg in args.iter_list() {
        total += int_argument(&arg, "+")?;
    }
    Ok(Node::from_int(total))
}

pub fn op_subtract(args: &Node) -> Result<Node, EvalError> {
    let mut total = BigInt::zero();
    for (index, arg) in args.iter_list().enumerate() {
        let value = int_argument(&arg, "-")?;
        if index == 0 {
            total += value;
        } else {
            total -= value;
        }
    }
    Ok(Node::from_int(total))
}

pub fn op_multiply(args: &Node) -> Result<Node, EvalError> {
    let mut total = BigInt::one();
    for arg in args.iter_list() {
        total *= int_argument(&arg, "*")?;
    }
    Ok(Node::from_int(total))
}

pub fn op_gr(args: &Node) -> Result<Node, EvalError> {
    let [left, right] = arguments::<2>(args, ">")?;
    Ok(bool_node(int_argument(&left, ">")? > int_argument(&right, ">")?))
}

pub fn op_wrap(args: &Node) -> Result<Node, EvalError> {
    let [value] = arguments::<1>(args, "wrap")?;
    let bytes = node_to_bytes(&value).map_err(|err| EvalError::operator(&value, err.to_string()))?;
    Ok(Node::atom(bytes))
}

pub fn op_unwrap(args: &Node) -> Result<Node, EvalError> {
    let [blob] = arguments::<1>(args, "unwrap")?;
    let bytes = blob
        .as_atom()
        .map_err(|_| EvalError::operator(&blob, "unwrap on list"))?;
    Ok(Node::from_bytes(bytes)?)
}

/// SHA-256 of the argument's canonical serialization.
pub fn op_sha256_tree(args: &Node) -> Result<Node, EvalError> {
    let [value] = arguments::<1>(args, "sha256tree")?;
    let mut hasher = Sha256::new();
    node_to_stream(&value, &mut hasher).map_err(|err| EvalError::operator(&value, err.to_string()))?;
    Ok(Node::atom(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sexp::Castable;
    use crate::vm::eval::ErrorKind;

    fn list(items: Castable) -> Node {
        Node::to(items).unwrap()
    }

    #[test]
    fn test_table_covers_every_opcode() {
        let table = core_operator_table();
        assert_eq!(table.len(), OPCODE_LOOKUP.len());
        assert!(!table.contains(&[QUOTE_KW]));
        assert!(!table.contains(&[ENV_KW]));
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(op_add(&list(Castable::list([1, 2, 300]))).unwrap().as_int().unwrap(), BigInt::from(303));
        assert_eq!(op_subtract(&list(Castable::list([10, 3, 4]))).unwrap().as_int().unwrap(), BigInt::from(3));
        assert_eq!(op_multiply(&list(Castable::list([-2, 7]))).unwrap().as_int().unwrap(), BigInt::from(-14));
        assert!(op_add(&Node::nil()).unwrap().is_nil());
        assert_eq!(op_multiply(&Node::nil()).unwrap(), Node::one());
        assert_eq!(op_gr(&list(Castable::list([5, -5]))).unwrap(), Node::one());
    }

    #[test]
    fn test_arithmetic_rejects_lists() {
        let args = list(Castable::list([Castable::from(1), Castable::from((2, 3))]));
        let err = op_add(&args).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Operator);
        assert_eq!(err.to_string(), "+ requires int args: (0x02 . 0x03)");
    }

    #[test]
    fn test_arity_checked() {
        let err = op_cons(&list(Castable::list([1]))).unwrap_err();
        assert!(err.to_string().starts_with("c takes exactly 2 arguments, got 1"));
    }

    #[test]
    fn test_eq_and_listp() {
        assert_eq!(op_eq(&list(Castable::list([7, 7]))).unwrap(), Node::one());
        assert!(op_eq(&list(Castable::list([7, 8]))).unwrap().is_nil());
        assert!(op_eq(&list(Castable::list([Castable::from(7), Castable::from((1, 2))]))).is_err());
        assert_eq!(op_listp(&list(Castable::list([Castable::from((1, 2))]))).unwrap(), Node::one());
    }

    #[test]
    fn test_wrap_unwrap() {
        let value = Node::to((1, (2, 3))).unwrap();
        let wrapped = op_wrap(&Node::from_list(vec![value.clone()])).unwrap();
        assert_eq!(wrapped.as_atom().unwrap(), value.as_bin().unwrap().as_slice());
        let unwrapped = op_unwrap(&Node::from_list(vec![wrapped])).unwrap();
        assert_eq!(unwrapped, value);

        let err = op_unwrap(&Node::from_list(vec![Node::atom([0xff])])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
    }

    #[test]
    fn test_sha256() {
        let digest = op_sha256(&list(Castable::list([b"ab".as_slice(), b"c".as_slice()]))).unwrap();
        let expected: [u8; 32] = Sha256::digest(b"abc").into();
        assert_eq!(digest.as_atom().unwrap(), expected.as_slice());
    }

    #[test]
    fn test_sha256_tree_hashes_serialization() {
        // (1 2 . 3) serializes to ff 01 ff 02 03
        let value = Node::to((1, (2, 3))).unwrap();
        let digest = op_sha256_tree(&Node::from_list(vec![value.clone()])).unwrap();
        let expected: [u8; 32] = Sha256::digest([0xff, 0x01, 0xff, 0x02, 0x03]).into();
        assert_eq!(digest.as_atom().unwrap(), expected.as_slice());
        assert_eq!(
            digest.as_atom().unwrap()[..4],
            [0x56, 0xf9, 0x9c, 0xa7]
        );
        assert_ne!(digest.as_atom().unwrap(), crate::tree_hash::tree_hash(&value).as_slice());
    }
}
