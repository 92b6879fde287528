use crate::abi::{AbiItem, ContractAbi};
use crate::ast::{Mutability, Param, Visibility};
use crate::sig::{keccak256, ErrorSig, MethodSig};
use crate::types::AbiType;

fn sig(name: &str, types: &[&str]) -> MethodSig {
    MethodSig {
        name: name.into(),
        params: types
            .iter()
            .map(|t| Param {
                ty: AbiType::parse(t).unwrap(),
                name: None,
            })
            .collect(),
        returns: vec![],
        visibility: Visibility::External,
        mutability: Mutability::NonPayable,
        locked: false,
    }
}

#[test]
fn selector_is_the_digest_head() {
    let m = sig("foobar", &["uint32", "uint64", "bytes32[]"]);
    assert_eq!(m.preimage(), "foobar(uint32,uint64,bytes32[])");
    let digest = keccak256(m.preimage().as_bytes());
    let expected = u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]);
    assert_eq!(m.selector(), expected);
}

#[test]
fn bare_int_types_collapse_in_the_preimage() {
    let a = sig("f", &["uint", "int", "uint[]"]);
    let b = sig("f", &["uint256", "int256", "uint256[]"]);
    assert_eq!(a.selector(), b.selector());
}

#[test]
fn calldata_offsets_step_by_32() {
    let m = sig("foobar", &["uint32", "uint64", "bytes32[]"]);
    assert_eq!(m.param_offset(0), 4);
    assert_eq!(m.param_offset(1), 36);
    assert_eq!(m.param_offset(2), 68);
    assert_eq!(m.call_size(), 100);
}

#[test]
fn error_selector_collision_is_rejected_per_kind() {
    let mut abi = ContractAbi::new("C");
    let e = ErrorSig {
        name: "Shortage".into(),
        params: vec![],
    };
    abi.add(AbiItem::error(&e)).unwrap();
    // Same selector under kind Error collides; a function with the same
    // name does not (different kind).
    assert!(abi.add(AbiItem::error(&e)).is_err());
    abi.add(AbiItem::function(&sig("Shortage", &[]))).unwrap();
}
