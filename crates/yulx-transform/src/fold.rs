//! Transform-time constant folding with 256-bit EVM semantics, plus the
//! identity laws that apply even when one operand stays symbolic.

use num_bigint::BigUint;
use num_traits::{One, ToPrimitive, Zero};
use yulx_core::ast::{LiteralKind, Node};
use yulx_core::errors::Result;
use yulx_core::word;

/// Numeric view of a literal node; strings and hex blobs do not fold.
pub(crate) fn literal_value(node: &Node) -> Option<BigUint> {
    match node {
        Node::Literal {
            kind: LiteralKind::HexNumber | LiteralKind::DecimalNumber,
            value,
            unit: None,
        } => word::parse_number(value).ok(),
        Node::Literal {
            kind: LiteralKind::BoolLiteral,
            value,
            ..
        } => Some(if value == "true" {
            BigUint::one()
        } else {
            BigUint::zero()
        }),
        _ => None,
    }
}

/// Render a folded constant: decimal while it stays readable, hex beyond.
pub(crate) fn make_literal(value: &BigUint) -> Node {
    match value.to_u64() {
        Some(small) => Node::num(small),
        None => Node::hex(word::to_hex(value)),
    }
}

fn is_foldable(name: &str) -> bool {
    matches!(
        name,
        "add"
            | "sub"
            | "mul"
            | "div"
            | "sdiv"
            | "mod"
            | "smod"
            | "exp"
            | "addmod"
            | "mulmod"
            | "not"
            | "and"
            | "or"
            | "xor"
            | "shl"
            | "shr"
            | "sar"
            | "signextend"
            | "byte"
            | "iszero"
            | "eq"
            | "lt"
            | "slt"
            | "gt"
            | "sgt"
    )
}

fn all_literal(name: &str, vals: &[Option<BigUint>]) -> Option<BigUint> {
    let v: Vec<&BigUint> = vals.iter().map(|o| o.as_ref()).collect::<Option<Vec<_>>>()?;
    let r = match (name, v.as_slice()) {
        ("add", [a, b]) => word::add(a, b),
        ("sub", [a, b]) => word::sub(a, b),
        ("mul", [a, b]) => word::mul(a, b),
        ("div", [a, b]) => word::div(a, b),
        ("sdiv", [a, b]) => word::sdiv(a, b),
        ("mod", [a, b]) => word::rem(a, b),
        ("smod", [a, b]) => word::srem(a, b),
        ("exp", [a, b]) => word::exp(a, b),
        ("addmod", [a, b, n]) => word::addmod(a, b, n),
        ("mulmod", [a, b, n]) => word::mulmod(a, b, n),
        ("not", [a]) => word::not(a),
        ("and", [a, b]) => word::and(a, b),
        ("or", [a, b]) => word::or(a, b),
        ("xor", [a, b]) => word::xor(a, b),
        ("shl", [s, v]) => word::shl(s, v),
        ("shr", [s, v]) => word::shr(s, v),
        ("sar", [s, v]) => word::sar(s, v),
        ("signextend", [b, x]) => word::signextend(b, x),
        ("byte", [i, x]) => word::byte(i, x),
        ("iszero", [a]) => word::iszero(a),
        ("eq", [a, b]) => word::eq(a, b),
        ("lt", [a, b]) => word::lt(a, b),
        ("slt", [a, b]) => word::slt(a, b),
        ("gt", [a, b]) => word::gt(a, b),
        ("sgt", [a, b]) => word::sgt(a, b),
        _ => return None,
    };
    Some(r)
}

/// Neutral/absorbing element laws that hold whatever the other operand is.
fn identity(name: &str, args: &[Node], vals: &[Option<BigUint>]) -> Option<Node> {
    let lit = |i: usize| vals.get(i).and_then(|v| v.clone());
    let zero = |i: usize| lit(i).map(|v| v.is_zero()).unwrap_or(false);
    let one = |i: usize| lit(i).map(|v| v.is_one()).unwrap_or(false);
    match name {
        "add" if zero(0) => Some(args[1].clone()),
        "add" if zero(1) => Some(args[0].clone()),
        "sub" if zero(1) => Some(args[0].clone()),
        "mul" if zero(0) || zero(1) => Some(Node::num(0)),
        "mul" if one(0) => Some(args[1].clone()),
        "mul" if one(1) => Some(args[0].clone()),
        "div" if one(1) => Some(args[0].clone()),
        "div" if zero(0) => Some(Node::num(0)),
        "mod" if one(1) => Some(Node::num(0)),
        "and" if zero(0) || zero(1) => Some(Node::num(0)),
        "or" if zero(0) => Some(args[1].clone()),
        "or" if zero(1) => Some(args[0].clone()),
        "xor" if zero(0) => Some(args[1].clone()),
        "xor" if zero(1) => Some(args[0].clone()),
        "shl" | "shr" | "sar" if zero(0) => Some(args[1].clone()),
        "exp" if zero(1) => Some(Node::num(1)),
        "exp" if one(1) => Some(args[0].clone()),
        "exp" if one(0) => Some(Node::num(1)),
        _ => None,
    }
}

/// `iszero` over a literal-bounded comparison flips into the complementary
/// comparison, saving the extra op.
fn iszero_rewrite(args: &[Node]) -> Option<Node> {
    let inner = match args {
        [Node::FunctionCall {
            name,
            args: inner_args,
            ..
        }] if inner_args.len() == 2 => Some((name.as_str(), inner_args)),
        _ => None,
    }?;
    let (name, inner_args) = inner;
    let bound = literal_value(&inner_args[1])?;
    match name {
        "lt" if !bound.is_zero() => {
            let shifted = word::sub(&bound, &BigUint::one());
            Some(Node::call(
                "gt",
                vec![inner_args[0].clone(), make_literal(&shifted)],
            ))
        }
        "gt" if bound < *word::MAX => {
            let shifted = word::add(&bound, &BigUint::one());
            Some(Node::call(
                "lt",
                vec![inner_args[0].clone(), make_literal(&shifted)],
            ))
        }
        _ => None,
    }
}

/// Fold a call to a Yul opcode. Returns None when the call must survive to
/// runtime.
pub(crate) fn fold_call(name: &str, args: &[Node]) -> Result<Option<Node>> {
    if !is_foldable(name) {
        return Ok(None);
    }
    let vals: Vec<Option<BigUint>> = args.iter().map(literal_value).collect();
    if let Some(value) = all_literal(name, &vals) {
        return Ok(Some(make_literal(&value)));
    }
    if let Some(node) = identity(name, args, &vals) {
        return Ok(Some(node));
    }
    if name == "iszero" {
        if let Some(node) = iszero_rewrite(args) {
            return Ok(Some(node));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(n: &Node) -> String {
        match n {
            Node::Literal { value, .. } => value.clone(),
            other => panic!("not a literal: {:?}", other),
        }
    }

    #[test]
    fn full_literal_folds() {
        let r = fold_call("add", &[Node::num(2), Node::num(1)]).unwrap().unwrap();
        assert_eq!(lit(&r), "3");
        let r = fold_call("shl", &[Node::num(224), Node::num(1)]).unwrap().unwrap();
        assert_eq!(lit(&r), "0x100000000000000000000000000000000000000000000000000000000");
        let r = fold_call("sub", &[Node::num(0), Node::num(1)]).unwrap().unwrap();
        assert_eq!(
            lit(&r),
            "0xffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff"
        );
    }

    #[test]
    fn identity_laws_apply_with_symbolic_operands() {
        let x = Node::ident("x");
        let r = fold_call("add", &[x.clone(), Node::num(0)]).unwrap().unwrap();
        assert_eq!(r, x);
        let r = fold_call("mul", &[Node::num(0), x.clone()]).unwrap().unwrap();
        assert_eq!(lit(&r), "0");
        let r = fold_call("shl", &[Node::num(0), x.clone()]).unwrap().unwrap();
        assert_eq!(r, x);
        assert!(fold_call("add", &[x.clone(), Node::num(2)]).unwrap().is_none());
    }

    #[test]
    fn iszero_comparison_flips() {
        let inner = Node::call("lt", vec![Node::ident("x"), Node::num(8)]);
        let r = fold_call("iszero", &[inner]).unwrap().unwrap();
        match &r {
            Node::FunctionCall { name, args, .. } => {
                assert_eq!(name, "gt");
                assert_eq!(lit(&args[1]), "7");
            }
            other => panic!("unexpected: {:?}", other),
        }
        let inner = Node::call("gt", vec![Node::ident("x"), Node::num(8)]);
        let r = fold_call("iszero", &[inner]).unwrap().unwrap();
        match &r {
            Node::FunctionCall { name, args, .. } => {
                assert_eq!(name, "lt");
                assert_eq!(lit(&args[1]), "9");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn division_by_zero_folds_to_zero() {
        let r = fold_call("div", &[Node::num(7), Node::num(0)]).unwrap().unwrap();
        assert_eq!(lit(&r), "0");
        let r = fold_call("mod", &[Node::num(7), Node::num(0)]).unwrap().unwrap();
        assert_eq!(lit(&r), "0");
    }
}
