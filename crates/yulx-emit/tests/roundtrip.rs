//! Serializer round-trip: parse → serialize → parse must reproduce the
//! tree, and the canonical shapes must stay greppable.

use pretty_assertions::assert_eq;
use yulx_emit::serialize;

fn roundtrip(source: &str) {
    let first = yulx_parser::parse(source, "roundtrip.yulx").unwrap();
    let text = serialize(&first);
    let second = yulx_parser::parse(&text, "roundtrip.yulx").unwrap();
    assert_eq!(
        first.clone().strip_locations(),
        second.strip_locations(),
        "canonical text was:\n{}",
        text
    );
}

#[test]
fn plain_yul_roundtrips() {
    roundtrip(
        "object \"Token\" {\n\
           code {\n\
             let x := add(1, 2)\n\
             if lt(x, 10) { x := 0 }\n\
             switch x case 0 { leave } default { revert(0, 0) }\n\
             for { let i := 0 } lt(i, x) { i := add(i, 1) } { mstore(i, x) }\n\
             function f(a, b) -> r { r := add(a, b) }\n\
           }\n\
           data \"blob\" hex\"00ff\"\n\
         }",
    );
}

#[test]
fn dialect_constructs_roundtrip() {
    roundtrip(
        "pragma license \"MIT\"\n\
         struct out { uint64 value, uint24 prefix := 0x160014, bytes20 hash }\n\
         enum Color { Red, Green := 5, Blue }\n\
         const fee := 1000\n\
         macro twice(x) := add(x, x)\n\
         interface IToken {\n\
           constructor(uint256 supply)\n\
           method transfer(address to, uint256 amount) returns (bool)\n\
         }\n\
         contract Vault {\n\
           event Deposit(address indexed from, uint256 amount)\n\
           error Empty()\n\
           method deposit(uint64 amount) payable locked returns (bool ok) {\n\
             emit Deposit(0, caller(), calldata.amount)\n\
             returns(0, 1)\n\
           }\n\
         }",
    );
}

#[test]
fn member_forms_roundtrip() {
    roundtrip(
        "struct s { uint8 mode, uint8 + , uint16 rest }\n\
         let x:s := struct(s, 1, @)\n\
         x->mode := 2\n\
         x->rest |= 7\n\
         let y := x->mode\n\
         let z := x:s->rest",
    );
}

#[test]
fn preprocessor_and_loops_roundtrip() {
    roundtrip(
        "@if gt(EVM_VERSION, 202304) { let a := 1 } elif 0 { let b := 2 } else { let c := 3 }\n\
         while lt(1, 2) { break }\n\
         do { continue } while iszero(0)",
    );
}

#[test]
fn interface_calls_roundtrip() {
    roundtrip(
        "interface IT { constructor(uint256 a) method ping() view returns (uint256) }\n\
         let r := call IT.ping(0x1234)\n\
         let ok, v := try call IT.ping(0x1234)\n\
         let addr := create IT(0, 1)\n\
         let addr2 := try create2 IT(0, 42, 1)",
    );
}

#[test]
fn negative_and_unit_literals_roundtrip() {
    roundtrip("let a := -1\nlet b := 2 ether\nlet c := hex\"deadbeef\"\nlet d := \"text\"");
}

#[test]
fn indentation_is_two_spaces() {
    let root = yulx_parser::parse(
        "object \"O\" { code { let x := 1 } }",
        "t.yulx",
    )
    .unwrap();
    let text = serialize(&root);
    assert_eq!(
        text,
        "object \"O\" {\n  code {\n    let x := 1\n  }\n}\n"
    );
}
