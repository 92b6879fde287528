//! Whole-pipeline checks: dialect source in, plain Yul text and ABI out.

use yulx::{transpile, Options};

const TOKEN: &str = r#"
pragma license "MIT"
pragma evm "london"

struct account { uint64 balance, uint24 flags := 0x1, bytes20 owner }

contract Token {
  event Transfer(address indexed from, address indexed to, uint256 amount)
  error Shortage(uint256 missing)

  constructor(uint64 supply) {
    sstore(0, supply)
    construct(Token)
  }

  method balance(address who) view returns (uint256) {
    returns(0, sload(calldata.who))
  }

  method transfer(address to, uint64 amount) returns (bool ok) {
    let mine := sload(caller())
    if lt(mine, calldata.amount) {
      throw Shortage(sub(calldata.amount, mine))
    }
    sstore(caller(), sub(mine, calldata.amount))
    sstore(calldata.to, add(sload(calldata.to), calldata.amount))
    emit Transfer(0, caller(), calldata.to, calldata.amount)
    returns(0, 1)
  }
}
"#;

#[test]
fn token_contract_transpiles_to_plain_yul() {
    let out = transpile(TOKEN, "token.yulx", Options::default()).unwrap();

    // The text is plain Yul: no dialect keywords survive.
    for forbidden in ["method ", "contract ", "struct ", "emit ", "throw ", "pragma "] {
        assert!(
            !out.yul.contains(forbidden),
            "{:?} survived:\n{}",
            forbidden,
            out.yul
        );
    }
    assert!(out.yul.contains("object \"Token\""));
    assert!(out.yul.contains("object \"TokenRuntime\""));
    assert!(out.yul.contains("function __method_transfer()"));
    assert!(out.yul.contains("function __throw_Shortage_"));

    // The emitted text re-parses: it is syntactically sound Yul.
    yulx::parse(&out.yul, "emitted.yul").unwrap();

    let abi = &out.abi.contracts["Token"];
    assert_eq!(abi.license.as_deref(), Some("MIT"));
    let signatures = abi.signatures();
    assert!(signatures
        .iter()
        .any(|s| s == "function transfer(address,uint64) returns (bool)"));
    assert!(signatures.iter().any(|s| s == "event Transfer(address,address,uint256)"));
}

#[test]
fn transpiled_output_is_stable() {
    let first = transpile(TOKEN, "token.yulx", Options::default()).unwrap();
    let second = transpile(TOKEN, "token.yulx", Options::default()).unwrap();
    assert_eq!(first.yul, second.yul);
}

#[test]
fn doc_comments_surface_from_the_stripper() {
    let out = transpile(
        "/// top-level note\nlet x := 1\n",
        "t.yulx",
        Options::default(),
    )
    .unwrap();
    assert_eq!(out.docs.values().next().map(String::as_str), Some("top-level note"));
}
