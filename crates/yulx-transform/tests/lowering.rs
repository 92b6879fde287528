//! End-to-end lowering checks over serialized output.

use yulx_core::errors::Error;
use yulx_core::word;
use yulx_transform::{transform, Options};

fn lower(source: &str) -> String {
    lower_with(source, Options::default())
}

fn lower_with(source: &str, options: Options) -> String {
    let output = transform(source, "test.yulx", options).unwrap();
    yulx_emit::serialize(&output.ast)
}

fn lower_err(source: &str) -> Error {
    transform(source, "test.yulx", Options::default()).unwrap_err()
}

#[test]
fn constants_fold_through_uses() {
    let out = lower("const x := 1\nconst y := 2\nlet z := add(x, y)");
    assert!(out.contains("let z := 3"), "got:\n{}", out);
}

#[test]
fn struct_initializer_folds_to_one_literal() {
    let out = lower(
        "struct btc_output { uint64 value, uint24 prefix := 0x160014, bytes20 hash }\n\
         let o := struct(btc_output, 100000000, @, 0xdeadbeef00000000000000000000000000000000)",
    );
    let value = word::parse_number("100000000").unwrap();
    let prefix = word::parse_number("0x160014").unwrap();
    let hash = word::parse_number("0xdeadbeef00000000000000000000000000000000").unwrap();
    let expected = word::or(
        &word::or(
            &word::shl(&word::from_u64(192), &value),
            &word::shl(&word::from_u64(168), &prefix),
        ),
        &word::shl(&word::from_u64(8), &hash),
    );
    assert!(
        out.contains(&format!("let o := {}", word::to_hex(&expected))),
        "got:\n{}",
        out
    );
}

#[test]
fn member_reads_use_shift_and_mask() {
    let out = lower(
        "struct s { uint64 value, uint24 prefix, bytes20 hash }\n\
         let x:s := struct(s)\n\
         let top := x->value\n\
         let mid := x->prefix\n\
         let low := x->hash",
    );
    // Topmost member: shift without mask.
    assert!(out.contains("let top := shr(192, x)"), "got:\n{}", out);
    // Middle member: shift and mask.
    assert!(out.contains("let mid := and(shr(168, x), 16777215)"), "got:\n{}", out);
    // hash sits 8 bits above the low end, so both shift and mask apply.
    assert!(
        out.contains("let low := and(shr(8, x), 0xffffffffffffffffffffffffffffffffffffffff)"),
        "got:\n{}",
        out
    );
}

#[test]
fn byte_aligned_single_byte_member_reads_via_byte() {
    let out = lower(
        "struct flags { uint16 head, uint8 mode, uint8 tail }\n\
         let x:flags := struct(flags)\n\
         let m := x->mode",
    );
    assert!(out.contains("let m := byte(2, x)"), "got:\n{}", out);
}

#[test]
fn member_writes_clear_then_or() {
    let out = lower(
        "struct s { uint8 a, uint8 b }\n\
         let x:s := struct(s)\n\
         x->a := 3\n\
         x->b |= mload(0)",
    );
    // := clears the member's bits, then ORs the shifted value in.
    assert!(out.contains("x := or(and(x, "), "got:\n{}", out);
    assert!(out.contains("x := or(x, shl(240, mload(0)))"), "got:\n{}", out);
}

#[test]
fn calldata_bindings_follow_the_slot_layout() {
    let out = lower(
        "contract C {\n\
           method foobar(uint32 id, uint64 amount, bytes32[] hashes) {\n\
             let a := calldata.id\n\
             let b := calldata.amount\n\
             let c := calldata.hashes\n\
             let d := &calldata.id\n\
           }\n\
         }",
    );
    assert!(out.contains("let a := shr(224, calldataload(4))"), "got:\n{}", out);
    assert!(out.contains("let b := shr(192, calldataload(36))"), "got:\n{}", out);
    assert!(out.contains("let c := add(calldataload(68), 4)"), "got:\n{}", out);
    assert!(out.contains("let d := 4"), "got:\n{}", out);
}

#[test]
fn throw_error_uses_revert32_and_emits_it_once() {
    let out = lower(
        "contract C {\n\
           method f(uint256 x) {\n\
             if x { throw Error(\"overflow\") }\n\
             if iszero(x) { throw Error(\"overflow\") }\n\
           }\n\
         }",
    );
    assert!(
        out.contains("__revert32(\"overflow\", 8)"),
        "got:\n{}",
        out
    );
    assert_eq!(
        out.matches("function __revert32(").count(),
        1,
        "got:\n{}",
        out
    );
}

#[test]
fn literal_keccak_folds_at_transform_time() {
    let out = lower("let h := keccak256(hex\"deadbeef\")");
    let digest = yulx_core::keccak256(&[0xde, 0xad, 0xbe, 0xef]);
    let expected = word::to_hex(&num_bigint::BigUint::from_bytes_be(&digest));
    assert!(out.contains(&format!("let h := {}", expected)), "got:\n{}", out);
}

#[test]
fn preprocessor_fold_selects_by_hardfork() {
    let shanghai = Options {
        hardfork: Some("shanghai".into()),
        ..Options::default()
    };
    let out = lower_with(
        "@if gt(EVM_VERSION, 202304) { let a := 1 } else { let b := 2 }",
        shanghai,
    );
    assert!(!out.contains("let a"), "got:\n{}", out);
    assert!(out.contains("let b := 2"), "got:\n{}", out);

    let cancun = Options {
        hardfork: Some("cancun".into()),
        ..Options::default()
    };
    let out = lower_with(
        "@if gt(EVM_VERSION, 202304) { let a := 1 } else { let b := 2 }",
        cancun,
    );
    assert!(out.contains("let a := 1"), "got:\n{}", out);
}

#[test]
fn preprocessor_requires_literal_conditions() {
    let err = lower_err("@if mload(0) { let a := 1 }");
    assert!(matches!(err, Error::Type(_)), "got: {:?}", err);
}

#[test]
fn locked_methods_wrap_in_the_mutex() {
    let out = lower(
        "contract C {\n\
           pragma lock \"0xbeef\"\n\
           method guarded() locked { leave }\n\
         }",
    );
    let case_pos = out.find("mutex.lock()").expect("lock call");
    let call_pos = out.find("__method_guarded()").expect("method call");
    let unlock_pos = out.find("mutex.unlock()").expect("unlock call");
    assert!(case_pos < call_pos && call_pos < unlock_pos, "got:\n{}", out);
    // The key function is materialised and padded against inlining.
    assert!(out.contains("function __mutex() -> k"), "got:\n{}", out);
    assert!(out.contains("verbatim_0i_0o(hex\"3850\")"), "got:\n{}", out);
}

#[test]
fn noinline_functions_get_padded_past_the_threshold() {
    let out = lower("function f() noinline -> r { r := 1 }\nlet x := f()");
    // Weight 1 (the literal) tops up to the zero-arg threshold of 8.
    assert_eq!(
        out.matches("verbatim_0i_0o(hex\"3850\")").count(),
        7,
        "got:\n{}",
        out
    );
}

#[test]
fn dispatcher_covers_selectors_receive_and_fallback() {
    let out = lower(
        "contract C {\n\
           method ping() returns (uint256) { returns(0, 1) }\n\
           method receive() payable { leave }\n\
           method fallback() { leave }\n\
         }",
    );
    assert!(out.contains("if lt(calldatasize(), 4)"), "got:\n{}", out);
    assert!(out.contains("if iszero(calldatasize())"), "got:\n{}", out);
    assert!(out.contains("__method_receive()"), "got:\n{}", out);
    assert!(out.contains("__method_fallback()"), "got:\n{}", out);
    assert!(out.contains("switch shr(224, calldataload(0))"), "got:\n{}", out);
    // ping() selector
    let sel = {
        let digest = yulx_core::keccak256(b"ping()");
        u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]])
    };
    assert!(out.contains(&format!("case 0x{:08x}", sel)), "got:\n{}", out);
    assert!(out.contains("stop()"), "got:\n{}", out);
}

#[test]
fn contract_desugars_to_nested_objects() {
    let plain = lower("contract Token { method ping() { leave } }");
    assert!(plain.contains("object \"Token\""), "got:\n{}", plain);
    assert!(plain.contains("object \"TokenRuntime\""), "got:\n{}", plain);

    let optimized = lower("contract Token optimize { method ping() { leave } }");
    assert!(
        optimized.contains("object \"TokenRuntime_deployed\""),
        "got:\n{}",
        optimized
    );
}

#[test]
fn constructor_decodes_the_argument_tail() {
    let out = lower(
        "contract C {\n\
           constructor(uint64 supply, bytes32[] owners) {\n\
             construct(C)\n\
           }\n\
           method ping() { leave }\n\
         }",
    );
    assert!(out.contains("let __argSize := sub(codesize(), __programSize)"), "got:\n{}", out);
    assert!(out.contains("codecopy(0, __programSize, __argSize)"), "got:\n{}", out);
    // An array parameter relaxes the length check to a lower bound.
    assert!(out.contains("if lt(__argSize, 64)"), "got:\n{}", out);
    assert!(out.contains("let supply := shr(192, mload(0))"), "got:\n{}", out);
    assert!(out.contains("__check_memory_array(owners, __argSize)"), "got:\n{}", out);
    assert!(out.contains("datacopy(0, dataoffset(\"CRuntime\"), datasize(\"CRuntime\"))"), "got:\n{}", out);
}

#[test]
fn storeimmutable_releases_through_construct() {
    let out = lower(
        "contract C {\n\
           constructor(uint256 owner) {\n\
             storeimmutable(\"owner\", owner)\n\
             construct(C)\n\
           }\n\
           method ping() { leave }\n\
         }",
    );
    assert!(
        out.contains("setimmutable(0, \"owner\", owner)"),
        "got:\n{}",
        out
    );
}

#[test]
fn interface_calls_lower_to_thunks() {
    let out = lower(
        "interface IToken {\n\
           constructor(uint256 supply)\n\
           method transfer(address to, uint256 amount) returns (bool)\n\
           method total() view returns (uint256)\n\
         }\n\
         object \"Caller\" {\n\
           code {\n\
             let ok := call IToken.transfer(0x1234, 0x99, 7)\n\
             let worked, v := try call IToken.total(0x1234)\n\
             let addr := create IToken(0, 1000)\n\
           }\n\
         }",
    );
    assert!(out.contains("__icall_IToken_transfer(0x1234, 0x99, 7)"), "got:\n{}", out);
    assert!(out.contains("function __icall_IToken_transfer(__to, __a0, __a1) -> __r0"), "got:\n{}", out);
    assert!(out.contains("function __itrycall_IToken_total(__to) -> __ok, __r0"), "got:\n{}", out);
    // view methods go through staticcall; mutating ones through call.
    assert!(out.contains("staticcall(gas(), __to, 0, 4, 0, 32)"), "got:\n{}", out);
    assert!(out.contains("call(gas(), __to, 0, 0, 68, 0, 32)"), "got:\n{}", out);
    assert!(out.contains("function __icreate_IToken(__value, __c0) -> __addr"), "got:\n{}", out);
    assert!(out.contains("datacopy(0, dataoffset(\"IToken\"), __size)"), "got:\n{}", out);
}

#[test]
fn inline_events_log_in_place() {
    let out = lower(
        "contract C {\n\
           event Transfer(address indexed from, address indexed to, uint256 amount)\n\
           method f(uint256 amount) {\n\
             emit Transfer(0x80, caller(), 0x99, calldata.amount)\n\
           }\n\
         }",
    );
    let topic = word::to_hex(&{
        let digest = yulx_core::keccak256(b"Transfer(address,address,uint256)");
        num_bigint::BigUint::from_bytes_be(&digest)
    });
    assert!(out.contains("mstore(0x80, calldataload(4))"), "got:\n{}", out);
    assert!(
        out.contains(&format!("log3(0x80, 32, {}, caller(), 0x99)", topic)),
        "got:\n{}",
        out
    );
}

#[test]
fn noinline_events_materialise_an_emitter() {
    let out = lower(
        "contract C {\n\
           event Ping(uint256 v) noinline\n\
           method f(uint256 x) {\n\
             emit Ping(0, x)\n\
           }\n\
         }",
    );
    assert!(out.contains("__emit_Ping_"), "got:\n{}", out);
    assert!(out.contains("function __emit_Ping_"), "got:\n{}", out);
}

#[test]
fn packed_events_drop_the_padding() {
    let out = lower(
        "contract C {\n\
           event Tight(uint64 a, uint32 b) packed\n\
           method f() {\n\
             emit Tight(0, 1, 2)\n\
           }\n\
         }",
    );
    assert!(out.contains("mstore(0, shl(192, 1))"), "got:\n{}", out);
    assert!(out.contains("mstore(8, shl(224, 2))"), "got:\n{}", out);
    assert!(out.contains("log1(0, 12, "), "got:\n{}", out);
}

#[test]
fn enums_define_scoped_constants() {
    let out = lower("enum Color { Red, Green := 5, Blue }\nlet x := Color.Blue");
    assert!(out.contains("let x := 6"), "got:\n{}", out);
}

#[test]
fn macros_substitute_positionally() {
    let out = lower("macro twice(v) := add(v, v)\nlet x := twice(mload(0))");
    assert!(out.contains("let x := add(mload(0), mload(0))"), "got:\n{}", out);
}

#[test]
fn statement_macros_splice_into_the_block() {
    let out = lower(
        "macro bump(slot) { sstore(slot, add(sload(slot), 1)) }\n\
         bump(7)",
    );
    assert!(out.contains("sstore(7, add(sload(7), 1))"), "got:\n{}", out);
}

#[test]
fn defined_and_undefine_reflect_macro_state() {
    let out = lower(
        "macro FEATURE := 1\n\
         @if defined(FEATURE) { let a := 1 }\n\
         undefine(FEATURE)\n\
         @if defined(FEATURE) { let b := 2 } else { let c := 3 }",
    );
    assert!(out.contains("let a := 1"), "got:\n{}", out);
    assert!(!out.contains("let b"), "got:\n{}", out);
    assert!(out.contains("let c := 3"), "got:\n{}", out);
}

#[test]
fn require_lowers_to_guarded_reverts() {
    let out = lower("require.eq(mload(0), 5)\nrequire.caller(0x1234, \"not you\")");
    assert!(
        out.contains("if iszero(eq(mload(0), 5)) {\n  revert(0, 0)\n}"),
        "got:\n{}",
        out
    );
    assert!(
        out.contains("if iszero(eq(caller(), 0x1234)) {\n  __revert32(\"not you\", 7)\n}"),
        "got:\n{}",
        out
    );
}

#[test]
fn assert_and_debug_depend_on_the_debug_flag() {
    let debug = Options {
        debug: true,
        ..Options::default()
    };
    let out = lower_with("assert(mload(0))\ndebug(1)", debug);
    assert!(out.contains("__panic(1)"), "got:\n{}", out);
    assert!(out.contains("log2(0, 0, "), "got:\n{}", out);

    let out = lower("assert(mload(0))\ndebug(1)");
    assert!(!out.contains("__panic"), "got:\n{}", out);
    assert!(!out.contains("log2"), "got:\n{}", out);
}

#[test]
fn debug_builds_stamp_require_sites() {
    let debug = Options {
        debug: true,
        ..Options::default()
    };
    let out = lower_with("require.ok(mload(0))", debug);
    // The bare revert becomes an Error(string) with the call site.
    assert!(out.contains("__revert32("), "got:\n{}", out);
    let out = lower("require.ok(mload(0))");
    assert!(out.contains("revert(0, 0)"), "got:\n{}", out);
}

#[test]
fn eth_transfer_checks_the_call() {
    let out = lower("eth.send(0x11, 5)\neth.transfer(0x22, 7)");
    assert!(
        out.contains("pop(call(gas(), 0x11, 5, 0, 0, 0, 0))"),
        "got:\n{}",
        out
    );
    assert!(
        out.contains("if iszero(call(gas(), 0x22, 7, 0, 0, 0, 0))"),
        "got:\n{}",
        out
    );
}

#[test]
fn mcopy_gates_on_the_hardfork() {
    let shanghai = Options {
        hardfork: Some("shanghai".into()),
        ..Options::default()
    };
    let out = lower_with("mcopy(0, 0x20, 0x40)", shanghai);
    assert!(out.contains("__mcopy(0, 0x20, 0x40)"), "got:\n{}", out);
    assert!(out.contains("function __mcopy("), "got:\n{}", out);

    let out = lower("mcopy(0, 0x20, 0x40)");
    assert!(out.contains("mcopy(0, 0x20, 0x40)"), "got:\n{}", out);
    assert!(!out.contains("__mcopy"), "got:\n{}", out);
}

#[test]
fn static_aborts_fail_the_transform() {
    assert!(matches!(
        lower_err("revert.static(\"nope\")"),
        Error::StaticAbort(_)
    ));
    assert!(matches!(
        lower_err("assert.static(0, \"broken invariant\")"),
        Error::StaticAbort(_)
    ));
    let out = lower("assert.static(1)");
    assert!(!out.contains("assert"), "got:\n{}", out);
}

#[test]
fn version_pragmas_check_the_configured_compiler() {
    let opts = Options {
        solc_version: Some("0.8.24".into()),
        ..Options::default()
    };
    assert!(transform("pragma solc \"^0.8\"", "t.yulx", opts.clone()).is_ok());
    let err = transform("pragma solc \"^0.7\"", "t.yulx", opts).unwrap_err();
    assert!(matches!(err, Error::Version(_)), "got: {:?}", err);
}

#[test]
fn evm_pragma_is_a_minimum() {
    let shanghai = Options {
        hardfork: Some("shanghai".into()),
        ..Options::default()
    };
    let err = transform("pragma evm \"cancun\"", "t.yulx", shanghai).unwrap_err();
    assert!(matches!(err, Error::Version(_)), "got: {:?}", err);
    assert!(transform("pragma evm \"london\"", "t.yulx", Options::default()).is_ok());
}

#[test]
fn units_scale_literals() {
    let out = lower("let fee := 2 gwei\nlet dur := 3 days");
    assert!(out.contains("let fee := 2000000000"), "got:\n{}", out);
    assert!(out.contains("let dur := 259200"), "got:\n{}", out);
}

#[test]
fn negative_literals_materialise_twos_complement() {
    let out = lower("let x := -2");
    assert!(
        out.contains("let x := 0xfffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffe"),
        "got:\n{}",
        out
    );
}

#[test]
fn includes_splice_and_are_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let lib = dir.path().join("lib.yulx");
    std::fs::write(&lib, "const shared := 42\n").unwrap();
    let main = "include(\"lib.yulx\")\ninclude(\"lib.yulx\")\nlet x := shared".to_string();
    let main_path = dir.path().join("main.yulx");
    std::fs::write(&main_path, &main).unwrap();
    let output = transform(&main, main_path.to_str().unwrap(), Options::default()).unwrap();
    let text = yulx_emit::serialize(&output.ast);
    assert!(text.contains("let x := 42"), "got:\n{}", text);
}

#[test]
fn metadata_blob_lands_in_the_runtime_object() {
    let opts = Options {
        metadata: true,
        ..Options::default()
    };
    let out = lower_with("contract C { method ping() { leave } }", opts);
    assert!(out.contains("data \".metadata\" hex\""), "got:\n{}", out);
}

#[test]
fn abi_collects_the_contract_surface() {
    let output = transform(
        "pragma license \"MIT\"\n\
         contract Token {\n\
           event Transfer(address indexed from, address indexed to, uint256 amount)\n\
           error Shortage(uint256 missing)\n\
           constructor(uint256 supply) { construct(Token) }\n\
           method transfer(address to, uint256 amount) returns (bool) { returns(0, 1) }\n\
         }",
        "t.yulx",
        Options::default(),
    )
    .unwrap();
    let abi = &output.abi.contracts["Token"];
    let hashes = abi.hash_list();
    assert!(hashes
        .iter()
        .any(|h| h == "0xa9059cbb transfer(address,uint256)"));
    let json = abi.to_json();
    let kinds: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["type"].as_str().unwrap())
        .collect();
    assert!(kinds.contains(&"function"));
    assert!(kinds.contains(&"event"));
    assert!(kinds.contains(&"error"));
    assert!(kinds.contains(&"constructor"));
    let stub = abi.interface_source();
    assert!(stub.contains("// SPDX-License-Identifier: MIT"), "got:\n{}", stub);
    assert!(stub.contains("interface IToken"), "got:\n{}", stub);
}

#[test]
fn pick_extracts_one_object() {
    let opts = Options {
        pick: Some("B".into()),
        ..Options::default()
    };
    let out = lower_with(
        "object \"A\" { code { } }\nobject \"B\" { code { let x := 1 } }",
        opts,
    );
    assert!(!out.contains("object \"A\""), "got:\n{}", out);
    assert!(out.contains("object \"B\""), "got:\n{}", out);
}

#[test]
fn injected_macros_arrive_before_rewriting() {
    let opts = Options {
        macros: vec![("LIMIT".into(), "64".into())],
        ..Options::default()
    };
    let out = lower_with("let x := add(LIMIT, 1)", opts);
    assert!(out.contains("let x := 65"), "got:\n{}", out);
}

#[test]
fn iszero_comparisons_flip_into_bounds() {
    let out = lower("let a := iszero(lt(mload(0), 8))");
    assert!(out.contains("let a := gt(mload(0), 7)"), "got:\n{}", out);
}

#[test]
fn boolean_intrinsics_short_circuit() {
    let out = lower("let a := andl(0, mload(0))\nlet b := orl(1, mload(0))\nlet c := bool(mload(0))");
    assert!(out.contains("let a := 0"), "got:\n{}", out);
    assert!(out.contains("let b := 1"), "got:\n{}", out);
    assert!(out.contains("let c := iszero(iszero(mload(0)))"), "got:\n{}", out);
}

#[test]
fn method_size_reflection() {
    let out = lower(
        "contract C {\n\
           method pay(address to, uint64 amount) returns (bool) {\n\
             let a := method.size(pay)\n\
             let b := returns.size(pay)\n\
           }\n\
         }",
    );
    assert!(out.contains("let a := 68"), "got:\n{}", out);
    assert!(out.contains("let b := 32"), "got:\n{}", out);
}

#[test]
fn sizeof_family_reflects_struct_layout() {
    let out = lower(
        "struct s { uint64 value, uint24 prefix, bytes20 hash }\n\
         let a := sizeof(s)\n\
         let b := bitsof(s.prefix)\n\
         let c := offsetof(s.prefix)",
    );
    assert!(out.contains("let a := 31"), "got:\n{}", out);
    assert!(out.contains("let b := 24"), "got:\n{}", out);
    assert!(out.contains("let c := 168"), "got:\n{}", out);
}

#[test]
fn duplicate_definitions_are_rejected() {
    assert!(matches!(
        lower_err("const x := 1\nconst x := 2"),
        Error::Resolution(_)
    ));
    assert!(matches!(
        lower_err("struct s { uint8 a }\nstruct s { uint8 b }"),
        Error::Resolution(_)
    ));
}

#[test]
fn errors_carry_the_call_site() {
    let err = lower_err("let x := nosuchfn(1)");
    let text = err.to_string();
    assert!(text.contains("test.yulx:1"), "got: {}", text);
    assert!(text.contains("nosuchfn"), "got: {}", text);
}
