/*! Recursive-descent front end for the YulX dialect.
 *
 * Two passes over the text: the comment stripper blanks comments while
 * preserving line numbers and collecting doc comments, then the parser
 * builds the tagged AST. Every function call node is stamped with its
 * source file and line so later stages can point diagnostics at the code
 * that caused them.
 */

pub mod comments;
pub mod cursor;
mod declarations;
mod expressions;
pub mod parser;
mod statements;

pub use comments::{strip, Stripped};
pub use parser::Parser;

use yulx_core::ast::Node;
use yulx_core::errors::Result;

/// Strip comments and parse a full source file.
pub fn parse(source: &str, file: &str) -> Result<Node> {
    let stripped = comments::strip(source, file)?;
    Parser::new(&stripped.code, file).parse_root()
}

/// Parse a single expression, for injected macro values.
pub fn parse_expression(source: &str, file: &str) -> Result<Node> {
    let stripped = comments::strip(source, file)?;
    Parser::new(&stripped.code, file).parse_single_expression()
}

#[cfg(test)]
mod tests {
    use super::*;
    use yulx_core::ast::{InterfaceCallKind, LiteralKind, Node};

    fn root(source: &str) -> Vec<Node> {
        match parse(source, "test.yulx").unwrap() {
            Node::Root { statements } => statements,
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn parses_plain_yul() {
        let stmts = root("let x := add(1, 2)\nif lt(x, 10) { x := 0 }");
        assert_eq!(stmts.len(), 2);
        match &stmts[0] {
            Node::VariableDeclaration { names, value } => {
                assert_eq!(names[0].name, "x");
                match value.as_deref().unwrap() {
                    Node::FunctionCall { name, args, line, .. } => {
                        assert_eq!(name, "add");
                        assert_eq!(args.len(), 2);
                        assert_eq!(*line, 1);
                    }
                    other => panic!("unexpected: {:?}", other),
                }
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn member_assignment_disambiguates_on_the_operator() {
        let stmts = root("out->value := 5\nout->flags |= 1");
        assert!(matches!(
            &stmts[0],
            Node::MemberAssignment { or_assign: false, .. }
        ));
        assert!(matches!(
            &stmts[1],
            Node::MemberAssignment { or_assign: true, .. }
        ));
    }

    #[test]
    fn calldata_identifiers_and_references() {
        let stmts = root("let a := calldata.id\nlet b := &calldata.id");
        let get = |s: &Node| match s {
            Node::VariableDeclaration { value, .. } => value.as_deref().unwrap().clone(),
            other => panic!("unexpected: {:?}", other),
        };
        assert!(matches!(
            get(&stmts[0]),
            Node::CallDataIdentifier { reference: false, .. }
        ));
        assert!(matches!(
            get(&stmts[1]),
            Node::CallDataIdentifier { reference: true, .. }
        ));
    }

    #[test]
    fn struct_definition_and_initializer() {
        let stmts = root(
            "struct btc_output { uint64 value, uint24 prefix := 0x160014, bytes20 hash }\n\
             let o := struct(btc_output, 100000000, @, 0xdead)",
        );
        match &stmts[0] {
            Node::StructDef { name, members } => {
                assert_eq!(name, "btc_output");
                assert_eq!(members.len(), 3);
                assert!(members[1].default.is_some());
            }
            other => panic!("unexpected: {:?}", other),
        }
        match &stmts[1] {
            Node::VariableDeclaration { value, .. } => match value.as_deref().unwrap() {
                Node::StructInit { name, args } => {
                    assert_eq!(name, "btc_output");
                    assert_eq!(args.len(), 3);
                    assert!(matches!(args[1], Node::DefaultArg));
                }
                other => panic!("unexpected: {:?}", other),
            },
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn method_with_modifiers() {
        let stmts = root(
            "method transfer(address to, uint64 amount) payable locked returns (bool ok) { leave }",
        );
        match &stmts[0] {
            Node::MethodDef {
                name,
                params,
                locked,
                returns,
                ..
            } => {
                assert_eq!(name, "transfer");
                assert_eq!(params.len(), 2);
                assert!(*locked);
                assert_eq!(returns.len(), 1);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn interface_calls_keep_the_opcode_form_apart() {
        let stmts = root(
            "let ok := call IToken.transfer(a, b, c)\n\
             let raw := call(gas(), a, 0, 0, 0, 0, 0)\n\
             let addr := try create IToken(0, 1)",
        );
        let get = |s: &Node| match s {
            Node::VariableDeclaration { value, .. } => value.as_deref().unwrap().clone(),
            other => panic!("unexpected: {:?}", other),
        };
        match get(&stmts[0]) {
            Node::InterfaceCall {
                kind,
                attempt,
                name,
                method,
                args,
            } => {
                assert_eq!(kind, InterfaceCallKind::Call);
                assert!(!attempt);
                assert_eq!(name, "IToken");
                assert_eq!(method.as_deref(), Some("transfer"));
                assert_eq!(args.len(), 3);
            }
            other => panic!("unexpected: {:?}", other),
        }
        assert!(matches!(get(&stmts[1]), Node::FunctionCall { .. }));
        match get(&stmts[2]) {
            Node::InterfaceCall { kind, attempt, .. } => {
                assert_eq!(kind, InterfaceCallKind::Create);
                assert!(attempt);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn fold_with_elif_and_else() {
        let stmts = root("@if gt(EVM_VERSION, 202304) { let a := 1 } elif 1 { let b := 2 } else { let c := 3 }");
        match &stmts[0] {
            Node::Fold {
                elifs, else_body, ..
            } => {
                assert_eq!(elifs.len(), 1);
                assert!(else_body.is_some());
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn pragma_values_are_validated() {
        assert!(parse("pragma license \"MIT\"", "t").is_ok());
        assert!(parse("pragma evm \"cancun\"", "t").is_ok());
        assert!(parse("pragma evm \"frontier\"", "t").is_err());
        assert!(parse("pragma lock \"0xabc\"", "t").is_ok());
        assert!(parse("pragma lock \"abc\"", "t").is_err());
        assert!(parse("pragma license \"not ok\"", "t").is_err());
    }

    #[test]
    fn units_attach_to_numbers() {
        let stmts = root("let cost := 2 ether");
        match &stmts[0] {
            Node::VariableDeclaration { value, .. } => match value.as_deref().unwrap() {
                Node::Literal { kind, value, unit } => {
                    assert_eq!(*kind, LiteralKind::DecimalNumber);
                    assert_eq!(value, "2");
                    assert_eq!(unit.as_deref(), Some("ether"));
                }
                other => panic!("unexpected: {:?}", other),
            },
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn errors_carry_position_and_caret() {
        let err = parse("let x := \nlet", "bad.yulx").unwrap_err();
        let text = err.to_string();
        assert!(text.starts_with("bad.yulx:2:"), "got: {}", text);
        assert!(text.contains('^'));
    }

    #[test]
    fn contract_and_object_blocks() {
        let stmts = root(
            "contract Token optimize {\n  method get() view returns (uint) { leave }\n}\n\
             object \"Raw\" { code { let a := 1 } data \"blob\" hex\"00ff\" }",
        );
        assert!(matches!(&stmts[0], Node::Contract { optimize: true, .. }));
        match &stmts[1] {
            Node::ObjectBlock { name, statements } => {
                assert_eq!(name, "Raw");
                assert!(matches!(&statements[0], Node::CodeBlock { .. }));
                assert!(matches!(&statements[1], Node::DataValue { hex: true, .. }));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }
}
