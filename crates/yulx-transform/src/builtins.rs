//! Builtin helper library preload.
//!
//! The library ships as dialect source, is parsed once per process behind a
//! `Lazy`, and its definitions are cloned into each compilation's root scope
//! flagged `builtin` so they materialise on first reference.

use crate::context::Transformer;
use once_cell::sync::Lazy;
use yulx_core::ast::Node;
use yulx_core::errors::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinLevel {
    None,
    SupportOnly,
    Full,
}

const SUPPORT_SRC: &str = include_str!("library/support.yulx");
const FULL_SRC: &str = include_str!("library/full.yulx");

fn parse_library(source: &str, file: &str) -> Vec<(String, Node)> {
    let root = yulx_parser::parse(source, file)
        .unwrap_or_else(|e| panic!("builtin library {} does not parse: {}", file, e));
    let statements = match root {
        Node::Root { statements } => statements,
        _ => Vec::new(),
    };
    statements
        .into_iter()
        .filter_map(|stmt| match stmt {
            Node::FunctionDef {
                name,
                params,
                returns,
                noinline,
                body,
                ..
            } => Some((
                name.clone(),
                Node::FunctionDef {
                    name,
                    params,
                    returns,
                    noinline,
                    builtin: true,
                    body,
                },
            )),
            _ => None,
        })
        .collect()
}

static SUPPORT_LIB: Lazy<Vec<(String, Node)>> =
    Lazy::new(|| parse_library(SUPPORT_SRC, "<support.yulx>"));
static FULL_LIB: Lazy<Vec<(String, Node)>> = Lazy::new(|| parse_library(FULL_SRC, "<full.yulx>"));

/// Clone the selected library levels into the root scope.
pub(crate) fn preload(tx: &mut Transformer) -> Result<()> {
    let level = tx.opts.builtin;
    if level == BuiltinLevel::None {
        return Ok(());
    }
    for (name, def) in SUPPORT_LIB.iter() {
        tx.scopes.preload_func(name, def.clone());
    }
    if level == BuiltinLevel::Full {
        for (name, def) in FULL_LIB.iter() {
            tx.scopes.preload_func(name, def.clone());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_libraries_parse_and_flag_builtin() {
        assert!(SUPPORT_LIB.iter().any(|(n, _)| n == "__revert32"));
        assert!(SUPPORT_LIB.iter().any(|(n, _)| n == "mutex.lock"));
        assert!(FULL_LIB.iter().any(|(n, _)| n == "__ecrecover"));
        for (_, def) in SUPPORT_LIB.iter().chain(FULL_LIB.iter()) {
            assert!(matches!(def, Node::FunctionDef { builtin: true, .. }));
        }
    }
}
