//! Core parser struct and shared helpers.
//!
//! The grammar is split into focused modules:
//!   - declarations.rs: pragma, enum, struct, interface, contract, object,
//!     constructor/method/event/error, macro, const, function, data
//!   - statements.rs: blocks, control flow, assignments, fold, include,
//!     emit/throw
//!   - expressions.rs: literals, calls, member and calldata identifiers
//!
//! Methods are pub(super) so they can be called across the modules.

use crate::cursor::Cursor;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use yulx_core::ast::Node;
use yulx_core::errors::Result;

/// Identity source for macro definitions; the transformer memoises the
/// parameter-index map per id.
static NEXT_MACRO_ID: AtomicU64 = AtomicU64::new(1);

pub(crate) fn next_macro_id() -> u64 {
    NEXT_MACRO_ID.fetch_add(1, Ordering::Relaxed)
}

pub struct Parser {
    pub(super) cur: Cursor,
    /// Directory of the file being parsed; include targets resolve here.
    pub(super) base: String,
}

impl Parser {
    pub fn new(stripped: &str, file: &str) -> Self {
        let base = Path::new(file)
            .parent()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            cur: Cursor::new(stripped, file),
            base,
        }
    }

    pub fn parse_root(&mut self) -> Result<Node> {
        let mut statements = Vec::new();
        while !self.cur.at_end() {
            statements.push(self.parse_statement()?);
        }
        Ok(Node::Root { statements })
    }

    /// Parse a single expression and require it to consume the input; used
    /// for injected macro definitions.
    pub fn parse_single_expression(&mut self) -> Result<Node> {
        let expr = self.parse_expression()?;
        if !self.cur.at_end() {
            return Err(self.cur.err("trailing input after expression"));
        }
        Ok(expr)
    }

    pub(super) fn file(&self) -> String {
        self.cur.file.clone()
    }
}
