//! Preprocessor fold: `@if` / `elif` / `else` evaluated at transform time.
//! Conditions must reduce to literals; the chosen branch is rewritten in the
//! current scope, the rest vanish.

use crate::context::Transformer;
use crate::fold;
use num_traits::Zero;
use yulx_core::ast::Node;
use yulx_core::errors::{Error, Result};

impl Transformer {
    pub(crate) fn rewrite_fold(
        &mut self,
        cond: Node,
        body: Vec<Node>,
        elifs: Vec<(Node, Vec<Node>)>,
        else_body: Option<Vec<Node>>,
        out: &mut Vec<Node>,
    ) -> Result<()> {
        let mut branches = vec![(cond, body)];
        branches.extend(elifs);

        for (cond, body) in branches {
            let cond = self.rewrite_expr(cond)?;
            let value = fold::literal_value(&cond).ok_or_else(|| {
                Error::Type("@if condition does not reduce to a literal".into())
            })?;
            if !value.is_zero() {
                out.extend(self.rewrite_statements(body)?);
                return Ok(());
            }
        }
        if let Some(body) = else_body {
            out.extend(self.rewrite_statements(body)?);
        }
        Ok(())
    }

    /// `defined` / `undefined` answers; aware of the implicit names.
    pub(crate) fn is_defined(&self, name: &str) -> bool {
        match name {
            "DEBUG" => self.debug_on(),
            "NDEBUG" => !self.debug_on(),
            "EVM_VERSION" => true,
            _ => self.scopes.lookup_macro(name).is_some(),
        }
    }

    /// Remove a macro definition; resolves through the scope chain.
    pub(crate) fn undefine(&mut self, name: &str) {
        self.scopes.remove_macro(name);
    }
}
