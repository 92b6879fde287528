//! Macro expansion: constants replace identifiers anywhere, definitions
//! substitute arguments positionally through a one-level identifier rewrite.
//! No hygiene is offered; callers pick unique names.

use crate::context::Transformer;
use std::collections::HashMap;
use std::rc::Rc;
use yulx_core::ast::Node;
use yulx_core::errors::{Error, Result};
use yulx_core::scope::MacroEntry;

pub(crate) enum MacroExpansion {
    Expr(Node),
    Stmts(Vec<Node>),
}

impl Transformer {
    /// The parameter-index map for a definition, memoised by its parse
    /// identity; definitions are immutable once parsed so the cache is safe.
    fn param_map(&mut self, id: u64, params: &[String]) -> Rc<HashMap<String, usize>> {
        if let Some(map) = self.macro_memo.get(&id) {
            return Rc::clone(map);
        }
        let map: HashMap<String, usize> = params
            .iter()
            .enumerate()
            .map(|(i, p)| (p.clone(), i))
            .collect();
        let map = Rc::new(map);
        self.macro_memo.insert(id, Rc::clone(&map));
        map
    }

    /// Expand a macro invocation. Arguments are substituted syntactically,
    /// then the expanded body is rewritten in the current scope.
    pub(crate) fn expand_macro(
        &mut self,
        name: &str,
        args: Vec<Node>,
    ) -> Result<Option<MacroExpansion>> {
        let entry = match self.scopes.lookup_macro(name) {
            Some(entry) => entry.clone(),
            None => return Ok(None),
        };
        match entry {
            MacroEntry::Const(expr) => {
                // A constant invoked as a call: the expansion must itself be
                // callable; substitute the name and retry.
                let rewritten = match expr {
                    Node::Identifier { name: target, .. } => {
                        let call = Node::call(target, args);
                        self.rewrite_expr(call)?
                    }
                    other => {
                        if !args.is_empty() {
                            return Err(Error::Resolution(format!(
                                "macro {} takes no arguments",
                                name
                            )));
                        }
                        self.rewrite_expr(other)?
                    }
                };
                Ok(Some(MacroExpansion::Expr(rewritten)))
            }
            MacroEntry::Def { id, params, body } => {
                if args.len() != params.len() {
                    return Err(Error::Resolution(format!(
                        "macro {} expects {} arguments, got {}",
                        name,
                        params.len(),
                        args.len()
                    )));
                }
                let map = self.param_map(id, &params);
                let substituted = substitute(body, &map, &args);
                match substituted {
                    Node::Block { statements } => {
                        let rewritten = self.rewrite_statements(statements)?;
                        Ok(Some(MacroExpansion::Stmts(rewritten)))
                    }
                    expr => Ok(Some(MacroExpansion::Expr(self.rewrite_expr(expr)?))),
                }
            }
        }
    }
}

/// One-level positional substitution over identifier nodes; substituted
/// arguments are not scanned again.
fn substitute(body: Node, params: &HashMap<String, usize>, args: &[Node]) -> Node {
    body.map(&mut |n| match n {
        Node::Identifier { name, replaceable } => match params.get(&name) {
            Some(&i) => args[i].clone(),
            None => Node::Identifier { name, replaceable },
        },
        // A parameter used as an assignment target or call name follows the
        // same positional rule when the argument is itself an identifier.
        Node::Assignment { targets, value } => Node::Assignment {
            targets: targets
                .into_iter()
                .map(|t| match params.get(&t).map(|&i| &args[i]) {
                    Some(Node::Identifier { name, .. }) => name.clone(),
                    _ => t,
                })
                .collect(),
            value,
        },
        Node::FunctionCall {
            name,
            args: call_args,
            file,
            line,
        } => {
            let name = match params.get(&name).map(|&i| &args[i]) {
                Some(Node::Identifier { name: n, .. }) => n.clone(),
                _ => name,
            };
            Node::FunctionCall {
                name,
                args: call_args,
                file,
                line,
            }
        }
        other => other,
    })
}
