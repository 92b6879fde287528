//! Event emission: inline log synthesis or a materialised helper, with the
//! packed layout that drops slot padding.

use crate::context::Transformer;
use yulx_core::ast::Node;
use yulx_core::errors::{Error, Result};
use yulx_core::sig::EventSig;
use yulx_core::word;

/// Offset expression `base + delta`, folded when the base is a literal.
fn offset_expr(base: &Node, delta: u64) -> Node {
    if delta == 0 {
        return base.clone();
    }
    match crate::fold::literal_value(base) {
        Some(v) => crate::fold::make_literal(&word::add(&v, &word::from_u64(delta))),
        None => Node::call("add", vec![base.clone(), Node::num(delta)]),
    }
}

impl Transformer {
    /// Build the store/log statement sequence for one emission. `off` and
    /// `args` are already rewritten.
    fn emit_stmts(&mut self, sig: &EventSig, off: &Node, args: &[Node]) -> Result<Vec<Node>> {
        if args.len() != sig.params.len() {
            return Err(Error::Resolution(format!(
                "event {} has {} parameters, got {} arguments",
                sig.name,
                sig.params.len(),
                args.len()
            )));
        }

        let mut topics: Vec<Node> = Vec::new();
        if !sig.anonymous {
            topics.push(Node::hex(word::to_hex(&sig.topic0())));
        }
        for (i, p) in sig.params.iter().enumerate() {
            if !p.indexed {
                continue;
            }
            if p.ty.is_dynamic() {
                return Err(Error::Type(format!(
                    "event {}: indexed parameter {} cannot be dynamic",
                    sig.name,
                    p.name.as_deref().unwrap_or("?")
                )));
            }
            topics.push(args[i].clone());
        }
        if topics.len() > 4 {
            return Err(Error::Type(format!(
                "event {} needs {} topics; the log opcodes stop at four",
                sig.name,
                topics.len()
            )));
        }

        let data: Vec<(usize, &yulx_core::ast::EventParam)> =
            sig.params.iter().enumerate().filter(|(_, p)| !p.indexed).collect();
        for (pos, (_, p)) in data.iter().enumerate() {
            if p.ty.is_dynamic() && pos + 1 != data.len() {
                return Err(Error::Type(format!(
                    "event {}: only the trailing parameter may be variable-length",
                    sig.name
                )));
            }
            if p.ty.is_dynamic() && !sig.packed {
                return Err(Error::Type(format!(
                    "event {}: variable-length data needs the packed layout",
                    sig.name
                )));
            }
        }

        let mut out = Vec::new();
        let mut cursor: u64 = 0;
        let mut dynamic_len: Option<Node> = None;
        for (i, p) in &data {
            let value = args[*i].clone();
            if p.ty.is_dynamic() {
                // Raw bytes of a length-prefixed memory blob.
                let len = Node::call("mload", vec![value.clone()]);
                self.scopes.depends_on("__mcopy");
                out.push(Node::call(
                    "__mcopy",
                    vec![
                        offset_expr(off, cursor),
                        Node::call("add", vec![value, Node::num(32)]),
                        len.clone(),
                    ],
                ));
                dynamic_len = Some(len);
                break;
            }
            if sig.packed {
                let width = p.ty.width_bits() as u64;
                let stored = if width < 256 {
                    Node::call("shl", vec![Node::num(256 - width), value])
                } else {
                    value
                };
                out.push(Node::call("mstore", vec![offset_expr(off, cursor), stored]));
                cursor += width / 8;
            } else {
                out.push(Node::call("mstore", vec![offset_expr(off, cursor), value]));
                cursor += 32;
            }
        }

        let size = match dynamic_len {
            Some(len) => Node::call("add", vec![Node::num(cursor), len]),
            None => Node::num(cursor),
        };
        let mut log_args = vec![off.clone(), size];
        log_args.extend(topics.iter().cloned());
        out.push(Node::call(format!("log{}", topics.len()), log_args));
        Ok(out)
    }

    pub(crate) fn rewrite_emit(
        &mut self,
        name: &str,
        offset: Node,
        args: Vec<Node>,
        out: &mut Vec<Node>,
    ) -> Result<()> {
        let sig = self
            .scopes
            .lookup_event(name)
            .cloned()
            .ok_or_else(|| Error::Resolution(format!("undefined event {}", name)))?;
        let offset = self.rewrite_expr(offset)?;
        let args = args
            .into_iter()
            .map(|a| self.rewrite_expr(a))
            .collect::<Result<Vec<_>>>()?;

        if sig.inline.unwrap_or(true) {
            out.extend(self.emit_stmts(&sig, &offset, &args)?);
            return Ok(());
        }

        // noinline: materialise __emit_<Name>_<depth> once per code block.
        let helper = format!("__emit_{}_{}", sig.name, self.scopes.depth());
        if self.scopes.lookup_func(&helper).is_none() {
            let params: Vec<yulx_core::ast::TypedIdent> = std::iter::once("__off".to_string())
                .chain((0..args.len()).map(|i| format!("__a{}", i)))
                .map(yulx_core::ast::TypedIdent::plain)
                .collect();
            let formal_off = Node::Identifier {
                name: "__off".into(),
                replaceable: false,
            };
            let formal_args: Vec<Node> = (0..args.len())
                .map(|i| Node::Identifier {
                    name: format!("__a{}", i),
                    replaceable: false,
                })
                .collect();
            let body = self.emit_stmts(&sig, &formal_off, &formal_args)?;
            let def = Node::FunctionDef {
                name: helper.clone(),
                params,
                returns: Vec::new(),
                noinline: false,
                builtin: true,
                body,
            };
            if let Some(code) = self.scopes.find_code_scope_mut() {
                code.funcs.insert(helper.clone(), def);
            }
        }
        self.scopes.depends_on(&helper);
        let mut call_args = vec![offset];
        call_args.extend(args);
        out.push(Node::call(helper, call_args));
        Ok(())
    }
}
