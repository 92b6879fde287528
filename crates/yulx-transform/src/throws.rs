//! `throw` lowering: well-known Error/ErrorCode/Panic shortcuts and
//! materialised `__throw_<Name>_<depth>` encoders for declared errors.

use crate::context::Transformer;
use yulx_core::ast::{LiteralKind, Node, TypedIdent};
use yulx_core::errors::{Error, Result};
use yulx_core::word;

/// Bytes of a string or hex literal, unescaped.
pub(crate) fn literal_bytes(node: &Node) -> Option<Vec<u8>> {
    match node {
        Node::Literal {
            kind: LiteralKind::StringLiteral,
            value,
            ..
        } => Some(unescape(value)),
        Node::Literal {
            kind: LiteralKind::HexLiteral,
            value,
            ..
        } => hex::decode(value).ok(),
        _ => None,
    }
}

fn unescape(raw: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            let mut buf = [0u8; 4];
            out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            continue;
        }
        match chars.next() {
            Some('n') => out.push(b'\n'),
            Some('t') => out.push(b'\t'),
            Some('r') => out.push(b'\r'),
            Some('0') => out.push(0),
            Some(other) => {
                let mut buf = [0u8; 4];
                out.extend_from_slice(other.encode_utf8(&mut buf).as_bytes());
            }
            None => {}
        }
    }
    out
}

impl Transformer {
    /// `Error(str)` shortcut: pick the revert helper by message length.
    pub(crate) fn revert_message_stmt(&mut self, message: &[u8], original: Option<Node>) -> Result<Node> {
        let len = message.len() as u64;
        if len <= 32 {
            self.scopes.depends_on("__revert32");
            let arg = original.unwrap_or_else(|| {
                crate::fold::make_literal(&word::bytes_to_word(message).expect("<= 32 bytes"))
            });
            return Ok(Node::call("__revert32", vec![arg, Node::num(len)]));
        }
        if len <= 64 {
            self.scopes.depends_on("__revert64");
            let first = word::bytes_to_word(&message[..32]).expect("exactly 32 bytes");
            let second = word::bytes_to_word(&message[32..]).expect("<= 32 bytes");
            return Ok(Node::call(
                "__revert64",
                vec![
                    Node::hex(word::to_hex(&first)),
                    Node::hex(word::to_hex(&second)),
                    Node::num(len),
                ],
            ));
        }
        // Long messages live in a data blob and come back via codecopy.
        self.scopes.depends_on("__revert_data");
        let blob = format!(".str{}", self.next_blob_index());
        if let Some(object) = self.scopes.find_object_scope_mut() {
            object.data.push(Node::DataValue {
                name: blob.clone(),
                hex: true,
                value: hex::encode(message),
            });
        }
        Ok(Node::call(
            "__revert_data",
            vec![
                Node::call("dataoffset", vec![Node::string(blob.as_str())]),
                Node::num(len),
            ],
        ))
    }

    pub(crate) fn rewrite_throw(
        &mut self,
        name: &str,
        args: Vec<Node>,
        out: &mut Vec<Node>,
    ) -> Result<()> {
        match name {
            "Error" => {
                let [arg] = <[Node; 1]>::try_from(args)
                    .map_err(|_| Error::Type("throw Error takes one message".into()))?;
                let arg = self.rewrite_expr(arg)?;
                let bytes = literal_bytes(&arg)
                    .ok_or_else(|| Error::Type("throw Error needs a literal message".into()))?;
                let keep_original = bytes.len() <= 32;
                let stmt =
                    self.revert_message_stmt(&bytes, keep_original.then(|| arg.clone()))?;
                out.push(stmt);
                return Ok(());
            }
            "ErrorCode" => {
                let [arg] = <[Node; 1]>::try_from(args)
                    .map_err(|_| Error::Type("throw ErrorCode takes one code".into()))?;
                let arg = self.rewrite_expr(arg)?;
                self.scopes.depends_on("__revert_int");
                out.push(Node::call("__revert_int", vec![arg]));
                return Ok(());
            }
            "Panic" => {
                let [arg] = <[Node; 1]>::try_from(args)
                    .map_err(|_| Error::Type("throw Panic takes one code".into()))?;
                let arg = self.rewrite_expr(arg)?;
                self.scopes.depends_on("__panic");
                out.push(Node::call("__panic", vec![arg]));
                return Ok(());
            }
            _ => {}
        }

        let sig = self
            .scopes
            .lookup_error(name)
            .cloned()
            .ok_or_else(|| Error::Resolution(format!("undefined error {}", name)))?;
        if args.len() != sig.params.len() {
            return Err(Error::Resolution(format!(
                "error {} has {} parameters, got {} arguments",
                sig.name,
                sig.params.len(),
                args.len()
            )));
        }
        let args = args
            .into_iter()
            .map(|a| self.rewrite_expr(a))
            .collect::<Result<Vec<_>>>()?;

        let helper = format!("__throw_{}_{}", sig.name, self.scopes.depth());
        if self.scopes.lookup_func(&helper).is_none() {
            let params: Vec<TypedIdent> = (0..args.len())
                .map(|i| TypedIdent::plain(format!("__a{}", i)))
                .collect();
            let mut body = vec![Node::call(
                "mstore",
                vec![
                    Node::num(0),
                    Node::call(
                        "shl",
                        vec![Node::num(224), Node::hex(format!("0x{:08x}", sig.selector()))],
                    ),
                ],
            )];
            for (i, p) in sig.params.iter().enumerate() {
                let formal = Node::Identifier {
                    name: format!("__a{}", i),
                    replaceable: false,
                };
                let width = p.ty.width_bits() as u64;
                // Standard ABI: numerics left-padded, bytesN right-padded.
                let stored = if p.ty.base == yulx_core::types::BaseType::Bytes
                    && !p.ty.is_dynamic()
                    && width < 256
                {
                    Node::call("shl", vec![Node::num(256 - width), formal])
                } else {
                    formal
                };
                body.push(Node::call(
                    "mstore",
                    vec![Node::num(4 + 32 * i as u64), stored],
                ));
            }
            body.push(Node::call(
                "revert",
                vec![Node::num(0), Node::num(sig.encoded_size())],
            ));
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
        out.push(Node::call(helper, args));
        Ok(())
    }
}
