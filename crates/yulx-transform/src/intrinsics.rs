//! Built-in intrinsic expansion and generic call resolution.
//!
//! Calls pass through four gates: macro expansion, the intrinsic table,
//! constant folding for opcodes, and scope-chain resolution for user and
//! library functions.

use crate::context::Transformer;
use crate::fold::{self, literal_value, make_literal};
use crate::macros::MacroExpansion;
use crate::throws::literal_bytes;
use blake2::digest::{Update, VariableOutput};
use num_bigint::BigUint;
use num_traits::Zero;
use ripemd::Ripemd160;
use sha2::{Digest, Sha256};
use yulx_core::ast::{LiteralKind, Node};
use yulx_core::errors::{Error, Result};
use yulx_core::sig::keccak256;
use yulx_core::word;

pub(crate) enum CallLowering {
    Expr(Node),
    Stmts(Vec<Node>),
    Nothing,
}

const OPCODES: &[&str] = &[
    "stop", "add", "sub", "mul", "div", "sdiv", "mod", "smod", "exp", "not", "lt", "gt", "slt",
    "sgt", "eq", "iszero", "and", "or", "xor", "byte", "shl", "shr", "sar", "addmod", "mulmod",
    "signextend", "keccak256", "pop", "mload", "mstore", "mstore8", "sload", "sstore", "tload",
    "tstore", "msize", "gas", "address", "balance", "selfbalance", "caller", "callvalue",
    "calldataload", "calldatasize", "calldatacopy", "codesize", "codecopy", "extcodesize",
    "extcodecopy", "returndatasize", "returndatacopy", "extcodehash", "create", "create2", "call",
    "callcode", "delegatecall", "staticcall", "return", "revert", "selfdestruct", "invalid",
    "log0", "log1", "log2", "log3", "log4", "chainid", "basefee", "blobbasefee", "origin",
    "gasprice", "blockhash", "blobhash", "coinbase", "timestamp", "number", "difficulty",
    "prevrandao", "gaslimit", "mcopy", "datasize", "dataoffset", "datacopy", "setimmutable",
    "loadimmutable", "linkersymbol", "memoryguard",
];

fn is_opcode(name: &str) -> bool {
    OPCODES.contains(&name) || name.starts_with("verbatim_")
}

fn ident_arg(args: &[Node], what: &str) -> Result<String> {
    match args {
        [Node::Identifier { name, .. }] => Ok(name.clone()),
        _ => Err(Error::Type(format!("{} expects a bare name", what))),
    }
}

fn string_arg(node: &Node, what: &str) -> Result<String> {
    match node {
        Node::Literal {
            kind: LiteralKind::StringLiteral,
            value,
            ..
        } => Ok(value.clone()),
        _ => Err(Error::Type(format!("{} expects a string literal", what))),
    }
}

impl Transformer {
    pub(crate) fn rewrite_call_expr(
        &mut self,
        name: String,
        args: Vec<Node>,
        file: String,
        line: u32,
    ) -> Result<Node> {
        match self.rewrite_call(name.clone(), args, &file, line)? {
            CallLowering::Expr(node) => Ok(node),
            CallLowering::Stmts(_) | CallLowering::Nothing => Err(Error::Type(format!(
                "{} is a statement, not an expression",
                name
            ))
            .at(&file, line)),
        }
    }

    pub(crate) fn rewrite_call_stmt(
        &mut self,
        name: String,
        args: Vec<Node>,
        file: String,
        line: u32,
        out: &mut Vec<Node>,
    ) -> Result<()> {
        match self.rewrite_call(name, args, &file, line)? {
            CallLowering::Expr(node) => out.push(node),
            CallLowering::Stmts(stmts) => out.extend(stmts),
            CallLowering::Nothing => {}
        }
        Ok(())
    }

    fn rewrite_call(
        &mut self,
        name: String,
        args: Vec<Node>,
        file: &str,
        line: u32,
    ) -> Result<CallLowering> {
        if !file.is_empty() {
            self.call_site = Some((file.to_string(), line));
        }
        self.rewrite_call_inner(name, args).map_err(|e| e.at(file, line))
    }

    fn rewrite_call_inner(&mut self, name: String, args: Vec<Node>) -> Result<CallLowering> {
        // Macros substitute raw arguments before any rewriting.
        if self.scopes.lookup_macro(&name).is_some() {
            return match self.expand_macro(&name, args)? {
                Some(MacroExpansion::Expr(node)) => Ok(CallLowering::Expr(node)),
                Some(MacroExpansion::Stmts(stmts)) => Ok(CallLowering::Stmts(stmts)),
                None => unreachable!("macro lookup raced"),
            };
        }

        if let Some(lowering) = self.intrinsic(&name, &args)? {
            return Ok(lowering);
        }

        let args = args
            .into_iter()
            .map(|a| self.rewrite_expr(a))
            .collect::<Result<Vec<_>>>()?;

        if name == "memoryguard" {
            self.memguard = true;
        }
        if is_opcode(&name) {
            if self.folding_enabled() {
                if let Some(folded) = fold::fold_call(&name, &args)? {
                    return Ok(CallLowering::Expr(folded));
                }
            }
            return Ok(CallLowering::Expr(Node::call(name, args)));
        }

        let target = self.scopes.lookup_func(&name).map(|def| match def {
            Node::FunctionDef {
                params, builtin, ..
            } => (params.len(), *builtin),
            _ => (0, false),
        });
        match target {
            Some((arity, builtin)) => {
                if arity != args.len() {
                    return Err(Error::Resolution(format!(
                        "{} expects {} arguments, got {}",
                        name,
                        arity,
                        args.len()
                    )));
                }
                if builtin {
                    self.scopes.depends_on(&name);
                }
                Ok(CallLowering::Expr(Node::call(name, args)))
            }
            None => Err(Error::Resolution(format!("undefined function {}", name))),
        }
    }

    /// The intrinsic table. Returns None when the name is not an intrinsic.
    fn intrinsic(&mut self, name: &str, args: &[Node]) -> Result<Option<CallLowering>> {
        if let Some(tail) = name.strip_prefix("require.") {
            return self.require_intrinsic(tail, args).map(Some);
        }
        let lowering = match name {
            "method.check" => {
                let sig = self.scopes.bound_method().cloned().ok_or_else(|| {
                    Error::Resolution("method.check outside a method body".into())
                })?;
                CallLowering::Stmts(self.method_check_stmts(&sig)?)
            }
            "method.select" => CallLowering::Stmts(self.dispatch_stmts()?),
            "method.call" => {
                let target = ident_arg(args, "method.call")?;
                CallLowering::Stmts(self.method_call_stmts(&target)?)
            }
            "method.size" => {
                let target = ident_arg(args, "method.size")?;
                let sig = self
                    .scopes
                    .lookup_method(&target)
                    .ok_or_else(|| Error::Resolution(format!("undefined method {}", target)))?;
                CallLowering::Expr(Node::num(sig.call_size()))
            }
            "returns.size" => {
                let target = ident_arg(args, "returns.size")?;
                let sig = self
                    .scopes
                    .lookup_method(&target)
                    .ok_or_else(|| Error::Resolution(format!("undefined method {}", target)))?;
                CallLowering::Expr(Node::num(sig.returns_size()))
            }
            "event.size" => {
                let target = ident_arg(args, "event.size")?;
                let sig = self
                    .scopes
                    .lookup_event(&target)
                    .ok_or_else(|| Error::Resolution(format!("undefined event {}", target)))?;
                CallLowering::Expr(Node::num(sig.data_size()))
            }
            "error.size" => {
                let target = ident_arg(args, "error.size")?;
                let sig = self
                    .scopes
                    .lookup_error(&target)
                    .ok_or_else(|| Error::Resolution(format!("undefined error {}", target)))?;
                CallLowering::Expr(Node::num(sig.encoded_size()))
            }
            "create.size" | "create2.size" => {
                let target = ident_arg(args, name)?;
                let sig = self
                    .scopes
                    .lookup_interface(&target)
                    .ok_or_else(|| Error::Resolution(format!("undefined interface {}", target)))?;
                let params = sig
                    .constructor
                    .as_ref()
                    .map(|(p, _)| p.len())
                    .unwrap_or(0);
                CallLowering::Expr(Node::num(32 * params as u64))
            }
            "returns" => {
                if args.is_empty() {
                    return Err(Error::Type("returns needs a memory offset".into()));
                }
                let mut rewritten = Vec::with_capacity(args.len());
                for a in args {
                    rewritten.push(self.rewrite_expr(a.clone())?);
                }
                let off = rewritten.remove(0);
                let mut stmts = Vec::new();
                for (i, value) in rewritten.iter().enumerate() {
                    stmts.push(Node::call(
                        "mstore",
                        vec![offset_of(&off, 32 * i as u64), value.clone()],
                    ));
                }
                stmts.push(Node::call(
                    "return",
                    vec![off, Node::num(32 * rewritten.len() as u64)],
                ));
                CallLowering::Stmts(stmts)
            }
            "mstores" => {
                if args.len() < 2 {
                    return Err(Error::Type("mstores needs an offset and values".into()));
                }
                let mut rewritten = Vec::with_capacity(args.len());
                for a in args {
                    rewritten.push(self.rewrite_expr(a.clone())?);
                }
                let off = rewritten.remove(0);
                let stmts = rewritten
                    .into_iter()
                    .enumerate()
                    .map(|(i, v)| Node::call("mstore", vec![offset_of(&off, 32 * i as u64), v]))
                    .collect();
                CallLowering::Stmts(stmts)
            }
            "storeimmutable" => {
                let [name_arg, value] = match args {
                    [a, b] => [a.clone(), b.clone()],
                    _ => return Err(Error::Type("storeimmutable takes a name and a value".into())),
                };
                let imm_name = string_arg(&name_arg, "storeimmutable")?;
                let value = self.rewrite_expr(value)?;
                if let Some(code) = self.scopes.find_code_scope_mut() {
                    code.immutables.push((imm_name, value));
                }
                CallLowering::Nothing
            }
            "construct" => {
                let runtime = self
                    .scopes
                    .runtime_name()
                    .map(str::to_string)
                    .ok_or_else(|| {
                        Error::Resolution("construct outside a contract constructor".into())
                    })?;
                let mut stmts = vec![Node::call(
                    "datacopy",
                    vec![
                        Node::num(0),
                        Node::call("dataoffset", vec![Node::string(runtime.as_str())]),
                        Node::call("datasize", vec![Node::string(runtime.as_str())]),
                    ],
                )];
                for (imm_name, value) in self.scopes.captured_immutables() {
                    stmts.push(Node::call(
                        "setimmutable",
                        vec![Node::num(0), Node::string(imm_name), value],
                    ));
                }
                stmts.push(Node::call(
                    "return",
                    vec![Node::num(0), Node::call("datasize", vec![Node::string(runtime.as_str())])],
                ));
                CallLowering::Stmts(stmts)
            }
            "datareference" => {
                let target = match args {
                    [node] => string_arg(node, "datareference")?,
                    _ => return Err(Error::Type("datareference takes a data name".into())),
                };
                CallLowering::Expr(Node::call("dataoffset", vec![Node::string(target)]))
            }
            "sizeof" | "bitsof" | "offsetof" => {
                let target = ident_arg(args, name)?;
                CallLowering::Expr(self.struct_reflection(name, &target)?)
            }
            "defined" | "undefined" => {
                let target = ident_arg(args, name)?;
                let defined = self.is_defined(&target);
                let truth = if name == "defined" { defined } else { !defined };
                CallLowering::Expr(Node::num(truth as u64))
            }
            "undefine" => {
                let target = ident_arg(args, "undefine")?;
                self.undefine(&target);
                CallLowering::Nothing
            }
            "bool" | "notl" | "andl" | "orl" => {
                return self.boolean_intrinsic(name, args).map(Some);
            }
            "keccak256" if args.len() == 1 => {
                let arg = self.rewrite_expr(args[0].clone())?;
                match literal_bytes(&arg) {
                    Some(bytes) => {
                        let digest = keccak256(&bytes);
                        CallLowering::Expr(make_literal(&BigUint::from_bytes_be(&digest)))
                    }
                    None => return Err(Error::Type(
                        "single-argument keccak256 folds a literal; runtime hashing is keccak256(offset, length)"
                            .into(),
                    )),
                }
            }
            "sha256" | "ripemd160" | "hash160" | "hash256" | "keccak160" | "blake2b160"
            | "blake2b256" => {
                return self.hash_intrinsic(name, args).map(Some);
            }
            "ecrecover" => {
                let args = self.rewrite_all(args.to_vec())?;
                if args.len() != 4 {
                    return Err(Error::Resolution(format!(
                        "ecrecover expects 4 arguments, got {}",
                        args.len()
                    )));
                }
                self.scopes.depends_on("__ecrecover");
                CallLowering::Expr(Node::call("__ecrecover", args))
            }
            "ecverify" => {
                let args = self.rewrite_all(args.to_vec())?;
                if args.len() != 5 {
                    return Err(Error::Resolution(format!(
                        "ecverify expects 5 arguments, got {}",
                        args.len()
                    )));
                }
                self.scopes.depends_on("__ecverify");
                CallLowering::Expr(Node::call("__ecverify", args))
            }
            "assert" => {
                if !self.debug_on() {
                    return Ok(Some(CallLowering::Nothing));
                }
                let cond = match args {
                    [c] => self.rewrite_expr_bool(c.clone())?,
                    _ => return Err(Error::Type("assert takes one condition".into())),
                };
                self.scopes.depends_on("__panic");
                CallLowering::Stmts(vec![Node::if_(
                    Node::call("iszero", vec![cond]),
                    vec![Node::call("__panic", vec![Node::num(1)])],
                )])
            }
            "debug" => {
                if !self.debug_on() {
                    return Ok(Some(CallLowering::Nothing));
                }
                let args = self.rewrite_all(args.to_vec())?;
                if args.len() > 3 {
                    return Err(Error::Type("debug takes at most three values".into()));
                }
                let sig = BigUint::from_bytes_be(&keccak256(b"debug"));
                let mut log_args = vec![Node::num(0), Node::num(0), make_literal(&sig)];
                let topics = 1 + args.len();
                log_args.extend(args);
                CallLowering::Stmts(vec![Node::call(format!("log{}", topics), log_args)])
            }
            "eth.send" | "eth.transfer" => {
                let args = self.rewrite_all(args.to_vec())?;
                let [to, amount] = match args.as_slice() {
                    [a, b] => [a.clone(), b.clone()],
                    _ => {
                        return Err(Error::Resolution(format!(
                            "{} expects an address and an amount",
                            name
                        )))
                    }
                };
                let transfer = Node::call(
                    "call",
                    vec![
                        Node::call("gas", vec![]),
                        to,
                        amount,
                        Node::num(0),
                        Node::num(0),
                        Node::num(0),
                        Node::num(0),
                    ],
                );
                if name == "eth.send" {
                    CallLowering::Stmts(vec![Node::call("pop", vec![transfer])])
                } else {
                    CallLowering::Stmts(vec![Node::if_(
                        Node::call("iszero", vec![transfer]),
                        vec![Node::call("revert", vec![Node::num(0), Node::num(0)])],
                    )])
                }
            }
            "mcopy" => {
                let args = self.rewrite_all(args.to_vec())?;
                CallLowering::Expr(self.lower_mcopy(args))
            }
            "log2" if args.len() == 1 => {
                let args = self.rewrite_all(args.to_vec())?;
                self.scopes.depends_on("__log2");
                CallLowering::Expr(Node::call("__log2", args))
            }
            "revert.static" => {
                let message = match args {
                    [] => "revert.static reached".to_string(),
                    [node] => {
                        let node = self.rewrite_expr(node.clone())?;
                        String::from_utf8_lossy(
                            &literal_bytes(&node).unwrap_or_else(|| b"revert.static".to_vec()),
                        )
                        .into_owned()
                    }
                    _ => return Err(Error::Type("revert.static takes one message".into())),
                };
                return Err(Error::StaticAbort(message));
            }
            "assert.static" => {
                if args.is_empty() {
                    return Err(Error::Type("assert.static takes a condition".into()));
                }
                let cond = self.rewrite_expr(args[0].clone())?;
                let value = literal_value(&cond).ok_or_else(|| {
                    Error::Type("assert.static condition does not reduce to a literal".into())
                })?;
                if value.is_zero() {
                    let message = match args.get(1) {
                        Some(node) => {
                            let node = self.rewrite_expr(node.clone())?;
                            String::from_utf8_lossy(
                                &literal_bytes(&node).unwrap_or_else(|| b"assertion".to_vec()),
                            )
                            .into_owned()
                        }
                        None => "static assertion failed".to_string(),
                    };
                    return Err(Error::StaticAbort(message));
                }
                CallLowering::Nothing
            }
            _ => return Ok(None),
        };
        Ok(Some(lowering))
    }

    pub(crate) fn rewrite_all(&mut self, args: Vec<Node>) -> Result<Vec<Node>> {
        args.into_iter().map(|a| self.rewrite_expr(a)).collect()
    }

    fn struct_reflection(&mut self, kind: &str, target: &str) -> Result<Node> {
        let (struct_name, member) = match target.split_once('.') {
            Some((s, m)) => (s, Some(m)),
            None => (target, None),
        };
        let layout = self
            .scopes
            .lookup_struct(struct_name)
            .ok_or_else(|| Error::Resolution(format!("undefined struct {}", struct_name)))?;
        let value = match member {
            Some(m) => {
                let laid = layout.member(m).ok_or_else(|| {
                    Error::Resolution(format!("struct {} has no member {}", struct_name, m))
                })?;
                match kind {
                    "sizeof" => (laid.width / 8) as u64,
                    "bitsof" => laid.width as u64,
                    _ => laid.shift() as u64,
                }
            }
            None => match kind {
                "sizeof" => layout.width_bytes() as u64,
                "bitsof" => layout.width_bits as u64,
                _ => {
                    return Err(Error::Type(
                        "offsetof needs a struct member, not a struct".into(),
                    ))
                }
            },
        };
        Ok(Node::num(value))
    }

    fn boolean_intrinsic(&mut self, name: &str, args: &[Node]) -> Result<CallLowering> {
        let args = self.rewrite_all(args.to_vec())?;
        let truth = |n: &Node| literal_value(n).map(|v| !v.is_zero());
        let normalise = |n: Node| match truth(&n) {
            Some(b) => Node::num(b as u64),
            None => Node::call("iszero", vec![Node::call("iszero", vec![n])]),
        };
        let node = match (name, args.as_slice()) {
            ("bool", [x]) => normalise(x.clone()),
            ("notl", [x]) => match truth(x) {
                Some(b) => Node::num(!b as u64),
                None => Node::call("iszero", vec![x.clone()]),
            },
            ("andl", [a, b]) => match (truth(a), truth(b)) {
                (Some(false), _) | (_, Some(false)) => Node::num(0),
                (Some(true), Some(true)) => Node::num(1),
                (Some(true), None) => normalise(b.clone()),
                (None, Some(true)) => normalise(a.clone()),
                (None, None) => Node::call(
                    "and",
                    vec![normalise(a.clone()), normalise(b.clone())],
                ),
            },
            ("orl", [a, b]) => match (truth(a), truth(b)) {
                (Some(true), _) | (_, Some(true)) => Node::num(1),
                (Some(false), Some(false)) => Node::num(0),
                (Some(false), None) => normalise(b.clone()),
                (None, Some(false)) => normalise(a.clone()),
                (None, None) => Node::call(
                    "or",
                    vec![normalise(a.clone()), normalise(b.clone())],
                ),
            },
            _ => {
                return Err(Error::Resolution(format!(
                    "{} has the wrong number of arguments",
                    name
                )))
            }
        };
        Ok(CallLowering::Expr(node))
    }

    fn hash_intrinsic(&mut self, name: &str, args: &[Node]) -> Result<CallLowering> {
        if args.len() == 1 {
            let arg = self.rewrite_expr(args[0].clone())?;
            if let Some(bytes) = literal_bytes(&arg) {
                let digest = compile_time_digest(name, &bytes)?;
                return Ok(CallLowering::Expr(make_literal(&digest)));
            }
        }
        match name {
            "blake2b160" | "blake2b256" => Err(Error::Resolution(format!(
                "{} is compile-time only; no runtime helper exists",
                name
            ))),
            _ => {
                let args = self.rewrite_all(args.to_vec())?;
                if args.len() != 2 {
                    return Err(Error::Resolution(format!(
                        "{} expects (offset, length) at runtime",
                        name
                    )));
                }
                let helper = format!("__{}", name);
                self.scopes.depends_on(&helper);
                Ok(CallLowering::Expr(Node::call(helper, args)))
            }
        }
    }

    fn require_intrinsic(&mut self, variant: &str, args: &[Node]) -> Result<CallLowering> {
        let main_arity = match variant {
            "ok" | "zero" | "before" | "after" | "caller" | "origin" | "owner" => 1,
            "eq" | "neq" | "lt" | "lte" | "gt" | "gte" | "slt" | "slte" | "sgt" | "sgte"
            | "width" => 2,
            _ => {
                return Err(Error::Resolution(format!(
                    "unknown require variant require.{}",
                    variant
                )))
            }
        };
        if args.len() != main_arity && args.len() != main_arity + 1 {
            return Err(Error::Resolution(format!(
                "require.{} expects {} arguments (+ optional message)",
                variant, main_arity
            )));
        }
        let site = self.call_site.clone();
        let mut args = self.rewrite_all(args.to_vec())?;
        let extra = if args.len() > main_arity {
            Some(args.remove(main_arity))
        } else {
            None
        };

        let now = || Node::call("timestamp", vec![]);
        let me = || Node::call("caller", vec![]);
        let fail = match (variant, args.as_slice()) {
            ("ok", [c]) => Node::call("iszero", vec![c.clone()]),
            ("zero", [x]) => x.clone(),
            ("before", [t]) => Node::call("iszero", vec![Node::call("lt", vec![now(), t.clone()])]),
            ("after", [t]) => Node::call("iszero", vec![Node::call("gt", vec![now(), t.clone()])]),
            ("caller", [a]) => Node::call("iszero", vec![Node::call("eq", vec![me(), a.clone()])]),
            ("origin", [a]) => Node::call(
                "iszero",
                vec![Node::call("eq", vec![Node::call("origin", vec![]), a.clone()])],
            ),
            ("owner", [slot]) => Node::call(
                "iszero",
                vec![Node::call(
                    "eq",
                    vec![me(), Node::call("sload", vec![slot.clone()])],
                )],
            ),
            ("eq", [a, b]) => Node::call("iszero", vec![Node::call("eq", vec![a.clone(), b.clone()])]),
            ("neq", [a, b]) => Node::call("eq", vec![a.clone(), b.clone()]),
            ("lt", [a, b]) => Node::call("iszero", vec![Node::call("lt", vec![a.clone(), b.clone()])]),
            ("lte", [a, b]) => Node::call("gt", vec![a.clone(), b.clone()]),
            ("gt", [a, b]) => Node::call("iszero", vec![Node::call("gt", vec![a.clone(), b.clone()])]),
            ("gte", [a, b]) => Node::call("lt", vec![a.clone(), b.clone()]),
            ("slt", [a, b]) => Node::call("iszero", vec![Node::call("slt", vec![a.clone(), b.clone()])]),
            ("slte", [a, b]) => Node::call("sgt", vec![a.clone(), b.clone()]),
            ("sgt", [a, b]) => Node::call("iszero", vec![Node::call("sgt", vec![a.clone(), b.clone()])]),
            ("sgte", [a, b]) => Node::call("slt", vec![a.clone(), b.clone()]),
            ("width", [x, bits]) => Node::call("shr", vec![bits.clone(), x.clone()]),
            _ => unreachable!("arity checked above"),
        };
        let fail = self.rewrite_expr_bool(fail)?;

        // The failure path: literal message, error code, or a bare revert;
        // debug builds point at the call site.
        let path = match extra {
            Some(node) => {
                if let Some(bytes) = literal_bytes(&node) {
                    self.revert_message_stmt(&bytes, (bytes.len() <= 32).then(|| node.clone()))?
                } else if literal_value(&node).is_some() {
                    self.scopes.depends_on("__revert_int");
                    Node::call("__revert_int", vec![node])
                } else {
                    return Err(Error::Type(format!(
                        "require.{}: the trailing argument must be a literal message or code",
                        variant
                    )));
                }
            }
            None => match site.filter(|_| self.debug_on()) {
                Some((file, line)) => {
                    let mut tag = format!("{}:{}", file, line);
                    tag.truncate(64);
                    self.revert_message_stmt(tag.as_bytes(), None)?
                }
                None => Node::call("revert", vec![Node::num(0), Node::num(0)]),
            },
        };

        if let Some(value) = literal_value(&fail) {
            // The guard itself folded: drop it or fail unconditionally.
            if value.is_zero() {
                return Ok(CallLowering::Nothing);
            }
            return Ok(CallLowering::Stmts(vec![path]));
        }
        Ok(CallLowering::Stmts(vec![Node::if_(fail, vec![path])]))
    }
}

fn offset_of(base: &Node, delta: u64) -> Node {
    if delta == 0 {
        return base.clone();
    }
    match literal_value(base) {
        Some(v) => make_literal(&word::add(&v, &word::from_u64(delta))),
        None => Node::call("add", vec![base.clone(), Node::num(delta)]),
    }
}

fn compile_time_digest(name: &str, bytes: &[u8]) -> Result<BigUint> {
    let digest = match name {
        "sha256" => Sha256::digest(bytes).to_vec(),
        "ripemd160" => Ripemd160::digest(bytes).to_vec(),
        "hash160" => Ripemd160::digest(Sha256::digest(bytes)).to_vec(),
        "hash256" => Sha256::digest(Sha256::digest(bytes)).to_vec(),
        "keccak160" => keccak256(bytes)[12..].to_vec(),
        "blake2b160" => blake2b(bytes, 20)?,
        "blake2b256" => blake2b(bytes, 32)?,
        _ => return Err(Error::Resolution(format!("unknown digest {}", name))),
    };
    Ok(BigUint::from_bytes_be(&digest))
}

fn blake2b(bytes: &[u8], out_len: usize) -> Result<Vec<u8>> {
    let mut hasher = blake2::Blake2bVar::new(out_len)
        .map_err(|e| Error::Type(format!("blake2b output size: {}", e)))?;
    hasher.update(bytes);
    let mut out = vec![0u8; out_len];
    hasher
        .finalize_variable(&mut out)
        .map_err(|e| Error::Type(format!("blake2b: {}", e)))?;
    Ok(out)
}
