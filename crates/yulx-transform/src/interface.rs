//! Interface-call thunks: `__icall`/`__itrycall` per method and the
//! `__icreate` family per constructor. Thunks marshal standard ABI
//! (numerics left-padded, bytes right-padded, dynamic arrays by offset),
//! use `staticcall` for view/pure targets, and check return-data size.

use crate::context::Transformer;
use yulx_core::ast::{InterfaceCallKind, Mutability, Node, Param, TypedIdent};
use yulx_core::errors::{Error, Result};
use yulx_core::sig::{InterfaceSig, MethodSig};
use yulx_core::types::BaseType;

fn formal(name: impl Into<String>) -> Node {
    Node::Identifier {
        name: name.into(),
        replaceable: false,
    }
}

/// Standard-ABI encoding of a static value: bytesN shifts left, everything
/// else is stored as-is (already right-aligned).
fn abi_encode(p: &Param, value: Node) -> Node {
    let width = p.ty.width_bits() as u64;
    if p.ty.base == BaseType::Bytes && !p.ty.is_dynamic() && width < 256 {
        Node::call("shl", vec![Node::num(256 - width), value])
    } else {
        value
    }
}

impl Transformer {
    pub(crate) fn register_interface(
        &mut self,
        name: String,
        constructor: Option<Box<Node>>,
        methods: Vec<Node>,
    ) -> Result<()> {
        let mut sigs = Vec::new();
        for decl in &methods {
            let sig = MethodSig::from_node(decl)?;
            for ret in &sig.returns {
                if ret.ty.is_dynamic() {
                    return Err(Error::Type(format!(
                        "interface {}: method {} returns a dynamic type; thunks decode static slots only",
                        name, sig.name
                    )));
                }
            }
            sigs.push(sig);
        }
        let ctor = match constructor.as_deref() {
            Some(Node::ConstructorDecl { params, payable }) => Some((params.clone(), *payable)),
            Some(other) => {
                return Err(Error::Resolution(format!(
                    "interface {}: unexpected constructor form {:?}",
                    name, other
                )))
            }
            None => None,
        };

        for sig in &sigs {
            let call = self.icall_thunk(&name, sig, false);
            self.scopes
                .add_func(&thunk_name("__icall", &name, Some(&sig.name)), call)?;
            let trycall = self.icall_thunk(&name, sig, true);
            self.scopes
                .add_func(&thunk_name("__itrycall", &name, Some(&sig.name)), trycall)?;
        }
        if let Some((params, _)) = &ctor {
            for (prefix, salted, attempt) in [
                ("__icreate", false, false),
                ("__icreate2", true, false),
                ("__itrycreate", false, true),
                ("__itrycreate2", true, true),
            ] {
                let thunk = self.icreate_thunk(&name, params, salted, attempt)?;
                self.scopes.add_func(&thunk_name(prefix, &name, None), thunk)?;
            }
        }

        self.scopes.add_interface(InterfaceSig {
            name,
            constructor: ctor,
            methods: sigs,
        })
    }

    fn icall_thunk(&mut self, iface: &str, sig: &MethodSig, attempt: bool) -> Node {
        let payable = sig.mutability == Mutability::Payable;
        let mut params = vec![TypedIdent::plain("__to")];
        if payable {
            params.push(TypedIdent::plain("__value"));
        }
        for i in 0..sig.params.len() {
            params.push(TypedIdent::plain(format!("__a{}", i)));
        }
        let mut returns = Vec::new();
        if attempt {
            returns.push(TypedIdent::plain("__ok"));
        }
        for i in 0..sig.returns.len() {
            returns.push(TypedIdent::plain(format!("__r{}", i)));
        }

        let head = sig.call_size();
        let rsize = sig.returns_size();
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

        let dynamic: Vec<usize> = sig
            .params
            .iter()
            .enumerate()
            .filter(|(_, p)| p.ty.is_dynamic())
            .map(|(i, _)| i)
            .collect();
        for (i, p) in sig.params.iter().enumerate() {
            if p.ty.is_dynamic() {
                continue;
            }
            body.push(Node::call(
                "mstore",
                vec![
                    Node::num(4 + 32 * i as u64),
                    abi_encode(p, formal(format!("__a{}", i))),
                ],
            ));
        }
        let size_expr = if dynamic.is_empty() {
            Node::num(head)
        } else {
            body.push(Node::let_one("__tail", Node::num(head)));
            for &i in &dynamic {
                let arg = formal(format!("__a{}", i));
                body.push(Node::call(
                    "mstore",
                    vec![
                        Node::num(4 + 32 * i as u64),
                        Node::call("sub", vec![formal("__tail"), Node::num(4)]),
                    ],
                ));
                let len = Node::call("mload", vec![arg.clone()]);
                body.push(Node::call(
                    "mstore",
                    vec![formal("__tail"), len.clone()],
                ));
                let rounded = if sig.params[i].ty.array {
                    Node::call("shl", vec![Node::num(5), len])
                } else {
                    Node::call(
                        "and",
                        vec![
                            Node::call("add", vec![len, Node::num(31)]),
                            Node::call("not", vec![Node::num(31)]),
                        ],
                    )
                };
                body.push(Node::call(
                    "__mcopy",
                    vec![
                        Node::call("add", vec![formal("__tail"), Node::num(32)]),
                        Node::call("add", vec![arg, Node::num(32)]),
                        rounded.clone(),
                    ],
                ));
                body.push(Node::assign(
                    "__tail",
                    Node::call(
                        "add",
                        vec![
                            Node::call("add", vec![formal("__tail"), Node::num(32)]),
                            rounded,
                        ],
                    ),
                ));
            }
            formal("__tail")
        };

        let invoke = if sig.mutability.is_static() {
            Node::call(
                "staticcall",
                vec![
                    Node::call("gas", vec![]),
                    formal("__to"),
                    Node::num(0),
                    size_expr,
                    Node::num(0),
                    Node::num(rsize),
                ],
            )
        } else {
            let value = if payable { formal("__value") } else { Node::num(0) };
            Node::call(
                "call",
                vec![
                    Node::call("gas", vec![]),
                    formal("__to"),
                    value,
                    Node::num(0),
                    size_expr,
                    Node::num(0),
                    Node::num(rsize),
                ],
            )
        };

        if attempt {
            body.push(Node::assign("__ok", invoke));
            if rsize > 0 {
                body.push(Node::if_(
                    formal("__ok"),
                    vec![Node::if_(
                        Node::call(
                            "lt",
                            vec![Node::call("returndatasize", vec![]), Node::num(rsize)],
                        ),
                        vec![Node::assign("__ok", Node::num(0))],
                    )],
                ));
                let mut decode = Vec::new();
                for i in 0..sig.returns.len() {
                    decode.push(Node::assign(
                        format!("__r{}", i),
                        Node::call("mload", vec![Node::num(32 * i as u64)]),
                    ));
                }
                body.push(Node::if_(formal("__ok"), decode));
            }
        } else {
            body.push(Node::let_one("__ok", invoke));
            body.push(Node::if_(
                Node::call("iszero", vec![formal("__ok")]),
                vec![
                    Node::call(
                        "returndatacopy",
                        vec![
                            Node::num(0),
                            Node::num(0),
                            Node::call("returndatasize", vec![]),
                        ],
                    ),
                    Node::call(
                        "revert",
                        vec![Node::num(0), Node::call("returndatasize", vec![])],
                    ),
                ],
            ));
            if rsize > 0 {
                body.push(Node::if_(
                    Node::call(
                        "lt",
                        vec![Node::call("returndatasize", vec![]), Node::num(rsize)],
                    ),
                    vec![Node::call("revert", vec![Node::num(0), Node::num(0)])],
                ));
                for i in 0..sig.returns.len() {
                    body.push(Node::assign(
                        format!("__r{}", i),
                        Node::call("mload", vec![Node::num(32 * i as u64)]),
                    ));
                }
            }
        }

        Node::FunctionDef {
            name: thunk_name(
                if attempt { "__itrycall" } else { "__icall" },
                iface,
                Some(&sig.name),
            ),
            params,
            returns,
            noinline: false,
            builtin: true,
            body,
        }
    }

    /// Creation thunks copy the interface's creation code from the
    /// like-named data blob and append the ABI-encoded constructor tail.
    fn icreate_thunk(
        &mut self,
        iface: &str,
        params: &[Param],
        salted: bool,
        attempt: bool,
    ) -> Result<Node> {
        for p in params {
            if p.ty.is_dynamic() {
                return Err(Error::Type(format!(
                    "interface {}: creation thunks take static constructor arguments",
                    iface
                )));
            }
        }
        let mut formals = vec![TypedIdent::plain("__value")];
        if salted {
            formals.push(TypedIdent::plain("__salt"));
        }
        for i in 0..params.len() {
            formals.push(TypedIdent::plain(format!("__c{}", i)));
        }

        let mut body = vec![
            Node::let_one("__size", Node::call("datasize", vec![Node::string(iface)])),
            Node::call(
                "datacopy",
                vec![
                    Node::num(0),
                    Node::call("dataoffset", vec![Node::string(iface)]),
                    formal("__size"),
                ],
            ),
        ];
        for (i, p) in params.iter().enumerate() {
            body.push(Node::call(
                "mstore",
                vec![
                    Node::call("add", vec![formal("__size"), Node::num(32 * i as u64)]),
                    abi_encode(p, formal(format!("__c{}", i))),
                ],
            ));
        }
        let total = Node::call(
            "add",
            vec![formal("__size"), Node::num(32 * params.len() as u64)],
        );
        let create = if salted {
            Node::call(
                "create2",
                vec![formal("__value"), Node::num(0), total, formal("__salt")],
            )
        } else {
            Node::call("create", vec![formal("__value"), Node::num(0), total])
        };
        body.push(Node::assign("__addr", create));
        if !attempt {
            body.push(Node::if_(
                Node::call("iszero", vec![formal("__addr")]),
                vec![
                    Node::call(
                        "returndatacopy",
                        vec![
                            Node::num(0),
                            Node::num(0),
                            Node::call("returndatasize", vec![]),
                        ],
                    ),
                    Node::call(
                        "revert",
                        vec![Node::num(0), Node::call("returndatasize", vec![])],
                    ),
                ],
            ));
        }

        let prefix = match (salted, attempt) {
            (false, false) => "__icreate",
            (true, false) => "__icreate2",
            (false, true) => "__itrycreate",
            (true, true) => "__itrycreate2",
        };
        Ok(Node::FunctionDef {
            name: thunk_name(prefix, iface, None),
            params: formals,
            returns: vec![TypedIdent::plain("__addr")],
            noinline: false,
            builtin: true,
            body,
        })
    }

    pub(crate) fn rewrite_interface_call(
        &mut self,
        kind: InterfaceCallKind,
        attempt: bool,
        name: &str,
        method: Option<&str>,
        args: Vec<Node>,
    ) -> Result<Node> {
        let sig = self
            .scopes
            .lookup_interface(name)
            .cloned()
            .ok_or_else(|| Error::Resolution(format!("undefined interface {}", name)))?;
        let (helper, expected) = match kind {
            InterfaceCallKind::Call => {
                let method_name = method.ok_or_else(|| {
                    Error::Resolution(format!("interface call on {} needs a method", name))
                })?;
                let m = sig.method(method_name).ok_or_else(|| {
                    Error::Resolution(format!(
                        "interface {} has no method {}",
                        name, method_name
                    ))
                })?;
                let payable = m.mutability == Mutability::Payable;
                let expected = 1 + usize::from(payable) + m.params.len();
                let prefix = if attempt { "__itrycall" } else { "__icall" };
                (thunk_name(prefix, name, Some(method_name)), expected)
            }
            InterfaceCallKind::Create | InterfaceCallKind::Create2 => {
                let (params, _) = sig.constructor.as_ref().ok_or_else(|| {
                    Error::Resolution(format!("interface {} declares no constructor", name))
                })?;
                let salted = kind == InterfaceCallKind::Create2;
                let expected = 1 + usize::from(salted) + params.len();
                let prefix = match (salted, attempt) {
                    (false, false) => "__icreate",
                    (true, false) => "__icreate2",
                    (false, true) => "__itrycreate",
                    (true, true) => "__itrycreate2",
                };
                (thunk_name(prefix, name, None), expected)
            }
        };
        if args.len() != expected {
            return Err(Error::Resolution(format!(
                "{} expects {} arguments, got {}",
                helper,
                expected,
                args.len()
            )));
        }
        let args = args
            .into_iter()
            .map(|a| self.rewrite_expr(a))
            .collect::<Result<Vec<_>>>()?;
        self.scopes.depends_on(&helper);
        Ok(Node::call(helper, args))
    }
}

fn thunk_name(prefix: &str, iface: &str, method: Option<&str>) -> String {
    match method {
        Some(m) => format!("{}_{}_{}", prefix, iface, m),
        None => format!("{}_{}", prefix, iface),
    }
}
