//! Method lowering: calldata binding, per-parameter checks, the selector
//! dispatcher, and constructor/contract desugaring.

use crate::context::Transformer;
use yulx_core::ast::Node;
use yulx_core::errors::{Error, Result};
use yulx_core::scope::ScopeKind;
use yulx_core::sig::{ErrorSig, EventSig, MethodSig};
use yulx_core::types::AbiType;
use yulx_core::{abi, hardfork};

fn revert_zero() -> Node {
    Node::call("revert", vec![Node::num(0), Node::num(0)])
}

/// Decode one calldata slot per the dialect convention: scalars pack
/// left-aligned in their 32-byte slot, dynamic values are offsets relative
/// to the argument area at byte 4.
fn calldata_read(ty: &AbiType, off: u64) -> Node {
    let load = Node::call("calldataload", vec![Node::num(off)]);
    if ty.is_dynamic() {
        return Node::call("add", vec![load, Node::num(4)]);
    }
    let width = ty.width_bits() as u64;
    if width >= 256 {
        load
    } else if ty.is_signed() {
        Node::call("sar", vec![Node::num(256 - width), load])
    } else {
        Node::call("shr", vec![Node::num(256 - width), load])
    }
}

impl Transformer {
    pub(crate) fn rewrite_calldata(&mut self, member: &str, reference: bool) -> Result<Node> {
        let sig = self
            .scopes
            .bound_method()
            .cloned()
            .ok_or_else(|| Error::Resolution("calldata binding outside a method body".into()))?;
        let index = sig.param_index(member).ok_or_else(|| {
            Error::Resolution(format!("method {} has no parameter {}", sig.name, member))
        })?;
        let off = sig.param_offset(index);
        if reference {
            Ok(Node::num(off))
        } else {
            Ok(calldata_read(&sig.params[index].ty, off))
        }
    }

    /// The per-method prelude: value guard and parameter validation.
    pub(crate) fn method_check_stmts(&mut self, sig: &MethodSig) -> Result<Vec<Node>> {
        let mut out = Vec::new();
        if !matches!(sig.mutability, yulx_core::ast::Mutability::Payable) {
            out.push(Node::if_(
                Node::call("callvalue", vec![]),
                vec![revert_zero()],
            ));
        }
        for (i, p) in sig.params.iter().enumerate() {
            let off = sig.param_offset(i);
            let ty = &p.ty;
            let width = ty.width_bits() as u64;
            if ty.is_dynamic() {
                // Offset plus length must stay inside calldata.
                let ptr = format!("__p{}", i);
                out.push(Node::let_one(
                    &ptr,
                    Node::call(
                        "add",
                        vec![Node::call("calldataload", vec![Node::num(off)]), Node::num(4)],
                    ),
                ));
                let len = Node::call("calldataload", vec![Node::ident(ptr.as_str())]);
                let span = if ty.array {
                    Node::call("shl", vec![Node::num(5), len])
                } else {
                    len
                };
                let end = Node::call(
                    "add",
                    vec![
                        Node::call("add", vec![Node::ident(ptr.as_str()), Node::num(32)]),
                        span,
                    ],
                );
                out.push(Node::if_(
                    Node::call("gt", vec![end, Node::call("calldatasize", vec![])]),
                    vec![revert_zero()],
                ));
            } else if ty.is_signed() && width < 256 {
                self.scopes.depends_on("__check_int");
                out.push(Node::call(
                    "__check_int",
                    vec![
                        calldata_read(ty, off),
                        Node::num(width / 8 - 1),
                    ],
                ));
            } else if width < 256 {
                // Canonical encodings leave the slot's trailing bits clear.
                out.push(Node::if_(
                    Node::call(
                        "shl",
                        vec![
                            Node::num(width),
                            Node::call("calldataload", vec![Node::num(off)]),
                        ],
                    ),
                    vec![revert_zero()],
                ));
            }
        }
        Ok(out)
    }

    /// Lower a method body into the zero-argument runtime function the
    /// dispatcher calls.
    pub(crate) fn lower_method(&mut self, def: Node) -> Result<Node> {
        let sig = MethodSig::from_node(&def)?;
        let body = match def {
            Node::MethodDef { body, .. } => body,
            _ => unreachable!("lower_method takes a method definition"),
        };
        self.push_scope(ScopeKind::Method);
        self.scopes.current_mut().calldata = Some(sig.clone());

        let mut explicit_check = false;
        for stmt in &body {
            stmt.visit(&mut |n| {
                if matches!(n, Node::FunctionCall { name, .. } if name == "method.check") {
                    explicit_check = true;
                }
            });
        }
        let mut stmts = Vec::new();
        if !explicit_check {
            stmts.extend(self.method_check_stmts(&sig)?);
        }
        stmts.extend(self.rewrite_statements(body)?);
        self.close_scope();

        Ok(Node::FunctionDef {
            name: format!("__method_{}", sig.name),
            params: Vec::new(),
            returns: Vec::new(),
            noinline: false,
            builtin: false,
            body: stmts,
        })
    }

    fn dispatch_arm(&mut self, sig: &MethodSig) -> Vec<Node> {
        let direct = Node::call(format!("__method_{}", sig.name), vec![]);
        if sig.locked {
            self.scopes.depends_on("mutex.lock");
            self.scopes.depends_on("mutex.unlock");
            vec![
                Node::call("mutex.lock", vec![]),
                direct,
                Node::call("mutex.unlock", vec![]),
            ]
        } else {
            vec![direct]
        }
    }

    /// The `method.select()` dispatcher over every visible method.
    pub(crate) fn dispatch_stmts(&mut self) -> Result<Vec<Node>> {
        let methods = self.scopes.visible_methods();
        let receive = methods.iter().find(|m| m.is_receive()).cloned();
        let fallback = methods.iter().find(|m| m.is_fallback()).cloned();

        let mut short = Vec::new();
        if let Some(receive) = &receive {
            let mut arm = self.dispatch_arm(receive);
            arm.push(Node::call("stop", vec![]));
            short.push(Node::if_(
                Node::call("iszero", vec![Node::call("calldatasize", vec![])]),
                arm,
            ));
        }
        match &fallback {
            Some(fallback) => {
                short.extend(self.dispatch_arm(fallback));
                short.push(Node::call("stop", vec![]));
            }
            None => short.push(revert_zero()),
        }

        let mut out = vec![Node::if_(
            Node::call(
                "lt",
                vec![Node::call("calldatasize", vec![]), Node::num(4)],
            ),
            short,
        )];

        let mut cases = Vec::new();
        for sig in &methods {
            if sig.is_receive() || sig.is_fallback() {
                continue;
            }
            let selector = Node::hex(format!("0x{:08x}", sig.selector()));
            cases.push((selector, self.dispatch_arm(sig)));
        }
        let default = match &fallback {
            Some(fallback) => Some(self.dispatch_arm(fallback)),
            None => Some(vec![revert_zero()]),
        };
        if !cases.is_empty() {
            out.push(Node::Switch {
                expr: Box::new(Node::call(
                    "shr",
                    vec![Node::num(224), Node::call("calldataload", vec![Node::num(0)])],
                )),
                cases,
                default,
            });
        } else if let Some(fallback) = &fallback {
            out.extend(self.dispatch_arm(fallback));
        }
        out.push(Node::call("stop", vec![]));
        Ok(out)
    }

    /// `method.call(name)`: a direct call of the lowered method, honouring
    /// `locked`.
    pub(crate) fn method_call_stmts(&mut self, target: &str) -> Result<Vec<Node>> {
        let sig = self
            .scopes
            .lookup_method(target)
            .cloned()
            .ok_or_else(|| Error::Resolution(format!("undefined method {}", target)))?;
        Ok(self.dispatch_arm(&sig))
    }

    /// Deployment code for a contract: argument-tail decoding, checks, then
    /// the user body (which reaches `construct`).
    fn lower_constructor(
        &mut self,
        ctor: Option<Node>,
        contract: &str,
        runtime: &str,
    ) -> Result<Vec<Node>> {
        let Some(ctor) = ctor else {
            return Ok(vec![
                Node::if_(Node::call("callvalue", vec![]), vec![revert_zero()]),
                Node::call(
                    "datacopy",
                    vec![
                        Node::num(0),
                        Node::call("dataoffset", vec![Node::string(runtime)]),
                        Node::call("datasize", vec![Node::string(runtime)]),
                    ],
                ),
                Node::call(
                    "return",
                    vec![Node::num(0), Node::call("datasize", vec![Node::string(runtime)])],
                ),
            ]);
        };
        let (params, payable, unchecked, body) = match ctor {
            Node::ConstructorDef {
                params,
                payable,
                unchecked,
                body,
            } => (params, payable, unchecked, body),
            other => {
                return Err(Error::Resolution(format!(
                    "expected a constructor definition, got {:?}",
                    other
                )))
            }
        };

        self.push_scope(ScopeKind::Constructor);
        let mut out = Vec::new();
        if !payable && !unchecked {
            out.push(Node::if_(
                Node::call("callvalue", vec![]),
                vec![revert_zero()],
            ));
        }
        if !params.is_empty() {
            let total = 32 * params.len() as u64;
            let has_dynamic = params.iter().any(|p| p.ty.is_dynamic());
            out.push(Node::let_one(
                "__programSize",
                Node::call("datasize", vec![Node::string(contract)]),
            ));
            out.push(Node::let_one(
                "__argSize",
                Node::call(
                    "sub",
                    vec![Node::call("codesize", vec![]), Node::ident("__programSize")],
                ),
            ));
            out.push(Node::call(
                "codecopy",
                vec![Node::num(0), Node::ident("__programSize"), Node::ident("__argSize")],
            ));
            self.scopes.add_var("__programSize", None)?;
            self.scopes.add_var("__argSize", None)?;
            if !unchecked {
                let check = if has_dynamic {
                    Node::call("lt", vec![Node::ident("__argSize"), Node::num(total)])
                } else {
                    Node::call(
                        "iszero",
                        vec![Node::call(
                            "eq",
                            vec![Node::ident("__argSize"), Node::num(total)],
                        )],
                    )
                };
                out.push(Node::if_(check, vec![revert_zero()]));
            }
            for (i, p) in params.iter().enumerate() {
                let name = p.name.clone().ok_or_else(|| {
                    Error::Type("constructor parameters need names".into())
                })?;
                let slot = Node::call("mload", vec![Node::num(32 * i as u64)]);
                let width = p.ty.width_bits() as u64;
                let decode = if p.ty.is_dynamic() || width >= 256 {
                    slot
                } else if p.ty.is_signed() {
                    Node::call("sar", vec![Node::num(256 - width), slot])
                } else {
                    Node::call("shr", vec![Node::num(256 - width), slot])
                };
                out.push(Node::let_one(name.as_str(), decode));
                self.scopes.add_var(&name, None)?;
                if unchecked {
                    continue;
                }
                if p.ty.is_dynamic() {
                    self.scopes.depends_on("__check_memory_array");
                    out.push(Node::call(
                        "__check_memory_array",
                        vec![Node::ident(name.as_str()), Node::ident("__argSize")],
                    ));
                } else if p.ty.is_signed() && width < 256 {
                    self.scopes.depends_on("__check_int");
                    out.push(Node::call(
                        "__check_int",
                        vec![Node::ident(name.as_str()), Node::num(width / 8 - 1)],
                    ));
                }
            }
        }
        out.extend(self.rewrite_statements(body)?);
        self.close_code_scope(&mut out)?;
        Ok(out)
    }

    /// Select preprocessor branches at the contract level before
    /// partitioning, so conditionally-compiled methods exist.
    fn expand_contract_folds(&mut self, statements: Vec<Node>) -> Result<Vec<Node>> {
        let mut out = Vec::new();
        for stmt in statements {
            match stmt {
                Node::Fold {
                    cond,
                    body,
                    elifs,
                    else_body,
                } => {
                    let mut branches = vec![(*cond, body)];
                    branches.extend(elifs);
                    let mut taken = else_body.unwrap_or_default();
                    for (cond, body) in branches {
                        let cond = self.rewrite_expr(cond)?;
                        let value = crate::fold::literal_value(&cond).ok_or_else(|| {
                            Error::Type("@if condition does not reduce to a literal".into())
                        })?;
                        if !num_traits::Zero::is_zero(&value) {
                            taken = body;
                            break;
                        }
                    }
                    out.extend(self.expand_contract_folds(taken)?);
                }
                other => out.push(other),
            }
        }
        Ok(out)
    }

    /// Contract desugaring: deployment object wrapping a runtime object with
    /// a synthesised dispatcher.
    pub(crate) fn lower_contract(
        &mut self,
        name: String,
        optimize: bool,
        statements: Vec<Node>,
        out: &mut Vec<Node>,
    ) -> Result<()> {
        let runtime_name = if optimize {
            format!("{}Runtime_deployed", name)
        } else {
            format!("{}Runtime", name)
        };
        let previous_contract = self.current_contract.replace(name.clone());
        self.push_scope(ScopeKind::Object);
        self.scopes.current_mut().runtime_name = Some(runtime_name.clone());

        let statements = self.expand_contract_folds(statements)?;
        let mut ctor = None;
        let mut methods = Vec::new();
        let mut deferred = Vec::new();
        let mut runtime_data = Vec::new();
        for stmt in statements {
            match stmt {
                Node::ConstructorDef { .. } => {
                    if ctor.is_some() {
                        return Err(Error::Resolution(format!(
                            "contract {} declares two constructors",
                            name
                        )));
                    }
                    ctor = Some(stmt);
                }
                Node::MethodDef { .. } => methods.push(stmt),
                Node::DataValue { .. } => runtime_data.push(stmt),
                Node::EnumDef { .. }
                | Node::StructDef { .. }
                | Node::InterfaceDef { .. }
                | Node::EventDecl { .. }
                | Node::ErrorDecl { .. }
                | Node::MacroConst { .. }
                | Node::MacroDef { .. }
                | Node::ConstDecl { .. }
                | Node::Pragma { .. }
                | Node::Include { .. } => {
                    // Declarations register now so method bodies resolve
                    // them; includes may splice further statements.
                    let mut extra = Vec::new();
                    self.rewrite_statement(stmt, &mut extra)?;
                    deferred.extend(extra);
                }
                other => deferred.push(other),
            }
        }

        for def in &methods {
            let sig = MethodSig::from_node(def)?;
            self.register_method_abi(&sig)?;
            self.scopes.add_method(sig)?;
        }
        if let Some(Node::ConstructorDef { params, payable, .. }) = &ctor {
            let item = abi::AbiItem::constructor(params, *payable);
            self.abi.contract_mut(&name).add(item)?;
        }

        let deploy_code = self.lower_constructor(ctor, &name, &runtime_name)?;

        // Runtime object.
        self.push_scope(ScopeKind::Object);
        self.push_scope(ScopeKind::Code);
        let mut runtime_body = self.rewrite_statements(deferred)?;
        runtime_body.extend(self.dispatch_stmts()?);
        for def in methods {
            let lowered = self.lower_method(def)?;
            runtime_body.push(lowered);
        }
        self.close_code_scope(&mut runtime_body)?;
        let runtime_scope = self.scopes.pop();

        let mut runtime_statements = vec![Node::CodeBlock {
            statements: runtime_body,
        }];
        runtime_statements.extend(runtime_data);
        runtime_statements.extend(runtime_scope.data);
        if self.opts.metadata {
            runtime_statements.push(Node::DataValue {
                name: ".metadata".into(),
                hex: true,
                value: hex::encode(self.metadata_digest()),
            });
        }

        let deploy_scope = self.scopes.pop();
        let mut object_statements = vec![
            Node::CodeBlock {
                statements: deploy_code,
            },
            Node::ObjectBlock {
                name: runtime_name,
                statements: runtime_statements,
            },
        ];
        object_statements.extend(deploy_scope.data);

        self.current_contract = previous_contract;
        out.push(Node::ObjectBlock {
            name,
            statements: object_statements,
        });
        Ok(())
    }

    fn register_method_abi(&mut self, sig: &MethodSig) -> Result<()> {
        let Some(contract) = self.current_contract.clone() else {
            return Ok(());
        };
        self.abi.contract_mut(&contract).add(abi::AbiItem::function(sig))
    }

    pub(crate) fn register_event_abi(&mut self, sig: &EventSig) -> Result<()> {
        let Some(contract) = self.current_contract.clone() else {
            return Ok(());
        };
        self.abi.contract_mut(&contract).add(abi::AbiItem::event(sig))
    }

    pub(crate) fn register_error_abi(&mut self, sig: &ErrorSig) -> Result<()> {
        let Some(contract) = self.current_contract.clone() else {
            return Ok(());
        };
        self.abi.contract_mut(&contract).add(abi::AbiItem::error(sig))
    }

    /// `mcopy` passes through on forks that ship it, otherwise the helper.
    pub(crate) fn lower_mcopy(&mut self, args: Vec<Node>) -> Node {
        if hardfork::has_mcopy(self.evm_ordinal) {
            Node::call("mcopy", args)
        } else {
            self.scopes.depends_on("__mcopy");
            Node::call("__mcopy", args)
        }
    }
}
