//! Statement rewriting: one post-order pass, each statement yielding zero
//! or more plain-Yul statements.

use crate::context::Transformer;
use crate::fold::literal_value;
use num_bigint::BigUint;
use num_traits::One;
use yulx_core::ast::{Node, PragmaKind, TypedIdent};
use yulx_core::errors::{Error, Result};
use yulx_core::layout::StructLayout;
use yulx_core::scope::{MacroEntry, ScopeKind};
use yulx_core::sig::{ErrorSig, EventSig};
use yulx_core::{version, word};

impl Transformer {
    pub(crate) fn rewrite_statements(&mut self, stmts: Vec<Node>) -> Result<Vec<Node>> {
        // Functions may be referenced before their definition in the block.
        for stmt in &stmts {
            if let Node::FunctionDef { name, .. } = stmt {
                if self.scopes.lookup_func(name).is_none() {
                    self.scopes.preload_func(name, stmt.clone());
                }
            }
        }
        let mut out = Vec::new();
        for stmt in stmts {
            self.rewrite_statement(stmt, &mut out)?;
        }
        Ok(out)
    }

    fn rewrite_scoped(&mut self, stmts: Vec<Node>, kind: ScopeKind) -> Result<Vec<Node>> {
        self.push_scope(kind);
        let result = self.rewrite_statements(stmts);
        match result {
            Ok(out) => {
                self.close_scope();
                Ok(out)
            }
            Err(e) => {
                self.close_scope();
                Err(e)
            }
        }
    }

    pub(crate) fn rewrite_statement(&mut self, stmt: Node, out: &mut Vec<Node>) -> Result<()> {
        match stmt {
            Node::Root { statements } => {
                out.extend(self.rewrite_statements(statements)?);
            }
            Node::Pragma { kind, value } => self.rewrite_pragma(kind, &value)?,
            Node::Fold {
                cond,
                body,
                elifs,
                else_body,
            } => self.rewrite_fold(*cond, body, elifs, else_body, out)?,
            Node::Include { base, file } => self.rewrite_include(&base, &file, out)?,
            Node::EnumDef { name, members } => self.rewrite_enum(name, members)?,
            Node::StructDef { name, members } => self.rewrite_struct_def(&name, members)?,
            Node::InterfaceDef {
                name,
                constructor,
                methods,
            } => self.register_interface(name, constructor, methods)?,
            Node::Contract {
                name,
                optimize,
                statements,
            } => self.lower_contract(name, optimize, statements, out)?,
            Node::ObjectBlock { name, statements } => {
                self.push_scope(ScopeKind::Object);
                let mut rewritten = self.rewrite_statements(statements)?;
                let scope = self.scopes.pop();
                rewritten.extend(scope.data);
                out.push(Node::ObjectBlock {
                    name,
                    statements: rewritten,
                });
            }
            Node::CodeBlock { statements } => {
                self.push_scope(ScopeKind::Code);
                let mut rewritten = self.rewrite_statements(statements)?;
                self.close_code_scope(&mut rewritten)?;
                out.push(Node::CodeBlock {
                    statements: rewritten,
                });
            }
            Node::Block { statements } => {
                let rewritten = self.rewrite_scoped(statements, ScopeKind::Block)?;
                out.push(Node::Block {
                    statements: rewritten,
                });
            }
            Node::ConstructorDecl { .. } | Node::ConstructorDef { .. } => {
                return Err(Error::Resolution(
                    "constructors only appear in contracts and interfaces".into(),
                ));
            }
            Node::MethodDecl { .. } | Node::MethodDef { .. } => {
                return Err(Error::Resolution(
                    "methods only appear in contracts and interfaces".into(),
                ));
            }
            Node::EventDecl { .. } => {
                let sig = EventSig::from_node(&stmt)?;
                self.register_event_abi(&sig)?;
                self.scopes.add_event(sig)?;
            }
            Node::ErrorDecl { .. } => {
                let sig = ErrorSig::from_node(&stmt)?;
                self.register_error_abi(&sig)?;
                self.scopes.add_error(sig)?;
            }
            Node::DataValue { .. } => out.push(stmt),
            Node::MacroConst { name, expr } => {
                self.scopes.add_macro(&name, MacroEntry::Const(*expr))?;
            }
            Node::MacroDef {
                name,
                params,
                body,
                id,
            } => {
                self.scopes.add_macro(
                    &name,
                    MacroEntry::Def {
                        id,
                        params,
                        body: *body,
                    },
                )?;
            }
            Node::FunctionDef {
                name,
                params,
                returns,
                noinline,
                builtin,
                body,
            } => {
                self.push_scope(ScopeKind::Function);
                for p in params.iter().chain(returns.iter()) {
                    let struct_ty = p
                        .ty
                        .as_ref()
                        .filter(|t| self.scopes.lookup_struct(t).is_some())
                        .cloned();
                    self.scopes.add_var(&p.name, struct_ty)?;
                }
                let rewritten = self.rewrite_statements(body);
                self.close_scope();
                let def = Node::FunctionDef {
                    name: name.clone(),
                    params: params.into_iter().map(strip_type).collect(),
                    returns: returns.into_iter().map(strip_type).collect(),
                    noinline,
                    builtin,
                    body: rewritten?,
                };
                let def = self.pad_noinline(def);
                self.scopes.preload_func(&name, def.clone());
                out.push(def);
            }
            Node::VariableDeclaration { names, value } => {
                let value = match value {
                    Some(v) => Some(Box::new(self.rewrite_expr(*v)?)),
                    None => None,
                };
                for n in &names {
                    let struct_ty = n
                        .ty
                        .as_ref()
                        .filter(|t| self.scopes.lookup_struct(t).is_some())
                        .cloned();
                    self.scopes.add_var(&n.name, struct_ty)?;
                }
                out.push(Node::VariableDeclaration {
                    names: names.into_iter().map(strip_type).collect(),
                    value,
                });
            }
            Node::ConstDecl { name, expr, wrap } => self.rewrite_const(&name, *expr, wrap)?,
            Node::Assignment { targets, value } => {
                let targets = targets
                    .into_iter()
                    .map(|t| self.resolve_target(t))
                    .collect::<Result<Vec<_>>>()?;
                let value = self.rewrite_expr(*value)?;
                out.push(Node::Assignment {
                    targets,
                    value: Box::new(value),
                });
            }
            Node::MemberAssignment {
                base,
                member,
                or_assign,
                value,
            } => {
                let base = self.resolve_target(base)?;
                let value = self.member_write_expr(&base, &member, or_assign, *value)?;
                out.push(Node::Assignment {
                    targets: vec![base],
                    value: Box::new(value),
                });
            }
            Node::If { cond, body } => {
                let cond = self.rewrite_expr_bool(*cond)?;
                let body = self.rewrite_scoped(body, ScopeKind::Branch)?;
                out.push(Node::If {
                    cond: Box::new(cond),
                    body,
                });
            }
            Node::Switch {
                expr,
                cases,
                default,
            } => {
                let expr = self.rewrite_expr(*expr)?;
                let mut rewritten_cases = Vec::with_capacity(cases.len());
                for (value, body) in cases {
                    let value = self.rewrite_expr(value)?;
                    let body = self.rewrite_scoped(body, ScopeKind::Case)?;
                    rewritten_cases.push((value, body));
                }
                let default = match default {
                    Some(body) => Some(self.rewrite_scoped(body, ScopeKind::Case)?),
                    None => None,
                };
                out.push(Node::Switch {
                    expr: Box::new(expr),
                    cases: rewritten_cases,
                    default,
                });
            }
            Node::ForLoop {
                init,
                cond,
                post,
                body,
            } => {
                self.push_scope(ScopeKind::Loop);
                let result = (|| {
                    let init = self.rewrite_statements(init)?;
                    let cond = self.rewrite_expr_bool(*cond)?;
                    let post = self.rewrite_statements(post)?;
                    let body = self.rewrite_statements(body)?;
                    Ok::<_, Error>(Node::ForLoop {
                        init,
                        cond: Box::new(cond),
                        post,
                        body,
                    })
                })();
                self.close_scope();
                out.push(result?);
            }
            Node::While { cond, body } => {
                self.rewrite_statement(
                    Node::ForLoop {
                        init: Vec::new(),
                        cond,
                        post: Vec::new(),
                        body,
                    },
                    out,
                )?;
            }
            Node::DoWhile { cond, body } => {
                // Run once, then loop while the condition holds.
                let mut inner = body;
                inner.push(Node::if_(
                    Node::call("iszero", vec![*cond]),
                    vec![Node::Break],
                ));
                self.rewrite_statement(
                    Node::ForLoop {
                        init: Vec::new(),
                        cond: Box::new(Node::num(1)),
                        post: Vec::new(),
                        body: inner,
                    },
                    out,
                )?;
            }
            Node::Break | Node::Continue | Node::Leave => out.push(stmt),
            Node::Emit { name, offset, args } => self.rewrite_emit(&name, *offset, args, out)?,
            Node::Throw { name, args } => self.rewrite_throw(&name, args, out)?,
            Node::InterfaceCall {
                kind,
                attempt,
                name,
                method,
                args,
            } => {
                let call =
                    self.rewrite_interface_call(kind, attempt, &name, method.as_deref(), args)?;
                out.push(call);
            }
            Node::FunctionCall {
                name,
                args,
                file,
                line,
            } => self.rewrite_call_stmt(name, args, file, line, out)?,
            other => {
                return Err(Error::Type(format!(
                    "not a statement: {:?}",
                    other
                )));
            }
        }
        Ok(())
    }

    /// Assignment targets resolve through macro constants only.
    fn resolve_target(&self, target: String) -> Result<String> {
        match self.scopes.lookup_macro(&target) {
            Some(MacroEntry::Const(Node::Identifier { name, .. })) => Ok(name.clone()),
            Some(MacroEntry::Const(_)) => Err(Error::Type(format!(
                "macro {} does not name an assignable identifier",
                target
            ))),
            _ => Ok(target),
        }
    }

    fn rewrite_pragma(&mut self, kind: PragmaKind, value: &str) -> Result<()> {
        match kind {
            PragmaKind::License => {
                if self.scopes.depth() != 1 {
                    return Err(Error::Resolution(
                        "pragma license belongs at the root scope".into(),
                    ));
                }
                self.abi.set_license(value);
            }
            PragmaKind::Solc => {
                self.abi.set_compiler(value);
                if let Some(version) = self.opts.solc_version.clone() {
                    if !version::satisfies(&version, value)? {
                        return Err(Error::Version(format!(
                            "solc {} does not satisfy pragma solc {:?}",
                            version, value
                        )));
                    }
                }
            }
            PragmaKind::Yulc => {
                if let Some(version) = self.opts.yulc_version.clone() {
                    if !version::satisfies(&version, value)? {
                        return Err(Error::Version(format!(
                            "yulc {} does not satisfy pragma yulc {:?}",
                            version, value
                        )));
                    }
                }
            }
            PragmaKind::Evm => {
                let minimum = yulx_core::hardfork::ordinal(value)
                    .ok_or_else(|| Error::Version(format!("unknown hard fork {:?}", value)))?;
                if self.evm_ordinal < minimum {
                    return Err(Error::Version(format!(
                        "source requires hard fork {} (ordinal {}), targeting {}",
                        value, minimum, self.evm_ordinal
                    )));
                }
            }
            PragmaKind::Optimize => {
                for letter in value.chars() {
                    self.deopt.remove(&letter);
                }
            }
            PragmaKind::Deoptimize => {
                self.deopt.extend(value.chars());
            }
            PragmaKind::Lock => {
                let def = Node::FunctionDef {
                    name: "__mutex".into(),
                    params: Vec::new(),
                    returns: vec![TypedIdent::plain("k")],
                    noinline: true,
                    builtin: true,
                    body: vec![Node::assign("k", Node::hex(value))],
                };
                self.scopes.add_func("__mutex", def)?;
            }
        }
        Ok(())
    }

    fn rewrite_include(&mut self, base: &str, file: &str, out: &mut Vec<Node>) -> Result<()> {
        let path = std::path::Path::new(base).join(file);
        let canonical = path.canonicalize().unwrap_or_else(|_| path.clone());
        if !self.includes_seen.insert(canonical) {
            return Ok(());
        }
        let contents = std::fs::read_to_string(&path)?;
        self.record_metadata(file, &contents);
        let stripped = yulx_parser::strip(&contents, &path.to_string_lossy())?;
        let root =
            yulx_parser::Parser::new(&stripped.code, &path.to_string_lossy()).parse_root()?;
        self.rewrite_statement(root, out)
    }

    fn rewrite_enum(
        &mut self,
        prefix: Option<String>,
        members: Vec<(String, Option<Node>)>,
    ) -> Result<()> {
        let mut next = BigUint::default();
        for (member, explicit) in members {
            let value = match explicit {
                Some(expr) => {
                    let expr = self.rewrite_expr(expr)?;
                    literal_value(&expr).ok_or_else(|| {
                        Error::Type(format!("enum value for {} must be a literal", member))
                    })?
                }
                None => next.clone(),
            };
            next = word::add(&value, &BigUint::one());
            let name = match &prefix {
                Some(p) => format!("{}.{}", p, member),
                None => member,
            };
            self.scopes.add_const(&name, crate::fold::make_literal(&value))?;
        }
        Ok(())
    }

    fn rewrite_struct_def(
        &mut self,
        name: &str,
        members: Vec<yulx_core::ast::StructMember>,
    ) -> Result<()> {
        let mut laid = Vec::with_capacity(members.len());
        for m in members {
            let default = match m.default {
                Some(expr) => {
                    let expr = self.rewrite_expr(expr)?;
                    Some(literal_value(&expr).ok_or_else(|| {
                        Error::Type(format!(
                            "struct {}: default for {} must be a literal",
                            name, m.name
                        ))
                    })?)
                }
                None => None,
            };
            laid.push((m.name, m.ty, default));
        }
        self.scopes.add_struct(StructLayout::new(name, laid)?)
    }

    fn rewrite_const(&mut self, name: &str, expr: Node, wrap: bool) -> Result<()> {
        let expr = self.rewrite_expr(expr)?;
        if !wrap {
            return self.scopes.add_const(name, expr);
        }
        // `const x() := e`: a hidden zero-argument noinline function keeps
        // the expression out of the inliner's reach.
        let hidden = format!("__const_{}", name);
        let def = Node::FunctionDef {
            name: hidden.clone(),
            params: Vec::new(),
            returns: vec![TypedIdent::plain("r")],
            noinline: true,
            builtin: true,
            body: vec![Node::assign("r", expr)],
        };
        self.scopes.add_func(&hidden, def)?;
        self.scopes.add_const(name, Node::call(hidden, vec![]))
    }
}

fn strip_type(t: TypedIdent) -> TypedIdent {
    TypedIdent {
        name: t.name,
        ty: None,
    }
}
