//! The transformer context: scope stack, configuration, dependency
//! materialisation and inline-suppression padding.

use crate::builtins;
use crate::Options;
use sha2::{Digest, Sha256};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::PathBuf;
use std::rc::Rc;
use yulx_core::abi::AbiCollector;
use yulx_core::ast::Node;
use yulx_core::errors::{Error, Result};
use yulx_core::scope::{Scope, ScopeKind, ScopeStack};
use yulx_core::{hardfork, mangle, weight};

pub struct Transformer {
    pub(crate) scopes: ScopeStack,
    pub(crate) opts: Options,
    pub(crate) evm_ordinal: u64,
    /// Optimiser letters currently disabled.
    pub(crate) deopt: BTreeSet<char>,
    pub abi: AbiCollector,
    /// MacroDef id -> parameter-index map, memoised per definition identity.
    pub(crate) macro_memo: HashMap<u64, Rc<HashMap<String, usize>>>,
    pub(crate) includes_seen: HashSet<PathBuf>,
    /// (relative filename, contents) pairs in include order.
    pub(crate) metadata_entries: Vec<(String, Vec<u8>)>,
    /// Contract whose ABI is currently being collected.
    pub(crate) current_contract: Option<String>,
    /// Seen a `memoryguard` call; lowers the inliner thresholds.
    pub(crate) memguard: bool,
    /// file:line of the call currently being rewritten; debug builds embed
    /// it in synthesised revert messages.
    pub(crate) call_site: Option<(String, u32)>,
    blob_counter: u64,
}

impl Transformer {
    pub fn new(opts: Options) -> Result<Self> {
        let evm_ordinal = match &opts.hardfork {
            Some(name) => hardfork::ordinal(name)
                .ok_or_else(|| Error::Version(format!("unknown hard fork {:?}", name)))?,
            None => hardfork::latest(),
        };
        let mut tx = Self {
            scopes: ScopeStack::new(),
            evm_ordinal,
            deopt: BTreeSet::new(),
            abi: AbiCollector::new(),
            macro_memo: HashMap::new(),
            includes_seen: HashSet::new(),
            metadata_entries: Vec::new(),
            current_contract: None,
            memguard: false,
            call_site: None,
            blob_counter: 0,
            opts,
        };
        builtins::preload(&mut tx)?;
        tx.inject_macros()?;
        Ok(tx)
    }

    fn inject_macros(&mut self) -> Result<()> {
        let injected = self.opts.macros.clone();
        for (name, source) in injected {
            let expr = yulx_parser::parse_expression(&source, "<macro>")?;
            self.scopes
                .add_macro(&name, yulx_core::scope::MacroEntry::Const(expr))?;
        }
        Ok(())
    }

    pub fn run(&mut self, root: Node) -> Result<Node> {
        let statements = match root {
            Node::Root { statements } => statements,
            other => vec![other],
        };
        let mut out = self.rewrite_statements(statements)?;
        // Source without objects still gets its helper tail.
        let root_scope = self.scopes.pop();
        self.materialise_depends(&root_scope, &mut out)?;
        out.extend(root_scope.data.clone());
        Ok(Node::Root { statements: out })
    }

    pub(crate) fn record_metadata(&mut self, file: &str, contents: &str) {
        if self.opts.metadata {
            self.metadata_entries
                .push((file.to_string(), contents.as_bytes().to_vec()));
        }
    }

    /// SHA-256 over the (filename, contents) pairs folded in include order.
    pub(crate) fn metadata_digest(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        for (name, contents) in &self.metadata_entries {
            hasher.update(name.as_bytes());
            hasher.update([0u8]);
            hasher.update(contents);
            hasher.update([0u8]);
        }
        hasher.finalize().into()
    }

    pub(crate) fn folding_enabled(&self) -> bool {
        !self.deopt.contains(&'F')
    }

    pub(crate) fn padding_enabled(&self) -> bool {
        !self.deopt.contains(&'P')
    }

    pub(crate) fn debug_on(&self) -> bool {
        self.opts.debug
    }

    /// Append `verbatim` CODESIZE/POP no-ops until the body weight clears
    /// the arity-indexed inliner threshold.
    pub(crate) fn pad_noinline(&self, def: Node) -> Node {
        if !self.padding_enabled() {
            return def;
        }
        match def {
            Node::FunctionDef {
                name,
                params,
                returns,
                noinline,
                builtin,
                mut body,
            } if noinline => {
                let needed = weight::padding_needed(&body, params.len(), self.memguard);
                for _ in 0..needed {
                    body.push(Node::call(
                        "verbatim_0i_0o",
                        vec![Node::Literal {
                            kind: yulx_core::ast::LiteralKind::HexLiteral,
                            value: "3850".into(),
                            unit: None,
                        }],
                    ));
                }
                Node::FunctionDef {
                    name,
                    params,
                    returns,
                    noinline,
                    builtin,
                    body,
                }
            }
            other => other,
        }
    }

    /// Emit every helper the closed scope depends on, cloning builtin
    /// definitions, renaming locals that would shadow, and padding the
    /// noinline ones. Transitive builtin references join the worklist.
    pub(crate) fn materialise_depends(&mut self, closed: &Scope, out: &mut Vec<Node>) -> Result<()> {
        let mut worklist: Vec<String> = closed.depends.iter().cloned().collect();
        let mut done: HashSet<String> = HashSet::new();
        // Yul forbids shadowing anywhere in the lexical chain, so imported
        // locals must dodge the closed block's names too.
        let mut visible = self.scopes.visible_names();
        visible.extend(closed.vars.keys().cloned());
        visible.extend(closed.funcs.keys().cloned());

        let mut i = 0;
        while i < worklist.len() {
            let name = worklist[i].clone();
            i += 1;
            if !done.insert(name.clone()) {
                continue;
            }
            let def = closed
                .funcs
                .get(&name)
                .cloned()
                .or_else(|| self.scopes.lookup_func(&name).cloned())
                .ok_or_else(|| Error::Resolution(format!("unresolved helper {}", name)))?;
            let is_builtin = matches!(&def, Node::FunctionDef { builtin: true, .. });
            if !is_builtin {
                // User definitions already live in this block.
                continue;
            }
            // Anything the helper calls must come along; a helper-shaped
            // callee nobody defines is a resolution error, not a silent
            // hole in the emitted code.
            let def_body: &[Node] = match &def {
                Node::FunctionDef { body, .. } => body,
                _ => &[],
            };
            let mut missing: Option<String> = None;
            for stmt in def_body {
                stmt.visit(&mut |n| {
                    if let Node::FunctionCall { name: callee, .. } = n {
                        let known = closed.funcs.contains_key(callee)
                            || self.scopes.lookup_func(callee).is_some();
                        if known {
                            if !done.contains(callee) {
                                worklist.push(callee.clone());
                            }
                        } else if (callee.starts_with("__") || callee.contains('.'))
                            && missing.is_none()
                        {
                            missing = Some(callee.clone());
                        }
                    }
                });
            }
            if let Some(callee) = missing {
                return Err(Error::Resolution(format!(
                    "{} calls {}, which nothing defines here",
                    name, callee
                )));
            }
            let clone = mangle::rename_locals(def, &|n| visible.contains(n));
            let clone = match clone {
                Node::FunctionDef {
                    name,
                    params,
                    returns,
                    noinline,
                    body,
                    ..
                } => self.pad_noinline(Node::FunctionDef {
                    name,
                    params,
                    returns,
                    noinline,
                    builtin: false,
                    body,
                }),
                other => other,
            };
            out.push(clone);
        }
        Ok(())
    }

    /// Close a code-like scope: helpers flush into the statement tail, data
    /// blobs and captured immutables bubble to the enclosing scopes.
    pub(crate) fn close_code_scope(&mut self, out: &mut Vec<Node>) -> Result<()> {
        let scope = self.scopes.pop();
        self.materialise_depends(&scope, out)?;
        if let Some(object) = self.scopes.find_object_scope_mut() {
            object.data.extend(scope.data.clone());
        }
        Ok(())
    }

    /// Close a plain lexical scope; accumulated blobs move to the parent.
    pub(crate) fn close_scope(&mut self) {
        let scope = self.scopes.pop();
        let parent = self.scopes.current_mut();
        parent.data.extend(scope.data);
        parent.immutables.extend(scope.immutables);
    }

    pub(crate) fn push_scope(&mut self, kind: ScopeKind) {
        self.scopes.push(kind);
    }

    pub(crate) fn next_blob_index(&mut self) -> u64 {
        self.blob_counter += 1;
        self.blob_counter
    }
}
