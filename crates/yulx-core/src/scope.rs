//! Lexical scope stack with per-kind symbol tables.
//!
//! A scope is created on entry to blocks, objects, code blocks, functions,
//! methods, loop headers, if branches and switch cases, and discarded when
//! the construct is fully rewritten. Dependencies and data blobs recorded in
//! inner scopes bubble up to the nearest code/object scope and are flushed
//! into the emitted block tail on exit.

use crate::ast::Node;
use crate::errors::{Error, Result};
use crate::layout::StructLayout;
use crate::sig::{ErrorSig, EventSig, InterfaceSig, MethodSig};
use indexmap::{IndexMap, IndexSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Root,
    Block,
    Object,
    Code,
    Constructor,
    Function,
    Method,
    Loop,
    Branch,
    Case,
}

impl ScopeKind {
    /// Code-like scopes collect helper dependencies for materialisation.
    pub fn is_code(&self) -> bool {
        matches!(self, ScopeKind::Code | ScopeKind::Constructor | ScopeKind::Root)
    }
}

#[derive(Debug, Clone)]
pub enum MacroEntry {
    Const(Node),
    Def {
        id: u64,
        params: Vec<String>,
        body: Node,
    },
}

#[derive(Debug, Clone, Default)]
pub struct Scope {
    pub consts: IndexMap<String, Node>,
    pub structs: IndexMap<String, StructLayout>,
    pub macros: IndexMap<String, MacroEntry>,
    pub funcs: IndexMap<String, Node>,
    pub interfaces: IndexMap<String, InterfaceSig>,
    pub methods: IndexMap<String, MethodSig>,
    pub events: IndexMap<String, EventSig>,
    pub errors: IndexMap<String, ErrorSig>,
    /// Declared locals; the value is the struct type when annotated.
    pub vars: IndexMap<String, Option<String>>,
    /// The method whose body (or dispatcher arm) this scope is inside.
    pub calldata: Option<MethodSig>,
    /// Helper names to materialise in this code block, first-reference order.
    pub depends: IndexSet<String>,
    /// Data blobs to append to the enclosing object.
    pub data: Vec<Node>,
    /// (name, value) pairs captured by `storeimmutable`, released by
    /// `construct`.
    pub immutables: Vec<(String, Node)>,
    /// Runtime object name, set on the object scope of a lowered contract.
    pub runtime_name: Option<String>,
    pub kind: Option<ScopeKind>,
    /// Nesting depth among object scopes; the deployed contract's runtime
    /// object sits at odd depth.
    pub object_depth: usize,
}

impl Scope {
    pub fn new(kind: ScopeKind) -> Self {
        Self {
            kind: Some(kind),
            ..Self::default()
        }
    }

    pub fn kind(&self) -> ScopeKind {
        self.kind.unwrap_or(ScopeKind::Block)
    }
}

#[derive(Debug, Default)]
pub struct ScopeStack {
    scopes: Vec<Scope>,
}

impl ScopeStack {
    pub fn new() -> Self {
        let mut stack = Self { scopes: Vec::new() };
        stack.push(ScopeKind::Root);
        stack
    }

    pub fn push(&mut self, kind: ScopeKind) -> &mut Scope {
        let object_depth = self.scopes.iter().filter(|s| s.kind() == ScopeKind::Object).count()
            + usize::from(kind == ScopeKind::Object);
        let mut scope = Scope::new(kind);
        scope.object_depth = object_depth;
        self.scopes.push(scope);
        self.scopes.last_mut().unwrap()
    }

    pub fn pop(&mut self) -> Scope {
        self.scopes.pop().expect("scope stack underflow")
    }

    pub fn current(&self) -> &Scope {
        self.scopes.last().expect("empty scope stack")
    }

    pub fn current_mut(&mut self) -> &mut Scope {
        self.scopes.last_mut().expect("empty scope stack")
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    fn walk<'a, T>(&'a self, f: impl Fn(&'a Scope) -> Option<T>) -> Option<T> {
        self.scopes.iter().rev().find_map(f)
    }

    pub fn lookup_const(&self, name: &str) -> Option<&Node> {
        self.walk(|s| s.consts.get(name))
    }

    pub fn lookup_struct(&self, name: &str) -> Option<&StructLayout> {
        self.walk(|s| s.structs.get(name))
    }

    pub fn lookup_macro(&self, name: &str) -> Option<&MacroEntry> {
        self.walk(|s| s.macros.get(name))
    }

    pub fn lookup_func(&self, name: &str) -> Option<&Node> {
        self.walk(|s| s.funcs.get(name))
    }

    pub fn lookup_interface(&self, name: &str) -> Option<&InterfaceSig> {
        self.walk(|s| s.interfaces.get(name))
    }

    pub fn lookup_method(&self, name: &str) -> Option<&MethodSig> {
        self.walk(|s| s.methods.get(name))
    }

    pub fn lookup_event(&self, name: &str) -> Option<&EventSig> {
        self.walk(|s| s.events.get(name))
    }

    pub fn lookup_error(&self, name: &str) -> Option<&ErrorSig> {
        self.walk(|s| s.errors.get(name))
    }

    /// The struct annotation of a declared variable, if any.
    pub fn lookup_var(&self, name: &str) -> Option<&Option<String>> {
        self.walk(|s| s.vars.get(name))
    }

    pub fn var_exists(&self, name: &str) -> bool {
        self.lookup_var(name).is_some()
    }

    /// The method bound to the innermost body or dispatcher arm.
    pub fn bound_method(&self) -> Option<&MethodSig> {
        self.walk(|s| s.calldata.as_ref())
    }

    fn ensure_free(scope: &Scope, name: &str, what: &str) -> Result<()> {
        let taken = scope.consts.contains_key(name)
            || scope.structs.contains_key(name)
            || scope.macros.contains_key(name)
            || scope.funcs.contains_key(name)
            || scope.interfaces.contains_key(name)
            || scope.methods.contains_key(name)
            || scope.events.contains_key(name)
            || scope.errors.contains_key(name);
        if taken {
            return Err(Error::Resolution(format!("duplicate {} definition: {}", what, name)));
        }
        Ok(())
    }

    pub fn add_const(&mut self, name: &str, expr: Node) -> Result<()> {
        Self::ensure_free(self.current(), name, "constant")?;
        self.current_mut().consts.insert(name.to_string(), expr);
        Ok(())
    }

    pub fn add_struct(&mut self, layout: StructLayout) -> Result<()> {
        Self::ensure_free(self.current(), &layout.name, "struct")?;
        self.current_mut().structs.insert(layout.name.clone(), layout);
        Ok(())
    }

    pub fn add_macro(&mut self, name: &str, entry: MacroEntry) -> Result<()> {
        Self::ensure_free(self.current(), name, "macro")?;
        self.current_mut().macros.insert(name.to_string(), entry);
        Ok(())
    }

    pub fn add_func(&mut self, name: &str, def: Node) -> Result<()> {
        if self.current().funcs.contains_key(name) {
            return Err(Error::Resolution(format!("duplicate function definition: {}", name)));
        }
        self.current_mut().funcs.insert(name.to_string(), def);
        Ok(())
    }

    /// Builtin preload: silently replaces an earlier registration so a
    /// fuller library level wins.
    pub fn preload_func(&mut self, name: &str, def: Node) {
        self.current_mut().funcs.insert(name.to_string(), def);
    }

    pub fn add_interface(&mut self, sig: InterfaceSig) -> Result<()> {
        Self::ensure_free(self.current(), &sig.name, "interface")?;
        self.current_mut().interfaces.insert(sig.name.clone(), sig);
        Ok(())
    }

    pub fn add_method(&mut self, sig: MethodSig) -> Result<()> {
        Self::ensure_free(self.current(), &sig.name, "method")?;
        self.current_mut().methods.insert(sig.name.clone(), sig);
        Ok(())
    }

    pub fn add_event(&mut self, sig: EventSig) -> Result<()> {
        Self::ensure_free(self.current(), &sig.name, "event")?;
        self.current_mut().events.insert(sig.name.clone(), sig);
        Ok(())
    }

    pub fn add_error(&mut self, sig: ErrorSig) -> Result<()> {
        Self::ensure_free(self.current(), &sig.name, "error")?;
        self.current_mut().errors.insert(sig.name.clone(), sig);
        Ok(())
    }

    pub fn add_var(&mut self, name: &str, struct_type: Option<String>) -> Result<()> {
        if self.current().vars.contains_key(name) {
            return Err(Error::Resolution(format!("duplicate variable: {}", name)));
        }
        self.current_mut().vars.insert(name.to_string(), struct_type);
        Ok(())
    }

    /// `undefine`: drop the innermost macro binding with this name.
    pub fn remove_macro(&mut self, name: &str) {
        for scope in self.scopes.iter_mut().rev() {
            if scope.macros.shift_remove(name).is_some() {
                return;
            }
        }
    }

    /// Register a helper in the nearest enclosing code block so its
    /// definition is emitted there exactly once.
    pub fn depends_on(&mut self, name: &str) {
        if let Some(scope) = self.scopes.iter_mut().rev().find(|s| s.kind().is_code()) {
            scope.depends.insert(name.to_string());
        }
    }

    pub fn find_code_scope_mut(&mut self) -> Option<&mut Scope> {
        self.scopes.iter_mut().rev().find(|s| s.kind().is_code())
    }

    pub fn find_object_scope_mut(&mut self) -> Option<&mut Scope> {
        self.scopes
            .iter_mut()
            .rev()
            .find(|s| s.kind() == ScopeKind::Object || s.kind() == ScopeKind::Root)
    }

    /// The nearest object scope representing a deployed contract's runtime
    /// object: deployment objects sit at odd 1-based nesting, their runtime
    /// objects at the even depth below.
    pub fn find_contract_block(&self) -> Option<&Scope> {
        self.scopes
            .iter()
            .rev()
            .find(|s| s.kind() == ScopeKind::Object && s.object_depth % 2 == 0)
    }

    pub fn find_contract_block_mut(&mut self) -> Option<&mut Scope> {
        self.scopes
            .iter_mut()
            .rev()
            .find(|s| s.kind() == ScopeKind::Object && s.object_depth % 2 == 0)
    }

    /// The runtime object name recorded by the innermost contract lowering.
    pub fn runtime_name(&self) -> Option<&str> {
        self.walk(|s| s.runtime_name.as_deref())
    }

    /// Every method visible from the current scope, outermost first; the
    /// dispatcher switches over these.
    pub fn visible_methods(&self) -> Vec<MethodSig> {
        self.scopes
            .iter()
            .flat_map(|s| s.methods.values().cloned())
            .collect()
    }

    /// Immutables captured anywhere on the live stack, for `construct`.
    pub fn captured_immutables(&self) -> Vec<(String, Node)> {
        self.scopes
            .iter()
            .flat_map(|s| s.immutables.iter().cloned())
            .collect()
    }

    /// All function names visible from the current scope, used when imported
    /// helper locals must avoid shadowing.
    pub fn visible_names(&self) -> IndexSet<String> {
        let mut names = IndexSet::new();
        for scope in &self.scopes {
            names.extend(scope.funcs.keys().cloned());
            names.extend(scope.vars.keys().cloned());
        }
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Node;

    #[test]
    fn lookup_walks_parents_and_inner_wins() {
        let mut stack = ScopeStack::new();
        stack.add_const("x", Node::num(1)).unwrap();
        stack.push(ScopeKind::Block);
        assert!(stack.lookup_const("x").is_some());
        stack.add_const("x", Node::num(2)).unwrap();
        match stack.lookup_const("x").unwrap() {
            Node::Literal { value, .. } => assert_eq!(value, "2"),
            other => panic!("unexpected: {:?}", other),
        }
        stack.pop();
        match stack.lookup_const("x").unwrap() {
            Node::Literal { value, .. } => assert_eq!(value, "1"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn redefinition_in_same_scope_fails() {
        let mut stack = ScopeStack::new();
        stack.add_const("x", Node::num(1)).unwrap();
        assert!(stack.add_const("x", Node::num(2)).is_err());
    }

    #[test]
    fn depends_bubble_to_the_code_scope() {
        let mut stack = ScopeStack::new();
        stack.push(ScopeKind::Object);
        stack.push(ScopeKind::Code);
        stack.push(ScopeKind::Block);
        stack.push(ScopeKind::Branch);
        stack.depends_on("__revert32");
        stack.depends_on("__revert32");
        stack.pop();
        stack.pop();
        let code = stack.pop();
        assert_eq!(code.depends.len(), 1);
        assert!(code.depends.contains("__revert32"));
    }

    #[test]
    fn contract_block_is_the_runtime_object() {
        let mut stack = ScopeStack::new();
        stack.push(ScopeKind::Object); // depth 1: deployment object
        stack.push(ScopeKind::Code);
        stack.pop();
        stack.push(ScopeKind::Object); // depth 2: runtime object
        stack.push(ScopeKind::Code);
        let found = stack.find_contract_block().unwrap();
        assert_eq!(found.object_depth, 2);
    }
}
