//! The tagged AST of the extended dialect.
//!
//! One `Node` enum covers every construct; after transformation only the
//! plain-Yul subset remains (objects, code, blocks, functions, lets,
//! assignments, control flow, calls, literals, identifiers, data).

use crate::types::AbiType;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PragmaKind {
    License,
    Solc,
    Yulc,
    Evm,
    Optimize,
    Deoptimize,
    Lock,
}

impl PragmaKind {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "license" => Some(PragmaKind::License),
            "solc" => Some(PragmaKind::Solc),
            "yulc" => Some(PragmaKind::Yulc),
            "evm" => Some(PragmaKind::Evm),
            "optimize" => Some(PragmaKind::Optimize),
            "deoptimize" => Some(PragmaKind::Deoptimize),
            "lock" => Some(PragmaKind::Lock),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PragmaKind::License => "license",
            PragmaKind::Solc => "solc",
            PragmaKind::Yulc => "yulc",
            PragmaKind::Evm => "evm",
            PragmaKind::Optimize => "optimize",
            PragmaKind::Deoptimize => "deoptimize",
            PragmaKind::Lock => "lock",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LiteralKind {
    HexNumber,
    DecimalNumber,
    StringLiteral,
    HexLiteral,
    BoolLiteral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Visibility {
    External,
    Internal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mutability {
    NonPayable,
    Payable,
    View,
    Pure,
}

impl Mutability {
    /// View and pure methods go through `staticcall` in interface thunks.
    pub fn is_static(&self) -> bool {
        matches!(self, Mutability::View | Mutability::Pure)
    }

    pub fn as_abi_str(&self) -> &'static str {
        match self {
            Mutability::NonPayable => "nonpayable",
            Mutability::Payable => "payable",
            Mutability::View => "view",
            Mutability::Pure => "pure",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterfaceCallKind {
    Create,
    Create2,
    Call,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypedIdent {
    pub name: String,
    /// Optional struct-type annotation (`let x:btc_output := ...`).
    pub ty: Option<String>,
}

impl TypedIdent {
    pub fn plain(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub ty: AbiType,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventParam {
    pub ty: AbiType,
    pub name: Option<String>,
    pub indexed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructMember {
    pub ty: AbiType,
    /// `+` marks an anonymous padding member.
    pub name: String,
    pub default: Option<Node>,
}

impl StructMember {
    pub fn is_padding(&self) -> bool {
        self.name == "+"
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    Root {
        statements: Vec<Node>,
    },
    Pragma {
        kind: PragmaKind,
        value: String,
    },
    /// Preprocessor `@if ... @elif ... @else` fold.
    Fold {
        cond: Box<Node>,
        body: Vec<Node>,
        elifs: Vec<(Node, Vec<Node>)>,
        else_body: Option<Vec<Node>>,
    },
    Include {
        base: String,
        file: String,
    },
    EnumDef {
        name: Option<String>,
        members: Vec<(String, Option<Node>)>,
    },
    StructDef {
        name: String,
        members: Vec<StructMember>,
    },
    InterfaceDef {
        name: String,
        constructor: Option<Box<Node>>,
        methods: Vec<Node>,
    },
    Contract {
        name: String,
        /// `optimize` modifier: the runtime object is named
        /// `<Name>Runtime_deployed` so the backend applies full optimisation.
        optimize: bool,
        statements: Vec<Node>,
    },
    ObjectBlock {
        name: String,
        statements: Vec<Node>,
    },
    CodeBlock {
        statements: Vec<Node>,
    },
    ConstructorDecl {
        params: Vec<Param>,
        payable: bool,
    },
    ConstructorDef {
        params: Vec<Param>,
        payable: bool,
        unchecked: bool,
        body: Vec<Node>,
    },
    MethodDecl {
        name: String,
        params: Vec<Param>,
        visibility: Visibility,
        mutability: Mutability,
        returns: Vec<Param>,
    },
    MethodDef {
        name: String,
        params: Vec<Param>,
        visibility: Visibility,
        mutability: Mutability,
        locked: bool,
        returns: Vec<Param>,
        body: Vec<Node>,
    },
    EventDecl {
        name: String,
        params: Vec<EventParam>,
        anonymous: bool,
        packed: bool,
        /// `Some(true)` = inline, `Some(false)` = noinline, `None` = default.
        inline: Option<bool>,
    },
    ErrorDecl {
        name: String,
        params: Vec<Param>,
    },
    DataValue {
        name: String,
        hex: bool,
        value: String,
    },
    Block {
        statements: Vec<Node>,
    },
    MacroConst {
        name: String,
        expr: Box<Node>,
    },
    MacroDef {
        name: String,
        params: Vec<String>,
        body: Box<Node>,
        /// Identity key for the parameter-map memo; assigned at parse.
        id: u64,
    },
    FunctionDef {
        name: String,
        params: Vec<TypedIdent>,
        returns: Vec<TypedIdent>,
        noinline: bool,
        builtin: bool,
        body: Vec<Node>,
    },
    VariableDeclaration {
        names: Vec<TypedIdent>,
        value: Option<Box<Node>>,
    },
    ConstDecl {
        name: String,
        expr: Box<Node>,
        /// `const x() := e`: wrap in a hidden zero-argument function.
        wrap: bool,
    },
    Assignment {
        targets: Vec<String>,
        value: Box<Node>,
    },
    MemberAssignment {
        base: String,
        member: String,
        or_assign: bool,
        value: Box<Node>,
    },
    If {
        cond: Box<Node>,
        body: Vec<Node>,
    },
    Switch {
        expr: Box<Node>,
        cases: Vec<(Node, Vec<Node>)>,
        default: Option<Vec<Node>>,
    },
    ForLoop {
        init: Vec<Node>,
        cond: Box<Node>,
        post: Vec<Node>,
        body: Vec<Node>,
    },
    While {
        cond: Box<Node>,
        body: Vec<Node>,
    },
    DoWhile {
        cond: Box<Node>,
        body: Vec<Node>,
    },
    Break,
    Continue,
    Leave,
    Emit {
        name: String,
        offset: Box<Node>,
        args: Vec<Node>,
    },
    Throw {
        name: String,
        args: Vec<Node>,
    },
    StructInit {
        name: String,
        args: Vec<Node>,
    },
    /// The `@` sentinel in a struct initialiser.
    DefaultArg,
    InterfaceCall {
        kind: InterfaceCallKind,
        attempt: bool,
        name: String,
        method: Option<String>,
        args: Vec<Node>,
    },
    FunctionCall {
        name: String,
        args: Vec<Node>,
        file: String,
        line: u32,
    },
    Literal {
        kind: LiteralKind,
        value: String,
        unit: Option<String>,
    },
    MemberIdentifier {
        base: String,
        cast: Option<String>,
        member: String,
    },
    CallDataIdentifier {
        member: String,
        /// `&calldata.x`: yield the calldata offset instead of the value.
        reference: bool,
    },
    Identifier {
        name: String,
        replaceable: bool,
    },
}

impl Node {
    pub fn ident(name: impl Into<String>) -> Node {
        Node::Identifier {
            name: name.into(),
            replaceable: true,
        }
    }

    pub fn call(name: impl Into<String>, args: Vec<Node>) -> Node {
        Node::FunctionCall {
            name: name.into(),
            args,
            file: String::new(),
            line: 0,
        }
    }

    pub fn num(value: u64) -> Node {
        Node::Literal {
            kind: LiteralKind::DecimalNumber,
            value: value.to_string(),
            unit: None,
        }
    }

    pub fn hex(text: impl Into<String>) -> Node {
        Node::Literal {
            kind: LiteralKind::HexNumber,
            value: text.into(),
            unit: None,
        }
    }

    pub fn string(text: impl Into<String>) -> Node {
        Node::Literal {
            kind: LiteralKind::StringLiteral,
            value: text.into(),
            unit: None,
        }
    }

    pub fn let_one(name: impl Into<String>, value: Node) -> Node {
        Node::VariableDeclaration {
            names: vec![TypedIdent::plain(name)],
            value: Some(Box::new(value)),
        }
    }

    pub fn assign(name: impl Into<String>, value: Node) -> Node {
        Node::Assignment {
            targets: vec![name.into()],
            value: Box::new(value),
        }
    }

    pub fn if_(cond: Node, body: Vec<Node>) -> Node {
        Node::If {
            cond: Box::new(cond),
            body,
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Node::Literal { .. })
    }

    pub fn literal_value(&self) -> Option<(LiteralKind, &str)> {
        match self {
            Node::Literal { kind, value, .. } => Some((*kind, value)),
            _ => None,
        }
    }

    /// Pre-order walk over this node and every child.
    pub fn visit<'a>(&'a self, f: &mut dyn FnMut(&'a Node)) {
        f(self);
        self.for_each_child(&mut |child| child.visit(f));
    }

    fn for_each_child<'a>(&'a self, f: &mut dyn FnMut(&'a Node)) {
        match self {
            Node::Root { statements }
            | Node::ObjectBlock { statements, .. }
            | Node::CodeBlock { statements }
            | Node::Block { statements }
            | Node::Contract { statements, .. } => statements.iter().for_each(&mut *f),
            Node::Fold {
                cond,
                body,
                elifs,
                else_body,
            } => {
                f(cond);
                body.iter().for_each(&mut *f);
                for (c, b) in elifs {
                    f(c);
                    b.iter().for_each(&mut *f);
                }
                if let Some(b) = else_body {
                    b.iter().for_each(&mut *f);
                }
            }
            Node::EnumDef { members, .. } => {
                members.iter().filter_map(|(_, e)| e.as_ref()).for_each(&mut *f)
            }
            Node::StructDef { members, .. } => members
                .iter()
                .filter_map(|m| m.default.as_ref())
                .for_each(&mut *f),
            Node::InterfaceDef {
                constructor,
                methods,
                ..
            } => {
                if let Some(c) = constructor {
                    f(c);
                }
                methods.iter().for_each(&mut *f);
            }
            Node::ConstructorDef { body, .. }
            | Node::MethodDef { body, .. }
            | Node::FunctionDef { body, .. } => body.iter().for_each(&mut *f),
            Node::MacroConst { expr, .. } => f(expr),
            Node::MacroDef { body, .. } => f(body),
            Node::VariableDeclaration { value, .. } => {
                if let Some(v) = value {
                    f(v);
                }
            }
            Node::ConstDecl { expr, .. } => f(expr),
            Node::Assignment { value, .. } | Node::MemberAssignment { value, .. } => f(value),
            Node::If { cond, body } => {
                f(cond);
                body.iter().for_each(&mut *f);
            }
            Node::Switch {
                expr,
                cases,
                default,
            } => {
                f(expr);
                for (v, b) in cases {
                    f(v);
                    b.iter().for_each(&mut *f);
                }
                if let Some(b) = default {
                    b.iter().for_each(&mut *f);
                }
            }
            Node::ForLoop {
                init,
                cond,
                post,
                body,
            } => {
                init.iter().for_each(&mut *f);
                f(cond);
                post.iter().for_each(&mut *f);
                body.iter().for_each(&mut *f);
            }
            Node::While { cond, body } | Node::DoWhile { cond, body } => {
                f(cond);
                body.iter().for_each(&mut *f);
            }
            Node::Emit { offset, args, .. } => {
                f(offset);
                args.iter().for_each(&mut *f);
            }
            Node::Throw { args, .. }
            | Node::StructInit { args, .. }
            | Node::InterfaceCall { args, .. }
            | Node::FunctionCall { args, .. } => args.iter().for_each(&mut *f),
            Node::Pragma { .. }
            | Node::Include { .. }
            | Node::ConstructorDecl { .. }
            | Node::MethodDecl { .. }
            | Node::EventDecl { .. }
            | Node::ErrorDecl { .. }
            | Node::DataValue { .. }
            | Node::Break
            | Node::Continue
            | Node::Leave
            | Node::DefaultArg
            | Node::Literal { .. }
            | Node::MemberIdentifier { .. }
            | Node::CallDataIdentifier { .. }
            | Node::Identifier { .. } => {}
        }
    }

    /// Bottom-up structural map: children are mapped first, then `f` is
    /// applied to the rebuilt node.
    pub fn map(self, f: &mut dyn FnMut(Node) -> Node) -> Node {
        let mapped = self.map_children(f);
        f(mapped)
    }

    fn map_vec(nodes: Vec<Node>, f: &mut dyn FnMut(Node) -> Node) -> Vec<Node> {
        nodes.into_iter().map(|n| n.map(f)).collect()
    }

    fn map_children(self, f: &mut dyn FnMut(Node) -> Node) -> Node {
        match self {
            Node::Root { statements } => Node::Root {
                statements: Self::map_vec(statements, f),
            },
            Node::ObjectBlock { name, statements } => Node::ObjectBlock {
                name,
                statements: Self::map_vec(statements, f),
            },
            Node::CodeBlock { statements } => Node::CodeBlock {
                statements: Self::map_vec(statements, f),
            },
            Node::Block { statements } => Node::Block {
                statements: Self::map_vec(statements, f),
            },
            Node::Contract {
                name,
                optimize,
                statements,
            } => Node::Contract {
                name,
                optimize,
                statements: Self::map_vec(statements, f),
            },
            Node::Fold {
                cond,
                body,
                elifs,
                else_body,
            } => Node::Fold {
                cond: Box::new(cond.map(f)),
                body: Self::map_vec(body, f),
                elifs: elifs
                    .into_iter()
                    .map(|(c, b)| (c.map(f), Self::map_vec(b, f)))
                    .collect(),
                else_body: else_body.map(|b| Self::map_vec(b, f)),
            },
            Node::EnumDef { name, members } => Node::EnumDef {
                name,
                members: members
                    .into_iter()
                    .map(|(n, e)| (n, e.map(|e| e.map(f))))
                    .collect(),
            },
            Node::StructDef { name, members } => Node::StructDef {
                name,
                members: members
                    .into_iter()
                    .map(|m| StructMember {
                        default: m.default.map(|d| d.map(f)),
                        ..m
                    })
                    .collect(),
            },
            Node::InterfaceDef {
                name,
                constructor,
                methods,
            } => Node::InterfaceDef {
                name,
                constructor: constructor.map(|c| Box::new(c.map(f))),
                methods: Self::map_vec(methods, f),
            },
            Node::ConstructorDef {
                params,
                payable,
                unchecked,
                body,
            } => Node::ConstructorDef {
                params,
                payable,
                unchecked,
                body: Self::map_vec(body, f),
            },
            Node::MethodDef {
                name,
                params,
                visibility,
                mutability,
                locked,
                returns,
                body,
            } => Node::MethodDef {
                name,
                params,
                visibility,
                mutability,
                locked,
                returns,
                body: Self::map_vec(body, f),
            },
            Node::FunctionDef {
                name,
                params,
                returns,
                noinline,
                builtin,
                body,
            } => Node::FunctionDef {
                name,
                params,
                returns,
                noinline,
                builtin,
                body: Self::map_vec(body, f),
            },
            Node::MacroConst { name, expr } => Node::MacroConst {
                name,
                expr: Box::new(expr.map(f)),
            },
            Node::MacroDef {
                name,
                params,
                body,
                id,
            } => Node::MacroDef {
                name,
                params,
                body: Box::new(body.map(f)),
                id,
            },
            Node::VariableDeclaration { names, value } => Node::VariableDeclaration {
                names,
                value: value.map(|v| Box::new(v.map(f))),
            },
            Node::ConstDecl { name, expr, wrap } => Node::ConstDecl {
                name,
                expr: Box::new(expr.map(f)),
                wrap,
            },
            Node::Assignment { targets, value } => Node::Assignment {
                targets,
                value: Box::new(value.map(f)),
            },
            Node::MemberAssignment {
                base,
                member,
                or_assign,
                value,
            } => Node::MemberAssignment {
                base,
                member,
                or_assign,
                value: Box::new(value.map(f)),
            },
            Node::If { cond, body } => Node::If {
                cond: Box::new(cond.map(f)),
                body: Self::map_vec(body, f),
            },
            Node::Switch {
                expr,
                cases,
                default,
            } => Node::Switch {
                expr: Box::new(expr.map(f)),
                cases: cases
                    .into_iter()
                    .map(|(v, b)| (v.map(f), Self::map_vec(b, f)))
                    .collect(),
                default: default.map(|b| Self::map_vec(b, f)),
            },
            Node::ForLoop {
                init,
                cond,
                post,
                body,
            } => Node::ForLoop {
                init: Self::map_vec(init, f),
                cond: Box::new(cond.map(f)),
                post: Self::map_vec(post, f),
                body: Self::map_vec(body, f),
            },
            Node::While { cond, body } => Node::While {
                cond: Box::new(cond.map(f)),
                body: Self::map_vec(body, f),
            },
            Node::DoWhile { cond, body } => Node::DoWhile {
                cond: Box::new(cond.map(f)),
                body: Self::map_vec(body, f),
            },
            Node::Emit { name, offset, args } => Node::Emit {
                name,
                offset: Box::new(offset.map(f)),
                args: Self::map_vec(args, f),
            },
            Node::Throw { name, args } => Node::Throw {
                name,
                args: Self::map_vec(args, f),
            },
            Node::StructInit { name, args } => Node::StructInit {
                name,
                args: Self::map_vec(args, f),
            },
            Node::InterfaceCall {
                kind,
                attempt,
                name,
                method,
                args,
            } => Node::InterfaceCall {
                kind,
                attempt,
                name,
                method,
                args: Self::map_vec(args, f),
            },
            Node::FunctionCall {
                name,
                args,
                file,
                line,
            } => Node::FunctionCall {
                name,
                args: Self::map_vec(args, f),
                file,
                line,
            },
            leaf => leaf,
        }
    }

    /// Drop parser file/line stamps so structurally identical trees compare
    /// equal regardless of where they were parsed from.
    pub fn strip_locations(self) -> Node {
        self.map(&mut |n| match n {
            Node::FunctionCall {
                name, args, ..
            } => Node::FunctionCall {
                name,
                args,
                file: String::new(),
                line: 0,
            },
            other => other,
        })
    }
}
