//! Canonical printer: one shape per construct, expressions on one line,
//! block-bearing statements indented two spaces per level.

use crate::emitter::{EmitContext, EmitHelper, EmitResult, Emittable};
use std::io::Write;
use yulx_core::ast::{InterfaceCallKind, LiteralKind, Mutability, Node, Param, Visibility};

fn expr(node: &Node) -> String {
    match node {
        Node::Literal { kind, value, unit } => {
            let body = match kind {
                LiteralKind::StringLiteral => format!("\"{}\"", value),
                LiteralKind::HexLiteral => format!("hex\"{}\"", value),
                _ => value.clone(),
            };
            match unit {
                Some(u) => format!("{} {}", body, u),
                None => body,
            }
        }
        Node::Identifier { name, .. } => name.clone(),
        Node::MemberIdentifier { base, cast, member } => match cast {
            Some(c) => format!("{}:{}->{}", base, c, member),
            None => format!("{}->{}", base, member),
        },
        Node::CallDataIdentifier { member, reference } => {
            if *reference {
                format!("&calldata.{}", member)
            } else {
                format!("calldata.{}", member)
            }
        }
        Node::FunctionCall { name, args, .. } => format!("{}({})", name, exprs(args)),
        Node::StructInit { name, args } => {
            if args.is_empty() {
                format!("struct({})", name)
            } else {
                format!("struct({}, {})", name, exprs(args))
            }
        }
        Node::DefaultArg => "@".to_string(),
        Node::InterfaceCall {
            kind,
            attempt,
            name,
            method,
            args,
        } => {
            let keyword = match kind {
                InterfaceCallKind::Create => "create",
                InterfaceCallKind::Create2 => "create2",
                InterfaceCallKind::Call => "call",
            };
            let target = match method {
                Some(m) => format!("{}.{}", name, m),
                None => name.clone(),
            };
            let prefix = if *attempt { "try " } else { "" };
            format!("{}{} {}({})", prefix, keyword, target, exprs(args))
        }
        other => format!("/* unprintable expression {:?} */", other),
    }
}

fn exprs(nodes: &[Node]) -> String {
    nodes.iter().map(expr).collect::<Vec<_>>().join(", ")
}

fn typed_idents(list: &[yulx_core::ast::TypedIdent]) -> String {
    list.iter()
        .map(|t| match &t.ty {
            Some(ty) => format!("{}:{}", t.name, ty),
            None => t.name.clone(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn abi_params(params: &[Param]) -> String {
    params
        .iter()
        .map(|p| match &p.name {
            Some(n) => format!("{} {}", p.ty.canonical(), n),
            None => p.ty.canonical(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn method_modifiers(visibility: Visibility, mutability: Mutability, locked: bool) -> String {
    let mut out = String::new();
    if visibility == Visibility::Internal {
        out.push_str(" internal");
    }
    match mutability {
        Mutability::NonPayable => {}
        Mutability::Payable => out.push_str(" payable"),
        Mutability::View => out.push_str(" view"),
        Mutability::Pure => out.push_str(" pure"),
    }
    if locked {
        out.push_str(" locked");
    }
    out
}

/// Inline rendering of a statement list, for `for` headers.
fn inline_stmts(stmts: &[Node]) -> String {
    stmts
        .iter()
        .map(inline_stmt)
        .collect::<Vec<_>>()
        .join(" ")
}

fn inline_stmt(node: &Node) -> String {
    match node {
        Node::VariableDeclaration { names, value } => match value {
            Some(v) => format!("let {} := {}", typed_idents(names), expr(v)),
            None => format!("let {}", typed_idents(names)),
        },
        Node::Assignment { targets, value } => {
            format!("{} := {}", targets.join(", "), expr(value))
        }
        Node::Break => "break".into(),
        Node::Continue => "continue".into(),
        Node::Leave => "leave".into(),
        other => expr(other),
    }
}

fn emit_block<W: Write>(
    header: &str,
    statements: &[Node],
    writer: &mut W,
    context: &mut EmitContext,
) -> EmitResult {
    if statements.is_empty() {
        EmitHelper::write_line(writer, context, &format!("{} {{ }}", header))?;
        return Ok(());
    }
    EmitHelper::write_line(writer, context, &format!("{} {{", header))?;
    context.indent();
    for stmt in statements {
        stmt.emit(writer, context)?;
    }
    context.dedent();
    EmitHelper::write_line(writer, context, "}")?;
    Ok(())
}

impl Emittable for Node {
    fn emit<W: Write>(&self, writer: &mut W, context: &mut EmitContext) -> EmitResult {
        match self {
            Node::Root { statements } => {
                for stmt in statements {
                    stmt.emit(writer, context)?;
                }
                Ok(())
            }
            Node::Pragma { kind, value } => EmitHelper::write_line(
                writer,
                context,
                &format!("pragma {} \"{}\"", kind.as_str(), value),
            ),
            Node::Fold {
                cond,
                body,
                elifs,
                else_body,
            } => {
                emit_block(&format!("@if {}", expr(cond)), body, writer, context)?;
                for (c, b) in elifs {
                    emit_block(&format!("elif {}", expr(c)), b, writer, context)?;
                }
                if let Some(b) = else_body {
                    emit_block("else", b, writer, context)?;
                }
                Ok(())
            }
            Node::Include { file, .. } => {
                EmitHelper::write_line(writer, context, &format!("include(\"{}\")", file))
            }
            Node::EnumDef { name, members } => {
                let rendered: Vec<String> = members
                    .iter()
                    .map(|(m, v)| match v {
                        Some(e) => format!("{} := {}", m, expr(e)),
                        None => m.clone(),
                    })
                    .collect();
                let header = match name {
                    Some(n) => format!("enum {}", n),
                    None => "enum".to_string(),
                };
                EmitHelper::write_line(
                    writer,
                    context,
                    &format!("{} {{ {} }}", header, rendered.join(", ")),
                )
            }
            Node::StructDef { name, members } => {
                let rendered: Vec<String> = members
                    .iter()
                    .map(|m| {
                        let mut s = format!("{} {}", m.ty.canonical(), m.name);
                        if let Some(d) = &m.default {
                            s.push_str(&format!(" := {}", expr(d)));
                        }
                        s
                    })
                    .collect();
                EmitHelper::write_line(
                    writer,
                    context,
                    &format!("struct {} {{ {} }}", name, rendered.join(", ")),
                )
            }
            Node::InterfaceDef {
                name,
                constructor,
                methods,
            } => {
                EmitHelper::write_line(writer, context, &format!("interface {} {{", name))?;
                context.indent();
                if let Some(c) = constructor {
                    c.emit(writer, context)?;
                }
                for m in methods {
                    m.emit(writer, context)?;
                }
                context.dedent();
                EmitHelper::write_line(writer, context, "}")
            }
            Node::Contract {
                name,
                optimize,
                statements,
            } => {
                let header = if *optimize {
                    format!("contract {} optimize", name)
                } else {
                    format!("contract {}", name)
                };
                emit_block(&header, statements, writer, context)
            }
            Node::ObjectBlock { name, statements } => {
                emit_block(&format!("object \"{}\"", name), statements, writer, context)
            }
            Node::CodeBlock { statements } => emit_block("code", statements, writer, context),
            Node::ConstructorDecl { params, payable } => {
                let tail = if *payable { " payable" } else { "" };
                EmitHelper::write_line(
                    writer,
                    context,
                    &format!("constructor({}){}", abi_params(params), tail),
                )
            }
            Node::ConstructorDef {
                params,
                payable,
                unchecked,
                body,
            } => {
                let mut header = format!("constructor({})", abi_params(params));
                if *payable {
                    header.push_str(" payable");
                }
                if *unchecked {
                    header.push_str(" unchecked");
                }
                emit_block(&header, body, writer, context)
            }
            Node::MethodDecl {
                name,
                params,
                visibility,
                mutability,
                returns,
            } => {
                let mut line = format!("method {}({})", name, abi_params(params));
                line.push_str(&method_modifiers(*visibility, *mutability, false));
                if !returns.is_empty() {
                    line.push_str(&format!(" returns ({})", abi_params(returns)));
                }
                EmitHelper::write_line(writer, context, &line)
            }
            Node::MethodDef {
                name,
                params,
                visibility,
                mutability,
                locked,
                returns,
                body,
            } => {
                let mut header = format!("method {}({})", name, abi_params(params));
                header.push_str(&method_modifiers(*visibility, *mutability, *locked));
                if !returns.is_empty() {
                    header.push_str(&format!(" returns ({})", abi_params(returns)));
                }
                emit_block(&header, body, writer, context)
            }
            Node::EventDecl {
                name,
                params,
                anonymous,
                packed,
                inline,
            } => {
                let rendered: Vec<String> = params
                    .iter()
                    .map(|p| {
                        let mut s = p.ty.canonical();
                        if p.indexed {
                            s.push_str(" indexed");
                        }
                        if let Some(n) = &p.name {
                            s.push(' ');
                            s.push_str(n);
                        }
                        s
                    })
                    .collect();
                let mut line = format!("event {}({})", name, rendered.join(", "));
                if *anonymous {
                    line.push_str(" anonymous");
                }
                if *packed {
                    line.push_str(" packed");
                }
                match inline {
                    Some(true) => line.push_str(" inline"),
                    Some(false) => line.push_str(" noinline"),
                    None => {}
                }
                EmitHelper::write_line(writer, context, &line)
            }
            Node::ErrorDecl { name, params } => EmitHelper::write_line(
                writer,
                context,
                &format!("error {}({})", name, abi_params(params)),
            ),
            Node::DataValue { name, hex, value } => {
                let rendered = if *hex {
                    format!("hex\"{}\"", value)
                } else {
                    format!("\"{}\"", value)
                };
                EmitHelper::write_line(
                    writer,
                    context,
                    &format!("data \"{}\" {}", name, rendered),
                )
            }
            Node::Block { statements } => {
                if statements.is_empty() {
                    return EmitHelper::write_line(writer, context, "{ }");
                }
                EmitHelper::write_line(writer, context, "{")?;
                context.indent();
                for stmt in statements {
                    stmt.emit(writer, context)?;
                }
                context.dedent();
                EmitHelper::write_line(writer, context, "}")
            }
            Node::MacroConst { name, expr: e } => EmitHelper::write_line(
                writer,
                context,
                &format!("macro {} := {}", name, expr(e)),
            ),
            Node::MacroDef {
                name, params, body, ..
            } => match body.as_ref() {
                Node::Block { statements } => emit_block(
                    &format!("macro {}({})", name, params.join(", ")),
                    statements,
                    writer,
                    context,
                ),
                e => EmitHelper::write_line(
                    writer,
                    context,
                    &format!("macro {}({}) := {}", name, params.join(", "), expr(e)),
                ),
            },
            Node::FunctionDef {
                name,
                params,
                returns,
                noinline,
                body,
                ..
            } => {
                let mut header = format!("function {}({})", name, typed_idents(params));
                if *noinline {
                    header.push_str(" noinline");
                }
                if !returns.is_empty() {
                    header.push_str(&format!(" -> {}", typed_idents(returns)));
                }
                emit_block(&header, body, writer, context)
            }
            Node::VariableDeclaration { .. } | Node::Assignment { .. } => {
                EmitHelper::write_line(writer, context, &inline_stmt(self))
            }
            Node::ConstDecl { name, expr: e, wrap } => {
                let parens = if *wrap { "()" } else { "" };
                EmitHelper::write_line(
                    writer,
                    context,
                    &format!("const {}{} := {}", name, parens, expr(e)),
                )
            }
            Node::MemberAssignment {
                base,
                member,
                or_assign,
                value,
            } => {
                let op = if *or_assign { "|=" } else { ":=" };
                EmitHelper::write_line(
                    writer,
                    context,
                    &format!("{}->{} {} {}", base, member, op, expr(value)),
                )
            }
            Node::If { cond, body } => {
                emit_block(&format!("if {}", expr(cond)), body, writer, context)
            }
            Node::Switch {
                expr: scrutinee,
                cases,
                default,
            } => {
                EmitHelper::write_line(writer, context, &format!("switch {}", expr(scrutinee)))?;
                for (value, body) in cases {
                    emit_block(&format!("case {}", expr(value)), body, writer, context)?;
                }
                if let Some(body) = default {
                    emit_block("default", body, writer, context)?;
                }
                Ok(())
            }
            Node::ForLoop {
                init,
                cond,
                post,
                body,
            } => {
                let braced = |stmts: &[Node]| {
                    if stmts.is_empty() {
                        "{ }".to_string()
                    } else {
                        format!("{{ {} }}", inline_stmts(stmts))
                    }
                };
                let header = format!("for {} {} {}", braced(init), expr(cond), braced(post));
                emit_block(&header, body, writer, context)
            }
            Node::While { cond, body } => {
                emit_block(&format!("while {}", expr(cond)), body, writer, context)
            }
            Node::DoWhile { cond, body } => {
                emit_block("do", body, writer, context)?;
                EmitHelper::write_line(writer, context, &format!("while {}", expr(cond)))
            }
            Node::Break => EmitHelper::write_line(writer, context, "break"),
            Node::Continue => EmitHelper::write_line(writer, context, "continue"),
            Node::Leave => EmitHelper::write_line(writer, context, "leave"),
            Node::Emit { name, offset, args } => {
                let mut all = vec![expr(offset)];
                all.extend(args.iter().map(expr));
                EmitHelper::write_line(
                    writer,
                    context,
                    &format!("emit {}({})", name, all.join(", ")),
                )
            }
            Node::Throw { name, args } => EmitHelper::write_line(
                writer,
                context,
                &format!("throw {}({})", name, exprs(args)),
            ),
            Node::FunctionCall { .. }
            | Node::InterfaceCall { .. }
            | Node::Identifier { .. }
            | Node::Literal { .. }
            | Node::MemberIdentifier { .. }
            | Node::CallDataIdentifier { .. }
            | Node::StructInit { .. }
            | Node::DefaultArg => EmitHelper::write_line(writer, context, &expr(self)),
        }
    }
}

/// Serialize a tree to canonical text.
pub fn serialize(node: &Node) -> String {
    node.to_canonical_string()
        .unwrap_or_else(|e| format!("/* serialization failed: {} */", e))
}
