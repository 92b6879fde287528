//! Expression rewriting: literal normalisation, identifier resolution,
//! struct member access and initialisers.

use crate::context::Transformer;
use crate::fold::{literal_value, make_literal};
use num_bigint::BigUint;
use num_traits::Zero;
use yulx_core::ast::{LiteralKind, Node};
use yulx_core::errors::{Error, Result};
use yulx_core::layout::StructLayout;
use yulx_core::word;

fn unit_factor(unit: &str) -> u64 {
    match unit {
        "wei" => 1,
        "gwei" => 1_000_000_000,
        "ether" => 1_000_000_000_000_000_000,
        "seconds" => 1,
        "minutes" => 60,
        "hours" => 3_600,
        "days" => 86_400,
        "weeks" => 604_800,
        _ => 1,
    }
}

impl Transformer {
    pub(crate) fn rewrite_expr(&mut self, expr: Node) -> Result<Node> {
        match expr {
            Node::Literal { kind, value, unit } => self.rewrite_literal(kind, value, unit),
            Node::Identifier { name, replaceable } => self.rewrite_identifier(name, replaceable),
            Node::MemberIdentifier { base, cast, member } => {
                self.rewrite_member_read(base, cast, member)
            }
            Node::CallDataIdentifier { member, reference } => {
                self.rewrite_calldata(&member, reference)
            }
            Node::StructInit { name, args } => self.rewrite_struct_init(&name, args),
            Node::InterfaceCall {
                kind,
                attempt,
                name,
                method,
                args,
            } => self.rewrite_interface_call(kind, attempt, &name, method.as_deref(), args),
            Node::FunctionCall {
                name,
                args,
                file,
                line,
            } => self.rewrite_call_expr(name, args, file, line),
            Node::DefaultArg => Err(Error::Type(
                "`@` is only meaningful inside a struct initialiser".into(),
            )),
            other => Ok(other),
        }
    }

    /// Boolean context: double negation drops.
    pub(crate) fn rewrite_expr_bool(&mut self, expr: Node) -> Result<Node> {
        let mut node = self.rewrite_expr(expr)?;
        loop {
            let collapsed = match node {
                Node::FunctionCall { ref name, ref args, .. }
                    if name == "iszero" && args.len() == 1 =>
                {
                    match &args[0] {
                        Node::FunctionCall {
                            name: inner,
                            args: inner_args,
                            ..
                        } if inner == "iszero" && inner_args.len() == 1 => {
                            Some(inner_args[0].clone())
                        }
                        _ => None,
                    }
                }
                _ => None,
            };
            match collapsed {
                Some(n) => node = n,
                None => return Ok(node),
            }
        }
    }

    fn rewrite_literal(
        &mut self,
        kind: LiteralKind,
        value: String,
        unit: Option<String>,
    ) -> Result<Node> {
        match kind {
            LiteralKind::DecimalNumber | LiteralKind::HexNumber => {
                let parsed = word::parse_number(&value)?;
                if let Some(unit) = unit {
                    let scaled = word::mul(&parsed, &BigUint::from(unit_factor(&unit)));
                    return Ok(make_literal(&scaled));
                }
                if value.starts_with('-') {
                    // Negatives materialise as two's complement.
                    return Ok(make_literal(&parsed));
                }
                Ok(Node::Literal {
                    kind,
                    value,
                    unit: None,
                })
            }
            _ => Ok(Node::Literal { kind, value, unit }),
        }
    }

    fn rewrite_identifier(&mut self, name: String, replaceable: bool) -> Result<Node> {
        if self.scopes.var_exists(&name) {
            return Ok(Node::Identifier { name, replaceable });
        }
        if replaceable {
            if let Some(entry) = self.scopes.lookup_macro(&name) {
                return match entry.clone() {
                    yulx_core::scope::MacroEntry::Const(expr) => self.rewrite_expr(expr),
                    yulx_core::scope::MacroEntry::Def { .. } => Err(Error::Resolution(format!(
                        "macro {} needs an argument list",
                        name
                    ))),
                };
            }
            if let Some(expr) = self.scopes.lookup_const(&name) {
                return Ok(expr.clone());
            }
            if name == "EVM_VERSION" {
                return Ok(make_literal(&BigUint::from(self.evm_ordinal)));
            }
        }
        Ok(Node::Identifier { name, replaceable })
    }

    fn struct_of(&self, base: &str, cast: Option<&str>) -> Result<StructLayout> {
        let type_name = match cast {
            Some(c) => c.to_string(),
            None => match self.scopes.lookup_var(base) {
                Some(Some(ty)) => ty.clone(),
                Some(None) => {
                    return Err(Error::Type(format!(
                        "variable {} has no struct type; cast with `{}:<struct>`",
                        base, base
                    )))
                }
                None => {
                    return Err(Error::Resolution(format!("undefined variable {}", base)))
                }
            },
        };
        self.scopes
            .lookup_struct(&type_name)
            .cloned()
            .ok_or_else(|| Error::Resolution(format!("undefined struct {}", type_name)))
    }

    fn rewrite_member_read(
        &mut self,
        base: String,
        cast: Option<String>,
        member: String,
    ) -> Result<Node> {
        let layout = self.struct_of(&base, cast.as_deref())?;
        let m = layout
            .member(&member)
            .ok_or_else(|| {
                Error::Resolution(format!("struct {} has no member {}", layout.name, member))
            })?
            .clone();
        let base_expr = Node::Identifier {
            name: base,
            replaceable: false,
        };
        if let Some(idx) = m.byte_index() {
            return Ok(Node::call(
                "byte",
                vec![Node::num(idx as u64), base_expr],
            ));
        }
        let shifted = if m.shift() > 0 {
            Node::call("shr", vec![Node::num(m.shift() as u64), base_expr])
        } else {
            base_expr
        };
        if m.offset == 0 {
            // Topmost member: the shift already cleared the high bits.
            Ok(shifted)
        } else {
            Ok(Node::call(
                "and",
                vec![shifted, make_literal(&m.mask())],
            ))
        }
    }

    /// The right-hand side of a member write.
    pub(crate) fn member_write_expr(
        &mut self,
        base: &str,
        member: &str,
        or_assign: bool,
        value: Node,
    ) -> Result<Node> {
        let layout = self.struct_of(base, None)?;
        let m = layout
            .member(member)
            .ok_or_else(|| {
                Error::Resolution(format!("struct {} has no member {}", layout.name, member))
            })?
            .clone();
        let value = self.rewrite_expr(value)?;
        let shifted = match literal_value(&value) {
            Some(v) => make_literal(&m.place(&v)),
            None if m.shift() > 0 => Node::call("shl", vec![Node::num(m.shift() as u64), value]),
            None => value,
        };
        let base_expr = Node::Identifier {
            name: base.to_string(),
            replaceable: false,
        };
        if or_assign {
            return Ok(Node::call("or", vec![base_expr, shifted]));
        }
        let keep_mask = &*word::MAX ^ m.placed_mask();
        let cleared = Node::call("and", vec![base_expr, make_literal(&keep_mask)]);
        Ok(Node::call("or", vec![cleared, shifted]))
    }

    pub(crate) fn rewrite_struct_init(&mut self, name: &str, args: Vec<Node>) -> Result<Node> {
        let layout = self
            .scopes
            .lookup_struct(name)
            .cloned()
            .ok_or_else(|| Error::Resolution(format!("undefined struct {}", name)))?;
        let members: Vec<_> = layout.value_members().cloned().collect();
        if args.len() > members.len() {
            return Err(Error::Type(format!(
                "struct {} takes {} members, got {} arguments",
                name,
                members.len(),
                args.len()
            )));
        }
        let mut packed = BigUint::zero();
        let mut parts: Vec<Node> = Vec::new();
        for (i, m) in members.iter().enumerate() {
            let arg = args.get(i).cloned().unwrap_or(Node::DefaultArg);
            if matches!(arg, Node::DefaultArg) {
                packed |= m.place(&m.default);
                continue;
            }
            let arg = self.rewrite_expr(arg)?;
            match literal_value(&arg) {
                Some(v) => {
                    if v.bits() as u16 > m.width {
                        return Err(Error::Type(format!(
                            "struct {}: value for {} exceeds {} bits",
                            name, m.name, m.width
                        )));
                    }
                    packed |= m.place(&v);
                }
                None => {
                    let shifted = if m.shift() > 0 {
                        Node::call("shl", vec![Node::num(m.shift() as u64), arg])
                    } else {
                        arg
                    };
                    parts.push(shifted);
                }
            }
        }
        let mut expr = make_literal(&packed);
        for part in parts {
            expr = if matches!(&expr, Node::Literal { value, .. } if value == "0") {
                part
            } else {
                Node::call("or", vec![expr, part])
            };
        }
        Ok(expr)
    }
}
