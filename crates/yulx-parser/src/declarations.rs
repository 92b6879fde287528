//! Declaration productions: pragmas, types, contracts, interfaces, ABI
//! items, macros, constants and Yul functions.

use crate::parser::{next_macro_id, Parser};
use yulx_core::ast::{
    EventParam, Mutability, Node, Param, PragmaKind, StructMember, TypedIdent, Visibility,
};
use yulx_core::errors::Result;
use yulx_core::hardfork;
use yulx_core::types::AbiType;

impl Parser {
    pub(super) fn parse_pragma(&mut self) -> Result<Node> {
        self.cur.try_keyword("pragma");
        let name = self
            .cur
            .ident()
            .ok_or_else(|| self.cur.err("expected pragma name"))?;
        let kind = PragmaKind::parse(&name)
            .ok_or_else(|| self.cur.err(format!("unknown pragma `{}`", name)))?;
        let value = match self.parse_expression()? {
            Node::Literal { value, .. } => value,
            _ => return Err(self.cur.err("pragma value must be a string")),
        };
        self.validate_pragma(kind, &value)?;
        Ok(Node::Pragma { kind, value })
    }

    fn validate_pragma(&mut self, kind: PragmaKind, value: &str) -> Result<()> {
        let ok = match kind {
            PragmaKind::License => {
                !value.is_empty()
                    && value
                        .chars()
                        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
            }
            PragmaKind::Evm => hardfork::ordinal(value).is_some(),
            PragmaKind::Optimize | PragmaKind::Deoptimize => {
                value.chars().all(|c| c.is_ascii_uppercase())
            }
            PragmaKind::Lock => {
                let digits = value.strip_prefix("0x").unwrap_or("");
                !digits.is_empty()
                    && digits.len() <= 64
                    && digits.chars().all(|c| c.is_ascii_hexdigit())
            }
            // Version constraints are checked against the configured
            // compiler versions by the transformer.
            PragmaKind::Solc | PragmaKind::Yulc => !value.is_empty(),
        };
        if ok {
            Ok(())
        } else {
            Err(self
                .cur
                .err(format!("invalid value for pragma {}: {:?}", kind.as_str(), value)))
        }
    }

    fn parse_abi_type(&mut self) -> Result<AbiType> {
        let name = self
            .cur
            .ident()
            .ok_or_else(|| self.cur.err("expected ABI type"))?;
        let text = if self.cur.try_tag("[]") {
            format!("{}[]", name)
        } else {
            name
        };
        AbiType::parse(&text).map_err(|e| self.cur.err(e.to_string()))
    }

    pub(super) fn parse_enum(&mut self) -> Result<Node> {
        self.cur.try_keyword("enum");
        let name = if self.cur.peek_ident_start() {
            self.cur.ident()
        } else {
            None
        };
        self.cur.expect_tag("{")?;
        let mut members = Vec::new();
        while !self.cur.try_tag("}") {
            let member = self
                .cur
                .ident()
                .ok_or_else(|| self.cur.err("expected enum member"))?;
            let value = if self.cur.try_tag(":=") {
                Some(self.parse_expression()?)
            } else {
                None
            };
            members.push((member, value));
            self.cur.try_tag(",");
        }
        if members.is_empty() {
            return Err(self.cur.err("enum needs at least one member"));
        }
        Ok(Node::EnumDef { name, members })
    }

    pub(super) fn parse_struct_def(&mut self) -> Result<Node> {
        self.cur.try_keyword("struct");
        let name = self
            .cur
            .ident()
            .ok_or_else(|| self.cur.err("expected struct name"))?;
        self.cur.expect_tag("{")?;
        let mut members = Vec::new();
        while !self.cur.try_tag("}") {
            let ty = self.parse_abi_type()?;
            let member_name = if self.cur.try_tag("+") {
                "+".to_string()
            } else {
                self.cur
                    .ident()
                    .ok_or_else(|| self.cur.err("expected member name or `+` padding"))?
            };
            let default = if self.cur.try_tag(":=") {
                Some(self.parse_expression()?)
            } else {
                None
            };
            members.push(StructMember {
                ty,
                name: member_name,
                default,
            });
            while self.cur.try_tag(",") || self.cur.try_tag(";") {}
        }
        Ok(Node::StructDef { name, members })
    }

    pub(super) fn parse_interface(&mut self) -> Result<Node> {
        self.cur.try_keyword("interface");
        let name = self
            .cur
            .ident()
            .ok_or_else(|| self.cur.err("expected interface name"))?;
        self.cur.expect_tag("{")?;
        let mut constructor = None;
        let mut methods = Vec::new();
        while !self.cur.try_tag("}") {
            if self.cur.peek_keyword("constructor") {
                let decl = self.parse_constructor(false)?;
                if constructor.is_some() {
                    return Err(self.cur.err("interface already declares a constructor"));
                }
                constructor = Some(Box::new(decl));
                continue;
            }
            if self.cur.peek_keyword("method") {
                methods.push(self.parse_method(false)?);
                continue;
            }
            return Err(self.cur.err("expected `constructor` or `method`"));
        }
        Ok(Node::InterfaceDef {
            name,
            constructor,
            methods,
        })
    }

    pub(super) fn parse_contract(&mut self) -> Result<Node> {
        self.cur.try_keyword("contract");
        let name = self
            .cur
            .ident()
            .ok_or_else(|| self.cur.err("expected contract name"))?;
        let optimize = self.cur.try_keyword("optimize");
        let statements = self.parse_block()?;
        Ok(Node::Contract {
            name,
            optimize,
            statements,
        })
    }

    pub(super) fn parse_object(&mut self) -> Result<Node> {
        self.cur.try_keyword("object");
        let name = match self.parse_expression()? {
            Node::Literal { value, .. } => value,
            _ => return Err(self.cur.err("object name must be a string")),
        };
        let statements = self.parse_block()?;
        Ok(Node::ObjectBlock { name, statements })
    }

    pub(super) fn parse_data(&mut self) -> Result<Node> {
        self.cur.try_keyword("data");
        let name = match self.parse_expression()? {
            Node::Literal { value, .. } => value,
            _ => return Err(self.cur.err("data name must be a string")),
        };
        let value = self.parse_expression()?;
        match value {
            Node::Literal { kind, value, .. } => Ok(Node::DataValue {
                name,
                hex: kind == yulx_core::ast::LiteralKind::HexLiteral,
                value,
            }),
            _ => Err(self.cur.err("data value must be a hex or string literal")),
        }
    }

    fn parse_params(&mut self) -> Result<Vec<Param>> {
        self.cur.expect_tag("(")?;
        let mut params = Vec::new();
        if self.cur.try_tag(")") {
            return Ok(params);
        }
        loop {
            let ty = self.parse_abi_type()?;
            let name = if self.cur.peek_ident_start() && !self.cur.peek_keyword("returns") {
                self.cur.ident()
            } else {
                None
            };
            params.push(Param { ty, name });
            if self.cur.try_tag(",") {
                continue;
            }
            self.cur.expect_tag(")")?;
            break;
        }
        Ok(params)
    }

    pub(super) fn parse_constructor(&mut self, allow_body: bool) -> Result<Node> {
        self.cur.try_keyword("constructor");
        let params = self.parse_params()?;
        let payable = self.cur.try_keyword("payable");
        let unchecked = self.cur.try_keyword("unchecked");
        self.cur.skip_whitespace();
        if allow_body && self.cur.peek() == Some('{') {
            let body = self.parse_block()?;
            return Ok(Node::ConstructorDef {
                params,
                payable,
                unchecked,
                body,
            });
        }
        if unchecked {
            return Err(self.cur.err("`unchecked` needs a constructor body"));
        }
        Ok(Node::ConstructorDecl { params, payable })
    }

    pub(super) fn parse_method(&mut self, allow_body: bool) -> Result<Node> {
        self.cur.try_keyword("method");
        let name = self
            .cur
            .ident()
            .ok_or_else(|| self.cur.err("expected method name"))?;
        let params = self.parse_params()?;

        let mut visibility = Visibility::External;
        let mut mutability = Mutability::NonPayable;
        let mut locked = false;
        loop {
            if self.cur.try_keyword("external") {
                visibility = Visibility::External;
            } else if self.cur.try_keyword("internal") {
                visibility = Visibility::Internal;
            } else if self.cur.try_keyword("payable") {
                mutability = Mutability::Payable;
            } else if self.cur.try_keyword("view") {
                mutability = Mutability::View;
            } else if self.cur.try_keyword("pure") {
                mutability = Mutability::Pure;
            } else if self.cur.try_keyword("locked") {
                locked = true;
            } else {
                break;
            }
        }

        let returns = if self.cur.try_keyword("returns") {
            self.parse_params()?
        } else {
            Vec::new()
        };

        self.cur.skip_whitespace();
        if allow_body && self.cur.peek() == Some('{') {
            let body = self.parse_block()?;
            return Ok(Node::MethodDef {
                name,
                params,
                visibility,
                mutability,
                locked,
                returns,
                body,
            });
        }
        if locked {
            return Err(self.cur.err("`locked` needs a method body"));
        }
        Ok(Node::MethodDecl {
            name,
            params,
            visibility,
            mutability,
            returns,
        })
    }

    pub(super) fn parse_event(&mut self) -> Result<Node> {
        self.cur.try_keyword("event");
        let name = self
            .cur
            .ident()
            .ok_or_else(|| self.cur.err("expected event name"))?;
        self.cur.expect_tag("(")?;
        let mut params = Vec::new();
        if !self.cur.try_tag(")") {
            loop {
                let ty = self.parse_abi_type()?;
                let indexed = self.cur.try_keyword("indexed");
                let pname = if self.cur.peek_ident_start() {
                    self.cur.ident()
                } else {
                    None
                };
                params.push(EventParam {
                    ty,
                    name: pname,
                    indexed,
                });
                if self.cur.try_tag(",") {
                    continue;
                }
                self.cur.expect_tag(")")?;
                break;
            }
        }
        let mut anonymous = false;
        let mut packed = false;
        let mut inline = None;
        loop {
            if self.cur.try_keyword("anonymous") {
                anonymous = true;
            } else if self.cur.try_keyword("packed") {
                packed = true;
            } else if self.cur.try_keyword("inline") {
                inline = Some(true);
            } else if self.cur.try_keyword("noinline") {
                inline = Some(false);
            } else {
                break;
            }
        }
        Ok(Node::EventDecl {
            name,
            params,
            anonymous,
            packed,
            inline,
        })
    }

    pub(super) fn parse_error_decl(&mut self) -> Result<Node> {
        self.cur.try_keyword("error");
        let name = self
            .cur
            .ident()
            .ok_or_else(|| self.cur.err("expected error name"))?;
        let params = self.parse_params()?;
        Ok(Node::ErrorDecl { name, params })
    }

    pub(super) fn parse_macro(&mut self) -> Result<Node> {
        self.cur.try_keyword("macro");
        let name = self
            .cur
            .ident()
            .ok_or_else(|| self.cur.err("expected macro name"))?;
        self.cur.skip_whitespace();
        if self.cur.peek() != Some('(') {
            // No parameter list: a macro constant.
            self.cur.expect_tag(":=")?;
            let expr = self.parse_expression()?;
            return Ok(Node::MacroConst {
                name,
                expr: Box::new(expr),
            });
        }
        self.cur.expect_tag("(")?;
        let mut params = Vec::new();
        if !self.cur.try_tag(")") {
            loop {
                let p = self
                    .cur
                    .ident()
                    .ok_or_else(|| self.cur.err("expected macro parameter"))?;
                params.push(p);
                if self.cur.try_tag(",") {
                    continue;
                }
                self.cur.expect_tag(")")?;
                break;
            }
        }
        self.cur.skip_whitespace();
        let body = if self.cur.peek() == Some('{') {
            Node::Block {
                statements: self.parse_block()?,
            }
        } else {
            self.cur.expect_tag(":=")?;
            self.parse_expression()?
        };
        Ok(Node::MacroDef {
            name,
            params,
            body: Box::new(body),
            id: next_macro_id(),
        })
    }

    pub(super) fn parse_const(&mut self) -> Result<Node> {
        self.cur.try_keyword("const");
        let name = self
            .cur
            .ident()
            .ok_or_else(|| self.cur.err("expected constant name"))?;
        let wrap = self.cur.try_tag("()");
        self.cur.expect_tag(":=")?;
        let expr = self.parse_expression()?;
        Ok(Node::ConstDecl {
            name,
            expr: Box::new(expr),
            wrap,
        })
    }

    fn parse_typed_ident(&mut self) -> Result<TypedIdent> {
        let name = self
            .cur
            .ident()
            .ok_or_else(|| self.cur.err("expected identifier"))?;
        self.cur.skip_whitespace();
        let ty = if self.cur.peek() == Some(':') && self.cur.peek_at(1) != Some('=') {
            self.cur.bump();
            Some(
                self.cur
                    .ident()
                    .ok_or_else(|| self.cur.err("expected type after `:`"))?,
            )
        } else {
            None
        };
        Ok(TypedIdent { name, ty })
    }

    pub(super) fn parse_typed_ident_list(&mut self) -> Result<Vec<TypedIdent>> {
        let mut names = vec![self.parse_typed_ident()?];
        while self.cur.try_tag(",") {
            names.push(self.parse_typed_ident()?);
        }
        Ok(names)
    }

    pub(super) fn parse_function(&mut self) -> Result<Node> {
        self.cur.try_keyword("function");
        let name = self
            .cur
            .ident()
            .ok_or_else(|| self.cur.err("expected function name"))?;
        self.cur.expect_tag("(")?;
        let mut params = Vec::new();
        if !self.cur.try_tag(")") {
            loop {
                params.push(self.parse_typed_ident()?);
                if self.cur.try_tag(",") {
                    continue;
                }
                self.cur.expect_tag(")")?;
                break;
            }
        }
        let noinline = self.cur.try_keyword("noinline");
        let returns = if self.cur.try_tag("->") {
            self.parse_typed_ident_list()?
        } else {
            Vec::new()
        };
        let body = self.parse_block()?;
        Ok(Node::FunctionDef {
            name,
            params,
            returns,
            noinline,
            builtin: false,
            body,
        })
    }
}
