//! Expression productions. Yul has no operators, so an expression is a
//! literal, an identifier form, or a call form.

use crate::cursor::is_ident_start;
use crate::parser::Parser;
use yulx_core::ast::{InterfaceCallKind, LiteralKind, Node};
use yulx_core::errors::Result;

const UNITS: &[&str] = &[
    "wei", "gwei", "ether", "seconds", "minutes", "hours", "days", "weeks",
];

/// Statement keywords never appear in expression position.
const RESERVED: &[&str] = &[
    "let", "if", "switch", "case", "default", "for", "while", "do", "break", "continue", "leave",
    "function", "contract", "interface", "enum", "macro", "const", "method", "event", "error",
    "constructor", "emit", "throw", "object", "code", "data", "pragma", "include", "elif", "else",
];

impl Parser {
    pub(super) fn parse_expression(&mut self) -> Result<Node> {
        self.cur.skip_whitespace();
        match self.cur.peek() {
            Some('-') => self.parse_number(),
            Some(c) if c.is_ascii_digit() => self.parse_number(),
            Some('"') => self.parse_string_literal(),
            Some('@') => {
                self.cur.bump();
                Ok(Node::DefaultArg)
            }
            Some('&') => {
                self.cur.bump();
                let name = self
                    .cur
                    .ident()
                    .ok_or_else(|| self.cur.err("expected calldata member after `&`"))?;
                match name.strip_prefix("calldata.") {
                    Some(member) if !member.is_empty() => Ok(Node::CallDataIdentifier {
                        member: member.to_string(),
                        reference: true,
                    }),
                    _ => Err(self.cur.err("`&` applies to calldata members only")),
                }
            }
            Some(c) if is_ident_start(c) => self.parse_ident_expression(),
            _ => Err(self.cur.err("expected expression")),
        }
    }

    fn parse_ident_expression(&mut self) -> Result<Node> {
        if self.cur.peek_keyword("true") || self.cur.peek_keyword("false") {
            let word = self.cur.ident().unwrap();
            return Ok(Node::Literal {
                kind: LiteralKind::BoolLiteral,
                value: word,
                unit: None,
            });
        }
        if self.cur.peek_keyword("struct") {
            return self.parse_struct_initializer();
        }
        if let Some(node) = self.try_parse_interface_call()? {
            return Ok(node);
        }

        let save = self.cur.save();
        let line = self.cur.line() as u32;
        let name = self
            .cur
            .ident()
            .ok_or_else(|| self.cur.err("expected identifier"))?;
        if RESERVED.contains(&name.as_str()) {
            self.cur.restore(save);
            return Err(self.cur.err(format!("unexpected keyword `{}`", name)));
        }

        // hex"..." literal: the ident machinery stops at the quote.
        if name == "hex" && self.cur.peek() == Some('"') {
            return self.parse_hex_literal();
        }

        if let Some(member) = name.strip_prefix("calldata.") {
            if !member.is_empty() {
                return Ok(Node::CallDataIdentifier {
                    member: member.to_string(),
                    reference: false,
                });
            }
        }

        // FunctionCall vs bare Identifier: backtracking point two.
        self.cur.skip_whitespace();
        if self.cur.peek() == Some('(') {
            let args = self.parse_call_args()?;
            return Ok(Node::FunctionCall {
                name,
                args,
                file: self.file(),
                line,
            });
        }

        // `base:Type->member` cast form (`:=` must not match).
        if self.cur.peek() == Some(':') && self.cur.peek_at(1) != Some('=') {
            self.cur.bump();
            let cast = self
                .cur
                .ident()
                .ok_or_else(|| self.cur.err("expected struct type after `:`"))?;
            if self.cur.try_tag("->") {
                let member = self
                    .cur
                    .ident()
                    .ok_or_else(|| self.cur.err("expected member name after `->`"))?;
                return Ok(Node::MemberIdentifier {
                    base: name,
                    cast: Some(cast),
                    member,
                });
            }
            // A lone `name:type` belongs to typed declarations; rewind and
            // let the caller have the bare identifier.
            self.cur.restore(save);
            let name = self.cur.ident().unwrap();
            return Ok(Node::Identifier {
                name,
                replaceable: true,
            });
        }

        if self.cur.try_tag("->") {
            let member = self
                .cur
                .ident()
                .ok_or_else(|| self.cur.err("expected member name after `->`"))?;
            return Ok(Node::MemberIdentifier {
                base: name,
                cast: None,
                member,
            });
        }

        Ok(Node::Identifier {
            name,
            replaceable: true,
        })
    }

    fn parse_number(&mut self) -> Result<Node> {
        self.cur.skip_whitespace();
        let mut text = String::new();
        if self.cur.peek() == Some('-') {
            self.cur.bump();
            text.push('-');
        }
        self.cur.skip_whitespace();
        let hex = self.cur.peek() == Some('0')
            && matches!(self.cur.peek_at(1), Some('x') | Some('X'));
        if hex {
            text.push(self.cur.bump().unwrap());
            text.push(self.cur.bump().unwrap());
            let mut digits = 0;
            while matches!(self.cur.peek(), Some(c) if c.is_ascii_hexdigit()) {
                text.push(self.cur.bump().unwrap());
                digits += 1;
            }
            if digits == 0 {
                return Err(self.cur.err("expected hex digits after `0x`"));
            }
        } else {
            let mut digits = 0;
            while matches!(self.cur.peek(), Some(c) if c.is_ascii_digit()) {
                text.push(self.cur.bump().unwrap());
                digits += 1;
            }
            if digits == 0 {
                return Err(self.cur.err("expected a number"));
            }
            if digits > 77 {
                return Err(self.cur.err("decimal literal longer than 77 digits"));
            }
        }
        let unit = UNITS
            .iter()
            .find(|u| self.cur.peek_keyword(u))
            .map(|u| {
                self.cur.try_keyword(u);
                u.to_string()
            });
        Ok(Node::Literal {
            kind: if hex {
                LiteralKind::HexNumber
            } else {
                LiteralKind::DecimalNumber
            },
            value: text,
            unit,
        })
    }

    fn parse_string_literal(&mut self) -> Result<Node> {
        self.cur.expect_tag("\"")?;
        let mut value = String::new();
        loop {
            match self.cur.bump() {
                Some('"') => break,
                Some('\\') => {
                    value.push('\\');
                    match self.cur.bump() {
                        Some(c) => value.push(c),
                        None => return Err(self.cur.err("unterminated string literal")),
                    }
                }
                Some('\n') | None => return Err(self.cur.err("unterminated string literal")),
                Some(c) => value.push(c),
            }
        }
        Ok(Node::Literal {
            kind: LiteralKind::StringLiteral,
            value,
            unit: None,
        })
    }

    fn parse_hex_literal(&mut self) -> Result<Node> {
        self.cur.expect_tag("\"")?;
        let mut value = String::new();
        loop {
            match self.cur.bump() {
                Some('"') => break,
                Some(c) if c.is_ascii_hexdigit() => value.push(c),
                Some(_) | None => return Err(self.cur.err("malformed hex literal")),
            }
        }
        if value.len() % 2 != 0 {
            return Err(self.cur.err("hex literal needs an even number of digits"));
        }
        Ok(Node::Literal {
            kind: LiteralKind::HexLiteral,
            value,
            unit: None,
        })
    }

    fn parse_struct_initializer(&mut self) -> Result<Node> {
        self.cur.try_keyword("struct");
        self.cur.expect_tag("(")?;
        let name = self
            .cur
            .ident()
            .ok_or_else(|| self.cur.err("expected struct name"))?;
        let mut args = Vec::new();
        while !self.cur.try_tag(")") {
            self.cur.expect_tag(",")?;
            args.push(self.parse_expression()?);
        }
        Ok(Node::StructInit { name, args })
    }

    /// `try`/`call`/`create`/`create2` interface calls. Returns None when
    /// the keyword turns out to be the EVM opcode of the same name.
    pub(super) fn try_parse_interface_call(&mut self) -> Result<Option<Node>> {
        let save = self.cur.save();
        let attempt = self.cur.try_keyword("try");
        let kind = if self.cur.try_keyword("call") {
            InterfaceCallKind::Call
        } else if self.cur.try_keyword("create2") {
            InterfaceCallKind::Create2
        } else if self.cur.try_keyword("create") {
            InterfaceCallKind::Create
        } else {
            self.cur.restore(save);
            return Ok(None);
        };

        // `call(...)` and `create(...)` are plain opcode calls.
        self.cur.skip_whitespace();
        if self.cur.peek() == Some('(') {
            if attempt {
                return Err(self.cur.err("`try` requires an interface call"));
            }
            self.cur.restore(save);
            return Ok(None);
        }
        if !self.cur.peek_ident_start() {
            self.cur.restore(save);
            return Ok(None);
        }

        let target = self
            .cur
            .ident()
            .ok_or_else(|| self.cur.err("expected interface name"))?;
        let (name, method) = match kind {
            InterfaceCallKind::Call => match target.rsplit_once('.') {
                Some((iface, method)) => (iface.to_string(), Some(method.to_string())),
                None => {
                    return Err(self
                        .cur
                        .err("interface call needs `Interface.method` form"))
                }
            },
            _ => {
                if target.contains('.') {
                    return Err(self.cur.err("constructor calls name the bare interface"));
                }
                (target, None)
            }
        };
        let args = self.parse_call_args()?;
        Ok(Some(Node::InterfaceCall {
            kind,
            attempt,
            name,
            method,
            args,
        }))
    }

    pub(super) fn parse_call_args(&mut self) -> Result<Vec<Node>> {
        self.cur.expect_tag("(")?;
        let mut args = Vec::new();
        if self.cur.try_tag(")") {
            return Ok(args);
        }
        loop {
            args.push(self.parse_expression()?);
            if self.cur.try_tag(",") {
                continue;
            }
            self.cur.expect_tag(")")?;
            break;
        }
        Ok(args)
    }
}
