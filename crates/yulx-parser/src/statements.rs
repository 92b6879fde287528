//! Statement productions: control flow, assignments, preprocessor fold,
//! include, emit and throw.

use crate::parser::Parser;
use yulx_core::ast::Node;
use yulx_core::errors::Result;

impl Parser {
    pub(super) fn parse_statement(&mut self) -> Result<Node> {
        self.cur.skip_whitespace();
        if self.cur.peek() == Some('@') {
            return self.parse_fold();
        }
        if self.cur.peek_keyword("pragma") {
            return self.parse_pragma();
        }
        if self.cur.peek_keyword("include") {
            return self.parse_include();
        }
        if self.cur.peek_keyword("enum") {
            return self.parse_enum();
        }
        if self.cur.peek_keyword("struct") {
            return self.parse_struct_def();
        }
        if self.cur.peek_keyword("interface") {
            return self.parse_interface();
        }
        if self.cur.peek_keyword("contract") {
            return self.parse_contract();
        }
        if self.cur.peek_keyword("object") {
            return self.parse_object();
        }
        if self.cur.peek_keyword("code") {
            self.cur.try_keyword("code");
            let statements = self.parse_block()?;
            return Ok(Node::CodeBlock { statements });
        }
        if self.cur.peek_keyword("data") {
            return self.parse_data();
        }
        if self.cur.peek_keyword("constructor") {
            return self.parse_constructor(true);
        }
        if self.cur.peek_keyword("method") {
            return self.parse_method(true);
        }
        if self.cur.peek_keyword("event") {
            return self.parse_event();
        }
        if self.cur.peek_keyword("error") {
            return self.parse_error_decl();
        }
        if self.cur.peek_keyword("macro") {
            return self.parse_macro();
        }
        if self.cur.peek_keyword("const") {
            return self.parse_const();
        }
        if self.cur.peek_keyword("function") {
            return self.parse_function();
        }
        if self.cur.try_keyword("let") {
            return self.parse_let();
        }
        if self.cur.try_keyword("if") {
            let cond = self.parse_expression()?;
            let body = self.parse_block()?;
            return Ok(Node::If {
                cond: Box::new(cond),
                body,
            });
        }
        if self.cur.try_keyword("switch") {
            return self.parse_switch();
        }
        if self.cur.try_keyword("for") {
            return self.parse_for();
        }
        if self.cur.try_keyword("while") {
            let cond = self.parse_expression()?;
            let body = self.parse_block()?;
            return Ok(Node::While {
                cond: Box::new(cond),
                body,
            });
        }
        if self.cur.try_keyword("do") {
            let body = self.parse_block()?;
            if !self.cur.try_keyword("while") {
                return Err(self.cur.err("expected `while` after `do` block"));
            }
            let cond = self.parse_expression()?;
            return Ok(Node::DoWhile {
                cond: Box::new(cond),
                body,
            });
        }
        if self.cur.try_keyword("break") {
            return Ok(Node::Break);
        }
        if self.cur.try_keyword("continue") {
            return Ok(Node::Continue);
        }
        if self.cur.try_keyword("leave") {
            return Ok(Node::Leave);
        }
        if self.cur.try_keyword("emit") {
            return self.parse_emit();
        }
        if self.cur.try_keyword("throw") {
            return self.parse_throw();
        }
        if self.cur.peek() == Some('{') {
            let statements = self.parse_block()?;
            return Ok(Node::Block { statements });
        }

        self.parse_assignment_or_call()
    }

    pub(super) fn parse_block(&mut self) -> Result<Vec<Node>> {
        self.cur.expect_tag("{")?;
        let mut statements = Vec::new();
        while !self.cur.try_tag("}") {
            if self.cur.at_end() {
                return Err(self.cur.err("unterminated block, expected `}`"));
            }
            statements.push(self.parse_statement()?);
        }
        Ok(statements)
    }

    fn parse_fold(&mut self) -> Result<Node> {
        self.cur.expect_tag("@")?;
        if !self.cur.try_keyword("if") {
            return Err(self.cur.err("expected `if` after `@`"));
        }
        let cond = self.parse_expression()?;
        let body = self.parse_block()?;
        let mut elifs = Vec::new();
        let mut else_body = None;
        loop {
            if self.cur.try_keyword("elif") {
                let c = self.parse_expression()?;
                let b = self.parse_block()?;
                elifs.push((c, b));
                continue;
            }
            if self.cur.try_keyword("else") {
                else_body = Some(self.parse_block()?);
            }
            break;
        }
        Ok(Node::Fold {
            cond: Box::new(cond),
            body,
            elifs,
            else_body,
        })
    }

    fn parse_include(&mut self) -> Result<Node> {
        self.cur.try_keyword("include");
        self.cur.expect_tag("(")?;
        let file = match self.parse_expression()? {
            Node::Literal { value, .. } => value,
            _ => return Err(self.cur.err("include expects a string path")),
        };
        self.cur.expect_tag(")")?;
        Ok(Node::Include {
            base: self.base.clone(),
            file,
        })
    }

    fn parse_switch(&mut self) -> Result<Node> {
        let expr = self.parse_expression()?;
        let mut cases = Vec::new();
        let mut default = None;
        loop {
            if self.cur.try_keyword("case") {
                let value = self.parse_expression()?;
                let body = self.parse_block()?;
                cases.push((value, body));
                continue;
            }
            if self.cur.try_keyword("default") {
                default = Some(self.parse_block()?);
            }
            break;
        }
        if cases.is_empty() && default.is_none() {
            return Err(self.cur.err("switch needs at least one case or default"));
        }
        Ok(Node::Switch {
            expr: Box::new(expr),
            cases,
            default,
        })
    }

    fn parse_for(&mut self) -> Result<Node> {
        let init = self.parse_block()?;
        let cond = self.parse_expression()?;
        let post = self.parse_block()?;
        let body = self.parse_block()?;
        Ok(Node::ForLoop {
            init,
            cond: Box::new(cond),
            post,
            body,
        })
    }

    fn parse_let(&mut self) -> Result<Node> {
        let names = self.parse_typed_ident_list()?;
        let value = if self.cur.try_tag(":=") {
            Some(Box::new(self.parse_expression()?))
        } else {
            None
        };
        Ok(Node::VariableDeclaration { names, value })
    }

    fn parse_emit(&mut self) -> Result<Node> {
        let name = self
            .cur
            .ident()
            .ok_or_else(|| self.cur.err("expected event name after `emit`"))?;
        let mut args = self.parse_call_args()?;
        let offset = if args.is_empty() {
            Node::num(0)
        } else {
            args.remove(0)
        };
        Ok(Node::Emit {
            name,
            offset: Box::new(offset),
            args,
        })
    }

    fn parse_throw(&mut self) -> Result<Node> {
        let name = self
            .cur
            .ident()
            .ok_or_else(|| self.cur.err("expected error name after `throw`"))?;
        let args = self.parse_call_args()?;
        Ok(Node::Throw { name, args })
    }

    /// Identifier-led statements: member assignment, multi-target
    /// assignment, or a call used as a statement. The member-assignment
    /// probe is backtracking point one.
    fn parse_assignment_or_call(&mut self) -> Result<Node> {
        let save = self.cur.save();
        if let Some(base) = self.cur.ident() {
            if self.cur.try_tag("->") {
                let member = self
                    .cur
                    .ident()
                    .ok_or_else(|| self.cur.err("expected member name after `->`"))?;
                if self.cur.try_tag(":=") {
                    let value = self.parse_expression()?;
                    return Ok(Node::MemberAssignment {
                        base,
                        member,
                        or_assign: false,
                        value: Box::new(value),
                    });
                }
                if self.cur.try_tag("|=") {
                    let value = self.parse_expression()?;
                    return Ok(Node::MemberAssignment {
                        base,
                        member,
                        or_assign: true,
                        value: Box::new(value),
                    });
                }
                return Err(self.cur.err("expected `:=` or `|=` after member"));
            }

            if self.cur.try_tag(":=") {
                let value = self.parse_expression()?;
                return Ok(Node::Assignment {
                    targets: vec![base],
                    value: Box::new(value),
                });
            }
            if self.cur.try_tag(",") {
                let mut targets = vec![base];
                loop {
                    let next = self
                        .cur
                        .ident()
                        .ok_or_else(|| self.cur.err("expected assignment target"))?;
                    targets.push(next);
                    if self.cur.try_tag(",") {
                        continue;
                    }
                    break;
                }
                self.cur.expect_tag(":=")?;
                let value = self.parse_expression()?;
                return Ok(Node::Assignment {
                    targets,
                    value: Box::new(value),
                });
            }
        }
        self.cur.restore(save);

        let expr = self.parse_expression()?;
        match &expr {
            Node::FunctionCall { .. } | Node::InterfaceCall { .. } => Ok(expr),
            _ => Err(self.cur.err("expected a statement")),
        }
    }
}
