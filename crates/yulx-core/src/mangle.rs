//! α-renaming for library helpers imported into a scope that already binds a
//! colliding name. Yul forbids shadowing, so a conflicting local gets a `$`
//! sigil appended until it is free.

use crate::ast::{Node, TypedIdent};
use std::collections::HashMap;

fn local_names(params: &[TypedIdent], returns: &[TypedIdent], body: &[Node]) -> Vec<String> {
    let mut names: Vec<String> = params.iter().chain(returns).map(|t| t.name.clone()).collect();
    for stmt in body {
        stmt.visit(&mut |n| {
            if let Node::VariableDeclaration { names: decls, .. } = n {
                names.extend(decls.iter().map(|t| t.name.clone()));
            }
        });
    }
    names
}

/// Rename every local of a cloned function definition that collides per
/// `taken`, returning the rewritten definition.
pub fn rename_locals(def: Node, taken: &dyn Fn(&str) -> bool) -> Node {
    let (params, returns, body) = match &def {
        Node::FunctionDef {
            params,
            returns,
            body,
            ..
        } => (params.clone(), returns.clone(), body.clone()),
        _ => return def,
    };

    let mut renames: HashMap<String, String> = HashMap::new();
    for name in local_names(&params, &returns, &body) {
        if renames.contains_key(&name) || !taken(&name) {
            continue;
        }
        let mut fresh = format!("{}$", name);
        while taken(&fresh) {
            fresh.push('$');
        }
        renames.insert(name, fresh);
    }
    if renames.is_empty() {
        return def;
    }

    let subst = |name: String, renames: &HashMap<String, String>| -> String {
        renames.get(&name).cloned().unwrap_or(name)
    };

    def.map(&mut |n| match n {
        Node::Identifier { name, replaceable } => Node::Identifier {
            name: subst(name, &renames),
            replaceable,
        },
        Node::Assignment { targets, value } => Node::Assignment {
            targets: targets.into_iter().map(|t| subst(t, &renames)).collect(),
            value,
        },
        Node::VariableDeclaration { names, value } => Node::VariableDeclaration {
            names: names
                .into_iter()
                .map(|t| TypedIdent {
                    name: subst(t.name, &renames),
                    ty: t.ty,
                })
                .collect(),
            value,
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
            params: params
                .into_iter()
                .map(|t| TypedIdent {
                    name: subst(t.name, &renames),
                    ty: t.ty,
                })
                .collect(),
            returns: returns
                .into_iter()
                .map(|t| TypedIdent {
                    name: subst(t.name, &renames),
                    ty: t.ty,
                })
                .collect(),
            noinline,
            builtin,
            body,
        },
        other => other,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colliding_locals_get_the_sigil() {
        let def = Node::FunctionDef {
            name: "__helper".into(),
            params: vec![TypedIdent::plain("x")],
            returns: vec![TypedIdent::plain("r")],
            noinline: false,
            builtin: true,
            body: vec![Node::assign("r", Node::call("add", vec![Node::ident("x"), Node::num(1)]))],
        };
        let renamed = rename_locals(def, &|n| n == "x");
        match &renamed {
            Node::FunctionDef { params, body, .. } => {
                assert_eq!(params[0].name, "x$");
                match &body[0] {
                    Node::Assignment { value, .. } => match value.as_ref() {
                        Node::FunctionCall { args, .. } => match &args[0] {
                            Node::Identifier { name, .. } => assert_eq!(name, "x$"),
                            other => panic!("unexpected: {:?}", other),
                        },
                        other => panic!("unexpected: {:?}", other),
                    },
                    other => panic!("unexpected: {:?}", other),
                }
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn untouched_when_no_collision() {
        let def = Node::FunctionDef {
            name: "__helper".into(),
            params: vec![TypedIdent::plain("x")],
            returns: vec![],
            noinline: false,
            builtin: true,
            body: vec![],
        };
        let same = rename_locals(def.clone(), &|_| false);
        assert_eq!(same, def);
    }
}
