//! Fixed-weight op counting used by inline-suppression padding.
//!
//! The downstream optimiser inlines small functions; helpers flagged
//! `noinline` are padded with `verbatim` CODESIZE/POP no-ops until their
//! weight clears the inliner's threshold.

use crate::ast::Node;
use std::collections::HashSet;

/// Arity-indexed inliner thresholds; the presence of a `memoryguard` in the
/// emitted object lowers them.
#[derive(Debug, Clone, Copy)]
pub struct Thresholds {
    pub zero_arg: usize,
    pub n_arg: usize,
}

pub fn thresholds(memguard: bool) -> Thresholds {
    if memguard {
        Thresholds {
            zero_arg: 6,
            n_arg: 12,
        }
    } else {
        Thresholds {
            zero_arg: 8,
            n_arg: 16,
        }
    }
}

/// Weight of a statement sequence. Distinct non-zero literals count once.
pub fn op_count(body: &[Node]) -> usize {
    let mut count = 0usize;
    let mut literals: HashSet<&str> = HashSet::new();
    for stmt in body {
        stmt.visit(&mut |n| {
            count += match n {
                Node::FunctionCall { .. } => 1,
                Node::If { .. } => 2,
                Node::Switch { cases, default, .. } => {
                    1 + 2 * cases.len() + if default.is_some() { 2 } else { 0 }
                }
                Node::ForLoop { .. } => 3,
                Node::Break | Node::Continue => 2,
                Node::Leave => 2,
                Node::Literal { value, .. } => {
                    let nonzero = value != "0" && value != "0x0" && value != "false";
                    if nonzero && literals.insert(value.as_str()) {
                        1
                    } else {
                        0
                    }
                }
                _ => 0,
            };
        });
    }
    count
}

/// Number of `verbatim` pads needed to push `body` past the threshold.
pub fn padding_needed(body: &[Node], arity: usize, memguard: bool) -> usize {
    let t = thresholds(memguard);
    let threshold = if arity == 0 { t.zero_arg } else { t.n_arg };
    let weight = op_count(body);
    threshold.saturating_sub(weight)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn call_and_literal_weights() {
        let body = vec![Node::assign(
            "x",
            Node::call("add", vec![Node::ident("y"), Node::num(7)]),
        )];
        // one call + one distinct non-zero literal
        assert_eq!(op_count(&body), 2);
    }

    #[test]
    fn repeated_literals_count_once() {
        let body = vec![
            Node::assign("x", Node::num(7)),
            Node::assign("y", Node::num(7)),
            Node::assign("z", Node::num(0)),
        ];
        assert_eq!(op_count(&body), 1);
    }

    #[test]
    fn switch_weight_counts_cases_and_default() {
        let sw = Node::Switch {
            expr: Box::new(Node::ident("x")),
            cases: vec![(Node::num(1), vec![]), (Node::num(2), vec![])],
            default: Some(vec![]),
        };
        // switch(1) + 2 cases * 2 + default 2 + two distinct literals
        assert_eq!(op_count(&[sw]), 9);
    }

    #[test]
    fn padding_tops_up_to_the_threshold() {
        let body = vec![Node::assign("x", Node::ident("y"))];
        assert_eq!(padding_needed(&body, 0, false), 8);
        assert_eq!(padding_needed(&body, 2, true), 12);
        let heavy: Vec<Node> = (0..20).map(|_| Node::call("pop", vec![Node::call("codesize", vec![])])).collect();
        assert_eq!(padding_needed(&heavy, 1, false), 0);
    }
}
