//! Collins-style head rules.
//!
//! Each phrase category has an ordered list of rules. A rule names a search
//! direction and a set of child categories; the first rule that matches a
//! child picks the head child. Descent repeats until a leaf is reached.

use std::collections::HashMap;

use crate::analysis::{NodeId, ParseTree, TreeNode};
use crate::constituency::HeadFinder;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// For each category in priority order, scan children left to right
    Left,
    /// For each category in priority order, scan children right to left
    Right,
    /// Scan children left to right, stop at the first child in the set
    LeftDis,
    /// Scan children right to left, stop at the first child in the set
    RightDis,
}

#[derive(Debug, Clone)]
pub struct HeadRule {
    pub direction: Direction,
    pub categories: &'static [&'static str],
}

const fn rule(direction: Direction, categories: &'static [&'static str]) -> HeadRule {
    HeadRule {
        direction,
        categories,
    }
}

pub struct HeadRules {
    table: HashMap<&'static str, Vec<HeadRule>>,
}

impl HeadRules {
    /// An empty table: every phrase heads to its leftmost child.
    pub fn empty() -> Self {
        Self {
            table: HashMap::new(),
        }
    }

    /// Head table from Collins (1999), Appendix A.
    pub fn collins() -> Self {
        use Direction::*;

        let mut rules = Self::empty();
        rules.add("ADJP", vec![rule(Left, &["NNS", "QP", "NN", "$", "ADVP", "JJ", "VBN", "VBG", "ADJP", "JJR", "NP", "JJS", "DT", "FW", "RBR", "RBS", "SBAR", "RB"])]);
        rules.add("ADVP", vec![rule(Right, &["RB", "RBR", "RBS", "FW", "ADVP", "TO", "CD", "JJR", "JJ", "IN", "NP", "JJS", "NN"])]);
        rules.add("CONJP", vec![rule(Right, &["CC", "RB", "IN"])]);
        rules.add("FRAG", vec![rule(Right, &[])]);
        rules.add("INTJ", vec![rule(Left, &[])]);
        rules.add("LST", vec![rule(Right, &["LS", ":"])]);
        rules.add("NAC", vec![rule(Left, &["NN", "NNS", "NNP", "NNPS", "NP", "NAC", "EX", "$", "CD", "QP", "PRP", "VBG", "JJ", "JJS", "JJR", "ADJP", "FW"])]);
        rules.add("NP", vec![
            rule(RightDis, &["NN", "NNP", "NNPS", "NNS", "NX", "POS", "JJR"]),
            rule(Left, &["NP"]),
            rule(RightDis, &["$", "ADJP", "PRN"]),
            rule(Right, &["CD"]),
            rule(RightDis, &["JJ", "JJS", "RB", "QP"]),
        ]);
        rules.add("NX", vec![rule(Left, &[])]);
        rules.add("PP", vec![rule(Right, &["IN", "TO", "VBG", "VBN", "RP", "FW"])]);
        rules.add("PRN", vec![rule(Left, &[])]);
        rules.add("PRT", vec![rule(Right, &["RP"])]);
        rules.add("QP", vec![rule(Left, &["$", "IN", "NNS", "NN", "JJ", "RB", "DT", "CD", "NCD", "QP", "JJR", "JJS"])]);
        rules.add("ROOT", vec![rule(Left, &["S", "SQ", "SINV", "SBARQ", "FRAG"])]);
        rules.add("RRC", vec![rule(Right, &["VP", "NP", "ADVP", "ADJP", "PP"])]);
        rules.add("S", vec![rule(Left, &["TO", "IN", "VP", "S", "SBAR", "ADJP", "UCP", "NP"])]);
        rules.add("SBAR", vec![rule(Left, &["WHNP", "WHPP", "WHADVP", "WHADJP", "IN", "DT", "S", "SQ", "SINV", "SBAR", "FRAG"])]);
        rules.add("SBARQ", vec![rule(Left, &["SQ", "S", "SINV", "SBARQ", "FRAG"])]);
        rules.add("SINV", vec![rule(Left, &["VBZ", "VBD", "VBP", "VB", "MD", "VP", "S", "SINV", "ADJP", "NP"])]);
        rules.add("SQ", vec![rule(Left, &["VBZ", "VBD", "VBP", "VB", "MD", "VP", "SQ"])]);
        rules.add("UCP", vec![rule(Right, &[])]);
        rules.add("VP", vec![rule(Left, &["TO", "VBD", "VBN", "MD", "VBZ", "VB", "VBG", "VBP", "VP", "ADJP", "NN", "NNS", "NP"])]);
        rules.add("WHADJP", vec![rule(Left, &["CC", "WRB", "JJ", "ADJP"])]);
        rules.add("WHADVP", vec![rule(Right, &["CC", "WRB"])]);
        rules.add("WHNP", vec![rule(Left, &["WDT", "WP", "WP$", "WHADJP", "WHPP", "WHNP"])]);
        rules.add("WHPP", vec![rule(Right, &["IN", "TO", "FW"])]);
        rules.add("X", vec![rule(Right, &[])]);
        rules
    }

    pub fn add(&mut self, category: &'static str, rules: Vec<HeadRule>) {
        self.table.insert(category, rules);
    }

    /// Pick the head child of an internal node.
    fn head_child(&self, tree: &ParseTree, node: &TreeNode) -> Option<NodeId> {
        if node.is_preterminal(tree) {
            return node.children.first().copied();
        }

        let children = node
            .children
            .iter()
            .map(|&id| tree.node(id).map(|child| (id, basic_category(&child.label))))
            .collect::<Option<Vec<_>>>()?;
        let (first, last) = (children.first()?.0, children.last()?.0);

        let Some(rules) = self.table.get(basic_category(&node.label)) else {
            return Some(first);
        };

        for head_rule in rules {
            if let Some(head) = apply(head_rule, &children) {
                return Some(head);
            }
        }

        // Nothing matched: take the end the last rule searches from
        match rules.last().map(|r| r.direction) {
            Some(Direction::Right | Direction::RightDis) => Some(last),
            _ => Some(first),
        }
    }
}

impl Default for HeadRules {
    fn default() -> Self {
        Self::collins()
    }
}

impl HeadFinder for HeadRules {
    fn head_leaf(&self, tree: &ParseTree, node: NodeId) -> Option<NodeId> {
        let mut current = node;
        // Bounded by the arena size so a cyclic tree cannot loop forever
        for _ in 0..=tree.len() {
            let current_node = tree.node(current)?;
            if current_node.is_leaf() {
                return Some(current);
            }
            current = self.head_child(tree, current_node)?;
        }
        None
    }
}

fn apply(rule: &HeadRule, children: &[(NodeId, &str)]) -> Option<NodeId> {
    let matches = |label: &str| rule.categories.contains(&label);
    match rule.direction {
        Direction::Left => rule.categories.iter().find_map(|category| {
            children
                .iter()
                .find(|(_, label)| label == category)
                .map(|(id, _)| *id)
        }),
        Direction::Right => rule.categories.iter().find_map(|category| {
            children
                .iter()
                .rev()
                .find(|(_, label)| label == category)
                .map(|(id, _)| *id)
        }),
        Direction::LeftDis => children
            .iter()
            .find(|(_, label)| matches(*label))
            .map(|(id, _)| *id),
        Direction::RightDis => children
            .iter()
            .rev()
            .find(|(_, label)| matches(*label))
            .map(|(id, _)| *id),
    }
}

/// Strip function tags and indices: `NP-SBJ-1` -> `NP`, `NP=2` -> `NP`.
/// Labels such as `-LRB-` are kept as they are.
fn basic_category(label: &str) -> &str {
    if label.starts_with('-') {
        return label;
    }
    match label.find(['-', '=']) {
        Some(cut) if cut > 0 => &label[..cut],
        _ => label,
    }
}
