//! Shallow phrase structure and dependencies over tagged tokens.
//!
//! The tree is `(S subject-chunks (VP verb ...) final-punct)` where chunks are
//! noun runs and `(PP IN NP)` groups. The dependency graph is a star around
//! the main verb (or the first nominal when there is no verb).

use annotate::{AnalyzedToken, DependencyGraph, GraphEdge, NodeId, ParseTree};

use crate::lexicon::{is_nominal, is_punctuation, is_verb};

fn tag_of(token: &AnalyzedToken) -> &str {
    token.pos.as_deref().unwrap_or("NN")
}

pub fn build_tree(tokens: &[AnalyzedToken]) -> ParseTree {
    let mut tree = ParseTree::new();
    let preterminals: Vec<(NodeId, &str)> = tokens
        .iter()
        .map(|token| {
            let leaf = tree.add_leaf(token.word.as_str(), token.begin, token.end);
            (tree.add_node(tag_of(token), vec![leaf]), tag_of(token))
        })
        .collect();

    let (body, final_punct) = match preterminals.split_last() {
        Some((last, rest)) if !rest.is_empty() && last.1 == "." => (rest, Some(last.0)),
        _ => (preterminals.as_slice(), None),
    };

    let mut children = Vec::new();
    match body.iter().position(|(_, tag)| is_verb(tag)) {
        Some(verb) => {
            children.extend(chunk(&mut tree, &body[..verb]));
            children.push(verb_phrase(&mut tree, &body[verb..]));
        }
        None => children.extend(chunk(&mut tree, body)),
    }
    children.extend(final_punct);

    let root = tree.add_node("S", children);
    tree.set_root(root);
    tree
}

/// `items` starts with a verb.
fn verb_phrase(tree: &mut ParseTree, items: &[(NodeId, &str)]) -> NodeId {
    let (verb, rest) = (items[0].0, &items[1..]);
    let mut children = vec![verb];
    match rest.first() {
        Some((_, tag)) if is_verb(tag) => children.push(verb_phrase(tree, rest)),
        _ => children.extend(chunk(tree, rest)),
    }
    tree.add_node("VP", children)
}

/// Group a run of non-verb preterminals into NP and PP chunks.
fn chunk(tree: &mut ParseTree, items: &[(NodeId, &str)]) -> Vec<NodeId> {
    let is_preposition = |tag: &str| tag == "IN" || tag == "TO";
    let mut out = Vec::new();
    let mut i = 0;

    while i < items.len() {
        let start = if is_preposition(items[i].1) { i + 1 } else { i };
        let mut end = start;
        while end < items.len() && !is_preposition(items[end].1) {
            end += 1;
        }

        let noun_phrase = (end > start).then(|| {
            let members = items[start..end].iter().map(|(id, _)| *id).collect();
            tree.add_node("NP", members)
        });
        if start > i {
            let mut pp = vec![items[i].0];
            pp.extend(noun_phrase);
            out.push(tree.add_node("PP", pp));
        } else {
            out.extend(noun_phrase);
        }
        i = end;
    }
    out
}

pub fn build_graph(tokens: &[AnalyzedToken]) -> DependencyGraph {
    let root = tokens
        .iter()
        .position(|t| is_verb(tag_of(t)))
        .or_else(|| tokens.iter().position(|t| is_nominal(tag_of(t))))
        .unwrap_or(0);

    let edges = tokens
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != root)
        .map(|(i, token)| {
            GraphEdge::new(tokens[root].id, token.id, relation(tag_of(token), i < root))
        })
        .collect();

    DependencyGraph {
        roots: tokens.get(root).map(|t| t.id).into_iter().collect(),
        edges,
    }
}

fn relation(tag: &str, before_root: bool) -> &'static str {
    match tag {
        _ if is_punctuation(tag) => "punct",
        "DT" => "det",
        "IN" | "TO" => "prep",
        "CC" => "cc",
        "JJ" | "JJR" | "JJS" => "amod",
        "RB" | "RBR" | "RBS" => "advmod",
        "PRP$" => "poss",
        "CD" => "num",
        _ if is_verb(tag) => "aux",
        _ if is_nominal(tag) && before_root => "nsubj",
        _ if is_nominal(tag) => "dobj",
        _ => "dep",
    }
}
