use std::collections::VecDeque;

use crate::analysis::{NodeId, ParseTree};
use crate::error::{ConversionError, Result};
use crate::schema::Constituent;

/// Deterministic rule selecting the lexical head leaf of a tree node.
pub trait HeadFinder {
    /// Returns the id of the head leaf, or `None` if the subtree is too
    /// malformed to have one.
    fn head_leaf(&self, tree: &ParseTree, node: NodeId) -> Option<NodeId>;
}

/// Flattens a constituency tree into breadth-first ordered records.
pub struct ConstituencyFlattener<'h, H: ?Sized> {
    head_finder: &'h H,
}

impl<'h, H: HeadFinder + ?Sized> ConstituencyFlattener<'h, H> {
    pub fn new(head_finder: &'h H) -> Self {
        Self { head_finder }
    }

    pub fn flatten(&self, tree: &ParseTree) -> Result<Vec<Constituent>> {
        let mut constituents: Vec<Constituent> = Vec::with_capacity(tree.len());
        let mut visited = vec![false; tree.len()];

        // Parent 0 for the root is a sentinel: the root parents to itself
        let mut queue: VecDeque<(NodeId, usize)> = VecDeque::new();
        queue.push_back((tree.root(), 0));

        while let Some((node_id, parent)) = queue.pop_front() {
            let node = tree
                .node(node_id)
                .ok_or(ConversionError::DanglingNode { node: node_id })?;
            if std::mem::replace(&mut visited[node_id], true) {
                return Err(ConversionError::NotATree { node: node_id });
            }

            let (char_start, char_end) = phrase_span(tree, node_id)?;
            let head = self
                .head_finder
                .head_leaf(tree, node_id)
                .ok_or(ConversionError::UnresolvedHead { node: node_id })?;
            let (head_char_start, head_char_end) = leaf_span(tree, head)?;

            let index = constituents.len();
            if parent < index {
                constituents[parent].children.push(index);
            }
            for &child in &node.children {
                queue.push_back((child, index));
            }

            constituents.push(Constituent {
                index,
                label: node.label.clone(),
                char_start,
                char_end,
                head_char_start,
                head_char_end,
                parent,
                children: Vec::new(),
            });
        }

        Ok(constituents)
    }
}

/// Inclusive character span of a leaf.
pub fn leaf_span(tree: &ParseTree, leaf: NodeId) -> Result<(usize, usize)> {
    let node = tree
        .node(leaf)
        .ok_or(ConversionError::DanglingNode { node: leaf })?;
    match node.span {
        Some((begin, end)) if node.is_leaf() && end > begin => Ok((begin, end - 1)),
        _ => Err(ConversionError::InvalidLeaf { node: leaf }),
    }
}

/// Inclusive character span from the first to the last leaf under `node`.
fn phrase_span(tree: &ParseTree, node: NodeId) -> Result<(usize, usize)> {
    let first = boundary_leaf(tree, node, |children| children.first())?;
    let last = boundary_leaf(tree, node, |children| children.last())?;
    let (start, _) = leaf_span(tree, first)?;
    let (_, end) = leaf_span(tree, last)?;

    if end < start {
        return Err(ConversionError::InvalidPhraseSpan { node, start, end });
    }
    Ok((start, end))
}

fn boundary_leaf(
    tree: &ParseTree,
    node: NodeId,
    pick: impl Fn(&[NodeId]) -> Option<&NodeId>,
) -> Result<NodeId> {
    let mut current = node;
    // A path longer than the arena means the tree has a cycle
    for _ in 0..=tree.len() {
        let current_node = tree
            .node(current)
            .ok_or(ConversionError::DanglingNode { node: current })?;
        match pick(&current_node.children) {
            Some(&child) => current = child,
            None => return Ok(current),
        }
    }
    Err(ConversionError::NotATree { node })
}
