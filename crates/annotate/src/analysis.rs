//! Engine-facing view of one analysed document.
//!
//! The analysis engine reports tokens with its own per-sentence numbering and
//! exclusive end offsets, a constituency tree per sentence and a dependency
//! graph per sentence. A tree or graph is `None` when the engine gave up on the
//! sentence (for example because its deadline expired).

use anyhow::Result;

/// Index of a node inside a [`ParseTree`] arena.
pub type NodeId = usize;

/// The single capability the service needs from an analysis engine.
pub trait AnalysisEngine: Send + Sync {
    /// Analyse raw text into per-sentence tokens, trees and graphs.
    fn analyze(&self, text: &str) -> Result<Analysis>;

    /// Short name used in logs and health output.
    fn name(&self) -> &str {
        "engine"
    }
}

#[derive(Debug, Clone, Default)]
pub struct Analysis {
    pub sentences: Vec<SentenceAnalysis>,
}

#[derive(Debug, Clone, Default)]
pub struct SentenceAnalysis {
    pub tokens: Vec<AnalyzedToken>,
    pub tree: Option<ParseTree>,
    pub graph: Option<DependencyGraph>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzedToken {
    /// Engine-native id; not guaranteed contiguous or unique
    pub id: u32,
    pub word: String,
    pub begin: usize,
    /// One past the last character
    pub end: usize,
    pub pos: Option<String>,
    pub lemma: Option<String>,
}

impl AnalyzedToken {
    pub fn new(id: u32, word: impl Into<String>, begin: usize, end: usize) -> Self {
        Self {
            id,
            word: word.into(),
            begin,
            end,
            pos: None,
            lemma: None,
        }
    }

    pub fn with_tags(mut self, pos: impl Into<String>, lemma: impl Into<String>) -> Self {
        self.pos = Some(pos.into());
        self.lemma = Some(lemma.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    pub label: String,
    pub children: Vec<NodeId>,
    /// Character span `(begin, end_exclusive)`, set on leaves only
    pub span: Option<(usize, usize)>,
}

impl TreeNode {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// A preterminal has exactly one child and that child is a leaf.
    pub fn is_preterminal(&self, tree: &ParseTree) -> bool {
        match self.children.as_slice() {
            [only] => tree.node(*only).is_some_and(TreeNode::is_leaf),
            _ => false,
        }
    }
}

/// Constituency tree stored as a flat arena addressed by [`NodeId`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseTree {
    nodes: Vec<TreeNode>,
    root: NodeId,
}

impl ParseTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tree from an existing arena. Nothing is validated here; the
    /// flattener rejects dangling or shared nodes.
    pub fn from_nodes(nodes: Vec<TreeNode>, root: NodeId) -> Self {
        Self { nodes, root }
    }

    pub fn add_leaf(&mut self, word: impl Into<String>, begin: usize, end: usize) -> NodeId {
        self.nodes.push(TreeNode {
            label: word.into(),
            children: Vec::new(),
            span: Some((begin, end)),
        });
        self.nodes.len() - 1
    }

    pub fn add_node(&mut self, label: impl Into<String>, children: Vec<NodeId>) -> NodeId {
        self.nodes.push(TreeNode {
            label: label.into(),
            children,
            span: None,
        });
        self.nodes.len() - 1
    }

    pub fn set_root(&mut self, root: NodeId) {
        self.root = root;
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> Option<&TreeNode> {
        self.nodes.get(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyGraph {
    /// Engine-native ids of the root tokens
    pub roots: Vec<u32>,
    pub edges: Vec<GraphEdge>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphEdge {
    pub governor: u32,
    pub dependent: u32,
    pub relation: String,
}

impl GraphEdge {
    pub fn new(governor: u32, dependent: u32, relation: impl Into<String>) -> Self {
        Self {
            governor,
            dependent,
            relation: relation.into(),
        }
    }
}
