use crate::analysis::NodeId;
use thiserror::Error;

/// Reasons a document's analysis could not be turned into output records.
///
/// Every variant is recovered the same way by the dispatcher: the document is
/// returned as a passthrough with its analysis fields cleared.
#[derive(Error, Debug)]
pub enum ConversionError {
    /// The analysis engine itself failed
    #[error("analysis engine error: {0}")]
    Engine(#[from] anyhow::Error),

    #[error("sentence {sentence}: {source}")]
    InSentence {
        sentence: usize,
        #[source]
        source: Box<ConversionError>,
    },

    #[error("no parse tree available")]
    MissingTree,

    #[error("no dependency graph available")]
    MissingGraph,

    #[error("token {id} has invalid character span {begin}..{end}")]
    InvalidTokenSpan { id: u32, begin: usize, end: usize },

    #[error("token id {id} is not part of the sentence")]
    UnknownToken { id: u32 },

    #[error("tree node {node} does not exist")]
    DanglingNode { node: NodeId },

    #[error("tree node {node} is reachable more than once")]
    NotATree { node: NodeId },

    #[error("leaf {node} has no usable character span")]
    InvalidLeaf { node: NodeId },

    #[error("phrase {node} ends at {end} before it starts at {start}")]
    InvalidPhraseSpan { node: NodeId, start: usize, end: usize },

    #[error("no head leaf for tree node {node}")]
    UnresolvedHead { node: NodeId },

    #[error("token id {id} is not reachable from any root")]
    Disconnected { id: u32 },
}

impl ConversionError {
    pub fn in_sentence(self, sentence: usize) -> Self {
        ConversionError::InSentence {
            sentence,
            source: Box::new(self),
        }
    }
}

pub type Result<T> = std::result::Result<T, ConversionError>;
