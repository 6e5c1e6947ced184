pub mod analysis;
pub mod constituency;
pub mod converter;
pub mod dependency;
pub mod error;
pub mod head_rules;
pub mod index_map;
pub mod schema;
pub mod tokens;

pub use analysis::{
    AnalysisEngine, Analysis, AnalyzedToken, DependencyGraph, GraphEdge, NodeId, ParseTree,
    SentenceAnalysis, TreeNode,
};
pub use constituency::{ConstituencyFlattener, HeadFinder};
pub use converter::{ConverterOptions, DocumentConverter};
pub use dependency::{DependencyRemapper, ROOT_RELATION};
pub use error::ConversionError;
pub use head_rules::HeadRules;
pub use index_map::IndexMapper;
pub use schema::{
    Constituent, Dependency, Document, Request, RequestType, Response, Sentence, Token,
};
pub use tokens::{EncodedSentence, TokenEncoder};
