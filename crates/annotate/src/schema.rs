use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestType {
    Split, // Tokens and sentence boundaries only
    Parse, // Adds tags, lemmas, constituents and dependencies
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    pub request_type: RequestType,
    #[serde(default)]
    pub documents: Vec<Document>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub success: bool,
    pub documents: Vec<Document>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub doc_id: String,
    pub text: String,
    #[serde(default)]
    pub tokens: Vec<Token>,
    #[serde(default)]
    pub sentences: Vec<Sentence>,
}

impl Document {
    pub fn new(doc_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            doc_id: doc_id.into(),
            text: text.into(),
            tokens: Vec::new(),
            sentences: Vec::new(),
        }
    }

    /// The input document with every analysis field cleared.
    pub fn passthrough(mut self) -> Self {
        self.tokens.clear();
        self.sentences.clear();
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Token {
    pub index: usize,
    pub word: String,
    pub char_start: usize,
    pub char_end: usize, // inclusive
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pos: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lemma: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sentence {
    pub index: usize,
    pub token_start: usize,
    pub token_end: usize, // inclusive
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub constituents: Vec<Constituent>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<Dependency>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Constituent {
    pub index: usize,
    pub label: String,
    pub char_start: usize,
    pub char_end: usize,
    pub head_char_start: usize,
    pub head_char_end: usize,
    /// Index of the parent; the root points at itself
    pub parent: usize,
    pub children: Vec<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Dependency {
    pub gov_index: usize,
    pub dep_index: usize,
    pub relation: String,
}
