pub mod lexicon;
pub mod syntax;

use std::time::{Duration, Instant};

use annotate::{Analysis, AnalysisEngine, AnalyzedToken, SentenceAnalysis};
use anyhow::Result;
use tracing::{debug, warn};
use unicode_segmentation::UnicodeSegmentation;

#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    /// Wall-clock budget for analysing one document; `None` is unbounded
    pub max_parse_time: Option<Duration>,
}

impl EngineConfig {
    /// `0` seconds means no deadline.
    pub fn with_max_parse_seconds(seconds: u64) -> Self {
        Self {
            max_parse_time: (seconds > 0).then(|| Duration::from_secs(seconds)),
        }
    }
}

/// Deterministic, heuristic analysis engine.
///
/// Tokens and sentences come from Unicode segmentation, tags and lemmas from
/// small word lists, trees and graphs from [`syntax`]. Sentences reached after
/// the deadline keep their tokens but get no tree or graph.
pub struct BaselineEngine {
    config: EngineConfig,
}

impl BaselineEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    fn tokenize(&self, sentence: &str, sentence_start: usize, cursor: &mut CharCursor) -> Vec<AnalyzedToken> {
        let mut tokens = Vec::new();
        for (offset, word) in sentence.split_word_bound_indices() {
            if word.chars().all(char::is_whitespace) {
                continue;
            }

            let begin = cursor.advance_to(sentence_start + offset);
            let end = begin + word.chars().count();
            let pos = lexicon::tag(word, tokens.is_empty());
            let lemma = lexicon::lemma(word, pos);
            // Engine ids are 1-based within the sentence
            let id = tokens.len() as u32 + 1;
            tokens.push(AnalyzedToken::new(id, word, begin, end).with_tags(pos, lemma));
        }
        tokens
    }
}

impl AnalysisEngine for BaselineEngine {
    fn analyze(&self, text: &str) -> Result<Analysis> {
        let started = Instant::now();
        let mut cursor = CharCursor::new(text);
        let mut analysis = Analysis::default();
        let mut truncated = 0;

        for (sentence_start, sentence) in text.split_sentence_bound_indices() {
            let tokens = self.tokenize(sentence, sentence_start, &mut cursor);
            if tokens.is_empty() {
                continue;
            }

            let expired = self
                .config
                .max_parse_time
                .is_some_and(|limit| started.elapsed() >= limit);
            if expired {
                truncated += 1;
                analysis.sentences.push(SentenceAnalysis {
                    tokens,
                    tree: None,
                    graph: None,
                });
                continue;
            }

            let tree = syntax::build_tree(&tokens);
            let graph = syntax::build_graph(&tokens);
            analysis.sentences.push(SentenceAnalysis {
                tokens,
                tree: Some(tree),
                graph: Some(graph),
            });
        }

        if truncated > 0 {
            warn!(
                sentences = truncated,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Parse deadline reached, returning partial analysis"
            );
        }
        debug!(sentences = analysis.sentences.len(), "Text analysed");
        Ok(analysis)
    }

    fn name(&self) -> &str {
        "baseline"
    }
}

/// Converts increasing byte offsets into character offsets.
struct CharCursor<'t> {
    text: &'t str,
    byte: usize,
    chars: usize,
}

impl<'t> CharCursor<'t> {
    fn new(text: &'t str) -> Self {
        Self {
            text,
            byte: 0,
            chars: 0,
        }
    }

    fn advance_to(&mut self, byte: usize) -> usize {
        self.chars += self.text[self.byte..byte].chars().count();
        self.byte = byte;
        self.chars
    }
}
