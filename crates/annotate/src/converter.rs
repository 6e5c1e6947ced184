use tracing::debug;

use crate::analysis::Analysis;
use crate::constituency::{ConstituencyFlattener, HeadFinder};
use crate::dependency::DependencyRemapper;
use crate::error::{ConversionError, Result};
use crate::head_rules::HeadRules;
use crate::schema::{Document, RequestType, Sentence};
use crate::tokens::TokenEncoder;

#[derive(Debug, Clone, Default)]
pub struct ConverterOptions {
    /// Fail a document whose dependency graph leaves tokens unreachable
    pub strict_dependencies: bool,
}

/// Turns one engine analysis into an output document.
pub struct DocumentConverter<H = HeadRules> {
    head_finder: H,
    remapper: DependencyRemapper,
}

impl DocumentConverter<HeadRules> {
    pub fn new(options: ConverterOptions) -> Self {
        Self::with_head_finder(HeadRules::collins(), options)
    }
}

impl Default for DocumentConverter<HeadRules> {
    fn default() -> Self {
        Self::new(ConverterOptions::default())
    }
}

impl<H: HeadFinder> DocumentConverter<H> {
    pub fn with_head_finder(head_finder: H, options: ConverterOptions) -> Self {
        Self {
            head_finder,
            remapper: DependencyRemapper::new(options.strict_dependencies),
        }
    }

    /// Convert `analysis` of `input.text` into a populated copy of `input`.
    ///
    /// Any sentence failure fails the whole document so that token indexing
    /// is never left inconsistent across sentences.
    pub fn convert(
        &self,
        input: &Document,
        analysis: &Analysis,
        request_type: RequestType,
    ) -> Result<Document> {
        let full = request_type == RequestType::Parse;
        let mut output = input.clone().passthrough();
        let mut encoder = TokenEncoder::new(full);

        for (position, sentence) in analysis.sentences.iter().enumerate() {
            let Some(encoded) = encoder
                .encode(&sentence.tokens, &mut output.tokens)
                .map_err(|e| e.in_sentence(position))?
            else {
                debug!(doc_id = %input.doc_id, sentence = position, "Skipping sentence without tokens");
                continue;
            };

            let mut record = Sentence {
                index: output.sentences.len(),
                token_start: encoded.token_start,
                token_end: encoded.token_end,
                constituents: Vec::new(),
                dependencies: Vec::new(),
            };

            if full {
                let tree = sentence
                    .tree
                    .as_ref()
                    .ok_or(ConversionError::MissingTree)
                    .map_err(|e| e.in_sentence(position))?;
                record.constituents = ConstituencyFlattener::new(&self.head_finder)
                    .flatten(tree)
                    .map_err(|e| e.in_sentence(position))?;

                let graph = sentence
                    .graph
                    .as_ref()
                    .ok_or(ConversionError::MissingGraph)
                    .map_err(|e| e.in_sentence(position))?;
                record.dependencies = self
                    .remapper
                    .remap(graph, &encoded.mapper)
                    .map_err(|e| e.in_sentence(position))?;
            }

            output.sentences.push(record);
        }

        debug!(
            doc_id = %input.doc_id,
            tokens = encoder.emitted(),
            sentences = output.sentences.len(),
            "Document converted"
        );
        Ok(output)
    }
}
