use crate::analysis::AnalyzedToken;
use crate::error::{ConversionError, Result};
use crate::index_map::IndexMapper;
use crate::schema::Token;

/// Token span of one sentence plus the id mapping built while encoding it.
#[derive(Debug)]
pub struct EncodedSentence {
    pub token_start: usize,
    pub token_end: usize,
    pub mapper: IndexMapper,
}

/// Assigns document-wide token indices sentence by sentence.
pub struct TokenEncoder {
    next_index: usize,
    include_tags: bool,
}

impl TokenEncoder {
    pub fn new(include_tags: bool) -> Self {
        Self {
            next_index: 0,
            include_tags,
        }
    }

    /// Number of tokens emitted so far in this document
    pub fn emitted(&self) -> usize {
        self.next_index
    }

    /// Encode one sentence, appending its tokens to `out`.
    ///
    /// Returns `None` for a sentence without tokens; such a sentence has no
    /// valid span and is left out of the document.
    pub fn encode(
        &mut self,
        tokens: &[AnalyzedToken],
        out: &mut Vec<Token>,
    ) -> Result<Option<EncodedSentence>> {
        if tokens.is_empty() {
            return Ok(None);
        }

        let token_start = self.next_index;
        let mut mapper = IndexMapper::new();

        for token in tokens {
            // Engine offsets are end-exclusive, output offsets are inclusive
            if token.end <= token.begin {
                return Err(ConversionError::InvalidTokenSpan {
                    id: token.id,
                    begin: token.begin,
                    end: token.end,
                });
            }

            let index = self.next_index;
            out.push(Token {
                index,
                word: token.word.clone(),
                char_start: token.begin,
                char_end: token.end - 1,
                pos: self.include_tags.then(|| token.pos.clone()).flatten(),
                lemma: self.include_tags.then(|| token.lemma.clone()).flatten(),
            });
            mapper.insert(token.id, index);
            self.next_index += 1;
        }

        Ok(Some(EncodedSentence {
            token_start,
            token_end: self.next_index - 1,
            mapper,
        }))
    }
}
