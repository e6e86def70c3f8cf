use std::sync::Arc;

use rayon::prelude::*;

use super::lemmatizer::Lemmatizer;
use super::tokenizer::TreebankTokenizer;

/// Maps raw lyric lines to canonical, whitespace-joined lemma strings.
///
/// Each document is lowercased and trimmed, tokenized with Treebank rules,
/// lemmatized token by token and joined with single spaces. The normalizer
/// is stateless apart from its lemma tables, so one instance can be shared
/// across threads.
#[derive(Debug, Clone, Default)]
pub struct TextNormalizer {
    tokenizer: TreebankTokenizer,
    lemmatizer: Arc<Lemmatizer>,
}

impl TextNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_lemmatizer(lemmatizer: Lemmatizer) -> Self {
        Self {
            tokenizer: TreebankTokenizer::new(),
            lemmatizer: Arc::new(lemmatizer),
        }
    }

    pub fn normalize(&self, text: &str) -> String {
        let text = text.to_lowercase();
        self.tokenizer
            .tokenize(text.trim())
            .iter()
            .map(|token| self.lemmatizer.lemmatize(token))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Normalizes every document, preserving order and length.
    pub fn normalize_all<S: AsRef<str> + Sync>(&self, documents: &[S]) -> Vec<String> {
        documents
            .par_iter()
            .map(|doc| self.normalize(doc.as_ref()))
            .collect()
    }
}
