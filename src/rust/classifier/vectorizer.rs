use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::error::ClassifierError;
use super::utils::{normalize_vector, SparseVector};
use crate::text::stopwords;

lazy_static! {
    static ref TOKEN_PATTERN: Regex =
        Regex::new(r"\b\w\w+\b").expect("token pattern is a valid regex");
}

/// Inclusive range of n-gram lengths extracted from each document.
///
/// Always satisfies `1 <= min_n <= max_n`; deserialization rejects anything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "NgramBounds")]
pub struct NgramRange {
    min_n: usize,
    max_n: usize,
}

#[derive(Deserialize)]
struct NgramBounds {
    min_n: usize,
    max_n: usize,
}

impl TryFrom<NgramBounds> for NgramRange {
    type Error = ClassifierError;

    fn try_from(bounds: NgramBounds) -> Result<Self, Self::Error> {
        Self::try_new(bounds.min_n, bounds.max_n)
    }
}

impl NgramRange {
    /// Builds a range, raising `min_n` to 1 and `max_n` to `min_n` when they fall short.
    pub fn new(min_n: usize, max_n: usize) -> Self {
        let min_n = min_n.max(1);
        Self {
            min_n,
            max_n: max_n.max(min_n),
        }
    }

    /// Builds a range, rejecting `min_n == 0` and `max_n < min_n`.
    pub fn try_new(min_n: usize, max_n: usize) -> Result<Self, ClassifierError> {
        if min_n == 0 || max_n < min_n {
            return Err(ClassifierError::InputContractError(format!(
                "invalid n-gram range ({}, {}); need 1 <= min_n <= max_n",
                min_n, max_n
            )));
        }
        Ok(Self { min_n, max_n })
    }

    pub fn min_n(&self) -> usize {
        self.min_n
    }

    pub fn max_n(&self) -> usize {
        self.max_n
    }

    pub(crate) fn validate(&self) -> Result<(), ClassifierError> {
        Self::try_new(self.min_n, self.max_n).map(|_| ())
    }
}

impl Default for NgramRange {
    fn default() -> Self {
        Self::new(1, 1)
    }
}

impl From<(usize, usize)> for NgramRange {
    fn from((min_n, max_n): (usize, usize)) -> Self {
        Self::new(min_n, max_n)
    }
}

impl std::fmt::Display for NgramRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.min_n, self.max_n)
    }
}

/// Term index plus smoothed inverse document frequency per term.
///
/// Indices follow lexicographic term order. Built once by
/// [`TfidfVectorizer::fit`] and read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Vocabulary {
    terms: BTreeMap<String, usize>,
    idf: Vec<f64>,
}

impl Vocabulary {
    pub fn len(&self) -> usize {
        self.idf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.idf.is_empty()
    }

    pub fn index_of(&self, term: &str) -> Option<usize> {
        self.terms.get(term).copied()
    }

    pub fn idf(&self, index: usize) -> Option<f64> {
        self.idf.get(index).copied()
    }

    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.terms.keys().map(String::as_str)
    }
}

/// TF-IDF vectorizer over word n-grams with stop-word removal.
///
/// Tokens are runs of two or more word characters. Stop words are removed
/// before n-grams are formed, and repeated phrases are never merged into
/// collocations. Rows are L2-normalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TfidfVectorizer {
    ngram_range: NgramRange,
    stop_words: BTreeSet<String>,
    vocabulary: Vocabulary,
}

impl Default for TfidfVectorizer {
    fn default() -> Self {
        Self::new(NgramRange::default())
    }
}

impl TfidfVectorizer {
    pub fn new(ngram_range: NgramRange) -> Self {
        Self {
            ngram_range,
            stop_words: stopwords::english(),
            vocabulary: Vocabulary::default(),
        }
    }

    pub fn with_stop_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stop_words = words.into_iter().map(Into::into).collect();
        self
    }

    pub fn ngram_range(&self) -> NgramRange {
        self.ngram_range
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// Splits a document into its n-gram terms, in document order.
    pub fn analyze(&self, document: &str) -> Vec<String> {
        let tokens: Vec<&str> = TOKEN_PATTERN
            .find_iter(document)
            .map(|m| m.as_str())
            .filter(|token| !self.stop_words.contains(*token))
            .collect();

        let mut terms = Vec::new();
        for n in self.ngram_range.min_n..=self.ngram_range.max_n {
            if n > tokens.len() {
                break;
            }
            terms.extend(tokens.windows(n).map(|window| window.join(" ")));
        }
        terms
    }

    /// Learns the vocabulary and document frequencies from `documents`.
    pub fn fit<S: AsRef<str>>(&mut self, documents: &[S]) -> Result<(), ClassifierError> {
        let mut doc_freq: BTreeMap<String, usize> = BTreeMap::new();
        for doc in documents {
            let unique: HashSet<String> = self.analyze(doc.as_ref()).into_iter().collect();
            for term in unique {
                *doc_freq.entry(term).or_insert(0) += 1;
            }
        }

        if doc_freq.is_empty() {
            return Err(ClassifierError::degenerate_corpus(
                "empty vocabulary; documents contain only stop words or no tokens",
            ));
        }

        let n_docs = documents.len() as f64;
        let mut terms = BTreeMap::new();
        let mut idf = Vec::with_capacity(doc_freq.len());
        for (index, (term, df)) in doc_freq.into_iter().enumerate() {
            idf.push(((1.0 + n_docs) / (1.0 + df as f64)).ln() + 1.0);
            terms.insert(term, index);
        }

        log::debug!("Fitted vocabulary with {} terms on {} documents", idf.len(), documents.len());
        self.vocabulary = Vocabulary { terms, idf };
        Ok(())
    }

    /// Converts one document to a TF-IDF row. Terms outside the vocabulary are ignored.
    pub fn transform_one(&self, document: &str) -> SparseVector {
        let mut counts: HashMap<usize, f64> = HashMap::new();
        for term in self.analyze(document) {
            if let Some(index) = self.vocabulary.index_of(&term) {
                *counts.entry(index).or_insert(0.0) += 1.0;
            }
        }

        let mut entries: Vec<(usize, f64)> = counts
            .into_iter()
            .map(|(index, count)| (index, count * self.vocabulary.idf[index]))
            .collect();
        entries.sort_unstable_by_key(|(index, _)| *index);

        normalize_vector(&SparseVector::from_sorted(entries))
    }

    pub fn transform<S: AsRef<str>>(&self, documents: &[S]) -> Vec<SparseVector> {
        documents
            .iter()
            .map(|doc| self.transform_one(doc.as_ref()))
            .collect()
    }

    pub fn fit_transform<S: AsRef<str>>(
        &mut self,
        documents: &[S],
    ) -> Result<Vec<SparseVector>, ClassifierError> {
        self.fit(documents)?;
        Ok(self.transform(documents))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analyze_drops_stop_words_before_ngrams() {
        let vectorizer = TfidfVectorizer::new(NgramRange::new(1, 2));
        assert_eq!(
            vectorizer.analyze("all i need is a mirror"),
            vec!["need", "mirror", "need mirror"]
        );
    }

    #[test]
    fn test_analyze_keeps_repeated_phrases() {
        let vectorizer =
            TfidfVectorizer::new(NgramRange::new(2, 2)).with_stop_words(Vec::<String>::new());
        assert_eq!(
            vectorizer.analyze("la la la"),
            vec!["la la", "la la"]
        );
    }

    #[test]
    fn test_fit_assigns_sorted_indices_and_idf() -> Result<(), ClassifierError> {
        let mut vectorizer = TfidfVectorizer::default();
        vectorizer.fit(&["zebra apple", "apple mango"])?;

        let vocab = vectorizer.vocabulary();
        assert_eq!(vocab.terms().collect::<Vec<_>>(), vec!["apple", "mango", "zebra"]);
        assert_eq!(vocab.index_of("apple"), Some(0));
        // apple is in both documents: ln(3/3) + 1
        assert!((vocab.idf(0).unwrap_or_default() - 1.0).abs() < 1e-12);
        // mango is in one: ln(3/2) + 1
        assert!((vocab.idf(1).unwrap_or_default() - (1.5f64.ln() + 1.0)).abs() < 1e-12);
        Ok(())
    }

    #[test]
    fn test_transform_rows_are_unit_length() -> Result<(), ClassifierError> {
        let mut vectorizer = TfidfVectorizer::default();
        let rows = vectorizer.fit_transform(&["bulls on parade", "parade parade mirror"])?;
        for row in &rows {
            assert!((row.squared_norm() - 1.0).abs() < 1e-9);
        }
        Ok(())
    }

    #[test]
    fn test_unknown_terms_yield_zero_vector() -> Result<(), ClassifierError> {
        let mut vectorizer = TfidfVectorizer::default();
        vectorizer.fit(&["bulls on parade"])?;
        let before = vectorizer.vocabulary().len();

        let row = vectorizer.transform_one("completely unseen words");
        assert!(row.is_zero());
        assert_eq!(vectorizer.vocabulary().len(), before);
        Ok(())
    }

    #[test]
    fn test_ngram_range_bounds() {
        assert_eq!(NgramRange::new(0, 0), NgramRange::new(1, 1));
        assert!(NgramRange::try_new(0, 1).is_err());
        assert!(NgramRange::try_new(3, 2).is_err());
        assert_eq!(NgramRange::try_new(1, 3).map(|r| r.max_n()).ok(), Some(3));

        let parsed: Result<NgramRange, _> = serde_json::from_str(r#"{"min_n": 0, "max_n": 1}"#);
        assert!(parsed.is_err());
        let parsed: Result<NgramRange, _> = serde_json::from_str(r#"{"min_n": 1, "max_n": 2}"#);
        assert_eq!(parsed.ok(), Some(NgramRange::new(1, 2)));
    }

    #[test]
    fn test_empty_vocabulary_is_degenerate() {
        let mut vectorizer = TfidfVectorizer::default();
        let result = vectorizer.fit(&["i am a", "is it"]);
        assert!(matches!(
            result,
            Err(ClassifierError::DegenerateTrainingError { class: None, .. })
        ));
    }
}
