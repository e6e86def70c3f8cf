//! Labeled lyric corpora and the record helpers that feed them.
//!
//! Records arrive as `(title, artist, lyrics)` rows, usually read from a CSV
//! table with [`read_records`]. [`split_into_lines`] and [`clean_records`]
//! prepare them; [`CorpusBuilder`] turns them into an index-aligned
//! [`Corpus`] of documents and labels.

use std::collections::BTreeMap;
use std::path::Path;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::classifier::ClassifierError;
use crate::text::TextNormalizer;

/// One row of the lyrics table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LyricRecord {
    #[serde(default)]
    pub title: String,
    pub artist: String,
    #[serde(default)]
    pub lyrics: String,
}

impl LyricRecord {
    pub fn new(
        title: impl Into<String>,
        artist: impl Into<String>,
        lyrics: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            artist: artist.into(),
            lyrics: lyrics.into(),
        }
    }
}

/// A single lyric line paired with its artist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledDocument {
    pub text: String,
    pub label: String,
}

/// Index-aligned documents and labels.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Corpus {
    documents: Vec<String>,
    labels: Vec<String>,
}

impl Corpus {
    pub fn new(documents: Vec<String>, labels: Vec<String>) -> Result<Self, ClassifierError> {
        if documents.len() != labels.len() {
            return Err(ClassifierError::InputContractError(format!(
                "{} documents but {} labels",
                documents.len(),
                labels.len()
            )));
        }
        Ok(Self { documents, labels })
    }

    pub fn from_documents(documents: impl IntoIterator<Item = LabeledDocument>) -> Self {
        let (documents, labels) = documents.into_iter().map(|d| (d.text, d.label)).unzip();
        Self { documents, labels }
    }

    pub fn documents(&self) -> &[String] {
        &self.documents
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.documents
            .iter()
            .map(String::as_str)
            .zip(self.labels.iter().map(String::as_str))
    }

    /// Number of documents per label, keyed in sorted label order.
    pub fn class_counts(&self) -> BTreeMap<&str, usize> {
        crate::classifier::class_counts(&self.labels)
    }

    /// The documents at `indices`, in that order.
    pub fn subset(&self, indices: &[usize]) -> Corpus {
        Corpus {
            documents: indices.iter().map(|&i| self.documents[i].clone()).collect(),
            labels: indices.iter().map(|&i| self.labels[i].clone()).collect(),
        }
    }

    /// A copy with every document passed through `normalizer`. Labels are untouched.
    pub fn normalized(&self, normalizer: &TextNormalizer) -> Corpus {
        Corpus {
            documents: normalizer.normalize_all(&self.documents),
            labels: self.labels.clone(),
        }
    }
}

/// Groups lyric records by artist into a [`Corpus`].
pub struct CorpusBuilder;

impl CorpusBuilder {
    /// Builds a corpus with all of one artist's lines contiguous, artists in order of
    /// first appearance. Records are not filtered; an empty lyric is a caller error.
    pub fn from_records(records: &[LyricRecord]) -> Result<Corpus, ClassifierError> {
        if let Some(record) = records.iter().find(|r| r.lyrics.trim().is_empty()) {
            return Err(ClassifierError::InputContractError(format!(
                "record '{}' by '{}' has no lyrics",
                record.title, record.artist
            )));
        }

        let mut artists: Vec<&str> = Vec::new();
        for record in records {
            if !artists.contains(&record.artist.as_str()) {
                artists.push(&record.artist);
            }
        }

        let documents = artists.iter().flat_map(|&artist| {
            records
                .iter()
                .filter(move |r| r.artist == artist)
                .map(|r| LabeledDocument {
                    text: r.lyrics.clone(),
                    label: r.artist.clone(),
                })
        });
        let corpus = Corpus::from_documents(documents);
        debug!("Built corpus of {} documents for {} artists", corpus.len(), artists.len());
        Ok(corpus)
    }
}

/// Reads a lyrics table with `title`, `artist` and `lyrics` columns. Other columns are ignored.
pub fn read_records<P: AsRef<Path>>(path: P) -> Result<Vec<LyricRecord>, ClassifierError> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(ClassifierError::DatasetError(format!(
            "lyrics table not found at {:?}",
            path
        )));
    }

    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let records = reader
        .deserialize()
        .collect::<Result<Vec<LyricRecord>, csv::Error>>()?;
    info!("Read {} records from {:?}", records.len(), path);
    Ok(records)
}

/// One record per non-blank lyric line.
pub fn split_into_lines(records: &[LyricRecord]) -> Vec<LyricRecord> {
    records
        .iter()
        .flat_map(|record| {
            record
                .lyrics
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(move |line| {
                    LyricRecord::new(record.title.clone(), record.artist.clone(), line)
                })
        })
        .collect()
}

/// Drops empty lyrics, unknown artists and bracketed titles such as `Song [Live]`.
///
/// Artists match case-insensitively; kept records carry the configured spelling.
pub fn clean_records<S: AsRef<str>>(
    records: Vec<LyricRecord>,
    known_artists: &[S],
) -> Vec<LyricRecord> {
    let before = records.len();
    let cleaned: Vec<LyricRecord> = records
        .into_iter()
        .filter(|r| !r.lyrics.trim().is_empty())
        .filter(|r| !r.title.ends_with(']'))
        .filter_map(|mut r| {
            let canonical = known_artists
                .iter()
                .map(|artist| AsRef::<str>::as_ref(artist))
                .find(|artist| artist.to_lowercase() == r.artist.to_lowercase())?;
            r.artist = canonical.to_string();
            Some(r)
        })
        .collect();
    info!("Kept {} of {} records after cleaning", cleaned.len(), before);
    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records() -> Vec<LyricRecord> {
        vec![
            LyricRecord::new("Mirror", "Eels", "all i need is a mirror"),
            LyricRecord::new("Bulls", "Rage Against the Machine", "bulls on parade"),
            LyricRecord::new("Novocaine", "Eels", "life is hard"),
        ]
    }

    #[test]
    fn test_builder_groups_by_first_appearance() -> Result<(), ClassifierError> {
        let corpus = CorpusBuilder::from_records(&records())?;
        assert_eq!(corpus.len(), 3);
        assert_eq!(corpus.labels(), &["Eels", "Eels", "Rage Against the Machine"]);
        assert_eq!(corpus.documents()[1], "life is hard");
        for (doc, label) in corpus.iter() {
            let source = records().into_iter().find(|r| r.lyrics == doc);
            assert_eq!(source.map(|r| r.artist), Some(label.to_string()));
        }
        Ok(())
    }

    #[test]
    fn test_builder_rejects_empty_lyrics() {
        let mut rows = records();
        rows.push(LyricRecord::new("Blank", "Eels", "   "));
        assert!(matches!(
            CorpusBuilder::from_records(&rows),
            Err(ClassifierError::InputContractError(_))
        ));
    }

    #[test]
    fn test_corpus_rejects_mismatched_lengths() {
        let result = Corpus::new(vec!["a".into()], vec![]);
        assert!(result.is_err());
    }

    #[test]
    fn test_subset_and_counts() -> Result<(), ClassifierError> {
        let corpus = CorpusBuilder::from_records(&records())?;
        let counts = corpus.class_counts();
        assert_eq!(counts.get("Eels"), Some(&2));

        let sub = corpus.subset(&[2, 0]);
        assert_eq!(sub.labels(), &["Rage Against the Machine", "Eels"]);
        Ok(())
    }

    #[test]
    fn test_split_into_lines() {
        let song = LyricRecord::new("Song", "Adele", "Hello\n\n  it's me  \nI was wondering\n");
        let lines = split_into_lines(&[song]);
        let text: Vec<&str> = lines.iter().map(|r| r.lyrics.as_str()).collect();
        assert_eq!(text, vec!["Hello", "it's me", "I was wondering"]);
        assert!(lines.iter().all(|r| r.artist == "Adele" && r.title == "Song"));
    }

    #[test]
    fn test_clean_records() {
        let rows = vec![
            LyricRecord::new("Hello", "ADELE", "hello"),
            LyricRecord::new("Hello [Live]", "Adele", "hello"),
            LyricRecord::new("Empty", "Adele", ""),
            LyricRecord::new("Other", "Someone Else", "la la"),
        ];
        let cleaned = clean_records(rows, &["Adele", "Eels"]);
        assert_eq!(cleaned, vec![LyricRecord::new("Hello", "Adele", "hello")]);
    }

    #[test]
    fn test_read_records_ignores_index_column() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("songs_by_line.csv");
        std::fs::write(
            &path,
            concat!(
                ",title,artist,lyrics\n",
                "0,Mirror,Eels,all i need is a mirror\n",
                "1,Bulls,Rage Against the Machine,\"bulls, on parade\"\n",
            ),
        )?;

        let rows = read_records(&path)?;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].lyrics, "bulls, on parade");
        assert!(read_records(dir.path().join("missing.csv")).is_err());
        Ok(())
    }
}
