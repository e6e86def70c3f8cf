use std::fmt;
use std::io::{self, BufRead, Write};
use std::sync::Arc;

use log::debug;

use crate::classifier::Classifier;
use crate::text::TextNormalizer;

/// Inputs that end an interactive session.
pub const EXIT_TOKENS: [&str; 3] = ["quit", "q", "exit"];

pub fn is_exit_command(line: &str) -> bool {
    EXIT_TOKENS.contains(&line.trim())
}

/// Verbal hedge for a prediction's confidence. Bands are lower-bound inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfidenceBand {
    Guess,
    Believe,
    PrettySure,
    Positive,
}

impl ConfidenceBand {
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence < 0.6 {
            ConfidenceBand::Guess
        } else if confidence < 0.75 {
            ConfidenceBand::Believe
        } else if confidence < 0.9 {
            ConfidenceBand::PrettySure
        } else {
            ConfidenceBand::Positive
        }
    }

    pub fn phrase(&self) -> &'static str {
        match self {
            ConfidenceBand::Guess => "I guess",
            ConfidenceBand::Believe => "I believe",
            ConfidenceBand::PrettySure => "I am pretty sure",
            ConfidenceBand::Positive => "I am positive",
        }
    }
}

/// The verdict for one input line.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionResult {
    /// The line as the user typed it
    pub text: String,
    pub predicted_label: String,
    /// Posterior probability of `predicted_label`, in `[0, 1]`
    pub confidence: f64,
}

impl PredictionResult {
    pub fn band(&self) -> ConfidenceBand {
        ConfidenceBand::from_confidence(self.confidence)
    }
}

impl fmt::Display for PredictionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Line: {}\n{} that line is from a {} song ({:.0}% sure)",
            self.text,
            self.band().phrase(),
            self.predicted_label,
            self.confidence * 100.0
        )
    }
}

/// Applies a fitted classifier to raw lyric lines.
#[derive(Debug, Clone)]
pub struct Predictor {
    classifier: Arc<Classifier>,
    normalizer: TextNormalizer,
}

impl Predictor {
    pub fn new(classifier: impl Into<Arc<Classifier>>) -> Self {
        Self {
            classifier: classifier.into(),
            normalizer: TextNormalizer::new(),
        }
    }

    pub fn with_normalizer(mut self, normalizer: TextNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn predict_line(&self, line: &str) -> PredictionResult {
        let normalized = self.normalizer.normalize(line);
        self.result_for(line, &normalized)
    }

    /// One result per input line, in input order.
    pub fn predict<S: AsRef<str> + Sync>(&self, lines: &[S]) -> Vec<PredictionResult> {
        let normalized = self.normalizer.normalize_all(lines);
        lines
            .iter()
            .zip(&normalized)
            .map(|(line, doc)| self.result_for(line.as_ref(), doc))
            .collect()
    }

    fn result_for(&self, line: &str, normalized: &str) -> PredictionResult {
        let (predicted_label, confidence) = self.classifier.predict_with_confidence(normalized);
        debug!("'{}' -> {} ({:.3})", normalized, predicted_label, confidence);
        PredictionResult {
            text: line.to_string(),
            predicted_label,
            confidence,
        }
    }

    /// Reads lines until an exit token or end of input, printing a verdict for each.
    ///
    /// Blank lines are skipped. Returns how many lines were predicted.
    pub fn run_interactive<R: BufRead, W: Write>(
        &self,
        reader: R,
        mut writer: W,
    ) -> io::Result<usize> {
        let mut predicted = 0;
        let mut lines = reader.lines();
        loop {
            let artists = artist_list(self.classifier.classes());
            writeln!(writer, "Enter a line from a song by {}", artists)?;
            writeln!(writer, "Write 'exit' to quit.\n")?;
            writer.flush()?;

            let line = match lines.next() {
                Some(line) => line?,
                None => break,
            };
            if is_exit_command(&line) {
                break;
            }
            if line.trim().is_empty() {
                continue;
            }

            writeln!(writer, "{}\n", self.predict_line(&line))?;
            predicted += 1;
        }
        Ok(predicted)
    }
}

fn artist_list(artists: &[String]) -> String {
    match artists {
        [] => String::new(),
        [only] => only.clone(),
        [first, second] => format!("{} or {}", first, second),
        [init @ .., last] => format!("{}, or {}", init.join(", "), last),
    }
}
