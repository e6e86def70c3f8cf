use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::ClassifierError;
use super::naive_bayes::MultinomialNb;
use super::oversampler::Oversampler;
use super::vectorizer::{NgramRange, TfidfVectorizer};

/// The tunable knobs of the pipeline explored by grid search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hyperparameters {
    /// Additive smoothing strength of the naive Bayes stage
    pub alpha: f64,
    /// Learn class priors from data, or assume them uniform
    pub fit_prior: bool,
    /// N-gram lengths extracted by the vectorizer
    pub ngram_range: NgramRange,
}

impl Default for Hyperparameters {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            fit_prior: true,
            ngram_range: NgramRange::default(),
        }
    }
}

impl fmt::Display for Hyperparameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "alpha={}, fit_prior={}, ngram_range={}",
            self.alpha, self.fit_prior, self.ngram_range
        )
    }
}

/// A fitted TF-IDF → SMOTE → multinomial naive Bayes pipeline.
///
/// Inputs are expected to be normalized already (see
/// [`TextNormalizer`](crate::TextNormalizer)). A fitted classifier is
/// immutable; refitting always produces a new value, so it can be shared
/// across threads behind an `Arc` without locking.
///
/// ```rust
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use lyricist::Classifier;
///
/// let docs = ["all i need is a mirror", "mirror mirror", "bull on parade tonight", "parade"];
/// let labels: Vec<String> = ["Eels", "Eels", "Rage", "Rage"].map(String::from).to_vec();
///
/// let classifier = Classifier::builder().with_alpha(0.5).fit(&docs, &labels)?;
/// let (label, confidence) = classifier.predict_with_confidence("mirror");
/// assert_eq!(label, "Eels");
/// assert!(confidence > 0.5);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classifier {
    pub(crate) hyperparameters: Hyperparameters,
    pub(crate) vectorizer: TfidfVectorizer,
    /// Kept for provenance; never applied at inference time.
    pub(crate) oversampler: Oversampler,
    pub(crate) model: MultinomialNb,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<Classifier>();
    }
};

impl Classifier {
    /// Creates a new ClassifierBuilder for fluent construction
    pub fn builder() -> super::builder::ClassifierBuilder {
        super::builder::ClassifierBuilder::new()
    }

    /// Returns information about the fitted pipeline
    pub fn info(&self) -> super::ClassifierInfo {
        super::ClassifierInfo {
            num_classes: self.model.classes().len(),
            class_labels: self.model.classes().to_vec(),
            vocabulary_size: self.vectorizer.vocabulary().len(),
            hyperparameters: self.hyperparameters,
            oversampling: self.oversampler.config().clone(),
        }
    }

    pub fn hyperparameters(&self) -> &Hyperparameters {
        &self.hyperparameters
    }

    /// Class labels in sorted order, matching [`predict_proba`](Self::predict_proba).
    pub fn classes(&self) -> &[String] {
        self.model.classes()
    }

    pub fn vectorizer(&self) -> &TfidfVectorizer {
        &self.vectorizer
    }

    /// Predicts the label of a normalized document.
    pub fn predict(&self, document: &str) -> &str {
        self.model.predict(&self.vectorizer.transform_one(document))
    }

    /// Posterior probability of every class, in [`classes`](Self::classes) order.
    pub fn predict_proba(&self, document: &str) -> Vec<(String, f64)> {
        let proba = self.model.predict_proba(&self.vectorizer.transform_one(document));
        self.classes().iter().cloned().zip(proba.iter().copied()).collect()
    }

    /// The predicted label together with its posterior probability.
    pub fn predict_with_confidence(&self, document: &str) -> (String, f64) {
        let row = self.vectorizer.transform_one(document);
        let best = self.model.predict_index(&row);
        let proba = self.model.predict_proba(&row);
        (self.classes()[best].clone(), proba[best])
    }

    /// Accuracy on the given documents and labels.
    pub fn score<S: AsRef<str>>(
        &self,
        documents: &[S],
        labels: &[String],
    ) -> Result<f64, ClassifierError> {
        if documents.len() != labels.len() {
            return Err(ClassifierError::InputContractError(format!(
                "{} documents but {} labels",
                documents.len(),
                labels.len()
            )));
        }
        if documents.is_empty() {
            return Err(ClassifierError::InputContractError(
                "cannot score an empty set of documents".into(),
            ));
        }

        let correct = documents
            .iter()
            .zip(labels)
            .filter(|(doc, label)| self.predict((*doc).as_ref()) == label.as_str())
            .count();
        Ok(correct as f64 / documents.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn training_set() -> (Vec<&'static str>, Vec<String>) {
        let docs = vec![
            "all i need is a mirror",
            "mirror on the wall",
            "i need a mirror tonight",
            "bull on parade",
            "rally round the family with a pocket full of shell",
        ];
        let labels = ["Eels", "Eels", "Eels", "Rage", "Rage"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        (docs, labels)
    }

    #[test]
    fn test_predict_and_info() -> Result<(), ClassifierError> {
        let (docs, labels) = training_set();
        let classifier = Classifier::builder().fit(&docs, &labels)?;

        assert_eq!(classifier.predict("a mirror"), "Eels");
        assert_eq!(classifier.predict("parade of shell"), "Rage");

        let info = classifier.info();
        assert_eq!(info.num_classes, 2);
        assert_eq!(info.class_labels, vec!["Eels".to_string(), "Rage".to_string()]);
        assert!(info.vocabulary_size > 0);
        Ok(())
    }

    #[test]
    fn test_probabilities_sum_to_one() -> Result<(), ClassifierError> {
        let (docs, labels) = training_set();
        let classifier = Classifier::builder().fit(&docs, &labels)?;

        let proba = classifier.predict_proba("the family mirror");
        let total: f64 = proba.iter().map(|(_, p)| p).sum();
        assert!((total - 1.0).abs() < 1e-9);

        let (label, confidence) = classifier.predict_with_confidence("the family mirror");
        let expected = proba.iter().find(|(l, _)| *l == label).map(|(_, p)| *p);
        assert_eq!(expected, Some(confidence));
        Ok(())
    }

    #[test]
    fn test_score_on_training_data() -> Result<(), ClassifierError> {
        let (docs, labels) = training_set();
        let classifier = Classifier::builder().fit(&docs, &labels)?;
        assert_eq!(classifier.score(&docs, &labels)?, 1.0);
        assert!(classifier.score(&docs[..1], &labels).is_err());
        Ok(())
    }

    #[test]
    fn test_hyperparameters_display() {
        let params = Hyperparameters {
            alpha: 0.5,
            fit_prior: false,
            ngram_range: NgramRange::new(1, 2),
        };
        assert_eq!(params.to_string(), "alpha=0.5, fit_prior=false, ngram_range=(1, 2)");
    }
}
