use log::{debug, info};

use super::classifier::{Classifier, Hyperparameters};
use super::error::ClassifierError;
use super::naive_bayes::MultinomialNb;
use super::oversampler::{Oversampler, SmoteConfig};
use super::vectorizer::{NgramRange, TfidfVectorizer};
use crate::corpus::Corpus;

/// A builder for fitting a [`Classifier`] with a fluent interface.
///
/// ```rust
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use lyricist::{ClassifierBuilder, NgramRange, SmoteConfig};
///
/// let docs = ["mirror mirror", "need a mirror", "bull on parade", "parade tonight"];
/// let labels: Vec<String> = ["Eels", "Eels", "Rage", "Rage"].map(String::from).to_vec();
///
/// let classifier = ClassifierBuilder::new()
///     .with_alpha(0.1)
///     .with_fit_prior(false)
///     .with_ngram_range(NgramRange::new(1, 2))
///     .with_oversampling(SmoteConfig { seed: 7, ..SmoteConfig::default() })
///     .fit(&docs, &labels)?;
/// assert_eq!(classifier.predict("parade"), "Rage");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct ClassifierBuilder {
    hyperparameters: Hyperparameters,
    oversampling: SmoteConfig,
}

impl ClassifierBuilder {
    /// Creates a builder with default hyperparameters and oversampling settings
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hyperparameters(mut self, hyperparameters: Hyperparameters) -> Self {
        self.hyperparameters = hyperparameters;
        self
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.hyperparameters.alpha = alpha;
        self
    }

    pub fn with_fit_prior(mut self, fit_prior: bool) -> Self {
        self.hyperparameters.fit_prior = fit_prior;
        self
    }

    pub fn with_ngram_range(mut self, ngram_range: NgramRange) -> Self {
        self.hyperparameters.ngram_range = ngram_range;
        self
    }

    /// Sets the synthetic oversampling configuration used during fitting
    pub fn with_oversampling(mut self, config: SmoteConfig) -> Self {
        self.oversampling = config;
        self
    }

    /// Checks the training data before any stage is fitted.
    pub fn validate<S: AsRef<str>>(
        &self,
        documents: &[S],
        labels: &[String],
    ) -> Result<(), ClassifierError> {
        if documents.len() != labels.len() {
            return Err(ClassifierError::InputContractError(format!(
                "{} documents but {} labels",
                documents.len(),
                labels.len()
            )));
        }
        if documents.is_empty() {
            return Err(ClassifierError::degenerate_corpus("no training documents"));
        }
        if let Some(i) = labels.iter().position(|label| label.trim().is_empty()) {
            return Err(ClassifierError::InputContractError(format!(
                "document {} has an empty label",
                i
            )));
        }
        let alpha = self.hyperparameters.alpha;
        if !alpha.is_finite() || alpha < 0.0 {
            return Err(ClassifierError::InputContractError(format!(
                "alpha must be finite and non-negative, got {}",
                alpha
            )));
        }
        self.hyperparameters.ngram_range.validate()?;
        Oversampler::new(self.oversampling.clone()).preflight(labels)
    }

    /// Fits vectorizer, oversampler and naive Bayes on normalized documents.
    pub fn fit<S: AsRef<str>>(
        &self,
        documents: &[S],
        labels: &[String],
    ) -> Result<Classifier, ClassifierError> {
        self.validate(documents, labels)?;

        let mut vectorizer = TfidfVectorizer::new(self.hyperparameters.ngram_range);
        let features = vectorizer.fit_transform(documents)?;

        let oversampler = Oversampler::new(self.oversampling.clone());
        let (features, labels) = oversampler.fit_resample(&features, labels)?;
        debug!(
            "Fitting naive Bayes on {} rows ({} after oversampling)",
            documents.len(),
            features.len()
        );

        let model = MultinomialNb::fit(
            &features,
            &labels,
            vectorizer.vocabulary().len(),
            self.hyperparameters.alpha,
            self.hyperparameters.fit_prior,
        )?;

        Ok(Classifier {
            hyperparameters: self.hyperparameters,
            vectorizer,
            oversampler,
            model,
        })
    }

    /// Fits on a corpus whose documents are already normalized.
    pub fn fit_corpus(&self, corpus: &Corpus) -> Result<Classifier, ClassifierError> {
        info!(
            "Fitting classifier on {} documents ({})",
            corpus.len(),
            self.hyperparameters
        );
        self.fit(corpus.documents(), corpus.labels())
    }
}
