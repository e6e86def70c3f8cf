mod error;
mod naive_bayes;
mod oversampler;
mod utils;
mod vectorizer;
pub mod builder;
#[allow(clippy::module_inception)]
mod classifier;

pub use builder::ClassifierBuilder;
pub use classifier::{Classifier, Hyperparameters};
pub use error::ClassifierError;
pub use naive_bayes::MultinomialNb;
pub use oversampler::{Oversampler, SingletonPolicy, SmoteConfig};
pub use utils::SparseVector;
pub use vectorizer::{NgramRange, TfidfVectorizer, Vocabulary};

pub(crate) use oversampler::class_counts;

/// Information about the current state and configuration of a fitted classifier
#[derive(Debug, Clone)]
pub struct ClassifierInfo {
    /// Number of classes the classifier is trained on
    pub num_classes: usize,
    /// Labels of the classes, in sorted order
    pub class_labels: Vec<String>,
    /// Number of terms in the fitted vocabulary
    pub vocabulary_size: usize,
    /// Hyperparameters the pipeline was fitted with
    pub hyperparameters: Hyperparameters,
    /// Oversampling settings used during fitting
    pub oversampling: SmoteConfig,
}
