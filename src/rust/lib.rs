//! Guess which artist wrote a line of song lyrics.
//!
//! Lyric lines are normalized (lowercased, Treebank-tokenized, lemmatized),
//! vectorized with TF-IDF, balanced with synthetic minority oversampling and
//! classified with multinomial naive Bayes. Hyperparameters are chosen by
//! grid search with stratified k-fold cross-validation.
//!
//! # Basic Usage
//!
//! ```rust
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use lyricist::{CorpusBuilder, GridSearch, LyricRecord, Predictor, SearchConfig, TextNormalizer};
//!
//! let records = vec![
//!     LyricRecord::new("Mirror", "Eels", "All I need is a mirror"),
//!     LyricRecord::new("Mirror", "Eels", "Mirror on the wall"),
//!     LyricRecord::new("Bulls", "Rage Against the Machine", "Bulls on parade"),
//!     LyricRecord::new("Bulls", "Rage Against the Machine", "Rally round the family"),
//! ];
//! let corpus = CorpusBuilder::from_records(&records)?.normalized(&TextNormalizer::new());
//!
//! let config = SearchConfig { alphas: vec![1.0], folds: 2, ..SearchConfig::default() };
//! let outcome = GridSearch::new(config).fit(&corpus)?;
//! println!("Best parameters: {}", outcome.best_hyperparameters);
//!
//! let predictor = Predictor::new(outcome.classifier);
//! for result in predictor.predict(&["I need a mirror"]) {
//!     println!("{}", result);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Thread Safety
//!
//! A fitted [`Classifier`] is immutable and can be shared across threads using `Arc`:
//!
//! ```rust
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use lyricist::Classifier;
//! use std::sync::Arc;
//! use std::thread;
//!
//! let labels: Vec<String> = vec!["Eels".into(), "Adele".into()];
//! let classifier = Arc::new(Classifier::builder().fit(&["mirror", "hello"], &labels)?);
//!
//! let mut handles = vec![];
//! for _ in 0..3 {
//!     let classifier = Arc::clone(&classifier);
//!     handles.push(thread::spawn(move || classifier.predict("mirror").to_string()));
//! }
//!
//! for handle in handles {
//!     assert_eq!(handle.join().unwrap(), "Eels");
//! }
//! # Ok(())
//! # }
//! ```

pub mod classifier;
pub mod config;
pub mod corpus;
pub mod model_store;
pub mod predictor;
pub mod selection;
pub mod text;

pub use classifier::{
    Classifier, ClassifierBuilder, ClassifierError, ClassifierInfo, Hyperparameters, MultinomialNb,
    NgramRange, Oversampler, SingletonPolicy, SmoteConfig, SparseVector, TfidfVectorizer,
    Vocabulary,
};
pub use config::{create_thread_pool, default_base_dir, SearchConfig, Settings, StageFlags};
pub use corpus::{
    clean_records, read_records, split_into_lines, Corpus, CorpusBuilder, LabeledDocument,
    LyricRecord,
};
pub use model_store::{load_model, save_model, ModelStore, StorageError};
pub use predictor::{is_exit_command, ConfidenceBand, PredictionResult, Predictor, EXIT_TOKENS};
pub use selection::{
    CandidateScore, Fold, GridSearch, ParameterGrid, SearchOutcome, StratifiedKFold,
};
pub use text::{Lemmatizer, TextNormalizer, TreebankTokenizer};

pub fn init_logger() {
    env_logger::init();
}
