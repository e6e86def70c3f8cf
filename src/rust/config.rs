use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};
use serde::{Deserialize, Serialize};

use crate::classifier::{ClassifierError, Hyperparameters, NgramRange, SingletonPolicy, SmoteConfig};
use crate::text::{Lemmatizer, TextNormalizer};

/// Which steps of the training run are enabled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageFlags {
    /// Explode full-song records into one record per lyric line
    pub split_lines: bool,
    /// Drop empty lyrics, unknown artists and bracketed titles
    pub clean_records: bool,
    /// Run the grid search and save the winning model
    pub train_model: bool,
}

impl Default for StageFlags {
    fn default() -> Self {
        Self {
            split_lines: false,
            clean_records: true,
            train_model: true,
        }
    }
}

/// Grid, cross-validation and oversampling settings for model selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub alphas: Vec<f64>,
    pub fit_priors: Vec<bool>,
    pub ngram_ranges: Vec<NgramRange>,
    /// Number of stratified folds
    pub folds: usize,
    /// Seed for the oversampler
    pub seed: u64,
    pub k_neighbors: usize,
    pub singleton_policy: SingletonPolicy,
    /// Worker threads for the fold fan-out; 0 lets rayon decide
    pub threads: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            alphas: vec![0.1, 0.5, 1.0, 2.0, 3.0],
            fit_priors: vec![true, false],
            ngram_ranges: vec![NgramRange::new(1, 1), NgramRange::new(1, 2), NgramRange::new(1, 3)],
            folds: 5,
            seed: 42,
            k_neighbors: 5,
            singleton_policy: SingletonPolicy::Replicate,
            threads: 0,
        }
    }
}

impl SearchConfig {
    /// A single-point grid over the given hyperparameters.
    pub fn single(hyperparameters: Hyperparameters) -> Self {
        Self {
            alphas: vec![hyperparameters.alpha],
            fit_priors: vec![hyperparameters.fit_prior],
            ngram_ranges: vec![hyperparameters.ngram_range],
            ..Self::default()
        }
    }

    pub fn smote(&self) -> SmoteConfig {
        SmoteConfig {
            k_neighbors: self.k_neighbors,
            seed: self.seed,
            singleton_policy: self.singleton_policy,
        }
    }
}

/// Settings for a training or prediction run, usually read from a JSON file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// CSV table of lyric records
    pub data_file: PathBuf,
    pub models_dir: PathBuf,
    pub model_file_name: String,
    /// Known artists, i.e. the closed label set
    pub artists: Vec<String>,
    pub stages: StageFlags,
    pub search: SearchConfig,
    /// WordNet `dict` directory holding `index.noun` and `noun.exc`
    pub wordnet_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        let base = default_base_dir();
        Self {
            data_file: base.join("data").join("songs_by_line.csv"),
            models_dir: base.join("models"),
            model_file_name: "trained_model.json".to_string(),
            artists: vec![
                "Eels".to_string(),
                "Rage Against the Machine".to_string(),
                "Adele".to_string(),
            ],
            stages: StageFlags::default(),
            search: SearchConfig::default(),
            wordnet_dir: None,
        }
    }
}

impl Settings {
    /// Loads settings from a JSON file. Missing keys take their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ClassifierError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|e| {
            ClassifierError::InputContractError(format!("cannot read settings {:?}: {}", path, e))
        })?;
        let settings: Settings = serde_json::from_str(&raw).map_err(|e| {
            ClassifierError::InputContractError(format!("invalid settings {:?}: {}", path, e))
        })?;
        log::info!("Loaded settings from {:?}", path);
        Ok(settings)
    }

    pub fn model_path(&self) -> PathBuf {
        self.models_dir.join(&self.model_file_name)
    }

    /// The text normalizer for this run, backed by WordNet when `wordnet_dir` is set.
    pub fn normalizer(&self) -> Result<TextNormalizer, ClassifierError> {
        let Some(dir) = &self.wordnet_dir else {
            return Ok(TextNormalizer::new());
        };
        let wordnet_error =
            |e: std::io::Error| ClassifierError::DatasetError(format!("WordNet {:?}: {}", dir, e));
        let lemmatizer = Lemmatizer::new()
            .with_noun_index(dir.join("index.noun"))
            .map_err(wordnet_error)?
            .with_exception_file(dir.join("noun.exc"))
            .map_err(wordnet_error)?;
        Ok(TextNormalizer::with_lemmatizer(lemmatizer))
    }
}

/// Returns the base directory for data and models
pub fn default_base_dir() -> PathBuf {
    if let Ok(path) = env::var("LYRICIST_HOME") {
        return PathBuf::from(path);
    }

    if let Some(data_dir) = dirs::data_dir() {
        return data_dir.join("lyricist");
    }

    if let Some(home_dir) = dirs::home_dir() {
        return home_dir.join(".local").join("share").join("lyricist");
    }

    env::temp_dir().join("lyricist")
}

/// Builds the worker pool used for cross-validation.
pub fn create_thread_pool(config: &SearchConfig) -> Result<ThreadPool, ThreadPoolBuildError> {
    let mut builder = ThreadPoolBuilder::new().thread_name(|i| format!("lyricist-cv-{}", i));
    if config.threads > 0 {
        builder = builder.num_threads(config.threads);
    }
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_grid() {
        let config = SearchConfig::default();
        assert_eq!(config.alphas.len() * config.fit_priors.len() * config.ngram_ranges.len(), 30);
        assert_eq!(config.folds, 5);
        assert_eq!(config.smote().k_neighbors, 5);
    }

    #[test]
    fn test_partial_settings_file() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("settings.json");
        fs::write(
            &path,
            r#"{
                "artists": ["Eels", "Adele"],
                "stages": {"split_lines": true},
                "search": {"alphas": [1.0], "ngram_ranges": [{"min_n": 1, "max_n": 2}], "folds": 3}
            }"#,
        )?;

        let settings = Settings::from_file(&path)?;
        assert_eq!(settings.artists, vec!["Eels", "Adele"]);
        assert!(settings.stages.split_lines);
        assert!(settings.stages.train_model);
        assert_eq!(settings.search.alphas, vec![1.0]);
        assert_eq!(settings.search.ngram_ranges, vec![NgramRange::new(1, 2)]);
        assert_eq!(settings.search.fit_priors, vec![true, false]);
        assert_eq!(settings.search.folds, 3);
        Ok(())
    }

    #[test]
    fn test_invalid_settings_file() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json")?;
        assert!(matches!(
            Settings::from_file(&path),
            Err(ClassifierError::InputContractError(_))
        ));
        Ok(())
    }

    #[test]
    fn test_wordnet_normalizer() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        fs::write(
            dir.path().join("index.noun"),
            "chaos n 1 1 @ 1 0 14500047\nmirror n 1 1 @ 1 0 03773035\n",
        )?;
        fs::write(dir.path().join("noun.exc"), "cacti cactus\n")?;

        let settings = Settings {
            wordnet_dir: Some(dir.path().to_path_buf()),
            ..Settings::default()
        };
        let normalizer = settings.normalizer()?;
        assert_eq!(
            normalizer.normalize("Mirrors of Cacti and Ethos"),
            "mirror of cactus and ethos"
        );

        let missing = Settings {
            wordnet_dir: Some(dir.path().join("absent")),
            ..Settings::default()
        };
        assert!(matches!(missing.normalizer(), Err(ClassifierError::DatasetError(_))));
        Ok(())
    }

    #[test]
    fn test_thread_pool_config() -> Result<(), ThreadPoolBuildError> {
        let config = SearchConfig {
            threads: 2,
            ..SearchConfig::default()
        };
        let pool = create_thread_pool(&config)?;
        assert_eq!(pool.current_num_threads(), 2);
        Ok(())
    }
}
