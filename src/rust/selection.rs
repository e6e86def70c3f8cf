//! Hyperparameter selection by exhaustive grid search with stratified k-fold
//! cross-validation.
//!
//! Every (grid point, fold) pair is an independent task: the pipeline is
//! fitted on the fold's training partition only, oversampling included, and
//! scored on the held-out partition. Tasks fan out over a rayon pool and are
//! merged in grid order, so results do not depend on scheduling.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use rayon::prelude::*;

use crate::classifier::{
    Classifier, ClassifierBuilder, ClassifierError, Hyperparameters, NgramRange, Oversampler,
    SingletonPolicy,
};
use crate::config::{create_thread_pool, SearchConfig};
use crate::corpus::Corpus;

/// One cross-validation split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fold {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Stratified k-fold splitting without shuffling.
///
/// Classes are ranked by first appearance and every fold receives an almost
/// equal share of each class, taken in index order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StratifiedKFold {
    n_splits: usize,
}

impl StratifiedKFold {
    pub fn new(n_splits: usize) -> Result<Self, ClassifierError> {
        if n_splits < 2 {
            return Err(ClassifierError::InputContractError(format!(
                "cross-validation needs at least 2 folds, got {}",
                n_splits
            )));
        }
        Ok(Self { n_splits })
    }

    pub fn n_splits(&self) -> usize {
        self.n_splits
    }

    /// The held-out fold of every sample.
    pub fn test_folds<S: AsRef<str>>(&self, labels: &[S]) -> Result<Vec<usize>, ClassifierError> {
        let k = self.n_splits;
        if k > labels.len() {
            return Err(ClassifierError::degenerate_corpus(format!(
                "cannot split {} documents into {} folds",
                labels.len(),
                k
            )));
        }

        let mut class_ids: HashMap<&str, usize> = HashMap::new();
        let mut class_names: Vec<&str> = Vec::new();
        let encoded: Vec<usize> = labels
            .iter()
            .map(|label| {
                let label = label.as_ref();
                *class_ids.entry(label).or_insert_with(|| {
                    class_names.push(label);
                    class_names.len() - 1
                })
            })
            .collect();

        let mut counts = vec![0usize; class_names.len()];
        for &c in &encoded {
            counts[c] += 1;
        }
        let largest = counts.iter().copied().max().unwrap_or(0);
        if k > largest {
            let class = counts
                .iter()
                .position(|&count| count == largest)
                .map(|c| class_names[c])
                .unwrap_or_default();
            return Err(ClassifierError::degenerate(
                class,
                format!(
                    "{} folds requested but the largest class has only {} members",
                    k, largest
                ),
            ));
        }
        for (name, &count) in class_names.iter().zip(&counts) {
            if count < k {
                warn!(
                    "Class '{}' has only {} members, fewer than the {} folds",
                    name, count, k
                );
            }
        }

        let mut sorted = encoded.clone();
        sorted.sort_unstable();
        // allocation[fold][class]: members of each class held out in each fold
        let mut allocation = vec![vec![0usize; class_names.len()]; k];
        for (position, &c) in sorted.iter().enumerate() {
            allocation[position % k][c] += 1;
        }

        let mut test_folds = vec![0usize; labels.len()];
        for class in 0..class_names.len() {
            let assignments =
                (0..k).flat_map(|fold| std::iter::repeat(fold).take(allocation[fold][class]));
            let members = encoded.iter().enumerate().filter(|&(_, &c)| c == class).map(|(i, _)| i);
            for (i, fold) in members.zip(assignments) {
                test_folds[i] = fold;
            }
        }
        Ok(test_folds)
    }

    pub fn split<S: AsRef<str>>(&self, labels: &[S]) -> Result<Vec<Fold>, ClassifierError> {
        let test_folds = self.test_folds(labels)?;
        Ok((0..self.n_splits)
            .map(|fold| {
                let (test, train): (Vec<usize>, Vec<usize>) =
                    (0..labels.len()).partition(|&i| test_folds[i] == fold);
                Fold { train, test }
            })
            .collect())
    }
}

/// The cartesian product of candidate values, alpha varying slowest and
/// n-gram range fastest.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterGrid {
    pub alphas: Vec<f64>,
    pub fit_priors: Vec<bool>,
    pub ngram_ranges: Vec<NgramRange>,
}

impl ParameterGrid {
    pub fn from_config(config: &SearchConfig) -> Self {
        Self {
            alphas: config.alphas.clone(),
            fit_priors: config.fit_priors.clone(),
            ngram_ranges: config.ngram_ranges.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.alphas.len() * self.fit_priors.len() * self.ngram_ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn candidates(&self) -> Vec<Hyperparameters> {
        let mut out = Vec::with_capacity(self.len());
        for &alpha in &self.alphas {
            for &fit_prior in &self.fit_priors {
                for &ngram_range in &self.ngram_ranges {
                    out.push(Hyperparameters {
                        alpha,
                        fit_prior,
                        ngram_range,
                    });
                }
            }
        }
        out
    }
}

/// Cross-validation result of one grid point.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateScore {
    pub hyperparameters: Hyperparameters,
    pub fold_scores: Vec<f64>,
    pub mean_score: f64,
    pub std_score: f64,
    /// 1 is best; equal means share a rank
    pub rank: usize,
}

/// Everything a grid search reports, plus the refit winner.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub best_hyperparameters: Hyperparameters,
    /// Mean held-out accuracy of the winner
    pub best_score: f64,
    /// Accuracy of the refit winner on the full corpus. Optimistic, diagnostic only.
    pub train_score: f64,
    pub candidates: Vec<CandidateScore>,
    pub elapsed: Duration,
    pub classifier: Classifier,
}

/// Exhaustive grid search over the pipeline hyperparameters.
#[derive(Debug, Clone, Default)]
pub struct GridSearch {
    config: SearchConfig,
}

impl GridSearch {
    pub fn new(config: SearchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Checks the corpus against the search settings without fitting anything.
    pub fn preflight(&self, corpus: &Corpus) -> Result<Vec<Fold>, ClassifierError> {
        let grid = ParameterGrid::from_config(&self.config);
        if grid.is_empty() {
            return Err(ClassifierError::InputContractError(
                "hyperparameter grid is empty".into(),
            ));
        }
        if let Some(alpha) = grid.alphas.iter().find(|a| !a.is_finite() || **a < 0.0) {
            return Err(ClassifierError::InputContractError(format!(
                "alpha must be finite and non-negative, got {}",
                alpha
            )));
        }
        for ngram_range in &grid.ngram_ranges {
            ngram_range.validate()?;
        }
        let kfold = StratifiedKFold::new(self.config.folds)?;

        let n_classes = corpus.class_counts().len();
        if n_classes < 2 {
            return Err(ClassifierError::degenerate_corpus(format!(
                "need at least 2 classes, found {}",
                n_classes
            )));
        }

        let oversampler = Oversampler::new(self.config.smote());
        oversampler.preflight(corpus.labels())?;

        let folds = kfold.split(corpus.labels())?;
        if self.config.singleton_policy == SingletonPolicy::Reject {
            for fold in &folds {
                let train_labels: Vec<&str> =
                    fold.train.iter().map(|&i| corpus.labels()[i].as_str()).collect();
                oversampler.preflight(&train_labels)?;
            }
        }
        Ok(folds)
    }

    /// Cross-validates every grid point, then refits the winner on the whole corpus.
    ///
    /// Documents are expected to be normalized already.
    pub fn fit(&self, corpus: &Corpus) -> Result<SearchOutcome, ClassifierError> {
        let started = Instant::now();
        let folds = self.preflight(corpus)?;
        let candidates = ParameterGrid::from_config(&self.config).candidates();
        info!(
            "Fitting {} folds for each of {} candidates, totalling {} fits",
            folds.len(),
            candidates.len(),
            folds.len() * candidates.len()
        );

        let tasks: Vec<(usize, usize)> = (0..candidates.len())
            .flat_map(|c| (0..folds.len()).map(move |f| (c, f)))
            .collect();
        let evaluate = || {
            tasks
                .par_iter()
                .map(|&(c, f)| self.evaluate(corpus, &candidates[c], &folds[f]))
                .collect::<Result<Vec<f64>, ClassifierError>>()
        };
        let scores = match create_thread_pool(&self.config) {
            Ok(pool) => pool.install(evaluate)?,
            Err(e) => {
                warn!("Could not build worker pool ({}); using the global pool", e);
                evaluate()?
            }
        };

        let mut results: Vec<CandidateScore> = candidates
            .iter()
            .zip(scores.chunks(folds.len()))
            .map(|(params, fold_scores)| {
                let (mean_score, std_score) = mean_and_std(fold_scores);
                CandidateScore {
                    hyperparameters: *params,
                    fold_scores: fold_scores.to_vec(),
                    mean_score,
                    std_score,
                    rank: 0,
                }
            })
            .collect();
        assign_ranks(&mut results);

        let best = best_index(&results);
        let best_hyperparameters = results[best].hyperparameters;
        let best_score = results[best].mean_score;

        let classifier = ClassifierBuilder::new()
            .with_hyperparameters(best_hyperparameters)
            .with_oversampling(self.config.smote())
            .fit_corpus(corpus)?;
        let train_score = classifier.score(corpus.documents(), corpus.labels())?;
        let elapsed = started.elapsed();

        info!("Time taken: {:.2} sec", elapsed.as_secs_f64());
        info!("Best parameters: {}", best_hyperparameters);
        info!("Best score: {:.6}", best_score);
        info!("Score on entire dataset (diagnostic): {:.6}", train_score);

        Ok(SearchOutcome {
            best_hyperparameters,
            best_score,
            train_score,
            candidates: results,
            elapsed,
            classifier,
        })
    }

    fn evaluate(
        &self,
        corpus: &Corpus,
        params: &Hyperparameters,
        fold: &Fold,
    ) -> Result<f64, ClassifierError> {
        let train = corpus.subset(&fold.train);
        let test = corpus.subset(&fold.test);
        let classifier = ClassifierBuilder::new()
            .with_hyperparameters(*params)
            .with_oversampling(self.config.smote())
            .fit(train.documents(), train.labels())?;
        let score = classifier.score(test.documents(), test.labels())?;
        debug!("[{}] held-out accuracy {:.4}", params, score);
        Ok(score)
    }
}

fn mean_and_std(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.sqrt())
}

fn assign_ranks(results: &mut [CandidateScore]) {
    let means: Vec<f64> = results.iter().map(|r| r.mean_score).collect();
    for result in results.iter_mut() {
        result.rank = 1 + means.iter().filter(|&&m| m > result.mean_score).count();
    }
}

/// First candidate with the highest mean score.
fn best_index(results: &[CandidateScore]) -> usize {
    let mut best = 0;
    for (i, result) in results.iter().enumerate() {
        if result.mean_score > results[best].mean_score {
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_stratified_folds_balanced() -> Result<(), ClassifierError> {
        let y = labels(&["a", "a", "a", "b", "b", "b"]);
        let folds = StratifiedKFold::new(3)?.split(&y)?;
        assert_eq!(folds[0].test, vec![0, 3]);
        assert_eq!(folds[1].test, vec![1, 4]);
        assert_eq!(folds[2].test, vec![2, 5]);
        assert_eq!(folds[0].train, vec![1, 2, 4, 5]);
        Ok(())
    }

    #[test]
    fn test_stratified_folds_uneven_classes() -> Result<(), ClassifierError> {
        let y = labels(&["b", "a", "a", "b", "a"]);
        let test_folds = StratifiedKFold::new(2)?.test_folds(&y)?;
        assert_eq!(test_folds, vec![0, 0, 0, 1, 1]);
        Ok(())
    }

    #[test]
    fn test_fold_errors() {
        assert!(matches!(
            StratifiedKFold::new(1),
            Err(ClassifierError::InputContractError(_))
        ));
        let y = labels(&["a", "b", "c"]);
        assert!(matches!(
            StratifiedKFold { n_splits: 2 }.test_folds(&y),
            Err(ClassifierError::DegenerateTrainingError { .. })
        ));
        assert!(matches!(
            StratifiedKFold { n_splits: 4 }.test_folds(&labels(&["a", "a", "b"])),
            Err(ClassifierError::DegenerateTrainingError { .. })
        ));
        match (StratifiedKFold { n_splits: 3 }).test_folds(&labels(&["b", "a", "a", "b", "c"])) {
            Err(ClassifierError::DegenerateTrainingError { class, .. }) => {
                assert_eq!(class.as_deref(), Some("b"))
            }
            other => panic!("expected degenerate error, got {:?}", other),
        }
    }

    #[test]
    fn test_grid_order() {
        let grid = ParameterGrid {
            alphas: vec![0.1, 1.0],
            fit_priors: vec![true, false],
            ngram_ranges: vec![NgramRange::new(1, 1), NgramRange::new(1, 2)],
        };
        let candidates = grid.candidates();
        assert_eq!(candidates.len(), 8);
        assert_eq!(candidates[1].ngram_range, NgramRange::new(1, 2));
        assert!(!candidates[2].fit_prior);
        assert_eq!(candidates[4].alpha, 1.0);
    }

    #[test]
    fn test_ranks_and_ties() {
        let score = |mean_score| CandidateScore {
            hyperparameters: Hyperparameters::default(),
            fold_scores: vec![],
            mean_score,
            std_score: 0.0,
            rank: 0,
        };
        let mut results = vec![score(0.5), score(0.9), score(0.9), score(0.7)];
        assign_ranks(&mut results);
        let ranks: Vec<usize> = results.iter().map(|r| r.rank).collect();
        assert_eq!(ranks, vec![4, 1, 1, 3]);
        assert_eq!(best_index(&results), 1);
    }

    #[test]
    fn test_mean_and_std() {
        let (mean, std) = mean_and_std(&[1.0, 0.5]);
        assert_eq!(mean, 0.75);
        assert_eq!(std, 0.25);
    }
}
