use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::error::ClassifierError;
use super::utils::{interpolate, squared_distance, SparseVector};

/// What to do with a minority class that has a single example and therefore no neighbours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SingletonPolicy {
    /// Synthesize copies of the lone example.
    #[default]
    Replicate,
    /// Refuse to train.
    Reject,
}

/// Configuration of the synthetic minority oversampler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmoteConfig {
    pub k_neighbors: usize,
    pub seed: u64,
    pub singleton_policy: SingletonPolicy,
}

impl Default for SmoteConfig {
    fn default() -> Self {
        Self {
            k_neighbors: 5,
            seed: 42,
            singleton_policy: SingletonPolicy::default(),
        }
    }
}

/// Synthetic minority oversampling (SMOTE).
///
/// Every class other than the majority is raised to the majority count by
/// interpolating between an example and one of its nearest same-class
/// neighbours. Only used while fitting; inference never resamples.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Oversampler {
    config: SmoteConfig,
}

impl Oversampler {
    pub fn new(config: SmoteConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SmoteConfig {
        &self.config
    }

    /// Checks that every class can be oversampled before any fitting work starts.
    pub fn preflight<S: AsRef<str>>(&self, labels: &[S]) -> Result<(), ClassifierError> {
        if self.config.k_neighbors == 0 {
            return Err(ClassifierError::InputContractError(
                "k_neighbors must be at least 1".into(),
            ));
        }

        let counts = class_counts(labels);
        let majority = counts.values().copied().max().unwrap_or(0);
        for (class, &count) in &counts {
            if count == 1 && count < majority {
                match self.config.singleton_policy {
                    SingletonPolicy::Reject => {
                        return Err(ClassifierError::degenerate(
                            *class,
                            "a class needs at least 2 examples to find oversampling neighbours",
                        ));
                    }
                    SingletonPolicy::Replicate => {
                        log::warn!(
                            "Class '{}' has a single example; oversampling will replicate it",
                            class
                        );
                    }
                }
            }
        }
        Ok(())
    }

    /// Returns the input rows followed by the synthetic rows, with matching labels.
    pub fn fit_resample(
        &self,
        features: &[SparseVector],
        labels: &[String],
    ) -> Result<(Vec<SparseVector>, Vec<String>), ClassifierError> {
        if features.len() != labels.len() {
            return Err(ClassifierError::InputContractError(format!(
                "{} feature rows but {} labels",
                features.len(),
                labels.len()
            )));
        }
        self.preflight(labels)?;

        let mut members: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
        for (i, label) in labels.iter().enumerate() {
            members.entry(label.as_str()).or_default().push(i);
        }
        let majority = members.values().map(Vec::len).max().unwrap_or(0);

        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let mut out_features = features.to_vec();
        let mut out_labels = labels.to_vec();

        for (class, indices) in &members {
            let needed = majority - indices.len();
            if needed == 0 {
                continue;
            }

            let neighbours = nearest_neighbours(features, indices, self.config.k_neighbors);
            for _ in 0..needed {
                let sample = rng.gen_range(0..indices.len());
                let own = &features[indices[sample]];
                let synthetic = match neighbours[sample].as_slice() {
                    [] => own.clone(),
                    candidates => {
                        let neighbour = candidates[rng.gen_range(0..candidates.len())];
                        let step: f64 = rng.gen();
                        interpolate(own, &features[neighbour], step)
                    }
                };
                out_features.push(synthetic);
                out_labels.push(class.to_string());
            }
            log::debug!("Synthesized {} examples for class '{}'", needed, class);
        }

        Ok((out_features, out_labels))
    }
}

pub(crate) fn class_counts<S: AsRef<str>>(labels: &[S]) -> BTreeMap<&str, usize> {
    let mut counts = BTreeMap::new();
    for label in labels {
        *counts.entry(label.as_ref()).or_insert(0) += 1;
    }
    counts
}

/// For each member, the indices of its k nearest other members (distance, then index).
fn nearest_neighbours(features: &[SparseVector], members: &[usize], k: usize) -> Vec<Vec<usize>> {
    let k = k.min(members.len().saturating_sub(1));
    members
        .iter()
        .map(|&i| {
            let mut others: Vec<(f64, usize)> = members
                .iter()
                .filter(|&&j| j != i)
                .map(|&j| (squared_distance(&features[i], &features[j]), j))
                .collect();
            others.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
            others.into_iter().take(k).map(|(_, j)| j).collect()
        })
        .collect()
}
