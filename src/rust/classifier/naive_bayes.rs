use std::collections::BTreeMap;

use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

use super::error::ClassifierError;
use super::utils::SparseVector;

/// Smallest smoothing value; non-negative alphas below it are clamped up to it.
pub const MIN_ALPHA: f64 = 1e-10;

/// Multinomial naive Bayes over non-negative (TF-IDF) features.
///
/// Classes are kept in sorted order; index `i` of every per-class array
/// refers to `classes[i]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultinomialNb {
    alpha: f64,
    fit_prior: bool,
    classes: Vec<String>,
    class_log_prior: Array1<f64>,
    feature_log_prob: Array2<f64>,
}

impl MultinomialNb {
    /// Fits class priors and per-class feature log probabilities.
    ///
    /// `n_features` is the vocabulary size; every row index must be below it.
    pub fn fit(
        features: &[SparseVector],
        labels: &[String],
        n_features: usize,
        alpha: f64,
        fit_prior: bool,
    ) -> Result<Self, ClassifierError> {
        if features.len() != labels.len() {
            return Err(ClassifierError::InputContractError(format!(
                "{} feature rows but {} labels",
                features.len(),
                labels.len()
            )));
        }
        if features.is_empty() {
            return Err(ClassifierError::degenerate_corpus("no training examples"));
        }

        if !alpha.is_finite() || alpha < 0.0 {
            return Err(ClassifierError::InputContractError(format!(
                "alpha must be finite and non-negative, got {}",
                alpha
            )));
        }
        let alpha = if alpha < MIN_ALPHA {
            log::warn!("alpha too small ({}); clamping to {}", alpha, MIN_ALPHA);
            MIN_ALPHA
        } else {
            alpha
        };

        let mut class_index: BTreeMap<&str, usize> =
            labels.iter().map(|l| (l.as_str(), 0)).collect();
        for (i, value) in class_index.values_mut().enumerate() {
            *value = i;
        }
        let classes: Vec<String> = class_index.keys().map(|c| c.to_string()).collect();
        let n_classes = classes.len();

        let mut feature_count = Array2::<f64>::zeros((n_classes, n_features));
        let mut class_count = Array1::<f64>::zeros(n_classes);
        for (row, label) in features.iter().zip(labels) {
            let c = class_index[label.as_str()];
            class_count[c] += 1.0;
            for (j, value) in row.iter() {
                if j >= n_features {
                    return Err(ClassifierError::InputContractError(format!(
                        "feature index {} out of range for {} features",
                        j, n_features
                    )));
                }
                feature_count[[c, j]] += value;
            }
        }

        let smoothed = feature_count.mapv(|count| count + alpha);
        let row_totals = smoothed.sum_axis(Axis(1)).mapv(f64::ln);
        let mut feature_log_prob = smoothed.mapv(f64::ln);
        for (mut row, total) in feature_log_prob.axis_iter_mut(Axis(0)).zip(row_totals.iter()) {
            row -= *total;
        }

        let class_log_prior = if fit_prior {
            let total = class_count.sum().ln();
            class_count.mapv(|count| count.ln() - total)
        } else {
            Array1::from_elem(n_classes, -(n_classes as f64).ln())
        };

        Ok(Self {
            alpha,
            fit_prior,
            classes,
            class_log_prior,
            feature_log_prob,
        })
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn fit_prior(&self) -> bool {
        self.fit_prior
    }

    pub fn n_features(&self) -> usize {
        self.feature_log_prob.ncols()
    }

    /// Unnormalized log posterior of each class for one row.
    pub fn joint_log_likelihood(&self, row: &SparseVector) -> Array1<f64> {
        let mut jll = self.class_log_prior.clone();
        for (j, value) in row.iter().filter(|(j, _)| *j < self.n_features()) {
            jll.scaled_add(value, &self.feature_log_prob.column(j));
        }
        jll
    }

    /// Index of the most likely class; the first class wins ties.
    pub fn predict_index(&self, row: &SparseVector) -> usize {
        argmax(&self.joint_log_likelihood(row))
    }

    pub fn predict(&self, row: &SparseVector) -> &str {
        &self.classes[self.predict_index(row)]
    }

    /// Posterior probability per class, in `classes()` order. Sums to 1.
    pub fn predict_proba(&self, row: &SparseVector) -> Array1<f64> {
        let jll = self.joint_log_likelihood(row);
        let max = jll.fold(f64::NEG_INFINITY, |acc, &v| acc.max(v));
        let log_norm = max + jll.mapv(|v| (v - max).exp()).sum().ln();
        jll.mapv(|v| (v - log_norm).exp())
    }
}

fn argmax(values: &Array1<f64>) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate() {
        if v > values[best] {
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(entries: &[(usize, f64)]) -> SparseVector {
        SparseVector::from_sorted(entries.iter().copied())
    }

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_fit_sorts_classes_and_learns_priors() -> Result<(), ClassifierError> {
        let x = vec![row(&[(0, 1.0)]), row(&[(1, 1.0)]), row(&[(0, 1.0)])];
        let y = labels(&["b", "a", "b"]);
        let nb = MultinomialNb::fit(&x, &y, 2, 1.0, true)?;

        assert_eq!(nb.classes(), &["a".to_string(), "b".to_string()]);
        assert!((nb.class_log_prior[0] - (1.0f64 / 3.0).ln()).abs() < 1e-12);
        assert!((nb.class_log_prior[1] - (2.0f64 / 3.0).ln()).abs() < 1e-12);
        // class b: counts [2, 0] + alpha -> [3, 1] / 4
        assert!((nb.feature_log_prob[[1, 0]] - 0.75f64.ln()).abs() < 1e-12);
        Ok(())
    }

    #[test]
    fn test_uniform_prior_when_not_fitted() -> Result<(), ClassifierError> {
        let x = vec![row(&[(0, 1.0)]), row(&[(1, 1.0)]), row(&[(0, 1.0)])];
        let y = labels(&["b", "a", "b"]);
        let nb = MultinomialNb::fit(&x, &y, 2, 1.0, false)?;
        for &p in nb.class_log_prior.iter() {
            assert!((p - 0.5f64.ln()).abs() < 1e-12);
        }
        Ok(())
    }

    #[test]
    fn test_predict_and_probabilities() -> Result<(), ClassifierError> {
        let x = vec![row(&[(0, 1.0)]), row(&[(1, 1.0)])];
        let y = labels(&["first", "second"]);
        let nb = MultinomialNb::fit(&x, &y, 2, 1.0, true)?;

        assert_eq!(nb.predict(&row(&[(1, 1.0)])), "second");
        let proba = nb.predict_proba(&row(&[(0, 0.7)]));
        assert!((proba.sum() - 1.0).abs() < 1e-12);
        assert!(proba[0] > proba[1]);
        Ok(())
    }

    #[test]
    fn test_zero_row_falls_back_to_prior_and_first_class_on_tie() -> Result<(), ClassifierError> {
        let x = vec![row(&[(0, 1.0)]), row(&[(1, 1.0)])];
        let y = labels(&["x", "y"]);
        let nb = MultinomialNb::fit(&x, &y, 2, 1.0, true)?;

        let zero = SparseVector::default();
        assert_eq!(nb.predict(&zero), "x");
        let proba = nb.predict_proba(&zero);
        assert!((proba[0] - 0.5).abs() < 1e-12);
        Ok(())
    }

    #[test]
    fn test_alpha_is_clamped() -> Result<(), ClassifierError> {
        let x = vec![row(&[(0, 1.0)]), row(&[(1, 1.0)])];
        let y = labels(&["x", "y"]);
        let nb = MultinomialNb::fit(&x, &y, 2, 0.0, true)?;
        assert_eq!(nb.alpha(), MIN_ALPHA);
        assert!(nb.predict_proba(&row(&[(0, 1.0)])).iter().all(|p| p.is_finite()));
        Ok(())
    }

    #[test]
    fn test_negative_alpha_is_rejected() {
        let x = vec![row(&[(0, 1.0)]), row(&[(1, 1.0)])];
        let y = labels(&["x", "y"]);
        assert!(matches!(
            MultinomialNb::fit(&x, &y, 2, -1.0, true),
            Err(ClassifierError::InputContractError(_))
        ));
    }
}
