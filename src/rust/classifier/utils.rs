use serde::{Deserialize, Serialize};

/// A sparse feature vector with strictly increasing indices and no stored zeros.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SparseVector {
    pub indices: Vec<usize>,
    pub values: Vec<f64>,
}

impl SparseVector {
    /// Builds a vector from `(index, value)` pairs that are already sorted by index.
    pub(crate) fn from_sorted(entries: impl IntoIterator<Item = (usize, f64)>) -> Self {
        let mut vector = Self::default();
        for (index, value) in entries {
            if value != 0.0 {
                vector.indices.push(index);
                vector.values.push(value);
            }
        }
        vector
    }

    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    pub fn is_zero(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.indices.iter().copied().zip(self.values.iter().copied())
    }

    pub fn squared_norm(&self) -> f64 {
        self.values.iter().map(|v| v * v).sum()
    }
}

pub(crate) fn normalize_vector(vec: &SparseVector) -> SparseVector {
    let norm = vec.squared_norm().sqrt();
    if norm > 1e-10 {
        SparseVector {
            indices: vec.indices.clone(),
            values: vec.values.iter().map(|v| v / norm).collect(),
        }
    } else {
        SparseVector::default()
    }
}

pub(crate) fn squared_distance(a: &SparseVector, b: &SparseVector) -> f64 {
    let (mut i, mut j) = (0, 0);
    let mut sum = 0.0;
    while i < a.nnz() || j < b.nnz() {
        let (ai, bj) = (a.indices.get(i), b.indices.get(j));
        let diff = match (ai, bj) {
            (Some(x), Some(y)) if x == y => {
                let d = a.values[i] - b.values[j];
                i += 1;
                j += 1;
                d
            }
            (Some(x), Some(y)) if x < y => {
                i += 1;
                a.values[i - 1]
            }
            (Some(_), None) => {
                i += 1;
                a.values[i - 1]
            }
            _ => {
                j += 1;
                b.values[j - 1]
            }
        };
        sum += diff * diff;
    }
    sum
}

/// Returns `a + step * (b - a)`.
pub(crate) fn interpolate(a: &SparseVector, b: &SparseVector, step: f64) -> SparseVector {
    let mut entries = Vec::with_capacity(a.nnz() + b.nnz());
    let (mut i, mut j) = (0, 0);
    while i < a.nnz() || j < b.nnz() {
        match (a.indices.get(i), b.indices.get(j)) {
            (Some(&x), Some(&y)) if x == y => {
                let (va, vb) = (a.values[i], b.values[j]);
                entries.push((x, va + step * (vb - va)));
                i += 1;
                j += 1;
            }
            (Some(&x), Some(&y)) if x < y => {
                entries.push((x, a.values[i] * (1.0 - step)));
                i += 1;
            }
            (Some(&x), None) => {
                entries.push((x, a.values[i] * (1.0 - step)));
                i += 1;
            }
            (_, Some(&y)) => {
                entries.push((y, step * b.values[j]));
                j += 1;
            }
            (None, None) => break,
        }
    }
    SparseVector::from_sorted(entries)
}
