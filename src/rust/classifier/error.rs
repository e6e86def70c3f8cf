use crate::model_store::StorageError;

/// Represents the different types of errors that can occur while training or using the classifier.
#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    /// Malformed records or mismatched sequences handed in by the caller
    #[error("Input contract error: {0}")]
    InputContractError(String),
    /// The training data cannot support the requested fit, e.g. a class is too small
    #[error("Degenerate training data{}: {reason}", class_suffix(.class))]
    DegenerateTrainingError {
        /// The offending class, when a single class is to blame
        class: Option<String>,
        /// What makes the data unusable
        reason: String,
    },
    /// The lyrics table could not be read
    #[error("Dataset error: {0}")]
    DatasetError(String),
    /// A model could not be saved or loaded
    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),
}

fn class_suffix(class: &Option<String>) -> String {
    class
        .as_ref()
        .map(|c| format!(" for class '{}'", c))
        .unwrap_or_default()
}

impl ClassifierError {
    pub(crate) fn degenerate(class: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::DegenerateTrainingError {
            class: Some(class.into()),
            reason: reason.into(),
        }
    }

    pub(crate) fn degenerate_corpus(reason: impl Into<String>) -> Self {
        Self::DegenerateTrainingError {
            class: None,
            reason: reason.into(),
        }
    }
}

impl From<csv::Error> for ClassifierError {
    fn from(err: csv::Error) -> Self {
        ClassifierError::DatasetError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degenerate_message_names_class() {
        let err = ClassifierError::degenerate("Adele", "only 1 example");
        assert_eq!(
            err.to_string(),
            "Degenerate training data for class 'Adele': only 1 example"
        );

        let err = ClassifierError::degenerate_corpus("empty vocabulary");
        assert_eq!(err.to_string(), "Degenerate training data: empty vocabulary");
    }
}
