//! Per-path recovery rules for backend failures.
//!
//! Catalog and feature reads degrade to empty results so the browser always
//! receives valid JSON; sequence reads fail the request. The table lives here
//! so handlers never decide on their own.

use crate::{Error, Result};

/// Which backend read a failure came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchPath {
    Organisms,
    FeatureTypes,
    ReferenceSequences,
    Features,
    Sequence,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    /// Log and answer with an empty result
    FallbackEmpty,
    /// Surface the error to the caller
    Propagate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorPolicy {
    pub organisms: Recovery,
    pub feature_types: Recovery,
    pub reference_sequences: Recovery,
    pub features: Recovery,
    pub sequence: Recovery,
}

impl Default for ErrorPolicy {
    fn default() -> Self {
        Self {
            organisms: Recovery::FallbackEmpty,
            feature_types: Recovery::FallbackEmpty,
            reference_sequences: Recovery::FallbackEmpty,
            features: Recovery::FallbackEmpty,
            sequence: Recovery::Propagate,
        }
    }
}

impl ErrorPolicy {
    /// Propagates on every path.
    pub fn strict() -> Self {
        Self {
            organisms: Recovery::Propagate,
            feature_types: Recovery::Propagate,
            reference_sequences: Recovery::Propagate,
            features: Recovery::Propagate,
            sequence: Recovery::Propagate,
        }
    }

    pub fn recovery(&self, path: FetchPath) -> Recovery {
        match path {
            FetchPath::Organisms => self.organisms,
            FetchPath::FeatureTypes => self.feature_types,
            FetchPath::ReferenceSequences => self.reference_sequences,
            FetchPath::Features => self.features,
            FetchPath::Sequence => self.sequence,
        }
    }

    /// Applies the rule for `path` to a backend result.
    pub fn apply<T: Default>(&self, path: FetchPath, result: Result<T>) -> Result<T> {
        match result {
            Ok(value) => Ok(value),
            Err(e) => match self.recovery(path) {
                Recovery::FallbackEmpty => {
                    tracing::warn!(?path, error = %e, "backend read failed, answering empty");
                    Ok(T::default())
                }
                Recovery::Propagate => {
                    tracing::error!(?path, error = %e, "backend read failed");
                    Err(e)
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure() -> Result<Vec<u32>> {
        Err(Error::BackendUnavailable("connection refused".to_string()))
    }

    #[test]
    fn test_default_table() {
        let policy = ErrorPolicy::default();
        assert_eq!(policy.recovery(FetchPath::Features), Recovery::FallbackEmpty);
        assert_eq!(
            policy.recovery(FetchPath::ReferenceSequences),
            Recovery::FallbackEmpty
        );
        assert_eq!(policy.recovery(FetchPath::FeatureTypes), Recovery::FallbackEmpty);
        assert_eq!(policy.recovery(FetchPath::Sequence), Recovery::Propagate);
    }

    #[test]
    fn test_fallback_yields_default() {
        let policy = ErrorPolicy::default();
        assert_eq!(policy.apply(FetchPath::Features, failure()).unwrap(), Vec::<u32>::new());
    }

    #[test]
    fn test_propagate_keeps_error() {
        let policy = ErrorPolicy::default();
        assert!(matches!(
            policy.apply(FetchPath::Sequence, failure()),
            Err(Error::BackendUnavailable(_))
        ));
        assert!(ErrorPolicy::strict().apply(FetchPath::Features, failure()).is_err());
    }

    #[test]
    fn test_success_passes_through() {
        let policy = ErrorPolicy::strict();
        assert_eq!(policy.apply(FetchPath::Sequence, Ok(vec![1, 2])).unwrap(), vec![1, 2]);
    }
}
