//! Range requests against a single reference sequence.
//!
//! Sequence requests report the requested `[start, end)` on every returned
//! slice, not the span the backend produced. Near the end of a sequence the
//! residues come back short while the coordinates stay where the client asked.

use crate::{
    Error, Result,
    backend::{Backend, RangeFetch},
    policy::{ErrorPolicy, FetchPath},
    range::CoordinateRange,
    types::{Feature, RangeQueryResult, SequenceSlice},
};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeMode {
    Sequence,
    Features,
}

impl RangeMode {
    pub fn from_flag(sequence: bool) -> Self {
        if sequence {
            RangeMode::Sequence
        } else {
            RangeMode::Features
        }
    }
}

#[derive(Clone)]
pub struct RangeDispatcher {
    backend: Arc<dyn Backend>,
    policy: ErrorPolicy,
}

impl RangeDispatcher {
    pub fn new(backend: Arc<dyn Backend>, policy: ErrorPolicy) -> Self {
        Self { backend, policy }
    }

    pub async fn resolve_range(
        &self,
        organism: &str,
        ref_seq: &str,
        range: CoordinateRange,
        mode: RangeMode,
        type_filter: &str,
    ) -> Result<RangeQueryResult> {
        match mode {
            RangeMode::Sequence => self
                .sequence(organism, ref_seq, range)
                .await
                .map(RangeQueryResult::Sequence),
            RangeMode::Features => self
                .features(organism, ref_seq, range, type_filter)
                .await
                .map(RangeQueryResult::Features),
        }
    }

    async fn sequence(
        &self,
        organism: &str,
        ref_seq: &str,
        range: CoordinateRange,
    ) -> Result<Vec<SequenceSlice>> {
        let request = RangeFetch::Sequence {
            organism,
            ref_seq,
            start: range.start(),
            length: range.len(),
        };
        let fetched = self.backend.fetch_range(&request).await.and_then(|rows| match rows {
            RangeQueryResult::Sequence(slices) => Ok(slices),
            RangeQueryResult::Features(_) => Err(Error::Internal(
                "backend answered a sequence request with features".to_string(),
            )),
        });

        let mut slices = self.policy.apply(FetchPath::Sequence, fetched)?;
        for slice in &mut slices {
            slice.start = range.start();
            slice.end = range.end();
        }
        Ok(slices)
    }

    async fn features(
        &self,
        organism: &str,
        ref_seq: &str,
        range: CoordinateRange,
        type_filter: &str,
    ) -> Result<Vec<Feature>> {
        let request = RangeFetch::Features {
            organism,
            ref_seq,
            so_type: type_filter,
            start: range.start(),
            end: range.end(),
        };
        let fetched = self.backend.fetch_range(&request).await.and_then(|rows| match rows {
            RangeQueryResult::Features(features) => Ok(features),
            RangeQueryResult::Sequence(_) => Err(Error::Internal(
                "backend answered a feature request with sequence".to_string(),
            )),
        });

        let mut features = self.policy.apply(FetchPath::Features, fetched)?;
        for feature in &mut features {
            feature.subfeatures = Vec::new();
        }
        tracing::debug!(organism, ref_seq, count = features.len(), "fetched features");
        Ok(features)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;

    const DATASET: &str = r#"{
        "organisms": [{
            "organismId": 1,
            "genus": "Oryza",
            "species": "sativa",
            "commonName": "Oryza",
            "referenceSequences": [{"name": "chr1", "residues": "ACGTACGTAC"}],
            "features": [
                {"uniqueID": "g1", "type": "gene", "refSeq": "chr1",
                 "start": 1, "end": 6, "strand": 1},
                {"uniqueID": "e1", "type": "exon", "refSeq": "chr1",
                 "start": 2, "end": 4, "strand": 1}
            ]
        }]
    }"#;

    fn dispatcher(policy: ErrorPolicy) -> RangeDispatcher {
        RangeDispatcher::new(Arc::new(MemoryBackend::from_json(DATASET).unwrap()), policy)
    }

    #[tokio::test]
    async fn test_sequence_reports_requested_span() {
        let range = CoordinateRange::new(0, 1_000_000).unwrap();
        let result = dispatcher(ErrorPolicy::default())
            .resolve_range("Oryza", "chr1", range, RangeMode::Sequence, "")
            .await
            .unwrap();

        let RangeQueryResult::Sequence(slices) = result else {
            panic!("expected sequence");
        };
        assert_eq!(slices[0].seq, "ACGTACGTAC");
        assert_eq!(slices[0].start, 0);
        assert_eq!(slices[0].end, 1_000_000);
    }

    #[tokio::test]
    async fn test_empty_filter_matches_unfiltered() {
        let dispatcher = dispatcher(ErrorPolicy::default());
        let range = CoordinateRange::new(0, 10).unwrap();

        let all = dispatcher
            .resolve_range("Oryza", "chr1", range, RangeMode::Features, "")
            .await
            .unwrap();
        let RangeQueryResult::Features(features) = &all else {
            panic!("expected features");
        };
        assert_eq!(features.len(), 2);
        assert!(features.iter().all(|f| f.subfeatures.is_empty()));

        let exons = dispatcher
            .resolve_range("Oryza", "chr1", range, RangeMode::Features, "exon")
            .await
            .unwrap();
        let RangeQueryResult::Features(features) = exons else {
            panic!("expected features");
        };
        assert_eq!(features.len(), 1);
        assert_eq!(features[0].unique_id, "e1");
    }

    #[tokio::test]
    async fn test_empty_range_returns_no_features() {
        let range = CoordinateRange::new(3, 3).unwrap();
        let result = dispatcher(ErrorPolicy::default())
            .resolve_range("Oryza", "chr1", range, RangeMode::Features, "")
            .await
            .unwrap();
        assert_eq!(result, RangeQueryResult::Features(vec![]));
    }

    #[test]
    fn test_mode_from_flag() {
        assert_eq!(RangeMode::from_flag(true), RangeMode::Sequence);
        assert_eq!(RangeMode::from_flag(false), RangeMode::Features);
    }
}
