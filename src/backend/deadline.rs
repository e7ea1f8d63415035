use super::{Backend, RangeFetch, ReferenceSequenceRow};
use crate::{
    Error, Result,
    types::{FeatureTypeCategory, Organism, RangeQueryResult},
};
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Fails any backend call that runs longer than `limit`.
pub struct Deadline {
    inner: Arc<dyn Backend>,
    limit: Duration,
}

impl Deadline {
    pub fn new(inner: Arc<dyn Backend>, limit: Duration) -> Self {
        Self { inner, limit }
    }

    async fn run<T>(&self, query: &str, fut: impl Future<Output = Result<T>>) -> Result<T> {
        tokio::time::timeout(self.limit, fut).await.map_err(|_| {
            Error::BackendUnavailable(format!("{} exceeded {:?} deadline", query, self.limit))
        })?
    }
}

#[async_trait]
impl Backend for Deadline {
    async fn list_organisms(&self) -> Result<Vec<Organism>> {
        self.run("organism query", self.inner.list_organisms()).await
    }

    async fn list_feature_types(&self, organism: &str) -> Result<Vec<FeatureTypeCategory>> {
        self.run("feature type query", self.inner.list_feature_types(organism))
            .await
    }

    async fn list_reference_sequences(&self, organism: &str) -> Result<Vec<ReferenceSequenceRow>> {
        self.run(
            "reference sequence query",
            self.inner.list_reference_sequences(organism),
        )
        .await
    }

    async fn fetch_range(&self, request: &RangeFetch<'_>) -> Result<RangeQueryResult> {
        self.run("range query", self.inner.fetch_range(request)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Stalled;

    #[async_trait]
    impl Backend for Stalled {
        async fn list_organisms(&self) -> Result<Vec<Organism>> {
            std::future::pending().await
        }

        async fn list_feature_types(&self, _organism: &str) -> Result<Vec<FeatureTypeCategory>> {
            Ok(vec![FeatureTypeCategory {
                type_name: "gene".to_string(),
            }])
        }

        async fn list_reference_sequences(
            &self,
            _organism: &str,
        ) -> Result<Vec<ReferenceSequenceRow>> {
            std::future::pending().await
        }

        async fn fetch_range(&self, _request: &RangeFetch<'_>) -> Result<RangeQueryResult> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_stalled_query_times_out() {
        let backend = Deadline::new(Arc::new(Stalled), Duration::from_millis(20));
        assert!(matches!(
            backend.list_organisms().await,
            Err(Error::BackendUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_fast_query_passes_through() {
        let backend = Deadline::new(Arc::new(Stalled), Duration::from_secs(5));
        let types = backend.list_feature_types("rice").await.unwrap();
        assert_eq!(types[0].type_name, "gene");
    }
}
