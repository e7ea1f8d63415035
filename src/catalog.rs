//! Reference sequence listings and per-organism track catalogs.
//!
//! A track catalog is built in two steps: fetch the organism's feature types,
//! then map each one to a track descriptor with [`track_descriptors`]. Track
//! order follows the order the backend returns feature types in.

use crate::{
    Result,
    backend::Backend,
    policy::{ErrorPolicy, FetchPath},
    types::{
        FeatureTypeCategory, FeatureTypeTrack, NamesEndpoint, Organism, ReferenceSequence,
        SequenceTrack, TrackCatalog, TrackDescriptor,
    },
};
use std::collections::BTreeMap;
use std::sync::Arc;

pub const SEQUENCE_TRACK_LABEL: &str = "ref_seq";
pub const FEATURE_TRACK_CATEGORY: &str = "Generic SO Type Tracks";
const REST_STORE_CLASS: &str = "JBrowse/Store/SeqFeature/REST";
const SEQUENCE_TRACK_CLASS: &str = "JBrowse/View/Track/Sequence";
const FEATURE_TRACK_CLASS: &str = "JBrowse/View/Track/HTMLFeatures";

#[derive(Clone)]
pub struct CatalogBuilder {
    backend: Arc<dyn Backend>,
    policy: ErrorPolicy,
    service_address: String,
}

impl CatalogBuilder {
    pub fn new(backend: Arc<dyn Backend>, policy: ErrorPolicy, service_address: String) -> Self {
        Self {
            backend,
            policy,
            service_address,
        }
    }

    /// Link under which all of an organism's endpoints live.
    pub fn organism_url(&self, organism: &str) -> String {
        format!("{}/link/{}", self.service_address, organism)
    }

    pub async fn list_organisms(&self) -> Result<Vec<Organism>> {
        self.policy
            .apply(FetchPath::Organisms, self.backend.list_organisms().await)
    }

    pub async fn list_reference_sequences(&self, organism: &str) -> Result<Vec<ReferenceSequence>> {
        let rows = self.policy.apply(
            FetchPath::ReferenceSequences,
            self.backend.list_reference_sequences(organism).await,
        )?;

        Ok(rows
            .into_iter()
            .map(|row| ReferenceSequence::new(row.name, row.length))
            .collect())
    }

    pub async fn build_track_catalog(&self, organism: &str) -> Result<TrackCatalog> {
        let categories = self.policy.apply(
            FetchPath::FeatureTypes,
            self.backend.list_feature_types(organism).await,
        )?;
        tracing::debug!(organism, categories = categories.len(), "building track catalog");

        Ok(TrackCatalog {
            ref_seqs: format!("{}/refSeqs.json", self.organism_url(organism)),
            names: NamesEndpoint {
                store_type: "REST".to_string(),
                url: format!("{}/link/names", self.service_address),
            },
            tracks: track_descriptors(&self.service_address, organism, &categories),
        })
    }
}

/// The reference sequence track followed by one track per category.
pub fn track_descriptors(
    service_address: &str,
    organism: &str,
    categories: &[FeatureTypeCategory],
) -> Vec<TrackDescriptor> {
    let base_url = format!("{}/link/{}/", service_address, organism);

    let mut tracks = Vec::with_capacity(categories.len() + 1);
    tracks.push(TrackDescriptor::Sequence(SequenceTrack {
        use_as_ref_seq_store: true,
        label: SEQUENCE_TRACK_LABEL.to_string(),
        key: "REST Reference Sequence".to_string(),
        track_class: SEQUENCE_TRACK_CLASS.to_string(),
        store_class: REST_STORE_CLASS.to_string(),
        base_url: base_url.clone(),
        query: BTreeMap::from([("sequence".to_string(), "true".to_string())]),
    }));

    tracks.extend(categories.iter().map(|category| {
        TrackDescriptor::FeatureType(FeatureTypeTrack {
            category: FEATURE_TRACK_CATEGORY.to_string(),
            label: format!("{}_{}", organism, category.type_name),
            key: category.type_name.clone(),
            query: BTreeMap::from([("soType".to_string(), category.type_name.clone())]),
            region_feature_densities: true,
            track_class: FEATURE_TRACK_CLASS.to_string(),
            track_type: FEATURE_TRACK_CLASS.to_string(),
            store_class: REST_STORE_CLASS.to_string(),
            base_url: base_url.clone(),
        })
    }));

    tracks
}
