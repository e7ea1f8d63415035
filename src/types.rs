use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use url::form_urlencoded;

/// Rendering chunk hint handed to JBrowse for every reference sequence
pub const SEQ_CHUNK_SIZE: i64 = 20000;

/// Organism row from the `organism` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organism {
    pub organism_id: i64,
    #[serde(default)]
    pub abbreviation: String,
    #[serde(default)]
    pub genus: String,
    #[serde(default)]
    pub species: String,
    pub common_name: String,
}

/// Distinct feature type ("soType") observed for an organism
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureTypeCategory {
    #[serde(rename = "type")]
    pub type_name: String,
}

/// Reference sequence entry in `refSeqs.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceSequence {
    pub name: String,
    pub start: i64,
    pub end: i64,
    pub length: i64,
    pub seq_chunk_size: i64,
}

impl ReferenceSequence {
    /// Builds the display entry for a sequence, covering `[0, length)`.
    pub fn new(name: impl Into<String>, length: i64) -> Self {
        Self {
            name: name.into(),
            start: 0,
            end: length,
            length,
            seq_chunk_size: SEQ_CHUNK_SIZE,
        }
    }
}

/// Raw residues for part of a reference sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceSlice {
    pub name: String,
    pub start: i64,
    pub end: i64,
    pub seq: String,
}

/// Located feature as JBrowse's REST store expects it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "uniqueID")]
    pub unique_id: String,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub feature_type: String,
    pub start: i64,
    pub end: i64,
    pub strand: Option<i32>,
    /// Always empty; nested features are not fetched.
    #[serde(default)]
    pub subfeatures: Vec<Feature>,
}

/// Result of a range request, shaped by the `sequence` flag
#[derive(Debug, Clone, PartialEq)]
pub enum RangeQueryResult {
    Sequence(Vec<SequenceSlice>),
    Features(Vec<Feature>),
}

/// `{"features": [...]}` envelope for both range modes
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum FeatureContainer {
    Sequence { features: Vec<SequenceSlice> },
    Features { features: Vec<Feature> },
}

impl From<RangeQueryResult> for FeatureContainer {
    fn from(result: RangeQueryResult) -> Self {
        match result {
            RangeQueryResult::Sequence(features) => FeatureContainer::Sequence { features },
            RangeQueryResult::Features(features) => FeatureContainer::Features { features },
        }
    }
}

/// Query string for `/link/{organism}/features/{refseq}`.
///
/// Kept as raw strings: unparseable coordinates fall back to 0. Repeated keys
/// keep their first value.
#[derive(Debug, Default)]
pub struct FeatureQuery {
    pub start: Option<String>,
    pub end: Option<String>,
    pub sequence: Option<String>,
    pub so_type: Option<String>,
}

impl FeatureQuery {
    pub fn parse(raw: Option<&str>) -> Self {
        let mut query = Self::default();
        let Some(raw) = raw else {
            return query;
        };

        for (key, value) in form_urlencoded::parse(raw.as_bytes()) {
            let slot = match key.as_ref() {
                "start" => &mut query.start,
                "end" => &mut query.end,
                "sequence" => &mut query.sequence,
                "soType" => &mut query.so_type,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into_owned());
            }
        }
        query
    }

    pub fn wants_sequence(&self) -> bool {
        self.sequence.as_deref() == Some("true")
    }

    pub fn type_filter(&self) -> &str {
        self.so_type.as_deref().unwrap_or("")
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalStats {
    pub feature_density: f64,
}

/// Reference sequence track, always first in a catalog
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SequenceTrack {
    pub use_as_ref_seq_store: bool,
    pub label: String,
    pub key: String,
    #[serde(rename = "type")]
    pub track_class: String,
    pub store_class: String,
    pub base_url: String,
    pub query: BTreeMap<String, String>,
}

/// One track per feature type category
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureTypeTrack {
    pub category: String,
    pub label: String,
    pub key: String,
    pub query: BTreeMap<String, String>,
    pub region_feature_densities: bool,
    #[serde(rename = "type")]
    pub track_class: String,
    pub track_type: String,
    pub store_class: String,
    pub base_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TrackDescriptor {
    Sequence(SequenceTrack),
    FeatureType(FeatureTypeTrack),
}

impl TrackDescriptor {
    pub fn label(&self) -> &str {
        match self {
            TrackDescriptor::Sequence(track) => &track.label,
            TrackDescriptor::FeatureType(track) => &track.label,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamesEndpoint {
    #[serde(rename = "type")]
    pub store_type: String,
    pub url: String,
}

/// `trackList.json` payload
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackCatalog {
    pub ref_seqs: String,
    pub names: NamesEndpoint,
    pub tracks: Vec<TrackDescriptor>,
}

/// Service description served at `/` and `/service-info`
#[derive(Debug, Serialize)]
pub struct ServiceInfo {
    pub name: String,
    pub version: String,
    pub description: String,
    pub organisms: Vec<OrganismLink>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganismLink {
    pub common_name: String,
    pub genus: String,
    pub species: String,
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_sequence_invariants() {
        let seq = ReferenceSequence::new("chr1", 43270923);
        assert_eq!(seq.start, 0);
        assert_eq!(seq.end, seq.length);
        assert_eq!(seq.seq_chunk_size, 20000);
    }

    #[test]
    fn test_reference_sequence_json_keys() {
        let json = serde_json::to_value(ReferenceSequence::new("chr1", 500)).unwrap();
        assert_eq!(json["seqChunkSize"], 20000);
        assert_eq!(json["end"], 500);
    }

    #[test]
    fn test_feature_json_keys() {
        let feature = Feature {
            unique_id: "LOC_Os01g01010".to_string(),
            name: Some("TBC domain".to_string()),
            feature_type: "gene".to_string(),
            start: 2902,
            end: 10817,
            strand: Some(1),
            subfeatures: vec![],
        };
        let json = serde_json::to_value(&feature).unwrap();
        assert_eq!(json["uniqueID"], "LOC_Os01g01010");
        assert_eq!(json["type"], "gene");
        assert_eq!(json["subfeatures"], serde_json::json!([]));
    }

    #[test]
    fn test_feature_query_parse() {
        let query = FeatureQuery::parse(Some("start=0&end=10&end=20&soType=five_prime_UTR&x=1"));
        assert_eq!(query.start.as_deref(), Some("0"));
        assert_eq!(query.end.as_deref(), Some("10"));
        assert_eq!(query.type_filter(), "five_prime_UTR");
        assert!(!query.wants_sequence());

        let query = FeatureQuery::parse(Some("sequence=true&sequence=false&soType=a%20b"));
        assert!(query.wants_sequence());
        assert_eq!(query.type_filter(), "a b");

        let query = FeatureQuery::parse(None);
        assert!(query.start.is_none());
        assert_eq!(query.type_filter(), "");
    }

    #[test]
    fn test_feature_query_flags() {
        let query = FeatureQuery {
            sequence: Some("true".to_string()),
            ..Default::default()
        };
        assert!(query.wants_sequence());
        assert_eq!(query.type_filter(), "");

        let query = FeatureQuery {
            sequence: Some("TRUE".to_string()),
            so_type: Some("exon".to_string()),
            ..Default::default()
        };
        assert!(!query.wants_sequence());
        assert_eq!(query.type_filter(), "exon");
    }
}
