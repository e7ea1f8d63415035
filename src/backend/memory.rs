use super::{Backend, RangeFetch, ReferenceSequenceRow};
use crate::{
    Error, Result,
    types::{Feature, FeatureTypeCategory, Organism, RangeQueryResult, SequenceSlice},
};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::Path;

/// Dataset file layout
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub organisms: Vec<OrganismData>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganismData {
    #[serde(flatten)]
    pub organism: Organism,
    #[serde(default)]
    pub reference_sequences: Vec<SequenceData>,
    #[serde(default)]
    pub features: Vec<LocatedFeature>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SequenceData {
    pub name: String,
    #[serde(default)]
    pub residues: String,
    /// Defaults to the residue count
    pub length: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocatedFeature {
    #[serde(rename = "uniqueID")]
    pub unique_id: String,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub feature_type: String,
    pub ref_seq: String,
    pub start: i64,
    pub end: i64,
    pub strand: Option<i32>,
}

/// Backend serving a dataset loaded into memory.
///
/// Ordering matches the Chado queries: feature types and reference
/// sequences by name, features by start.
pub struct MemoryBackend {
    dataset: Dataset,
}

impl MemoryBackend {
    pub fn new(dataset: Dataset) -> Self {
        Self { dataset }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let dataset = serde_json::from_str(json)
            .map_err(|e| Error::InvalidInput(format!("invalid dataset: {}", e)))?;
        Ok(Self::new(dataset))
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&json)
    }

    fn organism(&self, common_name: &str) -> Option<&OrganismData> {
        self.dataset
            .organisms
            .iter()
            .find(|o| o.organism.common_name == common_name)
    }

    /// Residues in `[start, start + length)` clipped to the sequence, the
    /// same window as `substr(residues, start + 1, length)`.
    fn sequence_rows(
        &self,
        organism: &str,
        ref_seq: &str,
        start: i64,
        length: i64,
    ) -> Vec<SequenceSlice> {
        let Some(data) = self.organism(organism) else {
            return Vec::new();
        };

        data.reference_sequences
            .iter()
            .filter(|s| s.name == ref_seq)
            .map(|s| {
                let len = s.residues.len() as i64;
                let lo = start.clamp(0, len);
                let hi = start.saturating_add(length).clamp(lo, len);
                SequenceSlice {
                    name: s.name.clone(),
                    start: lo,
                    end: hi,
                    seq: s.residues.get(lo as usize..hi as usize).unwrap_or("").to_string(),
                }
            })
            .collect()
    }

    fn feature_rows(
        &self,
        organism: &str,
        ref_seq: &str,
        so_type: &str,
        start: i64,
        end: i64,
    ) -> Vec<Feature> {
        let Some(data) = self.organism(organism) else {
            return Vec::new();
        };

        let mut features: Vec<Feature> = data
            .features
            .iter()
            .filter(|f| f.ref_seq == ref_seq)
            .filter(|f| so_type.is_empty() || f.feature_type == so_type)
            .filter(|f| f.start < end && f.end > start)
            .map(|f| Feature {
                unique_id: f.unique_id.clone(),
                name: f.name.clone(),
                feature_type: f.feature_type.clone(),
                start: f.start,
                end: f.end,
                strand: f.strand,
                subfeatures: Vec::new(),
            })
            .collect();
        features.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.unique_id.cmp(&b.unique_id)));
        features
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn list_organisms(&self) -> Result<Vec<Organism>> {
        let mut organisms: Vec<Organism> = self
            .dataset
            .organisms
            .iter()
            .map(|o| o.organism.clone())
            .collect();
        organisms.sort_by(|a, b| a.common_name.cmp(&b.common_name));
        Ok(organisms)
    }

    async fn list_feature_types(&self, organism: &str) -> Result<Vec<FeatureTypeCategory>> {
        let types: BTreeSet<&str> = self
            .organism(organism)
            .map(|o| o.features.iter().map(|f| f.feature_type.as_str()).collect())
            .unwrap_or_default();

        Ok(types
            .into_iter()
            .map(|t| FeatureTypeCategory {
                type_name: t.to_string(),
            })
            .collect())
    }

    async fn list_reference_sequences(&self, organism: &str) -> Result<Vec<ReferenceSequenceRow>> {
        let mut rows: Vec<ReferenceSequenceRow> = self
            .organism(organism)
            .map(|o| {
                o.reference_sequences
                    .iter()
                    .map(|s| ReferenceSequenceRow {
                        name: s.name.clone(),
                        length: s.length.unwrap_or(s.residues.len() as i64),
                    })
                    .collect()
            })
            .unwrap_or_default();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn fetch_range(&self, request: &RangeFetch<'_>) -> Result<RangeQueryResult> {
        Ok(match *request {
            RangeFetch::Sequence {
                organism,
                ref_seq,
                start,
                length,
            } => RangeQueryResult::Sequence(self.sequence_rows(organism, ref_seq, start, length)),
            RangeFetch::Features {
                organism,
                ref_seq,
                so_type,
                start,
                end,
            } => {
                let rows = self.feature_rows(organism, ref_seq, so_type, start, end);
                RangeQueryResult::Features(rows)
            }
        })
    }
}
