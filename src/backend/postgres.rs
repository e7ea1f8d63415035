//! Chado backend over PostgreSQL.
//!
//! Organisms are addressed by `organism.common_name`. Reference sequences are
//! the features that other features are located on (`featureloc.srcfeature_id`).

use super::{Backend, RangeFetch, ReferenceSequenceRow};
use crate::{
    Error, Result,
    types::{Feature, FeatureTypeCategory, Organism, RangeQueryResult, SequenceSlice},
};
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_postgres::{Client, NoTls, Row, types::ToSql};

const ORGANISMS_QUERY: &str = "\
    SELECT organism_id::bigint AS organism_id, \
           COALESCE(abbreviation, '') AS abbreviation, \
           genus, species, \
           COALESCE(common_name, '') AS common_name \
    FROM organism \
    ORDER BY common_name";

const FEATURE_TYPES_QUERY: &str = "\
    SELECT DISTINCT cvterm.name AS so_type \
    FROM feature \
    JOIN organism ON organism.organism_id = feature.organism_id \
    JOIN cvterm ON cvterm.cvterm_id = feature.type_id \
    WHERE organism.common_name = $1 \
    ORDER BY so_type";

const REFERENCE_SEQUENCES_QUERY: &str = "\
    SELECT src.uniquename AS name, COALESCE(src.seqlen, 0)::bigint AS length \
    FROM feature src \
    JOIN organism ON organism.organism_id = src.organism_id \
    WHERE organism.common_name = $1 \
      AND EXISTS (SELECT 1 FROM featureloc fl WHERE fl.srcfeature_id = src.feature_id) \
    ORDER BY src.uniquename";

// substr() is 1-based and takes a length
const SEQUENCE_QUERY: &str = "\
    SELECT f.uniquename AS name, \
           COALESCE(substr(f.residues, $3::integer + 1, $4::integer), '') AS seq \
    FROM feature f \
    JOIN organism ON organism.organism_id = f.organism_id \
    WHERE organism.common_name = $1 AND f.uniquename = $2";

const FEATURES_QUERY: &str = "\
    SELECT f.uniquename AS unique_id, f.name, cvterm.name AS feature_type, \
           fl.fmin::bigint AS fmin, fl.fmax::bigint AS fmax, fl.strand::integer AS strand \
    FROM feature f \
    JOIN featureloc fl ON fl.feature_id = f.feature_id \
    JOIN feature src ON src.feature_id = fl.srcfeature_id \
    JOIN organism ON organism.organism_id = f.organism_id \
    JOIN cvterm ON cvterm.cvterm_id = f.type_id \
    WHERE organism.common_name = $1 \
      AND src.uniquename = $2 \
      AND ($3::text = '' OR cvterm.name = $3::text) \
      AND fl.fmin < $5::bigint AND fl.fmax > $4::bigint \
    ORDER BY fl.fmin, f.uniquename";

/// Backend sharing one client across requests; their queries are pipelined
/// over its connection. A closed connection is replaced on the next query.
pub struct PostgresBackend {
    database_url: String,
    client: Reconnecting<Client>,
}

impl PostgresBackend {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let client = open(database_url).await?;
        Ok(Self {
            database_url: database_url.to_string(),
            client: Reconnecting::new(client),
        })
    }

    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> Result<Vec<Row>> {
        let client = self.client.get(|| open(&self.database_url)).await?;
        client.query(sql, params).await.map_err(backend_error)
    }
}

async fn open(database_url: &str) -> Result<Client> {
    let (client, connection) = tokio_postgres::connect(database_url, NoTls)
        .await
        .map_err(backend_error)?;

    tokio::spawn(async move {
        if let Err(e) = connection.await {
            tracing::error!(error = %e, "postgres connection closed");
        }
    });

    Ok(client)
}

trait Liveness {
    fn is_closed(&self) -> bool;
}

impl Liveness for Client {
    fn is_closed(&self) -> bool {
        Client::is_closed(self)
    }
}

/// Connection slot that is rebuilt once the held connection reports closed.
struct Reconnecting<T> {
    current: RwLock<Arc<T>>,
}

impl<T: Liveness> Reconnecting<T> {
    fn new(initial: T) -> Self {
        Self {
            current: RwLock::new(Arc::new(initial)),
        }
    }

    async fn get<F, Fut>(&self, connect: F) -> Result<Arc<T>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let current = self.current.read().await.clone();
        if !current.is_closed() {
            return Ok(current);
        }

        let mut slot = self.current.write().await;
        // another request may have reconnected while we waited
        if !slot.is_closed() {
            return Ok(slot.clone());
        }

        tracing::warn!("postgres connection lost, reconnecting");
        let fresh = Arc::new(connect().await?);
        *slot = fresh.clone();
        Ok(fresh)
    }
}

fn backend_error(e: tokio_postgres::Error) -> Error {
    Error::BackendUnavailable(e.to_string())
}

/// Clamps a coordinate into the `integer` domain `substr()` accepts.
fn to_sql_int(value: i64) -> i32 {
    value.clamp(-(i32::MAX as i64), i32::MAX as i64 - 1) as i32
}

fn organism_from_row(row: &Row) -> Result<Organism> {
    Ok(Organism {
        organism_id: row.try_get("organism_id").map_err(backend_error)?,
        abbreviation: row.try_get("abbreviation").map_err(backend_error)?,
        genus: row.try_get("genus").map_err(backend_error)?,
        species: row.try_get("species").map_err(backend_error)?,
        common_name: row.try_get("common_name").map_err(backend_error)?,
    })
}

fn feature_from_row(row: &Row) -> Result<Feature> {
    Ok(Feature {
        unique_id: row.try_get("unique_id").map_err(backend_error)?,
        name: row.try_get("name").map_err(backend_error)?,
        feature_type: row.try_get("feature_type").map_err(backend_error)?,
        start: row.try_get("fmin").map_err(backend_error)?,
        end: row.try_get("fmax").map_err(backend_error)?,
        strand: row.try_get("strand").map_err(backend_error)?,
        subfeatures: Vec::new(),
    })
}

#[async_trait]
impl Backend for PostgresBackend {
    async fn list_organisms(&self) -> Result<Vec<Organism>> {
        self.query(ORGANISMS_QUERY, &[])
            .await?
            .iter()
            .map(organism_from_row)
            .collect()
    }

    async fn list_feature_types(&self, organism: &str) -> Result<Vec<FeatureTypeCategory>> {
        self.query(FEATURE_TYPES_QUERY, &[&organism])
            .await?
            .iter()
            .map(|row| {
                Ok(FeatureTypeCategory {
                    type_name: row.try_get("so_type").map_err(backend_error)?,
                })
            })
            .collect()
    }

    async fn list_reference_sequences(&self, organism: &str) -> Result<Vec<ReferenceSequenceRow>> {
        self.query(REFERENCE_SEQUENCES_QUERY, &[&organism])
            .await?
            .iter()
            .map(|row| {
                Ok(ReferenceSequenceRow {
                    name: row.try_get("name").map_err(backend_error)?,
                    length: row.try_get("length").map_err(backend_error)?,
                })
            })
            .collect()
    }

    async fn fetch_range(&self, request: &RangeFetch<'_>) -> Result<RangeQueryResult> {
        match *request {
            RangeFetch::Sequence {
                organism,
                ref_seq,
                start,
                length,
            } => {
                let start = to_sql_int(start);
                let length = to_sql_int(length.max(0));
                let slices = self
                    .query(SEQUENCE_QUERY, &[&organism, &ref_seq, &start, &length])
                    .await?
                    .iter()
                    .map(|row| {
                        let seq: String = row.try_get("seq").map_err(backend_error)?;
                        Ok(SequenceSlice {
                            name: row.try_get("name").map_err(backend_error)?,
                            start: start as i64,
                            end: start as i64 + seq.len() as i64,
                            seq,
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(RangeQueryResult::Sequence(slices))
            }
            RangeFetch::Features {
                organism,
                ref_seq,
                so_type,
                start,
                end,
            } => {
                let features = self
                    .query(FEATURES_QUERY, &[&organism, &ref_seq, &so_type, &start, &end])
                    .await?
                    .iter()
                    .map(feature_from_row)
                    .collect::<Result<Vec<_>>>()?;
                Ok(RangeQueryResult::Features(features))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[test]
    fn test_to_sql_int_clamps() {
        assert_eq!(to_sql_int(1500), 1500);
        assert_eq!(to_sql_int(i64::MAX), i32::MAX - 1);
        assert_eq!(to_sql_int(i64::MIN), -i32::MAX);
    }

    struct FakeConnection {
        id: u32,
        closed: AtomicBool,
    }

    impl FakeConnection {
        fn new(id: u32) -> Self {
            Self {
                id,
                closed: AtomicBool::new(false),
            }
        }
    }

    impl Liveness for FakeConnection {
        fn is_closed(&self) -> bool {
            self.closed.load(Ordering::SeqCst)
        }
    }

    #[tokio::test]
    async fn test_open_connection_is_reused() {
        let slot = Reconnecting::new(FakeConnection::new(1));
        let conn = slot
            .get(|| async { Err(Error::Internal("reconnected while open".into())) })
            .await
            .unwrap();
        assert_eq!(conn.id, 1);
    }

    #[tokio::test]
    async fn test_closed_connection_is_replaced() {
        let slot = Reconnecting::new(FakeConnection::new(1));
        let first = slot.get(|| async { Ok(FakeConnection::new(99)) }).await.unwrap();
        first.closed.store(true, Ordering::SeqCst);

        let second = slot.get(|| async { Ok(FakeConnection::new(2)) }).await.unwrap();
        assert_eq!(second.id, 2);

        let third = slot
            .get(|| async { Err(Error::Internal("reconnected while open".into())) })
            .await
            .unwrap();
        assert_eq!(third.id, 2);
    }

    #[tokio::test]
    async fn test_failed_reconnect_is_retried() {
        let slot = Reconnecting::new(FakeConnection::new(1));
        slot.get(|| async { Ok(FakeConnection::new(99)) })
            .await
            .unwrap()
            .closed
            .store(true, Ordering::SeqCst);

        let failed = slot
            .get(|| async { Err(Error::BackendUnavailable("connection refused".into())) })
            .await;
        assert!(matches!(failed, Err(Error::BackendUnavailable(_))));

        let conn = slot.get(|| async { Ok(FakeConnection::new(3)) }).await.unwrap();
        assert_eq!(conn.id, 3);
    }

    #[test]
    fn test_queries_take_expected_params() {
        assert!(SEQUENCE_QUERY.contains("$4"));
        assert!(FEATURES_QUERY.contains("$5"));
        assert!(!FEATURES_QUERY.contains("$6"));
    }
}
