use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::engine::aggregator::Aggregator;
use crate::engine::errors::FetchError;
use crate::engine::stage::AggregationStage;
use crate::engine::types::Document;

/// Source of the initially filtered document set. Each wire stage is a
/// single-key document `{operator: definition}`.
///
/// Implementations resolve to an empty vector when nothing matches and fail
/// on transport or authorization problems.
#[async_trait]
pub trait RemoteFetchAdapter: Send + Sync {
    async fn fetch_tabular_data(
        &self,
        organization_id: &str,
        pipeline: &[Document],
    ) -> Result<Vec<Document>, FetchError>;
}

/// Adapter over per-organization collections held in memory. Pipelines are
/// run through the local engine, the way the remote endpoint would run them.
#[derive(Debug, Default)]
pub struct InMemorySource {
    collections: RwLock<HashMap<String, Vec<Document>>>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_collection(self, organization_id: impl Into<String>, documents: Vec<Document>) -> Self {
        self.insert_collection(organization_id, documents);
        self
    }

    pub fn insert_collection(&self, organization_id: impl Into<String>, documents: Vec<Document>) {
        self.collections.write().insert(organization_id.into(), documents);
    }

    pub fn organizations(&self) -> Vec<String> {
        let mut names: Vec<String> = self.collections.read().keys().cloned().collect();
        names.sort();
        names
    }
}

#[async_trait]
impl RemoteFetchAdapter for InMemorySource {
    async fn fetch_tabular_data(
        &self,
        organization_id: &str,
        pipeline: &[Document],
    ) -> Result<Vec<Document>, FetchError> {
        let stages = pipeline
            .iter()
            .map(AggregationStage::from_wire)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| FetchError::Server(e.to_string()))?;

        let documents = {
            let collections = self.collections.read();
            collections
                .get(organization_id)
                .cloned()
                .ok_or_else(|| FetchError::Unauthorized(organization_id.to_string()))?
        };

        let result = Aggregator::capture()
            .run_pipeline(&stages, &documents)
            .map_err(|e| {
                warn!(target: "fleet_query::fetch", organization = organization_id, "Query rejected: {}", e);
                FetchError::Server(e.to_string())
            })?;
        debug!(
            target: "fleet_query::fetch",
            organization = organization_id,
            stages = stages.len(),
            rows = result.len(),
            "Served tabular query"
        );
        Ok(result)
    }
}
