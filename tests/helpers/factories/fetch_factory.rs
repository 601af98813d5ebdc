use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Semaphore;

use crate::engine::errors::FetchError;
use crate::engine::types::Document;
use crate::pipeline::RemoteFetchAdapter;

/// Recorded `fetch_tabular_data` call.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchCall {
    pub organization_id: String,
    pub pipeline: Vec<Document>,
}

/// Adapter that replays scripted responses in order, repeating the last one.
/// With a gate, each call waits for a permit before answering.
pub struct ScriptedFetch {
    responses: Mutex<Vec<Result<Vec<Document>, FetchError>>>,
    calls: Mutex<Vec<FetchCall>>,
    gate: Option<Arc<Semaphore>>,
}

impl ScriptedFetch {
    pub fn calls(&self) -> Vec<FetchCall> {
        self.calls.lock().clone()
    }

    /// Lets `n` gated calls proceed.
    pub fn release(&self, n: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(n);
        }
    }

    fn next_response(&self) -> Result<Vec<Document>, FetchError> {
        let mut responses = self.responses.lock();
        if responses.len() > 1 {
            responses.remove(0)
        } else {
            responses.first().cloned().unwrap_or(Ok(Vec::new()))
        }
    }
}

#[async_trait]
impl RemoteFetchAdapter for ScriptedFetch {
    async fn fetch_tabular_data(
        &self,
        organization_id: &str,
        pipeline: &[Document],
    ) -> Result<Vec<Document>, FetchError> {
        self.calls.lock().push(FetchCall {
            organization_id: organization_id.to_string(),
            pipeline: pipeline.to_vec(),
        });
        let response = self.next_response();
        if let Some(gate) = &self.gate {
            gate.acquire().await.map_err(|e| FetchError::Transport(e.to_string()))?.forget();
        }
        response
    }
}

pub struct FetchFactory {
    responses: Vec<Result<Vec<Document>, FetchError>>,
    gated: bool,
}

impl FetchFactory {
    pub fn new() -> Self {
        Self {
            responses: Vec::new(),
            gated: false,
        }
    }

    pub fn returning(mut self, documents: Vec<Document>) -> Self {
        self.responses.push(Ok(documents));
        self
    }

    pub fn failing(mut self, error: FetchError) -> Self {
        self.responses.push(Err(error));
        self
    }

    pub fn gated(mut self) -> Self {
        self.gated = true;
        self
    }

    pub fn create(self) -> ScriptedFetch {
        ScriptedFetch {
            responses: Mutex::new(self.responses),
            calls: Mutex::new(Vec::new()),
            gate: self.gated.then(|| Arc::new(Semaphore::new(0))),
        }
    }
}
