use std::hash::{Hash, Hasher};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::engine::aggregator::Aggregator;
use crate::engine::errors::EvaluationError;
use crate::engine::stage::AggregationStage;
use crate::engine::types::Document;
use crate::pipeline::fetch::RemoteFetchAdapter;
use crate::pipeline::initial_match::build_initial_match_stage_at;
use crate::pipeline::model::{EditRejection, LockMode, Pipeline, StageEdit};
use crate::pipeline::selection::SelectionContext;
use crate::shared::config::CONFIG;
use crate::shared::hash::stable_hash64;

/// Result of one stage in an evaluation run.
pub type StageResult = Result<Vec<Document>, EvaluationError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EvaluationMode {
    /// Query-builder preview: every stage is capped to keep feedback fast.
    Preview { cap: usize },
    /// Card rendering: nothing is truncated implicitly.
    Production,
}

impl EvaluationMode {
    /// Preview with the configured cap.
    pub fn preview() -> Self {
        EvaluationMode::Preview {
            cap: CONFIG.evaluator.preview_cap as usize,
        }
    }

    pub fn cap(&self) -> Option<usize> {
        match self {
            EvaluationMode::Preview { cap } => Some(*cap),
            EvaluationMode::Production => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EvaluationOutcome {
    Completed(Vec<StageResult>),
    /// A newer request or an edit landed while this one was fetching; its
    /// results were dropped.
    Superseded { request_id: u64 },
}

impl EvaluationOutcome {
    pub fn results(&self) -> Option<&[StageResult]> {
        match self {
            EvaluationOutcome::Completed(results) => Some(results),
            EvaluationOutcome::Superseded { .. } => None,
        }
    }

    pub fn is_superseded(&self) -> bool {
        matches!(self, EvaluationOutcome::Superseded { .. })
    }
}

#[derive(Debug)]
struct ControllerState {
    context: Option<SelectionContext>,
    organization_id: String,
    pipeline: Pipeline,
    results: Vec<StageResult>,
    latest_request: u64,
}

impl ControllerState {
    fn request_key(&self, mode: EvaluationMode) -> u64 {
        stable_hash64(&RequestKey {
            organization_id: &self.organization_id,
            context: self.context.as_ref(),
            pipeline: &self.pipeline,
            mode,
        })
    }
}

struct RequestKey<'a> {
    organization_id: &'a str,
    context: Option<&'a SelectionContext>,
    pipeline: &'a Pipeline,
    mode: EvaluationMode,
}

impl Hash for RequestKey<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.organization_id.hash(state);
        self.context.hash(state);
        self.pipeline.hash(state);
        self.mode.hash(state);
    }
}

/// Session state of a pipeline being built: the stage list, the selection it
/// is scoped to and the per-stage results of the last completed evaluation.
///
/// The lock is never held across the remote fetch, so edits stay responsive
/// while an evaluation is in flight.
#[derive(Debug)]
pub struct PipelineController {
    state: Mutex<ControllerState>,
}

impl PipelineController {
    /// Locked pipeline whose first stage is derived from `context`.
    pub fn from_context(context: SelectionContext) -> Self {
        Self::from_context_at(context, Utc::now())
    }

    pub fn from_context_at(context: SelectionContext, now: DateTime<Utc>) -> Self {
        let initial = build_initial_match_stage_at(&context, now);
        Self::with_state(ControllerState {
            organization_id: context.organization_id.clone(),
            context: Some(context),
            pipeline: Pipeline::locked(initial),
            results: Vec::new(),
            latest_request: 0,
        })
    }

    /// Unlocked query builder with no selection context.
    pub fn freestanding(organization_id: impl Into<String>, stages: Vec<AggregationStage>) -> Self {
        Self::with_state(ControllerState {
            context: None,
            organization_id: organization_id.into(),
            pipeline: Pipeline::unlocked(stages),
            results: Vec::new(),
            latest_request: 0,
        })
    }

    fn with_state(state: ControllerState) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }

    pub fn pipeline(&self) -> Pipeline {
        self.state.lock().pipeline.clone()
    }

    pub fn results(&self) -> Vec<StageResult> {
        self.state.lock().results.clone()
    }

    pub fn context(&self) -> Option<SelectionContext> {
        self.state.lock().context.clone()
    }

    pub fn organization_id(&self) -> String {
        self.state.lock().organization_id.clone()
    }

    pub fn mode(&self) -> LockMode {
        self.state.lock().pipeline.lock()
    }

    /// Regenerates stage 0 for a new selection and invalidates in-flight
    /// evaluations. Stages after the first are kept as they are.
    pub fn recompute(&self, context: SelectionContext) -> StageEdit {
        self.recompute_at(context, Utc::now())
    }

    pub fn recompute_at(&self, context: SelectionContext, now: DateTime<Utc>) -> StageEdit {
        let mut state = self.state.lock();
        if state.pipeline.lock() != LockMode::Locked {
            debug!(target: "fleet_query::evaluator", "Ignoring recompute on an unlocked pipeline");
            return StageEdit::Rejected(EditRejection::Unlocked);
        }
        let edit = state
            .pipeline
            .replace_initial_stage(build_initial_match_stage_at(&context, now));
        state.organization_id = context.organization_id.clone();
        state.context = Some(context);
        state.latest_request += 1;
        info!(
            target: "fleet_query::evaluator",
            organization = %state.organization_id,
            "Recomputed initial stage"
        );
        edit
    }

    /// Appends an empty `$match` and returns its index.
    pub fn add_stage(&self) -> usize {
        self.state.lock().pipeline.add_stage()
    }

    pub fn update_stage(&self, index: usize, stage: AggregationStage) -> StageEdit {
        let edit = self.state.lock().pipeline.update_stage(index, stage);
        log_edit("update", index, edit);
        edit
    }

    pub fn remove_stage(&self, index: usize) -> StageEdit {
        let edit = self.state.lock().pipeline.remove_stage(index);
        log_edit("remove", index, edit);
        edit
    }

    /// Runs the pipeline: stage 0 remotely, the rest locally against the last
    /// successful document set. Results are committed only if nothing changed
    /// while the fetch was in flight.
    pub async fn evaluate(
        &self,
        fetch: &dyn RemoteFetchAdapter,
        mode: EvaluationMode,
    ) -> EvaluationOutcome {
        let (request_id, key, organization_id, stages) = {
            let mut state = self.state.lock();
            state.latest_request += 1;
            (
                state.latest_request,
                state.request_key(mode),
                state.organization_id.clone(),
                state.pipeline.stages().to_vec(),
            )
        };

        info!(
            target: "fleet_query::evaluator",
            request_id,
            stages = stages.len(),
            mode = ?mode,
            "Evaluating pipeline"
        );

        let (initial, rest) = match stages.split_first() {
            Some(split) => split,
            None => return EvaluationOutcome::Completed(Vec::new()),
        };

        let mut remote = vec![initial.to_wire()];
        if let Some(cap) = mode.cap() {
            remote.push(AggregationStage::limit(cap).to_wire());
        }

        let results = match fetch.fetch_tabular_data(&organization_id, &remote).await {
            Ok(mut documents) => {
                if let Some(cap) = mode.cap() {
                    documents.truncate(cap);
                }
                evaluate_local(documents, rest, mode)
            }
            Err(e) => vec![Err(EvaluationError::RemoteFetch(e))],
        };

        let mut state = self.state.lock();
        if state.latest_request != request_id || state.request_key(mode) != key {
            debug!(
                target: "fleet_query::evaluator",
                request_id,
                latest = state.latest_request,
                "Discarding stale evaluation"
            );
            return EvaluationOutcome::Superseded { request_id };
        }
        for (index, result) in results.iter().enumerate() {
            if let Err(e) = result {
                e.log_error(index);
            }
        }
        state.results = results.clone();
        EvaluationOutcome::Completed(results)
    }

    /// Sends the whole pipeline to the remote source in one request without
    /// any implicit cap, the way dashboard cards render.
    pub async fn fetch_card_data(
        &self,
        fetch: &dyn RemoteFetchAdapter,
    ) -> Result<Vec<Document>, EvaluationError> {
        let (organization_id, wire) = {
            let state = self.state.lock();
            (state.organization_id.clone(), state.pipeline.to_wire())
        };
        info!(
            target: "fleet_query::evaluator",
            organization = %organization_id,
            stages = wire.len(),
            "Fetching card data"
        );
        fetch
            .fetch_tabular_data(&organization_id, &wire)
            .await
            .map_err(|e| {
                let err = EvaluationError::RemoteFetch(e);
                err.log_error(0);
                err
            })
    }
}

fn evaluate_local(seed: Vec<Document>, stages: &[AggregationStage], mode: EvaluationMode) -> Vec<StageResult> {
    let engine = Aggregator::capture();
    let limit = mode.cap().map(AggregationStage::limit);

    let mut results = Vec::with_capacity(stages.len() + 1);
    let mut last_good = seed.clone();
    results.push(Ok(seed));

    for stage in stages {
        let mut sub_pipeline = vec![stage.clone()];
        sub_pipeline.extend(limit.clone());
        match engine.run_pipeline(&sub_pipeline, &last_good) {
            Ok(documents) => {
                last_good = documents.clone();
                results.push(Ok(documents));
            }
            Err(e) => results.push(Err(EvaluationError::Stage(e))),
        }
    }
    results
}

fn log_edit(action: &str, index: usize, edit: StageEdit) {
    match edit {
        StageEdit::Applied => debug!(target: "fleet_query::evaluator", action, index, "Stage edited"),
        StageEdit::Rejected(reason) => {
            debug!(target: "fleet_query::evaluator", action, index, ?reason, "Stage edit rejected")
        }
    }
}
