use std::fs;
use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::Parser;
use fleet_query::engine::stage::AggregationStage;
use fleet_query::engine::types::Document;
use fleet_query::logging;
use fleet_query::pipeline::{
    EvaluationMode, EvaluationOutcome, InMemorySource, PipelineController, SelectionContext,
};
use tracing::info;

/// Previews an aggregation pipeline against a local document collection.
#[derive(Debug, Parser)]
#[command(name = "fleet_query", version)]
struct Args {
    /// JSON array of telemetry documents.
    #[arg(long)]
    documents: PathBuf,

    /// JSON array of stages, either `{"operator": .., "definition": ..}` or `{"$op": ..}`.
    #[arg(long)]
    pipeline: PathBuf,

    /// Selection context JSON. When given, the first stage is derived from it.
    #[arg(long)]
    context: Option<PathBuf>,

    /// Organization to query when no context is given.
    #[arg(long, default_value = "local")]
    organization: String,

    /// Evaluate without the preview cap.
    #[arg(long)]
    production: bool,
}

fn read_json(path: &PathBuf) -> anyhow::Result<serde_json::Value> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

fn parse_stages(value: serde_json::Value) -> anyhow::Result<Vec<AggregationStage>> {
    let serde_json::Value::Array(items) = value else {
        bail!("the pipeline file must contain a JSON array");
    };
    items
        .into_iter()
        .map(|item| -> anyhow::Result<AggregationStage> {
            if item.get("operator").is_some() {
                return Ok(serde_json::from_value(item)?);
            }
            let doc = Document::from_json(item).context("pipeline stages must be objects")?;
            Ok(AggregationStage::from_wire(&doc)?)
        })
        .collect()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init()?;
    let args = Args::parse();

    let documents: Vec<Document> = serde_json::from_value(read_json(&args.documents)?)
        .context("documents must be a JSON array of objects")?;
    let stages = parse_stages(read_json(&args.pipeline)?)?;

    let controller = match &args.context {
        Some(path) => {
            let context: SelectionContext = serde_json::from_value(read_json(path)?)?;
            let controller = PipelineController::from_context(context);
            for stage in stages {
                let index = controller.add_stage();
                controller.update_stage(index, stage);
            }
            controller
        }
        None => PipelineController::freestanding(args.organization.clone(), stages),
    };

    let source = InMemorySource::new().with_collection(controller.organization_id(), documents);
    let mode = if args.production {
        EvaluationMode::Production
    } else {
        EvaluationMode::preview()
    };
    info!(target: "fleet_query::cli", ?mode, "Evaluating pipeline");

    let results = match controller.evaluate(&source, mode).await {
        EvaluationOutcome::Completed(results) => results,
        EvaluationOutcome::Superseded { request_id } => {
            bail!("evaluation {request_id} was superseded")
        }
    };

    let pipeline = controller.pipeline();
    for (stage, result) in pipeline.stages().iter().zip(results.iter()) {
        println!("== {} ==", stage.operator);
        match result {
            Ok(documents) => println!("{}", serde_json::to_string_pretty(documents)?),
            Err(e) => println!("error: {e}"),
        }
    }
    Ok(())
}
