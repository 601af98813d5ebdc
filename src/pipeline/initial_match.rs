use chrono::{DateTime, Utc};

use crate::doc;
use crate::engine::stage::{AggregationStage, OperatorKind};
use crate::engine::types::{Document, Value};
use crate::pipeline::selection::{MachineScope, SelectionContext};
use crate::shared::time::TimeParser;

const TIME_FIELD: &str = "$time_received";

/// Derives the system-owned `$match` that scopes a pipeline to the selection.
pub fn build_initial_match_stage(context: &SelectionContext) -> AggregationStage {
    build_initial_match_stage_at(context, Utc::now())
}

/// Same as [`build_initial_match_stage`] with an explicit clock, used when the
/// upper time bound is open.
pub fn build_initial_match_stage_at(context: &SelectionContext, now: DateTime<Utc>) -> AggregationStage {
    let range = context.date_range.clone().unwrap_or_default();
    let from = range.from.unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
    let to = range.to.unwrap_or(now);

    let mut definition = Document::new()
        .with("organization_id", context.organization_id.as_str())
        .with("location_id", context.location_id.as_str())
        .with("$expr", time_window(from, to));

    if let Some(robot) = robot_filter(context.machine_scope.as_ref()) {
        definition.insert("robot_id", robot);
    }
    if let Some(source) = context.data_source.as_deref().filter(|s| !s.is_empty()) {
        definition.insert("component_name", source);
    }

    AggregationStage::system(OperatorKind::Match.name(), definition)
}

fn robot_filter(scope: Option<&MachineScope>) -> Option<Value> {
    match scope? {
        MachineScope::SingleMachine { id } if !id.is_empty() => Some(Value::from(id.as_str())),
        MachineScope::MachineGroup { ids } if !ids.is_empty() => {
            let ids: Vec<Value> = ids.iter().map(|id| Value::from(id.as_str())).collect();
            Some(Value::Document(doc! {"$in" => ids}))
        }
        _ => None,
    }
}

fn time_window(from: DateTime<Utc>, to: DateTime<Utc>) -> Value {
    let bound = |op: &str, at: DateTime<Utc>| {
        let to_date = doc! {"$toDate" => TimeParser::to_iso_millis(&at)};
        Value::Document(doc! {op => vec![Value::from(TIME_FIELD), Value::Document(to_date)]})
    };
    Value::Document(doc! {"$and" => vec![bound("$gte", from), bound("$lte", to)]})
}
