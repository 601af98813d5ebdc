use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which machines a query is scoped to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MachineScope {
    SingleMachine { id: String },
    MachineGroup { ids: Vec<String> },
}

/// Inclusive time window. Missing bounds fall back to the epoch and "now".
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    #[serde(default)]
    pub from: Option<DateTime<Utc>>,
    #[serde(default)]
    pub to: Option<DateTime<Utc>>,
}

impl DateRange {
    pub fn between(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
        }
    }
}

/// What the user picked in the surrounding configuration form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SelectionContext {
    pub organization_id: String,
    pub location_id: String,
    #[serde(default)]
    pub machine_scope: Option<MachineScope>,
    #[serde(default)]
    pub date_range: Option<DateRange>,
    #[serde(default)]
    pub data_source: Option<String>,
}

impl SelectionContext {
    pub fn new(organization_id: impl Into<String>, location_id: impl Into<String>) -> Self {
        Self {
            organization_id: organization_id.into(),
            location_id: location_id.into(),
            machine_scope: None,
            date_range: None,
            data_source: None,
        }
    }

    pub fn with_machine(mut self, id: impl Into<String>) -> Self {
        self.machine_scope = Some(MachineScope::SingleMachine { id: id.into() });
        self
    }

    pub fn with_machine_group<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.machine_scope = Some(MachineScope::MachineGroup {
            ids: ids.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn with_date_range(mut self, range: DateRange) -> Self {
        self.date_range = Some(range);
        self
    }

    pub fn with_data_source(mut self, source: impl Into<String>) -> Self {
        self.data_source = Some(source.into());
        self
    }
}
