use chrono::{TimeZone, Utc};

use crate::pipeline::{DateRange, MachineScope, SelectionContext};

pub struct SelectionContextFactory {
    context: SelectionContext,
}

impl SelectionContextFactory {
    pub fn new() -> Self {
        let range = DateRange::between(
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap(),
        );
        Self {
            context: SelectionContext::new("org-1", "loc-1").with_date_range(range),
        }
    }

    pub fn organization(mut self, id: &str) -> Self {
        self.context.organization_id = id.to_string();
        self
    }

    pub fn location(mut self, id: &str) -> Self {
        self.context.location_id = id.to_string();
        self
    }

    pub fn machine(mut self, id: &str) -> Self {
        self.context.machine_scope = Some(MachineScope::SingleMachine { id: id.to_string() });
        self
    }

    pub fn machine_group(mut self, ids: &[&str]) -> Self {
        self.context.machine_scope = Some(MachineScope::MachineGroup {
            ids: ids.iter().map(|id| id.to_string()).collect(),
        });
        self
    }

    pub fn data_source(mut self, source: &str) -> Self {
        self.context.data_source = Some(source.to_string());
        self
    }

    pub fn date_range(mut self, range: Option<DateRange>) -> Self {
        self.context.date_range = range;
        self
    }

    pub fn create(self) -> SelectionContext {
        self.context
    }
}
