use serde_json::{Value as JsonValue, json};

use crate::engine::stage::{AggregationStage, StageOwner};
use crate::engine::types::Value;

pub struct StageFactory {
    operator: String,
    definition: JsonValue,
    owner: StageOwner,
}

impl StageFactory {
    pub fn new() -> Self {
        Self {
            operator: "$match".into(),
            definition: json!({}),
            owner: StageOwner::User,
        }
    }

    pub fn operator(mut self, operator: &str) -> Self {
        self.operator = operator.to_string();
        self
    }

    pub fn definition(mut self, definition: JsonValue) -> Self {
        self.definition = definition;
        self
    }

    pub fn system(mut self) -> Self {
        self.owner = StageOwner::System;
        self
    }

    pub fn create(self) -> AggregationStage {
        AggregationStage {
            operator: self.operator,
            definition: Value::from(self.definition),
            owner: self.owner,
        }
    }
}
