use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{Value as JsonValue, json};

use crate::engine::types::{Document, Value};

const TEMPERATURE_SEED: u64 = 0x5eed;

/// Builds telemetry rows shaped like the tabular data endpoint returns them.
pub struct TelemetryFactory {
    fields: Document,
}

impl TelemetryFactory {
    pub fn new() -> Self {
        let fields = Document::new()
            .with("organization_id", "org-1")
            .with("location_id", "loc-1")
            .with("robot_id", "robot-1")
            .with("component_name", "sensor-1")
            .with("time_received", Self::base_time())
            .with("data", Value::from(json!({ "readings": { "temp": 21.5 } })));
        Self { fields }
    }

    pub fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap()
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.set_path(key, value.into());
        self
    }

    pub fn with_json(self, key: &str, value: JsonValue) -> Self {
        self.with(key, Value::from(value))
    }

    pub fn without(mut self, key: &str) -> Self {
        self.fields.remove_path(key);
        self
    }

    pub fn create(self) -> Document {
        self.fields
    }

    /// Rows one minute apart with an `index` field and a pseudo-random
    /// temperature. The generator is seeded so every run sees the same rows.
    pub fn create_list(self, count: usize) -> Vec<Document> {
        let mut rng = StdRng::seed_from_u64(TEMPERATURE_SEED);
        let start = self
            .fields
            .get("time_received")
            .and_then(Value::as_date)
            .unwrap_or_else(Self::base_time);
        (0..count)
            .map(|i| {
                let mut doc = self.fields.clone();
                doc.insert("index", i as i64);
                doc.insert("time_received", start + Duration::minutes(i as i64));
                doc.set_path("data.readings.temp", Value::Float(rng.gen_range(15.0..30.0)));
                doc
            })
            .collect()
    }
}
