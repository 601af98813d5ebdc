mod global;
pub mod model;

pub use global::CONFIG;
pub use model::{EvaluatorConfig, LoggingConfig, Settings, load_settings, load_settings_from};
