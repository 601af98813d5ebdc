pub mod aggregator;
pub mod errors;
pub mod expr;
pub mod filter;
pub mod ops;
pub mod stage;
pub mod types;

pub use errors::*;
