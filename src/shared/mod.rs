pub mod config;
pub mod hash;
pub mod time;

#[cfg(test)]
pub mod time_tests;
