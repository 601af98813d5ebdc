mod compare;
mod document;
mod value;

pub use compare::{compare_same_bracket, compare_values, values_equal};
pub use document::Document;
pub use value::{TypeClass, Value};

#[cfg(test)]
mod value_test;
