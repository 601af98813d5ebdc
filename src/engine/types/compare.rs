use std::cmp::Ordering;

use super::value::Value;

/// Total order over values following MongoDB's cross-type ordering.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    let (class_a, class_b) = (a.type_class(), b.type_class());
    if class_a != class_b {
        return class_a.cmp(&class_b);
    }

    match (a, b) {
        (Value::Int(x), Value::Int(y)) => x.cmp(y),
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
            compare_f64(a.as_f64().unwrap_or(f64::NAN), b.as_f64().unwrap_or(f64::NAN))
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Date(x), Value::Date(y)) => x.cmp(y),
        (Value::Array(xs), Value::Array(ys)) => {
            for (x, y) in xs.iter().zip(ys.iter()) {
                let ord = compare_values(x, y);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            xs.len().cmp(&ys.len())
        }
        (Value::Document(x), Value::Document(y)) => {
            // per element: value type, then field name, then value
            for ((key_x, val_x), (key_y, val_y)) in x.iter().zip(y.iter()) {
                let ord = val_x
                    .type_class()
                    .cmp(&val_y.type_class())
                    .then_with(|| key_x.cmp(key_y))
                    .then_with(|| compare_values(val_x, val_y));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            x.len().cmp(&y.len())
        }
        _ => Ordering::Equal,
    }
}

/// NaN sorts below every other number and equals itself.
fn compare_f64(x: f64, y: f64) -> Ordering {
    match (x.is_nan(), y.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
    }
}

/// Semantic equality: `1 == 1.0`, documents compare in key order.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    compare_values(a, b) == Ordering::Equal
}

/// Comparison limited to one type bracket, as query-form comparison operators
/// require. Returns `None` when the brackets differ.
pub fn compare_same_bracket(a: &Value, b: &Value) -> Option<Ordering> {
    if a.type_class() != b.type_class() {
        return None;
    }
    Some(compare_values(a, b))
}
