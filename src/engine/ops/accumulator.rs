use std::cmp::Ordering;

use rustc_hash::FxHashSet;

use crate::engine::errors::StageError;
use crate::engine::expr::{EvalContext, Expr};
use crate::engine::types::{Document, Value, compare_values};

const GROUP: &str = "$group";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccumulatorOp {
    Sum,
    Avg,
    Min,
    Max,
    First,
    Last,
    Push,
    AddToSet,
    Count,
}

impl AccumulatorOp {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "$sum" => Some(AccumulatorOp::Sum),
            "$avg" => Some(AccumulatorOp::Avg),
            "$min" => Some(AccumulatorOp::Min),
            "$max" => Some(AccumulatorOp::Max),
            "$first" => Some(AccumulatorOp::First),
            "$last" => Some(AccumulatorOp::Last),
            "$push" => Some(AccumulatorOp::Push),
            "$addToSet" => Some(AccumulatorOp::AddToSet),
            "$count" => Some(AccumulatorOp::Count),
            _ => None,
        }
    }
}

/// One `field: {$op: <expression>}` entry of a `$group` stage.
#[derive(Debug, Clone, PartialEq)]
pub struct AccumulatorSpec {
    pub field: String,
    pub op: AccumulatorOp,
    pub expr: Expr,
}

impl AccumulatorSpec {
    pub fn parse(field: &str, definition: &Value) -> Result<Self, StageError> {
        let doc = match definition {
            Value::Document(doc) if doc.len() == 1 => doc,
            _ => {
                return Err(StageError::invalid(
                    GROUP,
                    format!("the field '{field}' must be an accumulator object"),
                ));
            }
        };
        let Some((name, arg)) = doc.iter().next() else {
            return Err(StageError::invalid(GROUP, format!("'{field}' has no accumulator")));
        };
        let op = AccumulatorOp::from_name(name).ok_or_else(|| {
            StageError::invalid(GROUP, format!("unknown group operator '{name}'"))
        })?;
        let expr = match op {
            AccumulatorOp::Count => match arg {
                Value::Document(d) if d.is_empty() => Expr::Literal(Value::Int(1)),
                _ => {
                    return Err(StageError::invalid(
                        GROUP,
                        "$count takes an empty document argument",
                    ));
                }
            },
            _ => Expr::parse(arg).map_err(|e| e.within(GROUP))?,
        };
        Ok(Self {
            field: field.to_string(),
            op,
            expr,
        })
    }

    pub fn new_state(&self) -> AccumulatorImpl {
        AccumulatorImpl::from_op(self.op)
    }
}

/// Running state of one accumulator for one group.
#[derive(Debug, Clone, PartialEq)]
pub enum AccumulatorImpl {
    Sum(Sum),
    Avg(Avg),
    Min(Extreme),
    Max(Extreme),
    First(Option<Value>),
    Last(Option<Value>),
    Push(Vec<Value>),
    AddToSet(AddToSet),
}

impl AccumulatorImpl {
    pub fn from_op(op: AccumulatorOp) -> Self {
        match op {
            AccumulatorOp::Sum | AccumulatorOp::Count => Self::Sum(Sum::new()),
            AccumulatorOp::Avg => Self::Avg(Avg::new()),
            AccumulatorOp::Min => Self::Min(Extreme::new(Ordering::Less)),
            AccumulatorOp::Max => Self::Max(Extreme::new(Ordering::Greater)),
            AccumulatorOp::First => Self::First(None),
            AccumulatorOp::Last => Self::Last(None),
            AccumulatorOp::Push => Self::Push(Vec::new()),
            AccumulatorOp::AddToSet => Self::AddToSet(AddToSet::default()),
        }
    }

    pub fn update(
        &mut self,
        expr: &Expr,
        doc: &Document,
        ctx: &EvalContext,
    ) -> Result<(), StageError> {
        let value = expr.evaluate(doc, ctx).map_err(|e| e.within(GROUP))?;
        match self {
            AccumulatorImpl::Sum(a) => {
                // $sum over an array operand adds up its numeric elements
                match value {
                    Some(Value::Array(items)) => items.iter().for_each(|v| a.update(v)),
                    Some(v) => a.update(&v),
                    None => {}
                }
            }
            AccumulatorImpl::Avg(a) => {
                if let Some(v) = value {
                    a.update(&v);
                }
            }
            AccumulatorImpl::Min(a) | AccumulatorImpl::Max(a) => {
                if let Some(v) = value {
                    a.update(v);
                }
            }
            AccumulatorImpl::First(slot) => {
                if slot.is_none() {
                    *slot = Some(value.unwrap_or(Value::Null));
                }
            }
            AccumulatorImpl::Last(slot) => *slot = Some(value.unwrap_or(Value::Null)),
            AccumulatorImpl::Push(items) => {
                if let Some(v) = value {
                    items.push(v);
                }
            }
            AccumulatorImpl::AddToSet(a) => {
                if let Some(v) = value {
                    a.update(v);
                }
            }
        }
        Ok(())
    }

    pub fn finalize(self) -> Value {
        match self {
            AccumulatorImpl::Sum(a) => a.finalize(),
            AccumulatorImpl::Avg(a) => a.finalize(),
            AccumulatorImpl::Min(a) | AccumulatorImpl::Max(a) => a.finalize(),
            AccumulatorImpl::First(v) | AccumulatorImpl::Last(v) => v.unwrap_or(Value::Null),
            AccumulatorImpl::Push(items) => Value::Array(items),
            AccumulatorImpl::AddToSet(a) => Value::Array(a.items),
        }
    }
}

/// Integer sum that widens to a float on overflow or on the first float input.
#[derive(Debug, Clone, PartialEq)]
pub enum Sum {
    Int(i64),
    Float(f64),
}

impl Sum {
    pub fn new() -> Self {
        Sum::Int(0)
    }

    pub fn update(&mut self, value: &Value) {
        *self = match (&*self, value) {
            (Sum::Int(acc), Value::Int(n)) => match acc.checked_add(*n) {
                Some(total) => Sum::Int(total),
                None => Sum::Float(*acc as f64 + *n as f64),
            },
            (Sum::Int(acc), Value::Float(f)) => Sum::Float(*acc as f64 + f),
            (Sum::Float(acc), Value::Int(n)) => Sum::Float(acc + *n as f64),
            (Sum::Float(acc), Value::Float(f)) => Sum::Float(acc + f),
            _ => return,
        };
    }

    pub fn finalize(self) -> Value {
        match self {
            Sum::Int(n) => Value::Int(n),
            Sum::Float(f) => Value::Float(f),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Avg {
    sum: f64,
    count: u64,
}

impl Avg {
    pub fn new() -> Self {
        Self { sum: 0.0, count: 0 }
    }

    pub fn update(&mut self, value: &Value) {
        if let Some(n) = value.as_f64() {
            self.sum += n;
            self.count += 1;
        }
    }

    pub fn finalize(self) -> Value {
        if self.count == 0 {
            Value::Null
        } else {
            Value::Float(self.sum / self.count as f64)
        }
    }
}

/// Shared state of `$min` and `$max`: keeps the value whose ordering against
/// the current best equals `keep`. Nulls are ignored.
#[derive(Debug, Clone, PartialEq)]
pub struct Extreme {
    keep: Ordering,
    best: Option<Value>,
}

impl Extreme {
    pub fn new(keep: Ordering) -> Self {
        Self { keep, best: None }
    }

    pub fn update(&mut self, value: Value) {
        if value.is_null() {
            return;
        }
        let replace = match &self.best {
            None => true,
            Some(best) => compare_values(&value, best) == self.keep,
        };
        if replace {
            self.best = Some(value);
        }
    }

    pub fn finalize(self) -> Value {
        self.best.unwrap_or(Value::Null)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AddToSet {
    seen: FxHashSet<String>,
    items: Vec<Value>,
}

impl AddToSet {
    pub fn update(&mut self, value: Value) {
        if self.seen.insert(value.canonical_key()) {
            self.items.push(value);
        }
    }
}
