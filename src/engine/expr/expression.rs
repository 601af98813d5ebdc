use std::cmp::Ordering;

use chrono::{DateTime, Utc};

use crate::engine::errors::StageError;
use crate::engine::expr::EvalContext;
use crate::engine::types::{Document, Value, compare_values, values_equal};
use crate::shared::time::TimeParser;

const EXPRESSION: &str = "expression";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl CompareOp {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "$eq" => Some(CompareOp::Eq),
            "$ne" => Some(CompareOp::Ne),
            "$gt" => Some(CompareOp::Gt),
            "$gte" => Some(CompareOp::Gte),
            "$lt" => Some(CompareOp::Lt),
            "$lte" => Some(CompareOp::Lte),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            CompareOp::Eq => "$eq",
            CompareOp::Ne => "$ne",
            CompareOp::Gt => "$gt",
            CompareOp::Gte => "$gte",
            CompareOp::Lt => "$lt",
            CompareOp::Lte => "$lte",
        }
    }

    pub fn test(&self, ordering: Ordering) -> bool {
        match self {
            CompareOp::Eq => ordering == Ordering::Equal,
            CompareOp::Ne => ordering != Ordering::Equal,
            CompareOp::Gt => ordering == Ordering::Greater,
            CompareOp::Gte => ordering != Ordering::Less,
            CompareOp::Lt => ordering == Ordering::Less,
            CompareOp::Lte => ordering != Ordering::Greater,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArithmeticOp {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl ArithmeticOp {
    pub fn name(&self) -> &'static str {
        match self {
            ArithmeticOp::Add => "$add",
            ArithmeticOp::Subtract => "$subtract",
            ArithmeticOp::Multiply => "$multiply",
            ArithmeticOp::Divide => "$divide",
        }
    }
}

/// Aggregation expression as used by `$expr`, `$project`, `$group` and `$addFields`.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    Field(String),
    Now,
    Root,
    Object(Vec<(String, Expr)>),
    Array(Vec<Expr>),
    Compare(CompareOp, Box<Expr>, Box<Expr>),
    Cmp(Box<Expr>, Box<Expr>),
    And(Vec<Expr>),
    Or(Vec<Expr>),
    Not(Box<Expr>),
    In(Box<Expr>, Box<Expr>),
    Arithmetic(ArithmeticOp, Vec<Expr>),
    ToDate(Box<Expr>),
    ToString(Box<Expr>),
    Concat(Vec<Expr>),
    Cond {
        condition: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
    IfNull(Vec<Expr>),
    Size(Box<Expr>),
}

impl Expr {
    pub fn parse(value: &Value) -> Result<Expr, StageError> {
        match value {
            Value::String(s) if s.starts_with("$$") => match &s[2..] {
                "NOW" => Ok(Expr::Now),
                "ROOT" | "CURRENT" => Ok(Expr::Root),
                other => Err(StageError::invalid(
                    EXPRESSION,
                    format!("unknown variable $${other}"),
                )),
            },
            Value::String(s) if s.starts_with('$') => {
                let path = &s[1..];
                if path.is_empty() || path.split('.').any(str::is_empty) {
                    return Err(StageError::invalid(
                        EXPRESSION,
                        format!("invalid field path '{s}'"),
                    ));
                }
                Ok(Expr::Field(path.to_string()))
            }
            Value::Array(items) => Ok(Expr::Array(
                items.iter().map(Expr::parse).collect::<Result<_, _>>()?,
            )),
            Value::Document(doc) => Self::parse_document(doc),
            other => Ok(Expr::Literal(other.clone())),
        }
    }

    fn parse_document(doc: &Document) -> Result<Expr, StageError> {
        let operator_keys = doc.keys().filter(|k| k.starts_with('$')).count();
        if operator_keys == 0 {
            let fields = doc
                .iter()
                .map(|(key, value)| Ok((key.clone(), Expr::parse(value)?)))
                .collect::<Result<Vec<_>, StageError>>()?;
            return Ok(Expr::Object(fields));
        }
        match doc.iter().next() {
            Some((name, arg)) if doc.len() == 1 => Self::parse_operator(name, arg),
            _ => Err(StageError::invalid(
                EXPRESSION,
                "an expression object must contain exactly one $-operator",
            )),
        }
    }

    fn parse_operator(name: &str, arg: &Value) -> Result<Expr, StageError> {
        if let Some(op) = CompareOp::from_name(name) {
            let [lhs, rhs] = Self::pair(name, arg)?;
            return Ok(Expr::Compare(op, Box::new(lhs), Box::new(rhs)));
        }
        match name {
            "$literal" => Ok(Expr::Literal(arg.clone())),
            "$cmp" => {
                let [lhs, rhs] = Self::pair(name, arg)?;
                Ok(Expr::Cmp(Box::new(lhs), Box::new(rhs)))
            }
            "$and" => Ok(Expr::And(Self::list(arg)?)),
            "$or" => Ok(Expr::Or(Self::list(arg)?)),
            "$not" => Ok(Expr::Not(Box::new(Self::single(name, arg)?))),
            "$in" => {
                let [needle, haystack] = Self::pair(name, arg)?;
                Ok(Expr::In(Box::new(needle), Box::new(haystack)))
            }
            "$add" => Ok(Expr::Arithmetic(ArithmeticOp::Add, Self::list(arg)?)),
            "$multiply" => Ok(Expr::Arithmetic(ArithmeticOp::Multiply, Self::list(arg)?)),
            "$subtract" => Ok(Expr::Arithmetic(
                ArithmeticOp::Subtract,
                Self::pair(name, arg)?.into(),
            )),
            "$divide" => Ok(Expr::Arithmetic(
                ArithmeticOp::Divide,
                Self::pair(name, arg)?.into(),
            )),
            "$toDate" => Ok(Expr::ToDate(Box::new(Self::single(name, arg)?))),
            "$toString" => Ok(Expr::ToString(Box::new(Self::single(name, arg)?))),
            "$size" => Ok(Expr::Size(Box::new(Self::single(name, arg)?))),
            "$concat" => Ok(Expr::Concat(Self::list(arg)?)),
            "$ifNull" => {
                let args = Self::list(arg)?;
                if args.len() < 2 {
                    return Err(StageError::invalid(name, "needs at least 2 arguments"));
                }
                Ok(Expr::IfNull(args))
            }
            "$cond" => Self::parse_cond(arg),
            other => Err(StageError::invalid(
                EXPRESSION,
                format!("unsupported expression operator {other}"),
            )),
        }
    }

    fn parse_cond(arg: &Value) -> Result<Expr, StageError> {
        let (condition, then, otherwise) = match arg {
            Value::Array(items) if items.len() == 3 => (&items[0], &items[1], &items[2]),
            Value::Document(doc) => match (doc.get("if"), doc.get("then"), doc.get("else")) {
                (Some(c), Some(t), Some(e)) if doc.len() == 3 => (c, t, e),
                _ => {
                    return Err(StageError::invalid(
                        "$cond",
                        "expects exactly the keys if, then and else",
                    ));
                }
            },
            _ => return Err(StageError::invalid("$cond", "needs 3 arguments")),
        };
        Ok(Expr::Cond {
            condition: Box::new(Expr::parse(condition)?),
            then: Box::new(Expr::parse(then)?),
            otherwise: Box::new(Expr::parse(otherwise)?),
        })
    }

    fn list(arg: &Value) -> Result<Vec<Expr>, StageError> {
        match arg {
            Value::Array(items) => items.iter().map(Expr::parse).collect(),
            other => Ok(vec![Expr::parse(other)?]),
        }
    }

    fn single(name: &str, arg: &Value) -> Result<Expr, StageError> {
        match arg {
            Value::Array(items) if items.len() == 1 => Expr::parse(&items[0]),
            Value::Array(items) => Err(StageError::invalid(
                name,
                format!("takes exactly 1 argument, {} were passed in", items.len()),
            )),
            other => Expr::parse(other),
        }
    }

    fn pair(name: &str, arg: &Value) -> Result<[Expr; 2], StageError> {
        match arg {
            Value::Array(items) if items.len() == 2 => {
                Ok([Expr::parse(&items[0])?, Expr::parse(&items[1])?])
            }
            Value::Array(items) => Err(StageError::invalid(
                name,
                format!("takes exactly 2 arguments, {} were passed in", items.len()),
            )),
            _ => Err(StageError::invalid(name, "takes exactly 2 arguments")),
        }
    }

    /// Evaluates against one document. `None` means the result is missing
    /// (an absent field), which callers may treat differently from null.
    pub fn evaluate(&self, doc: &Document, ctx: &EvalContext) -> Result<Option<Value>, StageError> {
        let value = match self {
            Expr::Literal(value) => value.clone(),
            Expr::Field(path) => return Ok(doc.get_path(path)),
            Expr::Now => Value::Date(ctx.now()),
            Expr::Root => Value::Document(doc.clone()),
            Expr::Object(fields) => {
                let mut out = Document::with_capacity(fields.len());
                for (key, expr) in fields {
                    if let Some(value) = expr.evaluate(doc, ctx)? {
                        out.insert(key.clone(), value);
                    }
                }
                Value::Document(out)
            }
            Expr::Array(items) => Value::Array(
                items
                    .iter()
                    .map(|item| item.evaluate_value(doc, ctx))
                    .collect::<Result<_, _>>()?,
            ),
            Expr::Compare(op, lhs, rhs) => {
                let lhs = lhs.evaluate_value(doc, ctx)?;
                let rhs = rhs.evaluate_value(doc, ctx)?;
                Value::Bool(op.test(compare_values(&lhs, &rhs)))
            }
            Expr::Cmp(lhs, rhs) => {
                let lhs = lhs.evaluate_value(doc, ctx)?;
                let rhs = rhs.evaluate_value(doc, ctx)?;
                Value::Int(match compare_values(&lhs, &rhs) {
                    Ordering::Less => -1,
                    Ordering::Equal => 0,
                    Ordering::Greater => 1,
                })
            }
            Expr::And(items) => {
                for item in items {
                    if !item.evaluate_value(doc, ctx)?.is_truthy() {
                        return Ok(Some(Value::Bool(false)));
                    }
                }
                Value::Bool(true)
            }
            Expr::Or(items) => {
                for item in items {
                    if item.evaluate_value(doc, ctx)?.is_truthy() {
                        return Ok(Some(Value::Bool(true)));
                    }
                }
                Value::Bool(false)
            }
            Expr::Not(inner) => Value::Bool(!inner.evaluate_value(doc, ctx)?.is_truthy()),
            Expr::In(needle, haystack) => {
                let needle = needle.evaluate_value(doc, ctx)?;
                match haystack.evaluate_value(doc, ctx)? {
                    Value::Array(items) => {
                        Value::Bool(items.iter().any(|item| values_equal(item, &needle)))
                    }
                    other => {
                        return Err(StageError::expression(
                            "$in",
                            format!("requires an array as a second argument, found: {}", other.type_class()),
                        ));
                    }
                }
            }
            Expr::Arithmetic(op, args) => {
                let values = args
                    .iter()
                    .map(|arg| arg.evaluate_value(doc, ctx))
                    .collect::<Result<Vec<_>, _>>()?;
                arithmetic(*op, values)?
            }
            Expr::ToDate(inner) => to_date(inner.evaluate_value(doc, ctx)?)?,
            Expr::ToString(inner) => to_string(inner.evaluate_value(doc, ctx)?)?,
            Expr::Concat(items) => {
                let mut out = String::new();
                for item in items {
                    match item.evaluate_value(doc, ctx)? {
                        Value::Null => return Ok(Some(Value::Null)),
                        Value::String(s) => out.push_str(&s),
                        other => {
                            return Err(StageError::expression(
                                "$concat",
                                format!("only supports strings, not {}", other.type_class()),
                            ));
                        }
                    }
                }
                Value::String(out)
            }
            Expr::Cond {
                condition,
                then,
                otherwise,
            } => {
                let branch = if condition.evaluate_value(doc, ctx)?.is_truthy() {
                    then
                } else {
                    otherwise
                };
                return branch.evaluate(doc, ctx);
            }
            Expr::IfNull(items) => {
                let (last, candidates) = match items.split_last() {
                    Some(split) => split,
                    None => return Ok(Some(Value::Null)),
                };
                for candidate in candidates {
                    match candidate.evaluate(doc, ctx)? {
                        Some(value) if !value.is_null() => return Ok(Some(value)),
                        _ => {}
                    }
                }
                return last.evaluate(doc, ctx);
            }
            Expr::Size(inner) => match inner.evaluate_value(doc, ctx)? {
                Value::Array(items) => Value::Int(items.len() as i64),
                other => {
                    return Err(StageError::expression(
                        "$size",
                        format!("the argument must be an array, found: {}", other.type_class()),
                    ));
                }
            },
        };
        Ok(Some(value))
    }

    /// Like [`Expr::evaluate`] but with missing collapsed to null.
    pub fn evaluate_value(&self, doc: &Document, ctx: &EvalContext) -> Result<Value, StageError> {
        Ok(self.evaluate(doc, ctx)?.unwrap_or(Value::Null))
    }
}

fn arithmetic(op: ArithmeticOp, values: Vec<Value>) -> Result<Value, StageError> {
    if values.iter().any(Value::is_null) {
        return Ok(Value::Null);
    }
    match op {
        ArithmeticOp::Add => add(values),
        ArithmeticOp::Multiply => multiply(values),
        ArithmeticOp::Subtract => match values.as_slice() {
            [lhs, rhs] => subtract(lhs, rhs),
            _ => Err(StageError::expression(op.name(), "takes exactly 2 arguments")),
        },
        ArithmeticOp::Divide => match values.as_slice() {
            [lhs, rhs] => divide(lhs, rhs),
            _ => Err(StageError::expression(op.name(), "takes exactly 2 arguments")),
        },
    }
}

fn add(values: Vec<Value>) -> Result<Value, StageError> {
    let mut date: Option<DateTime<Utc>> = None;
    let mut int_sum: Option<i64> = Some(0);
    let mut float_sum = 0.0;
    for value in values {
        match value {
            Value::Int(i) => {
                int_sum = int_sum.and_then(|sum| sum.checked_add(i));
                float_sum += i as f64;
            }
            Value::Float(f) => {
                int_sum = None;
                float_sum += f;
            }
            Value::Date(dt) if date.is_none() => date = Some(dt),
            Value::Date(_) => {
                return Err(StageError::expression("$add", "only one date allowed"));
            }
            other => {
                return Err(StageError::expression(
                    "$add",
                    format!("only supports numeric or date types, not {}", other.type_class()),
                ));
            }
        }
    }
    match date {
        Some(dt) => shift_date(dt, float_sum, "$add"),
        None => Ok(int_sum.map(Value::Int).unwrap_or(Value::Float(float_sum))),
    }
}

fn multiply(values: Vec<Value>) -> Result<Value, StageError> {
    let mut int_product: Option<i64> = Some(1);
    let mut float_product = 1.0;
    for value in values {
        match value {
            Value::Int(i) => {
                int_product = int_product.and_then(|p| p.checked_mul(i));
                float_product *= i as f64;
            }
            Value::Float(f) => {
                int_product = None;
                float_product *= f;
            }
            other => {
                return Err(StageError::expression(
                    "$multiply",
                    format!("only supports numeric types, not {}", other.type_class()),
                ));
            }
        }
    }
    Ok(int_product.map(Value::Int).unwrap_or(Value::Float(float_product)))
}

fn subtract(lhs: &Value, rhs: &Value) -> Result<Value, StageError> {
    match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => Ok(a
            .checked_sub(*b)
            .map(Value::Int)
            .unwrap_or(Value::Float(*a as f64 - *b as f64))),
        (Value::Date(a), Value::Date(b)) => {
            Ok(Value::Int(a.timestamp_millis() - b.timestamp_millis()))
        }
        (Value::Date(a), b) if b.as_f64().is_some() => {
            shift_date(*a, -b.as_f64().unwrap_or(0.0), "$subtract")
        }
        (a, b) => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => Ok(Value::Float(x - y)),
            _ => Err(StageError::expression(
                "$subtract",
                format!(
                    "cannot subtract {} from {}",
                    b.type_class(),
                    a.type_class()
                ),
            )),
        },
    }
}

fn divide(lhs: &Value, rhs: &Value) -> Result<Value, StageError> {
    match (lhs.as_f64(), rhs.as_f64()) {
        (Some(_), Some(y)) if y == 0.0 => {
            Err(StageError::expression("$divide", "can't divide by zero"))
        }
        (Some(x), Some(y)) => Ok(Value::Float(x / y)),
        _ => Err(StageError::expression(
            "$divide",
            format!(
                "only supports numeric types, not {} and {}",
                lhs.type_class(),
                rhs.type_class()
            ),
        )),
    }
}

fn shift_date(dt: DateTime<Utc>, millis: f64, operator: &str) -> Result<Value, StageError> {
    TimeParser::from_epoch_millis_f64(dt.timestamp_millis() as f64 + millis.round())
        .map(Value::Date)
        .ok_or_else(|| StageError::expression(operator, "date result out of range"))
}

fn to_date(value: Value) -> Result<Value, StageError> {
    if matches!(value, Value::Null | Value::Date(_)) {
        return Ok(value);
    }
    let parsed = match &value {
        Value::String(s) => TimeParser::parse_str(s),
        Value::Int(ms) => TimeParser::from_epoch_millis(*ms),
        Value::Float(ms) => TimeParser::from_epoch_millis_f64(*ms),
        other => {
            return Err(StageError::expression(
                "$toDate",
                format!("unsupported conversion from {} to date", other.type_class()),
            ));
        }
    };
    parsed
        .map(Value::Date)
        .ok_or_else(|| StageError::expression("$toDate", format!("error parsing date string {value}")))
}

fn to_string(value: Value) -> Result<Value, StageError> {
    let rendered = match value {
        Value::Null => return Ok(Value::Null),
        Value::String(s) => s,
        Value::Bool(b) => b.to_string(),
        Value::Int(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Date(dt) => TimeParser::to_iso_millis(&dt),
        other => {
            return Err(StageError::expression(
                "$toString",
                format!("unsupported conversion from {} to string", other.type_class()),
            ));
        }
    };
    Ok(Value::String(rendered))
}
