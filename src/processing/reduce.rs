//! Reductions over value sequences (column slices or one field of a struct list).

use crate::types::Value;

/// Built-in reduction operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReduceOp {
    /// Count all values (including nulls).
    Count,
    /// Sum numeric values, ignoring nulls.
    Sum,
    /// Minimum numeric value, ignoring nulls.
    Min,
    /// Maximum numeric value, ignoring nulls.
    Max,
}

/// Reduce `values` with a built-in [`ReduceOp`].
///
/// - `Count` always returns `Value::Int64(n)`.
/// - `Sum`/`Min`/`Max` ignore nulls and non-numeric values. The result is `Int64` if every
///   numeric input is an integer, `Float64` otherwise, and `Null` if there is no numeric input.
pub fn reduce<'a, I>(values: I, op: ReduceOp) -> Value
where
    I: IntoIterator<Item = &'a Value>,
{
    if op == ReduceOp::Count {
        return Value::Int64(values.into_iter().count() as i64);
    }

    let mut ints: Option<i64> = None;
    let mut floats: Option<f64> = None;
    let mut saw_float = false;

    for v in values {
        match v {
            Value::Int64(x) => {
                ints = Some(combine_i64(op, ints, *x));
                floats = Some(combine_f64(op, floats, *x as f64));
            }
            Value::Float64(x) => {
                saw_float = true;
                floats = Some(combine_f64(op, floats, *x));
            }
            _ => {}
        }
    }

    if saw_float {
        floats.map(Value::Float64).unwrap_or(Value::Null)
    } else {
        ints.map(Value::Int64).unwrap_or(Value::Null)
    }
}

/// Reduce field `field_idx` across the elements of a struct list.
pub fn reduce_field(elements: &[Vec<Value>], field_idx: usize, op: ReduceOp) -> Value {
    reduce(elements.iter().filter_map(|e| e.get(field_idx)), op)
}

fn combine_i64(op: ReduceOp, acc: Option<i64>, v: i64) -> i64 {
    match (op, acc) {
        (ReduceOp::Sum, Some(a)) => a.saturating_add(v),
        (ReduceOp::Min, Some(a)) => a.min(v),
        (ReduceOp::Max, Some(a)) => a.max(v),
        (_, _) => v,
    }
}

fn combine_f64(op: ReduceOp, acc: Option<f64>, v: f64) -> f64 {
    match (op, acc) {
        (ReduceOp::Sum, Some(a)) => a + v,
        (ReduceOp::Min, Some(a)) => a.min(v),
        (ReduceOp::Max, Some(a)) => a.max(v),
        (_, _) => v,
    }
}
