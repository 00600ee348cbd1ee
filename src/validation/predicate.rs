//! Closed predicate model: value conditions, column-level predicates and dataframe-wide predicates.
//!
//! Every predicate evaluates to a per-row pass mask (`true` = row passes), never to one aggregate
//! boolean, so the engine can point at the rows that failed.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{FlowError, FlowResult};
use crate::processing::join::{join_key, JoinKey};
use crate::processing::{reduce_field, ReduceOp};
use crate::types::{Column, ColumnarTable, DataType, Field, Schema, Value};

/// A test on one scalar value (a flat cell or one field of a struct-list element).
///
/// Serialized as `{"op": "gt", "value": 1.0}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "value", rename_all = "snake_case")]
pub enum Condition {
    Gt(f64),
    Ge(f64),
    Lt(f64),
    Le(f64),
    Equals(String),
    OneOf(Vec<String>),
    StartsWith(String),
    /// String with at least one character.
    NonEmpty,
    NotNull,
}

impl Condition {
    /// `None` when `value` is null (or of a type the condition does not apply to); list
    /// quantifiers skip those. `NotNull` always answers.
    pub fn test(&self, value: &Value) -> Option<bool> {
        match self {
            Self::NotNull => Some(!value.is_null()),
            Self::Gt(bound) => value.as_f64().map(|v| v > *bound),
            Self::Ge(bound) => value.as_f64().map(|v| v >= *bound),
            Self::Lt(bound) => value.as_f64().map(|v| v < *bound),
            Self::Le(bound) => value.as_f64().map(|v| v <= *bound),
            Self::Equals(expected) => value.as_str().map(|s| s == expected),
            Self::OneOf(allowed) => value.as_str().map(|s| allowed.iter().any(|a| a == s)),
            Self::StartsWith(prefix) => value.as_str().map(|s| s.starts_with(prefix.as_str())),
            Self::NonEmpty => value.as_str().map(|s| !s.is_empty()),
        }
    }

    /// Whether the condition can be applied to values of `data_type`.
    pub fn accepts(&self, data_type: &DataType) -> bool {
        match self {
            Self::NotNull => true,
            Self::Gt(_) | Self::Ge(_) | Self::Lt(_) | Self::Le(_) => data_type.is_numeric(),
            Self::Equals(_) | Self::OneOf(_) | Self::StartsWith(_) | Self::NonEmpty => {
                data_type == &DataType::Utf8
            }
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gt(v) => write!(f, "> {v}"),
            Self::Ge(v) => write!(f, ">= {v}"),
            Self::Lt(v) => write!(f, "< {v}"),
            Self::Le(v) => write!(f, "<= {v}"),
            Self::Equals(v) => write!(f, "== {v:?}"),
            Self::OneOf(v) => write!(f, "in {v:?}"),
            Self::StartsWith(v) => write!(f, "starts with {v:?}"),
            Self::NonEmpty => f.write_str("non-empty"),
            Self::NotNull => f.write_str("not null"),
        }
    }
}

/// Column-level predicate.
///
/// Null cells always pass: whether a column may hold nulls is the column's nullability rule, not
/// a predicate's concern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Predicate {
    /// No non-null value occurs twice. Every occurrence of a repeated value fails.
    Unique,
    /// String length in characters, bounds inclusive.
    StrLength {
        #[serde(default)]
        min: Option<usize>,
        #[serde(default)]
        max: Option<usize>,
    },
    /// Numeric range, bounds inclusive.
    Range {
        #[serde(default)]
        min: Option<f64>,
        #[serde(default)]
        max: Option<f64>,
    },
    /// The list has at least one element.
    ListNonEmpty,
    /// Every element's `field` satisfies `condition`. True on an empty list.
    ListAll { field: String, condition: Condition },
    /// At least one element's `field` satisfies `condition`.
    ///
    /// False on an empty list unless `vacuous_if_empty` ("if there are elements, one of them must").
    ListAny {
        field: String,
        condition: Condition,
        #[serde(default)]
        vacuous_if_empty: bool,
    },
    /// Exactly one element's `field` satisfies `condition`.
    ListExactlyOne { field: String, condition: Condition },
}

impl Predicate {
    /// Checks that the predicate can be evaluated on a column of `data_type`.
    pub fn check_applicable(&self, data_type: &DataType) -> Result<(), String> {
        match self {
            Self::Unique => match data_type {
                DataType::StructList(_) => Err(format!("unique does not apply to {data_type}")),
                _ => Ok(()),
            },
            Self::StrLength { .. } if data_type != &DataType::Utf8 => {
                Err(format!("str_length does not apply to {data_type}"))
            }
            Self::Range { .. } if !data_type.is_numeric() => Err(format!("range does not apply to {data_type}")),
            Self::StrLength { .. } | Self::Range { .. } => Ok(()),
            Self::ListNonEmpty => match data_type {
                DataType::StructList(_) => Ok(()),
                _ => Err(format!("list_non_empty does not apply to {data_type}")),
            },
            Self::ListAll { field, condition }
            | Self::ListAny { field, condition, .. }
            | Self::ListExactlyOne { field, condition } => element_condition_applies(data_type, field, condition),
        }
    }

    /// Per-row pass mask over `column`.
    pub fn evaluate(&self, column: &Column) -> FlowResult<Vec<bool>> {
        let values = column.values();
        match self {
            Self::Unique => Ok(unique_mask(values)),
            Self::StrLength { min, max } => Ok(values
                .iter()
                .map(|v| match v.as_str() {
                    Some(s) => within(s.chars().count(), *min, *max),
                    None => true,
                })
                .collect()),
            Self::Range { min, max } => Ok(values
                .iter()
                .map(|v| match v.as_f64() {
                    Some(x) => min.is_none_or(|m| x >= m) && max.is_none_or(|m| x <= m),
                    None => true,
                })
                .collect()),
            Self::ListNonEmpty => Ok(values
                .iter()
                .map(|v| v.as_list().is_none_or(|items| !items.is_empty()))
                .collect()),
            Self::ListAll { field, condition } => {
                let idx = resolve_field(column, field)?;
                Ok(per_list(values, |items| all_elements(items, idx, condition)))
            }
            Self::ListAny {
                field,
                condition,
                vacuous_if_empty,
            } => {
                let idx = resolve_field(column, field)?;
                Ok(per_list(values, |items| {
                    if items.is_empty() {
                        *vacuous_if_empty
                    } else {
                        any_element(items, idx, condition)
                    }
                }))
            }
            Self::ListExactlyOne { field, condition } => {
                let idx = resolve_field(column, field)?;
                Ok(per_list(values, |items| {
                    items
                        .iter()
                        .filter(|e| condition.test(&e[idx]) == Some(true))
                        .count()
                        == 1
                }))
            }
        }
    }
}

/// A per-row test used inside a [`FramePredicate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RowTest {
    /// `condition` on a flat column.
    Value { column: String, condition: Condition },
    /// Some element's `field` in a struct-list column satisfies `condition`.
    ListAny {
        column: String,
        field: String,
        condition: Condition,
    },
    /// Every element's `field` in a struct-list column satisfies `condition`.
    ListAll {
        column: String,
        field: String,
        condition: Condition,
    },
    /// The struct-list column has at least one element.
    ListNonEmpty { column: String },
}

impl RowTest {
    fn column(&self) -> &str {
        match self {
            Self::Value { column, .. }
            | Self::ListAny { column, .. }
            | Self::ListAll { column, .. }
            | Self::ListNonEmpty { column } => column,
        }
    }

    /// Checks that the test can be evaluated on its column when it has type `data_type`.
    pub fn check_applicable(&self, data_type: &DataType) -> Result<(), String> {
        match self {
            Self::Value { column, condition } => {
                if condition.accepts(data_type) {
                    Ok(())
                } else {
                    Err(format!("condition '{condition}' does not apply to column '{column}' of type {data_type}"))
                }
            }
            Self::ListAny { field, condition, .. } | Self::ListAll { field, condition, .. } => {
                element_condition_applies(data_type, field, condition)
            }
            Self::ListNonEmpty { column } => match data_type {
                DataType::StructList(_) => Ok(()),
                _ => Err(format!("list_non_empty does not apply to column '{column}' of type {data_type}")),
            },
        }
    }

    /// `None` where the row's input is null.
    fn evaluate(&self, table: &ColumnarTable) -> FlowResult<Vec<Option<bool>>> {
        let column = table.require_column(self.column())?;
        self.check_applicable(column.data_type())
            .map_err(|message| FlowError::SchemaMismatch { message })?;
        let values = column.values();
        match self {
            Self::Value { condition, .. } => Ok(values.iter().map(|v| condition.test(v)).collect()),
            Self::ListNonEmpty { .. } => {
                require_list(column)?;
                Ok(values.iter().map(|v| v.as_list().map(|items| !items.is_empty())).collect())
            }
            Self::ListAny { field, condition, .. } => {
                let idx = resolve_field(column, field)?;
                Ok(values
                    .iter()
                    .map(|v| v.as_list().map(|items| any_element(items, idx, condition)))
                    .collect())
            }
            Self::ListAll { field, condition, .. } => {
                let idx = resolve_field(column, field)?;
                Ok(values
                    .iter()
                    .map(|v| v.as_list().map(|items| all_elements(items, idx, condition)))
                    .collect())
            }
        }
    }
}

/// A numeric side of a [`FramePredicate::Compare`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Operand {
    /// A flat numeric column.
    Column { column: String },
    /// `op` over one numeric field of a struct-list column (null for a null or element-less list).
    ListReduce {
        column: String,
        field: String,
        op: ReduceOp,
    },
}

impl Operand {
    fn column(&self) -> &str {
        match self {
            Self::Column { column } | Self::ListReduce { column, .. } => column,
        }
    }

    /// Checks that the operand yields numbers on a column of type `data_type`.
    ///
    /// `Count` works over any element field; the other reductions need a numeric one.
    pub fn check_applicable(&self, data_type: &DataType) -> Result<(), String> {
        match self {
            Self::Column { column } if !data_type.is_numeric() => {
                Err(format!("operand '{column}' is {data_type}, expected a number"))
            }
            Self::Column { .. } => Ok(()),
            Self::ListReduce { column, field, op } => {
                let fields = data_type
                    .struct_fields()
                    .ok_or_else(|| format!("operand '{column}' is {data_type}, expected a struct list"))?;
                let field_type = fields
                    .iter()
                    .find(|f| &f.name == field)
                    .map(|f| &f.data_type)
                    .ok_or_else(|| format!("element field '{field}' not found in {data_type}"))?;
                if *op != ReduceOp::Count && !field_type.is_numeric() {
                    return Err(format!(
                        "cannot reduce field '{column}.{field}' of type {field_type} with {op:?}"
                    ));
                }
                Ok(())
            }
        }
    }

    fn evaluate(&self, table: &ColumnarTable) -> FlowResult<Vec<Option<f64>>> {
        let column = table.require_column(self.column())?;
        self.check_applicable(column.data_type())
            .map_err(|message| FlowError::SchemaMismatch { message })?;
        match self {
            Self::Column { .. } => Ok(column.values().iter().map(Value::as_f64).collect()),
            Self::ListReduce { field, op, .. } => {
                let idx = resolve_field(column, field)?;
                Ok(column
                    .values()
                    .iter()
                    .map(|v| v.as_list().and_then(|items| reduce_field(items, idx, *op).as_f64()))
                    .collect())
            }
        }
    }
}

/// Comparison operator of [`FramePredicate::Compare`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

impl Comparison {
    pub fn holds(self, left: f64, right: f64) -> bool {
        match self {
            Self::Lt => left < right,
            Self::Le => left <= right,
            Self::Gt => left > right,
            Self::Ge => left >= right,
            Self::Eq => left == right,
            Self::Ne => left != right,
        }
    }
}

/// Dataframe-wide (cross-column) predicate.
///
/// Both variants are implications and hold vacuously: a row passes when the premise is false, or
/// when any input the verdict depends on is null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FramePredicate {
    /// If `premise` holds, `conclusion` must hold.
    Implies { premise: RowTest, conclusion: RowTest },
    /// `left op right`, evaluated only where both sides are known.
    Compare {
        left: Operand,
        op: Comparison,
        right: Operand,
    },
}

impl FramePredicate {
    /// Columns the predicate reads, in the order they are referenced.
    pub fn columns(&self) -> Vec<&str> {
        match self {
            Self::Implies { premise, conclusion } => dedup_names([premise.column(), conclusion.column()]),
            Self::Compare { left, right, .. } => dedup_names([left.column(), right.column()]),
        }
    }

    /// Checks that every referenced column is declared in `schema` with a type the predicate can
    /// be evaluated on.
    pub fn check_applicable(&self, schema: &Schema) -> Result<(), String> {
        let column_type = |name: &str| {
            schema
                .field(name)
                .map(|f| &f.data_type)
                .ok_or_else(|| format!("column '{name}' is not declared"))
        };
        match self {
            Self::Implies { premise, conclusion } => {
                premise.check_applicable(column_type(premise.column())?)?;
                conclusion.check_applicable(column_type(conclusion.column())?)
            }
            Self::Compare { left, right, .. } => {
                left.check_applicable(column_type(left.column())?)?;
                right.check_applicable(column_type(right.column())?)
            }
        }
    }

    /// Per-row pass mask over `table`.
    ///
    /// Missing or mis-shaped referenced columns are an error; the engine reports it as a failure of
    /// this check.
    pub fn evaluate(&self, table: &ColumnarTable) -> FlowResult<Vec<bool>> {
        match self {
            Self::Implies { premise, conclusion } => {
                let premise = premise.evaluate(table)?;
                let conclusion = conclusion.evaluate(table)?;
                Ok(premise
                    .into_iter()
                    .zip(conclusion)
                    .map(|(p, c)| !(p == Some(true) && c == Some(false)))
                    .collect())
            }
            Self::Compare { left, op, right } => {
                let left = left.evaluate(table)?;
                let right = right.evaluate(table)?;
                Ok(left
                    .into_iter()
                    .zip(right)
                    .map(|pair| match pair {
                        (Some(l), Some(r)) => op.holds(l, r),
                        _ => true,
                    })
                    .collect())
            }
        }
    }
}

fn dedup_names<const N: usize>(names: [&str; N]) -> Vec<&str> {
    let mut out: Vec<&str> = Vec::with_capacity(N);
    for name in names {
        if !out.contains(&name) {
            out.push(name);
        }
    }
    out
}

fn within(len: usize, min: Option<usize>, max: Option<usize>) -> bool {
    min.is_none_or(|m| len >= m) && max.is_none_or(|m| len <= m)
}

fn all_elements(items: &[Vec<Value>], idx: usize, condition: &Condition) -> bool {
    items.iter().all(|e| condition.test(&e[idx]) != Some(false))
}

fn any_element(items: &[Vec<Value>], idx: usize, condition: &Condition) -> bool {
    items.iter().any(|e| condition.test(&e[idx]) == Some(true))
}

fn per_list<F>(values: &[Value], mut test: F) -> Vec<bool>
where
    F: FnMut(&[Vec<Value>]) -> bool,
{
    values
        .iter()
        .map(|v| match v.as_list() {
            Some(items) => test(items),
            None => true,
        })
        .collect()
}

fn require_list(column: &Column) -> FlowResult<&[Field]> {
    column
        .data_type()
        .struct_fields()
        .ok_or_else(|| FlowError::SchemaMismatch {
            message: format!("column '{}' is {}, expected a struct list", column.name(), column.data_type()),
        })
}

fn resolve_field(column: &Column, field: &str) -> FlowResult<usize> {
    require_list(column)?
        .iter()
        .position(|f| f.name == field)
        .ok_or_else(|| FlowError::FieldNotFound {
            column: column.name().to_string(),
            field: field.to_string(),
        })
}

fn element_condition_applies(data_type: &DataType, field: &str, condition: &Condition) -> Result<(), String> {
    let fields = data_type
        .struct_fields()
        .ok_or_else(|| format!("list predicates do not apply to {data_type}"))?;
    let field_type = fields
        .iter()
        .find(|f| f.name == field)
        .map(|f| &f.data_type)
        .ok_or_else(|| format!("element field '{field}' not found in {data_type}"))?;
    if !condition.accepts(field_type) {
        return Err(format!("condition '{condition}' does not apply to field '{field}' of type {field_type}"));
    }
    Ok(())
}

#[derive(PartialEq, Eq, Hash)]
enum UniqueKey<'a> {
    Key(JoinKey<'a>),
    Float(u64),
}

fn unique_key(value: &Value) -> Option<UniqueKey<'_>> {
    match value {
        Value::Float64(v) => Some(UniqueKey::Float(v.to_bits())),
        other => join_key(other).map(UniqueKey::Key),
    }
}

fn unique_mask(values: &[Value]) -> Vec<bool> {
    let mut counts: HashMap<UniqueKey<'_>, usize> = HashMap::with_capacity(values.len());
    for key in values.iter().filter_map(unique_key) {
        *counts.entry(key).or_default() += 1;
    }
    values
        .iter()
        .map(|v| unique_key(v).is_none_or(|k| counts.get(&k).copied().unwrap_or(0) <= 1))
        .collect()
}
