//! The museum-collection instance of the core.
//!
//! Harvested object records carry classification and nationality references as term ids. The
//! standard plan resolves them against the terminology table, and the standard schema gates the
//! enriched table before it is exported for indexing.

use crate::enrichment::{EnrichmentPlan, JoinKeySpec, NestedJoin};
use crate::error::FlowResult;
use crate::lookup::LookupIndex;
use crate::processing::ReduceOp;
use crate::types::{ColumnarTable, DataType, Field, Schema};
use crate::validation::{
    ColumnSpec, Comparison, Condition, FramePredicate, Operand, Predicate, RowTest, SchemaDescriptor,
};

pub const OBJECT_ID: &str = "object_id";
pub const TERM_ID: &str = "term_id";

fn utf8(name: &str) -> Field {
    Field::new(name, DataType::Utf8)
}

pub fn constituent_ids_type() -> DataType {
    DataType::struct_list(vec![
        utf8("name"),
        utf8("role"),
        Field::new("birth_year", DataType::Int64),
        utf8("nationality_id"),
    ])
}

pub fn constituents_type() -> DataType {
    DataType::struct_list(vec![
        utf8("name"),
        utf8("role"),
        Field::new("birth_year", DataType::Int64),
        utf8("nationality"),
    ])
}

pub fn classification_ids_type() -> DataType {
    DataType::struct_list(vec![utf8("type_id"), utf8("term_id")])
}

pub fn classifications_type() -> DataType {
    DataType::struct_list(vec![utf8("type_label"), utf8("term_label")])
}

pub fn dimensions_type() -> DataType {
    DataType::struct_list(vec![
        utf8("type"),
        Field::new("value", DataType::Float64),
        utf8("unit"),
    ])
}

pub fn media_type() -> DataType {
    DataType::struct_list(vec![utf8("type"), utf8("url"), utf8("caption")])
}

/// Shape of harvested object records.
pub fn harvested_object_schema() -> Schema {
    Schema::new(vec![
        utf8(OBJECT_ID),
        utf8("title"),
        Field::new("date_made", DataType::Int64),
        utf8("credit_line"),
        utf8("department"),
        Field::new("constituents", constituent_ids_type()),
        Field::new("classification_ids", classification_ids_type()),
        Field::new("dimensions", dimensions_type()),
        Field::new("media", media_type()),
    ])
}

/// Shape of the harvested terminology table.
pub fn terminology_schema() -> Schema {
    Schema::new(vec![utf8(TERM_ID), utf8("term_type"), utf8("label")])
}

/// Resolve classification and nationality term ids of `objects` against `terminology`.
///
/// `classification_ids` becomes `classifications{type_label, term_label}`; constituents keep their
/// shape with `nationality_id` replaced by the `nationality` label. Nationalities are looked up
/// among nationality terms only.
pub fn object_enrichment_plan(objects: &ColumnarTable, terminology: &LookupIndex) -> FlowResult<EnrichmentPlan> {
    let labels = terminology.view("label")?;
    let nationalities = terminology.view_where("term_type", "nationality", "label")?;

    EnrichmentPlan::new(objects, OBJECT_ID)?
        .with_nested_join(
            NestedJoin::on("classification_ids")
                .output_as("classifications")
                .resolve(JoinKeySpec::new("type_id", labels.clone(), "type_label"))
                .resolve(JoinKeySpec::new("term_id", labels, "term_label"))
                .keep_fields(["type_label", "term_label"]),
        )?
        .with_nested_join(
            NestedJoin::on("constituents")
                .resolve(JoinKeySpec::new("nationality_id", nationalities, "nationality"))
                .keep_fields(["name", "role", "birth_year", "nationality"]),
        )
}

/// The schema enriched object tables must satisfy before export.
pub fn object_schema() -> FlowResult<SchemaDescriptor> {
    SchemaDescriptor::builder()
        .column(ColumnSpec::new(OBJECT_ID, DataType::Utf8).check("unique", Predicate::Unique))
        .column(ColumnSpec::new("title", DataType::Utf8).check(
            "str_length",
            Predicate::StrLength {
                min: Some(1),
                max: None,
            },
        ))
        .column(ColumnSpec::new("date_made", DataType::Int64).nullable().check(
            "in_range",
            Predicate::Range {
                min: Some(0.0),
                max: Some(2100.0),
            },
        ))
        .column(ColumnSpec::new("credit_line", DataType::Utf8))
        .column(ColumnSpec::new("department", DataType::Utf8))
        .column(
            ColumnSpec::new("dimensions", dimensions_type())
                .check(
                    "all_dimension_values_gt_1",
                    Predicate::ListAll {
                        field: "value".into(),
                        condition: Condition::Gt(1.0),
                    },
                )
                .check(
                    "has_height_dimension",
                    Predicate::ListAny {
                        field: "type".into(),
                        condition: Condition::Equals("height".into()),
                        vacuous_if_empty: false,
                    },
                )
                .check(
                    "all_units_are_cm",
                    Predicate::ListAll {
                        field: "unit".into(),
                        condition: Condition::Equals("cm".into()),
                    },
                ),
        )
        .column(
            ColumnSpec::new("media", media_type())
                .check(
                    "all_urls_are_https",
                    Predicate::ListAll {
                        field: "url".into(),
                        condition: Condition::StartsWith("https://".into()),
                    },
                )
                .check(
                    "has_primary_image",
                    Predicate::ListExactlyOne {
                        field: "type".into(),
                        condition: Condition::Equals("primary".into()),
                    },
                )
                .check("has_at_least_one_image", Predicate::ListNonEmpty),
        )
        .column(ColumnSpec::new("classifications", classifications_type()).check(
            "no_null_labels_in_classifications",
            Predicate::ListAll {
                field: "term_label".into(),
                condition: Condition::NotNull,
            },
        ))
        .column(
            ColumnSpec::new("constituents", constituents_type())
                .check("has_at_least_one_constituent", Predicate::ListNonEmpty)
                .check(
                    "no_empty_constituent_names",
                    Predicate::ListAll {
                        field: "name".into(),
                        condition: Condition::NonEmpty,
                    },
                )
                .check(
                    "has_at_least_one_artist",
                    Predicate::ListAny {
                        field: "role".into(),
                        condition: Condition::Equals("artist".into()),
                        vacuous_if_empty: true,
                    },
                ),
        )
        .frame_check(
            "sculpture_must_have_depth",
            FramePredicate::Implies {
                premise: RowTest::Value {
                    column: "department".into(),
                    condition: Condition::Equals("Sculpture".into()),
                },
                conclusion: RowTest::ListAny {
                    column: "dimensions".into(),
                    field: "type".into(),
                    condition: Condition::Equals("depth".into()),
                },
            },
        )
        .frame_check(
            "constituent_born_before_artwork",
            FramePredicate::Compare {
                left: Operand::ListReduce {
                    column: "constituents".into(),
                    field: "birth_year".into(),
                    op: ReduceOp::Max,
                },
                op: Comparison::Lt,
                right: Operand::Column {
                    column: "date_made".into(),
                },
            },
        )
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_schema_is_consistent() {
        let schema = object_schema().unwrap();
        assert_eq!(schema.columns().len(), 9);
        assert_eq!(schema.frame_checks().len(), 2);
        assert!(!schema.is_strict());
    }

    #[test]
    fn plan_output_matches_standard_schema() {
        let objects = ColumnarTable::empty(harvested_object_schema());
        let terminology = LookupIndex::new(ColumnarTable::empty(terminology_schema()), TERM_ID).unwrap();
        let plan = object_enrichment_plan(&objects, &terminology).unwrap();

        let mut produced: Vec<Field> = plan.output_schema().unwrap().fields;
        let mut declared: Vec<Field> = object_schema().unwrap().table_schema().fields;
        produced.sort_by(|a, b| a.name.cmp(&b.name));
        declared.sort_by(|a, b| a.name.cmp(&b.name));
        assert_eq!(produced, declared);
    }
}
