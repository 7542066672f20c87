//! Filter and sort validation against a resource's field table
//!
//! Public field names are an allow-list: every clause and sort key must name a
//! field declared for the resource. Accepted names are rewritten to the
//! internal search field and carry type information used for value coercion
//! and sort ordering.
//!
//! A `-` before the field or before the value excludes matches. Both at once
//! (`-owner:-U1`) still exclude: the two markers do not cancel.

use crate::core::error::ApiError;
use crate::core::expression::FilterClause;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Declared type of a filterable/sortable field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    #[default]
    Text,
    Boolean,
    Date,
    DateTime,
    Integer,
    Number,
}

impl FieldType {
    /// Type hint handed to the search backend for documents missing the field
    pub fn unmapped_type(self) -> &'static str {
        match self {
            FieldType::Text => "keyword",
            FieldType::Boolean => "boolean",
            FieldType::Date | FieldType::DateTime => "date",
            FieldType::Integer => "long",
            FieldType::Number => "double",
        }
    }

    /// Coerce a raw query value; unparsable values stay strings
    pub fn coerce(self, raw: &str) -> Value {
        match self {
            FieldType::Boolean => match raw.to_ascii_lowercase().as_str() {
                "true" => Value::Bool(true),
                "false" => Value::Bool(false),
                _ => Value::String(raw.to_string()),
            },
            FieldType::Integer => raw
                .parse::<i64>()
                .map(Value::from)
                .unwrap_or_else(|_| Value::String(raw.to_string())),
            FieldType::Number => {
                if let Ok(i) = raw.parse::<i64>() {
                    Value::from(i)
                } else {
                    raw.parse::<f64>()
                        .ok()
                        .and_then(serde_json::Number::from_f64)
                        .map(Value::Number)
                        .unwrap_or_else(|| Value::String(raw.to_string()))
                }
            }
            FieldType::Text | FieldType::Date | FieldType::DateTime => {
                Value::String(raw.to_string())
            }
        }
    }

    fn is_numeric(self) -> bool {
        matches!(self, FieldType::Integer | FieldType::Number)
    }
}

/// Internal name and type of a public field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMapping {
    pub key: String,
    #[serde(rename = "type", default)]
    pub field_type: FieldType,
}

impl FieldMapping {
    pub fn new(key: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            key: key.into(),
            field_type,
        }
    }
}

/// Public field name → mapping, in declaration order
pub type FieldTable = IndexMap<String, FieldMapping>;

// =============================================================================
// Filters
// =============================================================================

/// An equality filter on an internal field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Filter {
    /// Field equals value
    Term { field: String, value: Value },

    /// Field equals any of the values
    Terms { field: String, values: Vec<Value> },
}

impl Filter {
    pub fn term(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Term {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn terms<V: Into<Value>>(field: impl Into<String>, values: impl IntoIterator<Item = V>) -> Self {
        Filter::Terms {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn field(&self) -> &str {
        match self {
            Filter::Term { field, .. } | Filter::Terms { field, .. } => field,
        }
    }

    /// Search-engine query fragment (`{"term": {field: value}}`)
    pub fn to_query(&self) -> Value {
        match self {
            Filter::Term { field, value } => json!({ "term": { field.as_str(): value } }),
            Filter::Terms { field, values } => json!({ "terms": { field.as_str(): values } }),
        }
    }
}

/// Validated user filters split by polarity
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MappedFilters {
    pub must: Vec<Filter>,
    pub must_not: Vec<Filter>,
}

/// Validate clauses against the field table and map them to filters
///
/// A single unknown field fails the whole request. Field and value negation
/// combine as "either", so a doubly negated clause lands in `must_not` once.
pub fn map_clauses(
    clauses: &[FilterClause],
    fields: &FieldTable,
    model: &str,
) -> Result<MappedFilters, ApiError> {
    let mut mapped = MappedFilters::default();

    for clause in clauses {
        let mapping = fields.get(&clause.field).ok_or_else(|| ApiError::BadFilter {
            key: clause.field.clone(),
            model: model.to_string(),
        })?;

        let (value_negated, raw) = split_value_negation(&clause.value, mapping.field_type);
        let filter = Filter::term(mapping.key.clone(), mapping.field_type.coerce(raw));

        if clause.negated || value_negated {
            mapped.must_not.push(filter);
        } else {
            mapped.must.push(filter);
        }
    }

    Ok(mapped)
}

/// A leading `-` on the value negates, unless it is a numeric literal of a
/// numeric field
fn split_value_negation(value: &str, field_type: FieldType) -> (bool, &str) {
    match value.strip_prefix('-') {
        Some(rest) if !rest.is_empty() => {
            if field_type.is_numeric() && value.parse::<f64>().is_ok() {
                (false, value)
            } else {
                (true, rest)
            }
        }
        _ => (false, value),
    }
}

// =============================================================================
// Sorting
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Where documents missing the sort field are placed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Missing {
    #[serde(rename = "_first")]
    First,
    #[serde(rename = "_last")]
    Last,
}

/// A user-requested sort on a declared field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSort {
    pub field: String,
    pub order: SortOrder,
    pub missing: Missing,
    pub unmapped_type: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortKey {
    Field(FieldSort),
    /// Relevance score, descending
    Relevance,
    /// Document id, ascending
    Id,
}

impl SortKey {
    pub fn to_query(&self) -> Value {
        match self {
            SortKey::Field(sort) => json!({
                sort.field.as_str(): {
                    "order": sort.order,
                    "missing": sort.missing,
                    "unmapped_type": sort.unmapped_type,
                }
            }),
            SortKey::Relevance => json!({ "_score": { "order": "desc" } }),
            SortKey::Id => json!({ "_id": { "order": "asc" } }),
        }
    }
}

/// Ordered sort keys, always ending with the relevance and id tie-breakers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    keys: Vec<SortKey>,
}

impl Default for SortSpec {
    fn default() -> Self {
        Self {
            keys: vec![SortKey::Relevance, SortKey::Id],
        }
    }
}

impl SortSpec {
    fn with_fields(fields: Vec<FieldSort>) -> Self {
        let mut keys: Vec<SortKey> = fields.into_iter().map(SortKey::Field).collect();
        keys.push(SortKey::Relevance);
        keys.push(SortKey::Id);
        Self { keys }
    }

    pub fn keys(&self) -> &[SortKey] {
        &self.keys
    }

    pub fn to_query(&self) -> Value {
        Value::Array(self.keys.iter().map(SortKey::to_query).collect())
    }
}

/// Parse and validate a comma-separated sort parameter
///
/// ```
/// use resource_api::core::filter::{parse_sort, FieldMapping, FieldTable, FieldType, SortKey};
///
/// let mut fields = FieldTable::new();
/// fields.insert("name".into(), FieldMapping::new("name", FieldType::Text));
/// let spec = parse_sort(Some("-name"), &fields, "test").unwrap();
/// assert_eq!(spec.keys().len(), 3);
/// assert_eq!(spec.keys()[2], SortKey::Id);
/// ```
pub fn parse_sort(input: Option<&str>, fields: &FieldTable, model: &str) -> Result<SortSpec, ApiError> {
    let Some(input) = input else {
        return Ok(SortSpec::default());
    };

    let mut sorts = Vec::new();
    for segment in input.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let (name, order, missing) = match segment.strip_prefix('-') {
            Some(name) => (name, SortOrder::Desc, Missing::First),
            None => (segment, SortOrder::Asc, Missing::Last),
        };

        let mapping = fields.get(name).ok_or_else(|| ApiError::BadSort {
            key: name.to_string(),
            model: model.to_string(),
        })?;

        sorts.push(FieldSort {
            field: mapping.key.clone(),
            order,
            missing,
            unmapped_type: mapping.field_type.unmapped_type(),
        });
    }

    Ok(SortSpec::with_fields(sorts))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields() -> FieldTable {
        let mut fields = FieldTable::new();
        fields.insert("id".into(), FieldMapping::new("id", FieldType::Text));
        fields.insert("name".into(), FieldMapping::new("name", FieldType::Text));
        fields.insert("owner".into(), FieldMapping::new("owner_id", FieldType::Text));
        fields.insert("visible".into(), FieldMapping::new("visible", FieldType::Boolean));
        fields.insert("score".into(), FieldMapping::new("score", FieldType::Integer));
        fields.insert("due".into(), FieldMapping::new("due_date", FieldType::Date));
        fields
    }

    #[test]
    fn test_unknown_filter_field_fails() {
        let clauses = vec![
            FilterClause::new(false, "name", "x"),
            FilterClause::new(false, "color", "red"),
        ];
        let err = map_clauses(&clauses, &fields(), "company test").unwrap_err();
        match err {
            ApiError::BadFilter { key, model } => {
                assert_eq!(key, "color");
                assert_eq!(model, "company test");
            }
            other => panic!("Expected BadFilter, got {:?}", other),
        }
    }

    #[test]
    fn test_field_is_remapped() {
        let mapped = map_clauses(&[FilterClause::new(false, "owner", "U1")], &fields(), "t").unwrap();
        assert_eq!(mapped.must, vec![Filter::term("owner_id", "U1")]);
        assert!(mapped.must_not.is_empty());
    }

    #[test]
    fn test_value_negation_goes_to_must_not() {
        let mapped = map_clauses(&[FilterClause::new(false, "owner", "-U1")], &fields(), "t").unwrap();
        assert!(mapped.must.is_empty());
        assert_eq!(mapped.must_not, vec![Filter::term("owner_id", "U1")]);
    }

    #[test]
    fn test_field_negation_goes_to_must_not() {
        let mapped = map_clauses(&[FilterClause::new(true, "visible", "true")], &fields(), "t").unwrap();
        assert_eq!(mapped.must_not, vec![Filter::term("visible", true)]);
    }

    #[test]
    fn test_double_negation_still_excludes() {
        let mapped = map_clauses(&[FilterClause::new(true, "owner", "-U1")], &fields(), "t").unwrap();
        assert!(mapped.must.is_empty());
        assert_eq!(mapped.must_not, vec![Filter::term("owner_id", "U1")]);
    }

    #[test]
    fn test_negative_number_is_literal() {
        let mapped = map_clauses(&[FilterClause::new(false, "score", "-5")], &fields(), "t").unwrap();
        assert_eq!(mapped.must, vec![Filter::term("score", -5)]);
    }

    #[test]
    fn test_value_coercion() {
        assert_eq!(FieldType::Boolean.coerce("TRUE"), json!(true));
        assert_eq!(FieldType::Boolean.coerce("yes"), json!("yes"));
        assert_eq!(FieldType::Integer.coerce("42"), json!(42));
        assert_eq!(FieldType::Integer.coerce("4.2"), json!("4.2"));
        assert_eq!(FieldType::Number.coerce("4.5"), json!(4.5));
        assert_eq!(FieldType::Number.coerce("7"), json!(7));
        assert_eq!(FieldType::Date.coerce("2024-01-01"), json!("2024-01-01"));
    }

    #[test]
    fn test_default_sort_is_tie_breakers() {
        let spec = parse_sort(None, &fields(), "t").unwrap();
        assert_eq!(spec.keys(), &[SortKey::Relevance, SortKey::Id]);
    }

    #[test]
    fn test_sort_round_trip() {
        let spec = parse_sort(Some("-name,id"), &fields(), "t").unwrap();
        assert_eq!(
            spec.keys(),
            &[
                SortKey::Field(FieldSort {
                    field: "name".into(),
                    order: SortOrder::Desc,
                    missing: Missing::First,
                    unmapped_type: "keyword",
                }),
                SortKey::Field(FieldSort {
                    field: "id".into(),
                    order: SortOrder::Asc,
                    missing: Missing::Last,
                    unmapped_type: "keyword",
                }),
                SortKey::Relevance,
                SortKey::Id,
            ]
        );
    }

    #[test]
    fn test_sort_uses_internal_name_and_type() {
        let spec = parse_sort(Some("due, ,score,"), &fields(), "t").unwrap();
        match &spec.keys()[0] {
            SortKey::Field(sort) => {
                assert_eq!(sort.field, "due_date");
                assert_eq!(sort.unmapped_type, "date");
            }
            other => panic!("Expected field sort, got {:?}", other),
        }
        assert_eq!(spec.keys().len(), 4);
    }

    #[test]
    fn test_unknown_sort_fails() {
        let err = parse_sort(Some("name,-color"), &fields(), "t").unwrap_err();
        assert!(matches!(err, ApiError::BadSort { key, .. } if key == "color"));
    }

    #[test]
    fn test_sort_query_shape() {
        let spec = parse_sort(Some("-name"), &fields(), "t").unwrap();
        assert_eq!(
            spec.to_query(),
            json!([
                { "name": { "order": "desc", "missing": "_first", "unmapped_type": "keyword" } },
                { "_score": { "order": "desc" } },
                { "_id": { "order": "asc" } }
            ])
        );
    }

    #[test]
    fn test_filter_yaml_shape() {
        let filters: Vec<Filter> = serde_yaml::from_str(
            "- term: { field: archived, value: false }\n- terms: { field: status, values: [added, connected] }\n",
        )
        .unwrap();
        assert_eq!(filters[0], Filter::term("archived", false));
        assert_eq!(filters[1], Filter::terms("status", ["added", "connected"]));
        assert_eq!(filters[1].to_query(), json!({ "terms": { "status": ["added", "connected"] } }));
    }
}
