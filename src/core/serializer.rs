//! Output serialization contract and the default JSON serializer

use crate::core::query::PaginationMeta;
use anyhow::Result;
use serde_json::{Map, Value, json};

/// What is being rendered
#[derive(Debug, Clone, Copy)]
pub enum Payload<'a> {
    One(&'a Value),
    Many {
        records: &'a [Value],
        meta: &'a PaginationMeta,
    },
}

/// Per-request rendering options
#[derive(Debug, Clone, Default)]
pub struct SerializeContext {
    pub tenant_id: String,
    pub principal_id: String,
    /// Emit related records
    pub relationships: bool,
    /// Sorted dotted include paths as requested
    pub include: Vec<String>,
}

/// Renders records into the success envelope
pub trait Serializer: Send + Sync {
    fn serialize(&self, payload: Payload<'_>, ctx: &SerializeContext) -> Result<Value>;
}

/// Default serializer: `{"data": ...}` plus `meta` for lists and `included`
/// when relationships and includes are requested
#[derive(Debug, Clone, Default)]
pub struct JsonSerializer;

impl Serializer for JsonSerializer {
    fn serialize(&self, payload: Payload<'_>, ctx: &SerializeContext) -> Result<Value> {
        let records: Vec<&Value> = match payload {
            Payload::One(record) => vec![record],
            Payload::Many { records, .. } => records.iter().collect(),
        };

        let mut body = Map::new();
        match payload {
            Payload::One(record) => {
                body.insert("data".into(), record.clone());
            }
            Payload::Many { records, meta } => {
                body.insert("data".into(), Value::Array(records.to_vec()));
                body.insert("meta".into(), serde_json::to_value(meta)?);
            }
        }

        if ctx.relationships && !ctx.include.is_empty() {
            let mut included = Vec::new();
            for record in records {
                for path in &ctx.include {
                    collect_related(record, &path.split('.').collect::<Vec<_>>(), &mut included);
                }
            }
            body.insert("included".into(), Value::Array(included));
        }

        Ok(Value::Object(body))
    }
}

/// Walk a dotted path through nested objects and arrays, collecting objects
fn collect_related(value: &Value, segments: &[&str], out: &mut Vec<Value>) {
    let Some((first, rest)) = segments.split_first() else {
        return;
    };
    let next = match value {
        Value::Object(map) => map.get(*first),
        _ => None,
    };
    let targets: Vec<&Value> = match next {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(v @ Value::Object(_)) => vec![v],
        _ => Vec::new(),
    };
    for target in targets {
        if rest.is_empty() {
            if !out.contains(target) {
                out.push(target.clone());
            }
        } else {
            collect_related(target, rest, out);
        }
    }
}

/// Envelope for a destroy confirmation
pub fn destroyed_message(model: &str) -> Value {
    let mut chars = model.chars();
    let model = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
        None => String::new(),
    };
    json!({ "message": format!("{} deleted successfully", model) })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(relationships: bool, include: &[&str]) -> SerializeContext {
        SerializeContext {
            relationships,
            include: include.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_single_record() {
        let record = json!({ "id": "t-1" });
        let body = JsonSerializer
            .serialize(Payload::One(&record), &ctx(false, &[]))
            .unwrap();
        assert_eq!(body, json!({ "data": { "id": "t-1" } }));
    }

    #[test]
    fn test_list_has_meta() {
        let records = vec![json!({ "id": "a" }), json!({ "id": "b" })];
        let meta = PaginationMeta::new(1, 2, 3);
        let body = JsonSerializer
            .serialize(
                Payload::Many {
                    records: &records,
                    meta: &meta,
                },
                &ctx(false, &[]),
            )
            .unwrap();
        assert_eq!(body["data"].as_array().map(Vec::len), Some(2));
        assert_eq!(body["meta"]["total"], 3);
        assert_eq!(body["meta"]["has_next"], true);
        assert!(body.get("included").is_none());
    }

    #[test]
    fn test_included_requires_relationships() {
        let record = json!({
            "id": "t-1",
            "owner": { "id": "cu-1", "user": { "id": "u-1" } },
            "tags": [{ "id": "g-1" }, { "id": "g-2" }]
        });

        let body = JsonSerializer
            .serialize(Payload::One(&record), &ctx(false, &["owner"]))
            .unwrap();
        assert!(body.get("included").is_none());

        let body = JsonSerializer
            .serialize(Payload::One(&record), &ctx(true, &["owner.user", "tags"]))
            .unwrap();
        assert_eq!(
            body["included"],
            json!([{ "id": "u-1" }, { "id": "g-1" }, { "id": "g-2" }])
        );
    }

    #[test]
    fn test_destroyed_message() {
        assert_eq!(
            destroyed_message("company test"),
            json!({ "message": "Company test deleted successfully" })
        );
    }
}
