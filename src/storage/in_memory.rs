//! In-memory collaborators for testing and development
//!
//! [`InMemoryStore`] is both a [`RecordStore`] and a [`SearchBackend`]: it
//! evaluates search queries by scanning every record of a type. It is not a
//! search engine; relevance is ignored and full text is substring matching.

use crate::core::auth::Action;
use crate::core::credential::{Credential, CredentialStore};
use crate::core::filter::{FieldSort, Filter, Missing, SortKey, SortOrder};
use crate::core::outcome::{Handler, HandlerInput, Outcome};
use crate::core::search::{RecordStore, SearchBackend, SearchPage, SearchQuery};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

// =============================================================================
// Credentials
// =============================================================================

/// In-memory credential store
///
/// Uses RwLock for thread-safe access.
#[derive(Clone, Default)]
pub struct InMemoryCredentialStore {
    credentials: Arc<RwLock<HashMap<String, Credential>>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, credential: Credential) {
        let mut credentials = self.credentials.write().unwrap_or_else(|e| e.into_inner());
        credentials.insert(credential.id.clone(), credential);
    }

    pub fn get(&self, id: &str) -> Option<Credential> {
        let credentials = self.credentials.read().unwrap_or_else(|e| e.into_inner());
        credentials.get(id).cloned()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn find(&self, id: &str) -> Result<Option<Credential>> {
        let credentials = self
            .credentials
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        Ok(credentials.get(id).cloned())
    }

    async fn touch(&self, id: &str, at: DateTime<Utc>) -> Result<()> {
        let mut credentials = self
            .credentials
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        let credential = credentials
            .get_mut(id)
            .ok_or_else(|| anyhow!("Credential {} not found", id))?;
        credential.last_used_at = Some(at);
        Ok(())
    }
}

// =============================================================================
// Records
// =============================================================================

/// In-memory record store and search backend, keyed by resource type
#[derive(Clone, Default)]
pub struct InMemoryStore {
    records: Arc<RwLock<HashMap<String, Vec<Value>>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a record; a missing `id` is generated
    pub fn insert(&self, resource_type: &str, mut record: Value) -> Value {
        if let Value::Object(map) = &mut record {
            if !map.get("id").is_some_and(|id| id.is_string() || id.is_number()) {
                map.insert("id".into(), Value::String(Uuid::new_v4().to_string()));
            }
        }
        let id = record_id(&record);

        let mut records = self.records.write().unwrap_or_else(|e| e.into_inner());
        let bucket = records.entry(resource_type.to_string()).or_default();
        match bucket.iter_mut().find(|r| record_id(r) == id) {
            Some(existing) => *existing = record.clone(),
            None => bucket.push(record.clone()),
        }
        record
    }

    pub fn remove(&self, resource_type: &str, id: &str) -> Option<Value> {
        let mut records = self.records.write().unwrap_or_else(|e| e.into_inner());
        let bucket = records.get_mut(resource_type)?;
        let index = bucket.iter().position(|r| record_id(r).as_deref() == Some(id))?;
        Some(bucket.remove(index))
    }

    pub fn count(&self, resource_type: &str) -> usize {
        let records = self.records.read().unwrap_or_else(|e| e.into_inner());
        records.get(resource_type).map_or(0, Vec::len)
    }
}

#[async_trait]
impl RecordStore for InMemoryStore {
    async fn find(&self, resource_type: &str, id: &str) -> Result<Option<Value>> {
        let records = self
            .records
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        Ok(records.get(resource_type).and_then(|bucket| {
            bucket
                .iter()
                .find(|r| record_id(r).as_deref() == Some(id))
                .cloned()
        }))
    }
}

#[async_trait]
impl SearchBackend for InMemoryStore {
    async fn search(&self, resource_type: &str, query: &SearchQuery) -> Result<SearchPage> {
        let records = self
            .records
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        let mut hits: Vec<Value> = records
            .get(resource_type)
            .map(|bucket| {
                bucket
                    .iter()
                    .filter(|r| query.must.iter().all(|f| filter_matches(f, r)))
                    .filter(|r| !query.must_not.iter().any(|f| filter_matches(f, r)))
                    .filter(|r| query.matches_all_text() || text_matches(&query.text, &query.text_fields, r))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        hits.sort_by(|a, b| compare_records(a, b, query.sort.keys()));

        let total = hits.len();
        let records = hits
            .into_iter()
            .skip(query.offset())
            .take(query.per_page)
            .collect();

        Ok(SearchPage { records, total })
    }
}

fn record_id(record: &Value) -> Option<String> {
    match record.get("id") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

/// Resolve a dotted path through nested objects
fn lookup<'a>(record: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(record, |value, segment| value.get(segment))
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn values_equal(actual: &Value, expected: &Value) -> bool {
    match actual {
        Value::Array(items) => items.iter().any(|item| values_equal(item, expected)),
        _ => actual == expected || scalar_text(actual).is_some_and(|a| Some(a) == scalar_text(expected)),
    }
}

fn filter_matches(filter: &Filter, record: &Value) -> bool {
    match filter {
        Filter::Term { field, value } => lookup(record, field).is_some_and(|v| values_equal(v, value)),
        Filter::Terms { field, values } => lookup(record, field)
            .is_some_and(|v| values.iter().any(|expected| values_equal(v, expected))),
    }
}

/// Every term must appear, case-insensitively, in one of the text fields
fn text_matches(text: &str, fields: &[String], record: &Value) -> bool {
    let haystack: Vec<String> = fields
        .iter()
        .filter_map(|field| lookup(record, field))
        .filter_map(scalar_text)
        .map(|s| s.to_lowercase())
        .collect();

    text.split_whitespace()
        .map(|term| term.trim_matches('*').to_lowercase())
        .filter(|term| !term.is_empty())
        .all(|term| haystack.iter().any(|h| h.contains(&term)))
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => a.to_string().cmp(&b.to_string()),
    }
}

fn compare_field(a: &Value, b: &Value, sort: &FieldSort) -> Ordering {
    let present = |r: &Value| lookup(r, &sort.field).filter(|v| !v.is_null()).cloned();
    let missing_first = sort.missing == Missing::First;

    match (present(a), present(b)) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) if missing_first => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) if missing_first => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(x), Some(y)) => {
            let ordering = compare_values(&x, &y);
            match sort.order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        }
    }
}

fn compare_records(a: &Value, b: &Value, keys: &[SortKey]) -> Ordering {
    for key in keys {
        let ordering = match key {
            SortKey::Field(sort) => compare_field(a, b, sort),
            SortKey::Relevance => Ordering::Equal,
            SortKey::Id => record_id(a).cmp(&record_id(b)),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

// =============================================================================
// Handlers
// =============================================================================

/// Create/update/delete handler writing straight into an [`InMemoryStore`]
///
/// Created records are stamped with the principal's tenant when a tenant
/// field is configured.
#[derive(Clone)]
pub struct StoreHandler {
    store: Arc<InMemoryStore>,
    tenant_field: Option<String>,
}

impl StoreHandler {
    /// Input parameters minus the keys that identify and scope a record
    fn writable(&self, mut params: Map<String, Value>) -> Map<String, Value> {
        params.remove("id");
        if let Some(field) = &self.tenant_field {
            params.remove(field);
        }
        params
    }

    pub fn new(store: Arc<InMemoryStore>) -> Self {
        Self {
            store,
            tenant_field: None,
        }
    }

    pub fn with_tenant_field(mut self, field: impl Into<String>) -> Self {
        self.tenant_field = Some(field.into());
        self
    }

    /// The same handler shared for create, update and delete
    pub fn shared(self) -> Arc<dyn Handler> {
        Arc::new(self)
    }
}

#[async_trait]
impl Handler for StoreHandler {
    async fn run(&self, input: HandlerInput) -> Result<Outcome> {
        match input.action {
            Action::Create => {
                let mut record = self.writable(input.params);
                if let Some(field) = &self.tenant_field {
                    record.insert(field.clone(), Value::String(input.principal.tenant_id));
                }
                Ok(Outcome::Success(
                    self.store.insert(&input.resource_type, Value::Object(record)),
                ))
            }
            Action::Update => {
                let Some(Value::Object(mut record)) = input.record else {
                    return Ok(Outcome::invalid("base", "record is missing"));
                };
                record.extend(self.writable(input.params));
                Ok(Outcome::Success(
                    self.store.insert(&input.resource_type, Value::Object(record)),
                ))
            }
            Action::Destroy => {
                let id = input.id.unwrap_or_default();
                Ok(Outcome::Success(
                    self.store
                        .remove(&input.resource_type, &id)
                        .map_or(Value::Bool(false), |_| Value::Bool(true)),
                ))
            }
            Action::Read => Err(anyhow!("read is not a handler action")),
        }
    }
}
