//! CRUD dispatcher
//!
//! Turns a request for an arbitrary registered resource into an authorized,
//! tenant-scoped search or a business-logic handler invocation:
//!
//! ```text
//! list     endpoint permission → validate q/sort/include → scope → search → serialize
//! show     endpoint permission → load + record ability → serialize
//! create   endpoint permission → related checks → inputs → required → handler
//! update   endpoint permission → load + record ability → related checks → inputs → handler
//! destroy  endpoint permission → load + record ability → handler → confirmation
//! ```
//!
//! Authentication happens before the dispatcher is reached; every failure
//! before the backend or handler call short-circuits without calling it.

use crate::core::auth::{Action, PermissionOracle, Principal};
use crate::core::credential::Credential;
use crate::core::error::{ApiError, ApiResult, FieldError};
use crate::core::expression::parse_expression;
use crate::core::filter::{FieldType, Filter, map_clauses, parse_sort};
use crate::core::include::{IncludeTree, parse_paths};
use crate::core::outcome::HandlerInput;
use crate::core::query::{PaginationMeta, QueryParams};
use crate::core::search::{RecordStore, SearchBackend, SearchQuery};
use crate::core::serializer::{Payload, SerializeContext, destroyed_message};
use crate::server::registry::{ResourceEntry, ResourceRegistry};
use serde_json::{Map, Value};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// An authenticated caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub credential_id: String,
    pub principal: Principal,
}

impl From<Credential> for Caller {
    fn from(credential: Credential) -> Self {
        Self {
            credential_id: credential.id,
            principal: credential.principal,
        }
    }
}

/// Orchestrates CRUD operations over the registry
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<ResourceRegistry>,
    permissions: Arc<dyn PermissionOracle>,
    search: Arc<dyn SearchBackend>,
    records: Arc<dyn RecordStore>,
    timeout: Duration,
}

impl Dispatcher {
    pub fn new(
        registry: Arc<ResourceRegistry>,
        permissions: Arc<dyn PermissionOracle>,
        search: Arc<dyn SearchBackend>,
        records: Arc<dyn RecordStore>,
        timeout: Duration,
    ) -> Self {
        Self {
            registry,
            permissions,
            search,
            records,
            timeout,
        }
    }

    pub fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }

    /// Look up a resource by route identity
    pub fn resource(&self, name: &str) -> ApiResult<Arc<ResourceEntry>> {
        self.registry.get(name).ok_or_else(ApiError::url_not_found)
    }

    // =========================================================================
    // Operations
    // =========================================================================

    pub async fn list(&self, caller: &Caller, resource: &str, params: &QueryParams) -> ApiResult<Value> {
        let entry = self.resource(resource)?;
        self.authorize_endpoint(caller, &entry).await?;

        let query = self.build_query(caller, &entry, params).await?;
        tracing::debug!(resource, query = %query.to_body(), "search query");

        let descriptor = &entry.descriptor;
        let page = self
            .bounded("search", self.search.search(&descriptor.resource_type, &query))
            .await?;
        let meta = PaginationMeta::new(query.page, query.per_page, page.total);

        let ctx = serialize_context(caller, params);
        Ok(entry.serializer.serialize(
            Payload::Many {
                records: &page.records,
                meta: &meta,
            },
            &ctx,
        )?)
    }

    pub async fn show(
        &self,
        caller: &Caller,
        resource: &str,
        id: &str,
        params: &QueryParams,
    ) -> ApiResult<Value> {
        let entry = self.resource(resource)?;
        self.authorize_endpoint(caller, &entry).await?;
        IncludeTree::parse(params.include.as_deref().unwrap_or(""))
            .ensure_includable(&entry.descriptor.includable)?;

        let record = self.load_authorized(caller, &entry, id, Action::Read).await?;

        let ctx = serialize_context(caller, params);
        Ok(entry.serializer.serialize(Payload::One(&record), &ctx)?)
    }

    pub async fn create(&self, caller: &Caller, resource: &str, body: Value) -> ApiResult<Value> {
        let entry = self.resource(resource)?;
        self.authorize_endpoint(caller, &entry).await?;
        let handler = entry.handler(Action::Create)?;

        let body = into_object(body)?;
        self.check_related(caller, &entry, &body).await?;
        let params = declared_inputs(&entry, Action::Create, body)?;

        let input = HandlerInput {
            action: Action::Create,
            resource_type: entry.descriptor.resource_type.clone(),
            id: None,
            record: None,
            params,
            principal: caller.principal.clone(),
        };
        let created = self.bounded("create handler", handler.run(input)).await?.into_result()?;

        let ctx = serialize_context(caller, &QueryParams::default());
        Ok(entry.serializer.serialize(Payload::One(&created), &ctx)?)
    }

    pub async fn update(
        &self,
        caller: &Caller,
        resource: &str,
        id: &str,
        body: Value,
    ) -> ApiResult<Value> {
        let entry = self.resource(resource)?;
        self.authorize_endpoint(caller, &entry).await?;
        let handler = entry.handler(Action::Update)?;

        let record = self.load_authorized(caller, &entry, id, Action::Update).await?;
        let body = into_object(body)?;
        self.check_related(caller, &entry, &body).await?;
        let params = declared_inputs(&entry, Action::Update, body)?;

        let input = HandlerInput {
            action: Action::Update,
            resource_type: entry.descriptor.resource_type.clone(),
            id: Some(id.to_string()),
            record: Some(record),
            params,
            principal: caller.principal.clone(),
        };
        let updated = self.bounded("update handler", handler.run(input)).await?.into_result()?;

        let ctx = serialize_context(caller, &QueryParams::default());
        Ok(entry.serializer.serialize(Payload::One(&updated), &ctx)?)
    }

    pub async fn destroy(&self, caller: &Caller, resource: &str, id: &str) -> ApiResult<Value> {
        let entry = self.resource(resource)?;
        self.authorize_endpoint(caller, &entry).await?;
        let handler = entry.handler(Action::Destroy)?;

        self.load_authorized(caller, &entry, id, Action::Destroy).await?;

        let input = HandlerInput {
            action: Action::Destroy,
            resource_type: entry.descriptor.resource_type.clone(),
            id: Some(id.to_string()),
            record: None,
            params: Map::new(),
            principal: caller.principal.clone(),
        };
        self.bounded("delete handler", handler.run(input)).await?.into_result()?;

        Ok(destroyed_message(&entry.descriptor.model_name))
    }

    // =========================================================================
    // Query construction
    // =========================================================================

    /// Build the search query for a list request
    ///
    /// User input is validated first; the base scope (resource defaults, then
    /// tenant or accessible-id scope) always precedes user filters in `must`.
    pub async fn build_query(
        &self,
        caller: &Caller,
        entry: &ResourceEntry,
        params: &QueryParams,
    ) -> ApiResult<SearchQuery> {
        let descriptor = &entry.descriptor;

        let parsed = parse_expression(params.q.as_deref().unwrap_or(""));
        let user = map_clauses(&parsed.clauses, &descriptor.fields, &descriptor.model_name)?;
        let sort = parse_sort(params.sort.as_deref(), &descriptor.fields, &descriptor.model_name)?;

        let mut includes = IncludeTree::parse(params.include.as_deref().unwrap_or(""));
        includes.ensure_includable(&descriptor.includable)?;
        includes.merge(&descriptor.default_includes);

        let mut must = descriptor.default_filters.clone();
        match &descriptor.tenant_field {
            Some(field) => must.push(Filter::term(field.clone(), caller.principal.tenant_id.clone())),
            None => {
                let ids = self
                    .bounded("accessible ids", entry.authorizer.accessible_ids(&caller.principal))
                    .await?;
                must.push(Filter::terms("id", ids));
            }
        }
        must.extend(user.must);

        Ok(SearchQuery {
            must,
            must_not: user.must_not,
            text: parsed.text,
            text_fields: descriptor
                .fields
                .values()
                .filter(|mapping| mapping.field_type == FieldType::Text)
                .map(|mapping| mapping.key.clone())
                .collect(),
            sort,
            page: params.page(),
            per_page: params.per_page(descriptor.per_page, descriptor.max_per_page),
            includes,
        })
    }

    // =========================================================================
    // Authorization
    // =========================================================================

    async fn authorize_endpoint(&self, caller: &Caller, entry: &ResourceEntry) -> ApiResult<()> {
        let Some(permission) = &entry.descriptor.permission else {
            return Ok(());
        };
        let granted = self
            .bounded(
                "permission check",
                self.permissions.has_permission(&caller.principal, permission),
            )
            .await?;
        if granted {
            Ok(())
        } else {
            tracing::debug!(principal_id = %caller.principal.id, permission = %permission, "permission denied");
            Err(ApiError::Forbidden)
        }
    }

    /// Load a record and check the principal's ability on it
    async fn load_authorized(
        &self,
        caller: &Caller,
        entry: &ResourceEntry,
        id: &str,
        action: Action,
    ) -> ApiResult<Value> {
        let descriptor = &entry.descriptor;
        let record = self
            .bounded("record lookup", self.records.find(&descriptor.resource_type, id))
            .await?
            .ok_or_else(|| ApiError::not_found(&descriptor.model_name))?;

        let allowed = self
            .bounded(
                "record authorization",
                entry.authorizer.authorize(&caller.principal, action, &record),
            )
            .await?;
        if allowed {
            Ok(record)
        } else {
            tracing::debug!(
                principal_id = %caller.principal.id,
                resource = %descriptor.name,
                %action,
                "record ability denied"
            );
            Err(ApiError::Forbidden)
        }
    }

    /// Authorize records referenced by input parameters
    async fn check_related(
        &self,
        caller: &Caller,
        entry: &ResourceEntry,
        body: &Map<String, Value>,
    ) -> ApiResult<()> {
        for check in &entry.descriptor.related {
            let id = match body.get(&check.param) {
                None | Some(Value::Null) => continue,
                Some(Value::String(s)) if s.is_empty() => continue,
                Some(Value::String(s)) => s.clone(),
                Some(Value::Number(n)) => n.to_string(),
                Some(_) => {
                    return Err(ApiError::ValidationFailed(vec![FieldError::new(
                        &check.param,
                        "must be an identifier",
                    )]));
                }
            };
            let target = self.registry.get(&check.resource).ok_or_else(|| {
                ApiError::Internal(format!("related resource '{}' is not registered", check.resource))
            })?;
            self.load_authorized(caller, &target, &id, check.action).await?;
        }
        Ok(())
    }

    /// Await a collaborator call under the backend timeout
    async fn bounded<T, F>(&self, what: &str, call: F) -> ApiResult<T>
    where
        F: Future<Output = anyhow::Result<T>>,
    {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result.map_err(ApiError::from),
            Err(_) => Err(ApiError::Internal(format!(
                "{} timed out after {:?}",
                what, self.timeout
            ))),
        }
    }
}

fn serialize_context(caller: &Caller, params: &QueryParams) -> SerializeContext {
    SerializeContext {
        tenant_id: caller.principal.tenant_id.clone(),
        principal_id: caller.principal.id.clone(),
        relationships: params.relationships(),
        include: parse_paths(params.include.as_deref().unwrap_or("")),
    }
}

fn into_object(body: Value) -> ApiResult<Map<String, Value>> {
    match body {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        _ => Err(ApiError::bad_input("Request body must be a JSON object")),
    }
}

/// Keep declared inputs only, then check required ones
///
/// Each missing required input yields exactly one field error.
fn declared_inputs(
    entry: &ResourceEntry,
    action: Action,
    mut body: Map<String, Value>,
) -> ApiResult<Map<String, Value>> {
    let inputs = entry.descriptor.inputs(action);
    let mut params = Map::new();
    let mut missing = Vec::new();

    for input in inputs {
        match body.remove(&input.name) {
            Some(value) if !is_blank(&value) => {
                params.insert(input.name.clone(), value);
            }
            present => {
                if input.required {
                    missing.push(FieldError::new(&input.name, "can't be blank"));
                } else if let Some(value) = present {
                    params.insert(input.name.clone(), value);
                }
            }
        }
    }

    if missing.is_empty() {
        Ok(params)
    } else {
        Err(ApiError::ValidationFailed(missing))
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ApiConfig, ResourceConfig};
    use crate::core::auth::{AbilityPolicy, RecordAuthorizer, StaticPermissions};
    use crate::core::filter::{FieldType, SortKey};
    use crate::core::outcome::{Handler, Outcome, handler_fn};
    use crate::core::search::SearchPage;
    use crate::server::registry::Catalog;
    use crate::storage::InMemoryStore;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Search backend counting calls and returning nothing
    #[derive(Default)]
    struct CountingSearch {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SearchBackend for CountingSearch {
        async fn search(&self, _: &str, _: &SearchQuery) -> anyhow::Result<SearchPage> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(SearchPage::default())
        }
    }

    struct SlowSearch;

    #[async_trait]
    impl SearchBackend for SlowSearch {
        async fn search(&self, _: &str, _: &SearchQuery) -> anyhow::Result<SearchPage> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(SearchPage::default())
        }
    }

    struct ListedIds;

    #[async_trait]
    impl RecordAuthorizer for ListedIds {
        async fn authorize(&self, _: &Principal, _: Action, _: &Value) -> anyhow::Result<bool> {
            Ok(true)
        }

        async fn accessible_ids(&self, _: &Principal) -> anyhow::Result<Vec<String>> {
            Ok(vec!["f-1".into(), "f-2".into()])
        }
    }

    fn caller() -> Caller {
        Caller {
            credential_id: "k-1".into(),
            principal: Principal::new("cu-1", "u-1", "c-1"),
        }
    }

    fn tests_resource() -> ResourceConfig {
        ResourceConfig::new("company_tests")
            .permission("tests")
            .tenant_field("company_id")
            .default_filter(Filter::term("visible", true))
            .default_include("owner")
            .field("name", FieldType::Text)
            .field("id", FieldType::Text)
            .field("company_id", FieldType::Text)
            .field_as("owner", "owner_id", FieldType::Text)
            .create_input("name", true)
            .create_input("description", false)
            .create_input("owner_id", false)
            .update_input("name", false)
            .related("owner_id", "company_users", Action::Update)
    }

    fn users_resource() -> ResourceConfig {
        ResourceConfig::new("company_users").tenant_field("company_id")
    }

    fn echo_handler() -> Arc<dyn Handler> {
        handler_fn(|input: HandlerInput| async move {
            let mut record = input.params;
            record.insert("id".into(), json!(input.id.unwrap_or_else(|| "new".into())));
            Ok(Outcome::Success(Value::Object(record)))
        })
    }

    fn dispatcher_with(
        search: Arc<dyn SearchBackend>,
        store: Arc<InMemoryStore>,
        catalog: Catalog,
        timeout: Duration,
    ) -> Dispatcher {
        let registry = ResourceRegistry::build(
            vec![tests_resource(), users_resource(), ResourceConfig::new("frameworks")],
            &ApiConfig::default(),
            &catalog,
        )
        .unwrap();
        Dispatcher::new(
            Arc::new(registry),
            Arc::new(StaticPermissions::new().grant("cu-1", "tests")),
            search,
            store,
            timeout,
        )
    }

    fn dispatcher() -> (Dispatcher, Arc<InMemoryStore>, Arc<CountingSearch>) {
        let store = Arc::new(InMemoryStore::new());
        let search = Arc::new(CountingSearch::default());
        let mut catalog = Catalog::default();
        for identity in ["CompanyTests::Create", "CompanyTests::Update", "CompanyTests::Delete"] {
            catalog.handlers.insert(identity.into(), echo_handler());
        }
        (
            dispatcher_with(search.clone(), store.clone(), catalog, Duration::from_secs(5)),
            store,
            search,
        )
    }

    fn params(q: Option<&str>, sort: Option<&str>) -> QueryParams {
        QueryParams {
            q: q.map(String::from),
            sort: sort.map(String::from),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_tenant_scope_precedes_user_filters() {
        let (dispatcher, _, _) = dispatcher();
        let entry = dispatcher.resource("company_tests").unwrap();
        let crafted = params(Some("company_id:c-2 -company_id:c-1 name:x"), None);

        let query = dispatcher.build_query(&caller(), &entry, &crafted).await.unwrap();
        assert_eq!(query.must[0], Filter::term("visible", true));
        assert_eq!(query.must[1], Filter::term("company_id", "c-1"));
        assert_eq!(query.must[2], Filter::term("company_id", "c-2"));
        assert_eq!(query.must_not, vec![Filter::term("company_id", "c-1")]);
    }

    #[tokio::test]
    async fn test_accessible_ids_scope_without_tenant_field() {
        let mut catalog = Catalog::default();
        catalog.authorizers.insert("frameworks".into(), Arc::new(ListedIds));
        let dispatcher = dispatcher_with(
            Arc::new(CountingSearch::default()),
            Arc::new(InMemoryStore::new()),
            catalog,
            Duration::from_secs(5),
        );
        let entry = dispatcher.resource("frameworks").unwrap();

        let query = dispatcher
            .build_query(&caller(), &entry, &QueryParams::default())
            .await
            .unwrap();
        assert_eq!(query.must, vec![Filter::terms("id", ["f-1", "f-2"])]);
    }

    #[tokio::test]
    async fn test_query_defaults() {
        let (dispatcher, _, _) = dispatcher();
        let entry = dispatcher.resource("company_tests").unwrap();
        let query = dispatcher
            .build_query(&caller(), &entry, &params(None, Some("-name")))
            .await
            .unwrap();
        assert_eq!(query.text, "*");
        assert_eq!(query.text_fields, vec!["name", "id", "company_id", "owner_id"]);
        assert_eq!((query.page, query.per_page), (1, 1000));
        assert_eq!(query.sort.keys().len(), 3);
        assert_eq!(query.sort.keys()[1..], [SortKey::Relevance, SortKey::Id]);
        assert_eq!(query.includes.to_value(), json!(["owner"]));
    }

    #[tokio::test]
    async fn test_bad_filter_never_reaches_backend() {
        let (dispatcher, _, search) = dispatcher();
        let err = dispatcher
            .list(&caller(), "company_tests", &params(Some("color:red"), None))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::BadFilter { .. }));

        let err = dispatcher
            .list(&caller(), "company_tests", &params(None, Some("color")))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::BadSort { .. }));
        assert_eq!(search.calls.load(Ordering::SeqCst), 0);

        dispatcher
            .list(&caller(), "company_tests", &QueryParams::default())
            .await
            .unwrap();
        assert_eq!(search.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unknown_resource_is_not_found() {
        let (dispatcher, _, _) = dispatcher();
        let err = dispatcher
            .list(&caller(), "widgets", &QueryParams::default())
            .await
            .unwrap_err();
        assert_eq!(err.public_message(), "URL not found");
    }

    #[tokio::test]
    async fn test_missing_permission_is_forbidden() {
        let (dispatcher, _, search) = dispatcher();
        let stranger = Caller {
            credential_id: "k-2".into(),
            principal: Principal::new("cu-2", "u-2", "c-1"),
        };
        let err = dispatcher
            .list(&stranger, "company_tests", &QueryParams::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Forbidden));
        assert_eq!(search.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_show_not_found_vs_forbidden() {
        let (dispatcher, store, _) = dispatcher();
        store.insert("company_test", json!({ "id": "t-other", "company_id": "c-2" }));
        store.insert("company_test", json!({ "id": "t-own", "company_id": "c-1" }));

        let err = dispatcher
            .show(&caller(), "company_tests", "t-missing", &QueryParams::default())
            .await
            .unwrap_err();
        assert_eq!(err.public_message(), "Company test not found");

        let err = dispatcher
            .show(&caller(), "company_tests", "t-other", &QueryParams::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Forbidden));

        let body = dispatcher
            .show(&caller(), "company_tests", "t-own", &QueryParams::default())
            .await
            .unwrap();
        assert_eq!(body["data"]["id"], "t-own");
    }

    #[tokio::test]
    async fn test_create_filters_inputs_and_requires_fields() {
        let (dispatcher, _, _) = dispatcher();

        let err = dispatcher
            .create(&caller(), "company_tests", json!({ "description": "d" }))
            .await
            .unwrap_err();
        match err {
            ApiError::ValidationFailed(errors) => {
                assert_eq!(errors, vec![FieldError::new("name", "can't be blank")]);
            }
            other => panic!("Expected ValidationFailed, got {:?}", other),
        }

        let body = dispatcher
            .create(
                &caller(),
                "company_tests",
                json!({ "name": "Backups", "company_id": "c-2", "admin": true }),
            )
            .await
            .unwrap();
        assert_eq!(body["data"], json!({ "name": "Backups", "id": "new" }));
    }

    #[tokio::test]
    async fn test_related_record_checks() {
        let (dispatcher, store, _) = dispatcher();
        store.insert("company_user", json!({ "id": "cu-own", "company_id": "c-1" }));
        store.insert("company_user", json!({ "id": "cu-other", "company_id": "c-2" }));

        let ok = dispatcher
            .create(&caller(), "company_tests", json!({ "name": "n", "owner_id": "cu-own" }))
            .await;
        assert!(ok.is_ok());

        let err = dispatcher
            .create(&caller(), "company_tests", json!({ "name": "n", "owner_id": "cu-other" }))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Forbidden));

        let err = dispatcher
            .create(&caller(), "company_tests", json!({ "name": "n", "owner_id": "cu-none" }))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_destroy_renders_confirmation() {
        let (dispatcher, store, _) = dispatcher();
        store.insert("company_test", json!({ "id": "t-1", "company_id": "c-1" }));

        let body = dispatcher.destroy(&caller(), "company_tests", "t-1").await.unwrap();
        assert_eq!(body, json!({ "message": "Company test deleted successfully" }));
    }

    #[tokio::test]
    async fn test_missing_handler_is_config_error() {
        let store = Arc::new(InMemoryStore::new());
        let dispatcher = dispatcher_with(
            Arc::new(CountingSearch::default()),
            store,
            Catalog::default(),
            Duration::from_secs(5),
        );
        let err = dispatcher
            .create(&caller(), "company_tests", json!({ "name": "n" }))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Config(_)));
        assert!(err.is_internal());
    }

    #[tokio::test]
    async fn test_backend_timeout_is_internal() {
        let dispatcher = dispatcher_with(
            Arc::new(SlowSearch),
            Arc::new(InMemoryStore::new()),
            Catalog::default(),
            Duration::from_millis(20),
        );
        let err = dispatcher
            .list(&caller(), "company_tests", &QueryParams::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Internal(_)));
    }

    #[tokio::test]
    async fn test_record_policy_from_ability() {
        let registry = ResourceRegistry::build(
            vec![ResourceConfig::new("notes").ability("owner:author_id")],
            &ApiConfig::default(),
            &Catalog::default(),
        )
        .unwrap();
        let entry = registry.get("notes").unwrap();
        let allowed = entry
            .authorizer
            .authorize(&caller().principal, Action::Read, &json!({ "author_id": "cu-1" }))
            .await
            .unwrap();
        assert!(allowed);
        assert!(matches!(
            AbilityPolicy::parse_policy("owner:author_id"),
            AbilityPolicy::Owner(_)
        ));
    }

    #[test]
    fn test_non_object_body_rejected() {
        assert!(into_object(json!([1, 2])).is_err());
        assert!(into_object(Value::Null).unwrap().is_empty());
    }
}
