//! ServerBuilder for fluent API to build HTTP servers

use super::dispatcher::Dispatcher;
use super::handlers::ApiState;
use super::registry::{Catalog, ResourceRegistry};
use super::router::build_resource_routes;
use super::telemetry::{ErrorReporter, TracingReporter};
use crate::config::{ApiConfig, ResourceConfig};
use crate::core::auth::{PermissionOracle, RecordAuthorizer};
use crate::core::credential::{ApiKeyAuthenticator, CredentialStore};
use crate::core::outcome::Handler;
use crate::core::search::{RecordStore, SearchBackend};
use crate::core::serializer::Serializer;
use anyhow::Result;
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Builder for creating the resource API server
///
/// # Example
///
/// ```ignore
/// let store = Arc::new(InMemoryStore::new());
/// let app = ServerBuilder::new()
///     .with_config(ApiConfig::from_yaml_file("api.yaml")?.apply_env_overrides()?)
///     .with_credential_store(credentials)
///     .with_permission_oracle(StaticPermissions::new().grant("cu-1", "risks"))
///     .with_search_backend(store.clone())
///     .with_record_store(store)
///     .register_resource(ResourceConfig::new("risks").tenant_field("company_id"))
///     .register_handler("Risks::Create", create_risk)
///     .build()?;
/// ```
pub struct ServerBuilder {
    config: ApiConfig,
    resources: Vec<ResourceConfig>,
    catalog: Catalog,
    credentials: Option<Arc<dyn CredentialStore>>,
    permissions: Option<Arc<dyn PermissionOracle>>,
    search: Option<Arc<dyn SearchBackend>>,
    records: Option<Arc<dyn RecordStore>>,
    reporter: Arc<dyn ErrorReporter>,
    custom_routes: Vec<Router>,
}

impl ServerBuilder {
    /// Create a new ServerBuilder
    pub fn new() -> Self {
        Self {
            config: ApiConfig::default(),
            resources: Vec::new(),
            catalog: Catalog::default(),
            credentials: None,
            permissions: None,
            search: None,
            records: None,
            reporter: Arc::new(TracingReporter),
            custom_routes: Vec::new(),
        }
    }

    /// Set global settings and YAML-declared resources
    pub fn with_config(mut self, config: ApiConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the credential store (required)
    pub fn with_credential_store(mut self, store: Arc<dyn CredentialStore>) -> Self {
        self.credentials = Some(store);
        self
    }

    /// Set the permission oracle (required)
    pub fn with_permission_oracle(mut self, oracle: impl PermissionOracle + 'static) -> Self {
        self.permissions = Some(Arc::new(oracle));
        self
    }

    /// Set the search backend (required)
    pub fn with_search_backend(mut self, backend: Arc<dyn SearchBackend>) -> Self {
        self.search = Some(backend);
        self
    }

    /// Set the record store (required)
    pub fn with_record_store(mut self, store: Arc<dyn RecordStore>) -> Self {
        self.records = Some(store);
        self
    }

    /// Replace the default tracing-based error reporter
    pub fn with_error_reporter(mut self, reporter: impl ErrorReporter + 'static) -> Self {
        self.reporter = Arc::new(reporter);
        self
    }

    /// Add custom routes to the server
    ///
    /// Custom routes are merged before the generic resource routes, so a
    /// static path such as `/login` takes precedence over `/{resource}`.
    pub fn with_custom_routes(mut self, routes: Router) -> Self {
        self.custom_routes.push(routes);
        self
    }

    /// Declare a resource in code; YAML declarations of the same name overlay it
    pub fn register_resource(mut self, resource: ResourceConfig) -> Self {
        self.resources.push(resource);
        self
    }

    /// Register a handler under its identity (e.g. `Risks::Create`)
    pub fn register_handler(mut self, identity: impl Into<String>, handler: Arc<dyn Handler>) -> Self {
        self.catalog.handlers.insert(identity.into(), handler);
        self
    }

    /// Register a serializer under its identity (e.g. `RiskSerializer`)
    pub fn register_serializer(
        mut self,
        identity: impl Into<String>,
        serializer: impl Serializer + 'static,
    ) -> Self {
        self.catalog
            .serializers
            .insert(identity.into(), Arc::new(serializer));
        self
    }

    /// Register the record authorizer of a resource
    pub fn register_authorizer(
        mut self,
        resource: impl Into<String>,
        authorizer: impl RecordAuthorizer + 'static,
    ) -> Self {
        self.catalog
            .authorizers
            .insert(resource.into(), Arc::new(authorizer));
        self
    }

    /// Resolve every resource and assemble the shared state
    pub fn build_state(self) -> Result<ApiState> {
        let credentials = self.credentials.ok_or_else(|| {
            anyhow::anyhow!("CredentialStore is required. Call .with_credential_store()")
        })?;
        let permissions = self.permissions.ok_or_else(|| {
            anyhow::anyhow!("PermissionOracle is required. Call .with_permission_oracle()")
        })?;
        let search = self
            .search
            .ok_or_else(|| anyhow::anyhow!("SearchBackend is required. Call .with_search_backend()"))?;
        let records = self
            .records
            .ok_or_else(|| anyhow::anyhow!("RecordStore is required. Call .with_record_store()"))?;

        let registry = ResourceRegistry::build(self.resources, &self.config, &self.catalog)?;
        tracing::info!(resources = ?registry.names(), "resource registry ready");

        let dispatcher = Dispatcher::new(
            Arc::new(registry),
            permissions,
            search,
            records,
            self.config.backend_timeout(),
        );

        Ok(ApiState {
            dispatcher: Arc::new(dispatcher),
            authenticator: ApiKeyAuthenticator::new(credentials),
            reporter: self.reporter,
        })
    }

    /// Build the final router
    pub fn build(mut self) -> Result<Router> {
        let custom_routes = std::mem::take(&mut self.custom_routes);
        let state = self.build_state()?;

        let mut app = Router::new();
        for custom_router in custom_routes {
            app = app.merge(custom_router);
        }
        Ok(app.merge(build_resource_routes(state)))
    }

    /// Serve the application with graceful shutdown
    ///
    /// This will:
    /// - Bind to the provided address
    /// - Start serving requests
    /// - Handle SIGTERM and SIGINT (Ctrl+C) for graceful shutdown
    pub async fn serve(self, addr: &str) -> Result<()> {
        let app = self.build()?;
        let listener = TcpListener::bind(addr).await?;

        tracing::info!("Server listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Wait for Ctrl+C or SIGTERM
///
/// A signal handler that cannot be installed never fires; the other one
/// still triggers shutdown.
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal, initiating graceful shutdown...");
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::auth::AllowAllPermissions;
    use crate::storage::{InMemoryCredentialStore, InMemoryStore};

    fn complete() -> ServerBuilder {
        let store = Arc::new(InMemoryStore::new());
        ServerBuilder::new()
            .with_credential_store(Arc::new(InMemoryCredentialStore::new()))
            .with_permission_oracle(AllowAllPermissions)
            .with_search_backend(store.clone())
            .with_record_store(store)
    }

    #[test]
    fn test_new_creates_empty_builder() {
        let builder = ServerBuilder::new();
        assert!(builder.credentials.is_none());
        assert!(builder.permissions.is_none());
        assert!(builder.resources.is_empty());
        assert!(builder.custom_routes.is_empty());
    }

    #[test]
    fn test_build_requires_collaborators() {
        let err = ServerBuilder::new().build().err().unwrap();
        assert!(err.to_string().contains("CredentialStore is required"));

        let err = ServerBuilder::new()
            .with_credential_store(Arc::new(InMemoryCredentialStore::new()))
            .build()
            .err()
            .unwrap();
        assert!(err.to_string().contains("PermissionOracle is required"));
    }

    #[test]
    fn test_build_state_resolves_resources() {
        let state = complete()
            .register_resource(ResourceConfig::new("risks").tenant_field("company_id"))
            .register_resource(ResourceConfig::new("company_tests"))
            .build_state()
            .unwrap();
        assert_eq!(
            state.dispatcher.registry().names(),
            vec!["company_tests", "risks"]
        );
    }

    #[test]
    fn test_build_surfaces_config_errors() {
        let err = complete()
            .register_resource(ResourceConfig::new("risks"))
            .register_resource(ResourceConfig::new("risks"))
            .build()
            .err()
            .unwrap();
        assert!(err.to_string().contains("registered twice"));
    }

    #[test]
    fn test_build_with_custom_routes() {
        let custom = Router::new().route("/ping", axum::routing::get(|| async { "pong" }));
        assert!(complete().with_custom_routes(custom).build().is_ok());
    }
}
