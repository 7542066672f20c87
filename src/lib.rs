//! # resource-api
//!
//! A convention-driven CRUD engine for tenant-scoped REST resources.
//!
//! Declare a resource by name and the engine derives the rest: its model
//! name, permission, serializer and business-logic handlers. Every request
//! goes through the same pipeline:
//!
//! - **Authentication**: `Authorization: <key id> <secret>` checked against a credential store
//! - **Endpoint authorization**: the caller must hold the resource's permission
//! - **Query language**: `q=field:value -field:value free text`, validated against the declared fields
//! - **Tenant scoping**: every search is restricted to the caller's tenant or authorized ids
//! - **Record authorization**: show, update and destroy check the loaded record
//! - **Serialization**: `data`, `meta` for lists, `included` for requested relationships
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use resource_api::prelude::*;
//!
//! let store = Arc::new(InMemoryStore::new());
//! let app = ServerBuilder::new()
//!     .with_credential_store(Arc::new(InMemoryCredentialStore::new()))
//!     .with_permission_oracle(StaticPermissions::new().grant("cu-1", "risks"))
//!     .with_search_backend(store.clone())
//!     .with_record_store(store.clone())
//!     .register_resource(
//!         ResourceConfig::new("risks")
//!             .tenant_field("company_id")
//!             .field("name", FieldType::Text)
//!             .create_input("name", true),
//!     )
//!     .register_handler("Risks::Create", StoreHandler::new(store).shared())
//!     .build()?;
//! ```

pub mod config;
pub mod core;
pub mod server;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core ===
    pub use crate::core::{
        auth::{
            AbilityPolicy, Action, AllowAllPermissions, PermissionOracle, Principal,
            RecordAuthorizer, StaticPermissions,
        },
        credential::{ApiKeyAuthenticator, Credential, CredentialStore},
        error::{ApiError, ApiResult, ConfigError, FieldError},
        filter::{FieldMapping, FieldTable, FieldType, Filter},
        include::IncludeTree,
        outcome::{Handler, HandlerInput, Outcome, handler_fn},
        pluralize::Pluralizer,
        query::{PaginationMeta, QueryParams},
        search::{RecordStore, SearchBackend, SearchPage, SearchQuery},
        serializer::{JsonSerializer, Payload, SerializeContext, Serializer},
    };

    // === Config ===
    pub use crate::config::{ApiConfig, ResourceConfig};

    // === Storage ===
    pub use crate::storage::{InMemoryCredentialStore, InMemoryStore, StoreHandler};

    // === Server ===
    pub use crate::server::{
        ApiState, Caller, Dispatcher, ErrorReporter, ResourceDescriptor, ResourceRegistry,
        ServerBuilder, init_tracing,
    };

    // === External dependencies ===
    pub use anyhow::Result;
    pub use async_trait::async_trait;
    pub use chrono::{DateTime, Utc};
    pub use serde::{Deserialize, Serialize};
    pub use serde_json::{Value, json};
    pub use std::sync::Arc;

    // === Axum ===
    pub use axum::{
        Router,
        extract::{Path, State},
        routing::{delete, get, post, put},
    };
}
