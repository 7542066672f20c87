//! Core module containing the query language, authorization model and
//! collaborator contracts of the resource API

pub mod auth;
pub mod credential;
pub mod error;
pub mod expression;
pub mod filter;
pub mod include;
pub mod outcome;
pub mod pluralize;
pub mod query;
pub mod search;
pub mod serializer;

pub use auth::{
    AbilityPolicy, Action, AllowAllPermissions, PermissionOracle, Principal, RecordAuthorizer,
    StaticPermissions,
};
pub use credential::{ApiKeyAuthenticator, Credential, CredentialStore};
pub use error::{ApiError, ApiResult, ConfigError, FieldError};
pub use expression::{FilterClause, ParsedExpression, parse_expression};
pub use filter::{FieldMapping, FieldTable, FieldType, Filter, SortKey, SortSpec};
pub use include::IncludeTree;
pub use outcome::{Handler, HandlerInput, Outcome, handler_fn};
pub use pluralize::Pluralizer;
pub use query::{PaginationMeta, QueryParams};
pub use search::{RecordStore, SearchBackend, SearchPage, SearchQuery};
pub use serializer::{JsonSerializer, Payload, SerializeContext, Serializer};
