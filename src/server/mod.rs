//! Server module: resource registry, CRUD dispatcher and HTTP surface
//!
//! `ServerBuilder` resolves every declared resource once and exposes them all
//! through the same generic routes:
//! - `GET|POST /{resource}`
//! - `GET|PUT|PATCH|DELETE /{resource}/{id}`
//! - `GET /health`

pub mod builder;
pub mod dispatcher;
pub mod handlers;
pub mod registry;
pub mod router;
pub mod telemetry;

pub use builder::ServerBuilder;
pub use dispatcher::{Caller, Dispatcher};
pub use handlers::ApiState;
pub use registry::{Catalog, ResourceDescriptor, ResourceEntry, ResourceRegistry};
pub use telemetry::{ErrorReporter, TracingReporter, init_tracing};
