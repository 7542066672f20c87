//! Logging setup, request spans and error reporting

use crate::core::error::ApiError;
use crate::server::dispatcher::Caller;
use tracing::Span;
use tracing_subscriber::EnvFilter;

/// Default `RUST_LOG`-style directive
pub const DEFAULT_LOG_FILTER: &str = "resource_api=info,tower_http=info";

/// Install a fmt subscriber filtered by `RUST_LOG`
///
/// Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    init_tracing_with(DEFAULT_LOG_FILTER);
}

pub fn init_tracing_with(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Span wrapping one dispatched request
pub fn request_span(caller: &Caller, resource: &str, action: &str) -> Span {
    tracing::info_span!(
        "api_request",
        resource = %resource,
        action = %action,
        credential_id = %caller.credential_id,
        principal_id = %caller.principal.id,
        user_id = %caller.principal.user_id,
        tenant_id = %caller.principal.tenant_id,
    )
}

/// Receives server-side faults (500s) for out-of-band reporting
pub trait ErrorReporter: Send + Sync {
    fn report(&self, error: &ApiError);
}

/// Reports through `tracing` at error level
#[derive(Debug, Default, Clone)]
pub struct TracingReporter;

impl ErrorReporter for TracingReporter {
    fn report(&self, error: &ApiError) {
        tracing::error!(code = error.error_code(), error = %error, "request failed with server error");
    }
}
