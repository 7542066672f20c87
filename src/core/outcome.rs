//! Business-logic handler protocol
//!
//! Create, update and destroy delegate to a [`Handler`]. A handler returns an
//! [`Outcome`]: either a success payload or field-scoped validation errors.
//! Anything else it wants to signal is an `Err`, which renders as a 500.

use crate::core::auth::{Action, Principal};
use crate::core::error::{ApiError, FieldError};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::future::Future;
use std::sync::Arc;

/// Result of a business-logic invocation
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success(Value),
    Invalid(Vec<FieldError>),
}

impl Outcome {
    pub fn success(value: impl Into<Value>) -> Self {
        Outcome::Success(value.into())
    }

    /// Single validation error on a snake_case attribute
    pub fn invalid(attribute: &str, message: impl Into<String>) -> Self {
        Outcome::Invalid(vec![FieldError::new(attribute, message)])
    }

    /// Convert into the dispatcher's result
    ///
    /// A success without a result (`null` or `false`) counts as a failure.
    pub fn into_result(self) -> Result<Value, ApiError> {
        match self {
            Outcome::Success(Value::Null) | Outcome::Success(Value::Bool(false)) => {
                Err(ApiError::ValidationFailed(vec![FieldError::new(
                    "base",
                    "operation could not be completed",
                )]))
            }
            Outcome::Success(value) => Ok(value),
            Outcome::Invalid(errors) => Err(ApiError::ValidationFailed(errors)),
        }
    }
}

/// Everything a handler receives
#[derive(Debug, Clone)]
pub struct HandlerInput {
    pub action: Action,
    pub resource_type: String,
    /// Target record id (update, destroy)
    pub id: Option<String>,
    /// Loaded target record (update)
    pub record: Option<Value>,
    /// Declared input attributes from the request body
    pub params: Map<String, Value>,
    pub principal: Principal,
}

#[async_trait]
pub trait Handler: Send + Sync {
    async fn run(&self, input: HandlerInput) -> Result<Outcome>;
}

/// Handler backed by an async closure
pub struct FnHandler<F>(F);

#[async_trait]
impl<F, Fut> Handler for FnHandler<F>
where
    F: Fn(HandlerInput) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Outcome>> + Send,
{
    async fn run(&self, input: HandlerInput) -> Result<Outcome> {
        (self.0)(input).await
    }
}

/// Wrap an async closure as a shared handler
///
/// ```rust,ignore
/// let create = handler_fn(|input: HandlerInput| async move {
///     Ok(Outcome::success(serde_json::Value::Object(input.params)))
/// });
/// ```
pub fn handler_fn<F, Fut>(f: F) -> Arc<dyn Handler>
where
    F: Fn(HandlerInput) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Outcome>> + Send + 'static,
{
    Arc::new(FnHandler(f))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_into_result() {
        assert_eq!(
            Outcome::success(json!({ "id": "r-1" })).into_result().unwrap(),
            json!({ "id": "r-1" })
        );
    }

    #[test]
    fn test_empty_success_is_failure() {
        for value in [Value::Null, Value::Bool(false)] {
            let err = Outcome::Success(value).into_result().unwrap_err();
            assert!(matches!(err, ApiError::ValidationFailed(ref e) if e.len() == 1));
        }
    }

    #[test]
    fn test_invalid_into_result() {
        let err = Outcome::invalid("due_date", "must be in the future")
            .into_result()
            .unwrap_err();
        match err {
            ApiError::ValidationFailed(errors) => {
                assert_eq!(errors, vec![FieldError::new("due_date", "must be in the future")]);
                assert_eq!(errors[0].path, "dueDate");
            }
            other => panic!("Expected ValidationFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_handler_fn() {
        let handler = handler_fn(|input: HandlerInput| async move {
            Ok(Outcome::success(json!({ "by": input.principal.id })))
        });
        let outcome = handler
            .run(HandlerInput {
                action: Action::Create,
                resource_type: "risk".into(),
                id: None,
                record: None,
                params: Map::new(),
                principal: Principal::new("cu-1", "u-1", "c-1"),
            })
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::success(json!({ "by": "cu-1" })));
    }
}
