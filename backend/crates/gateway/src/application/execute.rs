//! Operation Executor
//!
//! Runs the caller-supplied operation as its own task and captures the raw
//! outcome. A panic inside the operation is caught at the task boundary; the
//! optional timeout covers this stage only.

use kernel::error::{app_error::AppError, store::StoreError};
use std::any::Any;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::Instrument;

use crate::domain::entity::identity::Identity;
use crate::error::GatewayError;

/// Failure reported by an operation
#[derive(Debug, Error)]
pub enum OperationError {
    /// Raw, uninterpreted store failure
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Already-canonical rejection (validation, business rule, ...)
    #[error(transparent)]
    Rejected(#[from] AppError),
}

impl From<sqlx::Error> for OperationError {
    fn from(err: sqlx::Error) -> Self {
        OperationError::Store(StoreError::from(err))
    }
}

impl From<OperationError> for GatewayError {
    fn from(err: OperationError) -> Self {
        match err {
            OperationError::Store(e) => GatewayError::Store(e),
            OperationError::Rejected(e) => GatewayError::Rejected(e),
        }
    }
}

/// Result type of an operation: `Ok(None)` means "no data"
pub type OperationResult<T> = Result<Option<T>, OperationError>;

/// Captured outcome of one execution
#[derive(Debug)]
pub enum Outcome<T> {
    Data(T),
    Empty,
    Failed(GatewayError),
}

impl<T> Outcome<T> {
    /// Fold into a result, treating "no data" as not found
    pub fn into_result(self) -> Result<T, GatewayError> {
        match self {
            Outcome::Data(data) => Ok(data),
            Outcome::Empty => Err(GatewayError::NotFound),
            Outcome::Failed(e) => Err(e),
        }
    }
}

/// Operation executor
#[derive(Debug, Clone, Copy, Default)]
pub struct OperationExecutor {
    timeout: Option<Duration>,
}

impl OperationExecutor {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }

    /// Invoke `operation` for `identity` and capture its outcome
    ///
    /// The spawned task runs inside the caller's current span.
    pub async fn execute<T, F, Fut>(&self, identity: Identity, operation: F) -> Outcome<T>
    where
        T: Send + 'static,
        F: FnOnce(Identity) -> Fut,
        Fut: Future<Output = OperationResult<T>> + Send + 'static,
    {
        let mut handle = tokio::spawn(operation(identity).in_current_span());

        let joined = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, &mut handle).await {
                Ok(joined) => joined,
                Err(_) => {
                    handle.abort();
                    return Outcome::Failed(GatewayError::Timeout(limit));
                }
            },
            None => handle.await,
        };

        match joined {
            Ok(Ok(Some(data))) => Outcome::Data(data),
            Ok(Ok(None)) => Outcome::Empty,
            Ok(Err(e)) => Outcome::Failed(e.into()),
            Err(e) if e.is_panic() => {
                Outcome::Failed(GatewayError::Panicked(panic_message(e.into_panic())))
            }
            Err(e) => Outcome::Failed(GatewayError::Internal(e.to_string())),
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_object::{identity_id::IdentityId, role::Role};
    use kernel::error::kind::ErrorKind;

    fn identity() -> Identity {
        Identity::new(IdentityId::new(), Role::Staff)
    }

    #[tokio::test]
    async fn test_data_and_empty() {
        let executor = OperationExecutor::default();

        let outcome = executor
            .execute(identity(), |_| async { Ok::<_, OperationError>(Some(7)) })
            .await;
        assert!(matches!(outcome, Outcome::Data(7)));

        let outcome = executor
            .execute(identity(), |_| async { Ok::<Option<i32>, OperationError>(None) })
            .await;
        assert!(matches!(outcome.into_result(), Err(GatewayError::NotFound)));
    }

    #[tokio::test]
    async fn test_operation_receives_identity() {
        let who = identity();
        let outcome = OperationExecutor::default()
            .execute(who, |identity| async move { Ok::<_, OperationError>(Some(identity.id)) })
            .await;
        assert_eq!(outcome.into_result().unwrap(), who.id);
    }

    #[tokio::test]
    async fn test_operation_runs_inside_caller_span() {
        let _guard = tracing::subscriber::set_default(tracing_subscriber::registry());
        let span = tracing::info_span!("pipeline", request_id = "req-1");

        let outcome = OperationExecutor::default()
            .execute(identity(), |_| async {
                let name = tracing::Span::current().metadata().map(|m| m.name());
                Ok::<_, OperationError>(name)
            })
            .instrument(span)
            .await;

        assert_eq!(outcome.into_result().unwrap(), "pipeline");
    }

    #[tokio::test]
    async fn test_store_error_is_passed_through_raw() {
        let outcome = OperationExecutor::default()
            .execute(identity(), |_| async {
                Err::<Option<()>, _>(OperationError::from(
                    StoreError::with_code("23505", "duplicate key"),
                ))
            })
            .await;

        match outcome {
            Outcome::Failed(GatewayError::Store(e)) => assert_eq!(e.code(), Some("23505")),
            other => panic!("expected store failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_panic_is_captured() {
        let outcome = OperationExecutor::default()
            .execute(identity(), |_| async {
                if true {
                    panic!("boom");
                }
                Ok::<_, OperationError>(Some(()))
            })
            .await;

        match outcome {
            Outcome::Failed(err @ GatewayError::Panicked(_)) => {
                assert_eq!(err.kind(), ErrorKind::Unknown);
            }
            other => panic!("expected panic capture, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_timeout() {
        let executor = OperationExecutor::new(Some(Duration::from_millis(20)));
        let outcome = executor
            .execute(identity(), |_| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok::<_, OperationError>(Some(()))
            })
            .await;

        match outcome {
            Outcome::Failed(err @ GatewayError::Timeout(_)) => {
                assert_eq!(err.kind(), ErrorKind::DatabaseError);
            }
            other => panic!("expected timeout, got {other:?}"),
        }
    }
}
