//! Provider, resource and data source traits
//!
//! A provider implementation registers its resources and data sources as
//! trait objects. The plugin service dispatches every protocol request to
//! the implementation registered under the request's type name.

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::schema::Schema;
use crate::value::Value;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Cancellation and deadline of a single provider operation
#[derive(Debug, Clone)]
pub struct OperationContext {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl OperationContext {
    pub fn new(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            deadline: None,
        }
    }

    /// A context that is never cancelled from outside
    pub fn background() -> Self {
        Self::new(CancellationToken::new())
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) => existing.min(deadline),
            None => deadline,
        });
        self
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_done(&self) -> bool {
        self.cancel.is_cancelled() || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Completes once the operation is cancelled or its deadline passes
    pub async fn done(&self) {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = self.cancel.cancelled() => {}
                    _ = tokio::time::sleep_until(deadline) => {}
                }
            }
            None => self.cancel.cancelled().await,
        }
    }
}

/// A Terraform provider
#[async_trait]
pub trait Provider: Send + Sync + 'static {
    type Error: Into<Diagnostics> + Send + 'static;

    /// Prefix of every resource and data source type name
    fn type_name(&self) -> &str;

    fn schema(&self) -> Schema;

    async fn configure(&self, ctx: &OperationContext, config: &Value) -> Result<(), Self::Error>;

    fn resources(&self) -> Vec<Arc<dyn Resource<Error = Self::Error>>>;

    fn data_sources(&self) -> Vec<Arc<dyn DataSource<Error = Self::Error>>>;
}

/// A managed resource
#[async_trait]
pub trait Resource: Send + Sync {
    type Error: Into<Diagnostics> + Send + 'static;

    fn type_name(&self) -> &str;

    fn schema(&self) -> Schema;

    /// Additional configuration checks beyond the schema
    fn validate(&self, _config: &Value) -> Diagnostics {
        Diagnostics::new()
    }

    async fn create(&self, ctx: &OperationContext, planned: &Value) -> Result<Value, Self::Error>;

    /// Refresh the state. `None` means the remote object is gone.
    async fn read(&self, ctx: &OperationContext, state: &Value)
    -> Result<Option<Value>, Self::Error>;

    async fn update(
        &self,
        ctx: &OperationContext,
        prior: &Value,
        planned: &Value,
    ) -> Result<Value, Self::Error>;

    async fn delete(&self, ctx: &OperationContext, state: &Value) -> Result<(), Self::Error>;

    /// Turn an import id into a partial state that is then refreshed with
    /// [`Resource::read`]. Defaults to a numeric `id`.
    fn import(&self, id: &str) -> Result<Value, Diagnostics> {
        import_ids(id, &["id"])
    }
}

/// A read-only data source
#[async_trait]
pub trait DataSource: Send + Sync {
    type Error: Into<Diagnostics> + Send + 'static;

    fn type_name(&self) -> &str;

    fn schema(&self) -> Schema;

    fn validate(&self, _config: &Value) -> Diagnostics {
        Diagnostics::new()
    }

    async fn read(&self, ctx: &OperationContext, config: &Value) -> Result<Value, Self::Error>;
}

/// Parse a `/` separated import id of numeric components into an object
/// with the given attribute names.
pub fn import_ids(id: &str, attributes: &[&str]) -> Result<Value, Diagnostics> {
    let parts: Vec<&str> = id.split('/').collect();
    let expected = attributes.join("/");

    if parts.len() != attributes.len() {
        return Err(Diagnostic::error(
            "Unexpected Import Identifier",
            format!("Expected import identifier with format: {}. Got: {:?}", expected, id),
        )
        .into());
    }

    let mut value = Value::Object(Default::default());
    for (name, part) in attributes.iter().zip(parts) {
        let number: i64 = part.trim().parse().map_err(|_| {
            Diagnostic::error(
                "Unexpected Import Identifier",
                format!("Expected {} to be a number. Got: {:?}", name, part),
            )
        })?;
        value.set_attr(*name, Value::from(number));
    }

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_single_id() {
        let value = import_ids("42", &["id"]).unwrap();
        assert_eq!(value.attr("id").as_i64(), Some(42));
    }

    #[test]
    fn test_import_child_id() {
        let value = import_ids("7/15", &["router_id", "id"]).unwrap();
        assert_eq!(value.attr("router_id").as_i64(), Some(7));
        assert_eq!(value.attr("id").as_i64(), Some(15));
    }

    #[test]
    fn test_import_rejects_malformed_ids() {
        assert!(import_ids("7", &["router_id", "id"]).is_err());
        assert!(import_ids("abc", &["id"]).unwrap_err().has_error());
    }

    #[tokio::test(start_paused = true)]
    async fn test_context_deadline() {
        let ctx = OperationContext::background().with_timeout(Duration::from_secs(5));
        assert!(!ctx.is_done());

        ctx.done().await;
        assert!(ctx.is_done());
        assert!(!ctx.cancellation_token().is_cancelled());
    }

    #[tokio::test]
    async fn test_context_cancel() {
        let token = CancellationToken::new();
        let ctx = OperationContext::new(token.child_token());
        token.cancel();

        ctx.done().await;
        assert!(ctx.is_done());
    }
}
