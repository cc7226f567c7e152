//! Helpers shared by resources and data sources

use crate::error::{ClientResultExt, ProviderError, Result};
use cloudbit_client::ClientError;
use cloudbit_plugin::{Attribute, OperationContext, Value};
use serde::Serialize;
use std::time::Duration;

/// Upper bound for waiting on asynchronous operations
pub const WAIT_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Bound an operation context with [`WAIT_TIMEOUT`]
pub fn wait_context(ctx: &OperationContext) -> OperationContext {
    ctx.clone().with_timeout(WAIT_TIMEOUT)
}

/// Numeric attribute that must be known
pub fn int_attr(value: &Value, name: &str) -> Result<i64> {
    value
        .attr(name)
        .as_i64()
        .ok_or_else(|| ProviderError::invalid_state(format!("attribute {:?} is not set", name)))
}

/// Map a not found response to `None`
pub fn found<T>(result: std::result::Result<T, ClientError>, action: &str) -> Result<Option<T>> {
    match result {
        Ok(entity) => Ok(Some(entity)),
        Err(err) if err.is_not_found() => Ok(None),
        Err(err) => Err(err).action(action),
    }
}

/// Treat a not found response on delete as success
pub fn deleted(result: std::result::Result<(), ClientError>, action: &str) -> Result<()> {
    found(result, action).map(|_| ())
}

/// Encode entities through their state model
pub fn encode_all<'a, T, M>(entities: &'a [T]) -> Result<Vec<Value>>
where
    T: 'a,
    M: Serialize + From<&'a T>,
{
    entities
        .iter()
        .map(|entity| Ok(Value::encode(&M::from(entity))?))
        .collect()
}

pub fn id_attribute(what: &str) -> Attribute {
    Attribute::int64("id")
        .description(format!("unique identifier of the {}", what))
        .computed()
        .use_state_for_unknown()
}

/// `id` attribute of a data source, usable as filter
pub fn id_filter(what: &str) -> Attribute {
    Attribute::int64("id")
        .description(format!("unique identifier of the {}", what))
        .optional()
        .computed()
}

pub fn location_attribute(what: &str) -> Attribute {
    Attribute::int64("location_id")
        .description(format!("location of the {}", what))
        .required()
        .requires_replace()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_found_maps_not_found() {
        let result: std::result::Result<i64, ClientError> = Err(ClientError::Api {
            status: 404,
            message: "gone".to_string(),
        });
        assert_eq!(found(result, "get network").unwrap(), None);

        let result: std::result::Result<i64, ClientError> = Err(ClientError::Api {
            status: 403,
            message: "forbidden".to_string(),
        });
        assert!(matches!(
            found(result, "get network"),
            Err(ProviderError::Client { .. })
        ));
    }

    #[test]
    fn test_int_attr() {
        let value = Value::object([("id", Value::from(4)), ("name", Value::Unknown)]);
        assert_eq!(int_attr(&value, "id").unwrap(), 4);
        assert!(int_attr(&value, "name").is_err());
        assert!(int_attr(&value, "missing").is_err());
    }
}
