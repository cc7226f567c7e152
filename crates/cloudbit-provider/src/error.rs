//! Provider error types

use cloudbit_client::ClientError;
use cloudbit_plugin::{Diagnostic, Diagnostics, PluginError};
use thiserror::Error;

/// Errors raised by resources and data sources
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("unable to {action}: {source}")]
    Client {
        action: String,
        #[source]
        source: ClientError,
    },

    #[error("Expected configured provider. Please report this issue to the provider developers.")]
    Unconfigured,

    #[error("The token is missing. Please set the token in the provider configuration or set the CLOUDBIT_TOKEN environment variable.")]
    MissingToken,

    #[error("unable to find {kind}: {reason}")]
    NotFound { kind: String, reason: String },

    #[error("{0}")]
    Timeout(String),

    #[error("order {0} failed")]
    OrderFailed(i64),

    #[error("{0}")]
    InvalidState(String),

    #[error("{0} can not be updated in place")]
    UpdateNotSupported(String),

    #[error(transparent)]
    Plugin(#[from] PluginError),
}

impl ProviderError {
    pub fn invalid_state(message: impl Into<String>) -> Self {
        ProviderError::InvalidState(message.into())
    }

    /// Summary shown by Terraform above the error detail
    pub fn summary(&self) -> &'static str {
        match self {
            ProviderError::Client { .. } => "Client Error",
            ProviderError::Unconfigured => "Unconfigured Provider",
            ProviderError::MissingToken => "Missing Token",
            ProviderError::NotFound { .. } => "Not Found",
            ProviderError::Timeout(_) => "Timeout",
            ProviderError::OrderFailed(_) => "Order Failed",
            ProviderError::InvalidState(_) => "Invalid State",
            ProviderError::UpdateNotSupported(_) => "Update Not Supported",
            ProviderError::Plugin(_) => "Value Conversion Error",
        }
    }
}

impl From<ProviderError> for Diagnostics {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Plugin(err) => err.into(),
            err => Diagnostic::error(err.summary(), err.to_string()).into(),
        }
    }
}

/// Attach the attempted action to client errors
pub trait ClientResultExt<T> {
    fn action(self, action: impl Into<String>) -> Result<T>;
}

impl<T> ClientResultExt<T> for std::result::Result<T, ClientError> {
    fn action(self, action: impl Into<String>) -> Result<T> {
        self.map_err(|source| ProviderError::Client {
            action: action.into(),
            source,
        })
    }
}

pub type Result<T> = std::result::Result<T, ProviderError>;

#[cfg(test)]
mod tests {
    use super::*;
    use cloudbit_plugin::Severity;

    #[test]
    fn test_client_error_diagnostic() {
        let result: std::result::Result<(), ClientError> = Err(ClientError::Api {
            status: 500,
            message: "internal".to_string(),
        });
        let diags: Diagnostics = result.action("list networks").unwrap_err().into();

        let diag = diags.iter().next().unwrap();
        assert_eq!(diag.severity, Severity::Error);
        assert_eq!(diag.summary, "Client Error");
        assert_eq!(diag.detail, "unable to list networks: API error (500): internal");
    }

    #[test]
    fn test_missing_token_diagnostic() {
        let diags: Diagnostics = ProviderError::MissingToken.into();
        let diag = diags.iter().next().unwrap();
        assert_eq!(diag.summary, "Missing Token");
        assert!(diag.detail.contains("CLOUDBIT_TOKEN"));
    }
}
