//! cloudbit.ch resources and data sources for Terraform
//!
//! [`CloudbitProvider`] implements the [`cloudbit_plugin::Provider`] trait.
//! Every resource and data source shares the API client installed by the
//! provider's Configure call.

pub mod common;
pub mod compute;
pub mod config;
pub mod entities;
pub mod error;
pub mod filter;
pub mod kubernetes;
pub mod provider;
pub mod wait;

pub use config::{ClientHandle, ProviderConfig, ResolvedConfig};
pub use error::{ProviderError, Result};
pub use provider::CloudbitProvider;
