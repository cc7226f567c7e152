//! Terraform plugin protocol v6 server
//!
//! Implements the gRPC side of a Terraform provider: the go-plugin
//! handshake, AutoMTLS, msgpack value encoding and the generic
//! plan/apply/read machinery. Providers plug in through the [`Provider`],
//! [`Resource`] and [`DataSource`] traits.

pub mod diagnostics;
pub mod error;
pub mod logging;
pub mod msgpack;
pub mod plan;
pub mod proto;
pub mod provider;
pub mod schema;
pub mod serve;
pub mod service;
pub mod tls;
pub mod validator;
pub mod value;

pub use diagnostics::{AttributePath, Diagnostic, Diagnostics, Severity};
pub use error::{PluginError, Result};
pub use provider::{DataSource, OperationContext, Provider, Resource, import_ids};
pub use schema::{Attribute, AttributeType, Schema};
pub use serve::{ServeOpts, serve};
pub use service::PluginService;
pub use validator::Validator;
pub use value::Value;
