//! HTTP client for the cloudbit.ch API
//!
//! Thin typed wrapper around the `v4` REST API. Every entity family is
//! reachable from [`Client`] through an accessor returning either a generic
//! [`Collection`] or a dedicated service for endpoints beyond plain CRUD.
//!
//! # Example
//!
//! ```ignore
//! use cloudbit_client::{Client, NetworkCreate};
//!
//! let client = Client::builder(token).build()?;
//! let network = client
//!     .networks()
//!     .create(&NetworkCreate {
//!         name: "backend".into(),
//!         location_id: 1,
//!         cidr: "10.0.0.0/24".into(),
//!         ..Default::default()
//!     })
//!     .await?;
//! ```

pub mod client;
pub mod compute;
pub mod entities;
pub mod error;
pub mod kubernetes;
pub mod order;

pub use client::{Client, ClientBuilder, Collection, Cursor, DEFAULT_ENDPOINT, Page};
pub use compute::*;
pub use entities::*;
pub use error::{ClientError, Result};
pub use kubernetes::*;
pub use order::*;
