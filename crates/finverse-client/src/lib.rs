//! Finverse Data API client
//!
//! `FinverseClient` exposes the Finverse operations (link tokens, the
//! authorization-code exchange, accounts, transactions, identity, statements,
//! card details) on top of a `RequestPipeline`, which in turn asks a
//! `CredentialManager` for auth headers before every call.
//!
//! ```no_run
//! # async fn run() -> finverse_client::Result<()> {
//! use finverse_client::{ClientConfig, FinverseClient};
//!
//! let config = ClientConfig::new("client-id", "client-secret", "customer-app-id");
//! let client = FinverseClient::new(&config)?;
//! let accounts = client.get_accounts().await?;
//! println!("{accounts}");
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod metrics;
pub mod pipeline;

pub use client::{FinverseClient, LinkTokenRequest, QueryFilter};
pub use config::ClientConfig;
pub use finverse_auth::{CredentialManager, Error, ErrorKind, Result};
pub use pipeline::{RequestOptions, RequestPipeline};
pub use transport::Method;
