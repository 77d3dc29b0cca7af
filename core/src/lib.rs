//! Synchronous client for the organisation accounts API.
//!
//! # Overview
//! `AccountService` exposes get, create, delete and list over accounts.
//! Underneath, `Transport` performs one HTTP round trip per call and unwraps
//! the `{data, links}` / `{error_message}` envelope into a typed value or an
//! `ApiError`.
//!
//! # Design
//! - `Transport` holds only configuration fixed at construction and is safe
//!   to share between threads.
//! - Unset configuration falls back to defaults field by field; there is no
//!   global client.
//! - Cancellation and deadlines come from the caller's `ExecutionContext`.
//! - Listing pages on the client because downstream paging has no effect.
//!
//! ```rust,no_run
//! use account_core::{AccountService, Transport, TransportConfig};
//!
//! # fn main() -> Result<(), account_core::ApiError> {
//! let transport = Transport::new(TransportConfig::from_env()?);
//! let service = AccountService::new(Some(transport));
//! for account in service.list(1, 20)? {
//!     println!("{} {}", account.id, account.organisation_id);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod context;
pub mod envelope;
pub mod error;
pub mod http;
pub mod service;
pub mod transport;
pub mod types;

pub use config::TransportConfig;
pub use context::{CancelHandle, ExecutionContext};
pub use error::{ApiError, ApiResult, TransportError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use service::AccountService;
pub use transport::Transport;
pub use types::{Account, Attributes, ACCOUNT_TYPE};
