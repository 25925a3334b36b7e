//! Upstream identity API access
//!
//! - [`transport`]: the raw HTTP seam ([`Transport`], [`HttpTransport`])
//! - [`executor`]: auth-mode aware execution of a single logical request
//! - [`client`]: typed endpoint wrappers over the executor
//! - [`mock`]: scripted transport for tests and embedding hosts

pub mod client;
pub mod executor;
pub mod mock;
pub mod transport;
pub mod types;

pub use client::IdentityApi;
pub use executor::{RequestExecutor, API_KEY_HEADER, CREDITS_HEADER};
pub use mock::MockTransport;
pub use transport::{ApiRequest, ApiResponse, HttpTransport, Transport};
pub use types::*;
