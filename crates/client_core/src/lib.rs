//! Client side of the LifeEcho decisions API.
//!
//! [`ApiClient`] talks HTTP, [`SessionStore`] owns the authentication state on
//! top of a [`TokenStore`], and [`views`] holds the state of each page a front
//! end renders.

pub mod config;
pub mod error;
pub mod http;
pub mod session;
pub mod token_store;
pub mod views;

pub use config::{load_settings, ClientSettings};
pub use error::{ClientError, ClientResult, TokenStoreError};
pub use http::ApiClient;
pub use session::{Session, SessionPhase, SessionStore};
pub use token_store::{FileTokenStore, MemoryTokenStore, TokenStore, TOKEN_KEY};

#[cfg(test)]
#[path = "tests/fake_api.rs"]
mod fake_api;
