//! # API Module
//!
//! HTTP endpoints for the temporary local server that backs the OAuth flow.
//! The server only exists while `genplcli auth` runs; it receives Spotify's
//! authorization redirect and exposes a trivial health probe.
//!
//! ## Endpoints
//!
//! - [`callback`] - completes the PKCE flow by exchanging the authorization
//!   code (plus the stored verifier) for an access token
//! - [`health`] - returns application status and version
//!
//! Both handlers are plain async functions wired into an
//! [Axum](https://docs.rs/axum) router by [`crate::server`].

mod callback;
mod health;

pub use callback::callback;
pub use health::health;
