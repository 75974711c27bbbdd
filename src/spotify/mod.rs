//! # Spotify Integration Module
//!
//! This module is the integration layer between genplcli and the Spotify
//! Web API: authentication and the concrete catalog gateway the playlist
//! engine runs against. It owns all HTTP communication, OAuth flows,
//! status-code classification, and rate-limit handling; the engine above it
//! only ever sees the [`crate::engine::CatalogGateway`] trait.
//!
//! ## Modules
//!
//! - [`auth`] - OAuth 2.0 PKCE flow: verifier/challenge generation, local
//!   callback server, browser launch, code-for-token exchange, persistence
//! - [`catalog`] - [`catalog::SpotifyCatalog`], the reqwest-backed gateway
//!   implementation
//!
//! ## API Coverage
//!
//! - `GET /me` - profile of the authenticated user
//! - `GET /me/tracks` - liked-track library, offset pagination
//! - `GET /tracks`, `GET /tracks/{id}` - track batch and single lookup
//! - `GET /artists` - artist batch lookup with genre tags
//! - `GET /me/playlists` - playlist listing for resolve-or-create
//! - `POST /users/{user_id}/playlists` - playlist creation
//! - `GET|POST /playlists/{playlist_id}/tracks` - membership read and append
//! - `GET /recommendations` - similarity recommendations for a seed track
//! - `POST /api/token` - token exchange and refresh
//!
//! ## Error Handling
//!
//! Responses that fail after the gateway's own absorption (429 Retry-After
//! waits, one 502 retry) are classified into [`crate::error::CatalogError`]:
//! 401/403 as authentication failures, 404 as missing entities, 5xx and
//! network trouble as transient. Token refresh happens proactively with a
//! 4-minute expiry buffer, so expired credentials usually never reach the
//! wire.

pub mod auth;
pub mod catalog;
