//! # CLI Module
//!
//! The command-line interface layer for genplcli. It implements the
//! user-facing commands and coordinates between the playlist engine, the
//! Spotify gateway, and token management, handling progress feedback and
//! error presentation along the way.
//!
//! ## Commands
//!
//! - [`auth`] - Spotify OAuth authentication flow with PKCE security
//! - [`genre`] - builds `Liked Songs - {genre}` from the liked library;
//!   `--dry-run` prints the matches as a table instead of writing
//! - [`similar`] - builds a playlist of tracks similar to one seed track
//!
//! ## Architecture
//!
//! ```text
//! CLI Layer (user interaction, spinners, tables)
//!     ↓
//! Engine Layer (collect / resolve / reconcile)
//!     ↓
//! Gateway Layer (Spotify Web API over reqwest)
//! ```
//!
//! Each command loads the cached token, constructs one
//! [`crate::spotify::catalog::SpotifyCatalog`] for the operation, and
//! discards it at the end. Authentication problems are surfaced with a
//! pointer to `genplcli auth`; transient catalog failures can simply be
//! re-run because reconciliation is idempotent.

mod auth;
mod genre;
mod similar;

pub use auth::auth;
pub use genre::genre;
pub use similar::similar;
