//! # Playlist Engine
//!
//! The track aggregation and playlist reconciliation engine. This is the
//! core of the application: it paginates a user's liked-track library,
//! resolves genre membership through batched catalog lookups, deduplicates
//! against the destination playlist, and performs idempotent batched writes
//! back to the catalog.
//!
//! ## Pipeline
//!
//! ```text
//! genre mode:       collector -> resolver -> reconciler
//! similarity mode:  similar (expander)   -> reconciler
//! ```
//!
//! Both modes terminate at the reconciler, the only component that mutates
//! external state. Every intermediate aggregate is set-valued, so
//! deduplication is a data-model invariant rather than incidental behavior,
//! and batches can complete in any order.
//!
//! ## Boundaries
//!
//! The engine talks to the catalog exclusively through the
//! [`CatalogGateway`] trait and holds no credentials, no cross-operation
//! cache, and no background tasks. Each entry point is a self-contained
//! unit of work; errors from any batch abort the operation, and because
//! writes are diff-based a later re-invocation self-heals any partial
//! write.

pub mod collector;
pub mod gateway;
pub mod reconciler;
pub mod resolver;
pub mod similar;

pub use gateway::{CatalogGateway, READ_BATCH, WRITE_BATCH};
pub use similar::RECOMMENDATION_LIMIT;

use crate::{error::CatalogError, types::PlaylistHandle};

/// Default cap on how much of the liked library the genre mode scans.
pub const DEFAULT_MAX_TRACKS: usize = 200;

/// Builds (or tops up) the `Liked Songs - {genre}` playlist from the
/// user's liked tracks whose artists match `target_genre`.
///
/// Zero genre matches is a normal outcome: the playlist is still resolved
/// or created and returned, with nothing appended.
pub async fn generate_genre_playlist<G>(
    gateway: &G,
    target_genre: &str,
    max_tracks: usize,
) -> Result<PlaylistHandle, CatalogError>
where
    G: CatalogGateway + ?Sized,
{
    let user_id = gateway.current_user_id().await?;

    let liked = collector::collect(gateway, max_tracks).await?;
    let matched = resolver::resolve(gateway, &liked, target_genre).await?;

    let name = format!("Liked Songs - {}", target_genre);
    let description = format!("Playlist of liked songs in the {} genre", target_genre);

    reconciler::reconcile(gateway, &user_id, &name, &description, &matched).await
}

/// Builds (or tops up) a playlist of tracks similar to one seed track.
///
/// The seed is looked up first so the playlist can be named after the
/// track and its primary artist; an unknown seed aborts the operation
/// before anything is written.
pub async fn generate_similarity_playlist<G>(
    gateway: &G,
    seed_track_id: &str,
) -> Result<PlaylistHandle, CatalogError>
where
    G: CatalogGateway + ?Sized,
{
    let user_id = gateway.current_user_id().await?;

    let seed = gateway.track(seed_track_id).await?;
    let candidates = similar::expand(gateway, seed_track_id, RECOMMENDATION_LIMIT).await?;

    let artist = seed.primary_artist().unwrap_or("Unknown Artist");
    let name = format!("Similar to {} by {}", seed.name, artist);
    let description = format!("Tracks similar to {} by {}", seed.name, artist);

    reconciler::reconcile(gateway, &user_id, &name, &description, &candidates).await
}
