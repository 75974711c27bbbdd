use std::collections::HashSet;

use crate::{
    engine::gateway::{CatalogGateway, WRITE_BATCH},
    error::CatalogError,
    types::{PlaylistHandle, TrackId},
};

/// Brings a playlist's membership up to date with a candidate set.
///
/// Resolves the destination playlist by exact name, creating it when the
/// user has none (first name match wins if the catalog holds duplicates).
/// The playlist's current tracks are read once, the additions are the set
/// difference `candidates - existing`, and they are appended in batches of
/// [`WRITE_BATCH`].
///
/// The diff-then-append shape makes the whole operation idempotent: if a
/// write batch fails partway, re-running with the same candidates recomputes
/// the difference against the fresh playlist state and only re-adds what is
/// still missing. An empty difference is success, the handle is returned
/// either way.
pub async fn reconcile<G>(
    gateway: &G,
    user_id: &str,
    name: &str,
    description: &str,
    candidates: &HashSet<TrackId>,
) -> Result<PlaylistHandle, CatalogError>
where
    G: CatalogGateway + ?Sized,
{
    let playlist = match gateway.find_playlist_by_name(name).await? {
        Some(handle) => handle,
        None => gateway.create_playlist(user_id, name, description).await?,
    };

    let existing = gateway.playlist_tracks(&playlist).await?;

    let mut to_add: Vec<TrackId> = candidates.difference(&existing).cloned().collect();
    // Batch order carries no meaning; sorting only keeps runs reproducible.
    to_add.sort();

    for batch in to_add.chunks(WRITE_BATCH) {
        gateway.add_tracks(&playlist, batch).await?;
    }

    Ok(playlist)
}
