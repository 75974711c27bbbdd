use std::collections::{HashMap, HashSet};

use futures::{StreamExt, stream};

use crate::{
    engine::gateway::{CatalogGateway, READ_BATCH},
    error::CatalogError,
    types::{ArtistId, TrackId},
};

/// Concurrent classification batches in flight at once. Kept small so the
/// catalog's undocumented rate limits are respected.
pub const RESOLVER_WORKERS: usize = 4;

/// Filters a candidate set down to the tracks matching a target genre.
///
/// Candidates are partitioned into batches of [`READ_BATCH`]. Each batch
/// costs one track lookup plus artist lookups for the union of artist ids
/// across the whole batch; the union itself is chunked to [`READ_BATCH`],
/// so a batch of multi-artist tracks stays within the ceiling. A track
/// matches when any of its artists carries a genre tag equal to
/// `target_genre` under case-insensitive comparison; tags are never matched
/// by substring, so "lofi" does not match "lofi hip hop".
///
/// Batches are independent and run on a bounded pool; only the union of
/// their results matters, so completion order is irrelevant. The returned
/// set is always a subset of `candidates`. A track with no artists never
/// matches.
pub async fn resolve<G>(
    gateway: &G,
    candidates: &HashSet<TrackId>,
    target_genre: &str,
) -> Result<HashSet<TrackId>, CatalogError>
where
    G: CatalogGateway + ?Sized,
{
    if candidates.is_empty() {
        return Ok(HashSet::new());
    }

    let wanted = target_genre.to_lowercase();
    let ids: Vec<TrackId> = candidates.iter().cloned().collect();

    let mut batches = stream::iter(
        ids.chunks(READ_BATCH)
            .map(|batch| classify_batch(gateway, batch, &wanted)),
    )
    .buffer_unordered(RESOLVER_WORKERS);

    let mut matched: HashSet<TrackId> = HashSet::new();
    while let Some(batch_result) = batches.next().await {
        matched.extend(batch_result?);
    }

    Ok(matched)
}

/// Classifies one batch of tracks against the lower-cased target genre.
async fn classify_batch<G>(
    gateway: &G,
    batch: &[TrackId],
    wanted: &str,
) -> Result<Vec<TrackId>, CatalogError>
where
    G: CatalogGateway + ?Sized,
{
    let records = gateway.tracks(batch).await?;

    // Look artists up per batch, not per track. Multi-artist tracks can
    // push the union past the id ceiling, so it is chunked again.
    let artist_union: Vec<ArtistId> = records
        .iter()
        .flat_map(|record| record.artist_ids().cloned())
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();

    let mut genres: HashMap<ArtistId, HashSet<String>> = HashMap::new();
    for chunk in artist_union.chunks(READ_BATCH) {
        genres.extend(
            gateway
                .artist_genres(chunk)
                .await?
                .into_iter()
                .map(|(id, tags)| (id, tags.into_iter().map(|g| g.to_lowercase()).collect())),
        );
    }

    let mut hits = Vec::new();
    for record in records {
        let is_match = record
            .artist_ids()
            .any(|artist| genres.get(artist).is_some_and(|tags| tags.contains(wanted)));
        if is_match {
            hits.push(record.id);
        }
    }

    Ok(hits)
}
