use std::collections::HashSet;

use crate::{engine::gateway::CatalogGateway, error::CatalogError, types::TrackId};

/// How many recommendations to request for one seed track.
pub const RECOMMENDATION_LIMIT: usize = 20;

/// Expands one seed track into a candidate set via catalog recommendations.
///
/// A single, non-batched gateway call; collecting into a set collapses any
/// repeats the catalog returns. An unknown seed surfaces as
/// [`CatalogError::NotFound`] from the gateway.
pub async fn expand<G>(
    gateway: &G,
    seed_track_id: &str,
    limit: usize,
) -> Result<HashSet<TrackId>, CatalogError>
where
    G: CatalogGateway + ?Sized,
{
    let recommended = gateway.recommendations(seed_track_id, limit).await?;
    Ok(recommended.into_iter().collect())
}
