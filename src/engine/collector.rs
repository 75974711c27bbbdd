use std::collections::HashSet;

use crate::{
    engine::gateway::{CatalogGateway, READ_BATCH},
    error::CatalogError,
    types::TrackId,
};

/// Pages the user's liked-track library into a deduplicated candidate set.
///
/// Fetches pages of [`READ_BATCH`] ids starting at offset 0 and stops as
/// soon as a page comes back short (library exhausted) or the set holds
/// `max_tracks` distinct ids. Pagination is adaptive, so pages are fetched
/// sequentially; the resolver is where fan-out happens.
///
/// An empty library is an ordinary empty result, not an error.
pub async fn collect<G>(gateway: &G, max_tracks: usize) -> Result<HashSet<TrackId>, CatalogError>
where
    G: CatalogGateway + ?Sized,
{
    let mut ids: HashSet<TrackId> = HashSet::new();
    let mut offset = 0;

    while ids.len() < max_tracks {
        let page = gateway.liked_tracks_page(offset, READ_BATCH).await?;
        let fetched = page.len();

        for id in page {
            if ids.len() >= max_tracks {
                break;
            }
            ids.insert(id);
        }

        // A short page means there is nothing beyond it.
        if fetched < READ_BATCH {
            break;
        }
        offset += READ_BATCH;
    }

    Ok(ids)
}
