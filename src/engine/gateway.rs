use std::collections::{HashMap, HashSet};

use async_trait::async_trait;

use crate::{
    error::CatalogError,
    types::{ArtistId, PlaylistHandle, TrackId, TrackRecord},
};

/// Catalog-imposed ceiling on ids per read request (tracks, artists, liked
/// page). Not an internal tuning knob.
pub const READ_BATCH: usize = 50;

/// Catalog-imposed ceiling on tracks per playlist write request.
pub const WRITE_BATCH: usize = 100;

/// Capability interface over the external music catalog.
///
/// The engine consumes this trait and never constructs or refreshes
/// credentials itself; the caller hands in an implementation that owns them
/// for the duration of one operation. Implementations decide their own
/// retry/backoff policy for rate limits, the engine propagates whatever
/// still fails as [`CatalogError`].
#[async_trait]
pub trait CatalogGateway: Send + Sync {
    /// Id of the user the credential belongs to.
    async fn current_user_id(&self) -> Result<String, CatalogError>;

    /// One page of the user's liked-track library. An empty page means the
    /// library is exhausted at that offset.
    async fn liked_tracks_page(
        &self,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<TrackId>, CatalogError>;

    /// Batch track lookup, at most [`READ_BATCH`] ids per call.
    async fn tracks(&self, ids: &[TrackId]) -> Result<Vec<TrackRecord>, CatalogError>;

    /// Single track lookup. Fails with [`CatalogError::NotFound`] for an
    /// unknown id.
    async fn track(&self, id: &str) -> Result<TrackRecord, CatalogError>;

    /// Genre tags per artist, at most [`READ_BATCH`] ids per call. Tags are
    /// returned as the catalog spells them; callers normalize case.
    async fn artist_genres(
        &self,
        ids: &[ArtistId],
    ) -> Result<HashMap<ArtistId, HashSet<String>>, CatalogError>;

    /// First playlist owned by the user whose name matches exactly, in
    /// catalog list order.
    async fn find_playlist_by_name(
        &self,
        name: &str,
    ) -> Result<Option<PlaylistHandle>, CatalogError>;

    async fn create_playlist(
        &self,
        user_id: &str,
        name: &str,
        description: &str,
    ) -> Result<PlaylistHandle, CatalogError>;

    /// Full current track membership of a playlist.
    async fn playlist_tracks(
        &self,
        playlist: &PlaylistHandle,
    ) -> Result<HashSet<TrackId>, CatalogError>;

    /// Appends tracks, at most [`WRITE_BATCH`] ids per call.
    async fn add_tracks(
        &self,
        playlist: &PlaylistHandle,
        ids: &[TrackId],
    ) -> Result<(), CatalogError>;

    /// Similarity recommendations for one seed track, as returned by the
    /// catalog. May contain repeats; callers deduplicate.
    async fn recommendations(&self, seed: &str, limit: usize)
    -> Result<Vec<TrackId>, CatalogError>;
}
