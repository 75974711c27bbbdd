use std::{
    collections::{HashMap, HashSet},
    time::Duration,
};

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use tokio::{sync::Mutex, time::sleep};

use crate::{
    config,
    engine::gateway::CatalogGateway,
    error::CatalogError,
    management::TokenManager,
    types::{
        AddTracksRequest, AddTracksResponse, ArtistId, ArtistRef, CreatePlaylistRequest,
        CreatePlaylistResponse, PlaylistHandle, PlaylistItemsResponse, RecommendationsResponse,
        SavedTracksResponse, SeveralArtistsResponse, SeveralTracksResponse, TrackId, TrackObject,
        TrackRecord, UserPlaylistsResponse, UserProfileResponse,
    },
};

/// Rate-limit delays beyond this are not worth sitting through; the
/// operation fails as transient and can be re-run later.
const MAX_RETRY_AFTER_SECS: u64 = 120;

/// Page size when walking the user's playlists and playlist contents.
const LIST_PAGE: usize = 50;

/// Reqwest-backed [`CatalogGateway`] over the Spotify Web API.
///
/// Owns the credential for exactly one operation: the caller constructs it
/// with a [`TokenManager`] and discards it when the operation ends. Token
/// refresh happens transparently before each request.
///
/// Retry policy lives here, not in the engine: 429 responses are absorbed
/// by honoring `Retry-After` (up to [`MAX_RETRY_AFTER_SECS`]), and a 502 is
/// retried once after a short delay. Everything else maps onto
/// [`CatalogError`] and propagates.
pub struct SpotifyCatalog {
    tokens: Mutex<TokenManager>,
    api_url: String,
}

impl SpotifyCatalog {
    pub fn new(tokens: TokenManager) -> Self {
        SpotifyCatalog {
            tokens: Mutex::new(tokens),
            api_url: config::spotify_apiurl(),
        }
    }

    async fn bearer(&self) -> String {
        self.tokens.lock().await.get_valid_token().await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        context: &str,
    ) -> Result<T, CatalogError> {
        let response = self
            .send(|client, token| client.get(url).bearer_auth(token), context)
            .await?;
        decode(response, context).await
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
        context: &str,
    ) -> Result<T, CatalogError> {
        let response = self
            .send(
                |client, token| client.post(url).bearer_auth(token).json(body),
                context,
            )
            .await?;
        decode(response, context).await
    }

    /// Sends a request, refreshing the bearer token per attempt and
    /// absorbing retryable statuses.
    async fn send<F>(&self, build: F, context: &str) -> Result<Response, CatalogError>
    where
        F: Fn(&Client, String) -> reqwest::RequestBuilder,
    {
        let client = Client::new();
        let mut retried_bad_gateway = false;

        loop {
            let token = self.bearer().await;
            let response = build(&client, token)
                .send()
                .await
                .map_err(CatalogError::from)?;

            match response.status() {
                StatusCode::TOO_MANY_REQUESTS => {
                    let wait = retry_after_secs(&response);
                    if wait <= MAX_RETRY_AFTER_SECS {
                        sleep(Duration::from_secs(wait)).await;
                        continue; // retry
                    }
                    return Err(CatalogError::Transient(format!(
                        "rate limited for {}s: {}",
                        wait, context
                    )));
                }
                StatusCode::BAD_GATEWAY if !retried_bad_gateway => {
                    retried_bad_gateway = true;
                    sleep(Duration::from_secs(10)).await;
                    continue; // retry
                }
                status if !status.is_success() => {
                    return Err(CatalogError::from_status(status, context));
                }
                _ => return Ok(response),
            }
        }
    }
}

fn retry_after_secs(response: &Response) -> u64 {
    response
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(1)
}

async fn decode<T: DeserializeOwned>(response: Response, context: &str) -> Result<T, CatalogError> {
    response
        .json::<T>()
        .await
        .map_err(|e| CatalogError::Unexpected(format!("{}: {}", context, e)))
}

fn to_record(track: TrackObject) -> TrackRecord {
    TrackRecord {
        id: track.id,
        name: track.name,
        artists: track
            .artists
            .into_iter()
            .map(|a| ArtistRef {
                id: a.id,
                name: a.name,
            })
            .collect(),
    }
}

fn track_uri(id: &str) -> String {
    format!("spotify:track:{}", id)
}

#[async_trait]
impl CatalogGateway for SpotifyCatalog {
    async fn current_user_id(&self) -> Result<String, CatalogError> {
        let url = format!("{}/me", self.api_url);
        let profile: UserProfileResponse = self.get_json(&url, "fetch user profile").await?;
        Ok(profile.id)
    }

    async fn liked_tracks_page(
        &self,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<TrackId>, CatalogError> {
        let url = format!(
            "{uri}/me/tracks?limit={limit}&offset={offset}",
            uri = self.api_url,
            limit = limit,
            offset = offset
        );
        let page: SavedTracksResponse = self.get_json(&url, "fetch liked tracks page").await?;
        Ok(page.items.into_iter().map(|item| item.track.id).collect())
    }

    async fn tracks(&self, ids: &[TrackId]) -> Result<Vec<TrackRecord>, CatalogError> {
        let joined = ids.join(",");
        let url = format!("{uri}/tracks?ids={ids}", uri = self.api_url, ids = joined);
        let response: SeveralTracksResponse = self.get_json(&url, "fetch track batch").await?;
        Ok(response.tracks.into_iter().map(to_record).collect())
    }

    async fn track(&self, id: &str) -> Result<TrackRecord, CatalogError> {
        let url = format!("{uri}/tracks/{id}", uri = self.api_url, id = id);
        let track: TrackObject = self.get_json(&url, "fetch seed track").await?;
        Ok(to_record(track))
    }

    async fn artist_genres(
        &self,
        ids: &[ArtistId],
    ) -> Result<HashMap<ArtistId, HashSet<String>>, CatalogError> {
        let joined = ids.join(",");
        let url = format!("{uri}/artists?ids={ids}", uri = self.api_url, ids = joined);
        let response: SeveralArtistsResponse = self.get_json(&url, "fetch artist batch").await?;
        Ok(response
            .artists
            .into_iter()
            .map(|artist| (artist.id, artist.genres.into_iter().collect()))
            .collect())
    }

    async fn find_playlist_by_name(
        &self,
        name: &str,
    ) -> Result<Option<PlaylistHandle>, CatalogError> {
        // Walk every page; stopping at the first one would miss playlists
        // beyond it and lead resolve-or-create to create a duplicate.
        let mut offset = 0;
        loop {
            let url = format!(
                "{uri}/me/playlists?limit={limit}&offset={offset}",
                uri = self.api_url,
                limit = LIST_PAGE,
                offset = offset
            );
            let page: UserPlaylistsResponse = self.get_json(&url, "fetch user playlists").await?;

            if let Some(playlist) = page.items.iter().find(|p| p.name == name) {
                return Ok(Some(PlaylistHandle {
                    id: playlist.id.clone(),
                    name: playlist.name.clone(),
                }));
            }

            if page.next.is_none() {
                return Ok(None);
            }
            offset += LIST_PAGE;
        }
    }

    async fn create_playlist(
        &self,
        user_id: &str,
        name: &str,
        description: &str,
    ) -> Result<PlaylistHandle, CatalogError> {
        let url = format!(
            "{uri}/users/{user}/playlists",
            uri = self.api_url,
            user = user_id
        );
        let body = CreatePlaylistRequest {
            name: name.to_string(),
            description: description.to_string(),
            public: true,
            collaborative: false,
        };
        let created: CreatePlaylistResponse =
            self.post_json(&url, &body, "create playlist").await?;
        Ok(PlaylistHandle {
            id: created.id,
            name: created.name,
        })
    }

    async fn playlist_tracks(
        &self,
        playlist: &PlaylistHandle,
    ) -> Result<HashSet<TrackId>, CatalogError> {
        let mut tracks: HashSet<TrackId> = HashSet::new();
        let mut offset = 0;
        loop {
            let url = format!(
                "{uri}/playlists/{id}/tracks?fields=items(track.id),next&limit={limit}&offset={offset}",
                uri = self.api_url,
                id = playlist.id,
                limit = LIST_PAGE,
                offset = offset
            );
            let page: PlaylistItemsResponse = self.get_json(&url, "fetch playlist tracks").await?;

            tracks.extend(
                page.items
                    .into_iter()
                    .filter_map(|item| item.track.and_then(|t| t.id)),
            );

            if page.next.is_none() {
                return Ok(tracks);
            }
            offset += LIST_PAGE;
        }
    }

    async fn add_tracks(
        &self,
        playlist: &PlaylistHandle,
        ids: &[TrackId],
    ) -> Result<(), CatalogError> {
        let url = format!(
            "{uri}/playlists/{id}/tracks",
            uri = self.api_url,
            id = playlist.id
        );
        let body = AddTracksRequest {
            uris: ids.iter().map(|id| track_uri(id)).collect(),
        };
        let _: AddTracksResponse = self.post_json(&url, &body, "add playlist tracks").await?;
        Ok(())
    }

    async fn recommendations(
        &self,
        seed: &str,
        limit: usize,
    ) -> Result<Vec<TrackId>, CatalogError> {
        let url = format!(
            "{uri}/recommendations?seed_tracks={seed}&limit={limit}",
            uri = self.api_url,
            seed = seed,
            limit = limit
        );
        let response: RecommendationsResponse =
            self.get_json(&url, "fetch recommendations").await?;
        Ok(response.tracks.into_iter().map(|t| t.id).collect())
    }
}
