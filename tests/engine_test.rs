use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use genplcli::engine::{
    self, CatalogGateway, READ_BATCH, WRITE_BATCH, collector, reconciler, resolver, similar,
};
use genplcli::error::CatalogError;
use genplcli::types::{ArtistId, ArtistRef, PlaylistHandle, TrackId, TrackRecord};

/// In-memory catalog double. Read data is fixed at construction; playlist
/// state and call accounting live behind a mutex so the engine can fan out.
#[derive(Default)]
struct MockCatalog {
    liked: Vec<TrackId>,
    records: HashMap<TrackId, TrackRecord>,
    genres: HashMap<ArtistId, HashSet<String>>,
    recommendations: HashMap<TrackId, Vec<TrackId>>,
    state: Mutex<MockState>,
}

#[derive(Default)]
struct MockState {
    playlists: Vec<(PlaylistHandle, Vec<TrackId>)>,
    page_fetches: usize,
    track_batch_sizes: Vec<usize>,
    artist_batch_sizes: Vec<usize>,
    write_batch_sizes: Vec<usize>,
    playlists_created: usize,
}

impl MockCatalog {
    fn with_liked(count: usize) -> Self {
        MockCatalog {
            liked: (0..count).map(track_id).collect(),
            ..Default::default()
        }
    }

    fn seed_playlist(&self, name: &str, tracks: &[&str]) -> PlaylistHandle {
        let handle = PlaylistHandle {
            id: format!("pl{}", name.len()),
            name: name.to_string(),
        };
        self.state.lock().unwrap().playlists.push((
            handle.clone(),
            tracks.iter().map(|t| t.to_string()).collect(),
        ));
        handle
    }

    fn playlist_contents(&self, name: &str) -> Vec<TrackId> {
        self.state
            .lock()
            .unwrap()
            .playlists
            .iter()
            .find(|(handle, _)| handle.name == name)
            .map(|(_, tracks)| tracks.clone())
            .expect("playlist should exist")
    }
}

fn track_id(i: usize) -> TrackId {
    format!("t{:03}", i)
}

fn record(id: &str, name: &str, artists: &[(&str, &str)]) -> TrackRecord {
    TrackRecord {
        id: id.to_string(),
        name: name.to_string(),
        artists: artists
            .iter()
            .map(|(artist_id, artist_name)| ArtistRef {
                id: artist_id.to_string(),
                name: artist_name.to_string(),
            })
            .collect(),
    }
}

fn genre_tags(tags: &[&str]) -> HashSet<String> {
    tags.iter().map(|t| t.to_string()).collect()
}

#[async_trait]
impl CatalogGateway for MockCatalog {
    async fn current_user_id(&self) -> Result<String, CatalogError> {
        Ok("user1".to_string())
    }

    async fn liked_tracks_page(
        &self,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<TrackId>, CatalogError> {
        self.state.lock().unwrap().page_fetches += 1;
        let end = usize::min(offset + limit, self.liked.len());
        if offset >= self.liked.len() {
            return Ok(Vec::new());
        }
        Ok(self.liked[offset..end].to_vec())
    }

    async fn tracks(&self, ids: &[TrackId]) -> Result<Vec<TrackRecord>, CatalogError> {
        self.state.lock().unwrap().track_batch_sizes.push(ids.len());
        Ok(ids
            .iter()
            .filter_map(|id| self.records.get(id).cloned())
            .collect())
    }

    async fn track(&self, id: &str) -> Result<TrackRecord, CatalogError> {
        self.records
            .get(id)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(format!("track {}", id)))
    }

    async fn artist_genres(
        &self,
        ids: &[ArtistId],
    ) -> Result<HashMap<ArtistId, HashSet<String>>, CatalogError> {
        self.state
            .lock()
            .unwrap()
            .artist_batch_sizes
            .push(ids.len());
        Ok(ids
            .iter()
            .filter_map(|id| self.genres.get(id).map(|tags| (id.clone(), tags.clone())))
            .collect())
    }

    async fn find_playlist_by_name(
        &self,
        name: &str,
    ) -> Result<Option<PlaylistHandle>, CatalogError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .playlists
            .iter()
            .find(|(handle, _)| handle.name == name)
            .map(|(handle, _)| handle.clone()))
    }

    async fn create_playlist(
        &self,
        _user_id: &str,
        name: &str,
        _description: &str,
    ) -> Result<PlaylistHandle, CatalogError> {
        let mut state = self.state.lock().unwrap();
        state.playlists_created += 1;
        let handle = PlaylistHandle {
            id: format!("created{}", state.playlists_created),
            name: name.to_string(),
        };
        state.playlists.push((handle.clone(), Vec::new()));
        Ok(handle)
    }

    async fn playlist_tracks(
        &self,
        playlist: &PlaylistHandle,
    ) -> Result<HashSet<TrackId>, CatalogError> {
        let state = self.state.lock().unwrap();
        let (_, tracks) = state
            .playlists
            .iter()
            .find(|(handle, _)| handle.id == playlist.id)
            .ok_or_else(|| CatalogError::NotFound(format!("playlist {}", playlist.id)))?;
        Ok(tracks.iter().cloned().collect())
    }

    async fn add_tracks(
        &self,
        playlist: &PlaylistHandle,
        ids: &[TrackId],
    ) -> Result<(), CatalogError> {
        let mut state = self.state.lock().unwrap();
        state.write_batch_sizes.push(ids.len());
        let (_, tracks) = state
            .playlists
            .iter_mut()
            .find(|(handle, _)| handle.id == playlist.id)
            .ok_or_else(|| CatalogError::NotFound(format!("playlist {}", playlist.id)))?;
        // Intentionally no dedup here: a faulty diff would show up as
        // duplicate entries.
        tracks.extend(ids.iter().cloned());
        Ok(())
    }

    async fn recommendations(
        &self,
        seed: &str,
        limit: usize,
    ) -> Result<Vec<TrackId>, CatalogError> {
        let recs = self
            .recommendations
            .get(seed)
            .ok_or_else(|| CatalogError::NotFound(format!("seed {}", seed)))?;
        Ok(recs.iter().take(limit).cloned().collect())
    }
}

// --- collector ---

#[tokio::test]
async fn collector_stops_on_short_page() {
    let catalog = MockCatalog::with_liked(120);

    let liked = collector::collect(&catalog, 200).await.unwrap();

    assert_eq!(liked.len(), 120);
    // Offsets 0, 50, 100; the short third page ends the walk.
    assert_eq!(catalog.state.lock().unwrap().page_fetches, 3);
}

#[tokio::test]
async fn collector_empty_library_is_success() {
    let catalog = MockCatalog::with_liked(0);

    let liked = collector::collect(&catalog, 200).await.unwrap();

    assert!(liked.is_empty());
}

#[tokio::test]
async fn collector_respects_max_tracks() {
    let catalog = MockCatalog::with_liked(120);

    let liked = collector::collect(&catalog, 100).await.unwrap();

    assert_eq!(liked.len(), 100);
    assert_eq!(catalog.state.lock().unwrap().page_fetches, 2);
}

#[tokio::test]
async fn collector_collapses_overlapping_pages() {
    // Second page repeats ids from the first; set semantics absorb them.
    let mut liked: Vec<TrackId> = (0..50).map(track_id).collect();
    liked.extend((0..10).map(track_id));
    let catalog = MockCatalog {
        liked,
        ..Default::default()
    };

    let collected = collector::collect(&catalog, 200).await.unwrap();

    assert_eq!(collected.len(), 50);
}

// --- resolver ---

fn lofi_catalog() -> MockCatalog {
    let mut catalog = MockCatalog::default();
    catalog.records.insert(
        "t1".to_string(),
        record("t1", "Tape Loop", &[("a1", "Dust Collective")]),
    );
    catalog.records.insert(
        "t2".to_string(),
        record("t2", "Night Drive", &[("a2", "Neon Fields")]),
    );
    catalog.records.insert(
        "t3".to_string(),
        record(
            "t3",
            "Crossover",
            &[("a2", "Neon Fields"), ("a3", "Brass Union")],
        ),
    );
    catalog
        .records
        .insert("t4".to_string(), record("t4", "Orphan Cut", &[]));
    catalog
        .genres
        .insert("a1".to_string(), genre_tags(&["Lofi", "chillhop"]));
    catalog
        .genres
        .insert("a2".to_string(), genre_tags(&["lofi hip hop"]));
    catalog
        .genres
        .insert("a3".to_string(), genre_tags(&["jazz", "LOFI"]));
    catalog
}

#[tokio::test]
async fn resolver_matches_exact_tag_case_insensitively() {
    let catalog = lofi_catalog();
    let candidates: HashSet<TrackId> = ["t1", "t2", "t3", "t4"]
        .iter()
        .map(|s| s.to_string())
        .collect();

    let matched = resolver::resolve(&catalog, &candidates, "lofi")
        .await
        .unwrap();

    // t1 via "Lofi", t3 via its second artist's "LOFI". t2 only carries the
    // superstring tag "lofi hip hop" and must not match. t4 has no artists.
    let expected: HashSet<TrackId> = ["t1", "t3"].iter().map(|s| s.to_string()).collect();
    assert_eq!(matched, expected);
}

#[tokio::test]
async fn resolver_superstring_tag_is_not_a_match() {
    let catalog = lofi_catalog();
    let candidates: HashSet<TrackId> = ["t2".to_string()].into_iter().collect();

    let matched = resolver::resolve(&catalog, &candidates, "lofi")
        .await
        .unwrap();

    assert!(matched.is_empty());
}

#[tokio::test]
async fn resolver_output_is_subset_of_input() {
    let catalog = lofi_catalog();
    let candidates: HashSet<TrackId> = ["t1".to_string(), "t3".to_string()].into_iter().collect();

    let matched = resolver::resolve(&catalog, &candidates, "jazz")
        .await
        .unwrap();

    assert!(matched.is_subset(&candidates));
    assert_eq!(
        matched,
        ["t3".to_string()].into_iter().collect::<HashSet<_>>()
    );
}

#[tokio::test]
async fn resolver_empty_candidates_need_no_catalog_calls() {
    let catalog = lofi_catalog();

    let matched = resolver::resolve(&catalog, &HashSet::new(), "lofi")
        .await
        .unwrap();

    assert!(matched.is_empty());
    assert!(catalog.state.lock().unwrap().track_batch_sizes.is_empty());
}

#[tokio::test]
async fn resolver_batches_within_ceiling_and_cover_every_candidate() {
    let mut catalog = MockCatalog::default();
    for i in 0..120 {
        let id = track_id(i);
        let artist = format!("a{}", i % 7);
        catalog.records.insert(
            id.clone(),
            record(&id, &id, &[(artist.as_str(), artist.as_str())]),
        );
    }
    for i in 0..7 {
        let tags = if i == 0 {
            genre_tags(&["ambient"])
        } else {
            genre_tags(&["techno"])
        };
        catalog.genres.insert(format!("a{}", i), tags);
    }
    let candidates: HashSet<TrackId> = (0..120).map(track_id).collect();

    let matched = resolver::resolve(&catalog, &candidates, "ambient")
        .await
        .unwrap();

    let state = catalog.state.lock().unwrap();
    assert!(state.track_batch_sizes.iter().all(|&n| n <= READ_BATCH));
    assert_eq!(state.track_batch_sizes.iter().sum::<usize>(), 120);
    // One artist lookup per track batch, never one per track.
    assert_eq!(state.artist_batch_sizes.len(), state.track_batch_sizes.len());
    assert!(state.artist_batch_sizes.iter().all(|&n| n <= READ_BATCH));
    drop(state);

    // a0 owns tracks 0, 7, 14, ...
    let expected: HashSet<TrackId> = (0..120).filter(|i| i % 7 == 0).map(track_id).collect();
    assert_eq!(matched, expected);
}

#[tokio::test]
async fn resolver_chunks_oversized_artist_unions() {
    // 50 tracks with two distinct artists each: one track batch, but a
    // 100-id artist union that must be split across lookups.
    let mut catalog = MockCatalog::default();
    for i in 0..50 {
        let id = track_id(i);
        let lead = format!("b{:03}", 2 * i);
        let feature = format!("b{:03}", 2 * i + 1);
        catalog.records.insert(
            id.clone(),
            record(
                &id,
                &id,
                &[(lead.as_str(), lead.as_str()), (feature.as_str(), feature.as_str())],
            ),
        );
        let tags = if i < 10 {
            genre_tags(&["ambient"])
        } else {
            genre_tags(&["techno"])
        };
        catalog.genres.insert(lead, tags);
        catalog.genres.insert(feature, genre_tags(&["noise"]));
    }
    let candidates: HashSet<TrackId> = (0..50).map(track_id).collect();

    let matched = resolver::resolve(&catalog, &candidates, "ambient")
        .await
        .unwrap();

    let state = catalog.state.lock().unwrap();
    assert!(state.artist_batch_sizes.iter().all(|&n| n <= READ_BATCH));
    assert_eq!(state.artist_batch_sizes.iter().sum::<usize>(), 100);
    drop(state);

    let expected: HashSet<TrackId> = (0..10).map(track_id).collect();
    assert_eq!(matched, expected);
}

// --- reconciler ---

#[tokio::test]
async fn reconcile_diffs_against_existing_tracks() {
    let catalog = MockCatalog::default();
    catalog.seed_playlist("Liked Songs - lofi", &["tB"]);
    let candidates: HashSet<TrackId> = ["tA", "tB", "tC"].iter().map(|s| s.to_string()).collect();

    let handle = reconciler::reconcile(&catalog, "user1", "Liked Songs - lofi", "", &candidates)
        .await
        .unwrap();

    assert_eq!(handle.name, "Liked Songs - lofi");
    let state = catalog.state.lock().unwrap();
    assert_eq!(state.playlists_created, 0);
    assert_eq!(state.write_batch_sizes, vec![2]);
    drop(state);

    let contents = catalog.playlist_contents("Liked Songs - lofi");
    let as_set: HashSet<TrackId> = contents.iter().cloned().collect();
    assert_eq!(contents.len(), 3);
    assert_eq!(as_set, candidates);
}

#[tokio::test]
async fn reconcile_creates_playlist_when_absent() {
    let catalog = MockCatalog::default();
    let candidates: HashSet<TrackId> = ["tA".to_string()].into_iter().collect();

    let handle = reconciler::reconcile(&catalog, "user1", "Fresh List", "new", &candidates)
        .await
        .unwrap();

    assert_eq!(handle.name, "Fresh List");
    assert_eq!(catalog.state.lock().unwrap().playlists_created, 1);
    assert_eq!(catalog.playlist_contents("Fresh List"), vec!["tA"]);
}

#[tokio::test]
async fn reconcile_is_idempotent() {
    let catalog = MockCatalog::default();
    let candidates: HashSet<TrackId> = (0..30).map(track_id).collect();

    reconciler::reconcile(&catalog, "user1", "Repeat", "", &candidates)
        .await
        .unwrap();
    reconciler::reconcile(&catalog, "user1", "Repeat", "", &candidates)
        .await
        .unwrap();

    let state = catalog.state.lock().unwrap();
    // Second run found nothing missing: one write total, one playlist total.
    assert_eq!(state.write_batch_sizes, vec![30]);
    assert_eq!(state.playlists_created, 1);
    drop(state);

    let contents = catalog.playlist_contents("Repeat");
    assert_eq!(contents.len(), 30);
}

#[tokio::test]
async fn reconcile_zero_additions_is_success() {
    let catalog = MockCatalog::default();
    catalog.seed_playlist("Full", &["tA", "tB"]);
    let candidates: HashSet<TrackId> = ["tA", "tB"].iter().map(|s| s.to_string()).collect();

    let handle = reconciler::reconcile(&catalog, "user1", "Full", "", &candidates)
        .await
        .unwrap();

    assert_eq!(handle.name, "Full");
    assert!(catalog.state.lock().unwrap().write_batch_sizes.is_empty());
}

#[tokio::test]
async fn reconcile_write_batches_within_ceiling() {
    let catalog = MockCatalog::default();
    let candidates: HashSet<TrackId> = (0..250).map(track_id).collect();

    reconciler::reconcile(&catalog, "user1", "Big", "", &candidates)
        .await
        .unwrap();

    let state = catalog.state.lock().unwrap();
    assert_eq!(state.write_batch_sizes.len(), 3);
    assert!(state.write_batch_sizes.iter().all(|&n| n <= WRITE_BATCH));
    assert_eq!(state.write_batch_sizes.iter().sum::<usize>(), 250);
    drop(state);

    let contents = catalog.playlist_contents("Big");
    let as_set: HashSet<TrackId> = contents.iter().cloned().collect();
    assert_eq!(as_set, candidates);
}

// --- similarity ---

#[tokio::test]
async fn expander_collapses_repeated_recommendations() {
    let mut catalog = MockCatalog::default();
    catalog.recommendations.insert(
        "seed".to_string(),
        vec![
            "r1".to_string(),
            "r2".to_string(),
            "r1".to_string(),
            "r3".to_string(),
        ],
    );

    let expanded = similar::expand(&catalog, "seed", 20).await.unwrap();

    assert_eq!(expanded.len(), 3);
}

#[tokio::test]
async fn similarity_unknown_seed_aborts_before_any_write() {
    let catalog = MockCatalog::default();

    let result = engine::generate_similarity_playlist(&catalog, "missing").await;

    assert!(matches!(result, Err(CatalogError::NotFound(_))));
    let state = catalog.state.lock().unwrap();
    assert_eq!(state.playlists_created, 0);
    assert!(state.write_batch_sizes.is_empty());
}

#[tokio::test]
async fn similarity_playlist_is_named_after_seed() {
    let mut catalog = MockCatalog::default();
    catalog.records.insert(
        "s1".to_string(),
        record("s1", "Daydream", &[("a9", "Aphex Twin")]),
    );
    catalog.recommendations.insert(
        "s1".to_string(),
        vec!["r1".to_string(), "r2".to_string(), "r1".to_string()],
    );

    let handle = engine::generate_similarity_playlist(&catalog, "s1")
        .await
        .unwrap();

    assert_eq!(handle.name, "Similar to Daydream by Aphex Twin");
    let contents = catalog.playlist_contents(&handle.name);
    let as_set: HashSet<TrackId> = contents.iter().cloned().collect();
    assert_eq!(
        as_set,
        ["r1".to_string(), "r2".to_string()].into_iter().collect()
    );
}

// --- end to end, genre mode ---

#[tokio::test]
async fn genre_playlist_end_to_end_and_idempotent() {
    let mut catalog = MockCatalog::with_liked(120);
    for i in 0..120 {
        let id = track_id(i);
        let artist = format!("a{}", i % 7);
        catalog.records.insert(
            id.clone(),
            record(&id, &id, &[(artist.as_str(), artist.as_str())]),
        );
    }
    for i in 0..7 {
        let tags = if i == 0 {
            genre_tags(&["Lofi"])
        } else {
            genre_tags(&["jazz"])
        };
        catalog.genres.insert(format!("a{}", i), tags);
    }

    let handle = engine::generate_genre_playlist(&catalog, "lofi", 200)
        .await
        .unwrap();
    assert_eq!(handle.name, "Liked Songs - lofi");

    let expected: HashSet<TrackId> = (0..120).filter(|i| i % 7 == 0).map(track_id).collect();
    let first_pass: HashSet<TrackId> = catalog
        .playlist_contents(&handle.name)
        .into_iter()
        .collect();
    assert_eq!(first_pass, expected);

    // Re-running must not duplicate anything.
    engine::generate_genre_playlist(&catalog, "lofi", 200)
        .await
        .unwrap();
    let contents = catalog.playlist_contents(&handle.name);
    assert_eq!(contents.len(), expected.len());
    assert_eq!(catalog.state.lock().unwrap().playlists_created, 1);
}
