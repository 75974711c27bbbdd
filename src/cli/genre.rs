use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tabled::Table;

use crate::{
    engine::{self, CatalogGateway, READ_BATCH, collector, resolver},
    error,
    error::CatalogError,
    info,
    management::TokenManager,
    spotify::catalog::SpotifyCatalog,
    success,
    types::{MatchTableRow, TrackId},
    warning,
};

pub async fn genre(target_genre: String, max_tracks: usize, dry_run: bool) {
    let token_mgr = match TokenManager::load().await {
        Ok(t) => t,
        Err(e) => {
            error!(
                "Failed to load token. Please run genplcli auth\n Error: {}",
                e
            );
        }
    };

    let catalog = SpotifyCatalog::new(token_mgr);

    if dry_run {
        preview(&catalog, &target_genre, max_tracks).await;
        return;
    }

    let pb = ProgressBar::new_spinner();
    pb.set_message(format!("Building playlist for genre {}...", target_genre));
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_style(
        ProgressStyle::with_template("{spinner:.blue} {msg}")
            .unwrap()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
    );

    let result = engine::generate_genre_playlist(&catalog, &target_genre, max_tracks).await;
    pb.finish_and_clear();

    match result {
        Ok(handle) => success!("Playlist {} is up to date.", handle.name),
        Err(CatalogError::Auth(e)) => {
            error!(
                "Spotify rejected the credential. Please run genplcli auth\n Error: {}",
                e
            );
        }
        Err(e) => error!("Failed to build playlist: {}", e),
    }
}

/// Classifies the liked library and prints the matches as a table instead
/// of writing to the playlist.
async fn preview(catalog: &SpotifyCatalog, target_genre: &str, max_tracks: usize) {
    let pb = ProgressBar::new_spinner();
    pb.set_message("Scanning liked tracks...");
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_style(
        ProgressStyle::with_template("{spinner:.blue} {msg}")
            .unwrap()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
    );

    let liked = match collector::collect(catalog, max_tracks).await {
        Ok(liked) => liked,
        Err(e) => {
            pb.finish_and_clear();
            error!("Failed to scan liked tracks: {}", e);
        }
    };

    pb.set_message(format!("Classifying {} liked tracks...", liked.len()));

    let matched = match resolver::resolve(catalog, &liked, target_genre).await {
        Ok(matched) => matched,
        Err(e) => {
            pb.finish_and_clear();
            error!("Failed to resolve genres: {}", e);
        }
    };

    pb.finish_and_clear();

    if matched.is_empty() {
        warning!("No liked tracks match genre {}.", target_genre);
        return;
    }

    let mut ids: Vec<TrackId> = matched.into_iter().collect();
    ids.sort();

    let mut rows: Vec<MatchTableRow> = Vec::new();
    for chunk in ids.chunks(READ_BATCH) {
        match catalog.tracks(chunk).await {
            Ok(records) => rows.extend(records.into_iter().map(|record| {
                let artists = record
                    .artists
                    .iter()
                    .map(|a| a.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
                MatchTableRow {
                    track: record.name,
                    artists,
                }
            })),
            Err(e) => warning!("Failed to fetch track details: {}", e),
        }
    }

    rows.sort_by(|a, b| a.track.to_lowercase().cmp(&b.track.to_lowercase()));

    info!("{} liked tracks match genre {}:", rows.len(), target_genre);
    let table = Table::new(rows);
    println!("{}", table);
}
