use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use crate::{
    engine, error, error::CatalogError, management::TokenManager, spotify::catalog::SpotifyCatalog,
    success,
};

pub async fn similar(seed_track_id: String) {
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

    let pb = ProgressBar::new_spinner();
    pb.set_message("Fetching recommendations...");
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_style(
        ProgressStyle::with_template("{spinner:.blue} {msg}")
            .unwrap()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
    );

    let result = engine::generate_similarity_playlist(&catalog, &seed_track_id).await;
    pb.finish_and_clear();

    match result {
        Ok(handle) => success!("Playlist {} is up to date.", handle.name),
        Err(CatalogError::NotFound(e)) => {
            error!("Seed track {} was not found: {}", seed_track_id, e);
        }
        Err(CatalogError::Auth(e)) => {
            error!(
                "Spotify rejected the credential. Please run genplcli auth\n Error: {}",
                e
            );
        }
        Err(e) => error!("Failed to build playlist: {}", e),
    }
}
