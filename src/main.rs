use anyhow::Result;
use cinedeck::favorites::{FavoritesStore, FileBackend};
use cinedeck::tmdb::{TmdbApi, TmdbClient};
use dotenvy::dotenv;
use std::env;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

fn check_env() -> Result<()> {
    let required = ["TMDB_API_KEY"];
    for key in required {
        if env::var(key).is_err() {
            anyhow::bail!("Missing required environment variable: {}", key);
        }
    }
    info!("All required environment variables are set");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    match dotenv() {
        Ok(path) => info!("Loaded environment from {:?}", path),
        Err(e) => warn!("No .env file loaded ({}) - relying on environment", e),
    }
    init_tracing();
    check_env()?;

    let api: Arc<dyn TmdbApi> = Arc::new(TmdbClient::from_env()?);
    let favorites_path =
        env::var("CINEDECK_FAVORITES").unwrap_or_else(|_| "favorites.json".to_string());
    info!("Favorites stored in {}", favorites_path);
    let favorites = FavoritesStore::new(Box::new(FileBackend::new(favorites_path)));

    cinedeck::app::run(api, favorites).await
}
