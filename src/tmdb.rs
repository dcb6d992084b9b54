use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::env;
use std::time::Duration;
use tracing::debug;

use crate::models::{MovieDetail, PagedResults};

const TMDB_BASE: &str = "https://api.themoviedb.org/3";
const IMAGE_BASE: &str = "https://image.tmdb.org/t/p";
const PLACEHOLDER_IMAGE: &str = "/placeholder.svg";
const DEFAULT_LANGUAGE: &str = "en-US";

#[derive(Debug, Clone)]
pub struct TmdbClient {
    client: Client,
    api_key: String,
    language: String,
}

#[async_trait]
pub trait TmdbApi: Send + Sync {
    async fn search_movies(&self, query: &str, page: u32) -> Result<PagedResults>;
    async fn popular_movies(&self, page: u32) -> Result<PagedResults>;
    async fn movie_details(&self, id: i32) -> Result<MovieDetail>;
}

/// Size buckets the image CDN serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSize {
    W200,
    W300,
    W500,
    W780,
    Original,
}

impl ImageSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageSize::W200 => "w200",
            ImageSize::W300 => "w300",
            ImageSize::W500 => "w500",
            ImageSize::W780 => "w780",
            ImageSize::Original => "original",
        }
    }
}

/// Composes an asset URL for a catalog image path. Pure: a missing path
/// yields the bundled placeholder reference, never an error.
pub fn image_url(path: Option<&str>, size: ImageSize) -> String {
    match path {
        Some(p) => format!("{IMAGE_BASE}/{}{p}", size.as_str()),
        None => PLACEHOLDER_IMAGE.to_string(),
    }
}

impl TmdbClient {
    pub fn from_env() -> Result<Self> {
        let api_key = env::var("TMDB_API_KEY").context("TMDB_API_KEY not set")?;
        let language =
            env::var("TMDB_LANGUAGE").unwrap_or_else(|_| DEFAULT_LANGUAGE.to_string());
        let user_agent = format!("cinedeck/{}", env!("CARGO_PKG_VERSION"));
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(30))
            .user_agent(user_agent)
            .build()
            .context("Failed to build TMDB HTTP client")?;
        Ok(Self {
            client,
            api_key,
            language,
        })
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, url: &str) -> Result<T> {
        let res = self
            .client
            .get(url)
            .send()
            .await
            .context("request failed")?;
        let status = res.status();
        let text = res.text().await.context("reading body failed")?;
        if !status.is_success() {
            return Err(anyhow!("{} -> {} {}", url, status, text));
        }
        let parsed: T = serde_json::from_str(&text).context("JSON parse failed")?;
        Ok(parsed)
    }
}

#[async_trait]
impl TmdbApi for TmdbClient {
    async fn search_movies(&self, query: &str, page: u32) -> Result<PagedResults> {
        let url = format!(
            "{TMDB_BASE}/search/movie?api_key={}&query={}&page={page}&language={}",
            self.api_key,
            urlencoding::encode(query),
            self.language
        );
        debug!(page, "searching movies for '{}'", query);
        let data: PagedResults = self.get_json(&url).await?;
        Ok(data.normalize())
    }

    async fn popular_movies(&self, page: u32) -> Result<PagedResults> {
        let url = format!(
            "{TMDB_BASE}/movie/popular?api_key={}&page={page}&language={}",
            self.api_key, self.language
        );
        debug!(page, "fetching popular movies");
        let data: PagedResults = self.get_json(&url).await?;
        Ok(data.normalize())
    }

    async fn movie_details(&self, id: i32) -> Result<MovieDetail> {
        // Credits ride along on the detail request; one round trip per view.
        let url = format!(
            "{TMDB_BASE}/movie/{id}?api_key={}&append_to_response=credits&language={}",
            self.api_key, self.language
        );
        debug!(id, "fetching movie details");
        self.get_json(&url).await
    }
}
