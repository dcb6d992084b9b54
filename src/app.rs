use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

use crate::browse::{BrowseController, BrowsePhase};
use crate::favorites::FavoritesStore;
use crate::models::{format_grouped, MovieDetail, MovieSummary};
use crate::pagination::{window, PageLink};
use crate::tmdb::{image_url, ImageSize, TmdbApi};

const BANNER_ROTATE_SECS: u64 = 20;
const TOP_CAST: usize = 5;

struct Session {
    api: Arc<dyn TmdbApi>,
    browser: BrowseController,
    favorites: FavoritesStore,
    banner_index: usize,
}

/// Reads commands from stdin and drives the browse/detail/favorites views
/// until `quit`, end of input, or a shutdown signal.
pub async fn run(api: Arc<dyn TmdbApi>, favorites: FavoritesStore) -> Result<()> {
    let mut session = Session {
        api: api.clone(),
        browser: BrowseController::new(api),
        favorites,
        banner_index: 0,
    };

    session.browser.load_popular().await;
    session.render_browse();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut banner = tokio::time::interval(Duration::from_secs(BANNER_ROTATE_SECS));
    banner.tick().await; // the first tick fires immediately
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line? {
                    Some(line) => {
                        if !session.handle(&line).await {
                            break;
                        }
                    }
                    None => {
                        info!("End of input, exiting");
                        break;
                    }
                }
            }
            _ = banner.tick() => session.rotate_banner(),
            _ = &mut shutdown => break,
        }
    }
    Ok(())
}

impl Session {
    /// Dispatches one command line. Returns `false` when the session should end.
    async fn handle(&mut self, line: &str) -> bool {
        let mut parts = line.trim().split_whitespace();
        let Some(command) = parts.next() else {
            return true;
        };
        match command {
            "search" => {
                let query = parts.collect::<Vec<_>>().join(" ");
                self.browser.submit_search(&query).await;
                self.render_browse();
            }
            "popular" => {
                self.browser.load_popular().await;
                self.render_browse();
            }
            "page" => match parts.next().and_then(|s| s.parse::<u32>().ok()) {
                Some(page) => {
                    self.browser.change_page(page).await;
                    self.render_browse();
                }
                None => println!("usage: page <number>"),
            },
            "next" => {
                let page = self.browser.current_page() + 1;
                self.browser.change_page(page).await;
                self.render_browse();
            }
            "prev" => {
                let page = self.browser.current_page().saturating_sub(1);
                self.browser.change_page(page).await;
                self.render_browse();
            }
            "open" => match parts.next().and_then(|s| s.parse::<i32>().ok()) {
                Some(id) => self.open_details(id).await,
                None => println!("usage: open <movie id>"),
            },
            "fav" => match parts.next().and_then(|s| s.parse::<i32>().ok()) {
                Some(id) => self.add_favorite(id).await,
                None => println!("usage: fav <movie id>"),
            },
            "unfav" => match parts.next().and_then(|s| s.parse::<i32>().ok()) {
                Some(id) => {
                    self.favorites.remove(id);
                    println!("Removed from favorites.");
                }
                None => println!("usage: unfav <movie id>"),
            },
            "favs" => self.render_favorites(),
            "help" => print_help(),
            "quit" | "exit" => {
                info!("Session closed");
                return false;
            }
            other => {
                // Catch-all, the terminal analog of the not-found route.
                println!("Unknown command '{other}'. Type 'help' for the command list.");
            }
        }
        true
    }

    async fn open_details(&self, id: i32) {
        match self.api.movie_details(id).await {
            Ok(detail) => {
                let is_favorite = self.favorites.contains(detail.id);
                render_detail(&detail, is_favorite);
            }
            Err(e) => {
                warn!("Could not load details for movie {id}: {e:#}");
                println!("Could not load movie details");
            }
        }
    }

    async fn add_favorite(&self, id: i32) {
        if self.favorites.contains(id) {
            println!("Already in favorites.");
            return;
        }
        if let Some(movie) = self.browser.results().iter().find(|m| m.id == id).cloned() {
            let title = movie.title.clone();
            self.favorites.add(movie);
            println!("Added '{title}' to favorites.");
            return;
        }
        // Not on the current page; pull the record from the catalog instead.
        match self.api.movie_details(id).await {
            Ok(detail) => {
                self.favorites.add(detail.summary());
                println!("Added '{}' to favorites.", detail.title);
            }
            Err(e) => {
                warn!("Could not load details for movie {id}: {e:#}");
                println!("Could not load movie details");
            }
        }
    }

    /// Advances the featured backdrop independent of all other state. The
    /// new pick shows up on the next browse render.
    fn rotate_banner(&mut self) {
        let count = self.browser.results().len();
        if count == 0 {
            return;
        }
        self.banner_index = (self.banner_index + 1) % count;
        debug!(index = self.banner_index, "rotated banner");
    }

    fn render_browse(&self) {
        println!();
        if let Some(featured) = self.browser.results().get(self.banner_index) {
            println!(
                "~ {} ~  {}",
                featured.title,
                image_url(featured.backdrop_path.as_deref(), ImageSize::W780)
            );
        }
        match self.browser.phase() {
            BrowsePhase::Idle => println!("Type 'search <title>' or 'popular' to begin."),
            BrowsePhase::Loading => println!("Loading..."),
            BrowsePhase::Error => {
                let message = self.browser.error().unwrap_or("Something went wrong");
                println!("{message}. Try the last command again.");
            }
            BrowsePhase::Ready => {
                if self.browser.is_searching() {
                    println!(
                        "Results for '{}' (page {} of {})",
                        self.browser.query(),
                        self.browser.current_page(),
                        self.browser.total_pages()
                    );
                } else {
                    println!(
                        "Popular movies (page {} of {})",
                        self.browser.current_page(),
                        self.browser.total_pages()
                    );
                }
                if self.browser.results().is_empty() {
                    println!("No results found.");
                } else {
                    for movie in self.browser.results() {
                        println!("{}", summary_row(movie, self.favorites.contains(movie.id)));
                    }
                    let strip = pagination_line(
                        self.browser.current_page(),
                        self.browser.total_pages(),
                    );
                    if !strip.is_empty() {
                        println!("{strip}");
                    }
                }
            }
        }
    }

    fn render_favorites(&self) {
        let favorites = self.favorites.list();
        println!();
        match favorites.len() {
            0 => println!("No favorites yet. Add one with 'fav <movie id>'."),
            1 => println!("Favorites (1 movie saved)"),
            n => println!("Favorites ({n} movies saved)"),
        }
        for movie in &favorites {
            println!("{}", summary_row(movie, true));
        }
    }
}

fn summary_row(movie: &MovieSummary, is_favorite: bool) -> String {
    let marker = if is_favorite { "*" } else { " " };
    let year = movie
        .release_year()
        .map(|y| y.to_string())
        .unwrap_or_else(|| "----".to_string());
    format!(
        "{marker} {:>8}  {}  ({year})  {}/10",
        movie.id,
        movie.title,
        movie.rating_label()
    )
}

fn render_detail(movie: &MovieDetail, is_favorite: bool) {
    let year = movie
        .release_year()
        .map(|y| y.to_string())
        .unwrap_or_else(|| "N/A".to_string());
    println!();
    println!("{} ({year})", movie.title);
    if !movie.tagline.is_empty() {
        println!("  \"{}\"", movie.tagline);
    }
    println!(
        "  {}/10 ({} votes){}",
        movie.rating_label(),
        format_grouped(movie.vote_count as u64),
        movie
            .runtime_label()
            .map(|r| format!("  {r}"))
            .unwrap_or_default()
    );
    if !movie.genres.is_empty() {
        let names: Vec<&str> = movie.genres.iter().map(|g| g.name.as_str()).collect();
        println!("  {}", names.join(", "));
    }
    if movie.overview.is_empty() {
        println!("  No synopsis available.");
    } else {
        println!("  {}", movie.overview);
    }
    if let Some(director) = movie.director() {
        println!("  Director: {}", director.name);
    }
    let cast = movie.top_cast(TOP_CAST);
    if !cast.is_empty() {
        println!("  Cast:");
        for member in cast {
            println!("    {} as {}", member.name, member.character);
        }
    }
    if !movie.status.is_empty() {
        println!("  Status: {}", movie.status);
    }
    if !movie.original_language.is_empty() {
        println!("  Language: {}", movie.original_language.to_uppercase());
    }
    if !movie.production_companies.is_empty() {
        let names: Vec<&str> = movie
            .production_companies
            .iter()
            .take(5)
            .map(|c| c.name.as_str())
            .collect();
        println!("  Production: {}", names.join(", "));
    }
    if movie.budget > 0 {
        println!("  Budget: ${}", format_grouped(movie.budget));
    }
    if movie.revenue > 0 {
        println!("  Revenue: ${}", format_grouped(movie.revenue));
    }
    println!(
        "  Poster: {}",
        image_url(movie.poster_path.as_deref(), ImageSize::W500)
    );
    if movie.backdrop_path.is_some() {
        println!(
            "  Backdrop: {}",
            image_url(movie.backdrop_path.as_deref(), ImageSize::Original)
        );
    }
    if let Some(imdb) = movie.imdb_id.as_deref() {
        println!("  IMDb: https://www.imdb.com/title/{imdb}");
    }
    if is_favorite {
        println!("  In favorites. 'unfav {}' removes it.", movie.id);
    } else {
        println!("  'fav {}' adds it to favorites.", movie.id);
    }
}

fn pagination_line(current: u32, total: u32) -> String {
    let links = window(current, total);
    if links.is_empty() {
        return String::new();
    }
    let mut parts = Vec::with_capacity(links.len());
    for link in links {
        match link {
            PageLink::Page(page) if page == current => parts.push(format!("[{page}]")),
            PageLink::Page(page) => parts.push(page.to_string()),
            PageLink::Gap => parts.push("...".to_string()),
        }
    }
    format!("pages: {}", parts.join(" "))
}

fn print_help() {
    println!("Commands:");
    println!("  search <title>   search the catalog");
    println!("  popular          back to the popular list");
    println!("  page <n>         jump to a result page");
    println!("  next / prev      step through result pages");
    println!("  open <id>        show movie details");
    println!("  fav <id>         add a movie to favorites");
    println!("  unfav <id>       remove a movie from favorites");
    println!("  favs             list saved favorites");
    println!("  quit             exit");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        let mut term = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        term.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Shutdown signal received (Ctrl+C)");
        }
        _ = terminate => {
            info!("Shutdown signal received (SIGTERM)");
        }
    }
}
