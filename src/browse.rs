use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::models::{MovieSummary, PagedResults};
use crate::tmdb::TmdbApi;

/// Where the controller is in the current request cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowsePhase {
    Idle,
    Loading,
    Ready,
    Error,
}

/// How a page load lands in the result list: `Replace` is the paged
/// browser, `Append` is the infinite-scroll variant of the same controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageFill {
    Replace,
    Append,
}

const ERR_SEARCH: &str = "Could not search movies";
const ERR_POPULAR: &str = "Could not load popular movies";
const ERR_PAGE: &str = "Could not load page";

/// Owns the current query/page/result-set state and orchestrates catalog
/// requests for it.
///
/// Every issued fetch carries a ticket from `begin`; a completion whose
/// ticket is no longer the latest issued is discarded, so a slow stale
/// response can never overwrite a newer one.
pub struct BrowseController {
    api: Arc<dyn TmdbApi>,
    fill: PageFill,
    seq: u64,
    phase: BrowsePhase,
    query: String,
    current_page: u32,
    total_pages: u32,
    results: Vec<MovieSummary>,
    error: Option<String>,
}

impl BrowseController {
    pub fn new(api: Arc<dyn TmdbApi>) -> Self {
        Self {
            api,
            fill: PageFill::Replace,
            seq: 0,
            phase: BrowsePhase::Idle,
            query: String::new(),
            current_page: 1,
            total_pages: 0,
            results: Vec::new(),
            error: None,
        }
    }

    pub fn with_fill(mut self, fill: PageFill) -> Self {
        self.fill = fill;
        self
    }

    pub fn phase(&self) -> BrowsePhase {
        self.phase
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    pub fn results(&self) -> &[MovieSummary] {
        &self.results
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Searching (non-empty query) vs browsing the popular list.
    pub fn is_searching(&self) -> bool {
        !self.query.is_empty()
    }

    /// Runs a search cycle for `query` from page 1. An empty query after
    /// trimming never issues a request.
    pub async fn submit_search(&mut self, query: &str) {
        let query = query.trim().to_string();
        if query.is_empty() {
            debug!("ignoring empty search query");
            return;
        }
        let ticket = self.begin();
        let outcome = self.api.search_movies(&query, 1).await;
        self.finish_search(ticket, query, outcome);
    }

    /// Runs a popular-movies cycle from page 1 and clears the query.
    pub async fn load_popular(&mut self) {
        let ticket = self.begin();
        let outcome = self.api.popular_movies(1).await;
        self.finish_popular(ticket, outcome);
    }

    /// Re-fetches the current mode (search when a query is set, popular
    /// otherwise) for `page`. Out-of-range pages are ignored without a
    /// request.
    pub async fn change_page(&mut self, page: u32) {
        if page < 1 || page > self.total_pages {
            debug!(page, total = self.total_pages, "ignoring out-of-range page");
            return;
        }
        let ticket = self.begin();
        let outcome = if self.query.is_empty() {
            self.api.popular_movies(page).await
        } else {
            self.api.search_movies(&self.query, page).await
        };
        self.finish_page(ticket, page, outcome);
    }

    /// Starts a request cycle: marks the state Loading and returns the
    /// ticket the matching `finish_*` call must present. Issuing a new
    /// ticket supersedes every earlier in-flight one.
    pub fn begin(&mut self) -> u64 {
        self.seq += 1;
        self.phase = BrowsePhase::Loading;
        self.error = None;
        self.seq
    }

    pub fn finish_search(&mut self, ticket: u64, query: String, outcome: Result<PagedResults>) {
        if self.is_stale(ticket) {
            return;
        }
        match outcome {
            Ok(page) => {
                self.query = query;
                self.apply_first_page(page);
            }
            Err(e) => self.fail(ERR_SEARCH, e),
        }
    }

    pub fn finish_popular(&mut self, ticket: u64, outcome: Result<PagedResults>) {
        if self.is_stale(ticket) {
            return;
        }
        match outcome {
            Ok(page) => {
                self.query.clear();
                self.apply_first_page(page);
            }
            Err(e) => self.fail(ERR_POPULAR, e),
        }
    }

    pub fn finish_page(&mut self, ticket: u64, page: u32, outcome: Result<PagedResults>) {
        if self.is_stale(ticket) {
            return;
        }
        match outcome {
            Ok(results) => {
                match self.fill {
                    PageFill::Replace => self.results = results.results,
                    PageFill::Append => self.results.extend(results.results),
                }
                self.current_page = page;
                self.phase = BrowsePhase::Ready;
            }
            Err(e) => self.fail(ERR_PAGE, e),
        }
    }

    fn is_stale(&self, ticket: u64) -> bool {
        if ticket != self.seq {
            debug!(ticket, latest = self.seq, "discarding superseded completion");
            return true;
        }
        false
    }

    fn apply_first_page(&mut self, page: PagedResults) {
        self.results = page.results;
        self.total_pages = page.total_pages;
        self.current_page = 1;
        self.phase = BrowsePhase::Ready;
    }

    fn fail(&mut self, message: &str, cause: anyhow::Error) {
        // The cause goes to the log; the user only sees the generic message.
        warn!("{message}: {cause:#}");
        self.phase = BrowsePhase::Error;
        self.error = Some(message.to_string());
    }
}
