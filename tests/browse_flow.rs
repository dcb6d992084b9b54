use anyhow::anyhow;
use cinedeck::browse::{BrowseController, BrowsePhase, PageFill};
use cinedeck::models::{MovieDetail, MovieSummary, PagedResults};
use cinedeck::tmdb::TmdbApi;
use std::sync::{Arc, Mutex};

/// Catalog fake: serves two movies per page and records every call.
struct FakeTmdb {
    total_pages: u32,
    fail: bool,
    calls: Mutex<Vec<String>>,
}

impl FakeTmdb {
    fn new(total_pages: u32) -> Self {
        Self {
            total_pages,
            fail: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(1)
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn page_of(&self, label: &str, page: u32) -> PagedResults {
        PagedResults {
            page,
            results: vec![
                movie(page as i32 * 100 + 1, &format!("{label} A p{page}")),
                movie(page as i32 * 100 + 2, &format!("{label} B p{page}")),
            ],
            total_pages: self.total_pages,
            total_results: self.total_pages * 2,
        }
        .normalize()
    }
}

#[async_trait::async_trait]
impl TmdbApi for FakeTmdb {
    async fn search_movies(&self, query: &str, page: u32) -> anyhow::Result<PagedResults> {
        self.calls.lock().unwrap().push(format!("search:{query}:{page}"));
        if self.fail {
            return Err(anyhow!("503 from catalog"));
        }
        Ok(self.page_of(query, page))
    }

    async fn popular_movies(&self, page: u32) -> anyhow::Result<PagedResults> {
        self.calls.lock().unwrap().push(format!("popular:{page}"));
        if self.fail {
            return Err(anyhow!("503 from catalog"));
        }
        Ok(self.page_of("popular", page))
    }

    async fn movie_details(&self, id: i32) -> anyhow::Result<MovieDetail> {
        self.calls.lock().unwrap().push(format!("details:{id}"));
        Err(anyhow!("not used in these flows"))
    }
}

fn movie(id: i32, title: &str) -> MovieSummary {
    MovieSummary {
        id,
        title: title.to_string(),
        original_title: title.to_string(),
        overview: String::new(),
        poster_path: Some(format!("/poster-{id}.jpg")),
        backdrop_path: None,
        release_date: Some("2024-06-01".to_string()),
        vote_average: 7.2,
        vote_count: 321,
        popularity: 55.0,
        genre_ids: vec![18],
        original_language: "en".to_string(),
        adult: false,
        video: false,
    }
}

fn controller(fake: &Arc<FakeTmdb>) -> BrowseController {
    BrowseController::new(fake.clone() as Arc<dyn TmdbApi>)
}

#[tokio::test]
async fn popular_load_fills_first_page() {
    let fake = Arc::new(FakeTmdb::new(5));
    let mut browser = controller(&fake);

    browser.load_popular().await;

    assert_eq!(browser.phase(), BrowsePhase::Ready);
    assert_eq!(browser.current_page(), 1);
    assert_eq!(browser.total_pages(), 5);
    assert_eq!(browser.query(), "");
    assert_eq!(browser.results().len(), 2);
    assert_eq!(fake.calls(), vec!["popular:1"]);
}

#[tokio::test]
async fn search_replaces_results_and_resets_page() {
    let fake = Arc::new(FakeTmdb::new(5));
    let mut browser = controller(&fake);

    browser.load_popular().await;
    browser.change_page(3).await;
    browser.submit_search("dune").await;

    assert_eq!(browser.phase(), BrowsePhase::Ready);
    assert_eq!(browser.query(), "dune");
    assert_eq!(browser.current_page(), 1);
    assert!(browser.results().iter().all(|m| m.title.starts_with("dune")));
    assert_eq!(fake.calls(), vec!["popular:1", "popular:3", "search:dune:1"]);
}

#[tokio::test]
async fn blank_query_issues_no_request() {
    let fake = Arc::new(FakeTmdb::new(5));
    let mut browser = controller(&fake);

    browser.submit_search("   ").await;

    assert_eq!(browser.phase(), BrowsePhase::Idle);
    assert!(fake.calls().is_empty());
}

#[tokio::test]
async fn zero_results_is_ready_not_error() {
    struct Empty;
    #[async_trait::async_trait]
    impl TmdbApi for Empty {
        async fn search_movies(&self, _: &str, page: u32) -> anyhow::Result<PagedResults> {
            Ok(PagedResults {
                page,
                results: Vec::new(),
                total_pages: 0,
                total_results: 0,
            })
        }
        async fn popular_movies(&self, _: u32) -> anyhow::Result<PagedResults> {
            Err(anyhow!("unused"))
        }
        async fn movie_details(&self, _: i32) -> anyhow::Result<MovieDetail> {
            Err(anyhow!("unused"))
        }
    }

    let mut browser = BrowseController::new(Arc::new(Empty));
    browser.submit_search("zzzzzz").await;

    assert_eq!(browser.phase(), BrowsePhase::Ready);
    assert!(browser.results().is_empty());
    assert!(browser.error().is_none());
}

#[tokio::test]
async fn out_of_range_pages_are_noops() {
    let fake = Arc::new(FakeTmdb::new(5));
    let mut browser = controller(&fake);
    browser.load_popular().await;
    let before = fake.calls().len();

    browser.change_page(0).await;
    browser.change_page(6).await;

    assert_eq!(fake.calls().len(), before);
    assert_eq!(browser.current_page(), 1);
    assert_eq!(browser.phase(), BrowsePhase::Ready);
}

#[tokio::test]
async fn change_page_keeps_mode_and_query() {
    let fake = Arc::new(FakeTmdb::new(5));
    let mut browser = controller(&fake);

    browser.submit_search("heat").await;
    browser.change_page(2).await;

    assert_eq!(browser.query(), "heat");
    assert_eq!(browser.current_page(), 2);
    assert_eq!(browser.total_pages(), 5);
    assert_eq!(fake.calls(), vec!["search:heat:1", "search:heat:2"]);
}

#[tokio::test]
async fn reported_page_count_is_capped() {
    let fake = Arc::new(FakeTmdb::new(9000));
    let mut browser = controller(&fake);

    browser.load_popular().await;

    assert_eq!(browser.total_pages(), 500);
}

#[tokio::test]
async fn failure_surfaces_generic_message_only() {
    let fake = Arc::new(FakeTmdb::failing());
    let mut browser = controller(&fake);

    browser.load_popular().await;

    assert_eq!(browser.phase(), BrowsePhase::Error);
    assert_eq!(browser.error(), Some("Could not load popular movies"));

    browser.submit_search("dune").await;
    assert_eq!(browser.error(), Some("Could not search movies"));
}

#[tokio::test]
async fn stale_completion_is_discarded() {
    let fake = Arc::new(FakeTmdb::new(5));
    let mut browser = controller(&fake);

    // Two cycles in flight; the older one settles last and must lose.
    let first = browser.begin();
    let second = browser.begin();

    browser.finish_search(second, "fresh".to_string(), Ok(fake.page_of("fresh", 1)));
    assert_eq!(browser.phase(), BrowsePhase::Ready);
    assert_eq!(browser.query(), "fresh");

    browser.finish_search(first, "stale".to_string(), Ok(fake.page_of("stale", 1)));
    assert_eq!(browser.query(), "fresh");
    assert!(browser.results().iter().all(|m| m.title.starts_with("fresh")));
}

#[tokio::test]
async fn stale_error_does_not_clobber_fresh_results() {
    let fake = Arc::new(FakeTmdb::new(5));
    let mut browser = controller(&fake);

    let first = browser.begin();
    let second = browser.begin();

    browser.finish_popular(second, Ok(fake.page_of("popular", 1)));
    browser.finish_popular(first, Err(anyhow!("timed out")));

    assert_eq!(browser.phase(), BrowsePhase::Ready);
    assert!(browser.error().is_none());
    assert_eq!(browser.results().len(), 2);
}

#[tokio::test]
async fn append_mode_extends_results_across_pages() {
    let fake = Arc::new(FakeTmdb::new(5));
    let mut browser = controller(&fake).with_fill(PageFill::Append);

    browser.load_popular().await;
    browser.change_page(2).await;
    browser.change_page(3).await;

    assert_eq!(browser.current_page(), 3);
    assert_eq!(browser.results().len(), 6);
    // Earlier pages stay in order at the front.
    assert_eq!(browser.results()[0].title, "popular A p1");
    assert_eq!(browser.results()[4].title, "popular A p3");
}

#[tokio::test]
async fn replace_mode_swaps_results_on_page_change() {
    let fake = Arc::new(FakeTmdb::new(5));
    let mut browser = controller(&fake);

    browser.load_popular().await;
    browser.change_page(2).await;

    assert_eq!(browser.results().len(), 2);
    assert!(browser.results().iter().all(|m| m.title.ends_with("p2")));
}
