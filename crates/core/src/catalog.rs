//! Typed catalog queries on top of [`Transport`].

use std::future::Future;

use chrono::{Months, NaiveDate, Utc};

use crate::{
    error::FetchError,
    models::{Game, Genre, Page},
    transport::{Params, Transport},
};

/// Catalog operations the store depends on.
///
/// [`CatalogService`] is the HTTP implementation; tests substitute their own.
pub trait Catalog: Send + Sync + 'static {
    /// One page of all games.
    fn list_all(
        &self,
        page: u32,
        page_size: u32,
    ) -> impl Future<Output = Result<Page<Game>, FetchError>> + Send;

    /// Full record for a single game.
    fn get_by_id(&self, id: u64) -> impl Future<Output = Result<Game, FetchError>> + Send;

    /// Every genre. The envelope count is discarded.
    fn list_genres(&self) -> impl Future<Output = Result<Vec<Genre>, FetchError>> + Send;

    /// One page of games in a genre.
    fn list_by_genre(
        &self,
        genre_id: u64,
        page: u32,
        page_size: u32,
    ) -> impl Future<Output = Result<Page<Game>, FetchError>> + Send;

    /// One page of games ordered by user rating, best first.
    ///
    /// The "popular" label is historical; this does not look at critic
    /// scores or play counts.
    fn list_popular(
        &self,
        page: u32,
        page_size: u32,
    ) -> impl Future<Output = Result<Page<Game>, FetchError>> + Send;

    /// One page of games released during the last year, newest first.
    fn list_new_releases(
        &self,
        page: u32,
        page_size: u32,
    ) -> impl Future<Output = Result<Page<Game>, FetchError>> + Send;

    /// Free-text search using the server's default page size.
    fn search(&self, text: &str) -> impl Future<Output = Result<Page<Game>, FetchError>> + Send;

    /// Free-text search for an explicit page.
    fn search_page(
        &self,
        text: &str,
        page: u32,
        page_size: u32,
    ) -> impl Future<Output = Result<Page<Game>, FetchError>> + Send;
}

/// Inclusive date range covering the year up to and including `end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReleaseWindow {
    /// First day of the window.
    pub start: NaiveDate,
    /// Last day of the window.
    pub end: NaiveDate,
}

impl ReleaseWindow {
    /// Window ending on `end` and starting one calendar year earlier.
    /// February 29th maps back to February 28th.
    pub fn ending(end: NaiveDate) -> Self {
        let start = end.checked_sub_months(Months::new(12)).unwrap_or(end);
        Self { start, end }
    }

    /// Window ending today (UTC).
    pub fn current() -> Self {
        Self::ending(Utc::now().date_naive())
    }

    /// Number of days from start to end.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    /// Value for the `dates` query parameter.
    pub fn as_param(&self) -> String {
        format!(
            "{},{}",
            self.start.format("%Y-%m-%d"),
            self.end.format("%Y-%m-%d")
        )
    }
}

/// Catalog backed by the REST API.
#[derive(Debug, Clone)]
pub struct CatalogService {
    transport: Transport,
}

impl CatalogService {
    /// Catalog issuing its requests through `transport`.
    pub fn new(transport: Transport) -> Self {
        Self { transport }
    }

    /// Page of new releases inside an explicit window.
    pub async fn list_released_within(
        &self,
        window: ReleaseWindow,
        page: u32,
        page_size: u32,
    ) -> Result<Page<Game>, FetchError> {
        let mut params = vec![
            ("dates", window.as_param()),
            ("ordering", "-released".to_string()),
        ];
        params.extend(paging(page, page_size));
        self.transport.get("/games", params).await
    }
}

fn paging(page: u32, page_size: u32) -> Params {
    vec![("page", page.to_string()), ("page_size", page_size.to_string())]
}

impl Catalog for CatalogService {
    async fn list_all(&self, page: u32, page_size: u32) -> Result<Page<Game>, FetchError> {
        self.transport.get("/games", paging(page, page_size)).await
    }

    async fn get_by_id(&self, id: u64) -> Result<Game, FetchError> {
        self.transport
            .get(&format!("/games/{id}"), Vec::new())
            .await
    }

    async fn list_genres(&self) -> Result<Vec<Genre>, FetchError> {
        let page: Page<Genre> = self.transport.get("/genres", Vec::new()).await?;
        Ok(page.results)
    }

    async fn list_by_genre(
        &self,
        genre_id: u64,
        page: u32,
        page_size: u32,
    ) -> Result<Page<Game>, FetchError> {
        let mut params = vec![("genres", genre_id.to_string())];
        params.extend(paging(page, page_size));
        self.transport.get("/games", params).await
    }

    async fn list_popular(&self, page: u32, page_size: u32) -> Result<Page<Game>, FetchError> {
        let mut params = vec![("ordering", "-rating".to_string())];
        params.extend(paging(page, page_size));
        self.transport.get("/games", params).await
    }

    async fn list_new_releases(
        &self,
        page: u32,
        page_size: u32,
    ) -> Result<Page<Game>, FetchError> {
        self.list_released_within(ReleaseWindow::current(), page, page_size)
            .await
    }

    async fn search(&self, text: &str) -> Result<Page<Game>, FetchError> {
        self.transport
            .get("/games", vec![("search", text.to_string())])
            .await
    }

    async fn search_page(
        &self,
        text: &str,
        page: u32,
        page_size: u32,
    ) -> Result<Page<Game>, FetchError> {
        let mut params = vec![("search", text.to_string())];
        params.extend(paging(page, page_size));
        self.transport.get("/games", params).await
    }
}
