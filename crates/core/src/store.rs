//! Application state shared by every view.
//!
//! [`GameStore`] owns the last fetched lists, the selected game, the loading
//! and error flags and the active [`GameQuery`]. All mutation goes through the
//! async action methods; views read [`StoreState`] snapshots.
//!
//! Each action takes a ticket for the slice of state it writes. When the
//! catalog answers, the result is applied only if no newer request for the
//! same slice has been issued since, so a slow response can never overwrite
//! the data of a request made after it.

use std::{collections::HashMap, sync::Arc};

use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::{
    catalog::Catalog,
    error::FetchError,
    models::{Game, GameQuery, GameQueryUpdate, Genre, DEFAULT_PAGE_SIZE},
};

/// Snapshot of everything the store holds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreState {
    /// Current game list (all games, a genre, or search results).
    pub games: Vec<Game>,
    /// First page of games ordered by user rating.
    pub popular_games: Vec<Game>,
    /// First page of games released during the last year.
    pub new_releases: Vec<Game>,
    /// Game shown on the detail view.
    pub selected_game: Option<Game>,
    /// True while at least one action is waiting on the catalog.
    pub is_loading: bool,
    /// Message of the most recent applied failure.
    pub error: Option<String>,
    /// Paging and search term used by the paginated actions.
    pub game_query: GameQuery,
    /// Server-side count behind `games`.
    pub total_games: u64,
    /// Every genre, as last fetched.
    pub genres: Vec<Genre>,
}

/// Independently fenced parts of [`StoreState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Slice {
    Games,
    Popular,
    NewReleases,
    Selected,
    Genres,
}

#[derive(Debug, Clone, Copy)]
struct Ticket {
    slice: Slice,
    seq: u64,
}

#[derive(Default)]
struct Inner {
    state: StoreState,
    in_flight: usize,
    latest: HashMap<Slice, u64>,
    /// Size of the first search page when more pages exist. Later pages are
    /// requested at this size so they line up with the first one.
    search_page_size: Option<u32>,
}

/// Cloneable handle to the shared application state.
pub struct GameStore<C> {
    catalog: Arc<C>,
    inner: Arc<RwLock<Inner>>,
    list_page_size: u32,
}

impl<C> Clone for GameStore<C> {
    fn clone(&self) -> Self {
        Self {
            catalog: Arc::clone(&self.catalog),
            inner: Arc::clone(&self.inner),
            list_page_size: self.list_page_size,
        }
    }
}

impl<C: Catalog> GameStore<C> {
    /// Create an empty store backed by `catalog`.
    pub fn new(catalog: C) -> Self {
        Self {
            catalog: Arc::new(catalog),
            inner: Arc::new(RwLock::new(Inner::default())),
            list_page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Use `page_size` for the initial query and for the popular and new
    /// release lists.
    pub fn with_page_size(self, page_size: u32) -> Self {
        let page_size = page_size.max(1);
        self.inner.write().state.game_query.page_size = page_size;
        Self {
            list_page_size: page_size,
            ..self
        }
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> StoreState {
        self.inner.read().state.clone()
    }

    /// Whether any action is waiting on the catalog.
    pub fn is_loading(&self) -> bool {
        self.inner.read().state.is_loading
    }

    /// Message of the last applied failure, if any.
    pub fn error(&self) -> Option<String> {
        self.inner.read().state.error.clone()
    }

    /// Copy of the active query.
    pub fn game_query(&self) -> GameQuery {
        self.inner.read().state.game_query.clone()
    }

    /// Merge `update` into the active query.
    pub fn set_game_query(&self, update: GameQueryUpdate) {
        let mut inner = self.inner.write();
        inner.state.game_query.merge(update);
        debug!(query = ?inner.state.game_query, "game query updated");
    }

    /// Load the page of all games described by the active query.
    pub async fn fetch_games(&self) {
        let ticket = self.begin(Slice::Games);
        let query = self.game_query();
        let result = self.catalog.list_all(query.page, query.page_size).await;
        self.settle(ticket, result, |state, page| {
            state.games = page.results;
            state.total_games = page.count;
        });
    }

    /// Load the first page of top-rated games.
    pub async fn fetch_popular_games(&self) {
        let ticket = self.begin(Slice::Popular);
        let result = self.catalog.list_popular(1, self.list_page_size).await;
        self.settle(ticket, result, |state, page| {
            state.popular_games = page.results;
        });
    }

    /// Load the first page of games released in the last year.
    pub async fn fetch_new_releases(&self) {
        let ticket = self.begin(Slice::NewReleases);
        let result = self.catalog.list_new_releases(1, self.list_page_size).await;
        self.settle(ticket, result, |state, page| {
            state.new_releases = page.results;
        });
    }

    /// Load the full record for `id` into `selected_game`.
    pub async fn fetch_game_by_id(&self, id: u64) {
        let ticket = self.begin(Slice::Selected);
        let result = self.catalog.get_by_id(id).await;
        self.settle(ticket, result, |state, game| {
            state.selected_game = Some(game);
        });
    }

    /// Load every genre.
    pub async fn fetch_genres(&self) {
        let ticket = self.begin(Slice::Genres);
        let result = self.catalog.list_genres().await;
        self.settle(ticket, result, |state, genres| {
            state.genres = genres;
        });
    }

    /// Load games in `genre_id` using the active query's paging.
    pub async fn fetch_games_by_genre(&self, genre_id: u64) {
        let ticket = self.begin(Slice::Games);
        let query = self.game_query();
        let result = self
            .catalog
            .list_by_genre(genre_id, query.page, query.page_size)
            .await;
        self.settle(ticket, result, |state, page| {
            state.games = page.results;
            state.total_games = page.count;
        });
    }

    /// Replace `games` with search results for `text`.
    ///
    /// The text becomes the query's search term and paging restarts at page 1
    /// so that [`load_more_search_results`](Self::load_more_search_results)
    /// continues from here.
    pub async fn search_games(&self, text: &str) {
        self.set_game_query(GameQueryUpdate::page(1).with_search_text(text));
        let ticket = self.begin(Slice::Games);
        let result = self.catalog.search(text).await;
        self.settle_with(ticket, result, |inner, page| {
            inner.search_page_size = page
                .next
                .as_ref()
                .and_then(|_| u32::try_from(page.results.len()).ok())
                .filter(|size| *size > 0);
            inner.state.games = page.results;
            inner.state.total_games = page.count;
        });
    }

    /// Append the next page of results for the current search term.
    ///
    /// The query's page only advances once that page has arrived, so a failed
    /// attempt is retried for the same page.
    pub async fn load_more_search_results(&self) {
        let (text, next, page_size) = {
            let inner = self.inner.read();
            let query = &inner.state.game_query;
            let Some(text) = query.search_text.clone() else {
                debug!("no active search, nothing to load");
                return;
            };
            let page_size = inner.search_page_size.unwrap_or(query.page_size);
            (text, query.page + 1, page_size)
        };

        let ticket = self.begin(Slice::Games);
        let result = self.catalog.search_page(&text, next, page_size).await;
        self.settle(ticket, result, |state, page| {
            state.games.extend(page.results);
            state.total_games = page.count;
            state.game_query.page = next;
        });
    }

    fn begin(&self, slice: Slice) -> Ticket {
        let mut inner = self.inner.write();
        inner.in_flight += 1;
        inner.state.is_loading = true;
        inner.state.error = None;

        let seq = inner.latest.entry(slice).or_insert(0);
        *seq += 1;
        Ticket { slice, seq: *seq }
    }

    fn settle<T>(
        &self,
        ticket: Ticket,
        result: Result<T, FetchError>,
        apply: impl FnOnce(&mut StoreState, T),
    ) {
        self.settle_with(ticket, result, |inner, value| apply(&mut inner.state, value));
    }

    fn settle_with<T>(
        &self,
        ticket: Ticket,
        result: Result<T, FetchError>,
        apply: impl FnOnce(&mut Inner, T),
    ) {
        let mut inner = self.inner.write();
        inner.in_flight = inner.in_flight.saturating_sub(1);
        inner.state.is_loading = inner.in_flight > 0;

        if inner.latest.get(&ticket.slice) != Some(&ticket.seq) {
            debug!(slice = ?ticket.slice, seq = ticket.seq, "dropping stale response");
            return;
        }

        match result {
            Ok(value) => {
                apply(&mut *inner, value);
                info!(slice = ?ticket.slice, "store updated");
            }
            Err(err) => {
                warn!(slice = ?ticket.slice, "fetch failed: {err}");
                inner.state.error = Some(err.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::{HashMap, VecDeque},
        pin::pin,
    };

    use futures::poll;
    use parking_lot::Mutex;
    use tokio::sync::oneshot;

    use super::*;
    use crate::models::Page;

    enum Reply {
        Games(Page<Game>),
        Game(Game),
        Genres(Vec<Genre>),
        Fail(&'static str),
    }

    /// Catalog double answering from scripted replies keyed by call.
    #[derive(Default)]
    struct ScriptedCatalog {
        replies: Mutex<HashMap<String, VecDeque<Reply>>>,
        gates: Mutex<HashMap<String, oneshot::Receiver<()>>>,
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl ScriptedCatalog {
        fn reply(&self, key: &str, reply: Reply) {
            self.replies
                .lock()
                .entry(key.to_string())
                .or_default()
                .push_back(reply);
        }

        /// Hold the next call for `key` until the returned sender fires.
        fn gate(&self, key: &str) -> oneshot::Sender<()> {
            let (tx, rx) = oneshot::channel();
            self.gates.lock().insert(key.to_string(), rx);
            tx
        }

        async fn answer(&self, key: String) -> Reply {
            self.calls.lock().push(key.clone());
            let gate = self.gates.lock().remove(&key);
            if let Some(gate) = gate {
                let _ = gate.await;
            }
            let reply = self
                .replies
                .lock()
                .get_mut(&key)
                .and_then(VecDeque::pop_front);
            reply.unwrap_or_else(|| panic!("no reply scripted for {key}"))
        }

        async fn page(&self, key: String) -> Result<Page<Game>, FetchError> {
            match self.answer(key).await {
                Reply::Games(page) => Ok(page),
                Reply::Fail(message) => Err(failure(message)),
                _ => panic!("expected a page reply"),
            }
        }
    }

    fn failure(message: &str) -> FetchError {
        FetchError::Status {
            status: 500,
            message: message.to_string(),
        }
    }

    impl Catalog for ScriptedCatalog {
        async fn list_all(&self, page: u32, page_size: u32) -> Result<Page<Game>, FetchError> {
            self.page(format!("list_all:{page}:{page_size}")).await
        }

        async fn get_by_id(&self, id: u64) -> Result<Game, FetchError> {
            match self.answer(format!("get_by_id:{id}")).await {
                Reply::Game(game) => Ok(game),
                Reply::Fail(message) => Err(failure(message)),
                _ => panic!("expected a game reply"),
            }
        }

        async fn list_genres(&self) -> Result<Vec<Genre>, FetchError> {
            match self.answer("list_genres".to_string()).await {
                Reply::Genres(genres) => Ok(genres),
                Reply::Fail(message) => Err(failure(message)),
                _ => panic!("expected a genre reply"),
            }
        }

        async fn list_by_genre(
            &self,
            genre_id: u64,
            page: u32,
            page_size: u32,
        ) -> Result<Page<Game>, FetchError> {
            self.page(format!("list_by_genre:{genre_id}:{page}:{page_size}"))
                .await
        }

        async fn list_popular(&self, page: u32, page_size: u32) -> Result<Page<Game>, FetchError> {
            self.page(format!("list_popular:{page}:{page_size}")).await
        }

        async fn list_new_releases(
            &self,
            page: u32,
            page_size: u32,
        ) -> Result<Page<Game>, FetchError> {
            self.page(format!("list_new_releases:{page}:{page_size}"))
                .await
        }

        async fn search(&self, text: &str) -> Result<Page<Game>, FetchError> {
            self.page(format!("search:{text}")).await
        }

        async fn search_page(
            &self,
            text: &str,
            page: u32,
            page_size: u32,
        ) -> Result<Page<Game>, FetchError> {
            self.page(format!("search_page:{text}:{page}:{page_size}"))
                .await
        }
    }

    fn game(id: u64, name: &str) -> Game {
        serde_json::from_value(serde_json::json!({ "id": id, "name": name })).unwrap()
    }

    fn page_of(count: u64, names: &[&str]) -> Page<Game> {
        Page {
            count,
            next: None,
            previous: None,
            results: names
                .iter()
                .enumerate()
                .map(|(index, name)| game(index as u64 + 1, name))
                .collect(),
        }
    }

    fn genre(id: u64, name: &str) -> Genre {
        Genre {
            id,
            name: name.to_string(),
            image_background: None,
            games_count: None,
            description: None,
        }
    }

    fn names(games: &[Game]) -> Vec<&str> {
        games.iter().map(|game| game.name.as_str()).collect()
    }

    #[tokio::test]
    async fn fetch_games_uses_active_query() {
        let catalog = ScriptedCatalog::default();
        let calls = Arc::clone(&catalog.calls);
        catalog.reply("list_all:3:20", Reply::Games(page_of(500, &["Portal", "Celeste"])));
        let store = GameStore::new(catalog);

        store.set_game_query(GameQueryUpdate::page(3));
        store.fetch_games().await;

        let state = store.snapshot();
        assert_eq!(names(&state.games), ["Portal", "Celeste"]);
        assert_eq!(state.total_games, 500);
        assert!(!state.is_loading);
        assert_eq!(state.error, None);
        assert_eq!(*calls.lock(), ["list_all:3:20"]);
    }

    #[tokio::test]
    async fn stale_search_response_is_discarded() {
        let catalog = ScriptedCatalog::default();
        catalog.reply("search:zelda", Reply::Games(page_of(40, &["Breath of the Wild"])));
        catalog.reply("search:mario", Reply::Games(page_of(90, &["Super Mario Odyssey"])));
        let zelda_gate = catalog.gate("search:zelda");
        let mario_gate = catalog.gate("search:mario");
        let store = GameStore::new(catalog);

        let mut zelda = pin!(store.search_games("zelda"));
        assert!(poll!(zelda.as_mut()).is_pending());
        let mut mario = pin!(store.search_games("mario"));
        assert!(poll!(mario.as_mut()).is_pending());
        assert!(store.is_loading());

        mario_gate.send(()).unwrap();
        mario.await;
        assert_eq!(names(&store.snapshot().games), ["Super Mario Odyssey"]);
        assert!(store.is_loading(), "zelda request is still in flight");

        // The older request resolves last and must not win.
        zelda_gate.send(()).unwrap();
        zelda.await;
        let state = store.snapshot();
        assert_eq!(names(&state.games), ["Super Mario Odyssey"]);
        assert_eq!(state.total_games, 90);
        assert_eq!(state.game_query.search_text.as_deref(), Some("mario"));
        assert!(!state.is_loading);
    }

    #[tokio::test]
    async fn slices_are_fenced_independently() {
        let catalog = ScriptedCatalog::default();
        catalog.reply("list_popular:1:20", Reply::Games(page_of(1, &["Hades"])));
        catalog.reply("list_all:1:20", Reply::Games(page_of(1, &["Tetris"])));
        let popular_gate = catalog.gate("list_popular:1:20");
        let store = GameStore::new(catalog);

        let mut popular = pin!(store.fetch_popular_games());
        assert!(poll!(popular.as_mut()).is_pending());
        store.fetch_games().await;
        popular_gate.send(()).unwrap();
        popular.await;

        let state = store.snapshot();
        assert_eq!(names(&state.games), ["Tetris"]);
        assert_eq!(names(&state.popular_games), ["Hades"]);
    }

    #[tokio::test]
    async fn failed_genre_fetch_keeps_previous_genres() {
        let catalog = ScriptedCatalog::default();
        catalog.reply("list_genres", Reply::Genres(vec![genre(4, "Action"), genre(51, "Indie")]));
        catalog.reply("list_genres", Reply::Fail("upstream unavailable"));
        let store = GameStore::new(catalog);

        store.fetch_genres().await;
        store.fetch_genres().await;

        let state = store.snapshot();
        assert_eq!(state.genres.len(), 2);
        assert_eq!(state.genres[0].name, "Action");
        let error = state.error.expect("error should be recorded");
        assert!(error.contains("upstream unavailable"));
        assert!(!state.is_loading);
    }

    #[tokio::test]
    async fn new_fetch_clears_previous_error() {
        let catalog = ScriptedCatalog::default();
        catalog.reply("get_by_id:7", Reply::Game(game(7, "Braid")));
        catalog.reply("get_by_id:8", Reply::Fail("not found"));
        catalog.reply("get_by_id:9", Reply::Game(game(9, "Fez")));
        let store = GameStore::new(catalog);

        store.fetch_game_by_id(7).await;
        store.fetch_game_by_id(8).await;
        let state = store.snapshot();
        assert_eq!(state.selected_game.map(|game| game.name), Some("Braid".to_string()));
        assert!(state.error.is_some());

        store.fetch_game_by_id(9).await;
        let state = store.snapshot();
        assert_eq!(state.error, None);
        assert_eq!(state.selected_game.map(|game| game.id), Some(9));
    }

    #[tokio::test]
    async fn lists_use_configured_page_size() {
        let catalog = ScriptedCatalog::default();
        let calls = Arc::clone(&catalog.calls);
        catalog.reply("list_popular:1:12", Reply::Games(page_of(100, &["Hades"])));
        catalog.reply("list_new_releases:1:12", Reply::Games(page_of(9, &["Hollow Knight: Silksong"])));
        catalog.reply("list_by_genre:4:1:12", Reply::Games(page_of(77, &["Doom"])));
        let store = GameStore::new(catalog).with_page_size(12);

        tokio::join!(store.fetch_popular_games(), store.fetch_new_releases());
        store.fetch_games_by_genre(4).await;

        let state = store.snapshot();
        assert_eq!(names(&state.popular_games), ["Hades"]);
        assert_eq!(names(&state.new_releases), ["Hollow Knight: Silksong"]);
        assert_eq!(names(&state.games), ["Doom"]);
        assert_eq!(state.total_games, 77);
        assert_eq!(state.game_query.page_size, 12);
        assert_eq!(calls.lock().len(), 3);
    }

    #[tokio::test]
    async fn load_more_appends_next_search_page() {
        let catalog = ScriptedCatalog::default();
        catalog.reply("search:zelda", Reply::Games(page_of(3, &["Breath of the Wild", "Ocarina of Time"])));
        catalog.reply("search_page:zelda:2:20", Reply::Games(page_of(3, &["Majora's Mask"])));
        let store = GameStore::new(catalog);

        store.set_game_query(GameQueryUpdate::page(5));
        store.search_games("zelda").await;
        assert_eq!(store.game_query().page, 1);

        store.load_more_search_results().await;
        let state = store.snapshot();
        assert_eq!(
            names(&state.games),
            ["Breath of the Wild", "Ocarina of Time", "Majora's Mask"]
        );
        assert_eq!(state.game_query.page, 2);
        assert_eq!(state.total_games, 3);
    }

    #[tokio::test]
    async fn stale_search_failure_is_discarded() {
        let catalog = ScriptedCatalog::default();
        catalog.reply("search:zelda", Reply::Fail("gateway timeout"));
        catalog.reply("search:mario", Reply::Games(page_of(90, &["Super Mario Odyssey"])));
        let zelda_gate = catalog.gate("search:zelda");
        let store = GameStore::new(catalog);

        let mut zelda = pin!(store.search_games("zelda"));
        assert!(poll!(zelda.as_mut()).is_pending());
        store.search_games("mario").await;

        zelda_gate.send(()).unwrap();
        zelda.await;
        let state = store.snapshot();
        assert_eq!(state.error, None);
        assert_eq!(names(&state.games), ["Super Mario Odyssey"]);
        assert_eq!(state.total_games, 90);
        assert!(!state.is_loading);
    }

    #[tokio::test]
    async fn failed_load_more_retries_the_same_page() {
        let catalog = ScriptedCatalog::default();
        let calls = Arc::clone(&catalog.calls);
        catalog.reply("search:zelda", Reply::Games(page_of(3, &["Breath of the Wild"])));
        catalog.reply("search_page:zelda:2:20", Reply::Fail("timeout"));
        catalog.reply("search_page:zelda:2:20", Reply::Games(page_of(3, &["Majora's Mask"])));
        let store = GameStore::new(catalog);

        store.search_games("zelda").await;
        store.load_more_search_results().await;
        let state = store.snapshot();
        assert!(state.error.is_some());
        assert_eq!(state.game_query.page, 1);
        assert_eq!(names(&state.games), ["Breath of the Wild"]);

        store.load_more_search_results().await;
        let state = store.snapshot();
        assert_eq!(state.error, None);
        assert_eq!(state.game_query.page, 2);
        assert_eq!(names(&state.games), ["Breath of the Wild", "Majora's Mask"]);
        assert_eq!(
            *calls.lock(),
            ["search:zelda", "search_page:zelda:2:20", "search_page:zelda:2:20"]
        );
    }

    #[tokio::test]
    async fn load_more_matches_the_first_search_page_size() {
        let catalog = ScriptedCatalog::default();
        let calls = Arc::clone(&catalog.calls);
        let first: Vec<String> = (1..=20).map(|n| format!("Zelda {n}")).collect();
        let first: Vec<&str> = first.iter().map(String::as_str).collect();
        let mut first_page = page_of(45, &first);
        first_page.next = Some("https://api.rawg.io/api/games?page=2&search=zelda".to_string());
        catalog.reply("search:zelda", Reply::Games(first_page));
        catalog.reply("search_page:zelda:2:20", Reply::Games(page_of(45, &["Zelda 21"])));
        let store = GameStore::new(catalog).with_page_size(40);

        store.search_games("zelda").await;
        store.load_more_search_results().await;

        let state = store.snapshot();
        assert_eq!(state.error, None);
        assert_eq!(state.games.len(), 21);
        assert_eq!(state.game_query.page_size, 40);
        assert_eq!(*calls.lock(), ["search:zelda", "search_page:zelda:2:20"]);
    }

    #[tokio::test]
    async fn load_more_without_search_does_nothing() {
        let catalog = ScriptedCatalog::default();
        let calls = Arc::clone(&catalog.calls);
        let store = GameStore::new(catalog);

        store.load_more_search_results().await;

        assert!(calls.lock().is_empty());
        assert_eq!(store.game_query().page, 1);
        assert!(!store.is_loading());
    }
}
