use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use gamedex_core::{
    browse::{self, Recommendations, SortOrder},
    config,
    AppConfig, CatalogService, GameQueryUpdate, GameStore, LocalStorage, Route, SearchHistory,
    Transport,
};
use tracing::{debug, info};

use crate::{render, Command};

const HOME_LATEST: usize = 8;
const HOME_GENRES: usize = 9;

/// Command-line frontend over the shared store.
pub struct App {
    store: Option<GameStore<CatalogService>>,
    storage: LocalStorage,
    history: SearchHistory,
}

impl App {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let storage = LocalStorage::open(config.storage_path())?;
        let history = SearchHistory::load(&storage);

        let store = match config.api_key.as_deref() {
            Some(key) => {
                let transport = Transport::from_config(config, key)
                    .context("failed to build HTTP client")?;
                Some(GameStore::new(CatalogService::new(transport)).with_page_size(config.page_size))
            }
            None => None,
        };

        Ok(Self {
            store,
            storage,
            history,
        })
    }

    fn store(&self) -> Result<&GameStore<CatalogService>> {
        self.store.as_ref().with_context(|| {
            format!(
                "no API key configured; set api_key in {} or GAMEDEX_API_KEY",
                config::config_path().display()
            )
        })
    }

    pub async fn run(&mut self, command: Command) -> Result<()> {
        debug!(?command, "running command");
        match command {
            Command::Home => self.home().await,
            Command::Games { page, page_size } => self.all_games(page, page_size).await,
            Command::Popular { page } => self.popular(page).await,
            Command::NewReleases { page } => self.new_releases(page).await,
            Command::TopRated { page } => self.top_rated(page).await,
            Command::Recommended { seed, page } => self.recommended(seed, page).await,
            Command::Genres => self.genres().await,
            Command::Genre { id, sort, page } => self.genre(id, sort, page).await,
            Command::Show { id } => self.show(id).await,
            Command::Search { text, more } => self.search(&text, more).await,
            Command::Suggest { text } => self.suggest(&text).await,
            Command::History => {
                render::history(&self.history);
                Ok(())
            }
            Command::Open { route } => {
                let command = command_for(route)?;
                Box::pin(self.run(command)).await
            }
        }
    }

    async fn home(&self) -> Result<()> {
        let store = self.store()?;
        tokio::join!(
            store.fetch_games(),
            store.fetch_popular_games(),
            store.fetch_new_releases(),
            store.fetch_genres(),
        );

        let state = store.snapshot();
        let mix = Recommendations::mix(&state.popular_games, &state.new_releases, time_seed());
        render::games("Trending now", browse::trending(&state.popular_games));
        render::games("For you", mix.for_you());
        render::games(
            "Latest games",
            &state.games[..state.games.len().min(HOME_LATEST)],
        );
        render::genres(&state.genres[..state.genres.len().min(HOME_GENRES)]);
        Ok(())
    }

    async fn all_games(&self, page: u32, page_size: Option<u32>) -> Result<()> {
        let store = self.store()?;
        let mut update = GameQueryUpdate::page(page);
        if let Some(page_size) = page_size {
            update = update.with_page_size(page_size);
        }
        store.set_game_query(update);
        store.fetch_games().await;

        let state = store.snapshot();
        render::games("All games", &state.games);
        render::server_pages(&state.game_query, state.total_games);
        Ok(())
    }

    async fn popular(&self, page: usize) -> Result<()> {
        let store = self.store()?;
        store.fetch_popular_games().await;
        render::client_page("Popular games", &store.snapshot().popular_games, page);
        Ok(())
    }

    async fn new_releases(&self, page: usize) -> Result<()> {
        let store = self.store()?;
        store.fetch_new_releases().await;
        render::client_page("New releases", &store.snapshot().new_releases, page);
        Ok(())
    }

    async fn top_rated(&self, page: usize) -> Result<()> {
        let store = self.store()?;
        store.fetch_games().await;
        let ranked = browse::top_rated(&store.snapshot().games);
        render::client_page("Top rated games", &ranked, page);
        Ok(())
    }

    async fn recommended(&self, seed: Option<u64>, page: usize) -> Result<()> {
        let store = self.store()?;
        tokio::join!(store.fetch_popular_games(), store.fetch_new_releases());

        let seed = seed.unwrap_or_else(time_seed);
        info!(seed, "mixing recommendations");
        let state = store.snapshot();
        let mix = Recommendations::mix(&state.popular_games, &state.new_releases, seed);
        render::client_page("Recommended for you", mix.games(), page);
        Ok(())
    }

    async fn genres(&self) -> Result<()> {
        let store = self.store()?;
        store.fetch_genres().await;
        render::genres(&store.snapshot().genres);
        Ok(())
    }

    async fn genre(&self, id: u64, sort: SortOrder, page: u32) -> Result<()> {
        let store = self.store()?;
        store.set_game_query(GameQueryUpdate::page(page));
        tokio::join!(store.fetch_genres(), store.fetch_games_by_genre(id));

        let state = store.snapshot();
        let title = state
            .genres
            .iter()
            .find(|genre| genre.id == id)
            .map(|genre| genre.name.clone())
            .unwrap_or_else(|| format!("Genre {id}"));
        let mut games = state.games;
        browse::sort_games(&mut games, sort);
        render::games(&title, &games);
        render::server_pages(&state.game_query, state.total_games);
        Ok(())
    }

    async fn show(&self, id: u64) -> Result<()> {
        let store = self.store()?;
        store.fetch_game_by_id(id).await;

        let state = store.snapshot();
        match (state.error, state.selected_game) {
            (Some(error), _) => render::error(&error),
            (None, Some(game)) => render::game_details(&game),
            (None, None) => render::error("Game not found"),
        }
        Ok(())
    }

    async fn suggest(&self, text: &str) -> Result<()> {
        let store = self.store()?;
        store.fetch_games().await;

        let state = store.snapshot();
        if let Some(error) = &state.error {
            render::error(error);
            return Ok(());
        }
        render::suggestions(text, &browse::suggestions(&state.games, text));
        Ok(())
    }

    async fn search(&mut self, text: &str, more: u32) -> Result<()> {
        let store = self.store()?.clone();
        let text = text.trim();
        if text.is_empty() {
            anyhow::bail!("search text must not be empty");
        }

        self.history.record(text);
        self.history.persist(&mut self.storage)?;

        store.search_games(text).await;
        for _ in 0..more {
            if store.error().is_some() {
                break;
            }
            let state = store.snapshot();
            if state.games.len() as u64 >= state.total_games {
                break;
            }
            store.load_more_search_results().await;
        }

        let state = store.snapshot();
        if let Some(error) = &state.error {
            render::error(error);
            println!("Please try another search term");
            return Ok(());
        }
        if state.games.is_empty() {
            println!("No games found for '{text}'");
            return Ok(());
        }

        println!("Found {} games", state.total_games);
        render::games(&format!("Results for '{text}'"), &state.games);
        if (state.games.len() as u64) < state.total_games {
            println!(
                "\nShowing {} of {}; pass --more to load further pages",
                state.games.len(),
                state.total_games
            );
        }
        Ok(())
    }
}

fn command_for(route: Route) -> Result<Command> {
    let command = match route {
        Route::Home => Command::Home,
        Route::Game(id) => Command::Show { id },
        Route::Search(Some(text)) => Command::Search { text, more: 0 },
        Route::Search(None) => Command::History,
        Route::Genres => Command::Genres,
        Route::Genre(id) => Command::Genre {
            id,
            sort: SortOrder::default(),
            page: 1,
        },
        Route::Popular => Command::Popular { page: 1 },
        Route::NewReleases => Command::NewReleases { page: 1 },
        Route::TopRated => Command::TopRated { page: 1 },
        Route::Recommended => Command::Recommended {
            seed: None,
            page: 1,
        },
        Route::AllGames => Command::Games {
            page: 1,
            page_size: None,
        },
    };
    Ok(command)
}

fn time_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default()
}
