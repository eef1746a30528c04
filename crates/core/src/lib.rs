#![warn(clippy::all, missing_docs)]

//! Core of the gamedex catalog browser.
//!
//! This crate hosts the data models, configuration handling, the HTTP
//! transport and typed catalog queries, the shared application store and
//! the persistence of recent searches used by the command-line frontend.

pub mod browse;
pub mod catalog;
pub mod config;
pub mod error;
pub mod history;
pub mod models;
pub mod rich_text;
pub mod route;
pub mod storage;
pub mod store;
pub mod transport;

pub use catalog::{Catalog, CatalogService, ReleaseWindow};
pub use config::AppConfig;
pub use error::FetchError;
pub use history::SearchHistory;
pub use models::{Game, GameQuery, GameQueryUpdate, Genre, Page};
pub use route::{Route, RouteError};
pub use storage::LocalStorage;
pub use store::{GameStore, StoreState};
pub use transport::Transport;
