//! Navigable application paths.

use std::{fmt, str::FromStr};

use url::form_urlencoded;

/// A view the user can navigate to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Landing view, `/`.
    Home,
    /// Game details, `/games/:id`.
    Game(u64),
    /// Search view; the term travels in the `q` query parameter.
    Search(Option<String>),
    /// Genre index, `/genres`.
    Genres,
    /// Games in one genre, `/genres/:id`.
    Genre(u64),
    /// `/popular`.
    Popular,
    /// `/new-releases`.
    NewReleases,
    /// `/top-rated`.
    TopRated,
    /// `/recommended`.
    Recommended,
    /// `/all-games`.
    AllGames,
}

/// Failure to map a path onto a [`Route`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouteError {
    /// No view is mounted at the path.
    #[error("no view at '{0}'")]
    NotFound(String),
    /// An id segment is not a number.
    #[error("invalid id '{0}'")]
    InvalidId(String),
}

impl Route {
    /// Parse an application path such as `/games/3498` or `/search?q=zelda`.
    pub fn parse(input: &str) -> Result<Self, RouteError> {
        let input = input.trim();
        let (path, query) = input.split_once('?').unwrap_or((input, ""));
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        let route = match segments.as_slice() {
            [] => Self::Home,
            ["games", id] => Self::Game(parse_id(id)?),
            ["search"] => Self::Search(
                form_urlencoded::parse(query.as_bytes())
                    .find(|(key, _)| key == "q")
                    .map(|(_, value)| value.into_owned())
                    .filter(|value| !value.trim().is_empty()),
            ),
            ["genres"] => Self::Genres,
            ["genres", id] => Self::Genre(parse_id(id)?),
            ["popular"] => Self::Popular,
            ["new-releases"] => Self::NewReleases,
            ["top-rated"] => Self::TopRated,
            ["recommended"] => Self::Recommended,
            ["all-games"] => Self::AllGames,
            _ => return Err(RouteError::NotFound(input.to_string())),
        };
        Ok(route)
    }

    /// Path that parses back to this route.
    pub fn path(&self) -> String {
        match self {
            Self::Home => "/".to_string(),
            Self::Game(id) => format!("/games/{id}"),
            Self::Search(None) => "/search".to_string(),
            Self::Search(Some(text)) => format!(
                "/search?q={}",
                form_urlencoded::byte_serialize(text.as_bytes()).collect::<String>()
            ),
            Self::Genres => "/genres".to_string(),
            Self::Genre(id) => format!("/genres/{id}"),
            Self::Popular => "/popular".to_string(),
            Self::NewReleases => "/new-releases".to_string(),
            Self::TopRated => "/top-rated".to_string(),
            Self::Recommended => "/recommended".to_string(),
            Self::AllGames => "/all-games".to_string(),
        }
    }
}

fn parse_id(raw: &str) -> Result<u64, RouteError> {
    raw.parse()
        .map_err(|_| RouteError::InvalidId(raw.to_string()))
}

impl FromStr for Route {
    type Err = RouteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}
