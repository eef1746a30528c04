//! Shared domain models.

mod query;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

pub use query::{GameQuery, GameQueryUpdate, DEFAULT_PAGE_SIZE};

/// A game record as returned by the catalog API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    /// Unique catalog identifier.
    pub id: u64,
    /// Display name.
    pub name: String,
    /// Cover image URL.
    #[serde(default)]
    pub background_image: Option<String>,
    /// Average user rating, typically between 0 and 5.
    #[serde(default)]
    pub rating: f32,
    /// Critic score, typically between 0 and 100.
    #[serde(default)]
    pub metacritic: Option<u32>,
    /// Release date, when announced.
    #[serde(default)]
    pub released: Option<NaiveDate>,
    /// Genres the game belongs to.
    #[serde(default, deserialize_with = "null_as_default")]
    pub genres: Vec<GenreRef>,
    /// Platforms the game ships on.
    #[serde(default, deserialize_with = "null_as_default")]
    pub platforms: Vec<PlatformEntry>,
    /// Long-form HTML description. Only populated by detail requests.
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    /// Trailer clip, if any.
    #[serde(default)]
    pub clip: Option<Clip>,
    /// Screenshot thumbnails.
    #[serde(default, deserialize_with = "null_as_default")]
    pub short_screenshots: Vec<Screenshot>,
}

impl Game {
    /// Names of the game's genres joined for display.
    pub fn genre_names(&self) -> String {
        self.genres
            .iter()
            .map(|genre| genre.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Names of the game's platforms joined for display.
    pub fn platform_names(&self) -> String {
        self.platforms
            .iter()
            .map(|entry| entry.platform.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Reference to a genre embedded in a game record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenreRef {
    /// Genre identifier.
    pub id: u64,
    /// Genre name.
    pub name: String,
}

/// Association between a game and a platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformEntry {
    /// The platform itself.
    pub platform: PlatformRef,
    /// Requirements on this platform, mostly given for PC.
    #[serde(default)]
    pub requirements: Option<Requirements>,
}

/// Platform identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformRef {
    /// Platform identifier.
    pub id: u64,
    /// Platform name, e.g. "PC" or "Nintendo Switch".
    pub name: String,
}

/// Hardware requirements text, usually HTML.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirements {
    /// Minimum specification.
    #[serde(default)]
    pub minimum: Option<String>,
    /// Recommended specification.
    #[serde(default)]
    pub recommended: Option<String>,
}

/// Trailer video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clip {
    /// Video URL.
    pub clip: String,
    /// Preview image URL.
    #[serde(default)]
    pub preview: Option<String>,
}

/// Screenshot thumbnail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Screenshot {
    /// Screenshot identifier; `-1` marks the cover image.
    pub id: i64,
    /// Image URL.
    pub image: String,
}

/// A game genre.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    /// Genre identifier, used by the genre filter.
    pub id: u64,
    /// Display name.
    pub name: String,
    /// Background image URL.
    #[serde(default)]
    pub image_background: Option<String>,
    /// Number of games in the genre.
    #[serde(default)]
    pub games_count: Option<u64>,
    /// HTML description, when the endpoint includes one.
    #[serde(default)]
    pub description: Option<String>,
}

/// Paged list envelope returned by list endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Total number of matching records on the server.
    pub count: u64,
    /// URL of the following page, if any.
    #[serde(default)]
    pub next: Option<String>,
    /// URL of the preceding page, if any.
    #[serde(default)]
    pub previous: Option<String>,
    /// Records on this page.
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}

// The API sends `null` for empty collections on some endpoints.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn list_entry_tolerates_missing_and_null_fields() {
        let game: Game = serde_json::from_value(json!({
            "id": 3498,
            "name": "Grand Theft Auto V",
            "background_image": null,
            "rating": 4.47,
            "metacritic": null,
            "released": "2013-09-17",
            "platforms": null,
            "short_screenshots": [{ "id": -1, "image": "https://img/1.jpg" }]
        }))
        .unwrap();

        assert_eq!(game.id, 3498);
        assert_eq!(game.released, NaiveDate::from_ymd_opt(2013, 9, 17));
        assert!(game.platforms.is_empty());
        assert!(game.genres.is_empty());
        assert!(game.description.is_empty());
        assert_eq!(game.metacritic, None);
        assert_eq!(game.short_screenshots.len(), 1);
    }

    #[test]
    fn detail_record_keeps_requirements() {
        let game: Game = serde_json::from_value(json!({
            "id": 1,
            "name": "Portal",
            "rating": 4.5,
            "metacritic": 90,
            "released": null,
            "description": "<p>Think with portals.</p>",
            "genres": [{ "id": 7, "name": "Puzzle" }, { "id": 2, "name": "Shooter" }],
            "platforms": [{
                "platform": { "id": 4, "name": "PC" },
                "requirements": { "minimum": "<strong>Minimum:</strong> 1GB" }
            }],
            "clip": { "clip": "https://clips/portal.mp4" }
        }))
        .unwrap();

        assert_eq!(game.genre_names(), "Puzzle, Shooter");
        assert_eq!(game.platform_names(), "PC");
        let requirements = game.platforms[0].requirements.as_ref().unwrap();
        assert!(requirements.minimum.is_some());
        assert!(requirements.recommended.is_none());
        assert_eq!(game.clip.unwrap().preview, None);
    }
}
