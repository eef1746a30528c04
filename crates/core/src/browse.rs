//! Client-side shaping of fetched lists: paging, sorting and the
//! recommendation mix.

use std::{cmp::Ordering, collections::HashSet, fmt, str::FromStr};

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

use crate::models::Game;

/// Items per page on client-side paginated views.
pub const VIEW_PAGE_SIZE: usize = 12;
/// Most page links shown before gaps are introduced.
const MAX_PAGE_LINKS: usize = 5;
const TRENDING_COUNT: usize = 5;
const FOR_YOU_COUNT: usize = 10;
/// Shortest trimmed term that produces suggestions.
pub const SUGGESTION_MIN_CHARS: usize = 2;
const SUGGESTION_LIMIT: usize = 5;

/// Number of pages needed for `len` items.
pub fn total_pages(len: usize, per_page: usize) -> usize {
    if per_page == 0 {
        return 0;
    }
    len.div_ceil(per_page)
}

/// Items on 1-based `page`. Pages outside the range are empty.
pub fn paginate<T>(items: &[T], page: usize, per_page: usize) -> &[T] {
    if page == 0 || per_page == 0 {
        return &[];
    }
    let start = (page - 1).saturating_mul(per_page);
    if start >= items.len() {
        return &[];
    }
    let end = start.saturating_add(per_page).min(items.len());
    &items[start..end]
}

/// Entry in a pagination control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageLink {
    /// Link to a 1-based page.
    Page(usize),
    /// Hidden run of pages.
    Gap,
}

impl fmt::Display for PageLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Page(page) => write!(f, "{page}"),
            Self::Gap => write!(f, "..."),
        }
    }
}

/// Links to render around `current`. The first and last pages are always
/// present; runs of hidden pages collapse into a [`PageLink::Gap`].
pub fn page_numbers(current: usize, total: usize) -> Vec<PageLink> {
    if total <= MAX_PAGE_LINKS {
        return (1..=total).map(PageLink::Page).collect();
    }

    let mut start = current.saturating_sub(1).max(2);
    let mut end = (current + 1).min(total - 1);
    if current <= 3 {
        end = (total - 1).min(4);
    }
    if current + 2 >= total {
        start = (total - 3).max(2);
    }

    let mut links = vec![PageLink::Page(1)];
    if start > 2 {
        links.push(PageLink::Gap);
    }
    links.extend((start..=end).map(PageLink::Page));
    if end < total - 1 {
        links.push(PageLink::Gap);
    }
    links.push(PageLink::Page(total));
    links
}

/// Orderings offered on the genre view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    /// Highest user rating first.
    #[default]
    Rating,
    /// Alphabetical, ignoring case.
    Name,
    /// Newest release first; undated games last.
    Released,
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "rating" => Ok(Self::Rating),
            "name" => Ok(Self::Name),
            "released" => Ok(Self::Released),
            other => Err(format!(
                "unknown sort order '{other}' (expected rating, name or released)"
            )),
        }
    }
}

/// Sort `games` in place. Ties keep their fetched order.
pub fn sort_games(games: &mut [Game], order: SortOrder) {
    match order {
        SortOrder::Rating => games.sort_by(|a, b| b.rating.total_cmp(&a.rating)),
        SortOrder::Name => games.sort_by_cached_key(|game| game.name.to_lowercase()),
        SortOrder::Released => games.sort_by(|a, b| match (a.released, b.released) {
            (Some(a), Some(b)) => b.cmp(&a),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }),
    }
}

/// Games with a critic score, highest first.
pub fn top_rated(games: &[Game]) -> Vec<Game> {
    let mut rated: Vec<_> = games
        .iter()
        .filter(|game| game.metacritic.is_some_and(|score| score > 0))
        .cloned()
        .collect();
    rated.sort_by(|a, b| b.metacritic.cmp(&a.metacritic));
    rated
}

/// Leading entries of the popular list.
pub fn trending(popular: &[Game]) -> &[Game] {
    &popular[..popular.len().min(TRENDING_COUNT)]
}

/// Already loaded games whose name contains `text`, ignoring case.
///
/// Terms shorter than [`SUGGESTION_MIN_CHARS`] after trimming give nothing.
/// At most five games are returned, in list order.
pub fn suggestions<'a>(games: &'a [Game], text: &str) -> Vec<&'a Game> {
    let needle = text.trim().to_lowercase();
    if needle.chars().count() < SUGGESTION_MIN_CHARS {
        return Vec::new();
    }

    games
        .iter()
        .filter(|game| game.name.to_lowercase().contains(&needle))
        .take(SUGGESTION_LIMIT)
        .collect()
}

/// Placeholder "recommended for you" mix.
///
/// This is not personalised: it shuffles popular titles and new releases
/// together with a seeded RNG and drops duplicate ids. The same seed and
/// inputs always produce the same order.
#[derive(Debug, Clone)]
pub struct Recommendations {
    games: Vec<Game>,
}

impl Recommendations {
    /// Shuffle `popular` and `new_releases` together using `seed`.
    pub fn mix(popular: &[Game], new_releases: &[Game], seed: u64) -> Self {
        let mut games: Vec<Game> = popular.iter().chain(new_releases).cloned().collect();
        let mut rng = StdRng::seed_from_u64(seed);
        games.shuffle(&mut rng);

        let mut seen = HashSet::new();
        games.retain(|game| seen.insert(game.id));
        Self { games }
    }

    /// The whole mix.
    pub fn games(&self) -> &[Game] {
        &self.games
    }

    /// Short selection for the home view.
    pub fn for_you(&self) -> &[Game] {
        &self.games[..self.games.len().min(FOR_YOU_COUNT)]
    }
}
