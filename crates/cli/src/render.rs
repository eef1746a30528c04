//! Plain-text output for store state.

use gamedex_core::{
    browse::{self, PageLink, VIEW_PAGE_SIZE},
    rich_text, Game, GameQuery, Genre, SearchHistory,
};

const DETAIL_SCREENSHOTS: usize = 4;

pub fn games(title: &str, games: &[Game]) {
    println!("\n{title}");
    println!("{}", "=".repeat(title.chars().count()));
    if games.is_empty() {
        println!("(nothing to show)");
        return;
    }
    for game in games {
        println!("{}", game_line(game));
    }
}

fn game_line(game: &Game) -> String {
    let released = game
        .released
        .map(|date| date.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "TBA".to_string());
    let mut line = format!(
        "{:>8}  {:<40}  {:>4.2}★  {released}",
        game.id, game.name, game.rating
    );
    if let Some(score) = game.metacritic {
        line.push_str(&format!("  MC {score}"));
    }
    line
}

/// Client-side page of `items` with a page bar.
pub fn client_page(title: &str, items: &[Game], page: usize) {
    let total = browse::total_pages(items.len(), VIEW_PAGE_SIZE);
    games(title, browse::paginate(items, page, VIEW_PAGE_SIZE));
    page_bar(page, total);
}

/// Page bar for lists paged on the server.
pub fn server_pages(query: &GameQuery, total_games: u64) {
    let per_page = query.page_size.max(1) as u64;
    let total = usize::try_from(total_games.div_ceil(per_page)).unwrap_or(usize::MAX);
    page_bar(query.page as usize, total);
}

fn page_bar(current: usize, total: usize) {
    if total <= 1 {
        return;
    }
    let links: Vec<String> = browse::page_numbers(current, total)
        .into_iter()
        .map(|link| match link {
            PageLink::Page(page) if page == current => format!("[{page}]"),
            other => other.to_string(),
        })
        .collect();
    println!("\nPage {current} of {total}:  {}", links.join(" "));
}

pub fn genres(genres: &[Genre]) {
    println!("\nGenres");
    println!("======");
    for genre in genres {
        match genre.games_count {
            Some(count) => println!("{:>6}  {:<24} {count} games", genre.id, genre.name),
            None => println!("{:>6}  {}", genre.id, genre.name),
        }
    }
}

pub fn game_details(game: &Game) {
    println!("\n{}", game.name);
    println!("{}", "=".repeat(game.name.chars().count()));
    println!("{}", game_line(game));
    if !game.genres.is_empty() {
        println!("Genres:    {}", game.genre_names());
    }
    if !game.platforms.is_empty() {
        println!("Platforms: {}", game.platform_names());
    }

    let description = rich_text::to_plain_text(&game.description);
    if !description.is_empty() {
        println!("\n{description}");
    }

    for entry in &game.platforms {
        let Some(requirements) = &entry.requirements else {
            continue;
        };
        for (label, text) in [
            ("minimum", &requirements.minimum),
            ("recommended", &requirements.recommended),
        ] {
            if let Some(text) = text {
                println!(
                    "\n{} requirements ({label}):\n{}",
                    entry.platform.name,
                    rich_text::to_plain_text(text)
                );
            }
        }
    }

    if let Some(clip) = &game.clip {
        println!("\nTrailer: {}", clip.clip);
    }
    if !game.short_screenshots.is_empty() {
        println!("\nScreenshots:");
        for shot in game.short_screenshots.iter().take(DETAIL_SCREENSHOTS) {
            println!("  {}", shot.image);
        }
    }
}

pub fn suggestions(text: &str, games: &[&Game]) {
    if games.is_empty() {
        println!("No suggestions for '{text}'");
        return;
    }
    println!("Suggestions for '{text}'");
    for game in games {
        println!("{}", game_line(game));
    }
}

pub fn history(history: &SearchHistory) {
    if history.is_empty() {
        println!("No recent searches");
        return;
    }
    println!("Recent searches");
    for (index, entry) in history.entries().iter().enumerate() {
        println!("{:>2}. {entry}", index + 1);
    }
}

pub fn error(message: &str) {
    println!("Error: {message}");
}
