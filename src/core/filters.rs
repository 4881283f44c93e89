use std::collections::{BTreeSet, HashSet};

use crate::core::games::jaccard;
use crate::models::{GameCatalog, Profile};

/// Catalog games the player does not play yet whose type set is close to the
/// player's own types.
///
/// Similarity is the Jaccard index between the player's type union and the
/// game's types; games at or above `threshold` are returned, best first.
/// Equal scores keep catalog order.
pub fn similar_games(
    games: &[String],
    catalog: &GameCatalog,
    threshold: f64,
) -> Vec<(String, f64)> {
    let player_types = catalog.type_set(games);
    if player_types.is_empty() {
        return Vec::new();
    }

    let mut similar: Vec<(String, f64)> = catalog
        .entries()
        .iter()
        .filter(|entry| !games.contains(&entry.game_id))
        .filter_map(|entry| {
            let game_types: BTreeSet<String> = entry.types.iter().cloned().collect();
            let similarity = jaccard(&player_types, &game_types);
            (similarity >= threshold).then(|| (entry.game_id.clone(), similarity))
        })
        .collect();

    similar.sort_by(|a, b| b.1.total_cmp(&a.1));
    similar
}

/// Played games plus recommended games
pub fn expanded_game_set<'a>(
    profile: &'a Profile,
    recommended: &'a [(String, f64)],
) -> HashSet<&'a str> {
    profile
        .games()
        .iter()
        .map(String::as_str)
        .chain(recommended.iter().map(|(game, _)| game.as_str()))
        .collect()
}

/// Check if a candidate plays at least one game of the given set
///
/// Shared-game pre-filter applied before scoring to bound work on large pools.
#[inline]
pub fn shares_game(candidate: &Profile, games: &HashSet<&str>) -> bool {
    candidate.games().iter().any(|game| games.contains(game.as_str()))
}
