//! Ingredient search over an already fetched recipe list.
//!
//! There is no index: the query is split on commas and every term must
//! appear (case-insensitively) inside at least one ingredient of a recipe.

use crate::types::Recipe;

/// Normalise a query into lowercase, trimmed, non-empty terms.
pub fn search_terms(query: &str) -> Vec<String> {
    query
        .split(',')
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Whether a recipe contains every term in its ingredient text.
pub fn matches_all(recipe: &Recipe, terms: &[String]) -> bool {
    let ingredients: Vec<String> = recipe.ingredients.iter().map(|i| i.to_lowercase()).collect();
    terms
        .iter()
        .all(|term| ingredients.iter().any(|ing| ing.contains(term.as_str())))
}

/// Filter recipes by ingredient query (logical AND across terms).
/// An empty or blank query returns every recipe in its original order.
pub fn search_by_ingredients<'a>(recipes: &'a [Recipe], query: &str) -> Vec<&'a Recipe> {
    let terms = search_terms(query);
    if terms.is_empty() {
        return recipes.iter().collect();
    }
    recipes.iter().filter(|r| matches_all(r, &terms)).collect()
}
