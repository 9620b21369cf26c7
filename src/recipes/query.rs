//! Public recipe listing: optional name and cuisine filters combined with
//! AND, newest first, one page of [`PAGE_SIZE`] rows. User input only ever
//! reaches the database as bound parameters.

use sqlx::{Postgres, QueryBuilder};

use super::repo_types::{Cuisine, RecipeSummary};

pub const PAGE_SIZE: i64 = 20;

pub(crate) const SUMMARY_COLUMNS: &str =
    "r.id, r.name, r.description, r.cuisine, r.cooking_time, r.image, r.created_at";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilter {
    name: Option<String>,
    cuisine: Option<Cuisine>,
}

impl SearchFilter {
    /// Blank name filters are dropped.
    pub fn new(name: Option<&str>, cuisine: Option<Cuisine>) -> Self {
        let name = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string);
        Self { name, cuisine }
    }

    pub fn cuisine(&self) -> Option<Cuisine> {
        self.cuisine
    }

    /// `ILIKE` pattern for a literal substring match.
    pub fn name_pattern(&self) -> Option<String> {
        self.name
            .as_deref()
            .map(|n| format!("%{}%", escape_like(n)))
    }

    /// In-process equivalent of the SQL predicate, for the in-memory store.
    #[cfg(test)]
    pub fn matches(&self, summary: &RecipeSummary) -> bool {
        let name_ok = self.name.as_deref().map_or(true, |needle| {
            summary
                .name
                .to_lowercase()
                .contains(&needle.to_lowercase())
        });
        let cuisine_ok = self.cuisine.map_or(true, |c| summary.cuisine == c);
        name_ok && cuisine_ok
    }
}

/// Escapes LIKE metacharacters so they match themselves.
pub fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

pub fn search_query(filter: &SearchFilter) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!(
        "SELECT {SUMMARY_COLUMNS} FROM recipes r WHERE TRUE"
    ));
    if let Some(pattern) = filter.name_pattern() {
        qb.push(" AND r.name ILIKE ")
            .push_bind(pattern)
            .push(" ESCAPE '\\'");
    }
    if let Some(cuisine) = filter.cuisine() {
        qb.push(" AND r.cuisine = ").push_bind(cuisine);
    }
    qb.push(" ORDER BY r.id DESC LIMIT ").push_bind(PAGE_SIZE);
    qb
}
