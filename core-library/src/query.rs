//! Predicate, sort and limit for Local Store fetches.
//!
//! Every repository `fetch`/`count` takes a [`RecordFilter`]. The filter
//! renders itself into a [`sqlx::QueryBuilder`] so values are always bound,
//! never interpolated.

use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Sqlite};

/// Result ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordSort {
    /// Ascending by id
    #[default]
    IdAsc,
    /// Descending by id
    IdDesc,
    /// Order in which rows were first inserted
    Inserted,
}

impl RecordSort {
    fn sql(&self) -> &'static str {
        match self {
            RecordSort::IdAsc => "id ASC",
            RecordSort::IdDesc => "id DESC",
            RecordSort::Inserted => "rowid ASC",
        }
    }
}

/// Filter applied to a fetch.
///
/// - `favorite: Some(true)` matches favorited rows only.
/// - `favorite: Some(false)` matches rows that are unset or false.
/// - `id_prefix` matches ids that start with the given string, literally.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFilter {
    pub favorite: Option<bool>,
    pub id_prefix: Option<String>,
    pub sort: RecordSort,
    pub limit: Option<u32>,
}

impl RecordFilter {
    /// Every row, ascending by id.
    pub fn all() -> Self {
        Self::default()
    }

    /// Favorited rows only.
    pub fn favorites() -> Self {
        Self::default().favorite(true)
    }

    pub fn favorite(mut self, favorite: bool) -> Self {
        self.favorite = Some(favorite);
        self
    }

    pub fn id_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.id_prefix = Some(prefix.into());
        self
    }

    pub fn sort(mut self, sort: RecordSort) -> Self {
        self.sort = sort;
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Append the `WHERE` clause (if any).
    pub(crate) fn push_where<'a>(&'a self, builder: &mut QueryBuilder<'a, Sqlite>) {
        let mut first = true;
        let mut and = |builder: &mut QueryBuilder<'a, Sqlite>| {
            builder.push(if first { " WHERE " } else { " AND " });
            first = false;
        };

        match self.favorite {
            Some(true) => {
                and(builder);
                builder.push("favorite = 1");
            }
            Some(false) => {
                and(builder);
                builder.push("(favorite IS NULL OR favorite = 0)");
            }
            None => {}
        }

        // substr() instead of LIKE: '_' is a LIKE wildcard and appears in
        // every composite id.
        if let Some(prefix) = &self.id_prefix {
            and(builder);
            builder
                .push("substr(id, 1, ")
                .push_bind(prefix.chars().count() as i64)
                .push(") = ")
                .push_bind(prefix.as_str());
        }
    }

    /// Append `ORDER BY` and `LIMIT`.
    pub(crate) fn push_order_and_limit<'a>(&'a self, builder: &mut QueryBuilder<'a, Sqlite>) {
        builder.push(" ORDER BY ").push(self.sort.sql());
        if let Some(limit) = self.limit {
            builder.push(" LIMIT ").push_bind(limit as i64);
        }
    }
}
