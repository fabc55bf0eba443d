//! Column layout shared by the two photo tables.

use crate::error::Result;
use bridge_traits::photos::{PhotoUrls, PhotoUser};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

const URL_AND_USER_COLUMNS: &str = "url_raw, url_full, url_regular, url_small, url_thumb, \
     user_id, user_name, user_username, user_bio, user_portfolio_url";

/// What an upsert does with `favorite` when the id already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OnConflict {
    /// Replace every column, favorite included.
    Replace,
    /// Refresh urls and author only; the stored favorite wins.
    KeepFavorite,
}

/// One photo row, borrowed from a model.
pub(crate) struct PhotoColumns<'a> {
    pub id: &'a str,
    pub topic_id: Option<&'a str>,
    pub urls: &'a PhotoUrls,
    pub user: &'a PhotoUser,
    pub favorite: Option<bool>,
}

/// `SELECT <columns> FROM <table>`; `topic_id` is selected for topic photos.
pub(crate) fn select_sql(table: &str, with_topic: bool) -> String {
    format!(
        "SELECT id, {}{}, favorite FROM {}",
        if with_topic { "topic_id, " } else { "" },
        URL_AND_USER_COLUMNS,
        table
    )
}

fn upsert_sql(table: &str, with_topic: bool, on_conflict: OnConflict) -> String {
    let topic_column = if with_topic { "topic_id, " } else { "" };
    let topic_value = if with_topic { "?, " } else { "" };
    let favorite_update = match on_conflict {
        OnConflict::Replace => "favorite = excluded.favorite,",
        OnConflict::KeepFavorite => "",
    };

    format!(
        r#"
        INSERT INTO {table} (
            id, {topic_column}{URL_AND_USER_COLUMNS}, favorite, created_at, updated_at
        ) VALUES (?, {topic_value}?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            url_raw = excluded.url_raw,
            url_full = excluded.url_full,
            url_regular = excluded.url_regular,
            url_small = excluded.url_small,
            url_thumb = excluded.url_thumb,
            user_id = excluded.user_id,
            user_name = excluded.user_name,
            user_username = excluded.user_username,
            user_bio = excluded.user_bio,
            user_portfolio_url = excluded.user_portfolio_url,
            {favorite_update}
            updated_at = excluded.updated_at
        "#
    )
}

/// Insert a row, or update the existing row with the same id in place.
pub(crate) async fn upsert(
    conn: &mut SqliteConnection,
    table: &str,
    row: PhotoColumns<'_>,
    on_conflict: OnConflict,
) -> Result<()> {
    let sql = upsert_sql(table, row.topic_id.is_some(), on_conflict);
    let now = chrono::Utc::now().timestamp();

    let mut query = sqlx::query(&sql).bind(row.id);
    if let Some(topic_id) = row.topic_id {
        query = query.bind(topic_id);
    }

    query
        .bind(&row.urls.raw)
        .bind(&row.urls.full)
        .bind(&row.urls.regular)
        .bind(&row.urls.small)
        .bind(&row.urls.thumb)
        .bind(&row.user.id)
        .bind(&row.user.name)
        .bind(&row.user.username)
        .bind(&row.user.bio)
        .bind(&row.user.portfolio_url)
        .bind(row.favorite)
        .bind(now)
        .bind(now)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

pub(crate) fn urls_from_row(row: &SqliteRow) -> Result<PhotoUrls> {
    Ok(PhotoUrls {
        raw: row.try_get("url_raw")?,
        full: row.try_get("url_full")?,
        regular: row.try_get("url_regular")?,
        small: row.try_get("url_small")?,
        thumb: row.try_get("url_thumb")?,
    })
}

pub(crate) fn user_from_row(row: &SqliteRow) -> Result<PhotoUser> {
    Ok(PhotoUser {
        id: row.try_get("user_id")?,
        name: row.try_get("user_name")?,
        username: row.try_get("user_username")?,
        bio: row.try_get("user_bio")?,
        portfolio_url: row.try_get("user_portfolio_url")?,
    })
}
