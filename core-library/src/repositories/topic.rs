//! Topic repository trait and implementation

use crate::error::{LibraryError, Result};
use crate::models::Topic;
use crate::query::RecordFilter;
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use std::collections::HashMap;

/// Topic repository interface
#[async_trait]
pub trait TopicRepository: Send + Sync {
    /// Replace the whole topic list in one transaction.
    ///
    /// A topic whose incoming `favorite` is unset inherits the stored value
    /// for the same id.
    async fn replace_all(&self, topics: &[Topic]) -> Result<Vec<Topic>>;

    /// Fetch topics matching a filter
    async fn fetch(&self, filter: &RecordFilter) -> Result<Vec<Topic>>;

    /// Count topics matching a filter
    async fn count(&self, filter: &RecordFilter) -> Result<i64>;

    /// Delete every topic
    async fn delete_all(&self) -> Result<u64>;
}

/// SQLite implementation of TopicRepository
pub struct SqliteTopicRepository {
    pool: SqlitePool,
}

impl SqliteTopicRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

pub(crate) fn row_to_topic(row: &SqliteRow) -> Result<Topic> {
    Ok(Topic {
        id: row.try_get("id")?,
        slug: row.try_get("slug")?,
        description: row.try_get("description")?,
        favorite: row.try_get("favorite")?,
    })
}

#[async_trait]
impl TopicRepository for SqliteTopicRepository {
    async fn replace_all(&self, topics: &[Topic]) -> Result<Vec<Topic>> {
        for topic in topics {
            topic.validate().map_err(|msg| LibraryError::InvalidInput {
                field: "topic".to_string(),
                message: msg,
            })?;
        }

        let mut tx = self.pool.begin().await?;

        let previous: HashMap<String, Option<bool>> =
            sqlx::query_as::<_, (String, Option<bool>)>("SELECT id, favorite FROM topics")
                .fetch_all(&mut *tx)
                .await?
                .into_iter()
                .collect();

        sqlx::query("DELETE FROM topics").execute(&mut *tx).await?;

        let now = chrono::Utc::now().timestamp();
        let mut stored = Vec::with_capacity(topics.len());
        for topic in topics {
            let mut topic = topic.clone();
            if topic.favorite.is_none() {
                topic.favorite = previous.get(&topic.id).copied().flatten();
            }

            sqlx::query(
                r#"
                INSERT INTO topics (id, slug, description, favorite, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?, ?)
                ON CONFLICT(id) DO UPDATE SET
                    slug = excluded.slug,
                    description = excluded.description,
                    favorite = excluded.favorite,
                    updated_at = excluded.updated_at
                "#,
            )
            .bind(&topic.id)
            .bind(&topic.slug)
            .bind(&topic.description)
            .bind(topic.favorite)
            .bind(now)
            .bind(now)
            .execute(&mut *tx)
            .await?;

            stored.push(topic);
        }

        tx.commit().await?;
        Ok(stored)
    }

    async fn fetch(&self, filter: &RecordFilter) -> Result<Vec<Topic>> {
        let mut builder =
            QueryBuilder::<Sqlite>::new("SELECT id, slug, description, favorite FROM topics");
        filter.push_where(&mut builder);
        filter.push_order_and_limit(&mut builder);

        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.iter().map(row_to_topic).collect()
    }

    async fn count(&self, filter: &RecordFilter) -> Result<i64> {
        let mut builder = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM topics");
        filter.push_where(&mut builder);

        let count: (i64,) = builder.build_query_as().fetch_one(&self.pool).await?;
        Ok(count.0)
    }

    async fn delete_all(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM topics")
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
