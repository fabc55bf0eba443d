//! Topic photo repository trait and implementation

use crate::error::{LibraryError, Result};
use crate::models::TopicPhoto;
use crate::query::RecordFilter;
use crate::repositories::columns::{self, OnConflict, PhotoColumns};
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};

const TABLE: &str = "topic_photos";

/// Topic photo repository interface
///
/// Rows are keyed by the composite `"{topic_id}_{photo_id}"` id. Use
/// [`RecordFilter::id_prefix`] with [`TopicPhoto::topic_prefix`] to select
/// the photos of one topic.
#[async_trait]
pub trait TopicPhotoRepository: Send + Sync {
    /// Find a topic photo by composite id
    async fn find_by_id(&self, id: &str) -> Result<Option<TopicPhoto>>;

    /// Insert a photo, or overwrite every column of the existing row.
    async fn insert_or_replace(&self, photo: &TopicPhoto) -> Result<()>;

    /// Store a page of freshly fetched photos in one transaction, keeping the
    /// favorite state of rows that already exist. Returns the stored records
    /// in input order.
    async fn merge_remote(&self, photos: &[TopicPhoto]) -> Result<Vec<TopicPhoto>>;

    /// Fetch topic photos matching a filter
    async fn fetch(&self, filter: &RecordFilter) -> Result<Vec<TopicPhoto>>;

    /// Count topic photos matching a filter
    async fn count(&self, filter: &RecordFilter) -> Result<i64>;
}

/// SQLite implementation of TopicPhotoRepository
pub struct SqliteTopicPhotoRepository {
    pool: SqlitePool,
}

impl SqliteTopicPhotoRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn columns(photo: &TopicPhoto) -> PhotoColumns<'_> {
        PhotoColumns {
            id: &photo.id,
            topic_id: Some(&photo.topic_id),
            urls: &photo.urls,
            user: &photo.user,
            favorite: photo.favorite,
        }
    }

    fn validate(photo: &TopicPhoto) -> Result<()> {
        photo.validate().map_err(|msg| LibraryError::InvalidInput {
            field: "topic_photo".to_string(),
            message: msg,
        })
    }
}

pub(crate) fn row_to_topic_photo(row: &SqliteRow) -> Result<TopicPhoto> {
    Ok(TopicPhoto {
        id: row.try_get("id")?,
        topic_id: row.try_get("topic_id")?,
        urls: columns::urls_from_row(row)?,
        user: columns::user_from_row(row)?,
        favorite: row.try_get("favorite")?,
    })
}

#[async_trait]
impl TopicPhotoRepository for SqliteTopicPhotoRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<TopicPhoto>> {
        let sql = format!("{} WHERE id = ?", columns::select_sql(TABLE, true));
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_topic_photo).transpose()
    }

    async fn insert_or_replace(&self, photo: &TopicPhoto) -> Result<()> {
        Self::validate(photo)?;

        let mut conn = self.pool.acquire().await?;
        columns::upsert(&mut conn, TABLE, Self::columns(photo), OnConflict::Replace).await
    }

    async fn merge_remote(&self, photos: &[TopicPhoto]) -> Result<Vec<TopicPhoto>> {
        for photo in photos {
            Self::validate(photo)?;
        }

        let select = format!("{} WHERE id = ?", columns::select_sql(TABLE, true));
        let mut tx = self.pool.begin().await?;
        let mut stored = Vec::with_capacity(photos.len());

        for photo in photos {
            columns::upsert(&mut tx, TABLE, Self::columns(photo), OnConflict::KeepFavorite)
                .await?;
            let row = sqlx::query(&select)
                .bind(&photo.id)
                .fetch_one(&mut *tx)
                .await?;
            stored.push(row_to_topic_photo(&row)?);
        }

        tx.commit().await?;
        Ok(stored)
    }

    async fn fetch(&self, filter: &RecordFilter) -> Result<Vec<TopicPhoto>> {
        let mut builder = QueryBuilder::<Sqlite>::new(columns::select_sql(TABLE, true));
        filter.push_where(&mut builder);
        filter.push_order_and_limit(&mut builder);

        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.iter().map(row_to_topic_photo).collect()
    }

    async fn count(&self, filter: &RecordFilter) -> Result<i64> {
        let mut builder = QueryBuilder::<Sqlite>::new(format!("SELECT COUNT(*) FROM {}", TABLE));
        filter.push_where(&mut builder);

        let count: (i64,) = builder.build_query_as().fetch_one(&self.pool).await?;
        Ok(count.0)
    }
}
