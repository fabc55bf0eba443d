//! Feed photo repository trait and implementation

use crate::error::{LibraryError, Result};
use crate::models::FeedPhoto;
use crate::query::RecordFilter;
use crate::repositories::columns::{self, OnConflict, PhotoColumns};
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};

const TABLE: &str = "feed_photos";

/// Feed photo repository interface
#[async_trait]
pub trait FeedPhotoRepository: Send + Sync {
    /// Find a feed photo by its id
    async fn find_by_id(&self, id: &str) -> Result<Option<FeedPhoto>>;

    /// Insert a photo, or overwrite every column of the existing row with the
    /// same id (favorite included).
    async fn insert_or_replace(&self, photo: &FeedPhoto) -> Result<()>;

    /// Store a batch of freshly fetched photos in one transaction.
    ///
    /// Existing rows get new urls and author but keep their favorite state.
    /// Returns the stored records in input order.
    async fn merge_remote(&self, photos: &[FeedPhoto]) -> Result<Vec<FeedPhoto>>;

    /// Fetch photos matching a filter
    async fn fetch(&self, filter: &RecordFilter) -> Result<Vec<FeedPhoto>>;

    /// Count photos matching a filter (sort and limit are ignored)
    async fn count(&self, filter: &RecordFilter) -> Result<i64>;

    /// Delete every feed photo
    ///
    /// # Returns
    /// Number of rows removed
    async fn delete_all(&self) -> Result<u64>;
}

/// SQLite implementation of FeedPhotoRepository
pub struct SqliteFeedPhotoRepository {
    pool: SqlitePool,
}

impl SqliteFeedPhotoRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn columns(photo: &FeedPhoto) -> PhotoColumns<'_> {
        PhotoColumns {
            id: &photo.id,
            topic_id: None,
            urls: &photo.urls,
            user: &photo.user,
            favorite: photo.favorite,
        }
    }

    fn validate(photo: &FeedPhoto) -> Result<()> {
        photo.validate().map_err(|msg| LibraryError::InvalidInput {
            field: "feed_photo".to_string(),
            message: msg,
        })
    }
}

pub(crate) fn row_to_feed_photo(row: &SqliteRow) -> Result<FeedPhoto> {
    Ok(FeedPhoto {
        id: row.try_get("id")?,
        urls: columns::urls_from_row(row)?,
        user: columns::user_from_row(row)?,
        favorite: row.try_get("favorite")?,
    })
}

#[async_trait]
impl FeedPhotoRepository for SqliteFeedPhotoRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<FeedPhoto>> {
        let sql = format!("{} WHERE id = ?", columns::select_sql(TABLE, false));
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_feed_photo).transpose()
    }

    async fn insert_or_replace(&self, photo: &FeedPhoto) -> Result<()> {
        Self::validate(photo)?;

        let mut conn = self.pool.acquire().await?;
        columns::upsert(&mut conn, TABLE, Self::columns(photo), OnConflict::Replace).await
    }

    async fn merge_remote(&self, photos: &[FeedPhoto]) -> Result<Vec<FeedPhoto>> {
        for photo in photos {
            Self::validate(photo)?;
        }

        let select = format!("{} WHERE id = ?", columns::select_sql(TABLE, false));
        let mut tx = self.pool.begin().await?;
        let mut stored = Vec::with_capacity(photos.len());

        for photo in photos {
            columns::upsert(&mut tx, TABLE, Self::columns(photo), OnConflict::KeepFavorite)
                .await?;
            let row = sqlx::query(&select)
                .bind(&photo.id)
                .fetch_one(&mut *tx)
                .await?;
            stored.push(row_to_feed_photo(&row)?);
        }

        tx.commit().await?;
        Ok(stored)
    }

    async fn fetch(&self, filter: &RecordFilter) -> Result<Vec<FeedPhoto>> {
        let mut builder = QueryBuilder::<Sqlite>::new(columns::select_sql(TABLE, false));
        filter.push_where(&mut builder);
        filter.push_order_and_limit(&mut builder);

        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.iter().map(row_to_feed_photo).collect()
    }

    async fn count(&self, filter: &RecordFilter) -> Result<i64> {
        let mut builder = QueryBuilder::<Sqlite>::new(format!("SELECT COUNT(*) FROM {}", TABLE));
        filter.push_where(&mut builder);

        let count: (i64,) = builder.build_query_as().fetch_one(&self.pool).await?;
        Ok(count.0)
    }

    async fn delete_all(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM feed_photos")
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
