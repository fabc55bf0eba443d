//! Cross-table favorite maintenance

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

/// Rows changed by [`FavoriteRepository::unfavorite_all`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnfavoriteSummary {
    pub feed_photos: u64,
    pub topic_photos: u64,
}

/// Favorite operations that span both photo tables.
#[async_trait]
pub trait FavoriteRepository: Send + Sync {
    /// Set `favorite = false` on the given feed photos and on every stored
    /// topic photo, committed as one transaction.
    async fn unfavorite_all(&self, feed_photo_ids: &[String]) -> Result<UnfavoriteSummary>;
}

/// SQLite implementation of FavoriteRepository
pub struct SqliteFavoriteRepository {
    pool: SqlitePool,
}

impl SqliteFavoriteRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FavoriteRepository for SqliteFavoriteRepository {
    async fn unfavorite_all(&self, feed_photo_ids: &[String]) -> Result<UnfavoriteSummary> {
        let now = chrono::Utc::now().timestamp();
        let mut tx = self.pool.begin().await?;
        let mut summary = UnfavoriteSummary::default();

        for id in feed_photo_ids {
            let result =
                sqlx::query("UPDATE feed_photos SET favorite = 0, updated_at = ? WHERE id = ?")
                    .bind(now)
                    .bind(id)
                    .execute(&mut *tx)
                    .await?;
            summary.feed_photos += result.rows_affected();
        }

        let result = sqlx::query("UPDATE topic_photos SET favorite = 0, updated_at = ?")
            .bind(now)
            .execute(&mut *tx)
            .await?;
        summary.topic_photos = result.rows_affected();

        tx.commit().await?;
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;
    use crate::models::fixtures::{feed_photo, topic_photo};
    use crate::query::RecordFilter;
    use crate::repositories::{
        FeedPhotoRepository, SqliteFeedPhotoRepository, SqliteTopicPhotoRepository,
        TopicPhotoRepository,
    };

    #[tokio::test]
    async fn test_unfavorite_all_touches_listed_feed_photos_and_all_topic_photos() {
        let pool = create_test_pool().await.unwrap();
        let feed = SqliteFeedPhotoRepository::new(pool.clone());
        let topics = SqliteTopicPhotoRepository::new(pool.clone());
        let favorites = SqliteFavoriteRepository::new(pool);

        for id in ["in-memory", "not-loaded"] {
            let mut photo = feed_photo(id);
            photo.favorite = Some(true);
            feed.insert_or_replace(&photo).await.unwrap();
        }
        for (topic, photo) in [("A", "X"), ("B", "X")] {
            let mut photo = topic_photo(topic, photo);
            photo.favorite = Some(true);
            topics.insert_or_replace(&photo).await.unwrap();
        }

        let summary = favorites
            .unfavorite_all(&["in-memory".to_string()])
            .await
            .unwrap();

        assert_eq!(summary.feed_photos, 1);
        assert_eq!(summary.topic_photos, 2);
        assert_eq!(topics.count(&RecordFilter::favorites()).await.unwrap(), 0);

        let remaining = feed.fetch(&RecordFilter::favorites()).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, "not-loaded");
        assert_eq!(
            feed.find_by_id("in-memory").await.unwrap().unwrap().favorite,
            Some(false)
        );
    }
}
