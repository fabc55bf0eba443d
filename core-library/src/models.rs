//! Domain models for the photo library
//!
//! Three stored entities (feed photos, topics, topic photos) plus the
//! [`Photo`] tagged union that lets favorite handling treat both photo kinds
//! through one interface.

use bridge_traits::photos::{PhotoUrls, PhotoUser, RemotePhoto, RemoteTopic};
use serde::{Deserialize, Serialize};

// =============================================================================
// Shared capability interface
// =============================================================================

/// Accessors shared by every photo kind.
///
/// `favorite` is tri-state: `None` (never set) and `Some(false)` both mean
/// "not favorited".
pub trait PhotoRecord {
    fn id(&self) -> &str;
    fn urls(&self) -> &PhotoUrls;
    fn user(&self) -> &PhotoUser;
    fn favorite(&self) -> Option<bool>;
    fn set_favorite(&mut self, favorite: Option<bool>);

    fn is_favorite(&self) -> bool {
        self.favorite() == Some(true)
    }
}

// =============================================================================
// Feed photos
// =============================================================================

/// A photo from the random feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedPhoto {
    /// Remote photo id
    pub id: String,
    pub urls: PhotoUrls,
    pub user: PhotoUser,
    pub favorite: Option<bool>,
}

impl FeedPhoto {
    /// Materialize a remote result. Favorite state starts unset.
    pub fn from_remote(remote: RemotePhoto) -> Self {
        Self {
            id: remote.id,
            urls: remote.urls,
            user: remote.user,
            favorite: None,
        }
    }

    /// Validate feed photo data
    pub fn validate(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("Feed photo id cannot be empty".to_string());
        }
        Ok(())
    }
}

impl PhotoRecord for FeedPhoto {
    fn id(&self) -> &str {
        &self.id
    }

    fn urls(&self) -> &PhotoUrls {
        &self.urls
    }

    fn user(&self) -> &PhotoUser {
        &self.user
    }

    fn favorite(&self) -> Option<bool> {
        self.favorite
    }

    fn set_favorite(&mut self, favorite: Option<bool>) {
        self.favorite = favorite;
    }
}

// =============================================================================
// Topics
// =============================================================================

/// A curated topic. The topic list is replaced wholesale on every re-fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub id: String,
    pub slug: String,
    pub description: Option<String>,
    pub favorite: Option<bool>,
}

impl Topic {
    pub fn from_remote(remote: RemoteTopic) -> Self {
        Self {
            id: remote.id,
            slug: remote.slug,
            description: remote.description,
            favorite: None,
        }
    }

    /// Validate topic data
    pub fn validate(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("Topic id cannot be empty".to_string());
        }
        if self.slug.trim().is_empty() {
            return Err("Topic slug cannot be empty".to_string());
        }
        Ok(())
    }
}

// =============================================================================
// Topic photos
// =============================================================================

/// A photo listed under a topic.
///
/// `id` is the composite `"{topic_id}_{photo_id}"`, so the same remote photo
/// under two topics is two records with independent favorite state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicPhoto {
    /// Composite key
    pub id: String,
    /// Owning topic
    pub topic_id: String,
    pub urls: PhotoUrls,
    pub user: PhotoUser,
    pub favorite: Option<bool>,
}

impl TopicPhoto {
    /// Build the composite key for a photo under a topic.
    pub fn composite_id(topic_id: &str, photo_id: &str) -> String {
        format!("{}_{}", topic_id, photo_id)
    }

    /// Id prefix shared by every photo of `topic_id`.
    pub fn topic_prefix(topic_id: &str) -> String {
        format!("{}_", topic_id)
    }

    /// Materialize a remote result under `topic_id`. New topic photos start
    /// explicitly unfavorited.
    pub fn from_remote(topic_id: &str, remote: RemotePhoto) -> Self {
        Self {
            id: Self::composite_id(topic_id, &remote.id),
            topic_id: topic_id.to_string(),
            urls: remote.urls,
            user: remote.user,
            favorite: Some(false),
        }
    }

    /// Validate topic photo data
    pub fn validate(&self) -> Result<(), String> {
        if self.topic_id.trim().is_empty() {
            return Err("Topic photo must reference a topic".to_string());
        }
        let prefix = Self::topic_prefix(&self.topic_id);
        match self.id.strip_prefix(&prefix) {
            Some(photo_id) if !photo_id.is_empty() => Ok(()),
            _ => Err(format!(
                "Topic photo id '{}' must have the form '{}<photo id>'",
                self.id, prefix
            )),
        }
    }
}

impl PhotoRecord for TopicPhoto {
    fn id(&self) -> &str {
        &self.id
    }

    fn urls(&self) -> &PhotoUrls {
        &self.urls
    }

    fn user(&self) -> &PhotoUser {
        &self.user
    }

    fn favorite(&self) -> Option<bool> {
        self.favorite
    }

    fn set_favorite(&mut self, favorite: Option<bool>) {
        self.favorite = favorite;
    }
}

// =============================================================================
// Tagged union
// =============================================================================

/// Either photo kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Photo {
    Feed(FeedPhoto),
    Topic(TopicPhoto),
}

impl Photo {
    fn record(&self) -> &dyn PhotoRecord {
        match self {
            Photo::Feed(photo) => photo,
            Photo::Topic(photo) => photo,
        }
    }

    fn record_mut(&mut self) -> &mut dyn PhotoRecord {
        match self {
            Photo::Feed(photo) => photo,
            Photo::Topic(photo) => photo,
        }
    }
}

impl PhotoRecord for Photo {
    fn id(&self) -> &str {
        self.record().id()
    }

    fn urls(&self) -> &PhotoUrls {
        self.record().urls()
    }

    fn user(&self) -> &PhotoUser {
        self.record().user()
    }

    fn favorite(&self) -> Option<bool> {
        self.record().favorite()
    }

    fn set_favorite(&mut self, favorite: Option<bool>) {
        self.record_mut().set_favorite(favorite)
    }
}

impl From<FeedPhoto> for Photo {
    fn from(photo: FeedPhoto) -> Self {
        Photo::Feed(photo)
    }
}

impl From<TopicPhoto> for Photo {
    fn from(photo: TopicPhoto) -> Self {
        Photo::Topic(photo)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn remote_photo(id: &str) -> RemotePhoto {
        RemotePhoto {
            id: id.to_string(),
            urls: PhotoUrls {
                raw: format!("https://img.test/{id}?raw"),
                full: format!("https://img.test/{id}?full"),
                regular: format!("https://img.test/{id}?regular"),
                small: format!("https://img.test/{id}?small"),
                thumb: format!("https://img.test/{id}?thumb"),
            },
            user: PhotoUser {
                id: format!("user-{id}"),
                name: "Test Author".to_string(),
                username: "author".to_string(),
                bio: None,
                portfolio_url: Some("https://portfolio.test".to_string()),
            },
        }
    }

    pub fn feed_photo(id: &str) -> FeedPhoto {
        FeedPhoto::from_remote(remote_photo(id))
    }

    pub fn topic_photo(topic_id: &str, photo_id: &str) -> TopicPhoto {
        TopicPhoto::from_remote(topic_id, remote_photo(photo_id))
    }

    pub fn topic(id: &str) -> Topic {
        Topic {
            id: id.to_string(),
            slug: format!("slug-{id}"),
            description: Some(format!("About {id}")),
            favorite: None,
        }
    }
}
