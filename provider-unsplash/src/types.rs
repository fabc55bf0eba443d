//! Unsplash API response types
//!
//! Data structures for deserializing Unsplash API responses. Only the fields
//! the sync core stores are modelled; everything else is ignored.

use bridge_traits::photos::{PhotoUrls, PhotoUser, RemotePhoto, RemoteTopic};
use serde::Deserialize;

/// Photo resource
///
/// See: https://unsplash.com/documentation#get-a-random-photo
#[derive(Debug, Clone, Deserialize)]
pub struct UnsplashPhoto {
    pub id: String,
    pub urls: UnsplashUrls,
    pub user: UnsplashUser,
}

/// Image size variants
#[derive(Debug, Clone, Deserialize)]
pub struct UnsplashUrls {
    pub raw: String,
    pub full: String,
    pub regular: String,
    pub small: String,
    pub thumb: String,
}

/// Photographer
#[derive(Debug, Clone, Deserialize)]
pub struct UnsplashUser {
    pub id: String,
    pub name: String,
    pub username: String,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub portfolio_url: Option<String>,
}

/// Topic resource
///
/// See: https://unsplash.com/documentation#list-topics
#[derive(Debug, Clone, Deserialize)]
pub struct UnsplashTopic {
    pub id: String,
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Error body, `{"errors": ["..."]}`
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub errors: Vec<String>,
}

impl From<UnsplashPhoto> for RemotePhoto {
    fn from(photo: UnsplashPhoto) -> Self {
        RemotePhoto {
            id: photo.id,
            urls: PhotoUrls {
                raw: photo.urls.raw,
                full: photo.urls.full,
                regular: photo.urls.regular,
                small: photo.urls.small,
                thumb: photo.urls.thumb,
            },
            user: PhotoUser {
                id: photo.user.id,
                name: photo.user.name,
                username: photo.user.username,
                bio: photo.user.bio,
                portfolio_url: photo.user.portfolio_url,
            },
        }
    }
}

impl From<UnsplashTopic> for RemoteTopic {
    fn from(topic: UnsplashTopic) -> Self {
        RemoteTopic {
            id: topic.id,
            slug: topic.slug,
            description: topic.description.filter(|d| !d.trim().is_empty()),
        }
    }
}
