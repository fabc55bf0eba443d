//! Integration tests for favorites
//!
//! - Toggle idempotence
//! - Free-tier quota and the privileged bypass
//! - Independence of composite-keyed topic photos
//! - Bulk unfavorite

mod common;

use common::{feed_photo, remote_photo, Harness};
use core_library::{Photo, PhotoRecord, RecordFilter, TopicPhoto};
use core_runtime::events::{CoreEvent, LibraryEvent};
use core_sync::ToggleOutcome;

fn ids(photos: &[Photo]) -> Vec<String> {
    photos.iter().map(|p| p.id().to_string()).collect()
}

#[tokio::test]
async fn test_toggle_twice_restores_original_state() {
    let harness = Harness::new().await;
    harness.seed_feed(3).await;
    harness.engine.load_feed().await;
    let favorites = harness.engine.favorites();

    let photo = Photo::Feed(harness.engine.photos().await[1].clone());
    let before = ids(&harness.engine.favorite_photos().await);

    let first = favorites.toggle_favorite(&photo).await;
    assert!(matches!(first, ToggleOutcome::Changed { favorite: true, .. }));
    assert_eq!(favorites.favorites_count().await, 1);

    let second = favorites.toggle_favorite(&photo).await;
    assert!(matches!(second, ToggleOutcome::Changed { favorite: false, .. }));

    let stored = harness
        .library
        .feed_photos
        .find_by_id(photo.id())
        .await
        .unwrap()
        .unwrap();
    assert!(!stored.is_favorite());
    assert_eq!(ids(&harness.engine.favorite_photos().await), before);
    assert!(!harness.engine.photos().await[1].is_favorite());
}

#[tokio::test]
async fn test_ninth_favorite_is_rejected() {
    let harness = Harness::new().await;
    harness.seed_feed(9).await;
    harness.engine.load_feed().await;
    let favorites = harness.engine.favorites();
    let photos = harness.engine.photos().await;

    for photo in &photos[..8] {
        let outcome = favorites.toggle_favorite(&Photo::Feed(photo.clone())).await;
        assert!(matches!(outcome, ToggleOutcome::Changed { favorite: true, .. }));
    }
    assert!(favorites.has_reached_favorite_limit().await);

    let mut stream = harness.stream();
    let outcome = favorites
        .toggle_favorite(&Photo::Feed(photos[8].clone()))
        .await;

    assert_eq!(outcome, ToggleOutcome::Rejected { limit: 8 });
    assert_eq!(favorites.favorites_count().await, 8);
    assert_eq!(
        harness
            .library
            .feed_photos
            .count(&RecordFilter::favorites())
            .await
            .unwrap(),
        8
    );
    assert!(harness
        .engine
        .error_message()
        .await
        .unwrap()
        .contains("Favorite limit of 8"));
    assert!(stream.drain().iter().any(|event| matches!(
        event,
        CoreEvent::Library(LibraryEvent::FavoriteRejected { limit: 8, .. })
    )));
}

#[tokio::test]
async fn test_unfavorite_is_allowed_at_quota() {
    let harness = Harness::new().await;
    harness.seed_feed(8).await;
    harness.engine.load_feed().await;
    let favorites = harness.engine.favorites();
    let photos = harness.engine.photos().await;

    for photo in &photos {
        favorites.toggle_favorite(&Photo::Feed(photo.clone())).await;
    }

    let outcome = favorites
        .toggle_favorite(&Photo::Feed(photos[0].clone()))
        .await;

    assert!(matches!(outcome, ToggleOutcome::Changed { favorite: false, .. }));
    assert_eq!(favorites.favorites_count().await, 7);
}

#[tokio::test]
async fn test_privileged_account_has_no_quota() {
    let harness = Harness::new().await;
    harness.seed_feed(10).await;
    harness.engine.load_feed().await;
    harness.engine.set_privileged(true).await;
    let favorites = harness.engine.favorites();

    for photo in harness.engine.photos().await {
        let outcome = favorites.toggle_favorite(&Photo::Feed(photo)).await;
        assert!(matches!(outcome, ToggleOutcome::Changed { .. }));
    }

    assert_eq!(favorites.favorites_count().await, 10);
    assert!(!favorites.has_reached_favorite_limit().await);
}

#[tokio::test]
async fn test_topic_favorites_are_independent_per_topic() {
    let harness = Harness::new().await;
    let in_a = TopicPhoto::from_remote("A", remote_photo("X"));
    let in_b = TopicPhoto::from_remote("B", remote_photo("X"));
    for photo in [&in_a, &in_b] {
        harness
            .library
            .topic_photos
            .insert_or_replace(photo)
            .await
            .unwrap();
    }

    let outcome = harness
        .engine
        .favorites()
        .toggle_favorite(&Photo::Topic(in_a.clone()))
        .await;
    assert!(matches!(outcome, ToggleOutcome::Changed { favorite: true, .. }));

    let b = harness
        .library
        .topic_photos
        .find_by_id(&in_b.id)
        .await
        .unwrap()
        .unwrap();
    assert!(!b.is_favorite());
    assert_eq!(
        ids(&harness.engine.favorite_photos().await),
        vec!["A_X".to_string()]
    );
}

#[tokio::test]
async fn test_topic_toggle_updates_loaded_page() {
    let harness = Harness::new().await;
    harness.engine.fetch_topic_photos("nature", 1, 10).await;
    let photo = harness.engine.topic_photos("nature").await[3].clone();

    harness
        .engine
        .favorites()
        .toggle_favorite(&Photo::Topic(photo.clone()))
        .await;

    let loaded = harness.engine.topic_photos("nature").await;
    assert!(loaded[3].is_favorite());
    assert_eq!(loaded.iter().filter(|p| p.is_favorite()).count(), 1);
}

#[tokio::test]
async fn test_favorites_view_lists_feed_before_topic_photos() {
    let harness = Harness::new().await;
    harness.engine.fetch_topic_photos("nature", 1, 10).await;
    harness.seed_feed(2).await;
    harness.engine.load_feed().await;
    let favorites = harness.engine.favorites();

    let topic = harness.engine.topic_photos("nature").await[0].clone();
    favorites.toggle_favorite(&Photo::Topic(topic)).await;
    favorites
        .toggle_favorite(&Photo::Feed(feed_photo("f01")))
        .await;

    let view = harness.engine.favorite_photos().await;
    assert!(matches!(view[0], Photo::Feed(_)));
    assert!(matches!(view[1], Photo::Topic(_)));
}

#[tokio::test]
async fn test_unfavorite_all_clears_both_kinds() {
    let harness = Harness::new().await;
    harness.seed_feed(3).await;
    harness.engine.load_feed().await;
    harness.engine.fetch_topic_photos("nature", 1, 10).await;
    let favorites = harness.engine.favorites();

    for photo in harness.engine.photos().await {
        favorites.toggle_favorite(&Photo::Feed(photo)).await;
    }
    for photo in harness.engine.topic_photos("nature").await.into_iter().take(2) {
        favorites.toggle_favorite(&Photo::Topic(photo)).await;
    }
    assert_eq!(favorites.favorites_count().await, 5);

    let summary = favorites.unfavorite_all_photos().await.unwrap();

    assert_eq!(summary.feed_photos, 3);
    assert_eq!(summary.topic_photos, 10);
    assert_eq!(favorites.favorites_count().await, 0);
    assert!(harness
        .engine
        .photos()
        .await
        .iter()
        .all(|p| p.favorite == Some(false)));
    assert!(harness
        .engine
        .topic_photos("nature")
        .await
        .iter()
        .all(|p| !p.is_favorite()));
}
