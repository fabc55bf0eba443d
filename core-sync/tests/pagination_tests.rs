//! Integration tests for topic pagination
//!
//! - Free-tier page ceiling and the privileged bypass, for load-more and
//!   direct page fetches
//! - In-flight guard
//! - Failure handling
//! - Reconciliation of overlapping pages

mod common;

use common::{network_down, Harness};
use core_sync::{LoadMoreOutcome, PageOutcome};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::sync::Notify;

#[tokio::test]
async fn test_fourth_page_is_refused_for_free_accounts() {
    let harness = Harness::new().await;
    let pagination = harness.engine.pagination();

    for page in 1..=3 {
        let outcome = pagination.load_more_topic_photos("nature").await;
        assert_eq!(outcome, LoadMoreOutcome::Loaded { page, count: 10 });
    }
    assert!(!pagination.can_load_more_pages("nature").await);

    let outcome = pagination.load_more_topic_photos("nature").await;

    assert_eq!(outcome, LoadMoreOutcome::PageLimitReached { max_pages: 3 });
    assert_eq!(harness.source.page_calls.load(Ordering::SeqCst), 3);
    assert_eq!(harness.engine.current_page("nature").await, 3);
    assert_eq!(harness.engine.topic_photos("nature").await.len(), 30);
}

#[tokio::test]
async fn test_direct_fetch_past_ceiling_is_refused_for_free_accounts() {
    let harness = Harness::new().await;

    let outcome = harness.engine.fetch_topic_photos("nature", 5, 10).await;

    assert_eq!(outcome, PageOutcome::Failed);
    assert_eq!(harness.source.page_calls.load(Ordering::SeqCst), 0);
    assert_eq!(harness.engine.current_page("nature").await, 0);
    assert!(harness.engine.topic_photos("nature").await.is_empty());
    assert_eq!(
        harness.engine.error_message().await.as_deref(),
        Some("Topic nature is limited to 3 pages")
    );
}

#[tokio::test]
async fn test_direct_fetch_of_last_free_page_keeps_ceiling() {
    let harness = Harness::new().await;
    let pagination = harness.engine.pagination();

    let outcome = harness.engine.fetch_topic_photos("nature", 3, 10).await;

    assert_eq!(outcome, PageOutcome::Remote { page: 3, count: 10 });
    assert_eq!(harness.engine.current_page("nature").await, 3);
    assert!(!pagination.can_load_more_pages("nature").await);
    assert_eq!(
        pagination.load_more_topic_photos("nature").await,
        LoadMoreOutcome::PageLimitReached { max_pages: 3 }
    );
    assert_eq!(harness.source.page_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_privileged_direct_fetch_past_ceiling() {
    let harness = Harness::new().await;
    harness.engine.set_privileged(true).await;

    let outcome = harness.engine.fetch_topic_photos("nature", 5, 10).await;

    assert_eq!(outcome, PageOutcome::Remote { page: 5, count: 10 });
    assert_eq!(harness.engine.current_page("nature").await, 5);
}

#[tokio::test]
async fn test_ceiling_is_per_topic() {
    let harness = Harness::new().await;
    let pagination = harness.engine.pagination();

    for _ in 0..3 {
        pagination.load_more_topic_photos("nature").await;
    }

    assert!(pagination.can_load_more_pages("film").await);
    assert_eq!(
        pagination.load_more_topic_photos("film").await,
        LoadMoreOutcome::Loaded { page: 1, count: 10 }
    );
}

#[tokio::test]
async fn test_privileged_account_pages_past_ceiling() {
    let harness = Harness::new().await;
    harness.engine.set_privileged(true).await;
    let pagination = harness.engine.pagination();

    for _ in 0..4 {
        pagination.load_more_topic_photos("nature").await;
    }

    assert_eq!(harness.engine.current_page("nature").await, 4);
    assert!(pagination.can_load_more_pages("nature").await);
}

#[tokio::test]
async fn test_failure_keeps_page_and_clears_flag() {
    let harness = Harness::new().await;
    harness.source.fail_with(network_down());
    let pagination = harness.engine.pagination();

    let outcome = pagination.load_more_topic_photos("nature").await;

    assert_eq!(outcome, LoadMoreOutcome::Failed);
    assert_eq!(harness.source.page_calls.load(Ordering::SeqCst), 1);
    assert_eq!(harness.engine.current_page("nature").await, 0);
    assert!(!harness.engine.is_loading_more().await);
    assert!(harness
        .engine
        .error_message()
        .await
        .unwrap()
        .starts_with("Failed to load more photos"));

    harness.source.recover();
    assert_eq!(
        pagination.load_more_topic_photos("nature").await,
        LoadMoreOutcome::Loaded { page: 1, count: 10 }
    );
}

#[tokio::test]
async fn test_overlapping_pages_do_not_duplicate() {
    let harness = Harness::new().await;
    harness.source.repeat_pages();
    let pagination = harness.engine.pagination();

    pagination.load_more_topic_photos("nature").await;
    pagination.load_more_topic_photos("nature").await;

    assert_eq!(harness.engine.current_page("nature").await, 2);
    assert_eq!(harness.engine.topic_photos("nature").await.len(), 10);
}

#[tokio::test]
async fn test_load_more_after_fetch_continues_from_fetched_page() {
    let harness = Harness::new().await;
    harness.engine.fetch_topic_photos("nature", 1, 10).await;

    let outcome = harness
        .engine
        .pagination()
        .load_more_topic_photos("nature")
        .await;

    assert_eq!(outcome, LoadMoreOutcome::Loaded { page: 2, count: 10 });
    assert_eq!(harness.engine.topic_photos("nature").await.len(), 20);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_second_load_more_is_refused_while_one_is_in_flight() {
    let harness = Harness::new().await;
    let gate = Arc::new(Notify::new());
    harness.source.gate_pages(gate.clone());

    let pagination = harness.engine.pagination();
    let in_flight = {
        let pagination = pagination.clone();
        tokio::spawn(async move { pagination.load_more_topic_photos("nature").await })
    };

    while !harness.engine.is_loading_more().await {
        tokio::task::yield_now().await;
    }

    assert_eq!(
        pagination.load_more_topic_photos("film").await,
        LoadMoreOutcome::AlreadyLoading
    );

    gate.notify_one();
    assert_eq!(
        in_flight.await.unwrap(),
        LoadMoreOutcome::Loaded { page: 1, count: 10 }
    );
    assert!(!harness.engine.is_loading_more().await);
    assert_eq!(harness.source.page_calls.load(Ordering::SeqCst), 1);
}
