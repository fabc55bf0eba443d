//! Policy constants for loading, retrying and the free-tier limits.

use std::time::Duration;

/// Sync engine configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Photos requested when the feed is empty
    pub feed_batch_size: u32,

    /// Topics requested when the topic list is empty
    pub topic_batch_size: u32,

    /// Photos per topic page
    pub topic_page_size: u32,

    /// Retries after the first failed remote attempt
    pub max_retries: u32,

    /// Constant delay between remote attempts
    pub retry_delay: Duration,

    /// Favorites a non-privileged account may hold
    pub favorite_quota: usize,

    /// Topic pages a non-privileged account may load
    pub max_free_pages: u32,

    /// Photos fetched right after clearing the feed
    pub clear_refill_count: u32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            feed_batch_size: 30,
            topic_batch_size: 6,
            topic_page_size: 10,
            max_retries: 3,
            retry_delay: Duration::from_secs(3),
            favorite_quota: 8,
            max_free_pages: 3,
            clear_refill_count: 20,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SyncConfig::default();
        assert_eq!(config.feed_batch_size, 30);
        assert_eq!(config.topic_batch_size, 6);
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.retry_delay, Duration::from_secs(3));
        assert_eq!(config.favorite_quota, 8);
        assert_eq!(config.max_free_pages, 3);
    }
}
