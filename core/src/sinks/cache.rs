use std::time::Duration;

use async_trait::async_trait;
use netmind_common::error::SinkError;
use netmind_common::sinks::CacheSink;
use timedmap::TimedMap;

/// Process-local cache backed by a [`TimedMap`].
///
/// Entries vanish once their TTL elapses. Contents do not outlive the process,
/// which is enough for `watch` mode and for read-through lookups within one run.
pub struct TtlCache {
    entries: TimedMap<String, String>,
}

impl TtlCache {
    pub fn new() -> Self {
        Self {
            entries: TimedMap::new(),
        }
    }
}

impl Default for TtlCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheSink for TtlCache {
    async fn put(&self, key: &str, value: String, ttl: Duration) -> Result<(), SinkError> {
        self.entries.insert(key.to_string(), value, ttl);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, SinkError> {
        Ok(self.entries.get(&key.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stores_and_overwrites() {
        let cache = TtlCache::new();
        cache.put("a", "1".to_string(), Duration::from_secs(60)).await.unwrap();
        cache.put("a", "2".to_string(), Duration::from_secs(60)).await.unwrap();

        assert_eq!(cache.get("a").await.unwrap().as_deref(), Some("2"));
        assert_eq!(cache.get("b").await.unwrap(), None);
    }

    #[tokio::test]
    async fn entries_expire() {
        let cache = TtlCache::new();
        cache.put("a", "1".to_string(), Duration::from_millis(20)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(80)).await;

        assert_eq!(cache.get("a").await.unwrap(), None);
    }
}
