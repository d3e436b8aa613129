//! In-memory expectations with read counting
//!
//! An expectation answers requests for its key ahead of any persisted
//! fixture and counts how often it was served. Tests then compare that count
//! with what they expected. Every lookup-and-increment happens inside a single
//! critical section, so concurrent requests never lose an increment.

use mockapi_protocol::FixtureKey;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use tokio::sync::Mutex;
use tracing::debug;

/// A registered expectation
#[derive(Debug, Clone, PartialEq)]
pub struct Expectation {
    /// Response served for the key
    pub expected_result: Value,

    /// Number of times the expectation has been served
    pub read_count: u32,
}

/// Outcome of comparing an expected read count with the observed one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verification {
    /// Count the caller expected
    pub expected: u32,

    /// Count actually observed
    pub actual: u32,
}

impl Verification {
    /// Whether the observed count matches
    #[must_use]
    pub fn is_satisfied(&self) -> bool {
        self.expected == self.actual
    }
}

impl fmt::Display for Verification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Expected: {} but executed: {}", self.expected, self.actual)
    }
}

/// Registry of expectations keyed by fixture key
#[derive(Debug, Default)]
pub struct ExpectationRegistry {
    entries: Mutex<HashMap<FixtureKey, Expectation>>,
}

impl ExpectationRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `expected_result` under `key`, resetting any previous count
    ///
    /// Returns `true` if an earlier expectation was replaced.
    pub async fn set_or_replace(&self, key: &FixtureKey, expected_result: Value) -> bool {
        let previous = self.entries.lock().await.insert(
            key.clone(),
            Expectation {
                expected_result,
                read_count: 0,
            },
        );
        debug!(key = %key, replaced = previous.is_some(), "Registered expectation");
        previous.is_some()
    }

    /// Serve the expectation for `key`, counting the read
    pub async fn try_read(&self, key: &FixtureKey) -> Option<Value> {
        let mut entries = self.entries.lock().await;
        let entry = entries.get_mut(key)?;
        entry.read_count = entry.read_count.saturating_add(1);
        debug!(key = %key, read_count = entry.read_count, "Served expectation");
        Some(entry.expected_result.clone())
    }

    /// Remove the expectation for `key` and return its count
    ///
    /// An absent key yields `0`.
    pub async fn consume(&self, key: &FixtureKey) -> u32 {
        let removed = self.entries.lock().await.remove(key);
        removed.map_or(0, |entry| entry.read_count)
    }

    /// Consume `key` and compare its count with `expected`
    pub async fn verify(&self, key: &FixtureKey, expected: u32) -> Verification {
        let actual = self.consume(key).await;
        let verification = Verification { expected, actual };
        debug!(
            key = %key,
            expected,
            actual,
            satisfied = verification.is_satisfied(),
            "Verified expectation"
        );
        verification
    }

    /// Current count for `key`, without consuming it
    pub async fn read_count(&self, key: &FixtureKey) -> Option<u32> {
        self.entries.lock().await.get(key).map(|e| e.read_count)
    }

    /// Registered keys as file names, sorted
    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .entries
            .lock()
            .await
            .keys()
            .map(ToString::to_string)
            .collect();
        keys.sort();
        keys
    }

    /// Drop every expectation, returning how many were registered
    pub async fn clear(&self) -> usize {
        let mut entries = self.entries.lock().await;
        let cleared = entries.len();
        entries.clear();
        cleared
    }

    /// Number of registered expectations
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// Check if the registry is empty
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockapi_protocol::build_key;
    use serde_json::json;
    use std::sync::Arc;

    fn key() -> FixtureKey {
        build_key("POST", "api/ExpectOneTest", None)
    }

    #[tokio::test]
    async fn test_read_counts() {
        let registry = ExpectationRegistry::new();
        assert!(!registry.set_or_replace(&key(), json!({"Id": "x"})).await);

        assert_eq!(registry.try_read(&key()).await, Some(json!({"Id": "x"})));
        assert_eq!(registry.try_read(&key()).await, Some(json!({"Id": "x"})));
        assert_eq!(registry.read_count(&key()).await, Some(2));

        let verification = registry.verify(&key(), 1).await;
        assert!(!verification.is_satisfied());
        assert_eq!(verification.to_string(), "Expected: 1 but executed: 2");

        assert!(registry.is_empty().await);
        assert_eq!(registry.try_read(&key()).await, None);
    }

    #[tokio::test]
    async fn test_replace_resets_count() {
        let registry = ExpectationRegistry::new();
        registry.set_or_replace(&key(), json!(1)).await;
        registry.try_read(&key()).await;

        assert!(registry.set_or_replace(&key(), json!(2)).await);
        assert_eq!(registry.read_count(&key()).await, Some(0));
        assert_eq!(registry.try_read(&key()).await, Some(json!(2)));
    }

    #[tokio::test]
    async fn test_consume_absent_key() {
        let registry = ExpectationRegistry::new();
        assert_eq!(registry.consume(&key()).await, 0);
        assert!(registry.verify(&key(), 0).await.is_satisfied());
    }

    #[tokio::test]
    async fn test_keys_and_clear() {
        let registry = ExpectationRegistry::new();
        registry.set_or_replace(&build_key("GET", "b", None), json!(1)).await;
        registry.set_or_replace(&build_key("GET", "a", None), json!(1)).await;

        assert_eq!(registry.keys().await, vec!["get_a.json", "get_b.json"]);
        assert_eq!(registry.clear().await, 2);
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_concurrent_reads_are_all_counted() {
        let registry = Arc::new(ExpectationRegistry::new());
        registry.set_or_replace(&key(), json!(true)).await;

        let handles: Vec<_> = (0..50)
            .map(|_| {
                let registry = Arc::clone(&registry);
                tokio::spawn(async move { registry.try_read(&key()).await })
            })
            .collect();
        for handle in handles {
            assert!(handle.await.unwrap().is_some());
        }

        assert_eq!(registry.consume(&key()).await, 50);
    }
}
