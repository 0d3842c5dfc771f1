use futures::stream::{self, StreamExt};
use std::collections::{BTreeSet, HashMap};
use std::fmt::Display;
use std::future::Future;
use std::hash::Hash;
use std::pin::pin;
use std::time::Duration;
use tokio::time::{Instant, timeout, timeout_at};

use crate::api::config_dto::FanOutDto;
use crate::error::{Error, Result};

/// Limits of one round of concurrent lookups.
#[derive(Debug, Clone, Copy)]
pub struct FanOutPolicy {
    pub max_concurrency: usize,
    pub item_timeout: Duration,
    pub round_deadline: Duration,
}

impl From<&FanOutDto> for FanOutPolicy {
    fn from(dto: &FanOutDto) -> Self {
        FanOutPolicy { max_concurrency: dto.max_concurrency, item_timeout: dto.item_timeout(), round_deadline: dto.round_deadline() }
    }
}

impl Default for FanOutPolicy {
    fn default() -> Self {
        FanOutPolicy::from(&FanOutDto::default())
    }
}

/// Outcome of a round: every key ends up in exactly one of the two.
#[derive(Debug)]
pub struct FanOutResult<K, V> {
    pub values: HashMap<K, V>,
    /// Sorted by key.
    pub failures: Vec<(K, Error)>,
}

impl<K, V> Default for FanOutResult<K, V> {
    fn default() -> Self {
        FanOutResult { values: HashMap::new(), failures: Vec::new() }
    }
}

/// Looks up every distinct key with at most `max_concurrency` requests in
/// flight.
///
/// A failing or timed-out item is recorded and does not affect the others.
/// When the round deadline passes, outstanding requests are dropped and
/// their keys recorded as failures.
pub async fn fan_out<K, V, F, Fut>(kind: &'static str, keys: impl IntoIterator<Item = K>, policy: &FanOutPolicy, fetch: F) -> FanOutResult<K, V>
where
    K: Clone + Eq + Hash + Ord + Display,
    F: Fn(K) -> Fut,
    Fut: Future<Output = Result<V>>,
{
    let keys: BTreeSet<K> = keys.into_iter().collect();
    let item_timeout = policy.item_timeout;
    let started = Instant::now();
    let deadline = started + policy.round_deadline;

    let mut pending = pin!(
        stream::iter(keys.iter().cloned())
            .map(|key| {
                let request = fetch(key.clone());
                async move {
                    let outcome = match timeout(item_timeout, request).await {
                        Ok(outcome) => outcome,
                        Err(_) => Err(Error::FetchTimeout { kind, key: key.to_string() }),
                    };
                    (key, outcome)
                }
            })
            .buffer_unordered(policy.max_concurrency.max(1))
    );

    let mut result: FanOutResult<K, V> = FanOutResult::default();
    loop {
        match timeout_at(deadline, pending.next()).await {
            Ok(Some((key, Ok(value)))) => {
                result.values.insert(key, value);
            }
            Ok(Some((key, Err(e)))) => {
                log::warn!("{} lookup failed for {}: {}", kind, key, e);
                result.failures.push((key, e));
            }
            Ok(None) => break,
            Err(_) => {
                let finished: BTreeSet<&K> = result.values.keys().chain(result.failures.iter().map(|(k, _)| k)).collect();
                let unfinished: Vec<K> = keys.iter().filter(|k| !finished.contains(k)).cloned().collect();
                log::warn!("{} round hit its deadline with {} lookups outstanding", kind, unfinished.len());
                for key in unfinished {
                    let e = Error::RoundDeadline { kind, key: key.to_string() };
                    result.failures.push((key, e));
                }
                break;
            }
        }
    }

    result.failures.sort_by(|a, b| a.0.cmp(&b.0));
    log::debug!(
        "{} round: {} keys, {} resolved, {} failed in {:?}",
        kind,
        keys.len(),
        result.values.len(),
        result.failures.len(),
        started.elapsed()
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn policy(item_ms: u64, round_ms: u64) -> FanOutPolicy {
        FanOutPolicy { max_concurrency: 4, item_timeout: Duration::from_millis(item_ms), round_deadline: Duration::from_millis(round_ms) }
    }

    #[tokio::test]
    async fn failures_are_isolated_per_item() {
        let keys = vec!["a".to_string(), "b".to_string(), "c".to_string(), "a".to_string()];

        let result = fan_out("test", keys, &policy(1000, 5000), |key: String| async move {
            if key == "b" {
                Err(Error::FetchFailed { kind: "test", key, reason: "boom".to_string() })
            } else {
                Ok(key.len())
            }
        })
        .await;

        assert_eq!(result.values.len(), 2);
        assert_eq!(result.failures.len(), 1);
        assert_eq!(result.failures[0].0, "b");
    }

    #[tokio::test]
    async fn slow_items_time_out_without_blocking_the_round() {
        let keys = vec!["fast".to_string(), "slow".to_string()];

        let result = fan_out("test", keys, &policy(50, 5000), |key: String| async move {
            if key == "slow" {
                tokio::time::sleep(Duration::from_secs(10)).await;
            }
            Ok(())
        })
        .await;

        assert!(result.values.contains_key("fast"));
        assert!(matches!(result.failures[0].1, Error::FetchTimeout { .. }));
    }

    #[tokio::test]
    async fn round_deadline_marks_outstanding_items() {
        let keys: Vec<String> = (0..3).map(|i| format!("k{}", i)).collect();

        let result = fan_out("test", keys, &policy(10_000, 50), |key: String| async move {
            if key != "k0" {
                tokio::time::sleep(Duration::from_secs(10)).await;
            }
            Ok(())
        })
        .await;

        assert_eq!(result.values.len(), 1);
        assert_eq!(result.failures.len(), 2);
        assert!(result.failures.iter().all(|(_, e)| matches!(e, Error::RoundDeadline { .. })));
    }

    #[tokio::test]
    async fn concurrency_is_bounded() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let keys: Vec<u32> = (0..20).collect();
        let limits = FanOutPolicy { max_concurrency: 3, ..policy(1000, 5000) };

        let result = fan_out("test", keys, &limits, |_key: u32| {
            let in_flight = in_flight.clone();
            let peak = peak.clone();
            async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
                Ok(())
            }
        })
        .await;

        assert_eq!(result.values.len(), 20);
        assert!(peak.load(Ordering::SeqCst) <= 3);
    }
}
