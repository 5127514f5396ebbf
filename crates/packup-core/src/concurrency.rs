//! Bounded fan-out over async operations.
//!
//! Both helpers cap the number of simultaneously in-flight operations and
//! return only after every item has settled. Submission follows item order;
//! completion order is unconstrained. Operations own their failures - nothing
//! is collected or propagated here.

use futures::StreamExt;
use std::future::Future;

/// Run `op` over every item with at most `max(1, limit)` in flight.
///
/// Empty input completes immediately without scheduling work.
pub async fn for_each_bounded<T, F, Fut>(items: impl IntoIterator<Item = T>, limit: usize, op: F)
where
    F: FnMut(T) -> Fut,
    Fut: Future<Output = ()>,
{
    futures::stream::iter(items)
        .for_each_concurrent(limit.max(1), op)
        .await;
}

/// Like [`for_each_bounded`], collecting outputs in completion order.
///
/// Callers that need to re-associate results with inputs carry an index
/// through `op`'s output.
pub async fn map_bounded<T, R, F, Fut>(
    items: impl IntoIterator<Item = T>,
    limit: usize,
    op: F,
) -> Vec<R>
where
    F: FnMut(T) -> Fut,
    Fut: Future<Output = R>,
{
    futures::stream::iter(items)
        .map(op)
        .buffer_unordered(limit.max(1))
        .collect()
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn empty_input_completes_immediately() {
        for_each_bounded(Vec::<u32>::new(), 4, |_| async {}).await;
        let out: Vec<u32> = map_bounded(Vec::<u32>::new(), 4, |n| async move { n }).await;
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn ceiling_caps_in_flight_operations() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let high_water = Arc::new(AtomicUsize::new(0));
        let settled = Arc::new(AtomicUsize::new(0));

        for_each_bounded(0..20u32, 3, |_| {
            let in_flight = Arc::clone(&in_flight);
            let high_water = Arc::clone(&high_water);
            let settled = Arc::clone(&settled);
            async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                high_water.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
                settled.fetch_add(1, Ordering::SeqCst);
            }
        })
        .await;

        assert_eq!(settled.load(Ordering::SeqCst), 20);
        assert!(high_water.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn zero_limit_degrades_to_serial() {
        let settled = Arc::new(AtomicUsize::new(0));
        for_each_bounded(0..5u32, 0, |_| {
            let settled = Arc::clone(&settled);
            async move {
                settled.fetch_add(1, Ordering::SeqCst);
            }
        })
        .await;
        assert_eq!(settled.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn map_bounded_settles_every_item_despite_latency_variance() {
        // Later items finish first; all must still be present.
        let mut out = map_bounded(0..8u64, 4, |n| async move {
            tokio::time::sleep(Duration::from_millis(40 - n * 5)).await;
            n
        })
        .await;
        out.sort_unstable();
        assert_eq!(out, (0..8).collect::<Vec<_>>());
    }
}
