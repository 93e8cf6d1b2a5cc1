//! Lazy-key sorting and parallel partitioned scanning helpers shared by
//! every domain's filter jobs.

use std::thread;

use crate::scheduler::JobHandle;

/// Sorts `ids` by a lazily-computed key, computing each key exactly once.
///
/// Builds `(id, key(id))` pairs, stable-sorts by key then by id, and
/// extracts the ids back out — this avoids recomputing `key` inside a
/// comparator on every pairwise probe, which a plain `sort_by_key` closure
/// would otherwise do.
pub fn complex_sort<Id, K, F>(mut ids: Vec<Id>, key: F) -> Vec<Id>
where
    Id: Clone + Ord,
    K: Ord,
    F: Fn(&Id) -> K,
{
    let mut pairs: Vec<(Id, K)> = ids.drain(..).map(|id| {
        let k = key(&id);
        (id, k)
    }).collect();
    pairs.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
    pairs.into_iter().map(|(id, _)| id).collect()
}

/// Evaluates `predicate` over `ids` in parallel across disjoint
/// partitions, checking `handle` for cancellation roughly every
/// [`crate::scheduler::POLL_INTERVAL`] items within each partition and
/// bailing out early (with an empty result for that partition) on cancel.
///
/// Partial per-thread vectors are concatenated on completion, in
/// partition order, not item-interleaved order.
pub fn parallel_filter<Id, F>(ids: &[Id], worker_count: usize, handle: &JobHandle, predicate: F) -> Vec<Id>
where
    Id: Clone + Send + Sync,
    F: Fn(&Id) -> bool + Send + Sync,
{
    if ids.is_empty() {
        return Vec::new();
    }
    let worker_count = worker_count.max(1).min(ids.len());
    let chunk_size = (ids.len() + worker_count - 1) / worker_count;

    thread::scope(|scope| {
        let handles: Vec<_> = ids
            .chunks(chunk_size.max(1))
            .map(|chunk| {
                scope.spawn(|| {
                    let mut out = Vec::new();
                    for (i, item) in chunk.iter().enumerate() {
                        if i % crate::scheduler::POLL_INTERVAL == 0 && handle.is_cancelled() {
                            return Vec::new();
                        }
                        if predicate(item) {
                            out.push(item.clone());
                        }
                    }
                    out
                })
            })
            .collect();

        handles.into_iter().flat_map(|h| h.join().unwrap()).collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize};
    use std::sync::{Arc, Mutex};

    fn handle() -> JobHandle {
        JobHandle {
            cancelled: Arc::new(AtomicBool::new(false)),
            completed: Arc::new(AtomicUsize::new(0)),
            total: Arc::new(Mutex::new(None)),
        }
    }

    #[test]
    fn test_complex_sort_orders_by_key_then_id() {
        let ids = vec![3, 1, 2, 4];
        let sorted = complex_sort(ids, |id| *id % 2);
        assert_eq!(sorted, vec![2, 4, 1, 3]);
    }

    #[test]
    fn test_parallel_filter_matches_sequential() {
        let ids: Vec<i32> = (0..100).collect();
        let h = handle();
        let result = parallel_filter(&ids, 4, &h, |x| x % 3 == 0);
        let expected: Vec<i32> = ids.iter().filter(|x| **x % 3 == 0).cloned().collect();
        assert_eq!(result, expected);
    }

    #[test]
    fn test_parallel_filter_empty_input() {
        let ids: Vec<i32> = Vec::new();
        let h = handle();
        assert!(parallel_filter(&ids, 4, &h, |_| true).is_empty());
    }
}
