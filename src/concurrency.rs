//! Bounded fan-out over async work.
//!
//! Every helper spawns one task per item on a `JoinSet` and gates them with a
//! semaphore, so at most `concurrency` run at once. Results come back in input
//! order. Dropping the returned future aborts the tasks still in flight.

use crate::errors::{AppError, AppResult};
use indicatif::ProgressBar;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::warn;

/// Runs `f` over `items` with at most `concurrency` calls in flight.
///
/// Each item gets its own result; a failing item does not stop the others.
pub async fn fan_out<T, R, F, Fut>(
    items: Vec<T>,
    concurrency: usize,
    progress: Option<ProgressBar>,
    f: F,
) -> Vec<AppResult<R>>
where
    T: Send + 'static,
    R: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = AppResult<R>> + Send + 'static,
{
    let total = items.len();
    let mut join_set = spawn_all(items, concurrency, f);
    let mut results: Vec<Option<AppResult<R>>> = std::iter::repeat_with(|| None).take(total).collect();

    while let Some(joined) = join_set.join_next().await {
        if let Some(pb) = &progress {
            pb.inc(1);
        }
        match joined {
            Ok((index, result)) => results[index] = Some(result),
            Err(e) => warn!(error = %e, "Fan-out task failed"),
        }
    }

    if let Some(pb) = &progress {
        pb.finish_and_clear();
    }

    results
        .into_iter()
        .map(|result| {
            result.unwrap_or_else(|| Err(AppError::TaskError("task panicked or was cancelled".into())))
        })
        .collect()
}

/// Like [`fan_out`], but stops at the first error.
///
/// Outstanding tasks are aborted and awaited before the error is returned, so
/// no request outlives the call.
pub async fn try_fan_out<T, R, F, Fut>(
    items: Vec<T>,
    concurrency: usize,
    progress: Option<ProgressBar>,
    f: F,
) -> AppResult<Vec<R>>
where
    T: Send + 'static,
    R: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = AppResult<R>> + Send + 'static,
{
    let total = items.len();
    let mut join_set = spawn_all(items, concurrency, f);
    let mut results: Vec<Option<R>> = std::iter::repeat_with(|| None).take(total).collect();

    while let Some(joined) = join_set.join_next().await {
        if let Some(pb) = &progress {
            pb.inc(1);
        }
        let failure = match joined {
            Ok((index, Ok(value))) => {
                results[index] = Some(value);
                continue;
            }
            Ok((_, Err(e))) => e,
            Err(e) => AppError::from(e),
        };

        join_set.shutdown().await;
        if let Some(pb) = &progress {
            pb.abandon();
        }
        return Err(failure);
    }

    if let Some(pb) = &progress {
        pb.finish_and_clear();
    }

    results
        .into_iter()
        .map(|value| value.ok_or_else(|| AppError::TaskError("task produced no result".into())))
        .collect()
}

/// Keeps the items for which `predicate` answers `true`.
///
/// Items whose predicate fails are logged and left out. Input order is kept.
pub async fn filter_concurrently<T, F, Fut>(items: Vec<T>, concurrency: usize, predicate: F) -> Vec<T>
where
    T: Clone + Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = AppResult<bool>> + Send + 'static,
{
    let predicate = Arc::new(predicate);
    let results = fan_out(items, concurrency, None, move |item: T| {
        let predicate = Arc::clone(&predicate);
        async move {
            let keep = predicate(item.clone()).await?;
            Ok((item, keep))
        }
    })
    .await;

    results
        .into_iter()
        .filter_map(|result| match result {
            Ok((item, keep)) => keep.then_some(item),
            Err(e) => {
                warn!(error = %e, "Dropping item after filter error");
                None
            }
        })
        .collect()
}

fn spawn_all<T, R, F, Fut>(items: Vec<T>, concurrency: usize, f: F) -> JoinSet<(usize, AppResult<R>)>
where
    T: Send + 'static,
    R: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = AppResult<R>> + Send + 'static,
{
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let f = Arc::new(f);
    let mut join_set = JoinSet::new();

    for (index, item) in items.into_iter().enumerate() {
        let semaphore = Arc::clone(&semaphore);
        let f = Arc::clone(&f);
        join_set.spawn(async move {
            let _permit = match semaphore.acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    return (
                        index,
                        Err(AppError::TaskError(format!("Failed to acquire semaphore permit: {e}"))),
                    )
                }
            };
            (index, f(item).await)
        });
    }

    join_set
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_fan_out_keeps_input_order() {
        let items: Vec<u64> = (0..20).collect();
        let results = fan_out(items, 4, None, |n| async move {
            tokio::time::sleep(Duration::from_millis(20 - n)).await;
            Ok(n * 2)
        })
        .await;

        let values: Vec<u64> = results.into_iter().map(Result::unwrap).collect();
        assert_eq!(values, (0..20).map(|n| n * 2).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_fan_out_respects_concurrency() {
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let (r, p) = (running.clone(), peak.clone());
        fan_out((0..32).collect::<Vec<u32>>(), 3, None, move |_| {
            let (running, peak) = (r.clone(), p.clone());
            async move {
                let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                running.fetch_sub(1, Ordering::SeqCst);
                Ok(())
            }
        })
        .await;

        assert!(peak.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn test_fan_out_reports_errors_per_item() {
        let results = fan_out(vec![1, 2, 3], 2, None, |n: i32| async move {
            if n == 2 {
                Err(AppError::NetworkError("boom".into()))
            } else {
                Ok(n)
            }
        })
        .await;

        assert!(results[0].is_ok());
        assert!(results[1].is_err());
        assert!(results[2].is_ok());
    }

    #[tokio::test]
    async fn test_try_fan_out_fails_fast() {
        let finished = Arc::new(AtomicUsize::new(0));
        let counter = finished.clone();

        let result = try_fan_out((0..50).collect::<Vec<u64>>(), 2, None, move |n| {
            let counter = counter.clone();
            async move {
                if n == 0 {
                    return Err(AppError::InvalidInput("bad".into()));
                }
                tokio::time::sleep(Duration::from_millis(50)).await;
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(n)
            }
        })
        .await;

        assert!(matches!(result, Err(AppError::InvalidInput(_))));
        assert!(finished.load(Ordering::SeqCst) < 50);
    }

    #[tokio::test]
    async fn test_filter_concurrently_drops_failures() {
        let kept = filter_concurrently(vec![1, 2, 3, 4, 5, 6], 2, |n: i32| async move {
            if n == 3 {
                Err(AppError::InvalidDocument)
            } else {
                Ok(n % 2 == 1)
            }
        })
        .await;

        assert_eq!(kept, vec![1, 5]);
    }
}
