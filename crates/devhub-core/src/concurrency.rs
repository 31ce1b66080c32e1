//! Bounded fan-out with fail-fast cancellation.
//!
//! [`parallel_map`] is the one place where the services spread work over
//! several tasks: batch access checks, username resolution for allow-lists,
//! and the orphaned-blob sweep all go through it.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::error::AppError;
use crate::result::AppResult;

/// Run `f` over every item with at most `limit` calls in flight.
///
/// Results come back in input order regardless of completion order. The
/// first `Err` cancels every other call (running calls are dropped at their
/// next await point, waiting ones never start) and is returned as the
/// overall result; errors that arrive afterwards are discarded. Side effects
/// of calls that already finished are not undone.
pub async fn parallel_map<T, R, F, Fut>(items: Vec<T>, limit: usize, f: F) -> AppResult<Vec<R>>
where
    T: Send + 'static,
    R: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = AppResult<R>> + Send + 'static,
{
    if items.is_empty() {
        return Ok(Vec::new());
    }

    let total = items.len();
    let semaphore = Arc::new(Semaphore::new(limit.max(1)));
    let cancel = CancellationToken::new();
    let f = Arc::new(f);
    let mut tasks = JoinSet::new();

    for (index, item) in items.into_iter().enumerate() {
        let semaphore = Arc::clone(&semaphore);
        let cancel = cancel.clone();
        let f = Arc::clone(&f);

        tasks.spawn(async move {
            let permit = tokio::select! {
                biased;
                _ = cancel.cancelled() => return (index, Ok(None)),
                permit = semaphore.acquire_owned() => permit,
            };
            let Ok(_permit) = permit else {
                return (index, Ok(None));
            };

            let call = (*f)(item);
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => Ok(None),
                result = call => result.map(Some),
            };
            (index, outcome)
        });
    }

    let mut results: Vec<Option<R>> = (0..total).map(|_| None).collect();

    while let Some(joined) = tasks.join_next().await {
        let failure = match joined {
            Ok((index, Ok(Some(value)))) => {
                if let Some(slot) = results.get_mut(index) {
                    *slot = Some(value);
                }
                continue;
            }
            Ok((_, Ok(None))) => continue,
            Ok((_, Err(err))) => err,
            Err(join_err) => AppError::internal(format!("Fan-out task failed: {join_err}")),
        };

        cancel.cancel();
        tasks.abort_all();
        return Err(failure);
    }

    results
        .into_iter()
        .map(|slot| slot.ok_or_else(|| AppError::internal("Fan-out task produced no result")))
        .collect()
}

/// Await `fut` for at most `deadline`, mapping an overrun to `ServiceUnavailable`.
pub async fn with_deadline<T, Fut>(deadline: Duration, what: &str, fut: Fut) -> AppResult<T>
where
    Fut: Future<Output = AppResult<T>>,
{
    match tokio::time::timeout(deadline, fut).await {
        Ok(result) => result,
        Err(_) => Err(AppError::service_unavailable(format!("{what} timed out"))),
    }
}
