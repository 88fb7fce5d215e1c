use std::future::Future;

use tokio::task::JoinSet;
use tracing::debug;

/// Why a [`fan_out`] did not produce a full result set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FanOutError<I, E> {
    /// The operation for `input` failed. Remaining operations were aborted.
    Failed { input: I, error: E },
    /// A task panicked or was cancelled before reporting.
    Panicked(String),
}

/// Run `op` for every input concurrently and join all of them.
///
/// Results come back in input order. The join is a barrier: either every
/// operation succeeds, or the first failure observed aborts the tasks still
/// running and is returned. Nothing is retried.
pub async fn fan_out<I, T, E, F, Fut>(inputs: Vec<I>, op: F) -> Result<Vec<T>, FanOutError<I, E>>
where
    I: Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
    F: Fn(&I) -> Fut,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
{
    let width = inputs.len();
    let mut set = JoinSet::new();
    for (position, input) in inputs.into_iter().enumerate() {
        let call = op(&input);
        set.spawn(async move { (position, input, call.await) });
    }

    let mut results: Vec<Option<T>> = (0..width).map(|_| None).collect();
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok((position, _, Ok(value))) => results[position] = Some(value),
            Ok((_, input, Err(error))) => {
                set.abort_all();
                debug!(width, "fan-out aborted on first failure");
                return Err(FanOutError::Failed { input, error });
            }
            Err(join_error) => {
                set.abort_all();
                return Err(FanOutError::Panicked(join_error.to_string()));
            }
        }
    }

    Ok(results.into_iter().flatten().collect())
}
