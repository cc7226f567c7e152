//! Waiting for asynchronous cloud operations
//!
//! The API accepts most changes immediately and applies them in the
//! background. Resources poll the remote state once per second until it
//! settles, bounded by the cancellation and deadline of the operation.

use crate::error::{ClientResultExt, ProviderError, Result};
use cloudbit_client::{ClientError, Order, OrderService, Ordering};
use cloudbit_plugin::OperationContext;
use std::future::Future;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::debug;

pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Status key every entity reports when the backend gave up on it
pub const STATUS_ERROR: &str = "error";

/// Poll `check` until it yields a value.
///
/// The first check runs immediately. An error from `check` ends the wait.
pub async fn wait_for<T, F, Fut>(ctx: &OperationContext, mut check: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>>>,
{
    if let Some(value) = check().await? {
        return Ok(value);
    }

    let mut ticker = tokio::time::interval_at(Instant::now() + POLL_INTERVAL, POLL_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = ctx.done() => {
                return Err(ProviderError::Timeout(
                    "Timeout while waiting for condition".to_string(),
                ));
            }
            _ = ticker.tick() => {}
        }

        if let Some(value) = check().await? {
            return Ok(value);
        }
    }
}

/// Poll `check` until it reports done
pub async fn wait_for_condition<F, Fut>(ctx: &OperationContext, mut check: F) -> Result<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    wait_for(ctx, || {
        let done = check();
        async move { Ok(done.await?.then_some(())) }
    })
    .await
}

/// Wait until the order behind `ordering` is processed
pub async fn wait_for_order(
    ctx: &OperationContext,
    orders: &OrderService<'_>,
    ordering: &Ordering,
) -> Result<Order> {
    let id = ordering.order_id().action("parse order reference")?;
    debug!(order_id = id, "waiting for order");

    let order = wait_for(ctx, move || async move {
        let order = orders.get(id).await.action("get order")?;
        Ok(order.is_done().then_some(order))
    })
    .await?;

    if order.is_failed() {
        return Err(ProviderError::OrderFailed(order.id));
    }
    Ok(order)
}

/// Wait until the status key returned by `fetch` equals `wanted`
pub async fn wait_for_status<F, Fut>(ctx: &OperationContext, wanted: &str, mut fetch: F) -> Result<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<String>>,
{
    wait_for_condition(ctx, || {
        let status = fetch();
        async move {
            let status = status.await?;
            debug!(%status, wanted, "polled status");
            if status == wanted {
                Ok(true)
            } else if status == STATUS_ERROR {
                Err(ProviderError::invalid_state(format!(
                    "entity entered status {:?} while waiting for {:?}",
                    status, wanted
                )))
            } else {
                Ok(false)
            }
        }
    })
    .await
}

/// Wait until `fetch` answers with not found
pub async fn wait_for_deletion<T, F, Fut>(ctx: &OperationContext, mut fetch: F) -> Result<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<T, ClientError>>,
{
    wait_for_condition(ctx, || {
        let response = fetch();
        async move {
            match response.await {
                Ok(_) => Ok(false),
                Err(err) if err.is_not_found() => Ok(true),
                Err(err) => Err(err).action("check deletion"),
            }
        }
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
    use tokio_util::sync::CancellationToken;

    #[tokio::test(start_paused = true)]
    async fn test_immediate_success_does_not_sleep() {
        let start = Instant::now();
        wait_for_condition(&OperationContext::background(), || async { Ok(true) })
            .await
            .unwrap();
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_polls_once_per_second() {
        let calls = Arc::new(AtomicUsize::new(0));
        let start = Instant::now();

        let counter = calls.clone();
        wait_for_condition(&OperationContext::background(), move || {
            let n = counter.fetch_add(1, AtomicOrdering::SeqCst) + 1;
            async move { Ok(n == 4) }
        })
        .await
        .unwrap();

        assert_eq!(calls.load(AtomicOrdering::SeqCst), 4);
        assert_eq!(start.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_stops_polling() {
        let calls = Arc::new(AtomicUsize::new(0));

        let counter = calls.clone();
        let err = wait_for_condition(&OperationContext::background(), move || {
            let n = counter.fetch_add(1, AtomicOrdering::SeqCst) + 1;
            async move {
                if n == 2 {
                    Err(ProviderError::invalid_state("boom"))
                } else {
                    Ok(false)
                }
            }
        })
        .await
        .unwrap_err();

        assert!(matches!(err, ProviderError::InvalidState(_)));
        assert_eq!(calls.load(AtomicOrdering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_times_out() {
        let ctx = OperationContext::background().with_timeout(Duration::from_millis(2500));
        let start = Instant::now();

        let err = wait_for_condition(&ctx, || async { Ok(false) })
            .await
            .unwrap_err();

        assert!(matches!(err, ProviderError::Timeout(_)));
        assert_eq!(err.to_string(), "Timeout while waiting for condition");
        assert_eq!(start.elapsed(), Duration::from_millis(2500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_times_out() {
        let token = CancellationToken::new();
        let ctx = OperationContext::new(token.child_token());

        let cancel = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(10)).await;
            cancel.cancel();
        });

        let err = wait_for_condition(&ctx, || async { Ok(false) })
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Timeout(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_error_aborts() {
        let err = wait_for_status(&OperationContext::background(), "running", || async {
            Ok("error".to_string())
        })
        .await
        .unwrap_err();
        assert!(matches!(err, ProviderError::InvalidState(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deletion_done_on_not_found() {
        let calls = Arc::new(AtomicUsize::new(0));

        let counter = calls.clone();
        wait_for_deletion(&OperationContext::background(), move || {
            let n = counter.fetch_add(1, AtomicOrdering::SeqCst) + 1;
            async move {
                if n < 3 {
                    Ok(())
                } else {
                    Err(ClientError::Api {
                        status: 404,
                        message: "Not Found".to_string(),
                    })
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(calls.load(AtomicOrdering::SeqCst), 3);
    }
}
