use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Sleep for `duration` unless `token` fires first. Returns `false` when
/// cancelled. A token that is already cancelled always wins, even for a zero
/// duration.
pub(crate) async fn sleep_or_cancel(token: &CancellationToken, duration: Duration) -> bool {
    tokio::select! {
        biased;
        _ = token.cancelled() => false,
        _ = tokio::time::sleep(duration) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cancelled_token_wins() {
        let token = CancellationToken::new();
        token.cancel();
        assert!(!sleep_or_cancel(&token, Duration::ZERO).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sleep_completes() {
        let token = CancellationToken::new();
        assert!(sleep_or_cancel(&token, Duration::from_secs(30)).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_sleep() {
        let token = CancellationToken::new();
        let child = token.clone();
        let waiter = tokio::spawn(async move {
            sleep_or_cancel(&child, Duration::from_secs(3600)).await
        });
        tokio::task::yield_now().await;
        token.cancel();
        assert!(!waiter.await.unwrap());
    }
}
