//! Supervision of the notification listener.

use std::future::Future;

use futures_util::Stream;
use messaging::NotificationListener;
use thiserror::Error;

/// Why the listener stopped when it should not have.
#[derive(Debug, Error)]
pub enum ListenError {
    #[error("order event stream closed")]
    StreamClosed,

    #[error("failed to wait for shutdown signal: {0}")]
    Signal(#[from] std::io::Error),
}

/// Feeds `payloads` to `listener` until `shutdown` resolves.
///
/// The subscription is meant to outlive the process, so the stream
/// ending first is an error.
pub async fn listen_until<S, F>(
    listener: &mut NotificationListener,
    payloads: S,
    shutdown: F,
) -> Result<(), ListenError>
where
    S: Stream<Item = String> + Unpin,
    F: Future<Output = std::io::Result<()>>,
{
    tokio::select! {
        () = listener.run(payloads) => {
            tracing::error!("order event stream closed");
            Err(ListenError::StreamClosed)
        }
        result = shutdown => {
            result?;
            tracing::info!("received SIGINT, stopping notifier");
            Ok(())
        }
    }
}
