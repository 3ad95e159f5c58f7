use tokio::signal::unix::{signal, SignalKind};
use tokio_util::sync::CancellationToken;

/// Install a handler for SIGTERM and SIGINT.
///
/// Returns a `CancellationToken` that is cancelled once either signal
/// arrives. The coordinator loops watch this token and finish their current
/// pass before exiting.
pub fn install_shutdown_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();

    tokio::spawn(async move {
        let mut sigterm =
            signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        let mut sigint = signal(SignalKind::interrupt()).expect("failed to install SIGINT handler");

        tokio::select! {
            _ = sigterm.recv() => {
                tracing::info!("Received SIGTERM, shutting down coordinator");
            }
            _ = sigint.recv() => {
                tracing::info!("Received SIGINT, shutting down coordinator");
            }
        }

        trigger.cancel();
    });

    token
}
