use tokio::select;
use tokio_util::sync::CancellationToken;

/// Detects signals sent to the process and ends the session. Returns early if the session ends
/// on its own.
///
/// On Windows detached processes can't detect signals sent to them, so there `checklist stop`
/// terminates the process instead.
pub async fn detect_shutdown(cancelation: CancellationToken) {
    select! {
        _ = tokio::signal::ctrl_c() => {
            cancelation.cancel();
        },
        _ = cancelation.cancelled() => (),
    };
}
