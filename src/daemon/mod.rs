use std::path::PathBuf;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::{
    notification::{
        desktop::DesktopNotifications, ensure_permission_requested, NotificationService,
    },
    store::file_store::FileStore,
    utils::clock::{Clock, DefaultClock},
};

use reminder::{ReminderOutcome, ReminderScheduler};

pub mod args;
pub mod reminder;
pub mod shutdown;

/// Store directory inside the application directory.
pub const STORE_DIR: &str = "store";

/// Represents the starting point for a reminder session.
pub async fn start_daemon(dir: PathBuf) -> Result<()> {
    let dir = std::fs::canonicalize(&dir)
        .with_context(|| format!("Application directory {dir:?} is not accessible"))?;
    std::env::set_current_dir("/")?;

    let store = FileStore::new(dir.join(STORE_DIR))?;
    let notifications = DesktopNotifications::new(store, false);

    let shutdown_token = CancellationToken::new();

    let outcome = run_session(notifications, DefaultClock, shutdown_token).await?;
    info!("Session finished: {outcome:?}");
    Ok(())
}

/// Requests permission, arms the reminder and keeps the session alive until the reminder is
/// idle or the process is asked to stop.
async fn run_session(
    mut notifications: impl NotificationService,
    clock: impl Clock,
    shutdown_token: CancellationToken,
) -> Result<ReminderOutcome> {
    let permission = ensure_permission_requested(&mut notifications)?;
    info!("Notification permission is {permission}");

    let mut scheduler =
        ReminderScheduler::new(notifications, Box::new(clock), shutdown_token.clone());

    let (_, outcome) = tokio::join!(
        shutdown::detect_shutdown(shutdown_token.clone()),
        async {
            let outcome = scheduler.run().await;
            // An idle scheduler ends the session.
            shutdown_token.cancel();
            outcome
        },
    );

    outcome.inspect_err(|e| error!("Reminder module got an error {e:?}"))
}
