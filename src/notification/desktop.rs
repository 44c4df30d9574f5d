#[cfg(unix)]
use std::process::Command;
use std::io::{self, BufRead, IsTerminal, Write};

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::store::{KeyValueStore, NOTIFICATION_PERMISSION_KEY};

use super::{Notification, NotificationService, Permission};

/// Desktop notifier. The permission decision lives in the store next to the checklist, the
/// notification itself is handed to the notifier of the platform.
pub struct DesktopNotifications<S: KeyValueStore> {
    store: S,
    interactive: bool,
}

impl<S: KeyValueStore> DesktopNotifications<S> {
    /// `interactive` allows asking the user on the terminal. The daemon never asks.
    pub fn new(store: S, interactive: bool) -> Self {
        Self { store, interactive }
    }

    /// Records a decision. [Permission::Undetermined] clears it.
    pub fn set_permission(&mut self, permission: Permission) -> Result<()> {
        let value = match permission {
            Permission::Undetermined => String::new(),
            decided => decided.to_string(),
        };
        self.store.set(NOTIFICATION_PERMISSION_KEY, &value)?;
        info!("Notification permission set to {permission}");
        Ok(())
    }
}

impl<S: KeyValueStore> NotificationService for DesktopNotifications<S> {
    fn permission(&self) -> Result<Permission> {
        match self.store.get(NOTIFICATION_PERMISSION_KEY)? {
            Some(value) => value.parse().or_else(|e| {
                warn!("Treating stored permission as undetermined: {e}");
                Ok(Permission::Undetermined)
            }),
            None => Ok(Permission::Undetermined),
        }
    }

    fn request_permission(&mut self) -> Result<Permission> {
        let current = self.permission()?;
        if current != Permission::Undetermined {
            return Ok(current);
        }
        if !self.interactive || !io::stdin().is_terminal() {
            info!("Notification permission is undetermined, run `checklist notifications allow` to enable reminders");
            return Ok(Permission::Undetermined);
        }

        let answer = ask_permission(&mut io::stdin().lock(), &mut io::stdout())?;
        if answer != Permission::Undetermined {
            self.set_permission(answer)?;
        }
        Ok(answer)
    }

    fn display(&mut self, notification: &Notification) -> Result<()> {
        show_platform_notification(notification)
    }
}

/// Asks a yes/no question. Anything else leaves the decision open.
pub fn ask_permission(input: &mut impl BufRead, output: &mut impl Write) -> Result<Permission> {
    write!(output, "Allow Morning Checklist to show reminders? [y/n] ")?;
    output.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;
    let permission = match line.trim().to_lowercase().as_str() {
        "y" | "yes" => Permission::Granted,
        "n" | "no" => Permission::Denied,
        _ => Permission::Undetermined,
    };
    debug!("User answered {line:?}, permission {permission}");
    Ok(permission)
}

fn show_platform_notification(notification: &Notification) -> Result<()> {
    cfg_if::cfg_if! {
        if #[cfg(target_os = "macos")] {
            let script = format!(
                "display notification \"{}\" with title \"{}\"",
                escape_apple_script(&notification.body),
                escape_apple_script(&notification.title),
            );
            let mut command = Command::new("osascript");
            command.args(["-e", &script]);
            run_notifier(command)
        } else if #[cfg(unix)] {
            let mut command = Command::new("notify-send");
            command.args([
                "--app-name",
                super::REMINDER_TITLE,
                &notification.title,
                &notification.body,
            ]);
            run_notifier(command)
        } else {
            println!("{}: {}", notification.title, notification.body);
            Ok(())
        }
    }
}

#[cfg(unix)]
fn run_notifier(mut command: Command) -> Result<()> {
    use anyhow::{bail, Context};

    debug!("Running notifier {command:?}");
    let status = command
        .status()
        .with_context(|| format!("Failed to start notifier {:?}", command.get_program()))?;
    if !status.success() {
        bail!("Notifier {:?} exited with {status}", command.get_program());
    }
    Ok(())
}

#[cfg(target_os = "macos")]
fn escape_apple_script(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use anyhow::Result;

    use crate::{
        notification::{NotificationService, Permission},
        store::{memory::MemoryStore, KeyValueStore, NOTIFICATION_PERMISSION_KEY},
    };

    use super::{ask_permission, DesktopNotifications};

    #[test]
    fn test_permission_starts_undetermined() -> Result<()> {
        let notifications = DesktopNotifications::new(MemoryStore::new(), false);
        assert_eq!(notifications.permission()?, Permission::Undetermined);
        Ok(())
    }

    #[test]
    fn test_set_permission_is_stored() -> Result<()> {
        let mut store = MemoryStore::new();
        {
            let mut notifications = DesktopNotifications::new(&mut store, false);
            notifications.set_permission(Permission::Granted)?;
            assert_eq!(notifications.permission()?, Permission::Granted);
        }
        assert_eq!(store.get(NOTIFICATION_PERMISSION_KEY)?.as_deref(), Some("granted"));

        let mut notifications = DesktopNotifications::new(&mut store, false);
        notifications.set_permission(Permission::Undetermined)?;
        assert_eq!(notifications.permission()?, Permission::Undetermined);
        Ok(())
    }

    #[test]
    fn test_request_keeps_decision() -> Result<()> {
        let store = MemoryStore::with_slots([(NOTIFICATION_PERMISSION_KEY, "denied")]);
        let mut notifications = DesktopNotifications::new(store, true);
        assert_eq!(notifications.request_permission()?, Permission::Denied);
        Ok(())
    }

    #[test]
    fn test_request_without_terminal_stays_undetermined() -> Result<()> {
        let mut store = MemoryStore::new();
        let mut notifications = DesktopNotifications::new(&mut store, false);

        assert_eq!(notifications.request_permission()?, Permission::Undetermined);
        drop(notifications);
        assert_eq!(store.get(NOTIFICATION_PERMISSION_KEY)?, None);
        Ok(())
    }

    #[test]
    fn test_garbage_permission_is_undetermined() -> Result<()> {
        let store = MemoryStore::with_slots([(NOTIFICATION_PERMISSION_KEY, "sometimes")]);
        let notifications = DesktopNotifications::new(store, false);
        assert_eq!(notifications.permission()?, Permission::Undetermined);
        Ok(())
    }

    #[test]
    fn test_ask_permission_answers() -> Result<()> {
        let mut output = Vec::new();
        assert_eq!(
            ask_permission(&mut Cursor::new("y\n"), &mut output)?,
            Permission::Granted
        );
        assert_eq!(
            ask_permission(&mut Cursor::new("No\n"), &mut Vec::new())?,
            Permission::Denied
        );
        assert_eq!(
            ask_permission(&mut Cursor::new(""), &mut Vec::new())?,
            Permission::Undetermined
        );
        assert!(String::from_utf8(output)?.contains("[y/n]"));
        Ok(())
    }
}
