//! Permission gated notifications. Anything that wants to reach the user goes through [notify],
//! which only displays when the [NotificationService] reports [Permission::Granted].

pub mod desktop;

use std::{fmt::Display, str::FromStr};

use anyhow::{anyhow, Result};
#[cfg(test)]
use mockall::automock;
use tracing::{debug, info};

pub const REMINDER_TITLE: &str = "Morning Checklist";
pub const REMINDER_BODY: &str = "Have you finished your morning routine?";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Granted,
    Denied,
    /// The user hasn't decided yet.
    Undetermined,
}

impl Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Permission::Granted => write!(f, "granted"),
            Permission::Denied => write!(f, "denied"),
            Permission::Undetermined => write!(f, "undetermined"),
        }
    }
}

impl FromStr for Permission {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "granted" => Ok(Permission::Granted),
            "denied" => Ok(Permission::Denied),
            "" | "undetermined" | "default" => Ok(Permission::Undetermined),
            other => Err(anyhow!("Unknown notification permission {other:?}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub body: String,
}

impl Notification {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }

    /// The morning routine reminder.
    pub fn reminder() -> Self {
        Self::new(REMINDER_TITLE, REMINDER_BODY)
    }
}

/// What happened to a notification passed to [notify].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Shown,
    Denied,
    Undetermined,
}

/// Contract platform notifiers implement. Calls are treated as immediate.
#[cfg_attr(test, automock)]
pub trait NotificationService {
    fn permission(&self) -> Result<Permission>;

    /// Asks for permission if it hasn't been decided yet and returns the resulting state.
    fn request_permission(&mut self) -> Result<Permission>;

    /// Shows the notification unconditionally. Use [notify] instead.
    fn display(&mut self, notification: &Notification) -> Result<()>;
}

/// Shows `notification` if and only if the service holds a granted permission.
pub fn notify<N: NotificationService + ?Sized>(
    service: &mut N,
    notification: &Notification,
) -> Result<Delivery> {
    match service.permission()? {
        Permission::Granted => {
            service.display(notification)?;
            info!("Displayed notification {:?}", notification.title);
            Ok(Delivery::Shown)
        }
        Permission::Denied => {
            debug!("Notifications are denied, skipping {:?}", notification.title);
            Ok(Delivery::Denied)
        }
        Permission::Undetermined => {
            debug!(
                "Notification permission is undetermined, skipping {:?}",
                notification.title
            );
            Ok(Delivery::Undetermined)
        }
    }
}

/// Requests permission once, unless it's already granted.
pub fn ensure_permission_requested<N: NotificationService + ?Sized>(
    service: &mut N,
) -> Result<Permission> {
    match service.permission()? {
        Permission::Granted => Ok(Permission::Granted),
        _ => service.request_permission(),
    }
}
