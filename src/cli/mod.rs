pub mod daemon_path;
pub mod process;
pub mod render;

use std::{
    env,
    io::{self, IsTerminal},
    path::PathBuf,
};

use anyhow::Result;
use clap::{Parser, Subcommand};
use daemon_path::to_daemon_path;
use process::{kill_previous_daemons, restart_daemon};
use render::{render_checklist, ChecklistView};
use tracing::{debug, level_filters::LevelFilter};

use crate::{
    checklist::{
        entities::ItemId,
        manager::{Checklist, MalformedDataPolicy},
    },
    daemon::{start_daemon, STORE_DIR},
    notification::{
        desktop::DesktopNotifications, ensure_permission_requested, notify, Delivery,
        Notification, NotificationService, Permission,
    },
    store::{file_store::FileStore, KeyValueStore},
    utils::{
        clock::{Clock, DefaultClock},
        dir::create_application_default_path,
        logging::{enable_logging, CLI_PREFIX},
    },
};

#[derive(Parser, Debug)]
#[command(name = "checklist", version, long_about = None)]
#[command(about = "Morning routine checklist with a daily streak", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Option<Commands>,
    #[arg(
        long,
        global = true,
        help = "Application directory. By default tries to save into $XDG_STATE_HOME or $HOME/.local/state"
    )]
    dir: Option<PathBuf>,
    #[arg(long, global = true, help = "Enable logging")]
    log: bool,
    #[arg(
        long = "on-malformed",
        global = true,
        value_enum,
        default_value_t = MalformedDataPolicy::Fail,
        help = "What to do when the saved checklist can't be read"
    )]
    on_malformed: MalformedDataPolicy,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(flatten)]
    Checklist(ChecklistCommand),
    #[command(about = "Manage permission to show reminders")]
    Notifications {
        #[command(subcommand)]
        command: NotificationsCommand,
    },
    #[command(about = "Starts the reminder daemon in the background")]
    Init,
    #[command(about = "Run a reminder session directly in current console. Used for debugging")]
    Serve,
    #[command(about = "Stop currently running reminder daemons.")]
    Stop,
}

/// Commands that work on the saved checklist.
#[derive(Subcommand, Debug)]
enum ChecklistCommand {
    #[command(about = "Show the checklist. This is the default")]
    List,
    #[command(about = "Add a task to the end of the checklist")]
    Add {
        #[arg(required = true, num_args = 1.., help = "Task text, words are joined with spaces")]
        text: Vec<String>,
    },
    #[command(about = "Check or uncheck a task")]
    Toggle { id: ItemId },
    #[command(about = "Remove a task")]
    Remove { id: ItemId },
    #[command(about = "Finish the morning. Extends the streak once a day and unchecks every task")]
    Complete,
    #[command(about = "Send the reminder notification now")]
    Remind,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum NotificationsCommand {
    #[command(about = "Allow reminders")]
    Allow,
    #[command(about = "Never show reminders")]
    Deny,
    #[command(about = "Forget the decision, you will be asked again")]
    Reset,
    #[command(about = "Show the current decision")]
    Status,
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let dir = args.dir.map_or_else(create_application_default_path, |dir| {
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    })?;
    let dir = std::fs::canonicalize(dir)?;

    let logging_level = if args.log {
        Some(LevelFilter::TRACE)
    } else {
        None
    };
    enable_logging(CLI_PREFIX, &dir, logging_level, args.log)?;

    let store = FileStore::new(dir.join(STORE_DIR))?;
    let mut notifications = DesktopNotifications::new(store.clone(), true);
    let command = args
        .commands
        .unwrap_or(Commands::Checklist(ChecklistCommand::List));
    debug!("Running {command:?} in {dir:?}");

    if !matches!(command, Commands::Notifications { .. }) {
        ensure_permission_requested(&mut notifications)?;
    }

    match command {
        Commands::Checklist(command) => process_checklist_command(
            command,
            store,
            Box::new(DefaultClock),
            &mut notifications,
            args.on_malformed,
        ),
        Commands::Notifications { command } => {
            process_notifications_command(command, &mut notifications)
        }
        Commands::Init => {
            let daemon = to_daemon_path(env::current_exe()?);
            restart_daemon(&daemon, &dir)?;
            println!("Reminder daemon started");
            Ok(())
        }
        Commands::Serve => start_daemon(dir).await,
        Commands::Stop => {
            let daemon = to_daemon_path(env::current_exe()?);
            let stopped = kill_previous_daemons(&daemon)?;
            println!("Stopped {stopped} reminder daemon(s)");
            Ok(())
        }
    }
}

fn process_checklist_command<S: KeyValueStore, N: NotificationService + ?Sized>(
    command: ChecklistCommand,
    store: S,
    clock: Box<dyn Clock>,
    notifications: &mut N,
    policy: MalformedDataPolicy,
) -> Result<()> {
    match command {
        ChecklistCommand::List => with_checklist(store, clock, policy, |_| Ok(())),
        ChecklistCommand::Add { text } => with_checklist(store, clock, policy, |checklist| {
            checklist.add(&text.join(" ")).map(|_| ())
        }),
        ChecklistCommand::Toggle { id } => with_checklist(store, clock, policy, |checklist| {
            checklist.toggle(id).map(|_| ())
        }),
        ChecklistCommand::Remove { id } => with_checklist(store, clock, policy, |checklist| {
            checklist.remove(id).map(|_| ())
        }),
        ChecklistCommand::Complete => with_checklist(store, clock, policy, |checklist| {
            if !checklist.all_done() {
                println!("Finish every task before completing the morning");
                return Ok(());
            }
            let completion = checklist.complete_day()?;
            if completion.incremented {
                println!("Streak extended to {} mornings", completion.streak);
            } else {
                println!("Today already counts, streak stays at {}", completion.streak);
            }
            Ok(())
        }),
        ChecklistCommand::Remind => {
            if notify(notifications, &Notification::reminder())? == Delivery::Shown {
                println!("Reminder sent");
            }
            Ok(())
        }
    }
}

/// Loads the checklist, applies `action` and prints the result.
fn with_checklist<S: KeyValueStore>(
    store: S,
    clock: Box<dyn Clock>,
    policy: MalformedDataPolicy,
    action: impl FnOnce(&mut Checklist<S>) -> Result<()>,
) -> Result<()> {
    let mut checklist = Checklist::load(store, clock, policy)?;
    action(&mut checklist)?;

    let view = ChecklistView {
        items: checklist.items(),
        streak: checklist.streak(),
        all_done: checklist.all_done(),
    };
    print!("{}", render_checklist(&view, io::stdout().is_terminal()));
    Ok(())
}

fn process_notifications_command<S: KeyValueStore>(
    command: NotificationsCommand,
    notifications: &mut DesktopNotifications<S>,
) -> Result<()> {
    let permission = match command {
        NotificationsCommand::Allow => Permission::Granted,
        NotificationsCommand::Deny => Permission::Denied,
        NotificationsCommand::Reset => Permission::Undetermined,
        NotificationsCommand::Status => {
            println!("Notifications are {}", notifications.permission()?);
            return Ok(());
        }
    };
    notifications.set_permission(permission)?;
    println!("Notifications are {permission}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use chrono::NaiveDate;
    use clap::{CommandFactory, Parser};

    use crate::{
        checklist::{entities::ChecklistItem, manager::MalformedDataPolicy},
        notification::{MockNotificationService, Notification, Permission},
        store::{memory::MemoryStore, KeyValueStore, ITEMS_KEY, LAST_COMPLETED_KEY, STREAK_KEY},
        utils::clock::ManualClock,
    };

    use super::{process_checklist_command, Args, ChecklistCommand, Commands};

    fn morning() -> Box<ManualClock> {
        Box::new(ManualClock::at(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            7,
            15,
        ))
    }

    fn silent_notifications() -> MockNotificationService {
        let mut notifications = MockNotificationService::new();
        notifications.expect_display().never();
        notifications
    }

    #[test]
    fn test_args_are_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_add_joins_later() {
        let args = Args::parse_from([
            "checklist",
            "add",
            "Pack",
            "lunch",
            "--on-malformed",
            "defaults",
        ]);
        assert_eq!(args.on_malformed, MalformedDataPolicy::Defaults);
        let Some(Commands::Checklist(ChecklistCommand::Add { text })) = args.commands else {
            panic!("expected add");
        };
        assert_eq!(text.join(" "), "Pack lunch");
    }

    #[test]
    fn test_list_is_default() {
        let args = Args::parse_from(["checklist", "--dir", "/tmp/checklist"]);
        assert!(args.commands.is_none());
        assert_eq!(args.on_malformed, MalformedDataPolicy::Fail);
    }

    #[test]
    fn test_complete_with_unchecked_item_changes_nothing() -> Result<()> {
        let items = serde_json::to_string(&[
            ChecklistItem::new(1, "Get washed").toggled(),
            ChecklistItem::new(2, "Bag"),
        ])?;
        let mut store = MemoryStore::with_slots([(ITEMS_KEY, items.as_str()), (STREAK_KEY, "3")]);

        process_checklist_command(
            ChecklistCommand::Complete,
            &mut store,
            morning(),
            &mut silent_notifications(),
            MalformedDataPolicy::Fail,
        )?;

        assert_eq!(store.get(ITEMS_KEY)?, Some(items));
        assert_eq!(store.get(STREAK_KEY)?.as_deref(), Some("3"));
        assert_eq!(store.get(LAST_COMPLETED_KEY)?, None);
        Ok(())
    }

    #[test]
    fn test_complete_when_all_done_extends_streak() -> Result<()> {
        let items = serde_json::to_string(&[ChecklistItem::new(1, "Bag").toggled()])?;
        let mut store = MemoryStore::with_slots([(ITEMS_KEY, items.as_str()), (STREAK_KEY, "3")]);

        process_checklist_command(
            ChecklistCommand::Complete,
            &mut store,
            morning(),
            &mut silent_notifications(),
            MalformedDataPolicy::Fail,
        )?;

        assert_eq!(store.get(STREAK_KEY)?.as_deref(), Some("4"));
        assert_eq!(
            store.get(LAST_COMPLETED_KEY)?.as_deref(),
            Some("Mon Jan 01 2024")
        );
        assert_eq!(
            store.get(ITEMS_KEY)?.as_deref(),
            Some(r#"[{"id":1,"text":"Bag","done":false}]"#)
        );
        Ok(())
    }

    #[test]
    fn test_remind_denied_never_displays() -> Result<()> {
        let mut store = MemoryStore::new();
        let mut notifications = silent_notifications();
        notifications
            .expect_permission()
            .returning(|| Ok(Permission::Denied));

        process_checklist_command(
            ChecklistCommand::Remind,
            &mut store,
            morning(),
            &mut notifications,
            MalformedDataPolicy::Fail,
        )?;

        assert_eq!(store.get(ITEMS_KEY)?, None);
        Ok(())
    }

    #[test]
    fn test_remind_granted_displays_reminder() -> Result<()> {
        let mut notifications = MockNotificationService::new();
        notifications
            .expect_permission()
            .returning(|| Ok(Permission::Granted));
        notifications
            .expect_display()
            .withf(|n| *n == Notification::reminder())
            .times(1)
            .returning(|_| Ok(()));

        process_checklist_command(
            ChecklistCommand::Remind,
            MemoryStore::new(),
            morning(),
            &mut notifications,
            MalformedDataPolicy::Fail,
        )
    }
}
