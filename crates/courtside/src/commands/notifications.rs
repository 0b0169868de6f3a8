//! Notification inbox command handlers.

use serde::Serialize;
use tabled::Tabled;

use courtside_core::notify::HttpNotificationRepository;
use courtside_core::{
    CoreError, EngineConfig, Notification, NotificationQuery, NotificationRepository,
    NotificationType,
};

use crate::cli::{GlobalOpts, NotificationsArgs, NotificationsCommand, OutputFormat};
use crate::error::CliError;
use crate::output::{self, Printable};

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct NotificationRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Message")]
    message: String,
    #[tabled(rename = "Read")]
    read: String,
    #[tabled(rename = "Created")]
    created: String,
}

impl From<&Notification> for NotificationRow {
    fn from(n: &Notification) -> Self {
        Self {
            id: n.id.clone(),
            kind: n.kind.to_string(),
            title: n.title.clone(),
            message: n.message.clone(),
            read: if n.read { "✓".into() } else { String::new() },
            created: n.created_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

/// One page of the inbox.
#[derive(Serialize)]
#[serde(transparent)]
struct Inbox<'a>(&'a [Notification]);

impl Printable for Inbox<'_> {
    fn human(&self) -> String {
        output::table(
            self.0.iter().map(NotificationRow::from).collect(),
            "No notifications",
        )
    }

    fn plain(&self) -> String {
        self.0
            .iter()
            .map(|n| {
                let state = if n.read { "read" } else { "unread" };
                format!("{}\t{state}\t{}", n.id, n.title)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Serialize)]
struct UnreadCount {
    unread: u64,
}

impl Printable for UnreadCount {
    fn human(&self) -> String {
        format!("Unread: {}", self.unread)
    }

    fn plain(&self) -> String {
        self.unread.to_string()
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    args: NotificationsArgs,
    config: &EngineConfig,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let repo = HttpNotificationRepository::from_config(config)?;
    let user = config.user_id.as_str();

    match args.command {
        NotificationsCommand::List {
            limit,
            offset,
            kind,
            unread,
        } => {
            let query = NotificationQuery {
                limit,
                offset,
                kind: kind.as_deref().map(parse_kind).transpose()?,
                read: unread.then_some(false),
            };
            let page = repo.list(user, &query).await?;

            let out = output::render(&global.output, &Inbox(&page.items));
            output::print_output(&out, global.quiet);

            if page.has_more && matches!(global.output, OutputFormat::Table) && !global.quiet {
                let next = offset.saturating_add(u32::try_from(page.items.len()).unwrap_or(u32::MAX));
                eprintln!("More available: --offset {next}");
            }
            Ok(())
        }

        NotificationsCommand::Unread => {
            let count = UnreadCount {
                unread: repo.unread_count(user).await?,
            };
            output::print_output(&output::render(&global.output, &count), global.quiet);
            Ok(())
        }

        NotificationsCommand::Read { id } => {
            repo.mark_read(&id).await.map_err(|e| not_found(e, &id))?;
            output::print_output(&format!("Marked {id} as read"), global.quiet);
            Ok(())
        }

        NotificationsCommand::ReadAll => {
            repo.mark_all_read(user).await?;
            output::print_output("Marked all notifications as read", global.quiet);
            Ok(())
        }

        NotificationsCommand::Delete { id } => {
            repo.delete(&id).await.map_err(|e| not_found(e, &id))?;
            output::print_output(&format!("Deleted {id}"), global.quiet);
            Ok(())
        }

        NotificationsCommand::Clear { yes } => {
            if !yes {
                return Err(CliError::ConfirmationRequired {
                    action: "notifications clear".into(),
                });
            }
            repo.delete_all(user).await?;
            output::print_output("Deleted all notifications", global.quiet);
            Ok(())
        }
    }
}

fn parse_kind(raw: &str) -> Result<NotificationType, CliError> {
    raw.parse().map_err(|_| CliError::Validation {
        field: "type".into(),
        reason: format!("expected system, alert, info or update, got '{raw}'"),
    })
}

/// Name the notification when the store reports a miss.
fn not_found(err: CoreError, id: &str) -> CliError {
    match err {
        CoreError::NotFound { .. } => CliError::NotFound {
            resource_type: "notification".into(),
            identifier: id.into(),
            list_command: "notifications list".into(),
        },
        other => other.into(),
    }
}
