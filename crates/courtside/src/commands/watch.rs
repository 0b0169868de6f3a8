//! `watch`: run the engine against the live feed until Ctrl-C.

use owo_colors::OwoColorize;

use courtside_core::{Channels, ConnectionState, Engine, EngineConfig, InboundMessage};

use super::console::{ConsoleToast, TerminalBell};
use crate::cli::{GlobalOpts, WatchArgs};
use crate::error::CliError;
use crate::output;

pub async fn handle(
    args: WatchArgs,
    config: &EngineConfig,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let color = output::should_color(&global.color);

    let mut channels = Channels::default().with_toast(ConsoleToast::new(color, global.quiet));
    if !args.no_sound {
        channels = channels.with_sound(TerminalBell);
    }

    let engine = Engine::connect(config, channels).await?;
    if !global.quiet {
        eprintln!(
            "Watching {} as {} (Ctrl-C to stop)",
            config.ws_url, config.user_id
        );
    }

    let mut state = engine.connection_state();
    let echo = !args.topics.is_empty();
    let mut feed = engine.raw_feed(args.topics);

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut gave_up = false;
    loop {
        tokio::select! {
            biased;

            _ = &mut ctrl_c => break,

            changed = state.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = *state.borrow_and_update();
                if let Some(line) = indicator(current, color) {
                    if !global.quiet {
                        eprintln!("{line}");
                    }
                }
                if current == ConnectionState::Failed {
                    gave_up = true;
                    break;
                }
            }

            Some(msg) = feed.recv(), if echo => {
                output::print_output(&echo_line(&msg), global.quiet);
            }
        }
    }

    engine.shutdown().await;

    if gave_up {
        return Err(CliError::ConnectionFailed {
            url: config.ws_url.to_string(),
            source: "reconnection attempts exhausted".into(),
        });
    }
    Ok(())
}

/// Status line for a connection state change; `None` for states not shown.
fn indicator(state: ConnectionState, color: bool) -> Option<String> {
    let line = match state {
        ConnectionState::Connecting => return None,
        ConnectionState::Connected => {
            let text = "● Live";
            if color { text.green().to_string() } else { text.to_owned() }
        }
        ConnectionState::Reconnecting { attempt } => {
            let text = format!("◌ Reconnecting (attempt {attempt})");
            if color { text.yellow().to_string() } else { text }
        }
        ConnectionState::Disconnected | ConnectionState::Failed => {
            let text = "○ Offline";
            if color { text.red().to_string() } else { text.to_owned() }
        }
    };
    Some(line)
}

/// One line per raw message: time, topic and payload kind.
fn echo_line(msg: &InboundMessage) -> String {
    format!(
        "{}  {}  {}",
        msg.received_at.format("%H:%M:%S"),
        msg.topic,
        msg.payload.kind()
    )
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use courtside_core::Payload;

    use super::*;

    #[test]
    fn indicator_shows_offline_and_reconnecting() {
        assert_eq!(indicator(ConnectionState::Connecting, false), None);
        assert_eq!(
            indicator(ConnectionState::Reconnecting { attempt: 3 }, false).as_deref(),
            Some("◌ Reconnecting (attempt 3)")
        );
        assert_eq!(
            indicator(ConnectionState::Failed, false).as_deref(),
            Some("○ Offline")
        );
        assert_eq!(
            indicator(ConnectionState::Connected, false).as_deref(),
            Some("● Live")
        );
    }

    #[test]
    fn echo_line_names_topic_and_kind() {
        let msg = InboundMessage {
            topic: "game/7".into(),
            payload: serde_json::from_value::<Payload>(serde_json::json!({
                "type": "system_notification",
                "message": "Feed delayed"
            }))
            .unwrap(),
            received_at: chrono::DateTime::parse_from_rfc3339("2024-03-01T19:05:09Z")
                .unwrap()
                .with_timezone(&chrono::Utc),
        };
        assert_eq!(echo_line(&msg), "19:05:09  game/7  system_notification");
    }
}
