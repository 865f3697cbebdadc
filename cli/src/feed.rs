//! Game events typed on stdin, one per line.
//!
//! ```text
//! map 50
//! name "Sir Bones"
//! spec 64 Necromancer
//! commander on
//! combat off
//! ```

use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser, Subcommand};
use stream_out_core::GameEvent;
use tokio::sync::broadcast;

#[derive(Parser)]
#[command(about = "game event")]
struct FeedLine {
    #[command(subcommand)]
    command: FeedCommand,
}

#[derive(Subcommand)]
enum FeedCommand {
    /// Current map id
    Map { id: i64 },
    /// Character name
    Name { name: String },
    /// Specialization id and profession
    Spec {
        id: i64,
        #[arg(default_value = "")]
        profession: String,
    },
    Commander {
        #[arg(action = ArgAction::Set, value_parser = BoolishValueParser::new())]
        on: bool,
    },
    Catmander {
        #[arg(action = ArgAction::Set, value_parser = BoolishValueParser::new())]
        on: bool,
    },
    Combat {
        #[arg(action = ArgAction::Set, value_parser = BoolishValueParser::new())]
        on: bool,
    },
}

impl From<FeedCommand> for GameEvent {
    fn from(command: FeedCommand) -> Self {
        match command {
            FeedCommand::Map { id } => GameEvent::MapChanged(id),
            FeedCommand::Name { name } => GameEvent::NameChanged(name),
            FeedCommand::Spec { id, profession } => GameEvent::SpecializationChanged {
                specialization: id,
                profession,
            },
            FeedCommand::Commander { on } => GameEvent::CommanderChanged(on),
            FeedCommand::Catmander { on } => GameEvent::CatmanderTagChanged(on),
            FeedCommand::Combat { on } => GameEvent::CombatChanged(on),
        }
    }
}

/// Parse one input line. Blank lines yield `None`.
pub fn parse_line(line: &str) -> Result<Option<GameEvent>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let mut args = shlex::split(line).ok_or("error: Invalid quoting")?;
    args.insert(0, "event".to_string());
    let parsed = FeedLine::try_parse_from(args).map_err(|e| e.to_string())?;
    Ok(Some(parsed.command.into()))
}

/// Forward stdin lines to `events` until stdin closes.
///
/// Runs on a plain thread: a blocked stdin read must not hold up runtime shutdown.
pub fn spawn_stdin_feed(events: broadcast::Sender<GameEvent>) {
    std::thread::spawn(move || {
        for line in std::io::stdin().lines() {
            let Ok(line) = line else { break };
            match parse_line(&line) {
                Ok(Some(event)) => {
                    tracing::debug!(kind = event.kind(), "Game event");
                    if events.send(event).is_err() {
                        break;
                    }
                }
                Ok(None) => {}
                Err(e) => eprintln!("{e}"),
            }
        }
        tracing::debug!("Event feed closed");
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_event_lines() {
        assert_eq!(parse_line("map 50"), Ok(Some(GameEvent::MapChanged(50))));
        assert_eq!(
            parse_line(r#"name "Sir Bones""#),
            Ok(Some(GameEvent::NameChanged("Sir Bones".into())))
        );
        assert_eq!(
            parse_line("spec 64 Necromancer"),
            Ok(Some(GameEvent::SpecializationChanged {
                specialization: 64,
                profession: "Necromancer".into()
            }))
        );
        assert_eq!(
            parse_line("spec 0"),
            Ok(Some(GameEvent::SpecializationChanged {
                specialization: 0,
                profession: String::new()
            }))
        );
        assert_eq!(parse_line("commander on"), Ok(Some(GameEvent::CommanderChanged(true))));
        assert_eq!(parse_line("combat false"), Ok(Some(GameEvent::CombatChanged(false))));
        assert_eq!(parse_line("catmander yes"), Ok(Some(GameEvent::CatmanderTagChanged(true))));
    }

    #[test]
    fn test_feed_definition_is_valid() {
        use clap::CommandFactory;
        FeedLine::command().debug_assert();
    }

    #[test]
    fn test_toggle_events_take_boolish_values() {
        assert_eq!(parse_line("commander off"), Ok(Some(GameEvent::CommanderChanged(false))));
        assert_eq!(parse_line("catmander 0"), Ok(Some(GameEvent::CatmanderTagChanged(false))));
        assert_eq!(parse_line("combat true"), Ok(Some(GameEvent::CombatChanged(true))));
        assert!(parse_line("combat").is_err());
        assert!(parse_line("commander maybe").is_err());
    }

    #[test]
    fn test_blank_and_invalid_lines() {
        assert_eq!(parse_line("   "), Ok(None));
        assert!(parse_line("map").is_err());
        assert!(parse_line("map fifty").is_err());
        assert!(parse_line("teleport 5").is_err());
        assert!(parse_line(r#"name "unterminated"#).is_err());
    }
}
