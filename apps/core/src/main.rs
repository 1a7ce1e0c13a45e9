// Assistant CLI Entry Point
// Reads utterances from stdin, prints each SmartResponse as JSON on stdout

use anyhow::{anyhow, bail, Context};
use assistant_core::logging::init_tracing;
use assistant_core::models::PreferencesUpdate;
use assistant_core::{EngineConfig, GenerationOutcome, Orchestrator};
use serde::de::DeserializeOwned;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};
use uuid::Uuid;

enum Command {
    Utterance(String),
    Reset,
    Prefs(PreferencesUpdate),
    Memory,
    Quit,
}

fn parse_enum<T: DeserializeOwned>(key: &str, value: &str) -> anyhow::Result<T> {
    serde_json::from_value(serde_json::Value::String(value.to_lowercase()))
        .with_context(|| format!("invalid value for {}: {}", key, value))
}

fn parse_prefs(args: &str) -> anyhow::Result<PreferencesUpdate> {
    let mut update = PreferencesUpdate::default();
    for pair in args.split_whitespace() {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| anyhow!("expected key=value, got {}", pair))?;
        match key {
            "verbosity" => update.verbosity = Some(parse_enum(key, value)?),
            "level" | "technical_level" => update.technical_level = Some(parse_enum(key, value)?),
            "style" | "communication_style" => update.communication_style = Some(parse_enum(key, value)?),
            "tech" | "technologies" => {
                update.preferred_technologies = Some(
                    value
                        .split(',')
                        .filter(|t| !t.trim().is_empty())
                        .map(str::to_string)
                        .collect(),
                )
            }
            other => bail!("unknown preference: {}", other),
        }
    }
    Ok(update)
}

fn parse_line(line: &str) -> anyhow::Result<Command> {
    let line = line.trim();
    let Some(command) = line.strip_prefix('/') else {
        return Ok(Command::Utterance(line.to_string()));
    };
    let (name, rest) = command.split_once(' ').unwrap_or((command, ""));
    match name {
        "reset" => Ok(Command::Reset),
        "prefs" => Ok(Command::Prefs(parse_prefs(rest)?)),
        "memory" => Ok(Command::Memory),
        "quit" | "exit" => Ok(Command::Quit),
        other => bail!("unknown command: /{}", other),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = EngineConfig::from_env().context("failed to load configuration")?;
    init_tracing(config.log_format)?;

    let session = std::env::args()
        .nth(1)
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    info!(session = %session, "Starting assistant");

    let orchestrator = Orchestrator::from_config(config)
        .await
        .context("failed to start the assistant")?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = match parse_line(&line) {
            Ok(command) => command,
            Err(e) => {
                eprintln!("{}", e);
                continue;
            }
        };

        let result = match command {
            Command::Utterance(text) => orchestrator
                .handle(&session, &text, &GenerationOutcome::default())
                .await
                .map_err(anyhow::Error::from)
                .and_then(|response| print_json(&response)),
            Command::Reset => orchestrator.reset(&session).map_err(anyhow::Error::from),
            Command::Prefs(update) => orchestrator
                .update_preferences(&session, update)
                .map_err(anyhow::Error::from)
                .and_then(|prefs| print_json(&prefs)),
            Command::Memory => orchestrator
                .memory(&session)
                .await
                .map_err(anyhow::Error::from)
                .and_then(|memory| print_json(&memory)),
            Command::Quit => break,
        };

        if let Err(e) = result {
            error!("Command failed: {:#}", e);
        }
    }

    orchestrator.flush().await;
    info!("Assistant stopped");
    Ok(())
}
