use std::env;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use aoe4_stats_formatter::config::{CivNames, Clock, FormatterConfig};
use aoe4_stats_formatter::formatters::{select, Formatter, SelectedFormatter};
use aoe4_stats_formatter::models::{Match, Player, Record, WinRate};
use aoe4_stats_formatter::sink::{Sink, WriterSink};
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use serde::de::DeserializeOwned;
use tracing::{error, info};
use tracing_subscriber::{filter, prelude::*, Layer};

#[derive(Debug, Clone)]
struct Config {
    log_path: PathBuf,
    civ_names_path: Option<PathBuf>,
}

fn load_config() -> Result<Config> {
    dotenv().ok();

    let log_path = env::var("LOG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| env::temp_dir().join("aoe4_stats_formatter"));

    let civ_names_path = match env::var("CIV_NAMES_PATH") {
        Ok(p) if !p.trim().is_empty() => Some(PathBuf::from(p)),
        Ok(_) | Err(env::VarError::NotPresent) => None,
        Err(e) => return Err(e).context("Invalid CIV_NAMES_PATH"),
    };

    Ok(Config {
        log_path,
        civ_names_path,
    })
}

#[derive(Parser, Debug)]
#[command(
    name = "aoe4_stats_formatter",
    version,
    about = "Render AoE4 stats records as JSON or as a chat reply"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format: omit for JSON, `nightbot` for a chat line
    #[arg(long, global = true)]
    format: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render a match record
    Match {
        /// JSON file holding the record, or `-` for stdin
        input: PathBuf,
    },

    /// Render a player's standing on one leaderboard
    Rank {
        /// JSON file holding the player, or `-` for stdin
        input: PathBuf,
        /// Leaderboard key, e.g. rm_solo or qm_2v2
        #[arg(long)]
        leaderboard: String,
    },

    /// Render a win rate record
    WinRate {
        /// JSON file holding the record, or `-` for stdin
        input: PathBuf,
    },

    /// Render an error message
    Error { message: String },
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Match { .. } => "match",
            Commands::Rank { .. } => "rank",
            Commands::WinRate { .. } => "win-rate",
            Commands::Error { .. } => "error",
        }
    }
}

fn read_record<T: DeserializeOwned>(input: &Path) -> Result<T> {
    let text = if input == Path::new("-") {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read record from stdin")?;
        buffer
    } else {
        fs::read_to_string(input)
            .with_context(|| format!("Failed to read record from {}", input.display()))?
    };
    serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse record from {}", input.display()))
}

/// Renders one command through the formatter. Rendering failures are reported
/// back through the same formatter so the caller always gets a reply.
fn dispatch(
    command: &Commands,
    formatter: &SelectedFormatter,
    sink: &mut dyn Sink,
) -> Result<()> {
    let rendered = match command {
        Commands::Match { input } => {
            formatter.send_match(&read_record::<Record<Match>>(input)?, sink)
        }
        Commands::Rank { input, leaderboard } => {
            formatter.send_rank(&read_record::<Record<Player>>(input)?, leaderboard, sink)
        }
        Commands::WinRate { input } => {
            formatter.send_win_rate(&read_record::<Record<WinRate>>(input)?, sink)
        }
        Commands::Error { message } => formatter.send_error(message, sink),
    };

    match rendered {
        Ok(()) => {
            info!(
                "Rendered {} as {}",
                command.name(),
                formatter.format().name()
            );
            Ok(())
        }
        Err(e) => {
            error!("Unable to render {}: {}", command.name(), e);
            formatter
                .send_error(&e.to_string(), sink)
                .context("Failed to send error reply")
        }
    }
}

fn run(cli: &Cli, config: &Config) -> Result<()> {
    let civ_names = match &config.civ_names_path {
        Some(path) => CivNames::load(path)
            .with_context(|| format!("Failed to load civ names from {}", path.display()))?,
        None => CivNames::default(),
    };
    let formatter_config = FormatterConfig {
        civ_names,
        clock: Clock::System,
    };

    let formatter = select(cli.format.as_deref(), &formatter_config).ok_or_else(|| {
        anyhow!(
            "Unsupported format: {}",
            cli.format.as_deref().unwrap_or_default()
        )
    })?;

    let mut sink = WriterSink::new(io::stdout().lock());
    dispatch(&cli.command, &formatter, &mut sink)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config().context("Failed to load configuration")?;

    std::panic::set_hook(Box::new(|i| {
        error!("Panic'd: {}", i);
    }));

    let file_appender = tracing_appender::rolling::daily(&config.log_path, "formatter.log");
    let (non_blocking_appender, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(non_blocking_appender)
                .with_filter(filter::filter_fn(|metadata| {
                    metadata.target().starts_with("aoe4_stats_formatter")
                })),
        )
        .init();

    run(&cli, &config).inspect_err(|e| error!("Command failed: {:#}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use aoe4_stats_formatter::sink::Reply;
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).expect("failed to parse CLI args")
    }

    fn record_file(value: serde_json::Value) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{value}").unwrap();
        file
    }

    fn nightbot() -> SelectedFormatter {
        let config = FormatterConfig {
            civ_names: CivNames::default(),
            clock: Clock::Fixed(Utc.with_ymd_and_hms(2023, 6, 1, 12, 0, 0).unwrap()),
        };
        select(Some("nightbot"), &config).unwrap()
    }

    #[test]
    fn test_parse_match() {
        let cli = parse(&["aoe4_stats_formatter", "match", "game.json"]);
        assert!(cli.format.is_none());
        assert!(matches!(cli.command, Commands::Match { ref input } if input == Path::new("game.json")));
    }

    #[test]
    fn test_parse_rank_with_format() {
        let cli = parse(&[
            "aoe4_stats_formatter",
            "rank",
            "-",
            "--leaderboard",
            "rm_solo",
            "--format",
            "nightbot",
        ]);
        assert_eq!(cli.format.as_deref(), Some("nightbot"));
        assert!(
            matches!(cli.command, Commands::Rank { ref leaderboard, .. } if leaderboard == "rm_solo")
        );
    }

    #[test]
    fn test_parse_rank_requires_leaderboard() {
        assert!(Cli::try_parse_from(["aoe4_stats_formatter", "rank", "player.json"]).is_err());
    }

    #[test]
    fn test_parse_win_rate_and_error() {
        let cli = parse(&["aoe4_stats_formatter", "win-rate", "wr.json"]);
        assert_eq!(cli.command.name(), "win-rate");
        let cli = parse(&["aoe4_stats_formatter", "error", "Player not found"]);
        assert!(
            matches!(cli.command, Commands::Error { ref message } if message == "Player not found")
        );
    }

    #[test]
    fn test_dispatch_rank_from_file() {
        let file = record_file(json!({
            "name": "Alice",
            "civilization": "french",
            "modes": {
                "rm_solo": {
                    "rating": 1402,
                    "rank": 88,
                    "rank_level": "gold_1",
                    "games_count": 3,
                    "wins_count": 2,
                    "losses_count": 1,
                    "win_rate": 66.7,
                    "last_game_at": "2023-06-01T11:00:00Z"
                }
            }
        }));
        let command = Commands::Rank {
            input: file.path().to_path_buf(),
            leaderboard: "rm_solo".to_string(),
        };
        let mut reply = Reply::new();
        dispatch(&command, &nightbot(), &mut reply).unwrap();

        assert_eq!(
            reply.last_text(),
            Some("Alice is rank 88 (G1, 1402 Elo), with 3 games (2-1 | 66.7%) [last played 1 hour ago]")
        );
    }

    #[test]
    fn test_dispatch_reports_render_errors_as_replies() {
        let file = record_file(json!({
            "name": "Bob",
            "modes": { "rm_solo": { "rating": 900, "rank_level": "bronze" } }
        }));
        let command = Commands::Rank {
            input: file.path().to_path_buf(),
            leaderboard: "rm_solo".to_string(),
        };
        let mut reply = Reply::new();
        dispatch(&command, &nightbot(), &mut reply).unwrap();

        assert_eq!(
            reply.last_text(),
            Some("Error: Malformed rank level 'bronze', expected '<tier>_<division>'")
        );
    }

    #[test]
    fn test_dispatch_error_as_json() {
        let formatter = select(None, &FormatterConfig::default()).unwrap();
        let command = Commands::Error {
            message: "Player not found".to_string(),
        };
        let mut reply = Reply::new();
        dispatch(&command, &formatter, &mut reply).unwrap();
        assert_eq!(
            reply.last_json(),
            Some(&json!({ "error": "Player not found" }))
        );
    }

    #[test]
    fn test_dispatch_win_rate_as_json_is_verbatim() {
        let input = json!({
            "player": { "name": "Alice" },
            "games_count": 3,
            "duration": 600,
            "last_game_at": "2023-06-01T09:00:00-05:00"
        });
        let file = record_file(input.clone());
        let command = Commands::WinRate {
            input: file.path().to_path_buf(),
        };
        let formatter = select(None, &FormatterConfig::default()).unwrap();
        let mut reply = Reply::new();
        dispatch(&command, &formatter, &mut reply).unwrap();
        assert_eq!(reply.last_json(), Some(&input));
    }

    #[test]
    fn test_dispatch_missing_file() {
        let command = Commands::Match {
            input: PathBuf::from("/nonexistent/game.json"),
        };
        let mut reply = Reply::new();
        let result = dispatch(&command, &nightbot(), &mut reply);
        assert!(result.is_err());
        assert!(reply.payloads.is_empty());
    }

    #[test]
    fn test_run_rejects_unsupported_format() {
        let cli = parse(&["aoe4_stats_formatter", "error", "x", "--format", "bogus"]);
        let config = Config {
            log_path: env::temp_dir(),
            civ_names_path: None,
        };
        let result = run(&cli, &config);
        assert_eq!(result.unwrap_err().to_string(), "Unsupported format: bogus");
    }
}
