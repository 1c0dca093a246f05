use tracing::debug;

use crate::config::FormatterConfig;
use crate::error::FormatError;
use crate::models::{Match, Player, Record, WinRate};
use crate::sink::Sink;

pub use json::JsonFormatter;
pub use nightbot::NightbotFormatter;

/// The four replies a stats endpoint can produce. Every call writes exactly one payload.
pub trait Formatter {
    fn send_error(&self, message: &str, sink: &mut dyn Sink) -> Result<(), FormatError>;
    fn send_match(&self, game: &Record<Match>, sink: &mut dyn Sink) -> Result<(), FormatError>;
    fn send_rank(
        &self,
        player: &Record<Player>,
        leaderboard: &str,
        sink: &mut dyn Sink,
    ) -> Result<(), FormatError>;
    fn send_win_rate(&self, win_rate: &Record<WinRate>, sink: &mut dyn Sink) -> Result<(), FormatError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Nightbot,
}

impl OutputFormat {
    /// No format (or an empty one) means JSON. Unknown names give `None`.
    pub fn parse(format: Option<&str>) -> Option<OutputFormat> {
        match format {
            None | Some("") => Some(OutputFormat::Json),
            Some("nightbot") => Some(OutputFormat::Nightbot),
            Some(_) => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Nightbot => "nightbot",
        }
    }
}

#[derive(Debug, Clone)]
pub enum SelectedFormatter {
    Json(JsonFormatter),
    Nightbot(NightbotFormatter),
}

impl SelectedFormatter {
    pub fn new(format: OutputFormat, config: &FormatterConfig) -> Self {
        match format {
            OutputFormat::Json => SelectedFormatter::Json(JsonFormatter),
            OutputFormat::Nightbot => SelectedFormatter::Nightbot(NightbotFormatter::new(config)),
        }
    }

    pub fn format(&self) -> OutputFormat {
        match self {
            SelectedFormatter::Json(_) => OutputFormat::Json,
            SelectedFormatter::Nightbot(_) => OutputFormat::Nightbot,
        }
    }

    fn inner(&self) -> &dyn Formatter {
        match self {
            SelectedFormatter::Json(f) => f,
            SelectedFormatter::Nightbot(f) => f,
        }
    }
}

impl Formatter for SelectedFormatter {
    fn send_error(&self, message: &str, sink: &mut dyn Sink) -> Result<(), FormatError> {
        self.inner().send_error(message, sink)
    }

    fn send_match(&self, game: &Record<Match>, sink: &mut dyn Sink) -> Result<(), FormatError> {
        self.inner().send_match(game, sink)
    }

    fn send_rank(
        &self,
        player: &Record<Player>,
        leaderboard: &str,
        sink: &mut dyn Sink,
    ) -> Result<(), FormatError> {
        self.inner().send_rank(player, leaderboard, sink)
    }

    fn send_win_rate(&self, win_rate: &Record<WinRate>, sink: &mut dyn Sink) -> Result<(), FormatError> {
        self.inner().send_win_rate(win_rate, sink)
    }
}

/// Picks the formatter for a requested output format. `None` means the format is unsupported.
pub fn select(format: Option<&str>, config: &FormatterConfig) -> Option<SelectedFormatter> {
    let selected = OutputFormat::parse(format).map(|f| SelectedFormatter::new(f, config));
    if selected.is_none() {
        debug!("No formatter registered for {:?}", format);
    }
    selected
}

pub mod json {
    use serde_json::json;

    use super::Formatter;
    use crate::error::FormatError;
    use crate::models::{Match, Player, Record, WinRate};
    use crate::sink::Sink;

    /// Hands records to the sink exactly as they were received, for API consumers.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct JsonFormatter;

    impl Formatter for JsonFormatter {
        fn send_error(&self, message: &str, sink: &mut dyn Sink) -> Result<(), FormatError> {
            sink.json(json!({ "error": message }))
        }

        fn send_match(&self, game: &Record<Match>, sink: &mut dyn Sink) -> Result<(), FormatError> {
            sink.json(game.value().clone())
        }

        fn send_rank(
            &self,
            player: &Record<Player>,
            _leaderboard: &str,
            sink: &mut dyn Sink,
        ) -> Result<(), FormatError> {
            sink.json(player.value().clone())
        }

        fn send_win_rate(
            &self,
            win_rate: &Record<WinRate>,
            sink: &mut dyn Sink,
        ) -> Result<(), FormatError> {
            sink.json(win_rate.value().clone())
        }
    }
}

pub mod nightbot {
    use chrono::{DateTime, Utc};
    use tracing::debug;

    use super::Formatter;
    use crate::aoe4_utils::{
        format_age, format_duration, format_leaderboard, format_rank_level, plural,
    };
    use crate::config::{CivNames, Clock, FormatterConfig};
    use crate::error::FormatError;
    use crate::models::{Match, Mode, Player, Record, WinRate};
    use crate::sink::Sink;

    /// Above this many players a match is rendered without ratings.
    /// 1v2 customs still get the full line.
    const SHORT_FORMAT_MIN_PLAYERS: usize = 4;

    /// Renders one-line chat replies for Nightbot `$(urlfetch)` commands.
    #[derive(Debug, Clone)]
    pub struct NightbotFormatter {
        civ_names: CivNames,
        clock: Clock,
    }

    impl NightbotFormatter {
        pub fn new(config: &FormatterConfig) -> Self {
            NightbotFormatter {
                civ_names: config.civ_names.clone(),
                clock: config.clock,
            }
        }

        fn now(&self) -> DateTime<Utc> {
            self.clock.now()
        }

        fn format_civ<'a>(&'a self, civ: &'a str) -> &'a str {
            self.civ_names.label(civ)
        }

        fn format_match_player(
            &self,
            game: &Match,
            player: &Player,
            short: bool,
        ) -> Result<String, FormatError> {
            let mut msg = player.name.clone();

            if !short {
                if let Some(mode) = player.mode(&game.kind) {
                    if let Some(rating) = mode.rating.filter(|r| *r != 0.0) {
                        let rank = mode
                            .rank
                            .filter(|r| *r > 0)
                            .map(|r| format!("#{r} "))
                            .unwrap_or_default();
                        let rank_level = rank_level_prefix(mode)?;
                        msg.push_str(&format!(" {rank}({rank_level}{rating} Elo)"));
                    }
                }
            }

            let civ = self.format_civ(&player.civilization);
            if short {
                msg.push_str(&format!(" ({civ})"));
            } else {
                msg.push_str(&format!(" - {civ}"));
            }

            Ok(msg)
        }

        fn format_match_team(
            &self,
            game: &Match,
            team: &[Player],
            short: bool,
        ) -> Result<String, FormatError> {
            Ok(team
                .iter()
                .map(|p| self.format_match_player(game, p, short))
                .collect::<Result<Vec<_>, _>>()?
                .join(", "))
        }

        fn format_match_teams(&self, game: &Match, separator: &str) -> Result<String, FormatError> {
            Ok(game
                .teams
                .iter()
                .map(|t| self.format_match_team(game, t, true))
                .collect::<Result<Vec<_>, _>>()?
                .join(separator))
        }
    }

    fn rank_level_prefix(mode: &Mode) -> Result<String, FormatError> {
        let level = format_rank_level(mode.rank_level.as_deref())?;
        if level.is_empty() {
            Ok(level)
        } else {
            Ok(format!("{level}, "))
        }
    }

    fn result_tag(team: &[Player]) -> &'static str {
        if team.iter().any(Player::is_winner) {
            "W"
        } else {
            "L"
        }
    }

    impl Formatter for NightbotFormatter {
        fn send_error(&self, message: &str, sink: &mut dyn Sink) -> Result<(), FormatError> {
            sink.send(format!("Error: {message}"))
        }

        fn send_match(&self, game: &Record<Match>, sink: &mut dyn Sink) -> Result<(), FormatError> {
            let game = &game.parse()?;
            let num_teams = game.teams.len();
            let num_players = game.player_count();
            if num_teams == 0 {
                return Err(FormatError::MissingField {
                    record: "match",
                    field: "teams",
                });
            }
            let use_short_format = num_players >= SHORT_FORMAT_MIN_PLAYERS;
            debug!(
                "Rendering match on {} with {} team(s) and {} player(s)",
                game.map, num_teams, num_players
            );

            let mut msg = if let [team_a, team_b] = game.teams.as_slice() {
                let left = self.format_match_team(game, team_a, use_short_format)?;
                let right = self.format_match_team(game, team_b, use_short_format)?;

                let mut map_line = format!("==> {} <==", game.map);
                if !game.ongoing {
                    map_line = format!(
                        "[{}] {} [{}]",
                        result_tag(team_a),
                        map_line,
                        result_tag(team_b)
                    );
                }
                format!("{left} {map_line} {right}")
            } else if num_players == num_teams {
                let teams = self.format_match_teams(game, ", ")?;
                format!("FFA on {} between {}", game.map, teams)
            } else {
                let teams = self.format_match_teams(game, " vs ")?;
                format!("Custom on {} between {}", game.map, teams)
            };

            msg.push_str(&format!(", {} ago", format_age(game.started_at, self.now())));
            sink.send(msg)
        }

        fn send_rank(
            &self,
            player: &Record<Player>,
            leaderboard: &str,
            sink: &mut dyn Sink,
        ) -> Result<(), FormatError> {
            let player = player.parse()?;
            let Some(mode) = player.mode(leaderboard) else {
                return sink.send(format!(
                    "{} is unranked in {}",
                    player.name,
                    format_leaderboard(leaderboard)
                ));
            };

            let rank = match mode.rank.filter(|r| *r > 0) {
                Some(r) => format!("rank {r}"),
                None => "unranked".to_string(),
            };
            let rank_level = rank_level_prefix(mode)?;
            let rating = mode.rating.ok_or(FormatError::MissingField {
                record: "mode",
                field: "rating",
            })?;
            let last_game_at = mode.last_game_at.ok_or(FormatError::MissingField {
                record: "mode",
                field: "last_game_at",
            })?;

            let mut msg = format!(
                "{} is {} ({}{} Elo), with {} game{} ({}-{} | {}%)",
                player.name,
                rank,
                rank_level,
                rating,
                mode.games_count,
                plural(mode.games_count),
                mode.wins_count,
                mode.losses_count,
                mode.win_rate,
            );

            if let Some(streak) = mode.streak {
                let kind = if streak < 0 { "losing" } else { "win" };
                msg.push_str(&format!(
                    ", on a {}-game {} streak",
                    streak.unsigned_abs(),
                    kind
                ));
            }
            msg.push_str(&format!(
                " [last played {} ago]",
                format_age(last_game_at, self.now())
            ));

            sink.send(msg)
        }

        fn send_win_rate(
            &self,
            win_rate: &Record<WinRate>,
            sink: &mut dyn Sink,
        ) -> Result<(), FormatError> {
            let win_rate = win_rate.parse()?;
            let mut msg = format!(
                "{} played {} game{}",
                win_rate.player.name,
                win_rate.games_count,
                plural(win_rate.games_count)
            );

            if win_rate.games_count > 0 {
                msg.push_str(&format!(
                    " ({}-{} | {}%)",
                    win_rate.wins_count, win_rate.losses_count, win_rate.win_rate
                ));
            }

            if let Some(duration) = win_rate.duration.filter(|d| *d != 0.0 && !d.is_nan()) {
                msg.push_str(&format!(
                    " lasting {}",
                    format_duration(duration.floor() as i64)
                ));
            }

            if let Some(opponent) = &win_rate.opponent {
                msg.push_str(&format!(" vs {}", opponent.name));
            }

            if let Some(last_game_at) = win_rate.last_game_at {
                msg.push_str(&format!(", {} ago", format_age(last_game_at, self.now())));
            }

            sink.send(msg)
        }
    }
}
