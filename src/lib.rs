//! Renders Age of Empires IV stats records (matches, ranks, win rates) either as
//! raw JSON for API clients or as one-line chat replies for Nightbot.
//!
//! ```
//! use aoe4_stats_formatter::config::FormatterConfig;
//! use aoe4_stats_formatter::formatters::{select, Formatter};
//! use aoe4_stats_formatter::models::{Player, Record};
//! use aoe4_stats_formatter::sink::Reply;
//!
//! let formatter = select(Some("nightbot"), &FormatterConfig::default()).unwrap();
//! let player = Player { name: "Alice".to_string(), ..Default::default() };
//! let player = Record::new(&player).unwrap();
//! let mut reply = Reply::new();
//! formatter.send_rank(&player, "rm_1v1", &mut reply).unwrap();
//! assert_eq!(reply.last_text(), Some("Alice is unranked in Ranked 1v1"));
//! ```

pub mod aoe4_utils;
pub mod config;
pub mod error;
pub mod formatters;
pub mod models;
pub mod sink;

pub use error::FormatError;
