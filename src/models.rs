use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserializer, Serializer};
use serde_derive::Deserialize;
use serde_derive::Serialize;
use serde_json::Value;

use crate::error::FormatError;

/// A record exactly as the stats source sent it.
///
/// The JSON is kept untouched so it can be handed back verbatim; the typed view
/// is only built when something needs to read it.
pub struct Record<T> {
    value: Value,
    kind: PhantomData<T>,
}

impl<T> Record<T> {
    pub fn value(&self) -> &Value {
        &self.value
    }
}

impl<T: DeserializeOwned> Record<T> {
    pub fn parse(&self) -> Result<T, FormatError> {
        <T as serde::Deserialize>::deserialize(&self.value).map_err(FormatError::InvalidRecord)
    }
}

impl<T: serde::Serialize> Record<T> {
    pub fn new(record: &T) -> Result<Self, FormatError> {
        Ok(Record::from(serde_json::to_value(record)?))
    }
}

impl<T> From<Value> for Record<T> {
    fn from(value: Value) -> Self {
        Record {
            value,
            kind: PhantomData,
        }
    }
}

impl<T> Clone for Record<T> {
    fn clone(&self) -> Self {
        Record::from(self.value.clone())
    }
}

impl<T> fmt::Debug for Record<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Record").field(&self.value).finish()
    }
}

impl<'de, T> serde::Deserialize<'de> for Record<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        <Value as serde::Deserialize>::deserialize(deserializer).map(Record::from)
    }
}

impl<T> serde::Serialize for Record<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serde::Serialize::serialize(&self.value, serializer)
    }
}

/// A game as reported by the stats source. Teams keep the order they were reported in.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub map: String,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub ongoing: bool,
    pub kind: String,
    pub teams: Vec<Vec<Player>>,
}

impl Match {
    pub fn player_count(&self) -> usize {
        self.teams.iter().map(Vec::len).sum()
    }
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub name: String,
    #[serde(default)]
    pub civilization: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    /// Rating records keyed by leaderboard, e.g. `rm_solo` or `qm_2v2`.
    #[serde(default)]
    pub modes: BTreeMap<String, Mode>,
}

impl Player {
    pub fn is_winner(&self) -> bool {
        self.result.as_deref() == Some("win")
    }

    pub fn mode(&self, leaderboard: &str) -> Option<&Mode> {
        self.modes.get(leaderboard)
    }
}

/// A player's standing on a single leaderboard.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank_level: Option<String>,
    #[serde(default)]
    pub games_count: u32,
    #[serde(default)]
    pub wins_count: u32,
    #[serde(default)]
    pub losses_count: u32,
    #[serde(default)]
    pub win_rate: f64,
    /// Anything that is not a whole number reads as no streak.
    #[serde(
        default,
        deserialize_with = "integer_or_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub streak: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_game_at: Option<DateTime<Utc>>,
}

/// Lightweight reference to a player, as embedded in win rate records.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WinRate {
    pub player: Profile,
    #[serde(default)]
    pub games_count: u32,
    #[serde(default)]
    pub wins_count: u32,
    #[serde(default)]
    pub losses_count: u32,
    #[serde(default)]
    pub win_rate: f64,
    /// Seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opponent: Option<Profile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_game_at: Option<DateTime<Utc>>,
}

fn integer_or_none<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    let value = <Option<Value> as serde::Deserialize>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        _ => None,
    }))
}
