use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

use crate::session::solve::{Penalty, PuzzleType, SolveId, SolveRecord};
use crate::timer::format::MAX_SOLVE_MS;

/// Storage key; the `_v1` suffix versions the key itself.
pub const SESSION_KEY: &str = "simplict_session_v1";
pub const SESSION_VERSION: &str = "1.0.0";

/// Everything persisted under [`SESSION_KEY`].
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionEnvelope {
    #[serde(default = "default_version")]
    pub version: String,
    pub solves: Vec<StoredSolve>,
    #[serde(default, deserialize_with = "millis")]
    pub last_modified: u64,
}

fn default_version() -> String {
    SESSION_VERSION.to_string()
}

/// A solve in its stored shape. `penalized_time_ms` is `null` for DNF.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSolve {
    pub id: String,
    #[serde(deserialize_with = "solve_millis")]
    pub time_ms: u64,
    #[serde(default)]
    pub display_time: String,
    #[serde(default)]
    pub scramble: String,
    #[serde(default)]
    pub penalty: Penalty,
    #[serde(default, deserialize_with = "optional_millis")]
    pub penalized_time_ms: Option<u64>,
    #[serde(default, deserialize_with = "millis")]
    pub timestamp: u64,
    #[serde(default)]
    pub puzzle_type: PuzzleType,
}

impl From<&SolveRecord> for StoredSolve {
    fn from(solve: &SolveRecord) -> Self {
        Self {
            id: solve.id().to_string(),
            time_ms: solve.raw_time_ms(),
            display_time: solve.display_time().to_string(),
            scramble: solve.scramble().to_string(),
            penalty: solve.penalty(),
            penalized_time_ms: solve.penalized_time_ms(),
            timestamp: solve.timestamp().max(0) as u64,
            puzzle_type: solve.puzzle_type(),
        }
    }
}

impl StoredSolve {
    /// Derived fields are rebuilt from `time_ms` and `penalty`, which also turns a
    /// stored `null` back into the in-memory DNF sentinel. The scramble is
    /// sanitized again on the way in.
    pub fn into_record(self) -> SolveRecord {
        SolveRecord::restore(
            SolveId::from(self.id),
            self.time_ms,
            &self.scramble,
            self.penalty,
            self.timestamp as i64,
            self.puzzle_type,
        )
    }
}

impl SessionEnvelope {
    pub fn from_solves(solves: &[SolveRecord], last_modified: u64) -> Self {
        Self {
            version: SESSION_VERSION.to_string(),
            solves: solves.iter().map(StoredSolve::from).collect(),
            last_modified,
        }
    }
}

/// Accepts integer or fractional JSON numbers; fractional values are rounded.
fn millis<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    let value = f64::deserialize(deserializer)?;
    to_millis(value).ok_or_else(|| D::Error::custom(format!("invalid millisecond value {value}")))
}

/// Like [`millis`], but rejects times above [`MAX_SOLVE_MS`].
fn solve_millis<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    let value = millis(deserializer)?;
    if value > MAX_SOLVE_MS {
        return Err(D::Error::custom(format!("solve time {value} ms is out of range")));
    }
    Ok(value)
}

fn optional_millis<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
    match Option::<f64>::deserialize(deserializer)? {
        None => Ok(None),
        Some(value) => to_millis(value)
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("invalid millisecond value {value}"))),
    }
}

fn to_millis(value: f64) -> Option<u64> {
    (value.is_finite() && value >= 0.0).then(|| value.round() as u64)
}
