use std::fmt;
use std::str::FromStr;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::session::sanitize::sanitize_scramble;
use crate::timer::format::{MAX_SOLVE_MS, PLUS_TWO_MS, penalized_display};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SolveId(String);

impl SolveId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SolveId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for SolveId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for SolveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Penalty {
    #[default]
    #[serde(rename = "none")]
    None,
    #[serde(rename = "+2")]
    PlusTwo,
    #[serde(rename = "DNF")]
    Dnf,
}

impl Penalty {
    pub fn as_str(self) -> &'static str {
        match self {
            Penalty::None => "none",
            Penalty::PlusTwo => "+2",
            Penalty::Dnf => "DNF",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "&'static str")]
pub enum PuzzleType {
    #[default]
    Cube3,
    Cube4,
    Cube5,
    Megaminx,
}

impl PuzzleType {
    pub const ALL: [PuzzleType; 4] = [
        PuzzleType::Cube3,
        PuzzleType::Cube4,
        PuzzleType::Cube5,
        PuzzleType::Megaminx,
    ];

    /// Stable name used in persisted records.
    pub fn key(self) -> &'static str {
        match self {
            PuzzleType::Cube3 => "3x3",
            PuzzleType::Cube4 => "4x4",
            PuzzleType::Cube5 => "5x5",
            PuzzleType::Megaminx => "Mega",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PuzzleType::Megaminx => "Megaminx",
            other => other.key(),
        }
    }

    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|&p| p == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownPuzzle(pub String);

impl fmt::Display for UnknownPuzzle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown puzzle type: {}", self.0)
    }
}

impl std::error::Error for UnknownPuzzle {}

impl FromStr for PuzzleType {
    type Err = UnknownPuzzle;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "3x3" | "333" => Ok(PuzzleType::Cube3),
            "4x4" | "444" => Ok(PuzzleType::Cube4),
            "5x5" | "555" => Ok(PuzzleType::Cube5),
            "mega" | "megaminx" | "minx" => Ok(PuzzleType::Megaminx),
            _ => Err(UnknownPuzzle(s.to_string())),
        }
    }
}

// Unknown stored names degrade to the default puzzle instead of failing the record.
impl From<String> for PuzzleType {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_default()
    }
}

impl From<PuzzleType> for &'static str {
    fn from(value: PuzzleType) -> Self {
        value.key()
    }
}

impl fmt::Display for PuzzleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One timed or manually entered attempt.
///
/// Derived fields (`penalized_time_ms`, `display_time`) are private and only
/// change through [`SolveRecord::set_penalty`], so they always agree with
/// `raw_time_ms` and `penalty`.
#[derive(Clone, Debug, PartialEq)]
pub struct SolveRecord {
    id: SolveId,
    raw_time_ms: u64,
    scramble: String,
    penalty: Penalty,
    penalized_time_ms: Option<u64>,
    display_time: String,
    timestamp: i64,
    puzzle_type: PuzzleType,
}

impl SolveRecord {
    pub fn new(raw_time_ms: u64, scramble: &str, puzzle_type: PuzzleType) -> Self {
        Self::restore(
            SolveId::generate(),
            raw_time_ms,
            scramble,
            Penalty::None,
            Utc::now().timestamp_millis(),
            puzzle_type,
        )
    }

    /// Rebuild a record from its stored parts, recomputing every derived field.
    /// Raw times are capped at [`MAX_SOLVE_MS`].
    pub fn restore(
        id: SolveId,
        raw_time_ms: u64,
        scramble: &str,
        penalty: Penalty,
        timestamp: i64,
        puzzle_type: PuzzleType,
    ) -> Self {
        let mut record = Self {
            id,
            raw_time_ms: raw_time_ms.min(MAX_SOLVE_MS),
            scramble: sanitize_scramble(scramble),
            penalty,
            penalized_time_ms: None,
            display_time: String::new(),
            timestamp,
            puzzle_type,
        };
        record.set_penalty(penalty);
        record
    }

    pub fn set_penalty(&mut self, penalty: Penalty) {
        self.penalty = penalty;
        self.penalized_time_ms = match penalty {
            Penalty::None => Some(self.raw_time_ms),
            Penalty::PlusTwo => Some(self.raw_time_ms.saturating_add(PLUS_TWO_MS)),
            Penalty::Dnf => None,
        };
        self.display_time = penalized_display(self.raw_time_ms, penalty);
    }

    pub fn id(&self) -> &SolveId {
        &self.id
    }

    pub fn raw_time_ms(&self) -> u64 {
        self.raw_time_ms
    }

    pub fn scramble(&self) -> &str {
        &self.scramble
    }

    pub fn penalty(&self) -> Penalty {
        self.penalty
    }

    /// `None` encodes DNF: an infinite time.
    pub fn penalized_time_ms(&self) -> Option<u64> {
        self.penalized_time_ms
    }

    /// Penalized time on the real line; DNF maps to positive infinity.
    pub fn penalized_time_f64(&self) -> f64 {
        self.penalized_time_ms
            .map(|ms| ms as f64)
            .unwrap_or(f64::INFINITY)
    }

    pub fn is_dnf(&self) -> bool {
        self.penalty == Penalty::Dnf
    }

    pub fn display_time(&self) -> &str {
        &self.display_time
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn puzzle_type(&self) -> PuzzleType {
        self.puzzle_type
    }
}
