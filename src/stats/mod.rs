use std::fmt;

use crate::session::solve::SolveRecord;
use crate::timer::format::{DNF_LABEL, PLACEHOLDER, ms_f64_to_time};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Stat {
    /// Milliseconds; averages may be fractional.
    Time(f64),
    Dnf,
    /// Not enough solves to say anything yet.
    Insufficient,
}

impl Stat {
    pub fn as_ms(&self) -> Option<f64> {
        match self {
            Stat::Time(ms) => Some(*ms),
            _ => None,
        }
    }
}

impl fmt::Display for Stat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stat::Time(ms) => f.write_str(&ms_f64_to_time(*ms)),
            Stat::Dnf => f.write_str(DNF_LABEL),
            Stat::Insufficient => f.write_str(PLACEHOLDER),
        }
    }
}

/// Rolling average over the most recent `window` solves.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AverageRule {
    pub window: usize,
    /// More DNFs than this in the window makes the whole average DNF.
    pub max_dnf: usize,
}

pub const AO5: AverageRule = AverageRule {
    window: 5,
    max_dnf: 1,
};

pub const AO12: AverageRule = AverageRule {
    window: 12,
    max_dnf: 2,
};

#[derive(Clone, Debug, PartialEq)]
pub struct SessionStats {
    pub count: usize,
    pub dnf_count: usize,
    pub best: Stat,
    pub worst: Stat,
    pub mean: Stat,
    pub average: Stat,
    pub ao5: Stat,
    pub ao12: Stat,
}

impl Default for SessionStats {
    fn default() -> Self {
        Self::compute(&[])
    }
}

impl SessionStats {
    pub fn compute(solves: &[SolveRecord]) -> Self {
        let valid = valid_times(solves);
        Self {
            count: solves.len(),
            dnf_count: solves.len() - valid.len(),
            best: valid
                .iter()
                .min()
                .map_or(Stat::Insufficient, |&ms| Stat::Time(ms as f64)),
            worst: valid
                .iter()
                .max()
                .map_or(Stat::Insufficient, |&ms| Stat::Time(ms as f64)),
            mean: session_mean(&valid),
            average: session_average(&valid),
            ao5: rolling_average(solves, AO5),
            ao12: rolling_average(solves, AO12),
        }
    }

    /// A solve is marked best/worst only in sessions with more than one solve.
    pub fn marker(&self, solve: &SolveRecord) -> Option<Marker> {
        if self.count <= 1 {
            return None;
        }
        let ms = solve.penalized_time_ms()? as f64;
        if self.best.as_ms() == Some(ms) {
            Some(Marker::Best)
        } else if self.worst.as_ms() == Some(ms) {
            Some(Marker::Worst)
        } else {
            None
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Marker {
    Best,
    Worst,
}

/// Penalized times of every non-DNF solve, in session order.
pub fn valid_times(solves: &[SolveRecord]) -> Vec<u64> {
    solves
        .iter()
        .filter(|s| !s.is_dnf())
        .filter_map(|s| s.penalized_time_ms())
        .collect()
}

fn mean(times: &[u64]) -> f64 {
    times.iter().map(|&ms| ms as f64).sum::<f64>() / times.len() as f64
}

pub fn session_mean(valid: &[u64]) -> Stat {
    if valid.is_empty() {
        return Stat::Insufficient;
    }
    Stat::Time(mean(valid))
}

/// Mean of all valid times after dropping the single fastest and slowest.
pub fn session_average(valid: &[u64]) -> Stat {
    if valid.len() < 3 {
        return Stat::Insufficient;
    }
    let mut sorted = valid.to_vec();
    sorted.sort_unstable();
    Stat::Time(mean(&sorted[1..sorted.len() - 1]))
}

/// Trimmed mean of the last `rule.window` solves in chronological order.
///
/// The fastest valid time is always dropped. A single DNF takes the
/// dropped-worst slot; otherwise the slowest valid time is dropped as well.
pub fn rolling_average(solves: &[SolveRecord], rule: AverageRule) -> Stat {
    if solves.len() < rule.window {
        return Stat::Insufficient;
    }
    let recent = &solves[solves.len() - rule.window..];
    let mut valid = valid_times(recent);
    let dnfs = rule.window - valid.len();
    if dnfs > rule.max_dnf {
        return Stat::Dnf;
    }

    valid.sort_unstable();
    let upper = if dnfs == 1 {
        valid.len()
    } else {
        valid.len() - 1
    };
    let kept = &valid[1..upper];
    if kept.is_empty() {
        return Stat::Dnf;
    }
    Stat::Time(mean(kept))
}

/// Per-solve penalized seconds for charting; DNF solves leave a gap.
pub fn chart_series(solves: &[SolveRecord]) -> Vec<Option<f64>> {
    solves
        .iter()
        .map(|s| s.penalized_time_ms().map(|ms| ms as f64 / 1000.0))
        .collect()
}
