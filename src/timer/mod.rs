pub mod format;

use std::time::Instant;

use crate::timer::format::{exceeds_display_range, ms_to_time};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    /// Input held while idle; arms the timer but does not start it.
    Ready,
    Running {
        started_at: Instant,
    },
    /// Values captured at the instant of stopping, exported after the delay.
    Stopped {
        elapsed_ms: u64,
        display: String,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimerState {
    pub phase: Phase,
    pub manual_entry: bool,
    pub display: String,
    /// Set once the running time has crossed the hour bucket, so the warning fires once.
    pub overflow_warned: bool,
}

impl Default for TimerState {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            manual_entry: false,
            display: ms_to_time(0),
            overflow_warned: false,
        }
    }
}

impl TimerState {
    pub fn is_ready(&self) -> bool {
        self.phase == Phase::Ready
    }

    pub fn is_running(&self) -> bool {
        matches!(self.phase, Phase::Running { .. })
    }

    pub fn is_stopped(&self) -> bool {
        matches!(self.phase, Phase::Stopped { .. })
    }

    pub fn is_idle(&self) -> bool {
        self.phase == Phase::Idle
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TimerEvent {
    KeyDown,
    KeyUp { at: Instant },
    PointerDown { at: Instant },
    PointerUp { at: Instant },
    Tick { at: Instant },
    /// The stop-to-export delay elapsed.
    ExportDue,
    FocusLost,
    ToggleManual,
    SubmitManual(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    /// A solve began: snapshot the active scramble and puzzle type now.
    StampScramble,
    ScheduleExport { stopped_at: Instant },
    RefreshScramble,
    AppendSolve { raw_time_ms: u64, display: String },
    ManualSolve { raw_time_ms: u64 },
    HourExceeded { elapsed_ms: u64 },
}

/// Advance the timer by one input. Pure: no clocks are read and nothing is scheduled here;
/// the caller carries out the returned effects in order.
pub fn transition(state: &TimerState, event: TimerEvent) -> (TimerState, Vec<Effect>) {
    let mut next = state.clone();
    let mut effects = Vec::new();

    match event {
        TimerEvent::KeyDown
        | TimerEvent::KeyUp { .. }
        | TimerEvent::PointerDown { .. }
        | TimerEvent::PointerUp { .. }
            if state.manual_entry => {}

        TimerEvent::KeyDown => {
            if state.is_idle() {
                next.phase = Phase::Ready;
            }
        }
        TimerEvent::PointerDown { at } => match state.phase {
            Phase::Idle => next.phase = Phase::Ready,
            Phase::Running { started_at } => stop(&mut next, &mut effects, started_at, at),
            _ => {}
        },
        TimerEvent::KeyUp { at } => match state.phase {
            Phase::Ready => start(&mut next, &mut effects, at),
            Phase::Running { started_at } => stop(&mut next, &mut effects, started_at, at),
            _ => {}
        },
        TimerEvent::PointerUp { at } => {
            if state.is_ready() {
                start(&mut next, &mut effects, at);
            }
        }
        TimerEvent::Tick { at } => {
            if let Phase::Running { started_at } = state.phase {
                let elapsed_ms = elapsed_between(started_at, at);
                next.display = ms_to_time(elapsed_ms);
                warn_on_overflow(&mut next, &mut effects, elapsed_ms);
            }
        }
        TimerEvent::ExportDue => {
            if let Phase::Stopped {
                elapsed_ms,
                display,
            } = &state.phase
            {
                effects.push(Effect::AppendSolve {
                    raw_time_ms: *elapsed_ms,
                    display: display.clone(),
                });
                next = TimerState {
                    manual_entry: state.manual_entry,
                    ..TimerState::default()
                };
            }
        }
        TimerEvent::FocusLost => {
            if state.is_ready() {
                next.phase = Phase::Idle;
            }
        }
        TimerEvent::ToggleManual => {
            // A running or stopping timer must finish first, otherwise its stop input
            // would be swallowed by manual mode.
            if matches!(state.phase, Phase::Idle | Phase::Ready) {
                next.phase = Phase::Idle;
                next.manual_entry = !state.manual_entry;
            }
        }
        TimerEvent::SubmitManual(text) => {
            if state.manual_entry
                && let Some(raw_time_ms) = parse_manual_time(&text)
            {
                effects.push(Effect::ManualSolve { raw_time_ms });
                effects.push(Effect::RefreshScramble);
            }
        }
    }

    (next, effects)
}

fn start(next: &mut TimerState, effects: &mut Vec<Effect>, at: Instant) {
    next.phase = Phase::Running { started_at: at };
    next.display = ms_to_time(0);
    next.overflow_warned = false;
    effects.push(Effect::StampScramble);
}

fn stop(next: &mut TimerState, effects: &mut Vec<Effect>, started_at: Instant, at: Instant) {
    let elapsed_ms = elapsed_between(started_at, at);
    let display = ms_to_time(elapsed_ms);
    warn_on_overflow(next, effects, elapsed_ms);
    next.display = display.clone();
    next.phase = Phase::Stopped {
        elapsed_ms,
        display,
    };
    effects.push(Effect::ScheduleExport { stopped_at: at });
    effects.push(Effect::RefreshScramble);
}

fn warn_on_overflow(next: &mut TimerState, effects: &mut Vec<Effect>, elapsed_ms: u64) {
    if exceeds_display_range(elapsed_ms) && !next.overflow_warned {
        next.overflow_warned = true;
        effects.push(Effect::HourExceeded { elapsed_ms });
    }
}

fn elapsed_between(started_at: Instant, at: Instant) -> u64 {
    at.saturating_duration_since(started_at).as_millis() as u64
}

/// Parse a manual entry in seconds. Only finite values above zero and no
/// longer than [`format::MAX_SOLVE_MS`] are accepted.
pub fn parse_manual_time(text: &str) -> Option<u64> {
    let seconds: f64 = text.trim().parse().ok()?;
    if !seconds.is_finite() || seconds <= 0.0 {
        return None;
    }
    let ms = (seconds * 1000.0).round();
    (ms <= format::MAX_SOLVE_MS as f64).then_some(ms as u64)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn run(state: &TimerState, events: Vec<TimerEvent>) -> (TimerState, Vec<Effect>) {
        let mut state = state.clone();
        let mut all = Vec::new();
        for event in events {
            let (next, effects) = transition(&state, event);
            state = next;
            all.extend(effects);
        }
        (state, all)
    }

    #[test]
    fn test_key_down_arms_idle_timer() {
        let (state, effects) = transition(&TimerState::default(), TimerEvent::KeyDown);
        assert!(state.is_ready());
        assert!(effects.is_empty());

        // Holding the key (repeat presses) does not re-arm or start.
        let (again, effects) = transition(&state, TimerEvent::KeyDown);
        assert!(again.is_ready());
        assert!(effects.is_empty());
    }

    #[test]
    fn test_release_starts_and_stamps() {
        let t0 = Instant::now();
        let (state, effects) = run(
            &TimerState::default(),
            vec![TimerEvent::KeyDown, TimerEvent::KeyUp { at: t0 }],
        );
        assert_eq!(state.phase, Phase::Running { started_at: t0 });
        assert_eq!(effects, vec![Effect::StampScramble]);
    }

    #[test]
    fn test_release_without_arming_does_nothing() {
        let (state, effects) = transition(
            &TimerState::default(),
            TimerEvent::KeyUp { at: Instant::now() },
        );
        assert!(state.is_idle());
        assert!(effects.is_empty());
    }

    #[test]
    fn test_tick_updates_display() {
        let t0 = Instant::now();
        let (state, _) = run(
            &TimerState::default(),
            vec![
                TimerEvent::KeyDown,
                TimerEvent::KeyUp { at: t0 },
                TimerEvent::Tick {
                    at: t0 + Duration::from_millis(1_234),
                },
            ],
        );
        assert_eq!(state.display, "01.23");
        assert!(state.is_running());
    }

    #[test]
    fn test_stop_captures_time_at_stop_instant() {
        let t0 = Instant::now();
        let stop_at = t0 + Duration::from_millis(12_345);
        let (state, effects) = run(
            &TimerState::default(),
            vec![
                TimerEvent::KeyDown,
                TimerEvent::KeyUp { at: t0 },
                TimerEvent::Tick {
                    at: t0 + Duration::from_millis(12_300),
                },
                TimerEvent::KeyUp { at: stop_at },
            ],
        );
        assert_eq!(
            state.phase,
            Phase::Stopped {
                elapsed_ms: 12_345,
                display: "12.34".to_string(),
            }
        );
        assert!(effects.contains(&Effect::ScheduleExport { stopped_at: stop_at }));
        assert!(effects.contains(&Effect::RefreshScramble));

        // Export uses the captured values no matter how late it fires.
        let (idle, effects) = transition(&state, TimerEvent::ExportDue);
        assert!(idle.is_idle());
        assert_eq!(idle.display, "00.00");
        assert_eq!(
            effects,
            vec![Effect::AppendSolve {
                raw_time_ms: 12_345,
                display: "12.34".to_string(),
            }]
        );
    }

    #[test]
    fn test_pointer_down_stops_running_timer() {
        let t0 = Instant::now();
        let (state, _) = run(
            &TimerState::default(),
            vec![
                TimerEvent::PointerDown { at: t0 },
                TimerEvent::PointerUp { at: t0 },
                TimerEvent::PointerDown {
                    at: t0 + Duration::from_millis(8_000),
                },
                TimerEvent::PointerUp {
                    at: t0 + Duration::from_millis(8_100),
                },
            ],
        );
        assert!(matches!(
            state.phase,
            Phase::Stopped {
                elapsed_ms: 8_000,
                ..
            }
        ));
    }

    #[test]
    fn test_focus_loss_disarms() {
        let (state, _) = run(
            &TimerState::default(),
            vec![TimerEvent::KeyDown, TimerEvent::FocusLost],
        );
        assert!(state.is_idle());
    }

    #[test]
    fn test_focus_loss_does_not_stop_running_timer() {
        let t0 = Instant::now();
        let (state, _) = run(
            &TimerState::default(),
            vec![
                TimerEvent::KeyDown,
                TimerEvent::KeyUp { at: t0 },
                TimerEvent::FocusLost,
            ],
        );
        assert!(state.is_running());
    }

    #[test]
    fn test_manual_mode_suppresses_timing_input() {
        let (manual, _) = transition(&TimerState::default(), TimerEvent::ToggleManual);
        assert!(manual.manual_entry);

        let (state, effects) = run(
            &manual,
            vec![
                TimerEvent::KeyDown,
                TimerEvent::KeyUp { at: Instant::now() },
                TimerEvent::PointerDown { at: Instant::now() },
            ],
        );
        assert!(state.is_idle());
        assert!(effects.is_empty());
    }

    #[test]
    fn test_manual_toggle_ignored_while_running() {
        let t0 = Instant::now();
        let (running, _) = run(
            &TimerState::default(),
            vec![TimerEvent::KeyDown, TimerEvent::KeyUp { at: t0 }],
        );
        let (state, _) = transition(&running, TimerEvent::ToggleManual);
        assert!(state.is_running());
        assert!(!state.manual_entry);
    }

    #[test]
    fn test_manual_submission() {
        let (manual, _) = transition(&TimerState::default(), TimerEvent::ToggleManual);
        let (_, effects) = transition(&manual, TimerEvent::SubmitManual("12.345".to_string()));
        assert_eq!(
            effects,
            vec![
                Effect::ManualSolve {
                    raw_time_ms: 12_345
                },
                Effect::RefreshScramble,
            ]
        );
    }

    #[test]
    fn test_manual_submission_ignored_outside_manual_mode() {
        let (_, effects) = transition(
            &TimerState::default(),
            TimerEvent::SubmitManual("12".to_string()),
        );
        assert!(effects.is_empty());
    }

    #[test]
    fn test_invalid_manual_entries_are_ignored() {
        let (manual, _) = transition(&TimerState::default(), TimerEvent::ToggleManual);
        for text in ["", "abc", "0", "-3", "NaN", "inf", "   "] {
            let (_, effects) = transition(&manual, TimerEvent::SubmitManual(text.to_string()));
            assert!(effects.is_empty(), "accepted {text:?}");
        }
    }

    #[test]
    fn test_parse_manual_time_rounds() {
        assert_eq!(parse_manual_time("9.9996"), Some(10_000));
        assert_eq!(parse_manual_time(" 15 "), Some(15_000));
        assert_eq!(parse_manual_time("0.5"), Some(500));
    }

    #[test]
    fn test_parse_manual_time_rejects_huge_values() {
        assert_eq!(parse_manual_time("86400"), Some(format::MAX_SOLVE_MS));
        assert_eq!(parse_manual_time("86400.01"), None);
        assert_eq!(parse_manual_time("99999999999999999999"), None);
        assert_eq!(parse_manual_time("1e300"), None);
    }

    #[test]
    fn test_hour_overflow_warns_once() {
        let t0 = Instant::now();
        let hour = Duration::from_millis(format::HOUR_MS);
        let (state, effects) = run(
            &TimerState::default(),
            vec![
                TimerEvent::KeyDown,
                TimerEvent::KeyUp { at: t0 },
                TimerEvent::Tick { at: t0 + hour },
                TimerEvent::Tick {
                    at: t0 + hour + Duration::from_secs(1),
                },
            ],
        );
        let warnings = effects
            .iter()
            .filter(|e| matches!(e, Effect::HourExceeded { .. }))
            .count();
        assert_eq!(warnings, 1);
        assert_eq!(state.display, "01:00:01.00");
    }

    #[test]
    fn test_export_without_stop_is_noop() {
        let (state, effects) = transition(&TimerState::default(), TimerEvent::ExportDue);
        assert!(state.is_idle());
        assert!(effects.is_empty());
    }
}
