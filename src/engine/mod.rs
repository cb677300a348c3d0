use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::SmallRng;
use tracing::{debug, info, warn};

use crate::schedule::{Clock, SystemClock, Timeout};
use crate::scramble::ScrambleState;
use crate::session::SolveSession;
use crate::session::solve::{Penalty, PuzzleType, SolveId, SolveRecord};
use crate::stats::{SessionStats, chart_series};
use crate::store::backend::KeyValueStore;
use crate::store::debounce::DebouncedSave;
use crate::store::json_store::{DEFAULT_SIZE_WARNING_BYTES, SessionStore};
use crate::timer::{Effect, TimerEvent, TimerState, transition};

#[derive(Clone, Debug)]
pub struct EngineSettings {
    /// Stop-to-record delay.
    pub export_delay: Duration,
    pub save_debounce: Duration,
    /// Delay applied to scramble refreshes the user asks for.
    pub refresh_delay: Duration,
    pub size_warning_bytes: usize,
    pub puzzle: PuzzleType,
    pub manual_entry: bool,
    /// Fixed RNG seed for reproducible scrambles; entropy when `None`.
    pub seed: Option<u64>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            export_delay: Duration::from_millis(500),
            save_debounce: Duration::from_millis(500),
            refresh_delay: Duration::from_millis(500),
            size_warning_bytes: DEFAULT_SIZE_WARNING_BYTES,
            puzzle: PuzzleType::default(),
            manual_entry: false,
            seed: None,
        }
    }
}

/// Things the presentation layer should surface once.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notice {
    ScrambleRefreshed,
    SolveAdded(SolveId),
    HourExceeded { elapsed_ms: u64 },
}

/// Owns every piece of mutable session state and runs the timer's effects.
///
/// The engine never sleeps or spawns. The host calls [`poll`](Self::poll)
/// regularly and the engine fires whichever deadlines have passed according
/// to its [`Clock`].
pub struct SessionEngine<B: KeyValueStore, C: Clock = SystemClock> {
    clock: C,
    settings: EngineSettings,
    timer: TimerState,
    session: SolveSession,
    scramble: ScrambleState,
    stats: SessionStats,
    store: SessionStore<B>,
    save: DebouncedSave,
    export: Timeout,
    refresh: Timeout,
    /// Scramble and puzzle captured when the running solve started.
    stamp: Option<(String, PuzzleType)>,
    notices: Vec<Notice>,
    rng: SmallRng,
    closed: bool,
}

impl<B: KeyValueStore> SessionEngine<B, SystemClock> {
    pub fn open(backend: B, settings: EngineSettings) -> Self {
        Self::open_with_clock(backend, SystemClock, settings)
    }
}

impl<B: KeyValueStore, C: Clock> SessionEngine<B, C> {
    pub fn open_with_clock(backend: B, clock: C, settings: EngineSettings) -> Self {
        let mut store = SessionStore::new(backend).with_size_warning(settings.size_warning_bytes);
        let solves = store.load();
        let session = SolveSession::new(solves);
        let stats = SessionStats::compute(session.solves());

        let mut rng = match settings.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        let scramble = ScrambleState::new(settings.puzzle, &mut rng);
        let timer = TimerState {
            manual_entry: settings.manual_entry,
            ..TimerState::default()
        };

        info!(
            solves = session.len(),
            puzzle = %settings.puzzle,
            "session engine opened"
        );

        Self {
            clock,
            save: DebouncedSave::new(settings.save_debounce),
            settings,
            timer,
            session,
            scramble,
            stats,
            store,
            export: Timeout::default(),
            refresh: Timeout::default(),
            stamp: None,
            notices: Vec::new(),
            rng,
            closed: false,
        }
    }

    // --- input ---

    /// Feed one timer event through the state machine and carry out its effects.
    pub fn handle(&mut self, event: TimerEvent) {
        if self.closed {
            return;
        }
        let (next, effects) = transition(&self.timer, event);
        self.timer = next;
        for effect in effects {
            self.apply(effect);
        }
    }

    pub fn key_down(&mut self) {
        self.handle(TimerEvent::KeyDown);
    }

    pub fn key_up(&mut self) {
        let at = self.clock.now();
        self.handle(TimerEvent::KeyUp { at });
    }

    pub fn pointer_down(&mut self) {
        let at = self.clock.now();
        self.handle(TimerEvent::PointerDown { at });
    }

    pub fn pointer_up(&mut self) {
        let at = self.clock.now();
        self.handle(TimerEvent::PointerUp { at });
    }

    pub fn focus_lost(&mut self) {
        self.handle(TimerEvent::FocusLost);
    }

    pub fn toggle_manual(&mut self) {
        self.handle(TimerEvent::ToggleManual);
    }

    pub fn submit_manual(&mut self, text: &str) {
        self.handle(TimerEvent::SubmitManual(text.to_string()));
    }

    /// Fire everything that is due: the running display tick, the pending
    /// export, a delayed scramble refresh and the debounced save.
    pub fn poll(&mut self) {
        if self.closed {
            return;
        }
        let now = self.clock.now();
        if self.timer.is_running() {
            self.handle(TimerEvent::Tick { at: now });
        }
        if self.export.fire_if_due(now) {
            self.handle(TimerEvent::ExportDue);
        }
        if self.refresh.fire_if_due(now) {
            self.regenerate_scramble();
        }
        if self.save.take_due(now) {
            self.store.save(self.session.solves());
        }
    }

    fn apply(&mut self, effect: Effect) {
        match effect {
            Effect::StampScramble => {
                self.stamp = Some((self.scramble.current().to_string(), self.scramble.puzzle()));
            }
            Effect::ScheduleExport { stopped_at } => {
                self.export.arm(stopped_at, self.settings.export_delay);
            }
            Effect::RefreshScramble => self.regenerate_scramble(),
            Effect::AppendSolve {
                raw_time_ms,
                display: shown,
            } => {
                let (scramble, puzzle) = self.stamp.take().unwrap_or_else(|| {
                    (self.scramble.current().to_string(), self.scramble.puzzle())
                });
                if let Some(solve) = self.add_solve(raw_time_ms, &scramble, puzzle) {
                    debug!(id = %solve.id(), shown = %shown, "timed solve recorded");
                }
            }
            Effect::ManualSolve { raw_time_ms } => {
                let scramble = self.scramble.current().to_string();
                let puzzle = self.scramble.puzzle();
                self.add_solve(raw_time_ms, &scramble, puzzle);
            }
            Effect::HourExceeded { elapsed_ms } => {
                warn!("solve passed one hour ({elapsed_ms} ms), display is in hours now");
                self.notices.push(Notice::HourExceeded { elapsed_ms });
            }
        }
    }

    // --- session mutation ---

    /// Append a record; persistence is deferred. `None` once the engine is closed.
    pub fn add_solve(
        &mut self,
        raw_time_ms: u64,
        scramble: &str,
        puzzle: PuzzleType,
    ) -> Option<SolveRecord> {
        if self.rejects_mutation("add solve") {
            return None;
        }
        let solve = SolveRecord::new(raw_time_ms, scramble, puzzle);
        self.session.push(solve.clone());
        debug!(id = %solve.id(), time = %solve.display_time(), "solve added");
        self.notices.push(Notice::SolveAdded(solve.id().clone()));
        self.mutated();
        Some(solve)
    }

    pub fn delete_solve(&mut self, id: &SolveId) -> bool {
        if self.rejects_mutation("delete solve") {
            return false;
        }
        let removed = self.session.delete(id).is_some();
        if removed {
            debug!(%id, "solve deleted");
            self.mutated();
        }
        removed
    }

    pub fn delete_last_solve(&mut self) -> Option<SolveRecord> {
        if self.rejects_mutation("delete last solve") {
            return None;
        }
        let removed = self.session.delete_last()?;
        debug!(id = %removed.id(), "last solve deleted");
        self.mutated();
        Some(removed)
    }

    pub fn apply_penalty(&mut self, id: &SolveId, penalty: Penalty) -> bool {
        if self.rejects_mutation("apply penalty") {
            return false;
        }
        let applied = self.session.apply_penalty(id, penalty);
        if applied {
            debug!(%id, penalty = penalty.as_str(), "penalty applied");
            self.mutated();
        }
        applied
    }

    pub fn clear_session(&mut self) {
        if self.rejects_mutation("clear session") {
            return;
        }
        info!(count = self.session.len(), "session cleared");
        self.session.clear();
        self.mutated();
    }

    /// After shutdown the final flush has happened, so later edits could never be saved.
    fn rejects_mutation(&self, action: &str) -> bool {
        if self.closed {
            warn!(action, "session engine is closed, ignoring");
        }
        self.closed
    }

    fn mutated(&mut self) {
        self.stats = SessionStats::compute(self.session.solves());
        self.save.schedule(self.clock.now());
    }

    // --- detail view ---

    pub fn open_detail(&mut self, id: &SolveId) -> bool {
        self.session.open_detail(id)
    }

    pub fn close_detail(&mut self) {
        self.session.close_detail();
    }

    pub fn selected_solve(&self) -> Option<&SolveRecord> {
        self.session.selected_solve()
    }

    pub fn solve_number(&self, id: &SolveId) -> usize {
        self.session.solve_number(id)
    }

    // --- scramble ---

    /// Switching puzzles regenerates right away and drops any delayed refresh.
    pub fn set_puzzle(&mut self, puzzle: PuzzleType) {
        if self.rejects_mutation("set puzzle") {
            return;
        }
        self.refresh.cancel();
        self.scramble.set_puzzle(puzzle, &mut self.rng);
        self.notices.push(Notice::ScrambleRefreshed);
    }

    /// Ask for a new scramble after the refresh delay.
    pub fn request_scramble_refresh(&mut self) {
        if self.closed {
            return;
        }
        self.refresh.arm(self.clock.now(), self.settings.refresh_delay);
    }

    pub fn refresh_pending(&self) -> bool {
        self.refresh.is_armed()
    }

    fn regenerate_scramble(&mut self) {
        self.scramble.regenerate(&mut self.rng);
        self.notices.push(Notice::ScrambleRefreshed);
    }

    // --- read access ---

    pub fn solves(&self) -> &[SolveRecord] {
        self.session.solves()
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn chart_series(&self) -> Vec<Option<f64>> {
        chart_series(self.session.solves())
    }

    pub fn scramble(&self) -> &str {
        self.scramble.current()
    }

    pub fn puzzle(&self) -> PuzzleType {
        self.scramble.puzzle()
    }

    pub fn timer(&self) -> &TimerState {
        &self.timer
    }

    pub fn display(&self) -> &str {
        &self.timer.display
    }

    pub fn is_ready(&self) -> bool {
        self.timer.is_ready()
    }

    pub fn is_running(&self) -> bool {
        self.timer.is_running()
    }

    pub fn manual_entry(&self) -> bool {
        self.timer.manual_entry
    }

    pub fn save_pending(&self) -> bool {
        self.save.is_pending()
    }

    pub fn export_pending(&self) -> bool {
        self.export.is_armed()
    }

    pub fn backend(&self) -> &B {
        self.store.backend()
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    // --- teardown ---

    /// Cancel every pending deadline, then write the session synchronously.
    /// A solve still waiting for its export is discarded. Idempotent.
    pub fn shutdown(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        let dropped_export = self.export.is_armed();
        self.export.cancel();
        self.refresh.cancel();
        self.save.cancel();
        self.stamp = None;
        if dropped_export {
            warn!("shutting down during export delay, last solve not recorded");
        }

        self.store.save(self.session.solves());
        info!(solves = self.session.len(), "session engine closed");
    }
}

impl<B: KeyValueStore, C: Clock> Drop for SessionEngine<B, C> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::ManualClock;
    use crate::store::backend::MemoryStore;
    use crate::store::schema::SESSION_KEY;

    fn engine() -> (ManualClock, SessionEngine<MemoryStore, ManualClock>) {
        let clock = ManualClock::new();
        let settings = EngineSettings {
            seed: Some(7),
            ..EngineSettings::default()
        };
        let engine = SessionEngine::open_with_clock(MemoryStore::new(), clock.clone(), settings);
        (clock, engine)
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_timed_solve_uses_scramble_from_start() {
        let (clock, mut engine) = engine();
        let scramble_at_start = engine.scramble().to_string();

        engine.key_down();
        assert!(engine.is_ready());
        engine.key_up();
        assert!(engine.is_running());

        clock.advance(ms(9_870));
        engine.key_up();
        // The new scramble appears right after the stop.
        assert_ne!(engine.scramble(), scramble_at_start);
        assert!(engine.solves().is_empty());

        clock.advance(ms(500));
        engine.poll();
        assert_eq!(engine.solves().len(), 1);
        let solve = &engine.solves()[0];
        assert_eq!(solve.raw_time_ms(), 9_870);
        assert_eq!(solve.display_time(), "09.87");
        assert_eq!(solve.scramble(), scramble_at_start);
        assert_eq!(engine.display(), "00.00");
    }

    #[test]
    fn test_export_waits_full_delay() {
        let (clock, mut engine) = engine();
        engine.key_down();
        engine.key_up();
        clock.advance(ms(1_000));
        engine.key_up();

        clock.advance(ms(499));
        engine.poll();
        assert!(engine.solves().is_empty());
        assert!(engine.export_pending());

        clock.advance(ms(1));
        engine.poll();
        assert_eq!(engine.solves().len(), 1);
    }

    #[test]
    fn test_poll_ticks_running_display() {
        let (clock, mut engine) = engine();
        engine.key_down();
        engine.key_up();
        clock.advance(ms(3_456));
        engine.poll();
        assert_eq!(engine.display(), "03.45");
    }

    #[test]
    fn test_manual_entry_records_current_scramble() {
        let (_clock, mut engine) = engine();
        engine.toggle_manual();
        let scramble = engine.scramble().to_string();
        engine.submit_manual("12.5");

        assert_eq!(engine.solves().len(), 1);
        assert_eq!(engine.solves()[0].raw_time_ms(), 12_500);
        assert_eq!(engine.solves()[0].scramble(), scramble);
        assert_ne!(engine.scramble(), scramble);

        engine.submit_manual("-1");
        assert_eq!(engine.solves().len(), 1);
    }

    #[test]
    fn test_oversized_manual_entry_is_ignored() {
        let (_clock, mut engine) = engine();
        engine.toggle_manual();
        engine.submit_manual("99999999999999999999");
        assert!(engine.solves().is_empty());

        engine.submit_manual("86400");
        let id = engine.solves()[0].id().clone();
        assert!(engine.apply_penalty(&id, Penalty::PlusTwo));
        assert_eq!(engine.solves()[0].display_time(), "24:00:02.00+");
    }

    #[test]
    fn test_mutations_recompute_stats() {
        let (_clock, mut engine) = engine();
        for secs in [10, 14, 12, 11, 13] {
            engine.add_solve(secs * 1_000, "R U", PuzzleType::Cube3);
        }
        assert_eq!(engine.stats().ao5.to_string(), "12.00");

        let last = engine.solves()[4].id().clone();
        engine.apply_penalty(&last, Penalty::Dnf);
        // DNF replaces 13 as the dropped worst: 11, 12, 14 remain.
        assert_eq!(engine.stats().ao5.to_string(), "12.33");

        engine.delete_solve(&last);
        assert_eq!(engine.stats().ao5.to_string(), "--");

        engine.clear_session();
        assert_eq!(engine.stats().count, 0);
    }

    #[test]
    fn test_saves_are_debounced() {
        let (clock, mut engine) = engine();
        for _ in 0..4 {
            engine.add_solve(10_000, "R", PuzzleType::Cube3);
            clock.advance(ms(100));
        }
        engine.poll();
        assert_eq!(engine.backend().writes(), 0);

        clock.advance(ms(400));
        engine.poll();
        assert_eq!(engine.backend().writes(), 1);
        assert!(!engine.save_pending());
    }

    #[test]
    fn test_requested_refresh_is_delayed() {
        let (clock, mut engine) = engine();
        let before = engine.scramble().to_string();
        engine.request_scramble_refresh();
        engine.poll();
        assert_eq!(engine.scramble(), before);

        clock.advance(ms(500));
        engine.poll();
        assert_ne!(engine.scramble(), before);
    }

    #[test]
    fn test_puzzle_change_is_immediate() {
        let (_clock, mut engine) = engine();
        engine.request_scramble_refresh();
        engine.set_puzzle(PuzzleType::Megaminx);
        assert_eq!(engine.puzzle(), PuzzleType::Megaminx);
        assert!(engine.scramble().contains("R++") || engine.scramble().contains("R--"));
        assert!(!engine.refresh_pending());
    }

    #[test]
    fn test_shutdown_flushes_and_stops_everything() {
        let (clock, mut engine) = engine();
        engine.add_solve(10_000, "R", PuzzleType::Cube3);
        assert!(engine.save_pending());

        engine.shutdown();
        assert_eq!(engine.backend().writes(), 1);
        assert!(engine.backend().raw(SESSION_KEY).is_some());

        // Nothing fires after teardown.
        clock.advance(ms(5_000));
        engine.poll();
        engine.key_down();
        assert_eq!(engine.backend().writes(), 1);
        assert!(!engine.is_ready());

        engine.shutdown();
        assert_eq!(engine.backend().writes(), 1);
    }

    #[test]
    fn test_mutations_after_shutdown_are_ignored() {
        let (clock, mut engine) = engine();
        let kept = engine.add_solve(10_000, "R", PuzzleType::Cube3).unwrap();
        engine.shutdown();
        let puzzle = engine.puzzle();
        let scramble = engine.scramble().to_string();

        assert!(engine.add_solve(11_000, "U", PuzzleType::Cube3).is_none());
        assert!(!engine.apply_penalty(kept.id(), Penalty::Dnf));
        assert!(!engine.delete_solve(kept.id()));
        assert!(engine.delete_last_solve().is_none());
        engine.clear_session();
        engine.set_puzzle(puzzle.next());

        assert_eq!(engine.solves(), std::slice::from_ref(&kept));
        assert_eq!(engine.puzzle(), puzzle);
        assert_eq!(engine.scramble(), scramble);
        assert!(!engine.save_pending());
        clock.advance(ms(1_000));
        engine.poll();
        assert_eq!(engine.backend().writes(), 1);
    }

    #[test]
    fn test_hour_overflow_raises_notice() {
        let (clock, mut engine) = engine();
        engine.key_down();
        engine.key_up();
        engine.take_notices();

        clock.advance(Duration::from_secs(3_600));
        engine.poll();
        clock.advance(ms(10));
        engine.poll();
        let notices = engine.take_notices();
        assert_eq!(
            notices,
            vec![Notice::HourExceeded {
                elapsed_ms: 3_600_000
            }]
        );
    }
}
