use tracing::warn;

use crate::config::Config;
use crate::engine::{EngineSettings, Notice, SessionEngine};
use crate::schedule::{Clock, SystemClock};
use crate::session::solve::{Penalty, SolveId, SolveRecord};
use crate::store::backend::{FileStore, KeyValueStore};
use crate::timer::format::ms_to_time;
use crate::ui::line_input::{InputResult, TimeInput};
use crate::ui::theme::Theme;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppScreen {
    Timer,
    Stats,
}

/// Which pane receives navigation keys on the timer screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Focus {
    Timer,
    SolveList,
}

pub struct App<B: KeyValueStore = FileStore, C: Clock = SystemClock> {
    pub screen: AppScreen,
    pub focus: Focus,
    pub engine: SessionEngine<B, C>,
    pub time_input: TimeInput,
    /// Index into the solve list shown newest-first.
    pub list_selected: usize,
    pub confirm_clear: bool,
    pub warning: Option<String>,
    pub theme: &'static Theme,
    pub config: Config,
    pub should_quit: bool,
}

impl<B: KeyValueStore> App<B, SystemClock> {
    pub fn new(config: Config, backend: B, settings: EngineSettings) -> Self {
        let engine = SessionEngine::open(backend, settings);
        Self::with_engine(config, engine)
    }
}

impl<B: KeyValueStore, C: Clock> App<B, C> {
    pub fn with_engine(config: Config, engine: SessionEngine<B, C>) -> Self {
        let loaded_theme = Theme::load(&config.theme).unwrap_or_else(|| {
            warn!("unknown theme {:?}, using default", config.theme);
            Theme::default()
        });
        let theme: &'static Theme = Box::leak(Box::new(loaded_theme));

        Self {
            screen: AppScreen::Timer,
            focus: Focus::Timer,
            engine,
            time_input: TimeInput::default(),
            list_selected: 0,
            confirm_clear: false,
            warning: None,
            theme,
            config,
            should_quit: false,
        }
    }

    // --- timing input ---

    pub fn space_down(&mut self) {
        self.engine.key_down();
    }

    pub fn space_up(&mut self) {
        self.engine.key_up();
    }

    /// Terminals without release events: one press arms and starts, the next stops.
    pub fn space_tap(&mut self) {
        if self.engine.is_running() {
            self.engine.key_up();
        } else {
            self.engine.key_down();
            self.engine.key_up();
        }
    }

    pub fn pointer_down(&mut self) {
        self.engine.pointer_down();
    }

    pub fn pointer_up(&mut self) {
        self.engine.pointer_up();
    }

    pub fn focus_lost(&mut self) {
        self.engine.focus_lost();
    }

    pub fn toggle_manual(&mut self) {
        self.engine.toggle_manual();
        self.time_input.clear();
    }

    /// Route a key to the manual entry line. Returns true if the key was consumed.
    pub fn manual_key(&mut self, key: crossterm::event::KeyEvent) -> bool {
        match self.time_input.handle(key) {
            InputResult::Submit => {
                let before = self.engine.solves().len();
                self.engine.submit_manual(self.time_input.value());
                if self.engine.solves().len() > before {
                    self.time_input.clear();
                }
                true
            }
            InputResult::Cancel => {
                self.toggle_manual();
                true
            }
            InputResult::Continue => true,
        }
    }

    // --- scramble ---

    pub fn cycle_puzzle(&mut self) {
        let next = self.engine.puzzle().next();
        self.engine.set_puzzle(next);
        self.config.puzzle_type = next.key().to_string();
    }

    pub fn refresh_scramble(&mut self) {
        self.engine.request_scramble_refresh();
    }

    // --- solve list ---

    /// Maps the newest-first selection back to a session record.
    pub fn selected_record(&self) -> Option<&SolveRecord> {
        let solves = self.engine.solves();
        let idx = solves.len().checked_sub(self.list_selected + 1)?;
        solves.get(idx)
    }

    fn selected_id(&self) -> Option<SolveId> {
        self.selected_record().map(|s| s.id().clone())
    }

    pub fn select_next(&mut self) {
        let len = self.engine.solves().len();
        if len > 0 {
            self.list_selected = (self.list_selected + 1).min(len - 1);
        }
    }

    pub fn select_prev(&mut self) {
        self.list_selected = self.list_selected.saturating_sub(1);
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Timer if !self.engine.solves().is_empty() => Focus::SolveList,
            _ => Focus::Timer,
        };
    }

    pub fn open_selected_detail(&mut self) -> bool {
        match self.selected_id() {
            Some(id) => self.engine.open_detail(&id),
            None => false,
        }
    }

    pub fn close_detail(&mut self) {
        self.engine.close_detail();
    }

    pub fn detail_open(&self) -> bool {
        self.engine.selected_solve().is_some()
    }

    /// Penalize the solve in the detail view, or the list selection if none is open.
    pub fn penalize(&mut self, penalty: Penalty) {
        let target = self
            .engine
            .selected_solve()
            .map(|s| s.id().clone())
            .or_else(|| self.selected_id());
        if let Some(id) = target {
            self.engine.apply_penalty(&id, penalty);
        }
    }

    pub fn delete_selected(&mut self) {
        let target = self
            .engine
            .selected_solve()
            .map(|s| s.id().clone())
            .or_else(|| self.selected_id());
        if let Some(id) = target {
            self.engine.delete_solve(&id);
        }
        self.clamp_selection();
    }

    pub fn delete_last(&mut self) {
        self.engine.delete_last_solve();
        self.clamp_selection();
    }

    pub fn request_clear(&mut self) {
        if !self.engine.solves().is_empty() {
            self.confirm_clear = true;
        }
    }

    pub fn confirm_clear(&mut self, yes: bool) {
        if yes {
            self.engine.clear_session();
            self.list_selected = 0;
            self.focus = Focus::Timer;
        }
        self.confirm_clear = false;
    }

    fn clamp_selection(&mut self) {
        let len = self.engine.solves().len();
        self.list_selected = self.list_selected.min(len.saturating_sub(1));
        if len == 0 {
            self.focus = Focus::Timer;
        }
    }

    // --- screens ---

    pub fn go_to_stats(&mut self) {
        self.screen = AppScreen::Stats;
    }

    pub fn go_to_timer(&mut self) {
        self.screen = AppScreen::Timer;
    }

    // --- lifecycle ---

    /// Drive scheduled work and turn engine notices into UI state.
    pub fn on_tick(&mut self) {
        self.engine.poll();
        for notice in self.engine.take_notices() {
            match notice {
                Notice::HourExceeded { elapsed_ms } => {
                    self.warning = Some(format!(
                        "Over an hour ({}), time shown in hours",
                        ms_to_time(elapsed_ms)
                    ));
                }
                Notice::SolveAdded(_) => {
                    self.warning = None;
                    self.list_selected = 0;
                }
                Notice::ScrambleRefreshed => {}
            }
        }
    }

    pub fn quit(&mut self) {
        self.engine.shutdown();
        self.should_quit = true;
    }
}
