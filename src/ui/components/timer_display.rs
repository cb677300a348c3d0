use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use crate::timer::{Phase, TimerState};
use crate::ui::line_input::TimeInput;
use crate::ui::theme::Theme;

/// The clock face, or the manual entry line while manual mode is on.
pub struct TimerDisplay<'a> {
    timer: &'a TimerState,
    input: &'a TimeInput,
    warning: Option<&'a str>,
    theme: &'a Theme,
}

impl<'a> TimerDisplay<'a> {
    pub fn new(
        timer: &'a TimerState,
        input: &'a TimeInput,
        warning: Option<&'a str>,
        theme: &'a Theme,
    ) -> Self {
        Self {
            timer,
            input,
            warning,
            theme,
        }
    }
}

impl Widget for TimerDisplay<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let block = Block::bordered()
            .border_style(Style::default().fg(if self.timer.is_ready() {
                colors.timer_ready()
            } else {
                colors.border()
            }))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Fill(1),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Fill(1),
            ])
            .split(inner);

        let main_line = if self.timer.manual_entry {
            let (before, cursor, after) = self.input.render_parts();
            let cursor_style = Style::default().fg(colors.bg()).bg(colors.fg());
            Line::from(vec![
                Span::styled(before.to_string(), Style::default().fg(colors.fg())),
                Span::styled(cursor.unwrap_or(' ').to_string(), cursor_style),
                Span::styled(after.to_string(), Style::default().fg(colors.fg())),
                Span::styled(" s", Style::default().fg(colors.muted())),
            ])
        } else {
            let color = match self.timer.phase {
                Phase::Ready => colors.timer_ready(),
                Phase::Running { .. } => colors.timer_running(),
                _ => colors.timer_idle(),
            };
            Line::from(Span::styled(
                self.timer.display.clone(),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ))
        };
        Paragraph::new(main_line)
            .alignment(Alignment::Center)
            .render(rows[1], buf);

        let hint = match (&self.timer.phase, self.timer.manual_entry) {
            (_, true) => "type a time in seconds, Enter to add",
            (Phase::Ready, false) => "release to start",
            (Phase::Running { .. }, false) => "press to stop",
            _ => "hold Space",
        };
        Paragraph::new(Line::from(Span::styled(
            hint,
            Style::default().fg(colors.muted()),
        )))
        .alignment(Alignment::Center)
        .render(rows[3], buf);

        if let Some(warning) = self.warning {
            Paragraph::new(Line::from(Span::styled(
                warning.to_string(),
                Style::default().fg(colors.warning()),
            )))
            .alignment(Alignment::Center)
            .render(rows[2], buf);
        }
    }
}
