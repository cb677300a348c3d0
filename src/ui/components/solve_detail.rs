use chrono::{Local, TimeZone};
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Clear, Paragraph, Widget, Wrap};

use crate::session::solve::{Penalty, SolveRecord};
use crate::timer::format::ms_to_time;
use crate::ui::theme::Theme;

/// Popup for one solve: time, penalty, scramble and when it was recorded.
pub struct SolveDetail<'a> {
    solve: &'a SolveRecord,
    number: usize,
    theme: &'a Theme,
}

impl<'a> SolveDetail<'a> {
    pub fn new(solve: &'a SolveRecord, number: usize, theme: &'a Theme) -> Self {
        Self {
            solve,
            number,
            theme,
        }
    }
}

pub fn local_date(timestamp_ms: i64) -> String {
    match Local.timestamp_millis_opt(timestamp_ms).single() {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => "unknown".to_string(),
    }
}

impl Widget for SolveDetail<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let label = Style::default().fg(colors.muted());
        let solve = self.solve;

        let time_color = if solve.is_dnf() {
            colors.error()
        } else {
            colors.fg()
        };
        let mut time_spans = vec![
            Span::styled("Time      ", label),
            Span::styled(
                solve.display_time().to_string(),
                Style::default().fg(time_color).add_modifier(Modifier::BOLD),
            ),
        ];
        if solve.penalty() != Penalty::None {
            time_spans.push(Span::styled(
                format!("  (original {})", ms_to_time(solve.raw_time_ms())),
                label,
            ));
        }

        let lines = vec![
            Line::from(time_spans),
            Line::from(vec![
                Span::styled("Penalty   ", label),
                Span::styled(solve.penalty().as_str(), Style::default().fg(colors.fg())),
            ]),
            Line::from(vec![
                Span::styled("Puzzle    ", label),
                Span::styled(
                    solve.puzzle_type().label(),
                    Style::default().fg(colors.fg()),
                ),
            ]),
            Line::from(vec![
                Span::styled("Date      ", label),
                Span::styled(local_date(solve.timestamp()), Style::default().fg(colors.fg())),
            ]),
            Line::from(""),
            Line::from(Span::styled("Scramble", label)),
            Line::from(Span::styled(
                solve.scramble().to_string(),
                Style::default().fg(colors.fg()),
            )),
            Line::from(""),
            Line::from(Span::styled(
                "[2] +2  [d] DNF  [n] no penalty  [x] delete  [Esc] close",
                Style::default().fg(colors.accent()),
            )),
        ];

        let block = Block::bordered()
            .title(format!(" Solve #{} ", self.number))
            .border_style(Style::default().fg(colors.border_focused()))
            .style(Style::default().bg(colors.bg()));

        Clear.render(area, buf);
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(block)
            .render(area, buf);
    }
}
