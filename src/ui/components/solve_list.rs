use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use crate::session::solve::SolveRecord;
use crate::stats::{Marker, SessionStats};
use crate::ui::theme::Theme;

/// Solves newest-first. `selected` indexes into that reversed order.
pub struct SolveList<'a> {
    solves: &'a [SolveRecord],
    stats: &'a SessionStats,
    selected: usize,
    focused: bool,
    theme: &'a Theme,
}

impl<'a> SolveList<'a> {
    pub fn new(
        solves: &'a [SolveRecord],
        stats: &'a SessionStats,
        selected: usize,
        focused: bool,
        theme: &'a Theme,
    ) -> Self {
        Self {
            solves,
            stats,
            selected,
            focused,
            theme,
        }
    }
}

impl Widget for SolveList<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let block = Block::bordered()
            .title(" Solves ")
            .border_style(Style::default().fg(if self.focused {
                colors.border_focused()
            } else {
                colors.border()
            }));
        let inner = block.inner(area);
        block.render(area, buf);

        if self.solves.is_empty() {
            Paragraph::new(Span::styled(
                "No solves yet",
                Style::default().fg(colors.muted()),
            ))
            .render(inner, buf);
            return;
        }

        let visible = inner.height as usize;
        // Keep the selection on screen.
        let offset = self.selected.saturating_sub(visible.saturating_sub(1));
        let total = self.solves.len();

        let lines: Vec<Line> = self
            .solves
            .iter()
            .enumerate()
            .rev()
            .skip(offset)
            .take(visible)
            .enumerate()
            .map(|(row, (idx, solve))| {
                let selected = row + offset == self.selected;
                let time_color = if solve.is_dnf() {
                    colors.error()
                } else {
                    match self.stats.marker(solve) {
                        Some(Marker::Best) => colors.best(),
                        Some(Marker::Worst) => colors.worst(),
                        None => colors.fg(),
                    }
                };
                let mut time_style = Style::default().fg(time_color);
                if selected && self.focused {
                    time_style = time_style.add_modifier(Modifier::REVERSED);
                }
                let number_width = total.to_string().len();
                Line::from(vec![
                    Span::styled(
                        format!("{:>number_width$}. ", idx + 1),
                        Style::default().fg(colors.muted()),
                    ),
                    Span::styled(solve.display_time().to_string(), time_style),
                ])
            })
            .collect();

        Paragraph::new(lines).render(inner, buf);
    }
}
