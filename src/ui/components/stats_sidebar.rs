use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use crate::stats::{SessionStats, Stat};
use crate::ui::theme::Theme;

pub struct StatsSidebar<'a> {
    stats: &'a SessionStats,
    theme: &'a Theme,
}

impl<'a> StatsSidebar<'a> {
    pub fn new(stats: &'a SessionStats, theme: &'a Theme) -> Self {
        Self { stats, theme }
    }

    /// One-line summary for layouts without room for the sidebar.
    pub fn summary(stats: &SessionStats) -> String {
        format!(
            "solves {}  best {}  ao5 {}  ao12 {}",
            stats.count, stats.best, stats.ao5, stats.ao12
        )
    }
}

impl Widget for StatsSidebar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let label = Style::default().fg(colors.muted());

        let stat_line = |name: &'static str, stat: Stat, value_color: Color| {
            let style = match stat {
                Stat::Insufficient => Style::default().fg(colors.muted()),
                Stat::Dnf => Style::default().fg(colors.error()),
                Stat::Time(_) => Style::default().fg(value_color),
            };
            Line::from(vec![
                Span::styled(format!("{name:<7}"), label),
                Span::styled(stat.to_string(), style.add_modifier(Modifier::BOLD)),
            ])
        };

        let lines = vec![
            Line::from(vec![
                Span::styled(format!("{:<7}", "Solves"), label),
                Span::styled(
                    self.stats.count.to_string(),
                    Style::default().fg(colors.fg()),
                ),
                Span::styled(
                    format!("  ({} DNF)", self.stats.dnf_count),
                    Style::default().fg(colors.muted()),
                ),
            ]),
            Line::from(""),
            stat_line("Best", self.stats.best, colors.best()),
            stat_line("Worst", self.stats.worst, colors.worst()),
            Line::from(""),
            stat_line("Ao5", self.stats.ao5, colors.accent()),
            stat_line("Ao12", self.stats.ao12, colors.accent()),
            Line::from(""),
            stat_line("Mean", self.stats.mean, colors.fg()),
            stat_line("Avg", self.stats.average, colors.fg()),
        ];

        let block = Block::bordered()
            .title(" Stats ")
            .border_style(Style::default().fg(colors.border()))
            .style(Style::default().bg(colors.bg()));

        Paragraph::new(lines).block(block).render(area, buf);
    }
}
