use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::Style;
use ratatui::widgets::{Block, Paragraph, Widget, Wrap};

use crate::session::solve::PuzzleType;
use crate::ui::theme::Theme;

pub struct ScrambleBar<'a> {
    scramble: &'a str,
    puzzle: PuzzleType,
    theme: &'a Theme,
}

impl<'a> ScrambleBar<'a> {
    pub fn new(scramble: &'a str, puzzle: PuzzleType, theme: &'a Theme) -> Self {
        Self {
            scramble,
            puzzle,
            theme,
        }
    }
}

impl Widget for ScrambleBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let block = Block::bordered()
            .title(format!(" {} ", self.puzzle.label()))
            .border_style(Style::default().fg(colors.border_focused()));

        Paragraph::new(self.scramble)
            .style(Style::default().fg(colors.fg()))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(block)
            .render(area, buf);
    }
}
