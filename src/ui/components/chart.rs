use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::symbols;
use ratatui::widgets::{Axis, Block, Chart, Dataset, GraphType, Paragraph, Widget};

use crate::ui::theme::Theme;

/// Solve times over the session, in seconds. DNF solves break the line.
pub struct SolveChart<'a> {
    series: &'a [Option<f64>],
    theme: &'a Theme,
}

impl<'a> SolveChart<'a> {
    pub fn new(series: &'a [Option<f64>], theme: &'a Theme) -> Self {
        Self { series, theme }
    }
}

/// Contiguous runs of (solve number, seconds) between DNF gaps.
pub fn segments(series: &[Option<f64>]) -> Vec<Vec<(f64, f64)>> {
    let mut out = Vec::new();
    let mut current = Vec::new();
    for (i, point) in series.iter().enumerate() {
        match point {
            Some(secs) => current.push(((i + 1) as f64, *secs)),
            None if !current.is_empty() => out.push(std::mem::take(&mut current)),
            None => {}
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

impl Widget for SolveChart<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let block = Block::bordered()
            .title(" Times ")
            .border_style(Style::default().fg(colors.border()));

        let runs = segments(self.series);
        if runs.is_empty() {
            Paragraph::new("No timed solves yet")
                .style(Style::default().fg(colors.muted()))
                .block(block)
                .render(area, buf);
            return;
        }

        let max_x = self.series.len().max(2) as f64;
        let max_y = runs
            .iter()
            .flatten()
            .map(|(_, y)| *y)
            .fold(0.0f64, f64::max)
            .max(1.0);

        let datasets = runs
            .iter()
            .map(|run| {
                Dataset::default()
                    .marker(symbols::Marker::Braille)
                    .graph_type(GraphType::Line)
                    .style(Style::default().fg(colors.accent()))
                    .data(run)
            })
            .collect();

        let chart = Chart::new(datasets)
            .block(block)
            .x_axis(
                Axis::default()
                    .title("Solve #")
                    .style(Style::default().fg(colors.muted()))
                    .bounds([1.0, max_x]),
            )
            .y_axis(
                Axis::default()
                    .title("s")
                    .style(Style::default().fg(colors.muted()))
                    .bounds([0.0, max_y * 1.1])
                    .labels(["0".to_string(), format!("{:.0}", max_y * 1.1)]),
            );

        chart.render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segments_split_on_dnf() {
        let series = [Some(10.0), Some(12.0), None, Some(9.5), None];
        assert_eq!(
            segments(&series),
            vec![vec![(1.0, 10.0), (2.0, 12.0)], vec![(4.0, 9.5)]]
        );
        assert!(segments(&[None, None]).is_empty());
    }
}
