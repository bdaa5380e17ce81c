//! System metrics panel

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Sparkline, Widget},
};

use crate::core::state::AppState;
use crate::health::Threshold;
use crate::ui::theme::Theme;

const BAR_WIDTH: usize = 16;

pub struct MetricsPanel<'a> {
    state: &'a AppState,
    theme: &'a Theme,
}

impl<'a> MetricsPanel<'a> {
    pub fn new(state: &'a AppState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    /// `LBL ████░░░░ 🟠 72.0%` with the bar colored by level.
    fn bar_line(&self, name: &'a str, value: f32, threshold: &Threshold, suffix: String) -> Line<'a> {
        let style = self.theme.level_style(threshold.level(value));
        let filled = ((value.clamp(0.0, 100.0) / 100.0) * BAR_WIDTH as f32).round() as usize;
        let filled = filled.min(BAR_WIDTH);

        Line::from(vec![
            Span::styled(format!("{:<4}", name), self.theme.styles.muted),
            Span::styled("█".repeat(filled), style),
            Span::styled("░".repeat(BAR_WIDTH - filled), self.theme.styles.muted),
            Span::styled(format!(" {}", threshold.label(value)), style),
            Span::styled(suffix, self.theme.styles.muted),
        ])
    }
}

impl<'a> Widget for MetricsPanel<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title(Span::styled(" SYSTEM ", self.theme.styles.panel_title))
            .borders(Borders::ALL)
            .border_style(self.theme.styles.panel_border)
            .style(Style::default().bg(self.theme.colors.bg_primary));

        let inner = block.inner(area);
        block.render(area, buf);

        let metrics = &self.state.panels.metrics;
        let thresholds = &self.state.thresholds;

        if metrics.last_sample.is_none() {
            let span = Span::styled("Sampling…", self.theme.styles.muted);
            buf.set_span(inner.x + 1, inner.y, &span, inner.width.saturating_sub(2));
            return;
        }

        // CPU label, then the history sparkline
        if inner.height >= 1 {
            let level = thresholds.cpu.level(metrics.cpu_percent);
            let label = format!("CPU {} ", thresholds.cpu.label(metrics.cpu_percent));
            let label_span = Span::styled(&label, self.theme.level_style(level));
            let label_width = Line::from(label.as_str()).width() as u16;
            buf.set_span(inner.x, inner.y, &label_span, label_width);

            let history: Vec<u64> = metrics
                .cpu_history
                .iter()
                .map(|v| v.clamp(0.0, 100.0).round() as u64)
                .collect();
            let spark_width = inner.width.saturating_sub(label_width);
            if spark_width > 0 && !history.is_empty() {
                let skip = history.len().saturating_sub(spark_width as usize);
                Sparkline::default()
                    .data(&history[skip..])
                    .max(100)
                    .style(self.theme.styles.sparkline)
                    .render(
                        Rect {
                            x: inner.x + label_width,
                            y: inner.y,
                            width: spark_width,
                            height: 1,
                        },
                        buf,
                    );
            }
        }

        if inner.height >= 2 {
            let suffix = format!(
                "  {:.1}G/{:.1}G",
                metrics.memory_used_mb as f64 / 1024.0,
                metrics.memory_total_mb as f64 / 1024.0
            );
            let line = self.bar_line("MEM", metrics.memory_percent, &thresholds.memory, suffix);
            buf.set_line(inner.x, inner.y + 1, &line, inner.width);
        }

        if inner.height >= 3 {
            let line = self.bar_line("DSK", metrics.disk_used_percent, &thresholds.disk, String::new());
            buf.set_line(inner.x, inner.y + 2, &line, inner.width);
        }

        if inner.height >= 5 {
            let level = thresholds.overall(
                metrics.cpu_percent,
                metrics.memory_percent,
                metrics.disk_used_percent,
            );
            let span = Span::styled(level.to_string(), self.theme.level_style(level));
            buf.set_span(inner.x, inner.y + 4, &span, inner.width);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::Thresholds;
    use crate::integrations::system::SystemMetrics;

    fn rendered(state: &AppState) -> String {
        let area = Rect::new(0, 0, 60, 7);
        let mut buf = Buffer::empty(area);
        MetricsPanel::new(state, &state.theme).render(area, &mut buf);
        buf.content().iter().map(|c| c.symbol()).collect()
    }

    #[test]
    fn shows_levels_after_first_sample() {
        let mut state = AppState::new(Default::default(), Thresholds::default(), 10);
        assert!(rendered(&state).contains("Sampling"));

        state.panels.metrics.apply(SystemMetrics {
            cpu_percent: 12.0,
            memory_used_mb: 12_288,
            memory_total_mb: 16_384,
            memory_percent: 75.0,
            disk_used_percent: 91.0,
        });
        let text = rendered(&state);
        assert!(text.contains("CPU"));
        assert!(text.contains("75.0%"));
        assert!(text.contains("91.0%"));
        assert!(text.contains("Critical Issues Detected"));
    }
}
