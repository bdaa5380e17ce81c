//! Header widget

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Widget,
};

use crate::core::state::AppState;
use crate::ui::theme::Theme;

pub struct Header<'a> {
    state: &'a AppState,
    theme: &'a Theme,
}

impl<'a> Header<'a> {
    pub fn new(state: &'a AppState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }
}

impl<'a> Widget for Header<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        buf.set_style(area, self.theme.styles.header);

        let metrics = &self.state.panels.metrics;
        let separator = || Span::styled(" │ ", self.theme.styles.muted);

        let mut spans = vec![
            Span::styled(
                " ♥ VITALS ",
                Style::default()
                    .fg(self.theme.colors.accent_primary)
                    .add_modifier(Modifier::BOLD),
            ),
            separator(),
            Span::styled(
                self.state.hostname.as_str(),
                Style::default().fg(self.theme.colors.fg_primary),
            ),
        ];

        if metrics.last_sample.is_some() {
            let level = self.state.thresholds.overall(
                metrics.cpu_percent,
                metrics.memory_percent,
                metrics.disk_used_percent,
            );
            spans.push(separator());
            spans.push(Span::styled(level.to_string(), self.theme.level_style(level)));
        }

        if let Some(switch) = &self.state.switch {
            spans.push(separator());
            spans.push(Span::styled(
                format!("switch {}", switch),
                Style::default().fg(self.theme.colors.info),
            ));
        }

        buf.set_line(area.x, area.y, &Line::from(spans), area.width);

        let time = chrono::Local::now().format("%H:%M:%S").to_string();
        let time_span = Span::styled(&time, self.theme.styles.muted);
        let time_x = area.x + area.width.saturating_sub(time.len() as u16 + 1);
        buf.set_span(time_x, area.y, &time_span, time.len() as u16);
    }
}
