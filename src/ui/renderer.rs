//! Main UI renderer

use ratatui::{
    layout::Rect,
    style::Style,
    text::Span,
    widgets::{Block, Clear, Paragraph},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::core::state::{AppMode, AppState, NotificationLevel};
use crate::ui::layout::LayoutManager;
use crate::ui::widgets::*;

const NOTIFICATION_WIDTH: u16 = 48;

pub struct Renderer;

impl Renderer {
    pub fn render(frame: &mut Frame, state: &AppState) {
        let area = frame.area();
        let theme = &state.theme;

        frame.render_widget(
            Block::default().style(Style::default().bg(theme.colors.bg_primary)),
            area,
        );

        let layout = LayoutManager::compute(area);

        frame.render_widget(Header::new(state, theme), layout.header);
        frame.render_widget(Footer::new(state, theme), layout.footer);
        frame.render_widget(MetricsPanel::new(state, theme), layout.metrics_panel);
        frame.render_widget(NetworkPanel::new(state, theme), layout.network_panel);
        frame.render_widget(OutputPanel::new(state, theme), layout.output_panel);

        if state.mode == AppMode::Help {
            frame.render_widget(HelpOverlay::new(theme), layout.overlay_area);
        }

        Self::render_notifications(frame, state);
    }

    /// Stacked in the top-right corner, newest last.
    fn render_notifications(frame: &mut Frame, state: &AppState) {
        let theme = &state.theme;
        let area = frame.area();

        let mut y = area.y + 2;
        for notification in state.notifications.iter().rev().take(3).rev() {
            if y >= area.bottom() {
                break;
            }
            let (icon, style) = match notification.level {
                NotificationLevel::Info => ("ℹ", theme.styles.notification_info),
                NotificationLevel::Success => ("✓", theme.styles.notification_success),
                NotificationLevel::Warning => ("⚠", theme.styles.stressed),
                NotificationLevel::Error => ("✗", theme.styles.notification_error),
            };

            let msg = format!(" {} {} ", icon, notification.message);
            let width = (msg.width() as u16).min(NOTIFICATION_WIDTH).min(area.width);
            let rect = Rect {
                x: area.x + area.width.saturating_sub(width + 2),
                y,
                width,
                height: 1,
            };

            frame.render_widget(Clear, rect);
            frame.render_widget(
                Paragraph::new(Span::styled(msg, style))
                    .style(Style::default().bg(theme.colors.bg_secondary)),
                rect,
            );

            y += 2;
        }
    }
}
