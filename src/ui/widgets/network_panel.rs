//! Network interfaces and their switch ports

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};

use crate::core::state::{AppState, FocusedPanel, PortStatus};
use crate::ui::theme::Theme;

pub struct NetworkPanel<'a> {
    state: &'a AppState,
    theme: &'a Theme,
}

impl<'a> NetworkPanel<'a> {
    pub fn new(state: &'a AppState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    fn port_style(&self, status: &PortStatus) -> Style {
        match status {
            PortStatus::Found(_) => self.theme.styles.healthy,
            PortStatus::Resolving => Style::default().fg(self.theme.colors.info),
            PortStatus::Failed(_) => self.theme.styles.notification_error,
            PortStatus::Unchecked | PortStatus::NotFound => self.theme.styles.muted,
        }
    }
}

impl<'a> Widget for NetworkPanel<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let focused = self.state.focus_panel == FocusedPanel::Network;
        let border_style = if focused {
            self.theme.styles.panel_border_focused
        } else {
            self.theme.styles.panel_border
        };

        let block = Block::default()
            .title(Span::styled(" NETWORK ", self.theme.styles.panel_title))
            .borders(Borders::ALL)
            .border_style(border_style)
            .style(Style::default().bg(self.theme.colors.bg_primary));

        let inner = block.inner(area);
        block.render(area, buf);

        let network = &self.state.panels.network;
        if network.interfaces.is_empty() {
            let span = Span::styled("No active interfaces", self.theme.styles.muted);
            buf.set_span(inner.x + 1, inner.y, &span, inner.width.saturating_sub(2));
            return;
        }

        let header = Line::from(Span::styled(
            format!(
                "  {:<14} {:<9} {:<9} {:<9} {:<18} {}",
                "INTERFACE", "TYPE", "SPEED", "QUALITY", "MAC", "SWITCH PORT"
            ),
            Style::default()
                .fg(self.theme.colors.fg_muted)
                .add_modifier(Modifier::BOLD),
        ));
        buf.set_line(inner.x, inner.y, &header, inner.width);

        let rows = inner.height.saturating_sub(1) as usize;
        // keep the selection visible
        let first = network.selected_index.saturating_sub(rows.saturating_sub(1));

        for (row, (i, iface)) in network
            .interfaces
            .iter()
            .enumerate()
            .skip(first)
            .take(rows)
            .enumerate()
        {
            let selected = i == network.selected_index;
            let base = if selected && focused {
                self.theme.styles.list_item_selected
            } else {
                self.theme.styles.list_item
            };
            let status = network.port_status(&iface.name);

            let line = Line::from(vec![
                Span::styled(if selected { "▸ " } else { "  " }, base),
                Span::styled(format!("{:<14} ", truncate(&iface.name, 14)), base),
                Span::styled(format!("{:<9} ", iface.kind.to_string()), base),
                Span::styled(format!("{:<9} ", iface.speed_label()), base),
                Span::styled(
                    format!("{:<9} ", iface.quality.to_string()),
                    self.theme.quality_style(iface.quality),
                ),
                Span::styled(format!("{:<18} ", iface.mac), self.theme.styles.muted),
                Span::styled(status.label(), self.port_style(&status)),
            ]);

            buf.set_line(inner.x, inner.y + 1 + row as u16, &line, inner.width);
        }
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{}…", kept)
    }
}
