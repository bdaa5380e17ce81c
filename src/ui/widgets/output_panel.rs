//! Activity log panel

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::core::state::{AppState, FocusedPanel, OutputStream};
use crate::ui::theme::Theme;

pub struct OutputPanel<'a> {
    state: &'a AppState,
    theme: &'a Theme,
}

impl<'a> OutputPanel<'a> {
    pub fn new(state: &'a AppState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }
}

impl<'a> Widget for OutputPanel<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let focused = self.state.focus_panel == FocusedPanel::Output;
        let border_style = if focused {
            self.theme.styles.panel_border_focused
        } else {
            self.theme.styles.panel_border
        };

        let output = &self.state.panels.output;
        let title = if output.is_following() {
            " LOG ".to_string()
        } else {
            format!(" LOG (↓ {} newer) ", output.scroll_offset)
        };

        let block = Block::default()
            .title(Span::styled(title, self.theme.styles.panel_title))
            .borders(Borders::ALL)
            .border_style(border_style)
            .style(Style::default().bg(self.theme.colors.bg_primary));

        let inner = block.inner(area);
        block.render(area, buf);

        if output.lines.is_empty() {
            let span = Span::styled("Nothing logged yet", self.theme.styles.muted);
            buf.set_span(inner.x + 1, inner.y, &span, inner.width.saturating_sub(2));
            return;
        }

        let visible_lines = inner.height as usize;
        let end = output.lines.len().saturating_sub(output.scroll_offset);
        let start = end.saturating_sub(visible_lines);

        for (i, line) in output.lines.range(start..end).enumerate() {
            let (prefix, style) = match line.stream {
                OutputStream::System => ("● ", Style::default().fg(self.theme.colors.fg_primary)),
                OutputStream::Warning => ("! ", self.theme.styles.stressed),
                OutputStream::Error => ("✗ ", self.theme.styles.critical),
            };

            let stamp = line.timestamp.format("%H:%M:%S ").to_string();
            let used = stamp.width() + prefix.width();
            let content = truncate(&line.content, (inner.width as usize).saturating_sub(used));

            let display_line = Line::from(vec![
                Span::styled(stamp, self.theme.styles.muted),
                Span::styled(prefix, style),
                Span::styled(content, style),
            ]);

            buf.set_line(inner.x, inner.y + i as u16, &display_line, inner.width);
        }
    }
}

/// Cut to `max_width` display columns, ending in `…` when shortened.
fn truncate(s: &str, max_width: usize) -> String {
    if s.width() <= max_width {
        return s.to_string();
    }
    if max_width <= 1 {
        return String::new();
    }

    let mut out = String::new();
    let mut width = 0;
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if width + w > max_width - 1 {
            break;
        }
        width += w;
        out.push(c);
    }
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::Thresholds;

    #[test]
    fn truncate_counts_display_columns() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefgh", 5), "abcd…");
        // each ideograph is two columns wide
        assert_eq!(truncate("端口端口", 5), "端口…");
        assert_eq!(truncate("abc", 1), "");
    }

    #[test]
    fn tails_the_newest_lines() {
        let mut state = AppState::new(Default::default(), Thresholds::default(), 10);
        for i in 0..10 {
            state.panels.output.push(format!("line {}", i), OutputStream::System);
        }
        state.panels.output.push("switch timed out".into(), OutputStream::Warning);

        let area = Rect::new(0, 0, 50, 5);
        let mut buf = Buffer::empty(area);
        OutputPanel::new(&state, &state.theme).render(area, &mut buf);
        let text: String = buf.content().iter().map(|c| c.symbol()).collect();

        assert!(text.contains("switch timed out"));
        assert!(text.contains("line 9"));
        assert!(!text.contains("line 0"));
    }

    #[test]
    fn scrolled_view_shows_older_lines() {
        let mut state = AppState::new(Default::default(), Thresholds::default(), 10);
        for i in 0..10 {
            state.panels.output.push(format!("line {}", i), OutputStream::System);
        }
        state.panels.output.scroll_up(5);

        // three rows inside the border
        let area = Rect::new(0, 0, 50, 5);
        let mut buf = Buffer::empty(area);
        OutputPanel::new(&state, &state.theme).render(area, &mut buf);
        let text: String = buf.content().iter().map(|c| c.symbol()).collect();

        assert!(text.contains("↓ 5 newer"));
        assert!(text.contains("line 2"));
        assert!(text.contains("line 4"));
        assert!(!text.contains("line 5"));
        assert!(!text.contains("line 9"));
    }
}
