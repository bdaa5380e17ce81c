//! Help overlay widget

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Widget},
};

use crate::ui::theme::Theme;

const SECTIONS: &[(&str, &[(&str, &str)])] = &[
    (
        "General",
        &[
            ("q", "Quit"),
            ("?", "Toggle help"),
            ("r", "Refresh metrics and interfaces"),
            ("x", "Write a JSON health snapshot"),
            ("Tab", "Cycle panel focus"),
        ],
    ),
    (
        "Network",
        &[
            ("↑/k", "Previous interface"),
            ("↓/j", "Next interface"),
            ("l", "Look up the selected interface's switch port"),
            ("L", "Look up every interface"),
        ],
    ),
    (
        "Log",
        &[
            ("↑/k", "Scroll to older lines"),
            ("↓/j", "Scroll to newer lines"),
            ("End", "Follow the newest line"),
        ],
    ),
    ("Overlay", &[("Esc", "Close")]),
];

pub struct HelpOverlay<'a> {
    theme: &'a Theme,
}

impl<'a> HelpOverlay<'a> {
    pub fn new(theme: &'a Theme) -> Self {
        Self { theme }
    }
}

impl<'a> Widget for HelpOverlay<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Clear.render(area, buf);

        let block = Block::default()
            .title(Span::styled(" ♥ Vitals Help ", self.theme.styles.panel_title))
            .borders(Borders::ALL)
            .border_style(self.theme.styles.panel_border_focused)
            .style(Style::default().bg(self.theme.colors.bg_secondary));

        let inner = block.inner(area);
        block.render(area, buf);

        let bottom = inner.y + inner.height;
        let mut y = inner.y;

        for (section, bindings) in SECTIONS {
            if y >= bottom {
                break;
            }

            let header = Line::from(Span::styled(
                format!("─── {} ", section),
                Style::default()
                    .fg(self.theme.colors.accent_primary)
                    .add_modifier(Modifier::BOLD),
            ));
            buf.set_line(inner.x + 1, y, &header, inner.width.saturating_sub(2));
            y += 1;

            for (key, desc) in bindings.iter() {
                if y >= bottom {
                    break;
                }
                let line = Line::from(vec![
                    Span::styled(format!("  {:>6}  ", key), self.theme.styles.keybind_key),
                    Span::styled(*desc, self.theme.styles.keybind),
                ]);
                buf.set_line(inner.x + 1, y, &line, inner.width.saturating_sub(2));
                y += 1;
            }

            y += 1;
        }

        let hint = " Press Esc or ? to close ";
        let hint_width = hint.len() as u16;
        if area.height > 0 && area.width > hint_width {
            let footer = Span::styled(hint, self.theme.styles.muted);
            buf.set_span(
                area.x + (area.width - hint_width) / 2,
                area.y + area.height - 1,
                &footer,
                hint_width,
            );
        }
    }
}
