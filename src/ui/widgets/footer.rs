//! Footer widget with keybindings

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::Widget,
};

use crate::core::state::{AppMode, AppState, FocusedPanel};
use crate::ui::theme::Theme;

pub struct Footer<'a> {
    state: &'a AppState,
    theme: &'a Theme,
}

impl<'a> Footer<'a> {
    pub fn new(state: &'a AppState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    fn bindings(&self) -> Vec<(&'static str, &'static str)> {
        match self.state.mode {
            AppMode::Dashboard => {
                let arrows = match self.state.focus_panel {
                    FocusedPanel::Network => ("↑/↓", "Select"),
                    FocusedPanel::Output => ("↑/↓", "Scroll"),
                };
                let mut bindings = vec![arrows, ("Tab", "Focus")];
                if self.state.switch.is_some() {
                    bindings.push(("l", "Lookup"));
                    bindings.push(("L", "Lookup all"));
                }
                bindings.extend([("r", "Refresh"), ("x", "Snapshot"), ("?", "Help"), ("q", "Quit")]);
                bindings
            }
            AppMode::Help => vec![("Esc", "Close"), ("q", "Close")],
        }
    }
}

impl<'a> Widget for Footer<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        buf.set_style(area, self.theme.styles.footer);

        let mut spans = Vec::new();
        for (i, (key, action)) in self.bindings().iter().enumerate() {
            if i > 0 {
                spans.push(Span::styled("  ", self.theme.styles.keybind));
            }
            spans.push(Span::styled(format!("[{}]", key), self.theme.styles.keybind_key));
            spans.push(Span::styled(format!(" {}", action), self.theme.styles.keybind));
        }

        let line = Line::from(spans);
        buf.set_line(area.x + 1, area.y, &line, area.width.saturating_sub(2));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::Thresholds;

    #[test]
    fn lookup_keys_only_shown_with_a_switch() {
        let theme = Theme::default();
        let mut state = AppState::new(theme.clone(), Thresholds::default(), 10);
        assert!(!Footer::new(&state, &theme).bindings().contains(&("l", "Lookup")));

        state.switch = Some("10.0.0.2".into());
        assert!(Footer::new(&state, &theme).bindings().contains(&("l", "Lookup")));
    }

    #[test]
    fn arrow_hint_follows_focus() {
        let theme = Theme::default();
        let mut state = AppState::new(theme.clone(), Thresholds::default(), 10);
        assert!(Footer::new(&state, &theme).bindings().contains(&("↑/↓", "Select")));

        state.focus_panel = FocusedPanel::Output;
        assert!(Footer::new(&state, &theme).bindings().contains(&("↑/↓", "Scroll")));
    }
}
