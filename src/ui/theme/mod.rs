//! Color palettes and the styles derived from them

use ratatui::style::{Color, Modifier, Style};

use crate::health::{HealthLevel, LinkQuality};

/// Complete theme definition
#[derive(Debug, Clone)]
pub struct Theme {
    pub name: &'static str,
    pub colors: ThemeColors,
    pub styles: ThemeStyles,
}

#[derive(Debug, Clone, Copy)]
pub struct ThemeColors {
    pub bg_primary: Color,
    pub bg_secondary: Color,
    pub fg_primary: Color,
    pub fg_muted: Color,
    pub accent_primary: Color,
    pub accent_secondary: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub info: Color,
    pub border: Color,
    pub border_focused: Color,
    pub selection: Color,
}

#[derive(Debug, Clone)]
pub struct ThemeStyles {
    pub header: Style,
    pub footer: Style,
    pub panel_title: Style,
    pub panel_border: Style,
    pub panel_border_focused: Style,
    pub list_item: Style,
    pub list_item_selected: Style,
    pub muted: Style,
    pub healthy: Style,
    pub stressed: Style,
    pub critical: Style,
    pub sparkline: Style,
    pub keybind: Style,
    pub keybind_key: Style,
    pub notification_info: Style,
    pub notification_success: Style,
    pub notification_error: Style,
}

const TOKYO_NIGHT: ThemeColors = ThemeColors {
    bg_primary: Color::Rgb(26, 27, 38),
    bg_secondary: Color::Rgb(36, 40, 59),
    fg_primary: Color::Rgb(192, 202, 245),
    fg_muted: Color::Rgb(86, 95, 137),
    accent_primary: Color::Rgb(122, 162, 247),
    accent_secondary: Color::Rgb(187, 154, 247),
    success: Color::Rgb(158, 206, 106),
    warning: Color::Rgb(224, 175, 104),
    error: Color::Rgb(247, 118, 142),
    info: Color::Rgb(125, 207, 255),
    border: Color::Rgb(41, 46, 66),
    border_focused: Color::Rgb(122, 162, 247),
    selection: Color::Rgb(52, 59, 88),
};

const NORD: ThemeColors = ThemeColors {
    bg_primary: Color::Rgb(46, 52, 64),
    bg_secondary: Color::Rgb(59, 66, 82),
    fg_primary: Color::Rgb(236, 239, 244),
    fg_muted: Color::Rgb(216, 222, 233),
    accent_primary: Color::Rgb(136, 192, 208),
    accent_secondary: Color::Rgb(129, 161, 193),
    success: Color::Rgb(163, 190, 140),
    warning: Color::Rgb(235, 203, 139),
    error: Color::Rgb(191, 97, 106),
    info: Color::Rgb(136, 192, 208),
    border: Color::Rgb(67, 76, 94),
    border_focused: Color::Rgb(136, 192, 208),
    selection: Color::Rgb(76, 86, 106),
};

const GRUVBOX: ThemeColors = ThemeColors {
    bg_primary: Color::Rgb(40, 40, 40),
    bg_secondary: Color::Rgb(60, 56, 54),
    fg_primary: Color::Rgb(235, 219, 178),
    fg_muted: Color::Rgb(168, 153, 132),
    accent_primary: Color::Rgb(131, 165, 152),
    accent_secondary: Color::Rgb(211, 134, 155),
    success: Color::Rgb(184, 187, 38),
    warning: Color::Rgb(250, 189, 47),
    error: Color::Rgb(251, 73, 52),
    info: Color::Rgb(131, 165, 152),
    border: Color::Rgb(80, 73, 69),
    border_focused: Color::Rgb(131, 165, 152),
    selection: Color::Rgb(102, 92, 84),
};

impl Theme {
    /// Unknown names fall back to Tokyo Night.
    pub fn from_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "nord" => Self::from_colors("Nord", NORD),
            "gruvbox" => Self::from_colors("Gruvbox", GRUVBOX),
            _ => Self::from_colors("Tokyo Night", TOKYO_NIGHT),
        }
    }

    fn from_colors(name: &'static str, colors: ThemeColors) -> Self {
        let fg = |c: Color| Style::default().fg(c);
        let styles = ThemeStyles {
            header: Style::default().bg(colors.bg_secondary).fg(colors.fg_primary),
            footer: Style::default().bg(colors.bg_secondary).fg(colors.fg_muted),
            panel_title: fg(colors.accent_primary).add_modifier(Modifier::BOLD),
            panel_border: fg(colors.border),
            panel_border_focused: fg(colors.border_focused),
            list_item: fg(colors.fg_primary),
            list_item_selected: fg(colors.fg_primary)
                .bg(colors.selection)
                .add_modifier(Modifier::BOLD),
            muted: fg(colors.fg_muted),
            healthy: fg(colors.success),
            stressed: fg(colors.warning),
            critical: fg(colors.error).add_modifier(Modifier::BOLD),
            sparkline: fg(colors.accent_primary),
            keybind: fg(colors.fg_muted),
            keybind_key: fg(colors.accent_secondary).add_modifier(Modifier::BOLD),
            notification_info: fg(colors.info),
            notification_success: fg(colors.success),
            notification_error: fg(colors.error),
        };

        Self {
            name,
            colors,
            styles,
        }
    }

    pub fn level_style(&self, level: HealthLevel) -> Style {
        match level {
            HealthLevel::Healthy => self.styles.healthy,
            HealthLevel::Stressed => self.styles.stressed,
            HealthLevel::Critical => self.styles.critical,
        }
    }

    pub fn quality_style(&self, quality: LinkQuality) -> Style {
        match quality {
            LinkQuality::Strong => self.styles.healthy,
            LinkQuality::Moderate => self.styles.stressed,
            LinkQuality::Poor => self.styles.critical,
            LinkQuality::Unknown => self.styles.muted,
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::from_name("tokyo-night")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_case_insensitive_with_fallback() {
        assert_eq!(Theme::from_name("Nord").name, "Nord");
        assert_eq!(Theme::from_name("gruvbox").name, "Gruvbox");
        assert_eq!(Theme::from_name("solarized").name, "Tokyo Night");
    }

    #[test]
    fn levels_map_to_semantic_colors() {
        let theme = Theme::default();
        assert_eq!(theme.level_style(HealthLevel::Healthy).fg, Some(theme.colors.success));
        assert_eq!(theme.level_style(HealthLevel::Critical).fg, Some(theme.colors.error));
        assert_eq!(theme.quality_style(LinkQuality::Unknown).fg, Some(theme.colors.fg_muted));
    }
}
