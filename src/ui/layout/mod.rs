//! Layout management system

use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Wide terminals put metrics and log side by side above the network list.
const WIDE_THRESHOLD: u16 = 110;

/// Computed layout rects for all panels
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComputedLayout {
    pub header: Rect,
    pub footer: Rect,
    pub metrics_panel: Rect,
    pub network_panel: Rect,
    pub output_panel: Rect,
    pub overlay_area: Rect,
}

pub struct LayoutManager;

impl LayoutManager {
    pub fn compute(area: Rect) -> ComputedLayout {
        let main_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Header
                Constraint::Min(10),   // Body
                Constraint::Length(1), // Footer
            ])
            .split(area);

        let body = main_chunks[1];
        let (metrics_panel, network_panel, output_panel) = if area.width >= WIDE_THRESHOLD {
            let rows = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(7), Constraint::Min(5)])
                .split(body);
            let top = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
                .split(rows[0]);
            (top[0], rows[1], top[1])
        } else {
            let rows = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(7),
                    Constraint::Min(5),
                    Constraint::Length(6),
                ])
                .split(body);
            (rows[0], rows[1], rows[2])
        };

        ComputedLayout {
            header: main_chunks[0],
            footer: main_chunks[2],
            metrics_panel,
            network_panel,
            output_panel,
            overlay_area: centered_rect(60, 70, area),
        }
    }
}

/// Create a centered rect with given percentage width/height
pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_inside(inner: Rect, outer: Rect) {
        assert!(inner.x >= outer.x && inner.right() <= outer.right(), "{inner:?} in {outer:?}");
        assert!(inner.y >= outer.y && inner.bottom() <= outer.bottom(), "{inner:?} in {outer:?}");
    }

    #[test]
    fn narrow_terminal_stacks_panels() {
        let area = Rect::new(0, 0, 80, 30);
        let layout = LayoutManager::compute(area);

        assert_eq!(layout.header, Rect::new(0, 0, 80, 1));
        assert_eq!(layout.footer, Rect::new(0, 29, 80, 1));
        assert_eq!(layout.metrics_panel.width, 80);
        assert!(layout.metrics_panel.bottom() <= layout.network_panel.y);
        assert!(layout.network_panel.bottom() <= layout.output_panel.y);
    }

    #[test]
    fn wide_terminal_places_log_beside_metrics() {
        let area = Rect::new(0, 0, 160, 40);
        let layout = LayoutManager::compute(area);

        assert_eq!(layout.metrics_panel.y, layout.output_panel.y);
        assert!(layout.metrics_panel.right() <= layout.output_panel.x);
        assert_eq!(layout.network_panel.width, 160);
        for rect in [layout.metrics_panel, layout.network_panel, layout.output_panel, layout.overlay_area] {
            assert_inside(rect, area);
        }
    }
}
