//! UI widgets

pub mod footer;
pub mod header;
pub mod help_overlay;
pub mod metrics_panel;
pub mod network_panel;
pub mod output_panel;

pub use footer::Footer;
pub use header::Header;
pub use help_overlay::HelpOverlay;
pub use metrics_panel::MetricsPanel;
pub use network_panel::NetworkPanel;
pub use output_panel::OutputPanel;
