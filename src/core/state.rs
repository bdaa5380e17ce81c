//! Dashboard state with change notifications

use parking_lot::RwLock;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::health::Thresholds;
use crate::integrations::network::NetworkInterface;
use crate::integrations::system::SystemMetrics;
use crate::snmp::PortMapping;
use crate::ui::theme::Theme;

/// Top-level application mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppMode {
    #[default]
    Dashboard,
    Help,
}

/// Which panel currently has focus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FocusedPanel {
    #[default]
    Network,
    Output,
}

impl FocusedPanel {
    pub fn next(self) -> Self {
        match self {
            Self::Network => Self::Output,
            Self::Output => Self::Network,
        }
    }
}

/// System metrics panel state
#[derive(Debug, Clone)]
pub struct MetricsPanelState {
    pub cpu_percent: f32,
    pub cpu_history: VecDeque<f32>,
    pub history_len: usize,
    pub memory_used_mb: u64,
    pub memory_total_mb: u64,
    pub memory_percent: f32,
    pub disk_used_percent: f32,
    pub last_sample: Option<SystemMetrics>,
}

impl Default for MetricsPanelState {
    fn default() -> Self {
        Self::with_history(60)
    }
}

impl MetricsPanelState {
    pub fn with_history(history_len: usize) -> Self {
        Self {
            cpu_percent: 0.0,
            cpu_history: VecDeque::with_capacity(history_len),
            history_len: history_len.max(1),
            memory_used_mb: 0,
            memory_total_mb: 0,
            memory_percent: 0.0,
            disk_used_percent: 0.0,
            last_sample: None,
        }
    }

    pub fn push_cpu(&mut self, value: f32) {
        self.cpu_history.push_back(value);
        while self.cpu_history.len() > self.history_len {
            self.cpu_history.pop_front();
        }
        self.cpu_percent = value;
    }

    pub fn apply(&mut self, metrics: SystemMetrics) {
        self.push_cpu(metrics.cpu_percent);
        self.memory_used_mb = metrics.memory_used_mb;
        self.memory_total_mb = metrics.memory_total_mb;
        self.memory_percent = metrics.memory_percent;
        self.disk_used_percent = metrics.disk_used_percent;
        self.last_sample = Some(metrics);
    }
}

/// Switch-port lookup state for one interface
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PortStatus {
    #[default]
    Unchecked,
    Resolving,
    Found(PortMapping),
    NotFound,
    Failed(String),
}

impl PortStatus {
    pub fn label(&self) -> String {
        match self {
            PortStatus::Unchecked => "-".to_string(),
            PortStatus::Resolving => "resolving…".to_string(),
            PortStatus::Found(mapping) => mapping.label(),
            PortStatus::NotFound => "no mapping found".to_string(),
            PortStatus::Failed(reason) => reason.clone(),
        }
    }
}

/// Network panel state
#[derive(Debug, Clone, Default)]
pub struct NetworkPanelState {
    pub interfaces: Vec<NetworkInterface>,
    pub ports: HashMap<String, PortStatus>,
    pub selected_index: usize,
}

impl NetworkPanelState {
    /// Replaces the interface list, keeping the selection and known ports.
    pub fn set_interfaces(&mut self, interfaces: Vec<NetworkInterface>) {
        self.ports
            .retain(|name, _| interfaces.iter().any(|iface| &iface.name == name));
        self.interfaces = interfaces;
        self.selected_index = self
            .selected_index
            .min(self.interfaces.len().saturating_sub(1));
    }

    pub fn selected(&self) -> Option<&NetworkInterface> {
        self.interfaces.get(self.selected_index)
    }

    pub fn select_next(&mut self) {
        if !self.interfaces.is_empty() {
            self.selected_index = (self.selected_index + 1) % self.interfaces.len();
        }
    }

    pub fn select_prev(&mut self) {
        if !self.interfaces.is_empty() {
            self.selected_index = self
                .selected_index
                .checked_sub(1)
                .unwrap_or(self.interfaces.len() - 1);
        }
    }

    pub fn port_status(&self, name: &str) -> PortStatus {
        self.ports.get(name).cloned().unwrap_or_default()
    }

    pub fn resolved_ports(&self) -> HashMap<String, PortMapping> {
        self.ports
            .iter()
            .filter_map(|(name, status)| match status {
                PortStatus::Found(mapping) => Some((name.clone(), mapping.clone())),
                _ => None,
            })
            .collect()
    }
}

/// Output panel state
#[derive(Debug, Clone)]
pub struct OutputPanelState {
    pub lines: VecDeque<OutputLine>,
    pub max_lines: usize,
    /// Lines hidden below the view; 0 follows the tail
    pub scroll_offset: usize,
}

impl Default for OutputPanelState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub struct OutputLine {
    pub content: String,
    pub timestamp: chrono::DateTime<chrono::Local>,
    pub stream: OutputStream,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    System,
    Warning,
    Error,
}

impl OutputPanelState {
    pub fn new() -> Self {
        Self {
            lines: VecDeque::new(),
            max_lines: 500,
            scroll_offset: 0,
        }
    }

    pub fn is_following(&self) -> bool {
        self.scroll_offset == 0
    }

    /// Moves the view towards older lines, keeping at least one in view.
    pub fn scroll_up(&mut self, lines: usize) {
        let max = self.lines.len().saturating_sub(1);
        self.scroll_offset = (self.scroll_offset + lines).min(max);
    }

    pub fn scroll_down(&mut self, lines: usize) {
        self.scroll_offset = self.scroll_offset.saturating_sub(lines);
    }

    pub fn push(&mut self, content: String, stream: OutputStream) {
        self.lines.push_back(OutputLine {
            content,
            timestamp: chrono::Local::now(),
            stream,
        });
        // a scrolled view stays on the lines it was showing
        if self.scroll_offset > 0 {
            self.scroll_offset += 1;
        }
        while self.lines.len() > self.max_lines {
            self.lines.pop_front();
        }
        self.scroll_offset = self.scroll_offset.min(self.lines.len().saturating_sub(1));
    }
}

/// Notification
#[derive(Debug, Clone)]
pub struct Notification {
    pub id: uuid::Uuid,
    pub message: String,
    pub level: NotificationLevel,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// Granular view state for all panels
#[derive(Debug, Clone, Default)]
pub struct PanelStates {
    pub metrics: MetricsPanelState,
    pub network: NetworkPanelState,
    pub output: OutputPanelState,
}

/// Main application state
#[derive(Debug, Clone)]
pub struct AppState {
    pub mode: AppMode,
    pub panels: PanelStates,
    pub theme: Theme,
    pub thresholds: Thresholds,
    pub notifications: Vec<Notification>,
    pub focus_panel: FocusedPanel,
    pub hostname: String,
    /// Switch address when lookups are configured
    pub switch: Option<String>,
}

impl AppState {
    pub fn new(theme: Theme, thresholds: Thresholds, history_len: usize) -> Self {
        Self {
            mode: AppMode::Dashboard,
            panels: PanelStates {
                metrics: MetricsPanelState::with_history(history_len),
                ..PanelStates::default()
            },
            theme,
            thresholds,
            notifications: Vec::new(),
            focus_panel: FocusedPanel::default(),
            hostname: String::new(),
            switch: None,
        }
    }

    pub fn add_notification(&mut self, message: String, level: NotificationLevel) -> uuid::Uuid {
        let id = uuid::Uuid::new_v4();
        self.notifications.push(Notification {
            id,
            message,
            level,
            created_at: chrono::Utc::now(),
            duration_ms: 5000,
        });
        id
    }

    /// Returns how many were dropped.
    pub fn remove_expired_notifications(&mut self) -> usize {
        let now = chrono::Utc::now();
        let before = self.notifications.len();
        self.notifications.retain(|n| {
            let elapsed = now.signed_duration_since(n.created_at).num_milliseconds();
            elapsed < n.duration_ms as i64
        });
        before - self.notifications.len()
    }
}

/// Reactive state changes via broadcast channel
#[derive(Debug, Clone)]
pub enum StateChange {
    ModeChanged(AppMode),
    MetricsUpdated,
    InterfacesUpdated,
    PortStatusChanged(String),
    NotificationAdded(uuid::Uuid),
    NotificationsExpired(usize),
    PanelFocusChanged(FocusedPanel),
    SelectionChanged(usize),
    OutputAppended,
    OutputScrolled(usize),
}

/// Thread-safe state store
pub struct StateStore {
    state: Arc<RwLock<AppState>>,
    change_tx: broadcast::Sender<StateChange>,
}

impl StateStore {
    pub fn new(initial: AppState) -> Self {
        let (change_tx, _) = broadcast::channel(256);
        Self {
            state: Arc::new(RwLock::new(initial)),
            change_tx,
        }
    }

    /// Subscribe to state changes
    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.change_tx.subscribe()
    }

    /// Atomic state mutation with change notification
    pub fn update<F, R>(&self, mutator: F) -> R
    where
        F: FnOnce(&mut AppState) -> (R, Option<StateChange>),
    {
        let mut state = self.state.write();
        let (result, change) = mutator(&mut state);
        if let Some(change) = change {
            let _ = self.change_tx.send(change);
        }
        result
    }

    /// Read current state
    pub fn read(&self) -> parking_lot::RwLockReadGuard<'_, AppState> {
        self.state.read()
    }

    /// Append a line to the output panel
    pub fn log(&self, content: impl Into<String>, stream: OutputStream) {
        let content = content.into();
        self.update(|s| {
            s.panels.output.push(content, stream);
            ((), Some(StateChange::OutputAppended))
        });
    }

    pub fn notify(&self, message: impl Into<String>, level: NotificationLevel) {
        let message = message.into();
        self.update(|s| {
            let id = s.add_notification(message, level);
            ((), Some(StateChange::NotificationAdded(id)))
        });
    }
}

impl Clone for StateStore {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            change_tx: self.change_tx.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::{InterfaceKind, LinkQuality};
    use crate::snmp::MacAddress;
    use pretty_assertions::assert_eq;

    fn iface(name: &str) -> NetworkInterface {
        NetworkInterface {
            name: name.to_string(),
            kind: InterfaceKind::from_name(name),
            mac: MacAddress::new([0x02, 0, 0, 0, 0, 1]),
            speed_mbps: None,
            quality: LinkQuality::Unknown,
        }
    }

    fn store() -> StateStore {
        StateStore::new(AppState::new(Theme::default(), Thresholds::default(), 3))
    }

    #[test]
    fn cpu_history_is_capped() {
        let mut metrics = MetricsPanelState::with_history(3);
        for v in [1.0, 2.0, 3.0, 4.0] {
            metrics.push_cpu(v);
        }
        assert_eq!(metrics.cpu_history, VecDeque::from(vec![2.0, 3.0, 4.0]));
        assert_eq!(metrics.cpu_percent, 4.0);
    }

    #[test]
    fn selection_wraps_and_survives_refresh() {
        let mut network = NetworkPanelState::default();
        network.set_interfaces(vec![iface("eth0"), iface("wlan0")]);
        network.select_prev();
        assert_eq!(network.selected().map(|i| i.name.as_str()), Some("wlan0"));
        network.select_next();
        assert_eq!(network.selected_index, 0);

        network.select_next();
        network.ports.insert("wlan0".into(), PortStatus::NotFound);
        network.ports.insert("gone0".into(), PortStatus::NotFound);
        network.set_interfaces(vec![iface("wlan0")]);
        assert_eq!(network.selected_index, 0);
        assert_eq!(network.port_status("wlan0"), PortStatus::NotFound);
        assert_eq!(network.port_status("gone0"), PortStatus::Unchecked);
    }

    #[test]
    fn resolved_ports_only_include_hits() {
        let mut network = NetworkPanelState::default();
        let mapping = PortMapping {
            if_index: 7,
            if_name: Some("Gi1/0/7".into()),
            if_descr: None,
        };
        network.ports.insert("eth0".into(), PortStatus::Found(mapping.clone()));
        network.ports.insert("eth1".into(), PortStatus::NotFound);

        let resolved = network.resolved_ports();
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved.get("eth0"), Some(&mapping));
    }

    #[test]
    fn store_broadcasts_changes() {
        let store = store();
        let mut rx = store.subscribe();

        store.log("sampled", OutputStream::System);
        assert!(matches!(rx.try_recv(), Ok(StateChange::OutputAppended)));
        assert_eq!(store.read().panels.output.lines.len(), 1);
        assert_eq!(store.read().panels.metrics.history_len, 3);
    }

    #[test]
    fn expired_notifications_are_removed() {
        let store = store();
        store.notify("hello", NotificationLevel::Info);
        store.update(|s| {
            s.notifications[0].created_at -= chrono::Duration::seconds(10);
            ((), None)
        });
        store.notify("fresh", NotificationLevel::Info);

        let removed = store.update(|s| {
            let removed = s.remove_expired_notifications();
            (removed, None)
        });
        assert_eq!(removed, 1);
        assert_eq!(store.read().notifications.len(), 1);
        assert_eq!(store.read().notifications[0].message, "fresh");
    }

    #[test]
    fn output_scrolls_within_bounds() {
        let mut output = OutputPanelState::new();
        for i in 0..5 {
            output.push(format!("line {}", i), OutputStream::System);
        }
        assert!(output.is_following());

        output.scroll_up(2);
        assert_eq!(output.scroll_offset, 2);
        output.scroll_up(100);
        assert_eq!(output.scroll_offset, 4);
        output.scroll_down(1);
        assert_eq!(output.scroll_offset, 3);
        output.scroll_down(100);
        assert!(output.is_following());
    }

    #[test]
    fn scrolled_view_stays_put_as_lines_arrive() {
        let mut output = OutputPanelState::new();
        output.max_lines = 4;
        for i in 0..4 {
            output.push(format!("line {}", i), OutputStream::System);
        }
        output.scroll_up(1);

        output.push("line 4".into(), OutputStream::Warning);
        assert_eq!(output.scroll_offset, 2);
        let newest_shown = output.lines.len() - 1 - output.scroll_offset;
        assert_eq!(output.lines[newest_shown].content, "line 2");

        // trimming never leaves the view past the oldest line
        for i in 5..10 {
            output.push(format!("line {}", i), OutputStream::System);
        }
        assert_eq!(output.scroll_offset, 3);
        assert_eq!(output.lines.len(), 4);
    }

    #[test]
    fn following_view_keeps_following() {
        let mut output = OutputPanelState::new();
        output.push("a".into(), OutputStream::System);
        output.push("b".into(), OutputStream::Error);
        assert!(output.is_following());
    }
}
