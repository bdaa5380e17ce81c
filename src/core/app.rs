//! Main application orchestrator

use anyhow::{anyhow, Result};
use crossterm::event::KeyEvent;
use parking_lot::Mutex;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::Stdout;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::{self, error::TryRecvError};
use tokio::sync::mpsc;
use tokio::time::error::Elapsed;

use crate::config::Config;
use crate::core::events::{Event, EventHandler, EventResult, KeyBindings};
use crate::core::state::{
    AppMode, AppState, FocusedPanel, NotificationLevel, OutputStream, PortStatus, StateChange,
    StateStore,
};
use crate::integrations::network::enumerate_interfaces;
use crate::integrations::system::SystemMonitor;
use crate::snapshot::{self, HealthSnapshot};
use crate::snmp::{MacAddress, MacParseError, PortMapping, SwitchCredential, SwitchPortResolver};
use crate::ui::renderer::Renderer;
use crate::ui::theme::Theme;

pub struct App {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    state: StateStore,
    event_tx: mpsc::UnboundedSender<Event>,
    system_monitor: Arc<Mutex<SystemMonitor>>,
    resolver: SwitchPortResolver,
    lookup_running: Arc<AtomicBool>,
    redraw: RedrawTracker,
    config: Config,
}

impl App {
    pub fn new(config: Config) -> Result<Self> {
        let backend = CrosstermBackend::new(std::io::stdout());
        let terminal = Terminal::new(backend)?;

        let theme = Theme::from_name(&config.display.theme);
        let mut initial_state = AppState::new(
            theme,
            config.thresholds,
            config.general.history_len,
        );
        initial_state.hostname = snapshot::device_name();
        initial_state.switch = config.snmp.credential().map(|c| c.address);
        let state = StateStore::new(initial_state);
        let redraw = RedrawTracker::new(state.subscribe());

        // Replaced once the event handler exists in run()
        let (event_tx, _) = mpsc::unbounded_channel::<Event>();

        Ok(Self {
            terminal,
            state,
            event_tx,
            system_monitor: Arc::new(Mutex::new(SystemMonitor::new())),
            resolver: SwitchPortResolver::new(config.snmp.settings()),
            lookup_running: Arc::new(AtomicBool::new(false)),
            redraw,
            config,
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        self.setup_terminal()?;

        let mut event_handler = EventHandler::new();
        self.event_tx = event_handler.sender();

        self.state.log("Sampling system health…", OutputStream::System);
        match self.config.snmp.credential() {
            Some(credential) => self.state.log(
                format!("Switch-port lookups via {} (press l or L)", credential.address),
                OutputStream::System,
            ),
            None => self.state.log("Switch-port lookups disabled", OutputStream::System),
        }

        self.refresh();
        event_handler.spawn_sources(self.config.general.refresh_interval());

        self.render()?;

        let result = self.event_loop(&mut event_handler).await;

        self.shutdown()?;
        result
    }

    fn setup_terminal(&mut self) -> Result<()> {
        crossterm::terminal::enable_raw_mode()?;
        crossterm::execute!(
            std::io::stdout(),
            crossterm::terminal::EnterAlternateScreen,
            crossterm::cursor::Hide,
        )?;
        Ok(())
    }

    fn shutdown(&mut self) -> Result<()> {
        crossterm::terminal::disable_raw_mode()?;
        crossterm::execute!(
            std::io::stdout(),
            crossterm::terminal::LeaveAlternateScreen,
            crossterm::cursor::Show,
        )?;
        Ok(())
    }

    async fn event_loop(&mut self, event_handler: &mut EventHandler) -> Result<()> {
        loop {
            let Some(event) = event_handler.next().await else {
                break;
            };

            match self.handle_event(event)? {
                EventResult::Continue => {}
                EventResult::Quit => break,
            }
        }
        Ok(())
    }

    fn handle_event(&mut self, event: Event) -> Result<EventResult> {
        match event {
            Event::Key(key) => return Ok(self.handle_key(key)),
            Event::Resize => self.render()?,
            Event::Tick => {
                expire_notifications(&self.state);
                if self.redraw.needs_redraw(chrono::Local::now().timestamp()) {
                    self.render()?;
                }
            }
            Event::SlowTick => self.refresh(),
            Event::MetricsSampled(metrics) => {
                self.state.update(|s| {
                    s.panels.metrics.apply(metrics);
                    ((), Some(StateChange::MetricsUpdated))
                });
            }
            Event::InterfacesRefreshed(interfaces) => {
                self.state.update(|s| {
                    s.panels.network.set_interfaces(interfaces);
                    ((), Some(StateChange::InterfacesUpdated))
                });
            }
            Event::PortResolved { interface, status } => self.apply_port_status(interface, status),
        }
        Ok(EventResult::Continue)
    }

    fn handle_key(&mut self, key: KeyEvent) -> EventResult {
        let mode = self.state.read().mode;
        match mode {
            AppMode::Dashboard => self.handle_dashboard_key(key),
            AppMode::Help => self.handle_help_key(key),
        }
    }

    fn handle_dashboard_key(&mut self, key: KeyEvent) -> EventResult {
        if KeyBindings::quit().matches(&key) || KeyBindings::quit_alt().matches(&key) {
            return EventResult::Quit;
        }

        if KeyBindings::help().matches(&key) {
            self.set_mode(AppMode::Help);
        } else if KeyBindings::tab().matches(&key) {
            self.state.update(|s| {
                s.focus_panel = s.focus_panel.next();
                ((), Some(StateChange::PanelFocusChanged(s.focus_panel)))
            });
        } else if KeyBindings::up().matches(&key) || KeyBindings::vim_up().matches(&key) {
            self.state.update(|s| ((), Some(move_cursor(s, Cursor::Up))));
        } else if KeyBindings::down().matches(&key) || KeyBindings::vim_down().matches(&key) {
            self.state.update(|s| ((), Some(move_cursor(s, Cursor::Down))));
        } else if KeyBindings::follow().matches(&key) {
            self.state.update(|s| ((), Some(move_cursor(s, Cursor::Follow))));
        } else if KeyBindings::refresh().matches(&key) {
            self.refresh();
        } else if KeyBindings::lookup().matches(&key) {
            self.start_lookup(false);
        } else if KeyBindings::lookup_all().matches(&key) {
            self.start_lookup(true);
        } else if KeyBindings::snapshot().matches(&key) {
            self.write_snapshot();
        }

        EventResult::Continue
    }

    fn handle_help_key(&mut self, key: KeyEvent) -> EventResult {
        if KeyBindings::quit_alt().matches(&key) {
            return EventResult::Quit;
        }
        if KeyBindings::escape().matches(&key)
            || KeyBindings::help().matches(&key)
            || KeyBindings::quit().matches(&key)
        {
            self.set_mode(AppMode::Dashboard);
        }
        EventResult::Continue
    }

    fn set_mode(&self, mode: AppMode) {
        self.state.update(|s| {
            s.mode = mode;
            ((), Some(StateChange::ModeChanged(mode)))
        });
    }

    /// Samples metrics and interfaces off the event loop.
    fn refresh(&self) {
        let monitor = Arc::clone(&self.system_monitor);
        let tx = self.event_tx.clone();

        tokio::task::spawn_blocking(move || {
            // a sample already in progress covers this tick
            let Some(mut monitor) = monitor.try_lock() else {
                return;
            };
            let metrics = monitor.sample();
            drop(monitor);

            let _ = tx.send(Event::MetricsSampled(metrics));
            let _ = tx.send(Event::InterfacesRefreshed(enumerate_interfaces()));
        });
    }

    /// Resolves the selected interface, or all of them, one after another on
    /// a background task.
    fn start_lookup(&self, all: bool) {
        let Some(credential) = self.config.snmp.credential() else {
            self.state.log(
                "Lookup skipped: no switch configured (set snmp.switch or --switch)",
                OutputStream::Warning,
            );
            self.state.notify("No switch configured", NotificationLevel::Warning);
            return;
        };

        let targets: Vec<(String, MacAddress)> = {
            let s = self.state.read();
            let network = &s.panels.network;
            if all {
                network
                    .interfaces
                    .iter()
                    .map(|iface| (iface.name.clone(), iface.mac))
                    .collect()
            } else {
                network
                    .selected()
                    .map(|iface| (iface.name.clone(), iface.mac))
                    .into_iter()
                    .collect()
            }
        };

        if targets.is_empty() {
            self.state
                .log("Lookup skipped: no active interface", OutputStream::Warning);
            self.state.notify("No interface to look up", NotificationLevel::Info);
            return;
        }

        if self.lookup_running.swap(true, Ordering::SeqCst) {
            self.state.notify("A lookup is already running", NotificationLevel::Info);
            return;
        }

        for (name, _) in &targets {
            self.state.update(|s| {
                s.panels.network.ports.insert(name.clone(), PortStatus::Resolving);
                ((), Some(StateChange::PortStatusChanged(name.clone())))
            });
        }
        self.state.log(
            format!("Looking up {} interface(s) on {}", targets.len(), credential.address),
            OutputStream::System,
        );

        let resolver = self.resolver.clone();
        let budget = self.config.snmp.lookup_budget();
        let tx = self.event_tx.clone();
        let running = Arc::clone(&self.lookup_running);

        tokio::spawn(async move {
            for (interface, mac) in targets {
                let status = resolve_port(&resolver, credential.clone(), mac, budget).await;
                if tx.send(Event::PortResolved { interface, status }).is_err() {
                    break;
                }
            }
            running.store(false, Ordering::SeqCst);
        });
    }

    fn apply_port_status(&self, interface: String, status: PortStatus) {
        let (line, stream) = port_status_line(&interface, &status);

        self.state.update(|s| {
            s.panels.network.ports.insert(interface.clone(), status);
            ((), Some(StateChange::PortStatusChanged(interface)))
        });
        self.state.log(line, stream);
    }

    fn write_snapshot(&self) {
        let result = {
            let s = self.state.read();
            match s.panels.metrics.last_sample {
                None => Err(anyhow!("no metrics sampled yet")),
                Some(metrics) => {
                    let snapshot = HealthSnapshot::capture(
                        &metrics,
                        &s.thresholds,
                        &s.panels.network.interfaces,
                        &s.panels.network.resolved_ports(),
                    );
                    let path = PathBuf::from(snapshot.default_file_name());
                    snapshot.write_to(&path).map(|()| path)
                }
            }
        };

        match result {
            Ok(path) => {
                self.state
                    .log(format!("Snapshot written to {}", path.display()), OutputStream::System);
                self.state.notify("Snapshot saved", NotificationLevel::Success);
            }
            Err(e) => {
                tracing::warn!(error = %e, "snapshot failed");
                self.state.log(format!("Snapshot failed: {:#}", e), OutputStream::Error);
                self.state.notify("Snapshot failed", NotificationLevel::Error);
            }
        }
    }

    fn render(&mut self) -> Result<()> {
        let state = self.state.read();
        self.terminal.draw(|frame| {
            Renderer::render(frame, &state);
        })?;
        Ok(())
    }
}

/// Decides when a tick needs a frame: after any state change, or when the
/// header clock reaches a new second.
struct RedrawTracker {
    changes: broadcast::Receiver<StateChange>,
    last_second: i64,
}

impl RedrawTracker {
    fn new(changes: broadcast::Receiver<StateChange>) -> Self {
        Self {
            changes,
            last_second: i64::MIN,
        }
    }

    fn needs_redraw(&mut self, now_second: i64) -> bool {
        let mut dirty = now_second != self.last_second;
        self.last_second = now_second;

        loop {
            match self.changes.try_recv() {
                Ok(change) => {
                    tracing::trace!(?change, "state changed");
                    dirty = true;
                }
                Err(TryRecvError::Lagged(skipped)) => {
                    tracing::trace!(skipped, "state changes coalesced");
                    dirty = true;
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }
        dirty
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cursor {
    Up,
    Down,
    Follow,
}

/// Arrow keys move the interface selection or scroll the log, whichever has focus.
fn move_cursor(state: &mut AppState, cursor: Cursor) -> StateChange {
    match (state.focus_panel, cursor) {
        (FocusedPanel::Output, Cursor::Up) => state.panels.output.scroll_up(1),
        (FocusedPanel::Output, Cursor::Down) => state.panels.output.scroll_down(1),
        (_, Cursor::Follow) => state.panels.output.scroll_offset = 0,
        (FocusedPanel::Network, Cursor::Up) => state.panels.network.select_prev(),
        (FocusedPanel::Network, Cursor::Down) => state.panels.network.select_next(),
    }

    match (state.focus_panel, cursor) {
        (FocusedPanel::Network, Cursor::Up | Cursor::Down) => {
            StateChange::SelectionChanged(state.panels.network.selected_index)
        }
        _ => StateChange::OutputScrolled(state.panels.output.scroll_offset),
    }
}

fn expire_notifications(store: &StateStore) -> usize {
    store.update(|s| {
        let removed = s.remove_expired_notifications();
        (removed, (removed > 0).then_some(StateChange::NotificationsExpired(removed)))
    })
}

/// Misses read as warnings in the log; only malformed input is an error.
fn port_status_line(interface: &str, status: &PortStatus) -> (String, OutputStream) {
    match status {
        PortStatus::Found(mapping) => (
            format!("{}: switch port {} (ifIndex {})", interface, mapping.label(), mapping.if_index),
            OutputStream::System,
        ),
        PortStatus::NotFound => (
            format!("{}: {}", interface, status.label()),
            OutputStream::Warning,
        ),
        PortStatus::Failed(reason) => (format!("{}: {}", interface, reason), OutputStream::Error),
        other => (format!("{}: {}", interface, other.label()), OutputStream::System),
    }
}

async fn resolve_port(
    resolver: &SwitchPortResolver,
    credential: SwitchCredential,
    mac: MacAddress,
    budget: Duration,
) -> PortStatus {
    let switch = credential.address.clone();
    let outcome = tokio::time::timeout(budget, resolver.resolve(credential, &mac.to_string())).await;
    if outcome.is_err() {
        tracing::warn!(switch = %switch, mac = %mac, "lookup exceeded its budget");
    }
    port_status(outcome)
}

/// An exhausted budget reads the same as a miss.
fn port_status(outcome: Result<Result<Option<PortMapping>, MacParseError>, Elapsed>) -> PortStatus {
    match outcome {
        Ok(Ok(Some(mapping))) => PortStatus::Found(mapping),
        Ok(Ok(None)) | Err(_) => PortStatus::NotFound,
        Ok(Err(e)) => PortStatus::Failed(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::{InterfaceKind, LinkQuality, Thresholds};
    use crate::integrations::network::NetworkInterface;
    use pretty_assertions::assert_eq;

    fn store() -> StateStore {
        StateStore::new(AppState::new(Theme::default(), Thresholds::default(), 3))
    }

    fn iface(name: &str) -> NetworkInterface {
        NetworkInterface {
            name: name.to_string(),
            kind: InterfaceKind::from_name(name),
            mac: MacAddress::new([0x02, 0, 0, 0, 0, 1]),
            speed_mbps: None,
            quality: LinkQuality::Unknown,
        }
    }

    fn mapping() -> PortMapping {
        PortMapping {
            if_index: 7,
            if_name: Some("Gi1/0/7".into()),
            if_descr: None,
        }
    }

    #[tokio::test]
    async fn exhausted_budget_reads_as_not_found() {
        let elapsed = tokio::time::timeout(Duration::ZERO, std::future::pending::<()>())
            .await
            .unwrap_err();
        assert_eq!(port_status(Err(elapsed)), PortStatus::NotFound);
    }

    #[test]
    fn outcomes_map_to_port_status() {
        assert_eq!(port_status(Ok(Ok(Some(mapping())))), PortStatus::Found(mapping()));
        assert_eq!(port_status(Ok(Ok(None))), PortStatus::NotFound);

        let err = "zz".parse::<MacAddress>().unwrap_err();
        assert!(matches!(port_status(Ok(Err(err))), PortStatus::Failed(_)));
    }

    #[tokio::test]
    async fn silent_switch_within_budget_is_not_found() {
        let socket = tokio::net::UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = socket.local_addr().unwrap();
        let resolver = SwitchPortResolver::new(crate::snmp::SnmpSettings {
            port: addr.port(),
            timeout: Duration::from_millis(50),
            retries: 0,
        });
        let credential = SwitchCredential::new(addr.to_string(), "public");
        let mac = MacAddress::new([0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff]);

        let status = resolve_port(&resolver, credential, mac, Duration::from_millis(20)).await;
        assert_eq!(status, PortStatus::NotFound);
    }

    #[test]
    fn redraws_only_after_a_change_or_a_new_second() {
        let store = store();
        let mut redraw = RedrawTracker::new(store.subscribe());

        assert!(redraw.needs_redraw(100));
        assert!(!redraw.needs_redraw(100));

        store.log("sampled", OutputStream::System);
        assert!(redraw.needs_redraw(100));
        assert!(!redraw.needs_redraw(100));

        // silent updates do not count
        store.update(|s| {
            s.hostname = "desk-01".into();
            ((), None)
        });
        assert!(!redraw.needs_redraw(100));

        assert!(redraw.needs_redraw(101));
    }

    #[test]
    fn change_burst_past_channel_capacity_still_redraws_once() {
        let store = store();
        let mut redraw = RedrawTracker::new(store.subscribe());
        assert!(redraw.needs_redraw(5));

        for i in 0..300 {
            store.log(format!("line {}", i), OutputStream::System);
        }
        assert!(redraw.needs_redraw(5));
        assert!(!redraw.needs_redraw(5));
    }

    #[test]
    fn expiring_notifications_is_a_change() {
        let store = store();
        let mut rx = store.subscribe();

        assert_eq!(expire_notifications(&store), 0);
        assert!(rx.try_recv().is_err());

        store.notify("hello", NotificationLevel::Info);
        store.update(|s| {
            s.notifications[0].created_at -= chrono::Duration::seconds(10);
            ((), None)
        });
        assert!(matches!(rx.try_recv(), Ok(StateChange::NotificationAdded(_))));

        assert_eq!(expire_notifications(&store), 1);
        assert!(matches!(rx.try_recv(), Ok(StateChange::NotificationsExpired(1))));
    }

    #[test]
    fn arrows_follow_focus() {
        let mut state = AppState::new(Theme::default(), Thresholds::default(), 3);
        state.panels.network.set_interfaces(vec![iface("eth0"), iface("wlan0")]);
        for i in 0..5 {
            state.panels.output.push(format!("line {}", i), OutputStream::System);
        }

        let change = move_cursor(&mut state, Cursor::Down);
        assert!(matches!(change, StateChange::SelectionChanged(1)));
        assert!(state.panels.output.is_following());

        state.focus_panel = FocusedPanel::Output;
        let change = move_cursor(&mut state, Cursor::Up);
        assert!(matches!(change, StateChange::OutputScrolled(1)));
        move_cursor(&mut state, Cursor::Up);
        assert_eq!(state.panels.output.scroll_offset, 2);
        assert_eq!(state.panels.network.selected_index, 1);

        move_cursor(&mut state, Cursor::Down);
        assert_eq!(state.panels.output.scroll_offset, 1);
        let change = move_cursor(&mut state, Cursor::Follow);
        assert!(matches!(change, StateChange::OutputScrolled(0)));
    }

    #[test]
    fn misses_are_logged_as_warnings() {
        let (_, stream) = port_status_line("eth0", &PortStatus::Found(mapping()));
        assert_eq!(stream, OutputStream::System);

        let (line, stream) = port_status_line("eth0", &PortStatus::NotFound);
        assert_eq!(line, "eth0: no mapping found");
        assert_eq!(stream, OutputStream::Warning);

        let (_, stream) = port_status_line("eth0", &PortStatus::Failed("bad MAC".into()));
        assert_eq!(stream, OutputStream::Error);
    }
}
