//! Unified event handling system

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::time::Duration;
use tokio::sync::mpsc;

use crate::core::state::PortStatus;
use crate::integrations::network::NetworkInterface;
use crate::integrations::system::SystemMetrics;

/// All possible events in the system
#[derive(Debug, Clone)]
pub enum Event {
    // Input events
    Key(KeyEvent),
    Resize,

    // System events
    Tick,     // Render tick
    SlowTick, // Background refresh

    // Async completion events
    MetricsSampled(SystemMetrics),
    InterfacesRefreshed(Vec<NetworkInterface>),
    PortResolved { interface: String, status: PortStatus },
}

/// Result of handling an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventResult {
    Continue,
    Quit,
}

pub struct EventHandler {
    rx: mpsc::UnboundedReceiver<Event>,
    tx: mpsc::UnboundedSender<Event>,
}

impl EventHandler {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { rx, tx }
    }

    pub fn sender(&self) -> mpsc::UnboundedSender<Event> {
        self.tx.clone()
    }

    /// Start all event source tasks
    pub fn spawn_sources(&self, refresh_interval: Duration) {
        tokio::spawn(Self::terminal_events(self.sender()));

        // ~30fps keeps the clock and notifications current
        tokio::spawn(Self::tick_events(
            self.sender(),
            Duration::from_millis(33),
            Event::Tick,
        ));

        tokio::spawn(Self::tick_events(
            self.sender(),
            refresh_interval,
            Event::SlowTick,
        ));
    }

    async fn terminal_events(tx: mpsc::UnboundedSender<Event>) {
        use crossterm::event::{Event as CrosstermEvent, EventStream, KeyEventKind};
        use futures::StreamExt;

        let mut reader = EventStream::new();
        while let Some(event_result) = reader.next().await {
            let event = match event_result {
                Ok(CrosstermEvent::Key(key)) if key.kind != KeyEventKind::Release => Event::Key(key),
                Ok(CrosstermEvent::Resize(_, _)) => Event::Resize,
                Ok(_) => continue,
                Err(e) => {
                    tracing::warn!("terminal event stream failed: {}", e);
                    break;
                }
            };
            if tx.send(event).is_err() {
                break;
            }
        }
    }

    async fn tick_events(tx: mpsc::UnboundedSender<Event>, interval: Duration, event: Event) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            if tx.send(event.clone()).is_err() {
                break;
            }
        }
    }

    pub async fn next(&mut self) -> Option<Event> {
        self.rx.recv().await
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}

/// Key binding helper
pub struct KeyBinding {
    pub key: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyBinding {
    pub fn new(key: KeyCode) -> Self {
        Self {
            key,
            modifiers: KeyModifiers::NONE,
        }
    }

    pub fn ctrl(key: KeyCode) -> Self {
        Self {
            key,
            modifiers: KeyModifiers::CONTROL,
        }
    }

    /// Shift is folded into the character itself, so `L` and `?` match with or without it.
    pub fn matches(&self, event: &KeyEvent) -> bool {
        let modifiers = match event.code {
            KeyCode::Char(_) => event.modifiers - KeyModifiers::SHIFT,
            _ => event.modifiers,
        };
        event.code == self.key && modifiers == self.modifiers
    }
}

/// Standard key bindings
pub struct KeyBindings;

impl KeyBindings {
    pub fn quit() -> KeyBinding {
        KeyBinding::new(KeyCode::Char('q'))
    }

    pub fn quit_alt() -> KeyBinding {
        KeyBinding::ctrl(KeyCode::Char('c'))
    }

    pub fn help() -> KeyBinding {
        KeyBinding::new(KeyCode::Char('?'))
    }

    pub fn escape() -> KeyBinding {
        KeyBinding::new(KeyCode::Esc)
    }

    pub fn tab() -> KeyBinding {
        KeyBinding::new(KeyCode::Tab)
    }

    pub fn up() -> KeyBinding {
        KeyBinding::new(KeyCode::Up)
    }

    pub fn down() -> KeyBinding {
        KeyBinding::new(KeyCode::Down)
    }

    pub fn vim_up() -> KeyBinding {
        KeyBinding::new(KeyCode::Char('k'))
    }

    pub fn vim_down() -> KeyBinding {
        KeyBinding::new(KeyCode::Char('j'))
    }

    pub fn follow() -> KeyBinding {
        KeyBinding::new(KeyCode::End)
    }

    pub fn refresh() -> KeyBinding {
        KeyBinding::new(KeyCode::Char('r'))
    }

    pub fn lookup() -> KeyBinding {
        KeyBinding::new(KeyCode::Char('l'))
    }

    pub fn lookup_all() -> KeyBinding {
        KeyBinding::new(KeyCode::Char('L'))
    }

    pub fn snapshot() -> KeyBinding {
        KeyBinding::new(KeyCode::Char('x'))
    }
}
