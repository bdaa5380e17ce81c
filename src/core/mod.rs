//! Application core: event loop, events and shared state

pub mod app;
pub mod events;
pub mod state;
