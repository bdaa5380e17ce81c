//! Host data sources

pub mod network;
pub mod system;
