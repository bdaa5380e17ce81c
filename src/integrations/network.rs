//! Active network interfaces with their hardware address and link speed.

use std::path::Path;

use serde::Serialize;
use sysinfo::Networks;
use tracing::trace;

use crate::health::{InterfaceKind, LinkQuality};
use crate::snmp::MacAddress;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetworkInterface {
    pub name: String,
    pub kind: InterfaceKind,
    pub mac: MacAddress,
    pub speed_mbps: Option<u64>,
    pub quality: LinkQuality,
}

impl NetworkInterface {
    pub fn speed_label(&self) -> String {
        match self.speed_mbps {
            Some(mbps) if mbps >= 1000 && mbps % 1000 == 0 => format!("{} Gbps", mbps / 1000),
            Some(mbps) => format!("{} Mbps", mbps),
            None => "-".to_string(),
        }
    }
}

/// Operational state and negotiated speed as the kernel reports them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkInfo {
    pub up: bool,
    pub speed_mbps: Option<u64>,
}

impl Default for LinkInfo {
    fn default() -> Self {
        Self {
            up: true,
            speed_mbps: None,
        }
    }
}

/// Interfaces that are up and have a hardware address, loopback excluded.
pub fn enumerate_interfaces() -> Vec<NetworkInterface> {
    let networks = Networks::new_with_refreshed_list();

    let mut interfaces: Vec<NetworkInterface> = (&networks)
        .into_iter()
        .filter_map(|(name, data)| {
            let link = link_info(name);
            build_interface(name, data.mac_address().0, link)
        })
        .collect();

    interfaces.sort_by(|a, b| a.name.cmp(&b.name));
    interfaces
}

fn build_interface(name: &str, octets: [u8; 6], link: LinkInfo) -> Option<NetworkInterface> {
    let mac = MacAddress::new(octets);
    if is_loopback(name) || mac.is_zero() {
        trace!(interface = name, "Skipping interface without hardware address");
        return None;
    }
    if !link.up {
        trace!(interface = name, "Skipping interface that is down");
        return None;
    }

    Some(NetworkInterface {
        name: name.to_string(),
        kind: InterfaceKind::from_name(name),
        mac,
        speed_mbps: link.speed_mbps,
        quality: LinkQuality::from_speed(link.speed_mbps),
    })
}

fn is_loopback(name: &str) -> bool {
    name == "lo" || name.to_lowercase().contains("loopback")
}

#[cfg(target_os = "linux")]
fn link_info(name: &str) -> LinkInfo {
    read_link_info(Path::new("/sys/class/net"), name)
}

#[cfg(not(target_os = "linux"))]
fn link_info(_name: &str) -> LinkInfo {
    LinkInfo::default()
}

/// Reads `<root>/<name>/{operstate,speed}`. Missing files and `unknown`
/// state count as up; a speed of -1 means not negotiated.
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn read_link_info(root: &Path, name: &str) -> LinkInfo {
    let dir = root.join(name);

    let up = match std::fs::read_to_string(dir.join("operstate")) {
        Ok(state) => matches!(state.trim(), "up" | "unknown"),
        Err(_) => true,
    };

    let speed_mbps = std::fs::read_to_string(dir.join("speed"))
        .ok()
        .and_then(|s| s.trim().parse::<i64>().ok())
        .filter(|mbps| *mbps > 0)
        .map(|mbps| mbps as u64);

    LinkInfo { up, speed_mbps }
}
