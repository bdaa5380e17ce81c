//! Point-in-time health report as JSON

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use serde::Serialize;
use sysinfo::System;

use crate::health::{HealthLevel, Thresholds};
use crate::integrations::network::NetworkInterface;
use crate::integrations::system::SystemMetrics;
use crate::snmp::PortMapping;

#[derive(Debug, Clone, Serialize)]
pub struct HealthSnapshot {
    pub timestamp: DateTime<Local>,
    pub device: String,
    pub cpu_percent: f32,
    pub memory_percent: f32,
    pub disk_percent: f32,
    pub overall_level: HealthLevel,
    pub overall_status: String,
    pub network: Vec<NetworkRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NetworkRow {
    #[serde(flatten)]
    pub interface: NetworkInterface,
    pub switch_port: Option<PortMapping>,
}

impl HealthSnapshot {
    pub fn capture(
        metrics: &SystemMetrics,
        thresholds: &Thresholds,
        interfaces: &[NetworkInterface],
        ports: &HashMap<String, PortMapping>,
    ) -> Self {
        let level = thresholds.overall(
            metrics.cpu_percent,
            metrics.memory_percent,
            metrics.disk_used_percent,
        );

        Self {
            timestamp: Local::now(),
            device: device_name(),
            cpu_percent: metrics.cpu_percent,
            memory_percent: metrics.memory_percent,
            disk_percent: metrics.disk_used_percent,
            overall_level: level,
            overall_status: level.to_string(),
            network: interfaces
                .iter()
                .map(|iface| NetworkRow {
                    interface: iface.clone(),
                    switch_port: ports.get(&iface.name).cloned(),
                })
                .collect(),
        }
    }

    /// `health_snapshot_<YYYYmmdd_HHMMSS>.json`
    pub fn default_file_name(&self) -> String {
        format!("health_snapshot_{}.json", self.timestamp.format("%Y%m%d_%H%M%S"))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_json()?)
            .with_context(|| format!("writing snapshot to {}", path.display()))?;
        Ok(())
    }
}

pub fn device_name() -> String {
    System::host_name().unwrap_or_else(|| "Unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::{InterfaceKind, LinkQuality};
    use crate::snmp::MacAddress;
    use pretty_assertions::assert_eq;

    fn metrics() -> SystemMetrics {
        SystemMetrics {
            cpu_percent: 42.0,
            memory_used_mb: 7_000,
            memory_total_mb: 16_000,
            memory_percent: 75.5,
            disk_used_percent: 60.0,
        }
    }

    fn eth0() -> NetworkInterface {
        NetworkInterface {
            name: "eth0".into(),
            kind: InterfaceKind::Ethernet,
            mac: MacAddress::new([0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff]),
            speed_mbps: Some(1000),
            quality: LinkQuality::Strong,
        }
    }

    #[test]
    fn snapshot_json_has_flat_network_rows() {
        let mut ports = HashMap::new();
        ports.insert(
            "eth0".to_string(),
            PortMapping {
                if_index: 7,
                if_name: Some("Gi1/0/7".into()),
                if_descr: None,
            },
        );

        let snapshot =
            HealthSnapshot::capture(&metrics(), &Thresholds::default(), &[eth0()], &ports);
        let value: serde_json::Value = serde_json::from_str(&snapshot.to_json().unwrap()).unwrap();

        assert_eq!(value["overall_status"], "🟠 System Under Stress");
        assert_eq!(value["overall_level"], "stressed");
        let row = &value["network"][0];
        assert_eq!(row["name"], "eth0");
        assert_eq!(row["kind"], "Ethernet");
        assert_eq!(row["mac"], "aa:bb:cc:dd:ee:ff");
        assert_eq!(row["quality"], "Strong");
        assert_eq!(row["switch_port"]["if_index"], 7);
        assert_eq!(row["switch_port"]["if_descr"], serde_json::Value::Null);
    }

    #[test]
    fn writes_timestamped_file() {
        let snapshot =
            HealthSnapshot::capture(&metrics(), &Thresholds::default(), &[], &HashMap::new());
        let name = snapshot.default_file_name();
        assert!(name.starts_with("health_snapshot_"));
        assert!(name.ends_with(".json"));
        assert_eq!(name.len(), "health_snapshot_20240101_120000.json".len());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(&name);
        snapshot.write_to(&path).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("\"network\": []"));
    }
}
