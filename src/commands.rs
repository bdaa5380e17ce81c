//! One-shot subcommands that print to stdout instead of opening the dashboard.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use humansize::{format_size, BINARY};

use crate::config::Config;
use crate::integrations::network::{enumerate_interfaces, NetworkInterface};
use crate::integrations::system::{SystemMetrics, SystemMonitor};
use crate::snapshot::{self, HealthSnapshot};
use crate::snmp::{PortMapping, ResolveError, SwitchCredential, SwitchPortResolver};

/// Two readings apart so CPU usage has a baseline.
async fn sample_once() -> SystemMetrics {
    let mut monitor = SystemMonitor::new();
    tokio::time::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL).await;
    monitor.sample()
}

fn require_switch(config: &Config) -> Result<SwitchCredential> {
    match config.snmp.credential() {
        Some(credential) => Ok(credential),
        None => bail!(
            "no switch configured: pass --switch <ADDR>, set VITALS_SNMP_SWITCH, \
             or set [snmp] enabled/switch in the config file"
        ),
    }
}

/// Resolves each interface in turn; misses and budget overruns are left out.
async fn resolve_ports(
    config: &Config,
    credential: &SwitchCredential,
    interfaces: &[NetworkInterface],
) -> HashMap<String, PortMapping> {
    let resolver = SwitchPortResolver::new(config.snmp.settings());
    let budget = config.snmp.lookup_budget();
    let mut ports = HashMap::new();

    for iface in interfaces {
        let mac = iface.mac.to_string();
        let lookup = resolver.resolve(credential.clone(), &mac);
        match tokio::time::timeout(budget, lookup).await {
            Ok(Ok(Some(mapping))) => {
                ports.insert(iface.name.clone(), mapping);
            }
            Ok(Ok(None)) => {}
            Ok(Err(e)) => tracing::warn!(interface = %iface.name, error = %e, "skipping interface"),
            Err(_) => tracing::warn!(interface = %iface.name, "lookup exceeded its budget"),
        }
    }
    ports
}

pub async fn print_check(config: &Config, json: bool) -> Result<()> {
    let metrics = sample_once().await;
    let thresholds = &config.thresholds;

    if json {
        let snapshot = HealthSnapshot::capture(&metrics, thresholds, &[], &HashMap::new());
        println!("{}", snapshot.to_json()?);
        return Ok(());
    }

    let level = thresholds.overall(
        metrics.cpu_percent,
        metrics.memory_percent,
        metrics.disk_used_percent,
    );

    println!("Device:  {}", snapshot::device_name());
    println!("CPU:     {}", thresholds.cpu.label(metrics.cpu_percent));
    println!(
        "Memory:  {}  ({} / {})",
        thresholds.memory.label(metrics.memory_percent),
        format_size(metrics.memory_used_mb * 1024 * 1024, BINARY),
        format_size(metrics.memory_total_mb * 1024 * 1024, BINARY),
    );
    println!("Disk:    {}", thresholds.disk.label(metrics.disk_used_percent));
    println!();
    println!("Status:  {}", level);
    Ok(())
}

pub async fn print_interfaces(config: &Config) -> Result<()> {
    let interfaces = enumerate_interfaces();
    if interfaces.is_empty() {
        println!("No active network interfaces");
        return Ok(());
    }

    let credential = config.snmp.credential();
    let ports = match &credential {
        Some(credential) => resolve_ports(config, credential, &interfaces).await,
        None => HashMap::new(),
    };

    println!(
        "{:<16} {:<9} {:<10} {:<9} {:<18} SWITCH PORT",
        "INTERFACE", "TYPE", "SPEED", "QUALITY", "MAC"
    );
    for iface in &interfaces {
        let port = match (&credential, ports.get(&iface.name)) {
            (None, _) => "-".to_string(),
            (Some(_), Some(mapping)) => format!("{} (ifIndex {})", mapping.label(), mapping.if_index),
            (Some(_), None) => "no mapping found".to_string(),
        };
        println!(
            "{:<16} {:<9} {:<10} {:<9} {:<18} {}",
            iface.name,
            iface.kind.to_string(),
            iface.speed_label(),
            iface.quality.to_string(),
            iface.mac,
            port
        );
    }
    Ok(())
}

pub async fn print_lookup(config: &Config, mac: &str, detailed: bool) -> Result<()> {
    let credential = require_switch(config)?;
    let switch = credential.address.clone();
    let resolver = SwitchPortResolver::new(config.snmp.settings());

    if detailed {
        match resolver.lookup(credential, mac).await {
            Ok(mapping) => print_mapping(&switch, &mapping),
            Err(ResolveError::InvalidInput(e)) => bail!("invalid MAC address: {}", e),
            Err(e) => println!("No mapping found for {} on {}: {}", mac, switch, e),
        }
        return Ok(());
    }

    match resolver.resolve(credential, mac).await {
        Ok(Some(mapping)) => print_mapping(&switch, &mapping),
        Ok(None) => println!("No mapping found for {} on {}", mac, switch),
        Err(e) => bail!("invalid MAC address: {}", e),
    }
    Ok(())
}

fn print_mapping(switch: &str, mapping: &PortMapping) {
    println!("Switch:       {}", switch);
    println!("ifIndex:      {}", mapping.if_index);
    println!("ifName:       {}", mapping.if_name.as_deref().unwrap_or("-"));
    println!("ifDescr:      {}", mapping.if_descr.as_deref().unwrap_or("-"));
}

pub async fn write_snapshot(config: &Config, output: Option<&Path>) -> Result<()> {
    let metrics = sample_once().await;
    let interfaces = enumerate_interfaces();
    let ports = match config.snmp.credential() {
        Some(credential) => resolve_ports(config, &credential, &interfaces).await,
        None => HashMap::new(),
    };

    let snapshot = HealthSnapshot::capture(&metrics, &config.thresholds, &interfaces, &ports);
    let path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(snapshot.default_file_name()));
    snapshot.write_to(&path)?;

    println!("Snapshot written to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookups_need_a_configured_switch() {
        let mut config = Config::default();
        let err = require_switch(&config).unwrap_err();
        assert!(err.to_string().contains("--switch"));

        config.apply_overrides(Some("10.0.0.2".into()), Some("s3cret".into()));
        let credential = require_switch(&config).unwrap();
        assert_eq!(credential, SwitchCredential::new("10.0.0.2", "s3cret"));
    }

    #[tokio::test]
    async fn malformed_mac_is_an_error_before_any_network_io() {
        let mut config = Config::default();
        config.apply_overrides(Some("192.0.2.1".into()), None);

        let err = print_lookup(&config, "not-a-mac", false).await.unwrap_err();
        assert!(err.to_string().contains("invalid MAC address"));

        let err = print_lookup(&config, "aa:bb", true).await.unwrap_err();
        assert!(err.to_string().contains("invalid MAC address"));
    }

    #[tokio::test]
    async fn silent_switch_leaves_interfaces_unmapped() {
        use crate::health::{InterfaceKind, LinkQuality};
        use crate::snmp::MacAddress;

        let agent = tokio::net::UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let mut config = Config::default();
        config.apply_overrides(Some(agent.local_addr().unwrap().to_string()), None);
        config.snmp.timeout_ms = 20;
        config.snmp.retries = 0;
        let credential = require_switch(&config).unwrap();

        let interfaces = vec![NetworkInterface {
            name: "eth0".into(),
            kind: InterfaceKind::Ethernet,
            mac: MacAddress::new([0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff]),
            speed_mbps: Some(1000),
            quality: LinkQuality::Strong,
        }];

        let ports = resolve_ports(&config, &credential, &interfaces).await;
        assert!(ports.is_empty());
    }

    #[tokio::test]
    async fn snapshot_honours_explicit_output_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("report.json");

        write_snapshot(&Config::default(), Some(&path)).await.unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert!(value.get("overall_status").is_some());
        assert!(value.get("network").unwrap().is_array());
    }
}
