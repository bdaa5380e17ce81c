//! Threshold classification for host metrics and links

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Warn/critical pair for one metric, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Threshold {
    pub warn: f32,
    pub critical: f32,
}

impl Threshold {
    pub const fn new(warn: f32, critical: f32) -> Self {
        Self { warn, critical }
    }

    pub fn is_ordered(&self) -> bool {
        self.warn.is_finite() && self.critical.is_finite() && self.warn <= self.critical
    }

    pub fn level(&self, value: f32) -> HealthLevel {
        let value = sanitize(value);
        if value >= self.critical {
            HealthLevel::Critical
        } else if value >= self.warn {
            HealthLevel::Stressed
        } else {
            HealthLevel::Healthy
        }
    }

    /// `"🟠 72.4%"` style label.
    pub fn label(&self, value: f32) -> String {
        format!("{} {:.1}%", self.level(value).icon(), sanitize(value))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub cpu: Threshold,
    pub memory: Threshold,
    pub disk: Threshold,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            cpu: Threshold::new(70.0, 85.0),
            memory: Threshold::new(70.0, 85.0),
            disk: Threshold::new(80.0, 90.0),
        }
    }
}

impl Thresholds {
    /// Worst level across the three metrics.
    pub fn overall(&self, cpu: f32, memory: f32, disk: f32) -> HealthLevel {
        [
            self.cpu.level(cpu),
            self.memory.level(memory),
            self.disk.level(disk),
        ]
        .into_iter()
        .max()
        .unwrap_or(HealthLevel::Healthy)
    }
}

fn sanitize(value: f32) -> f32 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthLevel {
    Healthy,
    Stressed,
    Critical,
}

impl HealthLevel {
    pub fn icon(&self) -> &'static str {
        match self {
            HealthLevel::Healthy => "🟢",
            HealthLevel::Stressed => "🟠",
            HealthLevel::Critical => "🔴",
        }
    }

    /// Headline for the whole machine at this level.
    pub fn summary(&self) -> &'static str {
        match self {
            HealthLevel::Healthy => "System Healthy",
            HealthLevel::Stressed => "System Under Stress",
            HealthLevel::Critical => "Critical Issues Detected",
        }
    }
}

impl fmt::Display for HealthLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.icon(), self.summary())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LinkQuality {
    Strong,
    Moderate,
    Poor,
    Unknown,
}

static SPEED_WITH_UNIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+(?:\.\d+)?)\s*(g|m)?bps").expect("valid regex"));
static FIRST_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("valid regex"));

impl LinkQuality {
    pub fn from_mbps(mbps: f64) -> Self {
        if !mbps.is_finite() {
            LinkQuality::Unknown
        } else if mbps >= 100.0 {
            LinkQuality::Strong
        } else if mbps >= 20.0 {
            LinkQuality::Moderate
        } else {
            LinkQuality::Poor
        }
    }

    /// Classifies text such as `"1 Gbps"`, `"100 Mbps"` or `"2.5Gbps"`.
    /// Text without a recognisable unit falls back to its first number.
    pub fn from_text(speed: &str) -> Self {
        Self::from_mbps(parse_mbps(speed))
    }

    pub fn from_speed(speed: Option<u64>) -> Self {
        speed.map_or(LinkQuality::Unknown, |mbps| Self::from_mbps(mbps as f64))
    }
}

impl fmt::Display for LinkQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            LinkQuality::Strong => "Strong",
            LinkQuality::Moderate => "Moderate",
            LinkQuality::Poor => "Poor",
            LinkQuality::Unknown => "Unknown",
        };
        f.write_str(text)
    }
}

fn parse_mbps(speed: &str) -> f64 {
    let lowered = speed.trim().to_lowercase();
    if let Some(caps) = SPEED_WITH_UNIT.captures(&lowered) {
        let value: f64 = caps[1].parse().unwrap_or(0.0);
        return match caps.get(2).map(|m| m.as_str()) {
            Some("g") => value * 1000.0,
            _ => value,
        };
    }
    FIRST_NUMBER
        .find(&lowered)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum InterfaceKind {
    #[serde(rename = "Wi-Fi")]
    WiFi,
    Ethernet,
}

impl InterfaceKind {
    pub fn from_name(name: &str) -> Self {
        let lowered = name.to_lowercase();
        let wireless = ["wi-fi", "wifi", "wlan", "wireless"]
            .iter()
            .any(|marker| lowered.contains(marker))
            || lowered.starts_with("wl");
        if wireless {
            InterfaceKind::WiFi
        } else {
            InterfaceKind::Ethernet
        }
    }
}

impl fmt::Display for InterfaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InterfaceKind::WiFi => f.write_str("Wi-Fi"),
            InterfaceKind::Ethernet => f.write_str("Ethernet"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_follow_thresholds_inclusively() {
        let cpu = Thresholds::default().cpu;
        assert_eq!(cpu.level(69.9), HealthLevel::Healthy);
        assert_eq!(cpu.level(70.0), HealthLevel::Stressed);
        assert_eq!(cpu.level(85.0), HealthLevel::Critical);
        assert_eq!(cpu.level(f32::NAN), HealthLevel::Healthy);
    }

    #[test]
    fn labels_carry_icon_and_one_decimal() {
        let t = Thresholds::default();
        assert_eq!(t.disk.label(91.26), "🔴 91.3%");
        assert_eq!(t.memory.label(72.0), "🟠 72.0%");
        assert_eq!(t.cpu.label(f32::INFINITY), "🟢 0.0%");
    }

    #[test]
    fn overall_takes_the_worst_metric() {
        let t = Thresholds::default();
        assert_eq!(t.overall(10.0, 20.0, 30.0).to_string(), "🟢 System Healthy");
        assert_eq!(t.overall(10.0, 75.0, 30.0).to_string(), "🟠 System Under Stress");
        assert_eq!(t.overall(90.0, 75.0, 30.0).to_string(), "🔴 Critical Issues Detected");
        // disk stresses at 80, not 70
        assert_eq!(t.overall(10.0, 10.0, 75.0), HealthLevel::Healthy);
    }

    #[test]
    fn link_quality_from_speed_text() {
        assert_eq!(LinkQuality::from_text("1 Gbps"), LinkQuality::Strong);
        assert_eq!(LinkQuality::from_text("100 Mbps"), LinkQuality::Strong);
        assert_eq!(LinkQuality::from_text("54 Mbps"), LinkQuality::Moderate);
        assert_eq!(LinkQuality::from_text("0.1Gbps"), LinkQuality::Strong);
        assert_eq!(LinkQuality::from_text("10"), LinkQuality::Poor);
        assert_eq!(LinkQuality::from_text("link: 40 units"), LinkQuality::Moderate);
        assert_eq!(LinkQuality::from_text("n/a"), LinkQuality::Poor);
        assert_eq!(LinkQuality::from_speed(None), LinkQuality::Unknown);
        assert_eq!(LinkQuality::from_speed(Some(1000)), LinkQuality::Strong);
    }

    #[test]
    fn wireless_interfaces_are_detected_by_name() {
        for name in ["Wi-Fi", "wlan0", "wlp3s0", "Wireless Network Connection", "WiFi 2"] {
            assert_eq!(InterfaceKind::from_name(name), InterfaceKind::WiFi, "{name}");
        }
        for name in ["eth0", "enp0s31f6", "Ethernet 2"] {
            assert_eq!(InterfaceKind::from_name(name), InterfaceKind::Ethernet, "{name}");
        }
    }

    #[test]
    fn threshold_ordering() {
        assert!(Threshold::new(70.0, 85.0).is_ordered());
        assert!(Threshold::new(80.0, 80.0).is_ordered());
        assert!(!Threshold::new(90.0, 80.0).is_ordered());
    }
}
