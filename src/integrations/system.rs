//! Host CPU, memory and disk sampling.

use std::path::Path;

use serde::Serialize;
use sysinfo::{CpuRefreshKind, Disks, MemoryRefreshKind, RefreshKind, System};

/// One reading of the host. Percentages are always finite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SystemMetrics {
    pub cpu_percent: f32,
    pub memory_used_mb: u64,
    pub memory_total_mb: u64,
    pub memory_percent: f32,
    pub disk_used_percent: f32,
}

/// Keeps `sysinfo` handles alive between samples so CPU usage has a baseline.
pub struct SystemMonitor {
    sys: System,
    disks: Disks,
}

impl SystemMonitor {
    pub fn new() -> Self {
        let mut sys = System::new_with_specifics(
            RefreshKind::new()
                .with_cpu(CpuRefreshKind::everything())
                .with_memory(MemoryRefreshKind::everything()),
        );
        sys.refresh_cpu_usage();
        sys.refresh_memory();

        Self {
            sys,
            disks: Disks::new_with_refreshed_list(),
        }
    }

    pub fn sample(&mut self) -> SystemMetrics {
        self.sys.refresh_cpu_usage();
        self.sys.refresh_memory();
        self.disks.refresh();
        if self.disks.list().is_empty() {
            self.disks.refresh_list();
        }

        let total = self.sys.total_memory();
        let used = self.sys.used_memory();

        let spaces: Vec<(&Path, u64, u64)> = self
            .disks
            .list()
            .iter()
            .map(|d| (d.mount_point(), d.total_space(), d.available_space()))
            .collect();

        SystemMetrics {
            cpu_percent: finite(self.sys.global_cpu_usage()),
            memory_used_mb: used / 1024 / 1024,
            memory_total_mb: total / 1024 / 1024,
            memory_percent: percent(used as u128, total as u128),
            disk_used_percent: disk_percent(&spaces),
        }
    }
}

impl Default for SystemMonitor {
    fn default() -> Self {
        Self::new()
    }
}

/// Usage of the root mount, or of all disks together when there is none.
fn disk_percent(disks: &[(&Path, u64, u64)]) -> f32 {
    let root = disks
        .iter()
        .find(|(mount, _, _)| *mount == Path::new("/"));

    let (used, total) = match root {
        Some((_, total, available)) => {
            (u128::from(total.saturating_sub(*available)), u128::from(*total))
        }
        None => disks
            .iter()
            .fold((0u128, 0u128), |(used, sum), (_, total, available)| {
                (
                    used + u128::from(total.saturating_sub(*available)),
                    sum + u128::from(*total),
                )
            }),
    };
    percent(used, total)
}

fn percent(used: u128, total: u128) -> f32 {
    if total == 0 {
        return 0.0;
    }
    finite(((used as f64 / total as f64) * 100.0) as f32)
}

fn finite(value: f32) -> f32 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn samples_metrics_without_nan() {
        let mut monitor = SystemMonitor::new();
        let metrics = monitor.sample();

        assert!(metrics.cpu_percent.is_finite(), "CPU percent should always be finite");
        assert!(metrics.memory_percent.is_finite());
        assert!(
            metrics.disk_used_percent.is_finite(),
            "Disk percent should always be finite"
        );
    }

    #[test]
    fn root_mount_wins_over_aggregate() {
        let disks = [
            (Path::new("/boot"), 1_000, 900),
            (Path::new("/"), 1_000, 250),
        ];
        assert!((disk_percent(&disks) - 75.0).abs() < f32::EPSILON);
    }

    #[test]
    fn aggregates_when_no_root_mount() {
        let disks = [
            (Path::new("C:\\"), 1_000, 500),
            (Path::new("D:\\"), 3_000, 1_500),
        ];
        assert!((disk_percent(&disks) - 50.0).abs() < f32::EPSILON);
        assert_eq!(disk_percent(&[]), 0.0);
    }
}
