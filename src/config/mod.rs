//! Configuration system for Vitals

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::health::{Threshold, Thresholds};
use crate::snmp::{SnmpSettings, SwitchCredential};

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("threshold '{metric}': warn ({warn}) must not exceed critical ({critical})")]
    InvalidThreshold {
        metric: &'static str,
        warn: f32,
        critical: f32,
    },
}

/// Global application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub display: DisplayConfig,
    pub thresholds: Thresholds,
    pub snmp: SnmpConfig,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: Config =
            toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("vitals").join("config.toml"))
    }

    /// Explicit path if given, else the default path when that file exists.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let checks = [
            ("cpu", self.thresholds.cpu),
            ("memory", self.thresholds.memory),
            ("disk", self.thresholds.disk),
        ];
        for (metric, threshold) in checks {
            if !threshold.is_ordered() {
                return Err(ConfigError::InvalidThreshold {
                    metric,
                    warn: threshold.warn,
                    critical: threshold.critical,
                });
            }
        }
        Ok(())
    }

    /// Command-line and environment values take precedence over the file.
    pub fn apply_overrides(&mut self, switch: Option<String>, community: Option<String>) {
        if let Some(switch) = switch {
            self.snmp.switch = Some(switch);
            self.snmp.enabled = true;
        }
        if let Some(community) = community {
            self.snmp.community = community;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GeneralConfig {
    pub refresh_interval_secs: u64,
    pub history_len: usize,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: 2,
            history_len: 60,
        }
    }
}

impl GeneralConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs.max(1))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DisplayConfig {
    pub theme: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            theme: "tokyo-night".to_string(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SnmpConfig {
    pub enabled: bool,
    pub switch: Option<String>,
    pub community: String,
    pub port: u16,
    pub timeout_ms: u64,
    pub retries: u32,
    pub lookup_budget_secs: u64,
}

impl Default for SnmpConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            switch: None,
            community: "public".to_string(),
            port: 161,
            timeout_ms: 1000,
            retries: 1,
            lookup_budget_secs: 10,
        }
    }
}

impl fmt::Debug for SnmpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnmpConfig")
            .field("enabled", &self.enabled)
            .field("switch", &self.switch)
            .field("community", &"<redacted>")
            .field("port", &self.port)
            .field("timeout_ms", &self.timeout_ms)
            .field("retries", &self.retries)
            .field("lookup_budget_secs", &self.lookup_budget_secs)
            .finish()
    }
}

impl SnmpConfig {
    pub fn settings(&self) -> SnmpSettings {
        SnmpSettings {
            port: self.port,
            timeout: Duration::from_millis(self.timeout_ms),
            retries: self.retries,
        }
    }

    /// Credential for the configured switch, if lookups are enabled.
    pub fn credential(&self) -> Option<SwitchCredential> {
        if !self.enabled {
            return None;
        }
        self.switch
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(|switch| SwitchCredential::new(switch.trim(), self.community.clone()))
    }

    pub fn lookup_budget(&self) -> Duration {
        Duration::from_secs(self.lookup_budget_secs.max(1))
    }
}

/// Write the default configuration to `path`
pub fn init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "Configuration already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    Config::default().save(path)?;
    println!("Created {}", path.display());
    Ok(())
}
