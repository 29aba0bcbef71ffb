//! BizDesk configuration system.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{BizDeskError, Result};
use crate::types::DepartmentDefinition;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BizDeskConfig {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    /// Departments registered after the built-in ones.
    #[serde(default)]
    pub departments: Vec<DepartmentDefinition>,
}

impl BizDeskConfig {
    /// Load config from `BIZDESK_CONFIG` or the default path, falling back to defaults.
    pub fn load() -> Result<Self> {
        let path = std::env::var("BIZDESK_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| Self::default_path());
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| BizDeskError::Config(format!("Failed to read {}: {e}", path.display())))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| BizDeskError::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the stores cannot honour.
    pub fn validate(&self) -> Result<()> {
        if self.chat.max_message_chars == 0 {
            return Err(BizDeskError::Config("chat.max_message_chars must be > 0".into()));
        }
        if self.scheduler.min_interval_minutes == 0 {
            return Err(BizDeskError::Config("scheduler.min_interval_minutes must be > 0".into()));
        }
        if self.scheduler.default_interval_minutes < self.scheduler.min_interval_minutes {
            return Err(BizDeskError::Config(
                "scheduler.default_interval_minutes must be >= min_interval_minutes".into(),
            ));
        }
        Ok(())
    }

    /// Get the default config path (~/.bizdesk/config.toml).
    pub fn default_path() -> PathBuf {
        Self::home_dir().join("config.toml")
    }

    /// Get the BizDesk home directory.
    pub fn home_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".bizdesk")
    }
}

/// Gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_host")]
    pub host: String,
}

fn default_port() -> u16 { 3000 }
fn default_host() -> String { "127.0.0.1".into() }

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

/// Chat configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    #[serde(default = "default_max_message_chars")]
    pub max_message_chars: usize,
}

fn default_max_message_chars() -> usize { 4000 }

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            max_message_chars: default_max_message_chars(),
        }
    }
}

/// Recurring task scheduling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_min_interval")]
    pub min_interval_minutes: u32,
    /// Interval used when a recurring tool is submitted without one.
    #[serde(default = "default_interval")]
    pub default_interval_minutes: u32,
    /// Run a sweep every N seconds. Disabled when unset.
    #[serde(default)]
    pub auto_sweep_secs: Option<u64>,
}

fn default_min_interval() -> u32 { 5 }
fn default_interval() -> u32 { 60 }

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            min_interval_minutes: default_min_interval(),
            default_interval_minutes: default_interval(),
            auto_sweep_secs: None,
        }
    }
}
