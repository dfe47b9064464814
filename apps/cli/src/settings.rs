//! CLI 配置文件
//!
//! ```toml
//! [bridge]
//! poll_interval_ms = 2
//! shutdown_timeout_ms = 2000
//! worker_thread_name = "mapapi-native"
//!
//! [simulation]
//! positioners = 3
//! steps = 10
//! step_interval_ms = 50
//! viewport_width = 1080
//! viewport_height = 1920
//! ```

use anyhow::{Context, Result};
use mapapi_sdk::BridgeConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// 默认配置文件路径：`<config_dir>/mapapi/cli.toml`
pub fn default_config_file() -> Option<PathBuf> {
    let mut path = dirs::config_dir()?;
    path.push("mapapi");
    path.push("cli.toml");
    Some(path)
}

/// 模拟参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    /// 定位标记数量
    pub positioners: usize,
    /// 模拟步数
    pub steps: usize,
    /// 每步之间等待 UI 任务的时间（毫秒）
    pub step_interval_ms: u64,
    pub viewport_width: i32,
    pub viewport_height: i32,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            positioners: 3,
            steps: 10,
            step_interval_ms: 50,
            viewport_width: 1080,
            viewport_height: 1920,
        }
    }
}

/// CLI 配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub bridge: BridgeConfig,
    pub simulation: SimulationSettings,
}

impl CliConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse CLI config")
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize CLI config")
    }

    /// 从指定文件加载配置
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    /// 加载配置：优先使用显式路径，其次默认路径，都不存在时使用默认值
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }
        match default_config_file() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }
}
