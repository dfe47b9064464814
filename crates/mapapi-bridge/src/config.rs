//! 桥接层配置
//!
//! 配置既可以直接构造，也可以从 TOML 文件加载。缺失的字段使用默认值。

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// 配置加载/保存错误
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// 工作线程配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// 命令队列空闲时的等待时间（毫秒），之后轮询一次引擎事件
    pub poll_interval_ms: u64,
    /// 关闭时等待工作线程退出的最长时间（毫秒）
    pub shutdown_timeout_ms: u64,
    /// 工作线程名称
    pub worker_thread_name: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 2,
            shutdown_timeout_ms: 2000,
            worker_thread_name: "mapapi-native".to_string(),
        }
    }
}

impl BridgeConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }

    /// 从 TOML 字符串解析
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// 从 TOML 文件加载
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// 序列化为 TOML
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// 保存到 TOML 文件
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BridgeConfig::default();
        assert_eq!(config.poll_interval(), Duration::from_millis(2));
        assert_eq!(config.shutdown_timeout(), Duration::from_secs(2));
        assert_eq!(config.worker_thread_name, "mapapi-native");
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = BridgeConfig::from_toml_str("poll_interval_ms = 5\n").unwrap();
        assert_eq!(config.poll_interval_ms, 5);
        assert_eq!(config.shutdown_timeout_ms, 2000);
        assert_eq!(config.worker_thread_name, "mapapi-native");
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let err = BridgeConfig::from_toml_str("poll_interval_ms = \"fast\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(format!("{}", err).starts_with("Failed to parse config"));
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bridge.toml");

        let config = BridgeConfig {
            poll_interval_ms: 7,
            shutdown_timeout_ms: 500,
            worker_thread_name: "map-worker".to_string(),
        };
        config.save(&path).unwrap();

        assert_eq!(BridgeConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = BridgeConfig::load(dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
