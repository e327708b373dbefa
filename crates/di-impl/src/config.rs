//! 引擎配置
//!
//! 支持 TOML 和 JSON 两种格式，按文件扩展名选择解析器。

use di_abstractions::DiscoveryConfig;
use di_common::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// 缓存配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// 候选集缓存容量
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { capacity: 256 }
    }
}

/// 引擎配置
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub discovery: DiscoveryConfig,
    pub cache: CacheConfig,
    /// 排除规则使用的属性，未配置的属性回退到环境变量
    pub properties: HashMap<String, String>,
}

impl EngineConfig {
    /// 从 TOML 字符串解析
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(content).map_err(ConfigError::parse)?;
        config.validate()?;
        Ok(config)
    }

    /// 从 JSON 字符串解析
    pub fn from_json_str(content: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(content).map_err(ConfigError::parse)?;
        config.validate()?;
        Ok(config)
    }

    /// 从文件加载，扩展名为 `toml` 或 `json`
    pub fn load<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        debug!("加载引擎配置: {}", path.display());
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_str(&content),
            Some("json") => Self::from_json_str(&content),
            _ => Err(ConfigError::UnsupportedFormat {
                path: path.display().to_string(),
            }),
        }
    }

    /// 校验配置
    pub fn validate(&self) -> ConfigResult<()> {
        if self.cache.capacity == 0 {
            return Err(ConfigError::ValidationError {
                message: "cache.capacity 必须大于 0".to_string(),
            });
        }
        if let Some(rule) = self.discovery.exclude.iter().find(|rule| rule.package.trim().is_empty()) {
            return Err(ConfigError::ValidationError {
                message: format!("排除规则的包名不能为空: {rule:?}"),
            });
        }
        Ok(())
    }
}
