// ==========================================
// 自助终端管理后台 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 来源: 默认值 < JSON 配置文件 < 环境变量（KIOSK_*）
// 启动时解析一次，之后所有组件共享同一实例
// ==========================================

use crate::config::import_config_trait::ImportConfigReader;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::error::Error;
use std::path::Path;
use std::sync::RwLock;

type ConfigResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
#[derive(Debug, Default)]
pub struct ConfigManager {
    values: RwLock<HashMap<String, String>>,
}

impl ConfigManager {
    /// 创建空的 ConfigManager（全部使用默认值）
    pub fn new() -> Self {
        Self::default()
    }

    /// 从环境变量加载
    pub fn from_env() -> Self {
        let manager = Self::new();
        manager.apply_env(|name| std::env::var(name).ok());
        manager
    }

    /// 从 JSON 配置文件加载，环境变量优先
    ///
    /// # 文件格式
    /// ```json
    /// { "backend_base_url": "http://10.0.0.5:3000/api", "request_timeout_secs": 15 }
    /// ```
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let manager = Self::from_json_str(&raw)?;
        manager.apply_env(|name| std::env::var(name).ok());
        Ok(manager)
    }

    /// 从 JSON 字符串加载（仅接受对象，值可为字符串/数字/布尔）
    pub fn from_json_str(raw: &str) -> ConfigResult<Self> {
        let parsed: Value = serde_json::from_str(raw)?;
        let object = parsed
            .as_object()
            .ok_or_else(|| format!("配置文件必须是 JSON 对象，实际: {}", parsed))?;

        let manager = Self::new();
        for (key, value) in object {
            let text = match value {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                Value::Null => continue,
                other => return Err(format!("配置项 {} 的值不是标量: {}", key, other).into()),
            };
            manager.set_config_value(key, &text)?;
        }
        Ok(manager)
    }

    /// 链式设置配置项（主要用于测试与命令行覆写）
    pub fn with_value(self, key: &str, value: &str) -> Self {
        if let Ok(mut values) = self.values.write() {
            values.insert(key.to_string(), value.to_string());
        }
        self
    }

    /// 按 config_keys::ENV_BINDINGS 读取环境变量
    fn apply_env<F: Fn(&str) -> Option<String>>(&self, lookup: F) {
        if let Ok(mut values) = self.values.write() {
            for (key, env_name) in config_keys::ENV_BINDINGS {
                if let Some(value) = lookup(env_name).filter(|v| !v.trim().is_empty()) {
                    values.insert(key.to_string(), value.trim().to_string());
                }
            }
        }
    }

    /// 读取配置值
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        let values = self
            .values
            .read()
            .map_err(|e| format!("锁获取失败: {}", e))?;
        Ok(values.get(key).cloned())
    }

    pub fn set_config_value(&self, key: &str, value: &str) -> ConfigResult<()> {
        let mut values = self
            .values
            .write()
            .map_err(|e| format!("锁获取失败: {}", e))?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    /// 读取配置值，带默认值
    fn get_config_or_default(&self, key: &str, default: &str) -> String {
        match self.get_config_value(key) {
            Ok(Some(value)) => value,
            Ok(None) => default.to_string(),
            Err(e) => {
                tracing::warn!(config_key = key, error = %e, "配置读取失败，使用默认值");
                default.to_string()
            }
        }
    }

    /// 解析数值配置，格式错误时使用默认值
    fn get_parsed_or_default<T>(&self, key: &str, default: T) -> T
    where
        T: std::str::FromStr + Copy + std::fmt::Display,
    {
        let value = self.get_config_or_default(key, &default.to_string());
        value.trim().parse::<T>().unwrap_or_else(|_| {
            tracing::warn!(config_key = key, raw_value = %value, "配置格式错误，使用默认值");
            default
        })
    }

    /// 获取全部生效配置的快照（JSON格式，含默认值）
    ///
    /// # 用途
    /// - 启动日志
    /// - 命令行 `config` 输出
    pub fn get_config_snapshot(&self) -> ConfigResult<String> {
        let mut snapshot: BTreeMap<&str, String> = BTreeMap::new();
        snapshot.insert(config_keys::BACKEND_BASE_URL, self.backend_base_url());
        snapshot.insert(
            config_keys::REQUEST_TIMEOUT_SECS,
            self.request_timeout_secs().to_string(),
        );
        snapshot.insert(config_keys::ZIP_MAX_BYTES, self.zip_max_bytes().to_string());
        snapshot.insert(config_keys::ZIP_SPREADSHEET_STEM, self.zip_spreadsheet_stem());
        snapshot.insert(config_keys::PREVIEW_LIMIT, self.preview_limit().to_string());
        snapshot.insert(
            config_keys::REFRESH_INTERVAL_SECS,
            self.refresh_interval_secs().to_string(),
        );
        Ok(serde_json::to_string(&snapshot)?)
    }
}

// ==========================================
// ImportConfigReader Trait 实现
// ==========================================
impl ImportConfigReader for ConfigManager {
    // ===== 后端连接 =====

    fn backend_base_url(&self) -> String {
        let value = self.get_config_or_default(
            config_keys::BACKEND_BASE_URL,
            defaults::BACKEND_BASE_URL,
        );
        let trimmed = value.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            defaults::BACKEND_BASE_URL.to_string()
        } else {
            trimmed.to_string()
        }
    }

    fn request_timeout_secs(&self) -> u64 {
        let secs = self.get_parsed_or_default(
            config_keys::REQUEST_TIMEOUT_SECS,
            defaults::REQUEST_TIMEOUT_SECS,
        );
        if secs == 0 {
            defaults::REQUEST_TIMEOUT_SECS
        } else {
            secs
        }
    }

    // ===== ZIP 导入 =====

    fn zip_max_bytes(&self) -> u64 {
        self.get_parsed_or_default(config_keys::ZIP_MAX_BYTES, defaults::ZIP_MAX_BYTES)
    }

    fn zip_spreadsheet_stem(&self) -> String {
        let value = self.get_config_or_default(
            config_keys::ZIP_SPREADSHEET_STEM,
            defaults::ZIP_SPREADSHEET_STEM,
        );
        if value.trim().is_empty() {
            defaults::ZIP_SPREADSHEET_STEM.to_string()
        } else {
            value.trim().to_string()
        }
    }

    // ===== 界面 =====

    fn preview_limit(&self) -> usize {
        self.get_parsed_or_default(config_keys::PREVIEW_LIMIT, defaults::PREVIEW_LIMIT)
    }

    fn refresh_interval_secs(&self) -> u64 {
        let secs = self.get_parsed_or_default(
            config_keys::REFRESH_INTERVAL_SECS,
            defaults::REFRESH_INTERVAL_SECS,
        );
        secs.max(1)
    }
}

// ==========================================
// 默认值
// ==========================================
pub mod defaults {
    pub const BACKEND_BASE_URL: &str = "http://localhost:3000/api";
    pub const REQUEST_TIMEOUT_SECS: u64 = 10;
    pub const ZIP_MAX_BYTES: u64 = 50 * 1024 * 1024;
    pub const ZIP_SPREADSHEET_STEM: &str = "productos";
    pub const PREVIEW_LIMIT: usize = 5;
    pub const REFRESH_INTERVAL_SECS: u64 = 30;
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 后端连接
    pub const BACKEND_BASE_URL: &str = "backend_base_url";
    pub const REQUEST_TIMEOUT_SECS: &str = "request_timeout_secs";

    // ZIP 导入
    pub const ZIP_MAX_BYTES: &str = "zip_max_bytes";
    pub const ZIP_SPREADSHEET_STEM: &str = "zip_spreadsheet_stem";

    // 界面
    pub const PREVIEW_LIMIT: &str = "preview_limit";
    pub const REFRESH_INTERVAL_SECS: &str = "refresh_interval_secs";

    /// 配置键 → 环境变量
    pub const ENV_BINDINGS: [(&str, &str); 6] = [
        (BACKEND_BASE_URL, "KIOSK_API_URL"),
        (REQUEST_TIMEOUT_SECS, "KIOSK_REQUEST_TIMEOUT_SECS"),
        (ZIP_MAX_BYTES, "KIOSK_ZIP_MAX_BYTES"),
        (ZIP_SPREADSHEET_STEM, "KIOSK_ZIP_SPREADSHEET_STEM"),
        (PREVIEW_LIMIT, "KIOSK_PREVIEW_LIMIT"),
        (REFRESH_INTERVAL_SECS, "KIOSK_REFRESH_INTERVAL_SECS"),
    ];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_empty() {
        let config = ConfigManager::new();
        assert_eq!(config.backend_base_url(), "http://localhost:3000/api");
        assert_eq!(config.request_timeout_secs(), 10);
        assert_eq!(config.zip_max_bytes(), 50 * 1024 * 1024);
        assert_eq!(config.zip_spreadsheet_stem(), "productos");
        assert_eq!(config.preview_limit(), 5);
        assert_eq!(config.refresh_interval_secs(), 30);
    }

    #[test]
    fn test_invalid_number_falls_back_to_default() {
        let config = ConfigManager::new()
            .with_value(config_keys::REQUEST_TIMEOUT_SECS, "abc")
            .with_value(config_keys::PREVIEW_LIMIT, "-1");
        assert_eq!(config.request_timeout_secs(), 10);
        assert_eq!(config.preview_limit(), 5);
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let config =
            ConfigManager::new().with_value(config_keys::BACKEND_BASE_URL, "http://10.0.0.5/api/");
        assert_eq!(config.backend_base_url(), "http://10.0.0.5/api");
    }

    #[test]
    fn test_env_overrides_file_values() {
        let config = ConfigManager::from_json_str(r#"{"backend_base_url": "http://file/api", "preview_limit": 8}"#)
            .unwrap();
        config.apply_env(|name| (name == "KIOSK_API_URL").then(|| "http://env/api".to_string()));

        assert_eq!(config.backend_base_url(), "http://env/api");
        assert_eq!(config.preview_limit(), 8);
    }

    #[test]
    fn test_json_rejects_nested_values() {
        assert!(ConfigManager::from_json_str(r#"{"preview_limit": [1]}"#).is_err());
        assert!(ConfigManager::from_json_str("[]").is_err());
    }

    #[test]
    fn test_snapshot_contains_effective_values() {
        let config = ConfigManager::new().with_value(config_keys::PREVIEW_LIMIT, "7");
        let snapshot: serde_json::Value =
            serde_json::from_str(&config.get_config_snapshot().unwrap()).unwrap();
        assert_eq!(snapshot["preview_limit"], "7");
        assert_eq!(snapshot["backend_base_url"], "http://localhost:3000/api");
    }
}
