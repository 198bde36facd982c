// ==========================================
// 自助终端管理后台 - 配置层
// ==========================================
// 职责: 进程级配置，启动时解析一次
// 来源: 默认值 / JSON 配置文件 / KIOSK_* 环境变量
// ==========================================

pub mod config_manager;
pub mod import_config_trait;

// 重导出核心配置管理器
pub use config_manager::{config_keys, defaults, ConfigManager};
pub use import_config_trait::ImportConfigReader;
