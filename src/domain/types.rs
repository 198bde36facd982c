// ==========================================
// 自助终端管理后台 - 导入相关枚举类型
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// ImportPolicy - 行级错误处理策略
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImportPolicy {
    /// 任一行校验失败则整批不可导入（表格导入）
    AllOrNothing,
    /// 丢弃无效行，保留其余（外部 API 导入）
    BestEffort,
}

// ==========================================
// AdapterState - 导入会话状态
// ==========================================
// idle -> loading -> {validated | failed}，reset 回到 idle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdapterState {
    Idle,
    Loading,
    Validated,
    Failed,
}

impl AdapterState {
    pub fn as_str(&self) -> &str {
        match self {
            AdapterState::Idle => "IDLE",
            AdapterState::Loading => "LOADING",
            AdapterState::Validated => "VALIDATED",
            AdapterState::Failed => "FAILED",
        }
    }
}

// ==========================================
// SourceKind - 导入来源
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SourceKind {
    Spreadsheet,
    Zip,
    ExternalApi,
}

impl SourceKind {
    pub fn as_str(&self) -> &str {
        match self {
            SourceKind::Spreadsheet => "SPREADSHEET",
            SourceKind::Zip => "ZIP",
            SourceKind::ExternalApi => "EXTERNAL_API",
        }
    }

    /// 各来源固定使用的行级策略
    pub fn policy(&self) -> ImportPolicy {
        match self {
            SourceKind::Spreadsheet | SourceKind::Zip => ImportPolicy::AllOrNothing,
            SourceKind::ExternalApi => ImportPolicy::BestEffort,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_policy() {
        assert_eq!(SourceKind::Spreadsheet.policy(), ImportPolicy::AllOrNothing);
        assert_eq!(SourceKind::ExternalApi.policy(), ImportPolicy::BestEffort);
    }

    #[test]
    fn test_state_serializes_screaming_case() {
        let value = serde_json::to_value(AdapterState::Validated).unwrap();
        assert_eq!(value, serde_json::json!("VALIDATED"));
        assert_eq!(AdapterState::Loading.as_str(), "LOADING");
    }
}
