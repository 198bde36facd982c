// ==========================================
// 自助终端管理后台 - 商品导入领域模型
// ==========================================
// 职责: 标准商品记录 / 校验错误 / 后端批量结果
// 红线: 全部为请求级临时值，不落库
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// ProductRecord - 标准商品记录
// ==========================================
// 三种导入来源最终都收敛到这个结构
// 序列化字段名与后端批量接口保持一致（codigo/nombre/...）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    #[serde(rename = "codigo", alias = "code")]
    pub code: String,

    #[serde(rename = "nombre", alias = "name")]
    pub name: String,

    #[serde(rename = "categoria", alias = "category")]
    pub category: String,

    #[serde(rename = "precio", alias = "price")]
    pub price: f64,

    #[serde(rename = "detalles", alias = "details")]
    pub details: String,

    /// 促销信息，缺省为空字符串
    #[serde(rename = "promocion", alias = "promotion", default)]
    pub promotion: String,
}

// ==========================================
// ValidationError - 行级校验错误
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub row_number: usize,          // 来源内行号（从 1 开始）
    pub field: Option<String>,      // 违规字段（整行问题时为空）
    pub message: String,            // 违规描述
}

impl ValidationError {
    pub fn for_field(row_number: usize, field: &str, message: impl Into<String>) -> Self {
        Self {
            row_number,
            field: Some(field.to_string()),
            message: message.into(),
        }
    }

    pub fn for_row(row_number: usize, message: impl Into<String>) -> Self {
        Self {
            row_number,
            field: None,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "第 {} 行: {}", self.row_number, self.message)
    }
}

// ==========================================
// BulkImportResult - 后端批量导入结果
// ==========================================
// 原样透传，不在客户端重算 inserted/failed/total
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkImportResult {
    #[serde(rename = "insertados", alias = "inserted")]
    pub inserted: u64,

    #[serde(rename = "errores", alias = "failed")]
    pub failed: u64,

    pub total: u64,

    #[serde(
        rename = "detalles",
        alias = "details",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub details: Option<Vec<RowFailure>>,
}

impl BulkImportResult {
    /// 后端未报告任何失败行
    pub fn is_full_success(&self) -> bool {
        self.failed == 0
    }

    pub fn failure_details(&self) -> &[RowFailure] {
        self.details.as_deref().unwrap_or(&[])
    }
}

/// 后端报告的单行失败
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowFailure {
    #[serde(rename = "fila", alias = "row")]
    pub row: u64,

    pub error: String,

    /// ZIP 导入时后端会附带商品编码
    #[serde(
        rename = "codigo",
        alias = "code",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub code: Option<String>,
}
