// ==========================================
// 自助终端管理后台 - 记录标准化器实现
// ==========================================
// 职责: 原始记录（JSON 对象）→ ProductRecord
// 规则: 文本 TRIM / 价格数值解析 / 促销缺省为空串
// 红线: 纯函数，与调用方来源无关
// ==========================================

use crate::domain::product::ProductRecord;
use crate::importer::field_mapper::{
    FieldMapper, FieldSpec, FIELD_CATEGORY, FIELD_CODE, FIELD_DETAILS, FIELD_NAME, FIELD_PRICE,
    FIELD_PROMOTION,
};
use crate::importer::product_importer_trait::RecordNormalizer;
use serde_json::{Map, Value};
use thiserror::Error;

/// 已完成文本转换的字段（价格除外）
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TextFields {
    pub code: String,
    pub name: String,
    pub category: String,
    pub details: String,
    pub promotion: String,
}

impl TextFields {
    fn with_price(self, price: f64) -> ProductRecord {
        ProductRecord {
            code: self.code,
            name: self.name,
            category: self.category,
            price,
            details: self.details,
            promotion: self.promotion,
        }
    }
}

/// 标准化失败
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NormalizationFailure {
    #[error("记录不是对象（实际类型: {found}）")]
    NotAnObject { found: &'static str },

    #[error("字段 {field} 的值不是文本或数字")]
    MalformedField { field: &'static str },

    #[error("价格必须是大于 0 的数字（实际: {raw}）")]
    InvalidPrice { raw: String, text: TextFields },
}

pub struct FieldNormalizer {
    mapper: FieldMapper,
}

impl FieldNormalizer {
    pub fn new() -> Self {
        Self {
            mapper: FieldMapper,
        }
    }

    /// 文本字段转换: 缺失/null → ""，数字/布尔 → 文本，数组/对象 → 失败
    fn coerce_text(
        &self,
        object: &Map<String, Value>,
        spec: &FieldSpec,
    ) -> Result<String, NormalizationFailure> {
        match self.mapper.lookup(object, spec) {
            None | Some(Value::Null) => Ok(String::new()),
            Some(Value::String(s)) => Ok(s.trim().to_string()),
            Some(Value::Number(n)) => Ok(n.to_string()),
            Some(Value::Bool(b)) => Ok(b.to_string()),
            Some(Value::Array(_)) | Some(Value::Object(_)) => {
                Err(NormalizationFailure::MalformedField {
                    field: spec.canonical,
                })
            }
        }
    }

    /// 价格转换，失败时返回原始文本
    fn coerce_price(&self, object: &Map<String, Value>) -> Result<f64, String> {
        let parsed = match self.mapper.lookup(object, &FIELD_PRICE) {
            None | Some(Value::Null) => return Err(String::new()),
            Some(Value::Number(n)) => n.as_f64().ok_or_else(|| n.to_string())?,
            Some(Value::String(s)) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Err(String::new());
                }
                trimmed.parse::<f64>().map_err(|_| trimmed.to_string())?
            }
            Some(other) => return Err(other.to_string()),
        };

        if parsed.is_nan() {
            return Err("NaN".to_string());
        }
        Ok(parsed)
    }
}

impl Default for FieldNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordNormalizer for FieldNormalizer {
    fn normalize(&self, raw: &Value) -> Result<ProductRecord, NormalizationFailure> {
        let object = raw.as_object().ok_or(NormalizationFailure::NotAnObject {
            found: json_type_name(raw),
        })?;

        let text = TextFields {
            code: self.coerce_text(object, &FIELD_CODE)?,
            name: self.coerce_text(object, &FIELD_NAME)?,
            category: self.coerce_text(object, &FIELD_CATEGORY)?,
            details: self.coerce_text(object, &FIELD_DETAILS)?,
            promotion: self.coerce_text(object, &FIELD_PROMOTION)?,
        };

        match self.coerce_price(object) {
            Ok(price) => Ok(text.with_price(price)),
            Err(raw) => Err(NormalizationFailure::InvalidPrice { raw, text }),
        }
    }
}

/// 便捷函数: 使用默认标准化器
pub fn normalize(raw: &Value) -> Result<ProductRecord, NormalizationFailure> {
    FieldNormalizer::new().normalize(raw)
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
