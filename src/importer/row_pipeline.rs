// ==========================================
// 自助终端管理后台 - 行处理管道
// ==========================================
// 职责: 三种导入来源共用的 标准化 → 校验 流程
// 策略: AllOrNothing（任一行失败则整批清空）/ BestEffort（静默丢弃无效行）
// ==========================================

use crate::domain::product::{ProductRecord, ValidationError};
use crate::domain::types::ImportPolicy;
use crate::importer::normalizer::{FieldNormalizer, NormalizationFailure};
use crate::importer::product_importer_trait::{RecordNormalizer, RecordValidator};
use crate::importer::validator::ProductValidator;
use serde_json::Value;
use tracing::{debug, warn};

/// 待处理的一条原始记录
#[derive(Debug, Clone)]
pub struct RawRow {
    pub row_number: usize,
    pub value: Value,
}

/// 行处理结果
#[derive(Debug, Clone, Default)]
pub struct RowOutcome {
    pub total: usize,                  // 输入行数
    pub records: Vec<ProductRecord>,   // 可导入记录（保持输入顺序）
    pub errors: Vec<ValidationError>,  // 行级错误（仅 AllOrNothing 保留）
    pub dropped: usize,                // 被丢弃的行数
}

impl RowOutcome {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

pub struct RowPipeline {
    normalizer: Box<dyn RecordNormalizer>,
    validator: Box<dyn RecordValidator>,
}

impl RowPipeline {
    pub fn new(normalizer: Box<dyn RecordNormalizer>, validator: Box<dyn RecordValidator>) -> Self {
        Self {
            normalizer,
            validator,
        }
    }

    /// 默认组件: FieldNormalizer + ProductValidator
    pub fn standard() -> Self {
        Self::new(Box::new(FieldNormalizer::new()), Box::new(ProductValidator))
    }

    /// 按策略处理全部行
    pub fn process(&self, rows: Vec<RawRow>, policy: ImportPolicy) -> RowOutcome {
        let mut outcome = RowOutcome {
            total: rows.len(),
            ..RowOutcome::default()
        };

        for row in rows {
            match self.check_row(&row) {
                Ok(record) => outcome.records.push(record),
                Err(mut errors) => {
                    outcome.dropped += 1;
                    match policy {
                        ImportPolicy::AllOrNothing => outcome.errors.append(&mut errors),
                        ImportPolicy::BestEffort => {
                            warn!(
                                row_number = row.row_number,
                                reasons = errors.len(),
                                "记录无效，已丢弃"
                            );
                        }
                    }
                }
            }
        }

        // 整批拒绝：任一行出错则没有可导入记录
        if policy == ImportPolicy::AllOrNothing && outcome.has_errors() {
            outcome.dropped = outcome.total;
            outcome.records.clear();
        }

        debug!(
            total = outcome.total,
            valid = outcome.records.len(),
            dropped = outcome.dropped,
            errors = outcome.errors.len(),
            "行处理完成"
        );
        outcome
    }

    /// 单行: 标准化 + 校验，失败时返回该行全部错误
    pub fn check_row(&self, row: &RawRow) -> Result<ProductRecord, Vec<ValidationError>> {
        match self.normalizer.normalize(&row.value) {
            Ok(record) => {
                let errors = self.validator.validate(&record, row.row_number);
                if errors.is_empty() {
                    Ok(record)
                } else {
                    Err(errors)
                }
            }
            Err(NormalizationFailure::InvalidPrice { raw, text }) => {
                let mut errors = self.validator.validate_text_fields(&text, row.row_number);
                errors.push(ValidationError::for_field(
                    row.row_number,
                    "price",
                    format!("价格必须是大于 0 的数字（实际: {}）", raw),
                ));
                Err(errors)
            }
            Err(failure) => {
                let error = match &failure {
                    NormalizationFailure::MalformedField { field } => {
                        ValidationError::for_field(row.row_number, field, failure.to_string())
                    }
                    _ => ValidationError::for_row(row.row_number, failure.to_string()),
                };
                Err(vec![error])
            }
        }
    }
}

impl Default for RowPipeline {
    fn default() -> Self {
        Self::standard()
    }
}
