// ==========================================
// 自助终端管理后台 - 商品导入 Trait
// ==========================================
// 职责: 定义导入管道各阶段接口（不包含实现）
// 管道: 解析 → 标准化 → 校验 → 提交
// ==========================================

use crate::domain::product::{ProductRecord, ValidationError};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::SheetTable;
use crate::importer::normalizer::{NormalizationFailure, TextFields};
use serde_json::Value;
use std::path::Path;

// ==========================================
// FileParser Trait
// ==========================================
// 用途: 表格文件解析接口（阶段 0）
// 实现者: ExcelParser, CsvParser
pub trait FileParser: Send + Sync {
    /// 解析内存中的文件内容为表格（表头 + 行记录）
    ///
    /// # 参数
    /// - bytes: 文件原始字节
    ///
    /// # 返回
    /// - Ok(SheetTable): 第一个工作表的内容
    /// - Err: 格式错误、解析错误
    fn parse_bytes(&self, bytes: &[u8]) -> ImportResult<SheetTable>;

    /// 从磁盘读取并解析文件
    fn parse_file(&self, file_path: &Path) -> ImportResult<SheetTable> {
        if !file_path.exists() {
            return Err(ImportError::FileNotFound(file_path.display().to_string()));
        }
        let bytes = std::fs::read(file_path)?;
        self.parse_bytes(&bytes)
    }
}

// ==========================================
// RecordNormalizer Trait
// ==========================================
// 用途: 原始行 → 标准商品记录（阶段 1）
// 实现者: FieldNormalizer
pub trait RecordNormalizer: Send + Sync {
    /// 将一条原始记录（JSON 对象）转换为 ProductRecord
    ///
    /// # 说明
    /// - 表格行、JSON 元素走同一个实现，结果与来源无关
    /// - 价格无法解析时返回 NormalizationFailure，不会产生 NaN 价格
    fn normalize(&self, raw: &Value) -> Result<ProductRecord, NormalizationFailure>;
}

// ==========================================
// RecordValidator Trait
// ==========================================
// 用途: 必填字段与数值范围校验（阶段 2）
// 实现者: ProductValidator
pub trait RecordValidator: Send + Sync {
    /// 校验一条记录，返回全部违规（空 = 通过）
    fn validate(&self, record: &ProductRecord, row_number: usize) -> Vec<ValidationError>;

    /// 仅校验文本字段（价格在标准化阶段已失败的行使用）
    fn validate_text_fields(&self, fields: &TextFields, row_number: usize)
        -> Vec<ValidationError>;
}
