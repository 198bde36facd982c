// ==========================================
// 自助终端管理后台 - 表格导入适配器
// ==========================================
// 流程: 解析第一个工作表 → 表头检查 → 逐行标准化/校验
// 策略: AllOrNothing，任一行出错则整表不可导入
// ==========================================

use crate::domain::types::ImportPolicy;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::field_mapper::FieldMapper;
use crate::importer::file_parser::{extension_of, SheetTable, UniversalFileParser};
use crate::importer::row_pipeline::{RawRow, RowOutcome, RowPipeline};
use std::path::Path;
use tracing::{debug, info, instrument, warn};

/// 表格加载结果
#[derive(Debug, Clone)]
pub struct SpreadsheetLoad {
    pub source_name: String,
    pub headers: Vec<String>,
    pub outcome: RowOutcome,
}

pub struct SpreadsheetAdapter {
    parser: UniversalFileParser,
    mapper: FieldMapper,
    pipeline: RowPipeline,
}

impl SpreadsheetAdapter {
    pub fn new(pipeline: RowPipeline) -> Self {
        Self {
            parser: UniversalFileParser,
            mapper: FieldMapper,
            pipeline,
        }
    }

    pub fn pipeline(&self) -> &RowPipeline {
        &self.pipeline
    }

    /// 从磁盘加载表格文件
    #[instrument(skip(self, file_path))]
    pub async fn load_file<P: AsRef<Path>>(&self, file_path: P) -> ImportResult<SpreadsheetLoad> {
        let path = file_path.as_ref();
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();

        // 先检查扩展名，再读取内容
        self.parser.for_extension(&extension_of(&file_name))?;
        if !path.exists() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }

        let bytes = tokio::fs::read(path).await?;
        info!(file_name = %file_name, size = bytes.len(), "开始加载表格文件");
        self.load_bytes(&file_name, &bytes)
    }

    /// 加载内存中的表格文件
    pub fn load_bytes(&self, file_name: &str, bytes: &[u8]) -> ImportResult<SpreadsheetLoad> {
        let table = self.parser.parse_named_bytes(file_name, bytes)?;
        self.load_table(file_name, table)
    }

    /// 对已解析的工作表执行结构检查与行处理
    pub fn load_table(&self, source_name: &str, table: SheetTable) -> ImportResult<SpreadsheetLoad> {
        self.check_structure(&table)?;

        debug!(rows = table.rows.len(), "表头检查通过，开始逐行校验");
        let rows = self.to_raw_rows(&table);
        let outcome = self.pipeline.process(rows, ImportPolicy::AllOrNothing);

        if outcome.has_errors() {
            warn!(
                source = %source_name,
                errors = outcome.errors.len(),
                "表格存在错误行，整表不可导入"
            );
        } else {
            info!(source = %source_name, valid = outcome.records.len(), "表格校验通过");
        }

        Ok(SpreadsheetLoad {
            source_name: source_name.to_string(),
            headers: table.headers,
            outcome,
        })
    }

    /// 结构检查: 文件非空 + 必填表头齐全
    pub fn check_structure(&self, table: &SheetTable) -> ImportResult<()> {
        if table.headers.iter().all(|h| h.is_empty()) {
            return Err(ImportError::EmptyFile);
        }

        let missing = self.mapper.missing_required_headers(&table.headers);
        if !missing.is_empty() {
            warn!(missing = ?missing, headers = ?table.headers, "缺少必填列");
            return Err(ImportError::MissingColumns(missing));
        }

        if table.rows.is_empty() {
            return Err(ImportError::EmptyFile);
        }
        Ok(())
    }

    pub fn to_raw_rows(&self, table: &SheetTable) -> Vec<RawRow> {
        table
            .rows
            .iter()
            .map(|row| RawRow {
                row_number: row.row_number,
                value: self.mapper.row_to_json(row),
            })
            .collect()
    }
}

impl Default for SpreadsheetAdapter {
    fn default() -> Self {
        Self::new(RowPipeline::standard())
    }
}
