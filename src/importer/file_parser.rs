// ==========================================
// 自助终端管理后台 - 文件解析器实现
// ==========================================
// 阶段 0: 文件读取与解析
// 支持: Excel (.xlsx/.xls) / CSV (.csv)
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use crate::importer::product_importer_trait::FileParser;
use calamine::{Data, Range, Reader, Xls, Xlsx};
use csv::ReaderBuilder;
use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;

// ==========================================
// SheetTable - 解析后的工作表
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct SheetTable {
    pub headers: Vec<String>,
    pub rows: Vec<SheetRow>,
}

/// 工作表中的一行（列名 → 单元格文本）
#[derive(Debug, Clone)]
pub struct SheetRow {
    pub row_number: usize, // 物理行号，表头为第 1 行
    pub cells: HashMap<String, String>,
}

impl SheetTable {
    fn push_row(&mut self, row_number: usize, values: impl Iterator<Item = String>) {
        let mut cells = HashMap::new();
        for (col_idx, value) in values.enumerate() {
            if let Some(header) = self.headers.get(col_idx) {
                if header.is_empty() {
                    continue;
                }
                cells.insert(header.clone(), value.trim().to_string());
            }
        }

        // 跳过完全空白的行
        if cells.values().all(|v| v.is_empty()) {
            return;
        }

        self.rows.push(SheetRow { row_number, cells });
    }
}

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser;

impl FileParser for CsvParser {
    fn parse_bytes(&self, bytes: &[u8]) -> ImportResult<SheetTable> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .from_reader(bytes);

        // 读取表头（兼容 UTF-8 BOM）
        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
            .collect();

        let mut table = SheetTable {
            headers,
            rows: Vec::new(),
        };

        for (row_idx, result) in reader.records().enumerate() {
            let record = result?;
            let row_number = record
                .position()
                .map(|p| p.line() as usize)
                .unwrap_or(row_idx + 2);
            table.push_row(row_number, record.iter().map(|v| v.to_string()));
        }

        Ok(table)
    }
}

// ==========================================
// Excel Parser 实现
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExcelFormat {
    Xlsx,
    Xls,
}

pub struct ExcelParser {
    format: ExcelFormat,
}

impl ExcelParser {
    pub fn xlsx() -> Self {
        Self {
            format: ExcelFormat::Xlsx,
        }
    }

    pub fn xls() -> Self {
        Self {
            format: ExcelFormat::Xls,
        }
    }

    /// 读取第一个工作表
    fn first_sheet_range(&self, bytes: &[u8]) -> ImportResult<Range<Data>> {
        let cursor = Cursor::new(bytes.to_vec());
        match self.format {
            ExcelFormat::Xlsx => {
                let mut workbook: Xlsx<_> = Xlsx::new(cursor)
                    .map_err(|e| ImportError::ExcelParseError(e.to_string()))?;
                let sheet_name = first_sheet_name(workbook.sheet_names())?;
                workbook
                    .worksheet_range(&sheet_name)
                    .map_err(|e| ImportError::ExcelParseError(e.to_string()))
            }
            ExcelFormat::Xls => {
                let mut workbook: Xls<_> = Xls::new(cursor)
                    .map_err(|e| ImportError::ExcelParseError(e.to_string()))?;
                let sheet_name = first_sheet_name(workbook.sheet_names())?;
                workbook
                    .worksheet_range(&sheet_name)
                    .map_err(|e| ImportError::ExcelParseError(e.to_string()))
            }
        }
    }
}

fn first_sheet_name(sheet_names: Vec<String>) -> ImportResult<String> {
    sheet_names
        .into_iter()
        .next()
        .ok_or_else(|| ImportError::ExcelParseError("Excel 文件无工作表".to_string()))
}

impl FileParser for ExcelParser {
    fn parse_bytes(&self, bytes: &[u8]) -> ImportResult<SheetTable> {
        let range = self.first_sheet_range(bytes)?;

        // 表头所在的物理行（0 起）
        let header_row_idx = range.start().map(|(row, _)| row as usize).unwrap_or(0);

        // 提取表头（第一行）
        let mut rows = range.rows();
        let header_row = rows.next().ok_or(ImportError::EmptyFile)?;

        let headers: Vec<String> = header_row
            .iter()
            .map(|cell| cell.to_string().trim().to_string())
            .collect();

        let mut table = SheetTable {
            headers,
            rows: Vec::new(),
        };

        // 读取数据行
        for (idx, data_row) in rows.enumerate() {
            let row_number = header_row_idx + idx + 2;
            table.push_row(row_number, data_row.iter().map(|cell| cell.to_string()));
        }

        Ok(table)
    }
}

// ==========================================
// 通用文件解析器（根据扩展名自动选择）
// ==========================================
pub struct UniversalFileParser;

impl UniversalFileParser {
    /// 根据扩展名选择解析器
    pub fn for_extension(&self, ext: &str) -> ImportResult<Box<dyn FileParser>> {
        match ext.to_lowercase().as_str() {
            "csv" => Ok(Box::new(CsvParser)),
            "xlsx" => Ok(Box::new(ExcelParser::xlsx())),
            "xls" => Ok(Box::new(ExcelParser::xls())),
            other => Err(ImportError::UnsupportedFormat(other.to_string())),
        }
    }

    pub fn parse<P: AsRef<Path>>(&self, file_path: P) -> ImportResult<SheetTable> {
        let path = file_path.as_ref();
        let parser = self.for_extension(&extension_of(&path.to_string_lossy()))?;
        parser.parse_file(path)
    }

    /// 按文件名判断格式并解析内存中的内容
    pub fn parse_named_bytes(&self, file_name: &str, bytes: &[u8]) -> ImportResult<SheetTable> {
        let parser = self.for_extension(&extension_of(file_name))?;
        parser.parse_bytes(bytes)
    }
}

/// 取文件扩展名（小写，不含点）
pub fn extension_of(file_name: &str) -> String {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}
