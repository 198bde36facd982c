// ==========================================
// 自助终端管理后台 - 导入层
// ==========================================
// 职责: 外部数据 → 标准商品记录 → 后端批量接口
// 支持: Excel/CSV 表格、ZIP 压缩包（表格 + 图片）、外部 JSON API
// ==========================================

// 模块声明
pub mod api_adapter;
pub mod error;
pub mod field_mapper;
pub mod file_parser;
pub mod normalizer;
pub mod product_importer_trait;
pub mod row_pipeline;
pub mod session;
pub mod spreadsheet_adapter;
pub mod submission;
pub mod validator;
pub mod zip_adapter;

// 重导出核心类型
pub use api_adapter::{extract_by_path, ApiFetch, ExternalApiAdapter, ExternalApiConfig};
pub use error::{ImportError, ImportErrorKind, ImportResult};
pub use field_mapper::FieldMapper;
pub use file_parser::{CsvParser, ExcelParser, SheetRow, SheetTable, UniversalFileParser};
pub use normalizer::{normalize, FieldNormalizer, NormalizationFailure, TextFields};
pub use row_pipeline::{RawRow, RowOutcome, RowPipeline};
pub use session::{ImportSession, DEFAULT_PREVIEW_LIMIT};
pub use spreadsheet_adapter::{SpreadsheetAdapter, SpreadsheetLoad};
pub use submission::{format_result_summary, SubmissionOrchestrator, SUMMARY_DETAIL_LIMIT};
pub use validator::{validate, ProductValidator};
pub use zip_adapter::{ImageMatch, ZipAdapter, ZipManifest, ZipUpload, DEFAULT_ZIP_MAX_BYTES};

// 重导出 Trait 接口
pub use product_importer_trait::{FileParser, RecordNormalizer, RecordValidator};
