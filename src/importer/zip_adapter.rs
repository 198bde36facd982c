// ==========================================
// 自助终端管理后台 - ZIP 导入适配器
// ==========================================
// 压缩包结构:
//   productos.xlsx（或 .xls/.csv），位于根目录或一级目录
//   imagenes/ 或 images/，文件名（不含扩展名）对应商品编码
// 前置检查: 扩展名 → 大小上限 → 可读 → 表格存在 → 表头齐全
// 表格条目解压后同样受大小上限约束
// 行级校验与图片缺失不在本地拦截，整包交由后端处理
// ==========================================

use crate::domain::product::{ProductRecord, ValidationError};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::field_mapper::{FieldMapper, FIELD_CODE, FIELD_IMAGE};
use crate::importer::file_parser::{extension_of, SheetTable, UniversalFileParser};
use crate::importer::spreadsheet_adapter::SpreadsheetAdapter;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::{Cursor, Read};
use std::path::Path;
use tracing::{debug, info, instrument, warn};
use zip::ZipArchive;

/// 压缩包大小上限（50 MiB）
pub const DEFAULT_ZIP_MAX_BYTES: u64 = 50 * 1024 * 1024;

/// 压缩包内表格文件的标准文件名（不含扩展名）
pub const DEFAULT_SPREADSHEET_STEM: &str = "productos";

const IMAGE_DIRS: [&str; 2] = ["imagenes", "images"];
const SPREADSHEET_EXTENSIONS: [&str; 3] = ["xlsx", "xls", "csv"];

/// 单条记录的图片匹配情况
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageMatch {
    pub row_number: usize,
    pub code: String,
    pub expected_stem: String,       // 期望的图片文件名（不含扩展名）
    pub entry: Option<String>,       // 匹配到的压缩包条目
}

/// 压缩包检查结果
#[derive(Debug, Clone, Serialize)]
pub struct ZipManifest {
    pub archive_name: String,
    pub archive_size: u64,
    pub spreadsheet_entry: String,
    pub image_index: BTreeMap<String, String>, // 文件名 stem → 条目名
    pub row_count: usize,
    pub preview: Vec<ProductRecord>,
    pub image_matches: Vec<ImageMatch>,
    pub row_errors: Vec<ValidationError>, // 仅供提示，不阻止上传
}

impl ZipManifest {
    pub fn missing_images(&self) -> usize {
        self.image_matches.iter().filter(|m| m.entry.is_none()).count()
    }
}

/// 通过检查、待上传的压缩包
#[derive(Debug, Clone)]
pub struct ZipUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub manifest: ZipManifest,
}

pub struct ZipAdapter {
    max_bytes: u64,
    spreadsheet_stem: String,
    preview_limit: usize,
    parser: UniversalFileParser,
    mapper: FieldMapper,
    spreadsheet: SpreadsheetAdapter,
}

impl ZipAdapter {
    pub fn new(max_bytes: u64, spreadsheet_stem: impl Into<String>, preview_limit: usize) -> Self {
        Self {
            max_bytes,
            spreadsheet_stem: spreadsheet_stem.into(),
            preview_limit,
            parser: UniversalFileParser,
            mapper: FieldMapper,
            spreadsheet: SpreadsheetAdapter::default(),
        }
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// 检查磁盘上的压缩包（读取前先检查扩展名与大小）
    #[instrument(skip(self, file_path))]
    pub async fn inspect_file<P: AsRef<Path>>(&self, file_path: P) -> ImportResult<ZipUpload> {
        let path = file_path.as_ref();
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();

        self.check_extension(&file_name)?;
        if !path.exists() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }
        let size = tokio::fs::metadata(path).await?.len();
        self.check_size(size)?;

        let bytes = tokio::fs::read(path).await?;
        self.inspect_bytes(&file_name, bytes)
    }

    /// 检查内存中的压缩包
    pub fn inspect_bytes(&self, file_name: &str, bytes: Vec<u8>) -> ImportResult<ZipUpload> {
        self.check_extension(file_name)?;
        let archive_size = bytes.len() as u64;
        self.check_size(archive_size)?;

        let (spreadsheet_entry, table, image_index) = {
            let mut archive = ZipArchive::new(Cursor::new(bytes.as_slice()))?;
            let names: Vec<String> = archive.file_names().map(str::to_string).collect();
            debug!(entries = names.len(), "压缩包条目读取完成");

            let entry_name = self.find_spreadsheet(&names).ok_or_else(|| {
                ImportError::ArchiveEntryMissing(format!(
                    "{}.xlsx / {}.xls / {}.csv",
                    self.spreadsheet_stem, self.spreadsheet_stem, self.spreadsheet_stem
                ))
            })?;

            let content = read_entry(&mut archive, &entry_name, self.max_bytes)?;
            let table = self.parser.parse_named_bytes(&entry_name, &content)?;
            (entry_name, table, build_image_index(&names))
        };

        self.spreadsheet.check_structure(&table)?;

        let (preview, row_errors) = self.preview_rows(&table);
        let image_matches = self.match_images(&table, &image_index);

        let manifest = ZipManifest {
            archive_name: file_name.to_string(),
            archive_size,
            spreadsheet_entry,
            image_index,
            row_count: table.rows.len(),
            preview,
            image_matches,
            row_errors,
        };

        if !manifest.row_errors.is_empty() {
            warn!(errors = manifest.row_errors.len(), "表格存在错误行，将由后端逐行处理");
        }
        info!(
            archive = %file_name,
            size = archive_size,
            rows = manifest.row_count,
            images = manifest.image_index.len(),
            missing_images = manifest.missing_images(),
            "压缩包检查通过"
        );

        Ok(ZipUpload {
            file_name: file_name.to_string(),
            bytes,
            manifest,
        })
    }

    fn check_extension(&self, file_name: &str) -> ImportResult<()> {
        let ext = extension_of(file_name);
        if ext != "zip" {
            return Err(ImportError::UnsupportedArchive(ext));
        }
        Ok(())
    }

    fn check_size(&self, size: u64) -> ImportResult<()> {
        if size > self.max_bytes {
            return Err(ImportError::ArchiveTooLarge {
                size,
                limit: self.max_bytes,
            });
        }
        Ok(())
    }

    /// 查找表格条目: 根目录优先，其次一级目录；忽略 __MACOSX
    fn find_spreadsheet(&self, names: &[String]) -> Option<String> {
        names
            .iter()
            .filter(|name| !name.ends_with('/') && !name.starts_with("__MACOSX/"))
            .filter_map(|name| {
                let parts: Vec<&str> = name.split('/').collect();
                if parts.len() > 2 {
                    return None;
                }
                let file = Path::new(parts[parts.len() - 1]);
                let stem = file.file_stem().and_then(|s| s.to_str())?;
                let ext = extension_of(parts[parts.len() - 1]);
                (stem == self.spreadsheet_stem && SPREADSHEET_EXTENSIONS.contains(&ext.as_str()))
                    .then(|| (parts.len(), name.clone()))
            })
            .min_by_key(|(depth, _)| *depth)
            .map(|(_, name)| name)
    }

    /// 预览前 N 条有效记录，同时收集行级错误（仅提示）
    fn preview_rows(&self, table: &SheetTable) -> (Vec<ProductRecord>, Vec<ValidationError>) {
        let pipeline = self.spreadsheet.pipeline();
        let mut preview = Vec::new();
        let mut errors = Vec::new();

        for row in self.spreadsheet.to_raw_rows(table) {
            match pipeline.check_row(&row) {
                Ok(record) if preview.len() < self.preview_limit => preview.push(record),
                Ok(_) => {}
                Err(mut row_errors) => errors.append(&mut row_errors),
            }
        }
        (preview, errors)
    }

    /// 图片匹配: 优先使用图片列，否则按编码匹配文件名（区分大小写）
    fn match_images(
        &self,
        table: &SheetTable,
        image_index: &BTreeMap<String, String>,
    ) -> Vec<ImageMatch> {
        table
            .rows
            .iter()
            .map(|row| {
                let code = self.mapper.get_string(row, &FIELD_CODE).unwrap_or_default();
                let expected_stem = match self.mapper.get_string(row, &FIELD_IMAGE) {
                    Some(image) => file_stem(&image).to_string(),
                    None => code.clone(),
                };
                let entry = image_index.get(&expected_stem).cloned();
                ImageMatch {
                    row_number: row.row_number,
                    code,
                    expected_stem,
                    entry,
                }
            })
            .collect()
    }
}

impl Default for ZipAdapter {
    fn default() -> Self {
        Self::new(DEFAULT_ZIP_MAX_BYTES, DEFAULT_SPREADSHEET_STEM, 5)
    }
}

/// 读取条目内容，解压后大小不得超过 limit
///
/// 条目头中声明的大小不可信，只用于提前拒绝；实际读取最多 limit + 1 字节
fn read_entry<R: Read + std::io::Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
    limit: u64,
) -> ImportResult<Vec<u8>> {
    let mut entry = archive.by_name(name)?;
    if entry.size() > limit {
        return Err(ImportError::ArchiveTooLarge {
            size: entry.size(),
            limit,
        });
    }

    let mut buf = Vec::new();
    (&mut entry)
        .take(limit.saturating_add(1))
        .read_to_end(&mut buf)
        .map_err(|e| ImportError::ArchiveReadError(format!("{}: {}", name, e)))?;
    if buf.len() as u64 > limit {
        return Err(ImportError::ArchiveTooLarge {
            size: buf.len() as u64,
            limit,
        });
    }
    Ok(buf)
}

/// 图片索引: 位于 imagenes/ 或 images/ 目录下的文件
fn build_image_index(names: &[String]) -> BTreeMap<String, String> {
    let mut index = BTreeMap::new();
    for name in names {
        if name.ends_with('/') || name.starts_with("__MACOSX/") {
            continue;
        }
        let parts: Vec<&str> = name.split('/').collect();
        if parts.len() < 2 {
            continue;
        }
        let parent = parts[parts.len() - 2];
        let file = parts[parts.len() - 1];
        if !IMAGE_DIRS.contains(&parent) || file.starts_with('.') {
            continue;
        }
        // 同名不同扩展名时保留第一个
        index
            .entry(file_stem(file).to_string())
            .or_insert_with(|| name.clone());
    }
    index
}

fn file_stem(file_name: &str) -> &str {
    Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;
    use zip::{CompressionMethod, ZipWriter};

    const SHEET: &str = "codigo,nombre,categoria,precio,detalles\n\
                         7501,Agua,Bebidas,12.5,600ml\n\
                         7502,Jugo,Bebidas,0,1L\n";

    fn build_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        for (name, content) in entries {
            writer.start_file(*name, options).unwrap();
            writer.write_all(content).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_inspect_valid_archive() {
        let bytes = build_zip(&[
            ("productos.csv", SHEET.as_bytes()),
            ("imagenes/7501.jpg", &b"jpg"[..]),
        ]);

        let upload = ZipAdapter::default().inspect_bytes("lote.zip", bytes).unwrap();
        let manifest = &upload.manifest;

        assert_eq!(manifest.spreadsheet_entry, "productos.csv");
        assert_eq!(manifest.row_count, 2);
        assert_eq!(manifest.preview.len(), 1);
        // 行级错误仅提示
        assert_eq!(manifest.row_errors.len(), 1);
        assert_eq!(manifest.row_errors[0].row_number, 3);
        assert_eq!(manifest.image_matches[0].entry.as_deref(), Some("imagenes/7501.jpg"));
        assert_eq!(manifest.missing_images(), 1);
    }

    #[test]
    fn test_spreadsheet_in_top_level_folder() {
        let bytes = build_zip(&[
            ("lote/productos.csv", SHEET.as_bytes()),
            ("lote/images/7502.png", &b"png"[..]),
        ]);

        let upload = ZipAdapter::default().inspect_bytes("lote.zip", bytes).unwrap();
        assert_eq!(upload.manifest.spreadsheet_entry, "lote/productos.csv");
        assert_eq!(
            upload.manifest.image_index.get("7502").map(String::as_str),
            Some("lote/images/7502.png")
        );
    }

    #[test]
    fn test_missing_spreadsheet_entry() {
        let bytes = build_zip(&[("otros.csv", SHEET.as_bytes())]);
        let result = ZipAdapter::default().inspect_bytes("lote.zip", bytes);
        assert!(matches!(result, Err(ImportError::ArchiveEntryMissing(_))));
    }

    #[test]
    fn test_oversize_rejected_before_reading() {
        let adapter = ZipAdapter::new(10, DEFAULT_SPREADSHEET_STEM, 5);
        // 非法内容也不会被解析
        let result = adapter.inspect_bytes("lote.zip", vec![0u8; 11]);
        assert!(matches!(
            result,
            Err(ImportError::ArchiveTooLarge { size: 11, limit: 10 })
        ));
    }

    #[test]
    fn test_inflated_entry_rejected() {
        // 压缩后很小，解压后远超上限
        let sheet = format!(
            "codigo,nombre,categoria,precio,detalles\n{}",
            "7501,Agua,Bebidas,12.5,600ml\n".repeat(8_000)
        );
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options =
            SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        writer.start_file("productos.csv", options).unwrap();
        writer.write_all(sheet.as_bytes()).unwrap();
        let bytes = writer.finish().unwrap().into_inner();
        assert!(bytes.len() < 16 * 1024);

        let adapter = ZipAdapter::new(16 * 1024, DEFAULT_SPREADSHEET_STEM, 5);
        let result = adapter.inspect_bytes("lote.zip", bytes);

        assert!(matches!(
            result,
            Err(ImportError::ArchiveTooLarge { size, limit: 16384 }) if size == sheet.len() as u64
        ));
    }

    #[test]
    fn test_declared_entry_size_checked_before_allocation() {
        let mut bytes = build_zip(&[("productos.csv", SHEET.as_bytes())]);

        // 改写中央目录中的解压后大小
        let central = bytes
            .windows(4)
            .rposition(|w| w == [0x50, 0x4b, 0x01, 0x02])
            .unwrap();
        bytes[central + 24..central + 28].copy_from_slice(&0x7FFF_FFFFu32.to_le_bytes());

        let result = ZipAdapter::default().inspect_bytes("lote.zip", bytes);

        assert!(matches!(
            result,
            Err(ImportError::ArchiveTooLarge { size: 0x7FFF_FFFF, limit: DEFAULT_ZIP_MAX_BYTES })
        ));
    }

    #[test]
    fn test_read_entry_stops_at_limit() {
        let bytes = build_zip(&[("productos.csv", SHEET.as_bytes())]);
        let mut archive = ZipArchive::new(Cursor::new(bytes.as_slice())).unwrap();

        let content = read_entry(&mut archive, "productos.csv", SHEET.len() as u64).unwrap();
        assert_eq!(content, SHEET.as_bytes());

        let result = read_entry(&mut archive, "productos.csv", 16);
        assert!(matches!(result, Err(ImportError::ArchiveTooLarge { limit: 16, .. })));
    }

    #[test]
    fn test_wrong_extension_rejected() {
        let result = ZipAdapter::default().inspect_bytes("lote.rar", Vec::new());
        assert!(matches!(result, Err(ImportError::UnsupportedArchive(ext)) if ext == "rar"));
    }

    #[test]
    fn test_corrupt_archive_is_read_error() {
        let result = ZipAdapter::default().inspect_bytes("lote.zip", b"not a zip".to_vec());
        assert!(matches!(result, Err(ImportError::ArchiveReadError(_))));
    }

    #[test]
    fn test_missing_header_inside_archive() {
        let bytes = build_zip(&[("productos.csv", b"codigo,nombre\n1,A\n" as &[u8])]);
        let result = ZipAdapter::default().inspect_bytes("lote.zip", bytes);
        assert!(matches!(result, Err(ImportError::MissingColumns(_))));
    }

    #[test]
    fn test_image_match_is_case_sensitive() {
        let bytes = build_zip(&[
            ("productos.csv", b"codigo,nombre,categoria,precio,detalles\nab1,A,C,1,d\n" as &[u8]),
            ("imagenes/AB1.jpg", &b"jpg"[..]),
        ]);
        let upload = ZipAdapter::default().inspect_bytes("lote.zip", bytes).unwrap();
        assert_eq!(upload.manifest.image_matches[0].entry, None);
    }

    #[test]
    fn test_image_column_overrides_code() {
        let bytes = build_zip(&[
            (
                "productos.csv",
                b"codigo,nombre,categoria,precio,detalles,imagen\n1,A,C,1,d,foto-agua.jpg\n" as &[u8],
            ),
            ("imagenes/foto-agua.webp", &b"webp"[..]),
        ]);
        let upload = ZipAdapter::default().inspect_bytes("lote.zip", bytes).unwrap();
        let matched = &upload.manifest.image_matches[0];
        assert_eq!(matched.expected_stem, "foto-agua");
        assert_eq!(matched.entry.as_deref(), Some("imagenes/foto-agua.webp"));
    }
}
