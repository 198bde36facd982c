// ==========================================
// 自助终端管理后台 - 字段映射器实现
// ==========================================
// 职责: 源字段名 → 标准字段（支持别名）
// 后端模板使用西语列名，外部 API 可能使用英文字段名
// ==========================================

use crate::importer::file_parser::SheetRow;
use serde_json::{Map, Value};

/// 标准字段定义
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub canonical: &'static str,
    pub aliases: &'static [&'static str],
    pub required: bool,
}

pub const FIELD_CODE: FieldSpec = FieldSpec {
    canonical: "code",
    aliases: &["codigo", "code", "código"],
    required: true,
};

pub const FIELD_NAME: FieldSpec = FieldSpec {
    canonical: "name",
    aliases: &["nombre", "name"],
    required: true,
};

pub const FIELD_CATEGORY: FieldSpec = FieldSpec {
    canonical: "category",
    aliases: &["categoria", "category", "categoría"],
    required: true,
};

pub const FIELD_PRICE: FieldSpec = FieldSpec {
    canonical: "price",
    aliases: &["precio", "price"],
    required: true,
};

pub const FIELD_DETAILS: FieldSpec = FieldSpec {
    canonical: "details",
    aliases: &["detalles", "details"],
    required: true,
};

pub const FIELD_PROMOTION: FieldSpec = FieldSpec {
    canonical: "promotion",
    aliases: &["promocion", "promotion", "promoción"],
    required: false,
};

/// ZIP 导入时可选的图片文件名列
pub const FIELD_IMAGE: FieldSpec = FieldSpec {
    canonical: "image",
    aliases: &["imagen", "image"],
    required: false,
};

/// 商品记录的全部字段（模板列顺序）
pub const PRODUCT_FIELDS: [FieldSpec; 6] = [
    FIELD_CODE,
    FIELD_NAME,
    FIELD_CATEGORY,
    FIELD_PRICE,
    FIELD_DETAILS,
    FIELD_PROMOTION,
];

pub struct FieldMapper;

impl FieldMapper {
    /// 检查必填表头，返回缺失的标准字段名
    pub fn missing_required_headers(&self, headers: &[String]) -> Vec<String> {
        PRODUCT_FIELDS
            .iter()
            .filter(|spec| spec.required)
            .filter(|spec| !spec.aliases.iter().any(|a| headers.iter().any(|h| h == a)))
            .map(|spec| spec.canonical.to_string())
            .collect()
    }

    /// 表头中是否存在指定字段（任一别名）
    pub fn has_header(&self, headers: &[String], spec: &FieldSpec) -> bool {
        spec.aliases.iter().any(|a| headers.iter().any(|h| h == a))
    }

    /// 表格行 → JSON 对象（所有值为字符串），供标准化器统一处理
    pub fn row_to_json(&self, row: &SheetRow) -> Value {
        let map: Map<String, Value> = row
            .cells
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        Value::Object(map)
    }

    /// 按别名顺序查找字段，第一个存在的键生效
    pub fn lookup<'a>(&self, object: &'a Map<String, Value>, spec: &FieldSpec) -> Option<&'a Value> {
        spec.aliases.iter().find_map(|alias| object.get(*alias))
    }

    /// 提取表格行中的文本字段（去空白，空值返回 None）
    pub fn get_string(&self, row: &SheetRow, spec: &FieldSpec) -> Option<String> {
        for alias in spec.aliases {
            if let Some(v) = row.cells.get(*alias) {
                let trimmed = v.trim();
                if !trimmed.is_empty() {
                    return Some(trimmed.to_string());
                }
            }
        }
        None
    }
}
