// ==========================================
// 自助终端管理后台 - 商品记录校验器实现
// ==========================================
// 规则:
// - code/name/category/details 去空白后非空
// - price 为有限数且 > 0
// - promotion 不做约束
// 全部规则独立执行，一次报告该行所有违规
// ==========================================

use crate::domain::product::{ProductRecord, ValidationError};
use crate::importer::normalizer::TextFields;
use crate::importer::product_importer_trait::RecordValidator;

pub struct ProductValidator;

impl ProductValidator {
    fn check_required(
        violations: &mut Vec<ValidationError>,
        row_number: usize,
        field: &str,
        value: &str,
        message: &str,
    ) {
        if value.trim().is_empty() {
            violations.push(ValidationError::for_field(row_number, field, message));
        }
    }

    fn check_text(
        &self,
        code: &str,
        name: &str,
        category: &str,
        details: &str,
        row_number: usize,
    ) -> Vec<ValidationError> {
        let mut violations = Vec::new();
        Self::check_required(&mut violations, row_number, "code", code, "商品编码不能为空");
        Self::check_required(&mut violations, row_number, "name", name, "商品名称不能为空");
        Self::check_required(&mut violations, row_number, "category", category, "商品分类不能为空");
        Self::check_required(&mut violations, row_number, "details", details, "商品详情不能为空");
        violations
    }
}

impl RecordValidator for ProductValidator {
    fn validate(&self, record: &ProductRecord, row_number: usize) -> Vec<ValidationError> {
        let mut violations = self.check_text(
            &record.code,
            &record.name,
            &record.category,
            &record.details,
            row_number,
        );

        if !record.price.is_finite() || record.price <= 0.0 {
            violations.push(ValidationError::for_field(
                row_number,
                "price",
                format!("价格必须是大于 0 的数字（实际: {}）", record.price),
            ));
        }

        violations
    }

    fn validate_text_fields(&self, fields: &TextFields, row_number: usize) -> Vec<ValidationError> {
        self.check_text(
            &fields.code,
            &fields.name,
            &fields.category,
            &fields.details,
            row_number,
        )
    }
}

/// 便捷函数: 使用默认校验器
pub fn validate(record: &ProductRecord, row_number: usize) -> Vec<ValidationError> {
    ProductValidator.validate(record, row_number)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_record() -> ProductRecord {
        ProductRecord {
            code: "7501".to_string(),
            name: "Agua".to_string(),
            category: "Bebidas".to_string(),
            price: 12.5,
            details: "600ml".to_string(),
            promotion: String::new(),
        }
    }

    #[test]
    fn test_validate_valid_record() {
        assert!(validate(&create_test_record(), 2).is_empty());
    }

    #[test]
    fn test_validate_reports_every_violation() {
        let mut record = create_test_record();
        record.code = "  ".to_string();
        record.name = String::new();
        record.price = 0.0;

        let violations = validate(&record, 5);

        assert_eq!(violations.len(), 3);
        assert!(violations.iter().all(|v| v.row_number == 5));
        let fields: Vec<_> = violations.iter().filter_map(|v| v.field.clone()).collect();
        assert_eq!(fields, vec!["code", "name", "price"]);
    }

    #[test]
    fn test_validate_price_message_cites_value() {
        let mut record = create_test_record();
        record.price = -3.0;

        let violations = validate(&record, 2);
        assert_eq!(violations.len(), 1);
        assert!(violations[0].message.contains("-3"));
    }

    #[test]
    fn test_validate_rejects_infinite_price() {
        let mut record = create_test_record();
        record.price = f64::INFINITY;
        assert_eq!(validate(&record, 2).len(), 1);
    }

    #[test]
    fn test_validate_promotion_is_unconstrained() {
        let mut record = create_test_record();
        record.promotion = "  2x1 ".to_string();
        assert!(validate(&record, 2).is_empty());
        record.promotion = "15".to_string();
        assert!(validate(&record, 2).is_empty());
    }

    #[test]
    fn test_validate_empty_iff_fields_present_and_price_positive() {
        let prices = [-1.0, 0.0, 0.01, 1.0, f64::INFINITY, f64::NAN];
        let texts = ["", " ", "x"];

        for price in prices {
            for text in texts {
                let record = ProductRecord {
                    code: text.to_string(),
                    name: "n".to_string(),
                    category: "c".to_string(),
                    price,
                    details: "d".to_string(),
                    promotion: String::new(),
                };
                let expected_valid = !text.trim().is_empty() && price.is_finite() && price > 0.0;
                assert_eq!(validate(&record, 1).is_empty(), expected_valid);
            }
        }
    }

    #[test]
    fn test_validate_text_fields_only() {
        let fields = TextFields {
            code: "1".to_string(),
            name: String::new(),
            category: "c".to_string(),
            details: String::new(),
            promotion: String::new(),
        };
        let violations = ProductValidator.validate_text_fields(&fields, 3);
        assert_eq!(violations.len(), 2);
    }
}
