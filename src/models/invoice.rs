use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 记录来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Source {
    /// 账簿 (采购台账)
    Books,
    /// GST 门户 (GSTR-2B)
    Portal,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Books => write!(f, "BOOKS"),
            Self::Portal => write!(f, "PORTAL"),
        }
    }
}

/// 发票行 (账簿或门户任一侧)
///
/// 导入/拉取批次内创建一次，之后不可变；匹配只产生新的派生实体。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceRecord {
    pub supplier_id: String,       // GSTIN 或登记名称
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supplier_name: Option<String>,
    pub invoice_number: String,    // 原始发票号，仅展示用
    pub invoice_date: NaiveDate,
    pub taxable_value: BigDecimal, // 应税金额
    pub tax_amount: BigDecimal,    // 税额 (IGST + CGST + SGST + Cess)
    pub source: Source,
}

impl InvoiceRecord {
    /// 按比较口径取金额
    pub fn value(&self, basis: ValueBasis) -> BigDecimal {
        match basis {
            ValueBasis::TaxableValue => self.taxable_value.clone(),
            ValueBasis::TaxAmount => self.tax_amount.clone(),
            ValueBasis::InvoiceValue => &self.taxable_value + &self.tax_amount,
        }
    }

    /// 展示用供应商名称，缺省时回落到 GSTIN
    pub fn display_name(&self) -> &str {
        self.supplier_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(&self.supplier_id)
    }
}

/// 比较口径
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueBasis {
    #[default]
    TaxableValue,
    TaxAmount,
    InvoiceValue,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn record(name: Option<&str>) -> InvoiceRecord {
        InvoiceRecord {
            supplier_id: "27AAAAA0000A1Z5".into(),
            supplier_name: name.map(str::to_string),
            invoice_number: "INV-01".into(),
            invoice_date: NaiveDate::from_ymd_opt(2024, 4, 5).unwrap(),
            taxable_value: BigDecimal::from_str("10000.00").unwrap(),
            tax_amount: BigDecimal::from_str("1800.00").unwrap(),
            source: Source::Books,
        }
    }

    #[test]
    fn value_by_basis() {
        let r = record(None);
        assert_eq!(r.value(ValueBasis::TaxableValue), BigDecimal::from(10000));
        assert_eq!(r.value(ValueBasis::TaxAmount), BigDecimal::from(1800));
        assert_eq!(r.value(ValueBasis::InvoiceValue), BigDecimal::from(11800));
    }

    #[test]
    fn display_name_falls_back_to_gstin() {
        assert_eq!(record(None).display_name(), "27AAAAA0000A1Z5");
        assert_eq!(record(Some("  ")).display_name(), "27AAAAA0000A1Z5");
        assert_eq!(record(Some("Acme Traders")).display_name(), "Acme Traders");
    }

    #[test]
    fn source_serializes_upper_case() {
        assert_eq!(serde_json::to_string(&Source::Portal).unwrap(), "\"PORTAL\"");
        let parsed: Source = serde_json::from_str("\"BOOKS\"").unwrap();
        assert_eq!(parsed, Source::Books);
    }
}
