use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

/// 归一化后的发票主键
///
/// 字段顺序即排序顺序：供应商、发票号、开票日期。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NormalizedKey {
    pub supplier: String,
    pub invoice_number: String,
    pub invoice_date: NaiveDate,
}

impl fmt::Display for NormalizedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.supplier, self.invoice_number, self.invoice_date)
    }
}
