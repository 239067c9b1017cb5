use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use crate::error::{ReconError, ValidationError};
use crate::models::{InvoiceRecord, RejectedRecord, Source};

/// 模板列名 (采购台账 / GSTR-2B 导出通用)
pub const COL_GSTIN: &str = "GSTIN/UIN";
pub const COL_SUPPLIER: &str = "Supplier";
pub const COL_INVOICE: &str = "Invoice";
pub const COL_DATE: &str = "Date";
pub const COL_TAXABLE: &str = "Taxable";
pub const TAX_COLUMNS: [&str; 4] = ["IGST", "CGST", "SGST", "Cess"];

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%d-%m-%Y", "%d/%m/%Y", "%d.%m.%Y"];

/// 导入结果：成功解析的记录 + 被拒绝的行
#[derive(Debug, Default)]
pub struct ImportOutcome {
    pub records: Vec<InvoiceRecord>,
    pub rejected: Vec<RejectedRecord>,
}

struct ColumnMap {
    gstin: usize,
    supplier: Option<usize>,
    invoice: usize,
    date: usize,
    taxable: usize,
    taxes: Vec<(&'static str, usize)>,
}

impl ColumnMap {
    fn from_headers(headers: &StringRecord) -> Result<Self, ReconError> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };
        let required = |name: &str| find(name).ok_or_else(|| ReconError::MissingColumn(name.to_string()));

        Ok(Self {
            gstin: required(COL_GSTIN)?,
            supplier: find(COL_SUPPLIER),
            invoice: required(COL_INVOICE)?,
            date: required(COL_DATE)?,
            taxable: required(COL_TAXABLE)?,
            taxes: TAX_COLUMNS
                .iter()
                .filter_map(|&name| find(name).map(|idx| (name, idx)))
                .collect(),
        })
    }
}

/// 从 CSV 读取发票记录
///
/// 缺少必需列整体失败；单行编码、日期或金额解析失败只拒绝该行。
pub fn read_records<R: Read>(reader: R, source: Source) -> Result<ImportOutcome, ReconError> {
    let mut rdr = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(reader);

    let columns = ColumnMap::from_headers(rdr.headers()?)?;
    let mut outcome = ImportOutcome::default();

    for row in rdr.records() {
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                if let csv::ErrorKind::Utf8 { pos, err } = e.kind() {
                    let line = pos.as_ref().map(|p| p.line()).unwrap_or_default();
                    tracing::debug!("{} line {} rejected: {}", source, line, err);
                    outcome.rejected.push(RejectedRecord::from_line(
                        source,
                        line,
                        ValidationError::Encoding(err.to_string()),
                    ));
                    continue;
                }
                return Err(e.into());
            }
        };
        if row.iter().all(|field| field.is_empty()) {
            continue;
        }
        let line = row.position().map(|p| p.line()).unwrap_or_default();

        match parse_row(&row, &columns, source) {
            Ok(record) => outcome.records.push(record),
            Err(e) => {
                tracing::debug!("{} line {} rejected: {}", source, line, e);
                outcome.rejected.push(RejectedRecord::from_line(source, line, e));
            }
        }
    }

    tracing::info!(
        "导入 {} 记录 {} 条, 拒绝 {} 条",
        source,
        outcome.records.len(),
        outcome.rejected.len()
    );
    Ok(outcome)
}

pub fn read_records_from_path(path: &Path, source: Source) -> Result<ImportOutcome, ReconError> {
    let file = std::fs::File::open(path)?;
    read_records(file, source)
}

fn parse_row(row: &StringRecord, columns: &ColumnMap, source: Source) -> Result<InvoiceRecord, ValidationError> {
    let field = |idx: usize| row.get(idx).unwrap_or("");

    let invoice_date = parse_date(field(columns.date))?;
    let taxable_value = parse_amount(COL_TAXABLE, field(columns.taxable))?;

    let mut tax_amount = BigDecimal::zero();
    for &(name, idx) in &columns.taxes {
        let raw = field(idx);
        if !raw.is_empty() {
            tax_amount += parse_amount(name, raw)?;
        }
    }

    Ok(InvoiceRecord {
        supplier_id: field(columns.gstin).to_string(),
        supplier_name: columns
            .supplier
            .map(field)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
        invoice_number: field(columns.invoice).to_string(),
        invoice_date,
        taxable_value,
        tax_amount,
        source,
    })
}

/// 解析日期，带时间的值截断到日
pub fn parse_date(raw: &str) -> Result<NaiveDate, ValidationError> {
    let raw = raw.trim();
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, fmt) {
            return Ok(date);
        }
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.date_naive());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Ok(ts.date());
        }
    }
    Err(ValidationError::InvalidDate(raw.to_string()))
}

/// 解析金额，允许千分位逗号与 ₹ 符号
pub fn parse_amount(column: &str, raw: &str) -> Result<BigDecimal, ValidationError> {
    let cleaned: String = raw
        .trim()
        .trim_start_matches('₹')
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();
    BigDecimal::from_str(&cleaned).map_err(|_| ValidationError::InvalidAmount {
        column: column.to_string(),
        value: raw.to_string(),
    })
}
