use bigdecimal::BigDecimal;
use csv::Writer;
use std::io::Write;
use std::path::Path;

use crate::error::ReconError;
use crate::models::ReconciliationPair;

pub const EXPORT_HEADERS: [&str; 8] = [
    "Supplier",
    "Supplier Name",
    "Invoice No",
    "Date",
    "Books Value",
    "Portal Value",
    "Difference",
    "Status",
];

/// 将 Option<BigDecimal> 转换为 CSV 字符串
fn option_to_csv(val: Option<&BigDecimal>) -> String {
    val.map(|v| v.to_string()).unwrap_or_default()
}

/// 写出对账结果行，每行一个结果对
pub fn write_csv<'a, W, I>(pairs: I, writer: W) -> Result<(), ReconError>
where
    W: Write,
    I: IntoIterator<Item = &'a ReconciliationPair>,
{
    let mut writer = Writer::from_writer(writer);
    writer.write_record(EXPORT_HEADERS)?;

    for pair in pairs {
        let record = pair.primary_record();
        writer.write_record([
            record.supplier_id.clone(),
            pair.supplier_name().unwrap_or_default().to_string(),
            record.invoice_number.clone(),
            record.invoice_date.format("%Y-%m-%d").to_string(),
            option_to_csv(pair.books_value()),
            option_to_csv(pair.portal_value()),
            pair.difference().to_string(),
            pair.status().to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

pub fn to_csv_string<'a, I>(pairs: I) -> Result<String, ReconError>
where
    I: IntoIterator<Item = &'a ReconciliationPair>,
{
    let mut buf = Vec::new();
    write_csv(pairs, &mut buf)?;
    String::from_utf8(buf).map_err(|e| ReconError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}

/// 导出对账结果到 CSV 文件
pub fn export_to_csv<'a, I>(pairs: I, output_path: &Path) -> Result<(), ReconError>
where
    I: IntoIterator<Item = &'a ReconciliationPair>,
{
    let file = std::fs::File::create(output_path)?;
    write_csv(pairs, file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{InvoiceRecord, Source};
    use crate::service::{reconcile, ReconOptions};
    use chrono::NaiveDate;
    use std::str::FromStr;

    fn rec(source: Source, invoice: &str, value: &str) -> InvoiceRecord {
        InvoiceRecord {
            supplier_id: "27AAAAA0000A1Z5".into(),
            supplier_name: Some("Acme Traders".into()),
            invoice_number: invoice.into(),
            invoice_date: NaiveDate::from_ymd_opt(2024, 4, 5).unwrap(),
            taxable_value: BigDecimal::from_str(value).unwrap(),
            tax_amount: BigDecimal::from(0),
            source,
        }
    }

    #[test]
    fn writes_one_row_per_pair() {
        let books = vec![rec(Source::Books, "INV-01", "10000.00"), rec(Source::Books, "INV-02", "250.00")];
        let portal = vec![rec(Source::Portal, "INV-01", "10005.00")];
        let report = reconcile(&books, &portal, &ReconOptions::default()).unwrap();

        let csv = to_csv_string(&report.result.pairs).unwrap();
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "Supplier,Supplier Name,Invoice No,Date,Books Value,Portal Value,Difference,Status");
        assert_eq!(lines[1], "27AAAAA0000A1Z5,Acme Traders,INV-01,2024-04-05,10000.00,10005.00,-5.00,UNMATCHED");
        assert_eq!(lines[2], "27AAAAA0000A1Z5,Acme Traders,INV-02,2024-04-05,250.00,,250.00,MISSING_IN_PORTAL");
    }

    #[test]
    fn exports_to_file() {
        let books = vec![rec(Source::Books, "INV-01", "1.00")];
        let report = reconcile(&books, &[], &ReconOptions::default()).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reco.csv");
        export_to_csv(&report.result.pairs, &path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.ends_with("INV-01,2024-04-05,1.00,,1.00,MISSING_IN_PORTAL\n"));
    }
}
