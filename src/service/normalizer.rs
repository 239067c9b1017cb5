use crate::error::ValidationError;
use crate::models::{InvoiceRecord, NormalizedKey};

/// 计算发票的归一化主键
///
/// - 供应商：去首尾空白并大写
/// - 发票号：按分隔符切段、大写，每个数字段去前导零 (全零段保留一个 0)
/// - 日期：`NaiveDate` 本身即按日截断
pub fn normalize(record: &InvoiceRecord) -> Result<NormalizedKey, ValidationError> {
    let supplier = normalize_supplier(&record.supplier_id);
    if supplier.is_empty() {
        return Err(ValidationError::EmptySupplier);
    }

    let invoice_number = normalize_invoice_number(&record.invoice_number);
    if invoice_number.is_empty() {
        return Err(ValidationError::EmptyInvoiceNumber);
    }

    Ok(NormalizedKey {
        supplier,
        invoice_number,
        invoice_date: record.invoice_date,
    })
}

pub fn normalize_supplier(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// GST 发票号只允许字母数字及 `-` `/`
///
/// 按非字母数字字符切分成段，段内每个数字段去前导零后拼接；
/// 两段相邻处都是数字时保留一个 `-`，避免 `10/1` 与 `1/01` 拼成同一个号。
pub fn normalize_invoice_number(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());

    for token in raw
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| !t.is_empty())
    {
        let token = strip_leading_zeros(token);
        let digits_meet = out.ends_with(|c: char| c.is_ascii_digit())
            && token.starts_with(|c: char| c.is_ascii_digit());
        if digits_meet {
            out.push('-');
        }
        out.push_str(&token);
    }

    out
}

/// 大写，并去掉段内每个数字段的前导零 (全零段保留一个 0)
fn strip_leading_zeros(token: &str) -> String {
    let mut out = String::with_capacity(token.len());
    let mut in_digits = false;
    let mut leading_zeros = false; // 当前数字段尚未出现非零数字

    for ch in token.chars() {
        if ch.is_ascii_digit() {
            if !in_digits {
                in_digits = true;
                leading_zeros = true;
            }
            if leading_zeros {
                if ch == '0' {
                    continue;
                }
                leading_zeros = false;
            }
            out.push(ch);
        } else {
            if in_digits && leading_zeros {
                out.push('0');
            }
            in_digits = false;
            leading_zeros = false;
            out.push(ch.to_ascii_uppercase());
        }
    }
    if in_digits && leading_zeros {
        out.push('0');
    }

    out
}
