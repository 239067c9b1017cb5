use indexmap::map::Entry;
use indexmap::IndexMap;

use crate::models::{
    DuplicateKeyWarning, InvoiceRecord, NormalizedKey, PairCandidate, RejectedRecord, Source,
};
use crate::service::normalizer::normalize;

/// 匹配输出：候选对 + 重复 / 剔除诊断
#[derive(Debug, Default)]
pub struct MatchOutput {
    pub candidates: Vec<PairCandidate>,
    pub duplicates: Vec<DuplicateKeyWarning>,
    pub rejected: Vec<RejectedRecord>,
}

/// 按归一化主键配对账簿与门户记录
///
/// 每个出现过的主键恰好产出一个候选对；同源重复主键保留首条，其余进入 `duplicates`，
/// 不做金额合并。输出按 (供应商, 发票号, 日期) 排序。
pub fn match_records(books: &[InvoiceRecord], portal: &[InvoiceRecord]) -> MatchOutput {
    let mut duplicates = Vec::new();
    let mut rejected = Vec::new();

    let books_index = index_records(Source::Books, books, &mut duplicates, &mut rejected);
    let mut portal_index = index_records(Source::Portal, portal, &mut duplicates, &mut rejected);

    let mut candidates = Vec::with_capacity(books_index.len() + portal_index.len());

    for (key, books_record) in books_index {
        let candidate = match portal_index.swap_remove(&key) {
            Some(portal_record) => PairCandidate::Both {
                key,
                books: books_record.clone(),
                portal: portal_record.clone(),
            },
            None => PairCandidate::BooksOnly {
                key,
                books: books_record.clone(),
            },
        };
        candidates.push(candidate);
    }

    // 剩余的都是账簿中没有的
    for (key, portal_record) in portal_index {
        candidates.push(PairCandidate::PortalOnly {
            key,
            portal: portal_record.clone(),
        });
    }

    candidates.sort_by(|a, b| a.key().cmp(b.key()));

    MatchOutput {
        candidates,
        duplicates,
        rejected,
    }
}

fn index_records<'a>(
    source: Source,
    records: &'a [InvoiceRecord],
    duplicates: &mut Vec<DuplicateKeyWarning>,
    rejected: &mut Vec<RejectedRecord>,
) -> IndexMap<NormalizedKey, &'a InvoiceRecord> {
    let mut index: IndexMap<NormalizedKey, &InvoiceRecord> = IndexMap::with_capacity(records.len());

    for record in records {
        let key = match normalize(record) {
            Ok(key) => key,
            Err(e) => {
                tracing::debug!("{} record '{}' rejected: {}", source, record.invoice_number, e);
                rejected.push(RejectedRecord::from_record(record.clone(), e));
                continue;
            }
        };

        match index.entry(key) {
            Entry::Occupied(first) => {
                tracing::debug!("{} duplicate key {}, keeping first occurrence", source, first.key());
                duplicates.push(DuplicateKeyWarning {
                    source,
                    key: first.key().clone(),
                    first_invoice_number: first.get().invoice_number.clone(),
                    record: record.clone(),
                });
            }
            Entry::Vacant(slot) => {
                slot.insert(record);
            }
        }
    }

    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;
    use chrono::NaiveDate;
    use std::collections::HashSet;
    use std::str::FromStr;

    fn rec(source: Source, supplier: &str, invoice: &str, date: &str, value: &str) -> InvoiceRecord {
        InvoiceRecord {
            supplier_id: supplier.into(),
            supplier_name: None,
            invoice_number: invoice.into(),
            invoice_date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            taxable_value: BigDecimal::from_str(value).unwrap(),
            tax_amount: BigDecimal::from(0),
            source,
        }
    }

    #[test]
    fn pairs_by_key_and_reports_singletons() {
        let books = vec![
            rec(Source::Books, "GSTIN-A", "INV-01", "2024-04-05", "100"),
            rec(Source::Books, "GSTIN-A", "INV-02", "2024-04-06", "200"),
        ];
        let portal = vec![
            rec(Source::Portal, "gstin-a", "inv01", "2024-04-05", "100"),
            rec(Source::Portal, "GSTIN-B", "77", "2024-04-07", "50"),
        ];
        let out = match_records(&books, &portal);

        assert_eq!(out.candidates.len(), 3);
        assert!(out.duplicates.is_empty());
        assert!(out.rejected.is_empty());

        match &out.candidates[0] {
            PairCandidate::Both { books, portal, .. } => {
                assert_eq!(books.invoice_number, "INV-01");
                assert_eq!(portal.invoice_number, "inv01");
            }
            other => panic!("expected Both, got {other:?}"),
        }
        assert!(matches!(&out.candidates[1], PairCandidate::BooksOnly { books, .. } if books.invoice_number == "INV-02"));
        assert!(matches!(&out.candidates[2], PairCandidate::PortalOnly { portal, .. } if portal.supplier_id == "GSTIN-B"));
    }

    #[test]
    fn every_key_appears_exactly_once() {
        let books = vec![
            rec(Source::Books, "S1", "1", "2024-05-01", "10"),
            rec(Source::Books, "S2", "2", "2024-05-01", "20"),
            rec(Source::Books, "S3", "3", "2024-05-01", "30"),
        ];
        let portal = vec![
            rec(Source::Portal, "S3", "003", "2024-05-01", "30"),
            rec(Source::Portal, "S4", "4", "2024-05-01", "40"),
            rec(Source::Portal, "S1", "1", "2024-05-01", "10"),
        ];
        let out = match_records(&books, &portal);

        let keys: Vec<_> = out.candidates.iter().map(|c| c.key().clone()).collect();
        let unique: HashSet<_> = keys.iter().cloned().collect();
        assert_eq!(keys.len(), 4);
        assert_eq!(unique.len(), 4);
    }

    #[test]
    fn duplicates_keep_first_occurrence() {
        let books = vec![rec(Source::Books, "S1", "INV-9", "2024-06-01", "500")];
        let portal = vec![
            rec(Source::Portal, "S1", "INV-9", "2024-06-01", "500"),
            rec(Source::Portal, "S1", "inv 09", "2024-06-01", "700"),
        ];
        let out = match_records(&books, &portal);

        assert_eq!(out.candidates.len(), 1);
        let portal_kept = out.candidates[0].portal().unwrap();
        assert_eq!(portal_kept.taxable_value, BigDecimal::from(500));

        assert_eq!(out.duplicates.len(), 1);
        let dup = &out.duplicates[0];
        assert_eq!(dup.source, Source::Portal);
        assert_eq!(dup.first_invoice_number, "INV-9");
        assert_eq!(dup.record.invoice_number, "inv 09");
        assert_eq!(dup.record.taxable_value, BigDecimal::from(700));
    }

    #[test]
    fn slash_separated_numbers_are_distinct_invoices() {
        let books = vec![
            rec(Source::Books, "S1", "INV-10/1", "2024-06-01", "100"),
            rec(Source::Books, "S1", "INV-1/01", "2024-06-01", "200"),
        ];
        let out = match_records(&books, &[]);

        assert_eq!(out.candidates.len(), 2);
        assert!(out.duplicates.is_empty());
    }

    #[test]
    fn invalid_records_are_rejected_not_matched() {
        let books = vec![
            rec(Source::Books, "", "INV-1", "2024-06-01", "1"),
            rec(Source::Books, "S1", "INV-1", "2024-06-01", "1"),
        ];
        let portal = vec![rec(Source::Portal, "S1", "  ", "2024-06-01", "1")];
        let out = match_records(&books, &portal);

        assert_eq!(out.candidates.len(), 1);
        assert_eq!(out.rejected.len(), 2);
        assert_eq!(out.rejected[0].source, Source::Books);
        assert_eq!(out.rejected[1].source, Source::Portal);
    }

    #[test]
    fn output_sorted_by_supplier_then_invoice() {
        let books = vec![
            rec(Source::Books, "B", "2", "2024-04-01", "1"),
            rec(Source::Books, "A", "9", "2024-04-01", "1"),
            rec(Source::Books, "B", "1", "2024-04-01", "1"),
        ];
        let out = match_records(&books, &[]);
        let order: Vec<_> = out
            .candidates
            .iter()
            .map(|c| (c.key().supplier.as_str(), c.key().invoice_number.as_str()))
            .collect();
        assert_eq!(order, vec![("A", "9"), ("B", "1"), ("B", "2")]);
    }

    #[test]
    fn empty_inputs_produce_nothing() {
        let out = match_records(&[], &[]);
        assert!(out.candidates.is_empty());
        assert!(out.duplicates.is_empty());
    }
}
