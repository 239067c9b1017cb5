use bigdecimal::{BigDecimal, Zero};
use std::collections::BTreeMap;

use crate::models::{ReconciliationPair, Status, StatusCounts, Summary, SupplierSummary};

/// 汇总结果行：状态计数、净差额、供应商下钻
pub fn summarize(pairs: &[ReconciliationPair]) -> Summary {
    let mut counts = StatusCounts::default();
    let mut net_difference = BigDecimal::zero();
    let mut absolute_difference = BigDecimal::zero();
    let mut total_books_value = BigDecimal::zero();
    let mut total_portal_value = BigDecimal::zero();
    let mut suppliers: BTreeMap<String, SupplierSummary> = BTreeMap::new();

    for pair in pairs {
        counts.record(pair.status());
        net_difference += pair.difference();
        absolute_difference += pair.difference().abs();
        if let Some(v) = pair.books_value() {
            total_books_value += v;
        }
        if let Some(v) = pair.portal_value() {
            total_portal_value += v;
        }

        let entry = suppliers
            .entry(pair.key().supplier.clone())
            .or_insert_with(|| SupplierSummary {
                supplier_name: None,
                counts: StatusCounts::default(),
                net_difference: BigDecimal::zero(),
            });
        if entry.supplier_name.is_none() {
            entry.supplier_name = pair.supplier_name().map(str::to_string);
        }
        entry.counts.record(pair.status());
        entry.net_difference += pair.difference();
    }

    let total_pairs = pairs.len();
    let summary = Summary {
        match_percentage: percentage(counts.get(Status::Matched), total_pairs),
        counts,
        total_pairs,
        net_difference,
        absolute_difference,
        total_books_value,
        total_portal_value,
        suppliers,
    };

    if !summary.is_consistent() {
        tracing::error!(
            "supplier nets {} do not add up to total net difference {}",
            summary.supplier_net_total(),
            summary.net_difference
        );
    }
    summary
}

/// 四舍五入的整数百分比，空集为 0
fn percentage(part: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((part * 200 + total) / (total * 2)) as u32
}
