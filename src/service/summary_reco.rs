use bigdecimal::{BigDecimal, Zero};
use std::collections::BTreeMap;

use crate::error::ReconError;
use crate::models::{
    BlockStatus, ComparisonBlock, ComparisonKind, ComparisonRow, FilingPeriod, MonthFigures,
    PeriodComparison,
};
use crate::service::classifier::Tolerance;

/// 申报表月度汇总对比 (GSTR-1 / GSTR-3B / GSTR-2B / 账簿)
///
/// 每个科目差额 = 左 - 右，|差额| <= 容差视为一致；月内全部一致为 MATCHED，
/// 没有科目为 NO_DATA。给定期间时，期间外的月份只记录在 `out_of_period`。
pub fn compare_periods(
    kind: ComparisonKind,
    months: &[MonthFigures],
    tolerance: &Tolerance,
    period: Option<FilingPeriod>,
) -> Result<PeriodComparison, ReconError> {
    if let Some(period) = &period {
        period.validate()?;
    }

    let mut by_month: BTreeMap<(i32, u32), &MonthFigures> = BTreeMap::new();
    for figures in months {
        let month = FilingPeriod::Month {
            year: figures.year,
            month: figures.month,
        };
        month.validate()?;
        if by_month.insert((figures.year, figures.month), figures).is_some() {
            return Err(ReconError::configuration(format!(
                "{} is listed more than once",
                month.label()
            )));
        }
    }

    let mut blocks = Vec::with_capacity(by_month.len());
    let mut out_of_period = Vec::new();
    for ((year, month), figures) in by_month {
        let month_period = FilingPeriod::Month { year, month };
        if let Some(period) = &period {
            let (first_day, _) = month_period.bounds()?;
            if !period.contains(first_day) {
                out_of_period.push(month_period.label());
                continue;
            }
        }
        blocks.push(compare_month(month_period, figures, tolerance));
    }

    let status = overall_status(&blocks);
    let (left, right) = kind.sides();
    tracing::info!(
        "[{} vs {}] {} 个月对比完成, 状态 {:?}",
        left,
        right,
        blocks.len(),
        status
    );

    Ok(PeriodComparison {
        kind,
        left_label: left.to_string(),
        right_label: right.to_string(),
        tolerance: tolerance.amount().clone(),
        period: period.map(|p| p.label()),
        blocks,
        out_of_period,
        status,
    })
}

fn compare_month(period: FilingPeriod, figures: &MonthFigures, tolerance: &Tolerance) -> ComparisonBlock {
    let mut net_difference = BigDecimal::zero();
    let rows: Vec<ComparisonRow> = figures
        .rows
        .iter()
        .map(|row| {
            let difference = &row.left - &row.right;
            net_difference += &difference;
            ComparisonRow {
                particular: row.particular.clone(),
                left: row.left.clone(),
                right: row.right.clone(),
                within_tolerance: tolerance.admits(&difference),
                difference,
            }
        })
        .collect();

    let status = if rows.is_empty() {
        BlockStatus::NoData
    } else if rows.iter().all(|r| r.within_tolerance) {
        BlockStatus::Matched
    } else {
        BlockStatus::Mismatched
    };

    ComparisonBlock {
        label: period.label(),
        period,
        rows,
        net_difference,
        status,
    }
}

fn overall_status(blocks: &[ComparisonBlock]) -> BlockStatus {
    if blocks.iter().any(|b| b.status == BlockStatus::Mismatched) {
        BlockStatus::Mismatched
    } else if blocks.iter().any(|b| b.status == BlockStatus::Matched) {
        BlockStatus::Matched
    } else {
        BlockStatus::NoData
    }
}
