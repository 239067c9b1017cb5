use rayon::prelude::*;
use serde::Deserialize;
use std::sync::Arc;

use crate::error::ReconError;
use crate::io::ImportOutcome;
use crate::models::{
    ComparisonKind, FilingPeriod, InvoiceRecord, MonthFigures, PeriodComparison, ReconciliationReport,
    ReconciliationResult, ValueBasis,
};
use crate::portal::{PortalSession, PortalSource};
use crate::service::aggregator::summarize;
use crate::service::classifier::{resolve, Tolerance};
use crate::service::matcher::{match_records, MatchOutput};
use crate::service::summary_reco::compare_periods;

/// 单次对账参数 (显式传入，不依赖任何全局状态)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconOptions {
    pub tolerance: Tolerance,
    pub basis: ValueBasis,
    pub period: Option<FilingPeriod>,
}

impl ReconOptions {
    pub fn validate(&self) -> Result<(), ReconError> {
        if let Some(period) = &self.period {
            period.validate()?;
        }
        Ok(())
    }
}

/// 请求级覆盖项：容差可为 JSON 数字或字符串
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RunOverrides {
    #[serde(default)]
    pub tolerance: Option<serde_json::Value>,
    #[serde(default)]
    pub basis: Option<ValueBasis>,
    #[serde(default)]
    pub period: Option<FilingPeriod>,
}

impl RunOverrides {
    pub fn apply(&self, defaults: &ReconOptions) -> Result<ReconOptions, ReconError> {
        let tolerance = match &self.tolerance {
            Some(raw) => Tolerance::from_json(raw)?,
            None => defaults.tolerance.clone(),
        };
        let options = ReconOptions {
            tolerance,
            basis: self.basis.unwrap_or(defaults.basis),
            period: self.period.or(defaults.period),
        };
        options.validate()?;
        Ok(options)
    }
}

/// 执行一次 GSTR-2B 对账 (纯计算，无 IO)
///
/// 参数非法时在匹配前整体失败；单条记录校验失败只会进入 `rejected`。
pub fn reconcile(
    books: &[InvoiceRecord],
    portal: &[InvoiceRecord],
    options: &ReconOptions,
) -> Result<ReconciliationReport, ReconError> {
    options.validate()?;

    tracing::info!(
        "[GSTR-2B] 开始对账: books {}, portal {}, tolerance {}",
        books.len(),
        portal.len(),
        options.tolerance.amount()
    );

    let mut out_of_period = Vec::new();
    let MatchOutput {
        candidates,
        duplicates,
        rejected,
    } = match options.period {
        Some(period) => {
            let (books_in, books_out): (Vec<_>, Vec<_>) = books
                .iter()
                .cloned()
                .partition(|r| period.contains(r.invoice_date));
            let (portal_in, portal_out): (Vec<_>, Vec<_>) = portal
                .iter()
                .cloned()
                .partition(|r| period.contains(r.invoice_date));
            out_of_period.extend(books_out);
            out_of_period.extend(portal_out);
            if !out_of_period.is_empty() {
                tracing::info!(
                    "[GSTR-2B] {} 条记录不在期间 {} 内，已排除",
                    out_of_period.len(),
                    period.label()
                );
            }
            match_records(&books_in, &portal_in)
        }
        None => match_records(books, portal),
    };

    if !duplicates.is_empty() {
        tracing::warn!("[GSTR-2B] 发现 {} 条重复发票，已保留首条", duplicates.len());
    }
    if !rejected.is_empty() {
        tracing::warn!("[GSTR-2B] {} 条记录校验失败，未参与匹配", rejected.len());
    }

    let pairs: Vec<_> = candidates
        .into_iter()
        .map(|c| resolve(c, &options.tolerance, options.basis))
        .collect();
    let summary = summarize(&pairs);

    tracing::info!(
        "[GSTR-2B] 对账完成: matched {}, unmatched {}, missing_in_books {}, missing_in_portal {}, net diff {}",
        summary.counts.matched,
        summary.counts.unmatched,
        summary.counts.missing_in_books,
        summary.counts.missing_in_portal,
        summary.net_difference
    );

    Ok(ReconciliationReport {
        result: ReconciliationResult { pairs, summary },
        duplicates,
        rejected,
        out_of_period,
        tolerance: options.tolerance.amount().clone(),
        basis: options.basis,
        period: options.period.map(|p| p.label()),
    })
}

/// 一个独立对账批次 (例如一个 GSTIN 的一个期间)
#[derive(Debug, Clone, Deserialize)]
pub struct ReconciliationBatch {
    pub label: String,
    #[serde(default)]
    pub books: Vec<InvoiceRecord>,
    #[serde(default)]
    pub portal: Vec<InvoiceRecord>,
}

/// 多批次并行对账，结果顺序与输入一致
pub fn reconcile_batches(
    batches: &[ReconciliationBatch],
    options: &ReconOptions,
) -> Vec<(String, Result<ReconciliationReport, ReconError>)> {
    batches
        .par_iter()
        .map(|batch| {
            (
                batch.label.clone(),
                reconcile(&batch.books, &batch.portal, options),
            )
        })
        .collect()
}

/// 对账服务：持有默认参数与门户数据源
pub struct ReconciliationService {
    defaults: ReconOptions,
    portal: Arc<dyn PortalSource>,
}

impl ReconciliationService {
    pub fn new(defaults: ReconOptions, portal: Arc<dyn PortalSource>) -> Self {
        Self { defaults, portal }
    }

    pub fn defaults(&self) -> &ReconOptions {
        &self.defaults
    }

    pub fn reconcile(
        &self,
        books: &[InvoiceRecord],
        portal: &[InvoiceRecord],
        overrides: &RunOverrides,
    ) -> Result<ReconciliationReport, ReconError> {
        let options = overrides.apply(&self.defaults)?;
        reconcile(books, portal, &options)
    }

    /// 从门户拉取 GSTR-2B 后对账；拉取失败按“无数据”处理，
    /// 门户文件中无法解析的行并入报告的 `rejected`
    pub async fn reconcile_with_portal(
        &self,
        session: &PortalSession,
        period: FilingPeriod,
        books: &[InvoiceRecord],
        overrides: &RunOverrides,
    ) -> Result<ReconciliationReport, ReconError> {
        let mut options = overrides.apply(&self.defaults)?;
        options.period = Some(period);
        options.validate()?;

        let fetched = match self.portal.fetch_gstr2b(session, &period).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(
                    "GSTR-2B fetch for {} ({}) failed, treating as empty: {}",
                    session.gstin,
                    period.label(),
                    e
                );
                ImportOutcome::default()
            }
        };

        let mut report = reconcile(books, &fetched.records, &options)?;
        report.rejected.extend(fetched.rejected);
        Ok(report)
    }

    /// 申报表月度汇总对比，容差与期间沿用本次运行参数
    pub fn compare_periods(
        &self,
        kind: ComparisonKind,
        months: &[MonthFigures],
        overrides: &RunOverrides,
    ) -> Result<PeriodComparison, ReconError> {
        let options = overrides.apply(&self.defaults)?;
        compare_periods(kind, months, &options.tolerance, options.period)
    }

    pub fn reconcile_batches(
        &self,
        batches: &[ReconciliationBatch],
        overrides: &RunOverrides,
    ) -> Result<Vec<(String, Result<ReconciliationReport, ReconError>)>, ReconError> {
        let options = overrides.apply(&self.defaults)?;
        tracing::info!("并行对账 {} 个批次", batches.len());
        Ok(reconcile_batches(batches, &options))
    }
}
