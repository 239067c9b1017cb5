use crate::error::ReconError;
use crate::io::to_csv_string;
use crate::models::{
    ComparisonKind, FilingPeriod, InvoiceRecord, MonthFigures, PairFilter, PeriodComparison,
    ReconciliationReport,
};
use crate::portal::PortalSession;
use crate::service::{ReconciliationBatch, ReconciliationService, RunOverrides};
use axum::{
    extract::{Json, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// 请求体: 账簿与门户记录
#[derive(Debug, Deserialize)]
pub struct ReconcileRequest {
    #[serde(default)]
    pub books: Vec<InvoiceRecord>,
    #[serde(default)]
    pub portal: Vec<InvoiceRecord>,
    #[serde(flatten)]
    pub overrides: RunOverrides,
}

/// 请求体: 门户会话 + 账簿记录
#[derive(Debug, Deserialize)]
pub struct PortalReconcileRequest {
    pub session: PortalSession,
    pub period: FilingPeriod,
    #[serde(default)]
    pub books: Vec<InvoiceRecord>,
    #[serde(flatten)]
    pub overrides: RunOverrides,
}

/// 请求体: 导出 (可按状态 / 关键字筛选)
#[derive(Debug, Deserialize)]
pub struct ExportRequest {
    #[serde(default)]
    pub books: Vec<InvoiceRecord>,
    #[serde(default)]
    pub portal: Vec<InvoiceRecord>,
    #[serde(flatten)]
    pub overrides: RunOverrides,
    #[serde(flatten)]
    pub filter: PairFilter,
}

/// 请求体: 申报表月度汇总对比
#[derive(Debug, Deserialize)]
pub struct PeriodComparisonRequest {
    pub kind: ComparisonKind,
    #[serde(default)]
    pub months: Vec<MonthFigures>,
    #[serde(flatten)]
    pub overrides: RunOverrides,
}

/// 请求体: 多批次
#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    pub batches: Vec<ReconciliationBatch>,
    #[serde(flatten)]
    pub overrides: RunOverrides,
}

/// 响应体
#[derive(Debug, Serialize)]
pub struct ReconcileResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<ReconciliationReport>,
}

#[derive(Debug, Serialize)]
pub struct PeriodComparisonResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comparison: Option<PeriodComparison>,
}

#[derive(Debug, Serialize)]
pub struct BatchItemResponse {
    pub label: String,
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<ReconciliationReport>,
}

/// 健康检查
pub async fn health_check() -> &'static str {
    "OK"
}

/// 账簿 vs GSTR-2B 对账 (记录随请求上传)
pub async fn reconcile_2b(
    State(service): State<Arc<ReconciliationService>>,
    Json(req): Json<ReconcileRequest>,
) -> Response {
    let run = run_blocking(move || service.reconcile(&req.books, &req.portal, &req.overrides)).await;
    match run {
        Ok(report) => success(report),
        Err(response) => response,
    }
}

/// 账簿 vs 门户 GSTR-2B (通过已认证会话拉取)
pub async fn reconcile_2b_portal(
    State(service): State<Arc<ReconciliationService>>,
    Json(req): Json<PortalReconcileRequest>,
) -> Response {
    match service
        .reconcile_with_portal(&req.session, req.period, &req.books, &req.overrides)
        .await
    {
        Ok(report) => success(report),
        Err(e) => error_response(e),
    }
}

/// 导出对账结果 CSV
pub async fn export_2b(
    State(service): State<Arc<ReconciliationService>>,
    Json(req): Json<ExportRequest>,
) -> Response {
    let run = run_blocking(move || {
        let report = service.reconcile(&req.books, &req.portal, &req.overrides)?;
        to_csv_string(report.result.filter(&req.filter))
    })
    .await;

    match run {
        Ok(body) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"gstr2b_reconciliation.csv\"",
                ),
            ],
            body,
        )
            .into_response(),
        Err(response) => response,
    }
}

/// 申报表月度汇总对比 (GSTR-1 / 3B / 2B / 账簿)
pub async fn compare_returns(
    State(service): State<Arc<ReconciliationService>>,
    Json(req): Json<PeriodComparisonRequest>,
) -> Response {
    match service.compare_periods(req.kind, &req.months, &req.overrides) {
        Ok(comparison) => {
            let response = PeriodComparisonResponse {
                success: true,
                message: format!(
                    "Compared {} months: {:?}",
                    comparison.blocks.len(),
                    comparison.status
                ),
                comparison: Some(comparison),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => error_response(e),
    }
}

/// 多批次并行对账 (rayon 计算放到阻塞线程池)
pub async fn reconcile_batch(
    State(service): State<Arc<ReconciliationService>>,
    Json(req): Json<BatchRequest>,
) -> Response {
    let run = run_blocking(move || service.reconcile_batches(&req.batches, &req.overrides)).await;
    let results = match run {
        Ok(results) => results,
        Err(response) => return response,
    };

    let items: Vec<BatchItemResponse> = results
        .into_iter()
        .map(|(label, result)| match result {
            Ok(report) => BatchItemResponse {
                label,
                success: true,
                message: summary_message(&report),
                report: Some(report),
            },
            Err(e) => BatchItemResponse {
                label,
                success: false,
                message: format!("Error: {}", e),
                report: None,
            },
        })
        .collect();

    (StatusCode::OK, Json(items)).into_response()
}

fn summary_message(report: &ReconciliationReport) -> String {
    let counts = &report.result.summary.counts;
    format!(
        "Reconciled {} pairs: {} matched, {} unmatched, {} missing in books, {} missing in portal",
        report.result.summary.total_pairs,
        counts.matched,
        counts.unmatched,
        counts.missing_in_books,
        counts.missing_in_portal
    )
}

/// 同步计算放到阻塞线程池
async fn run_blocking<T, F>(f: F) -> Result<T, Response>
where
    F: FnOnce() -> Result<T, ReconError> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(error_response(e)),
        Err(e) => {
            tracing::error!("reconciliation task failed: {}", e);
            let response = ReconcileResponse {
                success: false,
                message: format!("Error: {}", e),
                report: None,
            };
            Err((StatusCode::INTERNAL_SERVER_ERROR, Json(response)).into_response())
        }
    }
}

fn success(report: ReconciliationReport) -> Response {
    let response = ReconcileResponse {
        success: true,
        message: summary_message(&report),
        report: Some(report),
    };
    (StatusCode::OK, Json(response)).into_response()
}

fn error_response(e: ReconError) -> Response {
    let status = match e {
        ReconError::Configuration(_) | ReconError::Validation(_) | ReconError::MissingColumn(_) => {
            StatusCode::BAD_REQUEST
        }
        ReconError::Csv(_) | ReconError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        tracing::error!("reconciliation failed: {}", e);
    }
    let response = ReconcileResponse {
        success: false,
        message: format!("Error: {}", e),
        report: None,
    };
    (status, Json(response)).into_response()
}
