use async_trait::async_trait;
use chrono::Utc;
use std::path::{Path, PathBuf};

use crate::error::PortalError;
use crate::io::{read_records, ImportOutcome};
use crate::models::{FilingPeriod, Source};
use crate::portal::PortalSession;

/// GST 门户数据源 (唯一的异步边界)
///
/// 实现方负责会话与网络细节，对账核心只消费返回的记录。
/// 无法解析的行放进 `rejected`，由对账报告一并返回。
#[async_trait]
pub trait PortalSource: Send + Sync {
    async fn fetch_gstr2b(
        &self,
        session: &PortalSession,
        period: &FilingPeriod,
    ) -> Result<ImportOutcome, PortalError>;
}

/// GSTIN 固定 15 位字母数字
pub const GSTIN_LEN: usize = 15;

/// 校验 GSTIN 并返回大写形式；非法值不得参与文件路径拼接
pub fn validate_gstin(raw: &str) -> Result<String, PortalError> {
    let gstin = raw.trim();
    if gstin.len() != GSTIN_LEN || !gstin.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(PortalError::Unavailable(format!("invalid GSTIN '{raw}'")));
    }
    Ok(gstin.to_ascii_uppercase())
}

/// 读取已缓存的 GSTR-2B 下载文件：`<GSTIN>_<期间>.csv`
#[derive(Debug, Clone)]
pub struct CsvPortalSource {
    cache_dir: PathBuf,
}

impl CsvPortalSource {
    pub fn new(cache_dir: impl AsRef<Path>) -> Self {
        Self {
            cache_dir: cache_dir.as_ref().to_path_buf(),
        }
    }

    pub fn path_for(&self, gstin: &str, period: &FilingPeriod) -> Result<PathBuf, PortalError> {
        let gstin = validate_gstin(gstin)?;
        Ok(self.cache_dir.join(format!("{}_{}.csv", gstin, period.slug())))
    }
}

#[async_trait]
impl PortalSource for CsvPortalSource {
    async fn fetch_gstr2b(
        &self,
        session: &PortalSession,
        period: &FilingPeriod,
    ) -> Result<ImportOutcome, PortalError> {
        session.ensure_active(Utc::now())?;

        let path = self.path_for(&session.gstin, period)?;
        let data = match tokio::fs::read(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(PortalError::Unavailable(format!(
                    "no cached GSTR-2B at {}",
                    path.display()
                )));
            }
            Err(e) => return Err(PortalError::Recon(e.into())),
        };

        let outcome = read_records(data.as_slice(), Source::Portal)?;
        if !outcome.rejected.is_empty() {
            tracing::warn!(
                "GSTR-2B cache {}: {} rows could not be parsed",
                path.display(),
                outcome.rejected.len()
            );
        }
        tracing::info!(
            "Loaded {} GSTR-2B records for {} ({})",
            outcome.records.len(),
            session.gstin,
            period.label()
        );
        Ok(outcome)
    }
}
