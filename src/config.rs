use serde::{Deserialize, Serialize};

use crate::error::ReconError;
use crate::models::ValueBasis;
use crate::service::{ReconOptions, Tolerance, DEFAULT_TOLERANCE};

/// 默认配置文件 (扩展名可省略)
pub const DEFAULT_CONFIG_FILE: &str = "config/gst-reco";

/// 环境变量前缀，如 GST_RECO__SERVER__PORT=9000
pub const ENV_PREFIX: &str = "GST_RECO";

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub reconciliation: ReconciliationConfig,
    pub portal: PortalConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconciliationConfig {
    /// 默认容差，启动时校验
    pub tolerance: String,
    pub basis: ValueBasis,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalConfig {
    /// GSTR-2B 下载缓存目录
    pub cache_dir: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            reconciliation: ReconciliationConfig {
                tolerance: DEFAULT_TOLERANCE.to_string(),
                basis: ValueBasis::default(),
            },
            portal: PortalConfig {
                cache_dir: "data/gstr2b".to_string(),
            },
        }
    }
}

impl AppConfig {
    /// 默认值 → 配置文件 (可选) → 环境变量
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    pub fn load_from(file: &str) -> Result<Self, config::ConfigError> {
        let defaults = Self::default();
        config::Config::builder()
            .set_default("server.host", defaults.server.host)?
            .set_default("server.port", i64::from(defaults.server.port))?
            .set_default("reconciliation.tolerance", defaults.reconciliation.tolerance)?
            .set_default("reconciliation.basis", "taxable_value")?
            .set_default("portal.cache_dir", defaults.portal.cache_dir)?
            .add_source(config::File::with_name(file).required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?
            .try_deserialize()
    }

    /// 校验并生成默认对账参数；容差非法时返回配置错误
    pub fn recon_options(&self) -> Result<ReconOptions, ReconError> {
        Ok(ReconOptions {
            tolerance: Tolerance::parse(&self.reconciliation.tolerance)?,
            basis: self.reconciliation.basis,
            period: None,
        })
    }
}
