use thiserror::Error;

/// 对账运行级错误
#[derive(Debug, Error)]
pub enum ReconError {
    /// 容差 / 期间等参数非法，整次对账在匹配前失败
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// 导入文件缺少必需列
    #[error("missing column '{0}'")]
    MissingColumn(String),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ReconError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }
}

/// 单条发票记录校验失败（该记录被剔除，对账继续）
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("supplier identifier is empty")]
    EmptySupplier,

    #[error("invoice number is empty")]
    EmptyInvoiceNumber,

    #[error("cannot parse date '{0}'")]
    InvalidDate(String),

    #[error("cannot parse amount '{value}' in column '{column}'")]
    InvalidAmount { column: String, value: String },

    /// 行内容不是合法 UTF-8
    #[error("row is not valid UTF-8: {0}")]
    Encoding(String),
}

/// 门户数据获取失败（上游错误，不进入对账核心）
#[derive(Debug, Error)]
pub enum PortalError {
    #[error("portal session {0} has expired")]
    SessionExpired(String),

    #[error("portal session {0} is not OTP verified")]
    NotVerified(String),

    #[error("no portal data available: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Recon(#[from] ReconError),
}
