use bigdecimal::{BigDecimal, Zero};
use serde::Serialize;
use std::str::FromStr;

use crate::error::ReconError;
use crate::models::{PairCandidate, ReconciliationPair, Status, ValueBasis};

/// 默认容差 1.00 (₹)
pub const DEFAULT_TOLERANCE: &str = "1.00";

/// 金额容差：非负十进制数，对所有供应商统一生效
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Tolerance(BigDecimal);

impl Tolerance {
    pub fn new(amount: BigDecimal) -> Result<Self, ReconError> {
        if amount < BigDecimal::zero() {
            return Err(ReconError::configuration(format!(
                "tolerance must not be negative, got {amount}"
            )));
        }
        Ok(Self(amount))
    }

    pub fn parse(raw: &str) -> Result<Self, ReconError> {
        let amount = BigDecimal::from_str(raw.trim()).map_err(|_| {
            ReconError::configuration(format!("tolerance '{raw}' is not a decimal number"))
        })?;
        Self::new(amount)
    }

    /// 接受 JSON 数字或字符串，其余类型视为非数值
    pub fn from_json(value: &serde_json::Value) -> Result<Self, ReconError> {
        match value {
            serde_json::Value::Number(n) => Self::parse(&n.to_string()),
            serde_json::Value::String(s) => Self::parse(s),
            other => Err(ReconError::configuration(format!(
                "tolerance must be numeric, got {other}"
            ))),
        }
    }

    pub fn amount(&self) -> &BigDecimal {
        &self.0
    }

    /// |差额| <= 容差
    pub fn admits(&self, difference: &BigDecimal) -> bool {
        difference.abs() <= self.0
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self(BigDecimal::from_str(DEFAULT_TOLERANCE).unwrap_or_else(|_| BigDecimal::from(1)))
    }
}

/// 候选对的有符号差额：账簿 - 门户，缺失侧按 0 计
pub fn difference(candidate: &PairCandidate, basis: ValueBasis) -> BigDecimal {
    let books = candidate
        .books()
        .map(|r| r.value(basis))
        .unwrap_or_else(BigDecimal::zero);
    let portal = candidate
        .portal()
        .map(|r| r.value(basis))
        .unwrap_or_else(BigDecimal::zero);
    books - portal
}

/// 判定候选对状态；单侧缺失时不看容差
pub fn classify(candidate: &PairCandidate, tolerance: &Tolerance, basis: ValueBasis) -> Status {
    match candidate {
        PairCandidate::BooksOnly { .. } => Status::MissingInPortal,
        PairCandidate::PortalOnly { .. } => Status::MissingInBooks,
        PairCandidate::Both { .. } => {
            if tolerance.admits(&difference(candidate, basis)) {
                Status::Matched
            } else {
                Status::Unmatched
            }
        }
    }
}

/// 分类并生成最终结果行
pub fn resolve(candidate: PairCandidate, tolerance: &Tolerance, basis: ValueBasis) -> ReconciliationPair {
    let status = classify(&candidate, tolerance, basis);
    let diff = difference(&candidate, basis);
    let (key, books, portal) = candidate.into_parts();
    ReconciliationPair::from_parts(key, books, portal, basis, diff, status)
}
