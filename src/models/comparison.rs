use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use crate::models::FilingPeriod;

/// 申报表汇总对比类型 (按月、按科目)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonKind {
    /// 销售台账 vs GSTR-1
    Gstr1VsBooks,
    /// 账簿 vs GSTR-3B
    Gstr3bVsBooks,
    /// 销项：GSTR-1 vs GSTR-3B 3.1
    Gstr1VsGstr3b,
    /// 进项税额：GSTR-2B vs GSTR-3B ITC
    Gstr2bVsGstr3b,
}

impl ComparisonKind {
    /// (左侧, 右侧) 的展示名，差额 = 左 - 右
    pub fn sides(&self) -> (&'static str, &'static str) {
        match self {
            Self::Gstr1VsBooks => ("Books", "GSTR-1"),
            Self::Gstr3bVsBooks => ("Books", "GSTR-3B"),
            Self::Gstr1VsGstr3b => ("GSTR-1", "GSTR-3B"),
            Self::Gstr2bVsGstr3b => ("GSTR-2B", "GSTR-3B"),
        }
    }
}

/// 单个科目的两侧金额，缺省按 0 计
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ParticularFigures {
    pub particular: String,
    #[serde(default)]
    pub left: BigDecimal,
    #[serde(default)]
    pub right: BigDecimal,
}

/// 某个月的全部科目
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MonthFigures {
    pub year: i32,
    pub month: u32,
    #[serde(default)]
    pub rows: Vec<ParticularFigures>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRow {
    pub particular: String,
    pub left: BigDecimal,
    pub right: BigDecimal,
    pub difference: BigDecimal,
    pub within_tolerance: bool,
}

/// 月度 / 整体对比状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlockStatus {
    Matched,
    Mismatched,
    NoData,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonBlock {
    pub period: FilingPeriod,
    pub label: String,
    pub rows: Vec<ComparisonRow>,
    pub net_difference: BigDecimal,
    pub status: BlockStatus,
}

/// 一次汇总对比的输出，月份按时间排序
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodComparison {
    pub kind: ComparisonKind,
    pub left_label: String,
    pub right_label: String,
    pub tolerance: BigDecimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<String>,
    pub blocks: Vec<ComparisonBlock>,
    /// 不在所选期间内、未参与对比的月份
    pub out_of_period: Vec<String>,
    pub status: BlockStatus,
}
