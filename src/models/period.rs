use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::ReconError;

const MONTH_NAMES: [&str; 12] = [
    "January", "February", "March", "April", "May", "June",
    "July", "August", "September", "October", "November", "December",
];

/// 申报期间 (印度财年 4 月 1 日 - 次年 3 月 31 日)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FilingPeriod {
    /// 整个财年，start_year = 2024 表示 FY 2024-25
    FinancialYear { start_year: i32 },
    /// 财年季度：Q1 Apr-Jun, Q2 Jul-Sep, Q3 Oct-Dec, Q4 Jan-Mar
    Quarter { start_year: i32, quarter: u32 },
    /// 自然月
    Month { year: i32, month: u32 },
}

impl FilingPeriod {
    /// 期间首日与末日 (闭区间)
    pub fn bounds(&self) -> Result<(NaiveDate, NaiveDate), ReconError> {
        let (first_year, first_month, months) = match *self {
            Self::FinancialYear { start_year } => (start_year, 4, 12),
            Self::Quarter { start_year, quarter } => {
                if !(1..=4).contains(&quarter) {
                    return Err(ReconError::configuration(format!(
                        "quarter must be 1-4, got {quarter}"
                    )));
                }
                let offset = (quarter - 1) * 3 + 3; // 从 1 月起的偏移
                let year = if quarter == 4 { start_year + 1 } else { start_year };
                (year, offset % 12 + 1, 3)
            }
            Self::Month { year, month } => {
                if !(1..=12).contains(&month) {
                    return Err(ReconError::configuration(format!(
                        "month must be 1-12, got {month}"
                    )));
                }
                (year, month, 1)
            }
        };

        let start = NaiveDate::from_ymd_opt(first_year, first_month, 1).ok_or_else(|| {
            ReconError::configuration(format!("invalid period start {first_year}-{first_month}"))
        })?;
        let end = add_months(start, months)
            .and_then(|d| d.pred_opt())
            .ok_or_else(|| ReconError::configuration("period end out of range"))?;
        Ok((start, end))
    }

    /// 期间是否合法
    pub fn validate(&self) -> Result<(), ReconError> {
        self.bounds().map(|_| ())
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.bounds()
            .map(|(start, end)| start <= date && date <= end)
            .unwrap_or(false)
    }

    /// 展示标签，如 "FY 2024-25" / "Q1 (Apr-Jun) FY 2024-25" / "April 2024"
    pub fn label(&self) -> String {
        match *self {
            Self::FinancialYear { start_year } => fy_label(start_year),
            Self::Quarter { start_year, quarter } => {
                let span = match quarter {
                    1 => "Apr-Jun",
                    2 => "Jul-Sep",
                    3 => "Oct-Dec",
                    _ => "Jan-Mar",
                };
                format!("Q{quarter} ({span}) {}", fy_label(start_year))
            }
            Self::Month { year, month } => {
                let name = MONTH_NAMES
                    .get(month.saturating_sub(1) as usize)
                    .copied()
                    .unwrap_or("?");
                format!("{name} {year}")
            }
        }
    }

    /// 文件名安全的短标识，如 "FY2024-25" / "FY2024-25-Q1" / "2024-04"
    pub fn slug(&self) -> String {
        match *self {
            Self::FinancialYear { start_year } => format!("FY{}-{:02}", start_year, (start_year + 1) % 100),
            Self::Quarter { start_year, quarter } => {
                format!("FY{}-{:02}-Q{}", start_year, (start_year + 1) % 100, quarter)
            }
            Self::Month { year, month } => format!("{year}-{month:02}"),
        }
    }
}

fn fy_label(start_year: i32) -> String {
    format!("FY {}-{:02}", start_year, (start_year + 1) % 100)
}

fn add_months(date: NaiveDate, months: u32) -> Option<NaiveDate> {
    let total = date.year() * 12 + date.month0() as i32 + months as i32;
    NaiveDate::from_ymd_opt(total.div_euclid(12), total.rem_euclid(12) as u32 + 1, 1)
}
