use bigdecimal::{BigDecimal, Zero};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;
use crate::models::{InvoiceRecord, NormalizedKey, Source, ValueBasis};

/// 对账状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Matched,
    Unmatched,
    MissingInBooks,
    MissingInPortal,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Matched => "MATCHED",
            Self::Unmatched => "UNMATCHED",
            Self::MissingInBooks => "MISSING_IN_BOOKS",
            Self::MissingInPortal => "MISSING_IN_PORTAL",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "matched" => Ok(Self::Matched),
            "unmatched" => Ok(Self::Unmatched),
            "missing_in_books" => Ok(Self::MissingInBooks),
            // 前端旧状态名
            "missing_in_portal" | "missing_in_gstr2b" => Ok(Self::MissingInPortal),
            other => Err(format!("unknown status '{other}'")),
        }
    }
}

/// 匹配阶段产出的候选对 (尚未分类)
#[derive(Debug, Clone, PartialEq)]
pub enum PairCandidate {
    Both {
        key: NormalizedKey,
        books: InvoiceRecord,
        portal: InvoiceRecord,
    },
    /// 门户缺失 (GSTR-2B 中没有)
    BooksOnly { key: NormalizedKey, books: InvoiceRecord },
    /// 账簿缺失
    PortalOnly { key: NormalizedKey, portal: InvoiceRecord },
}

impl PairCandidate {
    pub fn key(&self) -> &NormalizedKey {
        match self {
            Self::Both { key, .. } | Self::BooksOnly { key, .. } | Self::PortalOnly { key, .. } => key,
        }
    }

    pub fn books(&self) -> Option<&InvoiceRecord> {
        match self {
            Self::Both { books, .. } | Self::BooksOnly { books, .. } => Some(books),
            Self::PortalOnly { .. } => None,
        }
    }

    pub fn portal(&self) -> Option<&InvoiceRecord> {
        match self {
            Self::Both { portal, .. } | Self::PortalOnly { portal, .. } => Some(portal),
            Self::BooksOnly { .. } => None,
        }
    }

    pub(crate) fn into_parts(self) -> (NormalizedKey, Option<InvoiceRecord>, Option<InvoiceRecord>) {
        match self {
            Self::Both { key, books, portal } => (key, Some(books), Some(portal)),
            Self::BooksOnly { key, books } => (key, Some(books), None),
            Self::PortalOnly { key, portal } => (key, None, Some(portal)),
        }
    }
}

/// 对账结果行
///
/// 账簿侧与门户侧至多缺一侧，只能经由分类器从 [`PairCandidate`] 构造。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconciliationPair {
    key: NormalizedKey,
    books_record: Option<InvoiceRecord>,
    portal_record: Option<InvoiceRecord>,
    books_value: Option<BigDecimal>,
    portal_value: Option<BigDecimal>,
    difference: BigDecimal, // 账簿 - 门户，缺失侧按 0 计
    status: Status,
}

impl ReconciliationPair {
    pub(crate) fn from_parts(
        key: NormalizedKey,
        books_record: Option<InvoiceRecord>,
        portal_record: Option<InvoiceRecord>,
        basis: ValueBasis,
        difference: BigDecimal,
        status: Status,
    ) -> Self {
        debug_assert!(books_record.is_some() || portal_record.is_some());
        let books_value = books_record.as_ref().map(|r| r.value(basis));
        let portal_value = portal_record.as_ref().map(|r| r.value(basis));
        Self {
            key,
            books_record,
            portal_record,
            books_value,
            portal_value,
            difference,
            status,
        }
    }

    pub fn key(&self) -> &NormalizedKey {
        &self.key
    }

    pub fn books_record(&self) -> Option<&InvoiceRecord> {
        self.books_record.as_ref()
    }

    pub fn portal_record(&self) -> Option<&InvoiceRecord> {
        self.portal_record.as_ref()
    }

    pub fn books_value(&self) -> Option<&BigDecimal> {
        self.books_value.as_ref()
    }

    pub fn portal_value(&self) -> Option<&BigDecimal> {
        self.portal_value.as_ref()
    }

    pub fn difference(&self) -> &BigDecimal {
        &self.difference
    }

    pub fn status(&self) -> Status {
        self.status
    }

    /// 展示用记录：优先账簿侧
    pub fn primary_record(&self) -> &InvoiceRecord {
        match (&self.books_record, &self.portal_record) {
            (Some(books), _) => books,
            (None, Some(portal)) => portal,
            (None, None) => unreachable!("reconciliation pair without records"),
        }
    }

    pub fn supplier_name(&self) -> Option<&str> {
        self.books_record
            .as_ref()
            .and_then(|r| r.supplier_name.as_deref())
            .or_else(|| self.portal_record.as_ref().and_then(|r| r.supplier_name.as_deref()))
    }
}

/// 四种状态计数，始终齐全
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub matched: usize,
    pub unmatched: usize,
    pub missing_in_books: usize,
    pub missing_in_portal: usize,
}

impl StatusCounts {
    pub fn record(&mut self, status: Status) {
        match status {
            Status::Matched => self.matched += 1,
            Status::Unmatched => self.unmatched += 1,
            Status::MissingInBooks => self.missing_in_books += 1,
            Status::MissingInPortal => self.missing_in_portal += 1,
        }
    }

    pub fn get(&self, status: Status) -> usize {
        match status {
            Status::Matched => self.matched,
            Status::Unmatched => self.unmatched,
            Status::MissingInBooks => self.missing_in_books,
            Status::MissingInPortal => self.missing_in_portal,
        }
    }

    pub fn total(&self) -> usize {
        self.matched + self.unmatched + self.missing_in_books + self.missing_in_portal
    }
}

/// 单个供应商的下钻统计
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SupplierSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supplier_name: Option<String>,
    pub counts: StatusCounts,
    pub net_difference: BigDecimal,
}

/// 汇总统计
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub counts: StatusCounts,
    pub total_pairs: usize,
    /// 有符号净差额 (净多报 / 少报)
    pub net_difference: BigDecimal,
    pub absolute_difference: BigDecimal,
    pub total_books_value: BigDecimal,
    pub total_portal_value: BigDecimal,
    pub match_percentage: u32,
    pub suppliers: BTreeMap<String, SupplierSummary>,
}

impl Summary {
    /// 各供应商净差额之和
    pub fn supplier_net_total(&self) -> BigDecimal {
        self.suppliers
            .values()
            .fold(BigDecimal::zero(), |acc, s| acc + &s.net_difference)
    }

    /// 总净差额必须等于各供应商净差额之和
    pub fn is_consistent(&self) -> bool {
        self.supplier_net_total() == self.net_difference
    }
}

/// 一次对账的完整输出，创建后不再修改
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconciliationResult {
    pub pairs: Vec<ReconciliationPair>,
    pub summary: Summary,
}

impl ReconciliationResult {
    /// 按状态 / 关键字筛选结果行 (关键字匹配 GSTIN、供应商名、发票号，不区分大小写)
    pub fn filter(&self, filter: &PairFilter) -> Vec<&ReconciliationPair> {
        let query = filter
            .search
            .as_deref()
            .map(|q| q.trim().to_lowercase())
            .filter(|q| !q.is_empty());

        self.pairs
            .iter()
            .filter(|pair| filter.status.map_or(true, |s| pair.status() == s))
            .filter(|pair| match &query {
                None => true,
                Some(q) => [pair.books_record(), pair.portal_record()]
                    .into_iter()
                    .flatten()
                    .any(|r| {
                        r.supplier_id.to_lowercase().contains(q)
                            || r.invoice_number.to_lowercase().contains(q)
                            || r.supplier_name
                                .as_deref()
                                .is_some_and(|n| n.to_lowercase().contains(q))
                    }),
            })
            .collect()
    }
}

/// 结果行筛选条件
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PairFilter {
    #[serde(default)]
    pub status: Option<Status>,
    #[serde(default)]
    pub search: Option<String>,
}

/// 同一来源内的重复发票：保留首条，其余在此列出
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicateKeyWarning {
    pub source: Source,
    pub key: NormalizedKey,
    /// 首条 (参与匹配) 记录的原始发票号
    pub first_invoice_number: String,
    pub record: InvoiceRecord,
}

/// 校验失败被剔除的记录
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectedRecord {
    pub source: Source,
    /// 导入文件中的行号 (含表头)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<InvoiceRecord>,
    pub reason: String,
    #[serde(skip)]
    pub error: ValidationError,
}

impl RejectedRecord {
    pub fn from_record(record: InvoiceRecord, error: ValidationError) -> Self {
        Self {
            source: record.source,
            line: None,
            reason: error.to_string(),
            record: Some(record),
            error,
        }
    }

    pub fn from_line(source: Source, line: u64, error: ValidationError) -> Self {
        Self {
            source,
            line: Some(line),
            record: None,
            reason: error.to_string(),
            error,
        }
    }
}

/// 对账报告：主结果 + 旁路诊断信息
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconciliationReport {
    pub result: ReconciliationResult,
    pub duplicates: Vec<DuplicateKeyWarning>,
    pub rejected: Vec<RejectedRecord>,
    pub out_of_period: Vec<InvoiceRecord>,
    pub tolerance: BigDecimal,
    pub basis: ValueBasis,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<String>,
}
