pub mod comparison;
pub mod invoice;
pub mod key;
pub mod period;
pub mod result;

pub use comparison::{
    BlockStatus, ComparisonBlock, ComparisonKind, ComparisonRow, MonthFigures, ParticularFigures,
    PeriodComparison,
};
pub use invoice::{InvoiceRecord, Source, ValueBasis};
pub use key::NormalizedKey;
pub use period::FilingPeriod;
pub use result::{
    DuplicateKeyWarning, PairCandidate, PairFilter, ReconciliationPair, ReconciliationReport,
    ReconciliationResult, RejectedRecord, Status, StatusCounts, Summary, SupplierSummary,
};
