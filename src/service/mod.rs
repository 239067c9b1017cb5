pub mod aggregator;
pub mod classifier;
pub mod matcher;
pub mod normalizer;
pub mod reconciler;
pub mod summary_reco;

pub use aggregator::summarize;
pub use classifier::{classify, Tolerance, DEFAULT_TOLERANCE};
pub use matcher::{match_records, MatchOutput};
pub use normalizer::normalize;
pub use reconciler::{
    reconcile, reconcile_batches, ReconOptions, ReconciliationBatch, ReconciliationService,
    RunOverrides,
};
pub use summary_reco::compare_periods;
