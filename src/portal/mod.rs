pub mod session;
pub mod source;

pub use session::{PortalSession, SESSION_VALIDITY_HOURS};
pub use source::{validate_gstin, CsvPortalSource, PortalSource, GSTIN_LEN};
