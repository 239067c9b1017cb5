pub mod export;
pub mod import;

pub use export::{export_to_csv, to_csv_string, write_csv};
pub use import::{read_records, read_records_from_path, ImportOutcome};
