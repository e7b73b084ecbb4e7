//! Record-set transforms backing the ETL tool server.

mod anomalies;
mod coerce;
mod constraints;
pub mod csv;
mod dedup;
mod error;
mod missing;
mod standardize;
mod transform;

pub use anomalies::{AnomalyReport, AnomalyViolation, RangeRule, detect_and_report_anomalies};
pub use coerce::{DataType, check_data_types, parse_datetime};
pub use constraints::{ConstraintRule, enforce_constraints};
pub use self::csv::{CsvTable, read_csv_file};
pub use dedup::{DedupOutcome, NO_DUPLICATES_MESSAGE, remove_duplicates};
pub use error::{ConstraintViolation, EtlError};
pub use missing::{MissingStrategy, handle_missing_values};
pub use standardize::{StandardizeRule, standardize_values};
pub use transform::{TransformRules, transform_data};
