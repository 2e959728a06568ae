//! # ctg-core: contingency violation data model
//!
//! Shared types for the contingency violation comparison toolkit:
//!
//! - [`CaseType`] - the three study categories and their spellings
//! - [`SheetGrid`] / [`Cell`] - materialized spreadsheet cells handed over by readers
//! - [`ViolationRecord`] / [`ScenarioTable`] - normalized rows of one scenario
//! - [`CtgError`] - error type for component seams
//! - [`diagnostics`] - non-fatal issues collected while parsing and filtering
//!
//! ```
//! use ctg_core::*;
//!
//! let table = ScenarioTable::new(
//!     "Base Case",
//!     vec![ViolationRecord::new(CaseType::Acca, "Line A-B", "I1", Some(85.0))
//!         .with_limit(LimitValue::Number(400.0))],
//! );
//! assert_eq!(table.for_case_type(CaseType::Acca).count(), 1);
//! assert_eq!(table.for_case_type(CaseType::DcWac).count(), 0);
//! ```

pub mod case_type;
pub mod diagnostics;
pub mod error;
pub mod grid;
pub mod record;

pub use case_type::{CaseType, CaseTypeTitles};
pub use diagnostics::{DiagnosticIssue, Diagnostics, Severity};
pub use error::{CtgError, CtgResult};
pub use grid::{format_number, parse_number, Cell, SheetGrid};
pub use record::{LimitValue, ScenarioTable, ViolationRecord, LIMIT_TOLERANCE};
