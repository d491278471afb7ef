//! Side-by-side evaluation of the grounded and the ungrounded answer paths
//! over a fixed question set, written out as a spreadsheet-friendly CSV.

pub mod harness;
pub mod questions;
pub mod report;

pub use harness::{run_evaluation, EvalReport, EvalRow};
pub use questions::{load_questions, DEFAULT_QUESTIONS};
pub use report::{report_file_name, write_report};
