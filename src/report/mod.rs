/// Turns resolution verdicts into link records and diagnostics.
pub mod reporter;

/// Formats batch reports as text or JSON.
pub mod formatter;

pub use formatter::{format_diagnostic, format_report_as_json, format_report_as_text};
pub use reporter::{
    report_error, report_redeclaration, report_resolution, BatchReport, BatchStats, Diagnostic,
    DiagnosticCode, LinkRecord, LinkRole, ReportEntry, Severity,
};
