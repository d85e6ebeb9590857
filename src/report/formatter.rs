use std::collections::BTreeMap;

use crate::errors::Result;
use crate::report::reporter::{BatchReport, Diagnostic};

/// Formats a single diagnostic in compiler style:
///
/// ```text
/// warning[ambiguous]: ambiguous reference `referrent()`: ...
///   --> foo.c:19
///   = candidate: function referrent(void) at foo.c:10
/// ```
pub fn format_diagnostic(diag: &Diagnostic) -> String {
    let mut out = format!(
        "{}[{}]: {}\n  --> {}\n",
        diag.severity.as_str(),
        diag.code.as_str(),
        diag.message,
        diag.location
    );
    for note in &diag.notes {
        out.push_str(&format!("  = {}\n", note));
    }
    out
}

/// Formats a `BatchReport` as plain text: links grouped by the file they
/// occur in, then diagnostics in source order, then a summary line.
pub fn format_report_as_text(report: &BatchReport) -> String {
    let mut out = String::new();

    if !report.links.is_empty() {
        let mut by_file: BTreeMap<&str, Vec<String>> = BTreeMap::new();
        for link in &report.links {
            by_file.entry(&link.from.file).or_default().push(format!(
                "{}: {} -> {}",
                link.from.line,
                link.to_markup(),
                link.target
            ));
        }
        for (file, lines) in &by_file {
            out.push_str(&format!("{}\n", file));
            for line in lines {
                out.push_str(&format!("  {}\n", line));
            }
        }
        out.push('\n');
    }

    for diag in &report.diagnostics {
        out.push_str(&format_diagnostic(diag));
        out.push('\n');
    }

    let stats = &report.stats;
    out.push_str(&format!(
        "{} references: {} linked, {} ambiguous, {} unresolved, {} invalid; {} redeclarations\n",
        stats.references,
        stats.linked,
        stats.ambiguous,
        stats.unresolved,
        stats.invalid,
        stats.redeclarations
    ));

    out
}

/// Formats a `BatchReport` as pretty-printed JSON.
pub fn format_report_as_json(report: &BatchReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}
