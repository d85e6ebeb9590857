use std::fs;
use std::path::Path;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::config::{should_index_file, XrefConfig};
use crate::errors::{Result, XrefError};
use crate::index::DeclarationIndex;
use crate::report::{report_error, report_redeclaration, report_resolution, BatchReport, ReportEntry};
use crate::resolution::Resolver;
use crate::types::{BatchInput, RawDeclaration, RawReference, ReferenceToken};

/// Reads a batch from a JSON file with `declarations` and `references` arrays.
pub fn load_batch_input(path: &Path) -> Result<BatchInput> {
    let contents = fs::read_to_string(path).map_err(|e| XrefError::Input {
        message: format!("failed to read batch file: {}", e),
        path: path.display().to_string(),
    })?;
    serde_json::from_str(&contents).map_err(|e| XrefError::Input {
        message: format!("failed to parse batch file: {}", e),
        path: path.display().to_string(),
    })
}

/// Builds and seals an index from parser output, skipping declarations
/// whose file is excluded by the configuration.
pub fn build_index<I>(declarations: I, config: &XrefConfig) -> Result<DeclarationIndex>
where
    I: IntoIterator<Item = RawDeclaration>,
{
    let mut index = DeclarationIndex::with_case_sensitivity(config.case_sensitive);
    let mut skipped = 0usize;

    let kept = declarations.into_iter().filter(|raw| {
        let keep = should_index_file(&raw.file, config);
        if !keep {
            debug!(name = %raw.name, file = %raw.file, "declaration excluded");
            skipped += 1;
        }
        keep
    });
    index.ingest(kept.map(RawDeclaration::into_declaration))?;

    if skipped > 0 {
        info!(skipped, "excluded declarations from index");
    }
    index.seal();
    Ok(index)
}

/// Parses extractor mentions into tokens, keeping one result per mention.
pub fn parse_references(references: &[RawReference]) -> Vec<Result<ReferenceToken>> {
    references
        .iter()
        .map(|raw| ReferenceToken::parse(&raw.text, raw.location()))
        .collect()
}

/// Runs a whole batch: index, seal, resolve every reference, report.
///
/// Bad references become error diagnostics and the batch carries on; only
/// structural faults such as inserting into a sealed index return `Err`.
pub fn run_batch(input: BatchInput, config: &XrefConfig) -> Result<BatchReport> {
    let start = Instant::now();
    let index = build_index(input.declarations, config)?;
    let report = resolve_batch(&index, &input.references, config)?;

    info!(
        declarations = report.stats.declarations,
        references = report.stats.references,
        linked = report.stats.linked,
        ambiguous = report.stats.ambiguous,
        unresolved = report.stats.unresolved,
        duration_ms = start.elapsed().as_millis() as u64,
        "batch resolved"
    );
    Ok(report)
}

/// Resolves mentions against an already sealed index and reports them in
/// input order.
pub fn resolve_batch(
    index: &DeclarationIndex,
    references: &[RawReference],
    config: &XrefConfig,
) -> Result<BatchReport> {
    let resolver = Resolver::new(index)?;
    let parsed = parse_references(references);

    let tokens: Vec<ReferenceToken> = parsed
        .iter()
        .filter_map(|p| p.as_ref().ok().cloned())
        .collect();
    let resolutions = if config.parallel {
        resolver.resolve_all_parallel(&tokens)
    } else {
        resolver.resolve_all(&tokens)
    };
    let mut resolved = tokens.iter().zip(resolutions);

    let mut report = BatchReport::default();
    report.stats.declarations = index.len();

    for (raw, parsed) in references.iter().zip(&parsed) {
        if let Err(e) = parsed {
            warn!(reference = %raw.text, error = %e, "skipping invalid reference");
            if let Some(diag) = report_error(&raw.text, e) {
                report.push(ReportEntry::Diagnostic(diag));
            }
            continue;
        }
        let Some((token, resolution)) = resolved.next() else {
            continue;
        };
        match resolution {
            Ok(resolution) => report.push(report_resolution(token, &resolution)),
            Err(e) => match report_error(&token.text, &e) {
                Some(diag) => report.push(ReportEntry::Diagnostic(diag)),
                None => return Err(e),
            },
        }
    }

    if config.report_redeclarations {
        for redecl in index.redeclarations() {
            report.push_redeclaration(report_redeclaration(redecl));
        }
    }

    Ok(report)
}
