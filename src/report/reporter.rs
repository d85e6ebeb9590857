use serde::{Deserialize, Serialize};

use crate::errors::XrefError;
use crate::index::Redeclaration;
use crate::resolution::{NarrowingStep, Resolution, ResolutionVerdict};
use crate::types::{CallHint, DeclKind, Declaration, Location, ReferenceToken};

/// How serious a diagnostic is. Neither level stops a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

/// What a diagnostic is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiagnosticCode {
    Unresolved,
    Ambiguous,
    Redeclared,
    InvalidReference,
}

impl DiagnosticCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticCode::Unresolved => "unresolved",
            DiagnosticCode::Ambiguous => "ambiguous",
            DiagnosticCode::Redeclared => "redeclared",
            DiagnosticCode::InvalidReference => "invalid-reference",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            DiagnosticCode::InvalidReference => Severity::Error,
            _ => Severity::Warning,
        }
    }
}

/// A problem with one reference (or one redeclared entity) for the renderer
/// to show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: DiagnosticCode,
    pub message: String,
    pub location: Location,
    /// Candidate declaration locations, ordered by file then line.
    pub candidates: Vec<Location>,
    pub notes: Vec<String>,
}

/// Markup role of a link target, named after the C domain roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkRole {
    Func,
    Macro,
    Type,
    Struct,
    Union,
    Enum,
    Enumerator,
    Var,
}

impl LinkRole {
    pub fn for_kind(kind: DeclKind) -> Self {
        match kind {
            DeclKind::Function => LinkRole::Func,
            DeclKind::Macro => LinkRole::Macro,
            DeclKind::Typedef => LinkRole::Type,
            DeclKind::Struct => LinkRole::Struct,
            DeclKind::Union => LinkRole::Union,
            DeclKind::Enum => LinkRole::Enum,
            DeclKind::Enumerator => LinkRole::Enumerator,
            DeclKind::Variable => LinkRole::Var,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LinkRole::Func => "func",
            LinkRole::Macro => "macro",
            LinkRole::Type => "type",
            LinkRole::Struct => "struct",
            LinkRole::Union => "union",
            LinkRole::Enum => "enum",
            LinkRole::Enumerator => "enumerator",
            LinkRole::Var => "var",
        }
    }
}

/// A resolved reference: where the mention is and what it points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRecord {
    pub from: Location,
    pub text: String,
    pub target_id: String,
    pub target_name: String,
    pub target: Location,
    pub role: LinkRole,
    /// Link text; `"text <name>"` when the mention differs from the name.
    pub label: String,
}

impl LinkRecord {
    /// Renders the link as a C-domain cross-reference role, e.g.
    /// ``:c:func:`referrent(a) <referrent>` ``.
    pub fn to_markup(&self) -> String {
        format!(":c:{}:`{}`", self.role.as_str(), self.label)
    }
}

/// What the reporter makes of one verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReportEntry {
    Link(LinkRecord),
    Diagnostic(Diagnostic),
}

/// Counts over one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchStats {
    pub declarations: usize,
    pub references: usize,
    pub linked: usize,
    pub ambiguous: usize,
    pub unresolved: usize,
    pub invalid: usize,
    pub redeclarations: usize,
}

/// Links and diagnostics for one batch, in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    pub links: Vec<LinkRecord>,
    pub diagnostics: Vec<Diagnostic>,
    pub stats: BatchStats,
}

impl BatchReport {
    /// Records one reference outcome and updates the counters.
    pub fn push(&mut self, entry: ReportEntry) {
        self.stats.references += 1;
        match entry {
            ReportEntry::Link(link) => {
                self.stats.linked += 1;
                self.links.push(link);
            }
            ReportEntry::Diagnostic(diag) => {
                match diag.code {
                    DiagnosticCode::Ambiguous => self.stats.ambiguous += 1,
                    DiagnosticCode::Unresolved => self.stats.unresolved += 1,
                    DiagnosticCode::InvalidReference => self.stats.invalid += 1,
                    DiagnosticCode::Redeclared => {}
                }
                self.diagnostics.push(diag);
            }
        }
    }

    pub fn push_redeclaration(&mut self, diag: Diagnostic) {
        self.stats.redeclarations += 1;
        self.diagnostics.push(diag);
    }

    pub fn warning_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .count()
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count()
    }
}

/// Turns a verdict for `token` into a link record or a diagnostic.
pub fn report_resolution(token: &ReferenceToken, resolution: &Resolution<'_>) -> ReportEntry {
    match &resolution.verdict {
        ResolutionVerdict::Unique(decl) => ReportEntry::Link(link_for(token, decl)),
        ResolutionVerdict::Ambiguous(candidates) => {
            let mut notes: Vec<String> = candidates
                .iter()
                .map(|d| format!("candidate: {}", d.describe()))
                .collect();
            notes.extend(step_notes(token, &resolution.steps));
            if let Some(help) = overload_help(token, candidates) {
                notes.push(help);
            }
            ReportEntry::Diagnostic(Diagnostic {
                severity: DiagnosticCode::Ambiguous.severity(),
                code: DiagnosticCode::Ambiguous,
                message: format!(
                    "ambiguous reference `{}`: {} declarations named `{}` match",
                    token.text,
                    candidates.len(),
                    token.name
                ),
                location: token.location.clone(),
                candidates: candidates.iter().map(|d| d.location.clone()).collect(),
                notes,
            })
        }
        ResolutionVerdict::Unresolved => ReportEntry::Diagnostic(Diagnostic {
            severity: DiagnosticCode::Unresolved.severity(),
            code: DiagnosticCode::Unresolved,
            message: format!(
                "unresolved reference `{}`: no declaration named `{}`",
                token.text, token.name
            ),
            location: token.location.clone(),
            candidates: Vec::new(),
            notes: Vec::new(),
        }),
    }
}

/// Diagnostic for a reference that could not be resolved at all.
///
/// Returns `None` for faults that are not about a single reference; those
/// abort the batch instead.
pub fn report_error(text: &str, error: &XrefError) -> Option<Diagnostic> {
    match error {
        XrefError::InvalidReference { message, location } => Some(Diagnostic {
            severity: DiagnosticCode::InvalidReference.severity(),
            code: DiagnosticCode::InvalidReference,
            message: format!("invalid reference `{}`: {}", text.trim(), message),
            location: location.clone(),
            candidates: Vec::new(),
            notes: Vec::new(),
        }),
        _ => None,
    }
}

pub fn report_redeclaration(redecl: &Redeclaration) -> Diagnostic {
    Diagnostic {
        severity: DiagnosticCode::Redeclared.severity(),
        code: DiagnosticCode::Redeclared,
        message: format!(
            "{} `{}` redeclared with the same signature; first declared at {}",
            redecl.kind, redecl.name, redecl.original
        ),
        location: redecl.duplicate.clone(),
        candidates: vec![redecl.original.clone(), redecl.duplicate.clone()],
        notes: vec!["both declarations are kept as separate candidates".to_string()],
    }
}

fn link_for(token: &ReferenceToken, decl: &Declaration) -> LinkRecord {
    let call_form = format!("{}()", decl.name);
    let label = if token.text == decl.name || token.text == call_form {
        token.text.clone()
    } else {
        format!("{} <{}>", token.text, decl.name)
    };
    LinkRecord {
        from: token.location.clone(),
        text: token.text.clone(),
        target_id: decl.id.clone(),
        target_name: decl.name.clone(),
        target: decl.location.clone(),
        role: LinkRole::for_kind(decl.kind),
        label,
    }
}

fn step_notes(token: &ReferenceToken, steps: &[NarrowingStep]) -> Vec<String> {
    steps
        .iter()
        .filter(|step| step.fell_back())
        .map(|step| match step {
            NarrowingStep::KindFilter { .. } => format!(
                "call syntax ignored: no function is named `{}`",
                token.name
            ),
            NarrowingStep::ArityFilter { arity, .. } => format!(
                "argument count ignored: no overload of `{}` takes {} argument{}",
                token.name,
                arity,
                if *arity == 1 { "" } else { "s" }
            ),
        })
        .collect()
}

/// Suggests spelling out arguments when the candidates are functions that
/// an argument count could tell apart.
fn overload_help(token: &ReferenceToken, candidates: &[&Declaration]) -> Option<String> {
    if matches!(token.hint, CallHint::Arity(_)) {
        return None;
    }
    let mut arities: Vec<usize> = candidates.iter().filter_map(|d| d.arity()).collect();
    if arities.len() != candidates.len() {
        return None;
    }
    arities.sort_unstable();
    arities.dedup();
    if arities.len() < 2 {
        return None;
    }
    let listed: Vec<String> = arities.iter().map(|a| a.to_string()).collect();
    Some(format!(
        "help: overloads of `{}` take {} arguments; write the arguments to select one",
        token.name,
        listed.join(" or ")
    ))
}
