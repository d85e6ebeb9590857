use docxref::errors::XrefError;
use docxref::index::{DeclarationIndex, Redeclaration};
use docxref::report::*;
use docxref::resolution::Resolver;
use docxref::types::*;

fn function(name: &str, file: &str, line: u32, args: &str) -> Declaration {
    Declaration::new(name, DeclKind::Function, Location::new(file, line))
        .with_signature(SignatureShape::from_argsstring(args))
}

fn setup_index() -> DeclarationIndex {
    let mut index = DeclarationIndex::new();
    index
        .ingest(vec![
            Declaration::new("ambiguous_struct", DeclKind::Struct, Location::new("foo.c", 5)),
            function("referrent", "foo.c", 10, "(void)"),
            function("referrent", "foo.c", 14, "(int a)"),
            function("ambiguous_function", "foo.c", 19, "(void)"),
            Declaration::new("MAX_LEN", DeclKind::Macro, Location::new("foo.h", 2)),
        ])
        .expect("failed to ingest fixture");
    index.seal();
    index
}

fn report_for(index: &DeclarationIndex, text: &str) -> ReportEntry {
    let resolver = Resolver::new(index).unwrap();
    let token = ReferenceToken::parse(text, Location::new("foo.c", 18)).unwrap();
    let resolution = resolver.resolve(&token).unwrap();
    report_resolution(&token, &resolution)
}

#[test]
fn test_unique_produces_link_not_diagnostic() {
    let index = setup_index();
    let ReportEntry::Link(link) = report_for(&index, "ambiguous_function()") else {
        panic!("expected a link");
    };
    assert_eq!(link.from, Location::new("foo.c", 18));
    assert_eq!(link.target, Location::new("foo.c", 19));
    assert_eq!(link.role, LinkRole::Func);
    assert_eq!(link.label, "ambiguous_function()");
    assert_eq!(link.to_markup(), ":c:func:`ambiguous_function()`");
    assert_eq!(
        link.target_id,
        generate_decl_id("foo.c", &DeclKind::Function, "ambiguous_function", 19)
    );
}

#[test]
fn test_link_label_names_target_when_text_differs() {
    let index = setup_index();
    let ReportEntry::Link(link) = report_for(&index, "referrent(a)") else {
        panic!("expected a link");
    };
    assert_eq!(link.label, "referrent(a) <referrent>");
    assert_eq!(link.target.line, 14);
}

#[test]
fn test_link_role_follows_kind() {
    let index = setup_index();
    let ReportEntry::Link(link) = report_for(&index, "MAX_LEN") else {
        panic!("expected a link");
    };
    assert_eq!(link.role, LinkRole::Macro);
    assert_eq!(link.to_markup(), ":c:macro:`MAX_LEN`");
    assert_eq!(LinkRole::for_kind(DeclKind::Typedef).as_str(), "type");
}

#[test]
fn test_ambiguous_lists_candidates_in_order() {
    let index = setup_index();
    let ReportEntry::Diagnostic(diag) = report_for(&index, "referrent()") else {
        panic!("expected a diagnostic");
    };
    assert_eq!(diag.severity, Severity::Warning);
    assert_eq!(diag.code, DiagnosticCode::Ambiguous);
    assert_eq!(diag.location, Location::new("foo.c", 18));
    assert_eq!(
        diag.candidates,
        vec![Location::new("foo.c", 10), Location::new("foo.c", 14)]
    );
    assert!(diag.message.contains("`referrent()`"));
    assert!(diag.notes[0].contains("function referrent(void) at foo.c:10"));
    assert!(diag.notes[1].contains("function referrent(int a) at foo.c:14"));
    assert!(diag.notes.iter().any(|n| n.starts_with("help:") && n.contains("0 or 1")));
}

#[test]
fn test_fallback_is_explained() {
    let index = setup_index();
    let ReportEntry::Diagnostic(diag) = report_for(&index, "referrent(a, b)") else {
        panic!("expected a diagnostic");
    };
    assert!(diag
        .notes
        .iter()
        .any(|n| n.contains("no overload of `referrent` takes 2 arguments")));
    assert!(!diag.notes.iter().any(|n| n.starts_with("help:")));
}

#[test]
fn test_unresolved_is_warning() {
    let index = setup_index();
    let ReportEntry::Diagnostic(diag) = report_for(&index, "nonexistent") else {
        panic!("expected a diagnostic");
    };
    assert_eq!(diag.severity, Severity::Warning);
    assert_eq!(diag.code, DiagnosticCode::Unresolved);
    assert!(diag.candidates.is_empty());
}

#[test]
fn test_invalid_reference_becomes_error_diagnostic() {
    let err = XrefError::InvalidReference {
        message: "reference name is empty".to_string(),
        location: Location::new("foo.c", 3),
    };
    let diag = report_error("()", &err).expect("per-token error should be reported");
    assert_eq!(diag.severity, Severity::Error);
    assert_eq!(diag.code, DiagnosticCode::InvalidReference);
    assert_eq!(diag.location, Location::new("foo.c", 3));
}

#[test]
fn test_structural_faults_are_not_diagnostics() {
    let err = XrefError::IndexSealed {
        name: "late".to_string(),
        location: Location::new("late.c", 1),
    };
    assert!(report_error("late", &err).is_none());
}

#[test]
fn test_redeclaration_diagnostic() {
    let diag = report_redeclaration(&Redeclaration {
        name: "dup".to_string(),
        kind: DeclKind::Function,
        original: Location::new("a.c", 3),
        duplicate: Location::new("a.c", 40),
    });
    assert_eq!(diag.code, DiagnosticCode::Redeclared);
    assert_eq!(diag.severity, Severity::Warning);
    assert_eq!(diag.location, Location::new("a.c", 40));
    assert!(diag.message.contains("first declared at a.c:3"));
}

#[test]
fn test_batch_report_counts() {
    let index = setup_index();
    let mut report = BatchReport::default();
    for text in ["referrent(a)", "referrent()", "missing", "MAX_LEN"] {
        report.push(report_for(&index, text));
    }
    assert_eq!(report.stats.references, 4);
    assert_eq!(report.stats.linked, 2);
    assert_eq!(report.stats.ambiguous, 1);
    assert_eq!(report.stats.unresolved, 1);
    assert_eq!(report.warning_count(), 2);
    assert_eq!(report.error_count(), 0);
}

#[test]
fn test_diagnostics_are_byte_identical_across_runs() {
    let index = setup_index();
    let first = format_report_as_json(&{
        let mut r = BatchReport::default();
        r.push(report_for(&index, "referrent()"));
        r
    })
    .unwrap();
    let second = format_report_as_json(&{
        let mut r = BatchReport::default();
        r.push(report_for(&index, "referrent()"));
        r
    })
    .unwrap();
    assert_eq!(first, second);
}
