use docxref::errors::XrefError;
use docxref::index::DeclarationIndex;
use docxref::resolution::{NarrowingStep, ResolutionVerdict, Resolver};
use docxref::types::*;

fn function(name: &str, file: &str, line: u32, args: &str) -> Declaration {
    Declaration::new(name, DeclKind::Function, Location::new(file, line))
        .with_signature(SignatureShape::from_argsstring(args))
}

/// Builds a sealed index holding the `foo.c` fixture: `ambiguous_struct`,
/// the two `referrent` overloads, and `ambiguous_function`.
fn setup_index() -> DeclarationIndex {
    let mut index = DeclarationIndex::new();
    index
        .ingest(vec![
            Declaration::new("ambiguous_struct", DeclKind::Struct, Location::new("foo.c", 5)),
            function("referrent", "foo.c", 10, "(void)"),
            function("referrent", "foo.c", 14, "(int a)"),
            function("ambiguous_function", "foo.c", 19, "(void)"),
        ])
        .expect("failed to ingest fixture");
    index.seal();
    index
}

fn token(text: &str) -> ReferenceToken {
    ReferenceToken::parse(text, Location::new("foo.c", 18)).expect("valid reference text")
}

#[test]
fn test_resolver_requires_sealed_index() {
    let index = DeclarationIndex::new();
    let err = Resolver::new(&index).unwrap_err();
    assert!(matches!(err, XrefError::IndexNotSealed { .. }));
}

#[test]
fn test_call_without_arity_is_ambiguous() {
    let index = setup_index();
    let resolver = Resolver::new(&index).unwrap();

    let resolution = resolver.resolve(&token("referrent()")).unwrap();
    match &resolution.verdict {
        ResolutionVerdict::Ambiguous(candidates) => {
            let lines: Vec<u32> = candidates.iter().map(|d| d.location.line).collect();
            assert_eq!(lines, vec![10, 14]);
            assert_eq!(candidates[0].arity(), Some(0));
            assert_eq!(candidates[1].arity(), Some(1));
        }
        other => panic!("expected Ambiguous, got {:?}", other),
    }
    assert_eq!(
        resolution.steps,
        vec![NarrowingStep::KindFilter {
            before: 2,
            after: 2,
            fell_back: false
        }]
    );
}

#[test]
fn test_arity_hint_selects_overload() {
    let index = setup_index();
    let resolver = Resolver::new(&index).unwrap();

    let resolution = resolver.resolve(&token("referrent(a)")).unwrap();
    let decl = resolution.verdict.unique().expect("should be unique");
    assert_eq!(decl.location, Location::new("foo.c", 14));
    assert_eq!(decl.arity(), Some(1));
    assert!(matches!(
        resolution.steps.last(),
        Some(NarrowingStep::ArityFilter {
            arity: 1,
            before: 2,
            after: 1,
            fell_back: false
        })
    ));
}

#[test]
fn test_void_hint_selects_nullary_overload() {
    let index = setup_index();
    let resolver = Resolver::new(&index).unwrap();

    let resolution = resolver.resolve(&token("referrent(void)")).unwrap();
    let decl = resolution.verdict.unique().expect("should be unique");
    assert_eq!(decl.location, Location::new("foo.c", 10));
    assert_eq!(decl.arity(), Some(0));
    assert!(matches!(
        resolution.steps.last(),
        Some(NarrowingStep::ArityFilter {
            arity: 0,
            before: 2,
            after: 1,
            fell_back: false
        })
    ));
}

#[test]
fn test_distinct_names_are_not_conflated() {
    let index = setup_index();
    let resolver = Resolver::new(&index).unwrap();

    let resolution = resolver.resolve(&token("ambiguous_function()")).unwrap();
    let decl = resolution.verdict.unique().expect("should be unique");
    assert_eq!(decl.name, "ambiguous_function");
    assert_eq!(decl.kind, DeclKind::Function);
    assert!(resolution.steps.is_empty(), "a single candidate needs no filtering");
}

#[test]
fn test_absent_name_is_unresolved() {
    let index = setup_index();
    let resolver = Resolver::new(&index).unwrap();

    let resolution = resolver.resolve(&token("nonexistent()")).unwrap();
    assert_eq!(resolution.verdict, ResolutionVerdict::Unresolved);
    assert!(resolution.verdict.candidates().is_empty());
}

#[test]
fn test_single_candidate_wins_regardless_of_hints() {
    let index = setup_index();
    let resolver = Resolver::new(&index).unwrap();

    for text in ["ambiguous_struct", "ambiguous_struct()", "ambiguous_struct(a, b, c)"] {
        let resolution = resolver.resolve(&token(text)).unwrap();
        let decl = resolution
            .verdict
            .unique()
            .unwrap_or_else(|| panic!("'{}' should resolve uniquely", text));
        assert_eq!(decl.kind, DeclKind::Struct);
    }
}

#[test]
fn test_empty_name_is_invalid() {
    let index = setup_index();
    let resolver = Resolver::new(&index).unwrap();

    let bad = ReferenceToken::new("", CallHint::Call, Location::new("foo.c", 3));
    let err = resolver.resolve(&bad).unwrap_err();
    assert!(matches!(err, XrefError::InvalidReference { .. }));
    assert!(!err.is_batch_fatal());
}

#[test]
fn test_call_syntax_prefers_function_over_struct() {
    let mut index = DeclarationIndex::new();
    index
        .insert(Declaration::new("stat", DeclKind::Struct, Location::new("sys/stat.h", 20)))
        .unwrap();
    index.insert(function("stat", "sys/stat.h", 40, "(const char *path, struct stat *buf)")).unwrap();
    index.seal();
    let resolver = Resolver::new(&index).unwrap();

    let called = resolver.resolve(&token("stat()")).unwrap();
    assert_eq!(called.verdict.unique().map(|d| d.kind), Some(DeclKind::Function));

    let bare = resolver.resolve(&token("stat")).unwrap();
    assert_eq!(bare.verdict.candidates().len(), 2, "a bare name keeps both kinds");
    assert_eq!(bare.verdict.candidates()[0].kind, DeclKind::Struct);
}

#[test]
fn test_call_syntax_falls_back_when_no_function_exists() {
    let mut index = DeclarationIndex::new();
    index
        .insert(Declaration::new("point", DeclKind::Struct, Location::new("geo.h", 3)))
        .unwrap();
    index
        .insert(Declaration::new("point", DeclKind::Typedef, Location::new("geo.h", 9)))
        .unwrap();
    index.seal();
    let resolver = Resolver::new(&index).unwrap();

    let resolution = resolver.resolve(&token("point(x)")).unwrap();
    assert_eq!(resolution.verdict.candidates().len(), 2);
    assert_eq!(
        resolution.steps,
        vec![NarrowingStep::KindFilter {
            before: 2,
            after: 2,
            fell_back: true
        }]
    );
}

#[test]
fn test_unmatched_arity_falls_back_to_all_functions() {
    let index = setup_index();
    let resolver = Resolver::new(&index).unwrap();

    let resolution = resolver.resolve(&token("referrent(a, b)")).unwrap();
    assert_eq!(resolution.verdict.candidates().len(), 2);
    assert!(resolution.steps.iter().any(|s| matches!(
        s,
        NarrowingStep::ArityFilter {
            arity: 2,
            fell_back: true,
            ..
        }
    )));
}

#[test]
fn test_identical_overloads_stay_ambiguous() {
    let mut index = DeclarationIndex::new();
    index.insert(function("twice", "b.c", 7, "(int)")).unwrap();
    index.insert(function("twice", "a.c", 30, "(int)")).unwrap();
    index.insert(function("twice", "a.c", 2, "(int)")).unwrap();
    index.seal();
    let resolver = Resolver::new(&index).unwrap();

    let resolution = resolver.resolve(&token("twice(x)")).unwrap();
    let order: Vec<String> = resolution
        .verdict
        .candidates()
        .iter()
        .map(|d| d.location.to_string())
        .collect();
    assert_eq!(order, vec!["a.c:2", "a.c:30", "b.c:7"]);
}

#[test]
fn test_resolution_is_idempotent() {
    let index = setup_index();
    let resolver = Resolver::new(&index).unwrap();

    for text in ["referrent()", "referrent(a)", "missing", "ambiguous_struct"] {
        let first = resolver.resolve(&token(text)).unwrap();
        let second = resolver.resolve(&token(text)).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }
}

#[test]
fn test_resolve_all_isolates_failures() {
    let index = setup_index();
    let resolver = Resolver::new(&index).unwrap();

    let tokens = vec![
        token("referrent(a)"),
        ReferenceToken::new("", CallHint::Bare, Location::new("foo.c", 1)),
        token("nonexistent"),
    ];
    let results = resolver.resolve_all(&tokens);
    assert_eq!(results.len(), 3);
    assert!(results[0].as_ref().unwrap().verdict.is_unique());
    assert!(results[1].is_err());
    assert_eq!(
        results[2].as_ref().unwrap().verdict,
        ResolutionVerdict::Unresolved
    );
}

#[test]
fn test_parallel_matches_sequential() {
    let index = setup_index();
    let resolver = Resolver::new(&index).unwrap();

    let texts = ["referrent()", "referrent(a)", "ambiguous_function()", "missing", "referrent"];
    let tokens: Vec<ReferenceToken> = texts.iter().cycle().take(200).map(|t| token(t)).collect();

    let sequential: Vec<_> = resolver
        .resolve_all(&tokens)
        .into_iter()
        .map(|r| r.unwrap())
        .collect();
    let parallel: Vec<_> = resolver
        .resolve_all_parallel(&tokens)
        .into_iter()
        .map(|r| r.unwrap())
        .collect();
    assert_eq!(sequential, parallel);
}

#[test]
fn test_resolvers_share_index_across_threads() {
    let index = setup_index();
    let resolver = Resolver::new(&index).unwrap();

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                scope.spawn(move || {
                    resolver
                        .resolve(&token("referrent(a)"))
                        .unwrap()
                        .verdict
                        .unique()
                        .map(|d| d.location.line)
                })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), Some(14));
        }
    });
}
