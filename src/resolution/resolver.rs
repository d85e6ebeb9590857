use rayon::prelude::*;
use serde::Serialize;
use tracing::debug;

use crate::errors::{Result, XrefError};
use crate::index::DeclarationIndex;
use crate::types::{validate_name, DeclKind, Declaration, ReferenceToken};

/// Outcome of matching one reference against the index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", content = "declarations", rename_all = "snake_case")]
pub enum ResolutionVerdict<'a> {
    Unique(&'a Declaration),
    /// Surviving candidates ordered by file path, then line.
    Ambiguous(Vec<&'a Declaration>),
    Unresolved,
}

impl<'a> ResolutionVerdict<'a> {
    pub fn is_unique(&self) -> bool {
        matches!(self, ResolutionVerdict::Unique(_))
    }

    pub fn unique(&self) -> Option<&'a Declaration> {
        match self {
            ResolutionVerdict::Unique(decl) => Some(decl),
            _ => None,
        }
    }

    pub fn candidates(&self) -> &[&'a Declaration] {
        match self {
            ResolutionVerdict::Ambiguous(candidates) => candidates,
            _ => &[],
        }
    }
}

/// One narrowing filter applied while resolving a reference.
///
/// `fell_back` means the filter matched nothing and its input set was kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "filter", rename_all = "snake_case")]
pub enum NarrowingStep {
    KindFilter {
        before: usize,
        after: usize,
        fell_back: bool,
    },
    ArityFilter {
        arity: usize,
        before: usize,
        after: usize,
        fell_back: bool,
    },
}

impl NarrowingStep {
    pub fn fell_back(&self) -> bool {
        match self {
            NarrowingStep::KindFilter { fell_back, .. }
            | NarrowingStep::ArityFilter { fell_back, .. } => *fell_back,
        }
    }
}

/// A verdict together with the filters that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution<'a> {
    pub verdict: ResolutionVerdict<'a>,
    pub steps: Vec<NarrowingStep>,
}

/// Maps reference tokens to declarations of a sealed index.
///
/// Holds no state besides the index, so one resolver can serve any number
/// of threads at once.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    index: &'a DeclarationIndex,
}

impl<'a> Resolver<'a> {
    /// Creates a resolver over `index`, which must already be sealed.
    pub fn new(index: &'a DeclarationIndex) -> Result<Self> {
        if !index.is_sealed() {
            return Err(XrefError::IndexNotSealed {
                message: "seal the index before resolving references".to_string(),
            });
        }
        Ok(Self { index })
    }

    /// Resolves one reference.
    ///
    /// With several same-named candidates the filters run in a fixed order,
    /// stopping once a single candidate is left:
    /// 1. **Kind** -- call syntax keeps only functions, unless there are
    ///    none, in which case every candidate is kept.
    /// 2. **Arity** -- an argument count keeps only functions accepting it,
    ///    unless none does, in which case the input set is kept.
    ///
    /// Whatever survives beyond one candidate is reported as ambiguous; no
    /// candidate is ever preferred by position.
    pub fn resolve(&self, token: &ReferenceToken) -> Result<Resolution<'a>> {
        validate_name(&token.name, &token.location)?;

        let set = self.index.lookup(&token.name);
        let mut steps = Vec::new();

        if set.is_empty() {
            debug!(reference = %token.text, location = %token.location, "unresolved");
            return Ok(Resolution {
                verdict: ResolutionVerdict::Unresolved,
                steps,
            });
        }

        let mut candidates = set.to_vec();

        if candidates.len() > 1 && token.hint.is_call() {
            let callable = set.of_kind(DeclKind::Function);
            let fell_back = callable.is_empty();
            if !fell_back {
                candidates = callable;
            }
            steps.push(NarrowingStep::KindFilter {
                before: set.len(),
                after: candidates.len(),
                fell_back,
            });
        }

        if let Some(arity) = token.hint.arity() {
            if candidates.len() > 1 && candidates.iter().all(|d| d.kind.is_callable()) {
                let before = candidates.len();
                let accepting = set.functions_accepting(arity);
                let fell_back = accepting.is_empty();
                if !fell_back {
                    candidates = accepting;
                }
                steps.push(NarrowingStep::ArityFilter {
                    arity,
                    before,
                    after: candidates.len(),
                    fell_back,
                });
            }
        }

        let verdict = if candidates.len() == 1 {
            ResolutionVerdict::Unique(candidates[0])
        } else {
            candidates.sort_by(|a, b| a.location.cmp(&b.location));
            ResolutionVerdict::Ambiguous(candidates)
        };

        debug!(
            reference = %token.text,
            location = %token.location,
            unique = verdict.is_unique(),
            candidates = verdict.candidates().len(),
            "resolved"
        );

        Ok(Resolution { verdict, steps })
    }

    /// Resolves a batch of references in order. A failure for one token does
    /// not affect the others.
    pub fn resolve_all(&self, tokens: &[ReferenceToken]) -> Vec<Result<Resolution<'a>>> {
        tokens.iter().map(|token| self.resolve(token)).collect()
    }

    /// Like `resolve_all`, spread over the rayon thread pool. Output order
    /// matches input order.
    pub fn resolve_all_parallel(&self, tokens: &[ReferenceToken]) -> Vec<Result<Resolution<'a>>> {
        tokens.par_iter().map(|token| self.resolve(token)).collect()
    }
}
