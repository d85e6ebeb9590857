use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::errors::{Result, XrefError};
use crate::index::overload_set::{OverloadBucket, OverloadSet};
use crate::types::{DeclKind, Declaration, Location};

/// Position of a declaration inside a `DeclarationIndex`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DeclId(usize);

/// A declaration that repeats an earlier one in the same file with the same
/// kind and signature shape. Both are kept as separate candidates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Redeclaration {
    pub name: String,
    pub kind: DeclKind,
    pub original: Location,
    pub duplicate: Location,
}

/// Name-keyed store of declaration records.
///
/// Built during the ingest phase, then sealed. After `seal` every insert
/// fails with `XrefError::IndexSealed`, and the index may be shared freely
/// across resolver threads.
#[derive(Debug, Clone)]
pub struct DeclarationIndex {
    declarations: Vec<Declaration>,
    buckets: HashMap<String, OverloadBucket>,
    redeclarations: Vec<Redeclaration>,
    case_sensitive: bool,
    sealed: bool,
}

impl DeclarationIndex {
    /// Creates an empty, unsealed, case-sensitive index.
    pub fn new() -> Self {
        Self::with_case_sensitivity(true)
    }

    pub fn with_case_sensitivity(case_sensitive: bool) -> Self {
        Self {
            declarations: Vec::new(),
            buckets: HashMap::new(),
            redeclarations: Vec::new(),
            case_sensitive,
            sealed: false,
        }
    }

    /// Adds a declaration to the overload set for its name.
    ///
    /// Identical declarations are not merged. A repeat of an earlier
    /// declaration in the same file is additionally recorded as a
    /// `Redeclaration`.
    pub fn insert(&mut self, decl: Declaration) -> Result<DeclId> {
        if self.sealed {
            return Err(XrefError::IndexSealed {
                name: decl.name,
                location: decl.location,
            });
        }

        let key = self.key_for(&decl.name);
        let pos = self.declarations.len();

        match self.buckets.get_mut(&key) {
            Some(bucket) => {
                let previous = bucket.members.iter().map(|&p| &self.declarations[p]).find(|d| {
                    d.location.file == decl.location.file
                        && d.kind == decl.kind
                        && d.signature == decl.signature
                });
                if let Some(original) = previous {
                    warn!(
                        name = %decl.name,
                        original = %original.location,
                        duplicate = %decl.location,
                        "redeclaration"
                    );
                    self.redeclarations.push(Redeclaration {
                        name: decl.name.clone(),
                        kind: decl.kind,
                        original: original.location.clone(),
                        duplicate: decl.location.clone(),
                    });
                }
                bucket.push(pos, &decl);
            }
            None => {
                self.buckets.insert(key, OverloadBucket::new(pos, &decl));
            }
        }

        debug!(name = %decl.name, kind = %decl.kind, location = %decl.location, "indexed declaration");
        self.declarations.push(decl);
        Ok(DeclId(pos))
    }

    /// Inserts every declaration from a parser's output stream.
    ///
    /// Stops at the first failure; returns the number inserted.
    pub fn ingest<I>(&mut self, decls: I) -> Result<usize>
    where
        I: IntoIterator<Item = Declaration>,
    {
        let mut count = 0;
        for decl in decls {
            self.insert(decl)?;
            count += 1;
        }
        Ok(count)
    }

    /// Folds a separately built index into this one, preserving the other
    /// index's insertion order. Redeclarations are detected afresh.
    ///
    /// Both indexes must be unsealed and share a case policy.
    pub fn merge(&mut self, other: DeclarationIndex) -> Result<usize> {
        if self.sealed || other.sealed {
            return Err(XrefError::IndexMerge {
                message: "both indexes must still be in the ingest phase".to_string(),
            });
        }
        if self.case_sensitive != other.case_sensitive {
            return Err(XrefError::IndexMerge {
                message: format!(
                    "case policy differs (case_sensitive: {} vs {})",
                    self.case_sensitive, other.case_sensitive
                ),
            });
        }
        self.ingest(other.declarations)
    }

    /// Ends the ingest phase. Idempotent.
    pub fn seal(&mut self) {
        if !self.sealed {
            info!(
                declarations = self.declarations.len(),
                names = self.buckets.len(),
                redeclarations = self.redeclarations.len(),
                "declaration index sealed"
            );
        }
        self.sealed = true;
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    pub fn is_case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    /// Returns every declaration named `name`; empty when there are none.
    pub fn lookup(&self, name: &str) -> OverloadSet<'_> {
        let key = self.key_for(name);
        OverloadSet::new(&self.declarations, self.buckets.get(&key))
    }

    pub fn get(&self, id: DeclId) -> Option<&Declaration> {
        self.declarations.get(id.0)
    }

    /// All declarations in insertion order.
    pub fn declarations(&self) -> impl Iterator<Item = &Declaration> {
        self.declarations.iter()
    }

    pub fn redeclarations(&self) -> &[Redeclaration] {
        &self.redeclarations
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    /// Number of distinct overload sets.
    pub fn name_count(&self) -> usize {
        self.buckets.len()
    }

    fn key_for(&self, name: &str) -> String {
        if self.case_sensitive {
            name.to_string()
        } else {
            name.to_lowercase()
        }
    }
}

impl Default for DeclarationIndex {
    fn default() -> Self {
        Self::new()
    }
}
