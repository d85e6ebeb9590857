use std::collections::BTreeMap;

use crate::types::{DeclKind, Declaration};

/// Storage for every declaration sharing one name key.
///
/// Members are positions in the owning index's declaration list, kept in
/// insertion order. Only created once the first member arrives, so it is
/// never empty.
#[derive(Debug, Clone)]
pub(crate) struct OverloadBucket {
    pub(crate) members: Vec<usize>,
    pub(crate) by_kind: BTreeMap<DeclKind, Vec<usize>>,
    /// Function members keyed by fixed arity.
    pub(crate) by_arity: BTreeMap<usize, Vec<usize>>,
    /// Function members that take a variable argument tail.
    pub(crate) variadic: Vec<usize>,
}

impl OverloadBucket {
    pub(crate) fn new(first: usize, decl: &Declaration) -> Self {
        let mut bucket = Self {
            members: Vec::new(),
            by_kind: BTreeMap::new(),
            by_arity: BTreeMap::new(),
            variadic: Vec::new(),
        };
        bucket.push(first, decl);
        bucket
    }

    pub(crate) fn push(&mut self, pos: usize, decl: &Declaration) {
        self.members.push(pos);
        self.by_kind.entry(decl.kind).or_default().push(pos);
        if let Some(arity) = decl.arity() {
            self.by_arity.entry(arity).or_default().push(pos);
            if decl.signature.as_ref().is_some_and(|s| s.variadic) {
                self.variadic.push(pos);
            }
        }
    }
}

/// Read-only view of all declarations sharing a name.
///
/// A lookup that matches nothing yields an empty set rather than an error.
#[derive(Debug, Clone, Copy)]
pub struct OverloadSet<'a> {
    declarations: &'a [Declaration],
    bucket: Option<&'a OverloadBucket>,
}

impl<'a> OverloadSet<'a> {
    pub(crate) fn new(declarations: &'a [Declaration], bucket: Option<&'a OverloadBucket>) -> Self {
        Self {
            declarations,
            bucket,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bucket.is_none()
    }

    pub fn len(&self) -> usize {
        self.bucket.map_or(0, |b| b.members.len())
    }

    /// Members in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &'a Declaration> + 'a {
        let declarations = self.declarations;
        self.bucket
            .into_iter()
            .flat_map(|b| b.members.iter())
            .map(move |&pos| &declarations[pos])
    }

    pub fn to_vec(&self) -> Vec<&'a Declaration> {
        self.iter().collect()
    }

    /// Distinct kinds present, in `DeclKind` order.
    pub fn kinds(&self) -> Vec<DeclKind> {
        self.bucket
            .map(|b| b.by_kind.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Members of one kind, in insertion order.
    pub fn of_kind(&self, kind: DeclKind) -> Vec<&'a Declaration> {
        self.resolve_positions(self.bucket.and_then(|b| b.by_kind.get(&kind)))
    }

    /// Function members that accept `count` arguments, in insertion order.
    pub fn functions_accepting(&self, count: usize) -> Vec<&'a Declaration> {
        let Some(bucket) = self.bucket else {
            return Vec::new();
        };
        let mut positions: Vec<usize> = bucket.by_arity.get(&count).cloned().unwrap_or_default();
        positions.extend(
            bucket
                .variadic
                .iter()
                .copied()
                .filter(|&pos| self.declarations[pos].accepts_arity(count)),
        );
        positions.sort_unstable();
        positions.dedup();
        positions.into_iter().map(|pos| &self.declarations[pos]).collect()
    }

    /// Fixed arities of the function members, ascending.
    pub fn arities(&self) -> Vec<usize> {
        self.bucket
            .map(|b| b.by_arity.keys().copied().collect())
            .unwrap_or_default()
    }

    fn resolve_positions(&self, positions: Option<&Vec<usize>>) -> Vec<&'a Declaration> {
        positions
            .map(|p| p.iter().map(|&pos| &self.declarations[pos]).collect())
            .unwrap_or_default()
    }
}
