use std::ops::Index;

use crate::basic_types::Literal;
use crate::basic_types::Relation;
use crate::containers::HashMap;
use crate::containers::KeyedVec;
use crate::containers::StorageKey;
use crate::engine::variables::VariableId;
use crate::math::Rational;

/// The index of a [`Bound`] in the [`BoundStore`] arena.
///
/// Bounds never move once inserted, so an id is a stable reference for the lifetime of the
/// solver; the per-variable active bound fields hold these ids.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct BoundId {
    id: u32,
}

impl StorageKey for BoundId {
    fn index(&self) -> usize {
        self.id as usize
    }

    fn create_from_index(index: usize) -> Self {
        BoundId { id: index as u32 }
    }
}

/// A bound `variable (relation) value`, activated by the truth of `literal`.
///
/// Bounds are immutable once registered. A `Relation::Equal` bound acts as a lower and an upper
/// bound at the same time.
#[derive(Clone, Debug)]
pub(crate) struct Bound {
    pub(crate) variable: VariableId,
    pub(crate) relation: Relation,
    pub(crate) value: Rational,
    pub(crate) literal: Literal,
}

/// The arena of all registered bounds, grouped per asserting literal.
///
/// The preparation pass performs all insertions; the search only reads. Within one literal the
/// bounds are iterated in insertion order, which keeps conflict clauses reproducible.
#[derive(Clone, Debug, Default)]
pub(crate) struct BoundStore {
    bounds: KeyedVec<BoundId, Bound>,
    by_literal: HashMap<Literal, Vec<BoundId>>,
}

impl BoundStore {
    pub(crate) fn insert(&mut self, bound: Bound) -> BoundId {
        let literal = bound.literal;
        let id = self.bounds.push(bound);
        self.by_literal.entry(literal).or_default().push(id);
        id
    }

    /// The bounds activated by `literal`, in insertion order.
    pub(crate) fn bounds_for(&self, literal: Literal) -> &[BoundId] {
        self.by_literal
            .get(&literal)
            .map(|ids| ids.as_slice())
            .unwrap_or(&[])
    }

    /// Every literal with at least one registered bound.
    pub(crate) fn watched_literals(&self) -> impl Iterator<Item = Literal> + '_ {
        self.by_literal.keys().copied()
    }

    pub(crate) fn len(&self) -> usize {
        self.bounds.len()
    }

    pub(crate) fn clear(&mut self) {
        self.bounds.clear();
        self.by_literal.clear();
    }
}

impl Index<BoundId> for BoundStore {
    type Output = Bound;

    fn index(&self, index: BoundId) -> &Self::Output {
        &self.bounds[index]
    }
}
