use num::Zero;

use crate::containers::StorageKey;
use crate::engine::bounds::BoundId;
use crate::math::Rational;

/// The permanent identity of a solver variable.
///
/// Identities double as the tie-breaking order of Bland's rule: among eligible pivot partners the
/// one with the smallest identity is chosen, which guarantees termination of the simplex search.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct VariableId {
    pub(crate) id: u32,
}

impl StorageKey for VariableId {
    fn index(&self) -> usize {
        self.id as usize
    }

    fn create_from_index(index: usize) -> Self {
        VariableId { id: index as u32 }
    }
}

impl std::fmt::Display for VariableId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{}", self.id)
    }
}

impl std::fmt::Debug for VariableId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self}")
    }
}

/// The mutable per-variable state of the simplex assignment.
///
/// `slot` is the position the variable currently occupies in the basic/non-basic partition; the
/// slot table and this field are mutual inverses at all times. `level` is the decision level at
/// which `value` last changed, which lets [`set_value`](super::Assignments::set_value) record at
/// most one trail entry per variable and level.
#[derive(Clone, Debug)]
pub(crate) struct VariableState {
    pub(crate) value: Rational,
    pub(crate) lower_bound: Option<BoundId>,
    pub(crate) upper_bound: Option<BoundId>,
    pub(crate) level: usize,
    pub(crate) queued: bool,
    pub(crate) slot: usize,
}

impl Default for VariableState {
    fn default() -> Self {
        VariableState {
            value: Rational::zero(),
            lower_bound: None,
            upper_bound: None,
            level: 0,
            queued: false,
            slot: usize::MAX,
        }
    }
}
