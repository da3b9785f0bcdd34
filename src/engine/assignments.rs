use std::ops::Index;

use crate::basic_types::Trail;
use crate::containers::KeyedVec;
use crate::engine::bounds::BoundId;
use crate::engine::variables::VariableId;
use crate::engine::variables::VariableState;
use crate::math::Rational;
use crate::sorrel_assert_eq_simple;
use crate::sorrel_assert_simple;

/// A value change recorded for backtracking; values are restored by moving the rational back, not
/// by copying it.
#[derive(Clone, Debug)]
pub(crate) struct ValueTrailEntry {
    pub(crate) variable: VariableId,
    pub(crate) previous_value: Rational,
    pub(crate) previous_level: usize,
}

/// The active bound reference(s) replaced by an activation. An equality bound that replaces both
/// sides at once is undone by a single combined entry.
#[derive(Clone, Copy, Debug)]
pub(crate) enum ReplacedBounds {
    Lower(Option<BoundId>),
    Upper(Option<BoundId>),
    Both(Option<BoundId>, Option<BoundId>),
}

#[derive(Clone, Debug)]
pub(crate) struct BoundTrailEntry {
    pub(crate) variable: VariableId,
    pub(crate) replaced: ReplacedBounds,
}

/// Trail positions at the first activity of a decision level.
#[derive(Clone, Copy, Debug)]
struct LevelMark {
    level: usize,
    bound_trail_length: usize,
    value_trail_length: usize,
}

/// The simplex assignment: per-variable state, the basic/non-basic slot partition, the two
/// backtracking trails, and the conflict queue of (possibly) out-of-bound basic variables.
///
/// Slots `[0, n_non_basic)` hold the non-basic variables, the remaining slots the basic ones. The
/// slot table and the per-variable `slot` field are mutual inverses after every operation.
#[derive(Clone, Debug, Default)]
pub(crate) struct Assignments {
    states: KeyedVec<VariableId, VariableState>,
    slots: Vec<VariableId>,
    n_non_basic: usize,
    value_trail: Trail<ValueTrailEntry>,
    bound_trail: Trail<BoundTrailEntry>,
    level_marks: Vec<LevelMark>,
    conflict_queue: Vec<VariableId>,
}

impl Assignments {
    /// Creates a fresh variable with value zero and no active bounds. Its slot is assigned later
    /// by [`Assignments::install_partition`].
    pub(crate) fn add_variable(&mut self) -> VariableId {
        self.states.push(VariableState::default())
    }

    /// Installs the slot partition once all variables exist: non-basic variables first, then the
    /// basic ones.
    pub(crate) fn install_partition(
        &mut self,
        non_basic: Vec<VariableId>,
        basic: Vec<VariableId>,
    ) {
        self.n_non_basic = non_basic.len();
        self.slots = non_basic;
        self.slots.extend(basic);
        sorrel_assert_eq_simple!(self.slots.len(), self.states.len());

        for (slot, &variable) in self.slots.iter().enumerate() {
            self.states[variable].slot = slot;
        }
    }

    pub(crate) fn n_variables(&self) -> usize {
        self.states.len()
    }

    pub(crate) fn n_non_basic(&self) -> usize {
        self.n_non_basic
    }

    pub(crate) fn n_basic(&self) -> usize {
        self.slots.len() - self.n_non_basic
    }

    /// The variable occupying basic slot `row`.
    pub(crate) fn basic(&self, row: usize) -> VariableId {
        sorrel_assert_simple!(row < self.n_basic(), "basic slot out of range");
        self.slots[self.n_non_basic + row]
    }

    /// The variable occupying non-basic slot `column`.
    pub(crate) fn non_basic(&self, column: usize) -> VariableId {
        sorrel_assert_simple!(column < self.n_non_basic, "non-basic slot out of range");
        self.slots[column]
    }

    pub(crate) fn is_basic(&self, variable: VariableId) -> bool {
        self.states[variable].slot >= self.n_non_basic
    }

    /// The tableau row of a basic variable.
    pub(crate) fn row_of(&self, variable: VariableId) -> usize {
        sorrel_assert_simple!(self.is_basic(variable));
        self.states[variable].slot - self.n_non_basic
    }

    /// The tableau column of a non-basic variable.
    pub(crate) fn column_of(&self, variable: VariableId) -> usize {
        sorrel_assert_simple!(!self.is_basic(variable));
        self.states[variable].slot
    }

    pub(crate) fn value(&self, variable: VariableId) -> &Rational {
        &self.states[variable].value
    }

    /// Assigns `value` to `variable`, recording the previous value on the trail at the first
    /// write per decision level.
    pub(crate) fn set_value(&mut self, level: usize, variable: VariableId, value: Rational) {
        let state = &mut self.states[variable];
        if state.level != level {
            let previous_value = std::mem::replace(&mut state.value, value);
            self.value_trail.push(ValueTrailEntry {
                variable,
                previous_value,
                previous_level: state.level,
            });
            state.level = level;
        } else {
            state.value = value;
        }
    }

    /// Exchanges the basic variable of `row` with the non-basic variable of `column` in the slot
    /// partition. Identities are untouched.
    pub(crate) fn swap_basic_non_basic(&mut self, row: usize, column: usize) {
        sorrel_assert_simple!(row < self.n_basic() && column < self.n_non_basic);

        let basic_slot = self.n_non_basic + row;
        self.slots.swap(basic_slot, column);
        let now_basic = self.slots[basic_slot];
        let now_non_basic = self.slots[column];
        self.states[now_basic].slot = basic_slot;
        self.states[now_non_basic].slot = column;
    }

    pub(crate) fn lower_bound(&self, variable: VariableId) -> Option<BoundId> {
        self.states[variable].lower_bound
    }

    pub(crate) fn upper_bound(&self, variable: VariableId) -> Option<BoundId> {
        self.states[variable].upper_bound
    }

    /// Replaces the active lower bound, returning the previous reference.
    pub(crate) fn replace_lower_bound(
        &mut self,
        variable: VariableId,
        bound: BoundId,
    ) -> Option<BoundId> {
        self.states[variable].lower_bound.replace(bound)
    }

    /// Replaces the active upper bound, returning the previous reference.
    pub(crate) fn replace_upper_bound(
        &mut self,
        variable: VariableId,
        bound: BoundId,
    ) -> Option<BoundId> {
        self.states[variable].upper_bound.replace(bound)
    }

    pub(crate) fn record_bound_replacement(&mut self, entry: BoundTrailEntry) {
        self.bound_trail.push(entry);
    }

    /// Pushes a mark for `level` unless one exists already. Levels arrive in increasing order
    /// between backtracks.
    pub(crate) fn open_level(&mut self, level: usize) {
        if let Some(mark) = self.level_marks.last() {
            sorrel_assert_simple!(mark.level <= level, "levels are opened in increasing order");
            if mark.level == level {
                return;
            }
        }
        self.level_marks.push(LevelMark {
            level,
            bound_trail_length: self.bound_trail.len(),
            value_trail_length: self.value_trail.len(),
        });
    }

    /// Restores the state to the start of the topmost recorded level: bound references by
    /// replacement, values by moving the previous rational back, and the conflict queue by
    /// draining it.
    pub(crate) fn backtrack(&mut self) {
        let mark = self
            .level_marks
            .pop()
            .expect("backtracking requires a recorded level");

        for entry in self.bound_trail.pop_to(mark.bound_trail_length) {
            let state = &mut self.states[entry.variable];
            match entry.replaced {
                ReplacedBounds::Lower(previous) => state.lower_bound = previous,
                ReplacedBounds::Upper(previous) => state.upper_bound = previous,
                ReplacedBounds::Both(previous_lower, previous_upper) => {
                    state.lower_bound = previous_lower;
                    state.upper_bound = previous_upper;
                }
            }
        }

        for entry in self.value_trail.pop_to(mark.value_trail_length) {
            let state = &mut self.states[entry.variable];
            state.value = entry.previous_value;
            state.level = entry.previous_level;
        }

        for variable in self.conflict_queue.drain(..) {
            self.states[variable].queued = false;
        }
    }

    /// Adds a variable to the conflict queue; the `queued` flag deduplicates entries.
    pub(crate) fn enqueue(&mut self, variable: VariableId) {
        let state = &mut self.states[variable];
        if !state.queued {
            state.queued = true;
            self.conflict_queue.push(variable);
        }
    }

    /// Pops the most recently queued variable.
    pub(crate) fn dequeue(&mut self) -> Option<VariableId> {
        let variable = self.conflict_queue.pop()?;
        self.states[variable].queued = false;
        Some(variable)
    }

    #[cfg(test)]
    pub(crate) fn variable_ids(&self) -> impl Iterator<Item = VariableId> {
        self.states.keys()
    }

    pub(crate) fn clear(&mut self) {
        self.states.clear();
        self.slots.clear();
        self.n_non_basic = 0;
        self.value_trail.clear();
        self.bound_trail.clear();
        self.level_marks.clear();
        self.conflict_queue.clear();
    }

    /// Whether the slot table and the per-variable slots are mutual inverses with non-basic
    /// variables in the leading slots.
    pub(crate) fn slot_bijection_holds(&self) -> bool {
        self.slots.len() == self.states.len()
            && self
                .slots
                .iter()
                .enumerate()
                .all(|(slot, &variable)| self.states[variable].slot == slot)
    }
}

impl Index<VariableId> for Assignments {
    type Output = VariableState;

    fn index(&self, index: VariableId) -> &Self::Output {
        &self.states[index]
    }
}
