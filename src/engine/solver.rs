use std::collections::hash_map::Entry;

use num::Signed;
use num::Zero;

use crate::basic_types::ConflictClause;
use crate::basic_types::Inequality;
use crate::basic_types::Literal;
use crate::basic_types::Relation;
use crate::containers::HashMap;
use crate::create_statistics_struct;
use crate::engine::assignments::Assignments;
use crate::engine::assignments::BoundTrailEntry;
use crate::engine::assignments::ReplacedBounds;
use crate::engine::bounds::Bound;
use crate::engine::bounds::BoundId;
use crate::engine::bounds::BoundStore;
use crate::engine::tableau::Tableau;
use crate::engine::variable_names::VariableNames;
use crate::engine::variables::VariableId;
use crate::math::Rational;
use crate::propagation::AssignmentView;
use crate::sorrel_assert_advanced;
use crate::sorrel_assert_eq_simple;
use crate::sorrel_assert_extreme;
use crate::sorrel_assert_simple;
use crate::statistics::LogStatistics;
use crate::statistics::StatisticLogger;

create_statistics_struct!(
    /// Counters of the simplex search.
    SimplexStatistics {
        /// The number of pivot operations performed.
        pivots: u64,
    }
);

/// An incremental simplex solver over exact rationals.
///
/// [`SimplexSolver::prepare`] turns a conjunction of linear inequalities into a sparse tableau
/// with one slack variable per multi-term row and literal-tagged bounds. Asserting a batch of
/// literals activates the attached bounds and repairs the assignment by pivoting until every
/// bound holds (satisfiable) or a row proves the bounds inconsistent, in which case a minimal
/// conflict clause over the asserting literals is available. All state changes above the root
/// level are trailed and undone by [`SimplexSolver::undo`].
#[derive(Clone, Debug, Default)]
pub(crate) struct SimplexSolver {
    tableau: Tableau,
    assignments: Assignments,
    bounds: BoundStore,
    names: VariableNames,
    conflict_clause: ConflictClause,
    statistics: SimplexStatistics,
}

impl SimplexSolver {
    /// Builds the tableau, the slack variables, and the bound store from `inequalities`.
    ///
    /// Returns the unit clauses for constant rows whose relation cannot hold; the caller must
    /// hand them to the outer engine. All variables start at zero with no active bounds, and
    /// every basic variable is queued so the first search validates the initial assignment.
    pub(crate) fn prepare(&mut self, inequalities: &[Inequality]) -> Vec<ConflictClause> {
        self.tableau = Tableau::default();
        self.assignments.clear();
        self.bounds.clear();
        self.names.clear();
        self.conflict_clause.clear();
        self.statistics = SimplexStatistics::default();

        let mut unit_clauses = Vec::new();
        let mut non_basic: Vec<VariableId> = Vec::new();
        let mut basic: Vec<VariableId> = Vec::new();
        let mut columns: HashMap<VariableId, usize> = HashMap::default();

        let mut all_names: Vec<String> = inequalities
            .iter()
            .flat_map(|inequality| inequality.lhs.iter().map(|term| term.variable.clone()))
            .collect();
        all_names.sort();
        all_names.dedup();

        for inequality in inequalities {
            let terms = combine_terms(inequality);

            if terms.is_empty() {
                // A constant row either holds trivially or forbids the literal outright.
                if !inequality
                    .relation
                    .holds(&Rational::zero(), &inequality.rhs)
                {
                    unit_clauses.push(ConflictClause::new(vec![!inequality.literal]));
                }
                continue;
            }

            if terms.len() == 1 {
                let (name, coefficient) = terms.into_iter().next().expect("one term");
                let (variable, _) = self.non_basic_variable(
                    name,
                    &mut non_basic,
                    &mut columns,
                );
                let relation = if coefficient.is_negative() {
                    inequality.relation.inverted()
                } else {
                    inequality.relation
                };
                let _ = self.bounds.insert(Bound {
                    variable,
                    relation,
                    value: &inequality.rhs / coefficient,
                    literal: inequality.literal,
                });
                continue;
            }

            let row = basic.len();
            for (name, coefficient) in terms {
                let (_, column) = self.non_basic_variable(
                    name,
                    &mut non_basic,
                    &mut columns,
                );
                self.tableau.set(row, column, coefficient);
            }
            let slack = self.assignments.add_variable();
            basic.push(slack);
            let _ = self.bounds.insert(Bound {
                variable: slack,
                relation: inequality.relation,
                value: inequality.rhs.clone(),
                literal: inequality.literal,
            });
        }

        self.names.set_sorted_names(all_names);
        let n_basic = basic.len();
        let n_non_basic = non_basic.len();
        sorrel_assert_eq_simple!(self.assignments.n_variables(), n_basic + n_non_basic);
        self.assignments.install_partition(non_basic, basic);
        self.tableau.resize(n_basic, n_non_basic);

        for row in 0..self.assignments.n_basic() {
            let variable = self.assignments.basic(row);
            self.assignments.enqueue(variable);
        }

        log::debug!(
            "prepared {} rows, {} columns, {} bounds",
            self.tableau.n_rows(),
            self.tableau.n_columns(),
            self.bounds.len()
        );
        sorrel_assert_extreme!(self.tableau_equation_holds());

        unit_clauses
    }

    /// Activates every bound attached to the given literals at `level`.
    ///
    /// Returns false as soon as an activation contradicts the opposite active bound of the same
    /// variable; the conflict clause is then available. Crossed non-basic values are shifted onto
    /// the new bound, out-of-bound basic variables are queued for the search.
    pub(crate) fn assert_bounds(
        &mut self,
        view: &dyn AssignmentView,
        level: usize,
        literals: &[Literal],
    ) -> bool {
        self.assignments.open_level(level);

        for &literal in literals {
            for bound_id in self.bounds.bounds_for(literal).to_vec() {
                if !self.activate_bound(view, level, bound_id) {
                    return false;
                }
            }
        }
        true
    }

    /// Repairs the assignment by Bland-rule pivoting until every bound holds.
    ///
    /// Returns false with a conflict clause over the asserting literals when some out-of-bound
    /// basic variable has no pivot partner left in its row.
    pub(crate) fn solve(&mut self, level: usize) -> bool {
        while let Some(variable) = self.assignments.dequeue() {
            // A queued variable may have been pivoted out of the basis or repaired since.
            if !self.assignments.is_basic(variable) {
                continue;
            }
            let row = self.assignments.row_of(variable);

            let value = self.assignments.value(variable);
            let violated = match (self.active_lower(variable), self.active_upper(variable)) {
                (Some(lower), _) if value < &lower.value => {
                    Some((true, lower.value.clone(), lower.literal))
                }
                (_, Some(upper)) if value > &upper.value => {
                    Some((false, upper.value.clone(), upper.literal))
                }
                _ => None,
            };
            let Some((below_lower, target, violated_literal)) = violated else {
                continue;
            };

            match self.select_pivot(row, below_lower, violated_literal) {
                Some(column) => self.pivot(level, row, column, target),
                None => {
                    log::debug!("infeasible at level {level}: {}", self.conflict_clause);
                    return false;
                }
            }
        }

        sorrel_assert_advanced!(self.assignments.slot_bijection_holds());
        sorrel_assert_extreme!(self.tableau_equation_holds());
        sorrel_assert_extreme!(self.non_basic_within_bounds());
        true
    }

    /// Restores the state to the start of the topmost recorded level.
    pub(crate) fn undo(&mut self) {
        self.assignments.backtrack();

        sorrel_assert_advanced!(self.assignments.slot_bijection_holds());
        sorrel_assert_extreme!(self.tableau_equation_holds());
        sorrel_assert_extreme!(self.non_basic_within_bounds());
    }

    /// The current assignment as `(name, value)` pairs over every input name, lexicographically
    /// sorted. Names whose combined coefficient vanished everywhere map to zero.
    pub(crate) fn model(&self) -> Vec<(String, Rational)> {
        self.names
            .sorted_names()
            .iter()
            .map(|name| {
                let value = self
                    .names
                    .get_variable_by_name(name)
                    .map(|variable| self.assignments.value(variable).clone())
                    .unwrap_or_else(Rational::zero);
                (name.clone(), value)
            })
            .collect()
    }

    /// The clause produced by the most recent failed assertion or search.
    pub(crate) fn conflict(&self) -> &ConflictClause {
        &self.conflict_clause
    }

    pub(crate) fn statistics(&self) -> &SimplexStatistics {
        &self.statistics
    }

    /// Every literal that has at least one bound and therefore needs a watch.
    pub(crate) fn watched_literals(&self) -> impl Iterator<Item = Literal> + '_ {
        self.bounds.watched_literals()
    }

    /// Activates one bound, maintaining the trail and repairing or queueing its variable.
    fn activate_bound(
        &mut self,
        view: &dyn AssignmentView,
        level: usize,
        bound_id: BoundId,
    ) -> bool {
        let bound = self.bounds[bound_id].clone();
        let variable = bound.variable;
        let (acts_as_lower, acts_as_upper) = match bound.relation {
            Relation::GreaterEqual => (true, false),
            Relation::LessEqual => (false, true),
            Relation::Equal => (true, true),
        };

        if acts_as_lower {
            if let Some(upper) = self.active_upper(variable) {
                if bound.value > upper.value {
                    self.conflict_clause =
                        ConflictClause::new(vec![!upper.literal, !bound.literal]);
                    return false;
                }
            }
        }
        if acts_as_upper {
            if let Some(lower) = self.active_lower(variable) {
                if bound.value < lower.value {
                    self.conflict_clause =
                        ConflictClause::new(vec![!lower.literal, !bound.literal]);
                    return false;
                }
            }
        }

        // Only a strictly tighter bound replaces the active reference.
        let tightens_lower = acts_as_lower
            && self
                .active_lower(variable)
                .map_or(true, |lower| lower.value < bound.value);
        let tightens_upper = acts_as_upper
            && self
                .active_upper(variable)
                .map_or(true, |upper| upper.value > bound.value);
        if !tightens_lower && !tightens_upper {
            return true;
        }

        let replaced_lower = tightens_lower
            .then(|| self.assignments.replace_lower_bound(variable, bound_id));
        let replaced_upper = tightens_upper
            .then(|| self.assignments.replace_upper_bound(variable, bound_id));

        // Top-level activations are permanent; within a level only the first replacement of a
        // reference established at a lower level must be recorded.
        if level > 0 {
            let record_lower = replaced_lower
                .is_some_and(|previous| self.establishment_level(view, previous) < level);
            let record_upper = replaced_upper
                .is_some_and(|previous| self.establishment_level(view, previous) < level);
            let replaced = match (record_lower, record_upper) {
                (true, true) => Some(ReplacedBounds::Both(
                    replaced_lower.expect("recorded side was replaced"),
                    replaced_upper.expect("recorded side was replaced"),
                )),
                (true, false) => Some(ReplacedBounds::Lower(
                    replaced_lower.expect("recorded side was replaced"),
                )),
                (false, true) => Some(ReplacedBounds::Upper(
                    replaced_upper.expect("recorded side was replaced"),
                )),
                (false, false) => None,
            };
            if let Some(replaced) = replaced {
                self.assignments
                    .record_bound_replacement(BoundTrailEntry { variable, replaced });
            }
        }

        if self.assignments.is_basic(variable) {
            if self.violates_bounds(variable) {
                self.assignments.enqueue(variable);
            }
        } else {
            let value = self.assignments.value(variable);
            let crossed = (tightens_lower && value < &bound.value)
                || (tightens_upper && value > &bound.value);
            if crossed {
                let column = self.assignments.column_of(variable);
                self.update(level, column, bound.value);
            }
        }
        true
    }

    /// Shifts the non-basic variable of `column` to `target` and propagates the delta to every
    /// basic variable along the column, queueing those that fall out of bounds.
    fn update(&mut self, level: usize, column: usize, target: Rational) {
        let variable = self.assignments.non_basic(column);
        let delta = &target - self.assignments.value(variable);

        for (row, coefficient) in self.tableau.column_entries(column) {
            let basic_variable = self.assignments.basic(row);
            let new_value = self.assignments.value(basic_variable) + coefficient * &delta;
            self.assignments.set_value(level, basic_variable, new_value);
            if self.violates_bounds(basic_variable) {
                self.assignments.enqueue(basic_variable);
            }
        }
        self.assignments.set_value(level, variable, target);
    }

    /// Swaps the basic variable of `row` with the non-basic variable of `column`, moving the
    /// basic variable onto `target` and restoring the tableau equation.
    fn pivot(&mut self, level: usize, row: usize, column: usize, target: Rational) {
        let coefficient = self
            .tableau
            .get(row, column)
            .cloned()
            .expect("pivoting requires a non-zero cell");

        let basic_variable = self.assignments.basic(row);
        let non_basic_variable = self.assignments.non_basic(column);
        let delta = (&target - self.assignments.value(basic_variable)) / &coefficient;
        let moved = self.assignments.value(non_basic_variable) + &delta;

        self.assignments.set_value(level, basic_variable, target);
        self.assignments.set_value(level, non_basic_variable, moved);

        for (other_row, other_coefficient) in self.tableau.column_entries(column) {
            if other_row == row {
                continue;
            }
            let other_variable = self.assignments.basic(other_row);
            let new_value = self.assignments.value(other_variable) + other_coefficient * &delta;
            self.assignments.set_value(level, other_variable, new_value);
            if self.violates_bounds(other_variable) {
                self.assignments.enqueue(other_variable);
            }
        }

        self.assignments.swap_basic_non_basic(row, column);
        self.tableau.pivot(row, column);

        // The swapped-in basic variable may violate its own bounds.
        self.assignments.enqueue(non_basic_variable);

        self.statistics.pivots += 1;
        log::trace!("pivot {row}/{column} -> {}", self.statistics.pivots);
        sorrel_assert_advanced!(self.assignments.slot_bijection_holds());
        sorrel_assert_extreme!(self.tableau_equation_holds());
    }

    /// Searches the row for a pivot partner by Bland's rule, preferring the smallest variable
    /// identity among the eligible ones.
    ///
    /// When no partner exists the accumulated conflict clause (the violated bound's literal plus
    /// every blocking bound's literal, negated) is stored and `None` is returned.
    fn select_pivot(
        &mut self,
        row: usize,
        below_lower: bool,
        violated_literal: Literal,
    ) -> Option<usize> {
        let mut clause = ConflictClause::new(vec![!violated_literal]);
        let mut candidate: Option<(VariableId, usize)> = None;

        for (column, coefficient) in self.tableau.row_entries(row) {
            sorrel_assert_simple!(!coefficient.is_zero());
            let variable = self.assignments.non_basic(column);

            // Repairing a too-small basic value through a positive cell means increasing the
            // partner, as does repairing a too-large value through a negative cell.
            let increase = below_lower == coefficient.is_positive();
            let blocking = if increase {
                match self.active_upper(variable) {
                    Some(upper) if self.assignments.value(variable) >= &upper.value => {
                        Some(upper.literal)
                    }
                    _ => None,
                }
            } else {
                match self.active_lower(variable) {
                    Some(lower) if self.assignments.value(variable) <= &lower.value => {
                        Some(lower.literal)
                    }
                    _ => None,
                }
            };

            match blocking {
                Some(literal) => clause.push(!literal),
                None => {
                    let replace = candidate
                        .map_or(true, |(best, _)| variable < best);
                    if replace {
                        candidate = Some((variable, column));
                    }
                }
            }
        }

        match candidate {
            Some((_, column)) => Some(column),
            None => {
                clause.deduplicate();
                self.conflict_clause = clause;
                None
            }
        }
    }

    /// Allocates (or finds) the non-basic variable for a name, assigning the next free column.
    fn non_basic_variable(
        &mut self,
        name: &str,
        non_basic: &mut Vec<VariableId>,
        columns: &mut HashMap<VariableId, usize>,
    ) -> (VariableId, usize) {
        match self.names.get_variable_by_name(name) {
            Some(variable) => (variable, columns[&variable]),
            None => {
                let variable = self.assignments.add_variable();
                let column = non_basic.len();
                non_basic.push(variable);
                self.names.add(name.to_string(), variable);
                let _ = columns.insert(variable, column);
                (variable, column)
            }
        }
    }

    fn active_lower(&self, variable: VariableId) -> Option<&Bound> {
        self.assignments
            .lower_bound(variable)
            .map(|bound| &self.bounds[bound])
    }

    fn active_upper(&self, variable: VariableId) -> Option<&Bound> {
        self.assignments
            .upper_bound(variable)
            .map(|bound| &self.bounds[bound])
    }

    fn violates_bounds(&self, variable: VariableId) -> bool {
        let value = self.assignments.value(variable);
        self.active_lower(variable)
            .is_some_and(|lower| value < &lower.value)
            || self
                .active_upper(variable)
                .is_some_and(|upper| value > &upper.value)
    }

    /// The level at which an active bound reference was established; the initial no-bound state
    /// counts as the root.
    fn establishment_level(&self, view: &dyn AssignmentView, reference: Option<BoundId>) -> usize {
        reference.map_or(0, |bound| view.literal_level(self.bounds[bound].literal))
    }

    /// Whether every basic value equals the linear combination its row states.
    fn tableau_equation_holds(&self) -> bool {
        (0..self.assignments.n_basic()).all(|row| {
            let sum: Rational = self
                .tableau
                .row_entries(row)
                .map(|(column, coefficient)| {
                    coefficient * self.assignments.value(self.assignments.non_basic(column))
                })
                .sum();
            &sum == self.assignments.value(self.assignments.basic(row))
        })
    }

    /// Whether every non-basic variable lies within its active bounds.
    fn non_basic_within_bounds(&self) -> bool {
        (0..self.assignments.n_non_basic())
            .all(|column| !self.violates_bounds(self.assignments.non_basic(column)))
    }

    pub(crate) fn log_statistics(&self, statistic_logger: &StatisticLogger) {
        self.statistics.log_statistics(statistic_logger);
    }
}

/// Combines like terms and drops the ones whose coefficient sums to zero, keeping first-mention
/// order.
fn combine_terms(inequality: &Inequality) -> Vec<(&str, Rational)> {
    let mut order: Vec<&str> = Vec::new();
    let mut combined: HashMap<&str, Rational> = HashMap::default();

    for term in &inequality.lhs {
        if term.coefficient.is_zero() {
            continue;
        }
        match combined.entry(term.variable.as_str()) {
            Entry::Occupied(mut sum) => {
                *sum.get_mut() += &term.coefficient;
            }
            Entry::Vacant(slot) => {
                let _ = slot.insert(term.coefficient.clone());
                order.push(term.variable.as_str());
            }
        }
    }

    order
        .into_iter()
        .filter_map(|name| {
            let sum = combined.remove(name).expect("ordered names are combined");
            (!sum.is_zero()).then_some((name, sum))
        })
        .collect()
}
