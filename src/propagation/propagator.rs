use crate::basic_types::ConflictClause;
use crate::basic_types::Inequality;
use crate::basic_types::Literal;
use crate::engine::SimplexSolver;
use crate::engine::SimplexStatistics;
use crate::math::Rational;
use crate::propagation::PropagateControl;
use crate::propagation::PropagateInit;
use crate::sorrel_assert_simple;
use crate::statistics::StatisticLogger;

/// The theory-propagator facade around the simplex solver.
///
/// One independent [`SimplexSolver`] is kept per worker thread; the outer engine guarantees that
/// the calls for a given thread are serialised and never re-entrant. After a false return from
/// [`SimplexPropagator::assert_and_solve`] the conflict clause has been handed to the engine and
/// remains available through [`SimplexPropagator::conflict`] until the engine backtracks.
#[derive(Clone, Debug, Default)]
pub struct SimplexPropagator {
    solvers: Vec<SimplexSolver>,
}

impl SimplexPropagator {
    /// Builds the per-thread solvers from `inequalities`, registering watches for every literal
    /// that carries a bound.
    ///
    /// Inequalities whose literal is already false at the top level are dropped. Returns false
    /// when a trivially violated constant row closes the top level; solving must not start in
    /// that case.
    pub fn prepare<Init: PropagateInit>(
        &mut self,
        init: &mut Init,
        inequalities: &[Inequality],
    ) -> bool {
        let prepared: Vec<Inequality> = inequalities
            .iter()
            .filter_map(|inequality| {
                let literal = init.solver_literal(inequality.literal);
                if init.is_fixed_false(literal) {
                    return None;
                }
                Some(Inequality {
                    literal,
                    lhs: inequality.lhs.clone(),
                    relation: inequality.relation,
                    rhs: inequality.rhs.clone(),
                })
            })
            .collect();

        let mut solver = SimplexSolver::default();
        let unit_clauses = solver.prepare(&prepared);
        for clause in &unit_clauses {
            if !init.add_clause(clause.as_slice()) {
                log::debug!("top-level conflict while preparing: {clause}");
                return false;
            }
        }

        let watched: Vec<Literal> = solver.watched_literals().collect();
        for literal in watched {
            init.add_watch(literal);
        }

        let threads = init.number_of_threads();
        sorrel_assert_simple!(threads > 0);
        self.solvers = vec![solver; threads];
        true
    }

    /// Applies a batch of newly true literals at the engine's current decision level and runs
    /// the simplex search.
    ///
    /// Returns true when the bounds are satisfiable; otherwise the conflict clause is inserted
    /// through `control` and false is returned. The engine is expected to backtrack (calling
    /// [`SimplexPropagator::undo`]) before asserting further literals.
    pub fn assert_and_solve<Control: PropagateControl>(
        &mut self,
        control: &mut Control,
        literals: &[Literal],
    ) -> bool {
        let level = control.assignment().decision_level();
        let solver = &mut self.solvers[control.thread_id()];

        let feasible =
            solver.assert_bounds(control.assignment(), level, literals) && solver.solve(level);
        if !feasible {
            let clause: Vec<Literal> = solver.conflict().as_slice().to_vec();
            let _ = control.add_clause(&clause);
        }
        feasible
    }

    /// Restores the given thread's solver to the state before its most recent decision level.
    pub fn undo(&mut self, thread_id: usize) {
        self.solvers[thread_id].undo();
    }

    /// The satisfying assignment of the given thread, valid between a true
    /// [`SimplexPropagator::assert_and_solve`] and the next [`SimplexPropagator::undo`].
    pub fn model(&self, thread_id: usize) -> Vec<(String, Rational)> {
        self.solvers[thread_id].model()
    }

    /// The most recent conflict clause of the given thread.
    pub fn conflict(&self, thread_id: usize) -> &ConflictClause {
        self.solvers[thread_id].conflict()
    }

    /// The search statistics aggregated over all threads.
    pub fn statistics(&self) -> SimplexStatistics {
        let mut aggregated = SimplexStatistics::default();
        for solver in &self.solvers {
            aggregated.pivots += solver.statistics().pivots;
        }
        aggregated
    }

    pub fn log_statistics(&self) {
        for (thread_id, solver) in self.solvers.iter().enumerate() {
            solver.log_statistics(&StatisticLogger::new(format!("thread{thread_id}_")));
        }
    }
}
