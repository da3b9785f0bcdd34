//! The contracts through which the solver talks to the outer Boolean engine.
//!
//! The engine owns the decision stack, the literal trail, watches, and clause storage; the
//! solver only consumes these capabilities. Implementations must serialise all calls for a given
//! worker thread.

use crate::basic_types::Literal;

/// Read access to the engine's current partial assignment.
pub trait AssignmentView {
    /// The current depth of the decision stack.
    fn decision_level(&self) -> usize;

    /// The level at which `literal` became true.
    fn literal_level(&self, literal: Literal) -> usize;
}

/// The capabilities available while the propagator is being initialised.
pub trait PropagateInit {
    /// Canonicalises an input literal to the engine's solver literal.
    fn solver_literal(&self, literal: Literal) -> Literal;

    /// Whether `literal` is already false at the top level.
    fn is_fixed_false(&self, literal: Literal) -> bool;

    /// Requests notification whenever `literal` is assigned.
    fn add_watch(&mut self, literal: Literal);

    /// Adds a clause at the top level. Returns false on an immediate top-level conflict, in
    /// which case solving must not start.
    fn add_clause(&mut self, clause: &[Literal]) -> bool;

    /// The number of worker threads the engine will run.
    fn number_of_threads(&self) -> usize;
}

/// The capabilities available while the engine is searching.
pub trait PropagateControl {
    /// The worker thread this call happens on.
    fn thread_id(&self) -> usize;

    /// The engine's current assignment.
    fn assignment(&self) -> &dyn AssignmentView;

    /// Inserts a conflict clause mid-search.
    fn add_clause(&mut self, clause: &[Literal]) -> bool;
}
