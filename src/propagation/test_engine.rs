//! A mock of the outer-engine contracts for tests.

use crate::basic_types::Literal;
use crate::containers::HashMap;
use crate::containers::HashSet;
use crate::propagation::AssignmentView;
use crate::propagation::PropagateControl;
use crate::propagation::PropagateInit;

/// An in-memory stand-in for the outer Boolean engine.
///
/// Tests drive it directly: [`TestEngine::decide`] opens a decision level,
/// [`TestEngine::make_true`] records a literal on the trail, and every clause the propagator
/// inserts is captured in [`TestEngine::added_clauses`].
#[derive(Debug)]
pub(crate) struct TestEngine {
    level: usize,
    literal_levels: HashMap<Literal, usize>,
    root_false: HashSet<Literal>,
    pub(crate) watches: Vec<Literal>,
    pub(crate) added_clauses: Vec<Vec<Literal>>,
    threads: usize,
    accept_clauses: bool,
}

impl Default for TestEngine {
    fn default() -> Self {
        TestEngine {
            level: 0,
            literal_levels: HashMap::default(),
            root_false: HashSet::default(),
            watches: Vec::default(),
            added_clauses: Vec::default(),
            threads: 1,
            accept_clauses: true,
        }
    }
}

impl TestEngine {
    pub(crate) fn with_threads(threads: usize) -> Self {
        TestEngine {
            threads,
            ..Default::default()
        }
    }

    pub(crate) fn refusing_clauses() -> Self {
        TestEngine {
            accept_clauses: false,
            ..Default::default()
        }
    }

    /// Opens the next decision level.
    pub(crate) fn decide(&mut self) -> usize {
        self.level += 1;
        self.level
    }

    /// Backtracks one decision level.
    pub(crate) fn retract(&mut self) {
        assert!(self.level > 0);
        let retracted = self.level;
        self.literal_levels.retain(|_, &mut level| level < retracted);
        self.level -= 1;
    }

    /// Records `literal` as true at the current decision level.
    pub(crate) fn make_true(&mut self, literal: Literal) {
        let _ = self.literal_levels.insert(literal, self.level);
    }

    /// Marks `literal` as false at the top level.
    pub(crate) fn fix_false(&mut self, literal: Literal) {
        let _ = self.root_false.insert(literal);
    }
}

impl AssignmentView for TestEngine {
    fn decision_level(&self) -> usize {
        self.level
    }

    fn literal_level(&self, literal: Literal) -> usize {
        self.literal_levels.get(&literal).copied().unwrap_or(0)
    }
}

impl PropagateInit for TestEngine {
    fn solver_literal(&self, literal: Literal) -> Literal {
        literal
    }

    fn is_fixed_false(&self, literal: Literal) -> bool {
        self.root_false.contains(&literal)
    }

    fn add_watch(&mut self, literal: Literal) {
        self.watches.push(literal);
    }

    fn add_clause(&mut self, clause: &[Literal]) -> bool {
        self.added_clauses.push(clause.to_vec());
        self.accept_clauses
    }

    fn number_of_threads(&self) -> usize {
        self.threads
    }
}

impl PropagateControl for TestEngine {
    fn thread_id(&self) -> usize {
        0
    }

    fn assignment(&self) -> &dyn AssignmentView {
        self
    }

    fn add_clause(&mut self, clause: &[Literal]) -> bool {
        self.added_clauses.push(clause.to_vec());
        self.accept_clauses
    }
}
