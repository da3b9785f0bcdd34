//! The theory-propagator facade and the contracts of the outer Boolean engine.
pub(crate) mod contexts;
pub(crate) mod propagator;
#[cfg(test)]
pub(crate) mod test_engine;

pub use contexts::AssignmentView;
pub use contexts::PropagateControl;
pub use contexts::PropagateInit;
pub use propagator::SimplexPropagator;
