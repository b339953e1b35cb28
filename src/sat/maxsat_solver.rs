use super::{default_solver, Assignment, LinearSearchMaxSatSolver, Literal};
use std::time::Duration;

/// The status returned by a MaxSAT solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaxSatStatus {
    /// The returned model is optimal
    Optimal,
    /// The returned model is the best one found before the time limit was reached
    Satisfiable,
    /// The hard clauses are unsatisfiable
    Unsatisfiable,
    /// The time limit was reached before any model was found
    Unknown,
}

/// The result of a call to a MaxSAT solver.
#[derive(Debug)]
pub struct MaxSatSolvingResult {
    status: MaxSatStatus,
    model: Option<Assignment>,
    cost: Option<u64>,
    elapsed: Duration,
}

impl MaxSatSolvingResult {
    pub(crate) fn new(
        status: MaxSatStatus,
        model: Option<Assignment>,
        cost: Option<u64>,
        elapsed: Duration,
    ) -> Self {
        Self {
            status,
            model,
            cost,
            elapsed,
        }
    }

    /// Returns the status of the search.
    pub fn status(&self) -> MaxSatStatus {
        self.status
    }

    /// Returns the model, if any.
    pub fn model(&self) -> Option<&Assignment> {
        self.model.as_ref()
    }

    /// Consumes this result and returns the model, if any.
    pub fn into_model(self) -> Option<Assignment> {
        self.model
    }

    /// Returns the sum of the weights of the soft clauses falsified by the model, if any.
    pub fn cost(&self) -> Option<u64> {
        self.cost
    }

    /// Returns the time spent in the solver.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
}

/// A trait for weighted partial MaxSAT solvers.
///
/// Hard clauses may be added between two calls to [solve](Self::solve).
/// Each call returns a model that is optimal with respect to the soft clauses under the hard clauses added so far.
/// As a consequence, adding hard clauses between two calls never decreases the cost of the returned models;
/// callers enumerating solutions with blocking clauses rely on this property.
pub trait MaxSatSolver {
    /// Adds a clause that must be satisfied.
    fn add_hard_clause(&mut self, cl: Vec<Literal>);

    /// Adds a clause which falsification costs the given weight.
    fn add_soft_clause(&mut self, cl: Vec<Literal>, weight: u64);

    /// Searches for a model minimizing the cost.
    ///
    /// A time limit set to [Option::None] means no time limit.
    fn solve(&mut self, time_limit: Option<Duration>) -> MaxSatSolvingResult;
}

/// The type of functions building new MaxSAT solvers.
pub type MaxSatSolverFactoryFn = dyn Fn() -> Box<dyn MaxSatSolver>;

/// The default MaxSAT solver (a linear search on top of the default SAT solver).
pub fn default_maxsat_solver() -> Box<dyn MaxSatSolver> {
    Box::new(LinearSearchMaxSatSolver::new(default_solver()))
}
