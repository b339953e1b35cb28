//! SAT, MaxSAT and model counting interfaces used to compute the reasons.

mod cadical_solver;
pub use cadical_solver::CadicalSolver;

mod component_model_counter;
pub use component_model_counter::ComponentModelCounter;

mod generalized_totalizer;

mod linear_search_maxsat_solver;
pub use linear_search_maxsat_solver::LinearSearchMaxSatSolver;

mod maxsat_solver;
pub use maxsat_solver::default_maxsat_solver;
pub use maxsat_solver::MaxSatSolver;
pub use maxsat_solver::MaxSatSolverFactoryFn;
pub use maxsat_solver::MaxSatSolvingResult;
pub use maxsat_solver::MaxSatStatus;

mod model_counter;
pub use model_counter::default_model_counter;
pub use model_counter::CountingResult;
pub use model_counter::ModelCounter;
pub use model_counter::ModelCounterFactoryFn;

mod sat_solver;
pub(crate) use sat_solver::clause;
pub use sat_solver::default_solver;
pub use sat_solver::solve_with_budget;
pub use sat_solver::Assignment;
pub use sat_solver::Literal;
pub use sat_solver::SatSolver;
pub use sat_solver::SatSolverFactoryFn;
pub use sat_solver::SolvingListener;
pub use sat_solver::SolvingResult;
pub use sat_solver::Variable;
