use super::{ComponentModelCounter, Literal};
use num_bigint::BigUint;
use std::time::Duration;

/// The result of a call to a model counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CountingResult {
    /// The counts were computed.
    ///
    /// The first count is the number of models of the formula.
    /// The count at index `i > 0` is the number of models in which the variable `i` is set to true.
    Counted(Vec<BigUint>),
    /// The time limit was reached before the counts were computed
    Timeout,
}

/// A trait for exact model counters.
pub trait ModelCounter {
    /// Adds the clauses of a CNF formula.
    ///
    /// The formula is considered to be defined over the variables `1..=n_vars`,
    /// even if some of them do not appear in the clauses.
    fn add_cnf(&mut self, cnf: &[Vec<Literal>], n_vars: usize);

    /// Requests the per-variable counts for the variables `1..=n_query_vars` in addition to the global count.
    fn add_count_model_query(&mut self, n_query_vars: usize);

    /// Computes the counts.
    ///
    /// A time limit set to [Option::None] means no time limit.
    fn solve(&mut self, time_limit: Option<Duration>) -> CountingResult;
}

/// The type of functions building new model counters.
pub type ModelCounterFactoryFn = dyn Fn() -> Box<dyn ModelCounter>;

/// The default model counter.
pub fn default_model_counter() -> Box<dyn ModelCounter> {
    Box::<ComponentModelCounter>::default()
}
