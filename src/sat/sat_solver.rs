use super::cadical_solver::CadicalSolver;
use std::{
    cmp::Ordering,
    fmt::Display,
    num::{NonZeroIsize, NonZeroUsize},
    time::{Duration, Instant},
};

/// A variable in a SAT solver.
///
/// A variable is represented by a non-null positive integer.
/// It can be obtained through the [From] trait from an integer type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Variable(NonZeroUsize);

macro_rules! impl_var_from {
    ($t: ty) => {
        impl From<$t> for Variable {
            fn from(v: $t) -> Self {
                Self(NonZeroUsize::try_from(v as usize).unwrap())
            }
        }
    };
}
impl_var_from!(usize);
impl_var_from!(u64);
impl_var_from!(u32);

macro_rules! impl_var_from_neg {
    ($t: ty) => {
        impl From<$t> for Variable {
            fn from(v: $t) -> Self {
                if v < 0 {
                    panic!("cannot build a variable from a negative integer")
                }
                Self(NonZeroUsize::try_from(v as usize).unwrap())
            }
        }
    };
}
impl_var_from_neg!(isize);
impl_var_from_neg!(i64);
impl_var_from_neg!(i32);

impl From<Variable> for usize {
    fn from(v: Variable) -> Self {
        v.0.into()
    }
}

impl Variable {
    /// Returns the literal of this variable with the given polarity.
    pub fn literal(self, polarity: bool) -> Literal {
        let l = Literal::from(usize::from(self) as isize);
        if polarity {
            l
        } else {
            l.negate()
        }
    }
}

impl Display for Variable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A literal in a SAT solver.
///
/// A literal is represented by a non-null integer.
/// It can be obtained through the [From] trait from a signed integer type.
///
/// Literals are ordered by variable first, the negative literal of a variable coming before the positive one.
/// Sorting a set of literals thus gives the ascending absolute id order used to normalize reasons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Literal(NonZeroIsize);

impl Literal {
    /// Returns the opposite literal.
    pub fn negate(self) -> Self {
        Self::from(-self.0.get())
    }

    /// Returns the variable of this literal.
    pub fn var(&self) -> Variable {
        Variable(self.0.unsigned_abs())
    }

    /// Returns `true` iff this literal is the positive one of its variable.
    pub fn is_positive(&self) -> bool {
        self.0.get() > 0
    }
}

impl PartialOrd for Literal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Literal {
    fn cmp(&self, other: &Self) -> Ordering {
        self.var()
            .cmp(&other.var())
            .then(self.is_positive().cmp(&other.is_positive()))
    }
}

macro_rules! impl_lit_from {
    ($t: ty) => {
        impl From<$t> for Literal {
            fn from(l: $t) -> Self {
                Self(NonZeroIsize::try_from(l as isize).unwrap())
            }
        }
    };
}
impl_lit_from!(isize);
impl_lit_from!(i64);
impl_lit_from!(i32);

impl From<Literal> for isize {
    fn from(l: Literal) -> Self {
        l.0.into()
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Builds a clause from a list of integers.
macro_rules! clause {
    () => (
        vec![] as Vec<$crate::sat::Literal>
    );
    ($($x:expr),+ $(,)?) => (
        [$($x),+].into_iter().map($crate::sat::Literal::from).collect::<Vec<$crate::sat::Literal>>()
    );
}
pub(crate) use clause;

/// An assignment of a set of variables.
///
/// Inside the set of variables involved in the assignment, some may be unassigned.
/// This is the reason why accessors to assigned value returns an [Option<bool>].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment(Vec<Option<bool>>);

impl Assignment {
    /// Builds an assignment from the values of the variables, the first one being the value of the variable `1`.
    pub fn new(assignment: Vec<Option<bool>>) -> Self {
        Self(assignment)
    }

    /// Returns the value potentially assigned to the variable.
    ///
    /// The result in an [Option].
    /// In case the variable is not assigned, or is out of the scope of the assignment, [Option::None] is returned.
    /// Else, [Option::Some] is returned and contains the assigned value.
    pub fn value_of<T>(&self, v: T) -> Option<bool>
    where
        T: Into<Variable>,
    {
        self.0.get(usize::from(v.into()) - 1).copied().flatten()
    }

    /// Returns `true` iff the literal is assigned to true.
    pub fn satisfies(&self, l: Literal) -> bool {
        self.value_of(l.var()) == Some(l.is_positive())
    }

    /// Returns the number of variables in the scope of this assignment.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` iff no variable is in the scope of this assignment.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn iter(&self) -> AssignmentIterator {
        AssignmentIterator {
            assignment: self,
            next: 0,
        }
    }
}

pub(crate) struct AssignmentIterator<'a> {
    assignment: &'a Assignment,
    next: usize,
}

impl Iterator for AssignmentIterator<'_> {
    type Item = (usize, Option<bool>);

    fn next(&mut self) -> Option<Self::Item> {
        if self.next == self.assignment.0.len() {
            None
        } else {
            self.next += 1;
            Some((self.next, self.assignment.0[self.next - 1]))
        }
    }
}

/// The result of a call to a SAT solver.
#[derive(Debug, PartialEq, Eq)]
pub enum SolvingResult {
    /// The problem is satisfiable; a model is provided
    Satisfiable(Assignment),
    /// The problem is unsatisfiable
    Unsatisfiable,
    /// The solver stopped before it could decide, e.g. because its time limit was reached
    Unknown,
}

impl SolvingResult {
    /// Returns the underlying model if it exists, or [Option::None].
    ///
    /// # Panics
    ///
    /// If the solving result is set [SolvingResult::Unknown], this function panics.
    pub fn unwrap_model(self) -> Option<Assignment> {
        match self {
            SolvingResult::Satisfiable(assignment) => Some(assignment),
            SolvingResult::Unsatisfiable => None,
            SolvingResult::Unknown => {
                panic!(r#"cannot unwrap solving result when the solver returned "Unknown""#)
            }
        }
    }

    /// Returns the underlying model if it exists, or [Option::None].
    ///
    /// Contrary to [unwrap_model](Self::unwrap_model), an unknown result is considered as an absence of model.
    pub fn model(self) -> Option<Assignment> {
        match self {
            SolvingResult::Satisfiable(assignment) => Some(assignment),
            SolvingResult::Unsatisfiable | SolvingResult::Unknown => None,
        }
    }
}

/// A trait for objects that must be warned when a SAT solver is called.
pub trait SolvingListener {
    /// Called when a SAT solver starts a search.
    fn solving_start(&self, n_vars: usize, n_clauses: usize);

    /// Called when a SAT solver ends a search.
    fn solving_end(&self, result: &SolvingResult);
}

/// A trait for SAT solvers.
pub trait SatSolver {
    /// Adds a clause to this solver.
    fn add_clause(&mut self, cl: Vec<Literal>);

    /// Solves the problem formed by the clauses added so far.
    fn solve(&mut self) -> SolvingResult;

    /// Solves the problem formed by the clauses added so far and the provided assumptions.
    fn solve_under_assumptions(&mut self, assumptions: &[Literal]) -> SolvingResult;

    /// Returns the highest variable index involved in this solver.
    fn n_vars(&self) -> usize;

    /// Adds a listener triggered at each call to the solving functions.
    fn add_listener(&mut self, listener: Box<dyn SolvingListener>);

    /// Sets the time limit of the next solving calls.
    ///
    /// When the time limit is reached, the solving functions return [SolvingResult::Unknown].
    /// Setting [Option::None] removes the limit.
    fn set_time_limit(&mut self, time_limit: Option<Duration>);
}

/// The type of functions building new SAT solvers.
pub type SatSolverFactoryFn = dyn Fn() -> Box<dyn SatSolver>;

/// The default SAT solver (Cadical).
pub fn default_solver() -> Box<dyn SatSolver> {
    Box::<CadicalSolver>::default()
}

/// Calls the solver with a time budget and returns the result and the time spent in the solver.
///
/// A budget of [Option::None] means no time limit.
pub fn solve_with_budget(
    solver: &mut dyn SatSolver,
    budget: Option<Duration>,
) -> (SolvingResult, Duration) {
    solver.set_time_limit(budget);
    let start = Instant::now();
    let result = solver.solve();
    (result, start.elapsed())
}
