use super::{
    generalized_totalizer::GeneralizedTotalizer, Assignment, Literal, MaxSatSolver,
    MaxSatSolvingResult, MaxSatStatus, SatSolver, SolvingResult,
};
use log::debug;
use std::time::{Duration, Instant};

struct SoftClause {
    clause: Vec<Literal>,
    weight: u64,
    relaxation: Option<Literal>,
}

/// A MaxSAT solver performing a SAT-UNSAT linear search on top of a SAT solver.
///
/// Each soft clause is extended by a fresh relaxation literal.
/// Once a first model is found, the weighted sum of the relaxation literals is encoded with a generalized totalizer,
/// and the solver is called again with assumptions enforcing a cost strictly lower than the best known one,
/// until the problem becomes unsatisfiable.
///
/// The relaxation variables are allocated at the first call to [solve](MaxSatSolver::solve);
/// clauses added after it must not involve variables that were not used before.
pub struct LinearSearchMaxSatSolver {
    solver: Box<dyn SatSolver>,
    soft_clauses: Vec<SoftClause>,
    max_user_var: usize,
    first_aux_var: Option<usize>,
    next_var: usize,
}

impl LinearSearchMaxSatSolver {
    /// Builds a new MaxSAT solver given the underlying SAT solver.
    pub fn new(solver: Box<dyn SatSolver>) -> Self {
        Self {
            solver,
            soft_clauses: vec![],
            max_user_var: 0,
            first_aux_var: None,
            next_var: 1,
        }
    }

    fn register_user_vars(&mut self, cl: &[Literal]) {
        for l in cl {
            let v = usize::from(l.var());
            if let Some(first) = self.first_aux_var {
                if v >= first {
                    panic!("cannot add clauses involving new variables after the first call to solve")
                }
            }
            self.max_user_var = usize::max(self.max_user_var, v);
        }
    }

    fn encode_relaxations(&mut self) {
        if self.first_aux_var.is_none() {
            self.first_aux_var = Some(self.max_user_var + 1);
            self.next_var = self.max_user_var + 1;
        }
        for soft in self.soft_clauses.iter_mut() {
            if soft.relaxation.is_some() {
                continue;
            }
            let r = Literal::from(self.next_var as isize);
            self.next_var += 1;
            let mut relaxed = soft.clause.clone();
            relaxed.push(r);
            self.solver.add_clause(relaxed);
            soft.relaxation = Some(r);
        }
    }

    fn cost_of(&self, model: &Assignment) -> u64 {
        self.soft_clauses
            .iter()
            .filter(|s| !s.clause.iter().any(|l| model.satisfies(*l)))
            .fold(0, |cost, s| cost.saturating_add(s.weight))
    }
}

fn remaining_time(time_limit: Option<Duration>, start: Instant) -> Option<Duration> {
    time_limit.map(|t| t.saturating_sub(start.elapsed()))
}

impl MaxSatSolver for LinearSearchMaxSatSolver {
    fn add_hard_clause(&mut self, cl: Vec<Literal>) {
        self.register_user_vars(&cl);
        self.solver.add_clause(cl);
    }

    fn add_soft_clause(&mut self, cl: Vec<Literal>, weight: u64) {
        self.register_user_vars(&cl);
        self.soft_clauses.push(SoftClause {
            clause: cl,
            weight,
            relaxation: None,
        });
    }

    fn solve(&mut self, time_limit: Option<Duration>) -> MaxSatSolvingResult {
        let start = Instant::now();
        self.encode_relaxations();
        self.solver.set_time_limit(remaining_time(time_limit, start));
        let mut best = match self.solver.solve() {
            SolvingResult::Satisfiable(model) => model,
            SolvingResult::Unsatisfiable => {
                return MaxSatSolvingResult::new(
                    MaxSatStatus::Unsatisfiable,
                    None,
                    None,
                    start.elapsed(),
                )
            }
            SolvingResult::Unknown => {
                return MaxSatSolvingResult::new(MaxSatStatus::Unknown, None, None, start.elapsed())
            }
        };
        let mut best_cost = self.cost_of(&best);
        debug!("first MaxSAT model has cost {}", best_cost);
        let mut status = MaxSatStatus::Optimal;
        if best_cost > 0 {
            let inputs = self
                .soft_clauses
                .iter()
                .filter_map(|s| s.relaxation.map(|r| (r, s.weight)))
                .collect::<Vec<(Literal, u64)>>();
            let totalizer = GeneralizedTotalizer::encode(
                &inputs,
                best_cost,
                self.solver.as_mut(),
                &mut self.next_var,
            );
            while best_cost > 0 {
                self.solver.set_time_limit(remaining_time(time_limit, start));
                match self
                    .solver
                    .solve_under_assumptions(&totalizer.enforce_ub(best_cost - 1))
                {
                    SolvingResult::Satisfiable(model) => {
                        best_cost = self.cost_of(&model);
                        best = model;
                        debug!("improved MaxSAT model has cost {}", best_cost);
                    }
                    SolvingResult::Unsatisfiable => break,
                    SolvingResult::Unknown => {
                        status = MaxSatStatus::Satisfiable;
                        break;
                    }
                }
            }
        }
        MaxSatSolvingResult::new(status, Some(best), Some(best_cost), start.elapsed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sat::{clause, default_maxsat_solver, default_solver};

    #[test]
    fn test_unit_weights() {
        let mut solver = default_maxsat_solver();
        solver.add_hard_clause(clause![1, 2]);
        solver.add_hard_clause(clause![1, 3]);
        solver.add_soft_clause(clause![-1], 1);
        solver.add_soft_clause(clause![-2], 1);
        solver.add_soft_clause(clause![-3], 1);
        let result = solver.solve(None);
        assert_eq!(MaxSatStatus::Optimal, result.status());
        assert_eq!(Some(1), result.cost());
        let model = result.into_model().unwrap();
        assert_eq!(Some(true), model.value_of(1));
        assert_eq!(Some(false), model.value_of(2));
        assert_eq!(Some(false), model.value_of(3));
    }

    #[test]
    fn test_weights_change_optimum() {
        let mut solver = LinearSearchMaxSatSolver::new(default_solver());
        solver.add_hard_clause(clause![1, 2]);
        solver.add_hard_clause(clause![1, 3]);
        solver.add_soft_clause(clause![-1], 5);
        solver.add_soft_clause(clause![-2], 1);
        solver.add_soft_clause(clause![-3], 1);
        let result = solver.solve(None);
        assert_eq!(Some(2), result.cost());
        let model = result.into_model().unwrap();
        assert_eq!(Some(false), model.value_of(1));
    }

    #[test]
    fn test_unsat_hard_clauses() {
        let mut solver = default_maxsat_solver();
        solver.add_hard_clause(clause![1]);
        solver.add_hard_clause(clause![-1]);
        solver.add_soft_clause(clause![1], 1);
        let result = solver.solve(None);
        assert_eq!(MaxSatStatus::Unsatisfiable, result.status());
        assert!(result.model().is_none());
    }

    #[test]
    fn test_blocking_between_calls() {
        let mut solver = default_maxsat_solver();
        solver.add_hard_clause(clause![1, 2]);
        solver.add_soft_clause(clause![-1], 1);
        solver.add_soft_clause(clause![-2], 1);
        let first = solver.solve(None);
        assert_eq!(Some(1), first.cost());
        let first_model = first.into_model().unwrap();
        let blocking = [1, 2]
            .iter()
            .map(|v| {
                let l = Literal::from(*v);
                if first_model.satisfies(l) {
                    l.negate()
                } else {
                    l
                }
            })
            .collect();
        solver.add_hard_clause(blocking);
        let second = solver.solve(None);
        assert_eq!(Some(1), second.cost());
        assert_ne!(first_model, second.into_model().unwrap());
    }

    #[test]
    fn test_null_cost() {
        let mut solver = default_maxsat_solver();
        solver.add_hard_clause(clause![-1, 2]);
        solver.add_soft_clause(clause![-1], 3);
        let result = solver.solve(None);
        assert_eq!(MaxSatStatus::Optimal, result.status());
        assert_eq!(Some(0), result.cost());
    }

    #[test]
    fn test_huge_weights() {
        let mut solver = default_maxsat_solver();
        solver.add_hard_clause(clause![1, 2]);
        solver.add_soft_clause(clause![-1], u64::MAX);
        solver.add_soft_clause(clause![-2], 1);
        let result = solver.solve(None);
        assert_eq!(MaxSatStatus::Optimal, result.status());
        assert_eq!(Some(1), result.cost());
    }

    #[test]
    #[should_panic]
    fn test_new_var_after_solve() {
        let mut solver = default_maxsat_solver();
        solver.add_hard_clause(clause![1]);
        solver.add_soft_clause(clause![-1], 1);
        solver.solve(None);
        solver.add_hard_clause(clause![2]);
    } // kcov-ignore
}
