use super::{
    compute_weights,
    exclusions::Exclusions,
    explanation::remaining_time,
    specs::{InstanceExplainer, SufficientReasonComputer},
    ElapsedTime, ExplainerKind, Explanation, PreferredReasonMethod, ReasonCount, ReasonKind,
};
use crate::{
    encodings::{extract_core, remove_subsumed_clauses, Cnf, PrimeImplicantCnf},
    sat::{
        solve_with_budget, CountingResult, Literal, MaxSatSolverFactoryFn, MaxSatStatus,
        ModelCounterFactoryFn, SatSolverFactoryFn, SolvingResult,
    },
    trees::{BinaryRepresentation, DecisionTree},
};
use anyhow::{anyhow, Result};
use log::debug;
use num_bigint::BigUint;
use std::{
    collections::BTreeMap,
    time::{Duration, Instant},
};

/// An explainer for the predictions of a classification [DecisionTree].
///
/// The target of the explanations is the class predicted for the current instance.
/// Sufficient reasons are enumerated with a SAT solver, preferred ones are computed with a MaxSAT solver,
/// and reasons are counted with a model counter.
///
/// ```
/// # use xplatree::explainers::{DecisionTreeExplainer, InstanceExplainer, SufficientReasonComputer};
/// # use xplatree::io::ModelReader;
/// let tree = ModelReader::default()
///     .read(&mut "p dt 2\nt\nn 1 1 > 0.5 2 3\nn 2 2 > 0.5 4 5\nl 3 0\nl 4 1\nl 5 0\n".as_bytes())
///     .unwrap()
///     .into_decision_tree()
///     .unwrap();
/// let mut explainer = DecisionTreeExplainer::new(&tree);
/// explainer.set_instance(&[1., 1.]).unwrap();
/// let reasons = explainer.sufficient_reason(Some(1), None).unwrap();
/// assert_eq!(1, reasons.reasons().len());
/// assert_eq!(2, reasons.reasons()[0].len());
/// ```
pub struct DecisionTreeExplainer<'a> {
    tree: &'a DecisionTree,
    instance: Option<Vec<f64>>,
    binaries: Option<BinaryRepresentation>,
    target: Option<u32>,
    exclusions: Exclusions,
    sat_solver_factory: Box<SatSolverFactoryFn>,
    maxsat_solver_factory: Box<MaxSatSolverFactoryFn>,
    model_counter_factory: Box<ModelCounterFactoryFn>,
}

impl<'a> DecisionTreeExplainer<'a> {
    /// Builds a new explainer for the given tree.
    ///
    /// The backends are the ones returned by [default_solver](crate::sat::default_solver),
    /// [default_maxsat_solver](crate::sat::default_maxsat_solver) and [default_model_counter](crate::sat::default_model_counter).
    pub fn new(tree: &'a DecisionTree) -> Self {
        Self::new_with_factories(
            tree,
            Box::new(crate::sat::default_solver),
            Box::new(crate::sat::default_maxsat_solver),
            Box::new(crate::sat::default_model_counter),
        )
    }

    /// Builds a new explainer for the given tree, using the provided backend factories.
    pub fn new_with_factories(
        tree: &'a DecisionTree,
        sat_solver_factory: Box<SatSolverFactoryFn>,
        maxsat_solver_factory: Box<MaxSatSolverFactoryFn>,
        model_counter_factory: Box<ModelCounterFactoryFn>,
    ) -> Self {
        Self {
            tree,
            instance: None,
            binaries: None,
            target: None,
            exclusions: Exclusions::default(),
            sat_solver_factory,
            maxsat_solver_factory,
            model_counter_factory,
        }
    }

    /// Returns the explained tree.
    pub fn tree(&self) -> &DecisionTree {
        self.tree
    }

    /// Returns the class predicted for the current instance, if any.
    pub fn target(&self) -> Option<u32> {
        self.target
    }

    fn state(&self) -> Result<(&BinaryRepresentation, u32)> {
        match (&self.binaries, self.target) {
            (Some(b), Some(t)) => Ok((b, t)),
            _ => Err(anyhow!("no instance set")),
        }
    }

    fn core(&self) -> Result<Cnf> {
        let (binaries, target) = self.state()?;
        Ok(extract_core(&self.tree.to_cnf(target), binaries))
    }

    // the clauses with no excluded literal, sorted by ascending length (stable)
    fn specific_core_clauses(&self, core: Cnf) -> Cnf {
        let excluded = self.excluded_literals();
        let mut clauses = core
            .into_iter()
            .filter(|cl| !cl.iter().any(|l| excluded.contains(l)))
            .collect::<Cnf>();
        clauses.sort_by_key(|cl| cl.len());
        clauses
    }

    fn prime_implicant_cnf(&self) -> Result<PrimeImplicantCnf> {
        let (binaries, target) = self.state()?;
        let pi = PrimeImplicantCnf::new(&self.tree.to_cnf(target), binaries);
        debug!(
            "prime implicant formula: {} necessary literals, {} mapped literals, {} variables, {} clauses",
            pi.necessary().len(),
            pi.n_mapped(),
            pi.n_vars(),
            pi.cnf().len()
        );
        Ok(pi)
    }

    // the unit clauses preventing the excluded literals from being selected
    fn exclusion_clauses(&self, pi: &PrimeImplicantCnf, excluded: &[Literal]) -> Cnf {
        excluded
            .iter()
            .filter_map(|l| pi.from_original_to_new(*l))
            .filter(|l| l.is_positive())
            .map(|l| vec![l.negate()])
            .collect()
    }

    fn excluded_necessary(pi: &PrimeImplicantCnf, excluded: &[Literal]) -> bool {
        excluded.iter().any(|l| pi.necessary().contains(l))
    }

    fn optimal_reasons(
        &self,
        kind: ReasonKind,
        method: PreferredReasonMethod,
        n: Option<usize>,
        time_limit: Option<Duration>,
        weights: Option<&[u64]>,
        features_partition: Option<&[Vec<usize>]>,
    ) -> Result<Explanation> {
        let (binaries, _) = self.state()?;
        let pi = self.prime_implicant_cnf()?;
        let mut literals_per_feature = vec![0; self.tree.n_features()];
        pi.mapped_literals()
            .iter()
            .filter_map(|l| binaries.feature_of(*l))
            .for_each(|f| literals_per_feature[f - 1] += 1);
        let feature_weights = compute_weights(
            method,
            self.tree.n_features(),
            weights,
            features_partition,
            self.tree.feature_importances(),
            &literals_per_feature,
        )?;
        let excluded = self.excluded_literals();
        if Self::excluded_necessary(&pi, &excluded) {
            debug!("an excluded literal is necessary; no {} reason", kind);
            return Ok(Explanation::unavailable(kind));
        }
        if pi.is_empty() {
            return Ok(Explanation::new(
                kind,
                vec![pi.necessary().to_vec()],
                ElapsedTime::zero(),
            ));
        }
        let weight_of = |l: &Literal| {
            binaries
                .feature_of(*l)
                .map(|f| feature_weights[f - 1])
                .unwrap_or(0)
        };
        pi.mapped_literals()
            .iter()
            .map(weight_of)
            .try_fold(0u64, |total, w| total.checked_add(w))
            .ok_or_else(|| anyhow!("the sum of the weights of the literals is too large"))?;
        let mut solver = (self.maxsat_solver_factory)();
        pi.cnf()
            .iter()
            .for_each(|cl| solver.add_hard_clause(cl.clone()));
        self.exclusion_clauses(&pi, &excluded)
            .into_iter()
            .for_each(|cl| solver.add_hard_clause(cl));
        pi.mapped_literals().iter().enumerate().for_each(|(i, l)| {
            solver.add_soft_clause(vec![Literal::from(-((i + 1) as isize))], weight_of(l))
        });
        let mut reasons = vec![];
        let mut best_score = None;
        let mut time_used = Duration::ZERO;
        let mut interrupted = false;
        loop {
            if n.map(|k| reasons.len() >= k).unwrap_or(false)
                || time_limit.map(|t| time_used >= t).unwrap_or(false)
            {
                break;
            }
            let result = solver.solve(remaining_time(time_limit, time_used));
            time_used += result.elapsed();
            debug!("MaxSAT solver returned {:?} (cost {:?})", result.status(), result.cost());
            let status = result.status();
            match status {
                MaxSatStatus::Optimal => {}
                MaxSatStatus::Unsatisfiable => break,
                MaxSatStatus::Satisfiable => interrupted = true,
                MaxSatStatus::Unknown => {
                    interrupted = true;
                    break;
                }
            }
            let model = match result.into_model() {
                Some(m) => m,
                None => break,
            };
            let reason = pi.get_reason_from_model(&model);
            let score = reason.iter().map(weight_of).sum::<u64>();
            match best_score {
                None => best_score = Some(score),
                Some(best) if best != score => break,
                _ => {}
            }
            reasons.push(reason);
            // the best model found before the time limit is kept, but it may not be optimal
            if status == MaxSatStatus::Satisfiable {
                break;
            }
            solver.add_hard_clause(pi.get_blocking_clause(&model));
        }
        Ok(Explanation::new(
            kind,
            reasons,
            ElapsedTime::from_budget(time_used, time_limit, interrupted),
        ))
    }

    fn count_reasons(&self, time_limit: Option<Duration>, per_literal: bool) -> Result<ReasonCount> {
        let pi = self.prime_implicant_cnf()?;
        let excluded = self.excluded_literals();
        if Self::excluded_necessary(&pi, &excluded) {
            return Ok(ReasonCount::new(
                Some(BigUint::from(0u8)),
                BTreeMap::new(),
                ElapsedTime::zero(),
            ));
        }
        if pi.is_empty() {
            let one = BigUint::from(1u8);
            let counts = if per_literal {
                pi.necessary().iter().map(|l| (*l, one.clone())).collect()
            } else {
                BTreeMap::new()
            };
            return Ok(ReasonCount::new(Some(one), counts, ElapsedTime::zero()));
        }
        let mut cnf = pi.cnf().to_vec();
        cnf.append(&mut self.exclusion_clauses(&pi, &excluded));
        let mut counter = (self.model_counter_factory)();
        counter.add_cnf(&cnf, pi.n_vars());
        if per_literal {
            counter.add_count_model_query(pi.n_mapped());
        }
        let start = Instant::now();
        let result = counter.solve(time_limit);
        let time_used = start.elapsed();
        match result {
            CountingResult::Counted(counts) => {
                let global = counts[0].clone();
                debug!("counted {} sufficient reasons", global);
                let mut literal_counts = BTreeMap::new();
                if per_literal {
                    pi.necessary().iter().for_each(|l| {
                        literal_counts.insert(*l, global.clone());
                    });
                    pi.mapped_literals()
                        .iter()
                        .zip(counts.iter().skip(1))
                        .filter(|(_, c)| **c > BigUint::from(0u8))
                        .for_each(|(l, c)| {
                            literal_counts.insert(*l, c.clone());
                        });
                }
                Ok(ReasonCount::new(
                    Some(global),
                    literal_counts,
                    ElapsedTime::Duration(time_used),
                ))
            }
            CountingResult::Timeout => {
                debug!("model counter reached the time limit");
                Ok(ReasonCount::new(None, BTreeMap::new(), ElapsedTime::Timeout))
            }
        }
    }
}

impl InstanceExplainer for DecisionTreeExplainer<'_> {
    fn set_instance(&mut self, instance: &[f64]) -> Result<()> {
        let binaries = self.tree.binary_representation(instance)?;
        let target = self.tree.predict_binaries(&binaries);
        debug!("instance predicted as class {}", target);
        self.instance = Some(instance.to_vec());
        self.binaries = Some(binaries);
        self.target = Some(target);
        Ok(())
    }

    fn instance(&self) -> Option<&[f64]> {
        self.instance.as_deref()
    }

    fn binary_representation(&self) -> Option<&BinaryRepresentation> {
        self.binaries.as_ref()
    }

    fn set_excluded_features(&mut self, features: &[usize]) -> Result<()> {
        self.exclusions.set_features(features, self.tree.n_features())
    }

    fn exclude_literals(&mut self, literals: &[Literal]) {
        self.exclusions.add_literals(literals)
    }

    fn clear_exclusions(&mut self) {
        self.exclusions.clear()
    }

    fn excluded_literals(&self) -> Vec<Literal> {
        self.exclusions.literals(self.binaries.as_ref())
    }

    fn direct_reason(&self) -> Result<Explanation> {
        let (binaries, _) = self.state()?;
        let path = self.tree.root().path_literals(binaries);
        let excluded = self.excluded_literals();
        if path.iter().any(|l| excluded.contains(l)) {
            return Ok(Explanation::unavailable(ReasonKind::Direct));
        }
        let mut reason = path;
        reason.sort_unstable();
        Ok(Explanation::new(
            ReasonKind::Direct,
            vec![reason],
            ElapsedTime::zero(),
        ))
    }

    fn is_reason(&self, reason: &[Literal]) -> Result<bool> {
        let (_, target) = self.state()?;
        Ok(self.tree.is_implicant(reason, target))
    }

    fn kind(&self) -> ExplainerKind {
        ExplainerKind::DecisionTree
    }
}

impl SufficientReasonComputer for DecisionTreeExplainer<'_> {
    fn contrastive_reason(&self, n: Option<usize>) -> Result<Explanation> {
        let mut clauses = self.specific_core_clauses(self.core()?);
        clauses.truncate(n.unwrap_or(usize::MAX));
        Ok(Explanation::new(
            ReasonKind::Contrastive,
            clauses,
            ElapsedTime::zero(),
        ))
    }

    fn subset_minimal_contrastive_reason(&self, n: Option<usize>) -> Result<Explanation> {
        let specific = self.specific_core_clauses(self.core()?);
        let mut clauses = remove_subsumed_clauses(&specific);
        clauses.truncate(n.unwrap_or(usize::MAX));
        Ok(Explanation::new(
            ReasonKind::SubsetMinimalContrastive,
            clauses,
            ElapsedTime::zero(),
        ))
    }

    fn necessary_literals(&self) -> Result<Explanation> {
        let mut literals = self
            .core()?
            .into_iter()
            .filter(|cl| cl.len() == 1)
            .map(|cl| cl[0])
            .collect::<Vec<Literal>>();
        literals.sort_unstable();
        literals.dedup();
        Ok(Explanation::new(
            ReasonKind::Necessary,
            vec![literals],
            ElapsedTime::zero(),
        ))
    }

    fn relevant_literals(&self) -> Result<Explanation> {
        let core = self.core()?;
        let necessary = core
            .iter()
            .filter(|cl| cl.len() == 1)
            .map(|cl| cl[0])
            .collect::<Vec<Literal>>();
        let mut literals = self
            .specific_core_clauses(core)
            .into_iter()
            .filter(|cl| cl.len() > 1)
            .flatten()
            .filter(|l| !necessary.contains(l))
            .collect::<Vec<Literal>>();
        literals.sort_unstable();
        literals.dedup();
        Ok(Explanation::new(
            ReasonKind::Relevant,
            vec![literals],
            ElapsedTime::zero(),
        ))
    }

    fn sufficient_reason(&self, n: Option<usize>, time_limit: Option<Duration>) -> Result<Explanation> {
        let pi = self.prime_implicant_cnf()?;
        let excluded = self.excluded_literals();
        if Self::excluded_necessary(&pi, &excluded) {
            debug!("an excluded literal is necessary; no sufficient reason");
            return Ok(Explanation::unavailable(ReasonKind::Sufficient));
        }
        if pi.is_empty() {
            return Ok(Explanation::new(
                ReasonKind::Sufficient,
                vec![pi.necessary().to_vec()],
                ElapsedTime::zero(),
            ));
        }
        let mut solver = (self.sat_solver_factory)();
        pi.cnf().iter().for_each(|cl| solver.add_clause(cl.clone()));
        self.exclusion_clauses(&pi, &excluded)
            .into_iter()
            .for_each(|cl| solver.add_clause(cl));
        let mut reasons = vec![];
        let mut time_used = Duration::ZERO;
        let mut interrupted = false;
        loop {
            if n.map(|k| reasons.len() >= k).unwrap_or(false)
                || time_limit.map(|t| time_used >= t).unwrap_or(false)
            {
                break;
            }
            let (result, spent) =
                solve_with_budget(solver.as_mut(), remaining_time(time_limit, time_used));
            time_used += spent;
            match result {
                SolvingResult::Satisfiable(model) => {
                    reasons.push(pi.get_reason_from_model(&model));
                    solver.add_clause(pi.get_blocking_clause(&model));
                }
                SolvingResult::Unsatisfiable => break,
                SolvingResult::Unknown => {
                    interrupted = true;
                    break;
                }
            }
        }
        debug!("enumerated {} sufficient reasons", reasons.len());
        Ok(Explanation::new(
            ReasonKind::Sufficient,
            reasons,
            ElapsedTime::from_budget(time_used, time_limit, interrupted),
        ))
    }

    fn preferred_sufficient_reason(
        &self,
        method: PreferredReasonMethod,
        n: Option<usize>,
        time_limit: Option<Duration>,
        weights: Option<&[u64]>,
        features_partition: Option<&[Vec<usize>]>,
    ) -> Result<Explanation> {
        self.optimal_reasons(
            ReasonKind::Preferred,
            method,
            n,
            time_limit,
            weights,
            features_partition,
        )
    }

    fn minimal_sufficient_reason(
        &self,
        n: Option<usize>,
        time_limit: Option<Duration>,
    ) -> Result<Explanation> {
        self.optimal_reasons(
            ReasonKind::Minimal,
            PreferredReasonMethod::Minimal,
            n,
            time_limit,
            None,
            None,
        )
    }

    fn n_sufficient_reasons(&self, time_limit: Option<Duration>) -> Result<ReasonCount> {
        self.count_reasons(time_limit, false)
    }

    fn n_sufficient_reasons_per_attribute(&self, time_limit: Option<Duration>) -> Result<ReasonCount> {
        self.count_reasons(time_limit, true)
    }
}
