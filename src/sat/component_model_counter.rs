use super::{CountingResult, Literal, ModelCounter};
use log::debug;
use num_bigint::BigUint;
use std::{
    collections::{BTreeSet, HashMap},
    time::{Duration, Instant},
};

type Clauses = Vec<Vec<isize>>;

/// An exact model counter based on a DPLL search with component decomposition and caching.
///
/// After unit propagation, the remaining clauses are split into connected components (clauses sharing variables);
/// the count of the formula is the product of the counts of the components,
/// multiplied by two for each variable that does not appear any more.
/// The count of a component is the sum of the counts of its two branches on its most frequent variable.
/// The counts of the components are cached, so that identical subproblems are counted once.
#[derive(Default)]
pub struct ComponentModelCounter {
    clauses: Clauses,
    n_vars: usize,
    n_query_vars: usize,
}

impl ModelCounter for ComponentModelCounter {
    fn add_cnf(&mut self, cnf: &[Vec<Literal>], n_vars: usize) {
        for cl in cnf {
            let cl = cl.iter().map(|l| isize::from(*l)).collect::<Vec<isize>>();
            self.n_vars = usize::max(
                self.n_vars,
                cl.iter().map(|l| l.unsigned_abs()).max().unwrap_or(0),
            );
            self.clauses.push(cl);
        }
        self.n_vars = usize::max(self.n_vars, n_vars);
    }

    fn add_count_model_query(&mut self, n_query_vars: usize) {
        self.n_query_vars = n_query_vars;
    }

    fn solve(&mut self, time_limit: Option<Duration>) -> CountingResult {
        let mut search = CountingSearch {
            deadline: time_limit.map(|t| Instant::now() + t),
            cache: HashMap::new(),
        };
        let all_vars = (1..=self.n_vars).collect::<BTreeSet<usize>>();
        let mut counts = Vec::with_capacity(self.n_query_vars + 1);
        match search.count(self.clauses.clone(), &all_vars) {
            Some(c) => counts.push(c),
            None => return CountingResult::Timeout,
        }
        for v in 1..=self.n_query_vars {
            let mut clauses = self.clauses.clone();
            clauses.push(vec![v as isize]);
            match search.count(clauses, &all_vars) {
                Some(c) => counts.push(c),
                None => return CountingResult::Timeout,
            }
        }
        debug!(
            "counted models over {} variables ({} cached components)",
            self.n_vars,
            search.cache.len()
        );
        CountingResult::Counted(counts)
    }
}

struct CountingSearch {
    deadline: Option<Instant>,
    cache: HashMap<Clauses, BigUint>,
}

impl CountingSearch {
    // counts the models of the clauses over `vars`, which must contain the variables of the clauses
    fn count(&mut self, clauses: Clauses, vars: &BTreeSet<usize>) -> Option<BigUint> {
        if self.deadline.map(|d| Instant::now() >= d).unwrap_or(false) {
            return None;
        }
        let (clauses, assigned) = match propagate(clauses) {
            Some(p) => p,
            None => return Some(BigUint::default()),
        };
        let occurring = occurring_vars(&clauses);
        let n_free = vars
            .iter()
            .filter(|v| !assigned.contains(v) && !occurring.contains(v))
            .count();
        let mut total = BigUint::from(1u8) << n_free;
        for component in split_components(clauses) {
            let component_count = self.count_component(component)?;
            if component_count == BigUint::default() {
                return Some(component_count);
            }
            total *= component_count;
        }
        Some(total)
    }

    fn count_component(&mut self, mut clauses: Clauses) -> Option<BigUint> {
        clauses.iter_mut().for_each(|c| c.sort_unstable());
        clauses.sort_unstable();
        if let Some(c) = self.cache.get(&clauses) {
            return Some(c.clone());
        }
        let mut occurrences: HashMap<usize, usize> = HashMap::new();
        clauses
            .iter()
            .flatten()
            .for_each(|l| *occurrences.entry(l.unsigned_abs()).or_default() += 1);
        let branching = occurrences
            .iter()
            .max_by_key(|(v, n)| (**n, usize::MAX - **v))
            .map(|(v, _)| *v)
            .unwrap_or_default();
        let rest = occurrences
            .keys()
            .copied()
            .filter(|v| *v != branching)
            .collect::<BTreeSet<usize>>();
        let positive = self.count(condition(&clauses, branching as isize), &rest)?;
        let negative = self.count(condition(&clauses, -(branching as isize)), &rest)?;
        let result = positive + negative;
        self.cache.insert(clauses, result.clone());
        Some(result)
    }
}

fn occurring_vars(clauses: &[Vec<isize>]) -> BTreeSet<usize> {
    clauses.iter().flatten().map(|l| l.unsigned_abs()).collect()
}

fn condition(clauses: &[Vec<isize>], l: isize) -> Clauses {
    clauses
        .iter()
        .filter(|c| !c.contains(&l))
        .map(|c| c.iter().copied().filter(|x| *x != -l).collect())
        .collect()
}

// applies unit propagation; returns None in case of conflict
fn propagate(mut clauses: Clauses) -> Option<(Clauses, BTreeSet<usize>)> {
    let mut assigned = BTreeSet::new();
    loop {
        if clauses.iter().any(|c| c.is_empty()) {
            return None;
        }
        match clauses.iter().find(|c| c.len() == 1).map(|c| c[0]) {
            Some(l) => {
                assigned.insert(l.unsigned_abs());
                clauses = condition(&clauses, l);
            }
            None => return Some((clauses, assigned)),
        }
    }
}

fn split_components(clauses: Clauses) -> Vec<Clauses> {
    let mut parents: HashMap<usize, usize> = HashMap::new();
    fn find(parents: &mut HashMap<usize, usize>, v: usize) -> usize {
        let p = *parents.entry(v).or_insert(v);
        if p == v {
            return v;
        }
        let root = find(parents, p);
        parents.insert(v, root);
        root
    }
    for cl in clauses.iter() {
        let first = find(&mut parents, cl[0].unsigned_abs());
        for l in cl.iter().skip(1) {
            let other = find(&mut parents, l.unsigned_abs());
            if other != first {
                parents.insert(other, first);
            }
        }
    }
    let mut components: Vec<Clauses> = vec![];
    let mut component_of_root: HashMap<usize, usize> = HashMap::new();
    for cl in clauses {
        let root = find(&mut parents, cl[0].unsigned_abs());
        let index = *component_of_root.entry(root).or_insert_with(|| {
            components.push(vec![]);
            components.len() - 1
        });
        components[index].push(cl);
    }
    components
}
