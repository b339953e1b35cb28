use super::{extract_core, Clause, Cnf};
use crate::{
    sat::{Assignment, Literal, Variable},
    trees::BinaryRepresentation,
};

/// A formula which models are the sufficient reasons of an instance.
///
/// The formula is built from the CNF of a tree (see [DecisionTree::to_cnf](crate::trees::DecisionTree::to_cnf))
/// restricted to the literals of the instance.
/// A set of instance literals is a sufficient reason iff it intersects every clause of this core and is subset-minimal.
///
/// The literals of unit clauses belong to every reason; they are stored apart as the necessary literals,
/// and the clauses they satisfy are removed.
/// The other literals of the remaining clauses are relabeled to the variables `1..=n_mapped`,
/// a positive value meaning the literal belongs to the reason.
/// Minimality is encoded with auxiliary variables, numbered from `n_mapped+1`:
/// for each mapped literal `x` and each clause `C` containing it, `y(x,C)` holds iff no other literal of `C` is selected,
/// and a selected `x` requires one of its `y(x,C)` to hold.
/// Auxiliary variables are fully determined by the mapped ones, so models and reasons are in one-to-one correspondence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimeImplicantCnf {
    necessary: Vec<Literal>,
    cnf: Cnf,
    original_to_new: Vec<Option<usize>>,
    new_to_original: Vec<Literal>,
    n_vars: usize,
}

impl PrimeImplicantCnf {
    /// Builds the prime implicant formula from the CNF of a tree and the binary representation of an instance.
    pub fn new(cnf: &[Clause], binaries: &BinaryRepresentation) -> Self {
        let core = extract_core(cnf, binaries);
        let mut necessary = core
            .iter()
            .filter(|cl| cl.len() == 1)
            .map(|cl| cl[0])
            .collect::<Vec<Literal>>();
        necessary.sort_unstable();
        necessary.dedup();
        let remaining = core
            .into_iter()
            .filter(|cl| !cl.iter().any(|l| necessary.contains(l)))
            .collect::<Cnf>();
        let mut new_to_original = remaining.iter().flatten().copied().collect::<Vec<Literal>>();
        new_to_original.sort_unstable();
        new_to_original.dedup();
        let mut original_to_new = vec![None; binaries.len()];
        for (i, l) in new_to_original.iter().enumerate() {
            original_to_new[usize::from(l.var()) - 1] = Some(i + 1);
        }
        let mut result = Self {
            necessary,
            cnf: vec![],
            original_to_new,
            new_to_original,
            n_vars: 0,
        };
        result.encode(remaining);
        result
    }

    fn encode(&mut self, remaining: Cnf) {
        let n_mapped = self.n_mapped();
        let mut next_aux_var = n_mapped + 1;
        let mut justifications = vec![vec![]; n_mapped];
        let mapped_clauses = remaining
            .iter()
            .map(|cl| {
                cl.iter()
                    .filter_map(|l| self.from_original_to_new(*l))
                    .collect::<Clause>()
            })
            .collect::<Cnf>();
        let mut minimality_clauses = vec![];
        for cl in mapped_clauses.iter().filter(|cl| cl.len() > 1) {
            for x in cl.iter() {
                let y = Literal::from(next_aux_var as isize);
                next_aux_var += 1;
                justifications[usize::from(x.var()) - 1].push(y);
                let mut y_or_others = vec![y];
                for z in cl.iter().filter(|z| *z != x) {
                    minimality_clauses.push(vec![y.negate(), z.negate()]);
                    y_or_others.push(*z);
                }
                minimality_clauses.push(y_or_others);
            }
        }
        for (i, ys) in justifications.into_iter().enumerate() {
            let mut cl = vec![Literal::from(-((i + 1) as isize))];
            cl.extend(ys);
            minimality_clauses.push(cl);
        }
        self.n_vars = next_aux_var - 1;
        self.cnf = mapped_clauses;
        self.cnf.append(&mut minimality_clauses);
    }

    /// Returns the literals that belong to every reason, sorted.
    pub fn necessary(&self) -> &[Literal] {
        &self.necessary
    }

    /// Returns the clauses of the formula.
    pub fn cnf(&self) -> &[Clause] {
        &self.cnf
    }

    /// Returns `true` iff the formula has no clause, meaning the necessary literals form the only reason.
    pub fn is_empty(&self) -> bool {
        self.cnf.is_empty()
    }

    /// Returns the number of instance literals relabeled in the formula.
    pub fn n_mapped(&self) -> usize {
        self.new_to_original.len()
    }

    /// Returns the number of variables of the formula, auxiliary ones included.
    pub fn n_vars(&self) -> usize {
        self.n_vars
    }

    /// Returns the original literals of the relabeled variables, the one at index `i` being associated with `i+1`.
    pub fn mapped_literals(&self) -> &[Literal] {
        &self.new_to_original
    }

    /// Translates an original literal into the literal of the formula.
    ///
    /// Returns [Option::None] for the literals which are not relabeled, like the necessary ones.
    pub fn from_original_to_new(&self, l: Literal) -> Option<Literal> {
        let new = self
            .original_to_new
            .get(usize::from(l.var()) - 1)
            .copied()
            .flatten()?;
        let new_lit = Literal::from(new as isize);
        if self.new_to_original[new - 1] == l {
            Some(new_lit)
        } else {
            Some(new_lit.negate())
        }
    }

    /// Translates a literal of the formula into the original literal.
    ///
    /// Returns [Option::None] for auxiliary variables.
    pub fn from_new_to_original(&self, l: Literal) -> Option<Literal> {
        let original = *self.new_to_original.get(usize::from(l.var()) - 1)?;
        if l.is_positive() {
            Some(original)
        } else {
            Some(original.negate())
        }
    }

    /// Returns the reason associated with a model, sorted.
    pub fn get_reason_from_model(&self, model: &Assignment) -> Vec<Literal> {
        let mut reason = self
            .new_to_original
            .iter()
            .enumerate()
            .filter(|(i, _)| model.value_of(Variable::from(i + 1)) == Some(true))
            .map(|(_, l)| *l)
            .chain(self.necessary.iter().copied())
            .collect::<Vec<Literal>>();
        reason.sort_unstable();
        reason
    }

    /// Returns the clause forbidding the reason associated with a model.
    pub fn get_blocking_clause(&self, model: &Assignment) -> Clause {
        (1..=self.n_mapped())
            .map(|v| {
                let l = Literal::from(v as isize);
                if model.satisfies(l) {
                    l.negate()
                } else {
                    l
                }
            })
            .collect()
    }
}
