use crate::{sat::Literal, trees::BinaryRepresentation};
use std::collections::HashSet;

/// A disjunction of literals.
pub type Clause = Vec<Literal>;

/// A conjunction of clauses.
pub type Cnf = Vec<Clause>;

/// Restricts the clauses of a formula to the literals of a binary representation.
///
/// The literals of each clause are sorted, and a clause appearing more than once is only kept at its first position.
/// The clauses of the core are the sets of instance literals which removal may lead to another outcome.
pub fn extract_core(cnf: &[Clause], binaries: &BinaryRepresentation) -> Cnf {
    let mut seen = HashSet::new();
    cnf.iter()
        .map(|cl| {
            let mut restricted = cl
                .iter()
                .copied()
                .filter(|l| binaries.contains(*l))
                .collect::<Clause>();
            restricted.sort_unstable();
            restricted.dedup();
            restricted
        })
        .filter(|cl| seen.insert(cl.clone()))
        .collect()
}

/// Removes the clauses that strictly contain another clause of the formula.
///
/// The clauses must be sorted; the order of the remaining clauses is preserved.
pub fn remove_subsumed_clauses(cnf: &[Clause]) -> Cnf {
    cnf.iter()
        .filter(|cl| {
            !cnf.iter()
                .any(|other| other.len() < cl.len() && is_sorted_subset(other, cl))
        })
        .cloned()
        .collect()
}

fn is_sorted_subset(small: &[Literal], big: &[Literal]) -> bool {
    let mut big_iter = big.iter();
    small.iter().all(|l| big_iter.any(|b| b == l))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sat::clause;
    use crate::trees::{DecisionTest, Operator, TestRegistry};

    fn binaries() -> BinaryRepresentation {
        let mut registry = TestRegistry::default();
        (1..=3).for_each(|f| {
            registry.add_test(DecisionTest::new(f, Operator::Gt, 0.5).unwrap());
        });
        registry.instance_to_binaries(&[1., 0., 1.]).unwrap()
    }

    #[test]
    fn test_extract_core() {
        let cnf = vec![clause![-1, -2, 3], clause![3, 1], clause![2], clause![1, -2]];
        assert_eq!(
            vec![clause![-2, 3], clause![1, 3], clause![], clause![1, -2]],
            extract_core(&cnf, &binaries())
        );
    }

    #[test]
    fn test_extract_core_dedup() {
        let cnf = vec![clause![3, -2], clause![-2, 3, 2], clause![-1]];
        assert_eq!(
            vec![clause![-2, 3], clause![]],
            extract_core(&cnf, &binaries())
        );
    }

    #[test]
    fn test_remove_subsumed_clauses() {
        let cnf = vec![clause![1, 2, 3], clause![2], clause![1, 3], clause![1, 3, 4]];
        assert_eq!(
            vec![clause![2], clause![1, 3]],
            remove_subsumed_clauses(&cnf)
        );
    }
}
