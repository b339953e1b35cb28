use crate::{sat::Literal, trees::BinaryRepresentation};
use anyhow::{anyhow, Result};

// Features are stored rather than literals, since the literals of a feature depend on the instance.
#[derive(Debug, Clone, Default)]
pub(crate) struct Exclusions {
    features: Vec<usize>,
    literals: Vec<Literal>,
}

impl Exclusions {
    pub(crate) fn set_features(&mut self, features: &[usize], n_features: usize) -> Result<()> {
        if let Some(f) = features.iter().find(|f| **f == 0 || **f > n_features) {
            return Err(anyhow!(
                "cannot exclude feature {}: features are numbered from 1 to {}",
                f,
                n_features
            ));
        }
        self.features = features.to_vec();
        Ok(())
    }

    pub(crate) fn add_literals(&mut self, literals: &[Literal]) {
        self.literals.extend_from_slice(literals);
        self.literals.sort_unstable();
        self.literals.dedup();
    }

    pub(crate) fn clear(&mut self) {
        self.features.clear();
        self.literals.clear();
    }

    pub(crate) fn literals(&self, binaries: Option<&BinaryRepresentation>) -> Vec<Literal> {
        let mut result = binaries
            .map(|b| b.literals_of_features(&self.features))
            .unwrap_or_default();
        result.extend_from_slice(&self.literals);
        result.sort_unstable();
        result.dedup();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sat::clause;
    use crate::trees::{DecisionTest, Operator, TestRegistry};

    #[test]
    fn test_exclusions() {
        let mut registry = TestRegistry::default();
        (1..=3).for_each(|f| {
            registry.add_test(DecisionTest::new(f, Operator::Gt, 0.5).unwrap());
        });
        let binaries = registry.instance_to_binaries(&[1., 0., 1.]).unwrap();
        let mut exclusions = Exclusions::default();
        assert!(exclusions.set_features(&[4], 3).is_err());
        exclusions.set_features(&[2], 3).unwrap();
        exclusions.add_literals(&clause![3]);
        assert_eq!(clause![-2, 3], exclusions.literals(Some(&binaries)));
        assert_eq!(clause![3], exclusions.literals(None));
        exclusions.clear();
        assert!(exclusions.literals(Some(&binaries)).is_empty());
    }
}
