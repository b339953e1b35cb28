use super::{BinaryRepresentation, Node, TestRegistry};
use crate::sat::Literal;
use anyhow::{anyhow, Result};
use std::collections::BTreeSet;

/// A classification decision tree.
///
/// Leaves hold class indices.
/// The tests of the tree are stored in a [TestRegistry], which defines the literal space of the explanations.
#[derive(Debug, Clone)]
pub struct DecisionTree {
    n_features: usize,
    registry: TestRegistry,
    root: Node<u32>,
    feature_importances: Option<Vec<f64>>,
}

pub(crate) fn check_tree_vars<T: super::LeafType>(
    n_features: usize,
    registry: &TestRegistry,
    root: &Node<T>,
) -> Result<()> {
    for var in root.vars() {
        let test = registry
            .test(var)
            .ok_or_else(|| anyhow!("no test registered for variable {}", var))?;
        if test.feature() > n_features {
            return Err(anyhow!(
                "test {} involves a feature greater than the number of features ({})",
                test,
                n_features
            ));
        }
    }
    Ok(())
}

impl DecisionTree {
    /// Builds a new decision tree.
    ///
    /// Fails if the tree involves a variable that is not registered, or a feature index greater than `n_features`.
    pub fn new(n_features: usize, registry: TestRegistry, root: Node<u32>) -> Result<Self> {
        check_tree_vars(n_features, &registry, &root)?;
        Ok(Self {
            n_features,
            registry,
            root,
            feature_importances: None,
        })
    }

    /// Sets the importance of each feature, the first value being the importance of feature `1`.
    pub fn with_feature_importances(mut self, importances: Vec<f64>) -> Result<Self> {
        if importances.len() != self.n_features {
            return Err(anyhow!(
                "expected {} feature importances, got {}",
                self.n_features,
                importances.len()
            ));
        }
        self.feature_importances = Some(importances);
        Ok(self)
    }

    /// Returns the number of features of the instances.
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Returns the decision tests of this tree.
    pub fn registry(&self) -> &TestRegistry {
        &self.registry
    }

    /// Returns the root node.
    pub fn root(&self) -> &Node<u32> {
        &self.root
    }

    /// Returns the feature importances, if they were provided.
    pub fn feature_importances(&self) -> Option<&[f64]> {
        self.feature_importances.as_deref()
    }

    /// Returns the classes held by the leaves.
    pub fn classes(&self) -> BTreeSet<u32> {
        self.root.leaves().into_iter().copied().collect()
    }

    /// Computes the binary representation of an instance.
    pub fn binary_representation(&self, instance: &[f64]) -> Result<BinaryRepresentation> {
        self.check_instance(instance)?;
        self.registry.instance_to_binaries(instance)
    }

    pub(crate) fn check_instance(&self, instance: &[f64]) -> Result<()> {
        if instance.len() != self.n_features {
            return Err(anyhow!(
                "expected an instance with {} features, got {} values",
                self.n_features,
                instance.len()
            ));
        }
        Ok(())
    }

    /// Returns the class predicted for an instance.
    pub fn predict(&self, instance: &[f64]) -> Result<u32> {
        let binaries = self.binary_representation(instance)?;
        Ok(*self.root.predict(&binaries))
    }

    /// Returns the class predicted for an instance given its binary representation.
    pub fn predict_binaries(&self, binaries: &BinaryRepresentation) -> u32 {
        *self.root.predict(binaries)
    }

    /// Builds the CNF formula which models lead to the target class.
    ///
    /// There is one clause per path leading to another class, made of the negations of the path literals.
    /// The formula is empty if every leaf holds the target class.
    pub fn to_cnf(&self, target: u32) -> Vec<Vec<Literal>> {
        self.root.to_cnf(|c| *c == target)
    }

    /// Returns `true` iff every instance satisfying the literals is classified as the target.
    pub fn is_implicant(&self, literals: &[Literal], target: u32) -> bool {
        self.root
            .reachable_leaves(literals)
            .into_iter()
            .all(|c| *c == target)
    }

    pub(crate) fn from_parts(
        n_features: usize,
        registry: TestRegistry,
        root: Node<u32>,
        feature_importances: Option<Vec<f64>>,
    ) -> Self {
        Self {
            n_features,
            registry,
            root,
            feature_importances,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sat::{clause, Variable};
    use crate::trees::{DecisionTest, Operator};

    fn depth_2_tree() -> DecisionTree {
        let mut registry = TestRegistry::default();
        let v1 = registry.add_test(DecisionTest::new(1, Operator::Gt, 0.5).unwrap());
        let v2 = registry.add_test(DecisionTest::new(2, Operator::Gt, 0.5).unwrap());
        let root = Node::new_test(
            v1,
            Node::new_test(v2, Node::Leaf(1), Node::Leaf(0)),
            Node::Leaf(0),
        );
        DecisionTree::new(2, registry, root).unwrap()
    }

    #[test]
    fn test_predict() {
        let tree = depth_2_tree();
        assert_eq!(1, tree.predict(&[1., 1.]).unwrap());
        assert_eq!(0, tree.predict(&[1., 0.]).unwrap());
        assert_eq!(0, tree.predict(&[0., 1.]).unwrap());
        assert!(tree.predict(&[0.]).is_err());
    }

    #[test]
    fn test_unknown_var() {
        let registry = TestRegistry::default();
        let root = Node::new_test(Variable::from(1), Node::Leaf(1), Node::Leaf(0));
        assert!(DecisionTree::new(1, registry, root).is_err());
    }

    #[test]
    fn test_feature_out_of_range() {
        let mut registry = TestRegistry::default();
        let v = registry.add_test(DecisionTest::new(3, Operator::Gt, 0.5).unwrap());
        let root = Node::new_test(v, Node::Leaf(1), Node::Leaf(0));
        assert!(DecisionTree::new(2, registry, root).is_err());
    }

    #[test]
    fn test_feature_importances() {
        assert!(depth_2_tree().with_feature_importances(vec![0.5]).is_err());
        let tree = depth_2_tree()
            .with_feature_importances(vec![0.5, 0.2])
            .unwrap();
        assert_eq!(Some(&[0.5, 0.2][..]), tree.feature_importances());
    }

    #[test]
    fn test_to_cnf() {
        let tree = depth_2_tree();
        assert_eq!(vec![clause![-1, 2], clause![1]], tree.to_cnf(1));
        assert_eq!(vec![clause![-1, -2]], tree.to_cnf(0));
        assert_eq!(3, tree.to_cnf(2).len());
    }

    #[test]
    fn test_is_implicant() {
        let tree = depth_2_tree();
        assert!(tree.is_implicant(&clause![1, 2], 1));
        assert!(!tree.is_implicant(&clause![1], 1));
        assert!(tree.is_implicant(&clause![-1], 0));
        assert!(tree.is_implicant(&clause![-2], 0));
    }

    #[test]
    fn test_classes() {
        assert_eq!(
            [0, 1].into_iter().collect::<BTreeSet<u32>>(),
            depth_2_tree().classes()
        );
    }
}
