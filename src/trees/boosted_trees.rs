use super::{decision_tree::check_tree_vars, BinaryRepresentation, Node, TestRegistry};
use crate::sat::Literal;
use anyhow::{anyhow, Result};

/// A forest of regression trees which predictions are summed.
///
/// All the trees share the same [TestRegistry].
/// The prediction for an instance is the base score plus the values of the leaves it reaches.
#[derive(Debug, Clone)]
pub struct RegressionBoostedTrees {
    n_features: usize,
    registry: TestRegistry,
    trees: Vec<Node<f64>>,
    base_score: f64,
}

impl RegressionBoostedTrees {
    /// Builds a new forest.
    ///
    /// Fails if there is no tree, or if a tree involves a variable that is not registered
    /// or a feature index greater than `n_features`.
    pub fn new(
        n_features: usize,
        registry: TestRegistry,
        trees: Vec<Node<f64>>,
        base_score: f64,
    ) -> Result<Self> {
        if trees.is_empty() {
            return Err(anyhow!("a boosted trees model must contain at least one tree"));
        }
        for (i, t) in trees.iter().enumerate() {
            check_tree_vars(n_features, &registry, t)
                .map_err(|e| e.context(format!("in tree {}", i + 1)))?;
        }
        Ok(Self {
            n_features,
            registry,
            trees,
            base_score,
        })
    }

    /// Returns the number of features of the instances.
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Returns the decision tests of the forest.
    pub fn registry(&self) -> &TestRegistry {
        &self.registry
    }

    /// Returns the trees of the forest.
    pub fn trees(&self) -> &[Node<f64>] {
        &self.trees
    }

    /// Returns the value added to the sum of the leaves.
    pub fn base_score(&self) -> f64 {
        self.base_score
    }

    /// Computes the binary representation of an instance.
    pub fn binary_representation(&self, instance: &[f64]) -> Result<BinaryRepresentation> {
        if instance.len() != self.n_features {
            return Err(anyhow!(
                "expected an instance with {} features, got {} values",
                self.n_features,
                instance.len()
            ));
        }
        self.registry.instance_to_binaries(instance)
    }

    /// Returns the value predicted for an instance.
    pub fn predict(&self, instance: &[f64]) -> Result<f64> {
        let binaries = self.binary_representation(instance)?;
        Ok(self.predict_binaries(&binaries))
    }

    /// Returns the value predicted for an instance given its binary representation.
    pub fn predict_binaries(&self, binaries: &BinaryRepresentation) -> f64 {
        self.base_score + self.trees.iter().map(|t| t.predict(binaries)).sum::<f64>()
    }

    /// Returns the union of the decision paths of the instance in all the trees, sorted and without duplicates.
    pub fn path_literals(&self, binaries: &BinaryRepresentation) -> Vec<Literal> {
        let mut literals = self
            .trees
            .iter()
            .flat_map(|t| t.path_literals(binaries))
            .collect::<Vec<Literal>>();
        literals.sort_unstable();
        literals.dedup();
        literals
    }

    /// Returns the lowest and highest values the forest may predict.
    pub fn extremum_range(&self) -> (f64, f64) {
        self.bounds_under(&[])
    }

    /// Returns bounds on the values predicted for the instances satisfying the literals.
    ///
    /// The lower (resp. upper) bound is the base score plus the sum, over the trees,
    /// of the lowest (resp. highest) reachable leaf.
    /// The leaves are summed before the base score is added, as in [predict_binaries](Self::predict_binaries),
    /// so that the bounds under the literals of an instance are exactly its prediction.
    pub fn bounds_under(&self, literals: &[Literal]) -> (f64, f64) {
        let extrema = self
            .trees
            .iter()
            .map(|t| {
                let leaves = t.reachable_leaves(literals);
                let min = leaves.iter().copied().copied().fold(f64::INFINITY, f64::min);
                let max = leaves
                    .iter()
                    .copied()
                    .copied()
                    .fold(f64::NEG_INFINITY, f64::max);
                (min, max)
            })
            .collect::<Vec<(f64, f64)>>();
        let lower = extrema.iter().map(|(min, _)| min).sum::<f64>();
        let upper = extrema.iter().map(|(_, max)| max).sum::<f64>();
        (self.base_score + lower, self.base_score + upper)
    }
}
