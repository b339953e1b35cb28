use super::{DecisionTree, RegressionBoostedTrees, TestRegistry};
use anyhow::{anyhow, Result};

/// The tree-based models that can be explained.
#[derive(Debug, Clone)]
pub enum TreeModel {
    /// A classification decision tree
    DecisionTree(DecisionTree),
    /// A forest of regression trees
    RegressionBoostedTrees(RegressionBoostedTrees),
}

impl TreeModel {
    /// Returns the number of features of the instances.
    pub fn n_features(&self) -> usize {
        match self {
            TreeModel::DecisionTree(t) => t.n_features(),
            TreeModel::RegressionBoostedTrees(f) => f.n_features(),
        }
    }

    /// Returns the decision tests of the model.
    pub fn registry(&self) -> &TestRegistry {
        match self {
            TreeModel::DecisionTree(t) => t.registry(),
            TreeModel::RegressionBoostedTrees(f) => f.registry(),
        }
    }

    /// Returns the number of trees of the model.
    pub fn n_trees(&self) -> usize {
        match self {
            TreeModel::DecisionTree(_) => 1,
            TreeModel::RegressionBoostedTrees(f) => f.trees().len(),
        }
    }

    /// Returns the total number of nodes of the trees, leaves included.
    pub fn n_nodes(&self) -> usize {
        match self {
            TreeModel::DecisionTree(t) => t.root().n_nodes(),
            TreeModel::RegressionBoostedTrees(f) => f.trees().iter().map(|t| t.n_nodes()).sum(),
        }
    }

    /// Returns a short description of the kind of model.
    pub fn kind_name(&self) -> &'static str {
        match self {
            TreeModel::DecisionTree(_) => "decision tree",
            TreeModel::RegressionBoostedTrees(_) => "regression boosted trees",
        }
    }

    /// Returns the decision tree, or an error if the model is not a decision tree.
    pub fn into_decision_tree(self) -> Result<DecisionTree> {
        match self {
            TreeModel::DecisionTree(t) => Ok(t),
            other => Err(anyhow!("expected a decision tree, got {}", other.kind_name())),
        }
    }

    /// Returns the regression forest, or an error if the model is not a regression forest.
    pub fn into_regression_boosted_trees(self) -> Result<RegressionBoostedTrees> {
        match self {
            TreeModel::RegressionBoostedTrees(f) => Ok(f),
            other => Err(anyhow!(
                "expected regression boosted trees, got {}",
                other.kind_name()
            )),
        }
    }
}
