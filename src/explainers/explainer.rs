use super::{
    specs::{InstanceExplainer, SufficientReasonComputer},
    DecisionTreeExplainer, Explanation, RegressionBoostedTreesExplainer,
};
use crate::{
    sat::Literal,
    trees::{BinaryRepresentation, TreeModel},
};
use anyhow::{anyhow, Result};
use std::time::Duration;
use strum_macros::{Display as StrumDisplay, EnumIter, EnumString};

/// The kinds of explainers, one per kind of model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, StrumDisplay, EnumIter)]
#[strum(serialize_all = "kebab-case")]
pub enum ExplainerKind {
    /// An explainer for classification decision trees
    DecisionTree,
    /// An explainer for regression boosted trees
    RegressionBoostedTrees,
}

/// An explainer for any [TreeModel].
///
/// The operations shared by all the explainers are available through [InstanceExplainer].
/// The other ones fail when the underlying explainer does not provide them.
pub enum Explainer<'a> {
    /// An explainer for a decision tree
    DecisionTree(DecisionTreeExplainer<'a>),
    /// An explainer for regression boosted trees
    RegressionBoostedTrees(RegressionBoostedTreesExplainer<'a>),
}

impl<'a> Explainer<'a> {
    /// Builds the explainer associated with the kind of the model, with the default backends.
    pub fn new(model: &'a TreeModel) -> Self {
        match model {
            TreeModel::DecisionTree(t) => Explainer::DecisionTree(DecisionTreeExplainer::new(t)),
            TreeModel::RegressionBoostedTrees(f) => {
                Explainer::RegressionBoostedTrees(RegressionBoostedTreesExplainer::new(f))
            }
        }
    }

    fn inner(&self) -> &dyn InstanceExplainer {
        match self {
            Explainer::DecisionTree(e) => e,
            Explainer::RegressionBoostedTrees(e) => e,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn InstanceExplainer {
        match self {
            Explainer::DecisionTree(e) => e,
            Explainer::RegressionBoostedTrees(e) => e,
        }
    }

    /// Returns the sufficient reason computations, if this explainer provides them.
    pub fn as_sufficient_reason_computer(&self) -> Result<&dyn SufficientReasonComputer> {
        match self {
            Explainer::DecisionTree(e) => Ok(e),
            Explainer::RegressionBoostedTrees(_) => Err(anyhow!(
                "sufficient reasons are not available for regression boosted trees"
            )),
        }
    }

    /// Sets the range of the predictions of a regression model.
    pub fn set_range(&mut self, lower: f64, upper: f64) -> Result<()> {
        match self {
            Explainer::RegressionBoostedTrees(e) => e.set_range(lower, upper),
            Explainer::DecisionTree(_) => {
                Err(anyhow!("ranges are not available for decision trees"))
            }
        }
    }

    /// Computes a tree-specific reason of a regression model.
    ///
    /// See [RegressionBoostedTreesExplainer::tree_specific_reason].
    pub fn tree_specific_reason(
        &self,
        n_iterations: usize,
        time_limit: Option<Duration>,
        seed: u64,
    ) -> Result<Explanation> {
        match self {
            Explainer::RegressionBoostedTrees(e) => {
                e.tree_specific_reason(n_iterations, time_limit, seed)
            }
            Explainer::DecisionTree(_) => Err(anyhow!(
                "tree-specific reasons are not available for decision trees"
            )),
        }
    }
}

impl InstanceExplainer for Explainer<'_> {
    fn set_instance(&mut self, instance: &[f64]) -> Result<()> {
        self.inner_mut().set_instance(instance)
    }

    fn instance(&self) -> Option<&[f64]> {
        self.inner().instance()
    }

    fn binary_representation(&self) -> Option<&BinaryRepresentation> {
        self.inner().binary_representation()
    }

    fn set_excluded_features(&mut self, features: &[usize]) -> Result<()> {
        self.inner_mut().set_excluded_features(features)
    }

    fn exclude_literals(&mut self, literals: &[Literal]) {
        self.inner_mut().exclude_literals(literals)
    }

    fn clear_exclusions(&mut self) {
        self.inner_mut().clear_exclusions()
    }

    fn excluded_literals(&self) -> Vec<Literal> {
        self.inner().excluded_literals()
    }

    fn direct_reason(&self) -> Result<Explanation> {
        self.inner().direct_reason()
    }

    fn is_reason(&self, reason: &[Literal]) -> Result<bool> {
        self.inner().is_reason(reason)
    }

    fn kind(&self) -> ExplainerKind {
        self.inner().kind()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        explainers::{ExplanationLog, ReasonKind},
        io::ModelReader,
        sat::clause,
    };

    fn read_model(text: &str) -> TreeModel {
        ModelReader::default().read(&mut text.as_bytes()).unwrap()
    }

    const TREE: &str = "p dt 2\nt\nn 1 1 > 0.5 2 3\nn 2 2 > 0.5 4 5\nl 3 0\nl 4 1\nl 5 0\n";

    const FOREST: &str = "p bt 1 0\nt\nn 1 1 > 0.5 2 3\nl 2 1\nl 3 -1\n";

    #[test]
    fn test_decision_tree_explainer() {
        let model = read_model(TREE);
        let mut explainer = Explainer::new(&model);
        assert_eq!(ExplainerKind::DecisionTree, explainer.kind());
        explainer.set_instance(&[1., 1.]).unwrap();
        assert_eq!(
            vec![clause![1, 2]],
            explainer
                .as_sufficient_reason_computer()
                .unwrap()
                .sufficient_reason(None, None)
                .unwrap()
                .into_reasons()
        );
        assert!(explainer.set_range(0., 1.).is_err());
        assert!(explainer.tree_specific_reason(1, None, 0).is_err());
    }

    #[test]
    fn test_regression_explainer() {
        let model = read_model(FOREST);
        let mut explainer = Explainer::new(&model);
        assert_eq!(ExplainerKind::RegressionBoostedTrees, explainer.kind());
        assert!(explainer.as_sufficient_reason_computer().is_err());
        explainer.set_instance(&[1.]).unwrap();
        explainer.set_range(0., 2.).unwrap();
        assert_eq!(
            vec![clause![1]],
            explainer.tree_specific_reason(1, None, 0).unwrap().into_reasons()
        );
        explainer.set_excluded_features(&[1]).unwrap();
        assert_eq!(clause![1], explainer.excluded_literals());
        assert!(explainer.direct_reason().unwrap().is_empty());
    }

    #[test]
    fn test_explanation_log() {
        let model = read_model(TREE);
        let mut explainer = Explainer::new(&model);
        let mut log = ExplanationLog::default();
        assert!(explainer.direct_reason().is_err());
        explainer.set_instance(&[1., 0.]).unwrap();
        log.record(&explainer, &explainer.direct_reason().unwrap())
            .unwrap();
        explainer.set_instance(&[0., 0.]).unwrap();
        log.record(&explainer, &explainer.direct_reason().unwrap())
            .unwrap();
        assert_eq!(2, log.len());
        let entries = log.entries();
        assert_eq!(&[1., 0.], entries[0].instance());
        assert_eq!(vec![clause![1, -2]], entries[0].reasons());
        assert_eq!(vec![clause![-1]], entries[1].reasons());
        assert_eq!(ExplainerKind::DecisionTree, entries[1].explainer_kind());
        assert_eq!(ReasonKind::Direct, entries[1].reason_kind());
    }
}
