//! Explainers computing reasons for the predictions of tree-based models.

mod decision_tree_explainer;
pub use decision_tree_explainer::DecisionTreeExplainer;

mod exclusions;

mod explainer;
pub use explainer::Explainer;
pub use explainer::ExplainerKind;

mod explanation;
pub use explanation::ElapsedTime;
pub use explanation::Explanation;
pub use explanation::ReasonCount;
pub use explanation::ReasonKind;

mod history;
pub use history::ExplanationLog;
pub use history::LogEntry;

mod regression_boosted_trees_explainer;
pub use regression_boosted_trees_explainer::RegressionBoostedTreesExplainer;

mod specs;
pub use specs::InstanceExplainer;
pub use specs::SufficientReasonComputer;

mod weights;
pub use weights::compute_weights;
pub use weights::PreferredReasonMethod;
