//! Tree-based models and the literals of their decision tests.

mod binary_representation;
pub use binary_representation::BinaryRepresentation;

mod boosted_trees;
pub use boosted_trees::RegressionBoostedTrees;

mod decision_test;
pub use decision_test::DecisionTest;
pub use decision_test::Operator;
pub use decision_test::TestRegistry;

mod decision_tree;
pub use decision_tree::DecisionTree;

mod node;
pub use node::LeafType;
pub use node::Node;

mod tree_algebra;
pub use tree_algebra::rectify;

mod tree_model;
pub use tree_model::TreeModel;
