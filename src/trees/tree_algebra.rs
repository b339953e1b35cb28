use super::{DecisionTree, Node, TestRegistry};
use crate::sat::Literal;
use anyhow::{anyhow, Result};
use log::debug;

impl DecisionTree {
    fn check_binary_classes(&self) -> Result<()> {
        match self.classes().into_iter().find(|c| *c > 1) {
            Some(c) => Err(anyhow!(
                "Boolean operations require trees with classes 0 and 1, found class {}",
                c
            )),
            None => Ok(()),
        }
    }

    /// Returns the tree which class is 1 exactly when the class of this one is 0.
    ///
    /// Fails if a leaf holds a class which is neither 0 nor 1.
    pub fn negate(&self) -> Result<DecisionTree> {
        self.check_binary_classes()?;
        Ok(DecisionTree::from_parts(
            self.n_features(),
            self.registry().clone(),
            self.root().map_leaves(&|c: &u32| 1 - *c),
            self.feature_importances().map(|i| i.to_vec()),
        ))
    }

    /// Returns the tree which class is 1 exactly when the classes of both trees are 1.
    ///
    /// The paths of the other tree are appended to the ones of this tree; the branches made
    /// unreachable by the tests of the path they are appended to are pruned.
    ///
    /// Fails if a leaf holds a class which is neither 0 nor 1.
    pub fn and(&self, other: &DecisionTree) -> Result<DecisionTree> {
        self.concatenate(other, |a, b| a & b)
    }

    /// Returns the tree which class is 1 exactly when the class of one of the trees is 1.
    ///
    /// Fails if a leaf holds a class which is neither 0 nor 1.
    pub fn or(&self, other: &DecisionTree) -> Result<DecisionTree> {
        self.concatenate(other, |a, b| a | b)
    }

    fn concatenate(&self, other: &DecisionTree, op: fn(u32, u32) -> u32) -> Result<DecisionTree> {
        self.check_binary_classes()?;
        other.check_binary_classes()?;
        let mut registry = self.registry().clone();
        let var_map = registry.merge(other.registry());
        let other_root = other.root().remap_vars(&var_map);
        let root = graft(self.root(), &other_root, &registry, op, &mut vec![]);
        debug!(
            "concatenated trees of sizes {} and {} into a tree of size {}",
            self.root().n_nodes(),
            other.root().n_nodes(),
            root.n_nodes()
        );
        let n_features = usize::max(self.n_features(), other.n_features());
        let feature_importances = if n_features == self.n_features() {
            self.feature_importances().map(|i| i.to_vec())
        } else {
            None
        };
        Ok(DecisionTree::from_parts(
            n_features,
            registry,
            root,
            feature_importances,
        ))
    }

    /// Returns an equivalent tree without unreachable branches.
    ///
    /// A test which outcome is implied by the tests above it is replaced by the child of this outcome,
    /// and a test which children are identical is replaced by this child.
    pub fn simplify(&self) -> DecisionTree {
        let root = prune(self.root(), self.registry(), &mut vec![], &|c| *c);
        DecisionTree::from_parts(
            self.n_features(),
            self.registry().clone(),
            root,
            self.feature_importances().map(|i| i.to_vec()),
        )
    }
}

/// Corrects a tree with a positive and a negative rectifying tree.
///
/// The resulting tree predicts 1 on the instances for which the positive tree predicts 1 and the negative one predicts 0,
/// predicts 0 on the instances for which the negative tree predicts 1 and the positive one predicts 0,
/// and agrees with the original tree on the other instances.
/// It is computed as `simplify(simplify(T and not(N and not P)) or (P and not N))`.
///
/// Fails if a leaf of one of the trees holds a class which is neither 0 nor 1.
pub fn rectify(
    tree: &DecisionTree,
    positive: &DecisionTree,
    negative: &DecisionTree,
) -> Result<DecisionTree> {
    let not_positive = positive.negate()?;
    let not_negative = negative.negate()?;
    let forced_positive = positive.and(&not_negative)?;
    let forced_negative = negative.and(&not_positive)?;
    let kept = tree.and(&forced_negative.negate()?)?.simplify();
    let rectified = kept.or(&forced_positive)?.simplify();
    debug!(
        "rectified a tree of size {} into a tree of size {}",
        tree.root().n_nodes(),
        rectified.root().n_nodes()
    );
    Ok(rectified)
}

fn graft(
    left: &Node<u32>,
    right: &Node<u32>,
    registry: &TestRegistry,
    op: fn(u32, u32) -> u32,
    path: &mut Vec<Literal>,
) -> Node<u32> {
    match left {
        Node::Leaf(a) => prune(right, registry, path, &|b| op(*a, *b)),
        Node::Test {
            var,
            if_true,
            if_false,
        } => {
            path.push(var.literal(true));
            let t = graft(if_true, right, registry, op, path);
            path.pop();
            path.push(var.literal(false));
            let f = graft(if_false, right, registry, op, path);
            path.pop();
            Node::new_test(*var, t, f)
        }
    }
}

// copies the tree under the constraints of the path, mapping the leaves
fn prune(
    node: &Node<u32>,
    registry: &TestRegistry,
    path: &mut Vec<Literal>,
    leaf_fn: &dyn Fn(&u32) -> u32,
) -> Node<u32> {
    match node {
        Node::Leaf(c) => Node::Leaf(leaf_fn(c)),
        Node::Test {
            var,
            if_true,
            if_false,
        } => match registry.implied_value(path, *var) {
            Some(true) => prune(if_true, registry, path, leaf_fn),
            Some(false) => prune(if_false, registry, path, leaf_fn),
            None => {
                path.push(var.literal(true));
                let t = prune(if_true, registry, path, leaf_fn);
                path.pop();
                path.push(var.literal(false));
                let f = prune(if_false, registry, path, leaf_fn);
                path.pop();
                if t == f {
                    t
                } else {
                    Node::new_test(*var, t, f)
                }
            }
        },
    }
}
