use super::BinaryRepresentation;
use crate::sat::{Literal, Variable};
use std::{
    collections::{BTreeSet, HashMap},
    fmt::Debug,
};

/// The trait for the values held by tree leaves.
///
/// Classification trees hold class indices, regression trees hold real values.
pub trait LeafType: Clone + Debug + PartialEq {}
impl<T: Clone + Debug + PartialEq> LeafType for T {}

/// A node of a binary tree.
///
/// Internal nodes hold the variable of a decision test (see [TestRegistry](super::TestRegistry))
/// and a child for each outcome of the test.
#[derive(Debug, Clone, PartialEq)]
pub enum Node<T: LeafType> {
    /// A leaf holding a value
    Leaf(T),
    /// An internal node
    Test {
        /// the variable of the test
        var: Variable,
        /// the child reached when the test is satisfied
        if_true: Box<Node<T>>,
        /// the child reached when the test is falsified
        if_false: Box<Node<T>>,
    },
}

impl<T> Node<T>
where
    T: LeafType,
{
    /// Builds an internal node.
    pub fn new_test(var: Variable, if_true: Node<T>, if_false: Node<T>) -> Self {
        Node::Test {
            var,
            if_true: Box::new(if_true),
            if_false: Box::new(if_false),
        }
    }

    /// Returns the value of the leaf reached by the instance which binary representation is given.
    ///
    /// Tests out of the scope of the binary representation are considered falsified.
    pub fn predict(&self, binaries: &BinaryRepresentation) -> &T {
        let mut current = self;
        loop {
            match current {
                Node::Leaf(v) => return v,
                Node::Test {
                    var,
                    if_true,
                    if_false,
                } => {
                    current = if binaries.value_of(*var).unwrap_or(false) {
                        if_true
                    } else {
                        if_false
                    }
                }
            }
        }
    }

    /// Returns the literals met on the decision path of the instance, from the root to the leaf.
    pub fn path_literals(&self, binaries: &BinaryRepresentation) -> Vec<Literal> {
        let mut literals = vec![];
        let mut current = self;
        while let Node::Test {
            var,
            if_true,
            if_false,
        } = current
        {
            let value = binaries.value_of(*var).unwrap_or(false);
            literals.push(var.literal(value));
            current = if value { if_true } else { if_false };
        }
        literals
    }

    /// Returns the values of the leaves reachable by an instance satisfying the literals.
    ///
    /// At a node which variable does not appear in the literals, both children are explored.
    pub fn reachable_leaves(&self, literals: &[Literal]) -> Vec<&T> {
        let values = literals
            .iter()
            .map(|l| (l.var(), l.is_positive()))
            .collect::<HashMap<Variable, bool>>();
        let mut leaves = vec![];
        self.collect_reachable_leaves(&values, &mut leaves);
        leaves
    }

    fn collect_reachable_leaves<'a>(
        &'a self,
        values: &HashMap<Variable, bool>,
        leaves: &mut Vec<&'a T>,
    ) {
        match self {
            Node::Leaf(v) => leaves.push(v),
            Node::Test {
                var,
                if_true,
                if_false,
            } => match values.get(var) {
                Some(true) => if_true.collect_reachable_leaves(values, leaves),
                Some(false) => if_false.collect_reachable_leaves(values, leaves),
                None => {
                    if_true.collect_reachable_leaves(values, leaves);
                    if_false.collect_reachable_leaves(values, leaves);
                }
            },
        }
    }

    /// Returns every path from the root to a leaf, as the list of its literals and the leaf value.
    pub fn paths(&self) -> Vec<(Vec<Literal>, &T)> {
        let mut paths = vec![];
        let mut current_path = vec![];
        self.collect_paths(&mut current_path, &mut paths);
        paths
    }

    fn collect_paths<'a>(
        &'a self,
        current_path: &mut Vec<Literal>,
        paths: &mut Vec<(Vec<Literal>, &'a T)>,
    ) {
        match self {
            Node::Leaf(v) => paths.push((current_path.clone(), v)),
            Node::Test {
                var,
                if_true,
                if_false,
            } => {
                current_path.push(var.literal(true));
                if_true.collect_paths(current_path, paths);
                current_path.pop();
                current_path.push(var.literal(false));
                if_false.collect_paths(current_path, paths);
                current_path.pop();
            }
        }
    }

    /// Returns the clauses forbidding each path which leaf is not a target.
    ///
    /// Each clause is the negation of the literals of a path; the models of the formula are the
    /// assignments of the tests that lead to a target leaf.
    pub fn to_cnf<F>(&self, is_target: F) -> Vec<Vec<Literal>>
    where
        F: Fn(&T) -> bool,
    {
        self.paths()
            .into_iter()
            .filter(|(_, v)| !is_target(v))
            .map(|(path, _)| path.into_iter().map(|l| l.negate()).collect())
            .collect()
    }

    /// Returns the values of all the leaves, from left (satisfied tests) to right.
    pub fn leaves(&self) -> Vec<&T> {
        self.reachable_leaves(&[])
    }

    /// Returns the number of nodes of the tree, leaves included.
    pub fn n_nodes(&self) -> usize {
        match self {
            Node::Leaf(_) => 1,
            Node::Test {
                if_true, if_false, ..
            } => 1 + if_true.n_nodes() + if_false.n_nodes(),
        }
    }

    /// Returns the length of the longest path of the tree.
    pub fn depth(&self) -> usize {
        match self {
            Node::Leaf(_) => 0,
            Node::Test {
                if_true, if_false, ..
            } => 1 + usize::max(if_true.depth(), if_false.depth()),
        }
    }

    /// Returns the variables of the tests involved in the tree.
    pub fn vars(&self) -> BTreeSet<Variable> {
        let mut vars = BTreeSet::new();
        self.paths().iter().for_each(|(path, _)| {
            vars.extend(path.iter().map(|l| l.var()));
        });
        vars
    }

    /// Builds a tree with the same structure and the leaf values transformed by a function.
    pub fn map_leaves<U, F>(&self, f: &F) -> Node<U>
    where
        U: LeafType,
        F: Fn(&T) -> U,
    {
        match self {
            Node::Leaf(v) => Node::Leaf(f(v)),
            Node::Test {
                var,
                if_true,
                if_false,
            } => Node::new_test(*var, if_true.map_leaves(f), if_false.map_leaves(f)),
        }
    }

    /// Builds a tree with the same structure and the variable `v` replaced by `map[v-1]`.
    pub fn remap_vars(&self, map: &[Variable]) -> Self {
        match self {
            Node::Leaf(v) => Node::Leaf(v.clone()),
            Node::Test {
                var,
                if_true,
                if_false,
            } => Node::new_test(
                map[usize::from(*var) - 1],
                if_true.remap_vars(map),
                if_false.remap_vars(map),
            ),
        }
    }
}
