use super::{warning_result::WarningResult, WarningHandler};
use crate::trees::{
    DecisionTest, DecisionTree, LeafType, Node, Operator, RegressionBoostedTrees, TestRegistry,
    TreeModel,
};
use anyhow::{anyhow, Context, Result};
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use std::{
    collections::{HashMap, HashSet},
    io::{BufRead, BufReader, Read},
    str::FromStr,
};

lazy_static! {
    static ref COMMENT_LINE_PATTERN: Regex = Regex::new(r"^\s*c(\s.*)?$").unwrap();
    static ref PREAMBLE_LINE_PATTERN: Regex =
        Regex::new(r"^\s*p\s+(dt|bt)\s+(\d+)(?:\s+(\S+))?\s*$").unwrap();
    static ref IMPORTANCES_LINE_PATTERN: Regex = Regex::new(r"^\s*fi((?:\s+\S+)*)\s*$").unwrap();
    static ref TREE_LINE_PATTERN: Regex = Regex::new(r"^\s*t\s*$").unwrap();
    static ref NODE_LINE_PATTERN: Regex =
        Regex::new(r"^\s*n\s+(\d+)\s+(\d+)\s+(<=|>=|==|!=|<|>)\s+(\S+)\s+(\d+)\s+(\d+)\s*$")
            .unwrap();
    static ref LEAF_LINE_PATTERN: Regex = Regex::new(r"^\s*l\s+(\d+)\s+(\S+)\s*$").unwrap();
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum ModelKind {
    DecisionTree,
    RegressionBoostedTrees,
}

enum RawNode {
    Test {
        test: DecisionTest,
        if_true: usize,
        if_false: usize,
    },
    Leaf(String),
}

#[derive(Default)]
struct RawTree {
    first_id: Option<usize>,
    nodes: HashMap<usize, (usize, RawNode)>,
    declaration_order: Vec<usize>,
}

impl RawTree {
    fn add_node(&mut self, id: usize, line_index: usize, node: RawNode) -> Result<()> {
        if self.nodes.contains_key(&id) {
            return Err(anyhow!("node {} is declared more than once", id));
        }
        if self.first_id.is_none() {
            self.first_id = Some(id);
        }
        self.nodes.insert(id, (line_index, node));
        self.declaration_order.push(id);
        Ok(())
    }

    fn register_tests(&self, registry: &mut TestRegistry) {
        self.declaration_order.iter().for_each(|id| {
            if let Some((_, RawNode::Test { test, .. })) = self.nodes.get(id) {
                registry.add_test(*test);
            }
        });
    }

    // builds the tree from the first declared node, warning about the nodes that are not reached
    fn build<T, F>(
        &self,
        registry: &TestRegistry,
        read_leaf: F,
    ) -> Result<WarningResult<Node<T>, (usize, String)>>
    where
        T: LeafType,
        F: Fn(&str) -> Result<T>,
    {
        let root_id = self.first_id.ok_or_else(|| anyhow!("empty tree"))?;
        let mut visited = HashSet::new();
        let root = self.build_node(root_id, registry, &read_leaf, &mut visited)?;
        let warnings = self
            .declaration_order
            .iter()
            .filter(|id| !visited.contains(*id))
            .map(|id| {
                (
                    self.nodes[id].0,
                    format!("node {} is not reachable from the root and is ignored", id),
                )
            })
            .collect();
        Ok(WarningResult::new(root, warnings))
    }

    fn build_node<T, F>(
        &self,
        id: usize,
        registry: &TestRegistry,
        read_leaf: &F,
        visited: &mut HashSet<usize>,
    ) -> Result<Node<T>>
    where
        T: LeafType,
        F: Fn(&str) -> Result<T>,
    {
        if !visited.insert(id) {
            return Err(anyhow!("node {} is referenced more than once", id));
        }
        let (line_index, node) = self
            .nodes
            .get(&id)
            .ok_or_else(|| anyhow!("node {} is referenced but not declared", id))?;
        let context = || format!("in node {} declared at line with index {}", id, line_index);
        match node {
            RawNode::Leaf(value) => Ok(Node::Leaf(read_leaf(value).with_context(context)?)),
            RawNode::Test {
                test,
                if_true,
                if_false,
            } => {
                let var = registry
                    .var_of(test)
                    .ok_or_else(|| anyhow!("unregistered test {}", test))
                    .with_context(context)?;
                Ok(Node::new_test(
                    var,
                    self.build_node(*if_true, registry, read_leaf, visited)?,
                    self.build_node(*if_false, registry, read_leaf, visited)?,
                ))
            }
        }
    }
}

/// A reader for tree-based models.
///
/// The format is line-oriented.
/// A preamble `p dt <n_features>` announces a classification decision tree,
/// while `p bt <n_features> <base_score>` announces regression boosted trees.
/// A decision tree may be followed by the importances of its features (`fi` and one value per feature).
/// Each tree starts with a `t` line, followed by its nodes: `n <id> <feature> <op> <threshold> <true_child> <false_child>`
/// for internal nodes and `l <id> <value>` for leaves.
/// The root of a tree is its first declared node, and every other node must be referenced exactly once.
/// Features are numbered from 1, and `<op>` is one of `<`, `<=`, `>`, `>=`, `==` and `!=`.
/// Lines beginning by `c` are comments.
///
/// The following content defines a decision tree predicting class `1` iff both features are greater than `0.5`.
///
/// ```text
/// p dt 2
/// t
/// n 1 1 > 0.5 2 3
/// n 2 2 > 0.5 4 5
/// l 3 0
/// l 4 1
/// l 5 0
/// ```
///
/// The tests of the model are numbered in the order of their first declaration, starting at 1;
/// these numbers are the variables of the literals of the explanations.
///
/// # Example
///
/// ```
/// # use xplatree::io::ModelReader;
/// let model = ModelReader::default()
///     .read(&mut "p dt 1\nt\nn 1 1 > 0.5 2 3\nl 2 1\nl 3 0\n".as_bytes())
///     .expect("invalid model");
/// assert_eq!(1, model.n_features());
/// ```
#[derive(Default)]
pub struct ModelReader {
    warning_handlers: Vec<WarningHandler>,
}

impl ModelReader {
    /// Reads a model.
    ///
    /// In case warnings are raised, the callback functions registered by [add_warning_handler](Self::add_warning_handler) are triggered.
    pub fn read(&self, reader: &mut dyn Read) -> Result<TreeModel> {
        let br = BufReader::new(reader);
        let mut preamble = None;
        let mut importances = None;
        let mut trees: Vec<RawTree> = vec![];
        for (i, line) in br.lines().enumerate() {
            let context = || format!("while reading line with index {}", i);
            let l = line.with_context(context)?;
            if l.trim().is_empty() || COMMENT_LINE_PATTERN.is_match(&l) {
                continue;
            }
            if let Some(c) = PREAMBLE_LINE_PATTERN.captures(&l) {
                if preamble.is_some() {
                    return Err(anyhow!("found a second preamble")).with_context(context);
                }
                preamble = Some(read_preamble(&c).with_context(context)?);
                continue;
            }
            let (kind, n_features, _) =
                preamble.ok_or_else(|| anyhow!("missing preamble")).with_context(context)?;
            if let Some(c) = IMPORTANCES_LINE_PATTERN.captures(&l) {
                if kind != ModelKind::DecisionTree {
                    return Err(anyhow!("feature importances are only allowed for decision trees"))
                        .with_context(context);
                }
                if importances.is_some() || !trees.is_empty() {
                    return Err(anyhow!(
                        "feature importances must be given once, before the tree"
                    ))
                    .with_context(context);
                }
                importances = Some(read_importances(&c[1]).with_context(context)?);
                continue;
            }
            if TREE_LINE_PATTERN.is_match(&l) {
                if kind == ModelKind::DecisionTree && !trees.is_empty() {
                    return Err(anyhow!("a decision tree model contains a single tree"))
                        .with_context(context);
                }
                trees.push(RawTree::default());
                continue;
            }
            let tree = match trees.last_mut() {
                Some(t) => t,
                None => {
                    return Err(anyhow!("found a node before the first tree")).with_context(context)
                }
            };
            if let Some(c) = NODE_LINE_PATTERN.captures(&l) {
                let (id, node) = read_node_line(&c, n_features).with_context(context)?;
                tree.add_node(id, i, node).with_context(context)?;
                continue;
            }
            if let Some(c) = LEAF_LINE_PATTERN.captures(&l) {
                let id = read_id(&c[1]).with_context(context)?;
                tree.add_node(id, i, RawNode::Leaf(c[2].to_string()))
                    .with_context(context)?;
                continue;
            }
            return Err(anyhow!("syntax error in line \"{}\"", l.trim())).with_context(context);
        }
        let (kind, n_features, base_score) = preamble.ok_or_else(|| anyhow!("missing preamble"))?;
        if trees.is_empty() {
            return Err(anyhow!("the model has no tree"));
        }
        let mut registry = TestRegistry::default();
        trees.iter().for_each(|t| t.register_tests(&mut registry));
        let warning_consumer = |warnings: Vec<(usize, String)>| {
            for (i, w) in warnings.iter() {
                self.warning_handlers
                    .iter()
                    .for_each(|h| (h)(1 + i, w.to_string()));
            }
        };
        match kind {
            ModelKind::DecisionTree => {
                let root = trees[0]
                    .build(&registry, read_class)?
                    .consume_warnings(warning_consumer);
                let mut tree = DecisionTree::new(n_features, registry, root)?;
                if let Some(imp) = importances {
                    tree = tree.with_feature_importances(imp)?;
                }
                Ok(TreeModel::DecisionTree(tree))
            }
            ModelKind::RegressionBoostedTrees => {
                let mut roots = Vec::with_capacity(trees.len());
                for (i, t) in trees.iter().enumerate() {
                    let root = t
                        .build(&registry, read_real)
                        .with_context(|| format!("in tree {}", i + 1))?
                        .consume_warnings(warning_consumer);
                    roots.push(root);
                }
                Ok(TreeModel::RegressionBoostedTrees(RegressionBoostedTrees::new(
                    n_features,
                    registry,
                    roots,
                    base_score.unwrap_or(0.),
                )?))
            }
        }
    }

    /// Adds a callback function to call when warnings are raised while parsing a model.
    ///
    /// The callback receives the (1-based) number of the line the warning refers to and the warning message.
    pub fn add_warning_handler(&mut self, h: WarningHandler) {
        self.warning_handlers.push(h);
    }
}

fn read_preamble(c: &Captures) -> Result<(ModelKind, usize, Option<f64>)> {
    let n_features = read_id(&c[2]).context("invalid number of features")?;
    match (&c[1], c.get(3)) {
        ("dt", None) => Ok((ModelKind::DecisionTree, n_features, None)),
        ("dt", Some(_)) => Err(anyhow!("unexpected base score for a decision tree")),
        (_, Some(b)) => Ok((
            ModelKind::RegressionBoostedTrees,
            n_features,
            Some(read_real(b.as_str()).context("invalid base score")?),
        )),
        (_, None) => Err(anyhow!("missing base score for boosted trees")),
    }
}

fn read_importances(s: &str) -> Result<Vec<f64>> {
    s.split_whitespace()
        .map(|w| read_real(w).context("invalid feature importance"))
        .collect()
}

fn read_id(s: &str) -> Result<usize> {
    s.parse::<usize>()
        .map_err(|_| anyhow!("invalid integer: {}", s))
}

fn read_real(s: &str) -> Result<f64> {
    match f64::from_str(s) {
        Ok(x) if x.is_finite() => Ok(x),
        _ => Err(anyhow!("invalid real number: {}", s)),
    }
}

fn read_class(s: &str) -> Result<u32> {
    s.parse::<u32>()
        .map_err(|_| anyhow!("invalid class: {}", s))
}

fn read_node_line(c: &Captures, n_features: usize) -> Result<(usize, RawNode)> {
    let id = read_id(&c[1])?;
    let feature = read_id(&c[2])?;
    if feature == 0 || feature > n_features {
        return Err(anyhow!(
            "invalid feature {}: features are numbered from 1 to {}",
            feature,
            n_features
        ));
    }
    let operator =
        Operator::from_str(&c[3]).map_err(|_| anyhow!("invalid operator: {}", &c[3]))?;
    let threshold = read_real(&c[4])?;
    Ok((
        id,
        RawNode::Test {
            test: DecisionTest::new(feature, operator, threshold)?,
            if_true: read_id(&c[5])?,
            if_false: read_id(&c[6])?,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sat::{clause, Variable};
    use std::{cell::RefCell, rc::Rc};

    const DT: &str = r#"
    c a comment
    p dt 2
    fi 0.75 0.25
    t
    n 1 1 > 0.5 2 3
    n 2 2 <= 1.5 4 5
    l 3 0
    l 4 1
    l 5 0
    "#;

    #[test]
    fn test_read_decision_tree() {
        let tree = ModelReader::default()
            .read(&mut DT.as_bytes())
            .unwrap()
            .into_decision_tree()
            .unwrap();
        assert_eq!(2, tree.n_features());
        assert_eq!(Some(&[0.75, 0.25][..]), tree.feature_importances());
        assert_eq!(2, tree.registry().len());
        assert_eq!(
            "f2 <= 1.5",
            tree.registry().test(Variable::from(2)).unwrap().to_string()
        );
        assert_eq!(1, tree.predict(&[1., 1.]).unwrap());
        assert_eq!(0, tree.predict(&[1., 2.]).unwrap());
        assert_eq!(0, tree.predict(&[0., 1.]).unwrap());
        assert_eq!(5, tree.root().n_nodes());
    }

    #[test]
    fn test_read_boosted_trees() {
        let model = "p bt 2 0.5\nt\nn 1 1 > 0.5 2 3\nl 2 1.5\nl 3 -1\nt\nl 1 0.25\n";
        let forest = ModelReader::default()
            .read(&mut model.as_bytes())
            .unwrap()
            .into_regression_boosted_trees()
            .unwrap();
        assert_eq!(2, forest.trees().len());
        assert_eq!(0.5, forest.base_score());
        assert_eq!(2.25, forest.predict(&[1., 0.]).unwrap());
        assert_eq!(-0.25, forest.predict(&[0., 0.]).unwrap());
    }

    #[test]
    fn test_shared_tests_in_forest() {
        let model = "p bt 1 0\nt\nn 1 1 > 0.5 2 3\nl 2 1\nl 3 0\nt\nn 1 1 > 0.5 2 3\nl 2 1\nl 3 0\n";
        let forest = ModelReader::default()
            .read(&mut model.as_bytes())
            .unwrap()
            .into_regression_boosted_trees()
            .unwrap();
        assert_eq!(1, forest.registry().len());
        let binaries = forest.binary_representation(&[1.]).unwrap();
        assert_eq!(clause![1], forest.path_literals(&binaries));
    }

    #[test]
    fn test_unreachable_node_warning() {
        let model = "p dt 1\nt\nn 1 1 > 0.5 2 3\nl 2 1\nl 3 0\nl 4 0\n";
        let warnings = Rc::new(RefCell::new(vec![]));
        let warnings_clone = Rc::clone(&warnings);
        let mut reader = ModelReader::default();
        reader.add_warning_handler(Box::new(move |line, w| {
            warnings_clone.borrow_mut().push((line, w))
        }));
        reader.read(&mut model.as_bytes()).unwrap();
        assert_eq!(1, warnings.borrow().len());
        assert_eq!(6, warnings.borrow()[0].0);
    }

    fn assert_invalid(model: &str) {
        assert!(
            ModelReader::default().read(&mut model.as_bytes()).is_err(),
            "{}",
            model
        );
    }

    #[test]
    fn test_missing_preamble() {
        assert_invalid("t\nl 1 0\n");
        assert_invalid("c only a comment\n");
    }

    #[test]
    fn test_invalid_preambles() {
        assert_invalid("p dt 1 0.5\nt\nl 1 0\n");
        assert_invalid("p bt 1\nt\nl 1 0\n");
        assert_invalid("p dt 1\np dt 1\nt\nl 1 0\n");
        assert_invalid("p xx 1\nt\nl 1 0\n");
    }

    #[test]
    fn test_no_tree() {
        assert_invalid("p dt 1\n");
    }

    #[test]
    fn test_two_decision_trees() {
        assert_invalid("p dt 1\nt\nl 1 0\nt\nl 1 1\n");
    }

    #[test]
    fn test_node_before_tree() {
        assert_invalid("p dt 1\nl 1 0\n");
    }

    #[test]
    fn test_invalid_nodes() {
        assert_invalid("p dt 1\nt\nn 1 2 > 0.5 2 3\nl 2 1\nl 3 0\n");
        assert_invalid("p dt 1\nt\nn 1 0 > 0.5 2 3\nl 2 1\nl 3 0\n");
        assert_invalid("p dt 1\nt\nn 1 1 >> 0.5 2 3\nl 2 1\nl 3 0\n");
        assert_invalid("p dt 1\nt\nn 1 1 > a 2 3\nl 2 1\nl 3 0\n");
        assert_invalid("p dt 1\nt\nn 1 1 > 0.5 2 4\nl 2 1\nl 3 0\n");
        assert_invalid("p dt 1\nt\nn 1 1 > 0.5 2 2\nl 2 1\n");
        assert_invalid("p dt 1\nt\nn 1 1 > 0.5 2 3\nl 2 1\nl 2 0\n");
        assert_invalid("p dt 1\nt\nn 1 1 > 0.5 1 2\nl 2 1\n");
    }

    #[test]
    fn test_invalid_leaves() {
        assert_invalid("p dt 1\nt\nl 1 0.5\n");
        assert_invalid("p dt 1\nt\nl 1 -1\n");
        assert_invalid("p bt 1 0\nt\nl 1 inf\n");
    }

    #[test]
    fn test_invalid_importances() {
        assert_invalid("p dt 2\nfi 0.5\nt\nl 1 0\n");
        assert_invalid("p dt 1\nt\nfi 0.5\nl 1 0\n");
        assert_invalid("p bt 1 0\nfi 0.5\nt\nl 1 0\n");
        assert_invalid("p dt 1\nfi x\nt\nl 1 0\n");
    }

    #[test]
    fn test_syntax_error() {
        assert_invalid("p dt 1\nt\nl 1 0\nfoo\n");
    }
}
