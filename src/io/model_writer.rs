use crate::trees::{LeafType, Node, TestRegistry, TreeModel};
use anyhow::{anyhow, Context, Result};
use std::{fmt::Display, io::Write};

/// A writer for tree-based models, using the format read by [ModelReader](super::ModelReader).
///
/// Nodes are numbered in depth-first order, the root getting the number `1`.
#[derive(Default)]
pub struct ModelWriter;

impl ModelWriter {
    /// Writes a model.
    pub fn write(&self, writer: &mut dyn Write, model: &TreeModel) -> Result<()> {
        let context = "while writing a model";
        match model {
            TreeModel::DecisionTree(t) => {
                writeln!(writer, "p dt {}", t.n_features()).context(context)?;
                if let Some(imp) = t.feature_importances() {
                    write!(writer, "fi").context(context)?;
                    imp.iter()
                        .try_for_each(|i| write!(writer, " {}", i).context(context))?;
                    writeln!(writer).context(context)?;
                }
                write_tree(writer, t.registry(), t.root())?;
            }
            TreeModel::RegressionBoostedTrees(f) => {
                writeln!(writer, "p bt {} {}", f.n_features(), f.base_score()).context(context)?;
                f.trees()
                    .iter()
                    .try_for_each(|t| write_tree(writer, f.registry(), t))?;
            }
        }
        writer.flush().context(context)
    }
}

fn write_tree<T>(writer: &mut dyn Write, registry: &TestRegistry, root: &Node<T>) -> Result<()>
where
    T: LeafType + Display,
{
    writeln!(writer, "t").context("while writing a tree")?;
    let mut next_id = 2;
    write_node(writer, registry, root, 1, &mut next_id)
}

fn write_node<T>(
    writer: &mut dyn Write,
    registry: &TestRegistry,
    node: &Node<T>,
    id: usize,
    next_id: &mut usize,
) -> Result<()>
where
    T: LeafType + Display,
{
    let context = "while writing a node";
    match node {
        Node::Leaf(v) => writeln!(writer, "l {} {}", id, v).context(context),
        Node::Test {
            var,
            if_true,
            if_false,
        } => {
            let test = registry
                .test(*var)
                .ok_or_else(|| anyhow!("no test registered for variable {}", var))?;
            let (true_id, false_id) = (*next_id, *next_id + 1);
            *next_id += 2;
            writeln!(
                writer,
                "n {} {} {} {} {} {}",
                id,
                test.feature(),
                test.operator(),
                test.threshold(),
                true_id,
                false_id
            )
            .context(context)?;
            write_node(writer, registry, if_true, true_id, next_id)?;
            write_node(writer, registry, if_false, false_id, next_id)
        }
    }
}
