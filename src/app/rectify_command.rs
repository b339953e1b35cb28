use super::{cli_manager::logging_level_cli_arg, command::Command, common};
use anyhow::{anyhow, Context, Result};
use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use log::info;
use xplatree::{
    io::ModelWriter,
    trees::{rectify, DecisionTree, TreeModel},
};

const CMD_NAME: &str = "rectify";

const ARG_POSITIVE: &str = "POSITIVE";
const ARG_NEGATIVE: &str = "NEGATIVE";

pub(crate) struct RectifyCommand;

impl RectifyCommand {
    pub(crate) fn new() -> Self {
        RectifyCommand
    }
}

impl<'a> Command<'a> for RectifyCommand {
    fn name(&self) -> &str {
        CMD_NAME
    }

    fn clap_subcommand(&self) -> App<'a, 'a> {
        SubCommand::with_name(CMD_NAME)
            .about("Rectifies a binary decision tree so that it agrees with positive and negative decision rules")
            .setting(AppSettings::DisableVersion)
            .arg(common::model_arg())
            .arg(
                Arg::with_name(ARG_POSITIVE)
                    .long("positive")
                    .empty_values(false)
                    .multiple(false)
                    .help("the tree predicting 1 on the instances that must be classified as 1")
                    .required(true),
            )
            .arg(
                Arg::with_name(ARG_NEGATIVE)
                    .long("negative")
                    .empty_values(false)
                    .multiple(false)
                    .help("the tree predicting 1 on the instances that must be classified as 0")
                    .required(true),
            )
            .arg(logging_level_cli_arg())
    }

    fn execute(&self, arg_matches: &ArgMatches<'_>) -> Result<()> {
        let tree = read_tree(arg_matches, common::ARG_MODEL)?;
        let positive = read_tree(arg_matches, ARG_POSITIVE)?;
        let negative = read_tree(arg_matches, ARG_NEGATIVE)?;
        let rectified = rectify(&tree, &positive, &negative).context("while rectifying the tree")?;
        info!(
            "the rectified tree has {} node(s), the original one had {}",
            rectified.root().n_nodes(),
            tree.root().n_nodes()
        );
        ModelWriter::default().write(
            &mut std::io::stdout(),
            &TreeModel::DecisionTree(rectified),
        )
    }
}

fn read_tree(arg_matches: &ArgMatches<'_>, arg: &str) -> Result<DecisionTree> {
    let file = arg_matches
        .value_of(arg)
        .ok_or_else(|| anyhow!("missing model file"))?;
    common::read_model_file_path(file)?
        .into_decision_tree()
        .with_context(|| format!(r#"while reading "{}""#, file))
}
