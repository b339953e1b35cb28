use super::{cli_manager::logging_level_cli_arg, command::Command, common};
use anyhow::{anyhow, Result};
use clap::{App, AppSettings, ArgMatches, SubCommand};
use log::info;
use xplatree::trees::TreeModel;

const CMD_NAME: &str = "check";

pub(crate) struct CheckCommand;

impl CheckCommand {
    pub(crate) fn new() -> Self {
        CheckCommand
    }
}

impl<'a> Command<'a> for CheckCommand {
    fn name(&self) -> &str {
        CMD_NAME
    }

    fn clap_subcommand(&self) -> App<'a, 'a> {
        SubCommand::with_name(CMD_NAME)
            .about("Checks a model file for errors")
            .setting(AppSettings::DisableVersion)
            .arg(common::model_arg())
            .arg(logging_level_cli_arg())
    }

    fn execute(&self, arg_matches: &ArgMatches<'_>) -> Result<()> {
        let file = arg_matches
            .value_of(common::ARG_MODEL)
            .ok_or_else(|| anyhow!("missing model file"))?;
        let model = common::read_model_file_path(file)?;
        match &model {
            TreeModel::DecisionTree(t) => {
                let classes = t.classes();
                info!("the tree predicts {} class(es): {:?}", classes.len(), classes);
            }
            TreeModel::RegressionBoostedTrees(f) => {
                let (lower, upper) = f.extremum_range();
                info!("the predictions of the forest lie in [{}, {}]", lower, upper);
            }
        }
        Ok(())
    }
}
