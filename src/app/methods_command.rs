use super::{cli_manager::logging_level_cli_arg, command::Command};
use anyhow::Result;
use clap::{App, AppSettings, ArgMatches, SubCommand};
use strum::IntoEnumIterator;
use xplatree::explainers::{PreferredReasonMethod, ReasonKind};

const CMD_NAME: &str = "methods";

/// The kinds of explanations which are counts of reasons.
const COUNT_KINDS: [&str; 2] = ["count", "count-per-literal"];

pub(crate) struct MethodsCommand;

impl MethodsCommand {
    pub(crate) fn new() -> Self {
        MethodsCommand
    }
}

impl<'a> Command<'a> for MethodsCommand {
    fn name(&self) -> &str {
        CMD_NAME
    }

    fn clap_subcommand(&self) -> App<'a, 'a> {
        SubCommand::with_name(CMD_NAME)
            .about("Displays the explanation kinds and the preferred reason methods")
            .setting(AppSettings::DisableVersion)
            .arg(logging_level_cli_arg())
    }

    fn execute(&self, _arg_matches: &ArgMatches<'_>) -> Result<()> {
        let kinds = ReasonKind::iter()
            .map(|k| k.to_string())
            .chain(COUNT_KINDS.iter().map(|k| k.to_string()))
            .collect::<Vec<String>>();
        println!("kinds: [{}]", kinds.join(","));
        let methods = PreferredReasonMethod::iter()
            .map(|m| m.to_string())
            .collect::<Vec<String>>();
        println!("methods: [{}]", methods.join(","));
        Ok(())
    }
}
