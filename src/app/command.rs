use anyhow::Result;
use clap::{App, ArgMatches};

/// A subcommand of the application.
///
/// A command declares its own arguments through a clap subcommand,
/// and runs itself on the arguments clap matched for it.
///
/// Command names must be unique.
pub(crate) trait Command<'a> {
    /// Returns the name of the command, as typed on the command line.
    fn name(&self) -> &str;

    /// Returns the clap subcommand describing the arguments of this command.
    fn clap_subcommand(&self) -> App<'a, 'a>;

    /// Executes the command.
    ///
    /// Returning an error makes the application exit with a failure status code.
    fn execute(&self, arg_matches: &ArgMatches<'_>) -> Result<()>;
}
