mod app_helper;

mod authors_command;
pub(crate) use authors_command::AuthorsCommand;

mod check_command;
pub(crate) use check_command::CheckCommand;

mod cli_manager;

mod command;

pub(crate) mod common;

mod explain_command;
pub(crate) use explain_command::ExplainCommand;

mod methods_command;
pub(crate) use methods_command::MethodsCommand;

mod rectify_command;
pub(crate) use rectify_command::RectifyCommand;

mod writable_string;
