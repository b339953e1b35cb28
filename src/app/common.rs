use super::{
    app_helper::AppHelper, command::Command, AuthorsCommand, CheckCommand, ExplainCommand,
    MethodsCommand, RectifyCommand,
};
use anyhow::{anyhow, Context, Result};
use clap::Arg;
use log::{info, warn};
use std::{
    fs::{self, File},
    io::{BufReader, Read},
    path::PathBuf,
    str::FromStr,
};
use xplatree::{
    io::ModelReader,
    sat::{
        default_model_counter, LinearSearchMaxSatSolver, MaxSatSolver, MaxSatSolverFactoryFn,
        ModelCounterFactoryFn, SatSolver, SatSolverFactoryFn, SolvingListener, SolvingResult,
    },
    trees::TreeModel,
};

pub(crate) fn create_app_helper() -> AppHelper<'static> {
    let app_name = option_env!("CARGO_PKG_NAME").unwrap_or("unknown app name");
    let app_version = option_env!("CARGO_PKG_VERSION").unwrap_or("unknown version");
    let authors = option_env!("CARGO_PKG_AUTHORS").unwrap_or("unknown authors");
    let mut app = AppHelper::new(
        app_name,
        app_version,
        authors,
        "Xplatree, formal explanations for tree-based models.",
    );
    let commands: Vec<Box<dyn Command>> = vec![
        Box::new(AuthorsCommand::new(app_name, app_version, authors)),
        Box::new(CheckCommand::new()),
        Box::new(ExplainCommand::new()),
        Box::new(MethodsCommand::new()),
        Box::new(RectifyCommand::new()),
    ];
    for c in commands {
        app.add_command(c);
    }
    app
}

pub(crate) const ARG_MODEL: &str = "MODEL";

pub(crate) fn model_arg() -> Arg<'static, 'static> {
    Arg::with_name(ARG_MODEL)
        .short("m")
        .long("model")
        .empty_values(false)
        .multiple(false)
        .help("the input file that contains the model")
        .required(true)
}

pub(crate) fn read_model_file_path(file_path: &str) -> Result<TreeModel> {
    let mut reader = ModelReader::default();
    reader.add_warning_handler(Box::new(|line, msg| warn!("at line {}: {}", line, msg)));
    let model = read_file_path_with(file_path, &|r| reader.read(r))?;
    info!(
        "the model is a {} with {} feature(s), {} tree(s), {} node(s) and {} decision test(s)",
        model.kind_name(),
        model.n_features(),
        model.n_trees(),
        model.n_nodes(),
        model.registry().len(),
    );
    Ok(model)
}

pub(crate) fn read_file_path_with<F, R>(file_path: &str, reader: &F) -> Result<R>
where
    F: Fn(&mut dyn Read) -> Result<R>,
{
    let canonicalized = canonicalize_file_path(file_path)?;
    info!("reading input file {:?}", canonicalized);
    let mut file_reader = BufReader::new(
        File::open(&canonicalized).with_context(|| format!("while opening {:?}", canonicalized))?,
    );
    (reader)(&mut file_reader).with_context(|| format!("while reading {:?}", canonicalized))
}

/// Canonicalize a path given by the user.
pub(crate) fn canonicalize_file_path(file_path: &str) -> Result<PathBuf> {
    fs::canonicalize(PathBuf::from(file_path))
        .with_context(|| format!(r#"while opening file "{}""#, file_path))
}

/// Parses a list of values separated by commas.
pub(crate) fn parse_list<T>(s: &str) -> Result<Vec<T>>
where
    T: FromStr,
{
    s.split(',')
        .map(|w| w.trim())
        .filter(|w| !w.is_empty())
        .map(|w| {
            w.parse::<T>()
                .map_err(|_| anyhow!(r#"invalid value "{}" in list "{}""#, w, s))
        })
        .collect()
}

/// Parses a partition of features, the parts being separated by semicolons.
pub(crate) fn parse_partition(s: &str) -> Result<Vec<Vec<usize>>> {
    s.split(';')
        .map(parse_list)
        .collect::<Result<Vec<Vec<usize>>>>()
        .context("while parsing a partition of features")
}

pub(crate) fn create_sat_solver_factory() -> Box<SatSolverFactoryFn> {
    Box::new(new_logged_sat_solver)
}

pub(crate) fn create_maxsat_solver_factory() -> Box<MaxSatSolverFactoryFn> {
    Box::new(|| {
        Box::new(LinearSearchMaxSatSolver::new(new_logged_sat_solver())) as Box<dyn MaxSatSolver>
    })
}

pub(crate) fn create_model_counter_factory() -> Box<ModelCounterFactoryFn> {
    Box::new(default_model_counter)
}

fn new_logged_sat_solver() -> Box<dyn SatSolver> {
    let mut solver = xplatree::sat::default_solver();
    solver.add_listener(Box::<SatSolvingLogger>::default());
    solver
}

#[derive(Default)]
struct SatSolvingLogger;

impl SolvingListener for SatSolvingLogger {
    fn solving_start(&self, n_vars: usize, n_clauses: usize) {
        info!(
            "launching SAT solver on an instance with {} variables and {} clauses",
            n_vars, n_clauses
        );
    }

    fn solving_end(&self, result: &SolvingResult) {
        let r = match result {
            SolvingResult::Satisfiable(_) => "SAT",
            SolvingResult::Unsatisfiable => "UNSAT",
            SolvingResult::Unknown => "UNKNOWN",
        };
        info!("SAT solver ended with result {}", r);
    }
}
