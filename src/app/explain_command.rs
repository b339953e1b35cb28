use super::{cli_manager::logging_level_cli_arg, command::Command, common};
use anyhow::{anyhow, Context, Result};
use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use log::{info, warn};
use std::{str::FromStr, time::Duration};
use xplatree::{
    explainers::{
        DecisionTreeExplainer, Explainer, Explanation, ExplanationLog, InstanceExplainer,
        PreferredReasonMethod, ReasonKind,
    },
    io::{ExplanationWriter, InstanceReader},
    trees::TreeModel,
};

const CMD_NAME: &str = "explain";

const ARG_INSTANCES: &str = "INSTANCES";
const ARG_KIND: &str = "KIND";
const ARG_N: &str = "N";
const ARG_TIME_LIMIT: &str = "TIME_LIMIT";
const ARG_EXCLUDE: &str = "EXCLUDE";
const ARG_METHOD: &str = "METHOD";
const ARG_WEIGHTS: &str = "WEIGHTS";
const ARG_PARTITION: &str = "PARTITION";
const ARG_ITERATIONS: &str = "ITERATIONS";
const ARG_SEED: &str = "SEED";
const ARG_RANGE: &str = "RANGE";

pub(crate) struct ExplainCommand;

impl ExplainCommand {
    pub(crate) fn new() -> Self {
        ExplainCommand
    }
}

impl<'a> Command<'a> for ExplainCommand {
    fn name(&self) -> &str {
        CMD_NAME
    }

    fn clap_subcommand(&self) -> App<'a, 'a> {
        SubCommand::with_name(CMD_NAME)
            .about("Explains the predictions of a model")
            .setting(AppSettings::DisableVersion)
            .arg(common::model_arg())
            .arg(
                Arg::with_name(ARG_INSTANCES)
                    .short("i")
                    .long("instances")
                    .empty_values(false)
                    .multiple(false)
                    .help("the file that contains the instances to explain")
                    .required(true),
            )
            .arg(
                Arg::with_name(ARG_KIND)
                    .short("k")
                    .long("kind")
                    .empty_values(false)
                    .multiple(false)
                    .help("the kind of explanation to compute (see the methods command)")
                    .required(true),
            )
            .arg(
                Arg::with_name(ARG_N)
                    .short("n")
                    .empty_values(false)
                    .multiple(false)
                    .default_value("1")
                    .help(r#"the number of reasons to compute, or "all""#),
            )
            .arg(
                Arg::with_name(ARG_TIME_LIMIT)
                    .long("time-limit")
                    .empty_values(false)
                    .multiple(false)
                    .help("the time limit of a search, in seconds"),
            )
            .arg(
                Arg::with_name(ARG_EXCLUDE)
                    .long("exclude")
                    .empty_values(false)
                    .multiple(false)
                    .help("the features (1-based, comma separated) that must not appear in the reasons"),
            )
            .arg(
                Arg::with_name(ARG_METHOD)
                    .long("method")
                    .empty_values(false)
                    .multiple(false)
                    .default_value("minimal")
                    .help("the weighting scheme of preferred reasons (see the methods command)"),
            )
            .arg(
                Arg::with_name(ARG_WEIGHTS)
                    .long("weights")
                    .empty_values(false)
                    .multiple(false)
                    .help("the weights of the features (comma separated), for the weights method"),
            )
            .arg(
                Arg::with_name(ARG_PARTITION)
                    .long("partition")
                    .empty_values(false)
                    .multiple(false)
                    .help(r#"the preference partition of the features, like "1,2;3", for the inclusion-preferred method"#),
            )
            .arg(
                Arg::with_name(ARG_ITERATIONS)
                    .long("iterations")
                    .empty_values(false)
                    .multiple(false)
                    .default_value("1")
                    .help("the number of iterations of the tree-specific reason search"),
            )
            .arg(
                Arg::with_name(ARG_SEED)
                    .long("seed")
                    .empty_values(false)
                    .multiple(false)
                    .default_value("0")
                    .help("the seed of the tree-specific reason search"),
            )
            .arg(
                Arg::with_name(ARG_RANGE)
                    .long("range")
                    .empty_values(false)
                    .multiple(false)
                    .allow_hyphen_values(true)
                    .help("the range of predictions to explain for regression models, like \"lower,upper\""),
            )
            .arg(logging_level_cli_arg())
    }

    fn execute(&self, arg_matches: &ArgMatches<'_>) -> Result<()> {
        let options = ExplainOptions::from_arg_matches(arg_matches)?;
        let model_file = arg_matches
            .value_of(common::ARG_MODEL)
            .ok_or_else(|| anyhow!("missing model file"))?;
        let model = common::read_model_file_path(model_file)?;
        let instances_file = arg_matches
            .value_of(ARG_INSTANCES)
            .ok_or_else(|| anyhow!("missing instances file"))?;
        let instances = common::read_file_path_with(instances_file, &|r| {
            InstanceReader::default().read(r)
        })?;
        info!("read {} instance(s)", instances.len());
        let mut explainer = new_explainer(&model);
        if let Some(features) = &options.excluded_features {
            explainer.set_excluded_features(features)?;
        }
        let writer = ExplanationWriter::new_with_registry(model.registry());
        let mut out = std::io::stdout();
        let mut history = ExplanationLog::default();
        for (i, instance) in instances.iter().enumerate() {
            let context = || format!("while explaining instance {}", i + 1);
            explainer.set_instance(instance).with_context(context)?;
            if let Some((lower, upper)) = options.range {
                explainer.set_range(lower, upper).with_context(context)?;
            }
            info!("explaining instance {}", i + 1);
            match options.request {
                Request::Count => {
                    let count = explainer
                        .as_sufficient_reason_computer()?
                        .n_sufficient_reasons(options.time_limit)
                        .with_context(context)?;
                    writer.write_count(&mut out, &count)?;
                }
                Request::CountPerLiteral => {
                    let count = explainer
                        .as_sufficient_reason_computer()?
                        .n_sufficient_reasons_per_attribute(options.time_limit)
                        .with_context(context)?;
                    writer.write_count(&mut out, &count)?;
                }
                Request::Reasons(kind) => {
                    let explanation = compute_explanation(&explainer, kind, &options)
                        .with_context(context)?;
                    writer.write_explanation(&mut out, &explanation)?;
                    history.record(&explainer, &explanation)?;
                }
            }
        }
        let n_unexplained = history.iter().filter(|e| e.reasons().is_empty()).count();
        if n_unexplained > 0 {
            warn!("no reason found for {} instance(s)", n_unexplained);
        }
        Ok(())
    }
}

fn new_explainer(model: &TreeModel) -> Explainer {
    match model {
        TreeModel::DecisionTree(t) => {
            Explainer::DecisionTree(DecisionTreeExplainer::new_with_factories(
                t,
                common::create_sat_solver_factory(),
                common::create_maxsat_solver_factory(),
                common::create_model_counter_factory(),
            ))
        }
        TreeModel::RegressionBoostedTrees(_) => Explainer::new(model),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Request {
    Reasons(ReasonKind),
    Count,
    CountPerLiteral,
}

impl FromStr for Request {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "count" => Ok(Request::Count),
            "count-per-literal" => Ok(Request::CountPerLiteral),
            _ => ReasonKind::from_str(s)
                .map(Request::Reasons)
                .map_err(|_| anyhow!(r#"unknown explanation kind "{}""#, s)),
        }
    }
}

struct ExplainOptions {
    request: Request,
    n: Option<usize>,
    time_limit: Option<Duration>,
    excluded_features: Option<Vec<usize>>,
    method: PreferredReasonMethod,
    weights: Option<Vec<u64>>,
    partition: Option<Vec<Vec<usize>>>,
    n_iterations: usize,
    seed: u64,
    range: Option<(f64, f64)>,
}

impl ExplainOptions {
    fn from_arg_matches(arg_matches: &ArgMatches<'_>) -> Result<Self> {
        let request = Request::from_str(arg_matches.value_of(ARG_KIND).unwrap_or_default())?;
        let n = match arg_matches.value_of(ARG_N).unwrap_or("1") {
            "all" => None,
            s => Some(
                s.parse::<usize>()
                    .with_context(|| format!(r#"invalid number of reasons "{}""#, s))?,
            ),
        };
        let time_limit = arg_matches
            .value_of(ARG_TIME_LIMIT)
            .map(parse_time_limit)
            .transpose()?;
        let excluded_features = arg_matches
            .value_of(ARG_EXCLUDE)
            .map(common::parse_list::<usize>)
            .transpose()
            .context("while parsing the excluded features")?;
        let method = match arg_matches.value_of(ARG_METHOD) {
            Some(m) => PreferredReasonMethod::from_str(m)
                .map_err(|_| anyhow!(r#"unknown preferred reason method "{}""#, m))?,
            None => PreferredReasonMethod::Minimal,
        };
        let weights = arg_matches
            .value_of(ARG_WEIGHTS)
            .map(common::parse_list::<u64>)
            .transpose()
            .context("while parsing the weights")?;
        let partition = arg_matches
            .value_of(ARG_PARTITION)
            .map(common::parse_partition)
            .transpose()?;
        let n_iterations = arg_matches
            .value_of(ARG_ITERATIONS)
            .unwrap_or("1")
            .parse::<usize>()
            .context("invalid number of iterations")?;
        let seed = arg_matches
            .value_of(ARG_SEED)
            .unwrap_or("0")
            .parse::<u64>()
            .context("invalid seed")?;
        let range = arg_matches.value_of(ARG_RANGE).map(parse_range).transpose()?;
        let options = ExplainOptions {
            request,
            n,
            time_limit,
            excluded_features,
            method,
            weights,
            partition,
            n_iterations,
            seed,
            range,
        };
        options.warn_useless_args();
        Ok(options)
    }

    fn warn_useless_args(&self) {
        let preferred = self.request == Request::Reasons(ReasonKind::Preferred);
        if !preferred && (self.weights.is_some() || self.partition.is_some()) {
            warn!("weights and partitions are only used by preferred reasons");
        }
        let tree_specific = self.request == Request::Reasons(ReasonKind::TreeSpecific);
        if tree_specific && self.n != Some(1) {
            warn!("tree-specific searches compute a single reason; use --iterations to refine it");
        }
    }
}

fn parse_time_limit(s: &str) -> Result<Duration> {
    match s.parse::<f64>() {
        Ok(t) if t.is_finite() && t >= 0. => Ok(Duration::from_secs_f64(t)),
        _ => Err(anyhow!(r#"invalid time limit "{}""#, s)),
    }
}

fn parse_range(s: &str) -> Result<(f64, f64)> {
    match common::parse_list::<f64>(s)?.as_slice() {
        [lower, upper] => Ok((*lower, *upper)),
        _ => Err(anyhow!(r#"a range must be given as "lower,upper", got "{}""#, s)),
    }
}

fn compute_explanation(
    explainer: &Explainer,
    kind: ReasonKind,
    options: &ExplainOptions,
) -> Result<Explanation> {
    let (n, time_limit) = (options.n, options.time_limit);
    match kind {
        ReasonKind::Direct => explainer.direct_reason(),
        ReasonKind::TreeSpecific => {
            explainer.tree_specific_reason(options.n_iterations, time_limit, options.seed)
        }
        ReasonKind::Contrastive => explainer.as_sufficient_reason_computer()?.contrastive_reason(n),
        ReasonKind::SubsetMinimalContrastive => explainer
            .as_sufficient_reason_computer()?
            .subset_minimal_contrastive_reason(n),
        ReasonKind::Sufficient => explainer
            .as_sufficient_reason_computer()?
            .sufficient_reason(n, time_limit),
        ReasonKind::Preferred => explainer
            .as_sufficient_reason_computer()?
            .preferred_sufficient_reason(
                options.method,
                n,
                time_limit,
                options.weights.as_deref(),
                options.partition.as_deref(),
            ),
        ReasonKind::Minimal => explainer
            .as_sufficient_reason_computer()?
            .minimal_sufficient_reason(n, time_limit),
        ReasonKind::Necessary => explainer.as_sufficient_reason_computer()?.necessary_literals(),
        ReasonKind::Relevant => explainer.as_sufficient_reason_computer()?.relevant_literals(),
    }
}
