//! Solve command implementation for the Courier CLI.

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use courier_core::request::RequestDocument;
use courier_core::{PenaltyStrategy, PlanRequest, Planner, SolutionReport};
use courier_solver::PlannerConfig;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use std::io::{BufReader, Write};
use std::time::Duration;

use crate::fs::{file_is_file, open_utf8_file};
use crate::{
    ARG_SOLVE_DROP_PENALTY, ARG_SOLVE_MAX_RELOAD, ARG_SOLVE_REQUEST, ARG_SOLVE_TIME_LIMIT,
    CliError, ENV_SOLVE_REQUEST,
};

/// CLI arguments for the `solve` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Plan a day of deliveries. The request is a JSON document \
                 listing the depot, the stops with their demands, time \
                 windows and distances, and the available vehicles. The \
                 resulting routes are printed as JSON.",
    about = "Plan delivery routes for a request"
)]
#[ortho_config(prefix = "COURIER")]
pub(crate) struct SolveArgs {
    /// Path to a JSON file containing a planning request.
    #[arg(value_name = "path")]
    #[serde(default)]
    pub(crate) request_path: Option<Utf8PathBuf>,
    /// Override the number of extra depot visits allowed for reloading.
    #[arg(long = ARG_SOLVE_MAX_RELOAD, value_name = "count")]
    #[serde(default)]
    pub(crate) max_reload: Option<usize>,
    /// Override the search time limit, in whole seconds.
    #[arg(long = ARG_SOLVE_TIME_LIMIT, value_name = "seconds")]
    #[serde(default)]
    pub(crate) time_limit: Option<u64>,
    /// Override the drop penalty strategy (e.g. "max_distance").
    #[arg(long = ARG_SOLVE_DROP_PENALTY, value_name = "strategy")]
    #[serde(default)]
    pub(crate) drop_penalty: Option<String>,
}

impl SolveArgs {
    pub(crate) fn into_config(self) -> Result<SolveConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        SolveConfig::try_from(merged)
    }
}

/// Resolved `solve` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SolveConfig {
    /// Path to the JSON request file.
    pub(crate) request_path: Utf8PathBuf,
    /// Reload count replacing the request's.
    pub(crate) max_reload: Option<usize>,
    /// Search budget replacing the request's.
    pub(crate) time_limit: Option<Duration>,
    /// Penalty strategy replacing the request's.
    pub(crate) penalty: Option<PenaltyStrategy>,
}

impl SolveConfig {
    pub(crate) fn validate_sources(&self) -> Result<(), CliError> {
        Self::require_existing(&self.request_path, ARG_SOLVE_REQUEST)
    }

    fn require_existing(path: &Utf8Path, field: &'static str) -> Result<(), CliError> {
        match file_is_file(path) {
            Ok(true) => Ok(()),
            Ok(false) => Err(CliError::SourcePathNotFile {
                field,
                path: path.to_path_buf(),
            }),
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
                Err(CliError::MissingSourceFile {
                    field,
                    path: path.to_path_buf(),
                })
            }
            Err(source) => Err(CliError::InspectSourcePath {
                field,
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Planner overrides carried by this configuration.
    pub(crate) fn planner_config(&self) -> PlannerConfig {
        PlannerConfig {
            penalty: self.penalty,
            max_reload: self.max_reload,
            ..PlannerConfig::default()
        }
    }
}

impl TryFrom<SolveArgs> for SolveConfig {
    type Error = CliError;

    fn try_from(args: SolveArgs) -> Result<Self, Self::Error> {
        let request_path = args.request_path.ok_or(CliError::MissingArgument {
            field: ARG_SOLVE_REQUEST,
            env: ENV_SOLVE_REQUEST,
        })?;
        let penalty = args
            .drop_penalty
            .map(|raw| raw.parse::<PenaltyStrategy>())
            .transpose()
            .map_err(|source| CliError::InvalidPenalty {
                field: ARG_SOLVE_DROP_PENALTY,
                source,
            })?;

        Ok(Self {
            request_path,
            max_reload: args.max_reload,
            time_limit: args.time_limit.map(Duration::from_secs),
            penalty,
        })
    }
}

/// Builds a planner for the current solve invocation.
pub(super) trait PlannerFactory {
    fn build(&self, config: &SolveConfig) -> Result<Box<dyn Planner>, CliError>;
}

pub(super) struct DefaultPlannerFactory;

impl PlannerFactory for DefaultPlannerFactory {
    #[cfg(feature = "engine-insertion")]
    fn build(&self, config: &SolveConfig) -> Result<Box<dyn Planner>, CliError> {
        use courier_engine::InsertionEngine;
        use courier_solver::CpPlanner;

        Ok(Box::new(CpPlanner::<InsertionEngine>::with_config(
            config.planner_config(),
        )))
    }

    #[cfg(not(feature = "engine-insertion"))]
    fn build(&self, _config: &SolveConfig) -> Result<Box<dyn Planner>, CliError> {
        Err(CliError::MissingFeature {
            feature: "engine-insertion",
            action: "solving",
        })
    }
}

pub(super) fn run_solve(args: SolveArgs) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    let factory = DefaultPlannerFactory;
    run_solve_with(args, &factory, &mut stdout)
}

pub(super) fn run_solve_with(
    args: SolveArgs,
    factory: &dyn PlannerFactory,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let report = execute_solve(args, factory)?;
    write_report(writer, &report)
}

fn execute_solve(
    args: SolveArgs,
    factory: &dyn PlannerFactory,
) -> Result<SolutionReport, CliError> {
    let config = resolve_solve_config(args)?;
    let mut request = load_plan_request(&config.request_path)?;
    if let Some(limit) = config.time_limit {
        request.search_time_limit = limit;
    }
    let planner = factory.build(&config)?;
    let solution = planner
        .plan(&request)
        .map_err(|source| CliError::Plan { source })?;
    Ok(solution.report())
}

fn resolve_solve_config(args: SolveArgs) -> Result<SolveConfig, CliError> {
    let config = args.into_config()?;
    config.validate_sources()?;
    Ok(config)
}

/// Loads a JSON-encoded planning request from disk.
pub(super) fn load_plan_request(path: &Utf8Path) -> Result<PlanRequest, CliError> {
    let file = open_utf8_file(path).map_err(|source| CliError::OpenRequest {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = BufReader::new(file);
    let document: RequestDocument =
        serde_json::from_reader(reader).map_err(|source| CliError::ParseRequest {
            path: path.to_path_buf(),
            source,
        })?;
    PlanRequest::try_from(document).map_err(|source| CliError::InvalidRequest {
        path: path.to_path_buf(),
        source,
    })
}

fn write_report(writer: &mut dyn Write, report: &SolutionReport) -> Result<(), CliError> {
    let payload = serde_json::to_string_pretty(report).map_err(CliError::SerializeReport)?;
    writer
        .write_all(payload.as_bytes())
        .map_err(CliError::WriteOutput)?;
    writer.write_all(b"\n").map_err(CliError::WriteOutput)?;
    Ok(())
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<SolveConfig, CliError> {
    let merged = SolveArgs::merge_from_layers(layers).map_err(CliError::from)?;
    SolveConfig::try_from(merged)
}
