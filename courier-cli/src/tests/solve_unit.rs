//! Focused unit tests covering solve CLI configuration and request loading.

use super::helpers::{sample_request, write_request, write_utf8};
use super::*;
use crate::solve::{
    PlannerFactory, SolveArgs, SolveConfig, config_from_layers_for_test, load_plan_request,
    run_solve_with,
};
use camino::Utf8PathBuf;
use courier_core::{
    PenaltyStrategy, PlanError, PlanRequest, Planner, RoutingSolution, SolutionStatus,
};
use rstest::rstest;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

fn workspace() -> (TempDir, Utf8PathBuf) {
    let tmp = TempDir::new().expect("tempdir");
    let root = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).expect("utf-8 workspace");
    let request_path = root.join("request.json");
    (tmp, request_path)
}

fn config_for(request_path: Utf8PathBuf) -> SolveConfig {
    SolveConfig {
        request_path,
        max_reload: None,
        time_limit: None,
        penalty: None,
    }
}

#[rstest]
fn converting_solve_without_request_errors() {
    let err = SolveConfig::try_from(SolveArgs::default()).expect_err("missing request");
    match err {
        CliError::MissingArgument { field, env } => {
            assert_eq!(field, ARG_SOLVE_REQUEST);
            assert_eq!(env, ENV_SOLVE_REQUEST);
        }
        other => panic!("expected MissingArgument, found {other:?}"),
    }
}

#[rstest]
fn converting_solve_resolves_overrides() {
    let args = SolveArgs {
        request_path: Some(Utf8PathBuf::from("day.json")),
        max_reload: Some(3),
        time_limit: Some(7),
        drop_penalty: Some("Max Route".into()),
    };
    let config = SolveConfig::try_from(args).expect("config should build");
    assert_eq!(config.max_reload, Some(3));
    assert_eq!(config.time_limit, Some(Duration::from_secs(7)));
    assert_eq!(config.penalty, Some(PenaltyStrategy::MaxRoute));

    let planner = config.planner_config();
    assert_eq!(planner.max_reload, Some(3));
    assert_eq!(planner.penalty, Some(PenaltyStrategy::MaxRoute));
}

#[rstest]
fn converting_solve_rejects_unknown_penalties() {
    let args = SolveArgs {
        request_path: Some(Utf8PathBuf::from("day.json")),
        drop_penalty: Some("cheapest".into()),
        ..SolveArgs::default()
    };
    let err = SolveConfig::try_from(args).expect_err("unknown penalty");
    match err {
        CliError::InvalidPenalty { field, .. } => assert_eq!(field, ARG_SOLVE_DROP_PENALTY),
        other => panic!("expected InvalidPenalty, found {other:?}"),
    }
}

#[rstest]
fn validate_sources_reports_missing_request() {
    let (_tmp, request_path) = workspace();
    let err = config_for(request_path.clone())
        .validate_sources()
        .expect_err("missing request should fail");
    match err {
        CliError::MissingSourceFile { field, path } => {
            assert_eq!(field, ARG_SOLVE_REQUEST);
            assert_eq!(path, request_path);
        }
        other => panic!("expected MissingSourceFile, found {other:?}"),
    }
}

#[rstest]
fn validate_sources_reports_not_file() {
    let (_tmp, request_path) = workspace();
    std::fs::create_dir(request_path.as_std_path()).expect("request directory");
    let err = config_for(request_path.clone())
        .validate_sources()
        .expect_err("directory should fail validation");
    match err {
        CliError::SourcePathNotFile { field, path } => {
            assert_eq!(field, ARG_SOLVE_REQUEST);
            assert_eq!(path, request_path);
        }
        other => panic!("expected SourcePathNotFile, found {other:?}"),
    }
}

#[rstest]
fn load_plan_request_decodes_json() {
    let (_tmp, request_path) = workspace();
    write_request(&request_path, &sample_request());

    let request = load_plan_request(&request_path).expect("request should decode");
    assert_eq!(request.locations.len(), 3);
    assert_eq!(request.vehicles.len(), 1);
    assert_eq!(request.search_time_limit, Duration::from_secs(1));
    assert_eq!(request.max_reload, 0);
}

#[rstest]
fn load_plan_request_rejects_invalid_json() {
    let (_tmp, request_path) = workspace();
    write_utf8(&request_path, b"{ not valid json");
    let err = load_plan_request(&request_path).expect_err("invalid json should error");
    match err {
        CliError::ParseRequest { path, .. } => assert_eq!(path, request_path),
        other => panic!("expected ParseRequest, found {other:?}"),
    }
}

#[rstest]
fn load_plan_request_rejects_unknown_strategies() {
    let (_tmp, request_path) = workspace();
    let mut request = sample_request();
    request["drop_penalty_type"] = "teleport".into();
    write_request(&request_path, &request);
    let err = load_plan_request(&request_path).expect_err("unknown strategy should error");
    match err {
        CliError::InvalidRequest { path, .. } => assert_eq!(path, request_path),
        other => panic!("expected InvalidRequest, found {other:?}"),
    }
}

#[rstest]
fn load_plan_request_io_error_returns_open_error() {
    let (_tmp, request_path) = workspace();
    let err = load_plan_request(&request_path).expect_err("missing request should error");
    match err {
        CliError::OpenRequest { path, .. } => assert_eq!(path, request_path),
        other => panic!("expected OpenRequest, found {other:?}"),
    }
}

#[rstest]
fn merge_layers_maps_configuration_errors() {
    use ortho_config::MergeComposer;
    use serde_json::json;

    let mut composer = MergeComposer::new();
    composer.push_cli(json!({ "request_path": 42 }));

    let err = config_from_layers_for_test(composer.layers())
        .expect_err("invalid config layer should map to CliError::Configuration");
    match err {
        CliError::Configuration(_) => {}
        other => panic!("expected CliError::Configuration, found {other:?}"),
    }
}

#[rstest]
fn merge_layers_honours_precedence() {
    use ortho_config::MergeComposer;
    use serde_json::json;

    let mut composer = MergeComposer::new();
    composer.push_file(
        json!({
            "request_path": "from-file.json",
            "max_reload": 1,
            "drop_penalty": "demand",
        }),
        None,
    );
    composer.push_environment(json!({
        "request_path": "from-env.json",
        "max_reload": 2,
    }));
    composer.push_cli(json!({ "max_reload": 4 }));

    let config =
        config_from_layers_for_test(composer.layers()).expect("merged config should build");
    assert_eq!(config.request_path, Utf8PathBuf::from("from-env.json"));
    assert_eq!(config.max_reload, Some(4));
    assert_eq!(config.penalty, Some(PenaltyStrategy::DemandMultiplier));
    assert_eq!(config.time_limit, None);
}

/// Planner that records the request it was handed.
#[derive(Clone, Default)]
struct CapturingPlanner {
    seen: Arc<Mutex<Option<PlanRequest>>>,
}

impl Planner for CapturingPlanner {
    fn plan(&self, request: &PlanRequest) -> Result<RoutingSolution, PlanError> {
        *self.seen.lock().expect("planner lock") = Some(request.clone());
        let names = request.locations.iter().map(|l| l.name.clone());
        Ok(RoutingSolution::new(
            SolutionStatus::Failed,
            "Solution not found",
            names,
        ))
    }
}

impl PlannerFactory for CapturingPlanner {
    fn build(&self, _config: &SolveConfig) -> Result<Box<dyn Planner>, CliError> {
        Ok(Box::new(self.clone()))
    }
}

#[rstest]
fn time_limit_override_reaches_the_planner() {
    let (_tmp, request_path) = workspace();
    write_request(&request_path, &sample_request());
    let planner = CapturingPlanner::default();
    let args = SolveArgs {
        request_path: Some(request_path),
        time_limit: Some(9),
        ..SolveArgs::default()
    };

    let mut out = Vec::new();
    run_solve_with(args, &planner, &mut out).expect("solve should succeed");

    let seen = planner.seen.lock().expect("planner lock").clone();
    let request = seen.expect("planner should be called");
    assert_eq!(request.search_time_limit, Duration::from_secs(9));
    let report: serde_json::Value = serde_json::from_slice(&out).expect("JSON report");
    assert_eq!(report["status"], "FAILED");
    assert_eq!(report["dropped_locations"].as_array().map(Vec::len), Some(3));
}
