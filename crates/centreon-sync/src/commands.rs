use std::path::Path;

use centreon_clapi::ClapiClient;
use centreon_reconciler::error::{ReconcileError, format_err_chain};
use centreon_reconciler::manifest::{ManagedObjectSpec, Manifest};
use centreon_reconciler::plan::Operation;
use centreon_reconciler::report::RunReport;
use centreon_reconciler::{ObjectAddr, RunOptions, preview, reconcile_all};
use serde::Serialize;

use crate::config::{ConfigInfo, SyncConfig, config_info};

/// Result of `apply`, as printed on stdout.
#[derive(Debug, Serialize)]
pub struct ApplyOutput {
    #[serde(flatten)]
    pub report: RunReport,
    pub failed: bool,
}

impl From<RunReport> for ApplyOutput {
    fn from(report: RunReport) -> Self {
        let failed = !report.is_success();
        Self { report, failed }
    }
}

/// Result of `plan`, as printed on stdout.
#[derive(Debug, Serialize)]
pub struct PlanOutput {
    pub changed: bool,
    pub objects: Vec<PlannedObject>,
}

#[derive(Debug, Serialize)]
pub struct PlannedObject {
    #[serde(flatten)]
    pub addr: ObjectAddr,
    pub operations: Vec<Operation>,
}

/// Overrides given on the command line for `apply`.
#[derive(Debug, Default, Clone)]
pub struct ApplyArgs {
    pub no_applycfg: bool,
    pub instance: Option<String>,
    pub keep_going: bool,
}

pub fn load_manifest(path: &Path) -> eyre::Result<Vec<ManagedObjectSpec>> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("failed to read manifest at {}: {e}", path.display()))?;
    let specs = Manifest::from_json(&contents)?.into_specs()?;
    tracing::info!(path = %path.display(), objects = specs.len(), "manifest loaded");
    Ok(specs)
}

/// Authenticate against the configured server.
///
/// Failure here aborts the run before any object is touched. New hosts
/// without an explicit instance are attached to `instance`.
pub fn connect(config: &SyncConfig, instance: &str) -> Result<ClapiClient, ReconcileError> {
    ClapiClient::connect(
        &config.url,
        &config.username,
        &config.password,
        config.timeout(),
    )
    .map(|client| client.with_default_instance(instance))
    .map_err(|e| ReconcileError::Connection(format_err_chain(&e)))
}

pub fn run_options(config: &SyncConfig, args: &ApplyArgs) -> RunOptions {
    RunOptions {
        apply_on_change: config.apply_on_change && !args.no_applycfg,
        instance: args
            .instance
            .clone()
            .unwrap_or_else(|| config.instance.clone()),
        keep_going: args.keep_going,
    }
}

pub fn apply(
    config: &SyncConfig,
    manifest: &Path,
    args: &ApplyArgs,
) -> eyre::Result<ApplyOutput> {
    let specs = load_manifest(manifest)?;
    config.validate()?;
    let options = run_options(config, args);
    let client = connect(config, &options.instance)?;
    let report = reconcile_all(&client, &specs, &options);
    Ok(ApplyOutput::from(report))
}

pub fn plan(config: &SyncConfig, manifest: &Path) -> eyre::Result<PlanOutput> {
    let specs = load_manifest(manifest)?;
    config.validate()?;
    let client = connect(config, &config.instance)?;

    let mut objects = Vec::with_capacity(specs.len());
    for spec in &specs {
        let operations = preview(&client, spec)?;
        objects.push(PlannedObject {
            addr: spec.addr(),
            operations,
        });
    }
    Ok(PlanOutput {
        changed: objects.iter().any(|o| !o.operations.is_empty()),
        objects,
    })
}

pub fn show_config(config: &SyncConfig, path: Option<&Path>) -> ConfigInfo {
    config_info(config, path)
}
