// tighten-cli/src/main.rs
// ============================================================================
// Module: Tighten CLI Entry Point
// Description: Thin command dispatcher for the tightening pipeline's named
// pipelines.
// Purpose: Parse arguments into a pipeline request, dispatch it through
// tighten-orchestrator, and render the execution log / failure list.
// Dependencies: clap, tighten-cache, tighten-config, tighten-core,
// tighten-ingest, tighten-orchestrator, serde_json.
// ============================================================================

//! ## Overview
//! The CLI is the outermost shell `spec.md` §1 places out of scope ("the
//! command-line verb layer and configuration binding... is not redesigned
//! here"): it owns argument parsing and TOML-config binding only, and hands
//! everything else to the named pipelines in `tighten-orchestrator`: a
//! `main` thin enough to be obviously correct, `clap::Parser`/`Subcommand`
//! for the verb surface, `write!`/`writeln!` against explicit stdout/stderr
//! handles rather than `println!`/`eprintln!` (kept bare to satisfy this
//! workspace's `print_stdout`/`print_stderr` lint denial), and
//! `process::ExitCode` rather than `process::exit`.

use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use tighten_core::clock::Clock;
use tighten_core::clock::SystemClock;
use tighten_core::filesystem::FileSystem;
use tighten_core::filesystem::RealFileSystem;
use tighten_core::log::ExecutionLog;
use tighten_core::model::Model;
use tighten_core::outcome::ErrorRecord;
use tighten_core::outcome::Outcome;
use tighten_ingest::ModuleFilterOptions;
use tighten_ingest::SupplementalOptions;
use tighten_orchestrator::AnalyzeTighteningRequest;
use tighten_orchestrator::BootstrapRequest;
use tighten_orchestrator::BuildSsdtRequest;
use tighten_orchestrator::CaptureProfileRequest;
use tighten_orchestrator::ExtractModelRequest;
use tighten_orchestrator::ModelExtractor;
use tighten_orchestrator::PipelineRequest;
use tighten_orchestrator::PipelineResponse;
use tighten_orchestrator::ProfilerSelection;
use tighten_orchestrator::dispatch;
use tighten_orchestrator::no_seed_generator;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "tighten", about = "Model+profile tightening pipeline", disable_help_subcommand = true)]
struct Cli {
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands, one per named pipeline this core registers
/// (`spec.md` §6 Request surface).
#[derive(Subcommand, Debug)]
enum Commands {
    /// Tighten, project, and emit every SSDT artifact.
    BuildSsdt(BuildSsdtArgs),
    /// Run bootstrap and policy evaluation only; writes nothing to disk.
    AnalyzeTightening(AnalyzeTighteningArgs),
    /// Capture a profile snapshot, scoped to a filtered model, and nothing
    /// else.
    CaptureProfile(CaptureProfileArgs),
    /// Re-export the model produced by an external extractor as
    /// `model.json` in the output directory.
    ExtractModel(ExtractModelArgs),
}

/// Arguments shared by every pipeline that bootstraps a model and profile.
#[derive(Args, Debug)]
struct BootstrapArgs {
    /// Path to the model export JSON.
    #[arg(long, value_name = "PATH")]
    model: PathBuf,
    /// Path to the profile snapshot JSON fixture.
    #[arg(long, value_name = "PATH")]
    profile: PathBuf,
    /// Optional TOML configuration file.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Restrict the run to these modules (repeatable).
    #[arg(long = "module", value_name = "NAME")]
    modules: Vec<String>,
    /// Include modules flagged as platform system modules.
    #[arg(long)]
    include_system: bool,
    /// Include modules and entities flagged inactive.
    #[arg(long)]
    include_inactive: bool,
}

/// Arguments for `build-ssdt`.
#[derive(Args, Debug)]
struct BuildSsdtArgs {
    /// Shared bootstrap arguments.
    #[command(flatten)]
    bootstrap: BootstrapArgs,
    /// Directory artifacts are written to.
    #[arg(long, value_name = "PATH")]
    output: PathBuf,
}

/// Arguments for `analyze-tightening`.
#[derive(Args, Debug)]
struct AnalyzeTighteningArgs {
    /// Shared bootstrap arguments.
    #[command(flatten)]
    bootstrap: BootstrapArgs,
}

/// Arguments for `capture-profile`.
#[derive(Args, Debug)]
struct CaptureProfileArgs {
    /// Path to the model export JSON, used only to scope the scan.
    #[arg(long, value_name = "PATH")]
    model: PathBuf,
    /// Path to the profile snapshot JSON fixture.
    #[arg(long, value_name = "PATH")]
    profile: PathBuf,
    /// Restrict the scan scope to these modules (repeatable).
    #[arg(long = "module", value_name = "NAME")]
    modules: Vec<String>,
}

/// Arguments for `extract-model`.
#[derive(Args, Debug)]
struct ExtractModelArgs {
    /// Path to a previously captured model export JSON to re-validate and
    /// republish — this core has no live-catalog extractor of its own
    /// (`spec.md` §1); wiring a real one means implementing
    /// [`tighten_orchestrator::ModelExtractor`].
    #[arg(long, value_name = "PATH")]
    model: PathBuf,
    /// Directory the extracted model is written to, as `model.json`.
    #[arg(long, value_name = "PATH")]
    output: PathBuf,
}

// ============================================================================
// SECTION: Model Extractor Stand-In
// ============================================================================

/// Re-publishes an already-captured model file, validating that it parses.
/// Stands in for a live-catalog extractor until one is wired in by a
/// caller that owns a database connection.
struct FileModelExtractor<'a> {
    /// File-system facade the model file is read through.
    filesystem: &'a dyn FileSystem,
    /// Path to the model export JSON.
    path: PathBuf,
}

impl ModelExtractor for FileModelExtractor<'_> {
    fn extract(&self) -> Result<Model, String> {
        let bytes = self.filesystem.read(&self.path).map_err(|err| err.to_string())?;
        let (model, _warnings) = tighten_ingest::parse_model(&bytes).map_err(|err| err.to_string())?;
        Ok(model)
    }
}

// ============================================================================
// SECTION: Shared Helpers
// ============================================================================

/// Builds a [`ModuleFilterOptions`] from the shared bootstrap flags.
fn module_filter(args: &BootstrapArgs) -> ModuleFilterOptions {
    ModuleFilterOptions {
        modules: if args.modules.is_empty() { None } else { Some(args.modules.clone()) },
        include_system: args.include_system,
        include_inactive: args.include_inactive,
        ..ModuleFilterOptions::default()
    }
}

/// Loads and validates the resolved [`tighten_config::TighteningOptions`]
/// for a run, optionally overriding the configured output directory.
fn load_options(
    filesystem: &dyn FileSystem,
    config: Option<&Path>,
    output_dir: Option<&Path>,
) -> Result<tighten_config::TighteningOptions, ErrorRecord> {
    let mut builder = match config {
        Some(path) => {
            tighten_config::load(filesystem, path).map_err(|err| ErrorRecord::new(err.code(), err.to_string()))?
        }
        None => tighten_config::TighteningOptionsBuilder::new(),
    };
    if let Some(output_dir) = output_dir {
        builder = builder.with_output_dir(output_dir);
    }
    builder.build().map_err(|err| ErrorRecord::new(err.code(), err.to_string()))
}

/// Renders the dispatcher's full ordered error list to stderr (`spec.md`
/// §7: "the dispatcher returns the full ordered error list").
fn render_errors(errors: &[ErrorRecord]) {
    for error in errors {
        let _ = write_stderr_line(&format!("error[{}]: {}", error.code, error.message));
    }
}

/// Persists the run's execution log as `pipeline-log.json` in `output_dir`.
fn write_log(filesystem: &dyn FileSystem, output_dir: &Path, log: &ExecutionLog<'_>) -> Result<(), ErrorRecord> {
    let snapshot = log.build();
    let bytes =
        serde_json::to_vec_pretty(&snapshot).map_err(|err| ErrorRecord::new("cli.log.serialization", err.to_string()))?;
    filesystem
        .write_atomic(&output_dir.join("pipeline-log.json"), &bytes)
        .map_err(|err| ErrorRecord::new("cli.log.io", err.to_string()))
}

/// Builds the structured error reported when [`dispatch`] returns a
/// response variant other than the one the caller dispatched for — a
/// defect in the dispatcher's own exhaustive match, never expected in
/// practice, but reported as a normal failure rather than a panic.
fn mismatched_response(expected: &str) -> ErrorRecord {
    ErrorRecord::new(
        "dispatcher.response.mismatch",
        format!("dispatch returned a response variant other than the expected {expected}"),
    )
}

/// Renders an evidence-cache decision as the label `spec.md` §4.4 uses.
fn cache_decision_label(decision: &tighten_cache::CacheDecision) -> &'static str {
    match decision {
        tighten_cache::CacheDecision::Created => "created",
        tighten_cache::CacheDecision::Reused => "reused",
        tighten_cache::CacheDecision::Refreshed(_) => "refreshed",
    }
}

// ============================================================================
// SECTION: Subcommand Handlers
// ============================================================================

/// Runs the `build-ssdt` subcommand.
fn run_build_ssdt(args: BuildSsdtArgs, filesystem: &dyn FileSystem, clock: &dyn Clock) -> Result<(), Vec<ErrorRecord>> {
    let model_bytes =
        filesystem.read(&args.bootstrap.model).map_err(|err| vec![ErrorRecord::new("cli.model.io", err.to_string())])?;
    let options = load_options(filesystem, args.bootstrap.config.as_deref(), Some(&args.output)).map_err(|err| vec![err])?;
    let filter = module_filter(&args.bootstrap);

    let mut log = ExecutionLog::new(clock);
    let request = PipelineRequest::BuildSsdt(BuildSsdtRequest {
        bootstrap: BootstrapRequest {
            model_bytes: &model_bytes,
            module_filter: &filter,
            supplemental: SupplementalOptions::default(),
            profiler: ProfilerSelection::Fixture { filesystem, path: args.bootstrap.profile },
        },
        options: &options,
        filesystem,
        clock,
        seed_generator: no_seed_generator(),
    });

    let dispatched = match dispatch(request, &mut log) {
        Outcome::Ok(dispatched) => dispatched,
        Outcome::Err(errors) => {
            let _ = write_log(filesystem, &options.emission.output_dir, &log);
            return Err(errors);
        }
    };
    let PipelineResponse::BuildSsdt(response) = dispatched else {
        return Err(vec![mismatched_response("BuildSsdt")]);
    };
    write_log(filesystem, &options.emission.output_dir, &log).map_err(|err| vec![err])?;

    let _ = write_stdout_line(&format!(
        "wrote {} table(s) to {}",
        response.relational.tables.len(),
        options.emission.output_dir.display()
    ));
    if let Some(cache) = &response.cache {
        let _ = write_stdout_line(&format!(
            "evidence cache: {} at {}",
            cache_decision_label(&cache.decision),
            cache.cache_directory.display()
        ));
    }
    Ok(())
}

/// Runs the `analyze-tightening` subcommand.
fn run_analyze_tightening(
    args: AnalyzeTighteningArgs,
    filesystem: &dyn FileSystem,
    clock: &dyn Clock,
) -> Result<(), Vec<ErrorRecord>> {
    let model_bytes =
        filesystem.read(&args.bootstrap.model).map_err(|err| vec![ErrorRecord::new("cli.model.io", err.to_string())])?;
    let options = load_options(filesystem, args.bootstrap.config.as_deref(), None).map_err(|err| vec![err])?;
    let filter = module_filter(&args.bootstrap);

    let mut log = ExecutionLog::new(clock);
    let request = PipelineRequest::TighteningAnalysis(AnalyzeTighteningRequest {
        bootstrap: BootstrapRequest {
            model_bytes: &model_bytes,
            module_filter: &filter,
            supplemental: SupplementalOptions::default(),
            profiler: ProfilerSelection::Fixture { filesystem, path: args.bootstrap.profile },
        },
        options: &options,
    });

    let dispatched = match dispatch(request, &mut log) {
        Outcome::Ok(dispatched) => dispatched,
        Outcome::Err(errors) => return Err(errors),
    };
    let PipelineResponse::TighteningAnalysis(response) = dispatched else {
        return Err(vec![mismatched_response("TighteningAnalysis")]);
    };

    let _ = write_stdout_line(&format!(
        "{} nullability decision(s), {} safe-to-apply, {} needs-remediation",
        response.decisions.nullability.len(),
        response.opportunities_report.safe_to_apply.len(),
        response.opportunities_report.needs_remediation.len()
    ));
    Ok(())
}

/// Runs the `capture-profile` subcommand.
fn run_capture_profile(
    args: CaptureProfileArgs,
    filesystem: &dyn FileSystem,
    clock: &dyn Clock,
) -> Result<(), Vec<ErrorRecord>> {
    let model_bytes = filesystem.read(&args.model).map_err(|err| vec![ErrorRecord::new("cli.model.io", err.to_string())])?;
    let filter = ModuleFilterOptions {
        modules: if args.modules.is_empty() { None } else { Some(args.modules) },
        ..ModuleFilterOptions::default()
    };

    let mut log = ExecutionLog::new(clock);
    let request = PipelineRequest::CaptureProfile(CaptureProfileRequest {
        model_bytes: &model_bytes,
        module_filter: &filter,
        profiler: ProfilerSelection::Fixture { filesystem, path: args.profile },
    });

    let dispatched = match dispatch(request, &mut log) {
        Outcome::Ok(dispatched) => dispatched,
        Outcome::Err(errors) => return Err(errors),
    };
    let PipelineResponse::CaptureProfile(response) = dispatched else {
        return Err(vec![mismatched_response("CaptureProfile")]);
    };

    let _ = write_stdout_line(&format!(
        "captured {} column profile(s), {} warning(s)",
        response.profile.columns.len(),
        response.warnings.len()
    ));
    Ok(())
}

/// Runs the `extract-model` subcommand.
fn run_extract_model(args: ExtractModelArgs, filesystem: &dyn FileSystem, clock: &dyn Clock) -> Result<(), Vec<ErrorRecord>> {
    let extractor = FileModelExtractor { filesystem, path: args.model };
    let mut log = ExecutionLog::new(clock);
    let request = PipelineRequest::ExtractModel(ExtractModelRequest { extractor: &extractor, filesystem, output_dir: &args.output });

    let dispatched = match dispatch(request, &mut log) {
        Outcome::Ok(dispatched) => dispatched,
        Outcome::Err(errors) => return Err(errors),
    };
    let PipelineResponse::ExtractModel(response) = dispatched else {
        return Err(vec![mismatched_response("ExtractModel")]);
    };

    let _ = write_stdout_line(&format!("extracted model written to {}", response.model_path));
    Ok(())
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

// ============================================================================
// SECTION: Entry Point
// ============================================================================

fn main() -> ExitCode {
    let cli = Cli::parse();
    let filesystem = RealFileSystem;
    let clock = SystemClock;

    let result = match cli.command {
        Commands::BuildSsdt(args) => run_build_ssdt(args, &filesystem, &clock),
        Commands::AnalyzeTightening(args) => run_analyze_tightening(args, &filesystem, &clock),
        Commands::CaptureProfile(args) => run_capture_profile(args, &filesystem, &clock),
        Commands::ExtractModel(args) => run_extract_model(args, &filesystem, &clock),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(errors) => {
            render_errors(&errors);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn module_filter_empty_modules_means_no_restriction() {
        let args = BootstrapArgs {
            model: PathBuf::new(),
            profile: PathBuf::new(),
            config: None,
            modules: Vec::new(),
            include_system: false,
            include_inactive: true,
        };
        let filter = module_filter(&args);
        assert_eq!(filter.modules, None);
        assert!(filter.include_inactive);
    }

    #[test]
    fn module_filter_collects_repeated_module_flags() {
        let args = BootstrapArgs {
            model: PathBuf::new(),
            profile: PathBuf::new(),
            config: None,
            modules: vec!["AppCore".to_string(), "Ops".to_string()],
            include_system: false,
            include_inactive: false,
        };
        let filter = module_filter(&args);
        assert_eq!(filter.modules, Some(vec!["AppCore".to_string(), "Ops".to_string()]));
    }
}
