//! `covsub report` command: the pipeline orchestrator.
//!
//! Sequences one run: finalize the job, validate it, discover and run the
//! parsers through the callback chain into the payload writer, then
//! submit unless the job is a dry run. A fatal error at any stage aborts
//! the whole run; the payload file handle is released on every exit path
//! and a failed pipeline is never submitted.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::cli::ReportArgs;
use crate::client::{CoverallsClient, DEFAULT_ENDPOINT};
use crate::config::FileConfig;
use crate::context::ServiceContext;
use crate::error::{ReportError, SubmitError};
use crate::job::Job;
use crate::json_writer::JsonWriter;
use crate::parser::{CoverageParser, CoverageParsersFactory};
use crate::reporting::{
    CoverageTracingReporter, DryRunReporter, JobReporter, Position, Reporter,
};
use crate::service::{detect_service, ServiceDefaults};
use crate::source::{
    CoverageTotals, CoverageTracingCallback, DuplicateMode, UniqueSourceCallback,
};
use crate::source_loader::SourceLoader;

/// Execute the `report` command.
///
/// # Errors
///
/// Returns an error string describing the first fatal failure, worded by
/// failure family (validation, data processing, I/O).
pub fn run(ctx: &ServiceContext, args: &ReportArgs) -> Result<(), String> {
    if args.skip {
        println!("Skip flag set, skipping coverage reporting");
        return Ok(());
    }
    let encoding = args.source_encoding.trim();
    if !encoding.eq_ignore_ascii_case("utf-8") && !encoding.eq_ignore_ascii_case("utf8") {
        return Err(format!(
            "unsupported source encoding {encoding:?}: only UTF-8 is supported"
        ));
    }
    let service_environment = parse_service_env(&args.service_environment)?;
    execute(ctx, args, service_environment).map_err(|err| err.to_string())
}

fn execute(
    ctx: &ServiceContext,
    args: &ReportArgs,
    service_environment: BTreeMap<String, String>,
) -> Result<(), ReportError> {
    let config = FileConfig::load(&args.base_dir)?;
    let detected = detect_service(ctx.env.as_ref());

    let git = match ctx.git.snapshot(&args.base_dir) {
        Ok(git) => Some(git),
        Err(err) => {
            eprintln!("warning: no git metadata: {err}");
            None
        }
    };

    let job = build_job(ctx, args, &config, detected.as_ref(), git, service_environment);
    let validation = job.validate();
    for warning in validation.warnings() {
        eprintln!("warning: {warning}");
    }
    validation.into_result()?;

    let loader = SourceLoader::new(
        ctx.fs.as_ref(),
        source_dirs(&args.base_dir, &args.source_dirs),
        &args.source_encoding,
    );
    let factory = CoverageParsersFactory::new(ctx.fs.as_ref(), &loader, args.base_dir.clone())
        .with_cobertura_reports(args.cobertura_reports.clone())
        .with_jacoco_reports(args.jacoco_reports.clone())
        .with_lcov_reports(args.lcov_reports.clone())
        .with_report_dirs(args.report_dirs.clone());
    let mut parsers = factory.create_parsers()?;

    let output = resolve_against(&args.base_dir, &args.output);
    let mut writer = JsonWriter::create(&job, &output)?;

    let totals = Rc::new(RefCell::new(CoverageTotals::default()));
    let mut reporters: Vec<Box<dyn Reporter>> = vec![
        Box::new(JobReporter::new(&job)),
        Box::new(CoverageTracingReporter::new(Rc::clone(&totals))),
    ];
    if job.dry_run {
        reporters.push(Box::new(DryRunReporter::new(output.clone())));
    }

    render(&reporters, Position::Before);

    let duplicate_mode = if args.fail_on_duplicate {
        DuplicateMode::Fail
    } else {
        DuplicateMode::FirstWins
    };
    let written = write_payload(&mut writer, &mut parsers, &totals, duplicate_mode);
    let closed = writer.close();
    written?;
    closed?;

    render(&reporters, Position::After);

    if !job.dry_run {
        let endpoint = args
            .endpoint
            .clone()
            .or_else(|| config.endpoint.clone())
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        submit(&endpoint, &output)?;
    }
    Ok(())
}

fn build_job(
    ctx: &ServiceContext,
    args: &ReportArgs,
    config: &FileConfig,
    detected: Option<&ServiceDefaults>,
    git: Option<crate::git_info::GitInfo>,
    service_environment: BTreeMap<String, String>,
) -> Job {
    let from_service =
        |field: fn(&ServiceDefaults) -> Option<String>| detected.and_then(field);

    let repo_token = args
        .repo_token
        .clone()
        .or_else(|| ctx.env.var("COVERALLS_REPO_TOKEN"))
        .or_else(|| config.repo_token.clone());
    let service_name = args
        .service_name
        .clone()
        .or_else(|| config.service_name.clone())
        .or_else(|| detected.map(|d| d.service_name.clone()));
    let branch = args
        .branch
        .clone()
        .or_else(|| from_service(|d| d.branch.clone()))
        .or_else(|| git.as_ref().and_then(|g| g.branch.clone()));

    Job::new()
        .with_repo_token(repo_token)
        .with_service_name(service_name)
        .with_service_job_id(
            args.service_job_id.clone().or_else(|| from_service(|d| d.service_job_id.clone())),
        )
        .with_service_build_number(
            args.service_build_number
                .clone()
                .or_else(|| from_service(|d| d.service_build_number.clone())),
        )
        .with_service_build_url(
            args.service_build_url
                .clone()
                .or_else(|| from_service(|d| d.service_build_url.clone())),
        )
        .with_service_environment(service_environment)
        .with_branch(branch)
        .with_pull_request(
            args.pull_request.clone().or_else(|| from_service(|d| d.pull_request.clone())),
        )
        .with_timestamp(Some(ctx.clock.now()))
        .with_dry_run(args.dry_run)
        .with_git(git)
}

fn write_payload(
    writer: &mut JsonWriter,
    parsers: &mut [Box<dyn CoverageParser + '_>],
    totals: &Rc<RefCell<CoverageTotals>>,
    mode: DuplicateMode,
) -> Result<(), ReportError> {
    println!("Writing coverage payload to {}", writer.payload_path().display());
    writer.write_start()?;
    {
        let tracing = CoverageTracingCallback::new(&mut *writer, Rc::clone(totals));
        let mut chain = UniqueSourceCallback::with_mode(tracing, mode);
        for parser in parsers.iter_mut() {
            println!("Processing coverage report {}", parser.report_path().display());
            parser.parse(&mut chain)?;
            for skipped in parser.skipped_sources() {
                eprintln!("warning: source file not found, skipped: {skipped}");
            }
        }
    }
    writer.write_end()
}

fn submit(endpoint: &str, payload: &Path) -> Result<(), ReportError> {
    println!("Submitting coverage payload to {endpoint}");
    let client = CoverallsClient::new(endpoint);
    let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
    match runtime.block_on(client.submit(payload)) {
        Ok(response) => {
            println!("Submission accepted: {}", response.message);
            if let Some(url) = &response.url {
                println!("{url}");
            }
            Ok(())
        }
        Err(err) => {
            match &err {
                SubmitError::Processing(_) => {
                    eprintln!("Submission failed while processing data");
                }
                SubmitError::Io(_) => {
                    eprintln!("Submission failed while handling I/O operations");
                }
            }
            Err(err.into())
        }
    }
}

fn render(reporters: &[Box<dyn Reporter>], position: Position) {
    for reporter in reporters {
        if reporter.position() == position {
            println!("{}", reporter.render());
        }
    }
}

fn source_dirs(base_dir: &Path, configured: &[PathBuf]) -> Vec<PathBuf> {
    if configured.is_empty() {
        vec![base_dir.join("src"), base_dir.to_path_buf()]
    } else {
        configured.iter().map(|dir| resolve_against(base_dir, dir)).collect()
    }
}

fn resolve_against(base_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

fn parse_service_env(entries: &[String]) -> Result<BTreeMap<String, String>, String> {
    let mut map = BTreeMap::new();
    for entry in entries {
        let (key, value) = entry
            .split_once('=')
            .ok_or_else(|| format!("invalid --service-env value {entry:?}, expected KEY=VALUE"))?;
        if key.is_empty() {
            return Err(format!("invalid --service-env value {entry:?}, empty key"));
        }
        map.insert(key.to_string(), value.to_string());
    }
    Ok(map)
}
