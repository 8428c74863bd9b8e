use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use glob::glob;
use salesroll::{
    config::Settings,
    diagnostics::{CollectingReporter, Reporter, Tee, TracingReporter},
    pipeline::{app_store, google_play, AppStoreInputs, GooglePlayInputs},
    report::Report,
    table, Outcome, PipelineError,
};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "salesroll")]
#[command(about = "Roll per-country storefront exports up to a per-region xlsx report")]
struct Args {
    /// YAML settings file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory the report is written to (overrides the settings file)
    #[arg(short, long)]
    out_dir: Option<PathBuf>,

    /// Also write warnings and the fatal error, if any, to this JSON file
    #[arg(long)]
    diagnostics_json: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    platform: Command,
}

#[derive(Subcommand)]
enum Command {
    /// App Store Connect Units and Revenue sheets
    AppStore {
        /// Country / country-code / region reference sheet
        #[arg(long)]
        regions: Option<PathBuf>,
        #[arg(long)]
        units: Option<PathBuf>,
        #[arg(long)]
        revenue: Option<PathBuf>,
        #[arg(long)]
        title: Option<String>,
    },
    /// Google Play Console per-country CSV exports
    GooglePlay {
        /// Units CSVs; paths or glob patterns, concatenated in the order given
        #[arg(long, num_args = 1..)]
        units: Vec<String>,
        /// Revenue CSVs; paths or glob patterns, concatenated in the order given
        #[arg(long, num_args = 1..)]
        revenue: Vec<String>,
        /// Reference sheet with country and region columns
        #[arg(long)]
        regions: Option<PathBuf>,
        #[arg(long)]
        title: Option<String>,
        /// strftime pattern of the Date column, also used for the output
        #[arg(long)]
        date_format: Option<String>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    // ─── 1) init logging ─────────────────────────────────────────────
    let default_level = if args.verbose { "debug" } else { "info" };
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    fmt::Subscriber::builder().with_env_filter(env).init();

    // ─── 2) settings ─────────────────────────────────────────────────
    let mut settings = match &args.config {
        Some(path) => Settings::load(path)
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => Settings::default(),
    };
    if let Some(dir) = &args.out_dir {
        settings.output.dir = dir.clone();
    }

    // ─── 3) run the selected pipeline ────────────────────────────────
    let mut log = TracingReporter;
    let mut collected = CollectingReporter::default();
    let outcome = execute(args.platform, &settings);
    let written = {
        let mut reporter = Tee {
            sinks: vec![&mut log as &mut dyn Reporter, &mut collected],
        };
        deliver(outcome, &settings.output.dir, &mut reporter)
    };

    // ─── 4) diagnostics summary ──────────────────────────────────────
    if let Some(path) = &args.diagnostics_json {
        let json = serde_json::to_string_pretty(&collected)?;
        fs::write(path, json)
            .with_context(|| format!("writing diagnostics to {}", path.display()))?;
    }

    let path = written?;
    info!(path = %path.display(), warnings = collected.warnings.len(), "done");
    Ok(())
}

fn execute(command: Command, settings: &Settings) -> salesroll::Result<Outcome<Report>> {
    match command {
        Command::AppStore {
            regions,
            units,
            revenue,
            title,
        } => {
            let mut opts = settings.app_store.to_options();
            if let Some(t) = title {
                opts.title = t;
            }
            let inputs = AppStoreInputs {
                regions: load_optional(regions.as_deref())?,
                units: load_optional(units.as_deref())?,
                revenue: load_optional(revenue.as_deref())?,
            };
            app_store::run(inputs, &opts)
        }
        Command::GooglePlay {
            units,
            revenue,
            regions,
            title,
            date_format,
        } => {
            let mut gp = settings.google_play.clone();
            if let Some(t) = title {
                gp.title = t;
            }
            if let Some(f) = date_format {
                gp.date_format = f;
            }
            let opts = gp.to_options()?;
            let inputs = GooglePlayInputs {
                units: load_all(&units)?,
                revenue: load_all(&revenue)?,
                regions: load_optional(regions.as_deref())?,
            };
            google_play::run(inputs, &opts)
        }
    }
}

fn load_optional(path: Option<&Path>) -> salesroll::Result<Option<table::WideTable>> {
    path.map(table::load).transpose()
}

/// Expand each argument (a path or glob pattern) in order; matches of one
/// pattern are taken in sorted path order.
fn load_all(patterns: &[String]) -> salesroll::Result<Vec<table::WideTable>> {
    let mut tables = Vec::new();
    for pattern in patterns {
        let mut paths: Vec<PathBuf> = glob(pattern)
            .map_err(|e| PipelineError::MissingInput(format!("{}: {}", pattern, e)))?
            .filter_map(|p| match p {
                Ok(p) => Some(p),
                Err(e) => {
                    warn!("cannot read glob entry: {}", e);
                    None
                }
            })
            .collect();
        if paths.is_empty() {
            return Err(PipelineError::MissingInput(format!(
                "no file matches {}",
                pattern
            )));
        }
        paths.sort();
        for p in paths {
            info!(path = %p.display(), "loading");
            tables.push(table::load(&p)?);
        }
    }
    Ok(tables)
}

/// Report warnings, write the workbook, and hand any failure, whether from
/// the pipeline or from writing, to `reporter`.
fn deliver(
    outcome: salesroll::Result<Outcome<Report>>,
    dir: &Path,
    reporter: &mut dyn Reporter,
) -> salesroll::Result<PathBuf> {
    let written = outcome.and_then(|report| {
        let report = report.report(reporter);
        write_report(&report, dir)
    });
    if let Err(e) = &written {
        reporter.fatal(e);
    }
    written
}

fn write_report(report: &Report, dir: &Path) -> salesroll::Result<PathBuf> {
    let artifact = report.to_artifact()?;
    fs::create_dir_all(dir)?;
    let path = dir.join(&artifact.file_name);
    fs::write(&path, &artifact.bytes)?;
    info!(
        file = %artifact.file_name,
        mime = artifact.mime,
        rows = report.records.len(),
        "wrote report"
    );
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use salesroll::{Platform, UnifiedRecord};
    use tempfile::tempdir;

    fn outcome() -> salesroll::Result<Outcome<Report>> {
        Ok(Outcome::with_warnings(
            Report {
                platform: Platform::GooglePlay,
                title: "HOK".into(),
                records: vec![UnifiedRecord {
                    date: "2023-01-01".into(),
                    title: "HOK".into(),
                    platform: "GP".into(),
                    region: Some("APAC".into()),
                    units: 1.0,
                    revenue: 2.0,
                }],
            },
            vec![],
        ))
    }

    #[test]
    fn writes_into_output_dir() {
        let dir = tempdir().unwrap();
        let mut rep = CollectingReporter::default();
        let path = deliver(outcome(), &dir.path().join("out"), &mut rep).unwrap();
        assert!(path.ends_with("HOK_最终汇总表.xlsx"));
        assert!(path.exists());
        assert!(rep.fatal.is_none());
    }

    #[test]
    fn write_failure_reaches_reporter() {
        let dir = tempdir().unwrap();
        // a plain file where the output directory should be
        let blocker = dir.path().join("out");
        fs::write(&blocker, b"x").unwrap();

        let mut rep = CollectingReporter::default();
        let err = deliver(outcome(), &blocker, &mut rep).unwrap_err();
        assert!(matches!(err, PipelineError::Io(_)));
        assert!(rep.fatal.as_deref().unwrap().starts_with("io: "));
    }

    #[test]
    fn pipeline_failure_reaches_reporter() {
        let dir = tempdir().unwrap();
        let mut rep = CollectingReporter::default();
        let failed = Err(PipelineError::MissingInput("units files".into()));
        assert!(deliver(failed, dir.path(), &mut rep).is_err());
        assert_eq!(
            rep.fatal.as_deref(),
            Some("missing required input: units files")
        );
    }
}
