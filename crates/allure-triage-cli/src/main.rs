//! allure-triage CLI - Failed-test triage for Allure CI reports

mod storage;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use allure_triage_client::TriageClient;
use allure_triage_core::{
    Config, UnresolvedPolicy, analyze_records, analyze_report_text, render_report, render_summary,
};

#[derive(Parser)]
#[command(name = "allure-triage")]
#[command(about = "Failed-test triage for Allure CI reports")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, global = true, default_value = "terminal")]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch failed tests, write a report file, and print the analysis
    Run {
        /// Config file (default: .allure-triage.toml)
        #[arg(short, long)]
        config: Option<String>,

        /// Directory for report files (overrides config)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Keep failed tests whose parent category cannot be found
        #[arg(long)]
        keep_unresolved: bool,
    },

    /// Re-analyze a previously written report file
    Analyze {
        /// Report file produced by `allure-triage run`
        file: PathBuf,
    },

    /// Initialize config file
    Init,

    /// Export JSON Schema for the aggregate report format
    Schema,
}

#[derive(Clone, Copy, ValueEnum, PartialEq, Eq)]
enum OutputFormat {
    Terminal,
    Json,
    Silent,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(3)
        }
    }
}

fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Commands::Run {
            config,
            output_dir,
            keep_unresolved,
        } => {
            // Load config
            let mut cfg = if let Some(path) = config {
                Config::load(std::path::Path::new(&path))?
            } else {
                Config::load_default()?
            };
            if let Some(dir) = output_dir {
                cfg.output_dir = dir;
            }
            let policy = if keep_unresolved {
                UnresolvedPolicy::Keep
            } else {
                cfg.on_unresolved
            };

            if cli.output != OutputFormat::Silent {
                eprintln!("Config:");
                eprintln!("  base_url:   {}", cfg.base_url);
                eprintln!("  output_dir: {}", cfg.output_dir.display());
                if cfg.credentials().is_some() {
                    eprintln!("  auth:       basic");
                }
                eprintln!();
            }

            let client = TriageClient::from_config(&cfg)?;
            let run = client
                .collect(policy)
                .context("failed to collect failed tests")?;

            if cli.output != OutputFormat::Silent {
                for warning in &run.unresolved {
                    eprintln!("Warning: {warning}");
                }
                eprintln!("Found {} failed tests", run.records.len());
            }

            let report = analyze_records(&run.records);
            let summary = render_summary(&report);

            let mut content = render_report(&run.records);
            content.push_str(&allure_triage_core::summary::render_analysis_block(
                &summary,
            ));

            match storage::write_report(&cfg.output_dir, &content) {
                Ok(path) => {
                    if cli.output != OutputFormat::Silent {
                        eprintln!("Report saved: {}", path.display());
                    }
                }
                Err(e) => eprintln!("Warning: failed to save report: {e}"),
            }

            match cli.output {
                OutputFormat::Terminal => {
                    println!("{summary}");
                }
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&report)?);
                }
                OutputFormat::Silent => {}
            }

            Ok(if run.records.is_empty() { 0 } else { 1 })
        }

        Commands::Analyze { file } => {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let report = analyze_report_text(&text);

            match cli.output {
                OutputFormat::Terminal => {
                    println!("{}", render_summary(&report));
                }
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&report)?);
                }
                OutputFormat::Silent => {}
            }

            Ok(0)
        }

        Commands::Init => {
            let config_path = ".allure-triage.toml";
            if std::path::Path::new(config_path).exists() {
                eprintln!("{config_path} already exists");
                return Ok(1);
            }

            std::fs::write(config_path, Config::example())?;
            println!("Created {config_path}");
            println!("\nEdit the file to configure:");
            println!("  - base_url: Allure data endpoint of your CI job");
            println!("  - output_dir: where report files are written");
            println!("  - on_unresolved: drop or keep unresolvable failures");
            println!(
                "\nCredentials come from the {} and {} environment variables.",
                allure_triage_core::config::USERNAME_ENV,
                allure_triage_core::config::PASSWORD_ENV
            );
            Ok(0)
        }

        Commands::Schema => {
            let schema = allure_triage_core::summary::generate_schema();
            println!("{schema}");
            Ok(0)
        }
    }
}
